use rand::Rng;

use crate::game::context::SimContext;
use crate::game::economy::CostKind;
use crate::game::rejection::Rejection;
use crate::game::staff::{Department, RoleTier, StaffMember, StaffRole};
use crate::game::world::{CloseReason, GameOverReason, SimulationState};
use crate::game::{
    EARLY_CLOSE_MORALE, FOH_BASE_CAP, KITCHEN_BASE_CAP, PROMOTION_EVERY_LEVELS, TEAM_FATIGUE_MAX,
    WAGE_FLOOR, WAGE_HIRE_MARKUP,
};
use crate::time::{TimeOfDay, TimePhase};

const DOWNGRADE_CHANCE_BY_TIER: [f64; 5] = [0.0, 0.12, 0.24, 0.38, 0.55];
const BANKRUPT_DOWNGRADE_CHANCE: f64 = 0.70;
const FATIGUE_CARRY_AT_OPEN: f64 = 0.15;
const HEAD_CHEF_FOOD_RACK_BONUS: u32 = 5;
const PEAK_CHECK_AT: TimeOfDay = TimeOfDay::new(18, 48);
const LATE_CHECK_AT: TimeOfDay = TimeOfDay::new(21, 48);

/// Morale, reputation, credit and chaos fallout for the 1st, 2nd and 3rd+ missed payroll.
struct WageMissPenalty {
    morale: f64,
    walkouts: usize,
    rep: i32,
    score: i32,
    chaos: f64,
    traffic: f64,
    traffic_rounds: u32,
    serve: f64,
    serve_weeks: u32,
    trust: f64,
}

const WAGE_MISS_PENALTIES: [WageMissPenalty; 3] = [
    WageMissPenalty {
        morale: -25.0,
        walkouts: 1,
        rep: -12,
        score: -90,
        chaos: 12.0,
        traffic: 0.75,
        traffic_rounds: 6,
        serve: 0.0,
        serve_weeks: 0,
        trust: 0.03,
    },
    WageMissPenalty {
        morale: -35.0,
        walkouts: 2,
        rep: -22,
        score: -140,
        chaos: 20.0,
        traffic: 0.55,
        traffic_rounds: 10,
        serve: 0.25,
        serve_weeks: 2,
        trust: 0.06,
    },
    WageMissPenalty {
        morale: -45.0,
        walkouts: 3,
        rep: -35,
        score: -200,
        chaos: 30.0,
        traffic: 0.35,
        traffic_rounds: 14,
        serve: 0.45,
        serve_weeks: 3,
        trust: 0.10,
    },
];

pub(crate) fn foh_cap(sim: &SimulationState) -> usize {
    FOH_BASE_CAP + sim.upgrades.effects.foh_cap as usize
}

pub(crate) fn kitchen_cap(sim: &SimulationState) -> usize {
    KITCHEN_BASE_CAP + sim.upgrades.effects.kitchen_cap as usize
}

fn check_hire(sim: &SimulationState, role: StaffRole) -> Result<(), Rejection> {
    if sim.night.open {
        return Err(Rejection::PubOpen);
    }
    if sim.credit.bankruptcy_lock_weeks > 0 && role.tier() == RoleTier::Manager {
        return Err(Rejection::locked(
            role.label(),
            "nobody senior will sign on during the bankruptcy lock",
        ));
    }
    let roster = &sim.roster;
    match role.department() {
        Department::Management => {
            if roster.count_role(role) >= 1 {
                return Err(Rejection::CapReached(format!("one {}", role.label())));
            }
        }
        Department::FrontOfHouse => {
            let cap = foh_cap(sim);
            if roster.count_department(Department::FrontOfHouse) >= cap {
                return Err(Rejection::CapReached(format!("{cap} front-of-house staff")));
            }
        }
        Department::Kitchen => {
            if !sim.upgrades.effects.kitchen_unlocked {
                return Err(Rejection::locked(role.label(), "the kitchen is not built"));
            }
            if role == StaffRole::HeadChef && roster.count_role(role) >= 1 {
                return Err(Rejection::CapReached("one Head Chef".to_string()));
            }
            let cap = kitchen_cap(sim);
            if roster.count_department(Department::Kitchen) >= cap {
                return Err(Rejection::CapReached(format!("{cap} kitchen staff")));
            }
        }
        Department::Inn => {
            if !sim.upgrades.effects.inn_unlocked {
                return Err(Rejection::locked(role.label(), "the inn is not open"));
            }
        }
    }
    Ok(())
}

/// A struggling business attracts weaker candidates than it advertised for.
fn degrade_role(ctx: &mut SimContext<'_>, role: StaffRole) -> StaffRole {
    let mut chance = DOWNGRADE_CHANCE_BY_TIER[ctx.sim.debt.tier() as usize];
    if ctx.sim.debt.bankrupt {
        chance = chance.max(BANKRUPT_DOWNGRADE_CHANCE);
    }
    if chance <= 0.0 || !ctx.rng.gen_bool(chance) {
        return role;
    }
    match role.downgrade() {
        Some(weaker) => {
            ctx.log.neg(format!(
                "Word of the pub's debts got round: the best candidate was a {} instead of a {}.",
                weaker.label(),
                role.label()
            ));
            weaker
        }
        None => role,
    }
}

pub(crate) fn hire_staff(ctx: &mut SimContext<'_>, role: StaffRole) -> Result<u32, Rejection> {
    if let Err(rejection) = check_hire(ctx.sim, role) {
        return Err(ctx.reject(rejection));
    }
    let role = degrade_role(ctx, role);
    let member = roll_member(ctx, role)?;
    let id = member.id;
    ctx.log.pos(format!(
        "Hired {} (capacity {}, skill {}, wage GBP {:.2}/week).",
        member.name(),
        member.capacity,
        member.skill,
        member.weekly_wage
    ));
    ctx.sim.roster.push(member);
    refresh_food_rack(ctx);
    Ok(id)
}

/// Rolls a new member from the role template. Does not add them to the roster.
pub(crate) fn roll_member(ctx: &mut SimContext<'_>, role: StaffRole) -> Result<StaffMember, Rejection> {
    let catalog = ctx.catalog;
    let Some(template) = catalog.role(role) else {
        return Err(ctx.reject(Rejection::unknown("role", role.key())));
    };
    let rng = &mut *ctx.rng;
    let roll_i = |rng: &mut rand::rngs::StdRng, (lo, hi): (i32, i32)| {
        rng.gen_range(lo.min(hi)..=lo.max(hi))
    };
    let roll_f = |rng: &mut rand::rngs::StdRng, (lo, hi): (f64, f64)| {
        if (hi - lo).abs() < f64::EPSILON {
            lo
        } else {
            rng.gen_range(lo.min(hi)..=lo.max(hi))
        }
    };
    let capacity = roll_i(rng, template.capacity);
    let skill = roll_i(rng, template.skill);
    let (rep_a, rep_b) = template.rep;
    let base_wage = roll_f(rng, template.wage);
    let premium = ctx.sim.calendar.week() as f64 * 0.6 + ctx.sim.reputation.max(0) as f64 * 0.15;
    let weekly_wage = (base_wage * WAGE_HIRE_MARKUP + premium).max(WAGE_FLOOR);
    let capacity_multiplier = roll_f(rng, template.capacity_multiplier);
    let tip_rate = roll_f(rng, template.tip_rate);
    let id = ctx.sim.roster.allocate_id();
    Ok(StaffMember {
        id,
        role,
        capacity,
        skill,
        rep_min: rep_a.min(rep_b),
        rep_max: rep_a.max(rep_b),
        morale: template.starting_morale,
        weekly_wage,
        accrued_wage: 0.0,
        tenure_weeks: 0,
        level: 0,
        capacity_multiplier,
        tip_rate,
        tip_bonus: template.tip_bonus,
        security_bonus: template.security_bonus,
        chaos_tolerance: template.chaos_tolerance,
        inn_coverage: template.inn_coverage,
        off_sick: false,
    })
}

pub(crate) fn fire_staff(ctx: &mut SimContext<'_>, id: u32) -> Result<StaffMember, Rejection> {
    let Some(member) = ctx.sim.roster.get(id) else {
        return Err(ctx.reject(Rejection::unknown("staff member", id.to_string())));
    };
    let owed = member.accrued_wage;
    let name = member.name();
    let is_manager = member.role.is_manager();
    if !ctx.try_pay(owed, CostKind::Wages, &format!("{name}'s final wages")) {
        return Err(Rejection::InsufficientFunds { needed: owed });
    }
    let Some(mut member) = ctx.sim.roster.remove(id) else {
        return Err(ctx.reject(Rejection::unknown("staff member", id.to_string())));
    };
    member.cash_out();
    let rep = ctx.apply_rep(if is_manager { -2 } else { -1 });
    ctx.log.neg(format!(
        "Let {name} go and paid GBP {owed:.2} in final wages (rep {rep:+})."
    ));
    ctx.sim.week.staff_departures += 1;
    refresh_food_rack(ctx);
    Ok(member)
}

/// Food storage grows with every head chef on the books.
pub(crate) fn refresh_food_rack(ctx: &mut SimContext<'_>) {
    let chefs = ctx.sim.roster.count_role(StaffRole::HeadChef) as u32;
    let legacy = ctx.sim.prestige.legacy.rack_capacity;
    let capacity = ctx.config.food_rack_capacity
        + ctx.sim.upgrades.effects.food_rack
        + chefs * HEAD_CHEF_FOOD_RACK_BONUS
        + legacy;
    ctx.sim.inventory.food.set_capacity(capacity);
    let drinks = ctx.config.drink_rack_capacity + ctx.sim.upgrades.effects.drink_rack + legacy;
    ctx.sim.inventory.drinks.set_capacity(drinks);
}

fn level_capacity_bonus(level: u32) -> i32 {
    (level / 4).min(4) as i32
}

fn level_skill_bonus(level: u32) -> i32 {
    ((level as f64 * 0.6).floor() as i32).min(6)
}

/// Weekly progression. High chaos can cost a level, a calm week can add one.
pub(crate) fn weekly_level_ups(ctx: &mut SimContext<'_>) {
    let chaos = ctx.sim.chaos.value();
    let mut promotions = Vec::new();
    for member in ctx.sim.roster.iter_mut() {
        member.tenure_weeks += 1;
        let old_level = member.level;
        let mut gained: i32 = 1;
        if chaos > 60.0 && ctx.rng.gen_bool(0.25) {
            gained -= 1;
        } else if chaos < 20.0 && ctx.rng.gen_bool(0.20) {
            gained += 1;
        }
        if gained <= 0 {
            continue;
        }
        let new_level = old_level + gained as u32;
        member.capacity += level_capacity_bonus(new_level) - level_capacity_bonus(old_level);
        member.skill += level_skill_bonus(new_level) - level_skill_bonus(old_level);
        member.level = new_level;
        let crossed = new_level / PROMOTION_EVERY_LEVELS > old_level / PROMOTION_EVERY_LEVELS;
        if crossed {
            if let Some(next) = member.role.promotion() {
                let from = member.role;
                member.role = next;
                member.weekly_wage *= 1.10;
                member.adjust_morale(5.0);
                promotions.push((member.id, from, next));
            }
        }
    }
    for (id, from, to) in promotions {
        ctx.log.pos(format!(
            "Staff #{id} was promoted from {} to {}.",
            from.label(),
            to.label()
        ));
    }
}

/// Front-of-house throughput after managers, upgrades, pub level, fatigue and wage fallout.
pub(crate) fn serve_capacity(sim: &SimulationState, phase: TimePhase) -> u32 {
    let mut floor = 0.0;
    let mut multiplier = 1.0;
    for member in sim.roster.on_shift() {
        match member.department() {
            Department::FrontOfHouse => floor += member.capacity.max(0) as f64,
            Department::Management => {
                floor += member.capacity.max(0) as f64;
                multiplier *= member.capacity_multiplier.max(1.0);
            }
            Department::Kitchen | Department::Inn => {}
        }
    }
    let bonus = sim.upgrades.effects.serve_capacity as f64 + sim.pub_level as f64;
    let raw = (floor * multiplier + bonus).max(0.0);
    let legacy = 1.0 + sim.prestige.legacy.staff_efficiency.max(0.0);
    let adjusted = raw * legacy * fatigue_serve_multiplier(sim, phase) * (1.0 - sim.staffing.serve_penalty);
    (adjusted.round() as u32).max(1)
}

/// Food orders the kitchen can turn around per round.
pub(crate) fn kitchen_capacity(sim: &SimulationState) -> u32 {
    if !sim.upgrades.effects.kitchen_unlocked {
        return 0;
    }
    sim.roster
        .on_shift()
        .map(|m| m.role.kitchen_capacity())
        .sum()
}

pub(crate) fn staff_tip_rate(sim: &SimulationState) -> f64 {
    sim.roster
        .on_shift()
        .map(|m| if m.role.is_manager() { m.tip_rate } else { m.tip_bonus })
        .sum()
}

/// Per-round staff reputation roll: each person on shift nudges the room.
pub(crate) fn staff_rep_roll(ctx: &mut SimContext<'_>) -> i32 {
    let mut total = 0;
    for member in ctx.sim.roster.on_shift() {
        if member.department() == Department::Kitchen || member.department() == Department::Inn {
            continue;
        }
        if ctx.rng.gen_bool(0.12) {
            total += ctx.rng.gen_range(member.rep_min..=member.rep_max).signum();
        }
    }
    total
}

/// Tired staff serve slower, and late in the night fatigue bites harder.
pub(crate) fn fatigue_serve_multiplier(sim: &SimulationState, phase: TimePhase) -> f64 {
    let slope = if phase == TimePhase::Late { 0.010 } else { 0.007 };
    (1.0 - (sim.staffing.fatigue * slope).min(0.35)).max(0.65)
}

pub(crate) fn decay_fatigue_at_open(ctx: &mut SimContext<'_>) {
    ctx.sim.staffing.fatigue *= FATIGUE_CARRY_AT_OPEN;
    ctx.sim.staffing.peak_fatigue = ctx.sim.staffing.fatigue;
}

/// Inputs for one round of fatigue build-up.
pub(crate) struct FatigueInputs {
    pub(crate) phase: TimePhase,
    pub(crate) understaffed: bool,
    pub(crate) incidents: u32,
    pub(crate) unserved: u32,
}

pub(crate) fn accumulate_fatigue(ctx: &mut SimContext<'_>, inputs: &FatigueInputs) {
    let phase_gain = match inputs.phase {
        TimePhase::EarlyDay => 0.15,
        TimePhase::BuildUp => 0.25,
        TimePhase::Peak => 0.45,
        TimePhase::Late => 0.60,
    };
    let coverage_gain = if inputs.understaffed { 0.55 } else { 0.10 };
    let gain = phase_gain
        + coverage_gain
        + ctx.sim.chaos.value() / 100.0 * 0.8
        + inputs.incidents as f64 * 0.4
        + (inputs.unserved as f64 * 0.08).min(1.2);
    let staffing = &mut ctx.sim.staffing;
    staffing.fatigue = (staffing.fatigue + gain).clamp(0.0, TEAM_FATIGUE_MAX);
    staffing.peak_fatigue = staffing.peak_fatigue.max(staffing.fatigue);
}

/// One front-of-house or kitchen member may call in sick at open.
pub(crate) fn roll_sick_calls(ctx: &mut SimContext<'_>) {
    ctx.sim.roster.return_from_sick();
    let candidates: Vec<(u32, f64)> = ctx
        .sim
        .roster
        .iter()
        .filter(|m| {
            matches!(
                m.department(),
                Department::FrontOfHouse | Department::Kitchen
            )
        })
        .map(|m| (m.id, m.morale))
        .collect();
    if candidates.len() < 2 {
        return;
    }
    let morale = ctx.sim.roster.team_morale();
    let peak_fatigue = ctx.sim.staffing.peak_fatigue / TEAM_FATIGUE_MAX * 100.0;
    let stress = ctx.sim.chaos.value();
    let chance = (0.03
        + ((55.0 - morale) / 600.0).max(0.0)
        + ((peak_fatigue - 45.0) / 500.0).max(0.0)
        + stress / 700.0)
        .min(0.28);
    if !ctx.rng.gen_bool(chance.clamp(0.0, 1.0)) {
        return;
    }
    let (id, _) = candidates[ctx.rng.gen_range(0..candidates.len())];
    if let Some(member) = ctx.sim.roster.get_mut(id) {
        member.off_sick = true;
        let name = member.name();
        ctx.log.neg(format!("{name} called in sick tonight."));
    }
}

/// Checks the two fixed staff-pressure windows. Returns the reason when the night must end.
pub(crate) fn check_early_close(ctx: &mut SimContext<'_>, now: TimeOfDay) -> Option<CloseReason> {
    let window = if now >= LATE_CHECK_AT && !ctx.sim.night.late_check_done {
        ctx.sim.night.late_check_done = true;
        ctx.sim.night.peak_check_done = true;
        true
    } else if now >= PEAK_CHECK_AT && !ctx.sim.night.peak_check_done {
        ctx.sim.night.peak_check_done = true;
        true
    } else {
        false
    };
    if !window {
        return None;
    }
    let morale = ctx.sim.roster.team_morale();
    if morale > EARLY_CLOSE_MORALE || ctx.sim.roster.is_empty() {
        return None;
    }
    let fatigue_term = if ctx.sim.staffing.fatigue > 12.0 { 0.03 } else { 0.0 };
    let chance = (0.05 + (EARLY_CLOSE_MORALE - morale) / 280.0 + fatigue_term).min(0.20);
    if ctx.rng.gen_bool(chance) {
        ctx.log.neg(format!(
            "The team is spent (morale {morale:.0}). Staff insist on calling time at {now}."
        ));
        Some(CloseReason::StaffExhausted)
    } else {
        None
    }
}

pub(crate) fn accrue_daily_wages(ctx: &mut SimContext<'_>) {
    for member in ctx.sim.roster.iter_mut() {
        member.accrue_daily_wage();
    }
}

/// Wage bill after upgrade-driven efficiency.
pub(crate) fn wages_due(sim: &SimulationState) -> f64 {
    sim.roster.total_accrued() * (1.0 - sim.upgrades.effects.wage_efficiency)
}

pub(crate) fn handle_wages_paid(ctx: &mut SimContext<'_>) {
    for member in ctx.sim.roster.iter_mut() {
        member.cash_out();
    }
    let staffing = &mut ctx.sim.staffing;
    staffing.missed_wage_weeks = 0;
    staffing.wages_paid_last_week = true;
    staffing.wages_paid_streak += 1;
    if staffing.wages_paid_streak >= 2 {
        ctx.sim.credit.adjust_score(3);
        ctx.sim.credit.supplier.adjust_trust_penalty(-0.01);
    }
}

/// Partial pay settles the same share of everybody's balance.
pub(crate) fn settle_partial_wages(ctx: &mut SimContext<'_>, share: f64) {
    let keep = (1.0 - share).clamp(0.0, 1.0);
    for member in ctx.sim.roster.iter_mut() {
        member.accrued_wage *= keep;
    }
}

pub(crate) fn handle_wages_missed(ctx: &mut SimContext<'_>) {
    ctx.sim.staffing.missed_wage_weeks += 1;
    ctx.sim.staffing.wages_paid_streak = 0;
    ctx.sim.staffing.wages_paid_last_week = false;
    let strike = ctx.sim.staffing.missed_wage_weeks;
    let penalty = &WAGE_MISS_PENALTIES[(strike as usize - 1).min(WAGE_MISS_PENALTIES.len() - 1)];

    ctx.log.neg(format!(
        "Payroll missed ({} week(s) running). The staff are furious.",
        strike
    ));
    ctx.sim.roster.adjust_all_morale(penalty.morale);
    let mut walked = Vec::new();
    for _ in 0..penalty.walkouts {
        let Some(lowest) = ctx.sim.roster.lowest_morale() else {
            break;
        };
        if lowest.morale > 20.0 {
            break;
        }
        let id = lowest.id;
        if let Some(member) = ctx.sim.roster.remove(id) {
            walked.push(member.name());
        }
    }
    if !walked.is_empty() {
        ctx.sim.week.staff_departures += walked.len() as u32;
        ctx.log.neg(format!("Walked out over unpaid wages: {}.", walked.join(", ")));
    }
    let rep = ctx.apply_rep(penalty.rep);
    ctx.sim.credit.adjust_score(penalty.score);
    ctx.sim.chaos.adjust(penalty.chaos);
    let staffing = &mut ctx.sim.staffing;
    staffing.traffic_penalty = penalty.traffic;
    staffing.traffic_penalty_rounds = penalty.traffic_rounds;
    if penalty.serve_weeks > 0 {
        staffing.serve_penalty = penalty.serve;
        staffing.serve_penalty_weeks = penalty.serve_weeks;
    }
    ctx.sim.credit.supplier.adjust_trust_penalty(penalty.trust);
    ctx.log.neg(format!(
        "Reputation {rep:+}, credit score {:+}, chaos +{:.0}.",
        penalty.score, penalty.chaos
    ));
    if strike >= 3 {
        ctx.sim.credit.banks_locked = true;
        ctx.sim.game_over = Some(GameOverReason::WageCollapse);
        ctx.log.header("WAGE COLLAPSE: the banks have pulled out and the staff are gone for good.");
    }
    refresh_food_rack(ctx);
}

/// Counts down the weekly serve penalty left by missed payrolls.
pub(crate) fn tick_serve_penalty(ctx: &mut SimContext<'_>) {
    let staffing = &mut ctx.sim.staffing;
    if staffing.serve_penalty_weeks > 0 {
        staffing.serve_penalty_weeks -= 1;
        if staffing.serve_penalty_weeks == 0 {
            staffing.serve_penalty = 0.0;
        }
    }
}
