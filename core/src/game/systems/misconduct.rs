use rand::Rng;

use crate::game::context::SimContext;
use crate::game::economy::CostKind;
use crate::game::rumor::{RumorSource, RumorTopic};
use crate::game::staff::Department;
use crate::game::systems::workload::WorkloadProfile;
use crate::game::world::SimulationState;
use crate::game::{MISCONDUCT_CHANCE_MAX, MISCONDUCT_CHANCE_MIN};

const BASE_CHANCE: f64 = 0.04;
const TEAM_MORALE_LINE: f64 = 55.0;
const TEAM_MORALE_STEP: f64 = 0.002;
const LOW_MORALE_LINE: f64 = 35.0;
const LOW_MORALE_STEP: f64 = 0.003;
const CHAOS_STEP: f64 = 0.0018;
const CHAOS_CAP: f64 = 0.12;
const SECURITY_STEP: f64 = 0.04;
const SECURITY_CAP: f64 = 0.45;

/// What a member of staff got up to this round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Misconduct {
    FreeDrinks,
    TillShort,
    ManagementInsult,
    Flirting,
    CompromisingBreak,
    IngredientsMissing,
    HygieneSlip,
    WastedBatch,
    KitchenArgument,
    KitchenHero,
}

impl Misconduct {
    fn front_of_house(roll: u32) -> Self {
        match roll {
            0..24 => Misconduct::FreeDrinks,
            24..46 => Misconduct::TillShort,
            46..64 => Misconduct::ManagementInsult,
            64..82 => Misconduct::Flirting,
            _ => Misconduct::CompromisingBreak,
        }
    }

    fn kitchen(roll: u32) -> Self {
        match roll {
            0..26 => Misconduct::IngredientsMissing,
            26..50 => Misconduct::HygieneSlip,
            50..74 => Misconduct::WastedBatch,
            74..92 => Misconduct::KitchenArgument,
            _ => Misconduct::KitchenHero,
        }
    }
}

/// Per-round chance that someone on shift misbehaves.
pub(crate) fn misconduct_chance(sim: &SimulationState, security: i32, workload: &WorkloadProfile) -> f64 {
    let mut chance = BASE_CHANCE;
    let team = sim.roster.team_morale();
    if team < TEAM_MORALE_LINE {
        chance += (TEAM_MORALE_LINE - team) * TEAM_MORALE_STEP;
    }
    if let Some(lowest) = sim.roster.lowest_morale()
        && lowest.morale < LOW_MORALE_LINE
    {
        chance += (LOW_MORALE_LINE - lowest.morale) * LOW_MORALE_STEP;
    }
    chance += (sim.chaos.value() * CHAOS_STEP).min(CHAOS_CAP);
    if sim.rumors.heat(RumorTopic::StaffStealing) > 0 {
        chance += 0.02;
    }
    if sim.rumors.heat(RumorTopic::SlowService) > 0 {
        chance += 0.01;
    }
    chance *= 1.0 - (security.max(0) as f64 * SECURITY_STEP).min(SECURITY_CAP);
    chance *= (1.0 - sim.upgrades.effects.misconduct_reduction).max(0.0);
    chance *= workload.misconduct_multiplier();
    chance *= sim.debt.multipliers().misconduct;
    chance.clamp(MISCONDUCT_CHANCE_MIN, MISCONDUCT_CHANCE_MAX)
}

/// Picks an offender from bar and kitchen staff on shift, weighted towards the unhappy.
fn pick_offender(ctx: &mut SimContext<'_>) -> Option<(u32, Department)> {
    let pool: Vec<(u32, Department, f64)> = ctx
        .sim
        .roster
        .on_shift()
        .filter(|m| matches!(m.department(), Department::FrontOfHouse | Department::Kitchen))
        .map(|m| (m.id, m.department(), (101.0 - m.morale).max(1.0)))
        .collect();
    let total: f64 = pool.iter().map(|(_, _, weight)| weight).sum();
    if pool.is_empty() || total <= 0.0 {
        return None;
    }
    let mut roll = ctx.rng.gen_range(0.0..total);
    for (id, department, weight) in &pool {
        if roll < *weight {
            return Some((*id, *department));
        }
        roll -= weight;
    }
    pool.last().map(|(id, department, _)| (*id, *department))
}

/// Rolls for staff misconduct this round. Returns true when something happened.
pub(crate) fn roll_misconduct(ctx: &mut SimContext<'_>, security: i32, workload: &WorkloadProfile) -> bool {
    let chance = misconduct_chance(ctx.sim, security, workload);
    if ctx.rng.gen_range(0.0..1.0) >= chance {
        return false;
    }
    let Some((offender, department)) = pick_offender(ctx) else {
        return false;
    };
    let roll = ctx.rng.gen_range(0..100);
    let kind = match department {
        Department::Kitchen => Misconduct::kitchen(roll),
        _ => Misconduct::front_of_house(roll),
    };
    apply(ctx, offender, kind);
    ctx.sim.night.counters.staff_incidents += 1;
    true
}

fn till_loss(ctx: &mut SimContext<'_>, amount: f64) -> f64 {
    let taken = ctx.sim.ledger.withdraw(amount);
    ctx.sim.ledger.book_cost(CostKind::Other, taken);
    taken
}

fn kitchen_cost(ctx: &mut SimContext<'_>, amount: f64, label: &str) {
    ctx.try_pay(amount, CostKind::Supplies, label);
}

/// Drains food stock, or returns false when the rack is too bare to matter.
fn drain_food(ctx: &mut SimContext<'_>, min: u32, max: u32) -> bool {
    if ctx.sim.inventory.food.count() < min {
        return false;
    }
    let units = ctx.rng.gen_range(min..=max);
    let removed = ctx.sim.inventory.food.remove_random(units, &mut *ctx.rng);
    removed > 0
}

fn staff_rumor(ctx: &mut SimContext<'_>, topic: RumorTopic, heat: u32) {
    ctx.sim.rumors.add_heat(topic, heat, RumorSource::Staff);
}

pub(crate) fn apply(ctx: &mut SimContext<'_>, offender: u32, kind: Misconduct) {
    let name = ctx
        .sim
        .roster
        .get(offender)
        .map(|m| m.name())
        .unwrap_or_else(|| "A member of staff".to_string());
    match kind {
        Misconduct::FreeDrinks => {
            let loss = 8.0 + ctx.rng.gen_range(0..14) as f64;
            let taken = till_loss(ctx, loss);
            staff_rumor(ctx, RumorTopic::StaffStealing, 10);
            ctx.log.neg(format!("{name} poured free drinks for mates (-GBP {taken:.0})."));
        }
        Misconduct::TillShort => {
            let loss = 12.0 + ctx.rng.gen_range(0..18) as f64;
            let taken = till_loss(ctx, loss);
            staff_rumor(ctx, RumorTopic::StaffStealing, 12);
            ctx.log.neg(format!("The till came up short on {name}'s shift (-GBP {taken:.0})."));
        }
        Misconduct::ManagementInsult => {
            ctx.apply_rep(-2);
            staff_rumor(ctx, RumorTopic::DodgyLateNights, 8);
            ctx.log.neg(format!("{name} mouthed off about management in front of punters."));
        }
        Misconduct::Flirting => {
            let tips = ctx.rng.gen_range(4..=9) as f64;
            ctx.sim.ledger.record_tip(tips);
            ctx.apply_rep(1);
            if ctx.rng.gen_bool(0.35) {
                staff_rumor(ctx, RumorTopic::FriendlyStaff, 8);
            }
            ctx.log.pos(format!("{name} charmed the regulars (+GBP {tips:.0} tips)."));
        }
        Misconduct::CompromisingBreak => {
            if let Some(member) = ctx.sim.roster.get_mut(offender) {
                member.adjust_morale(-2.0);
            }
            ctx.apply_rep(-1);
            staff_rumor(ctx, RumorTopic::SlowService, 6);
            ctx.log.neg(format!("{name} was caught on a very long break."));
        }
        Misconduct::IngredientsMissing => {
            if !drain_food(ctx, 2, 4) {
                let cost = ctx.rng.gen_range(10..=21) as f64;
                kitchen_cost(ctx, cost, "replacement ingredients");
            }
            staff_rumor(ctx, RumorTopic::FoodPoisoningScare, 6);
            ctx.log.neg(format!("Ingredients went missing from the kitchen on {name}'s watch."));
        }
        Misconduct::HygieneSlip => {
            let cost = ctx.rng.gen_range(8..=19) as f64;
            kitchen_cost(ctx, cost, "a deep clean");
            ctx.apply_rep(-2);
            ctx.sim.night.counters.food_misses += 1;
            staff_rumor(ctx, RumorTopic::FoodPoisoningScare, 10);
            ctx.log.neg(format!("{name} let hygiene slip; a plate went back."));
        }
        Misconduct::WastedBatch => {
            if !drain_food(ctx, 2, 5) {
                let cost = ctx.rng.gen_range(12..=27) as f64;
                kitchen_cost(ctx, cost, "a wasted batch");
            }
            ctx.sim.night.counters.food_misses += 1;
            staff_rumor(ctx, RumorTopic::SlowService, 6);
            ctx.log.neg(format!("{name} binned a whole batch."));
        }
        Misconduct::KitchenArgument => {
            for member in ctx.sim.roster.iter_mut() {
                if member.department() == Department::Kitchen {
                    member.adjust_morale(-2.0);
                }
            }
            staff_rumor(ctx, RumorTopic::DodgyLateNights, 6);
            ctx.log.neg("A shouting match broke out in the kitchen.");
        }
        Misconduct::KitchenHero => {
            if let Some(member) = ctx.sim.roster.get_mut(offender) {
                member.adjust_morale(2.0);
            }
            ctx.apply_rep(1);
            if ctx.rng.gen_bool(0.5) {
                staff_rumor(ctx, RumorTopic::BestSundayRoast, 8);
            }
            ctx.log.pos(format!("{name} saved the service with a brilliant plate."));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::context::testing::Fixture;
    use crate::game::staff::{StaffRole, test_member};

    #[test]
    fn chance_is_always_bounded() {
        let mut fx = Fixture::new(9);
        let calm = WorkloadProfile::compute(1, 10);
        fx.sim.upgrades.effects.misconduct_reduction = 0.9;
        assert_eq!(misconduct_chance(&fx.sim, 30, &calm), MISCONDUCT_CHANCE_MIN);

        fx.sim.roster.push(test_member(1, StaffRole::Trainee, 0.0));
        fx.sim.chaos.set(100.0);
        fx.sim.rumors.add_heat(RumorTopic::StaffStealing, 40, RumorSource::Staff);
        for _ in 0..4 {
            fx.sim.debt.record_week(false);
        }
        let swamped = WorkloadProfile::compute(60, 2);
        assert_eq!(misconduct_chance(&fx.sim, 0, &swamped), MISCONDUCT_CHANCE_MAX);
    }

    #[test]
    fn low_morale_raises_the_odds() {
        let mut fx = Fixture::new(9);
        let workload = WorkloadProfile::compute(4, 8);
        fx.sim.roster.push(test_member(1, StaffRole::Trainee, 80.0));
        let happy = misconduct_chance(&fx.sim, 0, &workload);
        if let Some(member) = fx.sim.roster.get_mut(1) {
            member.morale = 10.0;
        }
        let miserable = misconduct_chance(&fx.sim, 0, &workload);
        assert!(miserable > happy);
    }

    #[test]
    fn outcome_bands_cover_every_roll() {
        assert_eq!(Misconduct::front_of_house(0), Misconduct::FreeDrinks);
        assert_eq!(Misconduct::front_of_house(63), Misconduct::ManagementInsult);
        assert_eq!(Misconduct::front_of_house(99), Misconduct::CompromisingBreak);
        assert_eq!(Misconduct::kitchen(49), Misconduct::HygieneSlip);
        assert_eq!(Misconduct::kitchen(92), Misconduct::KitchenHero);
    }

    #[test]
    fn nobody_on_shift_means_nothing_happens() {
        let mut fx = Fixture::new(9);
        let workload = WorkloadProfile::compute(40, 1);
        fx.sim.chaos.set(100.0);
        for _ in 0..100 {
            assert!(!roll_misconduct(&mut fx.ctx(), 0, &workload));
        }
        assert_eq!(fx.sim.night.counters.staff_incidents, 0);
    }

    #[test]
    fn till_shortage_takes_cash_and_feeds_rumors() {
        let mut fx = Fixture::new(9);
        fx.sim.roster.push(test_member(1, StaffRole::Trainee, 20.0));
        let cash = fx.sim.ledger.cash();
        apply(&mut fx.ctx(), 1, Misconduct::TillShort);
        let lost = cash - fx.sim.ledger.cash();
        assert!((12.0..30.0).contains(&lost));
        assert_eq!(fx.sim.rumors.heat(RumorTopic::StaffStealing), 12);
        assert_eq!(fx.sim.ledger.week().cost_of(CostKind::Other), lost);
    }

    #[test]
    fn hygiene_slip_counts_a_food_miss() {
        let mut fx = Fixture::new(9);
        fx.sim.roster.push(test_member(1, StaffRole::ChefDePartie, 20.0));
        apply(&mut fx.ctx(), 1, Misconduct::HygieneSlip);
        assert_eq!(fx.sim.night.counters.food_misses, 1);
        assert!(fx.sim.rumors.heat(RumorTopic::FoodPoisoningScare) >= 10);
    }
}
