use rand::Rng;

use crate::game::context::SimContext;
use crate::game::economy::CostKind;
use crate::game::rejection::Rejection;
use crate::game::security::{
    Bouncer, BouncerQuality, SecurityBreakdown, SecurityPolicy, SecurityTask, task_tier,
    task_tier_requirement,
};
use crate::game::staff::{Department, StaffRole};
use crate::game::world::SimulationState;
use crate::game::{
    CHAOS_INCIDENT_SCALE, DAMAGE_MULTIPLIER_FLOOR, REP_HIGH_BAND, REP_LOW_BAND,
    REP_MITIGATION_FLOOR, SECURITY_CHANCE_FLOOR, SECURITY_CHANCE_SLOPE, SECURITY_DAMAGE_FLOOR,
    SECURITY_DAMAGE_SLOPE,
};

const BOUNCER_SECURITY: i32 = 2;
const BOUNCER_BASE_PAY: f64 = 33.0;
const BOUNCER_PAY_STEP: f64 = 0.10;

pub(crate) fn breakdown(sim: &SimulationState) -> SecurityBreakdown {
    let base = sim.security.base_level;
    let legacy = sim.prestige.legacy.security;
    let upgrades = sim.upgrades.effects.security;
    let policy = sim.security.policy.security_bonus();
    let bouncers = sim.security.door.len() as i32 * BOUNCER_SECURITY;
    let manager = if sim.roster.has_role_on_shift(StaffRole::Manager) {
        1
    } else {
        0
    };
    let staff = sim
        .roster
        .on_shift()
        .filter(|m| m.department() == Department::FrontOfHouse)
        .map(|m| m.security_bonus)
        .sum::<i32>();
    let total = (base + legacy + upgrades + policy + bouncers + manager + staff).max(0);
    SecurityBreakdown {
        base,
        legacy,
        upgrades,
        policy,
        bouncers,
        manager,
        staff,
        total,
    }
}

pub(crate) fn effective(sim: &SimulationState) -> i32 {
    breakdown(sim).total
}

/// Reputation bands shift both how often trouble finds the pub and how badly it lands.
fn reputation_factors(reputation: i32) -> (f64, f64) {
    if reputation >= REP_HIGH_BAND {
        (0.85, 0.90)
    } else if reputation <= REP_LOW_BAND {
        (1.20, 1.15)
    } else {
        (1.0, 1.0)
    }
}

pub(crate) fn chaos_factor(chaos: f64) -> f64 {
    1.0 + chaos / 100.0 * CHAOS_INCIDENT_SCALE
}

/// Multiplier on every between-night incident's base chance.
pub(crate) fn chance_multiplier(sim: &SimulationState, season: f64) -> f64 {
    let security = effective(sim) as f64;
    let curve = (1.0 - security * SECURITY_CHANCE_SLOPE).max(SECURITY_CHANCE_FLOOR);
    let guarded = (curve
        * sim.security.policy.incident_multiplier()
        * task_incident_multiplier(sim)
        * sim.upgrades.effects.incident_chance_multiplier)
        .max(SECURITY_CHANCE_FLOOR);
    let (rep_factor, _) = reputation_factors(sim.reputation);
    guarded * rep_factor * chaos_factor(sim.chaos.value()) * season
}

/// Multiplier on incident costs and reputation damage.
pub(crate) fn damage_multiplier(sim: &SimulationState) -> f64 {
    let security = effective(sim) as f64;
    let curve = (1.0 - security * SECURITY_DAMAGE_SLOPE).max(SECURITY_DAMAGE_FLOOR);
    let reduced =
        (curve * (1.0 - sim.upgrades.effects.damage_reduction)).max(DAMAGE_MULTIPLIER_FLOOR);
    let (_, rep_factor) = reputation_factors(sim.reputation);
    reduced * rep_factor * chaos_factor(sim.chaos.value())
}

pub(crate) fn rep_mitigation_multiplier(sim: &SimulationState) -> f64 {
    (sim.security.door.rep_damage_multiplier() * (1.0 - sim.upgrades.effects.rep_mitigation))
        .max(REP_MITIGATION_FLOOR)
}

/// Softens a reputation hit. A negative hit never rounds away to nothing.
pub(crate) fn mitigate_rep_hit(sim: &SimulationState, raw: i32) -> i32 {
    if raw >= 0 {
        return raw;
    }
    let mitigated = (raw as f64 * rep_mitigation_multiplier(sim)).round() as i32;
    mitigated.min(-1)
}

pub(crate) fn upgrade_cost(level: i32) -> f64 {
    let level = level.max(0) as f64;
    22.0 + 5.0 * level + 1.14_f64.powf(level) * 12.0
}

pub(crate) fn upgrade_security(ctx: &mut SimContext<'_>) -> Result<i32, Rejection> {
    let cost = upgrade_cost(ctx.sim.security.base_level);
    if !ctx.try_pay(cost, CostKind::Security, "a security upgrade") {
        return Err(Rejection::InsufficientFunds { needed: cost });
    }
    ctx.sim.security.base_level += 1;
    let level = ctx.sim.security.base_level;
    ctx.log.pos(format!(
        "Security upgraded to level {level} for GBP {cost:.2}. Upkeep is now GBP {:.2} a day.",
        daily_upkeep(ctx.config.security_upkeep_per_level, level)
    ));
    Ok(level)
}

pub(crate) fn daily_upkeep(per_level: f64, level: i32) -> f64 {
    per_level * level.max(0) as f64
}

pub(crate) fn accrue_upkeep(ctx: &mut SimContext<'_>) {
    let upkeep = daily_upkeep(ctx.config.security_upkeep_per_level, ctx.sim.security.base_level);
    ctx.sim.security.upkeep_accrued += upkeep;
}

pub(crate) fn set_policy(ctx: &mut SimContext<'_>, policy: SecurityPolicy) {
    if ctx.sim.security.policy == policy {
        ctx.log.info(format!("Door policy is already {}.", policy.label()));
        return;
    }
    ctx.sim.security.policy = policy;
    ctx.log.info(format!("Door policy set to {}.", policy.label()));
}

fn active_task(sim: &SimulationState) -> Option<SecurityTask> {
    if !sim.night.open {
        return None;
    }
    sim.security.tasks.active(sim.night.round)
}

pub(crate) fn task_incident_multiplier(sim: &SimulationState) -> f64 {
    active_task(sim).map_or(1.0, SecurityTask::incident_multiplier)
}

pub(crate) fn task_traffic_multiplier(sim: &SimulationState) -> f64 {
    active_task(sim).map_or(1.0, SecurityTask::traffic_multiplier)
}

/// Why `task` cannot be resolved right now, checked in the order the door sees it.
pub(crate) fn task_availability(sim: &SimulationState, task: SecurityTask) -> Result<(), Rejection> {
    if !sim.night.open {
        return Err(Rejection::PubClosed);
    }
    if task.tier() > task_tier(sim.security.base_level) {
        return Err(Rejection::locked(
            task.label(),
            format!("needs base security {}", task_tier_requirement(task.tier())),
        ));
    }
    if sim.security.tasks.last_task_round == Some(sim.night.round) {
        return Err(Rejection::TaskAlreadyQueued);
    }
    let rounds = sim.security.tasks.cooldown(task);
    if rounds > 0 {
        return Err(Rejection::Cooldown {
            id: task.key().to_string(),
            rounds,
        });
    }
    Ok(())
}

/// Queues a door task for the next round.
pub(crate) fn resolve_security_task(
    ctx: &mut SimContext<'_>,
    task: SecurityTask,
) -> Result<SecurityTask, Rejection> {
    if let Err(rejection) = task_availability(ctx.sim, task) {
        return Err(ctx.reject(rejection));
    }
    let round = ctx.sim.night.round;
    ctx.sim.security.tasks.queue(task, round);
    ctx.log.info(format!(
        "{} queued for next round (incidents x{:.2}, traffic x{:.2}).",
        task.label(),
        task.incident_multiplier(),
        task.traffic_multiplier()
    ));
    Ok(task)
}

pub(crate) fn hire_bouncer(ctx: &mut SimContext<'_>) -> Result<BouncerQuality, Rejection> {
    if !ctx.sim.night.open {
        return Err(ctx.reject(Rejection::PubClosed));
    }
    let cap = ctx.config.bouncer_cap + ctx.sim.upgrades.effects.bouncer_cap;
    let hired = ctx.sim.security.door.len() as u32;
    if hired >= cap {
        return Err(ctx.reject(Rejection::CapReached(format!("{cap} bouncer(s) tonight"))));
    }
    let pay = (BOUNCER_BASE_PAY + ctx.rng.gen_range(0.0..=BOUNCER_BASE_PAY))
        * (1.0 + BOUNCER_PAY_STEP * hired as f64);
    if !ctx.try_pay(pay, CostKind::Bouncers, "a bouncer") {
        return Err(Rejection::InsufficientFunds { needed: pay });
    }
    let quality = BouncerQuality::from_roll(ctx.rng.gen_range(0..100));
    let bouncer = Bouncer {
        quality,
        theft_reduction: ctx.rng.gen_range(0.10..=0.40),
        negative_reduction: ctx.rng.gen_range(0.10..=0.40),
        fight_reduction: ctx.rng.gen_range(0.10..=0.40),
        nightly_pay: pay,
    };
    ctx.sim.security.door.bouncers.push(bouncer);
    ctx.log.pos(format!(
        "Hired a {:?} bouncer for GBP {pay:.2} tonight.",
        quality
    ));
    Ok(quality)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::context::testing::Fixture;

    #[test]
    fn breakdown_sums_every_source() {
        let mut fx = Fixture::new(3);
        fx.sim.security.base_level = 2;
        fx.sim.security.policy = SecurityPolicy::StrictDoor;
        fx.sim.upgrades.effects.security = 3;
        let b = breakdown(&fx.sim);
        assert_eq!(b.base, 2);
        assert_eq!(b.policy, 1);
        assert_eq!(b.upgrades, 3);
        assert_eq!(b.total, 6);
    }

    #[test]
    fn effective_security_is_never_negative() {
        let mut fx = Fixture::new(3);
        fx.sim.security.base_level = 0;
        fx.sim.security.policy = SecurityPolicy::FriendlyWelcome;
        assert_eq!(effective(&fx.sim), 0);
    }

    #[test]
    fn chance_curve_has_a_floor() {
        let mut fx = Fixture::new(3);
        fx.sim.security.base_level = 40;
        let multiplier = chance_multiplier(&fx.sim, 1.0);
        assert!((multiplier - SECURITY_CHANCE_FLOOR).abs() < 1e-9);
    }

    #[test]
    fn damage_multiplier_respects_both_floors() {
        let mut fx = Fixture::new(3);
        fx.sim.security.base_level = 40;
        fx.sim.upgrades.effects.damage_reduction = 0.45;
        let multiplier = damage_multiplier(&fx.sim);
        assert!((multiplier - 0.25).abs() < 1e-9);
    }

    #[test]
    fn mitigated_hits_stay_negative() {
        let mut fx = Fixture::new(3);
        fx.sim.upgrades.effects.rep_mitigation = 0.5;
        assert_eq!(mitigate_rep_hit(&fx.sim, -1), -1);
        assert_eq!(mitigate_rep_hit(&fx.sim, -10), -5);
        assert_eq!(mitigate_rep_hit(&fx.sim, 4), 4);
    }

    #[test]
    fn bouncers_need_an_open_pub() {
        let mut fx = Fixture::new(3);
        assert_eq!(hire_bouncer(&mut fx.ctx()), Err(Rejection::PubClosed));
        fx.sim.night.open = true;
        assert!(hire_bouncer(&mut fx.ctx()).is_ok());
        assert!(hire_bouncer(&mut fx.ctx()).is_ok());
        assert!(matches!(
            hire_bouncer(&mut fx.ctx()),
            Err(Rejection::CapReached(_))
        ));
        assert_eq!(breakdown(&fx.sim).bouncers, 4);
    }

    fn open_with_security(fx: &mut Fixture, base: i32) {
        fx.sim.night.open = true;
        fx.sim.security.base_level = base;
    }

    #[test]
    fn tasks_are_refused_in_door_order() {
        let mut fx = Fixture::new(3);
        assert_eq!(
            resolve_security_task(&mut fx.ctx(), SecurityTask::VisiblePatrol),
            Err(Rejection::PubClosed)
        );
        open_with_security(&mut fx, 4);
        assert!(matches!(
            resolve_security_task(&mut fx.ctx(), SecurityTask::VisiblePatrol),
            Err(Rejection::Locked { ref reason, .. }) if reason == "needs base security 5"
        ));
        fx.sim.security.base_level = 5;
        assert!(matches!(
            resolve_security_task(&mut fx.ctx(), SecurityTask::HardLineDoor),
            Err(Rejection::Locked { .. })
        ));
        assert_eq!(
            resolve_security_task(&mut fx.ctx(), SecurityTask::CheckIds),
            Ok(SecurityTask::CheckIds)
        );
        assert_eq!(
            resolve_security_task(&mut fx.ctx(), SecurityTask::VisiblePatrol),
            Err(Rejection::TaskAlreadyQueued)
        );
        fx.sim.night.round += 1;
        fx.sim.security.tasks.tick();
        assert_eq!(
            resolve_security_task(&mut fx.ctx(), SecurityTask::CheckIds),
            Err(Rejection::Cooldown {
                id: "check_ids".into(),
                rounds: 1
            })
        );
        assert!(fx.logged("Check IDs queued for next round"));
    }

    #[test]
    fn an_active_task_shapes_incidents_and_traffic() {
        let mut fx = Fixture::new(3);
        open_with_security(&mut fx, 30);
        resolve_security_task(&mut fx.ctx(), SecurityTask::ZeroToleranceNight).expect("tier 3");
        assert_eq!(task_traffic_multiplier(&fx.sim), 1.0);
        fx.sim.night.round += 1;
        assert_eq!(task_traffic_multiplier(&fx.sim), 0.93);
        assert_eq!(task_incident_multiplier(&fx.sim), 0.80);
        fx.sim.security.base_level = 0;
        let unguarded = chance_multiplier(&fx.sim, 1.0);
        fx.sim.security.tasks.finish_round(fx.sim.night.round);
        assert!(unguarded < chance_multiplier(&fx.sim, 1.0));
    }

    #[test]
    fn legacy_security_counts_toward_the_total() {
        let mut fx = Fixture::new(3);
        fx.sim.security.base_level = 2;
        fx.sim.prestige.legacy.security = 3;
        let b = breakdown(&fx.sim);
        assert_eq!(b.legacy, 3);
        assert_eq!(b.total, 5);
    }

    #[test]
    fn security_upgrades_get_pricier() {
        assert!(upgrade_cost(5) > upgrade_cost(4));
        assert!((upgrade_cost(0) - 34.0).abs() < 1e-9);
    }
}
