use tracing::info;

use crate::game::config::EngineConfig;
use crate::game::context::SimContext;
use crate::game::prestige::{LegacyBonuses, MAX_STARS, star_factor};
use crate::game::rejection::Rejection;
use crate::game::world::SimulationState;
use crate::game::PUB_LEVEL_MAX;

use super::upgrades;

/// Milestones a run needs before it can be banked.
pub(crate) const PRESTIGE_MILESTONES: usize = 8;

/// What the current upgrades would bank before the star factor.
pub(crate) fn base_award(sim: &SimulationState, config: &EngineConfig) -> LegacyBonuses {
    let effects = &sim.upgrades.effects;
    let racks = (effects.drink_rack + effects.food_rack) as f64;
    // Banked rooms are left out so a legacy never compounds on itself.
    let rooms = if effects.inn_unlocked {
        (config.inn_rooms + effects.inn_rooms) as f64
    } else {
        0.0
    };
    LegacyBonuses {
        rack_capacity: ((racks * 0.12).round() as u32).min(80),
        inn_rooms: ((rooms * 0.08).round() as u32).min(12),
        traffic: ((effects.traffic_multiplier - 1.0).max(0.0) * 0.20).min(0.12),
        trade_credit: (sim.upgrades.owned.len() as f64 * 12.0).min(320.0),
        security: effects.security.clamp(0, 6),
        staff_efficiency: (effects.wage_efficiency.max(0.0) * 0.60).min(0.10),
    }
}

pub(crate) fn award(sim: &SimulationState, config: &EngineConfig) -> LegacyBonuses {
    base_award(sim, config).scaled(star_factor(sim.prestige.next_star()))
}

fn check_eligible(sim: &SimulationState) -> Result<(), Rejection> {
    if sim.night.open {
        return Err(Rejection::PubOpen);
    }
    if sim.prestige.is_maxed() {
        return Err(Rejection::CapReached(format!("{MAX_STARS} stars")));
    }
    if sim.pub_level < PUB_LEVEL_MAX {
        return Err(Rejection::Requirement(format!(
            "pub level {PUB_LEVEL_MAX} (currently {})",
            sim.pub_level
        )));
    }
    let have = sim.milestones.count();
    if have < PRESTIGE_MILESTONES {
        return Err(Rejection::Requirement(format!(
            "{PRESTIGE_MILESTONES} milestones this run ({have} so far)"
        )));
    }
    Ok(())
}

pub(crate) fn is_eligible(sim: &SimulationState) -> bool {
    check_eligible(sim).is_ok()
}

/// Banks the run: a star and its legacy bonuses in exchange for the pub
/// level, every upgrade and this run's milestones.
pub(crate) fn prestige(ctx: &mut SimContext<'_>) -> Result<LegacyBonuses, Rejection> {
    if let Err(rejection) = check_eligible(ctx.sim) {
        return Err(ctx.reject(rejection));
    }
    let award = award(ctx.sim, ctx.config);
    let week = ctx.week();
    let prestige = &mut ctx.sim.prestige;
    prestige.legacy.add(&award);
    prestige.stars += 1;
    prestige.run_started_week = week;
    let stars = prestige.stars;
    ctx.sim.credit.supplier.base_cap += award.trade_credit;

    ctx.sim.milestones.reset_run();
    ctx.sim.pub_level = 0;
    ctx.sim.ledger.reset_progression();
    let stripped = upgrades::repossess_all(ctx);

    info!(stars, "prestige banked");
    ctx.log.header(format!("PRESTIGE: STAR {stars}"));
    ctx.log.pos(format!("Banked for good: {}.", award.summary()));
    if !stripped.is_empty() {
        ctx.log
            .neg(format!("Refitted from scratch: {}.", stripped.join(", ")));
    }
    Ok(award)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::context::testing::Fixture;
    use crate::game::milestones::Milestone;
    use crate::game::systems::upgrades::refresh_effects;

    fn ready(fx: &mut Fixture) {
        fx.sim.pub_level = PUB_LEVEL_MAX;
        fx.sim.milestones.achieved = Milestone::ALL[..PRESTIGE_MILESTONES].to_vec();
    }

    #[test]
    fn prestige_needs_level_and_milestones() {
        let mut fx = Fixture::new(50);
        assert!(matches!(
            prestige(&mut fx.ctx()),
            Err(Rejection::Requirement(_))
        ));
        fx.sim.pub_level = PUB_LEVEL_MAX;
        fx.sim.milestones.achieved = vec![Milestone::OpenForBusiness];
        let refused = prestige(&mut fx.ctx());
        assert!(matches!(refused, Err(Rejection::Requirement(ref why)) if why.contains("1 so far")));
        ready(&mut fx);
        fx.sim.night.open = true;
        assert_eq!(prestige(&mut fx.ctx()), Err(Rejection::PubOpen));
        fx.sim.night.open = false;
        assert!(prestige(&mut fx.ctx()).is_ok());
    }

    #[test]
    fn the_award_comes_from_upgrades_and_decays_by_star() {
        let mut fx = Fixture::new(50);
        fx.sim.upgrades.effects.security = 9;
        fx.sim.upgrades.effects.drink_rack = 100;
        fx.sim.upgrades.effects.traffic_multiplier = 1.30;
        fx.sim.upgrades.owned = vec!["a".into(), "b".into()];
        let base = base_award(&fx.sim, &fx.config);
        assert_eq!(base.security, 6);
        assert_eq!(base.rack_capacity, 12);
        assert!((base.traffic - 0.06).abs() < 1e-9);
        assert_eq!(base.trade_credit, 24.0);

        fx.sim.prestige.stars = 2;
        let third = award(&fx.sim, &fx.config);
        assert_eq!(third.security, 3);
        assert_eq!(third.rack_capacity, 6);
    }

    #[test]
    fn prestige_banks_legacy_and_resets_the_run() {
        let mut fx = Fixture::new(50);
        fx.sim.upgrades.owned.push("pool_table".into());
        refresh_effects(&mut fx.ctx());
        fx.sim.upgrades.effects.security = 4;
        ready(&mut fx);
        let cap_before = fx.sim.credit.supplier.base_cap;

        let award = prestige(&mut fx.ctx()).expect("eligible");
        assert_eq!(fx.sim.prestige.stars, 1);
        assert_eq!(fx.sim.prestige.legacy.security, award.security);
        assert_eq!(fx.sim.pub_level, 0);
        assert!(fx.sim.upgrades.owned.is_empty());
        assert!(fx.logged("Pool Table"));
        assert_eq!(fx.sim.milestones.count(), 0);
        assert_eq!(fx.sim.credit.supplier.base_cap, cap_before + award.trade_credit);
        assert!(fx.logged("PRESTIGE: STAR 1"));
        assert!(!is_eligible(&fx.sim));
    }

    #[test]
    fn five_stars_is_the_ceiling() {
        let mut fx = Fixture::new(50);
        ready(&mut fx);
        fx.sim.prestige.stars = MAX_STARS;
        assert!(matches!(
            prestige(&mut fx.ctx()),
            Err(Rejection::CapReached(_))
        ));
    }
}
