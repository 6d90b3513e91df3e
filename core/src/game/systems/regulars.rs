use tracing::info;

use crate::game::context::SimContext;
use crate::game::regulars::{ArcStage, NightOutcome};
use crate::game::rumor::{RumorSource, RumorTopic};
use crate::game::world::ServiceCounters;

const ADVOCATE_REP: i32 = 4;
const BACKLASH_REP: i32 = -6;
const BACKLASH_HEAT: u32 = 10;

fn outcome(counters: &ServiceCounters, price_multiplier: f64) -> NightOutcome {
    let smooth_food = counters.food_misses == 0 && counters.refunds == 0;
    NightOutcome {
        unserved: counters.unserved,
        fights: counters.fights,
        events: counters.events,
        refunds: counters.refunds,
        price_multiplier,
        food_quality: if smooth_food { 0.8 } else { 0.3 },
    }
}

/// Every regular weighs up the night. Returns how many turned a corner.
pub(crate) fn after_night(ctx: &mut SimContext<'_>, counters: &ServiceCounters) -> usize {
    let night = outcome(counters, ctx.sim.price_multiplier);
    let turned: Vec<(String, ArcStage)> = ctx
        .sim
        .vips
        .regulars
        .iter_mut()
        .filter_map(|vip| vip.react(&night).map(|stage| (vip.name.clone(), stage)))
        .collect();

    for (name, stage) in &turned {
        match stage {
            ArcStage::Advocate => {
                ctx.sim.vips.advocate();
                let rep = ctx.apply_rep(ADVOCATE_REP);
                ctx.log.pos(format!(
                    "VIP advocate: {name} is championing the pub around the district. Rep {rep:+}."
                ));
            }
            ArcStage::Backlash => {
                ctx.sim.vips.backlash();
                let rep = ctx.apply_rep(BACKLASH_REP);
                ctx.sim
                    .rumors
                    .add_heat(RumorTopic::SlowService, BACKLASH_HEAT, RumorSource::Punter);
                let security = &mut ctx.sim.security;
                security.base_level = (security.base_level - 1).max(0);
                ctx.log.neg(format!(
                    "VIP backlash: {name} turned on the pub and the word is hostile. Rep {rep:+}."
                ));
            }
            _ => {}
        }
        info!(vip = %name, stage = stage.label(), "regular turned");
    }
    turned.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::regulars::VipArchetype;

    fn quiet_night() -> ServiceCounters {
        ServiceCounters::default()
    }

    #[test]
    fn a_good_night_tips_a_loyal_regular_into_advocacy() {
        let mut fx = crate::game::context::testing::Fixture::new(71);
        let vip = &mut fx.sim.vips.regulars[0];
        vip.archetype = VipArchetype::SocialButterfly;
        vip.loyalty = 84;
        vip.stage = ArcStage::Loyal;
        let rep = fx.sim.reputation;

        assert_eq!(after_night(&mut fx.ctx(), &quiet_night()), 1);
        assert!((fx.sim.vips.demand_boost - 1.05).abs() < 1e-9);
        assert!((fx.sim.vips.rumor_shield - 0.02).abs() < 1e-9);
        assert_eq!(fx.sim.reputation, rep + ADVOCATE_REP);
        assert!(fx.logged("VIP advocate:"));

        // Advocacy only fires the first time.
        let vip = &mut fx.sim.vips.regulars[0];
        vip.loyalty = 84;
        vip.stage = ArcStage::Loyal;
        assert_eq!(after_night(&mut fx.ctx(), &quiet_night()), 0);
    }

    #[test]
    fn a_rough_night_can_turn_a_regular_hostile() {
        let mut fx = crate::game::context::testing::Fixture::new(71);
        fx.sim.security.base_level = 2;
        let vip = &mut fx.sim.vips.regulars[0];
        vip.archetype = VipArchetype::Connoisseur;
        vip.loyalty = 18;
        vip.stage = ArcStage::Disgruntled;
        let counters = ServiceCounters {
            unserved: 5,
            fights: 2,
            refunds: 3,
            ..ServiceCounters::default()
        };

        assert_eq!(after_night(&mut fx.ctx(), &counters), 1);
        assert_eq!(fx.sim.vips.regulars[0].stage, ArcStage::Backlash);
        assert_eq!(fx.sim.security.base_level, 1);
        assert!(fx.sim.rumors.heat(RumorTopic::SlowService) >= BACKLASH_HEAT);
        assert!(fx.logged("VIP backlash:"));
    }
}
