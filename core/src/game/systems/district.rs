use rand::Rng;
use tracing::debug;

use crate::game::context::SimContext;
use crate::game::district::{DISTRICT_RIVALS, RivalPub, RivalStance};

pub(crate) fn pick_stance<R: Rng + ?Sized>(rival: &RivalPub, rng: &mut R) -> RivalStance {
    let weights = rival.stance_weights();
    let mut roll = rng.gen_range(0..weights.iter().sum::<u32>());
    for (stance, weight) in RivalStance::ALL.into_iter().zip(weights) {
        if roll < weight {
            return stance;
        }
        roll -= weight;
    }
    RivalStance::ChaosRecovery
}

/// Rolls every rival's stance for the coming week and recomputes the pressure.
pub(crate) fn weekly_update(ctx: &mut SimContext<'_>) {
    let stances: Vec<RivalStance> = DISTRICT_RIVALS
        .iter()
        .map(|rival| pick_stance(rival, &mut *ctx.rng))
        .collect();
    ctx.sim.district.apply(stances);

    let district = &ctx.sim.district;
    let Some(dominant) = district.dominant() else {
        ctx.log.info("District update: quiet week.");
        return;
    };
    let line = format!("Pressure: {}.", district.summary());
    ctx.log
        .info(format!("District: rivals leaned {} this week.", dominant.label()));
    ctx.log.info(line);
    for (rival, stance) in DISTRICT_RIVALS.iter().zip(&ctx.sim.district.stances) {
        debug!(rival = rival.name, stance = stance.label(), "rival stance");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::context::testing::Fixture;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn the_copper_fox_leans_towards_price_wars() {
        let mut rng = StdRng::seed_from_u64(9);
        let fox = &DISTRICT_RIVALS[0];
        let wars = (0..2000)
            .filter(|_| pick_stance(fox, &mut rng) == RivalStance::PriceWar)
            .count();
        // 28 of 95 weight.
        assert!((450..750).contains(&wars), "{wars}");
    }

    #[test]
    fn a_week_of_rivalry_sets_the_pressure() {
        let mut fx = Fixture::new(33);
        weekly_update(&mut fx.ctx());
        let district = &fx.sim.district;
        assert_eq!(district.stances.len(), DISTRICT_RIVALS.len());
        assert!((0.90..=1.06).contains(&district.traffic));
        assert!((-0.20..=0.20).contains(&district.mix_bias));
        assert!(fx.logged("District: rivals leaned"));
        assert!(fx.logged("Pressure: traffic x"));
    }
}
