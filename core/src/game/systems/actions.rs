use rand::Rng;

use crate::game::actions::{ActionCategory, ActionDef, ActionOutcome, ActionRange, MAX_ACTION_TIER};
use crate::game::context::SimContext;
use crate::game::identity::IdentityKind;
use crate::game::rejection::Rejection;
use crate::game::systems::identity;

const ACTION_TRAFFIC_MIN: f64 = -0.5;
const ACTION_TRAFFIC_MAX: f64 = 0.6;

/// Highest action tier the pub's standing allows.
pub(crate) fn unlocked_tier(pub_level: u8) -> u8 {
    (pub_level + 1).min(MAX_ACTION_TIER)
}

fn roll_int<R: Rng + ?Sized>(rng: &mut R, (a, b): (i32, i32)) -> i32 {
    rng.gen_range(a.min(b)..=a.max(b))
}

fn roll_float<R: Rng + ?Sized>(rng: &mut R, (a, b): (f64, f64)) -> f64 {
    if (a - b).abs() < f64::EPSILON {
        a
    } else {
        rng.gen_range(a.min(b)..=a.max(b))
    }
}

fn check_available(ctx: &SimContext<'_>, def: &ActionDef) -> Result<(), Rejection> {
    if !ctx.sim.night.open {
        return Err(Rejection::PubClosed);
    }
    let tier = unlocked_tier(ctx.sim.pub_level);
    if def.tier > tier {
        return Err(Rejection::locked(
            &def.name,
            format!("tier {} actions need pub level {}", def.tier, def.tier - 1),
        ));
    }
    if ctx.sim.actions.last_action_round == Some(ctx.sim.night.round) {
        return Err(Rejection::ActionAlreadyTaken);
    }
    let rounds = ctx.sim.actions.cooldown(&def.id);
    if rounds > 0 {
        return Err(Rejection::Cooldown {
            id: def.id.clone(),
            rounds,
        });
    }
    Ok(())
}

fn roll_outcome(ctx: &mut SimContext<'_>, def: &ActionDef, success: bool, scale: f64) -> ActionOutcome {
    let range: ActionRange = if success { def.success } else { def.failure };
    let rng = &mut *ctx.rng;
    ActionOutcome {
        action: def.name.clone(),
        success,
        rep: (roll_int(rng, range.rep) as f64 * scale).round() as i32,
        morale: (roll_int(rng, range.morale) as f64 * scale).round() as i32,
        traffic: roll_float(rng, range.traffic) * scale,
        traffic_rounds: if success { def.success_rounds } else { def.failure_rounds },
        chaos: roll_float(rng, range.chaos) * scale,
    }
}

/// Resolves a landlord action for the current round.
pub(crate) fn resolve_action(ctx: &mut SimContext<'_>, id: &str) -> Result<ActionOutcome, Rejection> {
    let catalog = ctx.catalog;
    let Some(def) = catalog.action(id) else {
        return Err(ctx.reject(Rejection::unknown("action", id)));
    };
    if let Err(rejection) = check_available(ctx, def) {
        return Err(ctx.reject(rejection));
    }

    let landlord = ctx.sim.identity.landlord_score();
    let success = ctx.rng.gen_bool(def.chance(landlord));
    let scale = def.outcome_scale(success, landlord);
    let mut outcome = roll_outcome(ctx, def, success, scale);

    outcome.rep = ctx.apply_rep(outcome.rep);
    if outcome.morale != 0 {
        ctx.sim.roster.adjust_all_morale(outcome.morale as f64);
    }
    if outcome.traffic != 0.0 && outcome.traffic_rounds > 0 {
        let night = &mut ctx.sim.night;
        night.action_traffic = outcome.traffic.clamp(ACTION_TRAFFIC_MIN, ACTION_TRAFFIC_MAX);
        night.action_traffic_rounds = outcome.traffic_rounds;
    }
    ctx.sim.chaos.adjust(outcome.chaos);
    ctx.sim
        .identity
        .shift_landlord_score(def.category.landlord_shift(success));
    let signal = if success { 1.0 } else { 0.5 };
    match def.category {
        ActionCategory::Classy => identity::signal(ctx, IdentityKind::Respectable, signal),
        ActionCategory::Shady => identity::signal(ctx, IdentityKind::Shady, signal),
        ActionCategory::Balanced => {}
    }
    let round = ctx.sim.night.round;
    let actions = &mut ctx.sim.actions;
    actions.start_cooldown(&def.id, def.cooldown_rounds);
    actions.last_action_round = Some(round);

    let summary = format!(
        "{}: rep {:+}, morale {:+}, traffic {:+.0}% for {} round(s), chaos {:+.1}.",
        def.name,
        outcome.rep,
        outcome.morale,
        outcome.traffic * 100.0,
        outcome.traffic_rounds,
        outcome.chaos
    );
    if success {
        ctx.log.pos(format!("Success! {summary}"));
    } else {
        ctx.log.neg(format!("It backfired. {summary}"));
    }
    Ok(outcome)
}

/// Actions the landlord could take right now, with their cooldowns.
pub(crate) fn available_actions<'c>(ctx: &SimContext<'c>) -> Vec<(&'c ActionDef, u32)> {
    let catalog = ctx.catalog;
    catalog
        .actions_up_to_tier(unlocked_tier(ctx.sim.pub_level))
        .map(|def| (def, ctx.sim.actions.cooldown(&def.id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::context::testing::Fixture;

    #[test]
    fn tiers_open_with_pub_level() {
        assert_eq!(unlocked_tier(0), 1);
        assert_eq!(unlocked_tier(1), 2);
        assert_eq!(unlocked_tier(5), 3);
    }

    #[test]
    fn actions_need_an_open_pub() {
        let mut fx = Fixture::new(4);
        assert_eq!(
            resolve_action(&mut fx.ctx(), "work_the_room"),
            Err(Rejection::PubClosed)
        );
        assert!(fx.logged("The pub is closed"));
    }

    #[test]
    fn one_action_per_round_then_cooldown() {
        let mut fx = Fixture::new(4);
        fx.sim.night.open = true;
        fx.sim.night.round = 1;
        let outcome = resolve_action(&mut fx.ctx(), "work_the_room").expect("action");
        assert_eq!(outcome.action, "Work the Room");
        assert_eq!(
            resolve_action(&mut fx.ctx(), "run_a_special"),
            Err(Rejection::ActionAlreadyTaken)
        );
        fx.sim.night.round = 2;
        assert!(matches!(
            resolve_action(&mut fx.ctx(), "work_the_room"),
            Err(Rejection::Cooldown { rounds: 2, .. })
        ));
        assert!(resolve_action(&mut fx.ctx(), "run_a_special").is_ok());
    }

    #[test]
    fn higher_tiers_are_locked() {
        let mut fx = Fixture::new(4);
        fx.sim.night.open = true;
        assert!(matches!(
            resolve_action(&mut fx.ctx(), "locals_night"),
            Err(Rejection::Locked { .. })
        ));
        fx.sim.pub_level = 1;
        assert!(resolve_action(&mut fx.ctx(), "locals_night").is_ok());
    }

    #[test]
    fn outcomes_land_on_the_pub() {
        let mut fx = Fixture::new(4);
        fx.sim.night.open = true;
        let mut successes = 0;
        for round in 0..40 {
            fx.sim.night.round = round * 3;
            fx.sim.actions = Default::default();
            let outcome = resolve_action(&mut fx.ctx(), "pushy_upsell").expect("action");
            if outcome.success {
                successes += 1;
                assert!(outcome.traffic > 0.0);
                assert_eq!(fx.sim.night.action_traffic_rounds, 2);
            } else {
                assert!(outcome.traffic <= 0.0);
            }
        }
        assert!(successes > 0 && successes < 40);
        assert!(fx.sim.identity.landlord_score() < 0.0);
    }
}
