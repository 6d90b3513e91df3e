use crate::game::context::SimContext;
use crate::game::identity::{IdentityKind, IdentitySnapshot};

/// Folds the finished week into the identity window.
pub(crate) fn snapshot_week(ctx: &mut SimContext<'_>) -> IdentitySnapshot {
    let week = ctx.sim.week;
    let counters = week.counters;
    IdentitySnapshot {
        profit: ctx.sim.ledger.week().profit(),
        refunds: counters.refund_total,
        fights: counters.fights as f64,
        unserved: counters.unserved as f64,
        negative_events: counters.negative_events as f64,
        positive_events: counters.positive_events as f64,
        average_price: week.average_price(),
        food_quality: week.average_food_quality(),
        rep_volatility: week.rep_abs as f64,
        rep_net: week.rep_net as f64,
        morale: week.average_morale(),
        security: week.average_security(),
        signals: ctx.sim.identity.take_signals(),
    }
}

/// Weekly identity settlement. Returns the new identity when it changed.
pub(crate) fn weekly_update(ctx: &mut SimContext<'_>) -> Option<IdentityKind> {
    let snapshot = snapshot_week(ctx);
    let changed = ctx.sim.identity.record_week(snapshot);
    match changed {
        Some(kind) => ctx.log.event(format!(
            "Locals have started calling this a {} pub.",
            kind.label().to_lowercase()
        )),
        None => {
            if let Some(kind) = ctx.sim.identity.current() {
                ctx.log.info(format!("The pub is still known as {}.", kind.label()));
            }
        }
    }
    changed
}

/// Identity signal from the landlord or an activity.
pub(crate) fn signal(ctx: &mut SimContext<'_>, kind: IdentityKind, amount: f64) {
    if amount != 0.0 {
        ctx.sim.identity.record_signal(kind, amount);
    }
}
