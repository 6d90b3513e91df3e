use tracing::info;

use crate::game::context::SimContext;
use crate::game::{PUB_LEVEL_MAX, PUB_LEVEL_PROFIT_THRESHOLDS, PUB_LEVEL_REP_THRESHOLDS};

/// Level the pub qualifies for on reputation and cumulative profit.
pub(crate) fn qualifying_level(reputation: i32, cumulative_profit: f64) -> u8 {
    PUB_LEVEL_REP_THRESHOLDS
        .iter()
        .zip(PUB_LEVEL_PROFIT_THRESHOLDS.iter())
        .take_while(|(rep, profit)| reputation >= **rep && cumulative_profit >= **profit)
        .count()
        .min(PUB_LEVEL_MAX as usize) as u8
}

/// Raises the pub level by at most one step per week. Levels are never lost
/// here; only bankruptcy resets them.
pub(crate) fn check_level_up(ctx: &mut SimContext<'_>) -> Option<u8> {
    let current = ctx.sim.pub_level;
    if current >= PUB_LEVEL_MAX {
        return None;
    }
    let target = qualifying_level(ctx.sim.reputation, ctx.sim.ledger.cumulative_profit());
    if target <= current {
        return None;
    }
    let level = current + 1;
    ctx.sim.pub_level = level;
    info!(level, "pub level raised");
    ctx.log.pos(format!(
        "The pub has grown a name for itself: now level {level}. More room at the bar and tier {} landlord actions.",
        (level + 1).min(3)
    ));
    Some(level)
}
