use crate::game::catalog::ActivityDef;
use crate::game::context::SimContext;
use crate::game::economy::CostKind;
use crate::game::rejection::Rejection;
use crate::game::systems::{identity, traffic};

fn check_unlocked(ctx: &SimContext<'_>, def: &ActivityDef) -> Result<(), Rejection> {
    if ctx.sim.pub_level < def.min_pub_level {
        return Err(Rejection::locked(
            &def.name,
            format!("needs pub level {}", def.min_pub_level),
        ));
    }
    if let Some(upgrade) = def.requires_upgrade.as_deref() {
        if !ctx.sim.upgrades.owns(upgrade) {
            let name = ctx
                .catalog
                .upgrade(upgrade)
                .map(|u| u.name.as_str())
                .unwrap_or(upgrade);
            return Err(Rejection::locked(&def.name, format!("needs {name}")));
        }
    }
    Ok(())
}

/// Books a themed night for the next opening. A second booking replaces the
/// first and the first fee is not returned.
pub(crate) fn schedule_activity(ctx: &mut SimContext<'_>, id: &str) -> Result<(), Rejection> {
    if ctx.sim.night.open {
        return Err(ctx.reject(Rejection::PubOpen));
    }
    let catalog = ctx.catalog;
    let Some(def) = catalog.activity(id) else {
        return Err(ctx.reject(Rejection::unknown("activity", id)));
    };
    if let Err(rejection) = check_unlocked(ctx, def) {
        return Err(ctx.reject(rejection));
    }
    if !ctx.try_pay(def.cost, CostKind::Operating, &def.name) {
        return Err(Rejection::InsufficientFunds { needed: def.cost });
    }
    let replaced = ctx.sim.activity.pending.replace(def.id.clone());
    if let Some(old) = replaced.and_then(|old| catalog.activity(&old)) {
        ctx.log
            .neg(format!("{} cancelled; the booking fee is gone.", old.name));
    }
    ctx.log.info(format!(
        "{} booked for the next night (GBP {:.2}).",
        def.name, def.cost
    ));
    Ok(())
}

/// Moves the booked activity onto tonight and applies its one-off effects.
pub(crate) fn activate_at_open(ctx: &mut SimContext<'_>) -> Option<String> {
    let id = ctx.sim.activity.pending.take()?;
    ctx.sim.activity.tonight = Some(id);
    let def = traffic::tonight_activity(ctx)?;
    let rep = ctx.apply_rep(def.rep);
    if let Some(kind) = def.identity {
        identity::signal(ctx, kind, def.identity_signal);
    }
    ctx.log.event(format!(
        "Tonight: {}. Traffic {:+.0}%, bar space {:+} (rep {rep:+}).",
        def.name,
        def.traffic * 100.0,
        def.bar_capacity
    ));
    Some(def.name.clone())
}

pub(crate) fn bar_capacity_bonus(ctx: &SimContext<'_>) -> i32 {
    traffic::tonight_activity(ctx).map(|a| a.bar_capacity).unwrap_or(0)
}

pub(crate) fn event_chance_bonus(ctx: &SimContext<'_>) -> i32 {
    traffic::tonight_activity(ctx).map(|a| a.event_chance).unwrap_or(0)
}

pub(crate) fn risk(ctx: &SimContext<'_>) -> Option<f64> {
    traffic::tonight_activity(ctx).map(|a| a.risk)
}

pub(crate) fn tip_bonus(ctx: &SimContext<'_>) -> f64 {
    traffic::tonight_activity(ctx).map(|a| a.tip_bonus).unwrap_or(0.0)
}

pub(crate) fn expire_at_close(ctx: &mut SimContext<'_>) {
    ctx.sim.activity.tonight = None;
}
