use crate::game::context::SimContext;
use crate::game::economy::CostKind;
use crate::game::rejection::Rejection;
use crate::game::systems::staffing;
use crate::game::upgrades::{UpgradeDef, UpgradeEffects};
use crate::scheduler::{JobKind, ScheduleClock};

const PURCHASE_REP: i32 = 2;

/// Rebuilds the folded effects from the owned set and resizes what depends on them.
pub(crate) fn refresh_effects(ctx: &mut SimContext<'_>) {
    let catalog = ctx.catalog;
    let owned: Vec<&UpgradeDef> = ctx
        .sim
        .upgrades
        .owned
        .iter()
        .filter_map(|id| catalog.upgrade(id))
        .collect();
    ctx.sim.upgrades.effects = UpgradeEffects::from_upgrades(owned);
    staffing::refresh_food_rack(ctx);
}

fn check_unlocked(ctx: &SimContext<'_>, upgrade: &UpgradeDef) -> Result<(), Rejection> {
    if let Some(required) = upgrade.requires.as_deref() {
        if !ctx.sim.upgrades.owns(required) {
            let name = ctx
                .catalog
                .upgrade(required)
                .map(|def| def.name.as_str())
                .unwrap_or(required);
            return Err(Rejection::locked(&upgrade.name, format!("needs {name} first")));
        }
    }
    if ctx.sim.pub_level < upgrade.min_pub_level {
        return Err(Rejection::locked(
            &upgrade.name,
            format!("needs pub level {}", upgrade.min_pub_level),
        ));
    }
    Ok(())
}

/// Orders an upgrade. It is paid now and goes live after its install nights.
pub(crate) fn buy_upgrade(ctx: &mut SimContext<'_>, id: &str) -> Result<(), Rejection> {
    if ctx.sim.night.open {
        return Err(ctx.reject(Rejection::PubOpen));
    }
    let catalog = ctx.catalog;
    let Some(upgrade) = catalog.upgrade(id) else {
        return Err(ctx.reject(Rejection::unknown("upgrade", id)));
    };
    if ctx.sim.upgrades.owns(&upgrade.id) {
        return Err(ctx.reject(Rejection::AlreadyOwned(upgrade.name.clone())));
    }
    if ctx.sim.queue.is_installing(&upgrade.id) {
        return Err(ctx.reject(Rejection::AlreadyInstalling(upgrade.name.clone())));
    }
    if let Err(rejection) = check_unlocked(ctx, upgrade) {
        return Err(ctx.reject(rejection));
    }
    if !ctx.try_pay(upgrade.cost, CostKind::Upgrades, &upgrade.name) {
        return Err(Rejection::InsufficientFunds {
            needed: upgrade.cost,
        });
    }
    let due = ctx.sim.calendar.day_counter() as u64 + upgrade.install_nights.max(1) as u64;
    ctx.sim.queue.schedule(
        JobKind::InstallUpgrade {
            upgrade: upgrade.id.clone(),
        },
        ScheduleClock::Night,
        due,
    );
    ctx.apply_rep(PURCHASE_REP);
    ctx.log.pos(format!(
        "Ordered {} for GBP {:.2}. Fitting takes {} night(s).",
        upgrade.name, upgrade.cost, upgrade.install_nights
    ));
    Ok(())
}

/// Finishes installs that are due. Returns the names of what went live.
pub(crate) fn complete_installs(ctx: &mut SimContext<'_>) -> Vec<String> {
    let now = ctx.sim.calendar.day_counter() as u64;
    let due = ctx.sim.queue.take_due(ScheduleClock::Night, now);
    let catalog = ctx.catalog;
    let mut finished = Vec::new();
    for job in due {
        let JobKind::InstallUpgrade { upgrade } = job else {
            continue;
        };
        let Some(def) = catalog.upgrade(&upgrade) else {
            continue;
        };
        if !ctx.sim.upgrades.owns(&def.id) {
            ctx.sim.upgrades.owned.push(def.id.clone());
        }
        finished.push(def.name.clone());
    }
    if !finished.is_empty() {
        let kitchen_before = ctx.sim.upgrades.effects.kitchen_unlocked;
        let inn_before = ctx.sim.upgrades.effects.inn_unlocked;
        refresh_effects(ctx);
        for name in &finished {
            ctx.log.event(format!("Upgrade installed: {name} is now active."));
        }
        if !kitchen_before && ctx.sim.upgrades.effects.kitchen_unlocked {
            ctx.log.event("Kitchen unlocked. The food supplier will now deliver.");
        }
        if !inn_before && ctx.sim.upgrades.effects.inn_unlocked {
            ctx.log.event("The inn is open for bookings.");
        }
    }
    finished
}

/// Takes away the `count` cheapest owned upgrades. Ties go by id.
pub(crate) fn repossess_cheapest(ctx: &mut SimContext<'_>, count: usize) -> Vec<String> {
    let catalog = ctx.catalog;
    let mut owned: Vec<&UpgradeDef> = ctx
        .sim
        .upgrades
        .owned
        .iter()
        .filter_map(|id| catalog.upgrade(id))
        .collect();
    owned.sort_by(|a, b| a.cost.total_cmp(&b.cost).then_with(|| a.id.cmp(&b.id)));
    let taken: Vec<&UpgradeDef> = owned.into_iter().take(count).collect();
    ctx.sim
        .upgrades
        .owned
        .retain(|id| !taken.iter().any(|def| def.id.eq_ignore_ascii_case(id)));
    refresh_effects(ctx);
    taken.into_iter().map(|def| def.name.clone()).collect()
}

/// Strips every upgrade, including anything still being fitted.
pub(crate) fn repossess_all(ctx: &mut SimContext<'_>) -> Vec<String> {
    let catalog = ctx.catalog;
    let mut names: Vec<String> = ctx
        .sim
        .upgrades
        .owned
        .drain(..)
        .map(|id| catalog.upgrade(&id).map(|def| def.name.clone()).unwrap_or(id))
        .collect();
    names.extend(
        ctx.sim
            .queue
            .cancel_installs()
            .into_iter()
            .map(|id| catalog.upgrade(&id).map(|def| def.name.clone()).unwrap_or(id)),
    );
    refresh_effects(ctx);
    names
}
