use crate::game::catalog::StockItemDef;
use crate::game::context::SimContext;
use crate::game::economy::CostKind;
use crate::game::inventory::StockKind;
use crate::game::rejection::Rejection;
use crate::game::staff::StaffRole;
use crate::scheduler::{JobKind, ScheduleClock};

const BULK_DISCOUNTS: [(u32, f64); 3] = [(25, 0.08), (10, 0.04), (5, 0.02)];
const EMERGENCY_DRINK_MARKUP: f64 = 1.3;
const EMERGENCY_FOOD_MARKUP: f64 = 1.4;
const EMERGENCY_WEEKEND_MARKUP: f64 = 1.7;
const EMERGENCY_DELIVERY_ROUNDS: u64 = 3;
const EMERGENCY_WEEKEND_FOOD_ROUNDS: u64 = 4;

pub(crate) fn bulk_discount(quantity: u32) -> f64 {
    BULK_DISCOUNTS
        .iter()
        .find(|(at_least, _)| quantity >= *at_least)
        .map(|(_, discount)| *discount)
        .unwrap_or(0.0)
}

fn emergency_markup(kind: StockKind, weekend: bool) -> f64 {
    match (kind, weekend) {
        (_, true) => EMERGENCY_WEEKEND_MARKUP,
        (StockKind::Drink, false) => EMERGENCY_DRINK_MARKUP,
        (StockKind::Food, false) => EMERGENCY_FOOD_MARKUP,
    }
}

/// Price of an order before it is split between trade credit and cash.
pub(crate) fn order_cost(ctx: &SimContext<'_>, item: &StockItemDef, quantity: u32, emergency: bool) -> f64 {
    let trust = ctx
        .sim
        .credit
        .supplier
        .price_multiplier(ctx.sim.debt.multipliers().supplier_trust);
    let markup = if emergency {
        emergency_markup(item.kind, ctx.sim.calendar.is_weekend())
    } else {
        1.0
    };
    item.base_cost * quantity as f64 * (1.0 - bulk_discount(quantity)) * trust * markup
}

fn check_emergency_cover(ctx: &SimContext<'_>, kind: StockKind) -> Result<(), Rejection> {
    let roster = &ctx.sim.roster;
    if !roster.has_role_on_shift(StaffRole::Manager) || !roster.has_role_on_shift(StaffRole::AssistantManager) {
        return Err(Rejection::Requirement(
            "emergency orders need a Manager and an Assistant Manager on shift".to_string(),
        ));
    }
    if kind == StockKind::Food && !roster.has_role_on_shift(StaffRole::HeadChef) {
        return Err(Rejection::Requirement(
            "emergency food orders need a Head Chef on shift".to_string(),
        ));
    }
    Ok(())
}

/// Puts what trade credit covers on account and pays the rest through `try_pay`.
/// Returns the amount charged to the supplier account.
fn pay_for_order(ctx: &mut SimContext<'_>, cost: f64, label: &str) -> Result<f64, Rejection> {
    let on_credit = cost.min(ctx.sim.credit.supplier.available());
    let remainder = cost - on_credit;
    if remainder > 0.0 && !ctx.try_pay(remainder, CostKind::Supplies, label) {
        return Err(Rejection::InsufficientFunds { needed: remainder });
    }
    let charged = ctx.sim.credit.supplier.charge(on_credit);
    ctx.sim.ledger.book_cost(CostKind::Supplies, charged);
    Ok(charged)
}

/// Buys stock. While closed it lands on the rack at once; while open it is an
/// emergency order at a markup, delivered a few rounds later.
pub(crate) fn buy_from_supplier(ctx: &mut SimContext<'_>, item_id: &str, quantity: u32) -> Result<u32, Rejection> {
    let catalog = ctx.catalog;
    let Some(item) = catalog.stock_item(item_id) else {
        return Err(ctx.reject(Rejection::unknown("stock item", item_id)));
    };
    if quantity == 0 {
        return Err(ctx.reject(Rejection::InvalidValue(
            "order at least one unit".to_string(),
        )));
    }
    if item.kind == StockKind::Food && !ctx.sim.upgrades.effects.kitchen_unlocked {
        return Err(ctx.reject(Rejection::locked(&item.name, "the pub has no kitchen")));
    }
    let emergency = ctx.sim.night.open;
    if emergency {
        if let Err(rejection) = check_emergency_cover(ctx, item.kind) {
            return Err(ctx.reject(rejection));
        }
    }
    let free = ctx.sim.inventory.rack(item.kind).free_space();
    if free == 0 {
        return Err(ctx.reject(Rejection::RackFull(item.kind.rack_label())));
    }
    let quantity = quantity.min(free);
    let cost = order_cost(ctx, item, quantity, emergency);
    let charged = pay_for_order(ctx, cost, &item.name)?;

    let terms = if charged > 0.0 {
        format!(" (GBP {charged:.2} on supplier credit)")
    } else {
        String::new()
    };
    if emergency {
        let rounds = if item.kind == StockKind::Food && ctx.sim.calendar.is_weekend() {
            EMERGENCY_WEEKEND_FOOD_ROUNDS
        } else {
            EMERGENCY_DELIVERY_ROUNDS
        };
        let due = ctx.sim.absolute_round(ctx.config.closing_round) + rounds;
        ctx.sim.queue.schedule(
            JobKind::Delivery {
                item: item.id.clone(),
                quantity,
            },
            ScheduleClock::Round,
            due,
        );
        ctx.log.info(format!(
            "Emergency order: {quantity} x {} for GBP {cost:.2}{terms}. Arrives in {rounds} rounds.",
            item.name
        ));
    } else {
        let day = ctx.sim.calendar.day_counter();
        ctx.sim
            .inventory
            .rack_mut(item.kind)
            .add(&item.id, quantity, day, item.shelf_life_days);
        ctx.log.info(format!(
            "Bought {quantity} x {} for GBP {cost:.2}{terms}.",
            item.name
        ));
    }
    Ok(quantity)
}

/// Sets the level an item is topped back up to before each opening. Zero cancels it.
pub(crate) fn set_standing_order(ctx: &mut SimContext<'_>, item_id: &str, par: u32) -> Result<u32, Rejection> {
    let catalog = ctx.catalog;
    let Some(item) = catalog.stock_item(item_id) else {
        return Err(ctx.reject(Rejection::unknown("stock item", item_id)));
    };
    if par == 0 {
        if ctx.sim.inventory.standing_order.remove(&item.id).is_some() {
            ctx.log.info(format!("Standing order for {} cancelled.", item.name));
        }
        return Ok(0);
    }
    if item.kind == StockKind::Food && !ctx.sim.upgrades.effects.kitchen_unlocked {
        return Err(ctx.reject(Rejection::locked(&item.name, "the pub has no kitchen")));
    }
    let capacity = ctx.sim.inventory.rack(item.kind).capacity();
    if par > capacity {
        return Err(ctx.reject(Rejection::InvalidValue(format!(
            "the {} rack only holds {capacity}",
            item.kind.rack_label()
        ))));
    }
    ctx.sim.inventory.standing_order.insert(item.id.clone(), par);
    ctx.log.info(format!("Standing order: keep {par} x {} on the rack.", item.name));
    Ok(par)
}

/// Tops the racks back up to the standing order. Lines the pub cannot pay for
/// are skipped. Returns the units delivered.
pub(crate) fn restock_standing_order(ctx: &mut SimContext<'_>) -> u32 {
    let catalog = ctx.catalog;
    let order: Vec<(String, u32)> = ctx
        .sim
        .inventory
        .standing_order
        .iter()
        .map(|(id, par)| (id.clone(), *par))
        .collect();
    let day = ctx.sim.calendar.day_counter();
    let mut delivered = 0;
    let mut spent = 0.0;
    for (id, par) in order {
        let Some(item) = catalog.stock_item(&id) else {
            continue;
        };
        if item.kind == StockKind::Food && !ctx.sim.upgrades.effects.kitchen_unlocked {
            continue;
        }
        let rack = ctx.sim.inventory.rack(item.kind);
        let quantity = par.saturating_sub(rack.stock_of(&item.id)).min(rack.free_space());
        if quantity == 0 {
            continue;
        }
        let cost = order_cost(ctx, item, quantity, false);
        if pay_for_order(ctx, cost, &item.name).is_err() {
            ctx.log.neg(format!(
                "Standing order for {} skipped: nothing left to pay the supplier with.",
                item.name
            ));
            continue;
        }
        ctx.sim
            .inventory
            .rack_mut(item.kind)
            .add(&item.id, quantity, day, item.shelf_life_days);
        delivered += quantity;
        spent += cost;
    }
    if delivered > 0 {
        ctx.log.info(format!(
            "Standing order delivered: {delivered} unit(s) for GBP {spent:.2}."
        ));
    }
    delivered
}

/// Unloads deliveries that are due. `flush` takes everything still on the road.
pub(crate) fn receive_deliveries(ctx: &mut SimContext<'_>, flush: bool) -> u32 {
    let now = if flush {
        u64::MAX
    } else {
        ctx.sim.absolute_round(ctx.config.closing_round)
    };
    let due = ctx.sim.queue.take_due(ScheduleClock::Round, now);
    let catalog = ctx.catalog;
    let day = ctx.sim.calendar.day_counter();
    let mut received = 0;
    for job in due {
        let JobKind::Delivery { item, quantity } = job else {
            continue;
        };
        let Some(def) = catalog.stock_item(&item) else {
            continue;
        };
        let accepted = ctx
            .sim
            .inventory
            .rack_mut(def.kind)
            .add(&def.id, quantity, day, def.shelf_life_days);
        received += accepted;
        if accepted < quantity {
            ctx.log.neg(format!(
                "Delivery of {} arrived: {accepted} unit(s) fit, {} turned away.",
                def.name,
                quantity - accepted
            ));
        } else {
            ctx.log.info(format!("Delivery arrived: {accepted} x {}.", def.name));
        }
    }
    received
}

/// Throws out stock past its shelf life. Returns units lost.
pub(crate) fn spoil_stock(ctx: &mut SimContext<'_>) -> u32 {
    let today = ctx.sim.calendar.day_counter();
    let inventory = &mut ctx.sim.inventory;
    let lost = inventory.drinks.remove_spoiled(today) + inventory.food.remove_spoiled(today);
    if lost > 0 {
        let rep = ctx.apply_rep(-1);
        ctx.log.neg(format!("{lost} unit(s) of stock spoiled and were binned (rep {rep:+})."));
    }
    lost
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::context::testing::Fixture;
    use crate::game::staff::test_member;

    fn first_of(fx: &Fixture, kind: StockKind) -> StockItemDef {
        fx.catalog
            .stock_of_kind(kind)
            .next()
            .cloned()
            .expect("catalog stock")
    }

    #[test]
    fn discounts_step_up_with_volume() {
        assert_eq!(bulk_discount(4), 0.0);
        assert_eq!(bulk_discount(5), 0.02);
        assert_eq!(bulk_discount(10), 0.04);
        assert_eq!(bulk_discount(40), 0.08);
    }

    #[test]
    fn closed_purchase_goes_on_trade_credit_first() {
        let mut fx = Fixture::new(6);
        let drink = first_of(&fx, StockKind::Drink);
        let cash = fx.sim.ledger.cash();
        assert_eq!(buy_from_supplier(&mut fx.ctx(), &drink.id, 10), Ok(10));
        assert_eq!(fx.sim.inventory.drinks.stock_of(&drink.id), 10);
        let expected = drink.base_cost * 10.0 * 0.96;
        assert!((fx.sim.credit.supplier.balance - expected).abs() < 1e-9);
        assert_eq!(fx.sim.ledger.cash(), cash);
        assert!((fx.sim.ledger.week().cost_of(CostKind::Supplies) - expected).abs() < 1e-9);
    }

    #[test]
    fn orders_are_clamped_to_the_rack() {
        let mut fx = Fixture::new(6);
        let drink = first_of(&fx, StockKind::Drink);
        fx.sim.inventory.drinks.set_capacity(6);
        assert_eq!(buy_from_supplier(&mut fx.ctx(), &drink.id, 10), Ok(6));
        assert_eq!(
            buy_from_supplier(&mut fx.ctx(), &drink.id, 1),
            Err(Rejection::RackFull("drinks"))
        );
    }

    #[test]
    fn food_needs_a_kitchen() {
        let mut fx = Fixture::new(6);
        let food = first_of(&fx, StockKind::Food);
        assert!(matches!(
            buy_from_supplier(&mut fx.ctx(), &food.id, 3),
            Err(Rejection::Locked { .. })
        ));
    }

    #[test]
    fn emergency_orders_need_management_and_arrive_later() {
        let mut fx = Fixture::new(6);
        let drink = first_of(&fx, StockKind::Drink);
        fx.sim.night.open = true;
        assert!(matches!(
            buy_from_supplier(&mut fx.ctx(), &drink.id, 5),
            Err(Rejection::Requirement(_))
        ));
        fx.sim.roster.push(test_member(1, StaffRole::Manager, 60.0));
        fx.sim.roster.push(test_member(2, StaffRole::AssistantManager, 60.0));
        buy_from_supplier(&mut fx.ctx(), &drink.id, 5).expect("emergency order");
        assert_eq!(fx.sim.inventory.drinks.stock_of(&drink.id), 0);
        fx.sim.night.round = 2;
        assert_eq!(receive_deliveries(&mut fx.ctx(), false), 0);
        fx.sim.night.round = 3;
        assert_eq!(receive_deliveries(&mut fx.ctx(), false), 5);
        assert_eq!(fx.sim.inventory.drinks.stock_of(&drink.id), 5);
    }

    #[test]
    fn standing_order_tops_up_to_par() {
        let mut fx = Fixture::new(6);
        fx.sim.inventory.drinks.add("lager", 12, 0, 21);
        assert_eq!(set_standing_order(&mut fx.ctx(), "lager", 30), Ok(30));
        assert_eq!(set_standing_order(&mut fx.ctx(), "ale", 10), Ok(10));
        assert_eq!(restock_standing_order(&mut fx.ctx()), 28);
        assert_eq!(fx.sim.inventory.drinks.stock_of("lager"), 30);
        assert_eq!(fx.sim.inventory.drinks.stock_of("ale"), 10);
        assert!(fx.sim.credit.supplier.balance > 0.0);
        assert_eq!(restock_standing_order(&mut fx.ctx()), 0);
        assert!(fx.logged("Standing order delivered: 28 unit(s)"));
    }

    #[test]
    fn standing_order_respects_the_rack_and_the_kitchen() {
        let mut fx = Fixture::new(6);
        let food = first_of(&fx, StockKind::Food);
        fx.sim.inventory.drinks.set_capacity(20);
        assert!(matches!(
            set_standing_order(&mut fx.ctx(), "lager", 21),
            Err(Rejection::InvalidValue(_))
        ));
        assert!(matches!(
            set_standing_order(&mut fx.ctx(), &food.id, 5),
            Err(Rejection::Locked { .. })
        ));
        assert!(matches!(
            set_standing_order(&mut fx.ctx(), "moonshine", 5),
            Err(Rejection::Unknown { .. })
        ));
        assert_eq!(set_standing_order(&mut fx.ctx(), "lager", 15), Ok(15));
        assert_eq!(set_standing_order(&mut fx.ctx(), "lager", 0), Ok(0));
        assert!(fx.sim.inventory.standing_order.is_empty());
    }

    #[test]
    fn unpaid_standing_orders_are_skipped() {
        let mut fx = Fixture::new(6);
        fx.sim.credit.supplier.cap_override = Some(0.0);
        fx.sim.ledger.withdraw(fx.sim.ledger.cash());
        set_standing_order(&mut fx.ctx(), "lager", 10).expect("standing order");
        assert_eq!(restock_standing_order(&mut fx.ctx()), 0);
        assert_eq!(fx.sim.inventory.drinks.count(), 0);
        assert!(fx.logged("Standing order for House Lager skipped"));
    }

    #[test]
    fn shortfall_beyond_trade_credit_needs_cash() {
        let mut fx = Fixture::new(6);
        let drink = first_of(&fx, StockKind::Drink);
        fx.sim.credit.supplier.cap_override = Some(0.0);
        fx.sim.ledger.withdraw(fx.sim.ledger.cash());
        assert!(matches!(
            buy_from_supplier(&mut fx.ctx(), &drink.id, 5),
            Err(Rejection::InsufficientFunds { .. })
        ));
        assert_eq!(fx.sim.inventory.drinks.count(), 0);
    }
}
