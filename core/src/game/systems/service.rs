//! The bar itself: who comes in, who gets served, what they buy and what it costs.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::game::catalog::StockItemDef;
use crate::game::context::SimContext;
use crate::game::economy::{CostKind, RevenueKind};
use crate::game::identity::IdentityKind;
use crate::game::inventory::StockKind;
use crate::game::patrons::{Mood, Patron, PatronTier};
use crate::game::rejection::Rejection;
use crate::game::rumor::RumorTopic;
use crate::game::systems::events::{self, door_intervenes, hit_rep};
use crate::game::systems::{music, security};
use crate::game::systems::workload::WorkloadProfile;
use crate::game::world::SimulationState;

pub(crate) const PRICE_MULTIPLIER_MIN: f64 = 0.5;
pub(crate) const PRICE_MULTIPLIER_MAX: f64 = 2.5;
const FAIR_PRICE_LINE: f64 = 1.10;
const FAIR_PRICE_REP_CHANCE: f64 = 0.15;
const OVERPRICED_LINE: f64 = 1.20;
const BROKE_WALLET: f64 = 3.0;
const NO_BUY_KICKOUT: u32 = 3;
const OUT_OF_STOCK_REP: i32 = -3;
const MAX_UNSERVED_REP: i32 = 6;
const DEPARTURE_BASE: f64 = 0.015;
const DEPARTURE_CAP: f64 = 0.09;

/// Per-round service inputs worked out before anyone is served.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct ServiceParams {
    pub(crate) price_multiplier: f64,
    /// Music nudges what a punter spends on the round they order.
    pub(crate) spend_multiplier: f64,
    pub(crate) tip_rate: f64,
    pub(crate) security: i32,
    pub(crate) risky_weekend: bool,
    pub(crate) activity_risk: f64,
}

/// What the bar managed this round.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct ServiceResult {
    pub(crate) served: u32,
    pub(crate) unserved: u32,
    pub(crate) sales: u32,
    pub(crate) food_orders: u32,
    pub(crate) food_misses: u32,
    pub(crate) thefts: u32,
    pub(crate) kicked_out: u32,
}

fn wealth_bias(sim: &SimulationState) -> f64 {
    let identity = match sim.identity.current() {
        Some(IdentityKind::Respectable | IdentityKind::Artsy) => 0.18,
        Some(IdentityKind::FamilyFriendly) => 0.12,
        Some(IdentityKind::Shady | IdentityKind::Rowdy) => -0.16,
        Some(IdentityKind::Underground) => -0.08,
        None => 0.0,
    };
    identity
        + sim.identity.profile().wealth_bias
        + sim.rumors.wealth_bias()
        + sim.district.mix_bias
        + sim.pub_level as f64 * 0.06
}

/// Lets `count` new patrons in. Capacity is the caller's concern.
pub(crate) fn admit(ctx: &mut SimContext<'_>, count: u32) {
    let reputation = ctx.sim.reputation;
    let bias = wealth_bias(ctx.sim);
    let mood_bias = ctx.sim.identity.profile().mood_bias;
    for _ in 0..count {
        let id = ctx.sim.night.allocate_patron_id();
        let mut patron = Patron::roll(&mut *ctx.rng, id, reputation, bias);
        // The crowd a pub is known for arrives in that frame of mind.
        if ctx.rng.gen_bool((mood_bias.abs() * 0.3).min(1.0)) {
            patron.mood = if mood_bias > 0.0 {
                patron.mood.calm()
            } else {
                patron.mood.escalate()
            };
        }
        ctx.sim.night.patrons.push(patron);
    }
}

/// Natural turnover: a few people drift home every round, more as the night wears on.
pub(crate) fn departure_chance(inside: usize, round: u32) -> f64 {
    let occupancy = (inside as f64 * 0.002).min(0.04);
    let late = (round.saturating_sub(3) as f64 * 0.002).min(0.03);
    (DEPARTURE_BASE + occupancy + late).min(DEPARTURE_CAP)
}

pub(crate) fn natural_departures(ctx: &mut SimContext<'_>) -> u32 {
    let chance = (departure_chance(ctx.sim.night.patrons_inside(), ctx.sim.night.round)
        - music::linger_relief(ctx.sim, ctx.config))
        .max(0.0);
    let mut left = 0;
    for patron in ctx.sim.night.patrons.iter_mut().filter(|p| !p.left) {
        if ctx.rng.gen_bool(chance) {
            patron.left = true;
            left += 1;
        }
    }
    left
}

/// Drops everyone who has gone home from the night's list.
pub(crate) fn cleanup_departed(sim: &mut SimulationState) -> usize {
    let before = sim.night.patrons.len();
    sim.night.patrons.retain(|p| !p.left);
    before - sim.night.patrons.len()
}

/// Punters wanting a drink this round.
pub fn demand(inside: u32, traffic: f64) -> u32 {
    if inside == 0 {
        return 0;
    }
    ((inside as f64 * traffic).round().max(1.0) as u32).min(inside)
}

/// Serves up to `workload.served` patrons in random order; the rest go without.
pub(crate) fn serve_round(
    ctx: &mut SimContext<'_>,
    workload: &WorkloadProfile,
    params: &ServiceParams,
) -> ServiceResult {
    let mut queue: Vec<usize> = ctx
        .sim
        .night
        .patrons
        .iter()
        .enumerate()
        .filter(|(_, p)| !p.left)
        .map(|(idx, _)| idx)
        .collect();
    queue.shuffle(&mut *ctx.rng);
    queue.truncate(workload.demand as usize);
    let served_count = (workload.served as usize).min(queue.len());
    let unserved = queue.split_off(served_count);

    let mut result = ServiceResult {
        served: served_count as u32,
        unserved: unserved.len() as u32,
        ..ServiceResult::default()
    };
    for idx in queue {
        serve_patron(ctx, idx, params, &mut result);
    }
    handle_unserved(ctx, &unserved, &mut result);
    ctx.sim.night.counters.unserved += result.unserved;
    result
}

fn drink_price(item: &StockItemDef, multiplier: f64) -> f64 {
    item.sell_price * multiplier
}

fn desired_drinks(ctx: &mut SimContext<'_>, tier: PatronTier) -> u32 {
    let roll = ctx.rng.gen_range(0..100);
    match tier {
        PatronTier::BigSpender if roll < 20 => 3,
        PatronTier::BigSpender if roll < 55 => 2,
        PatronTier::Decent if roll < 25 => 2,
        _ => 1,
    }
}

/// Tips shrink as prices climb above list.
fn price_tip_multiplier(ratio: f64, tier: PatronTier) -> f64 {
    let mut multiplier: f64 = match ratio {
        r if r <= 1.2 => 1.0,
        r if r <= 1.6 => 0.85,
        r if r <= 2.2 => 0.65,
        _ => 0.40,
    };
    match tier {
        PatronTier::BigSpender => multiplier *= 0.95,
        PatronTier::LowLife => multiplier *= 0.85,
        _ => {}
    }
    multiplier.max(0.2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoSale {
    OutOfStock,
    Unaffordable,
}

/// Picks a drink the patron can pay for, preferring a random in-stock item.
fn choose_drink<'c>(
    ctx: &mut SimContext<'c>,
    wallet: f64,
    multiplier: f64,
) -> Result<&'c StockItemDef, NoSale> {
    let catalog = ctx.catalog;
    let in_stock: Vec<&'c StockItemDef> = catalog
        .stock_of_kind(StockKind::Drink)
        .filter(|item| ctx.sim.inventory.drinks.stock_of(&item.id) > 0)
        .collect();
    if in_stock.is_empty() {
        return Err(NoSale::OutOfStock);
    }
    let first = in_stock[ctx.rng.gen_range(0..in_stock.len())];
    if drink_price(first, multiplier) <= wallet + 1e-9 {
        return Ok(first);
    }
    in_stock
        .iter()
        .copied()
        .filter(|item| drink_price(item, multiplier) <= wallet + 1e-9)
        .max_by(|a, b| a.sell_price.total_cmp(&b.sell_price))
        .ok_or(NoSale::Unaffordable)
}

fn serve_patron(ctx: &mut SimContext<'_>, idx: usize, params: &ServiceParams, result: &mut ServiceResult) {
    let (tier, wallet) = {
        let patron = &ctx.sim.night.patrons[idx];
        (patron.tier, patron.wallet)
    };
    if wallet < BROKE_WALLET {
        ctx.sim.night.patrons[idx].left = true;
        ctx.apply_rep(-1);
        return;
    }
    let drinks = desired_drinks(ctx, tier);
    for _ in 0..drinks {
        let wallet = ctx.sim.night.patrons[idx].wallet;
        match choose_drink(ctx, wallet, params.price_multiplier) {
            Ok(item) => {
                sell_drink(ctx, idx, item, params, tier);
                result.sales += 1;
                if ctx.sim.night.patrons[idx].left {
                    return;
                }
            }
            Err(reason) => {
                let applied = ctx.apply_rep(OUT_OF_STOCK_REP);
                match reason {
                    NoSale::OutOfStock => {
                        ctx.sim.night.counters.stockouts += 1;
                        ctx.log.neg(format!(
                            "Nothing left to pour: a punter goes without. Rep {applied:+}."
                        ));
                    }
                    NoSale::Unaffordable => {
                        ctx.log.neg(format!(
                            "A punter can't afford anything on the bar. Rep {applied:+}."
                        ));
                    }
                }
                escalate(ctx, idx, result);
                if reason == NoSale::Unaffordable {
                    maybe_theft(ctx, idx, params, result);
                }
                return;
            }
        }
    }
    maybe_order_food(ctx, idx, result);
}

fn sell_drink(
    ctx: &mut SimContext<'_>,
    idx: usize,
    item: &StockItemDef,
    params: &ServiceParams,
    tier: PatronTier,
) {
    let price = drink_price(item, params.price_multiplier) * params.spend_multiplier;
    if !ctx.sim.inventory.drinks.take(&item.id) {
        return;
    }
    ctx.earn(RevenueKind::Drinks, price);
    ctx.sim.ledger.record_sale();
    ctx.sim.night.counters.sales += 1;
    ctx.sim.week.price_sum += params.price_multiplier;
    ctx.sim.week.price_samples += 1;

    let tips = price * params.tip_rate * price_tip_multiplier(params.price_multiplier, tier);
    ctx.sim.ledger.record_tip(tips);
    {
        let patron = &mut ctx.sim.night.patrons[idx];
        patron.wallet = (patron.wallet - price).max(0.0);
        patron.drinks_bought += 1;
        patron.no_buy_streak = 0;
    }
    overpricing_backlash(ctx, idx, tier, params.price_multiplier);
    if params.price_multiplier <= FAIR_PRICE_LINE && ctx.rng.gen_bool(FAIR_PRICE_REP_CHANCE) {
        ctx.apply_rep(1);
    }
}

fn overpricing_backlash(ctx: &mut SimContext<'_>, idx: usize, tier: PatronTier, ratio: f64) {
    if ratio <= OVERPRICED_LINE {
        return;
    }
    let negative = ctx.sim.reputation < 0;
    let (mut chance, loss) = match ratio {
        r if r <= 1.6 => (0.10, 1),
        r if r <= 2.2 => (0.20, 1 + negative as i32),
        _ => (0.35, 2 + negative as i32),
    };
    match tier {
        PatronTier::BigSpender => chance += 0.05,
        PatronTier::LowLife => chance += 0.10,
        _ => {}
    }
    if ctx.rng.gen_bool(chance) {
        ctx.apply_rep(-loss);
        if ctx.rng.gen_bool(0.35) {
            ctx.sim.night.patrons[idx].left = true;
            ctx.log.neg("A punter storms out over the prices.");
        }
    }
}

/// Staff with a thick skin talk some trouble down before it starts.
fn staff_defuses(ctx: &mut SimContext<'_>) -> bool {
    let tolerance: i32 = ctx.sim.roster.on_shift().map(|m| m.chaos_tolerance.max(0)).sum();
    let chance = (tolerance as f64 / 200.0).min(0.35);
    chance > 0.0 && ctx.rng.gen_bool(chance)
}

fn chaos_relief(sim: &SimulationState) -> f64 {
    let tolerance: i32 = sim.roster.on_shift().map(|m| m.chaos_tolerance.max(0)).sum();
    (1.0 - (tolerance as f64 / 200.0).min(0.25)).max(0.60)
}

/// Raises a neglected patron's temper. Someone already menacing starts a fight.
fn escalate(ctx: &mut SimContext<'_>, idx: usize, result: &mut ServiceResult) {
    let before = {
        let patron = &mut ctx.sim.night.patrons[idx];
        patron.no_buy_streak += 1;
        let before = patron.mood;
        patron.mood = before.escalate();
        before
    };
    if before == Mood::Menace {
        if door_intervenes(ctx) {
            ctx.sim.night.patrons[idx].left = true;
            ctx.log.info("A punter storms out; the door team heads off a fight.");
        } else if staff_defuses(ctx) {
            ctx.sim.night.patrons[idx].left = true;
            ctx.log.info("Staff talk a furious punter down and see them out.");
        } else {
            ctx.sim.night.patrons[idx].left = true;
            events::trigger_fight(ctx, "A menacing punter snapped", 0.0);
        }
        return;
    }
    if ctx.sim.night.patrons[idx].no_buy_streak >= NO_BUY_KICKOUT {
        ctx.sim.night.patrons[idx].left = true;
        result.kicked_out += 1;
        ctx.log.neg("A punter was kicked out after three rounds without a drink.");
    }
}

fn handle_unserved(ctx: &mut SimContext<'_>, unserved: &[usize], result: &mut ServiceResult) {
    if unserved.is_empty() {
        return;
    }
    let hit = (unserved.len() as i32 / 2).clamp(1, MAX_UNSERVED_REP);
    ctx.apply_rep(-hit);
    ctx.log.neg(format!("{} punter(s) not served this round.", unserved.len()));
    for &idx in unserved {
        if !ctx.sim.night.patrons[idx].left {
            escalate(ctx, idx, result);
        }
    }
}

fn theft_bonus(reputation: i32) -> i32 {
    match reputation {
        r if r >= 60 => -10,
        r if r >= 20 => -4,
        r if r >= -20 => 0,
        r if r >= -60 => 8,
        _ => 14,
    }
}

pub(crate) fn theft_chance(ctx: &mut SimContext<'_>, params: &ServiceParams) -> i32 {
    let mut chance = (10 + theft_bonus(ctx.sim.reputation)) as f64;
    if params.price_multiplier > 1.30 {
        chance += 6.0;
    }
    if params.risky_weekend {
        chance += 6.0;
    }
    if door_intervenes(ctx) {
        chance *= 1.0 - ctx.sim.security.door.theft_reduction();
    }
    chance *= chaos_relief(ctx.sim);
    chance *= (1.0 + params.activity_risk).max(0.30);
    chance *= ctx.sim.security.policy.incident_multiplier();
    chance *= security::task_incident_multiplier(ctx.sim);
    chance *= ctx.sim.upgrades.effects.incident_chance_multiplier;
    chance.round().max(0.0) as i32
}

fn maybe_theft(ctx: &mut SimContext<'_>, idx: usize, params: &ServiceParams, result: &mut ServiceResult) {
    let chance = theft_chance(ctx, params);
    if ctx.rng.gen_range(0..100) >= chance || ctx.sim.inventory.drinks.is_empty() {
        return;
    }
    let mut caught = 45 + params.security * 10 - theft_bonus(ctx.sim.reputation).max(0);
    if door_intervenes(ctx) {
        caught = (caught as f64 * (1.0 + ctx.sim.security.door.theft_reduction())).round() as i32;
    }
    let caught = caught.clamp(15, 95);
    if ctx.rng.gen_range(0..100) < caught {
        ctx.apply_rep(2);
        ctx.log.pos("A would-be thief was caught at the door.");
    } else if let Some(item) = ctx.sim.inventory.drinks.take_any(&mut *ctx.rng) {
        let applied = hit_rep(ctx, -7);
        ctx.sim.night.counters.thefts += 1;
        result.thefts += 1;
        ctx.log.neg(format!("A bottle of {item} walked out the door. Rep {applied:+}."));
    }
    ctx.sim.night.patrons[idx].no_buy_streak += 1;
}

fn food_chance(sim: &SimulationState, tier: PatronTier) -> f64 {
    let mut chance = tier.food_chance();
    match sim.identity.current() {
        Some(IdentityKind::FamilyFriendly) => chance += 0.06,
        Some(IdentityKind::Shady | IdentityKind::Rowdy) => chance -= 0.04,
        _ => {}
    }
    chance -= sim.rumors.heat(RumorTopic::FoodPoisoningScare) as f64 * 0.002;
    chance += sim.rumors.heat(RumorTopic::BestSundayRoast) as f64 * 0.002;
    chance += (sim.rumors.wealth_bias() * 0.2).clamp(-0.08, 0.08);
    chance.clamp(0.0, 0.95)
}

pub(crate) fn food_price(item: &StockItemDef, quality_bonus: i32) -> f64 {
    item.sell_price * (1.0 + 0.04 * quality_bonus.max(0) as f64)
}

fn maybe_order_food(ctx: &mut SimContext<'_>, idx: usize, result: &mut ServiceResult) {
    if !ctx.sim.upgrades.effects.kitchen_unlocked || ctx.sim.night.patrons[idx].ordered_food {
        return;
    }
    let tier = ctx.sim.night.patrons[idx].tier;
    let chance = food_chance(ctx.sim, tier);
    if !ctx.rng.gen_bool(chance) {
        return;
    }
    ctx.sim.night.patrons[idx].ordered_food = true;
    if ctx.sim.inventory.food.is_empty() {
        result.food_misses += 1;
        ctx.sim.night.counters.food_misses += 1;
        let patron = &mut ctx.sim.night.patrons[idx];
        if patron.mood == Mood::Chill {
            patron.mood = Mood::Rowdy;
        }
        if ctx.rng.gen_bool(0.35) {
            ctx.apply_rep(-1);
        }
        return;
    }
    let catalog = ctx.catalog;
    let Some(item_id) = ctx.sim.inventory.food.take_any(&mut *ctx.rng) else {
        return;
    };
    let Some(item) = catalog.stock_item(&item_id) else {
        return;
    };
    let price = food_price(item, ctx.sim.upgrades.effects.food_quality);
    if !ctx.sim.night.patrons[idx].can_afford(price) {
        ctx.sim.inventory.food.add(
            &item.id,
            1,
            ctx.sim.calendar.day_counter(),
            item.shelf_life_days,
        );
        return;
    }
    ctx.earn(RevenueKind::Food, price);
    ctx.sim.ledger.record_sale();
    ctx.sim.night.counters.food_sales += 1;
    ctx.sim.week.food_quality_sum += (item.quality + ctx.sim.upgrades.effects.food_quality) as f64;
    ctx.sim.night.pending_food_orders += 1;
    ctx.sim.night.pending_food_value += price;
    let patron = &mut ctx.sim.night.patrons[idx];
    patron.wallet = (patron.wallet - price).max(0.0);
    result.food_orders += 1;
}

/// Plates ordered last round go out now. Anything the kitchen cannot turn
/// around is refunded, and even served plates can come back.
pub(crate) fn process_food_orders(ctx: &mut SimContext<'_>, workload: &WorkloadProfile, security: i32) -> u32 {
    let pending = ctx.sim.night.pending_food_orders;
    if pending == 0 {
        return 0;
    }
    let average = ctx.sim.night.pending_food_value / pending as f64;
    ctx.sim.night.pending_food_orders = 0;
    ctx.sim.night.pending_food_value = 0.0;

    let capacity = super::staffing::kitchen_capacity(ctx.sim);
    let plated = pending.min(capacity);
    let missed = pending - plated;
    let mut refunds = 0;
    if missed > 0 {
        let total = average * missed as f64;
        if refund(ctx, total, missed) {
            refunds += missed;
        }
        ctx.sim.night.counters.food_misses += missed;
        ctx.log.neg(format!("The kitchen could not keep up: {missed} meal(s) refunded."));
    }

    let chance = plate_refund_chance(ctx.sim, security) * workload.refund_multiplier();
    for _ in 0..plated {
        if ctx.rng.gen_bool(chance.clamp(0.0, 0.9)) {
            let share = ctx.rng.gen_range(0.25..=1.0);
            if refund(ctx, average * share, 1) {
                refunds += 1;
                ctx.apply_rep(-1);
                ctx.log.neg("A meal was sent back.");
            }
        }
    }
    refunds
}

fn plate_refund_chance(sim: &SimulationState, security: i32) -> f64 {
    let cooks: Vec<i32> = sim
        .roster
        .on_shift()
        .filter(|m| m.role.kitchen_capacity() > 0)
        .map(|m| m.skill)
        .collect();
    let skill = if cooks.is_empty() {
        0.0
    } else {
        cooks.iter().sum::<i32>() as f64 / cooks.len() as f64
    };
    let head_chefs = sim
        .roster
        .on_shift()
        .filter(|m| m.role == crate::game::staff::StaffRole::HeadChef)
        .count();
    let effects = &sim.upgrades.effects;
    let mut chance = 0.18 + 0.05 - skill * 0.02;
    chance *= 1.0 - effects.refund_reduction;
    chance *= 1.0 - (effects.food_quality.max(0) as f64 * 0.03).min(0.25);
    chance *= 1.0 - (security.max(0) as f64 * 0.03).min(0.25);
    chance *= 1.0 - (head_chefs as f64 * 0.08).min(0.25);
    chance.clamp(0.04, 0.45)
}

fn refund(ctx: &mut SimContext<'_>, amount: f64, count: u32) -> bool {
    if !ctx.try_pay(amount, CostKind::Refunds, "food refunds") {
        return false;
    }
    for _ in 0..count {
        events::record_refund(ctx, amount / count as f64);
    }
    true
}

/// Lights, glass washing and breakages for one round.
pub fn operating_cost(sim: &SimulationState) -> f64 {
    let headcount = sim.roster.on_shift().count() as f64;
    let skill: f64 = sim
        .roster
        .on_shift()
        .map(|m| {
            let weight = if m.role.is_manager() { 0.6 } else { 1.0 };
            m.skill.max(0) as f64 * weight
        })
        .sum();
    let occupancy = sim.night.patrons_inside() as f64 / sim.night.bar_capacity.max(1) as f64;
    0.35 + 0.20 * headcount + 0.02 * skill + 0.05 * occupancy
}

pub(crate) fn charge_operating_cost(ctx: &mut SimContext<'_>) -> f64 {
    let cost = operating_cost(ctx.sim);
    let taken = ctx.sim.ledger.withdraw(cost);
    ctx.sim.ledger.book_cost(CostKind::Operating, taken);
    taken
}

pub(crate) fn set_price_multiplier(ctx: &mut SimContext<'_>, value: f64) -> Result<f64, Rejection> {
    if !value.is_finite() || !(PRICE_MULTIPLIER_MIN..=PRICE_MULTIPLIER_MAX).contains(&value) {
        return Err(ctx.reject(Rejection::InvalidValue(format!(
            "price multiplier must be between {PRICE_MULTIPLIER_MIN:.2} and {PRICE_MULTIPLIER_MAX:.2}"
        ))));
    }
    ctx.sim.price_multiplier = value;
    ctx.log.info(format!("Prices set to x{value:.2}."));
    Ok(value)
}
