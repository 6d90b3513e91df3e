//! Things that happen on the floor while the doors are open.

use rand::Rng;

use crate::game::context::SimContext;
use crate::game::economy::{CostKind, RevenueKind};
use crate::game::identity::IdentityKind;
use crate::game::inventory::StockKind;
use crate::game::rumor::{RumorSource, RumorTopic};
use crate::game::systems::security;
use crate::game::{
    BASE_EVENT_CHANCE, BOUNCER_REDUCTION_CAP, FORCED_EVENT_AFTER_ROUNDS, REP_HIGH_BAND,
    REP_LOW_BAND, SCANDAL_REP_THRESHOLD,
};
use crate::time::Season;

const LOW_REP_EVENT_BONUS: i32 = 6;
const HIGH_REP_EVENT_BONUS: i32 = 3;
const SCANDAL_CHANCE: f64 = 0.03;
const FREEBIE_ITEM: &str = "house_white";
const FREEBIE_UNITS: u32 = 2;

/// Season pressure on in-service events.
pub(crate) fn round_season_multiplier(seasons: &[Season]) -> f64 {
    seasons
        .iter()
        .map(|season| match season {
            Season::ExamSeason => 1.0,
            Season::TouristWave => 1.05,
            Season::WinterSlump => 0.95,
            Season::DerbyWeek => 1.08,
        })
        .product()
}

pub(crate) fn event_chance(ctx: &SimContext<'_>, activity_bonus: i32) -> f64 {
    let sim = &*ctx.sim;
    let identity_bonus = sim
        .identity
        .current()
        .map(IdentityKind::event_chance_bonus)
        .unwrap_or(0);
    let mut chance = BASE_EVENT_CHANCE
        + sim.upgrades.effects.event_chance
        + activity_bonus
        + identity_bonus
        + (sim.chaos.value() / 10.0).round() as i32;
    if sim.reputation <= REP_LOW_BAND {
        chance += LOW_REP_EVENT_BONUS;
    } else if sim.reputation >= REP_HIGH_BAND {
        chance += HIGH_REP_EVENT_BONUS;
    }
    chance.max(0) as f64 * round_season_multiplier(&sim.calendar.seasons())
}

/// Percent chance that an event lands on the good side.
pub(crate) fn positive_chance(ctx: &SimContext<'_>) -> i32 {
    let sim = &*ctx.sim;
    let identity_bias = sim.identity.profile().event_bias;
    let rumor_bias = sim.rumors.event_bias();
    let chaos = sim.chaos.value() / 100.0;
    (50.0 + sim.reputation as f64 / 2.0 + identity_bias * 30.0 + rumor_bias * 25.0 - chaos * 20.0)
        .round()
        .clamp(5.0, 95.0) as i32
}

/// Rolls the round's event. Forced after a run of quiet rounds.
/// Returns whether anything happened.
pub(crate) fn maybe_event(ctx: &mut SimContext<'_>, activity_bonus: i32) -> bool {
    ctx.sim.night.quiet_rounds += 1;
    let forced = ctx.sim.night.quiet_rounds >= FORCED_EVENT_AFTER_ROUNDS;
    if !forced {
        let chance = event_chance(ctx, activity_bonus);
        if ctx.rng.gen_range(0.0..100.0) >= chance {
            return false;
        }
    }
    ctx.sim.night.quiet_rounds = 0;
    ctx.sim.night.counters.events += 1;
    ctx.sim.ledger.record_event();
    random_event(ctx);
    true
}

fn random_event(ctx: &mut SimContext<'_>) {
    let positive = ctx.rng.gen_range(0..100) < positive_chance(ctx);
    if let Some(identity) = ctx.sim.identity.current() {
        let chance = 16 + ctx.week() as i32 / 2;
        if ctx.rng.gen_range(0..100) < chance && identity_event(ctx, identity, positive) {
            return;
        }
    }
    if positive {
        ctx.sim.night.counters.positive_events += 1;
        positive_event(ctx);
    } else {
        ctx.sim.night.counters.negative_events += 1;
        negative_event(ctx);
    }
}

/// An event flavoured by who the pub has become. Returns `false` when the
/// identity has nothing for this polarity.
fn identity_event(ctx: &mut SimContext<'_>, identity: IdentityKind, positive: bool) -> bool {
    match (identity, positive) {
        (IdentityKind::Respectable, true) => {
            cash_and_rep(ctx, "Charity collection night", (18.0, 32.0), 4);
        }
        (IdentityKind::Artsy, _) => {
            cash_and_rep(ctx, "Local artists held an impromptu exhibition", (10.0, 19.0), 3);
        }
        (IdentityKind::FamilyFriendly, _) => {
            cash_and_rep(ctx, "A birthday party booked the back room", (12.0, 23.0), 5);
        }
        (IdentityKind::Rowdy, false) => {
            ctx.log.event("The usual crowd kicked off again.");
            trigger_fight(ctx, "Rowdy regulars squared up", 0.0);
            hit_rep(ctx, -2);
        }
        (IdentityKind::Shady, _) => {
            let rep = if ctx.rng.gen_bool(0.5) { -1 } else { -3 };
            let cash = ctx.rng.gen_range(25.0..=49.0);
            ctx.earn(RevenueKind::Other, cash);
            let applied = hit_rep(ctx, rep);
            ctx.log.event(format!(
                "A back-room deal went through: GBP {cash:.2}, rep {applied:+}."
            ));
        }
        (IdentityKind::Underground, false) => {
            let cash = ctx.rng.gen_range(18.0..=35.0);
            ctx.earn(RevenueKind::Other, cash);
            let applied = hit_rep(ctx, -2);
            ctx.log.event(format!(
                "An unlicensed after-party paid GBP {cash:.2} but the street noticed (rep {applied:+})."
            ));
        }
        _ => return false,
    }
    if positive {
        ctx.sim.night.counters.positive_events += 1;
    } else {
        ctx.sim.night.counters.negative_events += 1;
    }
    true
}

fn cash_and_rep(ctx: &mut SimContext<'_>, name: &str, cash: (f64, f64), rep: i32) {
    let amount = ctx.rng.gen_range(cash.0..=cash.1);
    ctx.earn(RevenueKind::Events, amount);
    let applied = ctx.apply_rep(rep);
    ctx.log.event(format!("{name}: GBP {amount:.2}, rep {applied:+}."));
}

fn gain(ctx: &mut SimContext<'_>, name: &str, rep: i32) {
    let applied = ctx.apply_rep(rep);
    ctx.log.event(format!("{name}: rep {applied:+}."));
}

fn positive_event(ctx: &mut SimContext<'_>) {
    let mut roll = ctx.rng.gen_range(0..100);
    if ctx.sim.reputation >= REP_HIGH_BAND {
        roll = (roll - 10).max(0);
    }
    if ctx.sim.pub_level < 2 && roll < 22 {
        roll += 18;
    }
    let kitchen = ctx.sim.upgrades.effects.kitchen_unlocked;
    match roll {
        0..10 => gain(ctx, "A celebrity dropped in for a pint", 6),
        10..22 => {
            ctx.earn(RevenueKind::Events, 10.0);
            gain(ctx, "A TV crew filmed a segment at the bar", 4);
        }
        22..36 => gain(ctx, "An influencer posted glowing stories", 6),
        36..52 => cash_and_rep(ctx, "A corporate party paid a deposit", (40.0, 70.0), 1),
        52..66 => cash_and_rep(ctx, "The regulars bought a round for the house", (15.0, 30.0), 2),
        66..78 => cash_and_rep(ctx, "A brewery collab night", (12.0, 20.0), 5),
        78..88 if kitchen => cash_and_rep(ctx, "A food reviewer loved the menu", (8.0, 17.0), 4),
        78..90 => supplier_freebie(ctx),
        _ => gain(ctx, "The pub won a local atmosphere award", 5),
    }
}

fn supplier_freebie(ctx: &mut SimContext<'_>) {
    let catalog = ctx.catalog;
    let item = catalog
        .stock_item(FREEBIE_ITEM)
        .or_else(|| catalog.stock_of_kind(StockKind::Drink).next());
    let Some(item) = item else {
        return;
    };
    let day = ctx.sim.calendar.day_counter();
    let added = ctx
        .sim
        .inventory
        .drinks
        .add(&item.id, FREEBIE_UNITS, day, item.shelf_life_days);
    ctx.log.event(format!(
        "The supplier dropped off {added} free {} as a thank-you.",
        item.name
    ));
}

/// A reputation hit softened by security.
pub(crate) fn hit_rep(ctx: &mut SimContext<'_>, raw: i32) -> i32 {
    let hit = security::mitigate_rep_hit(ctx.sim, raw);
    ctx.apply_rep(hit)
}

pub(crate) fn door_intervenes(ctx: &mut SimContext<'_>) -> bool {
    let chance = ctx.sim.security.door.best_intervention_chance();
    !ctx.sim.security.door.is_empty() && ctx.rng.gen_bool(chance.clamp(0.0, 1.0))
}

fn scaled_loss(base: f64, reduction: f64, floor: i32) -> i32 {
    ((base * (1.0 - reduction)).round() as i32).max(floor)
}

fn negative_event(ctx: &mut SimContext<'_>) {
    let reduction = if door_intervenes(ctx) {
        ctx.log.info("The door team stepped in early.");
        ctx.sim.security.door.negative_reduction()
    } else {
        0.0
    };
    let mut roll = ctx.rng.gen_range(0..100);
    if ctx.sim.reputation <= REP_LOW_BAND {
        roll = (roll + 15).min(99);
    }
    if ctx.sim.pub_level < 2 && roll > 95 {
        roll = 85;
    }
    let kitchen = ctx.sim.upgrades.effects.kitchen_unlocked;
    match roll {
        0..10 => trigger_fight(ctx, "A fight broke out at the bar", reduction),
        10..20 => loss(ctx, "The police paid a visit", scaled_loss(7.0, reduction, 3)),
        20..30 => {
            let repair = (8.0 * (1.0 - reduction)).max(4.0);
            ctx.try_pay(repair, CostKind::Repairs, "a collapsed table");
            loss(ctx, "A table collapsed under a dancing punter", scaled_loss(6.0, reduction, 3));
        }
        30..42 => loss(ctx, "A wave of bad online reviews", scaled_loss(8.0, reduction, 4)),
        42..52 if kitchen => {
            let refund = ctx.rng.gen_range(12.0..=29.0);
            if ctx.try_pay(refund, CostKind::Refunds, "food scare refunds") {
                record_refund(ctx, refund);
            }
            ctx.sim
                .rumors
                .add_heat(RumorTopic::FoodPoisoningScare, 6, RumorSource::Event);
            loss(ctx, "A food scare at table six", scaled_loss(7.0, reduction, 4));
        }
        42..62 => {
            let cost = (12.0 * (1.0 - reduction)).max(5.0);
            ctx.try_pay(cost, CostKind::Supplies, "emergency glassware");
            loss(ctx, "Ran short of clean glasses", scaled_loss(5.0, reduction, 2));
        }
        62..72 => {
            trigger_fight(ctx, "A stag do got out of hand", reduction);
            hit_rep(ctx, -2);
        }
        72..80 => {
            loss(ctx, "Underage drinkers were caught at the bar", scaled_loss(5.0, reduction, 2));
            if ctx.rng.gen_bool(0.35) {
                trigger_fight(ctx, "Their mates did not take it well", reduction);
            }
        }
        80..90 => {
            let units = ctx.rng.gen_range(1..=2);
            let lost = ctx.sim.inventory.drinks.remove_random(units, ctx.rng);
            loss(ctx, &format!("The supplier no-showed ({lost} stock short)"), 2);
        }
        90..96 => {
            ctx.sim.night.counters.staff_incidents += 1;
            loss(ctx, "Two staff argued in front of customers", scaled_loss(4.0, reduction, 2));
        }
        _ => loss(ctx, "An influencer backlash went viral", scaled_loss(9.0, reduction, 5)),
    }
}

fn loss(ctx: &mut SimContext<'_>, name: &str, points: i32) {
    let applied = hit_rep(ctx, -points);
    ctx.log.neg(format!("{name}: rep {applied:+}."));
}

pub(crate) fn record_refund(ctx: &mut SimContext<'_>, amount: f64) {
    ctx.sim.night.counters.refunds += 1;
    ctx.sim.night.counters.refund_total += amount;
}

/// A fight on the floor. Bouncers cut both the reputation hit and the damages.
pub(crate) fn trigger_fight(ctx: &mut SimContext<'_>, reason: &str, base_reduction: f64) {
    let mut reduction = base_reduction;
    if door_intervenes(ctx) {
        reduction += ctx.sim.security.door.fight_reduction();
    }
    let reduction = reduction.min(BOUNCER_REDUCTION_CAP);
    let raw = -((10.0 * (1.0 - reduction)).round() as i32).max(3);
    let applied = hit_rep(ctx, raw);
    let damages = (12.0 * (1.0 - reduction)).max(4.0);
    ctx.try_pay(damages, CostKind::Repairs, "fight damages");
    ctx.sim.night.counters.fights += 1;
    ctx.sim.night.counters.events += 1;
    ctx.log.neg(format!(
        "{reason}. Rep {applied:+}, GBP {damages:.2} in damages."
    ));
}

/// Rare fall from grace when the pub is riding too high.
pub(crate) fn maybe_scandal(ctx: &mut SimContext<'_>) -> bool {
    if ctx.sim.reputation <= SCANDAL_REP_THRESHOLD || !ctx.rng.gen_bool(SCANDAL_CHANCE) {
        return false;
    }
    let share = ctx.rng.gen_range(0.5..=0.8);
    let hit = (ctx.sim.reputation as f64 * share).round() as i32;
    let applied = ctx.apply_rep(-hit);
    ctx.sim.night.counters.negative_events += 1;
    ctx.log.header("SCANDAL");
    ctx.log.neg(format!(
        "A tabloid story tore through the pub's good name. Rep {applied:+}."
    ));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::context::testing::Fixture;
    use crate::game::security::{Bouncer, BouncerQuality};

    fn strong_bouncer() -> Bouncer {
        Bouncer {
            quality: BouncerQuality::High,
            theft_reduction: 0.4,
            negative_reduction: 0.4,
            fight_reduction: 0.4,
            nightly_pay: 40.0,
        }
    }

    #[test]
    fn quiet_rounds_force_an_event() {
        let mut fx = Fixture::new(8);
        fx.sim.night.open = true;
        fx.sim.night.quiet_rounds = FORCED_EVENT_AFTER_ROUNDS - 1;
        assert!(maybe_event(&mut fx.ctx(), -100));
        assert_eq!(fx.sim.night.quiet_rounds, 0);
        assert_eq!(fx.sim.night.counters.events, 1);
    }

    #[test]
    fn event_chance_adds_reputation_extremes() {
        let mut fx = Fixture::new(8);
        let season = round_season_multiplier(&fx.sim.calendar.seasons());
        fx.sim.reputation = 0;
        let neutral = event_chance(&fx.ctx(), 0);
        fx.sim.reputation = -50;
        assert!((event_chance(&fx.ctx(), 0) - neutral - 6.0 * season).abs() < 1e-9);
        fx.sim.reputation = 70;
        assert!((event_chance(&fx.ctx(), 0) - neutral - 3.0 * season).abs() < 1e-9);
    }

    #[test]
    fn positive_chance_is_clamped() {
        let mut fx = Fixture::new(8);
        fx.sim.reputation = 100;
        assert_eq!(positive_chance(&fx.ctx()), 95);
        fx.sim.reputation = -100;
        fx.sim.chaos.set(100.0);
        assert_eq!(positive_chance(&fx.ctx()), 5);
        fx.sim.reputation = 0;
        fx.sim.chaos.set(0.0);
        assert_eq!(positive_chance(&fx.ctx()), 50);
    }

    #[test]
    fn fights_cost_reputation_and_damages() {
        let mut fx = Fixture::new(8);
        fx.sim.reputation = 20;
        trigger_fight(&mut fx.ctx(), "Test fight", 0.0);
        assert_eq!(fx.sim.reputation, 10);
        assert_eq!(fx.sim.night.counters.fights, 1);
        assert!((fx.sim.ledger.week().cost_of(CostKind::Repairs) - 12.0).abs() < 1e-9);
    }

    #[test]
    fn bouncers_soften_fights() {
        let mut fx = Fixture::new(8);
        fx.sim.reputation = 20;
        fx.sim.security.door.bouncers.push(strong_bouncer());
        trigger_fight(&mut fx.ctx(), "Test fight", 0.4);
        assert!(fx.sim.reputation > 10);
        assert!(fx.sim.ledger.week().cost_of(CostKind::Repairs) < 12.0);
    }

    #[test]
    fn scandal_only_hits_the_top() {
        let mut fx = Fixture::new(8);
        fx.sim.reputation = 80;
        for _ in 0..500 {
            assert!(!maybe_scandal(&mut fx.ctx()));
        }
        fx.sim.reputation = 90;
        let mut hit = false;
        for _ in 0..500 {
            if maybe_scandal(&mut fx.ctx()) {
                hit = true;
                break;
            }
        }
        assert!(hit);
        assert!(fx.sim.reputation <= 45);
    }

    #[test]
    fn season_multipliers_differ_from_overnight() {
        assert!((round_season_multiplier(&[Season::DerbyWeek]) - 1.08).abs() < 1e-9);
        assert!((round_season_multiplier(&[Season::WinterSlump]) - 0.95).abs() < 1e-9);
    }
}
