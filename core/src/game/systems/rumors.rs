use rand::Rng;
use rand::seq::SliceRandom;

use crate::game::context::SimContext;
use crate::game::rumor::{RumorSource, RumorTopic};
use crate::game::world::{ServiceCounters, SimulationState};

const NIGHT_RUMOR_BASE: f64 = 0.10;
const NIGHT_RUMOR_MIN: f64 = 0.02;
const NIGHT_RUMOR_MAX: f64 = 0.25;
const BUSY_UNSERVED: u32 = 6;
const WILD_CHAOS: f64 = 60.0;
const WILD_CHAOS_RUMOR_CHANCE: f64 = 0.20;
const CLEAN_WEEK_DECAY: u32 = 8;
const WEEK_DECAY: u32 = 6;
const WORD_OF_MOUTH_SCALE: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Negative,
    Mixed,
    Positive,
}

fn tone_for(team_morale: f64) -> Tone {
    if team_morale <= 40.0 {
        Tone::Negative
    } else if team_morale >= 70.0 {
        Tone::Positive
    } else {
        Tone::Mixed
    }
}

/// Heat picked up from what just happened in a round.
pub(crate) fn record_round(ctx: &mut SimContext<'_>, fights: u32, unserved: u32) {
    if fights > 0 {
        ctx.sim
            .rumors
            .add_heat(RumorTopic::FightsEveryWeekend, 4 * fights, RumorSource::Event);
    }
    if unserved >= BUSY_UNSERVED {
        ctx.sim
            .rumors
            .add_heat(RumorTopic::WateredDownDrinks, 3, RumorSource::Punter);
    }
    if ctx.sim.chaos.value() > WILD_CHAOS && ctx.rng.gen_bool(WILD_CHAOS_RUMOR_CHANCE) {
        ctx.sim
            .rumors
            .add_heat(RumorTopic::DodgyLateNights, 4, RumorSource::Punter);
    }
}

fn went_wrong(counters: &ServiceCounters) -> bool {
    counters.unserved > 0
        || counters.refunds > 0
        || counters.food_misses > 0
        || counters.fights > 0
        || counters.staff_incidents > 0
}

pub(crate) fn night_rumor_chance(counters: &ServiceCounters, chaos: f64) -> f64 {
    let mut chance = NIGHT_RUMOR_BASE;
    if counters.unserved >= BUSY_UNSERVED {
        chance += 0.04;
    }
    if counters.refunds > 0 || counters.food_misses > 0 {
        chance += 0.03;
    }
    if counters.staff_incidents > 0 {
        chance += 0.04;
    }
    if counters.fights > 0 {
        chance += 0.03;
    }
    if chaos > 55.0 {
        chance += 0.03;
    }
    if chaos < 18.0 && !went_wrong(counters) {
        chance -= 0.03;
    }
    chance.clamp(NIGHT_RUMOR_MIN, NIGHT_RUMOR_MAX)
}

fn candidates(ctx: &SimContext<'_>, tone: Tone) -> Vec<RumorTopic> {
    let counters = &ctx.sim.night.counters;
    let chaos = ctx.sim.chaos.value();
    let spoiled_food = counters.refunds > 0 || counters.food_misses > 0;
    let mut negative = Vec::new();
    if counters.staff_incidents > 0 {
        negative.push(RumorTopic::StaffStealing);
    }
    if counters.unserved >= BUSY_UNSERVED {
        negative.push(RumorTopic::SlowService);
    }
    if spoiled_food {
        negative.push(RumorTopic::FoodPoisoningScare);
    }
    if counters.fights > 0 || chaos > 55.0 {
        negative.push(RumorTopic::DodgyLateNights);
        negative.push(RumorTopic::FightsEveryWeekend);
    }

    let mut positive = Vec::new();
    if ctx.sim.roster.team_morale() >= 70.0 {
        positive.push(RumorTopic::FriendlyStaff);
    }
    if chaos < 20.0 && counters.unserved == 0 {
        positive.push(RumorTopic::GreatAtmosphere);
    }
    if ctx.sim.upgrades.effects.kitchen_unlocked && !spoiled_food {
        positive.push(RumorTopic::BestSundayRoast);
    }
    if ctx.sim.activity.tonight.is_some() {
        positive.push(RumorTopic::LiveMusicScene);
    }

    let picked = match tone {
        Tone::Negative => negative,
        Tone::Positive => positive,
        Tone::Mixed => negative.into_iter().chain(positive).collect(),
    };
    if !picked.is_empty() {
        return picked;
    }
    match tone {
        Tone::Negative => vec![
            RumorTopic::SlowService,
            RumorTopic::StaffStealing,
            RumorTopic::DodgyLateNights,
            RumorTopic::FightsEveryWeekend,
            RumorTopic::WateredDownDrinks,
            RumorTopic::FoodPoisoningScare,
        ],
        Tone::Positive => vec![
            RumorTopic::FriendlyStaff,
            RumorTopic::GreatAtmosphere,
            RumorTopic::BestSundayRoast,
            RumorTopic::LiveMusicScene,
        ],
        Tone::Mixed => vec![
            RumorTopic::GreatAtmosphere,
            RumorTopic::SlowService,
            RumorTopic::BestSundayRoast,
            RumorTopic::DodgyLateNights,
        ],
    }
}

/// Advocating regulars talk down tonight's odds of gossip.
fn shielded_chance(sim: &SimulationState) -> f64 {
    (night_rumor_chance(&sim.night.counters, sim.chaos.value()) - sim.vips.rumor_shield)
        .clamp(NIGHT_RUMOR_MIN, NIGHT_RUMOR_MAX)
}

/// Rivals stirring the district sour the talk before it starts.
fn night_tone(sim: &SimulationState) -> Tone {
    tone_for(sim.roster.team_morale() - sim.district.rumor_bias * 10.0)
}

/// Maybe starts a rumor about tonight. Returns the topic that picked up heat.
pub(crate) fn night_rumor(ctx: &mut SimContext<'_>) -> Option<RumorTopic> {
    let chance = shielded_chance(ctx.sim);
    if !ctx.rng.gen_bool(chance) {
        return None;
    }
    let tone = night_tone(ctx.sim);
    let pool = candidates(ctx, tone);
    let topic = *pool.choose(&mut *ctx.rng)?;
    let heat = match tone {
        Tone::Negative => 10 + ctx.rng.gen_range(0..=7),
        Tone::Mixed => 8 + ctx.rng.gen_range(0..=6),
        Tone::Positive => 8 + ctx.rng.gen_range(0..=5),
    };
    let heat = (heat as f64 * ctx.sim.identity.profile().rumor_spread).round().max(1.0) as u32;
    let fresh = ctx.sim.rumors.add_heat(topic, heat, RumorSource::Punter);
    let verb = if fresh { "starts" } else { "grows" };
    if topic.is_positive() {
        ctx.log.pos(format!("Word {verb} about \"{}\".", topic.label()));
    } else {
        ctx.log.neg(format!("A rumor {verb}: \"{}\".", topic.label()));
    }
    Some(topic)
}

/// Weekly settlement: decay, fresh heat from the week's record, then instances rebuilt.
pub(crate) fn weekly_update(ctx: &mut SimContext<'_>) {
    let week = &ctx.sim.week;
    let counters = week.counters;
    let food_quality = week.average_food_quality();
    let average_price = week.average_price();
    let average_chaos = week.average_chaos();

    let clean = counters.unserved <= 2 && counters.fights == 0;
    let rumors = &mut ctx.sim.rumors;
    rumors.decay_all(if clean { CLEAN_WEEK_DECAY } else { WEEK_DECAY });

    if counters.refund_total > 10.0 || (counters.food_sales > 0 && food_quality < 2.0) {
        rumors.add_heat(RumorTopic::FoodPoisoningScare, 18, RumorSource::Punter);
    }
    if counters.food_sales > 0 && food_quality >= 3.0 && counters.refunds < 6 {
        rumors.add_heat(RumorTopic::BestSundayRoast, 14, RumorSource::Punter);
    }
    if counters.fights >= 2 || counters.negative_events >= 3 {
        rumors.add_heat(RumorTopic::FightsEveryWeekend, 16, RumorSource::Event);
    }
    if average_chaos > 35.0 {
        rumors.add_heat(RumorTopic::FightsEveryWeekend, 6, RumorSource::Event);
    }
    if counters.staff_incidents > 0 {
        rumors.add_heat(RumorTopic::StaffStealing, 15, RumorSource::Staff);
    }
    if average_price >= 1.35 {
        rumors.add_heat(RumorTopic::WateredDownDrinks, 12, RumorSource::Punter);
    }
    rumors.rebuild_instances();

    let active = rumors.instances().len();
    let pressure = (rumors.reputation_pressure() * WORD_OF_MOUTH_SCALE).round() as i32;
    ctx.log.event(format!("Rumors shift around town: {active} active."));
    if pressure != 0 {
        let applied = ctx.apply_rep(pressure);
        ctx.log.info(format!("Word of mouth moves reputation {applied:+}."));
    }
}
