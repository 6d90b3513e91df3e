use crate::game::context::SimContext;
use crate::game::systems::workload::WorkloadProfile;
use crate::game::world::{RoundClass, SimulationState};
use crate::game::{
    BAD_ROUND_FOOD_MISSES_MIN, BAD_ROUND_UNSERVED_MIN, CHAOS_STREAK_CAP, GOOD_ROUND_UNSERVED_MAX,
    OVERCROWD_THRESHOLD,
};

const UNSERVED_PRESSURE: f64 = 1.2;
const FIGHT_PRESSURE: f64 = 4.0;
const REFUND_PRESSURE: f64 = 1.5;
const EVENT_PRESSURE: f64 = 1.2;
const MORALE_COMFORT: f64 = 60.0;
const MORALE_PRESSURE_DIVISOR: f64 = 6.0;
const REP_VOLATILITY_SCALE: f64 = 0.15;
const REP_VOLATILITY_CAP: f64 = 10.0;
const OVERCROWD_SCALE: f64 = 20.0;
const ACTIVITY_BASE_PRESSURE: f64 = 2.0;
const ACTIVITY_RISK_SCALE: f64 = 18.0;
const LOUD_DELTA: f64 = 5.0;

/// What happened in one round, as far as chaos is concerned.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct RoundOutcome {
    pub(crate) unserved: u32,
    pub(crate) fights: u32,
    pub(crate) refunds: u32,
    pub(crate) events: u32,
    pub(crate) food_misses: u32,
    pub(crate) staff_incident: bool,
}

impl RoundOutcome {
    pub(crate) fn classify(&self) -> RoundClass {
        let strongly_negative = self.events > 0
            || self.fights > 0
            || self.refunds > 0
            || self.staff_incident
            || self.unserved >= BAD_ROUND_UNSERVED_MIN
            || self.food_misses >= BAD_ROUND_FOOD_MISSES_MIN;
        if strongly_negative {
            RoundClass::StronglyNegative
        } else if self.unserved <= GOOD_ROUND_UNSERVED_MAX && self.food_misses == 0 {
            RoundClass::MostlyPositive
        } else {
            RoundClass::Neutral
        }
    }

    /// No unserved, no incidents and a calm floor.
    pub(crate) fn is_smooth(&self, chaos: f64) -> bool {
        self.unserved == 0
            && self.fights == 0
            && self.refunds == 0
            && self.events == 0
            && !self.staff_incident
            && chaos < 35.0
    }
}

/// Sum of everything pushing the floor towards trouble this round.
pub(crate) fn raw_pressure(
    sim: &SimulationState,
    outcome: &RoundOutcome,
    workload: &WorkloadProfile,
    activity_risk: Option<f64>,
) -> f64 {
    let reputation = sim.reputation;
    let patrons: f64 = sim
        .night
        .patrons
        .iter()
        .filter(|p| !p.left)
        .map(|p| p.chaos_contribution(reputation))
        .sum();
    let unserved = outcome.unserved as f64 * UNSERVED_PRESSURE;
    let fights = outcome.fights as f64 * FIGHT_PRESSURE;
    let refunds = outcome.refunds as f64 * REFUND_PRESSURE;
    let morale = (MORALE_COMFORT - sim.roster.team_morale()).max(0.0) / MORALE_PRESSURE_DIVISOR;
    let volatility = (sim.week.rep_abs as f64 * REP_VOLATILITY_SCALE).min(REP_VOLATILITY_CAP);
    let occupancy = sim.night.patrons_inside() as f64 / sim.night.bar_capacity.max(1) as f64;
    let overcrowding = (occupancy - OVERCROWD_THRESHOLD).max(0.0) * OVERCROWD_SCALE;
    let events = outcome.events as f64 * EVENT_PRESSURE;
    let activity = activity_risk
        .map(|risk| ACTIVITY_BASE_PRESSURE + risk * ACTIVITY_RISK_SCALE)
        .unwrap_or(0.0);
    let total = patrons
        + unserved
        + fights
        + refunds
        + morale
        + volatility
        + overcrowding
        + events
        + activity
        + workload.chaos_pressure();
    total * (1.0 - sim.upgrades.effects.chaos_reduction).max(0.0)
}

/// Blends fresh pressure into chaos, then stacks the streak delta on top.
/// Returns the streak delta.
pub(crate) fn update_round(
    ctx: &mut SimContext<'_>,
    outcome: &RoundOutcome,
    workload: &WorkloadProfile,
    activity_risk: Option<f64>,
) -> f64 {
    let pressure = raw_pressure(ctx.sim, outcome, workload, activity_risk);
    ctx.sim.chaos.blend(pressure);
    let delta = ctx.sim.chaos.apply_streak(outcome.classify());
    if delta >= LOUD_DELTA {
        ctx.log.info(format!(
            "Chaos +{delta:.0} (bad streak x{}).",
            ctx.sim.chaos.bad_streak.min(CHAOS_STREAK_CAP)
        ));
    } else if delta <= -LOUD_DELTA {
        ctx.log.info(format!(
            "Order returning: chaos {delta:.0} (good streak x{}).",
            ctx.sim.chaos.good_streak.min(CHAOS_STREAK_CAP)
        ));
    }
    delta
}

/// Overnight cool-down. A rough night cools more slowly.
pub(crate) fn decay_at_close(sim: &mut SimulationState) {
    let rough = sim.night.counters.fights > 0 || sim.night.counters.unserved > 6;
    sim.chaos.adjust(if rough { -1.0 } else { -2.0 });
    sim.chaos.reset_streaks();
}

pub fn chaos_label(chaos: f64) -> &'static str {
    match chaos {
        c if c < 15.0 => "calm",
        c if c < 35.0 => "lively",
        c if c < 60.0 => "rowdy",
        c if c < 80.0 => "volatile",
        _ => "out of control",
    }
}
