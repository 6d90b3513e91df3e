use rand::Rng;

use crate::game::catalog::ActivityDef;
use crate::game::context::SimContext;
use crate::game::systems::{music, security};
use crate::game::world::SimulationState;
use crate::time::{TimeOfDay, TimePhase};

const PUB_LEVEL_TRAFFIC_STEP: f64 = 0.03;
const COLLAPSED_TRAFFIC: f64 = 0.35;
const WEEKEND_TRAFFIC: f64 = 1.20;
const ACTION_TRAFFIC_MIN: f64 = -0.5;
const ACTION_TRAFFIC_MAX: f64 = 0.6;

/// Phase curve of the night, with the after-work rush and rowdy late nights.
pub(crate) fn time_of_day_multiplier(time: TimeOfDay, chaos: f64) -> f64 {
    let phase = time.phase();
    let mut multiplier = match phase {
        TimePhase::EarlyDay => 0.82,
        TimePhase::BuildUp => 1.02,
        TimePhase::Peak => 1.22,
        TimePhase::Late => 0.92,
    };
    if phase == TimePhase::BuildUp
        && time >= TimeOfDay::new(17, 24)
        && time < TimeOfDay::new(18, 0)
    {
        multiplier *= 1.10;
    }
    if phase == TimePhase::Late && chaos > 60.0 {
        multiplier *= 0.95;
    }
    multiplier
}

/// Stepped reputation curve with a nudge at the extremes.
pub(crate) fn reputation_multiplier(reputation: i32) -> f64 {
    let mut multiplier = match reputation {
        r if r >= 70 => 1.28,
        r if r >= 40 => 1.14,
        r if r >= -20 => 1.00,
        r if r >= -60 => 0.86,
        _ => 0.72,
    };
    if reputation > 70 {
        multiplier += 0.08;
    } else if reputation > 40 {
        multiplier += 0.04;
    } else if reputation < -60 {
        multiplier -= 0.08;
    } else if reputation < -20 {
        multiplier -= 0.04;
    }
    multiplier
}

/// Every named factor that feeds foot traffic for one round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrafficModifiers {
    pub reputation: f64,
    pub weekend: f64,
    pub identity: f64,
    pub rumors: f64,
    pub upgrades: f64,
    pub activity: f64,
    pub policy: f64,
    pub pub_level: f64,
    pub landlord: f64,
    pub wage_fallout: f64,
    pub security_task: f64,
    pub music: f64,
    pub legacy: f64,
    pub rivals: f64,
    pub vips: f64,
}

impl Default for TrafficModifiers {
    fn default() -> Self {
        Self {
            reputation: 1.0,
            weekend: 1.0,
            identity: 1.0,
            rumors: 1.0,
            upgrades: 1.0,
            activity: 1.0,
            policy: 1.0,
            pub_level: 1.0,
            landlord: 1.0,
            wage_fallout: 1.0,
            security_task: 1.0,
            music: 1.0,
            legacy: 1.0,
            rivals: 1.0,
            vips: 1.0,
        }
    }
}

impl TrafficModifiers {
    pub fn total(&self) -> f64 {
        self.reputation
            * self.weekend
            * self.identity
            * self.rumors
            * self.upgrades
            * self.activity
            * self.policy
            * self.pub_level
            * self.landlord
            * self.wage_fallout
            * self.security_task
            * self.music
            * self.legacy
            * self.rivals
            * self.vips
    }

    /// The slow-moving part used to seed the opening crowd.
    pub fn base(&self) -> f64 {
        self.reputation
            * self.weekend
            * self.identity
            * self.pub_level
            * self.upgrades
            * self.legacy
            * self.rivals
            * self.vips
    }
}

fn weekend_multiplier(ctx: &mut SimContext<'_>) -> f64 {
    if ctx.sim.calendar.is_weekend() {
        WEEKEND_TRAFFIC
    } else {
        0.92 + ctx.rng.gen_range(0.0..0.16)
    }
}

pub(crate) fn tonight_activity<'c>(ctx: &SimContext<'c>) -> Option<&'c ActivityDef> {
    let catalog = ctx.catalog;
    ctx.sim
        .activity
        .tonight
        .as_deref()
        .and_then(|id| catalog.activity(id))
}

pub(crate) fn modifiers(ctx: &mut SimContext<'_>) -> TrafficModifiers {
    let weekend = weekend_multiplier(ctx);
    let activity = 1.0 + tonight_activity(ctx).map(|a| a.traffic).unwrap_or(0.0);
    let sim: &SimulationState = &*ctx.sim;
    let mut reputation = reputation_multiplier(sim.reputation);
    if sim.game_over.is_some() {
        reputation *= COLLAPSED_TRAFFIC;
    }
    let landlord = if sim.night.action_traffic_rounds > 0 {
        1.0 + sim
            .night
            .action_traffic
            .clamp(ACTION_TRAFFIC_MIN, ACTION_TRAFFIC_MAX)
    } else {
        1.0
    };
    let wage_fallout = if sim.staffing.traffic_penalty_rounds > 0 && sim.staffing.traffic_penalty > 0.0 {
        sim.staffing.traffic_penalty
    } else {
        1.0
    };
    TrafficModifiers {
        reputation,
        weekend,
        identity: sim.identity.profile().traffic,
        rumors: sim.rumors.traffic_multiplier(),
        upgrades: sim.upgrades.effects.traffic_multiplier,
        activity,
        policy: sim.security.policy.traffic_multiplier(),
        pub_level: 1.0 + sim.pub_level as f64 * PUB_LEVEL_TRAFFIC_STEP,
        landlord,
        wage_fallout,
        security_task: security::task_traffic_multiplier(sim),
        music: music::round_effects(sim, ctx.config).traffic,
        legacy: sim.prestige.legacy.traffic_multiplier(),
        rivals: sim.district.traffic,
        vips: sim.vips.demand_boost,
    }
}

/// Counts down round-limited traffic effects after a round has used them.
pub(crate) fn tick_round_effects(sim: &mut SimulationState) {
    let night = &mut sim.night;
    if night.action_traffic_rounds > 0 {
        night.action_traffic_rounds -= 1;
        if night.action_traffic_rounds == 0 {
            night.action_traffic = 0.0;
        }
    }
    let staffing = &mut sim.staffing;
    if staffing.traffic_penalty_rounds > 0 {
        staffing.traffic_penalty_rounds -= 1;
        if staffing.traffic_penalty_rounds == 0 {
            staffing.traffic_penalty = 1.0;
        }
    }
}

/// Mean arrivals for a round before the random wobble.
pub(crate) fn expected_arrivals(traffic: f64, weekend: bool) -> f64 {
    let base = if weekend { 2.8 } else { 1.9 };
    base * traffic.clamp(0.65, 1.60)
}

pub(crate) fn roll_arrivals(ctx: &mut SimContext<'_>, traffic: f64) -> u32 {
    let room = ctx
        .sim
        .night
        .bar_capacity
        .saturating_sub(ctx.sim.night.patrons_inside() as u32);
    if room == 0 {
        return 0;
    }
    let expected = expected_arrivals(traffic, ctx.sim.calendar.is_weekend());
    let rolled = (expected + ctx.rng.gen_range(-1.0..1.0)).round().max(0.0) as u32;
    rolled.min(room)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::context::testing::Fixture;

    #[test]
    fn phases_shape_the_night() {
        assert_eq!(time_of_day_multiplier(TimeOfDay::new(12, 0), 0.0), 0.82);
        assert_eq!(time_of_day_multiplier(TimeOfDay::new(16, 0), 0.0), 1.02);
        assert!((time_of_day_multiplier(TimeOfDay::new(17, 30), 0.0) - 1.122).abs() < 1e-9);
        assert_eq!(time_of_day_multiplier(TimeOfDay::new(19, 0), 90.0), 1.22);
        assert!((time_of_day_multiplier(TimeOfDay::new(22, 0), 61.0) - 0.874).abs() < 1e-9);
        assert_eq!(time_of_day_multiplier(TimeOfDay::new(22, 0), 60.0), 0.92);
    }

    #[test]
    fn reputation_curve_steps() {
        assert!((reputation_multiplier(80) - 1.36).abs() < 1e-9);
        assert!((reputation_multiplier(70) - 1.32).abs() < 1e-9);
        assert!((reputation_multiplier(50) - 1.18).abs() < 1e-9);
        assert_eq!(reputation_multiplier(0), 1.0);
        assert!((reputation_multiplier(-30) - 0.82).abs() < 1e-9);
        assert!((reputation_multiplier(-80) - 0.64).abs() < 1e-9);
    }

    #[test]
    fn modifiers_multiply_out() {
        let mut fx = Fixture::new(12);
        let mods = modifiers(&mut fx.ctx());
        let expected = mods.reputation
            * mods.weekend
            * mods.identity
            * mods.rumors
            * mods.upgrades
            * mods.activity
            * mods.policy
            * mods.pub_level
            * mods.landlord
            * mods.wage_fallout
            * mods.security_task
            * mods.music
            * mods.legacy
            * mods.rivals
            * mods.vips;
        assert!((mods.total() - expected).abs() < 1e-12);
        assert!((0.92..1.08).contains(&mods.weekend));
    }

    #[test]
    fn door_tasks_and_legacy_move_the_crowd() {
        use crate::game::security::SecurityTask;

        let mut fx = Fixture::new(12);
        fx.sim.prestige.legacy.traffic = 0.05;
        fx.sim.night.open = true;
        fx.sim.night.round = 4;
        fx.sim.security.tasks.queue(SecurityTask::VisiblePatrol, 3);
        let mods = modifiers(&mut fx.ctx());
        assert_eq!(mods.security_task, 1.03);
        assert!((mods.legacy - 1.05).abs() < 1e-12);
        fx.sim.security.tasks.finish_round(4);
        assert_eq!(modifiers(&mut fx.ctx()).security_task, 1.0);
    }

    #[test]
    fn music_only_plays_while_open() {
        use crate::game::music::MusicProfile;

        let mut fx = Fixture::new(12);
        fx.sim.music.current = Some(MusicProfile::PopParty);
        assert_eq!(modifiers(&mut fx.ctx()).music, 1.0);
        fx.sim.night.open = true;
        assert!(modifiers(&mut fx.ctx()).music > 1.0);
    }

    #[test]
    fn rival_pressure_and_advocates_reach_the_opening_crowd() {
        use crate::game::district::RivalStance;

        let mut fx = Fixture::new(12);
        let before = modifiers(&mut fx.ctx());
        assert_eq!((before.rivals, before.vips), (1.0, 1.0));
        fx.sim.district.apply(vec![RivalStance::PriceWar; 3]);
        fx.sim.vips.advocate();
        let mods = modifiers(&mut fx.ctx());
        assert!((mods.rivals - 0.91).abs() < 1e-9);
        assert!((mods.vips - 1.05).abs() < 1e-9);
        let slow = mods.reputation * mods.weekend * mods.identity * mods.pub_level * mods.upgrades * mods.legacy;
        assert!((mods.base() - slow * 0.91 * 1.05).abs() < 1e-9);
    }

    #[test]
    fn wage_fallout_wears_off() {
        let mut fx = Fixture::new(12);
        fx.sim.staffing.traffic_penalty = 0.55;
        fx.sim.staffing.traffic_penalty_rounds = 2;
        assert_eq!(modifiers(&mut fx.ctx()).wage_fallout, 0.55);
        tick_round_effects(&mut fx.sim);
        tick_round_effects(&mut fx.sim);
        assert_eq!(modifiers(&mut fx.ctx()).wage_fallout, 1.0);
    }

    #[test]
    fn arrivals_respect_the_bar() {
        let mut fx = Fixture::new(12);
        fx.sim.night.bar_capacity = 2;
        for _ in 0..50 {
            assert!(roll_arrivals(&mut fx.ctx(), 1.6) <= 2);
        }
        fx.sim.night.bar_capacity = 0;
        assert_eq!(roll_arrivals(&mut fx.ctx(), 1.6), 0);
    }
}
