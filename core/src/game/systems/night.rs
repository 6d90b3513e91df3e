use rand::Rng;
use tracing::{debug, info};

use crate::game::context::SimContext;
use crate::game::reports::{CloseReport, OpenReport, RoundReport};
use crate::game::world::{CloseReason, GameOverReason};
use crate::game::{EARLY_CLOSE_ROUNDS_PER_REP, PUB_LEVEL_BAR_CAPACITY, REP_COLLAPSE_FLOOR, REP_COLLAPSE_ROUNDS};

use super::chaos::{self, RoundOutcome};
use super::morale::{self, MoraleInputs};
use super::service::{self, ServiceParams};
use super::staffing::{self, FatigueInputs};
use super::workload::WorkloadProfile;
use super::{
    activities, events, incidents, inn, milestones, misconduct, music, payday, regulars, rumors,
    security, supplier, traffic, upgrades, week,
};

const OPENING_POOL_MIN: f64 = 5.0;
const OPENING_POOL_MAX: f64 = 28.0;
const OPENING_POOL_SCALE: f64 = 5.0;
const BAR_CAPACITY_MIN: i64 = 5;
/// Share of the opening pool already waiting at the door.
const DOOR_CROWD_SHARE: f64 = 0.25;
const REP_DRIFT_CHANCE: f64 = 0.10;
const RISKY_WEEKEND_CHAOS: f64 = 50.0;
/// Extra event chance while a late set is stirring the room.
const LATE_MUSIC_EVENT_BONUS: i32 = 3;

/// Opens the doors. The caller has checked the pub was closed.
pub(crate) fn open_night(ctx: &mut SimContext<'_>) -> OpenReport {
    let bills_auto_paid = !ctx.sim.bills.is_empty();
    if bills_auto_paid {
        ctx.log
            .neg("Bills were still pending at opening: paying the minimums from cash.");
        // An empty selection list settles every bill at its minimum from cash.
        let _ = payday::apply_payments(ctx, &[]);
    }

    upgrades::refresh_effects(ctx);
    let night = ctx.sim.calendar.begin_night();
    ctx.sim.night.reset_for_open();
    ctx.sim.night.open = true;
    ctx.sim.night.rep_at_open = ctx.sim.reputation;
    ctx.sim.ledger.reset_tonight();
    ctx.sim.actions.reset_night();
    ctx.sim.security.tasks.reset_night();

    ctx.log.section_break();
    ctx.log.header(format!(
        "NIGHT {night}: {} of week {}",
        ctx.sim.calendar.weekday().label(),
        ctx.sim.calendar.week()
    ));

    supplier::restock_standing_order(ctx);
    staffing::roll_sick_calls(ctx);
    let off_sick = ctx.sim.roster.iter().filter(|m| m.off_sick).count();
    staffing::decay_fatigue_at_open(ctx);
    let activity = activities::activate_at_open(ctx);

    let hours = ctx.config.service_hours();
    let modifiers = traffic::modifiers(ctx);
    let time_of_day = traffic::time_of_day_multiplier(hours.time_at(0), ctx.sim.chaos.value());
    let pool = (OPENING_POOL_SCALE * ctx.config.base_traffic * modifiers.base() * time_of_day)
        .round()
        .clamp(OPENING_POOL_MIN, OPENING_POOL_MAX) as u32;
    let bar_capacity = (pool as i64
        + ctx.sim.upgrades.effects.bar_capacity as i64
        + (ctx.sim.pub_level as u32 * PUB_LEVEL_BAR_CAPACITY) as i64
        + activities::bar_capacity_bonus(ctx) as i64)
        .max(BAR_CAPACITY_MIN) as u32;
    ctx.sim.night.opening_pool = pool;
    ctx.sim.night.bar_capacity = bar_capacity;
    let opening_crowd = ((pool as f64 * DOOR_CROWD_SHARE).round() as u32).min(bar_capacity);
    service::admit(ctx, opening_crowd);

    ctx.log.info(format!(
        "Doors open at {}. {opening_crowd} waiting outside, room for {bar_capacity}.",
        hours.opening
    ));
    info!(night, pool, bar_capacity, "night opened");
    OpenReport {
        night,
        opening_crowd,
        bar_capacity,
        activity,
        off_sick,
        bills_auto_paid,
    }
}

fn tip_rate(ctx: &SimContext<'_>) -> f64 {
    staffing::staff_tip_rate(ctx.sim)
        + ctx.sim.identity.profile().tip_bonus
        + ctx.sim.upgrades.effects.tip_bonus
        + activities::tip_bonus(ctx)
}

fn apply_rep_drift(ctx: &mut SimContext<'_>) {
    let drift = ctx.sim.upgrades.effects.rep_drift;
    if drift != 0 && ctx.rng.gen_bool(REP_DRIFT_CHANCE) {
        ctx.apply_rep(drift);
    }
}

/// Tracks rounds spent on the reputation floor. Returns `true` once the run is over.
fn check_collapse(ctx: &mut SimContext<'_>) -> bool {
    let night = &mut ctx.sim.night;
    if ctx.sim.reputation <= REP_COLLAPSE_FLOOR {
        night.collapse_rounds += 1;
    } else {
        night.collapse_rounds = 0;
    }
    if night.collapse_rounds < REP_COLLAPSE_ROUNDS {
        return false;
    }
    ctx.sim.game_over = Some(GameOverReason::ReputationCollapse);
    ctx.log.header("LICENCE REVOKED");
    ctx.log.neg(format!(
        "Reputation sat at the floor for {REP_COLLAPSE_ROUNDS} rounds. The council has pulled the licence."
    ));
    info!("reputation collapse");
    true
}

/// Plays one round of service. Closes the night itself when a closing
/// condition is met.
pub(crate) fn play_round(ctx: &mut SimContext<'_>) -> RoundReport {
    ctx.sim.night.round += 1;
    let round = ctx.sim.night.round;
    let hours = ctx.config.service_hours();
    let now = hours.time_at(round);
    let phase = now.phase();
    let before = ctx.sim.night.counters;

    ctx.sim.actions.tick();
    ctx.sim.security.tasks.tick();
    supplier::receive_deliveries(ctx, false);
    service::charge_operating_cost(ctx);

    let music_fx = music::round_effects(ctx.sim, ctx.config);
    let modifiers = traffic::modifiers(ctx);
    let traffic_now = modifiers.total()
        * traffic::time_of_day_multiplier(now, ctx.sim.chaos.value())
        * ctx.config.base_traffic;
    let departures = service::natural_departures(ctx);
    service::cleanup_departed(ctx.sim);
    let arrivals = traffic::roll_arrivals(ctx, traffic_now);
    service::admit(ctx, arrivals);

    let security = security::effective(ctx.sim);
    let inside = ctx.sim.night.patrons_inside() as u32;
    let demand = service::demand(inside, traffic_now);
    let capacity = staffing::serve_capacity(ctx.sim, phase);
    let workload = WorkloadProfile::compute(demand, capacity);
    service::process_food_orders(ctx, &workload, security);

    let activity_risk = activities::risk(ctx);
    let params = ServiceParams {
        price_multiplier: ctx.sim.price_multiplier,
        spend_multiplier: music_fx.spend,
        tip_rate: tip_rate(ctx),
        security,
        risky_weekend: ctx.sim.calendar.is_weekend() && ctx.sim.chaos.value() > RISKY_WEEKEND_CHAOS,
        activity_risk: activity_risk.unwrap_or(0.0),
    };
    let service = service::serve_round(ctx, &workload, &params);

    let staff_rep = staffing::staff_rep_roll(ctx);
    if staff_rep != 0 {
        ctx.apply_rep(staff_rep);
    }
    apply_rep_drift(ctx);
    let late_set = if music_fx.late_risk { LATE_MUSIC_EVENT_BONUS } else { 0 };
    events::maybe_event(ctx, activities::event_chance_bonus(ctx) + late_set);
    let staff_incident = misconduct::roll_misconduct(ctx, security, &workload);
    events::maybe_scandal(ctx);

    let after = ctx.sim.night.counters;
    let outcome = RoundOutcome {
        unserved: after.unserved - before.unserved,
        fights: after.fights - before.fights,
        refunds: after.refunds - before.refunds,
        events: after.events - before.events,
        food_misses: after.food_misses - before.food_misses,
        staff_incident,
    };
    rumors::record_round(ctx, outcome.fights, outcome.unserved);
    let streak_delta = chaos::update_round(ctx, &outcome, &workload, activity_risk);
    music::apply_round(ctx, &music_fx);
    let chaos_now = ctx.sim.chaos.value();
    morale::update_after_round(
        ctx,
        &MoraleInputs {
            unserved: outcome.unserved,
            events: outcome.events,
            tip_rate: params.tip_rate,
            security,
            smooth: outcome.is_smooth(chaos_now),
        },
    );
    staffing::accumulate_fatigue(
        ctx,
        &FatigueInputs {
            phase,
            understaffed: workload.is_overloaded(),
            incidents: outcome.fights + outcome.events + staff_incident as u32,
            unserved: outcome.unserved,
        },
    );
    traffic::tick_round_effects(ctx.sim);
    ctx.sim.security.tasks.finish_round(round);

    let team_morale = ctx.sim.roster.team_morale();
    let week = &mut ctx.sim.week;
    week.chaos_sum += chaos_now;
    week.morale_sum += team_morale;
    week.security_sum += security as f64;
    week.rounds += 1;

    debug!(
        round,
        demand,
        capacity,
        served = service.served,
        unserved = service.unserved,
        chaos = chaos_now,
        "round played"
    );

    let reason = if check_collapse(ctx) {
        Some(CloseReason::ReputationCollapse)
    } else if let Some(reason) = staffing::check_early_close(ctx, now) {
        Some(reason)
    } else if hours.is_closing(round) {
        Some(CloseReason::Scheduled)
    } else {
        None
    };

    let mut report = RoundReport {
        round,
        time: now,
        arrivals,
        departures,
        inside: ctx.sim.night.patrons_inside() as u32,
        demand,
        capacity,
        served: service.served,
        unserved: service.unserved,
        sales: service.sales,
        traffic: traffic_now,
        chaos: chaos_now,
        chaos_streak_delta: streak_delta,
        reputation: ctx.sim.reputation,
        closed: None,
    };
    if let Some(reason) = reason {
        report.closed = Some(close_night(ctx, reason));
    }
    report
}

fn early_close_penalty(ctx: &mut SimContext<'_>, reason: CloseReason) -> i32 {
    if !reason.is_early() {
        return 0;
    }
    let remaining = ctx.config.service_hours().rounds_remaining(ctx.sim.night.round);
    if remaining == 0 {
        return 0;
    }
    let penalty = (remaining / EARLY_CLOSE_ROUNDS_PER_REP).max(1) as i32;
    let applied = ctx.apply_rep(-penalty);
    ctx.log.neg(format!(
        "Closed {remaining} round(s) early; regulars were turned away (rep {applied:+})."
    ));
    applied
}

/// Closes the night, runs the overnight systems and, when the week wraps,
/// the weekly settlement.
pub(crate) fn close_night(ctx: &mut SimContext<'_>, reason: CloseReason) -> CloseReport {
    let rounds_played = ctx.sim.night.round;
    let early_close_rep = early_close_penalty(ctx, reason);

    // Orders still in the kitchen at closing are refunded.
    let security = security::effective(ctx.sim);
    service::process_food_orders(ctx, &WorkloadProfile::compute(0, 1), security);
    supplier::receive_deliveries(ctx, true);

    let had_activity = ctx.sim.activity.tonight.is_some();
    let achieved_before = ctx.sim.milestones.count();
    let night = &mut ctx.sim.night;
    night.open = false;
    night.last_close = Some(reason);
    night.patrons.clear();
    ctx.sim.security.door.clear();
    ctx.sim.security.tasks.reset_night();
    ctx.sim.music.record_night();

    chaos::decay_at_close(ctx.sim);
    let overnight_incidents = incidents::roll_between_nights(ctx);
    rumors::night_rumor(ctx);
    activities::expire_at_close(ctx);
    let rooms_sold = inn::run_night(ctx).map(|n| n.sold).unwrap_or(0);

    ctx.sim.accruals.rent += ctx.config.daily_rent;
    staffing::accrue_daily_wages(ctx);
    security::accrue_upkeep(ctx);

    let counters = ctx.sim.night.counters;
    ctx.sim.week.counters.absorb(&counters);
    ctx.sim.week.nights += 1;
    regulars::after_night(ctx, &counters);
    milestones::after_night(ctx, &counters, had_activity);
    let tonight = ctx.sim.ledger.tonight().clone();

    ctx.log.header(format!("CLOSED ({})", reason.label()));
    ctx.log.info(format!(
        "Tonight: revenue GBP {:.2}, costs GBP {:.2}, {} sale(s), {} unserved, {} fight(s), {} refund(s). Cash GBP {:.2}.",
        tonight.revenue(),
        tonight.costs(),
        counters.sales,
        counters.unserved,
        counters.fights,
        counters.refunds,
        ctx.sim.ledger.cash()
    ));

    let week_wrapped = ctx.sim.calendar.advance_day();
    let spoiled = supplier::spoil_stock(ctx);
    let installed = upgrades::complete_installs(ctx);
    info!(?reason, rounds_played, "night closed");

    let week = if week_wrapped {
        Some(week::settle_week(ctx))
    } else {
        None
    };
    CloseReport {
        reason,
        rounds_played,
        revenue: tonight.revenue(),
        costs: tonight.costs(),
        early_close_rep,
        overnight_incidents,
        spoiled,
        rooms_sold,
        installed,
        milestones: ctx
            .sim
            .milestones
            .achieved
            .iter()
            .skip(achieved_before)
            .copied()
            .collect(),
        week,
    }
}
