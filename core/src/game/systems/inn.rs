use rand::Rng;

use crate::game::context::SimContext;
use crate::game::economy::RevenueKind;
use crate::game::staff::Department;
use crate::game::world::SimulationState;
use crate::game::{INN_COMPLAINT_REP, INN_COVERAGE_PER_ROOM, INN_MAINTENANCE_PER_ROOM, ROOM_PRICE};

const BASE_OCCUPANCY: f64 = 0.35;
const WEEKEND_OCCUPANCY: f64 = 1.30;

/// What one night of lodging did.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct InnNight {
    pub(crate) requested: u32,
    pub(crate) sold: u32,
    pub(crate) turned_away: u32,
    pub(crate) revenue: f64,
}

pub(crate) fn rooms(sim: &SimulationState, configured: u32) -> u32 {
    let effects = &sim.upgrades.effects;
    if effects.inn_unlocked {
        configured + effects.inn_rooms + sim.prestige.legacy.inn_rooms
    } else {
        0
    }
}

/// Rooms the inn team on shift can turn around tonight.
pub(crate) fn coverage(sim: &SimulationState) -> u32 {
    let points: u32 = sim
        .roster
        .on_shift()
        .filter(|m| m.department() == Department::Inn)
        .map(|m| m.inn_coverage)
        .sum();
    points / INN_COVERAGE_PER_ROOM
}

fn occupancy(reputation: i32, weekend: bool) -> f64 {
    let rep = (BASE_OCCUPANCY + reputation as f64 / 200.0).clamp(0.05, 0.95);
    if weekend { (rep * WEEKEND_OCCUPANCY).min(1.0) } else { rep }
}

/// Sells rooms for the night just closed. Does nothing until the inn is built.
pub(crate) fn run_night(ctx: &mut SimContext<'_>) -> Option<InnNight> {
    let total = rooms(ctx.sim, ctx.config.inn_rooms);
    if total == 0 {
        return None;
    }
    let expected = total as f64 * occupancy(ctx.sim.reputation, ctx.sim.calendar.is_weekend());
    let requested = (expected + ctx.rng.gen_range(-1.0..1.0)).round().clamp(0.0, total as f64) as u32;
    let sold = requested.min(coverage(ctx.sim));
    let night = InnNight {
        requested,
        sold,
        turned_away: requested - sold,
        revenue: sold as f64 * ROOM_PRICE,
    };

    if night.revenue > 0.0 {
        ctx.earn(RevenueKind::Rooms, night.revenue);
    }
    let inn = &mut ctx.sim.inn;
    inn.last_bookings = sold;
    inn.rooms_sold_week += sold;
    inn.revenue_week += night.revenue;
    inn.maintenance_accrued += total as f64 * INN_MAINTENANCE_PER_ROOM;

    if night.turned_away > 0 {
        inn.complaints_week += 1;
        let rep = ctx.apply_rep(INN_COMPLAINT_REP);
        ctx.log.neg(format!(
            "Inn: {sold}/{total} rooms sold, {} guest(s) turned away for lack of staff (rep {rep:+}).",
            night.turned_away
        ));
    } else {
        ctx.log.info(format!(
            "Inn: {sold}/{total} rooms sold for GBP {:.2}.",
            night.revenue
        ));
    }
    Some(night)
}

/// Clears the weekly inn tallies once maintenance has been billed.
pub(crate) fn reset_week(sim: &mut SimulationState) {
    let inn = &mut sim.inn;
    inn.rooms_sold_week = 0;
    inn.revenue_week = 0.0;
    inn.complaints_week = 0;
}
