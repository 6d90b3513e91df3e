use tracing::info;

use crate::game::bills::BillKind;
use crate::game::context::SimContext;
use crate::game::economy::{RevenueKind, WeekReport};
use crate::game::milestones::Milestone;
use crate::game::world::ServiceCounters;
use crate::game::PAYMENT_TOLERANCE;

const CHAOS_HIGH: f64 = 60.0;
const CHAOS_SAFE: f64 = 25.0;
const RECOVERY_NIGHTS: u32 = 2;
const CREW_MORALE: f64 = 65.0;
const MARGIN_PRICE: f64 = 1.15;
const MARGIN_REWARD: f64 = 100.0;
const BALANCED_PROFIT: f64 = 250.0;
const BALANCED_WAGES: f64 = 200.0;
const BALANCED_SECURITY: f64 = 10.0;
const GOLDEN_REP: i32 = 45;
const STORMPROOF_BAD_EVENTS: u32 = 3;

/// When a check runs and what it can see beyond the stored streaks.
#[derive(Debug, Clone, Copy)]
enum Moment<'a> {
    Night(&'a ServiceCounters),
    Week(&'a WeekReport),
    Payday { payroll_full: bool },
}

fn bills_of(ctx: &SimContext<'_>, kind: BillKind) -> f64 {
    ctx.sim
        .bills
        .iter()
        .filter(|b| b.kind == kind)
        .map(|b| b.full_due)
        .sum()
}

fn is_met(ctx: &SimContext<'_>, milestone: Milestone, moment: Moment<'_>) -> bool {
    let sim = &*ctx.sim;
    let tracker = &sim.milestones;
    match (milestone, moment) {
        (Milestone::OpenForBusiness, _) => {
            tracker.nights_closed >= 3 && sim.game_over.is_none() && !sim.debt.bankrupt
        }
        (Milestone::NoEmptyShelves, _) => tracker.clean_shelf_nights >= 2,
        (Milestone::NoOneLeavesAngry, Moment::Night(night)) => {
            night.sales > 0 && night.refunds == 0 && night.unserved == 0 && night.food_misses == 0
        }
        (Milestone::PayrollGuardian, Moment::Payday { payroll_full }) => payroll_full,
        (Milestone::CalmHouse, _) => tracker.calm_nights >= 3 && tracker.calm_with_activity,
        (Milestone::MarginWithManners, Moment::Week(_)) => {
            sim.week.average_price() >= MARGIN_PRICE && sim.week.rep_net > 0
        }
        (Milestone::CrewThatStays, _) => tracker.steady_crew_weeks >= 2,
        (Milestone::OrderRestored, _) => {
            tracker.chaos_recovery.is_some() && sim.chaos.value() <= CHAOS_SAFE
        }
        (Milestone::DebtDiet, _) => tracker.debt_free_weeks >= 3,
        (Milestone::BalancedBooks, Moment::Week(report)) => {
            report.profit >= BALANCED_PROFIT
                && bills_of(ctx, BillKind::Wages) >= BALANCED_WAGES
                && bills_of(ctx, BillKind::SecurityUpkeep) >= BALANCED_SECURITY
        }
        (Milestone::GoldenQuarter, _) => tracker.strong_weeks >= 4,
        (Milestone::Stormproof, Moment::Week(report)) => {
            report.profit > 0.0
                && sim.week.rep_net > 0
                && sim.week.counters.negative_events >= STORMPROOF_BAD_EVENTS
        }
        _ => false,
    }
}

fn grant(ctx: &mut SimContext<'_>, milestone: Milestone) {
    let tracker = &mut ctx.sim.milestones;
    tracker.achieved.push(milestone);
    tracker.lifetime += 1;
    let count = tracker.achieved.len();
    info!(?milestone, count, "milestone reached");
    ctx.log.event(format!(
        "Milestone reached: {}. {}",
        milestone.title(),
        milestone.description()
    ));
    if milestone == Milestone::MarginWithManners {
        ctx.earn(RevenueKind::Other, MARGIN_REWARD);
        ctx.log
            .pos(format!("Milestone reward: GBP {MARGIN_REWARD:.0} in the till."));
    }
}

fn evaluate(ctx: &mut SimContext<'_>, moment: Moment<'_>) -> Vec<Milestone> {
    let view: &SimContext<'_> = ctx;
    let due: Vec<Milestone> = Milestone::ALL
        .into_iter()
        .filter(|m| !view.sim.milestones.has(*m) && is_met(view, *m, moment))
        .collect();
    for milestone in &due {
        grant(ctx, *milestone);
    }
    due
}

/// Updates the nightly streaks after a close and checks what they unlock.
pub(crate) fn after_night(
    ctx: &mut SimContext<'_>,
    night: &ServiceCounters,
    had_activity: bool,
) -> Vec<Milestone> {
    let chaos = ctx.sim.chaos.value();
    let tracker = &mut ctx.sim.milestones;
    tracker.nights_closed += 1;
    tracker.clean_shelf_nights = if night.stockouts == 0 {
        tracker.clean_shelf_nights + 1
    } else {
        0
    };
    if night.fights == 0 && night.negative_events == 0 && chaos <= CHAOS_SAFE {
        tracker.calm_nights += 1;
        tracker.calm_with_activity |= had_activity;
    } else {
        tracker.calm_nights = 0;
        tracker.calm_with_activity = false;
    }
    tracker.chaos_recovery = if chaos >= CHAOS_HIGH {
        Some(RECOVERY_NIGHTS)
    } else {
        match tracker.chaos_recovery {
            Some(_) if chaos <= CHAOS_SAFE => tracker.chaos_recovery,
            Some(nights) if nights > 1 => Some(nights - 1),
            _ => None,
        }
    };
    evaluate(ctx, Moment::Night(night))
}

/// Runs at the weekly settlement, after bills are drawn up and before the
/// week's stats are cleared.
pub(crate) fn after_week(ctx: &mut SimContext<'_>, report: &WeekReport) -> Vec<Milestone> {
    let steady = ctx.sim.week.staff_departures == 0 && ctx.sim.roster.team_morale() >= CREW_MORALE;
    let debt_free = ctx.sim.credit.lines_balance() + ctx.sim.credit.shark_balance() <= PAYMENT_TOLERANCE;
    let strong = report.profit > 0.0 && ctx.sim.reputation >= GOLDEN_REP;
    let tracker = &mut ctx.sim.milestones;
    tracker.steady_crew_weeks = if steady { tracker.steady_crew_weeks + 1 } else { 0 };
    tracker.debt_free_weeks = if debt_free { tracker.debt_free_weeks + 1 } else { 0 };
    tracker.strong_weeks = if strong { tracker.strong_weeks + 1 } else { 0 };
    evaluate(ctx, Moment::Week(report))
}

pub(crate) fn after_payday(ctx: &mut SimContext<'_>, payroll_full: bool) -> Vec<Milestone> {
    evaluate(ctx, Moment::Payday { payroll_full })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::bills::PaydayBill;
    use crate::game::context::testing::Fixture;

    fn quiet_night(sales: u32) -> ServiceCounters {
        ServiceCounters {
            sales,
            ..ServiceCounters::default()
        }
    }

    #[test]
    fn three_closes_open_for_business() {
        let mut fx = Fixture::new(40);
        let night = quiet_night(0);
        assert!(after_night(&mut fx.ctx(), &night, false).is_empty());
        after_night(&mut fx.ctx(), &night, false);
        let earned = after_night(&mut fx.ctx(), &night, false);
        assert!(earned.contains(&Milestone::OpenForBusiness));
        assert!(fx.sim.milestones.has(Milestone::NoEmptyShelves));
        assert!(fx.logged("Milestone reached: Open For Business."));
        assert_eq!(fx.sim.milestones.lifetime, 2);
    }

    #[test]
    fn a_stockout_breaks_the_shelf_streak() {
        let mut fx = Fixture::new(40);
        let dry = ServiceCounters {
            stockouts: 4,
            ..ServiceCounters::default()
        };
        after_night(&mut fx.ctx(), &quiet_night(0), false);
        after_night(&mut fx.ctx(), &dry, false);
        after_night(&mut fx.ctx(), &quiet_night(0), false);
        assert_eq!(fx.sim.milestones.clean_shelf_nights, 1);
        assert!(!fx.sim.milestones.has(Milestone::NoEmptyShelves));
    }

    #[test]
    fn a_perfect_night_needs_custom() {
        let mut fx = Fixture::new(40);
        after_night(&mut fx.ctx(), &quiet_night(0), false);
        assert!(!fx.sim.milestones.has(Milestone::NoOneLeavesAngry));
        after_night(&mut fx.ctx(), &quiet_night(30), false);
        assert!(fx.sim.milestones.has(Milestone::NoOneLeavesAngry));
    }

    #[test]
    fn calm_house_wants_a_themed_night() {
        let mut fx = Fixture::new(40);
        for _ in 0..3 {
            after_night(&mut fx.ctx(), &quiet_night(10), false);
        }
        assert!(!fx.sim.milestones.has(Milestone::CalmHouse));
        after_night(&mut fx.ctx(), &quiet_night(10), true);
        assert!(fx.sim.milestones.has(Milestone::CalmHouse));
    }

    #[test]
    fn chaos_has_two_nights_to_settle() {
        let mut fx = Fixture::new(40);
        fx.sim.chaos.set(70.0);
        after_night(&mut fx.ctx(), &quiet_night(5), false);
        fx.sim.chaos.set(40.0);
        after_night(&mut fx.ctx(), &quiet_night(5), false);
        fx.sim.chaos.set(35.0);
        after_night(&mut fx.ctx(), &quiet_night(5), false);
        assert_eq!(fx.sim.milestones.chaos_recovery, None);
        fx.sim.chaos.set(10.0);
        after_night(&mut fx.ctx(), &quiet_night(5), false);
        assert!(!fx.sim.milestones.has(Milestone::OrderRestored));

        fx.sim.chaos.set(65.0);
        after_night(&mut fx.ctx(), &quiet_night(5), false);
        fx.sim.chaos.set(20.0);
        after_night(&mut fx.ctx(), &quiet_night(5), false);
        assert!(fx.sim.milestones.has(Milestone::OrderRestored));
    }

    #[test]
    fn payroll_guardian_needs_full_wages_and_rent() {
        let mut fx = Fixture::new(40);
        assert!(after_payday(&mut fx.ctx(), false).is_empty());
        assert_eq!(after_payday(&mut fx.ctx(), true), vec![Milestone::PayrollGuardian]);
        assert!(after_payday(&mut fx.ctx(), true).is_empty());
    }

    #[test]
    fn margin_with_manners_pays_out() {
        let mut fx = Fixture::new(40);
        fx.sim.week.price_sum = 1.2 * 7.0;
        fx.sim.week.price_samples = 7;
        fx.sim.week.rep_net = 4;
        let cash = fx.sim.ledger.cash();
        let report = WeekReport::default();
        let earned = after_week(&mut fx.ctx(), &report);
        assert!(earned.contains(&Milestone::MarginWithManners));
        assert!((fx.sim.ledger.cash() - cash - MARGIN_REWARD).abs() < 1e-9);
    }

    #[test]
    fn balanced_books_reads_the_payday_bills() {
        let mut fx = Fixture::new(40);
        let report = WeekReport {
            profit: 300.0,
            ..WeekReport::default()
        };
        fx.sim.bills.push(PaydayBill::new(BillKind::Wages, 220.0, 220.0));
        assert!(!after_week(&mut fx.ctx(), &report).contains(&Milestone::BalancedBooks));
        fx.sim.bills.push(PaydayBill::new(BillKind::SecurityUpkeep, 12.0, 12.0));
        assert!(after_week(&mut fx.ctx(), &report).contains(&Milestone::BalancedBooks));
    }

    #[test]
    fn weekly_streaks_reset_on_a_bad_week() {
        let mut fx = Fixture::new(40);
        fx.sim.reputation = 60;
        let good = WeekReport {
            profit: 50.0,
            ..WeekReport::default()
        };
        for _ in 0..3 {
            after_week(&mut fx.ctx(), &good);
        }
        assert_eq!(fx.sim.milestones.strong_weeks, 3);
        assert_eq!(fx.sim.milestones.debt_free_weeks, 3);
        assert!(fx.sim.milestones.has(Milestone::DebtDiet));
        after_week(&mut fx.ctx(), &WeekReport::default());
        assert_eq!(fx.sim.milestones.strong_weeks, 0);
        assert!(!fx.sim.milestones.has(Milestone::GoldenQuarter));
    }
}
