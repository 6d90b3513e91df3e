use tracing::info;

use crate::game::context::SimContext;
use crate::game::economy::WeekReport;
use crate::game::world::WeekStats;

use super::credit::{self, RepaymentRecord};
use super::{
    debt, district, identity, inn, milestones, morale, payday, progression, rumors, staffing,
};

fn log_report(ctx: &mut SimContext<'_>, report: &WeekReport) {
    ctx.log.header(format!("WEEK {} REPORT", report.week));
    let line = format!(
        "Revenue GBP {:.2} | costs GBP {:.2} | profit GBP {:.2} | {} sale(s) | {} event(s).",
        report.revenue, report.costs, report.profit, report.sales, report.events
    );
    if report.profit >= 0.0 {
        ctx.log.pos(line);
    } else {
        ctx.log.neg(line);
    }
    let rolling = ctx.sim.ledger.rolling();
    if rolling.weeks > 1 {
        ctx.log.info(format!(
            "Last {} weeks: revenue GBP {:.2}, costs GBP {:.2}, profit GBP {:.2}.",
            rolling.weeks, rolling.revenue, rolling.costs, rolling.profit
        ));
    }
}

/// Runs when the seventh night of the week has closed.
pub(crate) fn settle_week(ctx: &mut SimContext<'_>) -> WeekReport {
    let week = ctx.week();
    ctx.log.section_break();
    ctx.log.header(format!("END OF WEEK {week}"));

    credit::accrue_weekly_interest(ctx);
    let leavers = morale::weekly_quit_check(ctx);
    ctx.sim.week.staff_departures += leavers;
    staffing::weekly_level_ups(ctx);
    identity::weekly_update(ctx);
    rumors::weekly_update(ctx);
    district::weekly_update(ctx);

    // Bills are drawn up before the books close so the week's tips are still visible.
    let pending = payday::prepare_bills(ctx);
    let report = ctx.sim.ledger.close_week(week);
    log_report(ctx, &report);
    if pending == 0 {
        ctx.log.info("Nothing owed this week.");
        credit::score_after_payday(ctx, RepaymentRecord::default());
        debt::resolve_week(ctx, 0.0, 0.0, true);
    }

    milestones::after_week(ctx, &report);
    inn::reset_week(ctx.sim);
    staffing::tick_serve_penalty(ctx);
    credit::weekly_tick(ctx);
    progression::check_level_up(ctx);

    ctx.sim.week = WeekStats::default();
    ctx.sim.music.weekly_switches = 0;
    ctx.sim.calendar.begin_next_week();
    info!(week, profit = report.profit, pending, "week settled");
    report
}
