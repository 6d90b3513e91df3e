mod commands;

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{Context as _, Result};
use pubsim_core::{
    CloseReport, GameState, LogCategory, LogLine, OpenReport, RoundReport, Snapshot, StaffRole,
};

use commands::{CommandRegistry, Context};

pub fn run(game: &mut GameState) -> Result<()> {
    let registry = CommandRegistry::default();
    print_intro(game);
    flush_log(game);
    let stdin = io::stdin();

    loop {
        print!("{}> ", prompt(&game.snapshot()));
        io::stdout().flush().context("failed to flush the prompt")?;

        let mut line = String::new();
        let bytes = stdin
            .lock()
            .read_line(&mut line)
            .context("failed to read input")?;

        if bytes == 0 {
            println!("End of input. Last orders.");
            return Ok(());
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let mut ctx = Context::new(game);
        let result = registry.execute_input(&mut ctx, trimmed);
        let quit = ctx.should_quit();
        flush_log(game);
        if let Err(error) = result {
            println!("error: {error}");
        }
        if quit {
            return Ok(());
        }
    }
}

fn prompt(snapshot: &Snapshot) -> String {
    if snapshot.open {
        format!(
            "W{} {} {} r{}/{}",
            snapshot.week, snapshot.weekday, snapshot.time, snapshot.round, snapshot.closing_round
        )
    } else {
        format!("W{} {} (closed)", snapshot.week, snapshot.weekday)
    }
}

pub(crate) fn is_json_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

fn render_line(line: &LogLine) -> String {
    match line.category {
        LogCategory::Info => format!("  {}", line.text),
        LogCategory::Positive => format!("+ {}", line.text),
        LogCategory::Negative => format!("- {}", line.text),
        LogCategory::Event => format!("* {}", line.text),
        LogCategory::Header => format!("== {} ==", line.text),
        LogCategory::SectionBreak => "-".repeat(40),
    }
}

pub(crate) fn flush_log(game: &mut GameState) {
    for line in game.drain_log() {
        println!("{}", render_line(&line));
    }
}

fn print_intro(game: &GameState) {
    let snapshot = game.snapshot();
    println!("{}: the keys are yours.", snapshot.pub_name);
    println!(
        "GBP {:.2} in the till, {} staff on the books.",
        snapshot.cash,
        snapshot.staff.len()
    );
    println!("Try: status / open / play / bills / pay / help");
}

pub(crate) fn print_help() {
    println!("Commands:");
    println!("  status                     pub overview");
    println!("  open                       open the doors for the night");
    println!("  round [n]                  play n rounds (default 1)");
    println!("  play                       play until closing");
    println!("  close                      close early (costs reputation)");
    println!("  staff                      list the team");
    println!("  hire <role>                hire a new member of staff");
    println!("  fire <id>                  let someone go (pays what they are owed)");
    println!("  buy <item> <qty>           order stock (emergency delivery while open)");
    println!("  stock [<item> <par>]       show the racks or set a standing order (0 cancels)");
    println!("  upgrades                   list upgrades");
    println!("  upgrade <id>               buy an upgrade");
    println!("  actions                    list landlord actions for this round");
    println!("  action <id>                take a landlord action");
    println!("  bills                      show pending payday bills");
    println!("  pay [idx=min|full|skip|<amount>[@line]]...");
    println!("                             settle payday; unlisted bills get their minimum");
    println!("  credit                     list banks and open lines");
    println!("  credit open <bank>         apply for a credit line");
    println!("  credit repay <line> <amt>  pay down a credit line");
    println!("  shark                      borrow from the loan shark");
    println!("  activities                 list themed nights");
    println!("  activity <id>              book a themed night for the next opening");
    println!("  policy <friendly|balanced|strict>");
    println!("  security [upgrade]         show or raise the security level");
    println!("  bouncer                    hire a bouncer for tonight");
    println!("  tasks                      list door tasks for the next round");
    println!("  task <name>                queue a door task for the next round");
    println!("  milestones                 show milestones for this run");
    println!("  music [profile]            show or change the music (once per phase while open)");
    println!("  district                   rival pubs and this week's market pressure");
    println!("  regulars                   the named regulars and how they feel about the pub");
    println!("  prestige [confirm]         preview or bank a prestige star");
    println!("  price <multiplier>         set the price multiplier");
    println!("  bankrupt confirm           declare bankruptcy");
    println!("  save <file> / load <file>  .json or binary save files");
    println!("  quit                       leave the game");
    let roles: Vec<&str> = StaffRole::ALL.iter().map(|role| role.key()).collect();
    println!("Roles: {}", roles.join(", "));
}

pub(crate) fn print_status(snapshot: &Snapshot) {
    println!("-- {} --", snapshot.pub_name);
    println!(
        "Week {} {} (night {}) | {}",
        snapshot.week,
        snapshot.weekday,
        snapshot.night,
        if snapshot.open { "OPEN" } else { "closed" }
    );
    if snapshot.open {
        println!(
            "Round {}/{} at {} | {} inside (bar space {})",
            snapshot.round,
            snapshot.closing_round,
            snapshot.time,
            snapshot.patrons_inside,
            snapshot.bar_capacity
        );
    }
    println!(
        "Cash GBP {:.2} | debt GBP {:.2} | credit score {} | debt tier {}{}",
        snapshot.cash,
        snapshot.total_debt,
        snapshot.credit_score,
        snapshot.debt_tier,
        if snapshot.bankrupt { " (bankrupt)" } else { "" }
    );
    println!(
        "Reputation {} | chaos {:.0} ({}) | morale {:.0} | fatigue {:.0}",
        snapshot.reputation,
        snapshot.chaos,
        snapshot.chaos_label,
        snapshot.morale.team,
        snapshot.fatigue
    );
    println!(
        "Pub level {} | identity {} | prices x{:.2} | security {} ({}), {} bouncer(s)",
        snapshot.pub_level,
        snapshot.identity.map_or("none yet", |kind| kind.label()),
        snapshot.price_multiplier,
        snapshot.security.total,
        snapshot.security_policy.label(),
        snapshot.bouncers
    );
    if let Some(task) = snapshot.security_task {
        println!("Door task: {}", task.label());
    }
    if snapshot.stars > 0 || snapshot.prestige_ready {
        println!(
            "Stars {} | {} milestone(s) this run{}",
            snapshot.stars,
            snapshot.milestones.len(),
            if snapshot.prestige_ready { " | prestige ready" } else { "" }
        );
    }
    println!(
        "Stock: {} drinks, {} food | this week: {} sales, {} unserved, {} fights",
        snapshot.drinks_in_stock,
        snapshot.food_in_stock,
        snapshot.this_week.sales,
        snapshot.this_week.unserved,
        snapshot.this_week.fights
    );
    if let Some(id) = &snapshot.activity_tonight {
        println!("Tonight: {id}");
    }
    if let Some(id) = &snapshot.activity_booked {
        println!("Booked for next opening: {id}");
    }
    for rumor in &snapshot.rumors {
        println!(
            "Rumour: {} (intensity {}, {} day(s) left)",
            rumor.topic.label(),
            rumor.intensity,
            rumor.days_remaining
        );
    }
    if !snapshot.pending_bills.is_empty() {
        println!("{} payday bill(s) pending. See `bills`.", snapshot.pending_bills.len());
    }
    if let Some(reason) = snapshot.game_over {
        println!("GAME OVER: {}.", reason.label());
    }
}

pub(crate) fn print_staff(snapshot: &Snapshot) {
    println!(
        "{:>3} | {:<20} | {:<18} | {:>3} | {:>6} | {:>8} | {:>8}",
        "ID", "Name", "Role", "Lvl", "Morale", "Wage/wk", "Owed"
    );
    for member in &snapshot.staff {
        println!(
            "{:>3} | {:<20} | {:<18} | {:>3} | {:>6.0} | {:>8.2} | {:>8.2}{}",
            member.id,
            member.name,
            member.role.label(),
            member.level,
            member.morale,
            member.weekly_wage,
            member.accrued_wage,
            if member.off_sick { " (off sick)" } else { "" }
        );
    }
    println!(
        "Morale: team {:.0}, front of house {:.0}, kitchen {:.0}",
        snapshot.morale.team, snapshot.morale.front_of_house, snapshot.morale.kitchen
    );
}

pub(crate) fn print_bills(snapshot: &Snapshot) {
    if snapshot.pending_bills.is_empty() {
        println!("No bills pending.");
        return;
    }
    for (index, bill) in snapshot.pending_bills.iter().enumerate() {
        println!(
            "[{index}] {:<18} minimum GBP {:>9.2} | full GBP {:>9.2}",
            bill.label(),
            bill.minimum_due,
            bill.full_due
        );
    }
}

pub(crate) fn print_open(report: &OpenReport) {
    println!(
        "Night {} open: {} through the door, bar space {}{}.",
        report.night,
        report.opening_crowd,
        report.bar_capacity,
        report
            .activity
            .as_ref()
            .map(|name| format!(", {name} on"))
            .unwrap_or_default()
    );
    if report.off_sick > 0 {
        println!("{} off sick tonight.", report.off_sick);
    }
}

pub(crate) fn print_round(report: &RoundReport) {
    println!(
        "r{:>2} {} | in {:>3} (+{} -{}) | served {}/{} (cap {}) | chaos {:.0} | rep {}",
        report.round,
        report.time,
        report.inside,
        report.arrivals,
        report.departures,
        report.served,
        report.demand,
        report.capacity,
        report.chaos,
        report.reputation
    );
}

pub(crate) fn print_close(report: &CloseReport) {
    println!(
        "Closed after {} round(s) ({}). Revenue GBP {:.2}, costs GBP {:.2}.",
        report.rounds_played,
        report.reason.label(),
        report.revenue,
        report.costs
    );
    if let Some(week) = &report.week {
        println!(
            "Week {} closed: profit GBP {:.2} on GBP {:.2} revenue.",
            week.week, week.profit, week.revenue
        );
    }
    for milestone in &report.milestones {
        println!("Milestone: {}", milestone.title());
    }
}
