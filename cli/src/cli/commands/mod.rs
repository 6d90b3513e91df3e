use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result, anyhow, bail};
use pubsim_core::{
    BillSelection, CloseReason, FundingSource, GameState, Milestone, MusicProfile,
    PaymentAmount, SecurityPolicy, SecurityTask, StaffRole, TracingSink,
};

use super::{
    flush_log, is_json_path, print_bills, print_close, print_help, print_open, print_round,
    print_staff, print_status,
};

pub struct Context<'a> {
    game: &'a mut GameState,
    quit: bool,
}

impl<'a> Context<'a> {
    pub fn new(game: &'a mut GameState) -> Self {
        Self { game, quit: false }
    }

    pub fn game(&self) -> &GameState {
        &*self.game
    }

    pub fn game_mut(&mut self) -> &mut GameState {
        &mut *self.game
    }

    pub fn request_quit(&mut self) {
        self.quit = true;
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }
}

pub struct Args<'a> {
    tokens: Vec<&'a str>,
    index: usize,
}

impl<'a> Args<'a> {
    pub fn new(tokens: Vec<&'a str>) -> Self {
        Self { tokens, index: 0 }
    }

    pub fn next(&mut self) -> Option<&'a str> {
        if self.index >= self.tokens.len() {
            return None;
        }
        let value = self.tokens[self.index];
        self.index += 1;
        Some(value)
    }

    pub fn next_required(&mut self, message: &str) -> Result<&'a str> {
        self.next().ok_or_else(|| anyhow!(message.to_owned()))
    }

    pub fn rest(&mut self) -> Vec<&'a str> {
        let rest = self.tokens[self.index..].to_vec();
        self.index = self.tokens.len();
        rest
    }
}

pub trait Command {
    fn name() -> &'static str;
    fn execute(ctx: &mut Context<'_>, args: Args<'_>) -> Result<()>;
}

type CommandFn = for<'a> fn(&mut Context<'a>, Args<'a>) -> Result<()>;

pub struct CommandRegistry {
    handlers: HashMap<&'static str, CommandFn>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register<C: Command>(&mut self) {
        let name = C::name();
        if self.handlers.insert(name, C::execute).is_some() {
            panic!("command registered twice: {name}");
        }
    }

    pub fn dispatch<'a>(&self, command: &str, ctx: &mut Context<'a>, args: Args<'a>) -> Result<()> {
        if let Some(handler) = self.handlers.get(command) {
            handler(ctx, args)
        } else {
            bail!("unknown command: {command}. Type help for the list.");
        }
    }

    pub fn execute_input<'a>(&self, ctx: &mut Context<'a>, input: &'a str) -> Result<()> {
        let mut parts = input.split_whitespace();
        let Some(head) = parts.next() else {
            return Err(anyhow!("no command given"));
        };
        let command_name = head.to_ascii_lowercase();
        let args = Args::new(parts.collect());
        self.dispatch(command_name.as_str(), ctx, args)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register::<HelpCommand>();
        registry.register::<HelpAliasCommand>();
        registry.register::<StatusCommand>();
        registry.register::<OpenCommand>();
        registry.register::<RoundCommand>();
        registry.register::<PlayCommand>();
        registry.register::<CloseCommand>();
        registry.register::<HireCommand>();
        registry.register::<FireCommand>();
        registry.register::<StaffCommand>();
        registry.register::<BuyCommand>();
        registry.register::<StockCommand>();
        registry.register::<UpgradeCommand>();
        registry.register::<UpgradesCommand>();
        registry.register::<ActionCommand>();
        registry.register::<ActionsCommand>();
        registry.register::<BillsCommand>();
        registry.register::<PayCommand>();
        registry.register::<CreditCommand>();
        registry.register::<SharkCommand>();
        registry.register::<ActivityCommand>();
        registry.register::<ActivitiesCommand>();
        registry.register::<PolicyCommand>();
        registry.register::<SecurityCommand>();
        registry.register::<BouncerCommand>();
        registry.register::<TaskCommand>();
        registry.register::<TasksCommand>();
        registry.register::<MilestonesCommand>();
        registry.register::<MusicCommand>();
        registry.register::<DistrictCommand>();
        registry.register::<RegularsCommand>();
        registry.register::<PrestigeCommand>();
        registry.register::<PriceCommand>();
        registry.register::<BankruptCommand>();
        registry.register::<SaveCommand>();
        registry.register::<LoadCommand>();
        registry.register::<QuitCommand>();
        registry.register::<ExitCommand>();
        registry
    }
}

fn require_closed(game: &GameState, what: &str) -> Result<()> {
    if game.is_night_open() {
        bail!("{what} waits until closing time");
    }
    Ok(())
}

fn require_open(game: &GameState, what: &str) -> Result<()> {
    if !game.is_night_open() {
        bail!("{what} needs the doors open; use `open` first");
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(token: &str, what: &str) -> Result<T> {
    token
        .parse()
        .map_err(|_| anyhow!("{what} must be a number, got `{token}`"))
}

/// Parses `idx=min|full|skip|<amount>[@line]`.
pub(crate) fn parse_selection(token: &str) -> Result<BillSelection> {
    let (index, choice) = token
        .split_once('=')
        .ok_or_else(|| anyhow!("expected idx=amount, got `{token}`"))?;
    let bill: usize = parse_number(index, "bill index")?;
    let (amount, source) = match choice.split_once('@') {
        Some((amount, line)) => (
            amount,
            FundingSource::CreditLine(parse_number(line, "credit line")?),
        ),
        None => (choice, FundingSource::Cash),
    };
    let amount = match amount.to_ascii_lowercase().as_str() {
        "min" | "minimum" => PaymentAmount::Minimum,
        "full" => PaymentAmount::Full,
        "skip" | "0" => PaymentAmount::Skip,
        other => {
            let value: f64 = parse_number(other, "payment")?;
            if !value.is_finite() || value < 0.0 {
                bail!("payment must be a positive amount, got `{other}`");
            }
            PaymentAmount::Custom(value)
        }
    };
    Ok(BillSelection::new(bill, amount, source))
}

pub struct HelpCommand;

impl Command for HelpCommand {
    fn name() -> &'static str {
        "help"
    }

    fn execute(_ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        print_help();
        Ok(())
    }
}

pub struct HelpAliasCommand;

impl Command for HelpAliasCommand {
    fn name() -> &'static str {
        "?"
    }

    fn execute(ctx: &mut Context<'_>, args: Args<'_>) -> Result<()> {
        HelpCommand::execute(ctx, args)
    }
}

pub struct StatusCommand;

impl Command for StatusCommand {
    fn name() -> &'static str {
        "status"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        print_status(&ctx.game().snapshot());
        Ok(())
    }
}

pub struct OpenCommand;

impl Command for OpenCommand {
    fn name() -> &'static str {
        "open"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        require_closed(ctx.game(), "opening")?;
        let report = ctx.game_mut().open_night()?;
        flush_log(ctx.game_mut());
        print_open(&report);
        Ok(())
    }
}

pub struct RoundCommand;

impl Command for RoundCommand {
    fn name() -> &'static str {
        "round"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        require_open(ctx.game(), "playing a round")?;
        let rounds: u32 = match args.next() {
            Some(token) => parse_number(token, "round count")?,
            None => 1,
        };
        for _ in 0..rounds.max(1) {
            let report = ctx.game_mut().play_round();
            flush_log(ctx.game_mut());
            print_round(&report);
            if let Some(close) = &report.closed {
                print_close(close);
                break;
            }
        }
        Ok(())
    }
}

pub struct PlayCommand;

impl Command for PlayCommand {
    fn name() -> &'static str {
        "play"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        require_open(ctx.game(), "playing the night")?;
        loop {
            let report = ctx.game_mut().play_round();
            flush_log(ctx.game_mut());
            print_round(&report);
            if let Some(close) = &report.closed {
                print_close(close);
                return Ok(());
            }
        }
    }
}

pub struct CloseCommand;

impl Command for CloseCommand {
    fn name() -> &'static str {
        "close"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        require_open(ctx.game(), "closing")?;
        let report = ctx.game_mut().close_night(CloseReason::Manual);
        flush_log(ctx.game_mut());
        print_close(&report);
        Ok(())
    }
}

pub struct HireCommand;

impl Command for HireCommand {
    fn name() -> &'static str {
        "hire"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let role: StaffRole = args.next_required("which role? See help for the list.")?.parse()?;
        let id = ctx.game_mut().hire_staff(role)?;
        println!("Hired {} (id {id}).", role.label());
        Ok(())
    }
}

pub struct FireCommand;

impl Command for FireCommand {
    fn name() -> &'static str {
        "fire"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let id: u32 = parse_number(args.next_required("whose id?")?, "staff id")?;
        let member = ctx.game_mut().fire_staff(id)?;
        println!("{} has gone.", member.name());
        Ok(())
    }
}

pub struct StaffCommand;

impl Command for StaffCommand {
    fn name() -> &'static str {
        "staff"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        print_staff(&ctx.game().snapshot());
        Ok(())
    }
}

pub struct BuyCommand;

impl Command for BuyCommand {
    fn name() -> &'static str {
        "buy"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let item = args.next_required("which stock item?")?;
        let quantity: u32 = parse_number(args.next_required("how many?")?, "quantity")?;
        let ordered = ctx.game_mut().buy_from_supplier(item, quantity)?;
        println!("Ordered {ordered} x {item}.");
        Ok(())
    }
}

pub struct StockCommand;

impl Command for StockCommand {
    fn name() -> &'static str {
        "stock"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let Some(item) = args.next() else {
            let snapshot = ctx.game().snapshot();
            for (id, quantity) in &snapshot.stock {
                let par = snapshot
                    .standing_order
                    .get(id)
                    .map(|par| format!(" (standing order {par})"))
                    .unwrap_or_default();
                println!("{id:<16} {quantity:>4}{par}");
            }
            for (id, par) in &snapshot.standing_order {
                if !snapshot.stock.contains_key(id) {
                    println!("{id:<16} {:>4} (standing order {par})", 0);
                }
            }
            return Ok(());
        };
        let par: u32 = parse_number(args.next_required("keep how many on the rack?")?, "par level")?;
        ctx.game_mut().set_standing_order(item, par)?;
        Ok(())
    }
}

pub struct UpgradeCommand;

impl Command for UpgradeCommand {
    fn name() -> &'static str {
        "upgrade"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let id = args.next_required("which upgrade? See `upgrades`.")?;
        ctx.game_mut().buy_upgrade(id)?;
        Ok(())
    }
}

pub struct UpgradesCommand;

impl Command for UpgradesCommand {
    fn name() -> &'static str {
        "upgrades"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        let owned = ctx.game().snapshot().upgrades;
        for upgrade in &ctx.game().catalog().upgrades {
            let mark = if owned.contains(&upgrade.id) { "*" } else { " " };
            let needs = upgrade
                .requires
                .as_ref()
                .map(|id| format!(" (needs {id})"))
                .unwrap_or_default();
            println!(
                "{mark} {:<20} {:<26} GBP {:>8.2} | {} night(s){needs}",
                upgrade.id, upgrade.name, upgrade.cost, upgrade.install_nights
            );
        }
        Ok(())
    }
}

pub struct ActionCommand;

impl Command for ActionCommand {
    fn name() -> &'static str {
        "action"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let id = args.next_required("which action? See `actions`.")?;
        let outcome = ctx.game_mut().resolve_action(id)?;
        println!(
            "{} {}: rep {:+}, morale {:+}, traffic {:+.0}% for {} round(s), chaos {:+.1}.",
            outcome.action,
            if outcome.success { "worked" } else { "backfired" },
            outcome.rep,
            outcome.morale,
            outcome.traffic * 100.0,
            outcome.traffic_rounds,
            outcome.chaos
        );
        Ok(())
    }
}

pub struct ActionsCommand;

impl Command for ActionsCommand {
    fn name() -> &'static str {
        "actions"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        for (action, cooldown) in ctx.game_mut().available_actions() {
            let wait = if cooldown > 0 {
                format!(" [cooldown {cooldown}]")
            } else {
                String::new()
            };
            println!(
                "{:<18} tier {} {:<9} {:>3.0}%{wait}",
                action.id,
                action.tier,
                action.category.label(),
                action.base_chance * 100.0
            );
        }
        Ok(())
    }
}

pub struct BillsCommand;

impl Command for BillsCommand {
    fn name() -> &'static str {
        "bills"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        print_bills(&ctx.game().snapshot());
        Ok(())
    }
}

pub struct PayCommand;

impl Command for PayCommand {
    fn name() -> &'static str {
        "pay"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let selections = args
            .rest()
            .into_iter()
            .map(parse_selection)
            .collect::<Result<Vec<_>>>()?;
        let outcome = ctx.game_mut().apply_payday_payments(&selections)?;
        println!(
            "Paid GBP {:.2} of GBP {:.2} due. Minimums {}. Debt tier {}.",
            outcome.paid,
            outcome.total_due,
            if outcome.met_minimums { "met" } else { "MISSED" },
            outcome.debt_tier
        );
        Ok(())
    }
}

pub struct CreditCommand;

impl Command for CreditCommand {
    fn name() -> &'static str {
        "credit"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        match args.next().map(str::to_ascii_lowercase).as_deref() {
            None | Some("list") => {
                print_credit(ctx.game());
                Ok(())
            }
            Some("open") => {
                let bank = args.next_required("which bank?")?;
                let id = ctx.game_mut().open_credit_line(bank)?;
                println!("Credit line #{id} opened.");
                Ok(())
            }
            Some("repay") => {
                let id: u32 = parse_number(args.next_required("which line?")?, "line id")?;
                let amount: f64 = parse_number(args.next_required("how much?")?, "amount")?;
                let repaid = ctx.game_mut().repay_credit_line(id, amount)?;
                println!("Repaid GBP {repaid:.2} on line #{id}.");
                Ok(())
            }
            Some(other) => bail!("unknown credit subcommand: {other} (list | open | repay)"),
        }
    }
}

fn print_credit(game: &GameState) {
    let snapshot = game.snapshot();
    println!(
        "Credit score {} | bank lines {:.0}% drawn.",
        snapshot.credit_score,
        snapshot.credit_utilisation * 100.0
    );
    for bank in &game.catalog().banks {
        println!(
            "  {:<14} {:<22} limit GBP {:.0}-{:.0} | APR {:.1}-{:.1}% | min score {}",
            bank.id,
            bank.name,
            bank.limit.0,
            bank.limit.1,
            bank.apr.0 * 100.0,
            bank.apr.1 * 100.0,
            bank.min_score
        );
    }
    for line in &snapshot.credit_lines {
        println!(
            "  #{} {:<22} GBP {:.2} / {:.2} at {:.1}%{}",
            line.id,
            line.lender,
            line.balance,
            line.limit,
            line.apr * 100.0,
            if line.enabled { "" } else { " (frozen)" }
        );
    }
    if snapshot.shark_balance > 0.0 {
        println!("  Loan shark: GBP {:.2} owed.", snapshot.shark_balance);
    }
    if snapshot.supplier_balance > 0.0 {
        println!("  Supplier tab: GBP {:.2}.", snapshot.supplier_balance);
    }
}

pub struct SharkCommand;

impl Command for SharkCommand {
    fn name() -> &'static str {
        "shark"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        let cash = ctx.game_mut().take_loan_shark()?;
        println!("The shark hands over GBP {cash:.2}. Don't be late.");
        Ok(())
    }
}

pub struct ActivityCommand;

impl Command for ActivityCommand {
    fn name() -> &'static str {
        "activity"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let id = args.next_required("which activity? See `activities`.")?;
        ctx.game_mut().schedule_activity(id)?;
        Ok(())
    }
}

pub struct ActivitiesCommand;

impl Command for ActivitiesCommand {
    fn name() -> &'static str {
        "activities"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        for activity in &ctx.game().catalog().activities {
            let gate = match &activity.requires_upgrade {
                Some(id) => format!(" (needs {id})"),
                None if activity.min_pub_level > 0 => {
                    format!(" (pub level {})", activity.min_pub_level)
                }
                None => String::new(),
            };
            println!(
                "{:<18} {:<20} GBP {:>6.2} | traffic {:+.0}% | rep {:+}{gate}",
                activity.id,
                activity.name,
                activity.cost,
                activity.traffic * 100.0,
                activity.rep
            );
        }
        Ok(())
    }
}

pub struct PolicyCommand;

impl Command for PolicyCommand {
    fn name() -> &'static str {
        "policy"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let policy: SecurityPolicy = args
            .next_required("friendly, balanced or strict?")?
            .parse()?;
        ctx.game_mut().set_security_policy(policy);
        Ok(())
    }
}

pub struct SecurityCommand;

impl Command for SecurityCommand {
    fn name() -> &'static str {
        "security"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        match args.next().map(str::to_ascii_lowercase).as_deref() {
            None => {
                let snapshot = ctx.game().snapshot();
                let s = &snapshot.security;
                println!(
                    "Security {} = base {} + legacy {} + upgrades {} + policy {} + bouncers {} + manager {} + staff {}",
                    s.total, s.base, s.legacy, s.upgrades, s.policy, s.bouncers, s.manager, s.staff
                );
                Ok(())
            }
            Some("upgrade") => {
                let level = ctx.game_mut().upgrade_security()?;
                println!("Security level is now {level}.");
                Ok(())
            }
            Some(other) => bail!("unknown security subcommand: {other}"),
        }
    }
}

pub struct BouncerCommand;

impl Command for BouncerCommand {
    fn name() -> &'static str {
        "bouncer"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        let quality = ctx.game_mut().hire_bouncer()?;
        println!("Bouncer on the door ({quality:?}).");
        Ok(())
    }
}

pub struct TaskCommand;

impl Command for TaskCommand {
    fn name() -> &'static str {
        "task"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let name = args.rest().join(" ");
        if name.is_empty() {
            bail!("which security task? See `tasks`.");
        }
        let task: SecurityTask = name.parse()?;
        ctx.game_mut().resolve_security_task(task)?;
        Ok(())
    }
}

pub struct TasksCommand;

impl Command for TasksCommand {
    fn name() -> &'static str {
        "tasks"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        for (task, availability, cooldown) in ctx.game().security_tasks() {
            let note = match availability {
                Ok(()) => String::new(),
                Err(_) if cooldown > 0 => format!(" [cooldown {cooldown}]"),
                Err(why) => format!(" ({why})"),
            };
            println!(
                "{:<18} tier {} incidents x{:.2} traffic x{:.2}{note}",
                task.key(),
                task.tier(),
                task.incident_multiplier(),
                task.traffic_multiplier()
            );
        }
        Ok(())
    }
}

pub struct MilestonesCommand;

impl Command for MilestonesCommand {
    fn name() -> &'static str {
        "milestones"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        let earned = ctx.game().milestones();
        for milestone in Milestone::ALL {
            let mark = if earned.contains(&milestone) { "x" } else { " " };
            println!(
                "[{mark}] T{} {:<26} {}",
                milestone.tier(),
                milestone.title(),
                milestone.description()
            );
        }
        println!("{} of {} this run.", earned.len(), Milestone::ALL.len());
        Ok(())
    }
}

pub struct DistrictCommand;

impl Command for DistrictCommand {
    fn name() -> &'static str {
        "district"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        for (name, stance) in ctx.game().rivals() {
            let stance = stance.map_or("not yet seen", |s| s.label());
            println!("{name:<18} {stance}");
        }
        let district = ctx.game().snapshot().district;
        println!("Pressure: {}", district.summary());
        Ok(())
    }
}

pub struct RegularsCommand;

impl Command for RegularsCommand {
    fn name() -> &'static str {
        "regulars"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        let snapshot = ctx.game().snapshot();
        for vip in &snapshot.vips {
            println!(
                "{:<10} {:<17} loyalty {:>3}  {}",
                vip.name,
                vip.archetype.label(),
                vip.loyalty,
                vip.stage.label()
            );
        }
        Ok(())
    }
}

pub struct MusicCommand;

impl Command for MusicCommand {
    fn name() -> &'static str {
        "music"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let name = args.rest().join(" ");
        if !name.is_empty() {
            let profile: MusicProfile = name.parse()?;
            ctx.game_mut().set_music_profile(profile)?;
            return Ok(());
        }
        let snapshot = ctx.game().snapshot();
        match snapshot.music {
            Some(profile) => println!(
                "Playing {}: {}",
                profile.label(),
                snapshot.music_effects.summary()
            ),
            None => println!("No music on."),
        }
        let keys: Vec<&str> = MusicProfile::ALL.iter().map(|p| p.key()).collect();
        println!("Profiles: {}", keys.join(", "));
        Ok(())
    }
}

pub struct PrestigeCommand;

impl Command for PrestigeCommand {
    fn name() -> &'static str {
        "prestige"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        if args.next() != Some("confirm") {
            let snapshot = ctx.game().snapshot();
            println!("Stars {} | banked: {}", snapshot.stars, snapshot.legacy.summary());
            println!("Prestiging now banks: {}", ctx.game().prestige_preview().summary());
            if snapshot.prestige_ready {
                println!("Type `prestige confirm` to trade the pub level and upgrades for it.");
            }
            return Ok(());
        }
        ctx.game_mut().prestige()?;
        Ok(())
    }
}

pub struct PriceCommand;

impl Command for PriceCommand {
    fn name() -> &'static str {
        "price"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let value: f64 = parse_number(args.next_required("what multiplier?")?, "multiplier")?;
        ctx.game_mut().set_price_multiplier(value)?;
        Ok(())
    }
}

pub struct BankruptCommand;

impl Command for BankruptCommand {
    fn name() -> &'static str {
        "bankrupt"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        if args.next() != Some("confirm") {
            bail!("this wipes your upgrades and credit. Type `bankrupt confirm` to go ahead.");
        }
        let repossessed = ctx.game_mut().declare_bankruptcy()?;
        if !repossessed.is_empty() {
            println!("Repossessed: {}.", repossessed.join(", "));
        }
        Ok(())
    }
}

pub struct SaveCommand;

impl Command for SaveCommand {
    fn name() -> &'static str {
        "save"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let path = Path::new(args.next_required("save where?")?);
        let bytes = if is_json_path(path) {
            ctx.game_mut().save_json()?.into_bytes()
        } else {
            ctx.game_mut().save_bytes()?
        };
        fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))?;
        println!("Saved to {}.", path.display());
        Ok(())
    }
}

pub struct LoadCommand;

impl Command for LoadCommand {
    fn name() -> &'static str {
        "load"
    }

    fn execute(ctx: &mut Context<'_>, mut args: Args<'_>) -> Result<()> {
        let path = Path::new(args.next_required("load which file?")?);
        let config = ctx.game().config().clone();
        let catalog = ctx.game().catalog().clone();
        let mut game = crate::load_game(config, catalog, path)?;
        game.attach_sink(Box::new(TracingSink));
        *ctx.game_mut() = game;
        Ok(())
    }
}

pub struct QuitCommand;

impl Command for QuitCommand {
    fn name() -> &'static str {
        "quit"
    }

    fn execute(ctx: &mut Context<'_>, _args: Args<'_>) -> Result<()> {
        println!("Last orders. Goodnight.");
        ctx.request_quit();
        Ok(())
    }
}

pub struct ExitCommand;

impl Command for ExitCommand {
    fn name() -> &'static str {
        "exit"
    }

    fn execute(ctx: &mut Context<'_>, args: Args<'_>) -> Result<()> {
        QuitCommand::execute(ctx, args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pubsim_core::GameBuilder;

    fn game() -> GameState {
        GameBuilder::from_embedded()
            .unwrap()
            .with_seed(3)
            .build()
            .unwrap()
    }

    #[test]
    fn selections_parse_amounts_and_sources() {
        assert_eq!(
            parse_selection("0=min").unwrap(),
            BillSelection::new(0, PaymentAmount::Minimum, FundingSource::Cash)
        );
        assert_eq!(
            parse_selection("2=FULL@1").unwrap(),
            BillSelection::new(2, PaymentAmount::Full, FundingSource::CreditLine(1))
        );
        assert_eq!(
            parse_selection("1=skip").unwrap().amount,
            PaymentAmount::Skip
        );
        assert_eq!(
            parse_selection("3=125.5").unwrap().amount,
            PaymentAmount::Custom(125.5)
        );
    }

    #[test]
    fn bad_selections_are_errors() {
        assert!(parse_selection("min").is_err());
        assert!(parse_selection("x=full").is_err());
        assert!(parse_selection("0=lots").is_err());
        assert!(parse_selection("0=-5").is_err());
        assert!(parse_selection("0=full@bank").is_err());
    }

    #[test]
    fn args_hand_out_tokens_in_order() {
        let mut args = Args::new(vec!["credit", "repay", "1"]);
        assert_eq!(args.next(), Some("credit"));
        assert_eq!(args.rest(), vec!["repay", "1"]);
        assert!(args.next_required("missing").is_err());
    }

    #[test]
    fn unknown_commands_are_errors() {
        let registry = CommandRegistry::default();
        let mut game = game();
        let mut ctx = Context::new(&mut game);
        assert!(registry.execute_input(&mut ctx, "juggle").is_err());
        assert!(!ctx.should_quit());
    }

    #[test]
    fn commands_are_case_insensitive() {
        let registry = CommandRegistry::default();
        let mut game = game();
        let mut ctx = Context::new(&mut game);
        registry.execute_input(&mut ctx, "PRICE 1.5").unwrap();
        assert_eq!(ctx.game().snapshot().price_multiplier, 1.5);
    }

    #[test]
    fn quit_sets_the_flag() {
        let registry = CommandRegistry::default();
        let mut game = game();
        let mut ctx = Context::new(&mut game);
        registry.execute_input(&mut ctx, "exit").unwrap();
        assert!(ctx.should_quit());
    }

    #[test]
    fn rejections_surface_as_errors() {
        let registry = CommandRegistry::default();
        let mut game = game();
        let mut ctx = Context::new(&mut game);
        let err = registry.execute_input(&mut ctx, "upgrade gold_taps").unwrap_err();
        assert!(err.to_string().contains("gold_taps"));
        assert!(registry.execute_input(&mut ctx, "bankrupt").is_err());
        assert!(!ctx.game().snapshot().bankrupt);
    }

    #[test]
    fn music_and_door_tasks_take_spaced_names() {
        let registry = CommandRegistry::default();
        let mut game = game();
        let mut ctx = Context::new(&mut game);
        registry.execute_input(&mut ctx, "music sports tv").unwrap();
        assert_eq!(ctx.game().snapshot().music, Some(MusicProfile::SportsTv));
        let err = registry.execute_input(&mut ctx, "task check ids").unwrap_err();
        assert!(err.to_string().contains("closed"));
        assert!(registry.execute_input(&mut ctx, "task").is_err());
        registry.execute_input(&mut ctx, "milestones").unwrap();
        registry.execute_input(&mut ctx, "prestige").unwrap();
    }

    #[test]
    fn district_and_regulars_print_before_the_first_week() {
        let registry = CommandRegistry::default();
        let mut game = game();
        let mut ctx = Context::new(&mut game);
        registry.execute_input(&mut ctx, "district").unwrap();
        registry.execute_input(&mut ctx, "regulars").unwrap();
        assert!(ctx.game().rivals().iter().all(|(_, stance)| stance.is_none()));
        assert_eq!(ctx.game().snapshot().vips.len(), 3);
    }

    #[test]
    #[should_panic(expected = "registered twice")]
    fn duplicate_registration_panics() {
        let mut registry = CommandRegistry::new();
        registry.register::<StatusCommand>();
        registry.register::<StatusCommand>();
    }
}
