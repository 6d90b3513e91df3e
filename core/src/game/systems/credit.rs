use rand::Rng;

use crate::game::context::SimContext;
use crate::game::credit::{CreditLine, LoanShark, PenaltyTrack};
use crate::game::economy::CostKind;
use crate::game::rejection::Rejection;
use crate::game::{CREDIT_SCORE_MIN, PAYMENT_TOLERANCE};

const EXTRA_LINE_SCORE_HIT: i32 = -5;
const SHARK_SCORE_HIT: i32 = -50;

fn roll_between<R: Rng + ?Sized>(rng: &mut R, (lo, hi): (f64, f64)) -> f64 {
    if hi > lo { rng.gen_range(lo..=hi) } else { lo }
}

fn bank_lock_reason(ctx: &SimContext<'_>) -> Option<String> {
    let credit = &ctx.sim.credit;
    if credit.bankruptcy_lock_weeks > 0 {
        Some(format!(
            "bankruptcy lock, {} week(s) left",
            credit.bankruptcy_lock_weeks
        ))
    } else if credit.banks_locked {
        Some("the banks have stopped lending to you".to_string())
    } else {
        None
    }
}

/// Opens a line with a bank from the catalog. Limit and APR are rolled from its ranges.
pub(crate) fn open_credit_line(ctx: &mut SimContext<'_>, bank_id: &str) -> Result<u32, Rejection> {
    let catalog = ctx.catalog;
    let Some(bank) = catalog.bank(bank_id) else {
        return Err(ctx.reject(Rejection::unknown("bank", bank_id)));
    };
    if let Some(reason) = bank_lock_reason(ctx) {
        return Err(ctx.reject(Rejection::CreditRefused(reason)));
    }
    if ctx.sim.credit.has_bank(&bank.id) {
        return Err(ctx.reject(Rejection::CreditRefused(format!(
            "you already have a line with {}",
            bank.name
        ))));
    }
    let score = ctx.sim.credit.score;
    if score < bank.min_score {
        return Err(ctx.reject(Rejection::CreditRefused(format!(
            "{} wants a score of {} (yours is {score})",
            bank.name, bank.min_score
        ))));
    }

    let limit = roll_between(&mut *ctx.rng, bank.limit).round();
    let apr = roll_between(&mut *ctx.rng, bank.apr);
    let credit = &mut ctx.sim.credit;
    let id = credit.allocate_line_id();
    credit
        .lines
        .push(CreditLine::new(id, &bank.id, &bank.name, limit, apr));
    credit.lines_opened_this_week += 1;
    let shopping_around = credit.lines_opened_this_week > 1;
    if shopping_around {
        credit.adjust_score(EXTRA_LINE_SCORE_HIT);
    }
    ctx.log.pos(format!(
        "Opened credit line #{id} with {}: limit GBP {limit:.0} at {:.1}% APR.",
        bank.name,
        apr * 100.0
    ));
    if shopping_around {
        ctx.log.neg("Several applications in one week dent your credit score (-5).");
    }
    Ok(id)
}

/// Pays a line down from cash. Returns what was actually repaid.
pub(crate) fn repay_credit_line(ctx: &mut SimContext<'_>, id: u32, amount: f64) -> Result<f64, Rejection> {
    if !(amount > 0.0) {
        return Err(ctx.reject(Rejection::InvalidValue(
            "repayment must be greater than zero".to_string(),
        )));
    }
    let Some(balance) = ctx.sim.credit.line(id).map(|line| line.balance) else {
        return Err(ctx.reject(Rejection::unknown("credit line", id.to_string())));
    };
    let payment = amount.min(balance);
    if payment <= 0.0 {
        return Err(ctx.reject(Rejection::InvalidValue(format!(
            "nothing is owed on credit line #{id}"
        ))));
    }
    if !ctx.sim.ledger.can_afford(payment) {
        return Err(ctx.reject(Rejection::InsufficientFunds { needed: payment }));
    }
    ctx.sim.ledger.withdraw(payment);
    let (repaid, lender, left) = match ctx.sim.credit.line_mut(id) {
        Some(line) => (line.repay(payment), line.lender.clone(), line.balance),
        None => (0.0, String::new(), 0.0),
    };
    ctx.log.pos(format!(
        "Repaid GBP {repaid:.2} to {lender}. GBP {left:.2} still owed."
    ));
    Ok(repaid)
}

/// Cash now from someone who does not check credit scores.
pub(crate) fn take_loan_shark(ctx: &mut SimContext<'_>) -> Result<f64, Rejection> {
    if ctx.sim.credit.shark_balance() > PAYMENT_TOLERANCE {
        return Err(ctx.reject(Rejection::CreditRefused(
            "the shark wants the last loan back first".to_string(),
        )));
    }
    let amount = roll_between(&mut *ctx.rng, ctx.config.shark_limit).round();
    let apr = roll_between(&mut *ctx.rng, ctx.config.shark_apr);
    let credit = &mut ctx.sim.credit;
    let apr = apr + credit.shark_apr_bonus;
    credit.shark = Some(LoanShark {
        balance: amount,
        apr,
        track: PenaltyTrack {
            penalty_apr: credit.shark_penalty_bonus,
            ..PenaltyTrack::default()
        },
    });
    credit.adjust_score(SHARK_SCORE_HIT);
    ctx.sim.ledger.deposit(amount);
    ctx.log.neg(format!(
        "Took GBP {amount:.0} from a loan shark at {:.0}% APR. Credit score {SHARK_SCORE_HIT}.",
        apr * 100.0
    ));
    Ok(amount)
}

/// Weekly interest on every account, scaled by the debt spiral. Returns the total charged.
pub(crate) fn accrue_weekly_interest(ctx: &mut SimContext<'_>) -> f64 {
    let multiplier = ctx.sim.debt.multipliers().interest;
    let mut charges: Vec<(String, f64)> = Vec::new();
    let credit = &mut ctx.sim.credit;
    for line in credit.lines.iter_mut() {
        let interest = line.accrue_weekly_interest(multiplier);
        if interest > 0.0 {
            charges.push((line.lender.clone(), interest));
        }
    }
    if let Some(shark) = credit.shark.as_mut() {
        let interest = shark.accrue_weekly_interest(multiplier);
        if interest > 0.0 {
            charges.push(("Loan shark".to_string(), interest));
        }
    }
    let supplier = credit.supplier.accrue_weekly_interest(multiplier);
    if supplier > 0.0 {
        charges.push(("Supplier credit".to_string(), supplier));
    }
    credit.supplier.late_fees_this_week = 0.0;

    let mut total = 0.0;
    for (label, interest) in charges {
        ctx.sim.ledger.book_cost(CostKind::Interest, interest);
        ctx.log.info(format!("{label} interest +GBP {interest:.2}."));
        total += interest;
    }
    total
}

/// Weekly housekeeping: the application counter resets and a bankruptcy lock ticks down.
pub(crate) fn weekly_tick(ctx: &mut SimContext<'_>) {
    let credit = &mut ctx.sim.credit;
    credit.lines_opened_this_week = 0;
    if credit.bankruptcy_lock_weeks == 0 {
        return;
    }
    credit.bankruptcy_lock_weeks -= 1;
    if credit.bankruptcy_lock_weeks == 0 {
        if credit.score == 0 {
            credit.score = CREDIT_SCORE_MIN;
        }
        ctx.log
            .pos("The bankruptcy lock has lifted. Banks will consider you again.");
    }
}

/// How the week's payday went for lenders, as far as the score is concerned.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RepaymentRecord {
    pub(crate) any_line_missed: bool,
    pub(crate) shark_missed: bool,
    pub(crate) all_bills_full: bool,
    pub(crate) had_bills: bool,
}

/// Score movement after payday. Returns the net change.
pub(crate) fn score_after_payday(ctx: &mut SimContext<'_>, record: RepaymentRecord) -> i32 {
    let before = ctx.sim.credit.score;
    let credit = &mut ctx.sim.credit;
    if record.any_line_missed {
        credit.adjust_score(-20);
    } else if credit.lines_balance() > 0.0 {
        credit.adjust_score(4);
    }
    if record.shark_missed {
        credit.adjust_score(-60);
    }
    if record.had_bills && record.all_bills_full {
        credit.adjust_score(8);
    }
    if credit.lines_balance() <= 0.0 {
        credit.debt_free_weeks += 1;
        if credit.debt_free_weeks >= 2 {
            let bonus = (credit.debt_free_weeks as i32 - 1).min(3);
            credit.adjust_score(bonus);
        }
    } else {
        credit.debt_free_weeks = 0;
    }
    let delta = ctx.sim.credit.score - before;
    if delta != 0 {
        ctx.log.info(format!(
            "Credit score {delta:+} (now {}).",
            ctx.sim.credit.score
        ));
    }
    delta
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::context::testing::Fixture;

    #[test]
    fn opening_a_line_rolls_within_the_bank_ranges() {
        let mut fx = Fixture::new(8);
        let id = open_credit_line(&mut fx.ctx(), "townland").expect("open");
        let line = fx.sim.credit.line(id).expect("line");
        assert!((1500.0..=3000.0).contains(&line.limit));
        assert!((0.05..=0.08).contains(&line.apr));
        assert_eq!(line.balance, 0.0);
        assert!(matches!(
            open_credit_line(&mut fx.ctx(), "townland"),
            Err(Rejection::CreditRefused(_))
        ));
    }

    #[test]
    fn picky_banks_check_the_score() {
        let mut fx = Fixture::new(8);
        fx.sim.credit.score = 600;
        assert!(matches!(
            open_credit_line(&mut fx.ctx(), "union_albion"),
            Err(Rejection::CreditRefused(_))
        ));
        assert!(fx.sim.credit.lines.is_empty());
    }

    #[test]
    fn second_application_in_a_week_costs_score() {
        let mut fx = Fixture::new(8);
        fx.sim.credit.score = 700;
        open_credit_line(&mut fx.ctx(), "townland").expect("first");
        assert_eq!(fx.sim.credit.score, 700);
        open_credit_line(&mut fx.ctx(), "santnere").expect("second");
        assert_eq!(fx.sim.credit.score, 695);
        weekly_tick(&mut fx.ctx());
        assert_eq!(fx.sim.credit.lines_opened_this_week, 0);
    }

    #[test]
    fn bankruptcy_lock_blocks_banks_then_lifts() {
        let mut fx = Fixture::new(8);
        fx.sim.credit.bankruptcy_lock_weeks = 1;
        fx.sim.credit.score = 0;
        assert!(matches!(
            open_credit_line(&mut fx.ctx(), "townland"),
            Err(Rejection::CreditRefused(_))
        ));
        weekly_tick(&mut fx.ctx());
        assert_eq!(fx.sim.credit.score, CREDIT_SCORE_MIN);
        assert!(open_credit_line(&mut fx.ctx(), "townland").is_ok());
    }

    #[test]
    fn repayment_is_capped_at_the_balance() {
        let mut fx = Fixture::new(8);
        let id = open_credit_line(&mut fx.ctx(), "townland").expect("open");
        if let Some(line) = fx.sim.credit.line_mut(id) {
            line.draw(100.0);
        }
        let cash = fx.sim.ledger.cash();
        assert_eq!(repay_credit_line(&mut fx.ctx(), id, 500.0), Ok(100.0));
        assert_eq!(fx.sim.ledger.cash(), cash - 100.0);
        assert!(matches!(
            repay_credit_line(&mut fx.ctx(), id, 10.0),
            Err(Rejection::InvalidValue(_))
        ));
    }

    #[test]
    fn shark_pays_out_and_hurts_the_score() {
        let mut fx = Fixture::new(8);
        let cash = fx.sim.ledger.cash();
        let score = fx.sim.credit.score;
        let amount = take_loan_shark(&mut fx.ctx()).expect("shark");
        assert!((2000.0..=6000.0).contains(&amount));
        assert_eq!(fx.sim.ledger.cash(), cash + amount);
        assert_eq!(fx.sim.credit.score, score - 50);
        assert!(take_loan_shark(&mut fx.ctx()).is_err());
    }

    #[test]
    fn interest_is_booked_weekly() {
        let mut fx = Fixture::new(8);
        fx.sim
            .credit
            .lines
            .push(CreditLine::new(1, "townland", "Townland", 2000.0, 0.20));
        fx.sim.credit.lines[0].draw(1000.0);
        let charged = accrue_weekly_interest(&mut fx.ctx());
        assert!((charged - 1000.0 * 0.20 / 52.0).abs() < 1e-9);
        assert!((fx.sim.ledger.week().cost_of(CostKind::Interest) - charged).abs() < 1e-9);
    }

    #[test]
    fn clean_payday_builds_the_score() {
        let mut fx = Fixture::new(8);
        fx.sim.credit.score = 600;
        let record = RepaymentRecord {
            all_bills_full: true,
            had_bills: true,
            ..RepaymentRecord::default()
        };
        assert_eq!(score_after_payday(&mut fx.ctx(), record), 8);
        // Second debt-free week adds min(3, weeks - 1).
        assert_eq!(score_after_payday(&mut fx.ctx(), record), 9);
        let missed = RepaymentRecord {
            shark_missed: true,
            ..RepaymentRecord::default()
        };
        assert_eq!(score_after_payday(&mut fx.ctx(), missed), -58);
    }
}
