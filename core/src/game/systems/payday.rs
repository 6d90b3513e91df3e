//! Weekly bills: drawn up when the week closes, settled before the next night opens.

use crate::game::bills::{
    BillKind, BillSelection, FundingSource, PaydayBill, PaydayOutcome, PaymentAmount,
};
use crate::game::context::SimContext;
use crate::game::economy::CostKind;
use crate::game::rejection::Rejection;
use crate::game::systems::credit::{self, RepaymentRecord};
use crate::game::systems::{debt, milestones, morale, staffing};
use crate::game::PAYMENT_TOLERANCE;

const TIP_SHARE: f64 = 0.5;

const SUPPLIER_LATE_FEE_MIN: f64 = 6.0;
const SUPPLIER_LATE_FEE_RATE: f64 = 0.08;
const SUPPLIER_PENALTY_STEP: f64 = 0.02;
const SUPPLIER_PENALTY_CAP: f64 = 0.20;
const SUPPLIER_LATE_SCORE: i32 = -6;
const SUPPLIER_LATE_TRUST: f64 = 0.02;
const SUPPLIER_LATE_MORALE: f64 = -2.0;

const LINE_LATE_FEE_MIN: f64 = 5.0;
const LINE_LATE_FEE_RATE: f64 = 0.10;
const LINE_PENALTY_STEP: f64 = 0.015;
const LINE_PENALTY_CAP: f64 = 0.25;

const SHARK_LATE_FEE_MIN: f64 = 8.0;
const SHARK_LATE_FEE_RATE: f64 = 0.12;
const SHARK_PENALTY_STEP: f64 = 0.03;
const SHARK_PENALTY_CAP: f64 = 0.35;

/// Draws up the week's bills. Returns how many are pending.
pub(crate) fn prepare_bills(ctx: &mut SimContext<'_>) -> usize {
    ctx.sim.accruals.tips_held = ctx.sim.ledger.week().tips;
    let sim = &*ctx.sim;
    let mut bills = Vec::new();

    let supplier = &sim.credit.supplier;
    if supplier.balance > PAYMENT_TOLERANCE {
        bills.push(PaydayBill::new(BillKind::Supplier, supplier.minimum_due(), supplier.balance));
    }
    let wages = staffing::wages_due(sim) + sim.accruals.tips_held * TIP_SHARE;
    if wages > PAYMENT_TOLERANCE {
        bills.push(PaydayBill::new(BillKind::Wages, wages, wages));
    }
    for (kind, accrued) in [
        (BillKind::Rent, sim.accruals.rent),
        (BillKind::SecurityUpkeep, sim.security.upkeep_accrued),
        (BillKind::InnMaintenance, sim.inn.maintenance_accrued),
    ] {
        if accrued > PAYMENT_TOLERANCE {
            bills.push(PaydayBill::new(kind, accrued, accrued));
        }
    }
    for line in sim.credit.lines.iter().filter(|line| line.balance > PAYMENT_TOLERANCE) {
        bills.push(PaydayBill::new(
            BillKind::CreditLine(line.id),
            line.weekly_payment,
            line.balance,
        ));
    }
    if let Some(shark) = sim.credit.shark.as_ref().filter(|s| s.balance > PAYMENT_TOLERANCE) {
        bills.push(PaydayBill::new(BillKind::LoanShark, shark.minimum_due(), shark.balance));
    }

    let count = bills.len();
    if count > 0 {
        ctx.log.header("PAYDAY");
        for (index, bill) in bills.iter().enumerate() {
            ctx.log.info(format!(
                "[{index}] {}: minimum GBP {:.2}, full GBP {:.2}.",
                bill.label(),
                bill.minimum_due,
                bill.full_due
            ));
        }
    }
    ctx.sim.bills = bills;
    count
}

/// Minimum on every bill, paid from cash.
pub(crate) fn default_selections(bills: &[PaydayBill]) -> Vec<BillSelection> {
    (0..bills.len())
        .map(|index| BillSelection::new(index, PaymentAmount::Minimum, FundingSource::Cash))
        .collect()
}

fn validate(ctx: &SimContext<'_>, selections: &[BillSelection]) -> Result<(), Rejection> {
    let bills = &ctx.sim.bills;
    for selection in selections {
        let Some(bill) = bills.get(selection.bill) else {
            return Err(Rejection::InvalidValue(format!(
                "there is no bill #{} (bills run 0 to {})",
                selection.bill,
                bills.len().saturating_sub(1)
            )));
        };
        if let PaymentAmount::Custom(amount) = selection.amount {
            if !amount.is_finite() || amount < 0.0 {
                return Err(Rejection::InvalidValue(format!(
                    "cannot pay GBP {amount} towards {}",
                    bill.label()
                )));
            }
        }
        if let FundingSource::CreditLine(id) = selection.source {
            if ctx.sim.credit.line(id).is_none() {
                return Err(Rejection::unknown("credit line", id.to_string()));
            }
            if bill.kind == BillKind::CreditLine(id) {
                return Err(Rejection::InvalidValue(format!(
                    "credit line #{id} cannot pay itself"
                )));
            }
        }
    }
    Ok(())
}

fn fund(ctx: &mut SimContext<'_>, source: FundingSource, target: f64) -> f64 {
    match source {
        FundingSource::Cash => ctx.sim.ledger.withdraw(target),
        FundingSource::CreditLine(id) => ctx
            .sim
            .credit
            .line_mut(id)
            .map(|line| line.draw(target))
            .unwrap_or(0.0),
    }
}

fn settle_supplier(ctx: &mut SimContext<'_>, bill: &PaydayBill, paid: f64) {
    let late_fee_multiplier = ctx.sim.debt.multipliers().late_fee;
    let supplier = &mut ctx.sim.credit.supplier;
    supplier.repay(paid);
    if bill.meets_minimum(paid) {
        supplier.track.mark_on_time();
        if bill.is_full_payment(paid) {
            supplier.track.record_full_payment();
        }
        return;
    }
    let shortfall = bill.minimum_due - paid;
    let fee = SUPPLIER_LATE_FEE_MIN.max(shortfall * SUPPLIER_LATE_FEE_RATE) * late_fee_multiplier;
    supplier.balance += fee;
    supplier.late_fees_this_week += fee;
    supplier.track.mark_missed();
    supplier.track.add_penalty(SUPPLIER_PENALTY_STEP, SUPPLIER_PENALTY_CAP);
    supplier.adjust_trust_penalty(SUPPLIER_LATE_TRUST);
    ctx.sim.ledger.book_cost(CostKind::LateFees, fee);
    ctx.sim.credit.adjust_score(SUPPLIER_LATE_SCORE);
    ctx.sim.roster.adjust_all_morale(SUPPLIER_LATE_MORALE);
    ctx.log.neg(format!(
        "Supplier paid late: GBP {fee:.2} late fee, prices and terms tighten."
    ));
}

fn settle_wages(ctx: &mut SimContext<'_>, bill: &PaydayBill, paid: f64) {
    let tips = ctx.sim.accruals.tips_held * TIP_SHARE;
    ctx.sim.accruals.tips_held = 0.0;
    ctx.sim.ledger.book_cost(CostKind::Wages, paid);
    if bill.is_full_payment(paid) {
        staffing::handle_wages_paid(ctx);
        let delta = morale::tips_payday(ctx, tips);
        ctx.log.pos(format!(
            "Wages paid in full with GBP {tips:.2} in tips (morale {delta:+})."
        ));
        return;
    }
    if paid > 0.0 && bill.full_due > 0.0 {
        staffing::settle_partial_wages(ctx, paid / bill.full_due);
    }
    staffing::handle_wages_missed(ctx);
}

fn settle_accrued(ctx: &mut SimContext<'_>, bill: &PaydayBill, paid: f64) {
    let (slot, cost) = match bill.kind {
        BillKind::Rent => (&mut ctx.sim.accruals.rent, CostKind::Rent),
        BillKind::SecurityUpkeep => (&mut ctx.sim.security.upkeep_accrued, CostKind::Security),
        BillKind::InnMaintenance => (&mut ctx.sim.inn.maintenance_accrued, CostKind::Inn),
        _ => return,
    };
    *slot = (*slot - paid).max(0.0);
    ctx.sim.ledger.book_cost(cost, paid);
    if !bill.meets_minimum(paid) {
        ctx.log.neg(format!("{} paid below minimum.", bill.label()));
    }
}

/// Returns `true` when the line missed its minimum.
fn settle_line(ctx: &mut SimContext<'_>, id: u32, bill: &PaydayBill, paid: f64) -> bool {
    let late_fee_multiplier = ctx.sim.debt.multipliers().late_fee;
    let Some(line) = ctx.sim.credit.line_mut(id) else {
        return false;
    };
    line.repay(paid);
    if bill.meets_minimum(paid) {
        line.track.mark_on_time();
        if bill.is_full_payment(paid) {
            line.track.record_full_payment();
        } else {
            line.track.reset_full_pay_streak();
        }
        return false;
    }
    let shortfall = bill.minimum_due - paid;
    let fee = LINE_LATE_FEE_MIN.max(shortfall * LINE_LATE_FEE_RATE) * late_fee_multiplier;
    line.track.mark_missed();
    line.track.reset_full_pay_streak();
    line.track.add_penalty(LINE_PENALTY_STEP, LINE_PENALTY_CAP);
    line.add_charge(fee);
    let lender = line.lender.clone();
    ctx.sim.ledger.book_cost(CostKind::LateFees, fee);
    ctx.log.neg(format!(
        "Missed the minimum to {lender}: GBP {fee:.2} fee and a higher rate."
    ));
    true
}

/// Returns `true` when the shark's minimum was missed.
fn settle_shark(ctx: &mut SimContext<'_>, bill: &PaydayBill, paid: f64) -> bool {
    let late_fee_multiplier = ctx.sim.debt.multipliers().late_fee;
    let Some(shark) = ctx.sim.credit.shark.as_mut() else {
        return false;
    };
    shark.repay(paid);
    if bill.meets_minimum(paid) {
        shark.track.mark_on_time();
        if shark.balance <= 0.0 {
            ctx.sim.credit.shark = None;
            ctx.log.pos("The loan shark is paid off.");
        }
        return false;
    }
    let shortfall = bill.minimum_due - paid;
    let fee = SHARK_LATE_FEE_MIN.max(shortfall * SHARK_LATE_FEE_RATE) * late_fee_multiplier;
    shark.balance += fee;
    shark.track.mark_missed();
    shark.track.add_penalty(SHARK_PENALTY_STEP, SHARK_PENALTY_CAP);
    ctx.sim.ledger.book_cost(CostKind::LateFees, fee);
    ctx.log
        .neg(format!("The loan shark was not paid. GBP {fee:.2} added and the rate climbs."));
    true
}

/// Settles every pending bill. Bills without a selection get their minimum from cash.
pub(crate) fn apply_payments(
    ctx: &mut SimContext<'_>,
    selections: &[BillSelection],
) -> Result<PaydayOutcome, Rejection> {
    if ctx.sim.bills.is_empty() {
        return Err(ctx.reject(Rejection::NoBillsPending));
    }
    if let Err(rejection) = validate(ctx, selections) {
        return Err(ctx.reject(rejection));
    }

    let bills = std::mem::take(&mut ctx.sim.bills);
    let mut choices = default_selections(&bills);
    for selection in selections {
        choices[selection.bill] = *selection;
    }

    let mut outcome = PaydayOutcome {
        met_minimums: true,
        all_full: true,
        ..PaydayOutcome::default()
    };
    let mut record = RepaymentRecord {
        had_bills: true,
        ..RepaymentRecord::default()
    };
    let mut payroll_bills = 0;
    let mut payroll_full = true;
    for (bill, choice) in bills.iter().zip(&choices) {
        let target = choice.amount.resolve(bill);
        let paid = fund(ctx, choice.source, target);
        if matches!(bill.kind, BillKind::Wages | BillKind::Rent) {
            payroll_bills += 1;
            payroll_full &= bill.is_full_payment(paid);
        }
        if paid + PAYMENT_TOLERANCE < target {
            ctx.log.neg(format!(
                "Only GBP {paid:.2} of GBP {target:.2} could be found for {}.",
                bill.label()
            ));
        } else if paid > 0.0 {
            ctx.log.info(format!(
                "Paid GBP {paid:.2} towards {} from {}.",
                bill.label(),
                choice.source
            ));
        }
        outcome.total_due += bill.full_due;
        outcome.minimum_due += bill.minimum_due;
        outcome.paid += paid;
        outcome.met_minimums &= bill.meets_minimum(paid);
        outcome.all_full &= bill.is_full_payment(paid);

        match bill.kind {
            BillKind::Supplier => settle_supplier(ctx, bill, paid),
            BillKind::Wages => settle_wages(ctx, bill, paid),
            BillKind::Rent | BillKind::SecurityUpkeep | BillKind::InnMaintenance => {
                settle_accrued(ctx, bill, paid)
            }
            BillKind::CreditLine(id) => record.any_line_missed |= settle_line(ctx, id, bill, paid),
            BillKind::LoanShark => record.shark_missed |= settle_shark(ctx, bill, paid),
        }
    }

    record.all_bills_full = outcome.all_full;
    credit::score_after_payday(ctx, record);
    outcome.debt_tier = debt::resolve_week(
        ctx,
        outcome.total_due,
        outcome.minimum_due,
        outcome.met_minimums,
    );
    milestones::after_payday(ctx, payroll_bills > 0 && payroll_full);
    Ok(outcome)
}
