use serde::{Deserialize, Serialize};

use super::{
    CREDIT_MIN_PAYMENT, CREDIT_MIN_PAYMENT_RATE, CREDIT_SCORE_MAX, CREDIT_SCORE_MIN,
    PENALTY_RECOVERY_FULL_PAYS, PENALTY_RECOVERY_LADDER, SHARK_MIN_PAYMENT,
    SHARK_MIN_PAYMENT_RATE, SUPPLIER_BASE_APR, WEEKS_PER_YEAR,
};

/// Shared penalty-APR bookkeeping for every kind of account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PenaltyTrack {
    pub penalty_apr: f64,
    pub consecutive_full_pays: u32,
    pub recovery_stage: u32,
    pub missed: u32,
    pub on_time: u32,
}

impl PenaltyTrack {
    pub(crate) fn add_penalty(&mut self, step: f64, cap: f64) {
        self.penalty_apr = (self.penalty_apr + step).min(cap);
        self.consecutive_full_pays = 0;
    }

    pub(crate) fn mark_missed(&mut self) {
        self.missed += 1;
        self.on_time = 0;
    }

    pub(crate) fn mark_on_time(&mut self) {
        self.on_time += 1;
        self.missed = 0;
    }

    /// Three full payments in a row walk the penalty back one rung; the last rung clears it.
    pub(crate) fn record_full_payment(&mut self) {
        self.consecutive_full_pays += 1;
        if self.consecutive_full_pays < PENALTY_RECOVERY_FULL_PAYS {
            return;
        }
        match PENALTY_RECOVERY_LADDER.get(self.recovery_stage as usize) {
            Some(factor) => {
                self.penalty_apr *= factor;
                self.recovery_stage += 1;
            }
            None => {
                self.penalty_apr = 0.0;
                self.recovery_stage = 0;
            }
        }
        self.consecutive_full_pays = 0;
    }

    pub(crate) fn reset_full_pay_streak(&mut self) {
        self.consecutive_full_pays = 0;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditLine {
    pub id: u32,
    pub bank_id: String,
    pub lender: String,
    pub limit: f64,
    pub balance: f64,
    pub apr: f64,
    pub weekly_payment: f64,
    pub enabled: bool,
    pub track: PenaltyTrack,
}

impl CreditLine {
    pub fn new(id: u32, bank_id: &str, lender: &str, limit: f64, apr: f64) -> Self {
        Self {
            id,
            bank_id: bank_id.to_string(),
            lender: lender.to_string(),
            limit: limit.max(0.0),
            balance: 0.0,
            apr,
            weekly_payment: 0.0,
            enabled: true,
            track: PenaltyTrack::default(),
        }
    }

    pub fn available(&self) -> f64 {
        if !self.enabled {
            return 0.0;
        }
        (self.limit - self.balance).max(0.0)
    }

    /// Draws up to the remaining limit and returns the amount drawn.
    pub(crate) fn draw(&mut self, amount: f64) -> f64 {
        let drawn = amount.max(0.0).min(self.available());
        self.balance += drawn;
        self.recompute_payment();
        drawn
    }

    /// Interest or fees are the only way the balance may exceed the limit.
    pub(crate) fn add_charge(&mut self, amount: f64) {
        self.balance += amount.max(0.0);
        self.recompute_payment();
    }

    pub(crate) fn repay(&mut self, amount: f64) -> f64 {
        let paid = amount.max(0.0).min(self.balance);
        self.balance -= paid;
        if self.balance < 0.005 {
            self.balance = 0.0;
        }
        self.recompute_payment();
        paid
    }

    pub fn weekly_interest(&self, multiplier: f64) -> f64 {
        if self.balance <= 0.0 {
            return 0.0;
        }
        self.balance * (self.apr + self.track.penalty_apr) / WEEKS_PER_YEAR * multiplier
    }

    pub(crate) fn accrue_weekly_interest(&mut self, multiplier: f64) -> f64 {
        let interest = self.weekly_interest(multiplier);
        self.add_charge(interest);
        interest
    }

    pub fn minimum_due(&self) -> f64 {
        if self.balance <= 0.0 {
            0.0
        } else {
            CREDIT_MIN_PAYMENT.max(self.balance * CREDIT_MIN_PAYMENT_RATE).min(self.balance)
        }
    }

    pub(crate) fn recompute_payment(&mut self) {
        self.weekly_payment = self.minimum_due();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanShark {
    pub balance: f64,
    pub apr: f64,
    pub track: PenaltyTrack,
}

impl LoanShark {
    pub fn minimum_due(&self) -> f64 {
        if self.balance <= 0.0 {
            0.0
        } else {
            SHARK_MIN_PAYMENT
                .max(self.balance * SHARK_MIN_PAYMENT_RATE)
                .min(self.balance)
        }
    }

    pub(crate) fn accrue_weekly_interest(&mut self, multiplier: f64) -> f64 {
        if self.balance <= 0.0 {
            return 0.0;
        }
        let interest =
            self.balance * (self.apr + self.track.penalty_apr) / WEEKS_PER_YEAR * multiplier;
        self.balance += interest;
        interest
    }

    pub(crate) fn repay(&mut self, amount: f64) -> f64 {
        let paid = amount.max(0.0).min(self.balance);
        self.balance -= paid;
        if self.balance < 0.005 {
            self.balance = 0.0;
        }
        paid
    }
}

/// Invoice credit extended by the drinks and food suppliers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierCredit {
    pub balance: f64,
    pub base_cap: f64,
    pub cap_override: Option<f64>,
    pub trust_penalty: f64,
    pub late_fees_this_week: f64,
    pub track: PenaltyTrack,
}

impl SupplierCredit {
    pub fn new(base_cap: f64) -> Self {
        Self {
            balance: 0.0,
            base_cap,
            cap_override: None,
            trust_penalty: 0.0,
            late_fees_this_week: 0.0,
            track: PenaltyTrack::default(),
        }
    }

    pub fn cap(&self) -> f64 {
        match self.cap_override {
            Some(cap) => cap,
            None => self.base_cap * (1.0 - self.trust_penalty).max(0.3),
        }
    }

    pub fn available(&self) -> f64 {
        (self.cap() - self.balance).max(0.0)
    }

    /// Price multiplier suppliers charge a business they no longer trust.
    pub fn price_multiplier(&self, debt_trust_multiplier: f64) -> f64 {
        (1.0 + self.trust_penalty) * debt_trust_multiplier
    }

    pub fn minimum_due(&self) -> f64 {
        if self.balance <= 0.0 {
            0.0
        } else {
            10.0_f64.max(self.balance * 0.10).min(self.balance)
        }
    }

    pub(crate) fn accrue_weekly_interest(&mut self, multiplier: f64) -> f64 {
        if self.balance <= 0.0 {
            return 0.0;
        }
        let interest =
            self.balance * (SUPPLIER_BASE_APR + self.track.penalty_apr) / WEEKS_PER_YEAR * multiplier;
        self.balance += interest;
        interest
    }

    pub(crate) fn charge(&mut self, amount: f64) -> f64 {
        let charged = amount.max(0.0).min(self.available());
        self.balance += charged;
        charged
    }

    pub(crate) fn repay(&mut self, amount: f64) -> f64 {
        let paid = amount.max(0.0).min(self.balance);
        self.balance -= paid;
        if self.balance < 0.005 {
            self.balance = 0.0;
        }
        paid
    }

    pub(crate) fn adjust_trust_penalty(&mut self, delta: f64) {
        self.trust_penalty = (self.trust_penalty + delta).clamp(0.0, super::SUPPLIER_TRUST_PENALTY_MAX);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditBook {
    pub lines: Vec<CreditLine>,
    pub shark: Option<LoanShark>,
    pub supplier: SupplierCredit,
    pub score: i32,
    pub banks_locked: bool,
    pub bankruptcy_lock_weeks: u32,
    pub lines_opened_this_week: u32,
    pub debt_free_weeks: u32,
    pub shark_apr_bonus: f64,
    pub shark_penalty_bonus: f64,
    next_line_id: u32,
}

impl CreditBook {
    pub fn new(score: i32, supplier_cap: f64) -> Self {
        Self {
            lines: Vec::new(),
            shark: None,
            supplier: SupplierCredit::new(supplier_cap),
            score: clamp_score(score),
            banks_locked: false,
            bankruptcy_lock_weeks: 0,
            lines_opened_this_week: 0,
            debt_free_weeks: 0,
            shark_apr_bonus: 0.0,
            shark_penalty_bonus: 0.0,
            next_line_id: 1,
        }
    }

    pub(crate) fn allocate_line_id(&mut self) -> u32 {
        let id = self.next_line_id.max(1);
        self.next_line_id = id + 1;
        id
    }

    pub fn line(&self, id: u32) -> Option<&CreditLine> {
        self.lines.iter().find(|l| l.id == id)
    }

    pub(crate) fn line_mut(&mut self, id: u32) -> Option<&mut CreditLine> {
        self.lines.iter_mut().find(|l| l.id == id)
    }

    pub fn has_bank(&self, bank_id: &str) -> bool {
        self.lines.iter().any(|l| l.bank_id == bank_id)
    }

    /// First enabled line able to cover `amount` in full.
    pub(crate) fn line_covering(&mut self, amount: f64) -> Option<&mut CreditLine> {
        self.lines
            .iter_mut()
            .find(|l| l.enabled && l.available() + 1e-9 >= amount)
    }

    pub fn lines_balance(&self) -> f64 {
        self.lines.iter().map(|l| l.balance).sum()
    }

    pub fn total_limit(&self) -> f64 {
        self.lines.iter().map(|l| l.limit).sum()
    }

    pub fn shark_balance(&self) -> f64 {
        self.shark.as_ref().map(|s| s.balance).unwrap_or(0.0)
    }

    pub fn total_debt(&self) -> f64 {
        self.lines_balance() + self.shark_balance() + self.supplier.balance
    }

    pub fn utilisation(&self) -> f64 {
        let limit = self.total_limit();
        if limit <= 0.0 {
            0.0
        } else {
            self.lines_balance() / limit
        }
    }

    pub fn is_bank_credit_locked(&self) -> bool {
        self.banks_locked || self.bankruptcy_lock_weeks > 0
    }

    /// A bankrupt score stays at 0 until the lock runs out.
    pub(crate) fn adjust_score(&mut self, delta: i32) {
        if self.score == 0 && self.bankruptcy_lock_weeks > 0 {
            return;
        }
        self.score = clamp_score(self.score + delta);
    }
}

/// Scores live in [300, 850]; a bankrupt business sits at 0 until it recovers.
pub(crate) fn clamp_score(score: i32) -> i32 {
    if score <= 0 {
        0
    } else {
        score.clamp(CREDIT_SCORE_MIN, CREDIT_SCORE_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weekly_interest_matches_apr() {
        let mut line = CreditLine::new(1, "townland", "Townland", 2000.0, 0.20);
        line.draw(1000.0);
        let interest = line.accrue_weekly_interest(1.0);
        assert!((interest - 1000.0 * 0.20 / 52.0).abs() < 1e-9);
        assert!((interest - 3.85).abs() < 0.01);
    }

    #[test]
    fn draws_never_exceed_the_limit() {
        let mut line = CreditLine::new(1, "townland", "Townland", 500.0, 0.08);
        assert_eq!(line.draw(400.0), 400.0);
        assert_eq!(line.draw(400.0), 100.0);
        assert_eq!(line.balance, 500.0);
        line.accrue_weekly_interest(1.0);
        assert!(line.balance > line.limit);
        assert_eq!(line.draw(10.0), 0.0);
    }

    #[test]
    fn minimum_payment_has_a_floor() {
        let mut line = CreditLine::new(1, "townland", "Townland", 5000.0, 0.08);
        line.draw(100.0);
        assert_eq!(line.minimum_due(), 25.0);
        line.draw(900.0);
        assert_eq!(line.minimum_due(), 50.0);
        assert_eq!(line.weekly_payment, 50.0);
    }

    #[test]
    fn penalty_recovers_over_four_stages() {
        let mut track = PenaltyTrack::default();
        track.add_penalty(0.10, 0.25);
        for _ in 0..9 {
            track.record_full_payment();
        }
        assert!((track.penalty_apr - 0.10 * 0.5 * 0.7 * 0.8).abs() < 1e-12);
        for _ in 0..3 {
            track.record_full_payment();
        }
        assert_eq!(track.penalty_apr, 0.0);
        assert_eq!(track.recovery_stage, 0);
    }

    #[test]
    fn scores_are_clamped() {
        assert_eq!(clamp_score(900), 850);
        assert_eq!(clamp_score(120), 300);
        assert_eq!(clamp_score(-50), 0);
    }
}
