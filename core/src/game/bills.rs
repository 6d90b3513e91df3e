use std::fmt;

use serde::{Deserialize, Serialize};

use super::PAYMENT_TOLERANCE;

/// What a payday bill settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BillKind {
    Supplier,
    Wages,
    Rent,
    SecurityUpkeep,
    InnMaintenance,
    CreditLine(u32),
    LoanShark,
}

impl BillKind {
    pub fn label(self) -> String {
        match self {
            BillKind::Supplier => "Supplier credit".to_string(),
            BillKind::Wages => "Wages + tips".to_string(),
            BillKind::Rent => "Rent".to_string(),
            BillKind::SecurityUpkeep => "Security upkeep".to_string(),
            BillKind::InnMaintenance => "Inn maintenance".to_string(),
            BillKind::CreditLine(id) => format!("Credit line #{id}"),
            BillKind::LoanShark => "Loan shark".to_string(),
        }
    }
}

/// Where the money for a payment comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FundingSource {
    #[default]
    Cash,
    CreditLine(u32),
}

impl fmt::Display for FundingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FundingSource::Cash => f.write_str("cash"),
            FundingSource::CreditLine(id) => write!(f, "credit line #{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaydayBill {
    pub kind: BillKind,
    pub minimum_due: f64,
    pub full_due: f64,
}

impl PaydayBill {
    pub fn new(kind: BillKind, minimum_due: f64, full_due: f64) -> Self {
        let full_due = full_due.max(0.0);
        Self {
            kind,
            minimum_due: minimum_due.clamp(0.0, full_due),
            full_due,
        }
    }

    pub fn label(&self) -> String {
        self.kind.label()
    }

    pub fn is_full_payment(&self, paid: f64) -> bool {
        paid + PAYMENT_TOLERANCE >= self.full_due
    }

    pub fn meets_minimum(&self, paid: f64) -> bool {
        paid + PAYMENT_TOLERANCE >= self.minimum_due
    }
}

/// How much of a bill to pay.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum PaymentAmount {
    #[default]
    Minimum,
    Full,
    Custom(f64),
    Skip,
}

impl PaymentAmount {
    pub(crate) fn resolve(self, bill: &PaydayBill) -> f64 {
        match self {
            PaymentAmount::Minimum => bill.minimum_due,
            PaymentAmount::Full => bill.full_due,
            PaymentAmount::Custom(amount) => amount.clamp(0.0, bill.full_due),
            PaymentAmount::Skip => 0.0,
        }
    }
}

/// The player's choice for one pending bill, addressed by its position in the list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BillSelection {
    pub bill: usize,
    pub amount: PaymentAmount,
    pub source: FundingSource,
}

impl BillSelection {
    pub fn new(bill: usize, amount: PaymentAmount, source: FundingSource) -> Self {
        Self {
            bill,
            amount,
            source,
        }
    }
}

/// Result of settling a week's bills.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PaydayOutcome {
    pub total_due: f64,
    pub minimum_due: f64,
    pub paid: f64,
    pub met_minimums: bool,
    pub all_full: bool,
    pub debt_tier: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimum_never_exceeds_full() {
        let bill = PaydayBill::new(BillKind::Supplier, 80.0, 50.0);
        assert_eq!(bill.minimum_due, 50.0);
        assert!(bill.is_full_payment(49.995));
        assert!(!bill.meets_minimum(40.0));
    }

    #[test]
    fn custom_amounts_are_clamped_to_the_bill() {
        let bill = PaydayBill::new(BillKind::Rent, 10.0, 30.0);
        assert_eq!(PaymentAmount::Custom(100.0).resolve(&bill), 30.0);
        assert_eq!(PaymentAmount::Custom(-5.0).resolve(&bill), 0.0);
        assert_eq!(PaymentAmount::Skip.resolve(&bill), 0.0);
        assert_eq!(PaymentAmount::Minimum.resolve(&bill), 10.0);
    }

    #[test]
    fn labels_name_the_line() {
        assert_eq!(BillKind::CreditLine(3).label(), "Credit line #3");
        assert_eq!(FundingSource::CreditLine(2).to_string(), "credit line #2");
    }
}
