use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

const REPORT_WINDOW: usize = 4;
const REVENUE_KINDS: usize = 5;
const COST_KINDS: usize = 14;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RevenueKind {
    Drinks,
    Food,
    Events,
    Rooms,
    Other,
}

impl RevenueKind {
    pub const ALL: [RevenueKind; REVENUE_KINDS] = [
        RevenueKind::Drinks,
        RevenueKind::Food,
        RevenueKind::Events,
        RevenueKind::Rooms,
        RevenueKind::Other,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            RevenueKind::Drinks => "Drinks",
            RevenueKind::Food => "Food",
            RevenueKind::Events => "Events",
            RevenueKind::Rooms => "Rooms",
            RevenueKind::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CostKind {
    Wages,
    Rent,
    Security,
    Supplies,
    Upgrades,
    Repairs,
    Refunds,
    Interest,
    LateFees,
    Operating,
    Bouncers,
    Inn,
    Seizure,
    Other,
}

impl CostKind {
    pub const ALL: [CostKind; COST_KINDS] = [
        CostKind::Wages,
        CostKind::Rent,
        CostKind::Security,
        CostKind::Supplies,
        CostKind::Upgrades,
        CostKind::Repairs,
        CostKind::Refunds,
        CostKind::Interest,
        CostKind::LateFees,
        CostKind::Operating,
        CostKind::Bouncers,
        CostKind::Inn,
        CostKind::Seizure,
        CostKind::Other,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            CostKind::Wages => "Wages",
            CostKind::Rent => "Rent",
            CostKind::Security => "Security",
            CostKind::Supplies => "Supplies",
            CostKind::Upgrades => "Upgrades",
            CostKind::Repairs => "Repairs",
            CostKind::Refunds => "Refunds",
            CostKind::Interest => "Interest",
            CostKind::LateFees => "Late fees",
            CostKind::Operating => "Operating",
            CostKind::Bouncers => "Bouncers",
            CostKind::Inn => "Inn",
            CostKind::Seizure => "Seizure",
            CostKind::Other => "Other",
        }
    }
}

/// Running totals for one accounting period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodTotals {
    revenue: [f64; REVENUE_KINDS],
    costs: [f64; COST_KINDS],
    pub sales: u32,
    pub events: u32,
    pub tips: f64,
}

impl PeriodTotals {
    pub fn revenue(&self) -> f64 {
        self.revenue.iter().sum()
    }

    pub fn revenue_of(&self, kind: RevenueKind) -> f64 {
        self.revenue[kind.index()]
    }

    pub fn costs(&self) -> f64 {
        self.costs.iter().sum()
    }

    pub fn cost_of(&self, kind: CostKind) -> f64 {
        self.costs[kind.index()]
    }

    pub fn profit(&self) -> f64 {
        self.revenue() - self.costs()
    }

    /// Non-zero cost lines, largest first.
    pub fn cost_breakdown(&self) -> Vec<(CostKind, f64)> {
        let mut lines: Vec<(CostKind, f64)> = CostKind::ALL
            .into_iter()
            .map(|kind| (kind, self.cost_of(kind)))
            .filter(|(_, amount)| *amount > 0.0)
            .collect();
        lines.sort_by(|a, b| b.1.total_cmp(&a.1));
        lines
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeekReport {
    pub week: u32,
    pub revenue: f64,
    pub costs: f64,
    pub profit: f64,
    pub sales: u32,
    pub events: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RollingReport {
    pub weeks: usize,
    pub revenue: f64,
    pub costs: f64,
    pub profit: f64,
    pub sales: u32,
    pub events: u32,
}

/// Cash on hand plus the books behind it. Cash never goes below zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    cash: f64,
    tonight: PeriodTotals,
    week: PeriodTotals,
    history: VecDeque<WeekReport>,
    cumulative_profit: f64,
    total_earned: f64,
}

impl Ledger {
    pub fn new(cash: f64) -> Self {
        Self {
            cash: cash.max(0.0),
            tonight: PeriodTotals::default(),
            week: PeriodTotals::default(),
            history: VecDeque::with_capacity(REPORT_WINDOW),
            cumulative_profit: 0.0,
            total_earned: 0.0,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn tonight(&self) -> &PeriodTotals {
        &self.tonight
    }

    pub fn week(&self) -> &PeriodTotals {
        &self.week
    }

    pub fn history(&self) -> impl Iterator<Item = &WeekReport> {
        self.history.iter()
    }

    pub fn cumulative_profit(&self) -> f64 {
        self.cumulative_profit
    }

    pub fn total_earned(&self) -> f64 {
        self.total_earned
    }

    pub fn can_afford(&self, amount: f64) -> bool {
        self.cash + 1e-9 >= amount
    }

    pub(crate) fn earn(&mut self, kind: RevenueKind, amount: f64) {
        if amount <= 0.0 {
            return;
        }
        self.cash += amount;
        self.total_earned += amount;
        self.tonight.revenue[kind.index()] += amount;
        self.week.revenue[kind.index()] += amount;
    }

    /// Books a cost whose money has already left, whether from cash or a credit line.
    pub(crate) fn book_cost(&mut self, kind: CostKind, amount: f64) {
        if amount <= 0.0 {
            return;
        }
        self.tonight.costs[kind.index()] += amount;
        self.week.costs[kind.index()] += amount;
    }

    /// Takes up to `amount` of cash and returns what was taken.
    pub(crate) fn withdraw(&mut self, amount: f64) -> f64 {
        let taken = amount.max(0.0).min(self.cash);
        self.cash -= taken;
        if self.cash < 1e-9 {
            self.cash = 0.0;
        }
        taken
    }

    /// Cash movements that are neither revenue nor cost, such as credit draws.
    pub(crate) fn deposit(&mut self, amount: f64) {
        if amount > 0.0 {
            self.cash += amount;
        }
    }

    pub(crate) fn record_sale(&mut self) {
        self.tonight.sales += 1;
        self.week.sales += 1;
    }

    pub(crate) fn record_event(&mut self) {
        self.tonight.events += 1;
        self.week.events += 1;
    }

    /// Tips are collected into the till but held for staff until payday.
    pub(crate) fn record_tip(&mut self, amount: f64) {
        if amount <= 0.0 {
            return;
        }
        self.cash += amount;
        self.tonight.tips += amount;
        self.week.tips += amount;
    }

    pub(crate) fn reset_tonight(&mut self) {
        self.tonight = PeriodTotals::default();
    }

    /// Closes the books for the week and returns its report.
    pub(crate) fn close_week(&mut self, week: u32) -> WeekReport {
        let report = WeekReport {
            week,
            revenue: self.week.revenue(),
            costs: self.week.costs(),
            profit: self.week.profit(),
            sales: self.week.sales,
            events: self.week.events,
        };
        self.cumulative_profit += report.profit;
        if self.history.len() == REPORT_WINDOW {
            self.history.pop_front();
        }
        self.history.push_back(report.clone());
        self.week = PeriodTotals::default();
        report
    }

    pub fn rolling(&self) -> RollingReport {
        self.history.iter().fold(
            RollingReport {
                weeks: self.history.len(),
                ..RollingReport::default()
            },
            |mut acc, report| {
                acc.revenue += report.revenue;
                acc.costs += report.costs;
                acc.profit += report.profit;
                acc.sales += report.sales;
                acc.events += report.events;
                acc
            },
        )
    }

    pub(crate) fn reset_progression(&mut self) {
        self.cumulative_profit = 0.0;
    }
}
