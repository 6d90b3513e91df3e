use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Milestone {
    OpenForBusiness,
    NoEmptyShelves,
    NoOneLeavesAngry,
    PayrollGuardian,
    CalmHouse,
    MarginWithManners,
    CrewThatStays,
    OrderRestored,
    DebtDiet,
    BalancedBooks,
    GoldenQuarter,
    Stormproof,
}

impl Milestone {
    pub const ALL: [Milestone; 12] = [
        Milestone::OpenForBusiness,
        Milestone::NoEmptyShelves,
        Milestone::NoOneLeavesAngry,
        Milestone::PayrollGuardian,
        Milestone::CalmHouse,
        Milestone::MarginWithManners,
        Milestone::CrewThatStays,
        Milestone::OrderRestored,
        Milestone::DebtDiet,
        Milestone::BalancedBooks,
        Milestone::GoldenQuarter,
        Milestone::Stormproof,
    ];

    pub fn tier(self) -> u8 {
        match self {
            Milestone::OpenForBusiness
            | Milestone::NoEmptyShelves
            | Milestone::NoOneLeavesAngry
            | Milestone::PayrollGuardian => 1,
            Milestone::CalmHouse
            | Milestone::MarginWithManners
            | Milestone::CrewThatStays
            | Milestone::OrderRestored => 2,
            Milestone::DebtDiet | Milestone::BalancedBooks => 3,
            Milestone::GoldenQuarter | Milestone::Stormproof => 4,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Milestone::OpenForBusiness => "Open For Business",
            Milestone::NoEmptyShelves => "No Empty Shelves",
            Milestone::NoOneLeavesAngry => "No One Leaves Angry",
            Milestone::PayrollGuardian => "Payroll Guardian",
            Milestone::CalmHouse => "Calm House",
            Milestone::MarginWithManners => "Margin With Manners",
            Milestone::CrewThatStays => "Crew That Stays",
            Milestone::OrderRestored => "Order Restored",
            Milestone::DebtDiet => "Debt Diet",
            Milestone::BalancedBooks => "Balanced Books, Busy House",
            Milestone::GoldenQuarter => "Golden Quarter",
            Milestone::Stormproof => "Stormproof Operator",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Milestone::OpenForBusiness => "Close three nights with the licence intact.",
            Milestone::NoEmptyShelves => "Two nights in a row without running dry.",
            Milestone::NoOneLeavesAngry => "A trading night with no refunds and nobody unserved.",
            Milestone::PayrollGuardian => "Pay the wages and rent in full on payday.",
            Milestone::CalmHouse => "Three calm nights in a row with a themed night among them.",
            Milestone::MarginWithManners => "Average price of 1.15x or more in a week that gained reputation.",
            Milestone::CrewThatStays => "Two weeks without a departure and team morale of 65 or more.",
            Milestone::OrderRestored => "Bring chaos from 60 down to 25 within two nights.",
            Milestone::DebtDiet => "End three weeks in a row owing the banks nothing.",
            Milestone::BalancedBooks => "Profit GBP 250 in a week while paying real wages and security.",
            Milestone::GoldenQuarter => "Four profitable weeks in a row at reputation 45 or more.",
            Milestone::Stormproof => "A profitable week with reputation gained through three or more bad events.",
        }
    }
}

/// Streaks and flags the milestone checks read, plus what has been earned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MilestoneTracker {
    /// Earned since the last prestige.
    pub achieved: Vec<Milestone>,
    /// Earned over the whole run, prestige included.
    pub lifetime: u32,
    pub nights_closed: u32,
    pub clean_shelf_nights: u32,
    pub calm_nights: u32,
    pub calm_with_activity: bool,
    /// Nights left to pull chaos back down after a high-chaos close.
    pub chaos_recovery: Option<u32>,
    pub steady_crew_weeks: u32,
    pub debt_free_weeks: u32,
    pub strong_weeks: u32,
}

impl MilestoneTracker {
    pub fn has(&self, milestone: Milestone) -> bool {
        self.achieved.contains(&milestone)
    }

    pub fn count(&self) -> usize {
        self.achieved.len()
    }

    /// Earned set cleared for the next prestige run. Streaks carry on.
    pub(crate) fn reset_run(&mut self) {
        self.achieved.clear();
    }
}
