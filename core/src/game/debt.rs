use serde::{Deserialize, Serialize};

use super::DEBT_TIER_MAX;

const BANKRUPT_NEGATIVE_REP_FLOOR: f64 = 1.45;
const BANKRUPT_POSITIVE_REP_CEILING: f64 = 0.55;
const BANKRUPT_SUPPLIER_TRUST_FLOOR: f64 = 1.40;
const BANKRUPT_MISCONDUCT_FLOOR: f64 = 1.80;

/// Maps a run of missed-minimum weeks onto the 0-4 spiral tier.
pub fn tier_for_streak(weeks_unpaid_minimum: u32) -> u8 {
    weeks_unpaid_minimum.min(DEBT_TIER_MAX as u32) as u8
}

/// Penalty multipliers that follow from the current tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DebtMultipliers {
    pub interest: f64,
    pub late_fee: f64,
    pub supplier_trust: f64,
    pub morale_decay: f64,
    pub misconduct: f64,
    pub negative_rep: f64,
    pub positive_rep: f64,
}

impl Default for DebtMultipliers {
    fn default() -> Self {
        Self::for_tier(0, false)
    }
}

impl DebtMultipliers {
    pub fn for_tier(tier: u8, bankrupt: bool) -> Self {
        let pick = |table: [f64; 5]| table[tier.min(DEBT_TIER_MAX) as usize];
        let mut multipliers = Self {
            interest: pick([1.0, 1.12, 1.22, 1.35, 1.50]),
            late_fee: pick([1.0, 1.10, 1.25, 1.45, 1.65]),
            supplier_trust: pick([1.0, 1.05, 1.12, 1.22, 1.35]),
            morale_decay: pick([1.0, 1.12, 1.25, 1.40, 1.60]),
            misconduct: pick([1.0, 1.12, 1.26, 1.45, 1.70]),
            negative_rep: pick([1.0, 1.10, 1.22, 1.35, 1.52]),
            positive_rep: pick([1.0, 0.95, 0.86, 0.76, 0.65]),
        };
        if bankrupt {
            multipliers.negative_rep = multipliers.negative_rep.max(BANKRUPT_NEGATIVE_REP_FLOOR);
            multipliers.positive_rep = multipliers.positive_rep.min(BANKRUPT_POSITIVE_REP_CEILING);
            multipliers.supplier_trust = multipliers.supplier_trust.max(BANKRUPT_SUPPLIER_TRUST_FLOOR);
            multipliers.misconduct = multipliers.misconduct.max(BANKRUPT_MISCONDUCT_FLOOR);
        }
        multipliers
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebtSpiral {
    weeks_unpaid_minimum: u32,
    tier: u8,
    multipliers: DebtMultipliers,
    pub bankrupt: bool,
    pub bailiff_stigma: bool,
    pub bailiff_visits: u32,
    pub met_minimums_last_week: bool,
    pub last_total_due: f64,
    pub last_minimum_due: f64,
}

impl DebtSpiral {
    pub fn weeks_unpaid_minimum(&self) -> u32 {
        self.weeks_unpaid_minimum
    }

    pub fn tier(&self) -> u8 {
        self.tier
    }

    pub fn multipliers(&self) -> DebtMultipliers {
        self.multipliers
    }

    /// Records one weekly resolution and refreshes the cached tier.
    pub(crate) fn record_week(&mut self, met_minimums: bool) -> u8 {
        self.met_minimums_last_week = met_minimums;
        if met_minimums {
            self.weeks_unpaid_minimum = 0;
        } else {
            self.weeks_unpaid_minimum += 1;
        }
        self.refresh();
        self.tier
    }

    pub(crate) fn refresh(&mut self) {
        self.tier = tier_for_streak(self.weeks_unpaid_minimum);
        self.multipliers = DebtMultipliers::for_tier(self.tier, self.bankrupt);
    }

    /// Bailiffs come at every boundary where the streak is past the threshold.
    pub fn bailiffs_due(&self) -> bool {
        self.weeks_unpaid_minimum > super::BAILIFF_STREAK_THRESHOLD
    }

    pub(crate) fn mark_bankrupt(&mut self) {
        self.bankrupt = true;
        self.weeks_unpaid_minimum = 0;
        self.met_minimums_last_week = true;
        self.refresh();
    }

    /// Weekly morale hit while the spiral is active.
    pub fn morale_hit(&self) -> f64 {
        if self.tier == 0 {
            return 0.0;
        }
        (self.tier as f64 * self.multipliers.morale_decay).round().max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_tracks_streak_and_resets() {
        let mut spiral = DebtSpiral::default();
        let tiers: Vec<u8> = (0..6).map(|_| spiral.record_week(false)).collect();
        assert_eq!(tiers, vec![1, 2, 3, 4, 4, 4]);
        assert_eq!(spiral.record_week(true), 0);
        assert_eq!(spiral.multipliers(), DebtMultipliers::for_tier(0, false));
    }

    #[test]
    fn tiers_are_monotonic() {
        let mut last = 0;
        for streak in 0..20 {
            let tier = tier_for_streak(streak);
            assert!(tier >= last);
            last = tier;
        }
        assert_eq!(tier_for_streak(0), 0);
        assert_eq!(tier_for_streak(4), 4);
    }

    #[test]
    fn bailiffs_need_more_than_three_weeks() {
        let mut spiral = DebtSpiral::default();
        for _ in 0..3 {
            spiral.record_week(false);
            assert!(!spiral.bailiffs_due());
        }
        spiral.record_week(false);
        assert!(spiral.bailiffs_due());
    }

    #[test]
    fn bankruptcy_hardens_reputation_bias() {
        let multipliers = DebtMultipliers::for_tier(0, true);
        assert_eq!(multipliers.negative_rep, 1.45);
        assert_eq!(multipliers.positive_rep, 0.55);
        assert_eq!(multipliers.misconduct, 1.80);
        assert_eq!(multipliers.interest, 1.0);
    }

    #[test]
    fn morale_hit_scales_with_tier() {
        let mut spiral = DebtSpiral::default();
        assert_eq!(spiral.morale_hit(), 0.0);
        spiral.record_week(false);
        assert_eq!(spiral.morale_hit(), 1.0);
        spiral.record_week(false);
        spiral.record_week(false);
        spiral.record_week(false);
        assert_eq!(spiral.morale_hit(), 6.0);
    }
}
