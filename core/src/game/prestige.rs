use serde::{Deserialize, Serialize};

pub const MAX_STARS: u8 = 5;

/// Diminishing returns by the star about to be earned.
const STAR_FACTORS: [f64; MAX_STARS as usize] = [1.00, 0.70, 0.50, 0.35, 0.25];

/// Permanent bonuses banked by prestige. They survive upgrade resets and bankruptcy.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LegacyBonuses {
    pub rack_capacity: u32,
    pub inn_rooms: u32,
    /// Added to a 1.0 traffic multiplier.
    pub traffic: f64,
    pub trade_credit: f64,
    pub security: i32,
    /// Added to a 1.0 serve-capacity multiplier.
    pub staff_efficiency: f64,
}

impl LegacyBonuses {
    pub(crate) fn add(&mut self, other: &LegacyBonuses) {
        self.rack_capacity += other.rack_capacity;
        self.inn_rooms += other.inn_rooms;
        self.traffic += other.traffic.max(0.0);
        self.trade_credit += other.trade_credit.max(0.0);
        self.security += other.security.max(0);
        self.staff_efficiency += other.staff_efficiency.max(0.0);
    }

    pub(crate) fn scaled(&self, factor: f64) -> Self {
        let factor = factor.max(0.0);
        let round = |v: f64| (v * factor).round().max(0.0);
        Self {
            rack_capacity: round(self.rack_capacity as f64) as u32,
            inn_rooms: round(self.inn_rooms as f64) as u32,
            traffic: self.traffic * factor,
            trade_credit: round(self.trade_credit),
            security: round(self.security as f64) as i32,
            staff_efficiency: self.staff_efficiency * factor,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rack_capacity == 0
            && self.inn_rooms == 0
            && self.traffic <= 1e-5
            && self.trade_credit <= 0.0
            && self.security <= 0
            && self.staff_efficiency <= 1e-5
    }

    pub fn traffic_multiplier(&self) -> f64 {
        1.0 + self.traffic.max(0.0)
    }

    pub fn summary(&self) -> String {
        format!(
            "rack +{}, inn rooms +{}, traffic +{:.1}%, trade credit +GBP {:.0}, security +{}, staff efficiency +{:.1}%",
            self.rack_capacity,
            self.inn_rooms,
            self.traffic * 100.0,
            self.trade_credit,
            self.security,
            self.staff_efficiency * 100.0
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrestigeState {
    pub stars: u8,
    pub legacy: LegacyBonuses,
    /// Week the current prestige run started.
    pub run_started_week: u32,
}

impl PrestigeState {
    pub fn is_maxed(&self) -> bool {
        self.stars >= MAX_STARS
    }

    pub fn next_star(&self) -> u8 {
        (self.stars + 1).min(MAX_STARS)
    }
}

pub fn star_factor(next_star: u8) -> f64 {
    match next_star {
        1..=MAX_STARS => STAR_FACTORS[next_star as usize - 1],
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_stars_bank_less() {
        assert_eq!(star_factor(1), 1.0);
        assert_eq!(star_factor(5), 0.25);
        assert_eq!(star_factor(0), 0.0);
        assert_eq!(star_factor(6), 0.0);
    }

    #[test]
    fn scaling_rounds_whole_bonuses() {
        let award = LegacyBonuses {
            rack_capacity: 10,
            inn_rooms: 3,
            traffic: 0.10,
            trade_credit: 120.0,
            security: 5,
            staff_efficiency: 0.05,
        };
        let half = award.scaled(0.5);
        assert_eq!(half.rack_capacity, 5);
        assert_eq!(half.inn_rooms, 2);
        assert_eq!(half.security, 3);
        assert!((half.traffic - 0.05).abs() < 1e-12);
        assert!(award.scaled(0.0).is_empty());
    }

    #[test]
    fn banked_bonuses_accumulate() {
        let mut legacy = LegacyBonuses::default();
        assert!(legacy.is_empty());
        let award = LegacyBonuses {
            security: 2,
            traffic: 0.04,
            ..LegacyBonuses::default()
        };
        legacy.add(&award);
        legacy.add(&award);
        assert_eq!(legacy.security, 4);
        assert!((legacy.traffic_multiplier() - 1.08).abs() < 1e-12);
    }
}
