use serde::{Deserialize, Serialize};

/// What a rival pub spent its week doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RivalStance {
    PriceWar,
    QualityPush,
    EventSpam,
    LayLow,
    ChaosRecovery,
}

impl RivalStance {
    pub const ALL: [RivalStance; 5] = [
        RivalStance::PriceWar,
        RivalStance::QualityPush,
        RivalStance::EventSpam,
        RivalStance::LayLow,
        RivalStance::ChaosRecovery,
    ];

    pub fn label(self) -> &'static str {
        match self {
            RivalStance::PriceWar => "price war",
            RivalStance::QualityPush => "quality push",
            RivalStance::EventSpam => "event spam",
            RivalStance::LayLow => "lay low",
            RivalStance::ChaosRecovery => "chaos recovery",
        }
    }
}

/// A competing pub. Traits run 0..=2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RivalPub {
    pub name: &'static str,
    pub price_aggression: u32,
    pub quality_focus: u32,
    pub chaos_tolerance: u32,
}

impl RivalPub {
    /// Roll weights in `RivalStance::ALL` order.
    pub(crate) fn stance_weights(&self) -> [u32; 5] {
        let price = self.price_aggression.min(2);
        let quality = self.quality_focus.min(2);
        let chaos = self.chaos_tolerance.min(2);
        [
            10 + price * 8 + (2 - quality) * 2,
            10 + quality * 8 + (2 - price) * 2,
            8 + (2 - chaos) * 6 + (price + quality) * 2,
            10 + chaos * 4 + (2 - price) * 3,
            6 + (2 - chaos) * 9,
        ]
    }
}

pub const DISTRICT_RIVALS: [RivalPub; 3] = [
    RivalPub {
        name: "The Copper Fox",
        price_aggression: 2,
        quality_focus: 1,
        chaos_tolerance: 1,
    },
    RivalPub {
        name: "Pearl Street Tap",
        price_aggression: 0,
        quality_focus: 2,
        chaos_tolerance: 2,
    },
    RivalPub {
        name: "North Lane Inn",
        price_aggression: 1,
        quality_focus: 1,
        chaos_tolerance: 0,
    },
];

/// Pressure from the rest of the district, recomputed every week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictState {
    /// This week's stance per rival, in district order.
    pub stances: Vec<RivalStance>,
    pub traffic: f64,
    /// Shifts arriving punters up or down a wealth tier.
    pub mix_bias: f64,
    /// Positive values sour the tone of new rumors.
    pub rumor_bias: f64,
}

impl Default for DistrictState {
    fn default() -> Self {
        Self {
            stances: Vec::new(),
            traffic: 1.0,
            mix_bias: 0.0,
            rumor_bias: 0.0,
        }
    }
}

impl DistrictState {
    pub fn count(&self, stance: RivalStance) -> u32 {
        self.stances.iter().filter(|s| **s == stance).count() as u32
    }

    /// Most common stance; ties go to the earlier one.
    pub fn dominant(&self) -> Option<RivalStance> {
        let mut best: Option<(RivalStance, u32)> = None;
        for stance in RivalStance::ALL {
            let count = self.count(stance);
            if count > 0 && best.is_none_or(|(_, n)| count > n) {
                best = Some((stance, count));
            }
        }
        best.map(|(stance, _)| stance)
    }

    pub(crate) fn apply(&mut self, stances: Vec<RivalStance>) {
        self.stances = stances;
        if self.stances.is_empty() {
            *self = Self::default();
            return;
        }
        let price_war = self.count(RivalStance::PriceWar) as f64;
        let quality = self.count(RivalStance::QualityPush) as f64;
        let events = self.count(RivalStance::EventSpam) as f64;
        let lay_low = self.count(RivalStance::LayLow) as f64;
        let recovery = self.count(RivalStance::ChaosRecovery) as f64;

        self.traffic =
            (1.0 - price_war * 0.03 - events * 0.02 + lay_low * 0.01 + recovery * 0.01)
                .clamp(0.90, 1.06);
        self.mix_bias = (quality * 0.06 - price_war * 0.05 - events * 0.03).clamp(-0.20, 0.20);
        self.rumor_bias =
            (price_war * 0.18 + events * 0.14 - quality * 0.12 - lay_low * 0.08).clamp(-0.50, 0.60);
    }

    pub fn summary(&self) -> String {
        format!(
            "traffic x{:.2} | mix bias {:+.2} | rumor bias {:+.2}",
            self.traffic, self.mix_bias, self.rumor_bias
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_price_war_district_squeezes_traffic() {
        let mut district = DistrictState::default();
        district.apply(vec![RivalStance::PriceWar; 3]);
        assert!((district.traffic - 0.91).abs() < 1e-9);
        assert!((district.mix_bias + 0.15).abs() < 1e-9);
        assert!((district.rumor_bias - 0.54).abs() < 1e-9);
        assert_eq!(district.dominant(), Some(RivalStance::PriceWar));
    }

    #[test]
    fn quiet_rivals_give_a_little_back() {
        let mut district = DistrictState::default();
        district.apply(vec![
            RivalStance::LayLow,
            RivalStance::ChaosRecovery,
            RivalStance::QualityPush,
        ]);
        assert!((district.traffic - 1.02).abs() < 1e-9);
        assert!((district.mix_bias - 0.06).abs() < 1e-9);
        assert!((district.rumor_bias + 0.20).abs() < 1e-9);
        // One each: the earliest stance wins the tie.
        assert_eq!(district.dominant(), Some(RivalStance::QualityPush));
    }

    #[test]
    fn no_rivals_means_no_pressure() {
        let mut district = DistrictState::default();
        district.apply(vec![RivalStance::EventSpam]);
        district.apply(Vec::new());
        assert_eq!(district, DistrictState::default());
        assert_eq!(district.dominant(), None);
    }

    #[test]
    fn weights_follow_the_rival_traits() {
        let fox = DISTRICT_RIVALS[0].stance_weights();
        assert_eq!(fox, [28, 18, 20, 14, 15]);
        let tap = DISTRICT_RIVALS[1].stance_weights();
        assert!(tap[1] > tap[0]);
    }
}
