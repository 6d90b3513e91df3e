use serde::{Deserialize, Serialize};

/// Regulars everyone in the pub knows by name.
pub const VIP_NAMES: [&str; 3] = ["Big Dave", "Maureen", "Old Tom"];

const LOYALTY_MAX: u8 = 100;
const ADVOCATE_DEMAND_MAX: f64 = 1.35;
const RUMOR_SHIELD_MAX: f64 = 0.20;
const RUMOR_SHIELD_STEP: f64 = 0.02;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VipArchetype {
    SocialButterfly,
    Connoisseur,
    ValueSeeker,
    NightOwl,
}

impl VipArchetype {
    const ALL: [VipArchetype; 4] = [
        VipArchetype::SocialButterfly,
        VipArchetype::Connoisseur,
        VipArchetype::ValueSeeker,
        VipArchetype::NightOwl,
    ];

    pub fn label(self) -> &'static str {
        match self {
            VipArchetype::SocialButterfly => "social butterfly",
            VipArchetype::Connoisseur => "connoisseur",
            VipArchetype::ValueSeeker => "value seeker",
            VipArchetype::NightOwl => "night owl",
        }
    }

    fn tastes(self) -> &'static [VipTaste] {
        match self {
            VipArchetype::SocialButterfly => &[VipTaste::Service, VipTaste::Events, VipTaste::Calm],
            VipArchetype::Connoisseur => &[VipTaste::Quality, VipTaste::Service, VipTaste::Calm],
            VipArchetype::ValueSeeker => &[VipTaste::Value, VipTaste::Service],
            VipArchetype::NightOwl => &[VipTaste::Events, VipTaste::Value, VipTaste::Calm],
        }
    }

    /// Refunds past `tolerance / 20` in a night cost a point of loyalty.
    fn tolerance(self) -> u32 {
        match self {
            VipArchetype::SocialButterfly => 45,
            VipArchetype::Connoisseur => 35,
            VipArchetype::ValueSeeker => 50,
            VipArchetype::NightOwl => 40,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VipTaste {
    Service,
    Value,
    Calm,
    Events,
    Quality,
}

/// Where a regular's relationship with the pub stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArcStage {
    Backlash,
    Disgruntled,
    Annoyed,
    Neutral,
    Warming,
    Loyal,
    Advocate,
}

impl ArcStage {
    pub fn from_loyalty(loyalty: u8) -> Self {
        match loyalty {
            85.. => ArcStage::Advocate,
            65..=84 => ArcStage::Loyal,
            50..=64 => ArcStage::Warming,
            0..=15 => ArcStage::Backlash,
            16..=30 => ArcStage::Disgruntled,
            31..=45 => ArcStage::Annoyed,
            _ => ArcStage::Neutral,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ArcStage::Backlash => "backlash",
            ArcStage::Disgruntled => "disgruntled",
            ArcStage::Annoyed => "annoyed",
            ArcStage::Neutral => "neutral",
            ArcStage::Warming => "warming",
            ArcStage::Loyal => "loyal",
            ArcStage::Advocate => "advocate",
        }
    }
}

/// The parts of a night a regular notices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct NightOutcome {
    pub unserved: u32,
    pub fights: u32,
    pub events: u32,
    pub refunds: u32,
    pub price_multiplier: f64,
    pub food_quality: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VipRegular {
    pub name: String,
    pub archetype: VipArchetype,
    pub loyalty: u8,
    pub stage: ArcStage,
    /// Advocate and backlash each fire once per regular.
    pub advocated: bool,
    pub turned: bool,
}

impl VipRegular {
    /// Archetype and starting loyalty come from the name, so a roster never needs the RNG.
    pub(crate) fn named(name: &str) -> Self {
        let seed: u32 = name.bytes().map(u32::from).sum();
        let archetype = VipArchetype::ALL[(seed % 4) as usize];
        let loyalty = 40 + (seed % 11) as u8;
        Self {
            name: name.to_string(),
            archetype,
            loyalty,
            stage: ArcStage::from_loyalty(loyalty),
            advocated: false,
            turned: false,
        }
    }

    pub(crate) fn loyalty_delta(&self, night: &NightOutcome) -> i32 {
        let mut delta = 0;
        for taste in self.archetype.tastes() {
            delta += match taste {
                VipTaste::Service if night.unserved <= 1 => 2,
                VipTaste::Service => -2,
                VipTaste::Value if night.price_multiplier <= 1.10 => 1,
                VipTaste::Value => -1,
                VipTaste::Calm if night.fights == 0 => 1,
                VipTaste::Calm => -2,
                VipTaste::Events if night.events > 0 => 1,
                VipTaste::Events => 0,
                VipTaste::Quality if night.food_quality >= 0.6 => 1,
                VipTaste::Quality => -1,
            };
        }
        if night.refunds > self.archetype.tolerance() / 20 {
            delta -= 1;
        }
        delta.clamp(-5, 5)
    }

    /// Applies a night's delta. Returns a stage that fires for the first time.
    pub(crate) fn react(&mut self, night: &NightOutcome) -> Option<ArcStage> {
        let before = self.stage;
        let loyalty = (self.loyalty as i32 + self.loyalty_delta(night)).clamp(0, LOYALTY_MAX as i32);
        self.loyalty = loyalty as u8;
        self.stage = ArcStage::from_loyalty(self.loyalty);
        if self.stage == before {
            return None;
        }
        match self.stage {
            ArcStage::Advocate if !self.advocated => {
                self.advocated = true;
                Some(ArcStage::Advocate)
            }
            ArcStage::Backlash if !self.turned => {
                self.turned = true;
                Some(ArcStage::Backlash)
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VipState {
    pub regulars: Vec<VipRegular>,
    /// Traffic multiplier built up by advocates.
    pub demand_boost: f64,
    /// Taken off the nightly rumor chance.
    pub rumor_shield: f64,
}

impl Default for VipState {
    fn default() -> Self {
        Self {
            regulars: Vec::new(),
            demand_boost: 1.0,
            rumor_shield: 0.0,
        }
    }
}

impl VipState {
    pub(crate) fn advocate(&mut self) {
        self.demand_boost = (self.demand_boost * 1.05).clamp(1.0, ADVOCATE_DEMAND_MAX);
        self.rumor_shield = (self.rumor_shield + RUMOR_SHIELD_STEP).clamp(0.0, RUMOR_SHIELD_MAX);
    }

    pub(crate) fn backlash(&mut self) {
        self.rumor_shield = (self.rumor_shield - RUMOR_SHIELD_STEP).clamp(0.0, RUMOR_SHIELD_MAX);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn night(unserved: u32, fights: u32) -> NightOutcome {
        NightOutcome {
            unserved,
            fights,
            events: 0,
            refunds: 0,
            price_multiplier: 1.0,
            food_quality: 0.8,
        }
    }

    #[test]
    fn stages_follow_loyalty() {
        assert_eq!(ArcStage::from_loyalty(100), ArcStage::Advocate);
        assert_eq!(ArcStage::from_loyalty(70), ArcStage::Loyal);
        assert_eq!(ArcStage::from_loyalty(47), ArcStage::Neutral);
        assert_eq!(ArcStage::from_loyalty(40), ArcStage::Annoyed);
        assert_eq!(ArcStage::from_loyalty(20), ArcStage::Disgruntled);
        assert_eq!(ArcStage::from_loyalty(3), ArcStage::Backlash);
    }

    #[test]
    fn the_same_name_makes_the_same_regular() {
        let a = VipRegular::named("Maureen");
        assert_eq!(a, VipRegular::named("Maureen"));
        assert!((40..=50).contains(&a.loyalty));
    }

    #[test]
    fn a_connoisseur_hates_a_brawl_over_cold_food() {
        let mut vip = VipRegular::named("x");
        vip.archetype = VipArchetype::Connoisseur;
        assert_eq!(vip.loyalty_delta(&night(0, 0)), 4);
        let rough = NightOutcome {
            food_quality: 0.3,
            refunds: 3,
            ..night(4, 2)
        };
        assert_eq!(vip.loyalty_delta(&rough), -5);
    }

    #[test]
    fn advocacy_fires_once() {
        let mut vip = VipRegular::named("Old Tom");
        vip.archetype = VipArchetype::SocialButterfly;
        vip.loyalty = 83;
        vip.stage = ArcStage::from_loyalty(83);
        assert_eq!(vip.react(&night(0, 0)), Some(ArcStage::Advocate));
        vip.loyalty = 84;
        vip.stage = ArcStage::Loyal;
        assert_eq!(vip.react(&night(0, 0)), None);
        assert_eq!(vip.stage, ArcStage::Advocate);
    }

    #[test]
    fn boosts_stay_capped() {
        let mut state = VipState::default();
        for _ in 0..20 {
            state.advocate();
        }
        assert_eq!(state.demand_boost, 1.35);
        assert_eq!(state.rumor_shield, 0.20);
        state.backlash();
        assert!((state.rumor_shield - 0.18).abs() < 1e-9);
    }
}
