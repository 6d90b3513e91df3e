use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

const IDENTITY_RANGE: f64 = 10.0;
const ALIGN_CHANCE_BOOST: f64 = 0.08;
const BALANCED_OUTCOME_BONUS: f64 = 0.20;
const ALIGNED_OUTCOME_BONUS: f64 = 0.12;
const MISALIGNED_PENALTY: f64 = 0.06;
pub const MAX_ACTION_TIER: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Classy,
    Balanced,
    Shady,
}

impl ActionCategory {
    pub fn label(self) -> &'static str {
        match self {
            ActionCategory::Classy => "classy",
            ActionCategory::Balanced => "balanced",
            ActionCategory::Shady => "shady",
        }
    }

    /// How far a resolved action pushes the landlord's reputation for style.
    pub fn landlord_shift(self, success: bool) -> f64 {
        match (self, success) {
            (ActionCategory::Classy, true) => 0.8,
            (ActionCategory::Classy, false) => 0.3,
            (ActionCategory::Shady, true) => -0.8,
            (ActionCategory::Shady, false) => -0.3,
            (ActionCategory::Balanced, true) => 0.35,
            (ActionCategory::Balanced, false) => -0.35,
        }
    }
}

/// Inclusive outcome ranges. Bounds may be given in either order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionRange {
    pub rep: (i32, i32),
    pub morale: (i32, i32),
    pub traffic: (f64, f64),
    pub chaos: (f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub tier: u8,
    pub category: ActionCategory,
    pub base_chance: f64,
    pub cooldown_rounds: u32,
    pub success: ActionRange,
    pub failure: ActionRange,
    #[serde(default = "ActionDef::default_duration")]
    pub success_rounds: u32,
    #[serde(default = "ActionDef::default_duration")]
    pub failure_rounds: u32,
}

impl ActionDef {
    fn default_duration() -> u32 {
        2
    }

    /// Success chance after the landlord's style leans towards or away from this action.
    pub fn chance(&self, landlord_score: f64) -> f64 {
        let factor = (landlord_score / IDENTITY_RANGE).clamp(-1.0, 1.0);
        let base = match self.category {
            ActionCategory::Classy => self.base_chance + ALIGN_CHANCE_BOOST * factor,
            ActionCategory::Shady => self.base_chance - ALIGN_CHANCE_BOOST * factor,
            ActionCategory::Balanced => self.base_chance,
        };
        base.clamp(0.05, 0.95)
    }

    pub fn outcome_scale(&self, success: bool, landlord_score: f64) -> f64 {
        let pos = (landlord_score / IDENTITY_RANGE).clamp(0.0, 1.0);
        let neg = (-landlord_score / IDENTITY_RANGE).clamp(0.0, 1.0);
        if self.category == ActionCategory::Balanced {
            let lean = if success { pos } else { neg };
            return 1.0 + BALANCED_OUTCOME_BONUS * lean;
        }
        let aligned = match self.category {
            ActionCategory::Classy => landlord_score >= 0.0,
            ActionCategory::Shady => landlord_score <= 0.0,
            ActionCategory::Balanced => false,
        };
        let lean = pos.max(neg);
        let delta = match (success, aligned) {
            (true, true) => ALIGNED_OUTCOME_BONUS,
            (true, false) => -MISALIGNED_PENALTY,
            (false, true) => -ALIGNED_OUTCOME_BONUS,
            (false, false) => MISALIGNED_PENALTY,
        };
        1.0 + delta * lean
    }
}

/// What a resolved action actually did, after scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub action: String,
    pub success: bool,
    pub rep: i32,
    pub morale: i32,
    pub traffic: f64,
    pub traffic_rounds: u32,
    pub chaos: f64,
}

/// Per-action cooldowns plus the once-per-round guard.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActionState {
    cooldowns: BTreeMap<String, u32>,
    pub last_action_round: Option<u32>,
}

impl ActionState {
    pub fn cooldown(&self, id: &str) -> u32 {
        self.cooldowns.get(id).copied().unwrap_or(0)
    }

    pub(crate) fn start_cooldown(&mut self, id: &str, rounds: u32) {
        self.cooldowns.insert(id.to_string(), rounds);
    }

    pub(crate) fn tick(&mut self) {
        for remaining in self.cooldowns.values_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        self.cooldowns.retain(|_, remaining| *remaining > 0);
    }

    pub(crate) fn reset_night(&mut self) {
        self.last_action_round = None;
    }
}

pub fn landlord_style_label(score: f64) -> &'static str {
    if score >= 2.5 {
        "Classy-leaning"
    } else if score <= -2.5 {
        "Shady-leaning"
    } else {
        "Neutral"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(category: ActionCategory) -> ActionDef {
        ActionDef {
            id: "test".into(),
            name: "Test".into(),
            description: String::new(),
            tier: 1,
            category,
            base_chance: 0.6,
            cooldown_rounds: 2,
            success: ActionRange {
                rep: (1, 3),
                morale: (1, 2),
                traffic: (0.02, 0.05),
                chaos: (-2.0, 0.0),
            },
            failure: ActionRange {
                rep: (-1, -3),
                morale: (-1, 0),
                traffic: (-0.02, 0.0),
                chaos: (1.0, 2.0),
            },
            success_rounds: 2,
            failure_rounds: 1,
        }
    }

    #[test]
    fn chance_leans_with_landlord_style() {
        let classy = action(ActionCategory::Classy);
        let shady = action(ActionCategory::Shady);
        assert!((classy.chance(10.0) - 0.68).abs() < 1e-9);
        assert!((shady.chance(10.0) - 0.52).abs() < 1e-9);
        assert!((action(ActionCategory::Balanced).chance(-10.0) - 0.6).abs() < 1e-9);
    }

    #[test]
    fn chance_is_clamped() {
        let mut def = action(ActionCategory::Classy);
        def.base_chance = 0.99;
        assert_eq!(def.chance(10.0), 0.95);
        def.base_chance = 0.0;
        assert_eq!(def.chance(-10.0), 0.05);
    }

    #[test]
    fn aligned_success_is_amplified() {
        let classy = action(ActionCategory::Classy);
        assert!((classy.outcome_scale(true, 10.0) - 1.12).abs() < 1e-9);
        assert!((classy.outcome_scale(true, -10.0) - 0.94).abs() < 1e-9);
        assert!((classy.outcome_scale(false, 10.0) - 0.88).abs() < 1e-9);
    }

    #[test]
    fn cooldowns_tick_down() {
        let mut state = ActionState::default();
        state.start_cooldown("test", 2);
        state.tick();
        assert_eq!(state.cooldown("test"), 1);
        state.tick();
        assert_eq!(state.cooldown("test"), 0);
    }
}
