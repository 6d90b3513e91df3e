use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::rejection::Rejection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SecurityPolicy {
    FriendlyWelcome,
    #[default]
    BalancedDoor,
    StrictDoor,
}

impl SecurityPolicy {
    pub fn label(self) -> &'static str {
        match self {
            SecurityPolicy::FriendlyWelcome => "Friendly welcome",
            SecurityPolicy::BalancedDoor => "Balanced door",
            SecurityPolicy::StrictDoor => "Strict door",
        }
    }

    pub fn security_bonus(self) -> i32 {
        match self {
            SecurityPolicy::FriendlyWelcome => -1,
            SecurityPolicy::BalancedDoor => 0,
            SecurityPolicy::StrictDoor => 1,
        }
    }

    pub fn incident_multiplier(self) -> f64 {
        match self {
            SecurityPolicy::FriendlyWelcome => 1.08,
            SecurityPolicy::BalancedDoor => 1.0,
            SecurityPolicy::StrictDoor => 0.92,
        }
    }

    pub fn traffic_multiplier(self) -> f64 {
        match self {
            SecurityPolicy::FriendlyWelcome => 1.04,
            SecurityPolicy::BalancedDoor => 1.0,
            SecurityPolicy::StrictDoor => 0.97,
        }
    }
}

impl FromStr for SecurityPolicy {
    type Err = Rejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "friendly" | "friendly_welcome" | "welcome" => Ok(SecurityPolicy::FriendlyWelcome),
            "balanced" | "balanced_door" => Ok(SecurityPolicy::BalancedDoor),
            "strict" | "strict_door" => Ok(SecurityPolicy::StrictDoor),
            other => Err(Rejection::unknown("security policy", other)),
        }
    }
}

/// Base security needed for each task tier.
const TASK_TIER_LEVELS: [i32; 3] = [5, 15, 30];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStyle {
    Soft,
    Balanced,
    Strict,
}

/// One-round door instructions. A task resolved now runs during the next round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityTask {
    VisiblePatrol,
    CheckIds,
    TightDoorTonight,
    DeescalationFocus,
    TargetedScreening,
    HardLineDoor,
    CrowdControlProtocol,
    SelectiveEntry,
    ZeroToleranceNight,
}

impl SecurityTask {
    pub const ALL: [SecurityTask; 9] = [
        SecurityTask::VisiblePatrol,
        SecurityTask::CheckIds,
        SecurityTask::TightDoorTonight,
        SecurityTask::DeescalationFocus,
        SecurityTask::TargetedScreening,
        SecurityTask::HardLineDoor,
        SecurityTask::CrowdControlProtocol,
        SecurityTask::SelectiveEntry,
        SecurityTask::ZeroToleranceNight,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SecurityTask::VisiblePatrol => "visible_patrol",
            SecurityTask::CheckIds => "check_ids",
            SecurityTask::TightDoorTonight => "tight_door",
            SecurityTask::DeescalationFocus => "deescalation",
            SecurityTask::TargetedScreening => "targeted_screening",
            SecurityTask::HardLineDoor => "hard_line",
            SecurityTask::CrowdControlProtocol => "crowd_control",
            SecurityTask::SelectiveEntry => "selective_entry",
            SecurityTask::ZeroToleranceNight => "zero_tolerance",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SecurityTask::VisiblePatrol => "Visible patrol",
            SecurityTask::CheckIds => "Check IDs",
            SecurityTask::TightDoorTonight => "Tight door tonight",
            SecurityTask::DeescalationFocus => "De-escalation focus",
            SecurityTask::TargetedScreening => "Targeted screening",
            SecurityTask::HardLineDoor => "Hard-line door",
            SecurityTask::CrowdControlProtocol => "Crowd control protocol",
            SecurityTask::SelectiveEntry => "Selective entry",
            SecurityTask::ZeroToleranceNight => "Zero tolerance night",
        }
    }

    pub fn tier(self) -> u8 {
        match self {
            SecurityTask::VisiblePatrol | SecurityTask::CheckIds | SecurityTask::TightDoorTonight => 1,
            SecurityTask::DeescalationFocus
            | SecurityTask::TargetedScreening
            | SecurityTask::HardLineDoor => 2,
            SecurityTask::CrowdControlProtocol
            | SecurityTask::SelectiveEntry
            | SecurityTask::ZeroToleranceNight => 3,
        }
    }

    pub fn style(self) -> TaskStyle {
        match self {
            SecurityTask::VisiblePatrol
            | SecurityTask::DeescalationFocus
            | SecurityTask::CrowdControlProtocol => TaskStyle::Soft,
            SecurityTask::CheckIds | SecurityTask::TargetedScreening | SecurityTask::SelectiveEntry => {
                TaskStyle::Balanced
            }
            SecurityTask::TightDoorTonight
            | SecurityTask::HardLineDoor
            | SecurityTask::ZeroToleranceNight => TaskStyle::Strict,
        }
    }

    pub fn incident_multiplier(self) -> f64 {
        match self {
            SecurityTask::VisiblePatrol => 0.96,
            SecurityTask::CheckIds => 0.92,
            SecurityTask::TightDoorTonight => 0.88,
            SecurityTask::DeescalationFocus => 0.93,
            SecurityTask::TargetedScreening => 0.89,
            SecurityTask::HardLineDoor => 0.84,
            SecurityTask::CrowdControlProtocol => 0.91,
            SecurityTask::SelectiveEntry => 0.86,
            SecurityTask::ZeroToleranceNight => 0.80,
        }
    }

    pub fn traffic_multiplier(self) -> f64 {
        match self {
            SecurityTask::VisiblePatrol => 1.03,
            SecurityTask::CheckIds => 0.99,
            SecurityTask::TightDoorTonight => 0.96,
            SecurityTask::DeescalationFocus => 1.02,
            SecurityTask::TargetedScreening => 0.98,
            SecurityTask::HardLineDoor => 0.95,
            SecurityTask::CrowdControlProtocol => 1.01,
            SecurityTask::SelectiveEntry => 0.97,
            SecurityTask::ZeroToleranceNight => 0.93,
        }
    }

    pub fn cooldown_rounds(self) -> u32 {
        match self {
            SecurityTask::VisiblePatrol | SecurityTask::CheckIds => 2,
            SecurityTask::TightDoorTonight
            | SecurityTask::DeescalationFocus
            | SecurityTask::TargetedScreening
            | SecurityTask::CrowdControlProtocol => 3,
            SecurityTask::HardLineDoor
            | SecurityTask::SelectiveEntry
            | SecurityTask::ZeroToleranceNight => 4,
        }
    }
}

impl FromStr for SecurityTask {
    type Err = Rejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        SecurityTask::ALL
            .into_iter()
            .find(|task| task.key() == wanted)
            .ok_or_else(|| Rejection::unknown("security task", s.trim()))
    }
}

/// Highest task tier a base security level unlocks; 0 means none.
pub fn task_tier(base_level: i32) -> u8 {
    TASK_TIER_LEVELS
        .iter()
        .take_while(|needed| base_level >= **needed)
        .count() as u8
}

/// Base security a task tier asks for.
pub fn task_tier_requirement(tier: u8) -> i32 {
    let index = (tier.max(1) as usize - 1).min(TASK_TIER_LEVELS.len() - 1);
    TASK_TIER_LEVELS[index]
}

/// Task cooldowns plus the one queued for the coming round.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskState {
    cooldowns: BTreeMap<String, u32>,
    pub queued: Option<(SecurityTask, u32)>,
    pub last_task_round: Option<u32>,
}

impl TaskState {
    pub fn cooldown(&self, task: SecurityTask) -> u32 {
        self.cooldowns.get(task.key()).copied().unwrap_or(0)
    }

    /// The task running in `round`, if any.
    pub fn active(&self, round: u32) -> Option<SecurityTask> {
        self.queued
            .filter(|(_, runs_in)| *runs_in == round)
            .map(|(task, _)| task)
    }

    pub(crate) fn queue(&mut self, task: SecurityTask, now: u32) {
        self.queued = Some((task, now + 1));
        self.last_task_round = Some(now);
        self.cooldowns.insert(task.key().to_string(), task.cooldown_rounds());
    }

    pub(crate) fn tick(&mut self) {
        for remaining in self.cooldowns.values_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        self.cooldowns.retain(|_, remaining| *remaining > 0);
    }

    /// Drops a task whose round has been played.
    pub(crate) fn finish_round(&mut self, round: u32) {
        if matches!(self.queued, Some((_, runs_in)) if runs_in <= round) {
            self.queued = None;
        }
    }

    pub(crate) fn reset_night(&mut self) {
        self.queued = None;
        self.last_task_round = None;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BouncerQuality {
    Low,
    Medium,
    High,
}

impl BouncerQuality {
    pub fn from_roll(roll: u32) -> Self {
        if roll < 35 {
            BouncerQuality::Low
        } else if roll < 70 {
            BouncerQuality::Medium
        } else {
            BouncerQuality::High
        }
    }

    /// Chance that this bouncer steps in before trouble lands.
    pub fn intervention_chance(self) -> f64 {
        match self {
            BouncerQuality::Low => 0.35,
            BouncerQuality::Medium => 0.60,
            BouncerQuality::High => 0.85,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bouncer {
    pub quality: BouncerQuality,
    pub theft_reduction: f64,
    pub negative_reduction: f64,
    pub fight_reduction: f64,
    pub nightly_pay: f64,
}

/// Door staff hired for the current night. Cleared at every open.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DoorTeam {
    pub bouncers: Vec<Bouncer>,
}

impl DoorTeam {
    pub fn len(&self) -> usize {
        self.bouncers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bouncers.is_empty()
    }

    fn capped_sum(&self, f: impl Fn(&Bouncer) -> f64) -> f64 {
        self.bouncers
            .iter()
            .map(f)
            .sum::<f64>()
            .min(super::BOUNCER_REDUCTION_CAP)
    }

    pub fn theft_reduction(&self) -> f64 {
        self.capped_sum(|b| b.theft_reduction)
    }

    pub fn negative_reduction(&self) -> f64 {
        self.capped_sum(|b| b.negative_reduction)
    }

    pub fn fight_reduction(&self) -> f64 {
        self.capped_sum(|b| b.fight_reduction)
    }

    pub fn best_intervention_chance(&self) -> f64 {
        self.bouncers
            .iter()
            .map(|b| b.quality.intervention_chance())
            .fold(0.0, f64::max)
    }

    /// Reputation damage multiplier from having bodies on the door.
    pub fn rep_damage_multiplier(&self) -> f64 {
        if self.bouncers.is_empty() {
            1.0
        } else {
            1.0 - self.negative_reduction() * 0.5
        }
    }

    pub(crate) fn clear(&mut self) {
        self.bouncers.clear();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityState {
    pub base_level: i32,
    pub policy: SecurityPolicy,
    pub door: DoorTeam,
    pub upkeep_accrued: f64,
    #[serde(default)]
    pub tasks: TaskState,
}

impl SecurityState {
    pub fn new(base_level: i32) -> Self {
        Self {
            base_level: base_level.max(0),
            policy: SecurityPolicy::default(),
            door: DoorTeam::default(),
            upkeep_accrued: 0.0,
            tasks: TaskState::default(),
        }
    }
}

/// How the effective security score was assembled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SecurityBreakdown {
    pub base: i32,
    pub legacy: i32,
    pub upgrades: i32,
    pub policy: i32,
    pub bouncers: i32,
    pub manager: i32,
    pub staff: i32,
    pub total: i32,
}
