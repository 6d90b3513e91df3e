use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::identity::IdentityKind;
use super::rejection::Rejection;
use crate::time::TimePhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MusicProfile {
    AcousticChill,
    IndieAlt,
    ClassicRock,
    PopParty,
    JazzLounge,
    ElectronicLate,
    SportsTv,
}

impl MusicProfile {
    pub const ALL: [MusicProfile; 7] = [
        MusicProfile::AcousticChill,
        MusicProfile::IndieAlt,
        MusicProfile::ClassicRock,
        MusicProfile::PopParty,
        MusicProfile::JazzLounge,
        MusicProfile::ElectronicLate,
        MusicProfile::SportsTv,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MusicProfile::AcousticChill => "acoustic",
            MusicProfile::IndieAlt => "indie",
            MusicProfile::ClassicRock => "rock",
            MusicProfile::PopParty => "pop",
            MusicProfile::JazzLounge => "jazz",
            MusicProfile::ElectronicLate => "electronic",
            MusicProfile::SportsTv => "sports_tv",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MusicProfile::AcousticChill => "Acoustic chill",
            MusicProfile::IndieAlt => "Indie / alt",
            MusicProfile::ClassicRock => "Classic rock",
            MusicProfile::PopParty => "Pop party",
            MusicProfile::JazzLounge => "Jazz lounge",
            MusicProfile::ElectronicLate => "Electronic late",
            MusicProfile::SportsTv => "Sports on the TV",
        }
    }

    /// The crowd a profile pulls the pub's reputation towards.
    pub fn identity(self) -> IdentityKind {
        match self {
            MusicProfile::AcousticChill | MusicProfile::JazzLounge => IdentityKind::Respectable,
            MusicProfile::IndieAlt => IdentityKind::Artsy,
            MusicProfile::ClassicRock | MusicProfile::ElectronicLate => IdentityKind::Underground,
            MusicProfile::PopParty => IdentityKind::Rowdy,
            MusicProfile::SportsTv => IdentityKind::FamilyFriendly,
        }
    }

    fn base(self) -> MusicEffects {
        let (traffic, spend, linger, chaos, rep, morale) = match self {
            MusicProfile::AcousticChill => (0.98, 1.01, 1.03, -0.8, 0.10, 0.25),
            MusicProfile::IndieAlt => (1.02, 1.02, 1.00, 0.3, 0.12, 0.08),
            MusicProfile::ClassicRock => (1.05, 1.01, 1.01, 0.8, 0.06, -0.05),
            MusicProfile::PopParty => (1.08, 0.99, 1.03, 1.2, 0.03, -0.20),
            MusicProfile::JazzLounge => (0.96, 1.06, 1.02, -0.4, 0.18, 0.10),
            MusicProfile::ElectronicLate => (1.00, 1.00, 1.04, 1.8, 0.04, -0.25),
            MusicProfile::SportsTv => (1.04, 0.98, 1.01, 0.6, -0.02, -0.08),
        };
        let identity_pressure = match self {
            MusicProfile::AcousticChill | MusicProfile::JazzLounge => 0.25,
            MusicProfile::IndieAlt | MusicProfile::ClassicRock => 0.18,
            MusicProfile::PopParty | MusicProfile::ElectronicLate => -0.05,
            MusicProfile::SportsTv => 0.10,
        };
        MusicEffects {
            traffic,
            spend,
            linger,
            chaos,
            rep,
            morale,
            identity_pressure,
            late_risk: false,
        }
    }

    /// Base effects with this phase's swing, before upgrades and habits.
    pub fn effects(self, phase: TimePhase) -> MusicEffects {
        let mut fx = self.base();
        match (self, phase) {
            (MusicProfile::PopParty, TimePhase::EarlyDay) => fx.traffic *= 1.08,
            (MusicProfile::PopParty, TimePhase::BuildUp) => fx.traffic *= 1.14,
            (MusicProfile::PopParty, TimePhase::Late) => {
                fx.chaos += 2.4;
                fx.morale -= 0.4;
                fx.late_risk = true;
            }
            (MusicProfile::JazzLounge, TimePhase::Peak) => {
                fx.spend *= 1.07;
                fx.rep += 0.25;
            }
            (MusicProfile::JazzLounge, TimePhase::Late) => fx.traffic *= 0.90,
            (MusicProfile::AcousticChill, TimePhase::Late) => {
                fx.chaos -= 1.8;
                fx.morale += 0.7;
            }
            (MusicProfile::ElectronicLate, TimePhase::Late) => {
                fx.traffic *= 1.15;
                fx.chaos += 2.8;
                fx.late_risk = true;
            }
            (MusicProfile::ElectronicLate, _) => fx.traffic *= 0.95,
            (MusicProfile::SportsTv, TimePhase::BuildUp) => fx.traffic *= 1.08,
            (MusicProfile::SportsTv, TimePhase::Peak) => fx.chaos += 0.8,
            (MusicProfile::ClassicRock, TimePhase::Peak) => fx.traffic *= 1.06,
            (MusicProfile::ClassicRock, TimePhase::Late) => fx.chaos += 1.1,
            (MusicProfile::IndieAlt, TimePhase::BuildUp) => {
                fx.traffic *= 1.05;
                fx.rep += 0.12;
            }
            _ => {}
        }
        fx
    }
}

impl FromStr for MusicProfile {
    type Err = Rejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        MusicProfile::ALL
            .into_iter()
            .find(|profile| profile.key() == wanted)
            .ok_or_else(|| Rejection::unknown("music profile", s.trim()))
    }
}

/// What the music does to one round.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MusicEffects {
    pub traffic: f64,
    pub spend: f64,
    /// Above 1.0 punters stay a little longer.
    pub linger: f64,
    pub chaos: f64,
    pub rep: f64,
    pub morale: f64,
    pub identity_pressure: f64,
    pub late_risk: bool,
}

impl MusicEffects {
    /// Silence: every multiplier at 1.0 and no drift.
    pub const SILENT: MusicEffects = MusicEffects {
        traffic: 1.0,
        spend: 1.0,
        linger: 1.0,
        chaos: 0.0,
        rep: 0.0,
        morale: 0.0,
        identity_pressure: 0.0,
        late_risk: false,
    };

    pub(crate) fn clamped(self) -> Self {
        Self {
            traffic: self.traffic.clamp(0.75, 1.40),
            spend: self.spend.clamp(0.85, 1.30),
            linger: self.linger.clamp(0.85, 1.30),
            chaos: self.chaos.clamp(-3.5, 4.5),
            rep: self.rep.clamp(-0.8, 0.8),
            morale: self.morale.clamp(-1.2, 1.2),
            identity_pressure: self.identity_pressure.clamp(-1.0, 1.0),
            late_risk: self.late_risk,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "traffic x{:.2} | spend x{:.2} | chaos {:+.2} | rep {:+.2}",
            self.traffic, self.spend, self.chaos, self.rep
        )
    }
}

/// The pub starts in silence until the landlord picks a profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MusicState {
    pub current: Option<MusicProfile>,
    /// Phase of the last change tonight; one change per phase while open.
    pub changed_in: Option<TimePhase>,
    pub last_night: Option<MusicProfile>,
    pub nights_same: u32,
    pub weekly_switches: u32,
}

impl MusicState {
    pub(crate) fn record_night(&mut self) {
        if self.current.is_some() && self.last_night == self.current {
            self.nights_same += 1;
        } else {
            self.nights_same = u32::from(self.current.is_some());
        }
        self.last_night = self.current;
        self.changed_in = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profiles_parse_by_key() {
        assert_eq!("Jazz".parse::<MusicProfile>(), Ok(MusicProfile::JazzLounge));
        assert_eq!("sports-tv".parse::<MusicProfile>(), Ok(MusicProfile::SportsTv));
        assert!(matches!(
            "polka".parse::<MusicProfile>(),
            Err(Rejection::Unknown { kind: "music profile", .. })
        ));
    }

    #[test]
    fn late_sets_stir_the_room() {
        let late = MusicProfile::ElectronicLate.effects(TimePhase::Late);
        assert!(late.late_risk);
        assert!((late.traffic - 1.15).abs() < 1e-9);
        let early = MusicProfile::ElectronicLate.effects(TimePhase::EarlyDay);
        assert!(!early.late_risk);
        assert!((early.traffic - 0.95).abs() < 1e-9);
        let calm = MusicProfile::AcousticChill.effects(TimePhase::Late);
        assert!((calm.chaos - (-2.6)).abs() < 1e-9);
    }

    #[test]
    fn effects_stay_in_their_bands() {
        let wild = MusicEffects {
            traffic: 3.0,
            chaos: -9.0,
            rep: 2.0,
            ..MusicEffects::SILENT
        }
        .clamped();
        assert_eq!(wild.traffic, 1.40);
        assert_eq!(wild.chaos, -3.5);
        assert_eq!(wild.rep, 0.8);
    }

    #[test]
    fn a_repeated_profile_builds_a_streak() {
        let mut state = MusicState {
            current: Some(MusicProfile::IndieAlt),
            ..MusicState::default()
        };
        state.record_night();
        state.record_night();
        assert_eq!(state.nights_same, 2);
        state.current = Some(MusicProfile::PopParty);
        state.record_night();
        assert_eq!(state.nights_same, 1);
        state.current = None;
        state.record_night();
        assert_eq!(state.nights_same, 0);
    }
}
