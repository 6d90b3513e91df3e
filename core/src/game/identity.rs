use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

pub const IDENTITY_COUNT: usize = 6;
const WINDOW_WEEKS: usize = 4;
const PREVIOUS_WEIGHT: f64 = 0.7;
const FRESH_WEIGHT: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    Respectable,
    Rowdy,
    Artsy,
    Shady,
    FamilyFriendly,
    Underground,
}

/// Knock-on multipliers of being known for something.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdentityProfile {
    pub traffic: f64,
    pub wealth_bias: f64,
    pub mood_bias: f64,
    pub event_bias: f64,
    pub tip_bonus: f64,
    pub rumor_spread: f64,
}

impl IdentityProfile {
    pub const NEUTRAL: IdentityProfile = IdentityProfile {
        traffic: 1.0,
        wealth_bias: 0.0,
        mood_bias: 0.0,
        event_bias: 0.0,
        tip_bonus: 0.0,
        rumor_spread: 1.0,
    };
}

impl IdentityKind {
    pub const ALL: [IdentityKind; IDENTITY_COUNT] = [
        IdentityKind::Respectable,
        IdentityKind::Rowdy,
        IdentityKind::Artsy,
        IdentityKind::Shady,
        IdentityKind::FamilyFriendly,
        IdentityKind::Underground,
    ];

    pub fn index(self) -> usize {
        match self {
            IdentityKind::Respectable => 0,
            IdentityKind::Rowdy => 1,
            IdentityKind::Artsy => 2,
            IdentityKind::Shady => 3,
            IdentityKind::FamilyFriendly => 4,
            IdentityKind::Underground => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            IdentityKind::Respectable => "Respectable",
            IdentityKind::Rowdy => "Rowdy",
            IdentityKind::Artsy => "Artsy",
            IdentityKind::Shady => "Shady",
            IdentityKind::FamilyFriendly => "Family Friendly",
            IdentityKind::Underground => "Underground",
        }
    }

    pub fn profile(self) -> IdentityProfile {
        let (traffic, wealth_bias, mood_bias, event_bias, tip_bonus, rumor_spread) = match self {
            IdentityKind::Respectable => (1.10, 0.35, 0.30, 0.10, 0.02, 0.85),
            IdentityKind::Rowdy => (1.05, -0.25, -0.35, -0.12, -0.01, 1.10),
            IdentityKind::Artsy => (1.03, 0.15, 0.10, 0.04, 0.01, 0.95),
            IdentityKind::Shady => (0.95, -0.40, -0.30, -0.18, -0.02, 1.18),
            IdentityKind::FamilyFriendly => (1.06, 0.25, 0.35, 0.12, 0.02, 0.80),
            IdentityKind::Underground => (0.98, -0.10, -0.15, -0.06, -0.01, 1.05),
        };
        IdentityProfile {
            traffic,
            wealth_bias,
            mood_bias,
            event_bias,
            tip_bonus,
            rumor_spread,
        }
    }

    /// Extra in-service event chance from being notorious.
    pub fn event_chance_bonus(self) -> i32 {
        match self {
            IdentityKind::Respectable | IdentityKind::Artsy | IdentityKind::FamilyFriendly => 2,
            IdentityKind::Rowdy | IdentityKind::Shady | IdentityKind::Underground => 4,
        }
    }
}

/// One week of observations the identity classifier scores.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IdentitySnapshot {
    pub profit: f64,
    pub refunds: f64,
    pub fights: f64,
    pub unserved: f64,
    pub negative_events: f64,
    pub positive_events: f64,
    pub average_price: f64,
    pub food_quality: f64,
    pub rep_volatility: f64,
    pub rep_net: f64,
    pub morale: f64,
    pub security: f64,
    /// Activity and landlord signals per category, indexed by [`IdentityKind::index`].
    pub signals: [f64; IDENTITY_COUNT],
}

fn scale_up(value: f64, min: f64, max: f64) -> f64 {
    if max <= min {
        return 0.0;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0) * 2.0 - 1.0
}

fn scale_down(value: f64, min: f64, max: f64) -> f64 {
    -scale_up(value, min, max)
}

/// Scores every category for an averaged window of weeks.
pub(crate) fn score_window(s: &IdentitySnapshot) -> [f64; IDENTITY_COUNT] {
    let profit = scale_up(s.profit, -40.0, 120.0) * 0.5;
    let sig = |kind: IdentityKind| s.signals[kind.index()];

    let respectable = scale_up(s.rep_net, -12.0, 12.0) * 2.2
        + scale_up(s.morale, 35.0, 85.0) * 1.4
        + scale_down(s.fights, 0.0, 6.0) * 2.2
        + scale_down(s.negative_events, 0.0, 5.0) * 1.6
        + scale_up(s.positive_events, 0.0, 5.0) * 0.8
        + scale_up(s.food_quality, 1.5, 3.6) * 1.2
        + scale_down(s.refunds, 0.0, 18.0) * 1.0
        + scale_up(s.security, 0.0, 3.0) * 0.8
        + scale_up(sig(IdentityKind::Respectable), -1.0, 2.5) * 0.6;

    let rowdy = scale_up(s.fights, 1.0, 7.0) * 2.0
        + scale_up(s.negative_events, 1.0, 5.0) * 1.6
        + scale_down(s.security, 0.0, 3.0) * 1.0
        + scale_down(s.morale, 30.0, 75.0) * 1.0
        + scale_down(s.average_price, 1.0, 1.4) * 0.6
        + scale_up(s.unserved, 2.0, 12.0) * 1.2
        + scale_up(sig(IdentityKind::Rowdy), -1.0, 2.5) * 0.6;

    let artsy = scale_up(sig(IdentityKind::Artsy), -0.5, 2.5) * 2.2
        + scale_up(s.positive_events, 0.0, 4.0) * 0.8
        + scale_down(s.fights, 0.0, 5.0) * 1.1
        + scale_up(s.food_quality, 1.8, 3.4) * 1.3
        + scale_up(s.average_price, 1.0, 1.4) * 0.6
        + scale_up(s.rep_net, -8.0, 12.0) * 0.8;

    let shady = scale_down(s.rep_net, -12.0, 6.0) * 1.6
        + scale_up(s.negative_events, 1.0, 6.0) * 1.6
        + scale_up(s.refunds, 2.0, 20.0) * 1.0
        + scale_up(s.rep_volatility, 4.0, 16.0) * 1.2
        + scale_down(s.security, 0.0, 3.0) * 0.8
        + scale_down(s.food_quality, 1.2, 3.2) * 0.8
        + scale_up(s.unserved, 2.0, 12.0) * 0.8
        + scale_up(sig(IdentityKind::Shady), -1.0, 2.5) * 0.6;

    let family = scale_down(s.fights, 0.0, 4.0) * 2.0
        + scale_up(s.food_quality, 2.0, 3.6) * 1.5
        + scale_down(s.refunds, 0.0, 15.0) * 1.3
        + scale_up(s.security, 0.0, 3.0) * 1.0
        + scale_up(s.morale, 40.0, 85.0) * 1.0
        + scale_up(s.average_price, 0.95, 1.25) * 0.5
        + scale_up(sig(IdentityKind::FamilyFriendly), -1.0, 2.5) * 0.6;

    let underground = scale_up(s.rep_volatility, 4.0, 16.0) * 1.5
        + scale_down(s.security, 0.0, 3.0) * 1.0
        + scale_down(s.morale, 30.0, 70.0) * 0.8
        + scale_up(s.negative_events, 1.0, 5.0) * 1.0
        + scale_up(s.fights, 1.0, 6.0) * 1.1
        + scale_down(s.average_price, 1.0, 1.5) * 0.6
        + scale_up(sig(IdentityKind::Underground), -1.0, 2.5) * 0.6;

    [
        respectable + profit,
        rowdy + profit,
        artsy + profit,
        shady + profit,
        family + profit,
        underground + profit,
    ]
}

fn average(window: &VecDeque<IdentitySnapshot>) -> IdentitySnapshot {
    let n = window.len().max(1) as f64;
    let mut avg = IdentitySnapshot::default();
    for s in window {
        avg.profit += s.profit / n;
        avg.refunds += s.refunds / n;
        avg.fights += s.fights / n;
        avg.unserved += s.unserved / n;
        avg.negative_events += s.negative_events / n;
        avg.positive_events += s.positive_events / n;
        avg.average_price += s.average_price / n;
        avg.food_quality += s.food_quality / n;
        avg.rep_volatility += s.rep_volatility / n;
        avg.rep_net += s.rep_net / n;
        avg.morale += s.morale / n;
        avg.security += s.security / n;
        for (slot, value) in avg.signals.iter_mut().zip(s.signals.iter()) {
            *slot += value / n;
        }
    }
    avg
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityTracker {
    scores: [f64; IDENTITY_COUNT],
    window: VecDeque<IdentitySnapshot>,
    current: Option<IdentityKind>,
    /// Signals gathered during the current week, folded into the next snapshot.
    pending_signals: [f64; IDENTITY_COUNT],
    /// Long-running landlord standing, nudged by classy and shady actions.
    landlord_score: f64,
}

impl IdentityTracker {
    pub fn current(&self) -> Option<IdentityKind> {
        self.current
    }

    pub fn profile(&self) -> IdentityProfile {
        self.current
            .map(IdentityKind::profile)
            .unwrap_or(IdentityProfile::NEUTRAL)
    }

    pub fn score(&self, kind: IdentityKind) -> f64 {
        self.scores[kind.index()]
    }

    pub fn landlord_score(&self) -> f64 {
        self.landlord_score
    }

    pub(crate) fn shift_landlord_score(&mut self, delta: f64) {
        self.landlord_score = (self.landlord_score + delta).clamp(-10.0, 10.0);
    }

    /// Signal gathered so far this week for one category.
    pub fn pending_signal(&self, kind: IdentityKind) -> f64 {
        self.pending_signals[kind.index()]
    }

    pub(crate) fn record_signal(&mut self, kind: IdentityKind, amount: f64) {
        self.pending_signals[kind.index()] += amount;
    }

    pub(crate) fn take_signals(&mut self) -> [f64; IDENTITY_COUNT] {
        std::mem::take(&mut self.pending_signals)
    }

    /// Adds a week to the rolling window and re-ranks the categories.
    /// Returns the new identity when it changed.
    pub(crate) fn record_week(&mut self, snapshot: IdentitySnapshot) -> Option<IdentityKind> {
        self.window.push_back(snapshot);
        while self.window.len() > WINDOW_WEEKS {
            self.window.pop_front();
        }
        let fresh = score_window(&average(&self.window));
        for (score, new) in self.scores.iter_mut().zip(fresh) {
            *score = PREVIOUS_WEIGHT * *score + FRESH_WEIGHT * new;
        }
        let best = IdentityKind::ALL.into_iter().max_by(|a, b| {
            self.scores[a.index()]
                .partial_cmp(&self.scores[b.index()])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        if best != self.current {
            self.current = best;
            best
        } else {
            None
        }
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }
}
