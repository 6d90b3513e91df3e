use serde::{Deserialize, Serialize};

use super::economy::WeekReport;
use super::milestones::Milestone;
use super::world::CloseReason;
use crate::time::TimeOfDay;

/// How the doors opened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpenReport {
    pub night: u32,
    pub opening_crowd: u32,
    pub bar_capacity: u32,
    pub activity: Option<String>,
    pub off_sick: usize,
    pub bills_auto_paid: bool,
}

/// One round of service, as the front end sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundReport {
    pub round: u32,
    pub time: TimeOfDay,
    pub arrivals: u32,
    pub departures: u32,
    pub inside: u32,
    pub demand: u32,
    pub capacity: u32,
    pub served: u32,
    pub unserved: u32,
    pub sales: u32,
    pub traffic: f64,
    pub chaos: f64,
    pub chaos_streak_delta: f64,
    pub reputation: i32,
    /// Set when this round ended the night.
    pub closed: Option<CloseReport>,
}

/// What closing the night settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseReport {
    pub reason: CloseReason,
    pub rounds_played: u32,
    pub revenue: f64,
    pub costs: f64,
    pub early_close_rep: i32,
    pub overnight_incidents: u32,
    pub spoiled: u32,
    pub rooms_sold: u32,
    pub installed: Vec<String>,
    /// Milestones earned overnight and, on the last night, at the weekly settlement.
    pub milestones: Vec<Milestone>,
    /// Present when the close ended the week.
    pub week: Option<WeekReport>,
}
