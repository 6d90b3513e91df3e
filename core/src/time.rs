use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

pub const MINUTES_PER_DAY: u32 = 24 * 60;
pub const DAYS_PER_WEEK: u8 = 7;
const WEEKS_PER_YEAR: u32 = 52;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeOfDay {
    minutes: u32,
}

impl TimeOfDay {
    pub const fn new(hour: u32, minute: u32) -> Self {
        Self {
            minutes: (hour * 60 + minute) % MINUTES_PER_DAY,
        }
    }

    pub fn from_minutes(minutes: u32) -> Self {
        Self {
            minutes: minutes % MINUTES_PER_DAY,
        }
    }

    pub fn minutes(self) -> u32 {
        self.minutes
    }

    pub fn hour(self) -> u32 {
        self.minutes / 60
    }

    pub fn minute(self) -> u32 {
        self.minutes % 60
    }

    pub fn plus_minutes(self, minutes: u32) -> Self {
        Self::from_minutes(self.minutes + minutes)
    }

    pub fn phase(self) -> TimePhase {
        if self < TimePhase::BUILD_UP_START {
            TimePhase::EarlyDay
        } else if self < TimePhase::PEAK_START {
            TimePhase::BuildUp
        } else if self < TimePhase::LATE_START {
            TimePhase::Peak
        } else {
            TimePhase::Late
        }
    }
}

impl Ord for TimeOfDay {
    fn cmp(&self, other: &Self) -> Ordering {
        self.minutes.cmp(&other.minutes)
    }
}

impl PartialOrd for TimeOfDay {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimePhase {
    EarlyDay,
    BuildUp,
    Peak,
    Late,
}

impl TimePhase {
    const BUILD_UP_START: TimeOfDay = TimeOfDay::new(15, 0);
    const PEAK_START: TimeOfDay = TimeOfDay::new(18, 30);
    const LATE_START: TimeOfDay = TimeOfDay::new(21, 30);

    pub fn label(self) -> &'static str {
        match self {
            TimePhase::EarlyDay => "early day",
            TimePhase::BuildUp => "build-up",
            TimePhase::Peak => "peak",
            TimePhase::Late => "late",
        }
    }
}

/// Opening hours of a single night, expressed in service rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHours {
    pub opening: TimeOfDay,
    pub last_orders: TimeOfDay,
    pub minutes_per_round: u32,
    pub closing_round: u32,
}

impl ServiceHours {
    pub fn time_at(&self, round: u32) -> TimeOfDay {
        self.opening.plus_minutes(round * self.minutes_per_round)
    }

    /// Closing is reached on the scheduled round or once the clock passes last orders,
    /// whichever comes first.
    pub fn is_closing(&self, round: u32) -> bool {
        if round >= self.closing_round {
            return true;
        }
        let elapsed = round * self.minutes_per_round;
        let span = self
            .last_orders
            .minutes()
            .saturating_sub(self.opening.minutes());
        span > 0 && elapsed >= span
    }

    pub fn rounds_remaining(&self, round: u32) -> u32 {
        self.closing_round.saturating_sub(round)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    pub fn from_index(index: u8) -> Self {
        match index % DAYS_PER_WEEK {
            0 => Weekday::Monday,
            1 => Weekday::Tuesday,
            2 => Weekday::Wednesday,
            3 => Weekday::Thursday,
            4 => Weekday::Friday,
            5 => Weekday::Saturday,
            _ => Weekday::Sunday,
        }
    }

    pub fn is_weekend(self) -> bool {
        matches!(self, Weekday::Friday | Weekday::Saturday | Weekday::Sunday)
    }

    pub fn label(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Season {
    WinterSlump,
    ExamSeason,
    TouristWave,
    DerbyWeek,
}

impl Season {
    /// Seasonal tags active during a given week of the run.
    pub fn active_in_week(week: u32) -> Vec<Season> {
        let week_of_year = ((week.max(1) - 1) % WEEKS_PER_YEAR) + 1;
        let mut tags = Vec::new();
        if week_of_year <= 8 || week_of_year >= 49 {
            tags.push(Season::WinterSlump);
        }
        if (18..=22).contains(&week_of_year) {
            tags.push(Season::ExamSeason);
        }
        if (26..=34).contains(&week_of_year) {
            tags.push(Season::TouristWave);
        }
        if week_of_year % 10 == 0 {
            tags.push(Season::DerbyWeek);
        }
        tags
    }
}

/// Day, week and night counters of the running business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    day_index: u8,
    day_counter: u32,
    week: u32,
    night_count: u32,
}

impl Calendar {
    pub fn new() -> Self {
        Self {
            day_index: 0,
            day_counter: 0,
            week: 1,
            night_count: 0,
        }
    }

    pub fn day_index(&self) -> u8 {
        self.day_index
    }

    pub fn day_counter(&self) -> u32 {
        self.day_counter
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    pub fn night_count(&self) -> u32 {
        self.night_count
    }

    pub fn weekday(&self) -> Weekday {
        Weekday::from_index(self.day_index)
    }

    pub fn is_weekend(&self) -> bool {
        self.weekday().is_weekend()
    }

    pub fn seasons(&self) -> Vec<Season> {
        Season::active_in_week(self.week)
    }

    pub(crate) fn begin_night(&mut self) -> u32 {
        self.night_count += 1;
        self.night_count
    }

    /// Moves to the next day. Returns `true` when the week wrapped.
    pub(crate) fn advance_day(&mut self) -> bool {
        self.day_index = (self.day_index + 1) % DAYS_PER_WEEK;
        self.day_counter += 1;
        self.day_index == 0
    }

    pub(crate) fn begin_next_week(&mut self) {
        self.week += 1;
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new()
    }
}
