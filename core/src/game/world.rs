//! The single mutable aggregate the night loop works on.

use serde::{Deserialize, Serialize};

use super::{
    CHAOS_BAD_STREAK_DELTAS, CHAOS_CARRY_WEIGHT, CHAOS_GOOD_STREAK_DELTAS, CHAOS_MAX, CHAOS_MIN,
    CHAOS_PRESSURE_WEIGHT, CHAOS_STREAK_CAP,
    actions::ActionState,
    bills::PaydayBill,
    config::EngineConfig,
    credit::CreditBook,
    debt::DebtSpiral,
    district::DistrictState,
    economy::Ledger,
    identity::IdentityTracker,
    inventory::Inventory,
    milestones::MilestoneTracker,
    music::MusicState,
    patrons::Patron,
    prestige::PrestigeState,
    regulars::{VIP_NAMES, VipRegular, VipState},
    rumor::RumorBoard,
    security::SecurityState,
    staff::Roster,
    upgrades::UpgradeEffects,
};
use crate::scheduler::PendingQueue;
use crate::time::Calendar;

/// Why a night ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CloseReason {
    /// The closing round was reached.
    Scheduled,
    /// The landlord called time early.
    Manual,
    /// Staff morale gave out mid-service.
    StaffExhausted,
    /// Reputation sat on the floor for too long; the run is over.
    ReputationCollapse,
}

impl CloseReason {
    pub fn label(self) -> &'static str {
        match self {
            CloseReason::Scheduled => "closing time",
            CloseReason::Manual => "closed early",
            CloseReason::StaffExhausted => "staff exhausted",
            CloseReason::ReputationCollapse => "reputation collapse",
        }
    }

    pub(crate) fn is_early(self) -> bool {
        matches!(self, CloseReason::Manual | CloseReason::StaffExhausted)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOverReason {
    ReputationCollapse,
    WageCollapse,
}

impl GameOverReason {
    pub fn label(self) -> &'static str {
        match self {
            GameOverReason::ReputationCollapse => "the licence was pulled after a reputation collapse",
            GameOverReason::WageCollapse => "the staff walked out for good over unpaid wages",
        }
    }
}

/// Incident and service counters. One copy per night, one per week.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ServiceCounters {
    pub sales: u32,
    pub food_sales: u32,
    pub unserved: u32,
    pub fights: u32,
    pub refunds: u32,
    pub refund_total: f64,
    pub events: u32,
    pub positive_events: u32,
    pub negative_events: u32,
    pub staff_incidents: u32,
    pub food_misses: u32,
    pub thefts: u32,
    /// Punters turned away because the racks were empty.
    #[serde(default)]
    pub stockouts: u32,
}

impl ServiceCounters {
    pub(crate) fn absorb(&mut self, other: &ServiceCounters) {
        self.sales += other.sales;
        self.food_sales += other.food_sales;
        self.unserved += other.unserved;
        self.fights += other.fights;
        self.refunds += other.refunds;
        self.refund_total += other.refund_total;
        self.events += other.events;
        self.positive_events += other.positive_events;
        self.negative_events += other.negative_events;
        self.staff_incidents += other.staff_incidents;
        self.food_misses += other.food_misses;
        self.thefts += other.thefts;
        self.stockouts += other.stockouts;
    }
}

/// Weekly observations beyond the plain counters, used for identity and reports.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WeekStats {
    pub counters: ServiceCounters,
    pub nights: u32,
    pub price_sum: f64,
    pub price_samples: u32,
    pub food_quality_sum: f64,
    pub rep_abs: i32,
    pub rep_net: i32,
    pub security_sum: f64,
    pub morale_sum: f64,
    pub chaos_sum: f64,
    pub rounds: u32,
    pub staff_departures: u32,
}

impl WeekStats {
    pub fn average_price(&self) -> f64 {
        if self.price_samples == 0 {
            1.0
        } else {
            self.price_sum / self.price_samples as f64
        }
    }

    pub fn average_food_quality(&self) -> f64 {
        if self.counters.food_sales == 0 {
            0.0
        } else {
            self.food_quality_sum / self.counters.food_sales as f64
        }
    }

    pub fn average_security(&self) -> f64 {
        if self.rounds == 0 {
            0.0
        } else {
            self.security_sum / self.rounds as f64
        }
    }

    pub fn average_chaos(&self) -> f64 {
        if self.rounds == 0 {
            0.0
        } else {
            self.chaos_sum / self.rounds as f64
        }
    }

    pub fn average_morale(&self) -> f64 {
        if self.rounds == 0 {
            60.0
        } else {
            self.morale_sum / self.rounds as f64
        }
    }
}

/// How a finished round reads for the streak rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundClass {
    StronglyNegative,
    MostlyPositive,
    Neutral,
}

/// The bounded chaos scalar plus its streak bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChaosState {
    value: f64,
    pub bad_streak: u32,
    pub good_streak: u32,
    pub last_streak_delta: f64,
}

impl ChaosState {
    pub fn new(value: f64) -> Self {
        Self {
            value: value.clamp(CHAOS_MIN, CHAOS_MAX),
            bad_streak: 0,
            good_streak: 0,
            last_streak_delta: 0.0,
        }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub(crate) fn set(&mut self, value: f64) {
        self.value = value.clamp(CHAOS_MIN, CHAOS_MAX);
    }

    pub(crate) fn adjust(&mut self, delta: f64) {
        self.set(self.value + delta);
    }

    /// Carries part of the old value and replaces the rest with fresh pressure.
    pub(crate) fn blend(&mut self, raw_pressure: f64) {
        self.set(CHAOS_CARRY_WEIGHT * self.value + CHAOS_PRESSURE_WEIGHT * raw_pressure);
    }

    /// Advances the streak counters and adds the streak delta on top of the blended value.
    /// Returns the delta before clamping.
    pub(crate) fn apply_streak(&mut self, class: RoundClass) -> f64 {
        let delta = match class {
            RoundClass::StronglyNegative => {
                self.bad_streak = (self.bad_streak + 1).min(CHAOS_STREAK_CAP);
                self.good_streak = 0;
                CHAOS_BAD_STREAK_DELTAS[self.bad_streak as usize - 1]
            }
            RoundClass::MostlyPositive => {
                self.good_streak = (self.good_streak + 1).min(CHAOS_STREAK_CAP);
                self.bad_streak = 0;
                CHAOS_GOOD_STREAK_DELTAS[self.good_streak as usize - 1]
            }
            RoundClass::Neutral => {
                self.bad_streak = 0;
                self.good_streak = 0;
                0.0
            }
        };
        self.last_streak_delta = delta;
        self.adjust(delta);
        delta
    }

    pub(crate) fn reset_streaks(&mut self) {
        self.bad_streak = 0;
        self.good_streak = 0;
        self.last_streak_delta = 0.0;
    }
}

/// Everything that only exists while the doors are open.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NightState {
    pub open: bool,
    pub round: u32,
    pub patrons: Vec<Patron>,
    pub(crate) next_patron_id: u32,
    pub bar_capacity: u32,
    pub opening_pool: u32,
    pub counters: ServiceCounters,
    pub quiet_rounds: u32,
    pub collapse_rounds: u32,
    pub pending_food_orders: u32,
    pub pending_food_value: f64,
    pub peak_check_done: bool,
    pub late_check_done: bool,
    pub action_traffic: f64,
    pub action_traffic_rounds: u32,
    pub last_close: Option<CloseReason>,
    pub rep_at_open: i32,
}

impl NightState {
    pub fn patrons_inside(&self) -> usize {
        self.patrons.iter().filter(|p| !p.left).count()
    }

    pub(crate) fn allocate_patron_id(&mut self) -> u32 {
        self.next_patron_id += 1;
        self.next_patron_id
    }

    /// Clears the per-night state while keeping how the previous night ended.
    pub(crate) fn reset_for_open(&mut self) {
        let last_close = self.last_close;
        let next_patron_id = self.next_patron_id;
        *self = NightState {
            last_close,
            next_patron_id,
            ..NightState::default()
        };
    }
}

/// Fatigue, wage-miss fallout and other state that outlives a single night.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StaffingState {
    pub fatigue: f64,
    pub peak_fatigue: f64,
    pub missed_wage_weeks: u32,
    pub wages_paid_streak: u32,
    pub wages_paid_last_week: bool,
    pub traffic_penalty: f64,
    pub traffic_penalty_rounds: u32,
    pub serve_penalty: f64,
    pub serve_penalty_weeks: u32,
    /// Staff who handed in notice but are waiting on their final pay.
    pub departures_pending: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OwnedUpgrades {
    pub owned: Vec<String>,
    pub effects: UpgradeEffects,
}

impl OwnedUpgrades {
    pub fn owns(&self, id: &str) -> bool {
        self.owned.iter().any(|owned| owned.eq_ignore_ascii_case(id))
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivityState {
    pub pending: Option<String>,
    pub tonight: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InnState {
    pub maintenance_accrued: f64,
    pub rooms_sold_week: u32,
    pub revenue_week: f64,
    pub last_bookings: u32,
    pub complaints_week: u32,
}

/// Running costs that accrue daily and are billed at payday.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Accruals {
    pub rent: f64,
    /// Tips collected during the week, half of which goes out with wages.
    pub tips_held: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationState {
    pub(crate) pub_name: String,
    pub(crate) calendar: Calendar,
    pub(crate) night: NightState,
    pub(crate) ledger: Ledger,
    pub(crate) reputation: i32,
    pub(crate) chaos: ChaosState,
    pub(crate) roster: Roster,
    pub(crate) staffing: StaffingState,
    pub(crate) inventory: Inventory,
    pub(crate) rumors: RumorBoard,
    pub(crate) identity: IdentityTracker,
    pub(crate) upgrades: OwnedUpgrades,
    pub(crate) credit: CreditBook,
    pub(crate) debt: DebtSpiral,
    pub(crate) security: SecurityState,
    pub(crate) actions: ActionState,
    pub(crate) queue: PendingQueue,
    pub(crate) bills: Vec<PaydayBill>,
    pub(crate) week: WeekStats,
    pub(crate) accruals: Accruals,
    pub(crate) pub_level: u8,
    pub(crate) activity: ActivityState,
    pub(crate) price_multiplier: f64,
    pub(crate) inn: InnState,
    pub(crate) milestones: MilestoneTracker,
    pub(crate) prestige: PrestigeState,
    pub(crate) music: MusicState,
    pub(crate) district: DistrictState,
    pub(crate) vips: VipState,
    pub(crate) game_over: Option<GameOverReason>,
}

impl SimulationState {
    pub(crate) fn new(config: &EngineConfig) -> Self {
        let mut inventory = Inventory::new(config.drink_rack_capacity, config.food_rack_capacity);
        inventory.standing_order = config.standing_order.clone();
        Self {
            pub_name: config.pub_name.clone(),
            calendar: Calendar::new(),
            night: NightState::default(),
            ledger: Ledger::new(config.starting_cash),
            reputation: config.starting_reputation.clamp(-100, 100),
            chaos: ChaosState::new(0.0),
            roster: Roster::new(),
            staffing: StaffingState::default(),
            inventory,
            rumors: RumorBoard::default(),
            identity: IdentityTracker::default(),
            upgrades: OwnedUpgrades::default(),
            credit: CreditBook::new(config.starting_credit_score, config.supplier_credit_cap),
            debt: DebtSpiral::default(),
            security: SecurityState::new(config.security_base_level),
            actions: ActionState::default(),
            queue: PendingQueue::new(),
            bills: Vec::new(),
            week: WeekStats::default(),
            accruals: Accruals::default(),
            pub_level: 0,
            activity: ActivityState::default(),
            price_multiplier: 1.0,
            inn: InnState::default(),
            milestones: MilestoneTracker::default(),
            prestige: PrestigeState::default(),
            music: MusicState::default(),
            district: DistrictState::default(),
            vips: VipState {
                regulars: VIP_NAMES.iter().map(|name| VipRegular::named(name)).collect(),
                ..VipState::default()
            },
            game_over: None,
        }
    }

    /// Absolute service round, used to time deliveries.
    pub(crate) fn absolute_round(&self, closing_round: u32) -> u64 {
        self.calendar.day_counter() as u64 * closing_round.max(1) as u64 + self.night.round as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_bad_rounds_escalate_chaos() {
        let mut chaos = ChaosState::new(20.0);
        chaos.good_streak = 2;
        let deltas: Vec<f64> = (0..3)
            .map(|_| {
                let delta = chaos.apply_streak(RoundClass::StronglyNegative);
                assert_eq!(chaos.good_streak, 0);
                delta
            })
            .collect();
        assert_eq!(deltas, vec![4.0, 6.0, 8.0]);
        assert_eq!(chaos.value(), 38.0);
        assert_eq!(chaos.apply_streak(RoundClass::StronglyNegative), 8.0);
    }

    #[test]
    fn good_rounds_cool_things_down_and_neutral_resets() {
        let mut chaos = ChaosState::new(30.0);
        assert_eq!(chaos.apply_streak(RoundClass::MostlyPositive), -3.0);
        assert_eq!(chaos.apply_streak(RoundClass::MostlyPositive), -5.0);
        assert_eq!(chaos.apply_streak(RoundClass::Neutral), 0.0);
        assert_eq!(chaos.good_streak, 0);
        assert_eq!(chaos.apply_streak(RoundClass::MostlyPositive), -3.0);
    }

    #[test]
    fn chaos_stays_in_bounds() {
        let mut chaos = ChaosState::new(98.0);
        for _ in 0..5 {
            chaos.blend(250.0);
            chaos.apply_streak(RoundClass::StronglyNegative);
            assert!(chaos.value() <= 100.0);
        }
        let mut calm = ChaosState::new(2.0);
        calm.blend(-40.0);
        calm.apply_streak(RoundClass::MostlyPositive);
        assert_eq!(calm.value(), 0.0);
    }

    #[test]
    fn blend_weights_old_and_new() {
        let mut chaos = ChaosState::new(20.0);
        chaos.blend(40.0);
        assert!((chaos.value() - (0.35 * 20.0 + 0.65 * 40.0)).abs() < 1e-9);
    }

    #[test]
    fn counters_accumulate() {
        let mut week = ServiceCounters::default();
        let night = ServiceCounters {
            sales: 10,
            fights: 1,
            refund_total: 4.5,
            ..ServiceCounters::default()
        };
        week.absorb(&night);
        week.absorb(&night);
        assert_eq!(week.sales, 20);
        assert_eq!(week.fights, 2);
        assert_eq!(week.refund_total, 9.0);
    }
}
