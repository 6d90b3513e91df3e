//! Balance tunables shared across the systems.

// Workload
pub(crate) const WORKLOAD_PENALTY_EXPONENT: f64 = 1.6;
pub(crate) const WORKLOAD_CAPACITY_SCALE: f64 = 0.85;
pub(crate) const WORKLOAD_REFUND_SCALE: f64 = 0.60;
pub(crate) const WORKLOAD_CHAOS_SCALE: f64 = 7.5;
pub(crate) const WORKLOAD_CHAOS_CAP: f64 = 15.0;
pub(crate) const WORKLOAD_MISCONDUCT_SCALE: f64 = 0.55;

// Chaos
pub(crate) const CHAOS_MIN: f64 = 0.0;
pub(crate) const CHAOS_MAX: f64 = 100.0;
pub(crate) const CHAOS_CARRY_WEIGHT: f64 = 0.35;
pub(crate) const CHAOS_PRESSURE_WEIGHT: f64 = 0.65;
pub(crate) const CHAOS_STREAK_CAP: u32 = 3;
pub(crate) const CHAOS_BAD_STREAK_DELTAS: [f64; 3] = [4.0, 6.0, 8.0];
pub(crate) const CHAOS_GOOD_STREAK_DELTAS: [f64; 3] = [-3.0, -5.0, -7.0];
pub(crate) const BAD_ROUND_UNSERVED_MIN: u32 = 4;
pub(crate) const BAD_ROUND_FOOD_MISSES_MIN: u32 = 2;
pub(crate) const GOOD_ROUND_UNSERVED_MAX: u32 = 1;
pub(crate) const OVERCROWD_THRESHOLD: f64 = 0.85;

// Reputation bands
pub(crate) const REP_LOVED: i32 = 60;
pub(crate) const REP_HIGH_BAND: i32 = 60;
pub(crate) const REP_LOW_BAND: i32 = -40;
pub(crate) const REP_COLLAPSE_FLOOR: i32 = -100;
pub(crate) const REP_COLLAPSE_ROUNDS: u32 = 3;
pub(crate) const SCANDAL_REP_THRESHOLD: i32 = 85;

// In-service events
pub(crate) const FORCED_EVENT_AFTER_ROUNDS: u32 = 5;
pub(crate) const BASE_EVENT_CHANCE: i32 = 12;

// Security curves
pub(crate) const SECURITY_CHANCE_SLOPE: f64 = 0.08;
pub(crate) const SECURITY_CHANCE_FLOOR: f64 = 0.20;
pub(crate) const SECURITY_DAMAGE_SLOPE: f64 = 0.06;
pub(crate) const SECURITY_DAMAGE_FLOOR: f64 = 0.35;
pub(crate) const DAMAGE_MULTIPLIER_FLOOR: f64 = 0.25;
pub(crate) const MAX_DAMAGE_REDUCTION: f64 = 0.45;
pub(crate) const REP_MITIGATION_FLOOR: f64 = 0.50;
pub(crate) const BOUNCER_REDUCTION_CAP: f64 = 0.75;
pub(crate) const INCIDENT_CHANCE_MIN: f64 = 1.0;
pub(crate) const INCIDENT_CHANCE_MAX: f64 = 95.0;
pub(crate) const CHAOS_INCIDENT_SCALE: f64 = 0.35;
pub(crate) const SECURITY_UPKEEP_PER_LEVEL: f64 = 1.575;

// Misconduct
pub(crate) const MISCONDUCT_CHANCE_MIN: f64 = 0.01;
pub(crate) const MISCONDUCT_CHANCE_MAX: f64 = 0.30;

// Staffing
pub(crate) const FOH_BASE_CAP: usize = 4;
pub(crate) const KITCHEN_BASE_CAP: usize = 3;
pub(crate) const WAGE_HIRE_MARKUP: f64 = 1.20;
pub(crate) const WAGE_FLOOR: f64 = 18.0;
pub(crate) const TEAM_FATIGUE_MAX: f64 = 30.0;
pub(crate) const EARLY_CLOSE_MORALE: f64 = 45.0;
pub(crate) const EARLY_CLOSE_ROUNDS_PER_REP: u32 = 3;
pub(crate) const PROMOTION_EVERY_LEVELS: u32 = 4;

// Credit
pub(crate) const CREDIT_MIN_PAYMENT: f64 = 25.0;
pub(crate) const CREDIT_MIN_PAYMENT_RATE: f64 = 0.05;
pub(crate) const CREDIT_SCORE_MIN: i32 = 300;
pub(crate) const CREDIT_SCORE_MAX: i32 = 850;
pub(crate) const WEEKS_PER_YEAR: f64 = 52.0;
pub(crate) const PAYMENT_TOLERANCE: f64 = 0.01;
pub(crate) const SUPPLIER_BASE_APR: f64 = 0.10;
pub(crate) const SHARK_MIN_PAYMENT: f64 = 40.0;
pub(crate) const SHARK_MIN_PAYMENT_RATE: f64 = 0.12;
pub(crate) const PENALTY_RECOVERY_FULL_PAYS: u32 = 3;
pub(crate) const PENALTY_RECOVERY_LADDER: [f64; 3] = [0.5, 0.7, 0.8];
pub(crate) const SUPPLIER_TRUST_PENALTY_MAX: f64 = 0.30;

// Debt spiral
pub(crate) const DEBT_TIER_MAX: u8 = 4;
pub(crate) const BAILIFF_STREAK_THRESHOLD: u32 = 3;
pub(crate) const BAILIFF_UPGRADES_REMOVED: usize = 2;
pub(crate) const BAILIFF_MIN_SEIZURE: f64 = 120.0;
pub(crate) const BAILIFF_SEIZURE_RATE: f64 = 0.10;
pub(crate) const BAILIFF_REP_SCAR: i32 = -12;
pub(crate) const AUTO_BANKRUPTCY_STREAK: u32 = 8;
pub(crate) const BANKRUPTCY_LOCK_WEEKS: u32 = 24;
pub(crate) const BANKRUPTCY_SUPPLIER_TRUST_FLOOR: f64 = 0.20;
pub(crate) const BANKRUPTCY_SHARK_APR_BONUS: f64 = 0.38;
pub(crate) const BANKRUPTCY_SHARK_PENALTY_BONUS: f64 = 0.10;

// Pub level
pub(crate) const PUB_LEVEL_MAX: u8 = 5;
pub(crate) const PUB_LEVEL_REP_THRESHOLDS: [i32; 5] = [20, 35, 50, 65, 80];
pub(crate) const PUB_LEVEL_PROFIT_THRESHOLDS: [f64; 5] = [300.0, 900.0, 2000.0, 4000.0, 7500.0];
pub(crate) const PUB_LEVEL_BAR_CAPACITY: u32 = 2;

// Inn
pub(crate) const ROOM_PRICE: f64 = 45.0;
pub(crate) const INN_MAINTENANCE_PER_ROOM: f64 = 2.5;
pub(crate) const INN_COVERAGE_PER_ROOM: u32 = 1;
pub(crate) const INN_COMPLAINT_REP: i32 = -1;
