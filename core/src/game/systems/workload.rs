use crate::game::{
    WORKLOAD_CAPACITY_SCALE, WORKLOAD_CHAOS_CAP, WORKLOAD_CHAOS_SCALE, WORKLOAD_MISCONDUCT_SCALE,
    WORKLOAD_PENALTY_EXPONENT, WORKLOAD_REFUND_SCALE,
};

/// Convex overload penalty: zero up to full load, `(ratio - 1)^1.6` beyond it.
pub fn workload_penalty(ratio: f64) -> f64 {
    (ratio - 1.0).max(0.0).powf(WORKLOAD_PENALTY_EXPONENT)
}

/// One round of demand measured against serve capacity. Recomputed every round.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkloadProfile {
    pub demand: u32,
    pub capacity: u32,
    pub ratio: f64,
    pub penalty: f64,
    pub effective_capacity: u32,
    pub served: u32,
    pub unserved: u32,
}

impl WorkloadProfile {
    pub fn compute(demand: u32, capacity: u32) -> Self {
        let capacity = capacity.max(1);
        let ratio = demand as f64 / capacity as f64;
        let penalty = workload_penalty(ratio);
        let effective_capacity =
            ((capacity as f64 / (1.0 + penalty * WORKLOAD_CAPACITY_SCALE)).floor() as u32).max(1);
        let served = demand.min(effective_capacity);
        Self {
            demand,
            capacity,
            ratio,
            penalty,
            effective_capacity,
            served,
            unserved: demand - served,
        }
    }

    pub fn is_overloaded(&self) -> bool {
        self.penalty > 0.0
    }

    /// Scales refund pressure from unserved and late food.
    pub fn refund_multiplier(&self) -> f64 {
        1.0 + self.penalty * WORKLOAD_REFUND_SCALE
    }

    /// Chaos points added by an overloaded floor.
    pub fn chaos_pressure(&self) -> f64 {
        (self.penalty * WORKLOAD_CHAOS_SCALE).min(WORKLOAD_CHAOS_CAP)
    }

    pub fn misconduct_multiplier(&self) -> f64 {
        1.0 + self.penalty * WORKLOAD_MISCONDUCT_SCALE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn double_demand_halves_service() {
        let profile = WorkloadProfile::compute(20, 10);
        assert_eq!(profile.ratio, 2.0);
        assert_eq!(profile.penalty, 1.0);
        assert_eq!(profile.effective_capacity, 5);
        assert_eq!(profile.served, 5);
        assert_eq!(profile.unserved, 15);
    }

    #[test]
    fn no_penalty_within_capacity() {
        for demand in 0..=10 {
            let profile = WorkloadProfile::compute(demand, 10);
            assert_eq!(profile.penalty, 0.0);
            assert_eq!(profile.unserved, 0);
            assert_eq!(profile.refund_multiplier(), 1.0);
        }
    }

    #[test]
    fn penalty_grows_with_overload() {
        let mut last = 0.0;
        for demand in 11..60 {
            let penalty = WorkloadProfile::compute(demand, 10).penalty;
            assert!(penalty > last);
            last = penalty;
        }
    }

    #[test]
    fn capacity_never_drops_below_one() {
        let profile = WorkloadProfile::compute(3, 0);
        assert_eq!(profile.capacity, 1);
        assert!(profile.effective_capacity >= 1);
        assert!(WorkloadProfile::compute(500, 1).chaos_pressure() <= 15.0);
    }
}
