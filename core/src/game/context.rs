use rand::rngs::StdRng;

use super::{
    PUB_LEVEL_MAX, REP_COLLAPSE_FLOOR,
    catalog::Catalog,
    config::EngineConfig,
    economy::{CostKind, RevenueKind},
    rejection::Rejection,
    world::SimulationState,
};
use crate::log::LogHub;

const REP_MAX: i32 = 100;
const LEVEL_REP_GAIN_STEP: f64 = 0.05;

/// Borrowed view of everything a system may touch during one operation.
pub(crate) struct SimContext<'a> {
    pub(crate) sim: &'a mut SimulationState,
    pub(crate) rng: &'a mut StdRng,
    pub(crate) config: &'a EngineConfig,
    pub(crate) catalog: &'a Catalog,
    pub(crate) log: &'a mut LogHub,
}

impl<'a> SimContext<'a> {
    pub(crate) fn new(
        sim: &'a mut SimulationState,
        rng: &'a mut StdRng,
        config: &'a EngineConfig,
        catalog: &'a Catalog,
        log: &'a mut LogHub,
    ) -> Self {
        Self {
            sim,
            rng,
            config,
            catalog,
            log,
        }
    }

    /// Applies a reputation change after pub-level and debt-spiral scaling.
    /// Returns the change that actually landed.
    pub(crate) fn apply_rep(&mut self, delta: i32) -> i32 {
        if delta == 0 {
            return 0;
        }
        let multipliers = self.sim.debt.multipliers();
        let scaled = if delta > 0 {
            let level = self.sim.pub_level.min(PUB_LEVEL_MAX) as f64;
            delta as f64 * (1.0 + level * LEVEL_REP_GAIN_STEP) * multipliers.positive_rep
        } else {
            delta as f64 * multipliers.negative_rep
        };
        let mut rounded = scaled.round() as i32;
        if rounded == 0 {
            rounded = delta.signum();
        }
        let before = self.sim.reputation;
        self.sim.reputation = (before + rounded).clamp(REP_COLLAPSE_FLOOR, REP_MAX);
        let applied = self.sim.reputation - before;
        self.sim.week.rep_abs += applied.abs();
        self.sim.week.rep_net += applied;
        applied
    }

    /// Pays from cash, topping up from the first credit line that covers the shortfall.
    /// Logs and returns `false` when neither can cover it.
    pub(crate) fn try_pay(&mut self, amount: f64, kind: CostKind, label: &str) -> bool {
        if amount <= 0.0 {
            return true;
        }
        let cash = self.sim.ledger.cash();
        if self.sim.ledger.can_afford(amount) {
            self.sim.ledger.withdraw(amount);
            self.sim.ledger.book_cost(kind, amount);
            return true;
        }
        let shortfall = amount - cash;
        let Some(line) = self.sim.credit.line_covering(shortfall) else {
            self.log.neg(format!(
                "Insufficient funds: cannot pay GBP {amount:.2} for {label}."
            ));
            return false;
        };
        line.draw(shortfall);
        let lender = line.lender.clone();
        self.sim.ledger.withdraw(cash);
        self.sim.ledger.book_cost(kind, amount);
        self.log.info(format!(
            "Drew GBP {shortfall:.2} from {lender} to cover {label}."
        ));
        true
    }

    pub(crate) fn earn(&mut self, kind: RevenueKind, amount: f64) {
        self.sim.ledger.earn(kind, amount);
    }

    /// Logs a refusal and hands it back for the caller to return.
    pub(crate) fn reject(&mut self, rejection: Rejection) -> Rejection {
        self.log.neg(rejection.to_string());
        rejection
    }

    pub(crate) fn week(&self) -> u32 {
        self.sim.calendar.week()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::SimContext;
    use crate::game::{catalog::Catalog, config::EngineConfig, world::SimulationState};
    use crate::log::LogHub;

    /// Owns everything a [`SimContext`] borrows, for unit tests of single systems.
    pub(crate) struct Fixture {
        pub(crate) sim: SimulationState,
        pub(crate) rng: StdRng,
        pub(crate) config: EngineConfig,
        pub(crate) catalog: Catalog,
        pub(crate) log: LogHub,
    }

    impl Fixture {
        pub(crate) fn new(seed: u64) -> Self {
            let config = EngineConfig::default();
            Self {
                sim: SimulationState::new(&config),
                rng: StdRng::seed_from_u64(seed),
                catalog: Catalog::from_embedded().expect("embedded catalog"),
                config,
                log: LogHub::default(),
            }
        }

        pub(crate) fn ctx(&mut self) -> SimContext<'_> {
            SimContext::new(
                &mut self.sim,
                &mut self.rng,
                &self.config,
                &self.catalog,
                &mut self.log,
            )
        }

        pub(crate) fn logged(&self, needle: &str) -> bool {
            self.log.recent().any(|line| line.text.contains(needle))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::Fixture;
    use crate::game::credit::CreditLine;
    use crate::game::economy::CostKind;

    #[test]
    fn try_pay_prefers_cash() {
        let mut fx = Fixture::new(1);
        let cash = fx.sim.ledger.cash();
        assert!(fx.ctx().try_pay(100.0, CostKind::Rent, "rent"));
        assert_eq!(fx.sim.ledger.cash(), cash - 100.0);
        assert_eq!(fx.sim.ledger.week().cost_of(CostKind::Rent), 100.0);
    }

    #[test]
    fn try_pay_tops_up_from_credit() {
        let mut fx = Fixture::new(1);
        fx.sim.ledger.withdraw(fx.sim.ledger.cash() - 50.0);
        fx.sim
            .credit
            .lines
            .push(CreditLine::new(1, "townland", "Townland", 500.0, 0.06));
        assert!(fx.ctx().try_pay(120.0, CostKind::Repairs, "repairs"));
        assert_eq!(fx.sim.ledger.cash(), 0.0);
        assert!((fx.sim.credit.lines[0].balance - 70.0).abs() < 1e-9);
    }

    #[test]
    fn try_pay_refuses_without_changing_state() {
        let mut fx = Fixture::new(1);
        fx.sim.ledger.withdraw(fx.sim.ledger.cash() - 10.0);
        assert!(!fx.ctx().try_pay(40.0, CostKind::Upgrades, "a jukebox"));
        assert_eq!(fx.sim.ledger.cash(), 10.0);
        assert!(fx.logged("Insufficient funds: cannot pay GBP 40.00 for a jukebox."));
    }

    #[test]
    fn small_reputation_changes_still_land() {
        let mut fx = Fixture::new(1);
        fx.sim.debt.record_week(false);
        fx.sim.debt.record_week(false);
        fx.sim.debt.record_week(false);
        fx.sim.debt.record_week(false);
        let before = fx.sim.reputation;
        assert_eq!(fx.ctx().apply_rep(1), 1);
        assert_eq!(fx.ctx().apply_rep(-10), -15);
        assert_eq!(fx.sim.reputation, before + 1 - 15);
        assert_eq!(fx.sim.week.rep_net, -14);
        assert_eq!(fx.sim.week.rep_abs, 16);
    }

    #[test]
    fn reputation_is_clamped() {
        let mut fx = Fixture::new(1);
        fx.sim.reputation = 98;
        assert_eq!(fx.ctx().apply_rep(10), 2);
        fx.sim.reputation = -95;
        assert_eq!(fx.ctx().apply_rep(-20), -5);
        assert_eq!(fx.sim.reputation, -100);
    }
}
