use anyhow::Result;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use super::{
    actions::{ActionDef, ActionOutcome},
    bills::{BillSelection, PaydayBill, PaydayOutcome},
    bootstrap::{GameBootstrap, GameBuilder},
    catalog::Catalog,
    config::EngineConfig,
    context::SimContext,
    district::{DISTRICT_RIVALS, RivalStance},
    milestones::Milestone,
    music::MusicProfile,
    persistence::{PersistenceError, SaveData},
    prestige::LegacyBonuses,
    rejection::Rejection,
    reports::{CloseReport, OpenReport, RoundReport},
    security::{BouncerQuality, SecurityPolicy, SecurityTask},
    snapshot::Snapshot,
    staff::{StaffMember, StaffRole},
    systems::{
        actions, activities, credit, debt, music, night, payday, prestige, security, service,
        staffing, supplier, upgrades,
    },
    world::{CloseReason, SimulationState},
};
use crate::log::{LogLine, LogSink};

/// The engine. Owns the simulation, its random source and its log.
pub struct GameState {
    rng: StdRng,
    sim: SimulationState,
    config: EngineConfig,
    catalog: Catalog,
    log: crate::log::LogHub,
}

impl GameState {
    pub fn new_game(config: EngineConfig, catalog: Catalog) -> Result<Self> {
        GameBuilder::new(config, catalog).build()
    }

    pub fn new_game_with_seed(config: EngineConfig, catalog: Catalog, seed: u64) -> Result<Self> {
        GameBuilder::new(config, catalog).with_seed(seed).build()
    }

    pub(crate) fn new(bootstrap: GameBootstrap) -> Self {
        Self {
            rng: bootstrap.rng,
            sim: bootstrap.sim,
            config: bootstrap.config,
            catalog: bootstrap.catalog,
            log: bootstrap.log,
        }
    }

    fn ctx(&mut self) -> SimContext<'_> {
        SimContext::new(
            &mut self.sim,
            &mut self.rng,
            &self.config,
            &self.catalog,
            &mut self.log,
        )
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn is_night_open(&self) -> bool {
        self.sim.night.open
    }

    pub fn is_game_over(&self) -> bool {
        self.sim.game_over.is_some()
    }

    // ----- night loop -----

    /// Opens the doors. Pending bills are settled at their minimums first.
    ///
    /// # Panics
    /// If the night is already open.
    pub fn open_night(&mut self) -> Result<OpenReport, Rejection> {
        assert!(
            !self.sim.night.open,
            "open_night called while the pub is already open"
        );
        if self.sim.game_over.is_some() {
            return Err(self.ctx().reject(Rejection::LicenceRevoked));
        }
        Ok(night::open_night(&mut self.ctx()))
    }

    /// Plays one round. The night closes itself when the round ends it.
    ///
    /// # Panics
    /// If the night is not open.
    pub fn play_round(&mut self) -> RoundReport {
        assert!(
            self.sim.night.open,
            "play_round called while the pub is closed"
        );
        night::play_round(&mut self.ctx())
    }

    /// Closes the night early or on schedule.
    ///
    /// # Panics
    /// If the night is not open.
    pub fn close_night(&mut self, reason: CloseReason) -> CloseReport {
        assert!(
            self.sim.night.open,
            "close_night called while the pub is closed"
        );
        night::close_night(&mut self.ctx(), reason)
    }

    /// Plays rounds until the night ends and returns the close.
    pub fn play_to_close(&mut self) -> CloseReport {
        loop {
            if let Some(close) = self.play_round().closed {
                return close;
            }
        }
    }

    // ----- commands -----

    pub fn buy_upgrade(&mut self, id: &str) -> Result<(), Rejection> {
        upgrades::buy_upgrade(&mut self.ctx(), id)
    }

    pub fn schedule_activity(&mut self, id: &str) -> Result<(), Rejection> {
        activities::schedule_activity(&mut self.ctx(), id)
    }

    /// Returns the id of the new hire.
    pub fn hire_staff(&mut self, role: StaffRole) -> Result<u32, Rejection> {
        staffing::hire_staff(&mut self.ctx(), role)
    }

    pub fn fire_staff(&mut self, id: u32) -> Result<StaffMember, Rejection> {
        staffing::fire_staff(&mut self.ctx(), id)
    }

    /// Returns how many units were ordered after clamping to rack space.
    pub fn buy_from_supplier(&mut self, item: &str, quantity: u32) -> Result<u32, Rejection> {
        supplier::buy_from_supplier(&mut self.ctx(), item, quantity)
    }

    /// Par level restored before each opening. Zero cancels the line.
    pub fn set_standing_order(&mut self, item: &str, par: u32) -> Result<u32, Rejection> {
        supplier::set_standing_order(&mut self.ctx(), item, par)
    }

    pub fn resolve_action(&mut self, id: &str) -> Result<ActionOutcome, Rejection> {
        actions::resolve_action(&mut self.ctx(), id)
    }

    /// Actions usable right now, with the rounds left on any cooldown.
    pub fn available_actions(&mut self) -> Vec<(ActionDef, u32)> {
        let ctx = self.ctx();
        actions::available_actions(&ctx)
            .into_iter()
            .map(|(def, cooldown)| (def.clone(), cooldown))
            .collect()
    }

    pub fn apply_payday_payments(
        &mut self,
        selections: &[BillSelection],
    ) -> Result<PaydayOutcome, Rejection> {
        payday::apply_payments(&mut self.ctx(), selections)
    }

    pub fn set_price_multiplier(&mut self, value: f64) -> Result<f64, Rejection> {
        service::set_price_multiplier(&mut self.ctx(), value)
    }

    pub fn set_security_policy(&mut self, policy: SecurityPolicy) {
        security::set_policy(&mut self.ctx(), policy);
    }

    /// Returns the new security level.
    pub fn upgrade_security(&mut self) -> Result<i32, Rejection> {
        security::upgrade_security(&mut self.ctx())
    }

    pub fn hire_bouncer(&mut self) -> Result<BouncerQuality, Rejection> {
        security::hire_bouncer(&mut self.ctx())
    }

    /// Queues a door task for the next round.
    pub fn resolve_security_task(&mut self, task: SecurityTask) -> Result<SecurityTask, Rejection> {
        security::resolve_security_task(&mut self.ctx(), task)
    }

    /// Every task with why it is refused right now and its cooldown.
    pub fn security_tasks(&self) -> Vec<(SecurityTask, Result<(), Rejection>, u32)> {
        SecurityTask::ALL
            .iter()
            .map(|&task| {
                (
                    task,
                    security::task_availability(&self.sim, task),
                    self.sim.security.tasks.cooldown(task),
                )
            })
            .collect()
    }

    /// While open the profile can change once per time phase.
    pub fn set_music_profile(&mut self, profile: MusicProfile) -> Result<MusicProfile, Rejection> {
        music::set_music_profile(&mut self.ctx(), profile)
    }

    /// Banks a prestige star. Returns what was added to the legacy.
    pub fn prestige(&mut self) -> Result<LegacyBonuses, Rejection> {
        prestige::prestige(&mut self.ctx())
    }

    /// What prestiging now would bank.
    pub fn prestige_preview(&self) -> LegacyBonuses {
        prestige::award(&self.sim, &self.config)
    }

    /// Returns the id of the new credit line.
    pub fn open_credit_line(&mut self, bank: &str) -> Result<u32, Rejection> {
        credit::open_credit_line(&mut self.ctx(), bank)
    }

    /// Returns the amount actually repaid.
    pub fn repay_credit_line(&mut self, id: u32, amount: f64) -> Result<f64, Rejection> {
        credit::repay_credit_line(&mut self.ctx(), id, amount)
    }

    /// Returns the cash advanced.
    pub fn take_loan_shark(&mut self) -> Result<f64, Rejection> {
        credit::take_loan_shark(&mut self.ctx())
    }

    /// Returns the names of repossessed upgrades.
    pub fn declare_bankruptcy(&mut self) -> Result<Vec<String>, Rejection> {
        if self.sim.night.open {
            return Err(self.ctx().reject(Rejection::PubOpen));
        }
        let repossessed = debt::declare_bankruptcy(&mut self.ctx());
        info!(week = self.sim.calendar.week(), "bankruptcy declared");
        Ok(repossessed)
    }

    // ----- read models -----

    pub fn pending_bills(&self) -> &[PaydayBill] {
        &self.sim.bills
    }

    /// Milestones earned this run, oldest first.
    pub fn milestones(&self) -> &[Milestone] {
        &self.sim.milestones.achieved
    }

    /// Each rival with this week's stance; `None` before the first week settles.
    pub fn rivals(&self) -> Vec<(&'static str, Option<RivalStance>)> {
        DISTRICT_RIVALS
            .iter()
            .enumerate()
            .map(|(i, rival)| (rival.name, self.sim.district.stances.get(i).copied()))
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(&self.sim, &self.config)
    }

    /// Takes every buffered log line, oldest first.
    pub fn drain_log(&mut self) -> Vec<LogLine> {
        self.log.drain()
    }

    pub fn recent_log(&self) -> impl Iterator<Item = &LogLine> {
        self.log.recent()
    }

    pub fn attach_sink(&mut self, sink: Box<dyn LogSink>) {
        self.log.attach(sink);
    }

    // ----- persistence -----

    /// Reseeds the engine from a fresh draw and stores that seed, so a loaded copy
    /// continues exactly as this one will.
    fn reseed_for_save(&mut self) -> SaveData {
        let seed: u64 = self.rng.r#gen();
        self.rng = StdRng::seed_from_u64(seed);
        SaveData::new(seed, self.sim.clone())
    }

    pub fn save_json(&mut self) -> Result<String, PersistenceError> {
        self.reseed_for_save().to_json()
    }

    pub fn save_bytes(&mut self) -> Result<Vec<u8>, PersistenceError> {
        self.reseed_for_save().to_bytes()
    }

    /// Restores a saved game over this engine's config and catalog.
    pub fn load_json(
        config: EngineConfig,
        catalog: Catalog,
        text: &str,
    ) -> Result<Self, PersistenceError> {
        Ok(Self::from_save(config, catalog, SaveData::from_json(text)?))
    }

    pub fn load_bytes(
        config: EngineConfig,
        catalog: Catalog,
        bytes: &[u8],
    ) -> Result<Self, PersistenceError> {
        Ok(Self::from_save(config, catalog, SaveData::from_bytes(bytes)?))
    }

    fn from_save(config: EngineConfig, catalog: Catalog, data: SaveData) -> Self {
        let mut game = Self {
            rng: StdRng::seed_from_u64(data.rng_seed),
            sim: data.state,
            config,
            catalog,
            log: crate::log::LogHub::default(),
        };
        let (week, night) = (game.sim.calendar.week(), game.sim.calendar.night_count());
        game.log
            .info(format!("Loaded {}: week {week}, night {night}.", game.sim.pub_name));
        game
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn game(seed: u64) -> GameState {
        GameBuilder::from_embedded()
            .unwrap()
            .with_seed(seed)
            .build()
            .unwrap()
    }

    #[test]
    #[should_panic(expected = "already open")]
    fn opening_twice_panics() {
        let mut game = game(1);
        game.open_night().unwrap();
        let _ = game.open_night();
    }

    #[test]
    #[should_panic(expected = "pub is closed")]
    fn playing_while_closed_panics() {
        let mut game = game(1);
        game.play_round();
    }

    #[test]
    fn a_night_runs_to_closing_time() {
        let mut game = game(5);
        game.open_night().unwrap();
        assert!(game.is_night_open());
        let close = game.play_to_close();
        assert!(!game.is_night_open());
        assert!(close.rounds_played >= 1);
        assert!(close.rounds_played <= game.config().closing_round);
        assert_eq!(game.snapshot().night, 1);
    }

    #[test]
    fn rejections_leave_a_log_line() {
        let mut game = game(2);
        game.drain_log();
        let err = game.buy_upgrade("gold_taps").unwrap_err();
        assert!(matches!(err, Rejection::Unknown { .. }));
        let lines = game.drain_log();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].category, crate::log::LogCategory::Negative);
    }

    #[test]
    fn game_over_blocks_opening() {
        let mut game = game(3);
        game.sim.game_over = Some(super::super::world::GameOverReason::ReputationCollapse);
        assert_eq!(game.open_night(), Err(Rejection::LicenceRevoked));
    }

    #[test]
    fn bankruptcy_only_between_nights() {
        let mut game = game(4);
        game.open_night().unwrap();
        assert_eq!(game.declare_bankruptcy(), Err(Rejection::PubOpen));
        game.close_night(CloseReason::Manual);
        assert!(game.declare_bankruptcy().is_ok());
        assert_eq!(game.snapshot().credit_score, 0);
    }

    #[test]
    fn save_then_continue_matches_load_then_continue() {
        let mut source_game = game(11);
        source_game.open_night().unwrap();
        source_game.play_to_close();
        let saved = source_game.save_json().unwrap();
        let mut restored = GameState::load_json(
            source_game.config().clone(),
            source_game.catalog().clone(),
            &saved,
        )
        .unwrap();

        source_game.open_night().unwrap();
        let a = source_game.play_to_close();
        restored.open_night().unwrap();
        let b = restored.play_to_close();
        assert_eq!(a, b);
        assert_eq!(source_game.snapshot(), restored.snapshot());
    }
}
