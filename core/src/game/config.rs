use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, ensure};
use serde::{Deserialize, Serialize};

use super::staff::StaffRole;
use crate::time::{MINUTES_PER_DAY, ServiceHours, TimeOfDay};

const EMBEDDED_ENGINE: &str = include_str!("../../../config/engine.yaml");
const ENGINE_FILE: &str = "engine.yaml";

/// Fixed parameters of a run. Built once and handed to [`super::GameBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "EngineConfig::default_pub_name")]
    pub pub_name: String,
    #[serde(default = "EngineConfig::default_starting_cash")]
    pub starting_cash: f64,
    #[serde(default = "EngineConfig::default_starting_reputation")]
    pub starting_reputation: i32,
    #[serde(default = "EngineConfig::default_starting_credit_score")]
    pub starting_credit_score: i32,
    #[serde(default = "EngineConfig::default_opening_hour")]
    pub opening_hour: u32,
    #[serde(default = "EngineConfig::default_minutes_per_round")]
    pub minutes_per_round: u32,
    #[serde(default = "EngineConfig::default_closing_round")]
    pub closing_round: u32,
    #[serde(default = "EngineConfig::default_base_traffic")]
    pub base_traffic: f64,
    #[serde(default = "EngineConfig::default_drink_rack_capacity")]
    pub drink_rack_capacity: u32,
    #[serde(default = "EngineConfig::default_food_rack_capacity")]
    pub food_rack_capacity: u32,
    #[serde(default = "EngineConfig::default_daily_rent")]
    pub daily_rent: f64,
    #[serde(default = "EngineConfig::default_security_base_level")]
    pub security_base_level: i32,
    #[serde(default = "EngineConfig::default_security_upkeep_per_level")]
    pub security_upkeep_per_level: f64,
    #[serde(default = "EngineConfig::default_bouncer_cap")]
    pub bouncer_cap: u32,
    #[serde(default = "EngineConfig::default_supplier_credit_cap")]
    pub supplier_credit_cap: f64,
    #[serde(default)]
    pub inn_rooms: u32,
    #[serde(default = "EngineConfig::default_shark_limit")]
    pub shark_limit: (f64, f64),
    #[serde(default = "EngineConfig::default_shark_apr")]
    pub shark_apr: (f64, f64),
    #[serde(default = "EngineConfig::default_starting_staff")]
    pub starting_staff: Vec<StaffRole>,
    #[serde(default)]
    pub starting_stock: BTreeMap<String, u32>,
    /// Par levels the supplier restores before every opening.
    #[serde(default)]
    pub standing_order: BTreeMap<String, u32>,
}

impl EngineConfig {
    fn default_pub_name() -> String {
        "The Crooked Anchor".to_string()
    }

    fn default_starting_cash() -> f64 {
        650.0
    }

    fn default_starting_reputation() -> i32 {
        10
    }

    fn default_starting_credit_score() -> i32 {
        620
    }

    fn default_opening_hour() -> u32 {
        11
    }

    fn default_minutes_per_round() -> u32 {
        36
    }

    fn default_closing_round() -> u32 {
        20
    }

    fn default_base_traffic() -> f64 {
        1.0
    }

    fn default_drink_rack_capacity() -> u32 {
        80
    }

    fn default_food_rack_capacity() -> u32 {
        30
    }

    fn default_daily_rent() -> f64 {
        28.0
    }

    fn default_security_base_level() -> i32 {
        1
    }

    fn default_security_upkeep_per_level() -> f64 {
        super::SECURITY_UPKEEP_PER_LEVEL
    }

    fn default_bouncer_cap() -> u32 {
        2
    }

    fn default_supplier_credit_cap() -> f64 {
        900.0
    }

    fn default_shark_limit() -> (f64, f64) {
        (2000.0, 6000.0)
    }

    fn default_shark_apr() -> (f64, f64) {
        (0.18, 0.35)
    }

    fn default_starting_staff() -> Vec<StaffRole> {
        vec![StaffRole::Experienced, StaffRole::Trainee, StaffRole::Trainee]
    }

    pub fn from_embedded() -> Result<Self> {
        Self::from_yaml(EMBEDDED_ENGINE).context("failed to parse embedded engine config")
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: EngineConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `engine.yaml` from `dir`.
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let path = dir.as_ref().join(ENGINE_FILE);
        if !path.exists() {
            return Err(anyhow!("engine config not found: {}", path.display()));
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("failed to read file: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("failed to parse engine config: {}", path.display()))
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(!self.pub_name.trim().is_empty(), "the pub needs a name");
        ensure!(self.starting_cash >= 0.0, "starting cash cannot be negative");
        ensure!(self.opening_hour < 24, "opening hour must be 0-23");
        ensure!(self.minutes_per_round > 0, "a round must last at least a minute");
        ensure!(self.closing_round > 0, "a night needs at least one round");
        ensure!(
            self.opening_hour * 60 + self.closing_round * self.minutes_per_round <= MINUTES_PER_DAY,
            "service hours must end before midnight"
        );
        ensure!(self.base_traffic > 0.0, "base traffic must be positive");
        ensure!(self.drink_rack_capacity > 0, "the drinks rack needs room");
        ensure!(self.daily_rent >= 0.0, "rent cannot be negative");
        ensure!(self.supplier_credit_cap >= 0.0, "supplier credit cannot be negative");
        ensure!(
            self.shark_limit.0 > 0.0 && self.shark_limit.0 <= self.shark_limit.1,
            "invalid loan shark limit range"
        );
        ensure!(
            self.shark_apr.0 >= 0.0 && self.shark_apr.0 <= self.shark_apr.1,
            "invalid loan shark APR range"
        );
        Ok(())
    }

    pub fn service_hours(&self) -> ServiceHours {
        let opening = TimeOfDay::new(self.opening_hour, 0);
        ServiceHours {
            opening,
            last_orders: opening.plus_minutes(self.closing_round * self.minutes_per_round),
            minutes_per_round: self.minutes_per_round,
            closing_round: self.closing_round,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            pub_name: Self::default_pub_name(),
            starting_cash: Self::default_starting_cash(),
            starting_reputation: Self::default_starting_reputation(),
            starting_credit_score: Self::default_starting_credit_score(),
            opening_hour: Self::default_opening_hour(),
            minutes_per_round: Self::default_minutes_per_round(),
            closing_round: Self::default_closing_round(),
            base_traffic: Self::default_base_traffic(),
            drink_rack_capacity: Self::default_drink_rack_capacity(),
            food_rack_capacity: Self::default_food_rack_capacity(),
            daily_rent: Self::default_daily_rent(),
            security_base_level: Self::default_security_base_level(),
            security_upkeep_per_level: Self::default_security_upkeep_per_level(),
            bouncer_cap: Self::default_bouncer_cap(),
            supplier_credit_cap: Self::default_supplier_credit_cap(),
            inn_rooms: 0,
            shark_limit: Self::default_shark_limit(),
            shark_apr: Self::default_shark_apr(),
            starting_staff: Self::default_starting_staff(),
            starting_stock: BTreeMap::new(),
            standing_order: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_parses() {
        let config = EngineConfig::from_embedded().expect("embedded config");
        assert_eq!(config.closing_round, 20);
        assert_eq!(config.minutes_per_round, 36);
        assert_eq!(config.starting_staff.len(), 3);
        assert!(config.starting_stock.contains_key("lager"));
        for (item, par) in &config.standing_order {
            assert!(*par <= config.drink_rack_capacity, "{item} par exceeds the rack");
        }
        let stocked: u32 = config.starting_stock.values().sum();
        assert!(stocked <= config.drink_rack_capacity);
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config = EngineConfig::from_yaml("pub_name: The Test Arms\n").expect("parse");
        assert_eq!(config.pub_name, "The Test Arms");
        assert_eq!(config.daily_rent, 28.0);
        assert_eq!(config.shark_apr, (0.18, 0.35));
    }

    #[test]
    fn service_hours_span_the_night() {
        let hours = EngineConfig::default().service_hours();
        assert_eq!(hours.opening.to_string(), "11:00");
        assert_eq!(hours.last_orders.to_string(), "23:00");
        assert_eq!(hours.time_at(11).to_string(), "17:36");
    }

    #[test]
    fn rejects_a_night_past_midnight() {
        let yaml = "opening_hour: 20\nclosing_round: 20\n";
        assert!(EngineConfig::from_yaml(yaml).is_err());
    }
}
