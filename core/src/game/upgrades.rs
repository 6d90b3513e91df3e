use serde::{Deserialize, Serialize};

/// One effect an owned upgrade contributes. Values add up across the owned set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum UpgradeEffect {
    ServeCapacity(i32),
    BarCapacity(i32),
    Security(i32),
    IncidentChanceReduction(f64),
    DamageReduction(f64),
    RepMitigation(f64),
    MoraleStability(f64),
    TrafficBonus(f64),
    RepDrift(i32),
    EventChance(i32),
    DrinkRack(u32),
    FoodRack(u32),
    FrontOfHouseCap(u32),
    KitchenCap(u32),
    BouncerCap(u32),
    UnlockKitchen,
    UnlockInn,
    InnRooms(u32),
    MisconductReduction(f64),
    WageEfficiency(f64),
    RefundReduction(f64),
    ChaosReduction(f64),
    TipBonus(f64),
    FoodQuality(i32),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeDef {
    pub id: String,
    pub name: String,
    pub cost: f64,
    #[serde(default = "UpgradeDef::default_install_nights")]
    pub install_nights: u32,
    #[serde(default)]
    pub requires: Option<String>,
    #[serde(default)]
    pub min_pub_level: u8,
    #[serde(default)]
    pub effects: Vec<UpgradeEffect>,
}

impl UpgradeDef {
    fn default_install_nights() -> u32 {
        1
    }

    pub fn summary(&self) -> String {
        let mut parts = Vec::new();
        for effect in &self.effects {
            parts.push(describe(effect));
        }
        if parts.is_empty() {
            format!("{} | GBP {:.0}", self.name, self.cost)
        } else {
            format!("{} | GBP {:.0} | {}", self.name, self.cost, parts.join(", "))
        }
    }
}

fn describe(effect: &UpgradeEffect) -> String {
    let pct = |v: f64| (v * 100.0).round() as i64;
    match *effect {
        UpgradeEffect::ServeCapacity(v) => format!("serve +{v}"),
        UpgradeEffect::BarCapacity(v) => format!("bar +{v}"),
        UpgradeEffect::Security(v) => format!("sec +{v}"),
        UpgradeEffect::IncidentChanceReduction(v) => format!("incidents -{}%", pct(v)),
        UpgradeEffect::DamageReduction(v) => format!("damage -{}%", pct(v)),
        UpgradeEffect::RepMitigation(v) => format!("rep hits -{}%", pct(v)),
        UpgradeEffect::MoraleStability(v) => format!("morale stability +{}%", pct(v)),
        UpgradeEffect::TrafficBonus(v) => format!("traffic +{}%", pct(v)),
        UpgradeEffect::RepDrift(v) => format!("rep drift {v:+}"),
        UpgradeEffect::EventChance(v) => format!("events +{v}%"),
        UpgradeEffect::DrinkRack(v) => format!("drinks rack +{v}"),
        UpgradeEffect::FoodRack(v) => format!("food rack +{v}"),
        UpgradeEffect::FrontOfHouseCap(v) => format!("bar staff +{v}"),
        UpgradeEffect::KitchenCap(v) => format!("kitchen staff +{v}"),
        UpgradeEffect::BouncerCap(v) => format!("bouncers +{v}"),
        UpgradeEffect::UnlockKitchen => "unlocks kitchen".to_string(),
        UpgradeEffect::UnlockInn => "unlocks inn".to_string(),
        UpgradeEffect::InnRooms(v) => format!("rooms +{v}"),
        UpgradeEffect::MisconductReduction(v) => format!("misconduct -{}%", pct(v)),
        UpgradeEffect::WageEfficiency(v) => format!("wages -{}%", pct(v)),
        UpgradeEffect::RefundReduction(v) => format!("refunds -{}%", pct(v)),
        UpgradeEffect::ChaosReduction(v) => format!("chaos -{}%", pct(v)),
        UpgradeEffect::TipBonus(v) => format!("tips +{}%", pct(v)),
        UpgradeEffect::FoodQuality(v) => format!("food quality +{v}"),
    }
}

/// Every upgrade effect folded into named fields, rebuilt from the owned set at each open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpgradeEffects {
    pub serve_capacity: i32,
    pub bar_capacity: i32,
    pub security: i32,
    pub incident_chance_multiplier: f64,
    pub damage_reduction: f64,
    pub rep_mitigation: f64,
    pub morale_stability: f64,
    pub traffic_multiplier: f64,
    pub rep_drift: i32,
    pub event_chance: i32,
    pub drink_rack: u32,
    pub food_rack: u32,
    pub foh_cap: u32,
    pub kitchen_cap: u32,
    pub bouncer_cap: u32,
    pub kitchen_unlocked: bool,
    pub inn_unlocked: bool,
    pub inn_rooms: u32,
    pub misconduct_reduction: f64,
    pub wage_efficiency: f64,
    pub refund_reduction: f64,
    pub chaos_reduction: f64,
    pub tip_bonus: f64,
    pub food_quality: i32,
}

impl Default for UpgradeEffects {
    fn default() -> Self {
        Self {
            serve_capacity: 0,
            bar_capacity: 0,
            security: 0,
            incident_chance_multiplier: 1.0,
            damage_reduction: 0.0,
            rep_mitigation: 0.0,
            morale_stability: 0.0,
            traffic_multiplier: 1.0,
            rep_drift: 0,
            event_chance: 0,
            drink_rack: 0,
            food_rack: 0,
            foh_cap: 0,
            kitchen_cap: 0,
            bouncer_cap: 0,
            kitchen_unlocked: false,
            inn_unlocked: false,
            inn_rooms: 0,
            misconduct_reduction: 0.0,
            wage_efficiency: 0.0,
            refund_reduction: 0.0,
            chaos_reduction: 0.0,
            tip_bonus: 0.0,
            food_quality: 0,
        }
    }
}

impl UpgradeEffects {
    pub fn from_upgrades<'a>(upgrades: impl IntoIterator<Item = &'a UpgradeDef>) -> Self {
        let mut effects = Self::default();
        for upgrade in upgrades {
            for effect in &upgrade.effects {
                effects.absorb(*effect);
            }
        }
        effects.clamp_percentages();
        effects
    }

    fn absorb(&mut self, effect: UpgradeEffect) {
        match effect {
            UpgradeEffect::ServeCapacity(v) => self.serve_capacity += v,
            UpgradeEffect::BarCapacity(v) => self.bar_capacity += v,
            UpgradeEffect::Security(v) => self.security += v,
            UpgradeEffect::IncidentChanceReduction(v) => {
                self.incident_chance_multiplier *= 1.0 - v.clamp(0.0, 0.9)
            }
            UpgradeEffect::DamageReduction(v) => self.damage_reduction += v,
            UpgradeEffect::RepMitigation(v) => self.rep_mitigation += v,
            UpgradeEffect::MoraleStability(v) => self.morale_stability += v,
            UpgradeEffect::TrafficBonus(v) => self.traffic_multiplier += v,
            UpgradeEffect::RepDrift(v) => self.rep_drift += v,
            UpgradeEffect::EventChance(v) => self.event_chance += v,
            UpgradeEffect::DrinkRack(v) => self.drink_rack += v,
            UpgradeEffect::FoodRack(v) => self.food_rack += v,
            UpgradeEffect::FrontOfHouseCap(v) => self.foh_cap += v,
            UpgradeEffect::KitchenCap(v) => self.kitchen_cap += v,
            UpgradeEffect::BouncerCap(v) => self.bouncer_cap += v,
            UpgradeEffect::UnlockKitchen => self.kitchen_unlocked = true,
            UpgradeEffect::UnlockInn => self.inn_unlocked = true,
            UpgradeEffect::InnRooms(v) => self.inn_rooms += v,
            UpgradeEffect::MisconductReduction(v) => self.misconduct_reduction += v,
            UpgradeEffect::WageEfficiency(v) => self.wage_efficiency += v,
            UpgradeEffect::RefundReduction(v) => self.refund_reduction += v,
            UpgradeEffect::ChaosReduction(v) => self.chaos_reduction += v,
            UpgradeEffect::TipBonus(v) => self.tip_bonus += v,
            UpgradeEffect::FoodQuality(v) => self.food_quality += v,
        }
    }

    fn clamp_percentages(&mut self) {
        self.damage_reduction = self.damage_reduction.clamp(0.0, super::MAX_DAMAGE_REDUCTION);
        self.rep_mitigation = self.rep_mitigation.clamp(0.0, 0.5);
        self.morale_stability = self.morale_stability.clamp(0.0, 0.6);
        self.misconduct_reduction = self.misconduct_reduction.clamp(0.0, 0.6);
        self.wage_efficiency = self.wage_efficiency.clamp(0.0, 0.3);
        self.refund_reduction = self.refund_reduction.clamp(0.0, 0.6);
        self.chaos_reduction = self.chaos_reduction.clamp(0.0, 0.5);
        self.incident_chance_multiplier = self.incident_chance_multiplier.max(0.5);
        if self.inn_rooms > 0 {
            self.inn_unlocked = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def(id: &str, effects: Vec<UpgradeEffect>) -> UpgradeDef {
        UpgradeDef {
            id: id.to_string(),
            name: id.to_string(),
            cost: 100.0,
            install_nights: 1,
            requires: None,
            min_pub_level: 0,
            effects,
        }
    }

    #[test]
    fn effects_accumulate() {
        let a = def(
            "a",
            vec![UpgradeEffect::Security(1), UpgradeEffect::TrafficBonus(0.05)],
        );
        let b = def(
            "b",
            vec![
                UpgradeEffect::Security(2),
                UpgradeEffect::IncidentChanceReduction(0.10),
                UpgradeEffect::IncidentChanceReduction(0.10),
            ],
        );
        let effects = UpgradeEffects::from_upgrades([&a, &b]);
        assert_eq!(effects.security, 3);
        assert!((effects.traffic_multiplier - 1.05).abs() < 1e-12);
        assert!((effects.incident_chance_multiplier - 0.81).abs() < 1e-12);
    }

    #[test]
    fn damage_reduction_is_capped() {
        let a = def("a", vec![UpgradeEffect::DamageReduction(0.3)]);
        let b = def("b", vec![UpgradeEffect::DamageReduction(0.3)]);
        let effects = UpgradeEffects::from_upgrades([&a, &b]);
        assert_eq!(effects.damage_reduction, 0.45);
    }

    #[test]
    fn effects_parse_from_yaml() {
        let yaml = r#"
id: cctv
name: CCTV System
cost: 260
install_nights: 2
effects:
  - kind: security
    value: 1
  - kind: rep_mitigation
    value: 0.06
  - kind: unlock_kitchen
"#;
        let upgrade: UpgradeDef = serde_yaml::from_str(yaml).expect("parse upgrade");
        assert_eq!(upgrade.effects.len(), 3);
        assert_eq!(upgrade.effects[2], UpgradeEffect::UnlockKitchen);
        assert!(upgrade.summary().contains("sec +1"));
    }
}
