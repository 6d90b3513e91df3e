use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow, ensure};
use serde::{Deserialize, Serialize};

use super::{
    actions::{ActionDef, MAX_ACTION_TIER},
    identity::IdentityKind,
    inventory::StockKind,
    staff::StaffRole,
    upgrades::UpgradeDef,
};

const EMBEDDED_UPGRADES: &str = include_str!("../../../config/catalog/upgrades.yaml");
const EMBEDDED_ACTIONS: &str = include_str!("../../../config/catalog/actions.yaml");
const EMBEDDED_BANKS: &str = include_str!("../../../config/catalog/banks.yaml");
const EMBEDDED_STAFF: &str = include_str!("../../../config/catalog/staff.yaml");
const EMBEDDED_STOCK: &str = include_str!("../../../config/catalog/stock.yaml");
const EMBEDDED_ACTIVITIES: &str = include_str!("../../../config/catalog/activities.yaml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankDef {
    pub id: String,
    pub name: String,
    pub limit: (f64, f64),
    pub apr: (f64, f64),
    #[serde(default)]
    pub min_score: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleTemplate {
    pub role: StaffRole,
    pub capacity: (i32, i32),
    pub skill: (i32, i32),
    pub rep: (i32, i32),
    pub wage: (f64, f64),
    #[serde(default = "RoleTemplate::default_multiplier")]
    pub capacity_multiplier: (f64, f64),
    #[serde(default)]
    pub tip_rate: (f64, f64),
    #[serde(default)]
    pub tip_bonus: f64,
    #[serde(default)]
    pub security_bonus: i32,
    #[serde(default)]
    pub chaos_tolerance: i32,
    #[serde(default = "RoleTemplate::default_morale")]
    pub starting_morale: f64,
    #[serde(default)]
    pub inn_coverage: u32,
}

impl RoleTemplate {
    fn default_multiplier() -> (f64, f64) {
        (1.0, 1.0)
    }

    fn default_morale() -> f64 {
        70.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockItemDef {
    pub id: String,
    pub name: String,
    pub kind: StockKind,
    pub base_cost: f64,
    pub sell_price: f64,
    #[serde(default = "StockItemDef::default_quality")]
    pub quality: i32,
    pub shelf_life_days: u32,
}

impl StockItemDef {
    fn default_quality() -> i32 {
        1
    }
}

/// A themed night booked in advance; it goes live at the next open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityDef {
    pub id: String,
    pub name: String,
    pub cost: f64,
    #[serde(default)]
    pub traffic: f64,
    #[serde(default)]
    pub bar_capacity: i32,
    #[serde(default)]
    pub rep: i32,
    #[serde(default)]
    pub event_chance: i32,
    #[serde(default)]
    pub risk: f64,
    #[serde(default)]
    pub tip_bonus: f64,
    #[serde(default)]
    pub identity: Option<IdentityKind>,
    #[serde(default = "ActivityDef::default_signal")]
    pub identity_signal: f64,
    #[serde(default)]
    pub min_pub_level: u8,
    #[serde(default)]
    pub requires_upgrade: Option<String>,
}

impl ActivityDef {
    fn default_signal() -> f64 {
        1.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    upgrades: Vec<UpgradeDef>,
    #[serde(default)]
    actions: Vec<ActionDef>,
    #[serde(default)]
    banks: Vec<BankDef>,
    #[serde(default)]
    roles: Vec<RoleTemplate>,
    #[serde(default)]
    stock: Vec<StockItemDef>,
    #[serde(default)]
    activities: Vec<ActivityDef>,
}

/// Static content: what can be bought, hired, booked and borrowed.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub upgrades: Vec<UpgradeDef>,
    pub actions: Vec<ActionDef>,
    pub banks: Vec<BankDef>,
    pub roles: Vec<RoleTemplate>,
    pub stock: Vec<StockItemDef>,
    pub activities: Vec<ActivityDef>,
}

impl Catalog {
    pub fn from_embedded() -> Result<Self> {
        let mut catalog = Catalog::default();
        let sources = [
            ("upgrades", EMBEDDED_UPGRADES),
            ("actions", EMBEDDED_ACTIONS),
            ("banks", EMBEDDED_BANKS),
            ("staff", EMBEDDED_STAFF),
            ("stock", EMBEDDED_STOCK),
            ("activities", EMBEDDED_ACTIVITIES),
        ];
        for (name, content) in sources {
            let file: CatalogFile = serde_yaml::from_str(content)
                .with_context(|| format!("failed to parse embedded catalog file: {name}"))?;
            catalog.absorb(file);
        }
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let path = dir.as_ref();
        if !path.exists() {
            return Err(anyhow!("catalog directory does not exist: {}", path.display()));
        }

        let mut catalog = Catalog::default();
        let mut entries: Vec<_> = fs::read_dir(path)
            .with_context(|| format!("failed to read catalog directory: {}", path.display()))?
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort_by_key(|entry| entry.path());
        for entry in entries {
            let entry_path = entry.path();
            if !is_yaml_file(&entry_path) {
                continue;
            }
            let content = fs::read_to_string(&entry_path)
                .with_context(|| format!("failed to read file: {}", entry_path.display()))?;
            let file: CatalogFile = serde_yaml::from_str(&content)
                .with_context(|| format!("failed to parse catalog YAML: {}", entry_path.display()))?;
            catalog.absorb(file);
        }
        catalog.validate()?;
        Ok(catalog)
    }

    fn absorb(&mut self, file: CatalogFile) {
        self.upgrades.extend(file.upgrades);
        self.actions.extend(file.actions);
        self.banks.extend(file.banks);
        self.roles.extend(file.roles);
        self.stock.extend(file.stock);
        self.activities.extend(file.activities);
    }

    pub fn validate(&self) -> Result<()> {
        ensure_unique("upgrade", self.upgrades.iter().map(|u| u.id.as_str()))?;
        ensure_unique("action", self.actions.iter().map(|a| a.id.as_str()))?;
        ensure_unique("bank", self.banks.iter().map(|b| b.id.as_str()))?;
        ensure_unique("stock item", self.stock.iter().map(|s| s.id.as_str()))?;
        ensure_unique("activity", self.activities.iter().map(|a| a.id.as_str()))?;

        for upgrade in &self.upgrades {
            ensure!(upgrade.cost >= 0.0, "upgrade {} has a negative cost", upgrade.id);
            ensure!(
                (1..=4).contains(&upgrade.install_nights),
                "upgrade {} must install in 1-4 nights",
                upgrade.id
            );
            if let Some(required) = &upgrade.requires {
                ensure!(
                    self.upgrade(required).is_some(),
                    "upgrade {} requires unknown upgrade {}",
                    upgrade.id,
                    required
                );
            }
        }
        for action in &self.actions {
            ensure!(
                (1..=MAX_ACTION_TIER).contains(&action.tier),
                "action {} has tier {} outside 1-{}",
                action.id,
                action.tier,
                MAX_ACTION_TIER
            );
            ensure!(
                (0.0..=1.0).contains(&action.base_chance),
                "action {} has an invalid base chance",
                action.id
            );
        }
        for bank in &self.banks {
            ensure!(
                bank.limit.0 > 0.0 && bank.limit.0 <= bank.limit.1,
                "bank {} has an invalid limit range",
                bank.id
            );
            ensure!(
                bank.apr.0 >= 0.0 && bank.apr.0 <= bank.apr.1,
                "bank {} has an invalid APR range",
                bank.id
            );
        }
        for role in StaffRole::ALL {
            ensure!(
                self.role(role).is_some(),
                "no staff template for role {}",
                role.key()
            );
        }
        for template in &self.roles {
            ensure!(
                template.wage.0 > 0.0 && template.wage.0 <= template.wage.1,
                "role {} has an invalid wage range",
                template.role.key()
            );
        }
        for item in &self.stock {
            ensure!(
                item.sell_price > 0.0 && item.base_cost > 0.0,
                "stock item {} needs positive prices",
                item.id
            );
            ensure!(item.shelf_life_days > 0, "stock item {} never keeps", item.id);
        }
        for activity in &self.activities {
            if let Some(required) = &activity.requires_upgrade {
                ensure!(
                    self.upgrade(required).is_some(),
                    "activity {} requires unknown upgrade {}",
                    activity.id,
                    required
                );
            }
        }
        ensure!(
            self.stock.iter().any(|item| item.kind == StockKind::Drink),
            "the catalog needs at least one drink"
        );
        Ok(())
    }

    pub fn upgrade(&self, id: &str) -> Option<&UpgradeDef> {
        self.upgrades.iter().find(|u| u.id.eq_ignore_ascii_case(id))
    }

    pub fn action(&self, id: &str) -> Option<&ActionDef> {
        self.actions.iter().find(|a| a.id.eq_ignore_ascii_case(id))
    }

    pub fn bank(&self, id: &str) -> Option<&BankDef> {
        self.banks.iter().find(|b| b.id.eq_ignore_ascii_case(id))
    }

    pub fn role(&self, role: StaffRole) -> Option<&RoleTemplate> {
        self.roles.iter().find(|t| t.role == role)
    }

    pub fn stock_item(&self, id: &str) -> Option<&StockItemDef> {
        self.stock.iter().find(|s| s.id.eq_ignore_ascii_case(id))
    }

    pub fn activity(&self, id: &str) -> Option<&ActivityDef> {
        self.activities.iter().find(|a| a.id.eq_ignore_ascii_case(id))
    }

    pub fn stock_of_kind(&self, kind: StockKind) -> impl Iterator<Item = &StockItemDef> {
        self.stock.iter().filter(move |item| item.kind == kind)
    }

    pub fn actions_up_to_tier(&self, tier: u8) -> impl Iterator<Item = &ActionDef> {
        self.actions.iter().filter(move |a| a.tier <= tier)
    }
}

fn ensure_unique<'a>(kind: &str, ids: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for id in ids {
        ensure!(
            seen.insert(id.to_ascii_lowercase()),
            "duplicate {kind} id: {id}"
        );
    }
    Ok(())
}

fn is_yaml_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|s| s.to_str()),
        Some("yaml" | "yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_catalog_is_valid() {
        let catalog = Catalog::from_embedded().expect("embedded catalog");
        assert!(catalog.upgrade("cctv").is_some());
        assert!(catalog.upgrade("kitchen_base").is_some());
        assert_eq!(catalog.banks.len(), 6);
        assert!(catalog.role(StaffRole::HeadChef).is_some());
        assert!(catalog.stock_of_kind(StockKind::Food).count() > 0);
        assert!(catalog.actions_up_to_tier(1).count() >= 3);
    }

    #[test]
    fn lookups_ignore_case() {
        let catalog = Catalog::from_embedded().expect("embedded catalog");
        assert!(catalog.bank("TOWNLAND").is_some());
        assert!(catalog.upgrade("CCTV").is_some());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let mut catalog = Catalog::from_embedded().expect("embedded catalog");
        let copy = catalog.upgrades[0].clone();
        catalog.upgrades.push(copy);
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn missing_prerequisite_is_rejected() {
        let mut catalog = Catalog::from_embedded().expect("embedded catalog");
        catalog.upgrades[0].requires = Some("does_not_exist".into());
        let err = catalog.validate().expect_err("should fail");
        assert!(err.to_string().contains("does_not_exist"));
    }

    #[test]
    fn partial_files_deserialise() {
        let yaml = r#"
banks:
  - id: test
    name: Test Bank
    limit: [100, 200]
    apr: [0.05, 0.06]
"#;
        let file: CatalogFile = serde_yaml::from_str(yaml).expect("parse");
        assert_eq!(file.banks.len(), 1);
        assert!(file.upgrades.is_empty());
        assert_eq!(file.banks[0].min_score, 0);
    }
}
