mod actions;
mod bills;
mod bootstrap;
mod catalog;
mod config;
mod constants;
pub(crate) use constants::*;
mod context;
mod credit;
mod debt;
mod district;
mod economy;
mod identity;
mod inventory;
mod milestones;
mod music;
mod patrons;
mod persistence;
mod prestige;
mod regulars;
mod rejection;
mod reports;
mod rumor;
mod security;
mod snapshot;
mod staff;
mod state;
pub(crate) mod systems;
mod upgrades;
mod world;

pub use actions::{ActionCategory, ActionDef, ActionOutcome, ActionRange, landlord_style_label};
pub use bills::{
    BillKind, BillSelection, FundingSource, PaydayBill, PaydayOutcome, PaymentAmount,
};
pub use bootstrap::GameBuilder;
pub use catalog::{ActivityDef, BankDef, Catalog, RoleTemplate, StockItemDef};
pub use config::EngineConfig;
pub use credit::CreditLine;
pub use district::{DistrictState, RivalStance};
pub use economy::{CostKind, RevenueKind, WeekReport};
pub use identity::IdentityKind;
pub use inventory::StockKind;
pub use milestones::Milestone;
pub use music::{MusicEffects, MusicProfile};
pub use persistence::{PersistenceError, SAVE_VERSION};
pub use prestige::LegacyBonuses;
pub use regulars::{ArcStage, VipArchetype, VipRegular};
pub use rejection::Rejection;
pub use reports::{CloseReport, OpenReport, RoundReport};
pub use rumor::{RumorInstance, RumorSource, RumorTopic};
pub use security::{BouncerQuality, SecurityBreakdown, SecurityPolicy, SecurityTask, TaskStyle};
pub use snapshot::{MoraleSummary, Snapshot, StaffSummary};
pub use staff::{Department, StaffMember, StaffRole};
pub use state::GameState;
pub use systems::chaos::chaos_label;
pub use upgrades::{UpgradeDef, UpgradeEffect};
pub use world::{CloseReason, GameOverReason, ServiceCounters};
