mod game;
pub mod log;
mod scheduler;
mod time;

pub use game::{
    ActionCategory, ActionDef, ActionOutcome, ActionRange, ActivityDef, ArcStage, BankDef,
    BillKind, BillSelection, BouncerQuality, Catalog, CloseReason, CloseReport, CostKind,
    CreditLine, Department, DistrictState, EngineConfig, FundingSource, GameBuilder,
    GameOverReason, GameState, IdentityKind, LegacyBonuses, Milestone, MoraleSummary, MusicEffects,
    MusicProfile, OpenReport, PaydayBill, PaydayOutcome, PaymentAmount, PersistenceError,
    Rejection, RevenueKind, RivalStance, RoleTemplate, RoundReport, RumorInstance, RumorSource,
    RumorTopic, SAVE_VERSION, SecurityBreakdown, SecurityPolicy, SecurityTask, ServiceCounters,
    Snapshot, StaffMember, StaffRole, StaffSummary, StockItemDef, StockKind, TaskStyle, UpgradeDef,
    UpgradeEffect, VipArchetype, VipRegular, WeekReport, chaos_label, landlord_style_label,
};
pub use log::{FanOutSink, LogCategory, LogLine, LogSink, MemorySink, TracingSink};
pub use time::{TimeOfDay, TimePhase, Weekday};
