//! Read-only view of a game for front ends. Built fresh on every call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    bills::PaydayBill,
    config::EngineConfig,
    credit::CreditLine,
    district::DistrictState,
    identity::IdentityKind,
    milestones::Milestone,
    music::{MusicEffects, MusicProfile},
    prestige::LegacyBonuses,
    regulars::VipRegular,
    rumor::RumorInstance,
    security::{SecurityBreakdown, SecurityPolicy, SecurityTask},
    staff::{Department, StaffRole},
    systems::{chaos, music, prestige, security},
    world::{GameOverReason, ServiceCounters, SimulationState},
};
use crate::time::TimeOfDay;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffSummary {
    pub id: u32,
    pub name: String,
    pub role: StaffRole,
    pub level: u32,
    pub morale: f64,
    pub weekly_wage: f64,
    pub accrued_wage: f64,
    pub off_sick: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MoraleSummary {
    pub team: f64,
    pub front_of_house: f64,
    pub kitchen: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub pub_name: String,
    pub cash: f64,
    pub total_debt: f64,
    pub credit_score: i32,
    pub credit_lines: Vec<CreditLine>,
    /// Drawn share of the combined bank limits.
    pub credit_utilisation: f64,
    pub shark_balance: f64,
    pub supplier_balance: f64,
    pub reputation: i32,
    pub chaos: f64,
    pub chaos_label: &'static str,
    pub morale: MoraleSummary,
    pub fatigue: f64,
    pub weekday: &'static str,
    pub day_index: u8,
    pub week: u32,
    pub night: u32,
    pub round: u32,
    pub time: TimeOfDay,
    pub open: bool,
    pub closing_round: u32,
    pub identity: Option<IdentityKind>,
    pub debt_tier: u8,
    pub bankrupt: bool,
    pub staff: Vec<StaffSummary>,
    pub patrons_inside: usize,
    pub bar_capacity: u32,
    pub security: SecurityBreakdown,
    pub security_policy: SecurityPolicy,
    pub bouncers: usize,
    /// Door task queued for the next round or running in this one.
    pub security_task: Option<SecurityTask>,
    pub music: Option<MusicProfile>,
    /// What the music does to the current round; silent while closed.
    pub music_effects: MusicEffects,
    pub tonight: ServiceCounters,
    pub this_week: ServiceCounters,
    pub rumors: Vec<RumorInstance>,
    pub pending_bills: Vec<PaydayBill>,
    pub pub_level: u8,
    pub price_multiplier: f64,
    pub upgrades: Vec<String>,
    pub activity_booked: Option<String>,
    pub activity_tonight: Option<String>,
    pub drinks_in_stock: u32,
    pub food_in_stock: u32,
    pub stock: BTreeMap<String, u32>,
    pub standing_order: BTreeMap<String, u32>,
    pub milestones: Vec<Milestone>,
    pub stars: u8,
    pub legacy: LegacyBonuses,
    pub prestige_ready: bool,
    pub district: DistrictState,
    pub vips: Vec<VipRegular>,
    pub game_over: Option<GameOverReason>,
}

impl Snapshot {
    pub(crate) fn capture(sim: &SimulationState, config: &EngineConfig) -> Self {
        let hours = config.service_hours();
        let roster = &sim.roster;
        let mut this_week = sim.week.counters;
        if sim.night.open {
            this_week.absorb(&sim.night.counters);
        }

        Snapshot {
            pub_name: sim.pub_name.clone(),
            cash: sim.ledger.cash(),
            total_debt: sim.credit.total_debt(),
            credit_score: sim.credit.score,
            credit_lines: sim.credit.lines.clone(),
            credit_utilisation: sim.credit.utilisation(),
            shark_balance: sim.credit.shark_balance(),
            supplier_balance: sim.credit.supplier.balance,
            reputation: sim.reputation,
            chaos: sim.chaos.value(),
            chaos_label: chaos::chaos_label(sim.chaos.value()),
            morale: MoraleSummary {
                team: roster.team_morale(),
                front_of_house: roster.pool_morale(Department::FrontOfHouse),
                kitchen: roster.pool_morale(Department::Kitchen),
            },
            fatigue: sim.staffing.fatigue,
            weekday: sim.calendar.weekday().label(),
            day_index: sim.calendar.day_index(),
            week: sim.calendar.week(),
            night: sim.calendar.night_count(),
            round: sim.night.round,
            time: hours.time_at(sim.night.round),
            open: sim.night.open,
            closing_round: hours.closing_round,
            identity: sim.identity.current(),
            debt_tier: sim.debt.tier(),
            bankrupt: sim.debt.bankrupt,
            staff: roster
                .iter()
                .map(|m| StaffSummary {
                    id: m.id,
                    name: m.name(),
                    role: m.role,
                    level: m.level,
                    morale: m.morale,
                    weekly_wage: m.weekly_wage,
                    accrued_wage: m.accrued_wage,
                    off_sick: m.off_sick,
                })
                .collect(),
            patrons_inside: sim.night.patrons_inside(),
            bar_capacity: sim.night.bar_capacity,
            security: security::breakdown(sim),
            security_policy: sim.security.policy,
            bouncers: sim.security.door.len(),
            security_task: sim.security.tasks.queued.map(|(task, _)| task),
            music: sim.music.current,
            music_effects: music::round_effects(sim, config),
            tonight: sim.night.counters,
            this_week,
            rumors: sim.rumors.instances().to_vec(),
            pending_bills: sim.bills.clone(),
            pub_level: sim.pub_level,
            price_multiplier: sim.price_multiplier,
            upgrades: sim.upgrades.owned.clone(),
            activity_booked: sim.activity.pending.clone(),
            activity_tonight: sim.activity.tonight.clone(),
            drinks_in_stock: sim.inventory.drinks.count(),
            food_in_stock: sim.inventory.food.count(),
            stock: sim
                .inventory
                .drinks
                .summary()
                .into_iter()
                .chain(sim.inventory.food.summary())
                .collect(),
            standing_order: sim.inventory.standing_order.clone(),
            milestones: sim.milestones.achieved.clone(),
            stars: sim.prestige.stars,
            legacy: sim.prestige.legacy,
            prestige_ready: prestige::is_eligible(sim),
            district: sim.district.clone(),
            vips: sim.vips.regulars.clone(),
            game_over: sim.game_over,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over.is_some()
    }
}
