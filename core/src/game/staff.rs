use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::rejection::Rejection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Department {
    FrontOfHouse,
    Kitchen,
    Management,
    Inn,
}

impl Department {
    pub fn label(self) -> &'static str {
        match self {
            Department::FrontOfHouse => "front of house",
            Department::Kitchen => "kitchen",
            Department::Management => "management",
            Department::Inn => "inn",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoleTier {
    Junior,
    Senior,
    Specialist,
    Manager,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Trainee,
    Experienced,
    Speed,
    Charisma,
    Security,
    KitchenPorter,
    KitchenAssistant,
    ChefDePartie,
    SousChef,
    HeadChef,
    AssistantManager,
    Manager,
    ReceptionTrainee,
    Receptionist,
    Housekeeper,
    DutyManager,
}

impl StaffRole {
    pub const ALL: [StaffRole; 16] = [
        StaffRole::Trainee,
        StaffRole::Experienced,
        StaffRole::Speed,
        StaffRole::Charisma,
        StaffRole::Security,
        StaffRole::KitchenPorter,
        StaffRole::KitchenAssistant,
        StaffRole::ChefDePartie,
        StaffRole::SousChef,
        StaffRole::HeadChef,
        StaffRole::AssistantManager,
        StaffRole::Manager,
        StaffRole::ReceptionTrainee,
        StaffRole::Receptionist,
        StaffRole::Housekeeper,
        StaffRole::DutyManager,
    ];

    pub fn department(self) -> Department {
        use StaffRole::*;
        match self {
            Trainee | Experienced | Speed | Charisma | Security => Department::FrontOfHouse,
            KitchenPorter | KitchenAssistant | ChefDePartie | SousChef | HeadChef => {
                Department::Kitchen
            }
            AssistantManager | Manager => Department::Management,
            ReceptionTrainee | Receptionist | Housekeeper | DutyManager => Department::Inn,
        }
    }

    pub fn tier(self) -> RoleTier {
        use StaffRole::*;
        match self {
            Trainee | KitchenPorter | ReceptionTrainee | Housekeeper => RoleTier::Junior,
            Experienced | KitchenAssistant | ChefDePartie | Receptionist => RoleTier::Senior,
            Speed | Charisma | Security | SousChef => RoleTier::Specialist,
            HeadChef | AssistantManager | Manager | DutyManager => RoleTier::Manager,
        }
    }

    pub fn label(self) -> &'static str {
        use StaffRole::*;
        match self {
            Trainee => "Trainee",
            Experienced => "Experienced",
            Speed => "Speed Server",
            Charisma => "Charisma Server",
            Security => "Floor Security",
            KitchenPorter => "Kitchen Porter",
            KitchenAssistant => "Kitchen Assistant",
            ChefDePartie => "Chef de Partie",
            SousChef => "Sous Chef",
            HeadChef => "Head Chef",
            AssistantManager => "Assistant Manager",
            Manager => "Manager",
            ReceptionTrainee => "Reception Trainee",
            Receptionist => "Receptionist",
            Housekeeper => "Housekeeper",
            DutyManager => "Duty Manager",
        }
    }

    /// Next rung on the ladder, reached every few levels.
    pub fn promotion(self) -> Option<StaffRole> {
        use StaffRole::*;
        match self {
            Trainee => Some(Experienced),
            Experienced => Some(Speed),
            Speed => Some(Charisma),
            KitchenPorter => Some(KitchenAssistant),
            KitchenAssistant => Some(ChefDePartie),
            ChefDePartie => Some(SousChef),
            SousChef => Some(HeadChef),
            AssistantManager => Some(Manager),
            ReceptionTrainee => Some(Receptionist),
            Receptionist => Some(DutyManager),
            Charisma | Security | HeadChef | Manager | Housekeeper | DutyManager => None,
        }
    }

    /// One rung down. Used when a struggling business can only attract weaker hires.
    pub fn downgrade(self) -> Option<StaffRole> {
        use StaffRole::*;
        match self {
            Experienced | Security => Some(Trainee),
            Speed | Charisma => Some(Experienced),
            KitchenAssistant => Some(KitchenPorter),
            ChefDePartie => Some(KitchenAssistant),
            SousChef => Some(ChefDePartie),
            HeadChef => Some(SousChef),
            Manager => Some(AssistantManager),
            Receptionist => Some(ReceptionTrainee),
            DutyManager => Some(Receptionist),
            Trainee | KitchenPorter | AssistantManager | ReceptionTrainee | Housekeeper => None,
        }
    }

    /// Food orders a cook can turn around per round.
    pub fn kitchen_capacity(self) -> u32 {
        match self {
            StaffRole::HeadChef => 4,
            StaffRole::SousChef => 3,
            StaffRole::ChefDePartie => 2,
            StaffRole::KitchenAssistant | StaffRole::KitchenPorter => 1,
            _ => 0,
        }
    }

    pub fn is_manager(self) -> bool {
        matches!(self, StaffRole::Manager | StaffRole::AssistantManager)
    }

    pub fn key(self) -> &'static str {
        use StaffRole::*;
        match self {
            Trainee => "trainee",
            Experienced => "experienced",
            Speed => "speed",
            Charisma => "charisma",
            Security => "security",
            KitchenPorter => "kitchen_porter",
            KitchenAssistant => "kitchen_assistant",
            ChefDePartie => "chef_de_partie",
            SousChef => "sous_chef",
            HeadChef => "head_chef",
            AssistantManager => "assistant_manager",
            Manager => "manager",
            ReceptionTrainee => "reception_trainee",
            Receptionist => "receptionist",
            Housekeeper => "housekeeper",
            DutyManager => "duty_manager",
        }
    }
}

impl fmt::Display for StaffRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StaffRole {
    type Err = Rejection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        StaffRole::ALL
            .into_iter()
            .find(|role| {
                let key: String = role.key().chars().filter(|c| *c != '_').collect();
                let label: String = role
                    .label()
                    .to_ascii_lowercase()
                    .chars()
                    .filter(|c| c.is_ascii_alphanumeric())
                    .collect();
                key == needle || label == needle
            })
            .ok_or_else(|| Rejection::unknown("role", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffMember {
    pub id: u32,
    pub role: StaffRole,
    pub capacity: i32,
    pub skill: i32,
    pub rep_min: i32,
    pub rep_max: i32,
    pub morale: f64,
    pub weekly_wage: f64,
    pub accrued_wage: f64,
    pub tenure_weeks: u32,
    pub level: u32,
    pub capacity_multiplier: f64,
    pub tip_rate: f64,
    pub tip_bonus: f64,
    pub security_bonus: i32,
    pub chaos_tolerance: i32,
    pub inn_coverage: u32,
    pub off_sick: bool,
}

impl StaffMember {
    pub fn name(&self) -> String {
        format!("{} #{}", self.role.label(), self.id)
    }

    pub fn department(&self) -> Department {
        self.role.department()
    }

    pub fn adjust_morale(&mut self, delta: f64) {
        self.morale = (self.morale + delta).clamp(0.0, 100.0);
    }

    pub fn accrue_daily_wage(&mut self) {
        self.accrued_wage += (self.weekly_wage / 7.0).max(0.0);
    }

    /// Settles the accrued balance and returns the amount owed.
    pub fn cash_out(&mut self) -> f64 {
        let owed = self.accrued_wage.max(0.0);
        self.accrued_wage = 0.0;
        owed
    }

    fn pool_weight(&self) -> f64 {
        1.0 + self.skill.max(0) as f64 / 6.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    members: Vec<StaffMember>,
    next_id: u32,
}

const EMPTY_POOL_MORALE: f64 = 70.0;

impl Roster {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
            next_id: 1,
        }
    }

    pub(crate) fn allocate_id(&mut self) -> u32 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }

    pub(crate) fn push(&mut self, member: StaffMember) {
        self.members.push(member);
    }

    pub(crate) fn remove(&mut self, id: u32) -> Option<StaffMember> {
        let idx = self.members.iter().position(|m| m.id == id)?;
        Some(self.members.remove(idx))
    }

    pub fn get(&self, id: u32) -> Option<&StaffMember> {
        self.members.iter().find(|m| m.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: u32) -> Option<&mut StaffMember> {
        self.members.iter_mut().find(|m| m.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StaffMember> {
        self.members.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut StaffMember> {
        self.members.iter_mut()
    }

    /// Members who turned up tonight.
    pub fn on_shift(&self) -> impl Iterator<Item = &StaffMember> {
        self.members.iter().filter(|m| !m.off_sick)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn count_role(&self, role: StaffRole) -> usize {
        self.members.iter().filter(|m| m.role == role).count()
    }

    pub fn count_department(&self, department: Department) -> usize {
        self.members
            .iter()
            .filter(|m| m.department() == department)
            .count()
    }

    pub fn has_role_on_shift(&self, role: StaffRole) -> bool {
        self.on_shift().any(|m| m.role == role)
    }

    /// Skill-weighted morale of one department. An empty pool reads as content.
    pub fn pool_morale(&self, department: Department) -> f64 {
        let (sum, weight) = self
            .members
            .iter()
            .filter(|m| m.department() == department)
            .fold((0.0, 0.0), |(sum, weight), m| {
                let w = m.pool_weight();
                (sum + m.morale * w, weight + w)
            });
        if weight <= 0.0 {
            EMPTY_POOL_MORALE
        } else {
            sum / weight
        }
    }

    pub fn team_morale(&self) -> f64 {
        if self.members.is_empty() {
            return EMPTY_POOL_MORALE;
        }
        self.members.iter().map(|m| m.morale).sum::<f64>() / self.members.len() as f64
    }

    pub(crate) fn adjust_all_morale(&mut self, delta: f64) {
        for member in self.members.iter_mut() {
            member.adjust_morale(delta);
        }
    }

    pub fn lowest_morale(&self) -> Option<&StaffMember> {
        self.members.iter().min_by(|a, b| {
            a.morale
                .partial_cmp(&b.morale)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        })
    }

    pub fn total_accrued(&self) -> f64 {
        self.members.iter().map(|m| m.accrued_wage).sum()
    }

    pub fn weekly_wage_bill(&self) -> f64 {
        self.members.iter().map(|m| m.weekly_wage).sum()
    }

    pub(crate) fn return_from_sick(&mut self) -> usize {
        let mut count = 0;
        for member in self.members.iter_mut().filter(|m| m.off_sick) {
            member.off_sick = false;
            count += 1;
        }
        count
    }
}

#[cfg(test)]
pub(crate) fn test_member(id: u32, role: StaffRole, morale: f64) -> StaffMember {
    StaffMember {
        id,
        role,
        capacity: 3,
        skill: 4,
        rep_min: 0,
        rep_max: 1,
        morale,
        weekly_wage: 70.0,
        accrued_wage: 0.0,
        tenure_weeks: 0,
        level: 0,
        capacity_multiplier: 1.0,
        tip_rate: 0.0,
        tip_bonus: 0.0,
        security_bonus: 0,
        chaos_tolerance: 50,
        inn_coverage: 0,
        off_sick: false,
    }
}
