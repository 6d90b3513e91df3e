//! Free functions over [`super::context::SimContext`], one module per concern.
//! `night` and `week` compose the rest.

pub(crate) mod actions;
pub(crate) mod activities;
pub(crate) mod chaos;
pub(crate) mod credit;
pub(crate) mod debt;
pub(crate) mod district;
pub(crate) mod events;
pub(crate) mod identity;
pub(crate) mod incidents;
pub(crate) mod inn;
pub(crate) mod milestones;
pub(crate) mod misconduct;
pub(crate) mod morale;
pub(crate) mod music;
pub(crate) mod night;
pub(crate) mod payday;
pub(crate) mod prestige;
pub(crate) mod progression;
pub(crate) mod regulars;
pub(crate) mod rumors;
pub(crate) mod security;
pub(crate) mod service;
pub(crate) mod staffing;
pub(crate) mod supplier;
pub(crate) mod traffic;
pub(crate) mod upgrades;
pub(crate) mod week;
pub(crate) mod workload;
