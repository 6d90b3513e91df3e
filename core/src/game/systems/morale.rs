use rand::Rng;

use crate::game::context::SimContext;
use crate::game::economy::CostKind;
use crate::game::staff::{Department, StaffMember};

const SECURITY_DAMP_STEP: f64 = 0.03;
const SECURITY_DAMP_CAP: f64 = 0.35;
const SWING_SCALE: f64 = 1.15;
const FATIGUE_MORALE_THRESHOLD: f64 = 8.0;
const KITCHEN_QUIT_MORALE: f64 = 35.0;

/// Round facts the morale model reacts to.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MoraleInputs {
    pub(crate) unserved: u32,
    pub(crate) events: u32,
    pub(crate) tip_rate: f64,
    pub(crate) security: i32,
    pub(crate) smooth: bool,
}

/// Chaos widens morale swings in both directions.
pub(crate) fn chaos_negative_multiplier(chaos: f64) -> f64 {
    (0.85 + 0.40 * (chaos / 100.0).clamp(0.0, 1.0)).clamp(0.85, 1.25)
}

pub(crate) fn chaos_positive_multiplier(chaos: f64) -> f64 {
    (1.20 - 0.30 * (chaos / 100.0).clamp(0.0, 1.0)).clamp(0.90, 1.20)
}

/// Shared morale delta for the round before per-person drift.
pub(crate) fn round_delta(
    inputs: &MoraleInputs,
    reputation: i32,
    chaos: f64,
    stability: f64,
    fatigue: f64,
) -> i32 {
    let mut delta = 0;
    if inputs.unserved > 0 {
        delta -= (1 + inputs.unserved as i32 / 2).min(6);
    }
    if inputs.events > 0 {
        delta -= (2 * inputs.events as i32).min(6);
    }
    if reputation >= 40 {
        delta += 1;
    }
    if reputation <= -20 {
        delta -= 1;
    }
    if inputs.tip_rate >= 0.03 {
        delta += 1;
    }
    if inputs.tip_rate <= 0.005 {
        delta -= 1;
    }
    delta -= (chaos / 40.0).floor() as i32;

    if delta < 0 && inputs.security > 0 {
        let damp = (inputs.security as f64 * SECURITY_DAMP_STEP).min(SECURITY_DAMP_CAP);
        delta = (delta as f64 * (1.0 - damp)).round() as i32;
    }
    if delta < 0 && stability > 0.0 {
        delta = (delta as f64 * (1.0 - stability)).round() as i32;
    }
    if delta != 0 {
        delta = (delta as f64 * SWING_SCALE).round() as i32;
    }
    if fatigue > FATIGUE_MORALE_THRESHOLD {
        delta -= (((fatigue - FATIGUE_MORALE_THRESHOLD) / 4.0).round() as i32).min(4);
    }
    if delta < 0 {
        (delta as f64 * chaos_negative_multiplier(chaos)).round() as i32
    } else if delta > 0 {
        (delta as f64 * chaos_positive_multiplier(chaos)).round() as i32
    } else {
        0
    }
}

fn drift<R: Rng + ?Sized>(rng: &mut R, chaos: f64, smooth: bool) -> i32 {
    let roll = rng.gen_range(0..100);
    let (down, flat) = if chaos >= 55.0 {
        (55, 80)
    } else if smooth {
        (25, 55)
    } else {
        (38, 62)
    };
    if roll < down {
        -1
    } else if roll < flat {
        0
    } else {
        1
    }
}

pub(crate) fn update_after_round(ctx: &mut SimContext<'_>, inputs: &MoraleInputs) {
    if ctx.sim.roster.is_empty() {
        return;
    }
    let chaos = ctx.sim.chaos.value();
    let delta = round_delta(
        inputs,
        ctx.sim.reputation,
        chaos,
        ctx.sim.upgrades.effects.morale_stability,
        ctx.sim.staffing.fatigue,
    );
    for member in ctx.sim.roster.iter_mut() {
        let wobble = drift(ctx.rng, chaos, inputs.smooth);
        member.adjust_morale((delta + wobble) as f64);
    }
}

fn quit_multiplier(morale: f64) -> f64 {
    match morale {
        m if m >= 80.0 => 0.2,
        m if m >= 65.0 => 0.6,
        m if m >= 50.0 => 1.0,
        m if m >= 30.0 => 1.5,
        _ => 2.0,
    }
}

/// Weekly churn after a rough week. Leavers are paid what they are owed on the
/// way out; anyone who cannot be paid stays on until the money is there.
pub(crate) fn weekly_quit_check(ctx: &mut SimContext<'_>) -> u32 {
    let fights = ctx.sim.week.counters.fights;
    let multiplier = quit_multiplier(ctx.sim.roster.team_morale());
    let base = if fights == 0 {
        0.0
    } else {
        (6.0 + fights as f64 * 8.0).min(45.0)
    };
    let quit_chance = (base * multiplier).round() as i32;
    let manager_chance = ((6.0 + fights as f64 * 5.0).min(35.0) * multiplier).round() as i32;
    let pending = std::mem::take(&mut ctx.sim.staffing.departures_pending);
    if quit_chance <= 0 && pending.is_empty() {
        return 0;
    }

    // Anyone still waiting on final pay goes first.
    let mut leavers: Vec<u32> = pending
        .into_iter()
        .filter(|id| ctx.sim.roster.get(*id).is_some())
        .collect();
    let members: Vec<(u32, Department, f64)> = ctx
        .sim
        .roster
        .iter()
        .map(|m| (m.id, m.department(), m.morale))
        .collect();
    for (id, department, morale) in members {
        let roll = ctx.rng.gen_range(0..100);
        let leaves = match department {
            Department::FrontOfHouse | Department::Inn => roll < quit_chance,
            Department::Kitchen => morale < KITCHEN_QUIT_MORALE && roll < quit_chance.max(12),
            Department::Management => fights >= 2 && roll < manager_chance,
        };
        if leaves && !leavers.contains(&id) {
            leavers.push(id);
        }
    }

    let mut departed = 0;
    let mut deferred = Vec::new();
    for id in leavers {
        match depart(ctx, id, fights) {
            Some(_) => departed += 1,
            None => deferred.push(id),
        }
    }
    ctx.sim.staffing.departures_pending = deferred;
    departed
}

fn depart(ctx: &mut SimContext<'_>, id: u32, fights: u32) -> Option<StaffMember> {
    let (owed, name, department) = {
        let member = ctx.sim.roster.get(id)?;
        (member.accrued_wage, member.name(), member.department())
    };
    if owed > 0.0 && !ctx.try_pay(owed, CostKind::Wages, &format!("{name}'s final pay")) {
        ctx.log.info(format!("{name} wants out but is staying until their wages are paid."));
        return None;
    }
    let mut member = ctx.sim.roster.remove(id)?;
    member.cash_out();
    ctx.sim.week.staff_departures += 1;
    match department {
        Department::Management => {
            ctx.log.neg(format!("{name} resigns. \"This place is chaos.\""));
            ctx.apply_rep(-2);
        }
        Department::Kitchen => {
            ctx.log.neg(format!("{name} quit the kitchen after a rough week."));
            ctx.apply_rep(-2);
        }
        _ => {
            ctx.log.neg(format!("{name} quit after a rough week ({fights} fights)."));
            ctx.apply_rep(-1);
        }
    }
    Some(member)
}

/// Half the week's tips go to the team at payday.
pub(crate) fn tips_payday(ctx: &mut SimContext<'_>, tips: f64) -> i32 {
    let mut delta = 0;
    if tips >= 60.0 {
        delta += 3;
    } else if tips >= 25.0 {
        delta += 2;
    }
    if tips < 10.0 {
        delta -= 1;
    }
    ctx.sim.roster.adjust_all_morale(delta as f64);
    delta
}

pub(crate) fn debt_morale_decay(ctx: &mut SimContext<'_>) {
    let hit = ctx.sim.debt.morale_hit();
    if hit > 0.0 {
        ctx.sim.roster.adjust_all_morale(-hit);
        ctx.log.neg(format!(
            "Money worries weigh on the team (morale -{hit:.0})."
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::context::testing::Fixture;
    use crate::game::staff::{StaffRole, test_member};

    #[test]
    fn chaos_amplifies_both_ways() {
        assert_eq!(chaos_negative_multiplier(0.0), 0.85);
        assert_eq!(chaos_negative_multiplier(100.0), 1.25);
        assert_eq!(chaos_positive_multiplier(0.0), 1.20);
        assert!((chaos_positive_multiplier(100.0) - 0.90).abs() < 1e-9);
    }

    #[test]
    fn bad_rounds_hurt_more_in_chaos() {
        let inputs = MoraleInputs {
            unserved: 6,
            events: 1,
            ..MoraleInputs::default()
        };
        let calm = round_delta(&inputs, 0, 0.0, 0.0, 0.0);
        let wild = round_delta(&inputs, 0, 90.0, 0.0, 0.0);
        assert!(wild < calm);
        assert!(calm < 0);
    }

    #[test]
    fn security_and_stability_dampen_losses() {
        let inputs = MoraleInputs {
            unserved: 10,
            ..MoraleInputs::default()
        };
        let raw = round_delta(&inputs, 0, 0.0, 0.0, 0.0);
        let guarded = round_delta(
            &MoraleInputs {
                security: 10,
                ..inputs
            },
            0,
            0.0,
            0.3,
            0.0,
        );
        assert!(guarded > raw);
    }

    #[test]
    fn fatigue_drags_morale() {
        let inputs = MoraleInputs::default();
        assert!(round_delta(&inputs, 0, 0.0, 0.0, 24.0) < round_delta(&inputs, 0, 0.0, 0.0, 0.0));
    }

    #[test]
    fn morale_stays_in_bounds() {
        let mut fx = Fixture::new(2);
        fx.sim.roster.push(test_member(1, StaffRole::Trainee, 2.0));
        fx.sim.roster.push(test_member(2, StaffRole::Experienced, 99.0));
        fx.sim.chaos.set(95.0);
        let inputs = MoraleInputs {
            unserved: 20,
            events: 3,
            ..MoraleInputs::default()
        };
        for _ in 0..30 {
            update_after_round(&mut fx.ctx(), &inputs);
            for member in fx.sim.roster.iter() {
                assert!((0.0..=100.0).contains(&member.morale));
            }
        }
    }

    #[test]
    fn unpaid_leavers_are_deferred() {
        let mut fx = Fixture::new(2);
        let mut member = test_member(1, StaffRole::Trainee, 5.0);
        member.accrued_wage = 500.0;
        fx.sim.roster.push(member);
        fx.sim.ledger.withdraw(fx.sim.ledger.cash());
        fx.sim.week.counters.fights = 5;
        for _ in 0..10 {
            weekly_quit_check(&mut fx.ctx());
        }
        assert_eq!(fx.sim.roster.len(), 1);
        assert_eq!(fx.sim.staffing.departures_pending, vec![1]);
        fx.sim.ledger.deposit(1000.0);
        assert_eq!(weekly_quit_check(&mut fx.ctx()), 1);
        assert!(fx.sim.roster.is_empty());
        assert!(fx.sim.staffing.departures_pending.is_empty());
    }

    #[test]
    fn the_deferred_leaver_is_the_one_who_goes() {
        let mut fx = Fixture::new(2);
        let mut owed = test_member(1, StaffRole::Trainee, 40.0);
        owed.accrued_wage = 500.0;
        fx.sim.roster.push(owed);
        fx.sim.roster.push(test_member(2, StaffRole::Trainee, 5.0));
        fx.sim.ledger.withdraw(fx.sim.ledger.cash());
        fx.sim.staffing.departures_pending = vec![1];

        assert_eq!(weekly_quit_check(&mut fx.ctx()), 0);
        assert_eq!(fx.sim.staffing.departures_pending, vec![1]);
        assert_eq!(fx.sim.roster.len(), 2);

        fx.sim.ledger.deposit(1000.0);
        assert_eq!(weekly_quit_check(&mut fx.ctx()), 1);
        assert!(fx.sim.roster.get(1).is_none());
        assert!(fx.sim.roster.get(2).is_some());
        assert!(fx.sim.staffing.departures_pending.is_empty());
    }

    #[test]
    fn fired_staff_drop_off_the_waiting_list() {
        let mut fx = Fixture::new(2);
        fx.sim.roster.push(test_member(2, StaffRole::Trainee, 60.0));
        fx.sim.staffing.departures_pending = vec![9];
        assert_eq!(weekly_quit_check(&mut fx.ctx()), 0);
        assert!(fx.sim.staffing.departures_pending.is_empty());
        assert_eq!(fx.sim.roster.len(), 1);
    }

    #[test]
    fn tips_lift_the_team() {
        let mut fx = Fixture::new(2);
        fx.sim.roster.push(test_member(1, StaffRole::Trainee, 50.0));
        assert_eq!(tips_payday(&mut fx.ctx(), 70.0), 3);
        assert_eq!(tips_payday(&mut fx.ctx(), 5.0), -1);
        assert_eq!(fx.sim.roster.get(1).map(|m| m.morale), Some(52.0));
    }
}
