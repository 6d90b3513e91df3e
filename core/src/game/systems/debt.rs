use crate::game::context::SimContext;
use crate::game::economy::CostKind;
use crate::game::systems::{morale, upgrades};
use crate::game::{
    AUTO_BANKRUPTCY_STREAK, BAILIFF_MIN_SEIZURE, BAILIFF_REP_SCAR, BAILIFF_SEIZURE_RATE,
    BAILIFF_UPGRADES_REMOVED, BANKRUPTCY_LOCK_WEEKS, BANKRUPTCY_SHARK_APR_BONUS,
    BANKRUPTCY_SHARK_PENALTY_BONUS, BANKRUPTCY_SUPPLIER_TRUST_FLOOR,
};

const BANKRUPT_SUPPLIER_CAP: f64 = 400.0;
const BANKRUPT_MORALE_HIT: f64 = 18.0;
const BANKRUPT_REP_HIT: i32 = -30;

/// Closes the week's minimum-payment check and applies what follows from it.
/// Returns the new spiral tier.
pub(crate) fn resolve_week(
    ctx: &mut SimContext<'_>,
    total_due: f64,
    minimum_due: f64,
    met: bool,
) -> u8 {
    let debt = &mut ctx.sim.debt;
    let tier = debt.record_week(met);
    debt.last_total_due = total_due;
    debt.last_minimum_due = minimum_due;
    let streak = debt.weeks_unpaid_minimum();
    let message = format!(
        "Weekly minimum resolution: min {} | due GBP {total_due:.2} | min due GBP {minimum_due:.2} | consecutive missed-min weeks {streak} | debt spiral tier {tier}.",
        if met { "MET" } else { "MISSED" },
    );
    if met {
        ctx.log.info(message);
    } else {
        ctx.log.neg(message);
    }
    morale::debt_morale_decay(ctx);

    if streak >= AUTO_BANKRUPTCY_STREAK && !ctx.sim.debt.bankrupt {
        ctx.log
            .neg(format!("{streak} straight weeks of missed minimums. The court steps in."));
        declare_bankruptcy(ctx);
    } else if ctx.sim.debt.bailiffs_due() {
        send_bailiffs(ctx);
    }
    ctx.sim.debt.tier()
}

/// Bailiffs strip the cheapest fittings and take a cut of the till.
pub(crate) fn send_bailiffs(ctx: &mut SimContext<'_>) -> f64 {
    let taken = upgrades::repossess_cheapest(ctx, BAILIFF_UPGRADES_REMOVED);
    let cash = ctx.sim.ledger.cash();
    let seizure = cash.min(BAILIFF_MIN_SEIZURE.max(cash * BAILIFF_SEIZURE_RATE));
    let seized = ctx.sim.ledger.withdraw(seizure);
    ctx.sim.ledger.book_cost(CostKind::Seizure, seized);
    let rep = ctx.apply_rep(BAILIFF_REP_SCAR);
    let debt = &mut ctx.sim.debt;
    debt.bailiff_stigma = true;
    debt.bailiff_visits += 1;

    let removed = if taken.is_empty() {
        "nothing worth taking".to_string()
    } else {
        taken.join(", ")
    };
    ctx.log.neg(format!(
        "Bailiffs arrived. They removed {removed} and seized GBP {seized:.2}. Reputation {rep:+}."
    ));
    seized
}

/// Everything owned goes, credit is wiped and lenders close ranks. The run continues.
pub(crate) fn declare_bankruptcy(ctx: &mut SimContext<'_>) -> Vec<String> {
    let repossessed = upgrades::repossess_all(ctx);
    ctx.sim.pub_level = 0;
    ctx.sim.ledger.reset_progression();
    // Stars go with the business. Banked legacy bonuses stay.
    let stars_lost = std::mem::take(&mut ctx.sim.prestige.stars);

    let credit = &mut ctx.sim.credit;
    credit.score = 0;
    credit.bankruptcy_lock_weeks = BANKRUPTCY_LOCK_WEEKS;
    credit.supplier.trust_penalty = credit.supplier.trust_penalty.max(BANKRUPTCY_SUPPLIER_TRUST_FLOOR);
    credit.supplier.cap_override = Some(BANKRUPT_SUPPLIER_CAP);
    credit.shark_apr_bonus += BANKRUPTCY_SHARK_APR_BONUS;
    credit.shark_penalty_bonus += BANKRUPTCY_SHARK_PENALTY_BONUS;
    if let Some(shark) = credit.shark.as_mut() {
        shark.apr += BANKRUPTCY_SHARK_APR_BONUS;
        shark.track.penalty_apr += BANKRUPTCY_SHARK_PENALTY_BONUS;
    }
    ctx.sim.debt.mark_bankrupt();
    ctx.sim.roster.adjust_all_morale(-BANKRUPT_MORALE_HIT);
    let rep = ctx.apply_rep(BANKRUPT_REP_HIT);

    ctx.log.header("BANKRUPTCY DECLARED");
    if repossessed.is_empty() {
        ctx.log.neg("There was nothing left to repossess.");
    } else {
        ctx.log
            .neg(format!("Repossessed: {}.", repossessed.join(", ")));
    }
    ctx.log.neg(format!(
        "Credit score wiped. Banks are closed to you for {BANKRUPTCY_LOCK_WEEKS} weeks. Reputation {rep:+}."
    ));
    if stars_lost > 0 {
        ctx.log.neg(format!("Prestige stars lost: {stars_lost}."));
    }
    repossessed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::context::testing::Fixture;
    use crate::game::credit::{LoanShark, PenaltyTrack};
    use crate::game::staff::{StaffRole, test_member};
    use crate::game::systems::upgrades::refresh_effects;

    fn own(fx: &mut Fixture, ids: &[&str]) {
        fx.sim.upgrades.owned = ids.iter().map(|id| id.to_string()).collect();
        refresh_effects(&mut fx.ctx());
    }

    #[test]
    fn met_week_resets_the_streak() {
        let mut fx = Fixture::new(2);
        assert_eq!(resolve_week(&mut fx.ctx(), 300.0, 120.0, false), 1);
        assert_eq!(resolve_week(&mut fx.ctx(), 300.0, 120.0, false), 2);
        assert_eq!(resolve_week(&mut fx.ctx(), 300.0, 120.0, true), 0);
        assert_eq!(fx.sim.debt.last_minimum_due, 120.0);
        assert!(fx.logged("min MET | due GBP 300.00 | min due GBP 120.00"));
    }

    #[test]
    fn fourth_missed_week_brings_bailiffs() {
        let mut fx = Fixture::new(2);
        own(&mut fx, &["pool_table", "darts", "tvs"]);
        fx.sim.ledger.deposit(2000.0 - fx.sim.ledger.cash());
        let rep = fx.sim.reputation;
        for _ in 0..3 {
            resolve_week(&mut fx.ctx(), 500.0, 200.0, false);
        }
        assert_eq!(fx.sim.debt.bailiff_visits, 0);
        resolve_week(&mut fx.ctx(), 500.0, 200.0, false);
        assert_eq!(fx.sim.debt.bailiff_visits, 1);
        assert!(fx.sim.debt.bailiff_stigma);
        assert_eq!(fx.sim.upgrades.owned, vec!["tvs".to_string()]);
        assert!((fx.sim.ledger.cash() - 1800.0).abs() < 1e-9);
        assert!((fx.sim.ledger.week().cost_of(CostKind::Seizure) - 200.0).abs() < 1e-9);
        assert!(fx.sim.reputation < rep);
        assert!(fx.logged("Bailiffs arrived."));
    }

    #[test]
    fn bailiffs_take_at_least_the_floor_but_never_more_than_cash() {
        let mut fx = Fixture::new(2);
        fx.sim.ledger.withdraw(fx.sim.ledger.cash() - 90.0);
        assert_eq!(send_bailiffs(&mut fx.ctx()), 90.0);
        assert_eq!(fx.sim.ledger.cash(), 0.0);
        fx.sim.ledger.deposit(500.0);
        assert_eq!(send_bailiffs(&mut fx.ctx()), 120.0);
    }

    #[test]
    fn bankruptcy_wipes_the_slate() {
        let mut fx = Fixture::new(2);
        own(&mut fx, &["pool_table", "beer_garden"]);
        fx.sim.pub_level = 2;
        fx.sim.roster.push(test_member(1, StaffRole::Experienced, 60.0));
        fx.sim.credit.shark = Some(LoanShark {
            balance: 800.0,
            apr: 0.20,
            track: PenaltyTrack::default(),
        });
        let taken = declare_bankruptcy(&mut fx.ctx());
        assert_eq!(taken.len(), 2);
        assert!(fx.sim.upgrades.owned.is_empty());
        assert_eq!(fx.sim.pub_level, 0);
        assert_eq!(fx.sim.credit.score, 0);
        assert_eq!(fx.sim.credit.bankruptcy_lock_weeks, BANKRUPTCY_LOCK_WEEKS);
        assert!(fx.sim.credit.is_bank_credit_locked());
        assert_eq!(fx.sim.credit.supplier.cap(), 400.0);
        assert!(fx.sim.credit.supplier.trust_penalty >= 0.20);
        let shark = fx.sim.credit.shark.as_ref().expect("shark");
        assert!((shark.apr - 0.58).abs() < 1e-9);
        assert!(fx.sim.debt.bankrupt);
        assert_eq!(fx.sim.debt.weeks_unpaid_minimum(), 0);
        assert_eq!(fx.sim.roster.get(1).map(|m| m.morale), Some(42.0));
        assert!(fx.logged("BANKRUPTCY DECLARED"));
        // The score stays wiped while the lock runs.
        fx.sim.credit.adjust_score(8);
        assert_eq!(fx.sim.credit.score, 0);
    }

    #[test]
    fn bankruptcy_takes_the_stars_but_not_the_legacy() {
        let mut fx = Fixture::new(2);
        fx.sim.prestige.stars = 2;
        fx.sim.prestige.legacy.security = 3;
        declare_bankruptcy(&mut fx.ctx());
        assert_eq!(fx.sim.prestige.stars, 0);
        assert_eq!(fx.sim.prestige.legacy.security, 3);
        assert!(fx.logged("Prestige stars lost: 2"));
    }

    #[test]
    fn eight_missed_weeks_force_bankruptcy() {
        let mut fx = Fixture::new(2);
        for _ in 0..7 {
            resolve_week(&mut fx.ctx(), 100.0, 50.0, false);
        }
        assert!(!fx.sim.debt.bankrupt);
        assert_eq!(resolve_week(&mut fx.ctx(), 100.0, 50.0, false), 0);
        assert!(fx.sim.debt.bankrupt);
        assert_eq!(fx.sim.credit.score, 0);
    }
}
