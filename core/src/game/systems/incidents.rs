//! Overnight trouble: rolled once per closed night against the incident table.

use rand::Rng;

use crate::game::context::SimContext;
use crate::game::economy::{CostKind, RevenueKind};
use crate::game::staff::StaffRole;
use crate::game::systems::security;
use crate::game::{INCIDENT_CHANCE_MAX, INCIDENT_CHANCE_MIN, REP_LOVED};
use crate::time::Season;

/// One damage tier: reputation hit and the cost range in pounds.
#[derive(Debug, Clone, Copy)]
struct Damage {
    rep: i32,
    cost: (f64, f64),
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    /// Fixed damage, optional stock loss.
    Plain { damage: Damage, stock: Option<(u32, u32)> },
    /// Only lands if the break-in gets past security.
    BreakIn { damage: Damage, stock: (u32, u32) },
    /// Severity rolled uniformly from three tiers.
    Tiered {
        tiers: [Damage; 3],
        stock: Option<(u32, u32)>,
    },
    /// Softer with good security or a skilled manager.
    Inspection { damage: Damage, lenient_rep: i32 },
    /// Good press from the neighbourhood.
    Shoutout { rep: i32, reward: (f64, f64) },
}

#[derive(Debug, Clone, Copy)]
struct IncidentDef {
    name: &'static str,
    base_chance: f64,
    security_effect: f64,
    kitchen_only: bool,
    outcome: Outcome,
}

const fn plain(rep: i32, cost: (f64, f64)) -> Outcome {
    Outcome::Plain {
        damage: Damage { rep, cost },
        stock: None,
    }
}

const fn incident(name: &'static str, base_chance: f64, security_effect: f64, outcome: Outcome) -> IncidentDef {
    IncidentDef {
        name,
        base_chance,
        security_effect,
        kitchen_only: false,
        outcome,
    }
}

const INCIDENTS: [IncidentDef; 17] = [
    incident("Vandalism", 10.0, 0.90, plain(-2, (20.0, 45.0))),
    incident("A rival crew egged the windows", 9.0, 0.85, plain(-2, (15.0, 35.0))),
    incident("Glass breakage", 12.0, 0.80, plain(-1, (10.0, 22.0))),
    incident("Graffiti on the front wall", 8.0, 0.88, plain(-1, (8.0, 18.0))),
    incident("Noise complaint fine", 7.0, 0.90, plain(-2, (12.0, 25.0))),
    incident("Pest control call-out", 5.0, 0.85, plain(-2, (20.0, 40.0))),
    incident("Rubbish collection strike", 6.0, 0.90, plain(-1, (10.0, 22.0))),
    incident(
        "Delivery delay",
        6.0,
        0.90,
        Outcome::Plain {
            damage: Damage {
                rep: -1,
                cost: (5.0, 15.0),
            },
            stock: Some((1, 3)),
        },
    ),
    incident("Licence audit", 4.0, 0.85, plain(-1, (18.0, 35.0))),
    IncidentDef {
        name: "Kitchen inspection",
        base_chance: 6.0,
        security_effect: 0.85,
        kitchen_only: true,
        outcome: plain(-2, (15.0, 30.0)),
    },
    incident(
        "Attempted burglary",
        8.0,
        0.85,
        Outcome::BreakIn {
            damage: Damage {
                rep: -2,
                cost: (30.0, 60.0),
            },
            stock: (1, 3),
        },
    ),
    incident(
        "Burglary",
        4.0,
        0.75,
        Outcome::Plain {
            damage: Damage {
                rep: -4,
                cost: (80.0, 160.0),
            },
            stock: Some((3, 6)),
        },
    ),
    incident(
        "Leak",
        6.0,
        0.90,
        Outcome::Tiered {
            tiers: [
                Damage {
                    rep: -1,
                    cost: (20.0, 40.0),
                },
                Damage {
                    rep: -2,
                    cost: (45.0, 80.0),
                },
                Damage {
                    rep: -3,
                    cost: (90.0, 140.0),
                },
            ],
            stock: None,
        },
    ),
    incident(
        "Fire",
        3.0,
        0.70,
        Outcome::Tiered {
            tiers: [
                Damage {
                    rep: -3,
                    cost: (60.0, 120.0),
                },
                Damage {
                    rep: -5,
                    cost: (130.0, 220.0),
                },
                Damage {
                    rep: -7,
                    cost: (240.0, 360.0),
                },
            ],
            stock: Some((2, 6)),
        },
    ),
    incident("Power trip", 10.0, 0.95, plain(-1, (15.0, 30.0))),
    incident(
        "Health inspection",
        7.0,
        0.80,
        Outcome::Inspection {
            damage: Damage {
                rep: -3,
                cost: (10.0, 25.0),
            },
            lenient_rep: -1,
        },
    ),
    incident(
        "Community shout-out",
        6.0,
        1.0,
        Outcome::Shoutout {
            rep: 2,
            reward: (6.0, 12.0),
        },
    ),
];

const LEVEL_TIER_NAMES: [&str; 3] = ["minor", "serious", "major"];
const INSPECTION_SECURITY_PASS: i32 = 6;
const SKILLED_MANAGER: i32 = 5;

/// Season pressure on overnight incidents.
pub(crate) fn between_night_season_multiplier(seasons: &[Season]) -> f64 {
    seasons
        .iter()
        .map(|season| match season {
            Season::ExamSeason => 1.0,
            Season::TouristWave => 1.06,
            Season::WinterSlump => 0.94,
            Season::DerbyWeek => 1.10,
        })
        .product()
}

/// Rolls every overnight incident once. Returns how many fired.
pub(crate) fn roll_between_nights(ctx: &mut SimContext<'_>) -> u32 {
    let season = between_night_season_multiplier(&ctx.sim.calendar.seasons());
    let chance_multiplier = security::chance_multiplier(ctx.sim, season);
    let damage_multiplier = security::damage_multiplier(ctx.sim);
    let kitchen = ctx.sim.upgrades.effects.kitchen_unlocked;
    let mut fired = 0;
    for def in INCIDENTS.iter() {
        if def.kitchen_only && !kitchen {
            continue;
        }
        if matches!(def.outcome, Outcome::Shoutout { .. }) && ctx.sim.reputation < REP_LOVED {
            continue;
        }
        let chance = (def.base_chance * chance_multiplier * def.security_effect)
            .clamp(INCIDENT_CHANCE_MIN, INCIDENT_CHANCE_MAX);
        let threshold = (chance * 100.0).round() as u32;
        if ctx.rng.gen_range(0..10_000) >= threshold {
            continue;
        }
        fired += 1;
        resolve(ctx, def, damage_multiplier);
    }
    if fired > 0 {
        tracing::debug!(fired, "overnight incidents");
    }
    fired
}

fn resolve(ctx: &mut SimContext<'_>, def: &IncidentDef, damage_multiplier: f64) {
    match def.outcome {
        Outcome::Plain { damage, stock } => {
            apply_damage(ctx, def.name, damage, stock, damage_multiplier);
        }
        Outcome::BreakIn { damage, stock } => {
            let sec = security::effective(ctx.sim) as f64;
            let success = (0.70 - sec * 0.06).max(0.20);
            if ctx.rng.gen_bool(success) {
                apply_damage(ctx, def.name, damage, Some(stock), damage_multiplier);
            } else {
                ctx.log.pos(format!("{} was stopped by security.", def.name));
            }
        }
        Outcome::Tiered { tiers, stock } => {
            let tier = ctx.rng.gen_range(0..tiers.len());
            let name = format!("{} ({})", def.name, LEVEL_TIER_NAMES[tier]);
            apply_damage(ctx, &name, tiers[tier], stock, damage_multiplier);
        }
        Outcome::Inspection {
            damage,
            lenient_rep,
        } => {
            let skilled_manager = ctx
                .sim
                .roster
                .iter()
                .any(|m| m.role == StaffRole::Manager && m.skill >= SKILLED_MANAGER);
            let lenient = security::effective(ctx.sim) >= INSPECTION_SECURITY_PASS || skilled_manager;
            let damage = if lenient {
                Damage {
                    rep: lenient_rep,
                    ..damage
                }
            } else {
                damage
            };
            apply_damage(ctx, def.name, damage, None, damage_multiplier);
        }
        Outcome::Shoutout { rep, reward } => {
            let cash = ctx.rng.gen_range(reward.0..=reward.1);
            ctx.earn(RevenueKind::Other, cash);
            let applied = ctx.apply_rep(rep);
            ctx.sim.week.counters.positive_events += 1;
            ctx.log.pos(format!(
                "{}: locals rave about the pub. Rep {applied:+}, GBP {cash:.2} in donations.",
                def.name
            ));
        }
    }
}

fn apply_damage(
    ctx: &mut SimContext<'_>,
    name: &str,
    damage: Damage,
    stock: Option<(u32, u32)>,
    damage_multiplier: f64,
) {
    let raw_cost = ctx.rng.gen_range(damage.cost.0..=damage.cost.1);
    let cost = (raw_cost * damage_multiplier).max(1.0);
    let paid = ctx.try_pay(cost, CostKind::Repairs, name);

    let scaled = (damage.rep as f64 * damage_multiplier).round() as i32;
    let hit = security::mitigate_rep_hit(ctx.sim, scaled.min(-1));
    let applied = ctx.apply_rep(hit);

    let mut lost = 0;
    if let Some((low, high)) = stock {
        let raw = ctx.rng.gen_range(low..=high);
        let units = ((raw as f64 * damage_multiplier).round() as u32).max(1);
        lost = ctx.sim.inventory.drinks.remove_random(units, ctx.rng);
    }
    ctx.sim.week.counters.negative_events += 1;

    let mut line = format!("{name}: rep {applied:+}");
    if paid {
        line.push_str(&format!(", GBP {cost:.2} in costs"));
    } else {
        line.push_str(", the bill went unpaid");
    }
    if lost > 0 {
        line.push_str(&format!(", {lost} stock lost"));
    }
    line.push('.');
    ctx.log.neg(line);
    if hit > scaled {
        if ctx.sim.upgrades.effects.rep_mitigation > 0.0 {
            ctx.log.info("CCTV footage softened the blow.");
        } else if !ctx.sim.security.door.is_empty() {
            ctx.log.info("The door team contained some of the fallout.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::context::testing::Fixture;

    #[test]
    fn seasons_stack() {
        assert_eq!(between_night_season_multiplier(&[]), 1.0);
        let derby = between_night_season_multiplier(&[Season::DerbyWeek, Season::WinterSlump]);
        assert!((derby - 1.10 * 0.94).abs() < 1e-9);
    }

    #[test]
    fn incidents_cost_money_and_reputation() {
        let mut fx = Fixture::new(21);
        fx.sim.reputation = 10;
        fx.sim.chaos.set(100.0);
        let cash = fx.sim.ledger.cash();
        let mut fired = 0;
        for _ in 0..20 {
            fired += roll_between_nights(&mut fx.ctx());
        }
        assert!(fired > 0);
        assert!(fx.sim.ledger.cash() < cash);
        assert!(fx.sim.ledger.week().cost_of(CostKind::Repairs) > 0.0);
        assert!(fx.sim.week.counters.negative_events > 0);
    }

    #[test]
    fn every_hit_lands_at_least_one_point() {
        let mut fx = Fixture::new(5);
        fx.sim.reputation = 30;
        apply_damage(
            &mut fx.ctx(),
            "Graffiti",
            Damage {
                rep: -1,
                cost: (8.0, 18.0),
            },
            None,
            0.25,
        );
        assert_eq!(fx.sim.reputation, 29);
    }

    #[test]
    fn cctv_softens_reputation_but_not_cost() {
        let mut fx = Fixture::new(5);
        fx.sim.reputation = 30;
        fx.sim.upgrades.effects.rep_mitigation = 0.5;
        apply_damage(
            &mut fx.ctx(),
            "Burglary",
            Damage {
                rep: -8,
                cost: (100.0, 100.0),
            },
            None,
            1.0,
        );
        assert_eq!(fx.sim.reputation, 26);
        assert!((fx.sim.ledger.week().cost_of(CostKind::Repairs) - 100.0).abs() < 1e-9);
        assert!(fx.logged("CCTV footage softened the blow."));
    }

    #[test]
    fn inspections_go_easier_with_strong_security() {
        let mut fx = Fixture::new(6);
        fx.sim.reputation = 30;
        fx.sim.security.base_level = 8;
        let def = INCIDENTS
            .iter()
            .find(|def| def.name == "Health inspection")
            .expect("inspection");
        resolve(&mut fx.ctx(), def, 1.0);
        assert_eq!(fx.sim.reputation, 29);
    }
}
