use tracing::debug;

use crate::game::config::EngineConfig;
use crate::game::context::SimContext;
use crate::game::music::{MusicEffects, MusicProfile};
use crate::game::rejection::Rejection;
use crate::game::staff::{Department, StaffRole};
use crate::game::systems::identity;
use crate::game::world::SimulationState;
use crate::time::TimePhase;

const SOUND_SYSTEM: &str = "sound_system";
const LIVE_MUSIC_LICENSE: &str = "live_music_license";
/// Departure chance shaved off while the music keeps people in.
const LINGER_RELIEF: f64 = 0.002;

fn owns(sim: &SimulationState, id: &str) -> bool {
    sim.upgrades.owned.iter().any(|owned| owned == id)
}

/// Music effects for `phase`, after upgrades and listening habits.
pub(crate) fn effects(sim: &SimulationState, phase: TimePhase) -> MusicEffects {
    let Some(profile) = sim.music.current else {
        return MusicEffects::SILENT;
    };
    let mut fx = profile.effects(phase);

    let habits = &sim.music;
    if habits.nights_same >= 2 {
        fx.identity_pressure += 0.10 * habits.nights_same.min(3) as f64;
    }
    if habits.weekly_switches >= 3 {
        fx.identity_pressure -= 0.10 * (habits.weekly_switches - 2).min(4) as f64;
    }

    if owns(sim, SOUND_SYSTEM) {
        fx.traffic = 1.0 + (fx.traffic - 1.0) * 1.10;
        fx.spend = 1.0 + (fx.spend - 1.0) * 1.10;
        fx.morale += (fx.morale * 0.12).max(0.15);
        fx.chaos *= 0.92;
    }
    if owns(sim, LIVE_MUSIC_LICENSE) {
        let crew = sim
            .roster
            .on_shift()
            .filter(|m| {
                m.department() == Department::FrontOfHouse || m.role == StaffRole::Manager
            })
            .count();
        let door = sim.security.base_level + sim.upgrades.effects.security + sim.security.door.len() as i32;
        if crew >= 3 && door >= 1 {
            fx.rep += 0.35;
            fx.spend *= 1.03;
        } else {
            fx.rep += 0.08;
        }
    }
    fx.clamped()
}

/// Effects for the round being played, silence while closed.
pub(crate) fn round_effects(sim: &SimulationState, config: &EngineConfig) -> MusicEffects {
    if !sim.night.open {
        return MusicEffects::SILENT;
    }
    let phase = config.service_hours().time_at(sim.night.round).phase();
    effects(sim, phase)
}

pub(crate) fn linger_relief(sim: &SimulationState, config: &EngineConfig) -> f64 {
    if round_effects(sim, config).linger > 1.0 {
        LINGER_RELIEF
    } else {
        0.0
    }
}

/// Changes the profile. While open it can change once per phase.
pub(crate) fn set_music_profile(
    ctx: &mut SimContext<'_>,
    profile: MusicProfile,
) -> Result<MusicProfile, Rejection> {
    let previous = ctx.sim.music.current;
    if previous == Some(profile) {
        ctx.log.info(format!("{} is already playing.", profile.label()));
        return Ok(profile);
    }
    let open = ctx.sim.night.open;
    let phase = ctx
        .config
        .service_hours()
        .time_at(ctx.sim.night.round)
        .phase();
    if open && ctx.sim.music.changed_in == Some(phase) {
        return Err(ctx.reject(Rejection::MusicAlreadyChanged));
    }

    let music = &mut ctx.sim.music;
    music.current = Some(profile);
    if open {
        music.changed_in = Some(phase);
        music.weekly_switches += 1;
    }
    ctx.log.info(format!(
        "Music: {} -> {}.",
        previous.map_or("silence", MusicProfile::label),
        profile.label()
    ));
    Ok(profile)
}

/// Reputation, morale and identity drift from one round of music.
pub(crate) fn apply_round(ctx: &mut SimContext<'_>, fx: &MusicEffects) {
    let Some(profile) = ctx.sim.music.current else {
        return;
    };
    let rep = fx.rep.round() as i32;
    if rep != 0 {
        let applied = ctx.apply_rep(rep);
        ctx.log.info(format!("The crowd reacts to the music. Rep {applied:+}."));
    }
    if fx.morale != 0.0 {
        ctx.sim.roster.adjust_all_morale(fx.morale);
    }
    if fx.chaos != 0.0 {
        ctx.sim.chaos.adjust(fx.chaos);
    }
    identity::signal(ctx, profile.identity(), fx.identity_pressure);
    if fx.late_risk {
        ctx.log
            .info("Late phase risk: the music is stirring the room up.");
    }
    debug!(?profile, chaos = fx.chaos, rep = fx.rep, "music applied");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::context::testing::Fixture;
    use crate::game::identity::IdentityKind;

    #[test]
    fn silence_changes_nothing() {
        let fx = Fixture::new(61);
        assert_eq!(effects(&fx.sim, TimePhase::Peak), MusicEffects::SILENT);
        assert_eq!(linger_relief(&fx.sim, &fx.config), 0.0);
    }

    #[test]
    fn one_change_per_phase_while_open() {
        let mut fx = Fixture::new(61);
        set_music_profile(&mut fx.ctx(), MusicProfile::IndieAlt).expect("closed change");
        set_music_profile(&mut fx.ctx(), MusicProfile::JazzLounge).expect("closed change");
        assert_eq!(fx.sim.music.weekly_switches, 0);

        fx.sim.night.open = true;
        set_music_profile(&mut fx.ctx(), MusicProfile::PopParty).expect("first change");
        assert_eq!(
            set_music_profile(&mut fx.ctx(), MusicProfile::ClassicRock),
            Err(Rejection::MusicAlreadyChanged)
        );
        assert_eq!(fx.sim.music.current, Some(MusicProfile::PopParty));
        assert_eq!(fx.sim.music.weekly_switches, 1);
        assert!(fx.logged("Music: Jazz lounge -> Pop party."));
    }

    #[test]
    fn a_sound_system_amplifies_the_profile() {
        let mut fx = Fixture::new(61);
        fx.sim.music.current = Some(MusicProfile::PopParty);
        let plain = effects(&fx.sim, TimePhase::BuildUp);
        fx.sim.upgrades.owned.push(SOUND_SYSTEM.into());
        let loud = effects(&fx.sim, TimePhase::BuildUp);
        assert!(loud.traffic > plain.traffic);
        assert!(loud.chaos < plain.chaos);
    }

    #[test]
    fn a_round_of_music_moves_the_room() {
        let mut fx = Fixture::new(61);
        fx.sim.music.current = Some(MusicProfile::JazzLounge);
        let chaos = fx.sim.chaos.value();
        let jazz = effects(&fx.sim, TimePhase::Peak);
        apply_round(&mut fx.ctx(), &jazz);
        assert!(fx.sim.chaos.value() <= chaos);
        assert!(fx.sim.identity.pending_signal(IdentityKind::Respectable) > 0.0);
    }

    #[test]
    fn switching_too_often_blurs_the_identity() {
        let mut fx = Fixture::new(61);
        fx.sim.music.current = Some(MusicProfile::IndieAlt);
        let settled = effects(&fx.sim, TimePhase::EarlyDay).identity_pressure;
        fx.sim.music.weekly_switches = 6;
        let restless = effects(&fx.sim, TimePhase::EarlyDay).identity_pressure;
        assert!(restless < settled);
    }
}
