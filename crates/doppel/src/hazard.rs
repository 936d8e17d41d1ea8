//! # Environmental Hazards
//!
//! Each world has its own water plane. Depending on configuration, the
//! water hurts when the player's feet are below it (submerged) or above it
//! (exposed). The dither water can also drain the remote. Anywhere the
//! water is harmless, and anywhere in bloom, the remote recharges.

use serde::{Deserialize, Serialize};
use tracing::debug;

use doppel_shared::constants::{CHARGE_ALTITUDE, FALL_THRESHOLD};
use doppel_shared::ActiveWorld;

use crate::collaborators::{AudioSink, SoundCue};
use crate::game_state::GameOverReason;
use crate::player_state::{Cooldown, PlayerState};

/// Which side of the water plane is dangerous.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HazardSide {
    /// Feet at or below the surface.
    #[default]
    Submerged,
    /// Feet above the surface.
    Exposed,
}

/// Rules for one world's water.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterHazard {
    /// Damage per pulse.
    pub damage: f32,
    /// Whether exposure also drains the remote.
    pub drains_remote: bool,
    /// Dangerous side.
    pub harmful_when: HazardSide,
}

impl Default for WaterHazard {
    fn default() -> Self {
        Self {
            damage: 2.0,
            drains_remote: true,
            harmful_when: HazardSide::Submerged,
        }
    }
}

/// Hazard tuning for both worlds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardConfig {
    /// Bloom water rules.
    pub bloom_water: WaterHazard,
    /// Dither water rules.
    pub dither_water: WaterHazard,
    /// Above this height the remote always recharges.
    pub charge_altitude: f32,
    /// Below this height the run is lost.
    pub fall_threshold: f32,
    /// Minimum seconds between damage sounds.
    pub damage_cue_interval: f32,
}

impl Default for HazardConfig {
    fn default() -> Self {
        Self {
            bloom_water: WaterHazard {
                damage: 10.0,
                drains_remote: false,
                harmful_when: HazardSide::Submerged,
            },
            dither_water: WaterHazard::default(),
            charge_altitude: CHARGE_ALTITUDE,
            fall_threshold: FALL_THRESHOLD,
            damage_cue_interval: 2.0,
        }
    }
}

/// Positions the hazard check needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HazardProbe {
    /// Active world.
    pub world: ActiveWorld,
    /// Bottom of the capsule.
    pub feet_y: f32,
    /// Camera height.
    pub eye_y: f32,
    /// Bloom water surface.
    pub bloom_water_y: f32,
    /// Dither water surface.
    pub dither_water_y: f32,
}

/// What the hazards did this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HazardReport {
    /// The player stands on the dangerous side of the active water.
    pub exposed: bool,
    /// Damage landed this tick.
    pub damaged: bool,
    /// Charge was drained this tick.
    pub drained: bool,
    /// Charge was restored this tick.
    pub charged: bool,
    /// Camera below the bloom surface while in bloom.
    pub underwater: bool,
}

/// Applies water, altitude and fall rules.
#[derive(Clone, Debug)]
pub struct HazardSystem {
    config: HazardConfig,
    damage_cue: Cooldown,
}

impl Default for HazardSystem {
    fn default() -> Self {
        Self::new(HazardConfig::default())
    }
}

impl HazardSystem {
    /// Creates the system.
    #[must_use]
    pub fn new(config: HazardConfig) -> Self {
        Self {
            damage_cue: Cooldown::new(config.damage_cue_interval),
            config,
        }
    }

    /// Tuning in use.
    #[must_use]
    pub const fn config(&self) -> &HazardConfig {
        &self.config
    }

    /// Evaluates hazards for one tick and mutates the player accordingly.
    pub fn evaluate(
        &mut self,
        probe: &HazardProbe,
        dt: f32,
        player: &mut PlayerState,
        audio: &mut dyn AudioSink,
    ) -> HazardReport {
        let (water, surface) = match probe.world {
            ActiveWorld::Bloom => (&self.config.bloom_water, probe.bloom_water_y),
            ActiveWorld::Dither => (&self.config.dither_water, probe.dither_water_y),
        };
        let submerged = probe.feet_y <= surface;
        let exposed = match water.harmful_when {
            HazardSide::Submerged => submerged,
            HazardSide::Exposed => !submerged,
        };

        let mut report = HazardReport {
            exposed,
            underwater: probe.world.is_bloom() && probe.eye_y < probe.bloom_water_y,
            ..HazardReport::default()
        };

        if exposed {
            report.damaged = player.register_damage(dt, water.damage);
            if self.damage_cue.tick(dt) {
                audio.play(SoundCue::Damage, SoundCue::Damage.default_volume());
            }
            if water.drains_remote {
                report.drained = player.drain_remote(dt);
            }
        } else {
            self.damage_cue.reset();
        }

        if probe.world.is_bloom() || !exposed || probe.eye_y > self.config.charge_altitude {
            player.charge_remote(dt);
            report.charged = true;
        }

        if report.damaged {
            debug!(world = ?probe.world, health = player.health(), "hazard damage");
        }
        report
    }

    /// Terminal condition for the current position, if any.
    #[must_use]
    pub fn check_terminal(&self, player: &PlayerState, position_y: f32) -> Option<GameOverReason> {
        if player.is_dead() {
            Some(GameOverReason::HealthDepleted)
        } else if position_y <= self.config.fall_threshold {
            Some(GameOverReason::FellOutOfWorld)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::RecordingAudio;

    const DT: f32 = 1.0 / 60.0;

    fn probe(world: ActiveWorld, feet_y: f32) -> HazardProbe {
        HazardProbe {
            world,
            feet_y,
            eye_y: feet_y + 0.175,
            bloom_water_y: 0.0,
            dither_water_y: 0.0,
        }
    }

    fn run(system: &mut HazardSystem, probe: &HazardProbe, seconds: f32, player: &mut PlayerState) -> Vec<HazardReport> {
        let mut audio = RecordingAudio::default();
        let frames = (seconds / DT).round() as usize;
        (0..frames).map(|_| system.evaluate(probe, DT, player, &mut audio)).collect()
    }

    #[test]
    fn test_dry_player_recharges() {
        let mut system = HazardSystem::default();
        let mut player = PlayerState::default();
        player.set_remote_charge(0.0);
        let reports = run(&mut system, &probe(ActiveWorld::Dither, 1.0), 1.0, &mut player);
        assert!(reports.iter().all(|r| r.charged && !r.exposed));
        assert!(player.remote_charge() > 40.0);
        assert_eq!(player.health(), 100.0);
    }

    #[test]
    fn test_dither_water_damages_and_drains() {
        let mut system = HazardSystem::default();
        let mut player = PlayerState::default();
        let reports = run(&mut system, &probe(ActiveWorld::Dither, -0.5), 4.5, &mut player);

        assert_eq!(reports.iter().filter(|r| r.damaged).count(), 2);
        assert_eq!(reports.iter().filter(|r| r.drained).count(), 2);
        assert!(reports.iter().all(|r| !r.charged));
        assert!((player.health() - 96.0).abs() < 1e-4);
        assert!((player.remote_charge() - 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_bloom_water_hurts_but_charges() {
        let mut system = HazardSystem::default();
        let mut player = PlayerState::default();
        player.set_remote_charge(50.0);
        let reports = run(&mut system, &probe(ActiveWorld::Bloom, -0.5), 2.5, &mut player);

        assert_eq!(reports.iter().filter(|r| r.damaged).count(), 1);
        assert!(reports.iter().all(|r| r.charged && !r.drained));
        assert!((player.health() - 90.0).abs() < 1e-4);
        assert_eq!(player.remote_charge(), 100.0);
    }

    #[test]
    fn test_exposed_side_configuration() {
        let mut config = HazardConfig::default();
        config.dither_water.harmful_when = HazardSide::Exposed;
        let mut system = HazardSystem::new(config);
        let mut player = PlayerState::default();

        let dry = run(&mut system, &probe(ActiveWorld::Dither, 1.0), 0.5, &mut player);
        assert!(dry.iter().all(|r| r.exposed));
        let wet = run(&mut system, &probe(ActiveWorld::Dither, -1.0), 0.5, &mut player);
        assert!(wet.iter().all(|r| !r.exposed && r.charged));
    }

    #[test]
    fn test_altitude_recharges_even_when_exposed() {
        let mut config = HazardConfig::default();
        config.dither_water.harmful_when = HazardSide::Exposed;
        let mut system = HazardSystem::new(config);
        let mut player = PlayerState::default();
        player.set_remote_charge(0.0);

        let high = probe(ActiveWorld::Dither, 6.0);
        let reports = run(&mut system, &high, 0.5, &mut player);
        assert!(reports.iter().all(|r| r.exposed && r.charged));
    }

    #[test]
    fn test_damage_cue_rate_limited() {
        let mut system = HazardSystem::default();
        let mut player = PlayerState::default();
        let mut audio = RecordingAudio::default();
        let wet = probe(ActiveWorld::Dither, -1.0);
        for _ in 0..(60 * 5) {
            system.evaluate(&wet, DT, &mut player, &mut audio);
        }
        assert_eq!(audio.count(SoundCue::Damage), 2);
    }

    #[test]
    fn test_underwater_only_in_bloom() {
        let mut system = HazardSystem::default();
        let mut player = PlayerState::default();
        let mut audio = RecordingAudio::default();
        let deep = HazardProbe {
            eye_y: -2.0,
            ..probe(ActiveWorld::Bloom, -2.2)
        };
        assert!(system.evaluate(&deep, DT, &mut player, &mut audio).underwater);
        let dither = HazardProbe {
            world: ActiveWorld::Dither,
            ..deep
        };
        assert!(!system.evaluate(&dither, DT, &mut player, &mut audio).underwater);
    }

    #[test]
    fn test_terminal_conditions() {
        let system = HazardSystem::default();
        let mut player = PlayerState::default();
        assert_eq!(system.check_terminal(&player, 0.0), None);
        assert_eq!(system.check_terminal(&player, -5.0), Some(GameOverReason::FellOutOfWorld));
        player.set_health(0.0);
        assert_eq!(system.check_terminal(&player, 0.0), Some(GameOverReason::HealthDepleted));
    }
}
