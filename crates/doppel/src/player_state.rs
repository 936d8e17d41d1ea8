//! # Player State
//!
//! Health, stamina, remote charge and the two inventory flags. All three
//! resources are clamped into `[0, max]` after every mutation.
//!
//! Rate-limited effects use a [`Cooldown`] owned by the state itself:
//! hazard damage, remote drain and exhaustion recovery each have one.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use doppel_shared::constants::{
    DAMAGE_INTERVAL, DRAIN_INTERVAL, EXHAUSTION_RECOVERY, MAX_HEALTH, MAX_REMOTE_CHARGE, MAX_STAMINA,
    REMOTE_CHARGE_RATE, REMOTE_DRAIN_AMOUNT, SPRINT_THRESHOLD, STAMINA_DRAIN_RATE, STAMINA_REGEN_RATE,
};

/// Accumulates time and fires once per interval.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cooldown {
    elapsed: f32,
    interval: f32,
}

impl Cooldown {
    /// Creates a cooldown that fires after `interval` seconds.
    #[must_use]
    pub const fn new(interval: f32) -> Self {
        Self { elapsed: 0.0, interval }
    }

    /// Adds `dt`. Returns true and restarts if the interval was reached.
    pub fn tick(&mut self, dt: f32) -> bool {
        self.elapsed += dt;
        if self.elapsed >= self.interval {
            self.elapsed = 0.0;
            true
        } else {
            false
        }
    }

    /// Restarts the countdown.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// Seconds accumulated since the last fire.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Configured interval.
    #[must_use]
    pub const fn interval(&self) -> f32 {
        self.interval
    }
}

/// Resource tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Health cap.
    pub max_health: f32,
    /// Stamina cap.
    pub max_stamina: f32,
    /// Remote charge cap.
    pub max_remote_charge: f32,
    /// Stamina per second while not exhausted.
    pub stamina_regen_rate: f32,
    /// Stamina per second while sprinting.
    pub stamina_drain_rate: f32,
    /// Charge per second while recharging.
    pub remote_charge_rate: f32,
    /// Charge removed per drain pulse.
    pub remote_drain_amount: f32,
    /// Seconds between hazard damage pulses.
    pub damage_interval: f32,
    /// Seconds between remote drain pulses.
    pub drain_interval: f32,
    /// Seconds of enforced rest once stamina hits zero.
    pub exhaustion_recovery: f32,
    /// Sprinting requires more stamina than this.
    pub sprint_threshold: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: MAX_HEALTH,
            max_stamina: MAX_STAMINA,
            max_remote_charge: MAX_REMOTE_CHARGE,
            stamina_regen_rate: STAMINA_REGEN_RATE,
            stamina_drain_rate: STAMINA_DRAIN_RATE,
            remote_charge_rate: REMOTE_CHARGE_RATE,
            remote_drain_amount: REMOTE_DRAIN_AMOUNT,
            damage_interval: DAMAGE_INTERVAL,
            drain_interval: DRAIN_INTERVAL,
            exhaustion_recovery: EXHAUSTION_RECOVERY,
            sprint_threshold: SPRINT_THRESHOLD,
        }
    }
}

/// Mutable player resources.
#[derive(Clone, Debug)]
pub struct PlayerState {
    config: PlayerConfig,
    health: f32,
    stamina: f32,
    remote_charge: f32,
    exhausted: bool,
    damage_cooldown: Cooldown,
    drain_cooldown: Cooldown,
    recovery_cooldown: Cooldown,
    remote_in_inventory: bool,
    note_in_inventory: bool,
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new(PlayerConfig::default())
    }
}

impl PlayerState {
    /// Creates a player with full resources and an empty inventory.
    #[must_use]
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            health: config.max_health,
            stamina: config.max_stamina,
            remote_charge: config.max_remote_charge,
            exhausted: false,
            damage_cooldown: Cooldown::new(config.damage_interval),
            drain_cooldown: Cooldown::new(config.drain_interval),
            recovery_cooldown: Cooldown::new(config.exhaustion_recovery),
            remote_in_inventory: false,
            note_in_inventory: false,
            config,
        }
    }

    /// Per-frame upkeep: stamina regeneration and the exhaustion latch.
    pub fn update(&mut self, dt: f32) {
        self.regenerate_stamina(dt);
        if self.exhausted && self.stamina > 0.0 {
            self.exhausted = false;
            debug!(stamina = self.stamina, "recovered from exhaustion");
        }
    }

    /// Spends stamina for `dt` seconds of sprinting.
    pub fn spend_stamina(&mut self, dt: f32) {
        self.stamina = (self.stamina - self.config.stamina_drain_rate * dt).clamp(0.0, self.config.max_stamina);
        if self.stamina <= 0.0 && !self.exhausted {
            self.exhausted = true;
            self.recovery_cooldown.reset();
            info!("player exhausted");
        }
    }

    /// Regenerates stamina. While exhausted, nothing happens until the
    /// recovery cooldown has elapsed once.
    pub fn regenerate_stamina(&mut self, dt: f32) {
        if self.exhausted && !self.recovery_cooldown.tick(dt) {
            return;
        }
        self.stamina = (self.stamina + self.config.stamina_regen_rate * dt).clamp(0.0, self.config.max_stamina);
    }

    /// Accumulates hazard exposure; applies `amount` once per damage interval.
    ///
    /// Returns true if damage was applied this call. A dead player takes
    /// no further damage.
    pub fn register_damage(&mut self, dt: f32, amount: f32) -> bool {
        if self.is_dead() || !self.damage_cooldown.tick(dt) {
            return false;
        }
        self.health = (self.health - amount).clamp(0.0, self.config.max_health);
        info!(amount, health = self.health, "player damaged");
        true
    }

    /// Accumulates drain exposure; removes a fixed amount of charge once per
    /// drain interval. Returns true if charge was removed this call.
    pub fn drain_remote(&mut self, dt: f32) -> bool {
        if !self.drain_cooldown.tick(dt) {
            return false;
        }
        self.remote_charge =
            (self.remote_charge - self.config.remote_drain_amount).clamp(0.0, self.config.max_remote_charge);
        debug!(charge = self.remote_charge, "remote drained");
        true
    }

    /// Restores health.
    pub fn heal(&mut self, amount: f32) {
        self.health = (self.health + amount).clamp(0.0, self.config.max_health);
    }

    /// Recharges the remote for `dt` seconds.
    pub fn charge_remote(&mut self, dt: f32) {
        self.remote_charge =
            (self.remote_charge + self.config.remote_charge_rate * dt).clamp(0.0, self.config.max_remote_charge);
    }

    /// Overrides health (debug tooling and scripted scenarios).
    pub fn set_health(&mut self, health: f32) {
        self.health = health.clamp(0.0, self.config.max_health);
    }

    /// Overrides remote charge.
    pub fn set_remote_charge(&mut self, charge: f32) {
        self.remote_charge = charge.clamp(0.0, self.config.max_remote_charge);
    }

    /// True while stamina is above the sprint threshold.
    #[must_use]
    pub fn can_sprint(&self) -> bool {
        self.stamina > self.config.sprint_threshold
    }

    /// True once health reached zero.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// True between hitting zero stamina and regenerating past it.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Current stamina.
    #[must_use]
    pub const fn stamina(&self) -> f32 {
        self.stamina
    }

    /// Current remote charge.
    #[must_use]
    pub const fn remote_charge(&self) -> f32 {
        self.remote_charge
    }

    /// Tuning in use.
    #[must_use]
    pub const fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Remote currently held.
    #[must_use]
    pub const fn has_remote(&self) -> bool {
        self.remote_in_inventory
    }

    /// Note currently held.
    #[must_use]
    pub const fn has_note(&self) -> bool {
        self.note_in_inventory
    }

    /// Updates the remote inventory flag.
    pub fn set_remote_in_inventory(&mut self, held: bool) {
        self.remote_in_inventory = held;
    }

    /// Updates the note inventory flag.
    pub fn set_note_in_inventory(&mut self, held: bool) {
        self.note_in_inventory = held;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_range(state: &PlayerState) -> bool {
        let c = state.config();
        (0.0..=c.max_health).contains(&state.health())
            && (0.0..=c.max_stamina).contains(&state.stamina())
            && (0.0..=c.max_remote_charge).contains(&state.remote_charge())
    }

    #[test]
    fn test_cooldown_fires_once_per_interval() {
        let mut cooldown = Cooldown::new(2.0);
        let fired = (0..240).filter(|_| cooldown.tick(1.0 / 60.0)).count();
        assert_eq!(fired, 1);
    }

    #[test]
    fn test_resources_stay_clamped() {
        let mut state = PlayerState::default();
        // Deterministic pseudo-random sequence of operations
        let mut seed = 0x2545_f491_u32;
        for _ in 0..5000 {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            let dt = (seed % 100) as f32 / 100.0;
            match seed % 7 {
                0 => state.update(dt),
                1 => state.spend_stamina(dt),
                2 => {
                    state.register_damage(dt, 10.0);
                }
                3 => {
                    state.drain_remote(dt);
                }
                4 => state.heal(30.0),
                5 => state.charge_remote(dt),
                _ => state.regenerate_stamina(dt),
            }
            assert!(in_range(&state));
        }
    }

    #[test]
    fn test_damage_is_rate_limited() {
        let mut state = PlayerState::default();
        let mut hits = 0;
        for _ in 0..(60 * 5) {
            if state.register_damage(1.0 / 60.0, 10.0) {
                hits += 1;
            }
        }
        // 5 seconds at one pulse per 2 seconds
        assert_eq!(hits, 2);
        assert!((state.health() - 80.0).abs() < 1e-4);
    }

    #[test]
    fn test_lethal_damage() {
        let mut state = PlayerState::default();
        state.set_health(10.0);
        assert!(state.register_damage(3.0, 50.0));
        assert!(state.is_dead());
        assert_eq!(state.health(), 0.0);

        assert!(!state.register_damage(3.0, 50.0));
        assert_eq!(state.health(), 0.0);
    }

    #[test]
    fn test_drain_removes_fixed_amount() {
        let mut state = PlayerState::default();
        assert!(!state.drain_remote(1.0));
        assert!(state.drain_remote(1.0));
        assert!((state.remote_charge() - 95.0).abs() < 1e-4);
    }

    #[test]
    fn test_exhaustion_latch_and_recovery() {
        let mut state = PlayerState::default();
        let dt = 1.0 / 60.0;
        while state.stamina() > 0.0 {
            state.spend_stamina(dt);
        }
        assert!(state.is_exhausted());
        assert!(!state.can_sprint());

        // Regeneration is held back during recovery
        for _ in 0..60 {
            state.update(dt);
        }
        assert!(state.is_exhausted());
        assert_eq!(state.stamina(), 0.0);

        for _ in 0..60 {
            state.update(dt);
        }
        assert!(!state.is_exhausted());
        assert!(state.stamina() > 0.0);
    }

    #[test]
    fn test_sprint_threshold() {
        let mut state = PlayerState::default();
        assert!(state.can_sprint());
        while state.stamina() > 5.0 {
            state.spend_stamina(0.01);
        }
        assert!(!state.can_sprint());
    }

    #[test]
    fn test_heal_caps_at_max() {
        let mut state = PlayerState::default();
        state.set_health(50.0);
        state.heal(30.0);
        assert!((state.health() - 80.0).abs() < 1e-4);
        state.heal(30.0);
        assert_eq!(state.health(), 100.0);
    }
}
