//! # Game State Machine
//!
//! Session-level state, owned by the host and passed into every tick.
//!
//! ## States
//!
//! - **MainMenu**: before the first run.
//! - **Playing**: the only state in which the simulation advances.
//! - **Paused**: frozen mid-run; resumes where it left off.
//! - **GameOver**: health ran out or the player fell out of the world.
//! - **Won**: the remote reached the pressure plate.
//! - **Restarting**: the host is rebuilding the level.
//! - **Quitting**: terminal; the host should exit.
//!
//! Illegal transitions are refused and leave the state unchanged.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Session state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    /// Title screen.
    #[default]
    MainMenu,
    /// Simulation running.
    Playing,
    /// Simulation frozen.
    Paused,
    /// Run lost.
    GameOver,
    /// Run won.
    Won,
    /// Level being rebuilt.
    Restarting,
    /// Shutting down.
    Quitting,
}

impl GameState {
    fn name(self) -> &'static str {
        match self {
            Self::MainMenu => "MAIN_MENU",
            Self::Playing => "PLAYING",
            Self::Paused => "PAUSED",
            Self::GameOver => "GAME_OVER",
            Self::Won => "WON",
            Self::Restarting => "RESTARTING",
            Self::Quitting => "QUITTING",
        }
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a run ended in defeat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOverReason {
    /// Health reached zero.
    HealthDepleted,
    /// The player dropped below the fall threshold.
    FellOutOfWorld,
}

/// Explicit session state machine.
#[derive(Clone, Debug, Default)]
pub struct GameStateMachine {
    state: GameState,
    game_over_reason: Option<GameOverReason>,
    transitions: u32,
}

impl GameStateMachine {
    /// Starts at the main menu.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> GameState {
        self.state
    }

    /// True while the simulation should advance.
    #[must_use]
    pub const fn is_playing(&self) -> bool {
        matches!(self.state, GameState::Playing)
    }

    /// Cause of the last defeat, if the current state is `GameOver`.
    #[must_use]
    pub const fn game_over_reason(&self) -> Option<GameOverReason> {
        self.game_over_reason
    }

    /// Number of accepted transitions.
    #[must_use]
    pub const fn transitions(&self) -> u32 {
        self.transitions
    }

    /// MainMenu or Restarting → Playing.
    pub fn start(&mut self) -> bool {
        matches!(self.state, GameState::MainMenu | GameState::Restarting) && self.transition_to(GameState::Playing)
    }

    /// Playing → Paused.
    pub fn pause(&mut self) -> bool {
        self.is_playing() && self.transition_to(GameState::Paused)
    }

    /// Paused → Playing.
    pub fn resume(&mut self) -> bool {
        self.state == GameState::Paused && self.transition_to(GameState::Playing)
    }

    /// Playing → Won.
    pub fn win(&mut self) -> bool {
        self.is_playing() && self.transition_to(GameState::Won)
    }

    /// Playing → GameOver.
    pub fn game_over(&mut self, reason: GameOverReason) -> bool {
        if !self.is_playing() {
            return false;
        }
        self.game_over_reason = Some(reason);
        self.transition_to(GameState::GameOver)
    }

    /// Paused, GameOver or Won → Restarting.
    pub fn restart(&mut self) -> bool {
        matches!(self.state, GameState::Paused | GameState::GameOver | GameState::Won)
            && self.transition_to(GameState::Restarting)
    }

    /// Paused, GameOver or Won → MainMenu.
    pub fn back_to_menu(&mut self) -> bool {
        matches!(self.state, GameState::Paused | GameState::GameOver | GameState::Won)
            && self.transition_to(GameState::MainMenu)
    }

    /// Any state → Quitting.
    pub fn quit(&mut self) -> bool {
        self.state != GameState::Quitting && self.transition_to(GameState::Quitting)
    }

    fn transition_to(&mut self, next: GameState) -> bool {
        let previous = self.state;
        self.state = next;
        self.transitions += 1;
        if next != GameState::GameOver {
            self.game_over_reason = None;
        }
        tracing::info!(
            "Game state transition: {} -> {} (reason: {:?})",
            previous,
            next,
            self.game_over_reason
        );
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path() {
        let mut machine = GameStateMachine::new();
        assert_eq!(machine.state(), GameState::MainMenu);
        assert!(machine.start());
        assert!(machine.is_playing());
        assert!(machine.win());
        assert_eq!(machine.state(), GameState::Won);
        assert!(machine.restart());
        assert!(machine.start());
        assert!(machine.is_playing());
    }

    #[test]
    fn test_win_only_once() {
        let mut machine = GameStateMachine::new();
        machine.start();
        assert!(machine.win());
        assert!(!machine.win());
        assert_eq!(machine.transitions(), 2);
    }

    #[test]
    fn test_game_over_records_reason() {
        let mut machine = GameStateMachine::new();
        machine.start();
        assert!(machine.game_over(GameOverReason::FellOutOfWorld));
        assert_eq!(machine.game_over_reason(), Some(GameOverReason::FellOutOfWorld));
        assert!(!machine.win(), "cannot win after losing");

        machine.restart();
        assert_eq!(machine.game_over_reason(), None);
    }

    #[test]
    fn test_pause_round_trip() {
        let mut machine = GameStateMachine::new();
        assert!(!machine.pause(), "nothing to pause in the menu");
        machine.start();
        assert!(machine.pause());
        assert!(!machine.is_playing());
        assert!(!machine.game_over(GameOverReason::HealthDepleted));
        assert!(machine.resume());
        assert!(machine.is_playing());
    }

    #[test]
    fn test_quit_is_terminal() {
        let mut machine = GameStateMachine::new();
        assert!(machine.quit());
        assert!(!machine.quit());
        assert!(!machine.start());
        assert_eq!(machine.state(), GameState::Quitting);
    }
}
