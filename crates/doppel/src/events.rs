//! # DOPPEL Event System
//!
//! Gameplay notifications for whoever is listening: audio middleware,
//! analytics, achievement hooks, the headless driver's log.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐      ┌─────────────┐      ┌─────────────┐
//! │  Game::tick │─────>│   bounded   │─────>│  consumer   │
//! │  (logic)    │      │   channel   │      │  (host)     │
//! └─────────────┘      └─────────────┘      └─────────────┘
//! ```
//!
//! The tick never blocks on a slow consumer: when the channel is full the
//! event is dropped.

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::trace;

use doppel_shared::ActiveWorld;

use crate::entity::{EntityId, EntityKind};
use crate::game_state::GameOverReason;

/// Default channel capacity.
pub const DEFAULT_EVENT_CAPACITY: usize = 1024;

/// Things that happened during a tick.
#[derive(Clone, Debug, PartialEq)]
pub enum GameEvent {
    // =========================================================================
    // Inventory
    // =========================================================================
    /// An item went into the inventory.
    ItemPickedUp {
        /// The item.
        entity: EntityId,
        /// What it is.
        kind: EntityKind,
    },

    /// The remote left the hand.
    ItemThrown {
        /// The item.
        entity: EntityId,
        /// Release point.
        position: [f32; 3],
    },

    // =========================================================================
    // Worlds
    // =========================================================================
    /// The fade to the other world began.
    TransitionStarted {
        /// World being left.
        from: ActiveWorld,
    },

    /// The active world flipped (fade midpoint).
    WorldSwitched {
        /// World now active.
        world: ActiveWorld,
    },

    // =========================================================================
    // Player
    // =========================================================================
    /// Hazard damage landed.
    DamageTaken {
        /// Damage applied.
        amount: f32,
        /// Health afterwards.
        health_remaining: f32,
    },

    /// The remote lost charge to a hazard.
    RemoteDrained {
        /// Charge afterwards.
        charge_remaining: f32,
    },

    // =========================================================================
    // Session
    // =========================================================================
    /// The remote reached the pressure plate.
    Won,

    /// The run ended.
    GameOver {
        /// Cause.
        reason: GameOverReason,
    },

    /// Play was suspended.
    Paused,

    /// Play resumed.
    Resumed,
}

/// Event bus for gameplay notifications.
#[derive(Clone)]
pub struct EventBus {
    sender: Sender<GameEvent>,
    receiver: Receiver<GameEvent>,
}

impl EventBus {
    /// Creates a new event bus.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum events in flight before new ones are dropped.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = bounded(capacity);
        Self { sender, receiver }
    }

    /// Creates a sender handle (clone for multiple producers).
    #[must_use]
    pub fn sender(&self) -> EventSender {
        EventSender {
            sender: self.sender.clone(),
        }
    }

    /// Creates a receiver handle (clone for multiple consumers).
    #[must_use]
    pub fn receiver(&self) -> EventReceiver {
        EventReceiver {
            receiver: self.receiver.clone(),
        }
    }

    /// Creates a paired sender and receiver.
    #[must_use]
    pub fn create_pair(capacity: usize) -> (EventSender, EventReceiver) {
        let bus = Self::new(capacity);
        (bus.sender(), bus.receiver())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// Handle for sending events.
#[derive(Clone)]
pub struct EventSender {
    sender: Sender<GameEvent>,
}

impl EventSender {
    /// Sends an event (non-blocking).
    ///
    /// Returns `false` if the channel is full or every receiver is gone.
    #[inline]
    pub fn send(&self, event: GameEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                trace!(?event, "event channel full; dropping");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Handle for receiving events.
#[derive(Clone)]
pub struct EventReceiver {
    receiver: Receiver<GameEvent>,
}

impl EventReceiver {
    /// Receives all pending events (non-blocking).
    #[inline]
    pub fn drain(&self) -> Vec<GameEvent> {
        self.receiver.try_iter().collect()
    }

    /// Receives one event (non-blocking).
    #[inline]
    pub fn try_recv(&self) -> Option<GameEvent> {
        self.receiver.try_recv().ok()
    }

    /// Returns the number of pending events.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.receiver.len()
    }

    /// Checks if there are pending events.
    #[inline]
    #[must_use]
    pub fn has_events(&self) -> bool {
        !self.receiver.is_empty()
    }
}
