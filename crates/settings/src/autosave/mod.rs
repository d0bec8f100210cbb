//! Autosave scheduling: debounce plus the overlap-safety state machine.
//!
//! The machine is sans-I/O: it consumes events (`note_edit`,
//! `debounce_elapsed`, `save_resolved`) and tells the caller what to do
//! next. Timers and the actual PUT belong to the host event loop; ordering
//! is enforced entirely here, with no locks, since there is exactly one logical
//! writer.

use std::time::Duration;

use tracing::{debug, warn};

/// Default quiet period after the last edit before a save fires.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(1200);

/// Pending-save state. At most one save is ever in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveState {
    /// No unsaved edits, no outstanding save.
    Clean,
    /// Edits pending, debounce timer running.
    DirtyPending,
    /// A save is in flight; the tree had no further edits since it started.
    Saving,
    /// A save is in flight *and* edits arrived after it started; a follow-up
    /// save runs as soon as this one resolves.
    SavingWithRetry,
}

/// Debounced save scheduler.
///
/// Guarantees: at most one in-flight save; every edit is eventually included
/// in a completed save; no edit is silently dropped.
#[derive(Debug)]
pub struct AutoSave {
    state: SaveState,
    debounce: Duration,
}

impl AutoSave {
    pub fn new(debounce: Duration) -> Self {
        Self {
            state: SaveState::Clean,
            debounce,
        }
    }

    pub fn state(&self) -> SaveState {
        self.state
    }

    /// Whether a save is currently in flight.
    pub fn save_outstanding(&self) -> bool {
        matches!(self.state, SaveState::Saving | SaveState::SavingWithRetry)
    }

    /// An edit happened. Returns the debounce window to (re)start when the
    /// caller must arm its timer; edits during an in-flight save are queued
    /// instead and need no timer.
    pub fn note_edit(&mut self) -> Option<Duration> {
        match self.state {
            SaveState::Clean | SaveState::DirtyPending => {
                self.transition(SaveState::DirtyPending);
                Some(self.debounce)
            }
            SaveState::Saving => {
                self.transition(SaveState::SavingWithRetry);
                None
            }
            SaveState::SavingWithRetry => None,
        }
    }

    /// The debounce timer fired. Returns `true` when the caller must begin a
    /// save now (collect, merge, transmit). A timer firing in any other
    /// state is stale and ignored.
    pub fn debounce_elapsed(&mut self) -> bool {
        if self.state == SaveState::DirtyPending {
            self.transition(SaveState::Saving);
            true
        } else {
            debug!(state = ?self.state, "stale debounce timer ignored");
            false
        }
    }

    /// The in-flight save resolved (successfully or not). Returns `true`
    /// when edits arrived while it ran and the caller must immediately begin
    /// the follow-up save.
    pub fn save_resolved(&mut self) -> bool {
        match self.state {
            SaveState::Saving => {
                self.transition(SaveState::Clean);
                false
            }
            SaveState::SavingWithRetry => {
                self.transition(SaveState::Saving);
                true
            }
            state => {
                warn!(?state, "save resolution with no save outstanding");
                false
            }
        }
    }

    fn transition(&mut self, next: SaveState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, "autosave transition");
        }
        self.state = next;
    }
}

impl Default for AutoSave {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
