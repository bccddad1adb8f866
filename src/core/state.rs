//! Observable state cells shared between the connection loop and the UI
//!
//! The loop owns a [`TrackerState`] and is the only writer. The UI gets a
//! [`TrackerHandle`], which can read and subscribe but never write.

use tokio::sync::watch;
use tracing::trace;

use super::Ruleset;
use crate::ws_state::ConnectionPhase;

/// Shared ownership of the tracker state: `Arc` natively, `Rc` on the
/// single-threaded browser event loop.
#[cfg(not(target_arch = "wasm32"))]
pub type Shared<T> = std::sync::Arc<T>;
#[cfg(target_arch = "wasm32")]
pub type Shared<T> = std::rc::Rc<T>;

/// A single observable value.
///
/// Subscribers see the current value immediately and every later update.
pub struct Store<T> {
    tx: watch::Sender<T>,
}

impl<T> Store<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Replace the value and notify subscribers, even if nobody listens yet.
    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Replace the value, notifying subscribers only when it actually changed.
    pub fn set_if_changed(&self, value: T)
    where
        T: PartialEq,
    {
        self.tx.send_if_modified(|current| {
            if *current == value {
                false
            } else {
                *current = value;
                true
            }
        });
    }

    pub fn get(&self) -> T
    where
        T: Clone,
    {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

/// The two published cells (plus the diagnostic phase) for one tracker.
pub struct TrackerState<S> {
    stats: Store<S>,
    connected: Store<bool>,
    phase: Store<ConnectionPhase>,
    default_stats: S,
    ruleset: Ruleset,
}

impl<S: Clone> TrackerState<S> {
    pub fn new(default_stats: S, ruleset: Ruleset) -> Self {
        Self {
            stats: Store::new(default_stats.clone()),
            connected: Store::new(false),
            phase: Store::new(ConnectionPhase::Disconnected),
            default_stats,
            ruleset,
        }
    }

    /// Server told us it lost the game: back to defaults, still socket-connected.
    pub(crate) fn reset(&self) {
        trace!("Resetting stats to defaults");
        self.connected.set_if_changed(false);
        self.stats.set(self.default_stats.clone());
        self.phase.set_if_changed(ConnectionPhase::Connecting);
    }

    pub(crate) fn publish_payload(&self, stats: S) {
        self.stats.set(stats);
        self.connected.set_if_changed(true);
        self.phase.set_if_changed(ConnectionPhase::Connected);
    }

    pub(crate) fn mark_connecting(&self) {
        self.phase.set_if_changed(ConnectionPhase::Connecting);
    }

    /// Socket is gone. Stats keep their last value until the next reset or payload.
    pub(crate) fn mark_disconnected(&self) {
        self.connected.set_if_changed(false);
        self.phase.set_if_changed(ConnectionPhase::Disconnected);
    }

    pub fn stats(&self) -> S {
        self.stats.get()
    }

    pub fn is_connected(&self) -> bool {
        self.connected.get()
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase.get()
    }
}

/// Read-only view handed to the UI layer.
pub struct TrackerHandle<S> {
    state: Shared<TrackerState<S>>,
}

impl<S> Clone for TrackerHandle<S> {
    fn clone(&self) -> Self {
        Self {
            state: Shared::clone(&self.state),
        }
    }
}

impl<S: Clone> TrackerHandle<S> {
    pub fn new(state: Shared<TrackerState<S>>) -> Self {
        Self { state }
    }

    /// Latest snapshot, or the default if no payload arrived yet
    pub fn stats(&self) -> S {
        self.state.stats()
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.state.phase()
    }

    pub fn ruleset(&self) -> Ruleset {
        self.state.ruleset
    }

    pub fn subscribe_stats(&self) -> watch::Receiver<S> {
        self.state.stats.subscribe()
    }

    pub fn subscribe_connected(&self) -> watch::Receiver<bool> {
        self.state.connected.subscribe()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<ConnectionPhase> {
        self.state.phase.subscribe()
    }
}
