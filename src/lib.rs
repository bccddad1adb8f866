//! Classic tracker link - client side of the tracker stats WebSocket
//!
//! Connects to `ws://<host>/ws/` and keeps two observable cells in sync
//! with the server:
//! - `stats`: latest statistics snapshot, or the default before the first payload
//! - `connected`: true once a payload arrived on the current socket
//!
//! Reconnects after a fixed delay whenever the socket closes or errors.
//! The native client runs as a tokio task; the WASM client runs on the
//! browser event loop. Both share [`core`].

pub mod core;
pub mod error;
pub mod ws_state;

#[cfg(all(feature = "cli", not(target_arch = "wasm32")))]
pub mod websocket_native;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub mod websocket_wasm;

pub use crate::core::{
    PageLocation, Ruleset, Stats, TrackerConfig, TrackerHandle, TrackerMessage,
};
pub use error::{Result, TrackerError};
pub use ws_state::ConnectionPhase;

#[cfg(all(feature = "cli", not(target_arch = "wasm32")))]
pub use websocket_native::TrackerClient;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub use websocket_wasm::WsTrackerClient;
