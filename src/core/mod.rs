//! Platform-agnostic core module - shared between the native and WASM clients

pub mod config;
pub mod dispatch;
pub mod message;
pub mod ruleset;
pub mod state;
pub mod stats;

pub use config::{PageLocation, TrackerConfig, DEFAULT_RETRY_DELAY, WS_PATH};
pub use dispatch::{apply_frame, apply_message, Applied};
pub use message::{decode, TrackerMessage};
pub use ruleset::Ruleset;
pub use state::{Shared, Store, TrackerHandle, TrackerState};
pub use stats::{EnemyDeaths, EnemyKills, LevelDeaths, MiscDeaths, Stats};
