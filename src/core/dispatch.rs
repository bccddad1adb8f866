//! Applies inbound frames to the tracker state
//!
//! Shared by the native and WASM connection loops so both react to the
//! server identically.

use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use super::message::{decode, TrackerMessage};
use super::state::TrackerState;
use crate::error::Result;

/// What a frame did to the state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    /// `Connecting`: stats back to default, connected cleared
    Reset,
    /// `Payload`: stats replaced, connected set
    Updated,
    /// Unrecognised `type`, nothing changed
    Ignored,
}

/// Decode and apply one text frame.
///
/// A malformed frame returns the parse error and leaves the state untouched.
pub fn apply_frame<S>(text: &str, state: &TrackerState<S>) -> Result<Applied>
where
    S: DeserializeOwned + Clone,
{
    let msg = decode::<S>(text)?;
    Ok(apply_message(msg, state))
}

pub fn apply_message<S: Clone>(msg: TrackerMessage<S>, state: &TrackerState<S>) -> Applied {
    match msg {
        // Resets whatever the current connected value is
        TrackerMessage::Connecting => {
            debug!("Server is waiting for the game, resetting stats");
            state.reset();
            Applied::Reset
        }
        TrackerMessage::Payload { stats } => {
            trace!("Stats payload");
            state.publish_payload(stats);
            Applied::Updated
        }
        TrackerMessage::Unknown => {
            trace!("Ignoring unknown message type");
            Applied::Ignored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Ruleset;
    use crate::error::TrackerError;
    use serde_json::{json, Value};

    fn state() -> TrackerState<Value> {
        TrackerState::new(json!({"x": 0}), Ruleset::Two)
    }

    #[test]
    fn test_payload_replaces_stats_and_connects() {
        let state = state();
        let applied = apply_frame(r#"{"type":"Payload","stats":{"x":5}}"#, &state).unwrap();

        assert_eq!(applied, Applied::Updated);
        assert_eq!(state.stats(), json!({"x": 5}));
        assert!(state.is_connected());
    }

    #[test]
    fn test_payload_is_never_merged() {
        let state = state();
        apply_frame(r#"{"type":"Payload","stats":{"x":5,"y":1}}"#, &state).unwrap();
        apply_frame(r#"{"type":"Payload","stats":{"z":2}}"#, &state).unwrap();

        assert_eq!(state.stats(), json!({"z": 2}));
    }

    #[test]
    fn test_connecting_resets_when_connected() {
        let state = state();
        apply_frame(r#"{"type":"Payload","stats":{"x":5}}"#, &state).unwrap();

        let applied = apply_frame(r#"{"type":"Connecting"}"#, &state).unwrap();
        assert_eq!(applied, Applied::Reset);
        assert_eq!(state.stats(), json!({"x": 0}));
        assert!(!state.is_connected());
    }

    #[test]
    fn test_connecting_resets_when_not_connected() {
        let state = state();
        assert!(!state.is_connected());

        let applied = apply_frame(r#"{"type":"Connecting"}"#, &state).unwrap();
        assert_eq!(applied, Applied::Reset);
        assert_eq!(state.stats(), json!({"x": 0}));
        assert!(!state.is_connected());
    }

    #[test]
    fn test_unknown_type_changes_nothing() {
        let state = state();
        apply_frame(r#"{"type":"Payload","stats":{"x":5}}"#, &state).unwrap();

        let applied = apply_frame(r#"{"type":"Status","stats":{"x":9}}"#, &state).unwrap();
        assert_eq!(applied, Applied::Ignored);
        assert_eq!(state.stats(), json!({"x": 5}));
        assert!(state.is_connected());
    }

    #[test]
    fn test_malformed_frame_leaves_state() {
        let state = state();
        apply_frame(r#"{"type":"Payload","stats":{"x":5}}"#, &state).unwrap();

        for frame in ["", "{", "null", r#"{"no_type":true}"#, r#"{"type":"Payload"}"#] {
            let err = apply_frame(frame, &state).unwrap_err();
            assert!(matches!(err, TrackerError::Parse(_)), "frame {frame:?}");
            assert_eq!(state.stats(), json!({"x": 5}));
            assert!(state.is_connected());
        }
    }

    #[test]
    fn test_typed_stats_mismatch_is_parse_error() {
        let state = TrackerState::new(crate::core::Stats::default(), Ruleset::Two);
        let err = apply_frame(r#"{"type":"Payload","stats":[1]}"#, &state).unwrap_err();
        assert!(matches!(err, TrackerError::Parse(_)));
        assert!(!state.is_connected());
    }
}
