//! Inbound tracker messages
//!
//! Every text frame is one JSON object with a `type` discriminator:
//!
//! ```json
//! {"type": "Connecting"}
//! {"type": "Payload", "stats": { ... }}
//! ```
//!
//! Any other `type` string decodes to [`TrackerMessage::Unknown`].

use serde::de::{DeserializeOwned, Error as _};
use serde::Serialize;
use serde_json::Value;
use tracing::trace;

use crate::error::Result;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum TrackerMessage<S> {
    /// Server lost the game process and is looking for it again.
    Connecting,
    /// Fresh statistics snapshot, replaces the previous one wholesale.
    Payload { stats: S },
    Unknown,
}

/// Decode one text frame.
///
/// The frame must be a JSON object with a string `type`. `stats` is only
/// looked at for `Payload`.
pub fn decode<S: DeserializeOwned>(text: &str) -> Result<TrackerMessage<S>> {
    trace!(len = text.len(), "Decoding frame");

    let json: Value = serde_json::from_str(text)?;
    let Value::Object(mut fields) = json else {
        return Err(serde_json::Error::custom("tracker message is not a JSON object").into());
    };

    let kind = fields
        .get("type")
        .and_then(Value::as_str)
        .map(str::to_owned)
        .ok_or_else(|| serde_json::Error::missing_field("type"))?;

    match kind.as_str() {
        "Connecting" => Ok(TrackerMessage::Connecting),
        "Payload" => {
            let stats = fields
                .remove("stats")
                .ok_or_else(|| serde_json::Error::missing_field("stats"))?;
            Ok(TrackerMessage::Payload {
                stats: serde_json::from_value(stats)?,
            })
        }
        _ => Ok(TrackerMessage::Unknown),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Stats;
    use serde_json::json;

    #[test]
    fn test_decode_connecting() {
        let msg: TrackerMessage<Value> = decode(r#"{"type":"Connecting"}"#).unwrap();
        assert_eq!(msg, TrackerMessage::Connecting);
    }

    #[test]
    fn test_decode_payload_keeps_stats_verbatim() {
        let msg: TrackerMessage<Value> =
            decode(r#"{"type":"Payload","stats":{"x":5,"nested":{"y":[1,2]}}}"#).unwrap();
        assert_eq!(
            msg,
            TrackerMessage::Payload {
                stats: json!({"x": 5, "nested": {"y": [1, 2]}})
            }
        );
    }

    #[test]
    fn test_decode_typed_payload() {
        let msg: TrackerMessage<Stats> =
            decode(r#"{"type":"Payload","stats":{"dice_games_won":2}}"#).unwrap();
        match msg {
            TrackerMessage::Payload { stats } => assert_eq!(stats.dice_games_won, 2.0),
            other => panic!("expected payload, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type() {
        let msg: TrackerMessage<Value> = decode(r#"{"type":"Heartbeat","n":1}"#).unwrap();
        assert_eq!(msg, TrackerMessage::Unknown);
    }

    #[test]
    fn test_server_frames_decode() {
        let frame = serde_json::to_string(&TrackerMessage::Payload { stats: Stats::default() }).unwrap();
        let msg: TrackerMessage<Stats> = decode(&frame).unwrap();
        assert_eq!(msg, TrackerMessage::Payload { stats: Stats::default() });

        let frame = serde_json::to_string(&TrackerMessage::<Stats>::Connecting).unwrap();
        assert_eq!(frame, r#"{"type":"Connecting"}"#);
    }

    #[test]
    fn test_malformed_frames() {
        assert!(decode::<Value>("").is_err());
        assert!(decode::<Value>("not json").is_err());
        assert!(decode::<Value>(r#"{"stats":{}}"#).is_err());
        assert!(decode::<Value>(r#"{"type":5}"#).is_err());
        assert!(decode::<Value>(r#"{"type":"Payload"}"#).is_err());
        assert!(decode::<Value>("[1,2,3]").is_err());
    }

    #[test]
    fn test_payload_with_wrong_stats_shape() {
        assert!(decode::<Stats>(r#"{"type":"Payload","stats":"nope"}"#).is_err());
    }
}
