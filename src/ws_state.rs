//! Shared WebSocket connection phase
//!
//! Used by both WASM and native tracker clients.

/// Where the connection loop currently is.
///
/// `Connected` is only entered once a `Payload` frame arrives, not when the
/// socket opens. There is no terminal phase: after `Disconnected` the loop
/// retries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionPhase {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionPhase {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionPhase::Connected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_phase_is_disconnected() {
        assert_eq!(ConnectionPhase::default(), ConnectionPhase::Disconnected);
        assert!(!ConnectionPhase::Connecting.is_connected());
        assert!(ConnectionPhase::Connected.is_connected());
    }
}
