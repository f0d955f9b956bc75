//! Event client configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::event::EventKind;
use crate::config::{DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_MAX_IN_FLIGHT_HANDLERS, DEFAULT_WS_URL};

/// Whether a subscription whose last handler went away is also dropped on
/// the node side with an `unsubscribe` frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsubscribePolicy {
    #[default]
    Always,
    Never,
    /// Only for the listed channels.
    Only(Vec<EventKind>),
}

impl UnsubscribePolicy {
    pub fn applies_to(&self, kind: EventKind) -> bool {
        match self {
            UnsubscribePolicy::Always => true,
            UnsubscribePolicy::Never => false,
            UnsubscribePolicy::Only(kinds) => kinds.contains(&kind),
        }
    }
}

/// Settings for one [`super::EventClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Websocket endpoint of the node, e.g. `ws://localhost:3000/ws`.
    pub url: String,

    /// How long a new connection may take to send its `{"uid"}` frame.
    pub handshake_timeout: Duration,

    /// Maximum handler invocations running at once, across all
    /// connections. Frames wait for a free slot.
    pub max_in_flight_handlers: usize,

    pub unsubscribe_policy: UnsubscribePolicy,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_WS_URL.to_string(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            max_in_flight_handlers: DEFAULT_MAX_IN_FLIGHT_HANDLERS,
            unsubscribe_policy: UnsubscribePolicy::default(),
        }
    }
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_scopes() {
        assert!(UnsubscribePolicy::default().applies_to(EventKind::Status));
        assert!(!UnsubscribePolicy::Never.applies_to(EventKind::Block));
        let only = UnsubscribePolicy::Only(vec![EventKind::Cosignature]);
        assert!(only.applies_to(EventKind::Cosignature));
        assert!(!only.applies_to(EventKind::Status));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"url":"ws://node:3000/ws","unsubscribe_policy":"never"}"#)
                .unwrap();
        assert_eq!(config.url, "ws://node:3000/ws");
        assert_eq!(config.unsubscribe_policy, UnsubscribePolicy::Never);
        assert_eq!(config.max_in_flight_handlers, DEFAULT_MAX_IN_FLIGHT_HANDLERS);
    }
}
