//! Key and controller input events from the web interface.

use serde::{Deserialize, Serialize};

/// A key/controller input event, as streamed from a user's model.
///
/// `source` identifies the originating client (e.g. a browser tab); exactly one
/// of `key` (keyboard) or `button` (gamepad) is normally set.
///
/// The serde representation uses the same abbreviated keys as the wire format
/// (`src`, `key`, `btn`, `dwn`), so events logged as JSON read like the
/// protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InputEvent {
    #[serde(rename = "src")]
    pub source: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<i64>,
    #[serde(rename = "btn", default, skip_serializing_if = "Option::is_none")]
    pub button: Option<i64>,
    #[serde(rename = "dwn")]
    pub is_down: bool,
}

impl InputEvent {
    /// A keyboard event.
    pub fn key(source: i64, key: i64, is_down: bool) -> Self {
        Self {
            source,
            key: Some(key),
            button: None,
            is_down,
        }
    }

    /// A gamepad button event.
    pub fn button(source: i64, button: i64, is_down: bool) -> Self {
        Self {
            source,
            key: None,
            button: Some(button),
            is_down,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_uses_abbreviated_keys() {
        let event = InputEvent::key(1, 37, true);

        let json = serde_json::to_string(&event).unwrap();

        assert_eq!(json, r#"{"src":1,"key":37,"dwn":true}"#);
    }

    #[test]
    fn test_json_parses_button_event() {
        let event: InputEvent = serde_json::from_str(r#"{"src":2,"btn":4,"dwn":false}"#).unwrap();
        assert_eq!(event, InputEvent::button(2, 4, false));
    }
}
