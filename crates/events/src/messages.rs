use core_types::{EventKey, keys::well_known};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::EventsError;

/// Event name of the socket control frame that announces the
/// subscription set.
pub const SUBSCRIBE_EVENT: &str = "subscribe";

/// The envelope carried by every inbound frame, on both transports.
///
/// The backend emits `{"event": ..., "payload": ...}`. Older backend
/// builds used `"type"` for the key, which is still accepted on the
/// way in. A missing payload decodes as JSON null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFrame {
    #[serde(alias = "type")]
    pub event: EventKey,
    #[serde(default)]
    pub payload: Value,
}

/// The full current set of subscribed event keys.
///
/// This is the body of the stream transport's
/// `POST /api/update-subscription` request and the payload of the
/// socket transport's `"subscribe"` control frame. It is always the
/// complete set, never a delta, so backend state is last-write-wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionUpdate {
    pub events: Vec<EventKey>,
}

impl SubscriptionUpdate {
    /// Renders the update as the socket control frame.
    pub fn to_control_frame(&self) -> Result<String, EventsError> {
        let frame = EventFrame {
            event: SUBSCRIBE_EVENT.to_string(),
            payload: serde_json::to_value(self)
                .map_err(|e| EventsError::Serialization(e.to_string()))?,
        };
        serde_json::to_string(&frame).map_err(|e| EventsError::Serialization(e.to_string()))
    }
}

/// Decodes a raw inbound frame into an `(event, payload)` pair.
///
/// Accepts the canonical envelope, tolerates the legacy `type` key, and
/// delivers any other well-formed JSON verbatim under the default
/// `"message"` key. Input that is not JSON at all is a decode error;
/// the caller is expected to log and drop the frame.
pub fn decode_frame(raw: &str) -> Result<(EventKey, Value), EventsError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| EventsError::Decode(e.to_string()))?;
    match serde_json::from_value::<EventFrame>(value.clone()) {
        Ok(frame) => Ok((frame.event, frame.payload)),
        Err(_) => Ok((well_known::MESSAGE.to_string(), value)),
    }
}
