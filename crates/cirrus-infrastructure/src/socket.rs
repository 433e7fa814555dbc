//! Realtime socket frame decoding.
//!
//! Frames are JSON objects of the form `{"type": "...", "data": {...}}`, one
//! per line. Frames with a type this build does not know are surfaced as
//! [`SocketEvent::Other`] rather than dropped.

use cirrus_core::error::Result;
use cirrus_core::event::{EventBus, SocketEvent};
use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

/// Decodes one socket frame.
///
/// Returns `None` when the frame is not a JSON object with a string `type`.
pub fn decode_socket_frame(frame: &str) -> Option<SocketEvent> {
    let value: Value = serde_json::from_str(frame.trim()).ok()?;
    let event_type = value.get("type")?.as_str()?.to_string();

    if let Ok(event) = serde_json::from_value::<SocketEvent>(value.clone()) {
        return Some(event);
    }

    // Unit variants such as `passwordChanged` reject any `data`, even `{}`.
    let payload = value.get("data").cloned().unwrap_or(Value::Null);
    if let Ok(event) = serde_json::from_value::<SocketEvent>(json!({ "type": event_type })) {
        return Some(event);
    }

    Some(SocketEvent::Other {
        event_type,
        payload,
    })
}

/// Reads newline-delimited frames until EOF and publishes each decoded event.
///
/// Returns the number of events published. Undecodable frames are logged
/// and skipped.
pub async fn pump_frames<R>(reader: R, bus: &EventBus) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut published = 0;

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match decode_socket_frame(&line) {
            Some(event) => {
                tracing::debug!("[Socket] Received {}", event.event_type());
                bus.publish(event);
                published += 1;
            }
            None => tracing::warn!("[Socket] Dropping malformed frame: {}", line),
        }
    }

    tracing::info!("[Socket] Stream closed after {} events", published);
    Ok(published)
}
