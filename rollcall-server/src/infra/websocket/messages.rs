use anyhow::Result;
use axum::extract::ws::{Message, Utf8Bytes};
use rollcall_model::RosterEvent;

/// Convert a RosterEvent to a WebSocket message
pub fn event_to_websocket(event: &RosterEvent) -> Result<Message> {
    let json = serde_json::to_string(event)?;
    Ok(Message::Text(Utf8Bytes::from(json)))
}

/// Convert a WebSocket message to a RosterEvent
pub fn websocket_to_event(msg: Message) -> Result<RosterEvent> {
    match msg {
        Message::Text(text) => {
            let event: RosterEvent = serde_json::from_str(text.as_str())?;
            Ok(event)
        }
        Message::Binary(bin) => {
            let event: RosterEvent = serde_json::from_slice(bin.as_ref())?;
            Ok(event)
        }
        _ => Err(anyhow::anyhow!("Unsupported message type")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::ws::Message;

    #[test]
    fn checked_out_event_round_trips_over_the_wire() {
        let event = RosterEvent::StudentCheckedOut {
            barcode: "B200".to_string(),
        };
        let ws_msg = event_to_websocket(&event).unwrap();
        let back = websocket_to_event(ws_msg).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn resync_request_parses_from_client_text() {
        let msg = Message::Text("{\"type\":\"request_active_students\"}".into());
        let event = websocket_to_event(msg).unwrap();
        assert_eq!(event, RosterEvent::RequestActiveStudents);
    }

    #[test]
    fn ping_frames_are_rejected() {
        assert!(websocket_to_event(Message::Ping(vec![].into())).is_err());
    }
}
