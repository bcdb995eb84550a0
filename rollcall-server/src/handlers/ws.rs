use axum::{
    extract::{
        Extension, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use rollcall_model::{RosterEvent, User};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};

use crate::infra::{
    app_state::AppState,
    websocket::{Connection, messages},
};

/// Handle WebSocket upgrade request. The route sits behind the bearer auth
/// middleware, so only authenticated staff sessions reach the upgrade.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, user))
}

/// Handle an individual WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState, user: User) {
    let (mut ws_sender, mut ws_receiver) = socket.split();
    let (tx, mut rx) =
        mpsc::channel::<RosterEvent>(state.config.broadcast.connection_queue);

    // Create and register the connection
    let connection = Arc::new(Connection::new(user, tx));
    let conn_id = connection.id;
    state
        .websocket_manager
        .add_connection(conn_id, connection.clone());

    // Outbound task: merges the shared roster bus with this session's
    // targeted queue. A lagged bus receiver just skips ahead; the session
    // converges again at its next poll or snapshot.
    let mut bus_rx = state.event_bus.subscribe();
    let send_task = tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                frame = bus_rx.recv() => match frame {
                    Ok(frame) => frame.event,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(conn_id = %conn_id, skipped, "dashboard session lagged behind roster bus");
                        continue;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                queued = rx.recv() => match queued {
                    Some(event) => event,
                    None => break,
                },
            };

            match messages::event_to_websocket(&event) {
                Ok(ws_msg) => {
                    if ws_sender.send(ws_msg).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to encode roster event: {}", e);
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(msg @ (Message::Text(_) | Message::Binary(_))) => {
                match messages::websocket_to_event(msg) {
                    Ok(event) => {
                        if let Err(e) =
                            handle_client_event(event, &state, &connection).await
                        {
                            tracing::error!("Error handling dashboard message: {}", e);
                        }
                    }
                    Err(e) => {
                        tracing::debug!("Ignoring unparseable dashboard message: {}", e);
                    }
                }
            }
            Ok(Message::Close(_)) => {
                break;
            }
            Err(e) => {
                tracing::error!("WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }

    // Clean up on disconnect
    state.websocket_manager.remove_connection(conn_id);
    send_task.abort();
}

/// Handle one client-originated event.
async fn handle_client_event(
    event: RosterEvent,
    state: &AppState,
    connection: &Connection,
) -> anyhow::Result<()> {
    match event {
        // Resync: answer with a targeted snapshot to this session alone
        // rather than leaving it to the poll fallback.
        RosterEvent::RequestActiveStudents => {
            let snapshot = state.roster.snapshot().await?;
            connection.send_event(snapshot).await?;
        }

        // Server-initiated messages should not come from clients
        RosterEvent::ActiveStudents { .. }
        | RosterEvent::StudentCheckedIn { .. }
        | RosterEvent::StudentCheckedOut { .. } => {
            tracing::warn!(
                user = %connection.user.username,
                "Client sent server-only event type"
            );
        }
    }

    Ok(())
}
