//! WebSocket endpoint for project-scoped issue events.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use issuecast_core::registry::FrameReceiver;
use issuecast_core::ConnectionHandler;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::state::AppState;

/// How a connection ended.
enum Outcome {
    Closed,
    Failed,
}

/// WebSocket upgrade handler for `/ws/projects/{project_id}/`.
///
/// The project id is validated before upgrading.
pub async fn ws_handler(
    Path(project_id): Path<Uuid>,
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, project_id.to_string(), state))
}

/// Handle individual WebSocket connection.
async fn handle_socket(socket: WebSocket, project_id: String, state: AppState) {
    let mut handler = ConnectionHandler::new(state.registry.clone(), &project_id);
    let outbound = match handler.connect() {
        Ok(rx) => rx,
        Err(e) => {
            warn!(error = %e, "Could not join project group");
            return;
        }
    };

    let (sender, mut receiver) = socket.split();
    let mut send_task = tokio::spawn(forward_frames(sender, outbound));

    let outcome = tokio::select! {
        result = &mut send_task => match result {
            Ok(Ok(())) => Outcome::Closed,
            Ok(Err(e)) => {
                debug!(connection_id = %handler.id(), error = %e, "WebSocket send failed");
                Outcome::Failed
            }
            Err(_) => Outcome::Failed,
        },
        outcome = read_inbound(&mut receiver, &handler) => outcome,
    };
    send_task.abort();

    match outcome {
        Outcome::Closed => handler.disconnect(),
        Outcome::Failed => handler.fail(),
    }
}

/// Drain the connection's queue into the socket, in order.
async fn forward_frames(
    mut sender: SplitSink<WebSocket, Message>,
    mut outbound: FrameReceiver,
) -> Result<(), axum::Error> {
    while let Some(frame) = outbound.recv().await {
        sender.send(Message::Text(frame.to_string().into())).await?;
    }
    Ok(())
}

/// Read client frames until close or error. Content is not acted upon.
async fn read_inbound(receiver: &mut SplitStream<WebSocket>, handler: &ConnectionHandler) -> Outcome {
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => handler.receive(text.as_str()),
            Ok(Message::Close(_)) => {
                debug!(connection_id = %handler.id(), "WebSocket client sent close frame");
                return Outcome::Closed;
            }
            Ok(_) => {}
            Err(e) => {
                debug!(connection_id = %handler.id(), error = %e, "WebSocket receive failed");
                return Outcome::Failed;
            }
        }
    }
    Outcome::Closed
}
