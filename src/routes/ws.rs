//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to `AppState`. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{info, error, instrument, debug};

use crate::protocol::{attempt_out, session_out, ClientWsMessage, ServerWsMessage};
use crate::state::AppState;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "blockquiz_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "blockquiz_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "blockquiz_backend", "WS received: {:?}", &incoming);
            handle_client_ws(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "blockquiz_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "blockquiz_backend", "WebSocket disconnected");
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::StartGame { name, seed } => match state.start_session(&name, seed).await {
      Ok((id, name, snap)) => {
        info!(target: "quiz", session = %id, "WS session started");
        ServerWsMessage::Session { session: session_out(&id, &name, &snap) }
      }
      Err(e) => ServerWsMessage::Error { message: e.to_string() },
    },

    ClientWsMessage::SubmitAttempt { session_id, block_id } => {
      match state.submit_attempt(&session_id, &block_id).await {
        Ok((result, name, snap)) => ServerWsMessage::AttemptResult {
          result: attempt_out(&result, session_out(&session_id, &name, &snap)),
        },
        Err(e) => ServerWsMessage::Error { message: e.to_string() },
      }
    }

    ClientWsMessage::GetRound { session_id } => match state.session_snapshot(&session_id).await {
      Ok((name, snap)) => ServerWsMessage::Session { session: session_out(&session_id, &name, &snap) },
      Err(e) => ServerWsMessage::Error { message: e.to_string() },
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::catalog::Catalog;
  use crate::config::GameSettings;
  use crate::submission::{JsonFileStore, SubmissionStore};

  fn state(dir: &std::path::Path) -> AppState {
    let store = SubmissionStore::JsonFile(JsonFileStore::new(dir.join("users.json")));
    AppState::new(Catalog::builtin(), GameSettings::default(), store)
  }

  #[tokio::test]
  async fn ws_dispatch_drives_a_session() {
    let temp_dir = tempfile::tempdir().unwrap();
    let state = state(temp_dir.path());

    let reply = handle_client_ws(ClientWsMessage::StartGame { name: "Ana".into(), seed: Some(3) }, &state).await;
    let session_id = match reply {
      ServerWsMessage::Session { session } => session.session_id,
      other => panic!("unexpected reply: {other:?}"),
    };

    let reply = handle_client_ws(
      ClientWsMessage::SubmitAttempt { session_id: session_id.clone(), block_id: "not-a-block".into() },
      &state,
    )
    .await;
    match reply {
      ServerWsMessage::AttemptResult { result } => {
        assert!(!result.correct);
        assert_eq!(result.session.current_index, 0);
      }
      other => panic!("unexpected reply: {other:?}"),
    }

    let reply = handle_client_ws(ClientWsMessage::GetRound { session_id }, &state).await;
    assert!(matches!(reply, ServerWsMessage::Session { .. }));
  }

  #[tokio::test]
  async fn ws_errors_are_replies_not_disconnects() {
    let temp_dir = tempfile::tempdir().unwrap();
    let state = state(temp_dir.path());
    let reply = handle_client_ws(ClientWsMessage::GetRound { session_id: "missing".into() }, &state).await;
    assert!(matches!(reply, ServerWsMessage::Error { .. }));
    assert!(matches!(handle_client_ws(ClientWsMessage::Ping, &state).await, ServerWsMessage::Pong));
  }
}
