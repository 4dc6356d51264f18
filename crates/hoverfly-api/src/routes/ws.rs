//! # Realtime WebSocket Endpoint
//!
//! One socket per client, joining any number of mission channels. The
//! handshake authenticates with the same bearer token as REST (via the
//! `Authorization` header or a `token` query parameter for browser
//! clients), and a join is admitted only after the owner-scoped mission
//! lookup succeeds, so operators cannot listen in on missions they do
//! not own.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::auth::{Principal, bearer_token};
use crate::context::ApiContext;
use crate::error::{ApiError, ApiResult};

#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    #[serde(default)]
    pub token: Option<String>,
}

/// Commands a client sends over the socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "action")]
enum ClientCommand {
    #[serde(rename = "join-mission", rename_all = "camelCase")]
    JoinMission { mission_id: Uuid },
    #[serde(rename = "leave-mission", rename_all = "camelCase")]
    LeaveMission { mission_id: Uuid },
}

pub async fn ws_upgrade(
    State(ctx): State<ApiContext>,
    Query(query): Query<WsQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> ApiResult<Response> {
    let header_token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token);
    let token = header_token
        .or(query.token.as_deref())
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    let principal = ctx
        .auth
        .validate(token)
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, ctx, principal)))
}

async fn handle_socket(socket: WebSocket, ctx: ApiContext, principal: Principal) {
    let connection = Uuid::new_v4();
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    tracing::debug!(%connection, user_id = %principal.user_id, "websocket connected");

    loop {
        tokio::select! {
            outbound = rx.recv() => {
                let Some(frame) = outbound else { break };
                if sink.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            inbound = stream.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => {
                        let reply = handle_command(&ctx, &principal, connection, &tx, &text).await;
                        if sink.send(Message::Text(reply.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    ctx.broadcaster.unsubscribe_all(connection).await;
    tracing::debug!(%connection, "websocket disconnected");
}

async fn handle_command(
    ctx: &ApiContext,
    principal: &Principal,
    connection: Uuid,
    tx: &mpsc::UnboundedSender<String>,
    text: &str,
) -> serde_json::Value {
    let command: ClientCommand = match serde_json::from_str(text) {
        Ok(command) => command,
        Err(_) => {
            return json!({ "event": "error", "message": "Unrecognized command" });
        }
    };

    match command {
        ClientCommand::JoinMission { mission_id } => {
            match ctx.store.get_by_id(mission_id, principal.user_id).await {
                Ok(Some(_)) => {
                    ctx.broadcaster
                        .subscribe(mission_id, connection, tx.clone())
                        .await;
                    json!({ "event": "joined", "missionId": mission_id })
                }
                Ok(None) => json!({ "event": "error", "message": "Mission not found" }),
                Err(error) => {
                    tracing::error!(%mission_id, %error, "mission lookup failed during join");
                    json!({ "event": "error", "message": "Mission lookup failed" })
                }
            }
        }
        ClientCommand::LeaveMission { mission_id } => {
            ctx.broadcaster.unsubscribe(mission_id, connection).await;
            json!({ "event": "left", "missionId": mission_id })
        }
    }
}
