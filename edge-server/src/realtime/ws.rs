//! WebSocket 传输
//!
//! `GET /ws?token=<jwt>` 员工连接；`GET /ws?order_id=<id>&cpf=<cpf>` 顾客连接，
//! 顾客连接握手时即加入 `order:{id}`，且只能留在该房间。
//!
//! 每个连接一个任务：同时等待客户端帧和网关推送的事件。

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::message::{ClientFrame, Room, ServerFrame};

use super::gateway::GatewayError;
use super::session::{Session, SessionInfo};
use crate::auth::authenticate;
use crate::core::ServerState;

/// Handshake query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    pub token: Option<String>,
    pub order_id: Option<i64>,
    pub cpf: Option<String>,
}

/// Upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<ServerState>,
    Query(params): Query<ConnectParams>,
) -> Result<Response, AppError> {
    let info = identify(&state, &params).await?;
    Ok(ws.on_upgrade(move |socket| serve_socket(socket, state, info)))
}

/// Resolve who is connecting before the upgrade
pub async fn identify(state: &ServerState, params: &ConnectParams) -> Result<SessionInfo, AppError> {
    if let Some(token) = params.token.as_deref() {
        let user = authenticate(state.jwt_service(), token, "/ws")?;
        return Ok(SessionInfo::staff(user.id, user.role));
    }
    match (params.order_id, params.cpf.as_deref()) {
        (Some(order_id), Some(cpf)) => {
            state
                .coordinator()
                .get_order_for_customer(order_id, cpf)
                .await?;
            Ok(SessionInfo::customer(order_id))
        }
        _ => Err(AppError::not_authenticated()),
    }
}

async fn serve_socket(socket: WebSocket, state: ServerState, info: SessionInfo) {
    let mut session = state.gateway.connect(info.clone());
    if let Some(order_id) = info.own_order
        && let Err(e) = session.join(Room::Order(order_id))
    {
        tracing::error!(session = %session.id(), error = %e, "Customer room join failed");
        return;
    }
    tracing::info!(session = %session.id(), role = %info.role, "WebSocket connected");

    let (mut sink, mut stream) = socket.split();
    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,
            event = session.recv() => {
                let Some(event) = event else { break };
                if !send_frame(&mut sink, &ServerFrame::Event(event)).await {
                    break;
                }
            }
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    let reply = handle_frame(&session, text.as_str());
                    if !send_frame(&mut sink, &reply).await {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    tracing::debug!(session = %session.id(), error = %e, "WebSocket read error");
                    break;
                }
                // ping/pong handled by axum, binary ignored
                Some(Ok(_)) => {}
            }
        }
    }

    let _ = sink.close().await;
    tracing::info!(session = %session.id(), "WebSocket disconnected");
}

async fn send_frame<S>(sink: &mut S, frame: &ServerFrame) -> bool
where
    S: futures::Sink<Message> + Unpin,
{
    let text = match serde_json::to_string(frame) {
        Ok(text) => text,
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode server frame");
            return true;
        }
    };
    sink.send(Message::Text(text.into())).await.is_ok()
}

/// Apply one client frame to the session and build the reply
pub fn handle_frame(session: &Session, raw: &str) -> ServerFrame {
    let frame: ClientFrame = match serde_json::from_str(raw) {
        Ok(frame) => frame,
        Err(e) => {
            return ServerFrame::Error {
                code: ErrorCode::InvalidRequest.code(),
                message: format!("unrecognized frame: {}", e),
            };
        }
    };

    if let Some(room) = frame.join_target() {
        return match session.join(room) {
            Ok(()) => ServerFrame::Joined { room },
            Err(e) => gateway_error(e),
        };
    }
    match frame {
        ClientFrame::LeaveRoom { room } => match session.leave(room) {
            Ok(()) => ServerFrame::Left { room },
            Err(e) => gateway_error(e),
        },
        ClientFrame::Ping => ServerFrame::Pong,
        // join frames handled above
        _ => ServerFrame::Error {
            code: ErrorCode::InvalidRequest.code(),
            message: "unsupported frame".into(),
        },
    }
}

fn gateway_error(e: GatewayError) -> ServerFrame {
    let code = match e {
        GatewayError::NotAdmitted(_) => ErrorCode::PermissionDenied,
        GatewayError::UnknownSession(_) => ErrorCode::InvalidRequest,
    };
    ServerFrame::Error {
        code: code.code(),
        message: e.to_string(),
    }
}
