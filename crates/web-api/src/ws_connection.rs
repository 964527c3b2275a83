//! WebSocket 连接泵
//!
//! 封装单条 WebSocket 会话的收发循环：入站文本帧解析为客户端
//! 事件交给路由器，路由器的出站事件序列化后写回对端。会话结束
//! （显式关闭或对端消失）时通知路由器做断线清理。

use axum::extract::ws::{Message as WsMessage, WebSocket};
use domain::{ClientEvent, ConnectionId, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::state::AppState;

/// WebSocket 写操作命令
///
/// 统一管理所有对 sender 的写操作，避免两个任务争用写半边。
#[derive(Debug)]
enum WsCommand {
    SendPong(Vec<u8>),
}

pub async fn handle_socket(socket: WebSocket, state: AppState) {
    // 传输层在此分配连接标识，进程内不复用
    let connection_id = ConnectionId::new();
    let mut outbound = state.router.connect(connection_id).await;

    let (mut sender, mut incoming) = socket.split();
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<WsCommand>(32);

    // 发送任务：合并写命令和路由器的出站事件
    let send_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                Some(cmd) = cmd_rx.recv() => {
                    let frame = match cmd {
                        WsCommand::SendPong(data) => WsMessage::Pong(data.into()),
                    };
                    if sender.send(frame).await.is_err() {
                        break;
                    }
                }
                maybe_event = outbound.recv() => {
                    let Some(event) = maybe_event else {
                        // 路由器已释放该连接的出站通道
                        break;
                    };
                    let payload = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(err) => {
                            tracing::warn!(error = %err, "failed to serialize websocket payload");
                            continue;
                        }
                    };
                    if sender.send(WsMessage::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // 接收任务：按到达顺序逐条处理入站事件，不做重排
    let recv_state = state.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = incoming.next().await {
            match message {
                WsMessage::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                    Ok(event) => {
                        if let Err(err) = recv_state
                            .router
                            .handle_event(connection_id, event)
                            .await
                        {
                            tracing::error!(error = %err, connection_id = %connection_id, "处理入站事件失败");
                            break;
                        }
                    }
                    Err(err) => {
                        // 格式错误只影响来源连接，不向其他连接传播
                        tracing::warn!(error = %err, connection_id = %connection_id, "忽略格式错误的事件帧");
                        recv_state
                            .router
                            .deliver(
                                connection_id,
                                ServerEvent::System("Malformed event.".to_string()),
                            )
                            .await;
                    }
                },
                WsMessage::Ping(data) => {
                    if cmd_tx.send(WsCommand::SendPong(data.to_vec())).await.is_err() {
                        break;
                    }
                }
                WsMessage::Pong(_) => {}
                WsMessage::Binary(_) => {
                    // 核心从不携带二进制，附件走上传接口
                    tracing::debug!(connection_id = %connection_id, "收到二进制帧，忽略");
                }
                WsMessage::Close(_) => break,
            }
        }
    });

    // 任一方向结束即视为会话结束
    tokio::select! {
        _ = send_task => {}
        _ = recv_task => {}
    }

    state.router.disconnect(connection_id).await;
    tracing::info!(connection_id = %connection_id, "WebSocket 连接已关闭");
}
