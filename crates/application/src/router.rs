//! 消息路由器
//!
//! 持有全部连接生命周期：传输层在连接建立/断开时通知路由器，
//! 入站事件由路由器对照在线注册表决定扇出方式——全体广播、
//! 除发送者外广播、单播或仅回执发送者。
//!
//! 投递是尽力而为的：某个接收者的通道已关闭时记录日志并跳过，
//! 绝不中断同一次扇出中对其余接收者的投递。任何错误都只影响
//! 单个连接或单个事件，路由器本身不会因此失效。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::SecondsFormat;
use domain::{ClientEvent, ConnectionId, ConnectionState, DomainError, ServerEvent};
use tokio::sync::{mpsc, RwLock};

use crate::clock::Clock;
use crate::error::ApplicationError;
use crate::presence::PresenceRegistry;

/// 连接表中的一条记录：路由状态 + 出站通道
struct ConnectionHandle {
    state: ConnectionState,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

/// 进程内唯一的路由器实例，被所有连接任务共享
pub struct MessageRouter {
    connections: RwLock<HashMap<ConnectionId, ConnectionHandle>>,
    presence: PresenceRegistry,
    clock: Arc<dyn Clock>,
}

impl MessageRouter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            presence: PresenceRegistry::new(),
            clock,
        }
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    /// 注册新连接，返回该连接的出站事件接收端
    ///
    /// 连接初始为匿名状态，发送 join 之前只能收到系统消息。
    pub async fn connect(&self, connection_id: ConnectionId) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = ConnectionHandle {
            state: ConnectionState::new(connection_id),
            sender,
        };
        self.connections.write().await.insert(connection_id, handle);
        tracing::info!(connection_id = %connection_id, "新连接已注册");
        receiver
    }

    /// 传输层会话结束时调用
    ///
    /// 断线按显式 leave 处理：注销用户名并向其余连接广播离开
    /// 通知。注销带归属检查——被同名覆盖的旧连接断开时不清理
    /// 新持有者的条目，也不再重复广播。
    pub async fn disconnect(&self, connection_id: ConnectionId) {
        let removed = self.connections.write().await.remove(&connection_id);
        let Some(handle) = removed else {
            return;
        };

        if let Some(username) = handle.state.username {
            if self.presence.unregister_if(&username, connection_id).await {
                // 发送者已从连接表移除，全体广播即为"其他人"
                self.broadcast_all(ServerEvent::left_notice(&username)).await;
            }
        }

        tracing::info!(connection_id = %connection_id, "连接已断开并清理");
    }

    /// 处理一条入站事件
    ///
    /// 前置条件不满足（匿名连接发消息、重复 join）只会给违规
    /// 发送者回一条系统消息，不影响其他连接。
    pub async fn handle_event(
        &self,
        connection_id: ConnectionId,
        event: ClientEvent,
    ) -> Result<(), ApplicationError> {
        match event {
            ClientEvent::Join { username } => self.handle_join(connection_id, username).await,
            ClientEvent::ChatMessage { message } => {
                let Some(user) = self.require_named(connection_id).await? else {
                    return Ok(());
                };
                let time = self.timestamp();
                self.broadcast_all(ServerEvent::ChatMessage {
                    user,
                    message,
                    time,
                })
                .await;
                Ok(())
            }
            ClientEvent::ChatImage { image_url } => {
                let Some(user) = self.require_named(connection_id).await? else {
                    return Ok(());
                };
                let time = self.timestamp();
                self.broadcast_all(ServerEvent::ChatImage {
                    user,
                    image: image_url,
                    time,
                })
                .await;
                Ok(())
            }
            ClientEvent::ChatFile { name, url } => {
                let Some(user) = self.require_named(connection_id).await? else {
                    return Ok(());
                };
                let time = self.timestamp();
                self.broadcast_all(ServerEvent::ChatFile {
                    user,
                    name,
                    url,
                    time,
                })
                .await;
                Ok(())
            }
            ClientEvent::Whisper { to, message } => {
                let Some(from) = self.require_named(connection_id).await? else {
                    return Ok(());
                };
                match self.presence.lookup(&to).await {
                    Some(target) => {
                        self.deliver(target, ServerEvent::Whisper { from, message })
                            .await;
                    }
                    None => {
                        self.deliver(connection_id, ServerEvent::whisper_miss(&to))
                            .await;
                    }
                }
                Ok(())
            }
            ClientEvent::Show => {
                if self.require_named(connection_id).await?.is_none() {
                    return Ok(());
                }
                let names = self.presence.list().await;
                self.deliver(connection_id, ServerEvent::online_users(&names))
                    .await;
                Ok(())
            }
            ClientEvent::Leave { username } => {
                if self.require_named(connection_id).await?.is_none() {
                    return Ok(());
                }
                // 礼貌性信号：先通知其他人，再删除注册表条目。
                // 连接保持打开，状态不回退到匿名。
                self.broadcast_others(connection_id, ServerEvent::left_notice(&username))
                    .await;
                self.presence.unregister(&username).await;
                tracing::info!(connection_id = %connection_id, username = %username, "用户离开聊天室");
                Ok(())
            }
        }
    }

    /// 投递一条事件给单个连接
    ///
    /// 也供传输适配层使用，向来源连接回报格式错误的帧。
    pub async fn deliver(&self, connection_id: ConnectionId, event: ServerEvent) {
        let connections = self.connections.read().await;
        match connections.get(&connection_id) {
            Some(handle) => {
                if handle.sender.send(event).is_err() {
                    tracing::warn!(connection_id = %connection_id, "对端通道已关闭，跳过投递");
                }
            }
            None => {
                tracing::warn!(connection_id = %connection_id, "目标连接不存在，丢弃事件");
            }
        }
    }

    async fn handle_join(
        &self,
        connection_id: ConnectionId,
        username: String,
    ) -> Result<(), ApplicationError> {
        {
            let mut connections = self.connections.write().await;
            let handle = connections
                .get_mut(&connection_id)
                .ok_or(ApplicationError::ConnectionNotFound(connection_id))?;

            if let Err(DomainError::AlreadyJoined { current }) =
                handle.state.set_username(username.clone())
            {
                drop(connections);
                tracing::warn!(connection_id = %connection_id, current = %current, "重复 join 被拒绝");
                self.deliver(
                    connection_id,
                    ServerEvent::System(format!("Already joined as \"{current}\".")),
                )
                .await;
                return Ok(());
            }
        }

        self.presence.register(&username, connection_id).await;
        tracing::info!(connection_id = %connection_id, username = %username, "用户加入聊天室");
        self.broadcast_others(connection_id, ServerEvent::joined_notice(&username))
            .await;
        Ok(())
    }

    /// 读取发送者的用户名；匿名连接收到一条系统消息并返回 None
    async fn require_named(
        &self,
        connection_id: ConnectionId,
    ) -> Result<Option<String>, ApplicationError> {
        let username = {
            let connections = self.connections.read().await;
            let handle = connections
                .get(&connection_id)
                .ok_or(ApplicationError::ConnectionNotFound(connection_id))?;
            handle.state.username.clone()
        };

        match username {
            Some(user) => Ok(Some(user)),
            None => {
                self.deliver(
                    connection_id,
                    ServerEvent::System("Join the chat before sending messages.".to_string()),
                )
                .await;
                Ok(None)
            }
        }
    }

    /// 广播给包括发送者在内的所有连接
    async fn broadcast_all(&self, event: ServerEvent) {
        let connections = self.connections.read().await;
        for (connection_id, handle) in connections.iter() {
            if handle.sender.send(event.clone()).is_err() {
                tracing::warn!(connection_id = %connection_id, "对端通道已关闭，跳过投递");
            }
        }
    }

    /// 广播给除发送者外的所有连接
    async fn broadcast_others(&self, sender_id: ConnectionId, event: ServerEvent) {
        let connections = self.connections.read().await;
        for (connection_id, handle) in connections.iter() {
            if *connection_id == sender_id {
                continue;
            }
            if handle.sender.send(event.clone()).is_err() {
                tracing::warn!(connection_id = %connection_id, "对端通道已关闭，跳过投递");
            }
        }
    }

    /// 路由器在处理入站事件的时刻分配权威服务器时间
    fn timestamp(&self) -> String {
        self.clock
            .now()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}
