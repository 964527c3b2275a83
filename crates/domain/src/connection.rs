//! 连接标识与连接状态
//!
//! 一个连接对应一条活跃的 WebSocket 会话。连接在创建时没有用户名，
//! 客户端发送 join 事件后用户名被设置，且每条会话只允许设置一次。

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;

/// 传输层分配的连接标识
///
/// 在进程生命周期内不会复用。核心不关心其内部结构，只用作路由键。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// 单个连接的路由状态
///
/// 状态机只有两个状态：匿名（username 为 None）和已命名。
/// 没有回退到匿名的转换。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionState {
    pub id: ConnectionId,
    pub username: Option<String>,
}

impl ConnectionState {
    pub fn new(id: ConnectionId) -> Self {
        Self { id, username: None }
    }

    pub fn is_named(&self) -> bool {
        self.username.is_some()
    }

    /// 设置用户名，完成 Anonymous -> Named 的转换
    ///
    /// 每条会话只允许 join 一次，重复设置返回错误。
    pub fn set_username(&mut self, username: String) -> Result<(), DomainError> {
        if let Some(current) = &self.username {
            return Err(DomainError::AlreadyJoined {
                current: current.clone(),
            });
        }
        self.username = Some(username);
        Ok(())
    }
}
