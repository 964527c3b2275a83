//! 在线注册表
//!
//! 维护用户名到活跃连接的映射。映射对用户名内容不做任何校验，
//! 大小写敏感，同名后注册者静默覆盖先注册者（last writer wins）。
//! 所有变更由消息路由器发起，内部用单个异步读写锁保护，
//! 任何事件都不会观察到半更新状态。

use domain::ConnectionId;
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Eq)]
struct PresenceEntry {
    username: String,
    connection_id: ConnectionId,
}

/// 用户名 -> 连接的进程内注册表
///
/// 条目按插入顺序保存，`list` 的顺序仅用于展示。
#[derive(Debug, Default)]
pub struct PresenceRegistry {
    entries: RwLock<Vec<PresenceEntry>>,
}

impl PresenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或覆盖映射
    ///
    /// 覆盖时旧条目被移除，新条目追加到末尾；被覆盖的连接
    /// 保留其本地用户名，但从此无法通过私聊寻址。
    pub async fn register(&self, username: &str, connection_id: ConnectionId) {
        let mut entries = self.entries.write().await;
        entries.retain(|entry| entry.username != username);
        entries.push(PresenceEntry {
            username: username.to_string(),
            connection_id,
        });
    }

    /// 移除映射，不存在时为无副作用的 no-op
    pub async fn unregister(&self, username: &str) {
        let mut entries = self.entries.write().await;
        entries.retain(|entry| entry.username != username);
    }

    /// 仅当条目仍属于该连接时移除
    ///
    /// 用于断线清理：被同名覆盖的旧连接断开时，不能误删
    /// 新持有者的条目。返回是否确实移除了条目。
    pub async fn unregister_if(&self, username: &str, connection_id: ConnectionId) -> bool {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|entry| {
            !(entry.username == username && entry.connection_id == connection_id)
        });
        entries.len() != before
    }

    /// 私聊寻址
    pub async fn lookup(&self, username: &str) -> Option<ConnectionId> {
        let entries = self.entries.read().await;
        entries
            .iter()
            .find(|entry| entry.username == username)
            .map(|entry| entry.connection_id)
    }

    /// 按插入顺序返回在线用户名
    pub async fn list(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        entries.iter().map(|entry| entry.username.clone()).collect()
    }
}
