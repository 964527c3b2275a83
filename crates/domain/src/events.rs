//! 线缆事件定义
//!
//! 客户端与服务端之间的所有 WebSocket 事件都以 JSON 文本帧传输。
//! 入站事件用 `type` 字段做内部标签；出站事件统一为 `type` + `payload`
//! 的相邻标签，这样纯字符串通知和结构化消息走同一条编码路径。

use serde::{Deserialize, Serialize};

/// 客户端发往路由器的事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// 注册显示名，完成 Anonymous -> Named 转换
    Join { username: String },
    /// 群发文本消息
    ChatMessage { message: String },
    /// 群发图片消息，URL 由上传接口预先返回
    ChatImage {
        #[serde(rename = "imageUrl")]
        image_url: String,
    },
    /// 群发文件消息
    ChatFile { name: String, url: String },
    /// 私聊
    Whisper { to: String, message: String },
    /// 查询在线用户
    Show,
    /// 礼貌性离开通知，不关闭连接
    Leave { username: String },
}

/// 路由器发往客户端的事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// 广播给除发送者外的所有连接
    UserJoined(String),
    /// 广播给除发送者外的所有连接
    UserLeft(String),
    /// 广播给包括发送者在内的所有连接
    ChatMessage {
        user: String,
        message: String,
        time: String,
    },
    /// 广播给包括发送者在内的所有连接
    ChatImage {
        user: String,
        image: String,
        time: String,
    },
    /// 广播给包括发送者在内的所有连接
    ChatFile {
        user: String,
        name: String,
        url: String,
        time: String,
    },
    /// 仅投递给目标连接
    Whisper { from: String, message: String },
    /// 仅投递给发送者
    WhisperError(String),
    /// 仅投递给请求者的系统消息
    #[serde(rename = "system message")]
    System(String),
}

impl ServerEvent {
    /// 加入通知文案
    pub fn joined_notice(username: &str) -> Self {
        Self::UserJoined(format!("{username} has joined the chat."))
    }

    /// 离开通知文案
    pub fn left_notice(username: &str) -> Self {
        Self::UserLeft(format!("{username} has left the chat."))
    }

    /// 私聊目标未注册时的错误文案
    pub fn whisper_miss(to: &str) -> Self {
        Self::WhisperError(format!("User \"{to}\" not found."))
    }

    /// 在线用户列表文案，空列表显示 none
    pub fn online_users(names: &[String]) -> Self {
        let joined = if names.is_empty() {
            "none".to_string()
        } else {
            names.join(", ")
        };
        Self::System(format!("Online users: {joined}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_events_match_wire_shapes() {
        let join: ClientEvent =
            serde_json::from_value(json!({"type": "join", "username": "alice"})).unwrap();
        assert_eq!(
            join,
            ClientEvent::Join {
                username: "alice".to_string()
            }
        );

        let image: ClientEvent =
            serde_json::from_value(json!({"type": "chat-image", "imageUrl": "/uploads/a.png"}))
                .unwrap();
        assert_eq!(
            image,
            ClientEvent::ChatImage {
                image_url: "/uploads/a.png".to_string()
            }
        );

        let whisper: ClientEvent =
            serde_json::from_value(json!({"type": "whisper", "to": "bob", "message": "hi"}))
                .unwrap();
        assert_eq!(
            whisper,
            ClientEvent::Whisper {
                to: "bob".to_string(),
                message: "hi".to_string()
            }
        );

        // show 没有负载
        let show: ClientEvent = serde_json::from_value(json!({"type": "show"})).unwrap();
        assert_eq!(show, ClientEvent::Show);
    }

    #[test]
    fn malformed_payload_is_rejected() {
        // whisper 缺少 message 字段
        let result =
            serde_json::from_value::<ClientEvent>(json!({"type": "whisper", "to": "bob"}));
        assert!(result.is_err());

        let result = serde_json::from_value::<ClientEvent>(json!({"type": "no-such-event"}));
        assert!(result.is_err());
    }

    #[test]
    fn server_events_serialize_with_type_and_payload() {
        let value = serde_json::to_value(ServerEvent::joined_notice("alice")).unwrap();
        assert_eq!(
            value,
            json!({"type": "user-joined", "payload": "alice has joined the chat."})
        );

        let value = serde_json::to_value(ServerEvent::ChatMessage {
            user: "alice".to_string(),
            message: "hi".to_string(),
            time: "2026-01-01T00:00:00.000Z".to_string(),
        })
        .unwrap();
        assert_eq!(
            value,
            json!({
                "type": "chat-message",
                "payload": {"user": "alice", "message": "hi", "time": "2026-01-01T00:00:00.000Z"}
            })
        );

        let value = serde_json::to_value(ServerEvent::System("Online users: none".to_string()))
            .unwrap();
        assert_eq!(
            value,
            json!({"type": "system message", "payload": "Online users: none"})
        );
    }

    #[test]
    fn whisper_miss_uses_quoted_username() {
        let event = ServerEvent::whisper_miss("carol");
        assert_eq!(
            event,
            ServerEvent::WhisperError("User \"carol\" not found.".to_string())
        );
    }
}
