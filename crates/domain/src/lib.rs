//! 聊天中继核心领域模型
//!
//! 包含连接标识、连接状态机，以及客户端/服务端事件的线缆格式定义。

pub mod connection;
pub mod errors;
pub mod events;

// 重新导出常用类型
pub use connection::*;
pub use errors::*;
pub use events::*;
