//! Web API 层。
//!
//! 提供 Axum 路由，将 HTTP / WebSocket 请求桥接到应用层的消息路由器。

mod error;
mod routes;
mod state;
mod upload;
mod ws_connection;

pub use routes::router;
pub use state::AppState;
