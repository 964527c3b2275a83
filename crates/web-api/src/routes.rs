use axum::{
    extract::{DefaultBodyLimit, State, WebSocketUpgrade},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::{state::AppState, upload, ws_connection};

pub fn router(state: AppState) -> Router {
    let uploads = ServeDir::new(&state.config.upload.dir);
    let static_assets = ServeDir::new(&state.config.server.static_dir);

    // multipart 本身还有表单开销，body 上限在配置值之上留一点余量，
    // 精确的大小检查在上传处理器里做
    let body_limit = state.config.upload.max_bytes.saturating_add(64 * 1024);

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(websocket_upgrade))
        .route("/upload/image", post(upload::upload_image))
        .route("/upload/file", post(upload::upload_file))
        .nest_service("/uploads", uploads)
        .fallback_service(static_assets)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn websocket_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    // 连接建立时是匿名的，join 事件在会话内完成注册
    ws.on_upgrade(move |socket| ws_connection::handle_socket(socket, state))
}
