use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use application::{Clock, MessageRouter, SystemClock};
use config::AppConfig;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use uuid::Uuid;
use web_api::{router, AppState};

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// 启动一个绑定在随机端口上的完整服务实例
///
/// 上传目录指向每次独立的临时目录，测试之间互不干扰。
pub async fn spawn_server() -> (SocketAddr, oneshot::Sender<()>) {
    let mut config = AppConfig::from_env();
    config.upload.dir = std::env::temp_dir()
        .join(format!("chat-relay-test-{}", Uuid::new_v4()))
        .to_string_lossy()
        .into_owned();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let state = AppState::new(Arc::new(MessageRouter::new(clock)), Arc::new(config));
    let app = router(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service())
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .ok();
    });

    (addr, shutdown_tx)
}

pub async fn connect_ws(addr: SocketAddr) -> WsClient {
    let (ws, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("ws connect");
    ws
}

pub async fn send_json(ws: &mut WsClient, value: serde_json::Value) {
    ws.send(Message::Text(value.to_string().into()))
        .await
        .expect("ws send");
}

/// 等待下一条服务器事件并解析为 JSON
pub async fn next_json(ws: &mut WsClient) -> serde_json::Value {
    loop {
        let message = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("等待服务器事件超时")
            .expect("连接已结束")
            .expect("ws error");
        match message {
            Message::Text(text) => return serde_json::from_str(&text).expect("event json"),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// 断言短窗口内没有任何投递
pub async fn assert_silent(ws: &mut WsClient) {
    let result = tokio::time::timeout(Duration::from_millis(200), ws.next()).await;
    assert!(result.is_err(), "expected no delivery, got {result:?}");
}
