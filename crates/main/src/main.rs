//! 主应用程序入口
//!
//! 启动聊天中继的 Axum Web 服务。

use std::sync::Arc;

use application::{Clock, MessageRouter, SystemClock};
use config::AppConfig;
use tracing_subscriber::EnvFilter;
use web_api::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 读取环境变量配置
    let config = AppConfig::from_env();
    config.validate()?;

    // 上传目录提前建好，避免第一次上传才暴露权限问题
    tokio::fs::create_dir_all(&config.upload.dir).await?;

    // 进程内唯一的消息路由器，被所有连接任务共享
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let message_router = Arc::new(MessageRouter::new(clock));

    let state = AppState::new(message_router, Arc::new(config.clone()));

    // 启动 Web 服务器
    let app = router(state);
    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;

    tracing::info!(
        "聊天服务器启动在 http://{}:{}",
        config.server.host,
        config.server.port
    );
    axum::serve(listener, app).await?;

    Ok(())
}
