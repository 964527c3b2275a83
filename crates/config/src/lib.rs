//! 统一配置中心
//!
//! 提供应用的全局配置管理，包括：
//! - 监听地址
//! - 静态资源目录
//! - 附件上传目录与大小上限

use serde::{Deserialize, Serialize};
use std::env;

/// 默认上传大小上限：5 MiB
pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 5 * 1024 * 1024;

/// 全局应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// 服务配置
    pub server: ServerConfig,
    /// 上传配置
    pub upload: UploadConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 客户端 UI 静态资源目录
    pub static_dir: String,
}

/// 附件上传配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// 上传文件落盘目录
    pub dir: String,
    /// 单次上传大小上限（字节）
    pub max_bytes: usize,
}

impl AppConfig {
    /// 从环境变量加载配置，未设置的变量使用开发默认值
    pub fn from_env() -> Self {
        Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(4953),
                static_dir: env::var("STATIC_DIR").unwrap_or_else(|_| "public".to_string()),
            },
            upload: UploadConfig {
                dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
                max_bytes: env::var("UPLOAD_MAX_BYTES")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_UPLOAD_MAX_BYTES),
            },
        }
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.is_empty() {
            return Err(ConfigError::InvalidServerConfig(
                "server host cannot be empty".to_string(),
            ));
        }

        if self.upload.dir.is_empty() {
            return Err(ConfigError::InvalidUploadConfig(
                "upload directory cannot be empty".to_string(),
            ));
        }

        if self.upload.max_bytes == 0 {
            return Err(ConfigError::InvalidUploadConfig(
                "upload size limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

/// 配置错误类型
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid server configuration: {0}")]
    InvalidServerConfig(String),
    #[error("Invalid upload configuration: {0}")]
    InvalidUploadConfig(String),
    #[error("Environment variable error: {0}")]
    EnvVarError(#[from] std::env::VarError),
}
