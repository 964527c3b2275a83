//! 领域模型错误定义

use thiserror::Error;

/// 领域模型错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// 一条会话只允许 join 一次
    #[error("connection already joined as \"{current}\"")]
    AlreadyJoined { current: String },
}

/// 领域模型结果类型
pub type DomainResult<T> = Result<T, DomainError>;
