use domain::{ConnectionId, DomainError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),
    #[error("connection not registered: {0}")]
    ConnectionNotFound(ConnectionId),
}
