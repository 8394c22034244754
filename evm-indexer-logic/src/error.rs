use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("node call timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("node transport error: {0}")]
    Transport(#[from] anyhow::Error),
    #[error("resource not found")]
    NotFound,
}

impl NodeError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, NodeError::Timeout(_) | NodeError::Transport(_))
    }
}

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("broker connection is not open")]
    NotConnected,
    #[error("consumer tag already in use: {0}")]
    TagInUse(String),
    #[error("broker transport error: {0}")]
    Transport(#[from] lapin::Error),
}

impl BrokerError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BrokerError::NotConnected | BrokerError::TagInUse(_) | BrokerError::Transport(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sea_orm::DbErr),
    #[error("record already processed: {0}")]
    AlreadyProcessed(String),
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("cache value could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Outcome a handler reports back to the consume loop so it knows how to
/// acknowledge the delivery.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("malformed message: {0}")]
    Malformed(String),
    #[error("transient failure: {0}")]
    Transient(#[from] anyhow::Error),
}
