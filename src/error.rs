use crate::domain::payment::ProviderId;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, RoutingError>;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("no provider registered for id: {0}")]
    UnknownProvider(ProviderId),
    #[error("circuit open for provider {0}")]
    CircuitOpen(ProviderId),
    #[error("provider call failed: {0}")]
    Provider(String),
    #[error("payment not found: {0}")]
    PaymentNotFound(Uuid),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "storage-rocksdb")]
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),
}
