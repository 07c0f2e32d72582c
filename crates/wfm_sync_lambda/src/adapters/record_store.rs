use thiserror::Error;

use crate::runtime::contract::{Item, RecordKey};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conditional check failed on table {table}")]
    ConditionalCheckFailed { table: String },
    #[error("{operation} on table {table} failed: {message}")]
    Backend {
        operation: &'static str,
        table: String,
        message: String,
    },
    #[error("item from table {table} could not be decoded: {message}")]
    Decode { table: String, message: String },
    #[error("item for table {table} could not be encoded: {message}")]
    Encode { table: String, message: String },
}

impl StoreError {
    pub fn is_conditional_check_failed(&self) -> bool {
        matches!(self, Self::ConditionalCheckFailed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteCondition {
    Unconditional,
    /// Fails with `ConditionalCheckFailed` unless every key attribute exists.
    KeyExists,
}

/// Key-value table access used by every handler.
pub trait RecordStore {
    fn scan(&self, table: &str) -> Result<Vec<Item>, StoreError>;

    /// All items whose key attributes equal those of `key`.
    fn query(&self, table: &str, key: &RecordKey) -> Result<Vec<Item>, StoreError>;

    fn exists(&self, table: &str, key: &RecordKey) -> Result<bool, StoreError>;

    fn put(&self, table: &str, item: &Item) -> Result<(), StoreError>;

    fn delete(
        &self,
        table: &str,
        key: &RecordKey,
        condition: DeleteCondition,
    ) -> Result<(), StoreError>;
}
