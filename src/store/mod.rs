pub mod gateway;
pub mod memory;
pub mod query;

use async_trait::async_trait;
use serde_json::Value;

pub use gateway::GatewayStore;
pub use memory::MemoryStore;
pub use query::{Aggregate, Field, Filter, Operand, Predicate, Query};

/// Rows returned by one store round trip and the cost the store reported for it.
#[derive(Debug, Clone, Default)]
pub struct QueryResponse {
    pub rows: Vec<Value>,
    pub request_charge: f64,
}

/// Document store holding the swap ledger.
#[async_trait]
pub trait SwapStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Runs the query to completion.
    async fn query(&self, query: &Query) -> Result<QueryResponse, StoreError>;

    /// Fetches only the first page, at most `max_item_count` rows.
    async fn fetch_page(&self, query: &Query, max_item_count: usize) -> Result<QueryResponse, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("store returned status {0}")]
    Status(u16),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("malformed result: {0}")]
    Malformed(String),
}
