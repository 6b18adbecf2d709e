use serde::Serialize;
use std::sync::Arc;

use crate::models::SwapRecord;
use crate::store::{Query, StoreError, SwapStore};
use super::filter::CompiledFilter;

/// One page of the swap list, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct SwapPage {
    pub data: Vec<SwapRecord>,
    pub last: bool,
    /// `timestampInit` of the oldest record on the page; the next request's `endTime`.
    #[serde(rename = "endTime", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
}

pub struct SwapLister {
    store: Arc<dyn SwapStore>,
    default_chain: String,
}

impl SwapLister {
    pub fn new(store: Arc<dyn SwapStore>, default_chain: impl Into<String>) -> Self {
        Self {
            store,
            default_chain: default_chain.into(),
        }
    }

    /// Over-fetches one row to learn whether another page exists.
    pub async fn list(&self, compiled: &CompiledFilter) -> Result<SwapPage, StoreError> {
        let limit = compiled.limit;
        let query = Query::select_all(compiled.filter.clone()).newest_first();

        let resp = self.store.fetch_page(&query, limit + 1).await?;
        tracing::debug!("Query charge: {:.2} ({} rows)", resp.request_charge, resp.rows.len());

        let mut rows = resp.rows;
        let last = rows.len() <= limit;
        rows.truncate(limit);

        let data = rows.into_iter()
            .map(|row| SwapRecord::from_row(row, &self.default_chain))
            .collect::<Result<Vec<_>, _>>()?;
        // A record without a usable timestamp cannot anchor the cursor.
        let end_time = data.iter().rev().find_map(SwapRecord::timestamp_init);

        Ok(SwapPage { data, last, end_time })
    }
}
