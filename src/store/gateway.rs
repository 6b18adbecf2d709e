use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use super::query::{Param, Query};
use super::{QueryResponse, StoreError, SwapStore};

/// Document store reached through an HTTP query gateway.
pub struct GatewayStore {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GatewayRequest<'a> {
    query: String,
    parameters: &'a [Param],
    #[serde(skip_serializing_if = "Option::is_none")]
    max_item_count: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GatewayResponse {
    resources: Vec<Value>,
    #[serde(default)]
    request_charge: f64,
}

impl GatewayStore {
    pub fn new(base_url: &str, api_key: Option<String>, timeout: Duration) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Network(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/query", base_url.trim_end_matches('/')),
            api_key,
        })
    }

    async fn send(&self, query: &Query, max_item_count: Option<usize>) -> Result<QueryResponse, StoreError> {
        let body = GatewayRequest {
            query: query.text(),
            parameters: &query.filter.params,
            max_item_count,
        };
        tracing::trace!("gateway query: {}", body.query);

        let mut req = self.client.post(&self.endpoint)
            .header("Accept", "application/json")
            .json(&body);
        if let Some(key) = &self.api_key {
            req = req.header("x-api-key", key);
        }

        let resp = req.send()
            .await
            .map_err(|e| StoreError::Network(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(StoreError::Status(resp.status().as_u16()));
        }

        let data: GatewayResponse = resp.json()
            .await
            .map_err(|e| StoreError::Parse(e.to_string()))?;

        Ok(QueryResponse {
            rows: data.resources,
            request_charge: data.request_charge,
        })
    }
}

#[async_trait]
impl SwapStore for GatewayStore {
    fn name(&self) -> &'static str {
        "gateway"
    }

    async fn query(&self, query: &Query) -> Result<QueryResponse, StoreError> {
        self.send(query, None).await
    }

    async fn fetch_page(&self, query: &Query, max_item_count: usize) -> Result<QueryResponse, StoreError> {
        self.send(query, Some(max_item_count)).await
    }
}
