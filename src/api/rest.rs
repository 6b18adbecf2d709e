use axum::{
    extract::{RawQuery, State},
    response::Json,
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::error::ApiError;
use crate::models::StatsSnapshot;
use crate::services::{StatsCache, SwapFilter, SwapLister, SwapPage};
use super::params::parse_list_params;

pub struct AppState {
    pub filter: SwapFilter,
    pub lister: SwapLister,
    pub stats: StatsCache,
}

/// GET /stats - cached aggregate volumes
async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<StatsSnapshot>, ApiError> {
    let snapshot = state.stats.get().await?;
    Ok(Json((*snapshot).clone()))
}

/// GET /swaps - filtered swap list, newest first
async fn get_swaps(
    State(state): State<Arc<AppState>>,
    RawQuery(query): RawQuery,
) -> Result<Json<SwapPage>, ApiError> {
    let params = parse_list_params(query.as_deref())?;
    let compiled = state.filter.compile(&params)?;
    let page = state.lister.list(&compiled).await?;
    Ok(Json(page))
}

/// GET /health
async fn health() -> &'static str {
    "OK"
}

pub fn create_rest_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/swaps", get(get_swaps))
        .route("/health", get(health))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SwapsConfig;
    use crate::services::StatsAggregator;
    use crate::store::{MemoryStore, Query, QueryResponse, StoreError, SwapStore};
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tower::ServiceExt;

    struct TrackedStore {
        inner: MemoryStore,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SwapStore for TrackedStore {
        fn name(&self) -> &'static str {
            "tracked"
        }

        async fn query(&self, query: &Query) -> Result<QueryResponse, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.query(query).await
        }

        async fn fetch_page(&self, query: &Query, max_item_count: usize) -> Result<QueryResponse, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.fetch_page(query, max_item_count).await
        }
    }

    fn app() -> (Arc<TrackedStore>, Router) {
        let rows = (0..15)
            .map(|i| json!({
                "id": format!("swap-{}", i),
                "success": true,
                "timestampInit": 100 + i,
                "tokenName": "WIF",
                "_usdValue": 1.0,
                "_self": "dbs/x",
            }))
            .collect();
        let store = Arc::new(TrackedStore {
            inner: MemoryStore::new(rows),
            calls: AtomicUsize::new(0),
        });
        let config = SwapsConfig {
            assets: vec!["USDC".into()],
            chains: vec!["SOLANA".into()],
            ..Default::default()
        };
        let state = Arc::new(AppState {
            filter: SwapFilter::new(&config),
            lister: SwapLister::new(store.clone(), config.default_chain.clone()),
            stats: StatsCache::new(StatsAggregator::new(store.clone(), &config), 60),
        });
        (store, create_rest_router(state))
    }

    async fn call(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let resp = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn test_list_first_page() {
        let (_, router) = app();
        let (status, body) = call(router, "/swaps?limit=10").await;
        assert_eq!(status, StatusCode::OK);

        let body: Value = serde_json::from_slice(&body).unwrap();
        let data = body["data"].as_array().unwrap();
        assert_eq!(data.len(), 10);
        assert_eq!(body["last"], json!(false));
        assert_eq!(body["endTime"], json!(105));
        assert_eq!(data[0]["chainId"], json!("SOLANA"));
        assert!(data[0].get("_self").is_none());
    }

    #[tokio::test]
    async fn test_list_follows_cursor() {
        let (_, router) = app();
        let (_, body) = call(router, "/swaps?limit=10&endTime=105").await;
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["data"].as_array().unwrap().len(), 5);
        assert_eq!(body["last"], json!(true));
        assert_eq!(body["endTime"], json!(100));
    }

    #[tokio::test]
    async fn test_validation_failures_never_reach_store() {
        let cases = [
            ("/swaps?endTime=abc", "endTime"),
            ("/swaps?limit=5", "limit"),
            ("/swaps?btcTxId=abc", "btcTxId"),
            ("/swaps?search=", "search"),
            ("/swaps?token=USDC", "token"),
            ("/swaps?lpAddress=a&lpAddress=b", "lpAddress"),
        ];
        for (uri, param) in cases {
            let (store, router) = app();
            let (status, body) = call(router, uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(String::from_utf8(body).unwrap(), format!("Invalid query param ({})", param));
            assert_eq!(store.calls.load(Ordering::SeqCst), 0);
        }
    }

    #[tokio::test]
    async fn test_stats_shape() {
        let (_, router) = app();
        let (status, body) = call(router, "/stats").await;
        assert_eq!(status, StatusCode::OK);

        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["totalSwapCount"], json!(15));
        assert_eq!(body["totalUsdVolume"], json!(15.0));
        assert!(body["timeframes"]["24h"].is_object());
        assert!(body["timeframes"]["30d"].is_object());
        assert_eq!(body["currencyData"]["USDC"]["count"], json!(0));
        assert_eq!(body["chainData"]["SOLANA"]["count"], json!(15));
    }

    #[tokio::test]
    async fn test_health() {
        let (_, router) = app();
        let (status, body) = call(router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, b"OK");
    }
}
