use serde_json::Value;
use std::sync::Arc;

use crate::config::SwapsConfig;
use crate::models::stats::round_usd;
use crate::models::{ChainStats, CurrencyStats, StatsSnapshot, TimeframeStats};
use crate::store::{Aggregate, Field, Filter, Predicate, Query, StoreError, SwapStore};

/// Rolling windows reported under `timeframes`, in seconds.
pub const TIMEFRAMES: [(&str, i64); 3] = [
    ("24h", 24 * 60 * 60),
    ("7d", 7 * 24 * 60 * 60),
    ("30d", 30 * 24 * 60 * 60),
];

/// `{count, sum}` read from one aggregate row. An undefined sum reads as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Totals {
    count: u64,
    volume: f64,
    volume_usd: f64,
}

impl Totals {
    fn from_row(row: Option<&Value>) -> Result<Self, StoreError> {
        let Some(row) = row else {
            return Ok(Self::default());
        };
        let row = row.as_object()
            .ok_or_else(|| StoreError::Malformed(format!("aggregate row is not an object: {}", row)))?;
        let number = |key: &str| row.get(key).and_then(Value::as_f64).unwrap_or(0.0);
        Ok(Self {
            count: row.get("count").and_then(Value::as_u64).unwrap_or(0),
            volume: number("volume"),
            volume_usd: number("volumeUsd"),
        })
    }
}

/// Runs the fixed battery of aggregate queries behind the stats endpoint.
pub struct StatsAggregator {
    store: Arc<dyn SwapStore>,
    assets: Vec<String>,
    chains: Vec<String>,
    default_chain: String,
}

impl StatsAggregator {
    pub fn new(store: Arc<dyn SwapStore>, config: &SwapsConfig) -> Self {
        Self {
            store,
            assets: config.assets.clone(),
            chains: config.chains.clone(),
            default_chain: config.default_chain.clone(),
        }
    }

    pub async fn recompute(&self) -> Result<StatsSnapshot, StoreError> {
        self.recompute_at(chrono::Utc::now().timestamp()).await
    }

    /// Windows are evaluated relative to `now` (unix seconds).
    pub async fn recompute_at(&self, now: i64) -> Result<StatsSnapshot, StoreError> {
        let mut snapshot = StatsSnapshot::default();
        let mut total_charge = 0.0;

        let usd_only = || vec![
            Aggregate::Count { alias: "count" },
            Aggregate::Sum { field: Field::UsdValue, alias: "volumeUsd" },
        ];

        let totals = self.run(Query::aggregate(usd_only(), successful()), &mut total_charge).await?;
        snapshot.total_swap_count = totals.count;
        snapshot.total_usd_volume = round_usd(totals.volume_usd);

        for (name, seconds) in TIMEFRAMES {
            let mut filter = successful();
            let since = filter.bind("since", now - seconds);
            filter.and(Predicate::Gt(Field::TimestampInit, since));

            let totals = self.run(Query::aggregate(usd_only(), filter), &mut total_charge).await?;
            snapshot.timeframes.insert(name.to_string(), TimeframeStats {
                count: totals.count,
                volume_usd: round_usd(totals.volume_usd),
            });
        }

        for asset in &self.assets {
            let mut filter = successful();
            let token = filter.bind("tokenName", asset.as_str());
            filter.and(Predicate::Eq(Field::TokenName, token));

            let aggregates = vec![
                Aggregate::Count { alias: "count" },
                Aggregate::Sum { field: Field::TokenAmount, alias: "volume" },
                Aggregate::Sum { field: Field::UsdValue, alias: "volumeUsd" },
            ];
            let totals = self.run(Query::aggregate(aggregates, filter), &mut total_charge).await?;
            snapshot.currency_data.insert(asset.clone(), CurrencyStats {
                count: totals.count,
                volume: totals.volume,
                volume_usd: round_usd(totals.volume_usd),
            });
        }

        for chain in &self.chains {
            let mut filter = successful();
            let op = filter.bind("chainId", chain.as_str());
            // The default chain's aggregate also counts swaps stored without
            // a chain id, matching how the list endpoint labels them.
            if *chain == self.default_chain {
                filter.and(Predicate::Or(vec![
                    Predicate::Eq(Field::ChainId, op),
                    Predicate::Undefined(Field::ChainId),
                ]));
            } else {
                filter.and(Predicate::Eq(Field::ChainId, op));
            }

            let totals = self.run(Query::aggregate(usd_only(), filter), &mut total_charge).await?;
            snapshot.chain_data.insert(chain.clone(), ChainStats {
                count: totals.count,
                volume_usd: round_usd(totals.volume_usd),
            });
        }

        tracing::info!("Stats recomputed via {}: request charge {:.2}", self.store.name(), total_charge);
        Ok(snapshot)
    }

    async fn run(&self, query: Query, total_charge: &mut f64) -> Result<Totals, StoreError> {
        let resp = self.store.query(&query).await?;
        *total_charge += resp.request_charge;
        Totals::from_row(resp.rows.first())
    }
}

fn successful() -> Filter {
    let mut filter = Filter::new();
    filter.and(Predicate::IsTrue(Field::Success));
    filter
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    const NOW: i64 = 1_700_000_000;
    const DAY: i64 = 24 * 60 * 60;

    fn config() -> SwapsConfig {
        SwapsConfig {
            assets: vec!["USDC".into(), "WBTC".into()],
            exclude_assets: vec![],
            chains: vec!["SOLANA".into(), "STARKNET".into()],
            default_chain: "SOLANA".into(),
        }
    }

    fn aggregator(rows: Vec<Value>) -> StatsAggregator {
        StatsAggregator::new(Arc::new(MemoryStore::new(rows)), &config())
    }

    #[tokio::test]
    async fn test_totals_round_and_skip_failed() {
        let stats = aggregator(vec![
            json!({"success": true, "timestampInit": NOW - 10, "tokenName": "USDC", "_usdValue": 10.005, "_tokenAmount": 10.005}),
            json!({"success": true, "timestampInit": NOW - 3 * DAY, "tokenName": "USDC", "_usdValue": 20.00, "_tokenAmount": 20.0, "chainId": "STARKNET"}),
            json!({"success": true, "timestampInit": NOW - 20 * DAY, "tokenName": "SOL", "_usdValue": 5.00}),
            json!({"success": false, "timestampInit": NOW - 10, "tokenName": "USDC", "_usdValue": 100.0}),
        ]);

        let snapshot = stats.recompute_at(NOW).await.unwrap();
        assert_eq!(snapshot.total_swap_count, 3);
        assert_eq!(snapshot.total_usd_volume, 35.01);

        assert_eq!(snapshot.timeframes["24h"], TimeframeStats { count: 1, volume_usd: 10.01 });
        assert_eq!(snapshot.timeframes["7d"], TimeframeStats { count: 2, volume_usd: 30.01 });
        assert_eq!(snapshot.timeframes["30d"], TimeframeStats { count: 3, volume_usd: 35.01 });

        assert_eq!(snapshot.currency_data["USDC"].count, 2);
        assert_eq!(snapshot.currency_data["USDC"].volume_usd, 30.01);
        assert_eq!(snapshot.chain_data["SOLANA"], ChainStats { count: 2, volume_usd: 15.01 });
        assert_eq!(snapshot.chain_data["STARKNET"], ChainStats { count: 1, volume_usd: 20.0 });
    }

    #[tokio::test]
    async fn test_untracked_rows_report_zero() {
        let snapshot = aggregator(vec![]).recompute_at(NOW).await.unwrap();
        assert_eq!(snapshot.total_swap_count, 0);
        assert_eq!(snapshot.total_usd_volume, 0.0);
        assert_eq!(snapshot.currency_data["WBTC"], CurrencyStats::default());
        assert_eq!(snapshot.timeframes.len(), 3);
        assert_eq!(snapshot.chain_data.len(), 2);
    }

    #[tokio::test]
    async fn test_recompute_is_idempotent() {
        let stats = aggregator(vec![
            json!({"success": true, "timestampInit": NOW - 5, "tokenName": "WBTC", "_usdValue": 61000.123, "_tokenAmount": 1.0}),
            json!({"success": true, "timestampInit": NOW - 6, "tokenName": "USDC", "_usdValue": 1.5}),
        ]);
        let first = stats.recompute_at(NOW).await.unwrap();
        let second = stats.recompute_at(NOW).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.currency_data["WBTC"].volume, 1.0);
        assert_eq!(first.currency_data["WBTC"].volume_usd, 61000.12);
    }

    #[tokio::test]
    async fn test_default_chain_counts_unlabeled_swaps() {
        let stats = aggregator(vec![
            json!({"success": true, "timestampInit": NOW - 1, "chainId": "SOLANA", "_usdValue": 1.0}),
            json!({"success": true, "timestampInit": NOW - 2, "_usdValue": 2.0}),
            json!({"success": true, "timestampInit": NOW - 3, "chainId": null, "_usdValue": 4.0}),
            json!({"success": true, "timestampInit": NOW - 4, "chainId": "STARKNET", "_usdValue": 8.0}),
        ]);
        let snapshot = stats.recompute_at(NOW).await.unwrap();
        assert_eq!(snapshot.chain_data["SOLANA"], ChainStats { count: 3, volume_usd: 7.0 });
        assert_eq!(snapshot.chain_data["STARKNET"], ChainStats { count: 1, volume_usd: 8.0 });
    }

    #[test]
    fn test_totals_from_undefined_sum() {
        let totals = Totals::from_row(Some(&json!({"count": 0}))).unwrap();
        assert_eq!(totals, Totals::default());
        assert!(Totals::from_row(Some(&json!([1, 2]))).is_err());
    }
}
