use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeframeStats {
    pub count: u64,
    pub volume_usd: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyStats {
    pub count: u64,
    /// Summed token amount, in token units.
    pub volume: f64,
    pub volume_usd: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainStats {
    pub count: u64,
    pub volume_usd: f64,
}

/// Aggregate view over successful swaps, as served by the stats endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub total_swap_count: u64,
    pub total_usd_volume: f64,
    pub timeframes: BTreeMap<String, TimeframeStats>,
    pub currency_data: BTreeMap<String, CurrencyStats>,
    pub chain_data: BTreeMap<String, ChainStats>,
}

/// Rounds a USD figure to cents.
pub fn round_usd(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
