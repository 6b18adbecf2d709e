use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::StoreError;

/// Store-internal document fields that never leave the service.
pub const STORAGE_METADATA: [&str; 4] = ["_rid", "_self", "_etag", "_attachments"];

/// One cross-chain swap document as read from the ledger.
///
/// Documents are passed through as stored; only `chainId` is defaulted and
/// storage metadata removed. Field types are not enforced, so one odd
/// document never takes down the page it sits on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct SwapRecord(Map<String, Value>);

/// An absent or null chain id means the swap happened on the default chain.
pub fn normalize_chain(raw: Option<Value>, default_chain: &str) -> Value {
    match raw {
        None | Some(Value::Null) => Value::from(default_chain),
        Some(chain) => chain,
    }
}

impl SwapRecord {
    /// Takes a raw row and makes it safe to hand out: chain defaulted,
    /// storage metadata removed. Only non-object rows are rejected.
    pub fn from_row(row: Value, default_chain: &str) -> Result<Self, StoreError> {
        let mut record = match row {
            Value::Object(doc) => SwapRecord(doc),
            other => {
                return Err(StoreError::Malformed(format!("swap document is not an object: {}", other)));
            }
        };
        record.sanitize(default_chain);
        Ok(record)
    }

    pub fn sanitize(&mut self, default_chain: &str) {
        let chain = normalize_chain(self.0.remove("chainId"), default_chain);
        self.0.insert("chainId".to_string(), chain);
        for key in STORAGE_METADATA {
            self.0.remove(key);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn id(&self) -> Option<&str> {
        self.get("id").and_then(Value::as_str)
    }

    pub fn chain_id(&self) -> Option<&str> {
        self.get("chainId").and_then(Value::as_str)
    }

    /// Pagination cursor. Fractional timestamps are truncated.
    pub fn timestamp_init(&self) -> Option<i64> {
        let value = self.get("timestampInit")?;
        value.as_i64().or_else(|| value.as_f64().map(|ts| ts as i64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_chain() {
        assert_eq!(normalize_chain(None, "SOLANA"), json!("SOLANA"));
        assert_eq!(normalize_chain(Some(Value::Null), "SOLANA"), json!("SOLANA"));
        assert_eq!(normalize_chain(Some(json!("STARKNET")), "SOLANA"), json!("STARKNET"));
    }

    #[test]
    fn test_from_row_strips_metadata_and_defaults_chain() {
        let row = json!({
            "id": "swap-1",
            "success": true,
            "timestampInit": 1_700_000_000,
            "tokenName": "USDC",
            "type": "LN",
            "paymentHash": "ab",
            "_usdValue": 12.5,
            "_ts": 1_700_000_005,
            "_rid": "rid==",
            "_self": "dbs/x/colls/y/docs/z",
            "_etag": "\"0000\"",
            "_attachments": "attachments/",
            "intermediary": "lp-node-3",
        });

        let record = SwapRecord::from_row(row, "SOLANA").unwrap();
        assert_eq!(record.chain_id(), Some("SOLANA"));
        assert_eq!(record.id(), Some("swap-1"));

        let out = serde_json::to_value(&record).unwrap();
        for key in STORAGE_METADATA {
            assert!(out.get(key).is_none(), "{} leaked", key);
        }
        assert_eq!(out["chainId"], json!("SOLANA"));
        assert_eq!(out["type"], json!("LN"));
        assert_eq!(out["_usdValue"], json!(12.5));
        assert_eq!(out["_ts"], json!(1_700_000_005));
        assert_eq!(out["intermediary"], json!("lp-node-3"));
    }

    #[test]
    fn test_explicit_chain_kept_null_chain_defaulted() {
        let record = SwapRecord::from_row(json!({"timestampInit": 5, "chainId": "STARKNET"}), "SOLANA").unwrap();
        assert_eq!(record.chain_id(), Some("STARKNET"));

        let record = SwapRecord::from_row(json!({"timestampInit": 5, "chainId": null}), "SOLANA").unwrap();
        assert_eq!(record.chain_id(), Some("SOLANA"));
    }

    #[test]
    fn test_off_type_fields_pass_through() {
        let row = json!({"id": "x", "success": null, "timestampInit": 1_700_000_000.0, "_tokenAmount": "12"});
        let record = SwapRecord::from_row(row, "SOLANA").unwrap();
        assert_eq!(record.timestamp_init(), Some(1_700_000_000));

        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["success"], Value::Null);
        assert_eq!(out["_tokenAmount"], json!("12"));
    }

    #[test]
    fn test_missing_timestamp_has_no_cursor() {
        let record = SwapRecord::from_row(json!({"id": "x", "timestampInit": "soon"}), "SOLANA").unwrap();
        assert_eq!(record.timestamp_init(), None);
    }

    #[test]
    fn test_non_object_row_is_malformed() {
        let err = SwapRecord::from_row(json!(["not", "a", "swap"]), "SOLANA").unwrap_err();
        assert!(matches!(err, StoreError::Malformed(_)));
    }
}
