use crate::config::SwapsConfig;
use crate::error::ValidationError;
use crate::store::{Field, Filter, Operand, Predicate};

pub const DEFAULT_LIMIT: usize = 50;
pub const MIN_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

/// Raw list-endpoint parameters, still unvalidated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub end_time: Option<String>,
    pub start_ts: Option<String>,
    pub end_ts: Option<String>,
    pub limit: Option<String>,
    pub tokens: Vec<String>,
    pub client_address: Option<String>,
    pub chains: Vec<String>,
    pub chain_id: Option<String>,
    pub lp_address: Option<String>,
    pub btc_tx_id: Option<String>,
    pub search: Option<String>,
}

/// Output of a successful compile: the WHERE fragments with their bindings
/// and the requested page size.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledFilter {
    pub filter: Filter,
    pub limit: usize,
}

/// Translates list parameters into one composite predicate.
#[derive(Clone)]
pub struct SwapFilter {
    known_assets: Vec<String>,
    exclude_assets: Vec<String>,
    allowed_chains: Vec<String>,
    default_chain: String,
}

impl SwapFilter {
    pub fn new(config: &SwapsConfig) -> Self {
        Self {
            known_assets: config.assets.clone(),
            exclude_assets: config.exclude_assets.clone(),
            allowed_chains: config.chains.clone(),
            default_chain: config.default_chain.clone(),
        }
    }

    /// Validates and compiles in a fixed parameter order. The first invalid
    /// parameter aborts the whole compile.
    pub fn compile(&self, params: &ListParams) -> Result<CompiledFilter, ValidationError> {
        let mut filter = Filter::new();

        if let Some(raw) = &params.end_time {
            let end_time = parse_int(raw, "endTime")?;
            let op = filter.bind("endTime", end_time);
            filter.and(Predicate::Lt(Field::TimestampInit, op));
        }

        if let Some(raw) = &params.start_ts {
            let start_ts = parse_int(raw, "startTs")?;
            let op = filter.bind("startTs", start_ts);
            filter.and(Predicate::Gt(Field::SequenceTs, op));
        }

        if let Some(raw) = &params.end_ts {
            let end_ts = parse_int(raw, "endTs")?;
            let op = filter.bind("endTs", end_ts);
            filter.and(Predicate::Lt(Field::SequenceTs, op));
        }

        let limit = match &params.limit {
            Some(raw) => parse_limit(raw)?,
            None => DEFAULT_LIMIT,
        };

        for (i, token) in self.exclude_assets.iter().enumerate() {
            let op = filter.bind(format!("excludeToken{}", i), token.as_str());
            filter.and(Predicate::NotEq(Field::TokenName, op));
        }

        if !params.tokens.is_empty() {
            let mut group = Vec::with_capacity(params.tokens.len());
            for (i, token) in params.tokens.iter().enumerate() {
                // Tracked assets have their own views; this filter is for everything else.
                if self.known_assets.contains(token) {
                    return Err(ValidationError::new("token"));
                }
                let op = filter.bind(format!("tokenName{}", i), token.as_str());
                group.push(Predicate::Eq(Field::TokenName, op));
            }
            filter.and(Predicate::Or(group));
        }

        if let Some(address) = &params.client_address {
            let address = non_empty(address, "clientAddress")?;
            let op = filter.bind("clientAddress", address);
            filter.and(Predicate::Eq(Field::ClientWallet, op));
        }

        if !params.chains.is_empty() {
            let group = params.chains.iter()
                .enumerate()
                .map(|(i, chain)| self.chain_alias(&mut filter, i, chain))
                .collect();
            filter.and(Predicate::Or(group));
        }

        if let Some(chain_id) = &params.chain_id {
            if !self.allowed_chains.contains(chain_id) {
                return Err(ValidationError::new("chainId"));
            }
            let op = filter.bind("chainId", chain_id.as_str());
            filter.and(self.chain_match(op, chain_id));
        }

        if let Some(address) = &params.lp_address {
            let address = non_empty(address, "lpAddress")?;
            let op = filter.bind("lpAddress", address);
            filter.and(Predicate::Eq(Field::LpWallet, op));
        }

        if let Some(tx_id) = &params.btc_tx_id {
            if !is_hex64(tx_id) {
                return Err(ValidationError::new("btcTxId"));
            }
            let op = filter.bind("btcTxId", tx_id.as_str());
            filter.and(Predicate::Eq(Field::BtcTx, op));
        }

        if let Some(search) = &params.search {
            let search = non_empty(search, "search")?;
            let op = filter.bind("search", search);
            filter.and(search_predicate(search, op));
        }

        Ok(CompiledFilter { filter, limit })
    }

    fn chain_alias(&self, filter: &mut Filter, index: usize, chain: &str) -> Predicate {
        match chain {
            "BITCOIN" => Predicate::Eq(Field::SwapType, Operand::Literal("CHAIN")),
            "LIGHTNING" => Predicate::Eq(Field::SwapType, Operand::Literal("LN")),
            // Legacy Solana swaps were written without a chain id.
            "SOLANA" => {
                let op = filter.bind(format!("chain{}", index), chain);
                chain_or_unset(op)
            }
            _ => {
                let op = filter.bind(format!("chain{}", index), chain);
                self.chain_match(op, chain)
            }
        }
    }

    /// Records without a chain id belong to the default chain.
    fn chain_match(&self, op: Operand, chain: &str) -> Predicate {
        if chain == self.default_chain {
            chain_or_unset(op)
        } else {
            Predicate::Eq(Field::ChainId, op)
        }
    }
}

fn chain_or_unset(op: Operand) -> Predicate {
    Predicate::Or(vec![
        Predicate::Eq(Field::ChainId, op),
        Predicate::Undefined(Field::ChainId),
    ])
}

/// A 64-char hex value is taken as a bitcoin txid or payment hash; anything
/// else is looked up across the identity fields.
fn search_predicate(search: &str, op: Operand) -> Predicate {
    if is_hex64(search) {
        Predicate::Or(vec![
            Predicate::Eq(Field::PaymentHash, op.clone()),
            Predicate::Eq(Field::BtcTx, op),
        ])
    } else {
        Predicate::Or(vec![
            Predicate::Eq(Field::TxInit, op.clone()),
            Predicate::Eq(Field::TxFinish, op.clone()),
            Predicate::Eq(Field::LpWallet, op.clone()),
            Predicate::Eq(Field::ClientWallet, op.clone()),
            Predicate::Eq(Field::BtcAddress, op.clone()),
            Predicate::ArrayContains(Field::BtcInAddresses, op),
        ])
    }
}

fn parse_int(raw: &str, param: &'static str) -> Result<i64, ValidationError> {
    raw.parse::<i64>().map_err(|_| ValidationError::new(param))
}

fn parse_limit(raw: &str) -> Result<usize, ValidationError> {
    let limit = raw.parse::<usize>().map_err(|_| ValidationError::new("limit"))?;
    if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
        return Err(ValidationError::new("limit"));
    }
    Ok(limit)
}

fn non_empty<'a>(raw: &'a str, param: &'static str) -> Result<&'a str, ValidationError> {
    if raw.is_empty() {
        return Err(ValidationError::new(param));
    }
    Ok(raw)
}

pub fn is_hex64(raw: &str) -> bool {
    raw.len() == 64 && raw.chars().all(|c| c.is_ascii_hexdigit())
}
