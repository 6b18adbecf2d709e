use url::form_urlencoded;

use crate::error::ValidationError;
use crate::services::ListParams;

/// Parses the raw list-endpoint query string. `token` and `chain` repeat;
/// every other recognized key may appear at most once. Unknown keys are ignored.
pub fn parse_list_params(raw: Option<&str>) -> Result<ListParams, ValidationError> {
    let mut params = ListParams::default();
    let Some(raw) = raw else {
        return Ok(params);
    };

    for (key, value) in form_urlencoded::parse(raw.as_bytes()) {
        let value = value.into_owned();
        match &*key {
            "token" => params.tokens.push(value),
            "chain" => params.chains.push(value),
            "endTime" => set_once(&mut params.end_time, value, "endTime")?,
            "startTs" => set_once(&mut params.start_ts, value, "startTs")?,
            "endTs" => set_once(&mut params.end_ts, value, "endTs")?,
            "limit" => set_once(&mut params.limit, value, "limit")?,
            "clientAddress" => set_once(&mut params.client_address, value, "clientAddress")?,
            "chainId" => set_once(&mut params.chain_id, value, "chainId")?,
            "lpAddress" => set_once(&mut params.lp_address, value, "lpAddress")?,
            "btcTxId" => set_once(&mut params.btc_tx_id, value, "btcTxId")?,
            "search" => set_once(&mut params.search, value, "search")?,
            _ => {}
        }
    }
    Ok(params)
}

fn set_once(slot: &mut Option<String>, value: String, param: &'static str) -> Result<(), ValidationError> {
    if slot.is_some() {
        return Err(ValidationError::new(param));
    }
    *slot = Some(value);
    Ok(())
}
