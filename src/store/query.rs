//! Typed query model for the swap container.
//!
//! Predicates are built as values and rendered to the store's SQL dialect
//! only at the edge. Request-sourced values always travel as named
//! parameters; literals are restricted to `&'static str` so nothing but
//! compile-time constants can be written into the query text.

use serde::Serialize;
use serde_json::Value;

/// Document fields the service queries on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Success,
    TimestampInit,
    /// Store-assigned sequence time (`_ts`), distinct from `timestampInit`.
    SequenceTs,
    TokenName,
    ChainId,
    SwapType,
    ClientWallet,
    LpWallet,
    BtcAddress,
    BtcInAddresses,
    BtcTx,
    PaymentHash,
    TxInit,
    TxFinish,
    UsdValue,
    TokenAmount,
}

impl Field {
    pub fn key(self) -> &'static str {
        match self {
            Field::Success => "success",
            Field::TimestampInit => "timestampInit",
            Field::SequenceTs => "_ts",
            Field::TokenName => "tokenName",
            Field::ChainId => "chainId",
            Field::SwapType => "type",
            Field::ClientWallet => "clientWallet",
            Field::LpWallet => "lpWallet",
            Field::BtcAddress => "btcAddress",
            Field::BtcInAddresses => "btcInAddresses",
            Field::BtcTx => "btcTx",
            Field::PaymentHash => "paymentHash",
            Field::TxInit => "txInit",
            Field::TxFinish => "txFinish",
            Field::UsdValue => "_usdValue",
            Field::TokenAmount => "_tokenAmount",
        }
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// Named placeholder, e.g. `@endTime`.
    Param(String),
    Literal(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    IsTrue(Field),
    Eq(Field, Operand),
    NotEq(Field, Operand),
    Lt(Field, Operand),
    Gt(Field, Operand),
    /// Field is absent or explicitly null.
    Undefined(Field),
    ArrayContains(Field, Operand),
    Or(Vec<Predicate>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub value: Value,
}

/// Ordered list of top-level fragments, ANDed, plus their bound parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub predicates: Vec<Predicate>,
    pub params: Vec<Param>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `value` under `@name` and returns the placeholder operand.
    pub fn bind(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Operand {
        let name = format!("@{}", name.into());
        self.params.push(Param {
            name: name.clone(),
            value: value.into(),
        });
        Operand::Param(name)
    }

    pub fn and(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.iter().find(|p| p.name == name).map(|p| &p.value)
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Aggregate {
    Count { alias: &'static str },
    Sum { field: Field, alias: &'static str },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    All,
    Aggregates(Vec<Aggregate>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    TimestampInitDesc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub selection: Selection,
    pub filter: Filter,
    pub order: Option<Order>,
}

impl Query {
    pub fn select_all(filter: Filter) -> Self {
        Self {
            selection: Selection::All,
            filter,
            order: None,
        }
    }

    pub fn aggregate(aggregates: Vec<Aggregate>, filter: Filter) -> Self {
        Self {
            selection: Selection::Aggregates(aggregates),
            filter,
            order: None,
        }
    }

    pub fn newest_first(mut self) -> Self {
        self.order = Some(Order::TimestampInitDesc);
        self
    }

    /// Renders the query text. Parameters are sent alongside, never inlined.
    pub fn text(&self) -> String {
        let mut out = String::from("SELECT ");
        match &self.selection {
            Selection::All => out.push('*'),
            Selection::Aggregates(aggregates) => {
                let columns: Vec<String> = aggregates.iter().map(render_aggregate).collect();
                out.push_str(&columns.join(", "));
            }
        }
        out.push_str(" FROM c");

        if !self.filter.is_empty() {
            let clauses: Vec<String> = self.filter.predicates.iter().map(render_predicate).collect();
            out.push_str(" WHERE ");
            out.push_str(&clauses.join(" AND "));
        }

        if let Some(Order::TimestampInitDesc) = self.order {
            out.push_str(" ORDER BY c.timestampInit DESC");
        }
        out
    }
}

fn render_aggregate(aggregate: &Aggregate) -> String {
    match aggregate {
        Aggregate::Count { alias } => format!("COUNT(1) AS {}", alias),
        Aggregate::Sum { field, alias } => format!("SUM(c.{}) AS {}", field.key(), alias),
    }
}

fn render_operand(operand: &Operand) -> String {
    match operand {
        Operand::Param(name) => name.clone(),
        Operand::Literal(lit) => format!("\"{}\"", lit),
    }
}

fn render_predicate(predicate: &Predicate) -> String {
    match predicate {
        Predicate::IsTrue(f) => format!("c.{}", f.key()),
        Predicate::Eq(f, o) => format!("c.{} = {}", f.key(), render_operand(o)),
        Predicate::NotEq(f, o) => format!("c.{} != {}", f.key(), render_operand(o)),
        Predicate::Lt(f, o) => format!("c.{} < {}", f.key(), render_operand(o)),
        Predicate::Gt(f, o) => format!("c.{} > {}", f.key(), render_operand(o)),
        Predicate::Undefined(f) => format!("(NOT IS_DEFINED(c.{0}) OR IS_NULL(c.{0}))", f.key()),
        Predicate::ArrayContains(f, o) => {
            format!("ARRAY_CONTAINS(c.{}, {})", f.key(), render_operand(o))
        }
        Predicate::Or(branches) => {
            let parts: Vec<String> = branches.iter().map(render_predicate).collect();
            format!("({})", parts.join(" OR "))
        }
    }
}
