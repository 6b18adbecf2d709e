use async_trait::async_trait;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use super::query::{Aggregate, Field, Filter, Operand, Order, Predicate, Query, Selection};
use super::{QueryResponse, StoreError, SwapStore};

/// In-process swap container. Evaluates typed queries with the same
/// undefined-field semantics as the hosted store.
pub struct MemoryStore {
    rows: Vec<Value>,
}

impl MemoryStore {
    pub fn new(rows: Vec<Value>) -> Self {
        Self { rows }
    }

    /// Loads a JSON array of swap documents.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| StoreError::Io(format!("{}: {}", path.display(), e)))?;
        let rows: Vec<Value> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| StoreError::Parse(e.to_string()))?;
        tracing::info!("Loaded {} swap documents from {}", rows.len(), path.display());
        Ok(Self::new(rows))
    }

    fn execute(&self, query: &Query, max_item_count: Option<usize>) -> QueryResponse {
        let request_charge = (self.rows.len() as f64).max(1.0);

        let mut matched: Vec<&Value> = self
            .rows
            .iter()
            .filter(|row| query.filter.predicates.iter().all(|p| matches(p, row, &query.filter)))
            .collect();

        let rows = match &query.selection {
            Selection::All => {
                if let Some(Order::TimestampInitDesc) = query.order {
                    // Stable, so ties keep insertion order within one execution.
                    matched.sort_by(|a, b| {
                        let a = number(a, Field::TimestampInit);
                        let b = number(b, Field::TimestampInit);
                        match (a, b) {
                            (Some(a), Some(b)) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
                            (Some(_), None) => Ordering::Less,
                            (None, Some(_)) => Ordering::Greater,
                            (None, None) => Ordering::Equal,
                        }
                    });
                }
                let limit = max_item_count.unwrap_or(usize::MAX);
                matched.into_iter().take(limit).cloned().collect()
            }
            Selection::Aggregates(aggregates) => vec![aggregate_row(aggregates, &matched)],
        };

        QueryResponse { rows, request_charge }
    }
}

#[async_trait]
impl SwapStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn query(&self, query: &Query) -> Result<QueryResponse, StoreError> {
        Ok(self.execute(query, None))
    }

    async fn fetch_page(&self, query: &Query, max_item_count: usize) -> Result<QueryResponse, StoreError> {
        Ok(self.execute(query, Some(max_item_count)))
    }
}

fn aggregate_row(aggregates: &[Aggregate], matched: &[&Value]) -> Value {
    let mut out = Map::new();
    for aggregate in aggregates {
        match aggregate {
            Aggregate::Count { alias } => {
                out.insert((*alias).to_string(), Value::from(matched.len() as u64));
            }
            Aggregate::Sum { field, alias } => {
                let values: Vec<f64> = matched.iter().filter_map(|row| number(row, *field)).collect();
                // SUM over nothing is undefined: the alias is left out of the row.
                if !values.is_empty() {
                    out.insert((*alias).to_string(), Value::from(values.iter().sum::<f64>()));
                }
            }
        }
    }
    Value::Object(out)
}

fn number(row: &Value, field: Field) -> Option<f64> {
    row.get(field.key()).and_then(Value::as_f64)
}

fn resolve(operand: &Operand, filter: &Filter) -> Option<Value> {
    match operand {
        Operand::Param(name) => filter.param(name).cloned(),
        Operand::Literal(lit) => Some(Value::from(*lit)),
    }
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if a.is_number() && b.is_number() => x == y,
        _ => a == b,
    }
}

fn compare(row: &Value, field: Field, operand: &Operand, filter: &Filter) -> Option<Ordering> {
    let left = row.get(field.key())?.as_f64()?;
    let right = resolve(operand, filter)?.as_f64()?;
    left.partial_cmp(&right)
}

/// Comparisons against an absent field are false, never true. A null field
/// counts as undefined.
fn matches(predicate: &Predicate, row: &Value, filter: &Filter) -> bool {
    match predicate {
        Predicate::IsTrue(field) => row.get(field.key()) == Some(&Value::Bool(true)),
        Predicate::Eq(field, operand) => match (row.get(field.key()), resolve(operand, filter)) {
            (Some(left), Some(right)) => values_equal(left, &right),
            _ => false,
        },
        Predicate::NotEq(field, operand) => match (row.get(field.key()), resolve(operand, filter)) {
            (Some(left), Some(right)) => !values_equal(left, &right),
            _ => false,
        },
        Predicate::Lt(field, operand) => compare(row, *field, operand, filter) == Some(Ordering::Less),
        Predicate::Gt(field, operand) => compare(row, *field, operand, filter) == Some(Ordering::Greater),
        Predicate::Undefined(field) => row.get(field.key()).map_or(true, Value::is_null),
        Predicate::ArrayContains(field, operand) => {
            match (row.get(field.key()).and_then(Value::as_array), resolve(operand, filter)) {
                (Some(items), Some(needle)) => items.iter().any(|item| values_equal(item, &needle)),
                _ => false,
            }
        }
        Predicate::Or(branches) => branches.iter().any(|b| matches(b, row, filter)),
    }
}
