use std::{cmp::Ordering, collections::HashMap};

use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::{
    document::Document,
    output::to_json,
    stage::{Accumulator, AvgFallback, GroupKey, SumOperand},
    value::Value,
};

/// Partition `docs` by `key` and emit one result document per group, in the
/// order each key was first seen: `_id` first, then the accumulators in
/// declaration order.
pub(super) fn apply_group(
    docs: Vec<Document>,
    key: &GroupKey,
    accumulators: &[(String, Accumulator)],
) -> Vec<Document> {
    // keys are looked up by their rendered form, so 1 and 1.0 share a group
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(Value, Vec<AccumulatorState>)> = Vec::new();

    for doc in &docs {
        let key_value = key.evaluate(doc);
        let slot = *index.entry(to_json(&key_value)).or_insert_with(|| {
            let states = accumulators
                .iter()
                .map(|(_, acc)| AccumulatorState::new(acc))
                .collect();
            groups.push((key_value, states));
            groups.len() - 1
        });

        for ((_, acc), state) in accumulators.iter().zip(groups[slot].1.iter_mut()) {
            state.update(acc, doc);
        }
    }

    groups
        .into_iter()
        .map(|(key_value, states)| {
            let mut out = Document::with_capacity(accumulators.len() + 1);
            out.insert("_id", key_value);
            for ((name, _), state) in accumulators.iter().zip(states) {
                out.insert(name.clone(), state.finish());
            }
            out
        })
        .collect()
}

/// Running state of one accumulator within one group.
#[derive(Debug)]
enum AccumulatorState {
    Sum { total: Total, saw_float: bool },
    Avg { total: Total, count: u64 },
    Push(Vec<Value>),
    Extremum { best: Option<Value>, keep: Ordering },
    First(Option<Value>),
}

impl AccumulatorState {
    fn new(acc: &Accumulator) -> Self {
        match acc {
            Accumulator::Sum(_) => AccumulatorState::Sum {
                total: Total::default(),
                saw_float: false,
            },
            Accumulator::Avg { .. } => AccumulatorState::Avg {
                total: Total::default(),
                count: 0,
            },
            Accumulator::Push(_) => AccumulatorState::Push(Vec::new()),
            Accumulator::Min(_) => AccumulatorState::Extremum {
                best: None,
                keep: Ordering::Less,
            },
            Accumulator::Max(_) => AccumulatorState::Extremum {
                best: None,
                keep: Ordering::Greater,
            },
            Accumulator::First(_) => AccumulatorState::First(None),
        }
    }

    fn update(&mut self, acc: &Accumulator, doc: &Document) {
        match (self, acc) {
            (AccumulatorState::Sum { total, saw_float }, Accumulator::Sum(operand)) => {
                let value = match operand {
                    SumOperand::Constant(v) => Some(v),
                    SumOperand::Field(path) => doc.resolve(path),
                };
                let Some(value) = value else {
                    return;
                };
                if !total.add(value) {
                    if !value.is_null() {
                        tracing::debug!(
                            found = value.type_name(),
                            "$sum ignoring non-numeric value"
                        );
                    }
                    return;
                }
                if matches!(value, Value::Float(_)) {
                    *saw_float = true;
                }
            }
            (AccumulatorState::Avg { total, count }, Accumulator::Avg { path, fallback }) => {
                let resolved = doc.resolve(path).filter(|v| !v.is_null());
                let added = match (resolved, fallback) {
                    (Some(value), _) => total.add(value),
                    (None, AvgFallback::Default(d)) => total.add(&Value::Float(*d)),
                    (None, AvgFallback::Exclude) => false,
                };
                if added {
                    *count += 1;
                } else if let Some(value) = resolved {
                    tracing::debug!(
                        path = %path,
                        found = value.type_name(),
                        "$avg excluding non-numeric value"
                    );
                }
            }
            (AccumulatorState::Push(items), Accumulator::Push(path)) => {
                if let Some(value) = doc.resolve(path) {
                    items.push(value.clone());
                }
            }
            (
                AccumulatorState::Extremum { best, keep },
                Accumulator::Min(path) | Accumulator::Max(path),
            ) => {
                let Some(value) = doc.resolve(path).filter(|v| !v.is_null()) else {
                    return;
                };
                let replace = match best {
                    Some(current) => value.canonical_cmp(current) == *keep,
                    None => true,
                };
                if replace {
                    *best = Some(value.clone());
                }
            }
            (AccumulatorState::First(first), Accumulator::First(path)) => {
                if first.is_none() {
                    *first = Some(doc.resolve(path).cloned().unwrap_or(Value::Null));
                }
            }
            _ => {}
        }
    }

    fn finish(self) -> Value {
        match self {
            AccumulatorState::Sum { total, saw_float } => {
                if !saw_float && let Some(n) = total.exact.and_then(|d| d.to_i64()) {
                    Value::Integer(n)
                } else {
                    Value::Float(total.to_f64())
                }
            }
            AccumulatorState::Avg { total, count } => {
                if count == 0 {
                    return Value::Null;
                }
                let mean = total
                    .exact
                    .and_then(|d| d.checked_div(Decimal::from(count)))
                    .and_then(|d| d.to_f64());
                Value::Float(mean.unwrap_or(total.approx / count as f64))
            }
            AccumulatorState::Push(items) => Value::Array(items),
            AccumulatorState::Extremum { best, .. } => best.unwrap_or(Value::Null),
            AccumulatorState::First(first) => first.unwrap_or(Value::Null),
        }
    }
}

/// Running numeric total. Stays exact while every input and partial sum fits
/// a `Decimal`; past that range the `f64` shadow total takes over.
#[derive(Debug)]
struct Total {
    exact: Option<Decimal>,
    approx: f64,
}

impl Default for Total {
    fn default() -> Self {
        Total {
            exact: Some(Decimal::ZERO),
            approx: 0.0,
        }
    }
}

impl Total {
    /// Add a finite number. Returns false, leaving the total unchanged, for
    /// anything else.
    fn add(&mut self, value: &Value) -> bool {
        let Some(n) = value.as_float().filter(|n| n.is_finite()) else {
            return false;
        };
        self.approx += n;
        if let Some(exact) = self.exact {
            self.exact = value.to_decimal().and_then(|d| exact.checked_add(d));
            if self.exact.is_none() {
                tracing::debug!("total exceeds decimal range, continuing in f64");
            }
        }
        true
    }

    fn to_f64(&self) -> f64 {
        self.exact
            .and_then(|d| d.to_f64())
            .unwrap_or(self.approx)
    }
}
