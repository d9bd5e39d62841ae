//! Aggregate executor.
//!
//! Every input tuple is first projected to the result columns (COUNT slots
//! become the constant 1), then folded into one accumulator per column. Without
//! GROUP BY there is a single accumulator row and exactly one output tuple,
//! even for empty input. With GROUP BY there is one row per distinct key.

use super::project::ProjectExecutor;
use super::relation::Rows;
use crate::ast::AggregateFunc;
use alloc::boxed::Box;
use alloc::vec;
use alloc::vec::Vec;
use hashbrown::HashMap;
use quarry_core::{DataType, Tuple, Value};

/// Type and function of one reduced output column.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AggregateSpec {
    pub func: AggregateFunc,
    /// Type of the projected input field. Ignored for COUNT.
    pub data_type: DataType,
}

impl AggregateSpec {
    pub fn new(func: AggregateFunc, data_type: DataType) -> Self {
        Self { func, data_type }
    }

    /// Returns the type of the reduced value.
    pub fn output_type(&self) -> DataType {
        match self.func {
            AggregateFunc::Count => DataType::Int64,
            AggregateFunc::Sum if self.data_type.is_integer() => DataType::Int64,
            AggregateFunc::Sum | AggregateFunc::Avg => DataType::Float64,
            AggregateFunc::Max | AggregateFunc::Min | AggregateFunc::None => self.data_type,
        }
    }
}

/// Running state of one reduced column.
#[derive(Clone, Debug)]
enum Accumulator {
    Count(i64),
    IntSum(i64),
    FloatSum(f64),
    Max(Value),
    Min(Value),
    Avg { sum: f64, count: u64 },
    /// Plain column: the first value seen wins.
    First { value: Value, seen: bool },
}

impl Accumulator {
    fn seed(spec: &AggregateSpec) -> Self {
        let default = || Value::default_for_type(spec.data_type);
        match spec.func {
            AggregateFunc::Count => Accumulator::Count(0),
            AggregateFunc::Sum if spec.data_type.is_integer() => Accumulator::IntSum(0),
            AggregateFunc::Sum => Accumulator::FloatSum(0.0),
            AggregateFunc::Max => {
                Accumulator::Max(Value::min_for_type(spec.data_type).unwrap_or_else(default))
            }
            AggregateFunc::Min => {
                Accumulator::Min(Value::max_for_type(spec.data_type).unwrap_or_else(default))
            }
            AggregateFunc::Avg => Accumulator::Avg { sum: 0.0, count: 0 },
            AggregateFunc::None => Accumulator::First {
                value: default(),
                seen: false,
            },
        }
    }

    fn update(&mut self, value: &Value) {
        match self {
            Accumulator::Count(n) => *n += value.as_i64().unwrap_or(1),
            Accumulator::IntSum(sum) => *sum = sum.wrapping_add(value.as_i64().unwrap_or(0)),
            Accumulator::FloatSum(sum) => *sum += value.as_f64().unwrap_or(0.0),
            Accumulator::Max(max) => {
                if *value > *max {
                    *max = value.clone();
                }
            }
            Accumulator::Min(min) => {
                if *value < *min {
                    *min = value.clone();
                }
            }
            Accumulator::Avg { sum, count } => {
                *sum += value.as_f64().unwrap_or(0.0);
                *count += 1;
            }
            Accumulator::First { value: first, seen } => {
                if !*seen {
                    *first = value.clone();
                    *seen = true;
                }
            }
        }
    }

    fn finish(self) -> Value {
        match self {
            Accumulator::Count(n) | Accumulator::IntSum(n) => Value::Int64(n),
            Accumulator::FloatSum(sum) => Value::Float64(sum),
            Accumulator::Max(v) | Accumulator::Min(v) => v,
            Accumulator::Avg { count: 0, .. } => Value::Null,
            Accumulator::Avg { sum, count } => Value::Float64(sum / count as f64),
            Accumulator::First { value, .. } => value,
        }
    }
}

/// Aggregate executor - reduces all input, globally or per group.
#[derive(Clone, Debug)]
pub struct AggregateExecutor {
    /// Group by field indices of the input tuple.
    group_by: Vec<usize>,
    /// Maps an input tuple to the values fed to the accumulators.
    projector: ProjectExecutor,
    /// One spec per projector slot.
    specs: Vec<AggregateSpec>,
}

impl AggregateExecutor {
    /// Creates a new aggregate executor. `specs` must align with the
    /// projector's slots.
    pub fn new(group_by: Vec<usize>, projector: ProjectExecutor, specs: Vec<AggregateSpec>) -> Self {
        debug_assert_eq!(projector.slots().len(), specs.len());
        Self {
            group_by,
            projector,
            specs,
        }
    }

    /// Creates an aggregate executor with no grouping.
    pub fn no_group(projector: ProjectExecutor, specs: Vec<AggregateSpec>) -> Self {
        Self::new(Vec::new(), projector, specs)
    }

    /// Returns true if the executor groups its input.
    pub fn is_grouped(&self) -> bool {
        !self.group_by.is_empty()
    }

    fn seed(&self) -> Vec<Accumulator> {
        self.specs.iter().map(Accumulator::seed).collect()
    }

    fn fold(&self, accumulators: &mut [Accumulator], tuple: &Tuple) {
        let projected = self.projector.apply(tuple);
        for (acc, value) in accumulators.iter_mut().zip(projected.values()) {
            acc.update(value);
        }
    }

    fn emit(accumulators: Vec<Accumulator>) -> Tuple {
        Tuple::new(accumulators.into_iter().map(Accumulator::finish).collect())
    }

    /// Consumes the whole input and returns the reduced tuples.
    pub fn reduce(&self, input: Rows<'_>) -> Vec<Tuple> {
        if !self.is_grouped() {
            let mut accumulators = self.seed();
            for tuple in input {
                self.fold(&mut accumulators, &tuple);
            }
            return vec![Self::emit(accumulators)];
        }

        // Groups are kept in first-seen order.
        let mut index: HashMap<Vec<Value>, usize> = HashMap::new();
        let mut groups: Vec<Vec<Accumulator>> = Vec::new();
        for tuple in input {
            let key: Vec<Value> = self
                .group_by
                .iter()
                .map(|&i| tuple.get(i).cloned().unwrap_or(Value::Null))
                .collect();
            let slot = *index.entry(key).or_insert_with(|| {
                groups.push(self.seed());
                groups.len() - 1
            });
            self.fold(&mut groups[slot], &tuple);
        }
        groups.into_iter().map(Self::emit).collect()
    }

    /// Reduces the input lazily: nothing is read until the first tuple is pulled.
    pub fn execute<'a>(&self, input: Rows<'a>) -> Rows<'a> {
        let executor = self.clone();
        let mut pending = Some(input);
        Box::new(
            core::iter::from_fn(move || pending.take().map(|rows| executor.reduce(rows)))
                .flatten(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::project::Slot;
    use alloc::string::String;

    fn rows(data: &[(i32, i32, &str)]) -> Vec<Tuple> {
        data.iter()
            .map(|(x, y, name)| {
                Tuple::new(vec![
                    Value::Int32(*x),
                    Value::Int32(*y),
                    Value::String(String::from(*name)),
                ])
            })
            .collect()
    }

    fn spec(func: AggregateFunc, data_type: DataType) -> AggregateSpec {
        AggregateSpec::new(func, data_type)
    }

    #[test]
    fn test_global_aggregates() {
        let projector = ProjectExecutor::new(vec![Slot::One, Slot::Field(0), Slot::Field(1), Slot::Field(1), Slot::Field(0)]);
        let exec = AggregateExecutor::no_group(
            projector,
            vec![
                spec(AggregateFunc::Count, DataType::Int64),
                spec(AggregateFunc::Sum, DataType::Int32),
                spec(AggregateFunc::Max, DataType::Int32),
                spec(AggregateFunc::Min, DataType::Int32),
                spec(AggregateFunc::Avg, DataType::Int32),
            ],
        );
        let data = rows(&[(1, 1, "a"), (2, 1, "b"), (1, 3, "c")]);
        let out = exec.reduce(Box::new(data.into_iter()));
        assert_eq!(
            out,
            vec![Tuple::new(vec![
                Value::Int64(3),
                Value::Int64(4),
                Value::Int32(3),
                Value::Int32(1),
                Value::Float64(4.0 / 3.0),
            ])]
        );
    }

    #[test]
    fn test_global_aggregates_on_empty_input() {
        let projector = ProjectExecutor::new(vec![Slot::One, Slot::Field(0), Slot::Field(0), Slot::Field(0), Slot::Field(0)]);
        let exec = AggregateExecutor::no_group(
            projector,
            vec![
                spec(AggregateFunc::Count, DataType::Int64),
                spec(AggregateFunc::Sum, DataType::Float64),
                spec(AggregateFunc::Max, DataType::Int32),
                spec(AggregateFunc::Min, DataType::Int64),
                spec(AggregateFunc::Avg, DataType::Float64),
            ],
        );
        let out = exec.reduce(Box::new(core::iter::empty()));
        assert_eq!(
            out,
            vec![Tuple::new(vec![
                Value::Int64(0),
                Value::Float64(0.0),
                Value::Int32(i32::MIN),
                Value::Int64(i64::MAX),
                Value::Null,
            ])]
        );
    }

    #[test]
    fn test_grouped_aggregates() {
        let projector = ProjectExecutor::new(vec![Slot::Field(2), Slot::Field(1)]);
        let exec = AggregateExecutor::new(
            vec![2],
            projector,
            vec![spec(AggregateFunc::None, DataType::String), spec(AggregateFunc::Sum, DataType::Int32)],
        );
        let data = rows(&[(1, 1, "a"), (2, 5, "b"), (1, 3, "a")]);
        let out = exec.reduce(Box::new(data.into_iter()));
        assert_eq!(
            out,
            vec![
                Tuple::new(vec![Value::String("a".into()), Value::Int64(4)]),
                Tuple::new(vec![Value::String("b".into()), Value::Int64(5)]),
            ]
        );
    }

    #[test]
    fn test_grouped_empty_input_yields_nothing() {
        let exec = AggregateExecutor::new(
            vec![0],
            ProjectExecutor::new(vec![Slot::One]),
            vec![spec(AggregateFunc::Count, DataType::Int64)],
        );
        assert!(exec.reduce(Box::new(core::iter::empty())).is_empty());
    }

    #[test]
    fn test_first_value_wins_and_wrapping_sum() {
        let mut first = Accumulator::seed(&spec(AggregateFunc::None, DataType::Int32));
        first.update(&Value::Int32(7));
        first.update(&Value::Int32(9));
        assert_eq!(first.finish(), Value::Int32(7));

        let mut sum = Accumulator::seed(&spec(AggregateFunc::Sum, DataType::Int64));
        sum.update(&Value::Int64(i64::MAX));
        sum.update(&Value::Int64(1));
        assert_eq!(sum.finish(), Value::Int64(i64::MIN));
    }

    #[test]
    fn test_execute_is_lazy() {
        use core::cell::Cell;
        let pulled = Cell::new(0);
        let input = (0..3).map(|i| {
            pulled.set(pulled.get() + 1);
            Tuple::new(vec![Value::Int32(i)])
        });
        let exec = AggregateExecutor::no_group(
            ProjectExecutor::new(vec![Slot::One]),
            vec![spec(AggregateFunc::Count, DataType::Int64)],
        );
        let mut out = exec.execute(Box::new(input));
        assert_eq!(pulled.get(), 0);
        assert_eq!(out.next(), Some(Tuple::new(vec![Value::Int64(3)])));
        assert_eq!(pulled.get(), 3);
        assert_eq!(out.next(), None);
    }

    #[test]
    fn test_output_types() {
        assert_eq!(spec(AggregateFunc::Sum, DataType::Int32).output_type(), DataType::Int64);
        assert_eq!(spec(AggregateFunc::Avg, DataType::Int32).output_type(), DataType::Float64);
        assert_eq!(spec(AggregateFunc::Max, DataType::Float64).output_type(), DataType::Float64);
    }
}
