//! Project executor.

use super::relation::Rows;
use alloc::boxed::Box;
use alloc::vec::Vec;
use quarry_core::{Tuple, Value};

/// Where one output field comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    /// A field of the input tuple.
    Field(usize),
    /// The constant 1, fed to COUNT.
    One,
}

/// Project executor - maps input tuples to output tuples slot by slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectExecutor {
    slots: Vec<Slot>,
}

impl ProjectExecutor {
    /// Creates a new project executor.
    pub fn new(slots: Vec<Slot>) -> Self {
        Self { slots }
    }

    /// Creates a projector over plain field indices.
    pub fn fields(indices: &[usize]) -> Self {
        Self::new(indices.iter().map(|&i| Slot::Field(i)).collect())
    }

    /// Returns the slots.
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Projects one tuple.
    pub fn apply(&self, tuple: &Tuple) -> Tuple {
        let values = self
            .slots
            .iter()
            .map(|slot| match slot {
                Slot::Field(i) => tuple.get(*i).cloned().unwrap_or(Value::Null),
                Slot::One => Value::Int64(1),
            })
            .collect();
        Tuple::new(values)
    }

    /// Projects the input lazily.
    pub fn execute<'a>(&self, input: Rows<'a>) -> Rows<'a> {
        let projector = self.clone();
        Box::new(input.map(move |t| projector.apply(&t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_project_executor() {
        let projector = ProjectExecutor::fields(&[2, 0]);
        let rows = vec![Tuple::new(vec![
            Value::Int64(1),
            Value::String("Alice".into()),
            Value::Int64(25),
        ])];
        let result: Vec<Tuple> = projector.execute(Box::new(rows.into_iter())).collect();
        assert_eq!(result, vec![Tuple::new(vec![Value::Int64(25), Value::Int64(1)])]);
    }

    #[test]
    fn test_count_slot_yields_one() {
        let projector = ProjectExecutor::new(vec![Slot::One, Slot::Field(0), Slot::Field(9)]);
        let out = projector.apply(&Tuple::new(vec![Value::Int32(7)]));
        assert_eq!(out.values(), &[Value::Int64(1), Value::Int32(7), Value::Null]);
    }
}
