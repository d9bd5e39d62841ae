//! Filter executor.

use super::relation::Rows;
use super::selector::Selector;
use alloc::boxed::Box;
use alloc::rc::Rc;

/// Filter executor - keeps the tuples a selector accepts.
#[derive(Clone, Debug)]
pub struct FilterExecutor {
    selector: Rc<Selector>,
}

impl FilterExecutor {
    /// Creates a new filter executor.
    pub fn new(selector: Rc<Selector>) -> Self {
        Self { selector }
    }

    /// Returns the selector.
    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Filters the input lazily.
    pub fn execute<'a>(&self, input: Rows<'a>) -> Rows<'a> {
        if self.selector.is_trivial() {
            return input;
        }
        let selector = Rc::clone(&self.selector);
        Box::new(input.filter(move |t| selector.eval(t)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ColumnRef, CompOp, Comparison, Literal};
    use crate::executor::selector::{compile_comparison, TupleLayout};
    use alloc::vec;
    use alloc::vec::Vec;
    use quarry_core::schema::SchemaBuilder;
    use quarry_core::{DataType, Tuple, Value};

    #[test]
    fn test_filter_executor() {
        let schema = SchemaBuilder::new("t")
            .unwrap()
            .field("value", DataType::Int64)
            .unwrap()
            .build()
            .unwrap();
        let cmp = Comparison::with_literal(ColumnRef::tagged(0, "value"), CompOp::Gt, Literal::Integer(15));
        let selector = Selector::Compare(compile_comparison(&cmp, &TupleLayout::single(&schema)).unwrap());
        let filter = FilterExecutor::new(Rc::new(selector));

        let rows = vec![
            Tuple::new(vec![Value::Int64(10)]),
            Tuple::new(vec![Value::Int64(20)]),
            Tuple::new(vec![Value::Int64(30)]),
        ];
        let result: Vec<Tuple> = filter.execute(Box::new(rows.into_iter())).collect();
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].get(0), Some(&Value::Int64(20)));
    }

    #[test]
    fn test_trivial_filter_passes_through() {
        let filter = FilterExecutor::new(Rc::new(Selector::Any(Vec::new())));
        let rows = vec![Tuple::new(vec![Value::Int64(1)])];
        assert_eq!(filter.execute(Box::new(rows.into_iter())).count(), 1);
    }
}
