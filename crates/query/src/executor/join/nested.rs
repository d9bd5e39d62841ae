//! Nested Loop Join implementation.

use crate::executor::relation::{Relation, Rows};
use crate::executor::selector::Selector;
use alloc::boxed::Box;
use alloc::rc::Rc;
use log::debug;
use quarry_core::Tuple;

/// Nested Loop Join executor.
///
/// Compares every pair of tuples. Used for join conditions with no
/// equality to hash on, and without a condition for the cross product.
#[derive(Clone, Debug, Default)]
pub struct NestedLoopJoin {
    /// Evaluated on each joined tuple. `None` keeps every pair.
    condition: Option<Rc<Selector>>,
}

impl NestedLoopJoin {
    /// Creates a nested loop join filtered by `condition`.
    pub fn new(condition: Rc<Selector>) -> Self {
        Self {
            condition: (!condition.is_trivial()).then_some(condition),
        }
    }

    /// Creates a nested loop join that keeps every pair.
    pub fn cross() -> Self {
        Self::default()
    }

    /// Returns the join condition.
    pub fn condition(&self) -> Option<&Selector> {
        self.condition.as_deref()
    }

    /// Executes the join.
    ///
    /// The inner side is scanned once per outer tuple, so it is materialized
    /// first: a reusable input is preferred and only buffered if it carries
    /// filters, otherwise the smaller stream is buffered. Nothing is read
    /// until the first pull.
    pub fn execute<'a>(&self, left: Relation<'a>, right: Relation<'a>) -> Rows<'a> {
        let join = self.clone();
        let mut pending = Some((left, right));
        Box::new(core::iter::from_fn(move || pending.take().map(|(l, r)| join.run(l, r))).flatten())
    }

    fn run<'a>(&self, left: Relation<'a>, right: Relation<'a>) -> Rows<'a> {
        let inner_is_left = if left.is_reusable() != right.is_reusable() {
            left.is_reusable()
        } else {
            left.estimated_len() <= right.estimated_len()
        };
        let (inner, outer) = if inner_is_left {
            (left.materialize(), right)
        } else {
            (right.materialize(), left)
        };
        debug!(
            "nested loop join scans the {} input per outer tuple",
            if inner_is_left { "left" } else { "right" }
        );

        let condition = self.condition.clone();
        Box::new(outer.into_rows().flat_map(move |o| {
            let condition = condition.clone();
            inner.scan().into_iter().flatten().filter_map(move |i| {
                let joined = if inner_is_left {
                    Tuple::concat(&i, &o)
                } else {
                    Tuple::concat(&o, &i)
                };
                match &condition {
                    Some(c) if !c.eval(&joined) => None,
                    _ => Some(joined),
                }
            })
        }))
    }
}
