//! Tuple structure for Quarry.
//!
//! A `Tuple` is an ordered, fixed-shape sequence of values: one input record
//! flattened by its schema, a joined pair of records, or an output row.

use crate::value::Value;
use alloc::vec::Vec;

/// An ordered sequence of field values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tuple {
    values: Vec<Value>,
}

impl Tuple {
    /// Creates a tuple from its values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Concatenates two tuples, left fields first.
    ///
    /// Every joined tuple is built this way regardless of which side a join
    /// builds or probes.
    pub fn concat(left: &Tuple, right: &Tuple) -> Self {
        let mut values = Vec::with_capacity(left.len() + right.len());
        values.extend(left.values.iter().cloned());
        values.extend(right.values.iter().cloned());
        Self { values }
    }

    /// Returns a reference to the values.
    #[inline]
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Gets a value at the given field index.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Returns the number of values in this tuple.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if this tuple has no values.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl From<Vec<Value>> for Tuple {
    fn from(values: Vec<Value>) -> Self {
        Self::new(values)
    }
}
