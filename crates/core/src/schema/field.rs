//! Field definition for Quarry schemas.

use crate::types::DataType;
use alloc::string::String;

/// A named, typed field of a record schema.
#[derive(Clone, Debug)]
pub struct Field {
    /// Field name.
    name: String,
    /// Data type of the field.
    data_type: DataType,
    /// Field position in the schema (0-based).
    index: usize,
}

impl Field {
    /// Creates a new field definition.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            index: 0,
        }
    }

    pub(crate) fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Returns the field name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the data type.
    #[inline]
    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    /// Returns the field index.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.data_type == other.data_type
    }
}
