//! Error types for Quarry schema construction.

use alloc::string::String;
use thiserror::Error;

/// Result type alias for core operations.
pub type Result<T> = core::result::Result<T, Error>;

/// Error types for schema and tuple operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Invalid schema definition.
    #[error("Invalid schema: {message}")]
    InvalidSchema { message: String },
    /// A field name was declared twice.
    #[error("Duplicate field {field} in schema {schema}")]
    DuplicateField { schema: String, field: String },
    /// A field index past the end of the schema.
    #[error("Field index {index} out of range for schema {schema}")]
    FieldIndexOutOfRange { schema: String, index: usize },
}

impl Error {
    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Error::InvalidSchema {
            message: message.into(),
        }
    }

    /// Creates a duplicate field error.
    pub fn duplicate_field(schema: impl Into<String>, field: impl Into<String>) -> Self {
        Error::DuplicateField {
            schema: schema.into(),
            field: field.into(),
        }
    }

    /// Creates a field index out of range error.
    pub fn field_index_out_of_range(schema: impl Into<String>, index: usize) -> Self {
        Error::FieldIndexOutOfRange {
            schema: schema.into(),
            index,
        }
    }
}
