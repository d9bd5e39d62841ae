//! Error types for query compilation.
//!
//! Every error is raised while a query is parsed, resolved or planned, or while
//! inputs are wired to a plan. A compiled plan never fails mid-scan.

use crate::ast::AggregateFunc;
use alloc::string::String;
use quarry_core::DataType;
use thiserror::Error;

/// Result type alias for query operations.
pub type Result<T> = core::result::Result<T, QueryError>;

/// Errors raised while compiling or wiring a query.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// The query text does not match the grammar.
    #[error("Syntax error at offset {position}: expected {expected}, found {found}")]
    Syntax {
        position: usize,
        found: String,
        expected: String,
    },
    /// A table alias collides with the other table's name or alias.
    #[error("Mis-using alias: {alias} is ambiguous")]
    AmbiguousAlias { alias: String },
    /// A column qualifier names no table of the query.
    #[error("Unknown table: {name}")]
    UnknownTable { name: String },
    /// A column exists in no bound schema.
    #[error("Unknown column: {column}")]
    UnknownColumn { column: String },
    /// An unqualified column exists in both bound schemas.
    #[error("Ambiguous column: {column} exists in both tables")]
    AmbiguousColumn { column: String },
    /// A join comparison references the same table on both sides.
    #[error("Malformed join condition: {condition}")]
    MalformedJoinCondition { condition: String },
    /// The number of bound schemas differs from the number of tables.
    #[error("Table count mismatch: query names {expected} tables, {actual} schemas given")]
    TableCountMismatch { expected: usize, actual: usize },
    /// The two sides of a comparison cannot be compared.
    #[error("Type mismatch in {comparison}: {left} vs {right}")]
    TypeMismatch {
        comparison: String,
        left: DataType,
        right: DataType,
    },
    /// A column reference is missing from the tuple layout it is evaluated on.
    #[error("Unresolved column: {column}")]
    UnresolvedColumn { column: String },
    /// Equi-join keys of the two sides have different types.
    #[error("Join key type mismatch: {left} vs {right}")]
    JoinKeyTypeMismatch { left: DataType, right: DataType },
    /// An aggregate is applied to a column type it cannot reduce.
    #[error("Unsupported aggregate {func} over {column} of type {data_type}")]
    UnsupportedAggregate {
        func: AggregateFunc,
        column: String,
        data_type: DataType,
    },
    /// A fixed capacity was exceeded.
    #[error("Capacity exceeded: {actual} {what}, limit is {limit}")]
    CapacityExceeded {
        what: &'static str,
        limit: usize,
        actual: usize,
    },
    /// A plan was executed with the wrong number of inputs.
    #[error("Plan expects {expected} inputs, got {actual}")]
    InputArity { expected: usize, actual: usize },
    /// Schema construction failed.
    #[error(transparent)]
    Schema(#[from] quarry_core::Error),
}

impl QueryError {
    /// Creates a syntax error.
    pub fn syntax(position: usize, found: impl Into<String>, expected: impl Into<String>) -> Self {
        QueryError::Syntax {
            position,
            found: found.into(),
            expected: expected.into(),
        }
    }

    /// Creates an ambiguous alias error.
    pub fn ambiguous_alias(alias: impl Into<String>) -> Self {
        QueryError::AmbiguousAlias {
            alias: alias.into(),
        }
    }

    /// Creates an unknown table error.
    pub fn unknown_table(name: impl Into<String>) -> Self {
        QueryError::UnknownTable { name: name.into() }
    }

    /// Creates an unknown column error.
    pub fn unknown_column(column: impl Into<String>) -> Self {
        QueryError::UnknownColumn {
            column: column.into(),
        }
    }

    /// Creates an ambiguous column error.
    pub fn ambiguous_column(column: impl Into<String>) -> Self {
        QueryError::AmbiguousColumn {
            column: column.into(),
        }
    }

    /// Creates a capacity exceeded error.
    pub fn capacity(what: &'static str, limit: usize, actual: usize) -> Self {
        QueryError::CapacityExceeded {
            what,
            limit,
            actual,
        }
    }
}
