//! AST module for queries, result columns and predicates.

mod expr;
mod predicate;
mod query;

pub use expr::{AggregateFunc, ColumnRef, Literal, ResultColumn, TableQualifier, TableRef};
pub use predicate::{CompOp, Comparison, Conjunction, Disjunction, Operand};
pub use query::Query;
