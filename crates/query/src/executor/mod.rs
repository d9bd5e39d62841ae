//! Query executor module.
//!
//! Executors are lazy: each one wraps its input rows and does no work until
//! the returned iterator is pulled.

mod aggregate;
mod filter;
pub mod join;
mod project;
mod relation;
mod selector;

pub use aggregate::{AggregateExecutor, AggregateSpec};
pub use filter::FilterExecutor;
pub use join::{HashJoin, NestedLoopJoin};
pub use project::{ProjectExecutor, Slot};
pub use relation::{Relation, Rows};
pub use selector::{
    compile_clause, compile_cnf, compile_comparison, compile_conjunction, compile_dnf, Comparator, Selector,
    TupleLayout,
};
