//! Quarry Query - SQL SELECT compiler and lazy executor for the Quarry query engine.
//!
//! This crate compiles a constrained SELECT statement over one or two record
//! types into a reusable plan:
//!
//! - `ast`: Query, predicate and result column definitions
//! - `grammar`: Lexer and recursive-descent parser
//! - `planner`: Name resolution and the query planner
//! - `optimizer`: DNF to CNF normalization, predicate sifting, join strategy selection
//! - `executor`: Compiled selectors and lazy filter, join, aggregate and project executors
//! - `context`: Capacity limits

#![no_std]

extern crate alloc;

pub mod ast;
pub mod context;
pub mod error;
pub mod executor;
pub mod grammar;
pub mod optimizer;
pub mod planner;

pub use context::QueryLimits;
pub use error::{QueryError, Result};
pub use executor::{Relation, Rows};
pub use grammar::parse;
pub use optimizer::JoinStrategy;
pub use planner::{QueryPlan, QueryPlanner, QueryRows};
