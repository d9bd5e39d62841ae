//! Query optimizer module.
//!
//! Rewrites a resolved WHERE condition so that single-table clauses can be
//! evaluated before the join, and picks the join algorithm.

mod join_strategy;
mod normalize;

pub use join_strategy::JoinStrategy;
pub use normalize::{cnf_clause_count, dnf_to_cnf, sift, Clause, Cnf, SiftedCnf};
