//! Compilation limits for query planning.

use crate::ast::Query;
use crate::error::{QueryError, Result};

/// Default maximum number of OR-ed conjunctions in a condition.
pub const DEFAULT_MAX_OR_TERMS: usize = 8;
/// Default maximum number of AND-ed comparisons in one conjunction.
pub const DEFAULT_MAX_AND_TERMS: usize = 8;
/// Default maximum number of result (and GROUP BY) columns.
pub const DEFAULT_MAX_COLUMNS: usize = 32;
/// Maximum number of tables in one query.
pub const MAX_TABLES: usize = 2;
/// Default maximum number of clauses a CNF rewrite may produce before the
/// planner falls back to evaluating the DNF directly.
pub const DEFAULT_MAX_CNF_CLAUSES: usize = 4096;

/// Capacity limits enforced before a query is planned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueryLimits {
    /// Maximum OR terms per condition.
    pub max_or_terms: usize,
    /// Maximum AND terms per conjunction.
    pub max_and_terms: usize,
    /// Maximum result columns, and maximum GROUP BY columns.
    pub max_columns: usize,
    /// Maximum CNF clauses considered for push-down.
    pub max_cnf_clauses: usize,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            max_or_terms: DEFAULT_MAX_OR_TERMS,
            max_and_terms: DEFAULT_MAX_AND_TERMS,
            max_columns: DEFAULT_MAX_COLUMNS,
            max_cnf_clauses: DEFAULT_MAX_CNF_CLAUSES,
        }
    }
}

impl QueryLimits {
    /// Creates the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum OR terms.
    pub fn with_max_or_terms(mut self, limit: usize) -> Self {
        self.max_or_terms = limit;
        self
    }

    /// Sets the maximum AND terms.
    pub fn with_max_and_terms(mut self, limit: usize) -> Self {
        self.max_and_terms = limit;
        self
    }

    /// Sets the maximum result columns.
    pub fn with_max_columns(mut self, limit: usize) -> Self {
        self.max_columns = limit;
        self
    }

    /// Sets the maximum CNF clauses.
    pub fn with_max_cnf_clauses(mut self, limit: usize) -> Self {
        self.max_cnf_clauses = limit;
        self
    }

    /// Checks every capacity of a parsed query.
    pub fn check(&self, query: &Query) -> Result<()> {
        if query.tables.len() > MAX_TABLES {
            return Err(QueryError::capacity("tables", MAX_TABLES, query.tables.len()));
        }
        if query.columns.len() > self.max_columns {
            return Err(QueryError::capacity(
                "result columns",
                self.max_columns,
                query.columns.len(),
            ));
        }
        if query.group_by.len() > self.max_columns {
            return Err(QueryError::capacity(
                "GROUP BY columns",
                self.max_columns,
                query.group_by.len(),
            ));
        }
        for condition in [&query.join_condition, &query.where_condition] {
            if condition.len() > self.max_or_terms {
                return Err(QueryError::capacity(
                    "OR terms",
                    self.max_or_terms,
                    condition.len(),
                ));
            }
            for conjunction in condition.iter() {
                if conjunction.len() > self.max_and_terms {
                    return Err(QueryError::capacity(
                        "AND terms",
                        self.max_and_terms,
                        conjunction.len(),
                    ));
                }
            }
        }
        Ok(())
    }
}
