//! The parsed query.

use super::expr::{ColumnRef, ResultColumn, TableRef};
use super::predicate::Disjunction;
use alloc::vec::Vec;
use core::fmt;

/// A parsed SELECT statement.
///
/// `Query` values are never mutated in place; resolution passes return new
/// values.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Query {
    /// Result columns. Empty means `SELECT *`.
    pub columns: Vec<ResultColumn>,
    /// One or two tables.
    pub tables: Vec<TableRef>,
    /// Two-sided ON condition.
    pub join_condition: Disjunction,
    /// One-sided WHERE condition.
    pub where_condition: Disjunction,
    /// GROUP BY columns.
    pub group_by: Vec<ColumnRef>,
}

impl Query {
    /// Returns true if the query selects every column.
    #[inline]
    pub fn is_select_all(&self) -> bool {
        self.columns.is_empty()
    }

    /// Returns true if the query reads two tables.
    #[inline]
    pub fn is_join(&self) -> bool {
        self.tables.len() == 2
    }

    /// Returns true if any result column carries an aggregate.
    pub fn needs_reduction(&self) -> bool {
        self.columns.iter().any(|c| c.aggregate.is_aggregate())
    }

    /// Iterates over every column reference of the query.
    pub fn column_refs(&self) -> impl Iterator<Item = &ColumnRef> {
        self.columns
            .iter()
            .map(|c| &c.column)
            .chain(self.join_condition.comparisons().flat_map(|c| c.columns()))
            .chain(self.where_condition.comparisons().flat_map(|c| c.columns()))
            .chain(self.group_by.iter())
    }

    /// Applies `f` to every column reference, skipping `COUNT(*)`.
    pub(crate) fn try_rewrite_columns<E>(
        mut self,
        mut f: impl FnMut(&mut ColumnRef) -> Result<(), E>,
    ) -> Result<Self, E> {
        for col in self.columns.iter_mut().map(|c| &mut c.column) {
            if !col.is_star() {
                f(col)?;
            }
        }
        for cmp in self.join_condition.comparisons_mut() {
            for col in cmp.columns_mut() {
                f(col)?;
            }
        }
        for cmp in self.where_condition.comparisons_mut() {
            for col in cmp.columns_mut() {
                f(col)?;
            }
        }
        for col in self.group_by.iter_mut() {
            f(col)?;
        }
        Ok(self)
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SELECT ")?;
        if self.is_select_all() {
            f.write_str("*")?;
        } else {
            write_list(f, &self.columns)?;
        }
        f.write_str(" FROM ")?;
        write_list(f, &self.tables)?;
        if !self.join_condition.is_empty() {
            write!(f, " ON {}", self.join_condition)?;
        }
        if !self.where_condition.is_empty() {
            write!(f, " WHERE {}", self.where_condition)?;
        }
        if !self.group_by.is_empty() {
            f.write_str(" GROUP BY ")?;
            write_list(f, &self.group_by)?;
        }
        Ok(())
    }
}
