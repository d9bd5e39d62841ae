//! Name resolution: alias elimination and column binding.
//!
//! After [`dealias`] and [`resolve`] every column reference of a query is
//! qualified by `TableQualifier::Tag(0)` or `TableQualifier::Tag(1)`, the
//! position of its table in the FROM list.

use crate::ast::{ColumnRef, Query, TableQualifier};
use crate::error::{QueryError, Result};
use alloc::string::ToString;
use log::trace;
use quarry_core::schema::Schema;

/// Rewrites table names and aliases used as column qualifiers to table tags.
///
/// Fails with `AmbiguousAlias` when a declared alias collides with the other
/// table's name or alias, or when both tables share a name and a column is
/// qualified by it. Qualifiers naming no table fail with `UnknownTable`.
pub fn dealias(query: &Query) -> Result<Query> {
    let tables = &query.tables;

    if let [first, second] = tables.as_slice() {
        if let Some(alias) = &first.alias {
            if second.answers_to(alias) {
                return Err(QueryError::ambiguous_alias(alias.as_str()));
            }
        }
        if let Some(alias) = &second.alias {
            if first.answers_to(alias) {
                return Err(QueryError::ambiguous_alias(alias.as_str()));
            }
        }
    }
    let shared_name = match tables.as_slice() {
        [first, second] if first.name == second.name => Some(first.name.as_str()),
        _ => None,
    };

    query.clone().try_rewrite_columns(|col| {
        let qualifier = match &col.table {
            Some(TableQualifier::Name(name)) => name,
            _ => return Ok(()),
        };
        if shared_name == Some(qualifier.as_str()) {
            return Err(QueryError::ambiguous_alias(qualifier.as_str()));
        }
        let tag = tables
            .iter()
            .position(|t| t.answers_to(qualifier))
            .ok_or_else(|| QueryError::unknown_table(qualifier.as_str()))?;
        trace!("dealias {} -> {}.{}", col, tag, col.column);
        col.table = Some(TableQualifier::Tag(tag));
        Ok(())
    })
}

/// Binds every column reference to a table of `schemas`, positionally.
///
/// With one table every reference is tagged `0`. With two tables an
/// unqualified column is searched in both schemas and must exist in exactly
/// one. Expects a dealiased query.
pub fn resolve(query: &Query, schemas: &[Schema]) -> Result<Query> {
    if schemas.len() != query.tables.len() {
        return Err(QueryError::TableCountMismatch {
            expected: query.tables.len(),
            actual: schemas.len(),
        });
    }

    query.clone().try_rewrite_columns(|col| {
        let tag = match (&col.table, schemas) {
            (Some(TableQualifier::Tag(tag)), _) => *tag,
            (Some(TableQualifier::Name(name)), _) => {
                return Err(QueryError::unknown_table(name.as_str()))
            }
            (None, [_]) => 0,
            (None, [first, second]) => {
                match (
                    first.field_index(&col.column).is_some(),
                    second.field_index(&col.column).is_some(),
                ) {
                    (true, true) => return Err(QueryError::ambiguous_column(col.column.as_str())),
                    (true, false) => 0,
                    (false, true) => 1,
                    (false, false) => return Err(QueryError::unknown_column(col.to_string())),
                }
            }
            (None, _) => return Err(QueryError::unknown_column(col.to_string())),
        };

        let schema = schemas
            .get(tag)
            .ok_or_else(|| QueryError::unknown_table(tag.to_string()))?;
        if schema.field_index(&col.column).is_none() {
            return Err(QueryError::unknown_column(col.to_string()));
        }
        if col.tag() != Some(tag) {
            trace!("resolve {} -> {}.{}", col, tag, col.column);
        }
        col.table = Some(TableQualifier::Tag(tag));
        Ok(())
    })
}

/// Checks that every join comparison reads two different tables.
pub fn validate_join_condition(query: &Query) -> Result<()> {
    for cmp in query.join_condition.comparisons() {
        let right = cmp.right_column().map(ColumnRef::tag);
        if right.is_none() || right == Some(cmp.left.tag()) {
            return Err(QueryError::MalformedJoinCondition {
                condition: cmp.to_string(),
            });
        }
    }
    Ok(())
}
