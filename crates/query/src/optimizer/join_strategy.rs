//! Join strategy selection.
//!
//! A join condition that is a single conjunction holding at least one
//! equality runs as a hash join on the equalities, with the remaining
//! comparisons checked on each matched pair. Any other condition runs as a
//! nested loop join, and an absent condition as a cross product.

use crate::ast::{CompOp, Comparison, Conjunction, Disjunction};
use crate::error::{QueryError, Result};
use crate::executor::{compile_conjunction, compile_dnf, HashJoin, NestedLoopJoin, Relation, Rows, TupleLayout};
use alloc::rc::Rc;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::fmt;
use log::debug;
use quarry_core::schema::Schema;
use quarry_core::DataType;

/// Value classes that hash join keys are compared in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum KeyClass {
    Integer,
    Float,
    Text,
    Boolean,
}

impl From<DataType> for KeyClass {
    fn from(data_type: DataType) -> Self {
        match data_type {
            DataType::Int32 | DataType::Int64 => KeyClass::Integer,
            DataType::Float64 => KeyClass::Float,
            DataType::String => KeyClass::Text,
            DataType::Boolean => KeyClass::Boolean,
        }
    }
}

/// Join algorithm chosen at plan time.
#[derive(Clone, Debug)]
pub enum JoinStrategy {
    Hash(HashJoin),
    NestedLoop(NestedLoopJoin),
    CrossProduct,
}

impl JoinStrategy {
    /// Chooses the strategy for a resolved join condition between table 0
    /// (`left`) and table 1 (`right`).
    pub fn choose(condition: &Disjunction, left: &Schema, right: &Schema) -> Result<Self> {
        let joined = TupleLayout::joined(left, right);
        let strategy = match condition.terms.as_slice() {
            [] => JoinStrategy::CrossProduct,
            [conjunction] if conjunction.iter().any(|c| c.op == CompOp::Eq) => {
                JoinStrategy::Hash(hash_join(conjunction, left, right, &joined)?)
            }
            _ => JoinStrategy::NestedLoop(NestedLoopJoin::new(Rc::new(compile_dnf(condition, &joined)?))),
        };
        debug!("join strategy: {}", strategy);
        Ok(strategy)
    }

    /// Returns true for a hash join.
    pub fn is_hash(&self) -> bool {
        matches!(self, JoinStrategy::Hash(_))
    }

    /// Joins two inputs. Output tuples are left fields followed by right fields.
    pub fn execute<'a>(&self, left: Relation<'a>, right: Relation<'a>) -> Rows<'a> {
        match self {
            JoinStrategy::Hash(join) => join.execute(left, right),
            JoinStrategy::NestedLoop(join) => join.execute(left, right),
            JoinStrategy::CrossProduct => NestedLoopJoin::cross().execute(left, right),
        }
    }
}

impl fmt::Display for JoinStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinStrategy::Hash(join) => {
                match join.key_description() {
                    Some(keys) => write!(f, "hash join on {}", keys)?,
                    None => {
                        let (left, right) = join.keys();
                        write!(f, "hash join on left {:?} = right {:?}", left, right)?;
                    }
                }
                if let Some(residual) = join.residual() {
                    write!(f, " where {}", residual)?;
                }
                Ok(())
            }
            JoinStrategy::NestedLoop(join) => match join.condition() {
                Some(condition) => write!(f, "nested loop join where {}", condition),
                None => f.write_str("nested loop join"),
            },
            JoinStrategy::CrossProduct => f.write_str("cross product"),
        }
    }
}

/// Splits a conjunction into equality keys and a residual condition.
fn hash_join(conjunction: &Conjunction, left: &Schema, right: &Schema, joined: &TupleLayout) -> Result<HashJoin> {
    let left_layout = TupleLayout::single(left);
    let right_layout = TupleLayout::table(1, right);
    let mut left_keys = Vec::new();
    let mut right_keys = Vec::new();
    let mut residual = Vec::new();
    let mut equalities = Vec::new();

    for term in conjunction.iter() {
        // Orient every comparison as table 0 against table 1.
        let term: Comparison = if term.left.tag() == Some(0) {
            term.clone()
        } else {
            term.clone().swap()
        };
        let key_column = term.right_column().filter(|_| term.op == CompOp::Eq).cloned();
        let right_column = match key_column {
            Some(column) => column,
            None => {
                residual.push(term);
                continue;
            }
        };
        let (left_index, left_type) = left_layout.resolve(&term.left)?;
        let (right_index, right_type) = right_layout.resolve(&right_column)?;
        if KeyClass::from(left_type) != KeyClass::from(right_type) {
            return Err(QueryError::JoinKeyTypeMismatch {
                left: left_type,
                right: right_type,
            });
        }
        left_keys.push(left_index);
        right_keys.push(right_index);
        equalities.push(term.to_string());
    }

    let join = HashJoin::new(left_keys, right_keys).with_key_description(equalities.join(" AND "));
    if residual.is_empty() {
        return Ok(join);
    }
    let residual = compile_conjunction(&Conjunction::new(residual), joined)?;
    Ok(join.with_residual(Rc::new(residual)))
}
