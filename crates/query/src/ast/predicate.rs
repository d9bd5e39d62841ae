//! Comparison and boolean condition AST definitions.
//!
//! WHERE and ON conditions are both held in disjunctive normal form: an OR of
//! AND-ed comparisons.

use super::expr::{ColumnRef, Literal};
use alloc::collections::BTreeSet;
use alloc::vec::Vec;
use core::fmt;

/// Comparison operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CompOp {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
    Ne,
}

impl CompOp {
    /// Returns the operator that holds after swapping the two operands.
    pub fn invert(self) -> Self {
        match self {
            CompOp::Gt => CompOp::Lt,
            CompOp::Lt => CompOp::Gt,
            CompOp::Ge => CompOp::Le,
            CompOp::Le => CompOp::Ge,
            op => op,
        }
    }

    /// Returns the logical negation of the operator.
    pub fn negate(self) -> Self {
        match self {
            CompOp::Eq => CompOp::Ne,
            CompOp::Ne => CompOp::Eq,
            CompOp::Gt => CompOp::Le,
            CompOp::Lt => CompOp::Ge,
            CompOp::Ge => CompOp::Lt,
            CompOp::Le => CompOp::Gt,
        }
    }

    /// Returns the SQL symbol.
    pub fn symbol(&self) -> &'static str {
        match self {
            CompOp::Eq => "=",
            CompOp::Gt => ">",
            CompOp::Lt => "<",
            CompOp::Ge => ">=",
            CompOp::Le => "<=",
            CompOp::Ne => "<>",
        }
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Right-hand side of a comparison.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    Literal(Literal),
    Column(ColumnRef),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(lit) => write!(f, "{}", lit),
            Operand::Column(col) => write!(f, "{}", col),
        }
    }
}

/// A single comparison. The left side is always a column; one-sided
/// comparisons compare it with a literal, two-sided ones with another column.
#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
    pub op: CompOp,
    pub left: ColumnRef,
    pub right: Operand,
}

impl Comparison {
    /// Creates `column op literal`.
    pub fn with_literal(left: ColumnRef, op: CompOp, literal: Literal) -> Self {
        Self {
            op,
            left,
            right: Operand::Literal(literal),
        }
    }

    /// Creates `column op column`.
    pub fn with_column(left: ColumnRef, op: CompOp, right: ColumnRef) -> Self {
        Self {
            op,
            left,
            right: Operand::Column(right),
        }
    }

    /// Returns true if both sides are columns.
    #[inline]
    pub fn is_two_sided(&self) -> bool {
        matches!(self.right, Operand::Column(_))
    }

    /// Returns the right column of a two-sided comparison.
    pub fn right_column(&self) -> Option<&ColumnRef> {
        match &self.right {
            Operand::Column(col) => Some(col),
            Operand::Literal(_) => None,
        }
    }

    /// Returns the logical negation of this comparison.
    pub fn negate(mut self) -> Self {
        self.op = self.op.negate();
        self
    }

    /// Returns the same comparison with its two columns swapped.
    ///
    /// One-sided comparisons are returned unchanged.
    pub fn swap(self) -> Self {
        match self.right {
            Operand::Column(right) => Self::with_column(right, self.op.invert(), self.left),
            Operand::Literal(_) => self,
        }
    }

    /// Returns the table positions this comparison reads.
    pub fn tables(&self) -> BTreeSet<usize> {
        let mut tables = BTreeSet::new();
        tables.extend(self.left.tag());
        if let Some(col) = self.right_column() {
            tables.extend(col.tag());
        }
        tables
    }

    /// Returns every column reference of this comparison.
    pub fn columns(&self) -> impl Iterator<Item = &ColumnRef> {
        core::iter::once(&self.left).chain(self.right_column())
    }

    pub(crate) fn columns_mut(&mut self) -> impl Iterator<Item = &mut ColumnRef> {
        let right = match &mut self.right {
            Operand::Column(col) => Some(col),
            Operand::Literal(_) => None,
        };
        core::iter::once(&mut self.left).chain(right)
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}

/// AND-ed comparisons.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Conjunction {
    pub terms: Vec<Comparison>,
}

impl Conjunction {
    /// Creates a conjunction from its comparisons.
    pub fn new(terms: Vec<Comparison>) -> Self {
        Self { terms }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Comparison> {
        self.terms.iter()
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{}", term)?;
        }
        Ok(())
    }
}

/// OR-ed conjunctions. An empty disjunction means "no condition".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Disjunction {
    pub terms: Vec<Conjunction>,
}

impl Disjunction {
    /// Creates a disjunction from its conjunctions.
    pub fn new(terms: Vec<Conjunction>) -> Self {
        Self { terms }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn iter(&self) -> core::slice::Iter<'_, Conjunction> {
        self.terms.iter()
    }

    /// Iterates over every comparison of every conjunction.
    pub fn comparisons(&self) -> impl Iterator<Item = &Comparison> {
        self.terms.iter().flat_map(|c| c.terms.iter())
    }

    pub(crate) fn comparisons_mut(&mut self) -> impl Iterator<Item = &mut Comparison> {
        self.terms.iter_mut().flat_map(|c| c.terms.iter_mut())
    }
}

impl fmt::Display for Disjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // AND binds tighter than OR, so no parentheses are needed.
        for (i, conjunction) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" OR ")?;
            }
            write!(f, "{}", conjunction)?;
        }
        Ok(())
    }
}
