//! DNF to CNF conversion and clause sifting.
//!
//! A WHERE condition arrives in disjunctive normal form. Distributing it into
//! conjunctive normal form lets clauses that read a single table be evaluated
//! before the join.

use crate::ast::{Comparison, Disjunction};
use alloc::collections::BTreeSet;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

/// OR-ed comparisons.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Clause {
    pub terms: Vec<Comparison>,
}

impl Clause {
    /// Returns the table positions read by any term.
    pub fn tables(&self) -> BTreeSet<usize> {
        self.terms.iter().flat_map(|t| t.tables()).collect()
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.terms.len() > 1 {
            f.write_str("(")?;
        }
        for (i, term) in self.terms.iter().enumerate() {
            if i > 0 {
                f.write_str(" OR ")?;
            }
            write!(f, "{}", term)?;
        }
        if self.terms.len() > 1 {
            f.write_str(")")?;
        }
        Ok(())
    }
}

/// AND-ed clauses. No clauses means "no condition".
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Cnf {
    pub clauses: Vec<Clause>,
}

impl Cnf {
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.clauses.len()
    }
}

impl fmt::Display for Cnf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                f.write_str(" AND ")?;
            }
            write!(f, "{}", clause)?;
        }
        Ok(())
    }
}

/// Returns the number of clauses the CNF of `dnf` has, or `None` on overflow.
///
/// A disjunction of `k` conjunctions of sizes `n_1..n_k` distributes into
/// `n_1 * .. * n_k` clauses. An empty disjunction has no clauses.
pub fn cnf_clause_count(dnf: &Disjunction) -> Option<usize> {
    if dnf.is_empty() {
        return Some(0);
    }
    dnf.iter()
        .try_fold(1usize, |acc, conjunction| acc.checked_mul(conjunction.len()))
}

/// Distributes `dnf` into conjunctive normal form.
///
/// Returns `None` without building anything when the result would exceed
/// `max_clauses` clauses.
///
/// Clauses are enumerated with an odometer: digit `j` selects a term of
/// conjunction `j`, digit 0 turns fastest and wrapping carries into the next
/// digit. Every clause holds exactly one term from each conjunction.
pub fn dnf_to_cnf(dnf: &Disjunction, max_clauses: usize) -> Option<Cnf> {
    let count = cnf_clause_count(dnf).filter(|&n| n <= max_clauses)?;
    let limits: Vec<usize> = dnf.iter().map(|c| c.len()).collect();
    let mut digits = vec![0usize; limits.len()];
    let mut clauses = Vec::with_capacity(count);

    for _ in 0..count {
        let terms = dnf
            .iter()
            .zip(&digits)
            .map(|(conjunction, &d)| conjunction.terms[d].clone())
            .collect();
        clauses.push(Clause { terms });

        for (digit, &limit) in digits.iter_mut().zip(&limits) {
            *digit += 1;
            if *digit < limit {
                break;
            }
            *digit = 0;
        }
    }

    Some(Cnf { clauses })
}

/// CNF clauses partitioned by the tables they read.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SiftedCnf {
    /// Clauses reading only table 0.
    pub left: Cnf,
    /// Clauses reading only table 1.
    pub right: Cnf,
    /// Clauses reading both tables.
    pub mixed: Cnf,
}

impl SiftedCnf {
    /// Returns true if some clause can be evaluated before the join.
    pub fn has_pushdown(&self) -> bool {
        !self.left.is_empty() || !self.right.is_empty()
    }
}

/// Partitions CNF clauses into table-0-only, table-1-only and mixed clauses.
pub fn sift(cnf: Cnf) -> SiftedCnf {
    let mut sifted = SiftedCnf::default();
    for clause in cnf.clauses {
        let tables = clause.tables();
        let target = match (tables.contains(&0), tables.contains(&1)) {
            (true, false) => &mut sifted.left,
            (false, true) => &mut sifted.right,
            _ => &mut sifted.mixed,
        };
        target.clauses.push(clause);
    }
    sifted
}
