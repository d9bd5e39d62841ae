//! Compiled predicates.
//!
//! Every comparison is resolved once, at plan time, to a field offset, a
//! comparison domain and an operator, and captured in a closure. Evaluating a
//! selector on a tuple never inspects the plan again.

use crate::ast::{AggregateFunc, ColumnRef, CompOp, Comparison, Conjunction, Disjunction, Literal, Operand};
use crate::error::{QueryError, Result};
use crate::optimizer::{Clause, Cnf};
use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use quarry_core::schema::Schema;
use quarry_core::{DataType, Tuple, Value};

/// Where each table's fields live in the tuple a selector is evaluated on.
#[derive(Clone, Debug)]
pub struct TupleLayout {
    /// Indexed by table tag: field offset and schema, if the table is present.
    tables: Vec<Option<(usize, Schema)>>,
}

impl TupleLayout {
    /// Layout of a single-table tuple, table 0 at offset 0.
    pub fn single(schema: &Schema) -> Self {
        Self::table(0, schema)
    }

    /// Layout of one input of a join, evaluated on its own.
    pub fn table(tag: usize, schema: &Schema) -> Self {
        let mut tables: Vec<Option<(usize, Schema)>> = (0..=tag).map(|_| None).collect();
        tables[tag] = Some((0, schema.clone()));
        Self { tables }
    }

    /// Layout of a joined tuple: left fields, then right fields.
    pub fn joined(left: &Schema, right: &Schema) -> Self {
        Self {
            tables: alloc::vec![Some((0, left.clone())), Some((left.len(), right.clone()))],
        }
    }

    /// Returns the type of every field, in tuple order.
    pub fn field_types(&self) -> Vec<DataType> {
        self.tables
            .iter()
            .flatten()
            .flat_map(|(_, schema)| schema.fields().iter().map(|f| f.data_type()))
            .collect()
    }

    /// Resolves a tagged column to its tuple index and type.
    pub fn resolve(&self, column: &ColumnRef) -> Result<(usize, DataType)> {
        let unresolved = || QueryError::UnresolvedColumn {
            column: column.to_string(),
        };
        let (offset, schema) = column
            .tag()
            .and_then(|tag| self.tables.get(tag))
            .and_then(Option::as_ref)
            .ok_or_else(unresolved)?;
        let index = schema.field_index(&column.column).ok_or_else(unresolved)?;
        Ok((offset + index, schema.data_type(index)?))
    }

    /// Returns the output names of every field, in tuple order.
    pub fn field_names(&self) -> Vec<String> {
        let qualify = self.tables.iter().flatten().count() > 1;
        self.tables
            .iter()
            .flatten()
            .flat_map(|(_, schema)| {
                schema.field_names().map(move |name| {
                    if qualify {
                        alloc::format!("{}.{}", schema.name(), name)
                    } else {
                        name.to_string()
                    }
                })
            })
            .collect()
    }

    /// Resolves a column used as an aggregate argument and checks the
    /// aggregate can reduce its type.
    pub fn resolve_aggregate(&self, func: AggregateFunc, column: &ColumnRef) -> Result<(usize, DataType)> {
        let (index, data_type) = self.resolve(column)?;
        let supported = match func {
            AggregateFunc::Sum | AggregateFunc::Avg | AggregateFunc::Max | AggregateFunc::Min => {
                data_type.is_ordered()
            }
            AggregateFunc::None | AggregateFunc::Count => true,
        };
        if supported {
            Ok((index, data_type))
        } else {
            Err(QueryError::UnsupportedAggregate {
                func,
                column: column.to_string(),
                data_type,
            })
        }
    }
}

type Evaluator = Box<dyn Fn(&Tuple) -> bool>;

/// A single compiled comparison.
pub struct Comparator {
    description: String,
    eval: Evaluator,
}

impl Comparator {
    /// Evaluates the comparison on a tuple.
    #[inline]
    pub fn eval(&self, tuple: &Tuple) -> bool {
        (self.eval)(tuple)
    }

    /// Returns the comparison text.
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Debug for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Comparator").field(&self.description).finish()
    }
}

/// A compiled boolean condition.
#[derive(Debug)]
pub enum Selector {
    /// Every child holds. Short-circuits left to right; empty is `true`.
    All(Vec<Selector>),
    /// Some child holds. Short-circuits left to right; empty is also `true`,
    /// so an absent condition filters nothing.
    Any(Vec<Selector>),
    Compare(Comparator),
}

impl Selector {
    /// The selector that accepts every tuple.
    pub fn always() -> Self {
        Selector::All(Vec::new())
    }

    /// Evaluates the selector on a tuple.
    pub fn eval(&self, tuple: &Tuple) -> bool {
        match self {
            Selector::All(children) => children.iter().all(|c| c.eval(tuple)),
            Selector::Any(children) => {
                children.is_empty() || children.iter().any(|c| c.eval(tuple))
            }
            Selector::Compare(cmp) => cmp.eval(tuple),
        }
    }

    /// Returns true if the selector accepts every tuple without evaluating anything.
    pub fn is_trivial(&self) -> bool {
        match self {
            Selector::All(children) | Selector::Any(children) => children.is_empty(),
            Selector::Compare(_) => false,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (children, sep) = match self {
            Selector::Compare(cmp) => return f.write_str(cmp.description()),
            Selector::All(children) => (children, " AND "),
            Selector::Any(children) => (children, " OR "),
        };
        match children.as_slice() {
            [] => f.write_str("TRUE"),
            [only] => write!(f, "{}", only),
            _ => {
                f.write_str("(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        f.write_str(sep)?;
                    }
                    write!(f, "{}", child)?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Returns the operator as a function over one comparison domain.
fn compare_with<T: PartialOrd + ?Sized>(op: CompOp) -> fn(&T, &T) -> bool {
    match op {
        CompOp::Eq => |a, b| a == b,
        CompOp::Ne => |a, b| a != b,
        CompOp::Lt => |a, b| a < b,
        CompOp::Le => |a, b| a <= b,
        CompOp::Gt => |a, b| a > b,
        CompOp::Ge => |a, b| a >= b,
    }
}

/// The value space two comparison operands meet in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Domain {
    Integer,
    Float,
    Text,
    Boolean,
}

fn domain_of(comparison: &Comparison, left: DataType, right: DataType) -> Result<Domain> {
    if !left.comparable_with(right) {
        return Err(QueryError::TypeMismatch {
            comparison: comparison.to_string(),
            left,
            right,
        });
    }
    Ok(match left {
        DataType::Boolean => Domain::Boolean,
        DataType::String => Domain::Text,
        _ if left.is_integer() && right.is_integer() => Domain::Integer,
        _ => Domain::Float,
    })
}

fn field_as_bool(tuple: &Tuple, index: usize) -> Option<bool> {
    tuple.get(index).and_then(Value::as_bool)
}

fn field_as_i64(tuple: &Tuple, index: usize) -> Option<i64> {
    tuple.get(index).and_then(Value::as_i64)
}

fn field_as_f64(tuple: &Tuple, index: usize) -> Option<f64> {
    tuple.get(index).and_then(Value::as_f64)
}

fn field_as_str(tuple: &Tuple, index: usize) -> Option<&str> {
    tuple.get(index).and_then(Value::as_str)
}

fn literal_evaluator(domain: Domain, index: usize, op: CompOp, literal: &Literal) -> Evaluator {
    match (domain, literal) {
        (Domain::Integer, Literal::Integer(rhs)) => {
            let (cmp, rhs) = (compare_with::<i64>(op), *rhs);
            Box::new(move |t: &Tuple| field_as_i64(t, index).is_some_and(|v| cmp(&v, &rhs)))
        }
        (Domain::Text, Literal::String(rhs)) => {
            let (cmp, rhs) = (compare_with::<str>(op), rhs.clone());
            Box::new(move |t: &Tuple| field_as_str(t, index).is_some_and(|v| cmp(v, rhs.as_str())))
        }
        (_, lit) => {
            let cmp = compare_with::<f64>(op);
            let rhs = lit.to_value().as_f64().unwrap_or(f64::NAN);
            Box::new(move |t: &Tuple| field_as_f64(t, index).is_some_and(|v| cmp(&v, &rhs)))
        }
    }
}

fn column_evaluator(domain: Domain, left: usize, op: CompOp, right: usize) -> Evaluator {
    match domain {
        Domain::Integer => {
            let cmp = compare_with::<i64>(op);
            Box::new(move |t: &Tuple| match (field_as_i64(t, left), field_as_i64(t, right)) {
                (Some(a), Some(b)) => cmp(&a, &b),
                _ => false,
            })
        }
        Domain::Float => {
            let cmp = compare_with::<f64>(op);
            Box::new(move |t: &Tuple| match (field_as_f64(t, left), field_as_f64(t, right)) {
                (Some(a), Some(b)) => cmp(&a, &b),
                _ => false,
            })
        }
        Domain::Text => {
            let cmp = compare_with::<str>(op);
            Box::new(move |t: &Tuple| match (field_as_str(t, left), field_as_str(t, right)) {
                (Some(a), Some(b)) => cmp(a, b),
                _ => false,
            })
        }
        Domain::Boolean => {
            let cmp = compare_with::<bool>(op);
            Box::new(move |t: &Tuple| match (field_as_bool(t, left), field_as_bool(t, right)) {
                (Some(a), Some(b)) => cmp(&a, &b),
                _ => false,
            })
        }
    }
}

/// Compiles one comparison against a tuple layout.
pub fn compile_comparison(comparison: &Comparison, layout: &TupleLayout) -> Result<Comparator> {
    let (left, left_type) = layout.resolve(&comparison.left)?;
    let eval = match &comparison.right {
        Operand::Literal(literal) => {
            let domain = domain_of(comparison, left_type, literal.data_type())?;
            literal_evaluator(domain, left, comparison.op, literal)
        }
        Operand::Column(column) => {
            let (right, right_type) = layout.resolve(column)?;
            let domain = domain_of(comparison, left_type, right_type)?;
            column_evaluator(domain, left, comparison.op, right)
        }
    };
    Ok(Comparator {
        description: comparison.to_string(),
        eval,
    })
}

fn compile_terms(terms: &[Comparison], layout: &TupleLayout) -> Result<Vec<Selector>> {
    terms
        .iter()
        .map(|c| compile_comparison(c, layout).map(Selector::Compare))
        .collect()
}

/// Compiles an AND of comparisons.
pub fn compile_conjunction(conjunction: &Conjunction, layout: &TupleLayout) -> Result<Selector> {
    compile_terms(&conjunction.terms, layout).map(Selector::All)
}

/// Compiles an OR of comparisons.
pub fn compile_clause(clause: &Clause, layout: &TupleLayout) -> Result<Selector> {
    compile_terms(&clause.terms, layout).map(Selector::Any)
}

/// Compiles an OR of ANDs.
pub fn compile_dnf(dnf: &Disjunction, layout: &TupleLayout) -> Result<Selector> {
    dnf.iter()
        .map(|c| compile_conjunction(c, layout))
        .collect::<Result<Vec<_>>>()
        .map(Selector::Any)
}

/// Compiles an AND of ORs.
pub fn compile_cnf(cnf: &Cnf, layout: &TupleLayout) -> Result<Selector> {
    cnf.clauses
        .iter()
        .map(|c| compile_clause(c, layout))
        .collect::<Result<Vec<_>>>()
        .map(Selector::All)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::parse;
    use crate::planner::{dealias, resolve};
    use alloc::vec;
    use quarry_core::schema::SchemaBuilder;

    fn point() -> Schema {
        SchemaBuilder::new("Point")
            .unwrap()
            .field("x", DataType::Int32)
            .unwrap()
            .field("y", DataType::Float64)
            .unwrap()
            .field("name", DataType::String)
            .unwrap()
            .field("flag", DataType::Boolean)
            .unwrap()
            .build()
            .unwrap()
    }

    fn row(x: i32, y: f64, name: &str, flag: bool) -> Tuple {
        Tuple::new(vec![
            Value::Int32(x),
            Value::Float64(y),
            Value::String(name.into()),
            Value::Boolean(flag),
        ])
    }

    fn where_selector(sql: &str) -> Result<Selector> {
        let query = resolve(&dealias(&parse(sql)?)?, &[point()])?;
        compile_dnf(&query.where_condition, &TupleLayout::single(&point()))
    }

    #[test]
    fn test_integer_and_float_domains() {
        let sel = where_selector("SELECT x FROM Point WHERE x >= 2 AND y < 1.5").unwrap();
        assert!(sel.eval(&row(2, 1.0, "a", false)));
        assert!(!sel.eval(&row(1, 1.0, "a", false)));
        assert!(!sel.eval(&row(3, 1.5, "a", false)));

        // Integer column against a float literal compares as f64.
        let sel = where_selector("SELECT x FROM Point WHERE x < 2.5").unwrap();
        assert!(sel.eval(&row(2, 0.0, "a", false)));
        assert!(!sel.eval(&row(3, 0.0, "a", false)));
    }

    #[test]
    fn test_string_domain_and_or() {
        let sel = where_selector("SELECT x FROM Point WHERE name = 'a' OR name > 'm'").unwrap();
        assert!(sel.eval(&row(0, 0.0, "a", false)));
        assert!(sel.eval(&row(0, 0.0, "z", false)));
        assert!(!sel.eval(&row(0, 0.0, "b", false)));
    }

    #[test]
    fn test_type_mismatch() {
        let err = where_selector("SELECT x FROM Point WHERE name = 1").unwrap_err();
        assert!(matches!(
            err,
            QueryError::TypeMismatch { left: DataType::String, right: DataType::Int64, .. }
        ));
        assert!(where_selector("SELECT x FROM Point WHERE flag = 1").is_err());
        assert!(where_selector("SELECT x FROM Point WHERE x = 'a'").is_err());
    }

    #[test]
    fn test_column_pair_on_joined_layout() {
        let layout = TupleLayout::joined(&point(), &point());
        let cmp = Comparison::with_column(ColumnRef::tagged(0, "flag"), CompOp::Eq, ColumnRef::tagged(1, "flag"));
        let comparator = compile_comparison(&cmp, &layout).unwrap();
        let joined = Tuple::concat(&row(1, 0.0, "a", true), &row(2, 0.0, "b", true));
        assert!(comparator.eval(&joined));

        let cmp = Comparison::with_column(ColumnRef::tagged(0, "x"), CompOp::Lt, ColumnRef::tagged(1, "y"));
        let comparator = compile_comparison(&cmp, &layout).unwrap();
        let joined = Tuple::concat(&row(1, 0.0, "a", true), &row(2, 1.5, "b", true));
        assert!(comparator.eval(&joined));
        assert_eq!(comparator.description(), "0.x < 1.y");
    }

    #[test]
    fn test_unresolved_column() {
        let layout = TupleLayout::table(1, &point());
        let cmp = Comparison::with_literal(ColumnRef::tagged(0, "x"), CompOp::Eq, Literal::Integer(1));
        assert!(matches!(
            compile_comparison(&cmp, &layout),
            Err(QueryError::UnresolvedColumn { .. })
        ));
        let cmp = Comparison::with_literal(ColumnRef::tagged(1, "x"), CompOp::Eq, Literal::Integer(1));
        assert!(compile_comparison(&cmp, &layout).is_ok());
    }

    #[test]
    fn test_empty_combinators_accept_everything() {
        let tuple = row(0, 0.0, "", false);
        assert!(Selector::All(Vec::new()).eval(&tuple));
        assert!(Selector::Any(Vec::new()).eval(&tuple));
        assert!(Selector::always().is_trivial());
        let sel = compile_dnf(&Disjunction::default(), &TupleLayout::single(&point())).unwrap();
        assert!(sel.eval(&tuple));
        assert_eq!(sel.to_string(), "TRUE");
    }

    #[test]
    fn test_layout_types_and_names() {
        let layout = TupleLayout::joined(&point(), &point());
        let types = layout.field_types();
        assert_eq!(types.len(), 8);
        assert_eq!(types[5], DataType::Float64);
        assert_eq!(layout.field_names()[4], "Point.x");
        assert_eq!(TupleLayout::single(&point()).field_names()[0], "x");
        assert_eq!(layout.resolve(&ColumnRef::tagged(1, "name")).unwrap(), (6, DataType::String));
    }

    #[test]
    fn test_unsupported_aggregate() {
        let layout = TupleLayout::single(&point());
        assert!(layout.resolve_aggregate(AggregateFunc::Sum, &ColumnRef::tagged(0, "y")).is_ok());
        assert!(layout.resolve_aggregate(AggregateFunc::Count, &ColumnRef::tagged(0, "name")).is_ok());
        assert!(matches!(
            layout.resolve_aggregate(AggregateFunc::Max, &ColumnRef::tagged(0, "name")),
            Err(QueryError::UnsupportedAggregate { func: AggregateFunc::Max, .. })
        ));
    }
}
