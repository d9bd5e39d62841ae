//! Query planner and compiled query plans.
//!
//! ## Pipeline
//!
//! 1. **Parse** the SELECT text into a `Query`
//! 2. **Check capacities** against `QueryLimits`
//! 3. **Resolve names**: aliases become table tags, columns bind to schemas
//! 4. **Normalize WHERE**: for joins, the DNF is distributed into CNF and
//!    sifted; single-table clauses are pushed below the join. When nothing
//!    can be pushed down, or the CNF grows past `max_cnf_clauses`, the DNF
//!    is evaluated on the joined tuple instead
//! 5. **Choose the join strategy**
//! 6. **Build the output stage**: aggregation, projection or identity
//!
//! ## Usage
//!
//! ```
//! use quarry_query::{QueryPlanner, Relation};
//! use quarry_core::schema::SchemaBuilder;
//! use quarry_core::{DataType, Tuple, Value};
//!
//! let point = SchemaBuilder::new("Point")?
//!     .field("x", DataType::Int32)?
//!     .field("y", DataType::Int32)?
//!     .build()?;
//! let plan = QueryPlanner::new().compile("SELECT x FROM Point WHERE y > 1", &[point])?;
//!
//! let rows = [
//!     Tuple::new(vec![Value::Int32(1), Value::Int32(1)]),
//!     Tuple::new(vec![Value::Int32(2), Value::Int32(3)]),
//! ];
//! let result: Vec<Tuple> = plan.execute(Relation::from_tuples(&rows))?.collect();
//! assert_eq!(result, vec![Tuple::new(vec![Value::Int32(2)])]);
//! # Ok::<(), quarry_query::QueryError>(())
//! ```

use crate::ast::{AggregateFunc, Query};
use crate::context::QueryLimits;
use crate::error::{QueryError, Result};
use crate::executor::{
    compile_cnf, compile_dnf, AggregateExecutor, AggregateSpec, FilterExecutor, ProjectExecutor, Relation, Rows,
    Selector, Slot, TupleLayout,
};
use crate::grammar::parse;
use crate::optimizer::{dnf_to_cnf, sift, JoinStrategy};
use crate::planner::{dealias, resolve, validate_join_condition};
use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt::Write;
use log::debug;
use quarry_core::schema::Schema;
use quarry_core::{DataType, Reflect, Tuple};

/// Compiles SELECT statements into reusable [`QueryPlan`]s.
#[derive(Clone, Debug, Default)]
pub struct QueryPlanner {
    limits: QueryLimits,
}

impl QueryPlanner {
    /// Creates a planner with the default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a planner with custom limits.
    pub fn with_limits(limits: QueryLimits) -> Self {
        Self { limits }
    }

    /// Returns the limits.
    pub fn limits(&self) -> &QueryLimits {
        &self.limits
    }

    /// Compiles a query over one record type.
    pub fn plan<R: Reflect>(&self, sql: &str) -> Result<QueryPlan> {
        self.compile(sql, &[R::schema()])
    }

    /// Compiles a query joining two record types, in FROM order.
    pub fn plan_join<L: Reflect, R: Reflect>(&self, sql: &str) -> Result<QueryPlan> {
        self.compile(sql, &[L::schema(), R::schema()])
    }

    /// Parses and compiles a query. `schemas` bind to the FROM tables by position.
    pub fn compile(&self, sql: &str, schemas: &[Schema]) -> Result<QueryPlan> {
        let query = parse(sql)?;
        self.compile_query(query, schemas)
    }

    /// Compiles a parsed query.
    pub fn compile_query(&self, query: Query, schemas: &[Schema]) -> Result<QueryPlan> {
        self.limits.check(&query)?;
        let query = resolve(&dealias(&query)?, schemas)?;
        validate_join_condition(&query)?;

        let (layout, inputs) = match schemas {
            [single] => (TupleLayout::single(single), self.single_table_inputs(&query, single)?),
            [left, right] => (
                TupleLayout::joined(left, right),
                self.join_inputs(&query, left, right)?,
            ),
            _ => {
                return Err(QueryError::TableCountMismatch {
                    expected: query.tables.len(),
                    actual: schemas.len(),
                })
            }
        };
        let (output, output_types) = OutputStage::build(&query, &layout)?;
        let output_columns = if query.is_select_all() {
            layout.field_names()
        } else {
            query.columns.iter().map(|c| c.output_name()).collect()
        };

        Ok(QueryPlan {
            query,
            inputs,
            output,
            output_columns,
            output_types,
        })
    }

    fn single_table_inputs(&self, query: &Query, schema: &Schema) -> Result<Inputs> {
        let filter = compile_dnf(&query.where_condition, &TupleLayout::single(schema))?;
        Ok(Inputs::Single {
            filter: Rc::new(filter),
        })
    }

    fn join_inputs(&self, query: &Query, left: &Schema, right: &Schema) -> Result<Inputs> {
        let joined = TupleLayout::joined(left, right);
        let strategy = JoinStrategy::choose(&query.join_condition, left, right)?;
        let mut inputs = JoinInputs {
            left_filter: Rc::new(Selector::always()),
            right_filter: Rc::new(Selector::always()),
            strategy,
            residual: Rc::new(Selector::always()),
        };

        let condition = &query.where_condition;
        if condition.is_empty() {
            return Ok(Inputs::Join(inputs));
        }
        match dnf_to_cnf(condition, self.limits.max_cnf_clauses) {
            Some(cnf) => {
                debug!("WHERE distributes into {} CNF clauses", cnf.len());
                let sifted = sift(cnf);
                if sifted.has_pushdown() {
                    debug!(
                        "pushing down {} left and {} right clauses, {} mixed",
                        sifted.left.len(),
                        sifted.right.len(),
                        sifted.mixed.len()
                    );
                    inputs.left_filter = Rc::new(compile_cnf(&sifted.left, &TupleLayout::single(left))?);
                    inputs.right_filter = Rc::new(compile_cnf(&sifted.right, &TupleLayout::table(1, right))?);
                    inputs.residual = Rc::new(compile_cnf(&sifted.mixed, &joined)?);
                } else {
                    debug!("no single-table clause, evaluating WHERE after the join");
                    inputs.residual = Rc::new(compile_dnf(condition, &joined)?);
                }
            }
            None => {
                debug!(
                    "CNF exceeds {} clauses, evaluating WHERE after the join",
                    self.limits.max_cnf_clauses
                );
                inputs.residual = Rc::new(compile_dnf(condition, &joined)?);
            }
        }
        Ok(Inputs::Join(inputs))
    }
}

/// Selectors and join algorithm of a two-table plan.
#[derive(Debug)]
struct JoinInputs {
    left_filter: Rc<Selector>,
    right_filter: Rc<Selector>,
    strategy: JoinStrategy,
    /// WHERE clauses evaluated on the joined tuple.
    residual: Rc<Selector>,
}

#[derive(Debug)]
enum Inputs {
    Single { filter: Rc<Selector> },
    Join(JoinInputs),
}

impl Inputs {
    fn arity(&self) -> usize {
        match self {
            Inputs::Single { .. } => 1,
            Inputs::Join(_) => 2,
        }
    }
}

/// Last stage of a plan.
#[derive(Debug)]
enum OutputStage {
    /// `SELECT *` without aggregates.
    Identity,
    Project(ProjectExecutor),
    Reduce(AggregateExecutor),
}

impl OutputStage {
    /// Builds the stage and returns it with the types of its output fields.
    fn build(query: &Query, layout: &TupleLayout) -> Result<(Self, Vec<DataType>)> {
        if query.needs_reduction() {
            let mut slots = Vec::with_capacity(query.columns.len());
            let mut specs = Vec::with_capacity(query.columns.len());
            for column in &query.columns {
                match column.aggregate {
                    AggregateFunc::Count => {
                        if !column.column.is_star() {
                            layout.resolve(&column.column)?;
                        }
                        slots.push(Slot::One);
                        specs.push(AggregateSpec::new(AggregateFunc::Count, DataType::Int64));
                    }
                    func => {
                        let (index, data_type) = layout.resolve_aggregate(func, &column.column)?;
                        slots.push(Slot::Field(index));
                        specs.push(AggregateSpec::new(func, data_type));
                    }
                }
            }
            let types = specs.iter().map(AggregateSpec::output_type).collect();
            let projector = ProjectExecutor::new(slots);
            let aggregator = if query.group_by.is_empty() {
                AggregateExecutor::no_group(projector, specs)
            } else {
                let group_by = query
                    .group_by
                    .iter()
                    .map(|c| layout.resolve(c).map(|(index, _)| index))
                    .collect::<Result<Vec<_>>>()?;
                AggregateExecutor::new(group_by, projector, specs)
            };
            return Ok((OutputStage::Reduce(aggregator), types));
        }
        if query.is_select_all() {
            return Ok((OutputStage::Identity, layout.field_types()));
        }
        let (indices, types): (Vec<usize>, Vec<DataType>) = query
            .columns
            .iter()
            .map(|c| layout.resolve(&c.column))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .unzip();
        Ok((OutputStage::Project(ProjectExecutor::fields(&indices)), types))
    }

    fn execute<'a>(&self, rows: Rows<'a>) -> Rows<'a> {
        match self {
            OutputStage::Identity => rows,
            OutputStage::Project(projector) => projector.execute(rows),
            OutputStage::Reduce(aggregator) => aggregator.execute(rows),
        }
    }
}

/// A compiled query. Read-only, and reusable across executions.
#[derive(Debug)]
pub struct QueryPlan {
    query: Query,
    inputs: Inputs,
    output: OutputStage,
    output_columns: Vec<String>,
    output_types: Vec<DataType>,
}

impl QueryPlan {
    /// Returns the resolved query, every column qualified by a table tag.
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Returns the number of inputs the plan reads.
    pub fn input_count(&self) -> usize {
        self.inputs.arity()
    }

    /// Returns the output column names.
    pub fn output_columns(&self) -> &[String] {
        &self.output_columns
    }

    /// Returns the type of each output column, aligned with `output_columns`.
    ///
    /// COUNT and integer SUM yield `Int64`. Float SUM and AVG yield `Float64`,
    /// though AVG of no rows is `Null`.
    pub fn output_types(&self) -> &[DataType] {
        &self.output_types
    }

    /// Returns the join strategy of a two-table plan.
    pub fn join_strategy(&self) -> Option<&JoinStrategy> {
        match &self.inputs {
            Inputs::Join(join) => Some(&join.strategy),
            Inputs::Single { .. } => None,
        }
    }

    /// Executes a one-table plan.
    pub fn execute<'a>(&self, input: Relation<'a>) -> Result<QueryRows<'a>> {
        let filter = match &self.inputs {
            Inputs::Single { filter } => filter,
            Inputs::Join(_) => {
                return Err(QueryError::InputArity {
                    expected: 2,
                    actual: 1,
                })
            }
        };
        let rows = input.filter(Rc::clone(filter)).into_rows();
        Ok(QueryRows::new(self.output.execute(rows)))
    }

    /// Executes a two-table plan. `left` and `right` follow FROM order.
    pub fn execute_join<'a>(&self, left: Relation<'a>, right: Relation<'a>) -> Result<QueryRows<'a>> {
        let join = match &self.inputs {
            Inputs::Join(join) => join,
            Inputs::Single { .. } => {
                return Err(QueryError::InputArity {
                    expected: 1,
                    actual: 2,
                })
            }
        };
        let left = left.filter(Rc::clone(&join.left_filter));
        let right = right.filter(Rc::clone(&join.right_filter));
        let rows = join.strategy.execute(left, right);
        let rows = FilterExecutor::new(Rc::clone(&join.residual)).execute(rows);
        Ok(QueryRows::new(self.output.execute(rows)))
    }

    /// Describes the plan, one stage per line.
    pub fn explain(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_explain(&mut out);
        out
    }

    fn write_explain(&self, out: &mut String) -> core::fmt::Result {
        let names: Vec<&str> = self.query.tables.iter().map(|t| t.name.as_str()).collect();
        match &self.inputs {
            Inputs::Single { filter } => {
                writeln!(out, "scan {} where {}", names.join(", "), filter)?;
            }
            Inputs::Join(join) => {
                writeln!(out, "scan {} where {}", names.first().unwrap_or(&""), join.left_filter)?;
                writeln!(out, "scan {} where {}", names.get(1).unwrap_or(&""), join.right_filter)?;
                writeln!(out, "{}", join.strategy)?;
                if !join.residual.is_trivial() {
                    writeln!(out, "filter {}", join.residual)?;
                }
            }
        }
        let stage = match &self.output {
            OutputStage::Identity => String::from("output *"),
            OutputStage::Project(_) => format!("project {}", self.output_columns.join(", ")),
            OutputStage::Reduce(aggregator) if aggregator.is_grouped() => {
                format!("aggregate {} by group", self.output_columns.join(", "))
            }
            OutputStage::Reduce(_) => format!("aggregate {}", self.output_columns.join(", ")),
        };
        writeln!(out, "{}", stage)
    }
}

/// Lazy result rows of one plan execution.
pub struct QueryRows<'a> {
    rows: Rows<'a>,
}

impl<'a> QueryRows<'a> {
    fn new(rows: Rows<'a>) -> Self {
        Self { rows }
    }
}

impl Iterator for QueryRows<'_> {
    type Item = Tuple;

    #[inline]
    fn next(&mut self) -> Option<Tuple> {
        self.rows.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::QueryLimits;
    use alloc::vec;
    use quarry_core::schema::SchemaBuilder;
    use quarry_core::Value;

    fn point() -> Schema {
        SchemaBuilder::new("Point")
            .unwrap()
            .field("x", DataType::Int32)
            .unwrap()
            .field("y", DataType::Int32)
            .unwrap()
            .field("name", DataType::String)
            .unwrap()
            .build()
            .unwrap()
    }

    fn tag() -> Schema {
        SchemaBuilder::new("Tag")
            .unwrap()
            .field("name", DataType::String)
            .unwrap()
            .field("weight", DataType::Float64)
            .unwrap()
            .build()
            .unwrap()
    }

    fn points() -> Vec<Tuple> {
        [(1, 1, "a"), (2, 1, "b"), (1, 3, "c")]
            .iter()
            .map(|(x, y, n)| Tuple::new(vec![Value::Int32(*x), Value::Int32(*y), Value::String((*n).into())]))
            .collect()
    }

    fn tags() -> Vec<Tuple> {
        [("a", 0.5), ("c", 2.0), ("c", 4.0)]
            .iter()
            .map(|(n, w)| Tuple::new(vec![Value::String((*n).into()), Value::Float64(*w)]))
            .collect()
    }

    #[test]
    fn test_select_all_is_identity() {
        let plan = QueryPlanner::new().compile("SELECT * FROM Point", &[point()]).unwrap();
        let data = points();
        let rows: Vec<Tuple> = plan.execute(Relation::from_tuples(&data)).unwrap().collect();
        assert_eq!(rows, data);
        assert_eq!(plan.output_columns(), &["x", "y", "name"]);
        assert_eq!(plan.output_types(), &[DataType::Int32, DataType::Int32, DataType::String]);
    }

    #[test]
    fn test_filter_and_group() {
        let plan = QueryPlanner::new()
            .compile("SELECT name, SUM(y) FROM Point WHERE y > 1 GROUP BY name", &[point()])
            .unwrap();
        let data = points();
        let rows: Vec<Tuple> = plan.execute(Relation::from_tuples(&data)).unwrap().collect();
        assert_eq!(rows, vec![Tuple::new(vec![Value::String("c".into()), Value::Int64(3)])]);
        assert_eq!(plan.output_columns(), &["name", "SUM(y)"]);
        assert_eq!(plan.output_types(), &[DataType::String, DataType::Int64]);
    }

    #[test]
    fn test_output_types_follow_aggregates() {
        let plan = QueryPlanner::new()
            .compile("SELECT COUNT(*), SUM(t.weight), AVG(p.x), MAX(p.y), t.name FROM Point AS p, Tag AS t", &[point(), tag()])
            .unwrap();
        assert_eq!(
            plan.output_types(),
            &[DataType::Int64, DataType::Float64, DataType::Float64, DataType::Int32, DataType::String]
        );
        let plan = QueryPlanner::new()
            .compile("SELECT name, x FROM Point WHERE y > 1", &[point()])
            .unwrap();
        assert_eq!(plan.output_types(), &[DataType::String, DataType::Int32]);
    }

    #[test]
    fn test_join_with_pushdown() {
        let plan = QueryPlanner::new()
            .compile(
                "SELECT p.name, t.weight FROM Point AS p, Tag AS t ON p.name = t.name WHERE p.y > 1 AND t.weight < 3",
                &[point(), tag()],
            )
            .unwrap();
        assert!(plan.join_strategy().is_some_and(JoinStrategy::is_hash));
        let (p, t) = (points(), tags());
        let rows: Vec<Tuple> = plan
            .execute_join(Relation::from_tuples(&p), Relation::from_tuples(&t))
            .unwrap()
            .collect();
        assert_eq!(rows, vec![Tuple::new(vec![Value::String("c".into()), Value::Float64(2.0)])]);
    }

    #[test]
    fn test_mixed_where_runs_after_join() {
        let plan = QueryPlanner::new()
            .compile(
                "SELECT COUNT(*) FROM Point, Tag ON Point.name = Tag.name WHERE Point.y = 3 OR Tag.weight < 1",
                &[point(), tag()],
            )
            .unwrap();
        let explain = plan.explain();
        assert!(explain.contains("filter"), "{}", explain);
        let (p, t) = (points(), tags());
        let rows: Vec<Tuple> = plan
            .execute_join(Relation::from_stream(p), Relation::from_stream(t))
            .unwrap()
            .collect();
        // (a, 0.5) via weight < 1, (c, 2.0) and (c, 4.0) via y = 3.
        assert_eq!(rows, vec![Tuple::new(vec![Value::Int64(3)])]);
    }

    #[test]
    fn test_cnf_cap_falls_back_to_dnf() {
        let sql = "SELECT * FROM Point, Tag WHERE Point.x = 1 AND Tag.weight > 1 OR Point.y = 3 AND Tag.weight < 1";
        let capped = QueryPlanner::with_limits(QueryLimits::default().with_max_cnf_clauses(2))
            .compile(sql, &[point(), tag()])
            .unwrap();
        let uncapped = QueryPlanner::new().compile(sql, &[point(), tag()]).unwrap();
        let (p, t) = (points(), tags());
        let mut a: Vec<Tuple> = capped
            .execute_join(Relation::from_tuples(&p), Relation::from_tuples(&t))
            .unwrap()
            .collect();
        let mut b: Vec<Tuple> = uncapped
            .execute_join(Relation::from_tuples(&p), Relation::from_tuples(&t))
            .unwrap()
            .collect();
        a.sort();
        b.sort();
        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn test_wrong_arity() {
        let single = QueryPlanner::new().compile("SELECT x FROM Point", &[point()]).unwrap();
        let data = points();
        assert_eq!(
            single
                .execute_join(Relation::from_tuples(&data), Relation::from_tuples(&data))
                .err(),
            Some(QueryError::InputArity {
                expected: 1,
                actual: 2
            })
        );
        let join = QueryPlanner::new()
            .compile("SELECT * FROM Point, Tag", &[point(), tag()])
            .unwrap();
        assert_eq!(
            join.execute(Relation::from_tuples(&data)).err(),
            Some(QueryError::InputArity {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_unsupported_aggregate() {
        let err = QueryPlanner::new()
            .compile("SELECT SUM(name) FROM Point", &[point()])
            .unwrap_err();
        assert!(matches!(err, QueryError::UnsupportedAggregate { .. }));
    }

    #[test]
    fn test_explain_single_table() {
        let plan = QueryPlanner::new()
            .compile("SELECT x, COUNT(*) FROM Point GROUP BY x", &[point()])
            .unwrap();
        let explain = plan.explain();
        assert!(explain.starts_with("scan Point where TRUE"), "{}", explain);
        assert!(explain.contains("aggregate x, COUNT(*) by group"), "{}", explain);
    }
}
