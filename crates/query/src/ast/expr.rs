//! Column, table and literal AST definitions.

use alloc::format;
use alloc::string::{String, ToString};
use core::fmt;
use quarry_core::{DataType, Value};

/// The table part of a qualified column reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TableQualifier {
    /// A table name or alias as written in the query.
    Name(String),
    /// Canonical position of the table in the FROM list, assigned by resolution.
    Tag(usize),
}

impl fmt::Display for TableQualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableQualifier::Name(name) => f.write_str(name),
            TableQualifier::Tag(tag) => write!(f, "{}", tag),
        }
    }
}

/// Reference to a column, optionally qualified by its table.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    /// Table qualifier, `None` until resolved if the query left it out.
    pub table: Option<TableQualifier>,
    /// Column name. Empty for the `*` of `COUNT(*)`.
    pub column: String,
}

impl ColumnRef {
    /// Creates an unqualified column reference.
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            table: None,
            column: column.into(),
        }
    }

    /// Creates a column reference qualified by a table name or alias.
    pub fn qualified(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: Some(TableQualifier::Name(table.into())),
            column: column.into(),
        }
    }

    /// Creates a column reference bound to a table position.
    pub fn tagged(tag: usize, column: impl Into<String>) -> Self {
        Self {
            table: Some(TableQualifier::Tag(tag)),
            column: column.into(),
        }
    }

    /// The `*` placeholder of `COUNT(*)`.
    pub fn star() -> Self {
        Self::new("")
    }

    /// Returns true for the `*` placeholder.
    #[inline]
    pub fn is_star(&self) -> bool {
        self.column.is_empty()
    }

    /// Returns the table position once resolved.
    pub fn tag(&self) -> Option<usize> {
        match self.table {
            Some(TableQualifier::Tag(tag)) => Some(tag),
            _ => None,
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_star() {
            return f.write_str("*");
        }
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.column),
            None => f.write_str(&self.column),
        }
    }
}

/// Aggregate functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum AggregateFunc {
    /// Plain column, no reduction.
    #[default]
    None,
    Count,
    Sum,
    Max,
    Min,
    Avg,
}

impl AggregateFunc {
    /// Returns the SQL keyword of this function.
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunc::None => "",
            AggregateFunc::Count => "COUNT",
            AggregateFunc::Sum => "SUM",
            AggregateFunc::Max => "MAX",
            AggregateFunc::Min => "MIN",
            AggregateFunc::Avg => "AVG",
        }
    }

    /// Returns true for every function that reduces rows.
    #[inline]
    pub fn is_aggregate(&self) -> bool {
        !matches!(self, AggregateFunc::None)
    }
}

impl fmt::Display for AggregateFunc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateFunc::None => f.write_str("NONE"),
            other => f.write_str(other.name()),
        }
    }
}

/// One entry of the SELECT list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultColumn {
    /// Source column.
    pub column: ColumnRef,
    /// Output alias.
    pub alias: Option<String>,
    /// Aggregate applied to the column.
    pub aggregate: AggregateFunc,
}

impl ResultColumn {
    /// Creates a plain result column.
    pub fn new(column: ColumnRef) -> Self {
        Self {
            column,
            alias: None,
            aggregate: AggregateFunc::None,
        }
    }

    /// Creates an aggregated result column.
    pub fn aggregate(aggregate: AggregateFunc, column: ColumnRef) -> Self {
        Self {
            column,
            alias: None,
            aggregate,
        }
    }

    /// Creates `COUNT(*)`.
    pub fn count_star() -> Self {
        Self::aggregate(AggregateFunc::Count, ColumnRef::star())
    }

    /// Sets the output alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Returns the alias, or the column text as written.
    pub fn output_name(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        match self.aggregate {
            AggregateFunc::None => self.column.column.clone(),
            func => format!("{}({})", func.name(), self.column.column_text()),
        }
    }
}

impl ColumnRef {
    fn column_text(&self) -> String {
        if self.is_star() {
            "*".to_string()
        } else {
            self.column.clone()
        }
    }
}

impl fmt::Display for ResultColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.aggregate {
            AggregateFunc::None => write!(f, "{}", self.column)?,
            func => write!(f, "{}({})", func.name(), self.column)?,
        }
        if let Some(alias) = &self.alias {
            write!(f, " AS {}", alias)?;
        }
        Ok(())
    }
}

/// A table in the FROM list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableRef {
    /// Table (schema) name.
    pub name: String,
    /// Alias declared after the name.
    pub alias: Option<String>,
}

impl TableRef {
    /// Creates a table reference without alias.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    /// Sets the alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Returns true if `qualifier` names this table by alias or by name.
    pub fn answers_to(&self, qualifier: &str) -> bool {
        self.name == qualifier || self.alias.as_deref() == Some(qualifier)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            Some(alias) => write!(f, "{} AS {}", self.name, alias),
            None => f.write_str(&self.name),
        }
    }
}

/// A constant in a WHERE comparison.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    String(String),
}

impl Literal {
    /// Returns the type the literal is compared as.
    pub fn data_type(&self) -> DataType {
        match self {
            Literal::Integer(_) => DataType::Int64,
            Literal::Float(_) => DataType::Float64,
            Literal::String(_) => DataType::String,
        }
    }

    /// Converts the literal to a runtime value.
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Integer(v) => Value::Int64(*v),
            Literal::Float(v) => Value::Float64(*v),
            Literal::String(v) => Value::String(v.clone()),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Integer(v) => write!(f, "{}", v),
            Literal::Float(v) => write!(f, "{:?}", v),
            Literal::String(v) if v.contains('\'') => write!(f, "\"{}\"", v),
            Literal::String(v) => write!(f, "'{}'", v),
        }
    }
}
