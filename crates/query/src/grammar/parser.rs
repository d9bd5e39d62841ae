//! Recursive-descent parser for the SELECT subset.
//!
//! ```text
//! query      := SELECT columns FROM table [, table [ON condition]]
//!               [WHERE condition] [GROUP BY colref {, colref}]
//! columns    := '*' | item {, item}
//! item       := (COUNT '(' '*' ')' | agg '(' colref ')' | colref) [[AS] name]
//! table      := name [[AS] name]
//! condition  := factors {OR factors}
//! factors    := factor {AND factor}
//! factor     := {NOT} operand op operand
//! colref     := name ['.' name]
//! name       := identifier | quoted string
//! ```
//!
//! Conditions are parsed directly into disjunctive normal form. WHERE
//! comparisons are one-sided and normalized so that the column is on the left;
//! ON comparisons compare two columns.

use super::lexer::{tokenize, Keyword, Token, TokenKind};
use crate::ast::{
    AggregateFunc, ColumnRef, CompOp, Comparison, Conjunction, Disjunction, Literal, Query,
    ResultColumn, TableRef,
};
use crate::context::MAX_TABLES;
use crate::error::{QueryError, Result};
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Parses a query.
pub fn parse(sql: &str) -> Result<Query> {
    let tokens = tokenize(sql)?;
    Parser::new(tokens).parse_query()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ConditionKind {
    /// WHERE: column op literal.
    OneSided,
    /// ON: column op column.
    TwoSided,
}

/// One side of a comparison before it is classified.
enum RawOperand {
    Column(ColumnRef),
    Number(Literal),
    /// A bare quoted string: a column name or a string literal.
    Quoted(String),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn peek_at(&self, offset: usize) -> &TokenKind {
        &self.tokens[(self.pos + offset).min(self.tokens.len() - 1)].kind
    }

    fn position(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].position
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        kind
    }

    fn error(&self, expected: &str) -> QueryError {
        QueryError::syntax(self.position(), self.peek().to_string(), expected)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.peek() == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: Keyword) -> bool {
        self.eat(&TokenKind::Keyword(kw))
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<()> {
        if self.eat(&kind) {
            Ok(())
        } else {
            Err(self.error(expected))
        }
    }

    fn parse_query(&mut self) -> Result<Query> {
        self.expect(TokenKind::Keyword(Keyword::Select), "SELECT")?;
        let columns = self.parse_columns()?;
        self.expect(TokenKind::Keyword(Keyword::From), "FROM")?;
        let tables = self.parse_tables()?;

        let mut query = Query {
            columns,
            tables,
            ..Query::default()
        };

        if query.tables.len() == 2 && self.eat_keyword(Keyword::On) {
            query.join_condition = self.parse_condition(ConditionKind::TwoSided)?;
        }
        if self.eat_keyword(Keyword::Where) {
            query.where_condition = self.parse_condition(ConditionKind::OneSided)?;
        }
        if self.eat_keyword(Keyword::Group) {
            self.expect(TokenKind::Keyword(Keyword::By), "BY")?;
            query.group_by.push(self.parse_column_ref()?);
            while self.eat(&TokenKind::Comma) {
                query.group_by.push(self.parse_column_ref()?);
            }
        }
        self.expect(TokenKind::Eof, "end of query")?;
        Ok(query)
    }

    fn parse_columns(&mut self) -> Result<Vec<ResultColumn>> {
        if self.eat(&TokenKind::Star) {
            return Ok(Vec::new());
        }
        let mut columns = Vec::new();
        loop {
            columns.push(self.parse_result_column()?);
            if !self.eat(&TokenKind::Comma) {
                return Ok(columns);
            }
        }
    }

    fn parse_result_column(&mut self) -> Result<ResultColumn> {
        let func = match self.peek() {
            TokenKind::Keyword(Keyword::Count) => AggregateFunc::Count,
            TokenKind::Keyword(Keyword::Sum) => AggregateFunc::Sum,
            TokenKind::Keyword(Keyword::Max) => AggregateFunc::Max,
            TokenKind::Keyword(Keyword::Min) => AggregateFunc::Min,
            TokenKind::Keyword(Keyword::Avg) => AggregateFunc::Avg,
            _ => AggregateFunc::None,
        };

        let mut column = if func.is_aggregate() {
            self.advance();
            self.expect(TokenKind::LParen, "'('")?;
            let column = if func == AggregateFunc::Count && self.eat(&TokenKind::Star) {
                ResultColumn::count_star()
            } else {
                ResultColumn::aggregate(func, self.parse_column_ref()?)
            };
            self.expect(TokenKind::RParen, "')'")?;
            column
        } else {
            ResultColumn::new(self.parse_column_ref()?)
        };

        column.alias = self.parse_alias()?;
        Ok(column)
    }

    /// Parses `AS name` or a juxtaposed name.
    fn parse_alias(&mut self) -> Result<Option<String>> {
        if self.eat_keyword(Keyword::As) {
            return self.parse_name().map(Some);
        }
        match self.peek() {
            TokenKind::Identifier(_) | TokenKind::Quoted(_) => self.parse_name().map(Some),
            _ => Ok(None),
        }
    }

    fn parse_name(&mut self) -> Result<String> {
        match self.peek().clone() {
            TokenKind::Quoted(name) if name.is_empty() => Err(self.error("a non-empty name")),
            TokenKind::Identifier(name) | TokenKind::Quoted(name) => {
                self.advance();
                Ok(name)
            }
            _ => Err(self.error("a name")),
        }
    }

    fn parse_column_ref(&mut self) -> Result<ColumnRef> {
        let first = self.parse_name()?;
        if self.eat(&TokenKind::Dot) {
            let column = self.parse_name()?;
            Ok(ColumnRef::qualified(first, column))
        } else {
            Ok(ColumnRef::new(first))
        }
    }

    fn parse_tables(&mut self) -> Result<Vec<TableRef>> {
        let mut tables = Vec::new();
        loop {
            let name = self.parse_name()?;
            let alias = self.parse_alias()?;
            tables.push(TableRef { name, alias });
            if !self.eat(&TokenKind::Comma) {
                break;
            }
        }
        if tables.len() > MAX_TABLES {
            return Err(QueryError::capacity("tables", MAX_TABLES, tables.len()));
        }
        Ok(tables)
    }

    fn parse_condition(&mut self, kind: ConditionKind) -> Result<Disjunction> {
        let mut terms = Vec::new();
        loop {
            terms.push(self.parse_conjunction(kind)?);
            if !self.eat_keyword(Keyword::Or) {
                return Ok(Disjunction::new(terms));
            }
        }
    }

    fn parse_conjunction(&mut self, kind: ConditionKind) -> Result<Conjunction> {
        let mut terms = Vec::new();
        loop {
            terms.push(self.parse_factor(kind)?);
            if !self.eat_keyword(Keyword::And) {
                return Ok(Conjunction::new(terms));
            }
        }
    }

    fn parse_factor(&mut self, kind: ConditionKind) -> Result<Comparison> {
        let mut negated = false;
        while self.eat_keyword(Keyword::Not) {
            negated = !negated;
        }
        let comparison = self.parse_comparison(kind)?;
        Ok(if negated {
            comparison.negate()
        } else {
            comparison
        })
    }

    fn parse_comparison(&mut self, kind: ConditionKind) -> Result<Comparison> {
        let left_pos = self.position();
        let left = self.parse_operand()?;
        let op = self.parse_comp_op()?;
        let right_pos = self.position();
        let right = self.parse_operand()?;

        match kind {
            ConditionKind::TwoSided => {
                let left = Self::as_column(left)
                    .ok_or_else(|| QueryError::syntax(left_pos, "a literal", "a column"))?;
                let right = Self::as_column(right)
                    .ok_or_else(|| QueryError::syntax(right_pos, "a literal", "a column"))?;
                Ok(Comparison::with_column(left, op, right))
            }
            ConditionKind::OneSided => {
                let (column, op, literal) = match (left, right) {
                    (RawOperand::Column(col), RawOperand::Number(lit)) => (col, op, lit),
                    (RawOperand::Column(col), RawOperand::Quoted(text)) => {
                        (col, op, Literal::String(text))
                    }
                    (RawOperand::Quoted(name), RawOperand::Number(lit)) => {
                        (ColumnRef::new(name), op, lit)
                    }
                    (RawOperand::Quoted(name), RawOperand::Quoted(text)) => {
                        (ColumnRef::new(name), op, Literal::String(text))
                    }
                    (RawOperand::Number(lit), RawOperand::Column(col)) => (col, op.invert(), lit),
                    (RawOperand::Number(lit), RawOperand::Quoted(name)) => {
                        (ColumnRef::new(name), op.invert(), lit)
                    }
                    (RawOperand::Quoted(text), RawOperand::Column(col)) => {
                        (col, op.invert(), Literal::String(text))
                    }
                    (RawOperand::Column(_), RawOperand::Column(_)) => {
                        return Err(QueryError::syntax(right_pos, "a column", "a literal"))
                    }
                    (RawOperand::Number(_), RawOperand::Number(_)) => {
                        return Err(QueryError::syntax(right_pos, "a literal", "a column"))
                    }
                };
                Ok(Comparison::with_literal(column, op, literal))
            }
        }
    }

    fn parse_operand(&mut self) -> Result<RawOperand> {
        match self.peek() {
            TokenKind::Plus | TokenKind::Minus | TokenKind::Integer(_) | TokenKind::Float(_) => {
                self.parse_number().map(RawOperand::Number)
            }
            TokenKind::Quoted(text) if self.peek_at(1) != &TokenKind::Dot => {
                let text = text.clone();
                self.advance();
                Ok(RawOperand::Quoted(text))
            }
            TokenKind::Identifier(_) | TokenKind::Quoted(_) => {
                self.parse_column_ref().map(RawOperand::Column)
            }
            _ => Err(self.error("a column or literal")),
        }
    }

    fn parse_number(&mut self) -> Result<Literal> {
        let position = self.position();
        let negative = match self.peek() {
            TokenKind::Minus => {
                self.advance();
                true
            }
            TokenKind::Plus => {
                self.advance();
                false
            }
            _ => false,
        };
        match self.advance() {
            TokenKind::Integer(v) => {
                let signed = if negative { -(v as i128) } else { v as i128 };
                i64::try_from(signed)
                    .map(Literal::Integer)
                    .map_err(|_| QueryError::syntax(position, v.to_string(), "an integer in range"))
            }
            TokenKind::Float(v) => Ok(Literal::Float(if negative { -v } else { v })),
            other => Err(QueryError::syntax(self.position(), other.to_string(), "a number")),
        }
    }

    fn parse_comp_op(&mut self) -> Result<CompOp> {
        let op = match self.peek() {
            TokenKind::Eq => CompOp::Eq,
            TokenKind::Ne => CompOp::Ne,
            TokenKind::Lt => CompOp::Lt,
            TokenKind::Le => CompOp::Le,
            TokenKind::Gt => CompOp::Gt,
            TokenKind::Ge => CompOp::Ge,
            _ => return Err(self.error("a comparison operator")),
        };
        self.advance();
        Ok(op)
    }

    fn as_column(operand: RawOperand) -> Option<ColumnRef> {
        match operand {
            RawOperand::Column(col) => Some(col),
            RawOperand::Quoted(name) => Some(ColumnRef::new(name)),
            RawOperand::Number(_) => None,
        }
    }
}
