//! The operator tokens a filter accepts, and the conditions they
//! produce.
//!
//! An incoming filter value names an operator and carries a raw
//! operand. [`Operator::instantiate`] parses that operand into a
//! [`Condition`], which can then be applied to any
//! [`QueryBuilder`](crate::query::QueryBuilder) without further
//! checking. The tokens are:
//!
//! [`Operator`]            | Token      | Clause
//! ------------------------|------------|---------------------------
//! [`Eq`](Operator::Eq)    | `=`        | `column = value`
//! [`Gt`](Operator::Gt)    | `>`        | `column > value`
//! [`Lt`](Operator::Lt)    | `<`        | `column < value`
//! [`Ge`](Operator::Ge)    | `>=`       | `column >= value`
//! [`Le`](Operator::Le)    | `<=`       | `column <= value`
//! [`Ne`](Operator::Ne)    | `<>`       | `column <> value`
//! [`Between`](Operator::Between) | `between` | `column BETWEEN lo AND hi`
//! [`In`](Operator::In)    | `in`       | `column IN (a, b, ...)`
//! [`Null`](Operator::Null) | `null`    | `column IS NULL`
//! [`NotNull`](Operator::NotNull) | `not_null` | `column IS NOT NULL`
//! [`Contains`](Operator::Contains) | `contains` | `column LIKE '%value%'`

use std::fmt;

use strum::{Display, EnumIter, EnumString};
use thiserror::Error;

use crate::query::QueryBuilder;

/// Problems with an operand that a well-formed operator rejects.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OperandError {
    #[error("'between' expects exactly two comma separated bounds, got {0}")]
    BetweenBounds(usize),
    #[error("operator '{0}' needs a value")]
    MissingValue(Operator),
}

/// One of the supported operator tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
pub enum Operator {
    #[strum(to_string = "=")]
    Eq,
    #[strum(to_string = ">")]
    Gt,
    #[strum(to_string = "<")]
    Lt,
    #[strum(to_string = ">=")]
    Ge,
    #[strum(to_string = "<=")]
    Le,
    #[strum(to_string = "<>")]
    Ne,
    #[strum(to_string = "between")]
    Between,
    #[strum(to_string = "in")]
    In,
    #[strum(to_string = "null")]
    Null,
    #[strum(to_string = "not_null")]
    NotNull,
    #[strum(to_string = "contains")]
    Contains,
}

impl Operator {
    /// Parse `rhs` into the [`Condition`] this operator describes.
    ///
    /// A `None` operand means the request carried an explicit null.
    /// `null` and `not_null` ignore the operand entirely; `=` and `<>`
    /// against null become null checks, as SQL comparisons with null
    /// never match.
    pub fn instantiate(&self, rhs: Option<&str>) -> Result<Condition, OperandError> {
        let compare = |cmp: Comparison| match rhs {
            Some(v) => Ok(Condition::Compare(cmp, v.to_string())),
            None => match cmp {
                Comparison::Eq => Ok(Condition::Null),
                Comparison::Ne => Ok(Condition::NotNull),
                _ => Err(OperandError::MissingValue(*self)),
            },
        };

        match self {
            Operator::Eq => compare(Comparison::Eq),
            Operator::Gt => compare(Comparison::Gt),
            Operator::Lt => compare(Comparison::Lt),
            Operator::Ge => compare(Comparison::Ge),
            Operator::Le => compare(Comparison::Le),
            Operator::Ne => compare(Comparison::Ne),
            Operator::Between => {
                let mut bounds = split_values(rhs);
                if bounds.len() != 2 {
                    return Err(OperandError::BetweenBounds(bounds.len()));
                }
                let hi = bounds.pop().unwrap_or_default();
                let lo = bounds.pop().unwrap_or_default();
                Ok(Condition::Between(lo, hi))
            }
            Operator::In => Ok(Condition::In(split_values(rhs))),
            Operator::Null => Ok(Condition::Null),
            Operator::NotNull => Ok(Condition::NotNull),
            Operator::Contains => rhs
                .map(|v| Condition::Contains(v.to_string()))
                .ok_or(OperandError::MissingValue(*self)),
        }
    }
}

/// A binary comparison between a column and a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Eq,
    Gt,
    Lt,
    Ge,
    Le,
    Ne,
}

impl Comparison {
    /// The SQL spelling of this comparison.
    pub fn as_sql(&self) -> &'static str {
        match self {
            Comparison::Eq => "=",
            Comparison::Gt => ">",
            Comparison::Lt => "<",
            Comparison::Ge => ">=",
            Comparison::Le => "<=",
            Comparison::Ne => "<>",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A validated filter, ready to be applied to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Compare(Comparison, String),
    Between(String, String),
    In(Vec<String>),
    Null,
    NotNull,
    Contains(String),
}

impl Condition {
    /// Add exactly one predicate on `column` to `query`.
    pub fn apply_to<'q, Q: QueryBuilder>(&self, query: &'q mut Q, column: &str) -> &'q mut Q {
        match self {
            Condition::Compare(cmp, value) => query.where_(column, *cmp, value),
            Condition::Between(lo, hi) => query.where_between(column, [lo.as_str(), hi.as_str()]),
            Condition::In(values) => query.where_in(column, values),
            Condition::Null => query.where_null(column),
            Condition::NotNull => query.where_not_null(column),
            Condition::Contains(needle) => query.where_like(column, &format!("%{}%", needle)),
        }
    }
}

/// Split a raw operand on commas.
///
/// No trimming is done, so `"a, b"` yields `"a"` and `" b"`. The empty
/// string yields a single empty token, and a null operand yields no
/// tokens at all.
pub fn split_values(rhs: Option<&str>) -> Vec<String> {
    match rhs {
        Some(v) => v.split(',').map(str::to_string).collect(),
        None => Vec::new(),
    }
}
