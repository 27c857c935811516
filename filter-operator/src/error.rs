use strum::IntoEnumIterator;
use thiserror::Error;

use crate::operators::Operator;

/// Errors produced when validating or applying a filter.
///
/// Every variant is a problem with the incoming request, never a
/// transient condition, so none of them are worth retrying. The
/// [`status`](FilterError::status) method gives the HTTP status a
/// server should answer with.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    /// The value is not an object, is missing a key, or carries an
    /// operand the operator cannot use.
    #[error("malformed filter '{filter}': {reason}")]
    Malformed { filter: String, reason: String },
    /// The operator is not one of the supported tokens.
    #[error("bad filter operator '{operator}' for filter '{filter}', operator can be one of {}", allowed_operators())]
    UnsupportedOperator { filter: String, operator: String },
    /// A relationship filter was declared without an owning entity.
    #[error("filter '{filter}' targets a relationship but has no owning entity")]
    MissingOwner { filter: String },
    /// The owning entity does not declare the named relationship.
    #[error("filter '{filter}' refers to unknown relationship '{relation}'")]
    UnknownRelation { filter: String, relation: String },
    /// The column passes through more than one relationship.
    #[error("filter '{filter}' doesn't support relationships of relationships ('{column}')")]
    UnsupportedRelationDepth { filter: String, column: String },
    /// No filter is registered under this key.
    #[error("no such filter '{0}'")]
    UnknownFilter(String),
}

impl FilterError {
    /// The HTTP status class for this error: 422 when the request is
    /// well formed but names something that does not exist on the
    /// resource, 400 otherwise.
    pub fn status(&self) -> u16 {
        match self {
            FilterError::MissingOwner { .. } | FilterError::UnknownRelation { .. } => 422,
            _ => 400,
        }
    }

    pub(crate) fn malformed(filter: &str, reason: impl Into<String>) -> Self {
        FilterError::Malformed {
            filter: filter.to_string(),
            reason: reason.into(),
        }
    }
}

fn allowed_operators() -> String {
    Operator::iter()
        .map(|op| op.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_operator_lists_allowed_set() {
        let e = FilterError::UnsupportedOperator {
            filter: "age".to_string(),
            operator: "like".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "bad filter operator 'like' for filter 'age', operator can be one of \
             =, >, <, >=, <=, <>, between, in, null, not_null, contains"
        );
        assert_eq!(e.status(), 400);
    }

    #[test]
    fn relation_errors_are_unprocessable() {
        let e = FilterError::UnknownRelation {
            filter: "author.name".to_string(),
            relation: "author".to_string(),
        };
        assert_eq!(e.status(), 422);
        let e = FilterError::MissingOwner {
            filter: "author.name".to_string(),
        };
        assert_eq!(e.status(), 422);
        let e = FilterError::UnsupportedRelationDepth {
            filter: "a.b.c".to_string(),
            column: "a.b.c".to_string(),
        };
        assert_eq!(e.status(), 400);
    }
}
