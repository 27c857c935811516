//! # Operator filters for JSON:API style resources
//!
//! A JSON:API server exposes filters under the `filter` query
//! parameter. An operator filter lets the client choose how the
//! filter compares, by supplying an object rather than a bare value:
//!
//! ```text
//! filter[age][operator]=>=&filter[age][value]=18
//! ```
//!
//! which the host framework decodes into
//! `{"operator": ">=", "value": "18"}` and hands to the filter
//! registered under the key `age`. The filter checks the value and
//! adds exactly one predicate to the query: `age >= '18'`.
//!
//! The filter's column may also name a column of a related table,
//! written `relation.column`. In that case the predicate is wrapped in
//! a single correlated `EXISTS` subquery over the related table, using
//! the join key declared for the relation on the owning [`Entity`].
//! Only one level of relation is supported.
//!
//! ## Overview
//!
//! [`OperatorFilter`] is the filter itself. It is built once when
//! routes are registered and can be shared freely between requests.
//! [`FilterSet`] collects filters by key and applies a whole `filter`
//! object to a query.
//!
//! Example:
//! ```rust
//! use std::sync::Arc;
//!
//! use filter_operator::filtering::OperatorFilter;
//! use filter_operator::query::SqlQuery;
//! use filter_operator::Entity;
//! use serde_json::json;
//!
//! let posts = Arc::new(Entity::new("posts").belongs_to("author", "users", "author_id"));
//!
//! let mut q = SqlQuery::new("posts");
//! OperatorFilter::make("publishedAt")
//!     .apply(&mut q, &json!({"operator": "not_null", "value": null}))
//!     .unwrap();
//! OperatorFilter::make("authorCountry")
//!     .with_column("author.country")
//!     .with_owner(posts)
//!     .apply(&mut q, &json!({"operator": "in", "value": "FR,DE"}))
//!     .unwrap();
//!
//! assert_eq!(
//!     q.to_sql(),
//!     "SELECT * FROM posts WHERE published_at IS NOT NULL AND EXISTS \
//!      (SELECT * FROM users WHERE users.id = posts.author_id AND users.country IN (?, ?))"
//! );
//! ```

use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;

use log::{debug, trace};
use serde_json::Value;

use crate::case::snake_case;
use crate::entity::{Entity, Model, Relation};
use crate::error::FilterError;
use crate::operators::{Condition, Operator};
use crate::query::QueryBuilder;

/// A filter value as supplied by the client.
///
/// `value` is `None` when the client sent an explicit null.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterValue {
    pub operator: String,
    pub value: Option<String>,
}

impl FilterValue {
    pub fn new(operator: &str, value: Option<&str>) -> Self {
        Self {
            operator: operator.to_string(),
            value: value.map(str::to_string),
        }
    }

    /// Decode the value a request supplied for the filter `filter`.
    ///
    /// The value must be an object with both an `operator` and a
    /// `value` key. The operator must be one of the supported tokens,
    /// which is checked before the value's type. The value may be a
    /// string or null; numbers and booleans are taken in their textual
    /// form.
    pub fn from_json(filter: &str, value: &Value) -> Result<Self, FilterError> {
        let map = value.as_object().ok_or_else(|| {
            FilterError::malformed(filter, format!("expecting filter {} to be an object", filter))
        })?;

        let operator = map.get("operator").ok_or_else(|| {
            FilterError::malformed(filter, format!("expecting filter {} to have an operator", filter))
        })?;
        let operator = operator.as_str().ok_or_else(|| {
            FilterError::malformed(filter, "the operator must be a string")
        })?;
        let value = map.get("value").ok_or_else(|| {
            FilterError::malformed(filter, format!("expecting filter {} to have a value", filter))
        })?;
        parse_operator(filter, operator)?;

        let value = match value {
            Value::Null => None,
            Value::String(s) => Some(s.clone()),
            v @ Value::Number(_) | v @ Value::Bool(_) => Some(v.to_string()),
            _ => {
                return Err(FilterError::malformed(
                    filter,
                    "the value must be a string or null",
                ))
            }
        };

        Ok(Self {
            operator: operator.to_string(),
            value,
        })
    }

    /// Parse this value into a [`Condition`], checking the operator
    /// against the supported set and the operand against the operator.
    pub fn condition(&self, filter: &str) -> Result<Condition, FilterError> {
        parse_operator(filter, &self.operator)?
            .instantiate(self.value.as_deref())
            .map_err(|e| FilterError::malformed(filter, e.to_string()))
    }
}

fn parse_operator(filter: &str, operator: &str) -> Result<Operator, FilterError> {
    Operator::from_str(operator).map_err(|_| FilterError::UnsupportedOperator {
        filter: filter.to_string(),
        operator: operator.to_string(),
    })
}

/// Where a filter's column lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnPath<'a> {
    /// A column of the filtered table.
    Direct(&'a str),
    /// A column of the table reached through `relation`.
    Related { relation: &'a str, column: &'a str },
}

impl<'a> ColumnPath<'a> {
    /// Split a column on `.`, returning `None` when it passes through
    /// more than one relation.
    pub fn parse(column: &'a str) -> Option<Self> {
        let mut parts = column.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(column), None, _) => Some(ColumnPath::Direct(column)),
            (Some(relation), Some(column), None) => Some(ColumnPath::Related { relation, column }),
            _ => None,
        }
    }
}

/// Something that can contribute a predicate to a query of type `Q`
/// from a request value.
///
/// This is the interface a registry like [`FilterSet`] works with.
pub trait Filter<Q> {
    /// The key the filter is registered under.
    fn key(&self) -> &str;
    /// Check `value` completely, including anything that depends on
    /// the query's schema, without touching a query.
    fn check(&self, value: &Value) -> Result<(), FilterError>;
    /// Add this filter's predicate for `value` to `query`.
    fn apply(&self, query: &mut Q, value: &Value) -> Result<(), FilterError>;
    /// Whether the filter selects at most one resource.
    fn is_singular(&self) -> bool;
}

enum Target<'f> {
    Column(&'f str),
    Related(&'f Relation, &'f str),
}

/// A filter whose comparison is chosen by the request.
///
/// An [`OperatorFilter`] is identified by its name, which is also its
/// key, and targets a column. By default the column is the snake cased
/// name; a different column can be given with
/// [`with_column`](OperatorFilter::with_column). A column of the form
/// `relation.column` filters through a relation of the owning entity,
/// which must be provided with [`with_owner`](OperatorFilter::with_owner)
/// or [`owned_by`](OperatorFilter::owned_by).
#[derive(Debug, Clone)]
pub struct OperatorFilter {
    name: String,
    column: String,
    owner: Option<Arc<Entity>>,
}

impl OperatorFilter {
    /// Create a filter named `name` on the column `snake_case(name)`.
    pub fn make(name: &str) -> Self {
        Self {
            name: name.to_string(),
            column: snake_case(name),
            owner: None,
        }
    }

    /// Target `column` instead of the column derived from the name.
    pub fn with_column(mut self, column: &str) -> Self {
        self.column = column.to_string();
        self
    }

    /// Resolve relation columns against `owner`.
    pub fn with_owner(mut self, owner: Arc<Entity>) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Resolve relation columns against the entity of model `M`.
    pub fn owned_by<M: Model>(self) -> Self {
        self.with_owner(Arc::new(M::entity()))
    }

    /// The key used to route request values to this filter.
    pub fn key(&self) -> &str {
        &self.name
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn owner(&self) -> Option<&Entity> {
        self.owner.as_deref()
    }

    /// An operator filter never identifies a single resource, so it
    /// can be combined with any other filter.
    pub fn is_singular(&self) -> bool {
        false
    }

    /// Check the shape of `value` and parse it into a [`Condition`].
    ///
    /// This does not look at the column, so a value can be valid even
    /// if applying it would fail on an unknown relation.
    pub fn validate(&self, value: &Value) -> Result<Condition, FilterError> {
        FilterValue::from_json(&self.name, value)?.condition(&self.name)
    }

    /// Add one predicate for `value` to `query`.
    ///
    /// A relation filter must be applied to a query on its owner's
    /// table, since the join key is resolved against that table.
    /// Nothing is added to the query unless every check passes.
    pub fn apply<'q, Q: QueryBuilder>(
        &self,
        query: &'q mut Q,
        value: &Value,
    ) -> Result<&'q mut Q, FilterError> {
        let (target, condition) = match self.plan(value) {
            Ok(plan) => plan,
            Err(e) => {
                debug!("Rejected value {} for filter {}: {}", value, self.name, e);
                return Err(e);
            }
        };

        Ok(match target {
            Target::Column(column) => {
                trace!("Filter {}: {:?} on {}", self.name, condition, column);
                condition.apply_to(query, column)
            }
            Target::Related(relation, column) => {
                trace!(
                    "Filter {}: {:?} on {} through {}",
                    self.name,
                    condition,
                    column,
                    relation.name()
                );
                if let Some(owner) = &self.owner {
                    debug_assert_eq!(
                        query.table(),
                        owner.table(),
                        "filter {} applied to a query on another table",
                        self.name
                    );
                }
                query.where_has(relation, |sub, name| {
                    condition.apply_to(sub, &format!("{}.{}", name, column));
                })
            }
        })
    }

    fn plan(&self, value: &Value) -> Result<(Target<'_>, Condition), FilterError> {
        let path = ColumnPath::parse(&self.column).ok_or_else(|| {
            FilterError::UnsupportedRelationDepth {
                filter: self.name.clone(),
                column: self.column.clone(),
            }
        })?;

        let condition = self.validate(value)?;

        let target = match path {
            ColumnPath::Direct(column) => Target::Column(column),
            ColumnPath::Related { relation: name, column } => {
                let owner = self.owner.as_ref().ok_or_else(|| FilterError::MissingOwner {
                    filter: self.name.clone(),
                })?;
                let relation = owner
                    .relation(name)
                    .ok_or_else(|| FilterError::UnknownRelation {
                        filter: self.name.clone(),
                        relation: name.to_string(),
                    })?;
                Target::Related(relation, column)
            }
        };

        Ok((target, condition))
    }
}

impl<Q: QueryBuilder> Filter<Q> for OperatorFilter {
    fn key(&self) -> &str {
        OperatorFilter::key(self)
    }

    fn check(&self, value: &Value) -> Result<(), FilterError> {
        self.plan(value).map(|_| ())
    }

    fn apply(&self, query: &mut Q, value: &Value) -> Result<(), FilterError> {
        OperatorFilter::apply(self, query, value).map(|_| ())
    }

    fn is_singular(&self) -> bool {
        OperatorFilter::is_singular(self)
    }
}

/// A collection of filters for queries of type `Q`, looked up by key.
///
/// The set is immutable once built and can be shared between
/// requests, for example in an [`Arc`].
pub struct FilterSet<Q> {
    filters: Vec<Box<dyn Filter<Q> + Send + Sync>>,
}

impl<Q> Debug for FilterSet<Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.filters.iter().map(|filter| filter.key()))
            .finish()
    }
}

impl<Q: QueryBuilder> Default for FilterSet<Q> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: QueryBuilder> FilterSet<Q> {
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add `filter`. If a filter with the same key is already present
    /// it is replaced.
    pub fn with<F>(mut self, filter: F) -> Self
    where
        F: Filter<Q> + Send + Sync + 'static,
    {
        self.filters.retain(|f| f.key() != filter.key());
        self.filters.push(Box::new(filter));
        self
    }

    /// Find the filter registered under `key`.
    pub fn get(&self, key: &str) -> Option<&(dyn Filter<Q> + Send + Sync)> {
        self.filters
            .iter()
            .find(|f| f.key() == key)
            .map(|f| &**f)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(|f| f.key())
    }

    /// Apply every filter named in `filters`, an object mapping filter
    /// keys to their values.
    ///
    /// All values are checked before any predicate is added, so on
    /// error `query` is left as it was.
    pub fn apply(&self, query: &mut Q, filters: &Value) -> Result<(), FilterError> {
        let map = filters
            .as_object()
            .ok_or_else(|| FilterError::malformed("filter", "expecting filters to be an object"))?;

        let mut selected = Vec::with_capacity(map.len());
        for (key, value) in map {
            let filter = self
                .get(key)
                .ok_or_else(|| FilterError::UnknownFilter(key.clone()))?;
            filter.check(value)?;
            selected.push((filter, value));
        }

        for (filter, value) in selected {
            filter.apply(query, value)?;
        }
        Ok(())
    }
}
