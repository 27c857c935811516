//! The query builder that filters write into.
//!
//! Filters never execute anything. They add predicates to a
//! [`QueryBuilder`], which is whatever the host application uses to
//! build its database queries. [`SqlQuery`] is a small implementation
//! that records the predicates and renders them as parameterised SQL,
//! which is what the tests and the [`mock`](crate::mock) endpoint use.
//!
//! ```rust
//! use filter_operator::operators::Comparison;
//! use filter_operator::query::{QueryBuilder, SqlQuery};
//!
//! let mut q = SqlQuery::new("people");
//! q.where_("age", Comparison::Ge, "18").where_null("deleted_at");
//! assert_eq!(
//!     q.to_sql(),
//!     "SELECT * FROM people WHERE age >= ? AND deleted_at IS NULL"
//! );
//! assert_eq!(q.bindings(), vec!["18"]);
//! ```

use crate::entity::Relation;
use crate::operators::Comparison;

/// The query operations a filter needs from its host.
///
/// Every method adds one predicate, ANDed with whatever the query
/// already holds, and returns the builder for chaining.
pub trait QueryBuilder: Sized {
    /// The table the query selects from.
    fn table(&self) -> &str;
    /// `column op value`
    fn where_(&mut self, column: &str, op: Comparison, value: &str) -> &mut Self;
    /// `column IN (values...)`
    fn where_in(&mut self, column: &str, values: &[String]) -> &mut Self;
    /// `column BETWEEN lo AND hi`
    fn where_between(&mut self, column: &str, bounds: [&str; 2]) -> &mut Self;
    /// `column IS NULL`
    fn where_null(&mut self, column: &str) -> &mut Self;
    /// `column IS NOT NULL`
    fn where_not_null(&mut self, column: &str) -> &mut Self;
    /// `column LIKE pattern`
    fn where_like(&mut self, column: &str, pattern: &str) -> &mut Self;
    /// Require a row of `relation`'s table, joined on the relation's
    /// key, for which the predicates added by `inner` hold.
    ///
    /// `relation` must be declared on the entity stored in
    /// [`table`](QueryBuilder::table). `inner` is given the subquery and
    /// the name the related table goes by inside it, which is what its
    /// columns must be qualified with. The name differs from the table
    /// when the relation points back at the table being queried.
    ///
    /// Implementations must produce a single correlated existence
    /// check (a semi-join), not one query per outer row.
    fn where_has<F>(&mut self, relation: &Relation, inner: F) -> &mut Self
    where
        F: FnOnce(&mut Self, &str);
}

/// A single predicate recorded by [`SqlQuery`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    Compare {
        column: String,
        op: Comparison,
        value: String,
    },
    In {
        column: String,
        values: Vec<String>,
    },
    Between {
        column: String,
        lo: String,
        hi: String,
    },
    Null(String),
    NotNull(String),
    Like {
        column: String,
        pattern: String,
    },
    /// Two columns compared for equality, used to correlate a subquery.
    ColumnsEqual { left: String, right: String },
    Exists(Box<SqlQuery>),
}

impl Clause {
    fn render(&self, sql: &mut String) {
        match self {
            Clause::Compare { column, op, .. } => {
                sql.push_str(&format!("{} {} ?", column, op));
            }
            Clause::In { values, .. } if values.is_empty() => {
                // IN () is not valid SQL, and nothing is a member of
                // the empty set.
                sql.push_str("0 = 1");
            }
            Clause::In { column, values } => {
                let marks = vec!["?"; values.len()].join(", ");
                sql.push_str(&format!("{} IN ({})", column, marks));
            }
            Clause::Between { column, .. } => {
                sql.push_str(&format!("{} BETWEEN ? AND ?", column));
            }
            Clause::Null(column) => {
                sql.push_str(&format!("{} IS NULL", column));
            }
            Clause::NotNull(column) => {
                sql.push_str(&format!("{} IS NOT NULL", column));
            }
            Clause::Like { column, .. } => {
                sql.push_str(&format!("{} LIKE ?", column));
            }
            Clause::ColumnsEqual { left, right } => {
                sql.push_str(&format!("{} = {}", left, right));
            }
            Clause::Exists(sub) => {
                sql.push_str("EXISTS (");
                sql.push_str(&sub.to_sql());
                sql.push(')');
            }
        }
    }

    fn collect_bindings<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Clause::Compare { value, .. } => out.push(value),
            Clause::In { values, .. } => out.extend(values.iter().map(String::as_str)),
            Clause::Between { lo, hi, .. } => {
                out.push(lo);
                out.push(hi);
            }
            Clause::Like { pattern, .. } => out.push(pattern),
            Clause::Exists(sub) => sub.collect_bindings(out),
            Clause::Null(_) | Clause::NotNull(_) | Clause::ColumnsEqual { .. } => {}
        }
    }
}

/// A `SELECT` over one table with an ANDed list of predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlQuery {
    table: String,
    alias: Option<String>,
    clauses: Vec<Clause>,
}

impl SqlQuery {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            alias: None,
            clauses: Vec::new(),
        }
    }

    /// Select from `table` under the name `alias`.
    pub fn aliased(table: &str, alias: &str) -> Self {
        Self {
            alias: Some(alias.to_string()),
            ..Self::new(table)
        }
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// The name the table is referred to by in predicates.
    pub fn name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    /// The predicates added so far, in order.
    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// The predicates as SQL, without the `SELECT` part.
    pub fn where_sql(&self) -> String {
        let mut sql = String::new();
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                sql.push_str(" AND ");
            }
            clause.render(&mut sql);
        }
        sql
    }

    /// The whole query, with `?` placeholders for every value.
    pub fn to_sql(&self) -> String {
        let mut sql = format!("SELECT * FROM {}", self.table);
        if let Some(alias) = &self.alias {
            sql.push_str(&format!(" AS {}", alias));
        }
        if !self.clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.where_sql());
        }
        sql
    }

    /// The values for the placeholders in [`to_sql`](SqlQuery::to_sql),
    /// in order.
    pub fn bindings(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_bindings(&mut out);
        out
    }

    fn collect_bindings<'a>(&'a self, out: &mut Vec<&'a str>) {
        for clause in &self.clauses {
            clause.collect_bindings(out);
        }
    }

    fn push(&mut self, clause: Clause) -> &mut Self {
        self.clauses.push(clause);
        self
    }
}

impl QueryBuilder for SqlQuery {
    fn table(&self) -> &str {
        &self.table
    }

    fn where_(&mut self, column: &str, op: Comparison, value: &str) -> &mut Self {
        self.push(Clause::Compare {
            column: column.to_string(),
            op,
            value: value.to_string(),
        })
    }

    fn where_in(&mut self, column: &str, values: &[String]) -> &mut Self {
        self.push(Clause::In {
            column: column.to_string(),
            values: values.to_vec(),
        })
    }

    fn where_between(&mut self, column: &str, bounds: [&str; 2]) -> &mut Self {
        self.push(Clause::Between {
            column: column.to_string(),
            lo: bounds[0].to_string(),
            hi: bounds[1].to_string(),
        })
    }

    fn where_null(&mut self, column: &str) -> &mut Self {
        self.push(Clause::Null(column.to_string()))
    }

    fn where_not_null(&mut self, column: &str) -> &mut Self {
        self.push(Clause::NotNull(column.to_string()))
    }

    fn where_like(&mut self, column: &str, pattern: &str) -> &mut Self {
        self.push(Clause::Like {
            column: column.to_string(),
            pattern: pattern.to_string(),
        })
    }

    fn where_has<F>(&mut self, relation: &Relation, inner: F) -> &mut Self
    where
        F: FnOnce(&mut Self, &str),
    {
        let related = relation.related_table();
        let mut sub = if related == self.name() {
            SqlQuery::aliased(related, &format!("{}_1", related))
        } else {
            SqlQuery::new(related)
        };
        let name = sub.name().to_string();
        sub.push(Clause::ColumnsEqual {
            left: format!("{}.{}", name, relation.related_column()),
            right: format!("{}.{}", self.name(), relation.owner_column()),
        });
        inner(&mut sub, &name);
        self.push(Clause::Exists(Box::new(sub)))
    }
}
