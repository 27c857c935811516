//! Relationship metadata for the owners of relationship filters.
//!
//! A filter on `author.country` needs to know which table `author`
//! lives in and how it joins back to the filtered table. That
//! knowledge is declared up front in an [`Entity`], a table of named
//! [`Relation`]s, and looked up by name when a filter is applied.
//!
//! ```rust
//! use filter_operator::Entity;
//!
//! let posts = Entity::new("posts")
//!     .belongs_to("author", "users", "author_id")
//!     .has_many("comments", "comments", "post_id");
//!
//! let author = posts.relation("author").unwrap();
//! assert_eq!(author.related_table(), "users");
//! assert_eq!(author.owner_column(), "author_id");
//! assert_eq!(author.related_column(), "id");
//! assert!(posts.relation("editor").is_none());
//! ```

use std::collections::BTreeMap;

/// How a relation's join key is arranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// The owner holds a foreign key to the related table.
    BelongsTo,
    /// The related table holds a foreign key back to the owner.
    HasMany,
}

/// A declared association from an entity to another table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    name: String,
    related_table: String,
    kind: RelationKind,
    foreign_key: String,
    key: String,
}

impl Relation {
    /// The owner's `foreign_key` column refers to `related_table.id`.
    pub fn belongs_to(name: &str, related_table: &str, foreign_key: &str) -> Self {
        Self::new(RelationKind::BelongsTo, name, related_table, foreign_key)
    }

    /// The related table's `foreign_key` column refers to the owner's
    /// `id`.
    pub fn has_many(name: &str, related_table: &str, foreign_key: &str) -> Self {
        Self::new(RelationKind::HasMany, name, related_table, foreign_key)
    }

    fn new(kind: RelationKind, name: &str, related_table: &str, foreign_key: &str) -> Self {
        Self {
            name: name.to_string(),
            related_table: related_table.to_string(),
            kind,
            foreign_key: foreign_key.to_string(),
            key: "id".to_string(),
        }
    }

    /// Replace the referenced key, which is `id` unless set. For
    /// [`BelongsTo`](RelationKind::BelongsTo) this is the related
    /// table's column, for [`HasMany`](RelationKind::HasMany) the
    /// owner's.
    pub fn with_key(mut self, key: &str) -> Self {
        self.key = key.to_string();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> RelationKind {
        self.kind
    }

    /// The storage name of the related entity.
    pub fn related_table(&self) -> &str {
        &self.related_table
    }

    /// The column on the owning table that takes part in the join.
    pub fn owner_column(&self) -> &str {
        match self.kind {
            RelationKind::BelongsTo => &self.foreign_key,
            RelationKind::HasMany => &self.key,
        }
    }

    /// The column on the related table that takes part in the join.
    pub fn related_column(&self) -> &str {
        match self.kind {
            RelationKind::BelongsTo => &self.key,
            RelationKind::HasMany => &self.foreign_key,
        }
    }
}

/// A table and the relations declared on it.
///
/// Entities are built once, when filters are registered, and are
/// read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    table: String,
    relations: BTreeMap<String, Relation>,
}

impl Entity {
    pub fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            relations: BTreeMap::new(),
        }
    }

    /// Declare a relation. A later declaration with the same name
    /// replaces an earlier one.
    pub fn with_relation(mut self, relation: Relation) -> Self {
        self.relations.insert(relation.name.clone(), relation);
        self
    }

    pub fn belongs_to(self, name: &str, related_table: &str, foreign_key: &str) -> Self {
        self.with_relation(Relation::belongs_to(name, related_table, foreign_key))
    }

    pub fn has_many(self, name: &str, related_table: &str, foreign_key: &str) -> Self {
        self.with_relation(Relation::has_many(name, related_table, foreign_key))
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Look up a declared relation by name.
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.relations.values()
    }
}

/// A Rust type that describes the entity it is stored as.
///
/// This can be derived; see [`macro@Model`](crate::Model).
pub trait Model {
    fn entity() -> Entity;
}
