use std::sync::Arc;

use filter_operator::entity::RelationKind;
use filter_operator::query::Clause;
use filter_operator::*;
use serde_json::json;
use test_log::test;

use crate::model::{Comment, Country, Post, User};

#[test]
fn derived_tables() {
    assert_eq!(Country::entity().table(), "countries");
    assert_eq!(Comment::entity().table(), "comments");
    assert_eq!(User::entity().table(), "users");
    assert_eq!(Post::entity().table(), "posts");
    assert_eq!(Comment::entity().relations().count(), 0);
}

#[test]
fn derived_relations() {
    let posts = Post::entity();

    let author = posts.relation("author").unwrap();
    assert_eq!(author.kind(), RelationKind::BelongsTo);
    assert_eq!(author.related_table(), "users");
    assert_eq!(author.owner_column(), "author_id");
    assert_eq!(author.related_column(), "id");

    assert!(posts.relation("reviewer").is_none());
    let editor = posts.relation("editor").unwrap();
    assert_eq!(editor.owner_column(), "reviewer_id");

    let comments = posts.relation("comments").unwrap();
    assert_eq!(comments.kind(), RelationKind::HasMany);
    assert_eq!(comments.owner_column(), "id");
    assert_eq!(comments.related_column(), "post_id");

    let slug = posts.relation("slug").unwrap();
    assert_eq!(slug.related_table(), "slugs");
    assert_eq!(slug.owner_column(), "uuid");
    assert_eq!(slug.related_column(), "post_uuid");
}

#[test]
fn every_operator_adds_one_predicate() {
    let cases = [
        ("=", json!("18"), "age = ?"),
        (">", json!("18"), "age > ?"),
        ("<", json!("18"), "age < ?"),
        (">=", json!("18"), "age >= ?"),
        ("<=", json!("18"), "age <= ?"),
        ("<>", json!("18"), "age <> ?"),
        ("between", json!("18,65"), "age BETWEEN ? AND ?"),
        ("in", json!("18,21"), "age IN (?, ?)"),
        ("in", json!(""), "age IN (?)"),
        ("in", json!(null), "0 = 1"),
        ("null", json!(null), "age IS NULL"),
        ("null", json!("ignored"), "age IS NULL"),
        ("not_null", json!(null), "age IS NOT NULL"),
        ("contains", json!("1"), "age LIKE ?"),
        ("=", json!(null), "age IS NULL"),
        ("<>", json!(null), "age IS NOT NULL"),
    ];

    let filter = OperatorFilter::make("age");
    for (operator, value, sql) in cases {
        let mut q = SqlQuery::new("people");
        filter
            .apply(&mut q, &json!({"operator": operator, "value": value}))
            .unwrap();
        assert_eq!(q.clauses().len(), 1, "{}", operator);
        assert_eq!(q.where_sql(), sql);
    }
}

#[test]
fn operator_selects_clause() {
    // The value must never be mistaken for the operator.
    let mut q = SqlQuery::new("people");
    OperatorFilter::make("name")
        .apply(&mut q, &json!({"operator": "=", "value": "in"}))
        .unwrap();
    assert_eq!(q.where_sql(), "name = ?");
    assert_eq!(q.bindings(), vec!["in"]);
}

#[test]
fn relation_through_derived_model() {
    let mut q = SqlQuery::new("posts");
    OperatorFilter::make("authorName")
        .with_column("author.name")
        .owned_by::<Post>()
        .apply(&mut q, &json!({"operator": "contains", "value": "ada"}))
        .unwrap();
    assert_eq!(
        q.to_sql(),
        "SELECT * FROM posts WHERE EXISTS (SELECT * FROM users \
         WHERE users.id = posts.author_id AND users.name LIKE ?)"
    );
    assert_eq!(q.bindings(), vec!["%ada%"]);
}

#[test]
fn has_many_relation() {
    let mut q = SqlQuery::new("posts");
    OperatorFilter::make("comments.score")
        .owned_by::<Post>()
        .apply(&mut q, &json!({"operator": "between", "value": "3,5"}))
        .unwrap();
    match q.clauses() {
        [Clause::Exists(sub)] => {
            assert_eq!(sub.table(), "comments");
            assert_eq!(
                sub.where_sql(),
                "comments.post_id = posts.id AND comments.score BETWEEN ? AND ?"
            );
        }
        other => panic!("expected one exists clause, got {:?}", other),
    }
}

#[test]
fn self_referential_relation() {
    let mut q = SqlQuery::new("posts");
    OperatorFilter::make("parent.title")
        .owned_by::<Post>()
        .apply(&mut q, &json!({"operator": "<>", "value": "draft"}))
        .unwrap();
    match q.clauses() {
        [Clause::Exists(sub)] => {
            assert_eq!(sub.table(), "posts");
            assert_eq!(sub.alias(), Some("posts_1"));
            assert_eq!(
                sub.where_sql(),
                "posts_1.id = posts.parent_id AND posts_1.title <> ?"
            );
        }
        other => panic!("expected one exists clause, got {:?}", other),
    }
}

#[test]
fn user_country() {
    let users = User::entity();
    let country = users.relation("country").unwrap();
    assert_eq!(country.related_table(), Country::entity().table());
}

#[test]
fn relation_failures() {
    let value = json!({"operator": "=", "value": "x"});
    let mut q = SqlQuery::new("posts");

    let e = OperatorFilter::make("reviewer.name")
        .owned_by::<Post>()
        .apply(&mut q, &value)
        .unwrap_err();
    assert_eq!(e.status(), 422);

    let e = OperatorFilter::make("author.country.code")
        .owned_by::<Post>()
        .apply(&mut q, &value)
        .unwrap_err();
    assert_eq!(
        e,
        FilterError::UnsupportedRelationDepth {
            filter: "author.country.code".to_string(),
            column: "author.country.code".to_string(),
        }
    );
    assert_eq!(e.status(), 400);

    assert!(q.clauses().is_empty());
}

#[test]
fn shared_between_threads() {
    let set = Arc::new(
        FilterSet::<SqlQuery>::new()
            .with(OperatorFilter::make("title"))
            .with(OperatorFilter::make("authorName").with_column("author.name").owned_by::<Post>()),
    );

    let handles = (0..4)
        .map(|i| {
            let set = set.clone();
            std::thread::spawn(move || {
                let mut q = SqlQuery::new("posts");
                set.apply(
                    &mut q,
                    &json!({
                        "title": {"operator": "contains", "value": i.to_string()},
                        "authorName": {"operator": "=", "value": "ada"},
                    }),
                )
                .map(|_| q.to_sql())
            })
        })
        .collect::<Vec<_>>();

    for handle in handles {
        assert_eq!(
            handle.join().unwrap().unwrap(),
            "SELECT * FROM posts WHERE EXISTS (SELECT * FROM users \
             WHERE users.id = posts.author_id AND users.name = ?) AND title LIKE ?"
        );
    }
}

#[test]
fn filter_values() {
    assert_eq!(
        FilterValue::from_json("age", &json!({"operator": ">", "value": true})),
        Ok(FilterValue::new(">", Some("true")))
    );
    assert_eq!(
        FilterValue::from_json("age", &json!({"operator": "null", "value": null})),
        Ok(FilterValue::new("null", None))
    );
    assert_eq!(
        FilterValue::new("between", Some("1,2")).condition("age"),
        Ok(Condition::Between("1".to_string(), "2".to_string()))
    );
}
