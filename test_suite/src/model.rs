//! Models shared by the tests.

use filter_operator::Model;

#[derive(Model)]
#[filter(table = "countries")]
pub struct Country {
    pub id: i64,
    pub code: String,
}

#[derive(Model)]
#[filter(table = "users")]
pub struct User {
    pub id: i64,
    pub name: String,
    #[filter(belongs_to(table = "countries", foreign_key = "country_id"))]
    pub country: Option<Country>,
}

#[derive(Model)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub score: i32,
}

#[derive(Model)]
pub struct Post {
    pub id: i64,
    pub title: String,
    #[filter(belongs_to(table = "users", foreign_key = "author_id"))]
    pub author: Option<User>,
    #[filter(rename = "editor", belongs_to(table = "users", foreign_key = "reviewer_id"))]
    pub reviewer: Option<User>,
    #[filter(has_many(table = "comments", foreign_key = "post_id"))]
    pub comments: Vec<Comment>,
    #[filter(has_one(table = "slugs", foreign_key = "post_uuid", key = "uuid"))]
    pub slug: Option<String>,
    #[filter(belongs_to(table = "posts", foreign_key = "parent_id"))]
    pub parent: Option<Box<Post>>,
}
