use std::sync::Arc;

use filter_operator::mock::Endpoint;
use filter_operator::{FilterSet, OperatorFilter, SqlQuery};
use serde_json::{json, Value};

use crate::model::Post;

async fn serve() -> wiremock::MockServer {
    let server = wiremock::MockServer::start().await;

    let filters = Arc::new(
        FilterSet::<SqlQuery>::new()
            .with(OperatorFilter::make("title"))
            .with(OperatorFilter::make("publishedAt"))
            .with(OperatorFilter::make("author.name").owned_by::<Post>())
            .with(OperatorFilter::make("editor.name"))
            .with(OperatorFilter::make("author.country.code").owned_by::<Post>()),
    );

    wiremock::Mock::given(wiremock::matchers::method("GET"))
        .and(wiremock::matchers::path("/posts/"))
        .respond_with(Endpoint::new("posts", filters))
        .mount(&server)
        .await;

    server
}

async fn get(server: &wiremock::MockServer, query: &[(&str, &str)]) -> (u16, Value) {
    let response = reqwest::Client::new()
        .get(format!("{}/posts/", server.uri()))
        .query(query)
        .send()
        .await
        .expect("request failed");
    let status = response.status().as_u16();
    let body = response.json::<Value>().await.expect("body is not json");
    (status, body)
}

#[test_log::test(tokio::test)]
async fn no_filters() {
    let server = serve().await;
    let (status, body) = get(&server, &[("page[size]", "10")]).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({"sql": "SELECT * FROM posts", "bindings": []}));
}

#[test_log::test(tokio::test)]
async fn filters_become_sql() {
    let server = serve().await;
    let (status, body) = get(
        &server,
        &[
            ("filter[title][operator]", "contains"),
            ("filter[title][value]", "rust"),
            ("filter[publishedAt][operator]", "not_null"),
            ("filter[publishedAt][value]", ""),
            ("filter[author.name][operator]", "in"),
            ("filter[author.name][value]", "ada,grace"),
        ],
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(
        body,
        json!({
            "sql": "SELECT * FROM posts WHERE EXISTS (SELECT * FROM users \
                    WHERE users.id = posts.author_id AND users.name IN (?, ?)) \
                    AND published_at IS NOT NULL AND title LIKE ?",
            "bindings": ["ada", "grace", "%rust%"],
        })
    );
}

#[test_log::test(tokio::test)]
async fn bad_requests() {
    let server = serve().await;

    let (status, body) = get(&server, &[("filter[title]", "rust")]).await;
    assert_eq!(status, 400);
    assert_eq!(body["errors"][0]["status"], "400");

    let (status, _) = get(
        &server,
        &[
            ("filter[title][operator]", "like"),
            ("filter[title][value]", "rust"),
        ],
    )
    .await;
    assert_eq!(status, 400);

    let (status, body) = get(&server, &[("filter[title][operator]", "=")]).await;
    assert_eq!(status, 400);
    assert_eq!(
        body["errors"][0]["detail"],
        "malformed filter 'title': expecting filter title to have a value"
    );

    let (status, _) = get(
        &server,
        &[
            ("filter[height][operator]", "="),
            ("filter[height][value]", "2"),
        ],
    )
    .await;
    assert_eq!(status, 400);

    let (status, _) = get(&server, &[("filter[title", "x")]).await;
    assert_eq!(status, 400);

    let (status, _) = get(
        &server,
        &[
            ("filter[author.country.code][operator]", "="),
            ("filter[author.country.code][value]", "FR"),
        ],
    )
    .await;
    assert_eq!(status, 400);
}

#[test_log::test(tokio::test)]
async fn unprocessable_relations() {
    let server = serve().await;
    let (status, body) = get(
        &server,
        &[
            ("filter[editor.name][operator]", "="),
            ("filter[editor.name][value]", "ada"),
        ],
    )
    .await;
    assert_eq!(status, 422);
    assert_eq!(
        body["errors"][0]["detail"],
        "filter 'editor.name' targets a relationship but has no owning entity"
    );
}
