//! A mock endpoint that shows what a set of filters makes of a
//! request.
//!
//! [`Endpoint`] is a [`wiremock`] responder. It decodes the JSON:API
//! `filter[...]` parameters of each request, applies them to a fresh
//! [`SqlQuery`], and answers with the rendered SQL and its bindings:
//!
//! ```json
//! { "sql": "SELECT * FROM people WHERE age >= ?", "bindings": ["18"] }
//! ```
//!
//! A rejected filter is answered with a JSON:API error document and
//! the status the error calls for.

use std::sync::{Arc, OnceLock};

use log::{debug, trace};
use regex::Regex;
use serde_json::{json, Map, Value};
use thiserror::Error;
use wiremock::http::Url;
use wiremock::{Request, Respond, ResponseTemplate};

use crate::error::FilterError;
use crate::filtering::FilterSet;
use crate::query::SqlQuery;

#[derive(Debug, Error)]
pub enum MockError {
    #[error("malformed filter parameter `{0}`")]
    BadParameter(String),
    #[error(transparent)]
    Filter(#[from] FilterError),
}

impl MockError {
    pub fn status(&self) -> u16 {
        match self {
            MockError::BadParameter(_) => 400,
            MockError::Filter(e) => e.status(),
        }
    }
}

fn filter_key() -> &'static Regex {
    static FILTER_KEY: OnceLock<Regex> = OnceLock::new();
    FILTER_KEY.get_or_init(|| {
        Regex::new(r"^filter\[([^\[\]]+)\](?:\[([^\[\]]+)\])?$").expect("literal pattern")
    })
}

/// Collect the `filter` parameters of `url` into a JSON object.
///
/// `filter[name][key]=v` becomes `{"name": {"key": "v"}}` and
/// `filter[name]=v` becomes `{"name": "v"}`. An empty value is taken
/// as null, so `filter[deleted][value]=` carries a null value. Other
/// query parameters are ignored.
pub fn decode_filters(url: &Url) -> Result<Value, MockError> {
    let mut filters = Map::new();
    for (key, value) in url.query_pairs() {
        if key != "filter" && !key.starts_with("filter[") {
            continue;
        }
        let caps = filter_key()
            .captures(&key)
            .ok_or_else(|| MockError::BadParameter(key.to_string()))?;
        let name = caps[1].to_string();
        let value = if value.is_empty() {
            Value::Null
        } else {
            Value::String(value.to_string())
        };

        match caps.get(2) {
            Some(field) => {
                let entry = filters
                    .entry(name)
                    .or_insert_with(|| Value::Object(Map::new()));
                match entry {
                    Value::Object(fields) => {
                        fields.insert(field.as_str().to_string(), value);
                    }
                    _ => return Err(MockError::BadParameter(key.to_string())),
                }
            }
            None => {
                if filters.insert(name, value).is_some() {
                    return Err(MockError::BadParameter(key.to_string()));
                }
            }
        }
    }
    Ok(Value::Object(filters))
}

/// A wiremock responder that applies a [`FilterSet`] to each request.
pub struct Endpoint {
    table: String,
    filters: Arc<FilterSet<SqlQuery>>,
}

impl Endpoint {
    /// Filter queries on `table` with `filters`.
    pub fn new(table: &str, filters: Arc<FilterSet<SqlQuery>>) -> Self {
        Self {
            table: table.to_string(),
            filters,
        }
    }

    fn build_query(&self, url: &Url) -> Result<SqlQuery, MockError> {
        let filters = decode_filters(url)?;
        let mut query = SqlQuery::new(&self.table);
        self.filters.apply(&mut query, &filters)?;
        Ok(query)
    }
}

impl Respond for Endpoint {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        trace!("Request URL: {}", request.url);
        match self.build_query(&request.url) {
            Ok(query) => ResponseTemplate::new(200).set_body_json(json!({
                "sql": query.to_sql(),
                "bindings": query.bindings(),
            })),
            Err(e) => {
                debug!("Failed to respond to {}: {}", request.url, e);
                let status = e.status();
                ResponseTemplate::new(status).set_body_json(json!({
                    "errors": [{
                        "status": status.to_string(),
                        "detail": e.to_string(),
                    }]
                }))
            }
        }
    }
}
