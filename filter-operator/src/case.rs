//! Name conversions used when a filter or model does not spell out
//! its column or table.

use std::sync::OnceLock;

use regex::Regex;

fn upper() -> &'static Regex {
    static UPPER: OnceLock<Regex> = OnceLock::new();
    UPPER.get_or_init(|| Regex::new(r"[A-Z]").expect("literal pattern"))
}

/// Convert a filter name into a column name.
///
/// Dashes and spaces become underscores and every upper case letter
/// after the first character is preceded by an underscore, then the
/// whole name is lower cased. Dots are kept, so a relationship filter
/// keeps its shape:
///
/// ```rust
/// use filter_operator::case::snake_case;
///
/// assert_eq!(snake_case("deletedAt"), "deleted_at");
/// assert_eq!(snake_case("author.countryCode"), "author.country_code");
/// assert_eq!(snake_case("published-at"), "published_at");
/// ```
pub fn snake_case(name: &str) -> String {
    let name = name.replace(['-', ' '], "_");
    let mut out = String::with_capacity(name.len() + 4);
    let mut last = 0;
    for m in upper().find_iter(&name) {
        out.push_str(&name[last..m.start()]);
        if m.start() > 0 && !out.ends_with('_') && !out.ends_with('.') {
            out.push('_');
        }
        last = m.start();
    }
    out.push_str(&name[last..]);
    out.to_lowercase()
}

/// The default table name for a model type: its snake cased name with
/// a trailing `s`.
pub fn table_name(type_name: &str) -> String {
    format!("{}s", snake_case(type_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake() {
        assert_eq!(snake_case("age"), "age");
        assert_eq!(snake_case("deletedAt"), "deleted_at");
        assert_eq!(snake_case("DeletedAt"), "deleted_at");
        assert_eq!(snake_case("already_snake"), "already_snake");
        assert_eq!(snake_case("snake_Mixed"), "snake_mixed");
        assert_eq!(snake_case("HTTPCode"), "h_t_t_p_code");
        assert_eq!(snake_case("author.country"), "author.country");
        assert_eq!(snake_case("author.Country"), "author.country");
    }

    #[test]
    fn tables() {
        assert_eq!(table_name("Post"), "posts");
        assert_eq!(table_name("BlogPost"), "blog_posts");
    }
}
