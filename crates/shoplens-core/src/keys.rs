//! Aggregation key-space layout.
//!
//! Every key is a colon-delimited list of segments. The first segment names
//! the entry kind; variable segments are escaped so that they never contain
//! a raw `:` (segment boundary) or `*` (scan wildcard).
//!
//! | entry | key | value |
//! |---|---|---|
//! | primary record | `event:{type}:{user}:{product}` | JSON [`Event`](crate::event::Event) |
//! | product index | `product:{product}` | set of event types |
//! | user-product index | `user:{user}:product:{product}` | set of event types |
//! | category index | `category:{category}` | set of event types |
//! | search counter | `search:{query}` | counter |
//!
//! The product segment of a primary key is empty when the event carries no
//! product.

use std::borrow::Cow;

const PRIMARY: &str = "event";
const PRODUCT: &str = "product";
const USER: &str = "user";
const CATEGORY: &str = "category";
const SEARCH: &str = "search";

/// Matches every primary record.
pub const PRIMARY_PATTERN: &str = "event:*";
/// Matches every product index.
pub const PRODUCT_PATTERN: &str = "product:*";
/// Matches every category index.
pub const CATEGORY_PATTERN: &str = "category:*";
/// Matches every search counter.
pub const SEARCH_PATTERN: &str = "search:*";

/// Structural components of a primary-record key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryKey {
    pub event_type: String,
    pub user_id: String,
    pub product_id: Option<String>,
}

/// Key of the primary record for `(event_type, user_id, product_id)`.
#[must_use]
pub fn primary_key(event_type: &str, user_id: &str, product_id: Option<&str>) -> String {
    format!(
        "{PRIMARY}:{}:{}:{}",
        escape(event_type),
        escape(user_id),
        product_id.map(escape).unwrap_or_default()
    )
}

/// Pattern matching every primary record of one product, whatever its event
/// type or user.
#[must_use]
pub fn product_records_pattern(product_id: &str) -> String {
    format!("{PRIMARY}:*:*:{}", escape(product_id))
}

/// Key of the product index.
#[must_use]
pub fn product_key(product_id: &str) -> String {
    format!("{PRODUCT}:{}", escape(product_id))
}

/// Key of the user-product index.
#[must_use]
pub fn user_product_key(user_id: &str, product_id: &str) -> String {
    format!("{USER}:{}:{PRODUCT}:{}", escape(user_id), escape(product_id))
}

/// Key of the category index.
#[must_use]
pub fn category_key(category: &str) -> String {
    format!("{CATEGORY}:{}", escape(category))
}

/// Key of the search counter.
#[must_use]
pub fn search_key(query: &str) -> String {
    format!("{SEARCH}:{}", escape(query))
}

/// Splits a primary-record key into its components.
#[must_use]
pub fn parse_primary_key(key: &str) -> Option<PrimaryKey> {
    let mut parts = key.split(':');
    if parts.next()? != PRIMARY {
        return None;
    }
    let event_type = unescape(parts.next()?)?;
    let user_id = unescape(parts.next()?)?;
    let product = parts.next()?;
    if parts.next().is_some() || event_type.is_empty() || user_id.is_empty() {
        return None;
    }
    let product_id = if product.is_empty() {
        None
    } else {
        Some(unescape(product)?)
    };
    Some(PrimaryKey {
        event_type,
        user_id,
        product_id,
    })
}

/// Extracts the product id from a product-index key.
#[must_use]
pub fn parse_product_key(key: &str) -> Option<String> {
    single_segment(key, PRODUCT)
}

/// Extracts `(user_id, product_id)` from a user-product index key.
#[must_use]
pub fn parse_user_product_key(key: &str) -> Option<(String, String)> {
    let parts: Vec<&str> = key.split(':').collect();
    match parts.as_slice() {
        [USER, user, PRODUCT, product] => Some((unescape(user)?, unescape(product)?)),
        _ => None,
    }
}

/// Extracts the category from a category-index key.
#[must_use]
pub fn parse_category_key(key: &str) -> Option<String> {
    single_segment(key, CATEGORY)
}

/// Extracts the query text from a search-counter key.
#[must_use]
pub fn parse_search_key(key: &str) -> Option<String> {
    single_segment(key, SEARCH)
}

fn single_segment(key: &str, prefix: &str) -> Option<String> {
    let rest = key.strip_prefix(prefix)?.strip_prefix(':')?;
    if rest.is_empty() || rest.contains(':') {
        return None;
    }
    unescape(rest)
}

fn escape(segment: &str) -> Cow<'_, str> {
    if !segment.contains(['%', ':', '*']) {
        return Cow::Borrowed(segment);
    }
    let mut out = String::with_capacity(segment.len() + 8);
    for c in segment.chars() {
        match c {
            '%' => out.push_str("%25"),
            ':' => out.push_str("%3A"),
            '*' => out.push_str("%2A"),
            other => out.push(other),
        }
    }
    Cow::Owned(out)
}

fn unescape(segment: &str) -> Option<String> {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let code = rest.get(pos + 1..pos + 3)?;
        out.push(match code {
            "25" => '%',
            "3A" => ':',
            "2A" => '*',
            _ => return None,
        });
        rest = &rest[pos + 3..];
    }
    out.push_str(rest);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_key_layout() {
        assert_eq!(primary_key("view", "u1", Some("p1")), "event:view:u1:p1");
        assert_eq!(primary_key("search", "u1", None), "event:search:u1:");
    }

    #[test]
    fn test_index_key_layout() {
        assert_eq!(product_key("p1"), "product:p1");
        assert_eq!(user_product_key("u1", "p1"), "user:u1:product:p1");
        assert_eq!(category_key("shoes"), "category:shoes");
        assert_eq!(search_key("red shoes"), "search:red shoes");
    }

    #[test]
    fn test_parse_primary_key_recovers_components() {
        let key = primary_key("purchase", "u1", Some("p1"));

        let parsed = parse_primary_key(&key).unwrap();

        assert_eq!(parsed.event_type, "purchase");
        assert_eq!(parsed.user_id, "u1");
        assert_eq!(parsed.product_id.as_deref(), Some("p1"));
    }

    #[test]
    fn test_parse_primary_key_without_product() {
        let parsed = parse_primary_key("event:search:u1:").unwrap();

        assert_eq!(parsed.product_id, None);
    }

    #[test]
    fn test_segments_with_delimiters_survive_escaping() {
        let key = primary_key("view", "tenant:7", Some("sku:9*%"));

        assert_eq!(key, "event:view:tenant%3A7:sku%3A9%2A%25");
        let parsed = parse_primary_key(&key).unwrap();
        assert_eq!(parsed.user_id, "tenant:7");
        assert_eq!(parsed.product_id.as_deref(), Some("sku:9*%"));

        assert_eq!(parse_product_key(&product_key("a:b")).as_deref(), Some("a:b"));
        assert_eq!(
            parse_user_product_key(&user_product_key("u:1", "p:1")),
            Some(("u:1".to_owned(), "p:1".to_owned()))
        );
    }

    #[test]
    fn test_malformed_keys_do_not_parse() {
        assert!(parse_primary_key("event:view:u1").is_none());
        assert!(parse_primary_key("event:view:u1:p1:extra").is_none());
        assert!(parse_primary_key("product:p1").is_none());
        assert!(parse_product_key("product:").is_none());
        assert!(parse_product_key("product:a:b").is_none());
        assert!(parse_category_key("category:bad%ZZ").is_none());
        assert!(parse_user_product_key("user:u1:p1").is_none());
    }

    #[test]
    fn test_product_records_pattern_escapes_wildcards() {
        assert_eq!(product_records_pattern("p1"), "event:*:*:p1");
        assert_eq!(product_records_pattern("p*"), "event:*:*:p%2A");
    }
}
