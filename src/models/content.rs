//! Content models and repository query types.
//!
//! Content is owned entirely by the external content store; this server only
//! reads it. [`ContentItem`] is the raw record shape, the `*Query` types
//! describe what handlers ask the repository for.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Status string of publicly visible content.
pub const PUBLISHED: &str = "published";

/// A content record (post, page, or custom type).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ContentItem {
    pub id: i64,
    pub content_type: String,
    pub title: String,
    pub slug: String,
    pub status: String,
    pub author: String,
    pub excerpt: Option<String>,
    pub body: String,
    /// Parent item for hierarchical types; None for flat content.
    pub parent_id: Option<i64>,
    /// Manual ordering for hierarchical listings.
    pub menu_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContentItem {
    pub fn is_published(&self) -> bool {
        self.status == PUBLISHED
    }

    /// Explicit excerpt if present, otherwise the first words of the body.
    pub fn effective_excerpt(&self, words: usize) -> String {
        match &self.excerpt {
            Some(e) if !e.is_empty() => e.clone(),
            _ => trim_words(&self.body, words),
        }
    }
}

/// Optional filters common to list and search operations.
#[derive(Debug, Clone, Default)]
pub struct ContentFilters {
    pub date_after: Option<DateTime<Utc>>,
    pub date_before: Option<DateTime<Utc>>,
    pub author: Option<String>,
    /// Term slug within the `category` taxonomy.
    pub category: Option<String>,
    /// Term slug within the `tag` taxonomy.
    pub tag: Option<String>,
}

/// Ordering of list results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOrder {
    NewestFirst,
    MenuOrder,
}

/// A listing request against the repository. Only published items of the
/// given types are ever returned.
#[derive(Debug, Clone)]
pub struct ContentQuery {
    pub content_types: Vec<String>,
    pub parent_id: Option<i64>,
    pub filters: ContentFilters,
    pub limit: i64,
    pub offset: i64,
    pub order: ListOrder,
}

/// A full-text search request against the repository.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub text: String,
    pub content_types: Vec<String>,
    pub filters: ContentFilters,
    pub limit: i64,
    pub offset: i64,
}

/// One page of repository results. `total` is the filtered count ignoring
/// limit/offset so clients can paginate.
#[derive(Debug, Clone)]
pub struct ContentPage {
    pub items: Vec<ContentItem>,
    pub total: i64,
}

/// A taxonomy term attached to one item.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ItemTerm {
    pub taxonomy: String,
    pub name: String,
    pub slug: String,
}

/// One custom field row of an item.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MetaField {
    pub key: String,
    pub value: String,
}

/// A term with its usage count, as listed in type descriptors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermSummary {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub count: i64,
}

/// Taxonomy overview inside a type descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxonomySummary {
    pub label: String,
    pub hierarchical: bool,
    pub terms: Vec<TermSummary>,
}

/// Describes one enumerable content type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub name: String,
    pub label: String,
    pub description: String,
    pub hierarchical: bool,
    /// Count of published items of this type.
    pub item_count: i64,
    /// Distinct public custom-field keys in use, capped at 20.
    pub meta_keys: Vec<String>,
    /// Public taxonomies with their most used terms, capped at 10 per taxonomy.
    pub taxonomies: BTreeMap<String, TaxonomySummary>,
}

/// First `limit` whitespace-separated words of `text`, with a trailing
/// ellipsis when truncated.
pub fn trim_words(text: &str, limit: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= limit {
        words.join(" ")
    } else {
        let mut out = words[..limit].join(" ");
        out.push_str("...");
        out
    }
}

/// Collapse raw meta rows into the custom-fields map: single values stay
/// scalar, repeated keys become arrays. Keys starting with `_` are internal
/// and already filtered out by the repository.
pub fn fold_custom_fields(fields: Vec<MetaField>) -> BTreeMap<String, Value> {
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for field in fields {
        grouped.entry(field.key).or_default().push(field.value);
    }

    grouped
        .into_iter()
        .map(|(key, mut values)| {
            let value = if values.len() == 1 {
                Value::String(values.remove(0))
            } else {
                Value::Array(values.into_iter().map(Value::String).collect())
            };
            (key, value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trim_words_truncates_with_ellipsis() {
        assert_eq!(trim_words("one two three four", 2), "one two...");
        assert_eq!(trim_words("one two", 5), "one two");
        assert_eq!(trim_words("", 5), "");
    }

    #[test]
    fn custom_fields_collapse_singles_and_group_repeats() {
        let fields = vec![
            MetaField {
                key: "color".to_string(),
                value: "red".to_string(),
            },
            MetaField {
                key: "size".to_string(),
                value: "s".to_string(),
            },
            MetaField {
                key: "size".to_string(),
                value: "m".to_string(),
            },
        ];

        let folded = fold_custom_fields(fields);
        assert_eq!(folded["color"], Value::String("red".to_string()));
        assert_eq!(
            folded["size"],
            Value::Array(vec![
                Value::String("s".to_string()),
                Value::String("m".to_string())
            ])
        );
    }
}
