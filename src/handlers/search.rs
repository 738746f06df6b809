//! `search_content` method handler.
//!
//! Full-text search over title and body, with a bounded 0-100 relevance
//! score per result computed from term-frequency heuristics. The score is a
//! ranking hint for clients, not a guarantee of optimal ordering.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::McpError;
use crate::handlers::{check_offset, clamp_limit, RawFilters};
use crate::models::content::{ContentItem, SearchQuery};
use crate::state::AppContext;

/// Search listings are capped tighter than generic listings.
pub const MAX_LIMIT: i64 = 50;

/// Weights of the relevance heuristic.
const TITLE_TERM_WEIGHT: u32 = 10;
const BODY_TERM_WEIGHT: u32 = 1;
const TITLE_PHRASE_BONUS: u32 = 20;
const BODY_PHRASE_BONUS: u32 = 5;
const MAX_SCORE: u32 = 100;

/// Length of the contextual excerpt around the best match, in bytes.
const EXCERPT_LENGTH: usize = 200;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchParams {
    pub query: Option<String>,
    pub post_types: Option<Vec<String>>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub filters: Option<RawFilters>,
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub post_type: String,
    pub author: String,
    /// Contextual excerpt around the best-matching body position.
    pub excerpt: String,
    pub date_created: chrono::DateTime<chrono::Utc>,
    pub date_modified: chrono::DateTime<chrono::Utc>,
    pub relevance_score: u32,
}

pub async fn search_content(ctx: &AppContext, params: SearchParams) -> Result<Value, McpError> {
    let text = params
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| McpError::MissingParameter("Search query parameter required".to_string()))?
        .to_string();

    let limit = clamp_limit(params.limit, MAX_LIMIT)?;
    let offset = check_offset(params.offset)?;

    // Intersect requested types with the allow-list; a disjoint request is
    // an empty result, not an error.
    let content_types: Vec<String> = match &params.post_types {
        Some(requested) => requested
            .iter()
            .filter(|t| ctx.settings.is_type_allowed(t))
            .cloned()
            .collect(),
        None => ctx.settings.allowed_content_types.clone(),
    };
    if content_types.is_empty() {
        return Ok(json!({
            "results": [], "total": 0, "query": text, "limit": limit, "offset": offset,
        }));
    }

    let query = SearchQuery {
        text: text.clone(),
        content_types,
        filters: params.filters.unwrap_or_default().resolve()?,
        limit,
        offset,
    };
    let page = ctx.content.search(&query).await?;

    let mut results: Vec<SearchHit> = page
        .items
        .iter()
        .map(|item| hit_from_item(item, &text))
        .collect();
    results.sort_by(|a, b| {
        b.relevance_score
            .cmp(&a.relevance_score)
            .then(b.date_created.cmp(&a.date_created))
    });

    Ok(json!({
        "results": results,
        "total": page.total,
        "query": text,
        "limit": limit,
        "offset": offset,
    }))
}

fn hit_from_item(item: &ContentItem, query: &str) -> SearchHit {
    SearchHit {
        id: item.id,
        title: item.title.clone(),
        slug: item.slug.clone(),
        post_type: item.content_type.clone(),
        author: item.author.clone(),
        excerpt: search_excerpt(&item.body, query),
        date_created: item.created_at,
        date_modified: item.updated_at,
        relevance_score: relevance_score(&item.title, &item.body, query),
    }
}

/// Term-frequency relevance score, capped at 100.
///
/// Title hits weigh ten times a body hit; an exact full-phrase match adds a
/// fixed bonus on top.
pub fn relevance_score(title: &str, body: &str, query: &str) -> u32 {
    let title = title.to_lowercase();
    let body = body.to_lowercase();
    let query = query.to_lowercase();

    let mut score = 0u32;
    for term in query.split_whitespace() {
        score += title.matches(term).count() as u32 * TITLE_TERM_WEIGHT;
        score += body.matches(term).count() as u32 * BODY_TERM_WEIGHT;
    }
    if title.contains(&query) {
        score += TITLE_PHRASE_BONUS;
    }
    if body.contains(&query) {
        score += BODY_PHRASE_BONUS;
    }

    score.min(MAX_SCORE)
}

/// Extract a window of the body around the search term position that has the
/// densest matches, with ellipses marking truncation.
pub fn search_excerpt(body: &str, query: &str) -> String {
    let body_lower = body.to_lowercase();
    let query_lower = query.to_lowercase();

    let mut best_start = 0usize;
    let mut best_density = 0usize;
    for term in query_lower.split_whitespace() {
        if let Some(pos) = body_lower.find(term) {
            let window_start = pos.saturating_sub(EXCERPT_LENGTH / 2);
            let window_end = (window_start + EXCERPT_LENGTH).min(body_lower.len());
            let density = body_lower[floor_boundary(&body_lower, window_start)
                ..ceil_boundary(&body_lower, window_end)]
                .matches(term)
                .count();
            if density > best_density {
                best_density = density;
                best_start = window_start;
            }
        }
    }

    let start = floor_boundary(body, best_start.min(body.len()));
    let end = ceil_boundary(body, (best_start + EXCERPT_LENGTH).min(body.len()));

    let mut excerpt = body[start..end].trim().to_string();
    if start > 0 {
        excerpt = format!("...{excerpt}");
    }
    if end < body.len() {
        excerpt.push_str("...");
    }
    excerpt
}

fn floor_boundary(s: &str, mut index: usize) -> usize {
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_boundary(s: &str, mut index: usize) -> usize {
    while index < s.len() && !s.is_char_boundary(index) {
        index += 1;
    }
    index
}
