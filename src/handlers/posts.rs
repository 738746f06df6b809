//! `get_posts` and `get_post` method handlers.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::McpError;
use crate::handlers::{check_offset, clamp_limit, RawFilters, EXCERPT_WORDS};
use crate::models::content::{
    fold_custom_fields, ContentItem, ContentQuery, ItemTerm, ListOrder,
};
use crate::state::AppContext;

/// Maximum page size for generic listings.
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GetPostsParams {
    pub post_type: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub filters: Option<RawFilters>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GetPostParams {
    pub post_id: Option<i64>,
    pub slug: Option<String>,
}

/// Listing shape of one post.
#[derive(Debug, Serialize)]
pub struct PostSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub status: String,
    pub post_type: String,
    pub author: String,
    pub excerpt: String,
    pub date_created: chrono::DateTime<chrono::Utc>,
    pub date_modified: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl PostSummary {
    pub fn from_item(item: &ContentItem) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            slug: item.slug.clone(),
            status: item.status.clone(),
            post_type: item.content_type.clone(),
            author: item.author.clone(),
            excerpt: item.effective_excerpt(EXCERPT_WORDS),
            date_created: item.created_at,
            date_modified: item.updated_at,
            categories: None,
            tags: None,
        }
    }

    fn with_terms(mut self, terms: &[ItemTerm]) -> Self {
        let names = |taxonomy: &str| -> Vec<String> {
            terms
                .iter()
                .filter(|t| t.taxonomy == taxonomy)
                .map(|t| t.name.clone())
                .collect()
        };
        self.categories = Some(names("category"));
        self.tags = Some(names("tag"));
        self
    }
}

/// List published posts, newest first.
///
/// A disallowed content type yields an empty result set, never an error.
pub async fn get_posts(ctx: &AppContext, params: GetPostsParams) -> Result<Value, McpError> {
    let post_type = params.post_type.unwrap_or_else(|| "post".to_string());
    let limit = clamp_limit(params.limit, MAX_LIMIT)?;
    let offset = check_offset(params.offset)?;

    if !ctx.settings.is_type_allowed(&post_type) {
        return Ok(json!({ "posts": [], "total": 0, "limit": limit, "offset": offset }));
    }

    let query = ContentQuery {
        content_types: vec![post_type],
        parent_id: None,
        filters: params.filters.unwrap_or_default().resolve()?,
        limit,
        offset,
        order: ListOrder::NewestFirst,
    };
    let page = ctx.content.list(&query).await?;

    let mut posts = Vec::with_capacity(page.items.len());
    for item in &page.items {
        let terms = ctx.content.item_terms(item.id).await?;
        posts.push(PostSummary::from_item(item).with_terms(&terms));
    }

    Ok(json!({
        "posts": posts,
        "total": page.total,
        "limit": limit,
        "offset": offset,
    }))
}

/// Fetch one published post by id or slug.
///
/// Nonexistent, unpublished, and disallowed-type items all collapse to the
/// same not-found error.
pub async fn get_post(ctx: &AppContext, params: GetPostParams) -> Result<Value, McpError> {
    let item = match (params.post_id, params.slug.as_deref()) {
        (Some(id), _) => ctx.content.find_by_id(id).await?,
        (None, Some(slug)) if !slug.is_empty() => {
            ctx.content.find_by_slug(slug, Some("post")).await?
        }
        _ => {
            return Err(McpError::MissingParameter(
                "post_id or slug parameter required".to_string(),
            ));
        }
    };

    let item = item
        .filter(|i| i.is_published() && ctx.settings.is_type_allowed(&i.content_type))
        .ok_or_else(|| McpError::NotFound("Post not found or not published".to_string()))?;

    let terms = ctx.content.item_terms(item.id).await?;
    let meta = ctx.content.item_meta(item.id).await?;

    let mut detail = serde_json::to_value(PostSummary::from_item(&item).with_terms(&terms))
        .map_err(|_| McpError::Internal)?;
    let obj = detail.as_object_mut().ok_or(McpError::Internal)?;
    obj.insert("content".to_string(), json!(item.body));
    obj.insert(
        "custom_fields".to_string(),
        serde_json::to_value(fold_custom_fields(meta)).map_err(|_| McpError::Internal)?,
    );
    obj.insert(
        "taxonomies".to_string(),
        serde_json::to_value(group_terms(&terms)).map_err(|_| McpError::Internal)?,
    );

    Ok(detail)
}

/// Group an item's terms by taxonomy for detail responses.
fn group_terms(terms: &[ItemTerm]) -> std::collections::BTreeMap<String, Vec<Value>> {
    let mut grouped: std::collections::BTreeMap<String, Vec<Value>> = Default::default();
    for term in terms {
        grouped
            .entry(term.taxonomy.clone())
            .or_default()
            .push(json!({ "name": term.name, "slug": term.slug }));
    }
    grouped
}
