//! `get_pages` and `get_page` method handlers.
//!
//! Pages are hierarchical: listings follow menu order, details carry a
//! parent summary and ordered children, and `include_hierarchy` attaches
//! children to every listed page.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::McpError;
use crate::handlers::{check_offset, clamp_limit, EXCERPT_WORDS};
use crate::models::content::{fold_custom_fields, ContentItem, ContentQuery, ListOrder};
use crate::state::AppContext;

pub const MAX_LIMIT: i64 = 100;

const PAGE_TYPE: &str = "page";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GetPagesParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub parent_id: Option<i64>,
    pub include_hierarchy: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GetPageParams {
    pub page_id: Option<i64>,
    pub slug: Option<String>,
}

/// Listing shape of one page.
#[derive(Debug, Serialize)]
pub struct PageSummary {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub status: String,
    pub author: String,
    pub menu_order: i32,
    pub parent_id: Option<i64>,
    pub date_created: chrono::DateTime<chrono::Utc>,
    pub date_modified: chrono::DateTime<chrono::Utc>,
}

impl PageSummary {
    pub fn from_item(item: &ContentItem) -> Self {
        Self {
            id: item.id,
            title: item.title.clone(),
            slug: item.slug.clone(),
            status: item.status.clone(),
            author: item.author.clone(),
            menu_order: item.menu_order,
            parent_id: item.parent_id,
            date_created: item.created_at,
            date_modified: item.updated_at,
        }
    }
}

/// List published pages in menu order, optionally filtered by parent.
pub async fn get_pages(ctx: &AppContext, params: GetPagesParams) -> Result<Value, McpError> {
    let limit = clamp_limit(params.limit, MAX_LIMIT)?;
    let offset = check_offset(params.offset)?;

    if !ctx.settings.is_type_allowed(PAGE_TYPE) {
        return Ok(json!({ "pages": [], "total": 0, "limit": limit, "offset": offset }));
    }

    let query = ContentQuery {
        content_types: vec![PAGE_TYPE.to_string()],
        parent_id: params.parent_id,
        filters: Default::default(),
        limit,
        offset,
        order: ListOrder::MenuOrder,
    };
    let page = ctx.content.list(&query).await?;

    let include_hierarchy = params.include_hierarchy.unwrap_or(false);
    let mut pages = Vec::with_capacity(page.items.len());
    for item in &page.items {
        let mut summary =
            serde_json::to_value(PageSummary::from_item(item)).map_err(|_| McpError::Internal)?;
        if include_hierarchy {
            let children = children_of(ctx, item.id).await?;
            summary
                .as_object_mut()
                .ok_or(McpError::Internal)?
                .insert("children".to_string(), children);
        }
        pages.push(summary);
    }

    Ok(json!({
        "pages": pages,
        "total": page.total,
        "limit": limit,
        "offset": offset,
    }))
}

/// Fetch one published page by id or slug, with parent and children.
pub async fn get_page(ctx: &AppContext, params: GetPageParams) -> Result<Value, McpError> {
    let item = match (params.page_id, params.slug.as_deref()) {
        (Some(id), _) => ctx.content.find_by_id(id).await?,
        (None, Some(slug)) if !slug.is_empty() => {
            ctx.content.find_by_slug(slug, Some(PAGE_TYPE)).await?
        }
        _ => {
            return Err(McpError::MissingParameter(
                "page_id or slug parameter required".to_string(),
            ));
        }
    };

    let item = item
        .filter(|i| {
            i.content_type == PAGE_TYPE
                && i.is_published()
                && ctx.settings.is_type_allowed(PAGE_TYPE)
        })
        .ok_or_else(|| McpError::NotFound("Page not found or not published".to_string()))?;

    let meta = ctx.content.item_meta(item.id).await?;
    let parent = match item.parent_id {
        Some(parent_id) => ctx
            .content
            .find_by_id(parent_id)
            .await?
            .filter(ContentItem::is_published)
            .map(|p| serde_json::to_value(PageSummary::from_item(&p)))
            .transpose()
            .map_err(|_| McpError::Internal)?
            .unwrap_or(Value::Null),
        None => Value::Null,
    };
    let children = children_of(ctx, item.id).await?;

    let mut detail =
        serde_json::to_value(PageSummary::from_item(&item)).map_err(|_| McpError::Internal)?;
    let obj = detail.as_object_mut().ok_or(McpError::Internal)?;
    obj.insert("content".to_string(), json!(item.body));
    obj.insert(
        "excerpt".to_string(),
        json!(item.effective_excerpt(EXCERPT_WORDS)),
    );
    obj.insert(
        "custom_fields".to_string(),
        serde_json::to_value(fold_custom_fields(meta)).map_err(|_| McpError::Internal)?,
    );
    obj.insert("parent".to_string(), parent);
    obj.insert("children".to_string(), children);

    Ok(detail)
}

async fn children_of(ctx: &AppContext, parent_id: i64) -> Result<Value, McpError> {
    let children: Vec<PageSummary> = ctx
        .content
        .children(parent_id)
        .await?
        .iter()
        .map(PageSummary::from_item)
        .collect();
    serde_json::to_value(children).map_err(|_| McpError::Internal)
}
