//! `get_post_types` method handler.
//!
//! Enumerates the content types the configuration allows, with their
//! published item counts, public meta keys, and taxonomy term summaries.
//! Types outside the allow-list never appear, even if the content store
//! knows them.

use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::McpError;
use crate::state::AppContext;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GetPostTypesParams {}

pub async fn get_post_types(
    ctx: &AppContext,
    _params: GetPostTypesParams,
) -> Result<Value, McpError> {
    let descriptors = ctx
        .content
        .types(&ctx.settings.allowed_content_types)
        .await?;

    Ok(json!({
        "total": descriptors.len(),
        "post_types": descriptors,
    }))
}
