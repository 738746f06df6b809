//! PostgreSQL implementation of the storage traits.
//!
//! All queries run against the shared connection pool; there is no explicit
//! locking. The rate-limit count and the subsequent log insert are separate
//! statements with no transactional coupling, which makes the hourly limit a
//! soft limit under concurrent bursts.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Postgres, QueryBuilder};

use crate::db::DbPool;
use crate::models::api_key::{ApiKey, ApiKeyMeta, NewApiKey};
use crate::models::content::{
    ContentItem, ContentPage, ContentQuery, ItemTerm, ListOrder, MetaField, SearchQuery,
    TaxonomySummary, TermSummary, TypeDescriptor, PUBLISHED,
};
use crate::models::request_log::{DailyUsage, NewLogEntry};
use crate::store::{ContentRepository, KeyStore, RequestLogStore, StoreError};

const ITEM_COLUMNS: &str = "id, content_type, title, slug, status, author, excerpt, body, \
                            parent_id, menu_order, created_at, updated_at";

/// Maximum meta keys reported per type descriptor.
const META_KEY_CAP: i64 = 20;

/// Maximum terms reported per taxonomy in a type descriptor.
const TERM_CAP: usize = 10;

/// Postgres-backed key store, request log, and content repository.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyStore for PgStore {
    async fn insert(&self, key: NewApiKey) -> Result<i64, StoreError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO api_keys (key_hash, name, permissions, rate_limit)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(&key.key_hash)
        .bind(&key.name)
        .bind(&key.permissions)
        .bind(key.rate_limit)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn find_active_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, StoreError> {
        let key = sqlx::query_as::<_, ApiKey>(
            r#"
            SELECT id, key_hash, name, permissions, rate_limit, created_at, last_used_at, is_active
            FROM api_keys
            WHERE key_hash = $1 AND is_active = TRUE
            "#,
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(key)
    }

    async fn touch_last_used(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("UPDATE api_keys SET last_used_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn deactivate(&self, id: i64) -> Result<bool, StoreError> {
        let affected = sqlx::query("UPDATE api_keys SET is_active = FALSE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }

    async fn list(&self) -> Result<Vec<ApiKeyMeta>, StoreError> {
        let keys = sqlx::query_as::<_, ApiKeyMeta>(
            r#"
            SELECT id, name, rate_limit, created_at, last_used_at, is_active
            FROM api_keys
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(keys)
    }
}

#[async_trait]
impl RequestLogStore for PgStore {
    async fn append(&self, entry: NewLogEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO request_logs
                (api_key_id, endpoint, method, ip_address, user_agent,
                 request_data, response_code, response_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.api_key_id)
        .bind(&entry.endpoint)
        .bind(&entry.method)
        .bind(&entry.ip_address)
        .bind(&entry.user_agent)
        .bind(&entry.request_data)
        .bind(entry.response_code)
        .bind(entry.response_time)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count_since(&self, api_key_id: i64, since: DateTime<Utc>) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM request_logs WHERE api_key_id = $1 AND created_at > $2",
        )
        .bind(api_key_id)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn usage_by_day(
        &self,
        api_key_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyUsage>, StoreError> {
        let usage = sqlx::query_as::<_, DailyUsage>(
            r#"
            SELECT created_at::date AS date, COUNT(*) AS requests
            FROM request_logs
            WHERE api_key_id = $1 AND created_at > $2
            GROUP BY created_at::date
            ORDER BY date DESC
            "#,
        )
        .bind(api_key_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(usage)
    }
}

/// Shared WHERE clause of list and count queries.
fn push_list_predicates<'a>(qb: &mut QueryBuilder<'a, Postgres>, query: &'a ContentQuery) {
    qb.push(" WHERE status = ").push_bind(PUBLISHED);
    qb.push(" AND content_type = ANY(")
        .push_bind(&query.content_types)
        .push(")");

    if let Some(parent_id) = query.parent_id {
        qb.push(" AND parent_id = ").push_bind(parent_id);
    }
    push_filter_predicates(qb, query);
}

fn push_filter_predicates<'a>(qb: &mut QueryBuilder<'a, Postgres>, query: &'a ContentQuery) {
    let filters = &query.filters;
    if let Some(after) = filters.date_after {
        qb.push(" AND created_at >= ").push_bind(after);
    }
    if let Some(before) = filters.date_before {
        qb.push(" AND created_at <= ").push_bind(before);
    }
    if let Some(author) = &filters.author {
        qb.push(" AND author = ").push_bind(author);
    }
    if let Some(category) = &filters.category {
        push_term_predicate(qb, "category", category);
    }
    if let Some(tag) = &filters.tag {
        push_term_predicate(qb, "tag", tag);
    }
}

fn push_term_predicate<'a>(qb: &mut QueryBuilder<'a, Postgres>, taxonomy: &'a str, slug: &'a str) {
    qb.push(
        " AND EXISTS (SELECT 1 FROM item_terms it \
         JOIN terms t ON t.id = it.term_id \
         WHERE it.item_id = content_items.id AND t.taxonomy = ",
    )
    .push_bind(taxonomy)
    .push(" AND t.slug = ")
    .push_bind(slug)
    .push(")");
}

/// Escape LIKE wildcards in user-supplied search text.
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[derive(Debug, sqlx::FromRow)]
struct TypeRow {
    name: String,
    label: String,
    description: String,
    hierarchical: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct TermRow {
    taxonomy: String,
    label: String,
    hierarchical: bool,
    id: i64,
    name: String,
    slug: String,
    count: i64,
}

#[async_trait]
impl ContentRepository for PgStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<ContentItem>, StoreError> {
        let item = sqlx::query_as::<_, ContentItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM content_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    async fn find_by_slug(
        &self,
        slug: &str,
        content_type: Option<&str>,
    ) -> Result<Option<ContentItem>, StoreError> {
        let item = match content_type {
            Some(content_type) => {
                sqlx::query_as::<_, ContentItem>(&format!(
                    "SELECT {ITEM_COLUMNS} FROM content_items \
                     WHERE slug = $1 AND content_type = $2"
                ))
                .bind(slug)
                .bind(content_type)
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, ContentItem>(&format!(
                    "SELECT {ITEM_COLUMNS} FROM content_items WHERE slug = $1"
                ))
                .bind(slug)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        Ok(item)
    }

    async fn children(&self, parent_id: i64) -> Result<Vec<ContentItem>, StoreError> {
        let items = sqlx::query_as::<_, ContentItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM content_items \
             WHERE parent_id = $1 AND status = $2 \
             ORDER BY menu_order ASC, id ASC"
        ))
        .bind(parent_id)
        .bind(PUBLISHED)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    async fn list(&self, query: &ContentQuery) -> Result<ContentPage, StoreError> {
        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ITEM_COLUMNS} FROM content_items"
        ));
        push_list_predicates(&mut qb, query);
        match query.order {
            ListOrder::NewestFirst => qb.push(" ORDER BY created_at DESC, id DESC"),
            ListOrder::MenuOrder => qb.push(" ORDER BY menu_order ASC, id ASC"),
        };
        qb.push(" LIMIT ").push_bind(query.limit);
        qb.push(" OFFSET ").push_bind(query.offset);

        let items = qb
            .build_query_as::<ContentItem>()
            .fetch_all(&self.pool)
            .await?;

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM content_items");
        push_list_predicates(&mut count_qb, query);
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        Ok(ContentPage { items, total })
    }

    async fn search(&self, query: &SearchQuery) -> Result<ContentPage, StoreError> {
        let pattern = format!("%{}%", escape_like(&query.text));
        let list_query = ContentQuery {
            content_types: query.content_types.clone(),
            parent_id: None,
            filters: query.filters.clone(),
            limit: query.limit,
            offset: query.offset,
            order: ListOrder::NewestFirst,
        };

        let mut qb = QueryBuilder::<Postgres>::new(format!(
            "SELECT {ITEM_COLUMNS} FROM content_items"
        ));
        push_list_predicates(&mut qb, &list_query);
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR body ILIKE ")
            .push_bind(pattern.clone())
            .push(")");
        qb.push(" ORDER BY created_at DESC, id DESC");
        qb.push(" LIMIT ").push_bind(query.limit);
        qb.push(" OFFSET ").push_bind(query.offset);

        let items = qb
            .build_query_as::<ContentItem>()
            .fetch_all(&self.pool)
            .await?;

        let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM content_items");
        push_list_predicates(&mut count_qb, &list_query);
        count_qb
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR body ILIKE ")
            .push_bind(pattern)
            .push(")");
        let total: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;

        Ok(ContentPage { items, total })
    }

    async fn types(&self, names: &[String]) -> Result<Vec<TypeDescriptor>, StoreError> {
        let rows = sqlx::query_as::<_, TypeRow>(
            r#"
            SELECT name, label, description, hierarchical
            FROM content_types
            WHERE name = ANY($1)
            ORDER BY name
            "#,
        )
        .bind(names)
        .fetch_all(&self.pool)
        .await?;

        let mut descriptors = Vec::with_capacity(rows.len());
        for row in rows {
            let item_count: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM content_items WHERE content_type = $1 AND status = $2",
            )
            .bind(&row.name)
            .bind(PUBLISHED)
            .fetch_one(&self.pool)
            .await?;

            let meta_keys: Vec<String> = sqlx::query_scalar(
                r#"
                SELECT DISTINCT m.key
                FROM item_meta m
                JOIN content_items i ON i.id = m.item_id
                WHERE i.content_type = $1 AND left(m.key, 1) <> '_'
                ORDER BY m.key
                LIMIT $2
                "#,
            )
            .bind(&row.name)
            .bind(META_KEY_CAP)
            .fetch_all(&self.pool)
            .await?;

            let term_rows = sqlx::query_as::<_, TermRow>(
                r#"
                SELECT t.taxonomy, x.label, x.hierarchical,
                       t.id, t.name, t.slug, COUNT(it.item_id) AS count
                FROM terms t
                JOIN taxonomies x ON x.name = t.taxonomy
                JOIN item_terms it ON it.term_id = t.id
                JOIN content_items i
                  ON i.id = it.item_id AND i.content_type = $1 AND i.status = $2
                GROUP BY t.taxonomy, x.label, x.hierarchical, t.id, t.name, t.slug
                ORDER BY t.taxonomy, count DESC, t.name
                "#,
            )
            .bind(&row.name)
            .bind(PUBLISHED)
            .fetch_all(&self.pool)
            .await?;

            let mut taxonomies: BTreeMap<String, TaxonomySummary> = BTreeMap::new();
            for term in term_rows {
                let summary =
                    taxonomies
                        .entry(term.taxonomy.clone())
                        .or_insert_with(|| TaxonomySummary {
                            label: term.label.clone(),
                            hierarchical: term.hierarchical,
                            terms: Vec::new(),
                        });
                if summary.terms.len() < TERM_CAP {
                    summary.terms.push(TermSummary {
                        id: term.id,
                        name: term.name,
                        slug: term.slug,
                        count: term.count,
                    });
                }
            }

            descriptors.push(TypeDescriptor {
                name: row.name,
                label: row.label,
                description: row.description,
                hierarchical: row.hierarchical,
                item_count,
                meta_keys,
                taxonomies,
            });
        }

        Ok(descriptors)
    }

    async fn item_meta(&self, item_id: i64) -> Result<Vec<MetaField>, StoreError> {
        let fields = sqlx::query_as::<_, MetaField>(
            r#"
            SELECT key, value
            FROM item_meta
            WHERE item_id = $1 AND left(key, 1) <> '_'
            ORDER BY key, id
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(fields)
    }

    async fn item_terms(&self, item_id: i64) -> Result<Vec<ItemTerm>, StoreError> {
        let terms = sqlx::query_as::<_, ItemTerm>(
            r#"
            SELECT t.taxonomy, t.name, t.slug
            FROM terms t
            JOIN item_terms it ON it.term_id = t.id
            WHERE it.item_id = $1
            ORDER BY t.taxonomy, t.name
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(terms)
    }
}
