//! In-memory implementation of the storage traits.
//!
//! Used by tests and local development. Behavior mirrors the Postgres
//! backend: same visibility rules, same ordering, same counting semantics.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::api_key::{ApiKey, ApiKeyMeta, NewApiKey};
use crate::models::content::{
    ContentItem, ContentPage, ContentQuery, ItemTerm, ListOrder, MetaField, SearchQuery,
    TaxonomySummary, TermSummary, TypeDescriptor, PUBLISHED,
};
use crate::models::request_log::{DailyUsage, NewLogEntry};
use crate::store::{ContentRepository, KeyStore, RequestLogStore, StoreError};

#[derive(Debug, Clone)]
struct LogRow {
    entry: NewLogEntry,
    created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct TypeDef {
    name: String,
    label: String,
    description: String,
    hierarchical: bool,
}

#[derive(Debug, Clone)]
struct TaxonomyDef {
    name: String,
    label: String,
    hierarchical: bool,
}

#[derive(Debug, Clone)]
struct TermDef {
    id: i64,
    taxonomy: String,
    name: String,
    slug: String,
}

#[derive(Debug, Default)]
struct Inner {
    keys: Vec<ApiKey>,
    logs: Vec<LogRow>,
    items: Vec<ContentItem>,
    types: Vec<TypeDef>,
    taxonomies: Vec<TaxonomyDef>,
    terms: Vec<TermDef>,
    item_terms: Vec<(i64, i64)>,
    meta: Vec<(i64, String, String)>,
}

/// In-memory key store, request log, and content repository.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Seed one content item. The caller chooses the id.
    pub fn add_item(&self, item: ContentItem) {
        self.lock().items.push(item);
    }

    /// Register a content type for `types` enumeration.
    pub fn define_type(&self, name: &str, label: &str, description: &str, hierarchical: bool) {
        self.lock().types.push(TypeDef {
            name: name.to_string(),
            label: label.to_string(),
            description: description.to_string(),
            hierarchical,
        });
    }

    pub fn define_taxonomy(&self, name: &str, label: &str, hierarchical: bool) {
        self.lock().taxonomies.push(TaxonomyDef {
            name: name.to_string(),
            label: label.to_string(),
            hierarchical,
        });
    }

    /// Create a term within a taxonomy and return its id.
    pub fn add_term(&self, taxonomy: &str, name: &str, slug: &str) -> i64 {
        let mut inner = self.lock();
        let id = inner.terms.len() as i64 + 1;
        inner.terms.push(TermDef {
            id,
            taxonomy: taxonomy.to_string(),
            name: name.to_string(),
            slug: slug.to_string(),
        });
        id
    }

    /// Attach a term (by taxonomy and slug) to an item.
    pub fn tag_item(&self, item_id: i64, taxonomy: &str, slug: &str) {
        let mut inner = self.lock();
        if let Some(term_id) = inner
            .terms
            .iter()
            .find(|t| t.taxonomy == taxonomy && t.slug == slug)
            .map(|t| t.id)
        {
            inner.item_terms.push((item_id, term_id));
        }
    }

    pub fn set_meta(&self, item_id: i64, key: &str, value: &str) {
        self.lock()
            .meta
            .push((item_id, key.to_string(), value.to_string()));
    }

    /// Append a log entry with an explicit timestamp. Lets tests place
    /// requests inside or outside the rate-limit window.
    pub fn append_at(&self, entry: NewLogEntry, created_at: DateTime<Utc>) {
        self.lock().logs.push(LogRow { entry, created_at });
    }

    fn item_matches(&self, inner: &Inner, item: &ContentItem, query: &ContentQuery) -> bool {
        if item.status != PUBLISHED {
            return false;
        }
        if !query.content_types.iter().any(|t| t == &item.content_type) {
            return false;
        }
        if let Some(parent_id) = query.parent_id {
            if item.parent_id != Some(parent_id) {
                return false;
            }
        }
        let filters = &query.filters;
        if let Some(after) = filters.date_after {
            if item.created_at < after {
                return false;
            }
        }
        if let Some(before) = filters.date_before {
            if item.created_at > before {
                return false;
            }
        }
        if let Some(author) = &filters.author {
            if &item.author != author {
                return false;
            }
        }
        if let Some(category) = &filters.category {
            if !self.has_term(inner, item.id, "category", category) {
                return false;
            }
        }
        if let Some(tag) = &filters.tag {
            if !self.has_term(inner, item.id, "tag", tag) {
                return false;
            }
        }
        true
    }

    fn has_term(&self, inner: &Inner, item_id: i64, taxonomy: &str, slug: &str) -> bool {
        inner.terms.iter().any(|t| {
            t.taxonomy == taxonomy
                && t.slug == slug
                && inner
                    .item_terms
                    .iter()
                    .any(|(item, term)| *item == item_id && *term == t.id)
        })
    }
}

fn paginate(mut items: Vec<ContentItem>, order: ListOrder, limit: i64, offset: i64) -> ContentPage {
    match order {
        ListOrder::NewestFirst => {
            items.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
        }
        ListOrder::MenuOrder => {
            items.sort_by(|a, b| a.menu_order.cmp(&b.menu_order).then(a.id.cmp(&b.id)))
        }
    }
    let total = items.len() as i64;
    let items = items
        .into_iter()
        .skip(offset.max(0) as usize)
        .take(limit.max(0) as usize)
        .collect();
    ContentPage { items, total }
}

#[async_trait]
impl KeyStore for MemoryStore {
    async fn insert(&self, key: NewApiKey) -> Result<i64, StoreError> {
        let mut inner = self.lock();
        let id = inner.keys.len() as i64 + 1;
        inner.keys.push(ApiKey {
            id,
            key_hash: key.key_hash,
            name: key.name,
            permissions: key.permissions,
            rate_limit: key.rate_limit,
            created_at: Utc::now(),
            last_used_at: None,
            is_active: true,
        });
        Ok(id)
    }

    async fn find_active_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .keys
            .iter()
            .find(|k| k.key_hash == key_hash && k.is_active)
            .cloned())
    }

    async fn touch_last_used(&self, id: i64) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if let Some(key) = inner.keys.iter_mut().find(|k| k.id == id) {
            key.last_used_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn deactivate(&self, id: i64) -> Result<bool, StoreError> {
        let mut inner = self.lock();
        match inner.keys.iter_mut().find(|k| k.id == id) {
            Some(key) => {
                key.is_active = false;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list(&self) -> Result<Vec<ApiKeyMeta>, StoreError> {
        let inner = self.lock();
        let mut keys: Vec<ApiKeyMeta> = inner
            .keys
            .iter()
            .map(|k| ApiKeyMeta {
                id: k.id,
                name: k.name.clone(),
                rate_limit: k.rate_limit,
                created_at: k.created_at,
                last_used_at: k.last_used_at,
                is_active: k.is_active,
            })
            .collect();
        keys.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(keys)
    }
}

#[async_trait]
impl RequestLogStore for MemoryStore {
    async fn append(&self, entry: NewLogEntry) -> Result<(), StoreError> {
        self.append_at(entry, Utc::now());
        Ok(())
    }

    async fn count_since(&self, api_key_id: i64, since: DateTime<Utc>) -> Result<i64, StoreError> {
        let inner = self.lock();
        Ok(inner
            .logs
            .iter()
            .filter(|row| row.entry.api_key_id == api_key_id && row.created_at > since)
            .count() as i64)
    }

    async fn usage_by_day(
        &self,
        api_key_id: i64,
        since: DateTime<Utc>,
    ) -> Result<Vec<DailyUsage>, StoreError> {
        let inner = self.lock();
        let mut by_day: BTreeMap<chrono::NaiveDate, i64> = BTreeMap::new();
        for row in &inner.logs {
            if row.entry.api_key_id == api_key_id && row.created_at > since {
                *by_day.entry(row.created_at.date_naive()).or_default() += 1;
            }
        }
        Ok(by_day
            .into_iter()
            .rev()
            .map(|(date, requests)| DailyUsage { date, requests })
            .collect())
    }
}

#[async_trait]
impl ContentRepository for MemoryStore {
    async fn find_by_id(&self, id: i64) -> Result<Option<ContentItem>, StoreError> {
        let inner = self.lock();
        Ok(inner.items.iter().find(|i| i.id == id).cloned())
    }

    async fn find_by_slug(
        &self,
        slug: &str,
        content_type: Option<&str>,
    ) -> Result<Option<ContentItem>, StoreError> {
        let inner = self.lock();
        Ok(inner
            .items
            .iter()
            .find(|i| {
                i.slug == slug && content_type.is_none_or(|t| t == i.content_type)
            })
            .cloned())
    }

    async fn children(&self, parent_id: i64) -> Result<Vec<ContentItem>, StoreError> {
        let inner = self.lock();
        let mut children: Vec<ContentItem> = inner
            .items
            .iter()
            .filter(|i| i.parent_id == Some(parent_id) && i.status == PUBLISHED)
            .cloned()
            .collect();
        children.sort_by(|a, b| a.menu_order.cmp(&b.menu_order).then(a.id.cmp(&b.id)));
        Ok(children)
    }

    async fn list(&self, query: &ContentQuery) -> Result<ContentPage, StoreError> {
        let inner = self.lock();
        let matching: Vec<ContentItem> = inner
            .items
            .iter()
            .filter(|item| self.item_matches(&inner, item, query))
            .cloned()
            .collect();
        Ok(paginate(matching, query.order, query.limit, query.offset))
    }

    async fn search(&self, query: &SearchQuery) -> Result<ContentPage, StoreError> {
        let list_query = ContentQuery {
            content_types: query.content_types.clone(),
            parent_id: None,
            filters: query.filters.clone(),
            limit: query.limit,
            offset: query.offset,
            order: ListOrder::NewestFirst,
        };
        let needle = query.text.to_lowercase();
        let inner = self.lock();
        let matching: Vec<ContentItem> = inner
            .items
            .iter()
            .filter(|item| {
                self.item_matches(&inner, item, &list_query)
                    && (item.title.to_lowercase().contains(&needle)
                        || item.body.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect();
        Ok(paginate(
            matching,
            ListOrder::NewestFirst,
            query.limit,
            query.offset,
        ))
    }

    async fn types(&self, names: &[String]) -> Result<Vec<TypeDescriptor>, StoreError> {
        let inner = self.lock();
        let mut defs: Vec<TypeDef> = inner
            .types
            .iter()
            .filter(|t| names.contains(&t.name))
            .cloned()
            .collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));

        let mut descriptors = Vec::with_capacity(defs.len());
        for def in defs {
            let published: Vec<&ContentItem> = inner
                .items
                .iter()
                .filter(|i| i.content_type == def.name && i.status == PUBLISHED)
                .collect();

            let mut meta_keys: Vec<String> = Vec::new();
            for (item_id, key, _) in &inner.meta {
                if !key.starts_with('_')
                    && published.iter().any(|i| i.id == *item_id)
                    && !meta_keys.contains(key)
                {
                    meta_keys.push(key.clone());
                }
            }
            meta_keys.sort();
            meta_keys.truncate(20);

            let mut taxonomies: BTreeMap<String, TaxonomySummary> = BTreeMap::new();
            for taxonomy in &inner.taxonomies {
                let mut terms: Vec<TermSummary> = inner
                    .terms
                    .iter()
                    .filter(|t| t.taxonomy == taxonomy.name)
                    .filter_map(|t| {
                        let count = inner
                            .item_terms
                            .iter()
                            .filter(|(item_id, term_id)| {
                                *term_id == t.id && published.iter().any(|i| i.id == *item_id)
                            })
                            .count() as i64;
                        (count > 0).then(|| TermSummary {
                            id: t.id,
                            name: t.name.clone(),
                            slug: t.slug.clone(),
                            count,
                        })
                    })
                    .collect();
                if terms.is_empty() {
                    continue;
                }
                terms.sort_by(|a, b| b.count.cmp(&a.count).then(a.name.cmp(&b.name)));
                terms.truncate(10);
                taxonomies.insert(
                    taxonomy.name.clone(),
                    TaxonomySummary {
                        label: taxonomy.label.clone(),
                        hierarchical: taxonomy.hierarchical,
                        terms,
                    },
                );
            }

            descriptors.push(TypeDescriptor {
                name: def.name.clone(),
                label: def.label,
                description: def.description,
                hierarchical: def.hierarchical,
                item_count: published.len() as i64,
                meta_keys,
                taxonomies,
            });
        }

        Ok(descriptors)
    }

    async fn item_meta(&self, item_id: i64) -> Result<Vec<MetaField>, StoreError> {
        let inner = self.lock();
        let mut fields: Vec<MetaField> = inner
            .meta
            .iter()
            .filter(|(id, key, _)| *id == item_id && !key.starts_with('_'))
            .map(|(_, key, value)| MetaField {
                key: key.clone(),
                value: value.clone(),
            })
            .collect();
        fields.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(fields)
    }

    async fn item_terms(&self, item_id: i64) -> Result<Vec<ItemTerm>, StoreError> {
        let inner = self.lock();
        let mut terms: Vec<ItemTerm> = inner
            .terms
            .iter()
            .filter(|t| {
                inner
                    .item_terms
                    .iter()
                    .any(|(item, term)| *item == item_id && *term == t.id)
            })
            .map(|t| ItemTerm {
                taxonomy: t.taxonomy.clone(),
                name: t.name.clone(),
                slug: t.slug.clone(),
            })
            .collect();
        terms.sort_by(|a, b| a.taxonomy.cmp(&b.taxonomy).then(a.name.cmp(&b.name)));
        Ok(terms)
    }
}
