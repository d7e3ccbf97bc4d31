//! # Inventory Connector
//!
//! Typed operations against the host's inventory service.
//!
//! List queries go through the read-through cache; a successful write
//! (save/delete) invalidates the whole cache, so the next read fetches
//! fresh data from the host.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use merchlink_core::validation::{validate_id, validate_label, validate_price_cents};
use merchlink_core::{Category, ConnectorResult, InventoryItem, ItemFilter};

use crate::cache::{InventoryCache, ItemsSnapshot};
use crate::cancel::CancelToken;
use crate::dispatch::ConnectorBase;

/// Connector for inventory queries and mutations.
#[derive(Clone)]
pub struct InventoryConnector {
    base: Arc<ConnectorBase>,
    cache: Arc<InventoryCache>,
    cancel: CancelToken,
}

impl InventoryConnector {
    pub(crate) fn new(base: Arc<ConnectorBase>, cache: Arc<InventoryCache>) -> Self {
        InventoryConnector {
            base,
            cache,
            cancel: CancelToken::never(),
        }
    }

    /// Derives a connector whose calls observe the given token.
    pub fn with_cancel(&self, cancel: CancelToken) -> Self {
        InventoryConnector {
            base: self.base.clone(),
            cache: self.cache.clone(),
            cancel,
        }
    }

    /// Lists inventory items, optionally filtered by category and/or
    /// product code.
    ///
    /// Served from the cache while the entry is within its TTL; concurrent
    /// misses for the same filter coalesce into one host call.
    pub async fn items(&self, filter: &ItemFilter) -> ConnectorResult<ItemsSnapshot> {
        // The guard runs even when the cache could answer: a foreground
        // call is a programmer error regardless of cache state.
        self.base.guard().check("inventory.items")?;

        let filter = filter.normalized();
        let base = self.base.clone();
        let cancel = self.cancel.clone();
        let request = filter.clone();

        self.cache
            .get_or_fetch(&filter, move || async move {
                base.call("inventory.items", &json!({ "filter": request }), cancel)
                    .await
            })
            .await
    }

    /// Fetches a single item by id.
    pub async fn item(&self, item_id: &str) -> ConnectorResult<InventoryItem> {
        validate_id("item_id", item_id)?;
        self.base
            .call(
                "inventory.item",
                &json!({ "item_id": item_id.trim() }),
                self.cancel.clone(),
            )
            .await
    }

    /// Creates or updates an item; returns the saved item as the host
    /// stored it (with a host-assigned id on create).
    pub async fn save_item(&self, item: &InventoryItem) -> ConnectorResult<InventoryItem> {
        validate_label("name", &item.name)?;
        validate_price_cents(item.price_cents)?;
        if !item.id.is_empty() {
            validate_id("item_id", &item.id)?;
        }
        if let Some(category_id) = &item.category_id {
            validate_id("category_id", category_id)?;
        }

        let saved: InventoryItem = self
            .base
            .call("inventory.save_item", &json!({ "item": item }), self.cancel.clone())
            .await?;

        debug!(item_id = %saved.id, "item saved, invalidating cache");
        self.cache.invalidate().await;
        Ok(saved)
    }

    /// Deletes an item by id.
    pub async fn delete_item(&self, item_id: &str) -> ConnectorResult<()> {
        validate_id("item_id", item_id)?;

        self.base
            .call::<_, ()>(
                "inventory.delete_item",
                &json!({ "item_id": item_id.trim() }),
                self.cancel.clone(),
            )
            .await?;

        debug!(item_id, "item deleted, invalidating cache");
        self.cache.invalidate().await;
        Ok(())
    }

    /// Lists inventory categories.
    pub async fn categories(&self) -> ConnectorResult<Vec<Category>> {
        self.base
            .call("inventory.categories", &json!({}), self.cancel.clone())
            .await
    }

    /// Drops every cached list query.
    pub async fn invalidate_cache(&self) {
        self.cache.invalidate().await;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
