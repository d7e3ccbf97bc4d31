//! # Order Connector
//!
//! Typed operations against the host's order service.
//!
//! Line-item mutations reference an existing order id; a missing id
//! surfaces as `NotFound` from the host - state is never silently created.

use std::sync::Arc;

use serde_json::json;

use merchlink_core::validation::{validate_id, validate_quantity};
use merchlink_core::{ConnectorResult, LineItem, Order};

use crate::cancel::CancelToken;
use crate::dispatch::ConnectorBase;

/// Connector for order queries and line-item mutations.
#[derive(Clone)]
pub struct OrderConnector {
    base: Arc<ConnectorBase>,
    cancel: CancelToken,
}

impl OrderConnector {
    pub(crate) fn new(base: Arc<ConnectorBase>) -> Self {
        OrderConnector {
            base,
            cancel: CancelToken::never(),
        }
    }

    /// Derives a connector whose calls observe the given token.
    pub fn with_cancel(&self, cancel: CancelToken) -> Self {
        OrderConnector {
            base: self.base.clone(),
            cancel,
        }
    }

    /// Returns the register's active order, or `None` when no order is
    /// open - absence is allowed here, not an error.
    pub async fn active_order(&self) -> ConnectorResult<Option<Order>> {
        self.base
            .call("orders.active", &json!({}), self.cancel.clone())
            .await
    }

    /// Fetches an order by id.
    pub async fn order(&self, order_id: &str) -> ConnectorResult<Order> {
        validate_id("order_id", order_id)?;
        self.base
            .call(
                "orders.get",
                &json!({ "order_id": order_id.trim() }),
                self.cancel.clone(),
            )
            .await
    }

    /// Adds a line item to an existing order.
    pub async fn add_line_item(
        &self,
        order_id: &str,
        item_id: &str,
        quantity: i64,
    ) -> ConnectorResult<LineItem> {
        validate_id("order_id", order_id)?;
        validate_id("item_id", item_id)?;
        validate_quantity(quantity)?;

        self.base
            .call(
                "orders.add_line_item",
                &json!({
                    "order_id": order_id.trim(),
                    "item_id": item_id.trim(),
                    "quantity": quantity,
                }),
                self.cancel.clone(),
            )
            .await
    }

    /// Removes a line item from an existing order.
    pub async fn remove_line_item(
        &self,
        order_id: &str,
        line_item_id: &str,
    ) -> ConnectorResult<()> {
        validate_id("order_id", order_id)?;
        validate_id("line_item_id", line_item_id)?;

        self.base
            .call(
                "orders.remove_line_item",
                &json!({
                    "order_id": order_id.trim(),
                    "line_item_id": line_item_id.trim(),
                }),
                self.cancel.clone(),
            )
            .await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
