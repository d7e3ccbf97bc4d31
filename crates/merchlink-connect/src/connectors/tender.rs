//! # Tender Connector
//!
//! Create/list of payment-method configuration on the host.

use std::sync::Arc;

use serde_json::json;

use merchlink_core::validation::validate_label;
use merchlink_core::{ConnectorResult, TenderConfig};

use crate::cancel::CancelToken;
use crate::dispatch::ConnectorBase;

/// Connector for payment-method configuration.
#[derive(Clone)]
pub struct TenderConnector {
    base: Arc<ConnectorBase>,
    cancel: CancelToken,
}

impl TenderConnector {
    pub(crate) fn new(base: Arc<ConnectorBase>) -> Self {
        TenderConnector {
            base,
            cancel: CancelToken::never(),
        }
    }

    /// Derives a connector whose calls observe the given token.
    pub fn with_cancel(&self, cancel: CancelToken) -> Self {
        TenderConnector {
            base: self.base.clone(),
            cancel,
        }
    }

    /// Lists the configured tenders.
    pub async fn tenders(&self) -> ConnectorResult<Vec<TenderConfig>> {
        self.base
            .call("tenders.list", &json!({}), self.cancel.clone())
            .await
    }

    /// Registers a tender with the host.
    ///
    /// `label` is what the register displays; `label_key` is the stable key
    /// the embedding application uses to recognize its tender later.
    pub async fn create_tender(
        &self,
        label: &str,
        label_key: &str,
        opens_cash_drawer: bool,
    ) -> ConnectorResult<TenderConfig> {
        validate_label("label", label)?;
        validate_label("label_key", label_key)?;

        self.base
            .call(
                "tenders.create",
                &json!({
                    "label": label.trim(),
                    "label_key": label_key.trim(),
                    "opens_cash_drawer": opens_cash_drawer,
                }),
                self.cancel.clone(),
            )
            .await
    }
}
