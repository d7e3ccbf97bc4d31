//! # Merchant Connector
//!
//! Read-only access to the bound merchant's identity and locale.

use std::sync::Arc;

use serde_json::json;

use merchlink_core::{ConnectorResult, MerchantInfo};

use crate::cancel::CancelToken;
use crate::dispatch::ConnectorBase;

/// Connector for merchant information.
#[derive(Clone)]
pub struct MerchantConnector {
    base: Arc<ConnectorBase>,
    cancel: CancelToken,
}

impl MerchantConnector {
    pub(crate) fn new(base: Arc<ConnectorBase>) -> Self {
        MerchantConnector {
            base,
            cancel: CancelToken::never(),
        }
    }

    /// Derives a connector whose calls observe the given token.
    pub fn with_cancel(&self, cancel: CancelToken) -> Self {
        MerchantConnector {
            base: self.base.clone(),
            cancel,
        }
    }

    /// Fetches identity and locale information for the bound merchant.
    pub async fn merchant_info(&self) -> ConnectorResult<MerchantInfo> {
        self.base
            .call("merchant.info", &json!({}), self.cancel.clone())
            .await
    }
}
