//! # Printer Connector
//!
//! Raster receipt printing through the host.
//!
//! Callers usually treat printing as fire-and-forget, but the connector
//! still awaits the host's acknowledgement so failures surface as typed
//! errors instead of vanishing.

use std::sync::Arc;

use serde_json::json;
use tracing::debug;

use merchlink_core::validation::validate_raster;
use merchlink_core::{ConnectorResult, RasterPrintJob};

use crate::cancel::CancelToken;
use crate::dispatch::ConnectorBase;

/// Connector for receipt printing.
#[derive(Clone)]
pub struct PrinterConnector {
    base: Arc<ConnectorBase>,
    cancel: CancelToken,
}

impl PrinterConnector {
    pub(crate) fn new(base: Arc<ConnectorBase>) -> Self {
        PrinterConnector {
            base,
            cancel: CancelToken::never(),
        }
    }

    /// Derives a connector whose calls observe the given token.
    pub fn with_cancel(&self, cancel: CancelToken) -> Self {
        PrinterConnector {
            base: self.base.clone(),
            cancel,
        }
    }

    /// Submits a raster image for printing and awaits the host's
    /// acknowledgement.
    pub async fn print_raster(&self, job: &RasterPrintJob) -> ConnectorResult<()> {
        validate_raster(job)?;

        debug!(
            width_px = job.width_px,
            bytes = job.bitmap.len(),
            "submitting raster print job"
        );
        self.base
            .call::<_, ()>(
                "printer.print_raster",
                &json!({ "job": job }),
                self.cancel.clone(),
            )
            .await
    }
}
