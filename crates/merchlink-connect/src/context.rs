//! # Connector Context
//!
//! The explicit object owning all connector state for one environment.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       ConnectorContext                                  │
//! │                                                                         │
//! │  Owned per environment, constructed and torn down by the embedding     │
//! │  application. No global mutable state anywhere.                        │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────────────┐ │
//! │  │  Bindings    │  │  Dispatchers │  │  Inventory cache             │ │
//! │  │              │  │              │  │                              │ │
//! │  │ one per host │  │ one per      │  │ fingerprint → snapshot,      │ │
//! │  │ service,     │  │ binding,     │  │ TTL-bounded, coalescing      │ │
//! │  │ lazy connect │  │ FIFO slot    │  │                              │ │
//! │  └──────────────┘  └──────────────┘  └──────────────────────────────┘ │
//! │                                                                         │
//! │  inventory() / orders() / merchant() / tenders() / printer()          │
//! │  hand out cheap cloneable facades over the shared dispatchers.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use merchlink_core::Environment;

use crate::cache::{CacheStats, InventoryCache};
use crate::config::ConnectorConfig;
use crate::connectors::{
    InventoryConnector, MerchantConnector, OrderConnector, PrinterConnector, TenderConnector,
};
use crate::dispatch::ConnectorBase;
use crate::guard::ForegroundGuard;
use crate::transport::{ServiceKind, TransportFactory};

use crate::binding::BindingState;

/// Connector state for one environment: one binding per host service, the
/// shared dispatchers, and the inventory cache.
///
/// Calls on distinct services travel on distinct bindings and may overlap;
/// calls on one service queue FIFO on its dispatcher.
pub struct ConnectorContext {
    environment: Environment,
    bases: HashMap<ServiceKind, Arc<ConnectorBase>>,
    inventory_cache: Arc<InventoryCache>,
}

impl ConnectorContext {
    /// Builds a context from configuration, a transport factory, and the
    /// foreground guard registered by the embedding application.
    ///
    /// Bindings start Unbound; each connects lazily on its first call.
    pub fn new(
        config: ConnectorConfig,
        factory: Arc<dyn TransportFactory>,
        guard: ForegroundGuard,
    ) -> Self {
        let environment = config.host.environment;
        let retry = config.retry_policy();

        let bases = ServiceKind::ALL
            .into_iter()
            .map(|service| {
                let binding = crate::binding::ServiceBinding::new(
                    environment,
                    service,
                    factory.clone(),
                    config.connect_timeout(),
                );
                let base = ConnectorBase::new(
                    binding,
                    guard.clone(),
                    retry.clone(),
                    config.request_timeout(),
                );
                (service, base)
            })
            .collect();

        info!(%environment, "connector context created");
        ConnectorContext {
            environment,
            bases,
            inventory_cache: Arc::new(InventoryCache::new(config.cache_ttl())),
        }
    }

    /// The environment this context binds.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// The inventory connector.
    pub fn inventory(&self) -> InventoryConnector {
        InventoryConnector::new(
            self.base(ServiceKind::Inventory),
            self.inventory_cache.clone(),
        )
    }

    /// The order connector.
    pub fn orders(&self) -> OrderConnector {
        OrderConnector::new(self.base(ServiceKind::Orders))
    }

    /// The merchant connector.
    pub fn merchant(&self) -> MerchantConnector {
        MerchantConnector::new(self.base(ServiceKind::Merchant))
    }

    /// The tender connector.
    pub fn tenders(&self) -> TenderConnector {
        TenderConnector::new(self.base(ServiceKind::Tenders))
    }

    /// The printer connector.
    pub fn printer(&self) -> PrinterConnector {
        PrinterConnector::new(self.base(ServiceKind::Printer))
    }

    /// Observable state of one service binding.
    pub async fn binding_state(&self, service: ServiceKind) -> BindingState {
        self.base(service).binding().state().await
    }

    /// Inventory cache counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.inventory_cache.stats()
    }

    /// Tears down every binding and clears the cache.
    ///
    /// Idempotent: disconnecting an already-unbound context is a no-op.
    /// The embedding application calls this at end of use.
    pub async fn shutdown(&self) {
        for base in self.bases.values() {
            base.binding().disconnect().await;
        }
        self.inventory_cache.invalidate().await;
        info!(environment = %self.environment, "connector context shut down");
    }

    fn base(&self, service: ServiceKind) -> Arc<ConnectorBase> {
        // ALL services are populated in new(); the map is total.
        self.bases[&service].clone()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
