//! # Host Transport Abstraction
//!
//! The seam between the connector core and the concrete IPC mechanism.
//!
//! The embedding application supplies a [`TransportFactory`]; the connector
//! never knows whether the wire is a platform binder, a domain socket, or an
//! in-process stub. The contract is narrow: one request/response exchange at
//! a time on a bound channel, plus a host-liveness subscription the binding
//! manager consumes to observe host death as an explicit event.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use merchlink_core::{
    ConnectorResult, Environment, RequestEnvelope, ResponseEnvelope, TransportFault,
};

// =============================================================================
// Service Kind
// =============================================================================

/// The host services a connector can bind.
///
/// Each service is a distinct binding target: inventory and order calls
/// travel on separate channels and may overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    Inventory,
    Orders,
    Merchant,
    Tenders,
    Printer,
}

impl ServiceKind {
    /// All bindable services.
    pub const ALL: [ServiceKind; 5] = [
        ServiceKind::Inventory,
        ServiceKind::Orders,
        ServiceKind::Merchant,
        ServiceKind::Tenders,
        ServiceKind::Printer,
    ];

    /// The method-namespace prefix for this service.
    pub fn namespace(&self) -> &'static str {
        match self {
            ServiceKind::Inventory => "inventory",
            ServiceKind::Orders => "orders",
            ServiceKind::Merchant => "merchant",
            ServiceKind::Tenders => "tenders",
            ServiceKind::Printer => "printer",
        }
    }
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.namespace())
    }
}

// =============================================================================
// Host Liveness
// =============================================================================

/// Liveness of the host process behind a bound channel.
///
/// Delivered through a watch subscription rather than a callback: the
/// binding manager consumes `Dead` as an explicit Bound→Unbound transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostLiveness {
    Alive,
    Dead,
}

// =============================================================================
// Transport Traits
// =============================================================================

/// A bound request/response channel to one host service.
///
/// The channel supports one outstanding call at a time; dispatch serializes
/// callers before invoking `call`. Implementations map their wire-level
/// failures to [`TransportFault`] and nothing else.
#[async_trait]
pub trait HostTransport: Send + Sync {
    /// Performs a single request/response exchange.
    async fn call(&self, request: RequestEnvelope) -> Result<ResponseEnvelope, TransportFault>;
}

impl std::fmt::Debug for dyn HostTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("HostTransport")
    }
}

/// Produces bound channels, one per (environment, service) target.
///
/// Supplied by the embedding application. Bind failures surface as
/// `ConnectorError::Binding` and are retried under the retry policy.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// Establishes a channel to the given service of the environment's host.
    async fn bind(
        &self,
        environment: Environment,
        service: ServiceKind,
    ) -> ConnectorResult<BoundChannel>;
}

// =============================================================================
// Bound Channel
// =============================================================================

/// A successfully established channel: the transport handle plus the
/// host-liveness subscription.
pub struct BoundChannel {
    /// The request/response channel.
    pub transport: Arc<dyn HostTransport>,

    /// Host-death events. The sender side lives in the transport
    /// implementation; dropping it without sending `Dead` means the
    /// subscription simply ends.
    pub liveness: watch::Receiver<HostLiveness>,
}

impl BoundChannel {
    /// Wraps a transport together with a liveness sender the implementation
    /// keeps to report host death.
    pub fn new(transport: Arc<dyn HostTransport>) -> (Self, watch::Sender<HostLiveness>) {
        let (tx, rx) = watch::channel(HostLiveness::Alive);
        (
            BoundChannel {
                transport,
                liveness: rx,
            },
            tx,
        )
    }
}
