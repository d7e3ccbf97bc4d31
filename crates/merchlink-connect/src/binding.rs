//! # Binding Manager
//!
//! Owns the asynchronous connect/disconnect lifecycle to one host service.
//!
//! ## Binding Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      ServiceBinding States                              │
//! │                                                                         │
//! │  ┌────────────┐    connect()    ┌────────────┐                         │
//! │  │  Unbound   │ ──────────────► │  Binding   │                         │
//! │  └────────────┘                 └─────┬──────┘                         │
//! │        ▲                              │                                 │
//! │        │                    success   │   failure                      │
//! │        │                        ┌─────┴─────┐                          │
//! │        │                        ▼           ▼                           │
//! │        │              ┌────────────┐  ┌────────────┐                   │
//! │        │              │   Bound    │  │   Failed   │──connect()──►     │
//! │        │              └─────┬──────┘  └────────────┘   (re-enters      │
//! │        │                    │                            Binding)      │
//! │        │   disconnect() or host-death notification                     │
//! │        └────────────────────┘                                          │
//! │                                                                         │
//! │  CONCURRENT CONNECTS                                                   │
//! │  ───────────────────                                                   │
//! │  Callers arriving while an attempt is in flight join it and observe   │
//! │  its single outcome - never racing independent bind attempts.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use merchlink_core::{ConnectorError, ConnectorResult, Environment};

use crate::transport::{HostLiveness, HostTransport, ServiceKind, TransportFactory};

// =============================================================================
// Binding State
// =============================================================================

/// Observable state of a service binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingState {
    /// No channel; next call will bind.
    Unbound,
    /// A bind attempt is in flight.
    Binding,
    /// Channel established and usable.
    Bound,
    /// Last bind attempt failed; next call re-enters Binding.
    Failed,
}

impl std::fmt::Display for BindingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingState::Unbound => write!(f, "unbound"),
            BindingState::Binding => write!(f, "binding"),
            BindingState::Bound => write!(f, "bound"),
            BindingState::Failed => write!(f, "failed"),
        }
    }
}

// =============================================================================
// Service Binding
// =============================================================================

enum Inner {
    Unbound,
    Binding,
    Bound {
        transport: Arc<dyn HostTransport>,
        monitor: JoinHandle<()>,
    },
    Failed {
        reason: String,
    },
}

/// Outcome slot of an in-flight bind attempt: `None` while running.
type ConnectOutcome = Option<ConnectorResult<Arc<dyn HostTransport>>>;

enum Join {
    /// Binding completed while we were queueing.
    Ready(Arc<dyn HostTransport>),
    /// Wait on this attempt's outcome.
    Wait(watch::Receiver<ConnectOutcome>),
}

/// One binding to one host service of one environment.
///
/// Exactly one live instance exists per (environment, service) within a
/// connector context. The transport channel is established lazily on first
/// use and torn down on explicit disconnect or host-death notification.
pub struct ServiceBinding {
    environment: Environment,
    service: ServiceKind,
    factory: Arc<dyn TransportFactory>,
    connect_timeout: Duration,

    inner: RwLock<Inner>,

    /// In-flight attempt, if any. Callers joining while this is live await
    /// its outcome instead of starting their own.
    inflight: Mutex<Option<watch::Receiver<ConnectOutcome>>>,

    /// Bumped on every teardown. A bind attempt or death monitor only acts
    /// if the generation it started under is still current.
    generation: AtomicU64,
}

impl ServiceBinding {
    pub fn new(
        environment: Environment,
        service: ServiceKind,
        factory: Arc<dyn TransportFactory>,
        connect_timeout: Duration,
    ) -> Arc<Self> {
        Arc::new(ServiceBinding {
            environment,
            service,
            factory,
            connect_timeout,
            inner: RwLock::new(Inner::Unbound),
            inflight: Mutex::new(None),
            generation: AtomicU64::new(0),
        })
    }

    /// The environment this binding targets.
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// The host service this binding targets.
    pub fn service(&self) -> ServiceKind {
        self.service
    }

    /// Returns the current binding state.
    pub async fn state(&self) -> BindingState {
        match &*self.inner.read().await {
            Inner::Unbound => BindingState::Unbound,
            Inner::Binding => BindingState::Binding,
            Inner::Bound { .. } => BindingState::Bound,
            Inner::Failed { .. } => BindingState::Failed,
        }
    }

    /// Ensures the binding is Bound and returns the transport handle.
    ///
    /// Concurrent calls collapse into a single in-flight bind attempt; every
    /// caller observes that attempt's one outcome. A failed attempt leaves
    /// the binding in Failed; the next call starts a fresh attempt.
    pub async fn connect(self: &Arc<Self>) -> ConnectorResult<Arc<dyn HostTransport>> {
        // Fast path: already bound.
        if let Inner::Bound { transport, .. } = &*self.inner.read().await {
            return Ok(transport.clone());
        }

        let mut rx = match self.join_or_start_attempt().await {
            Join::Ready(transport) => return Ok(transport),
            Join::Wait(rx) => rx,
        };

        loop {
            let outcome = rx.borrow_and_update().clone();
            if let Some(result) = outcome {
                return result;
            }
            if rx.changed().await.is_err() {
                // Attempt task dropped without publishing (runtime shutdown).
                return Err(ConnectorError::Binding {
                    environment: self.environment,
                    reason: "bind attempt aborted".to_string(),
                });
            }
        }
    }

    async fn join_or_start_attempt(self: &Arc<Self>) -> Join {
        let mut inflight = self.inflight.lock().await;

        if let Some(rx) = &*inflight {
            if rx.borrow().is_none() {
                return Join::Wait(rx.clone());
            }
        }

        // No live attempt. Re-check the state under the in-flight lock: a
        // previous attempt may have completed between our fast-path read
        // and now.
        if let Inner::Bound { transport, .. } = &*self.inner.read().await {
            return Join::Ready(transport.clone());
        }

        let (tx, rx) = watch::channel(None);
        *inflight = Some(rx.clone());
        *self.inner.write().await = Inner::Binding;

        let binding = self.clone();
        tokio::spawn(async move { binding.run_attempt(tx).await });

        Join::Wait(rx)
    }

    /// Runs one bind attempt and publishes its single outcome.
    async fn run_attempt(self: Arc<Self>, tx: watch::Sender<ConnectOutcome>) {
        let generation = self.generation.load(Ordering::SeqCst);
        info!(
            environment = %self.environment,
            service = %self.service,
            "binding to host service"
        );

        let bound = match timeout(
            self.connect_timeout,
            self.factory.bind(self.environment, self.service),
        )
        .await
        {
            Ok(Ok(channel)) => Ok(channel),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(ConnectorError::Binding {
                environment: self.environment,
                reason: format!("handshake timed out after {:?}", self.connect_timeout),
            }),
        };

        let result = match bound {
            Ok(channel) => {
                let transport = channel.transport.clone();
                let monitor = self.clone().spawn_monitor(channel.liveness, generation);

                let mut inner = self.inner.write().await;
                if self.generation.load(Ordering::SeqCst) == generation {
                    *inner = Inner::Bound {
                        transport: transport.clone(),
                        monitor,
                    };
                    info!(
                        environment = %self.environment,
                        service = %self.service,
                        "bound"
                    );
                    Ok(transport)
                } else {
                    // Torn down while the handshake was in flight; discard.
                    monitor.abort();
                    Err(ConnectorError::Binding {
                        environment: self.environment,
                        reason: "binding torn down during connect".to_string(),
                    })
                }
            }
            Err(err) => {
                let mut inner = self.inner.write().await;
                if self.generation.load(Ordering::SeqCst) == generation
                    && matches!(*inner, Inner::Binding)
                {
                    *inner = Inner::Failed {
                        reason: err.to_string(),
                    };
                }
                warn!(
                    environment = %self.environment,
                    service = %self.service,
                    error = %err,
                    "bind attempt failed"
                );
                Err(err)
            }
        };

        // Clear the in-flight slot before publishing so late joiners start a
        // fresh attempt instead of clobbering a newer one.
        *self.inflight.lock().await = None;
        let _ = tx.send(Some(result));
    }

    /// Consumes the host-liveness subscription; a Dead event performs the
    /// explicit Bound→Unbound transition, after which the next call
    /// re-enters Binding.
    fn spawn_monitor(
        self: Arc<Self>,
        mut liveness: watch::Receiver<HostLiveness>,
        generation: u64,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            while liveness.changed().await.is_ok() {
                if *liveness.borrow() == HostLiveness::Dead {
                    warn!(
                        environment = %self.environment,
                        service = %self.service,
                        "host death notification, unbinding"
                    );
                    let mut inner = self.inner.write().await;
                    if self.generation.load(Ordering::SeqCst) == generation {
                        self.generation.fetch_add(1, Ordering::SeqCst);
                        *inner = Inner::Unbound;
                    }
                    return;
                }
            }
            // Sender dropped without a Dead event: subscription over.
        })
    }

    /// Tears the binding down. Idempotent: disconnecting an Unbound binding
    /// is a no-op.
    pub async fn disconnect(&self) {
        let mut inner = self.inner.write().await;
        if matches!(*inner, Inner::Unbound) {
            debug!(
                environment = %self.environment,
                service = %self.service,
                "disconnect on unbound binding is a no-op"
            );
            return;
        }

        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Inner::Bound { monitor, .. } = &*inner {
            monitor.abort();
        }
        *inner = Inner::Unbound;
        info!(
            environment = %self.environment,
            service = %self.service,
            "disconnected"
        );
    }

    /// Records that the bound channel was lost mid-call (closed under us).
    /// The next call re-enters Binding.
    pub(crate) async fn mark_lost(&self) {
        let mut inner = self.inner.write().await;
        if let Inner::Bound { monitor, .. } = &*inner {
            self.generation.fetch_add(1, Ordering::SeqCst);
            monitor.abort();
        } else {
            return;
        }
        *inner = Inner::Unbound;
        warn!(
            environment = %self.environment,
            service = %self.service,
            "channel lost, binding unbound"
        );
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
