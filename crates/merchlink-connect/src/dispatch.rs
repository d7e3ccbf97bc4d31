//! # Connector Base
//!
//! Generic typed request/response dispatch atop a bound transport.
//!
//! ## Dispatch Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dispatch Pipeline                                │
//! │                                                                         │
//! │  1. Thread-affinity guard      foreground thread? → ThreadAffinity     │
//! │  2. Ensure Bound               connect under the retry policy          │
//! │  3. Acquire the send slot      per-binding FIFO, one outstanding call  │
//! │  4. Send with timeout          default 10s, raced against cancel       │
//! │  5. Match + map                correlation id check, host error →      │
//! │                                taxonomy, raw faults never leak         │
//! │                                                                         │
//! │  Calls on the SAME binding queue in arrival order.                     │
//! │  Calls on DISTINCT bindings (inventory vs orders) overlap freely.      │
//! │  A cancelled call releases its slot; queued calls are not starved.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use merchlink_core::{
    ConnectorError, ConnectorResult, HostError, HostErrorCode, HostReply, RequestEnvelope,
    TransportFault, ValidationError,
};

use crate::binding::ServiceBinding;
use crate::cancel::CancelToken;
use crate::guard::ForegroundGuard;
use crate::retry::RetryPolicy;

/// Generic dispatch primitive shared by every domain connector.
///
/// One instance per binding: the send slot it owns is what serializes
/// concurrent calls against that binding.
pub struct ConnectorBase {
    binding: Arc<ServiceBinding>,
    guard: ForegroundGuard,
    retry: RetryPolicy,
    request_timeout: Duration,

    /// FIFO send slot. `tokio::sync::Mutex` queues waiters fairly, so calls
    /// acquire it in arrival order; dropping a queued acquire (cancellation)
    /// releases the position without starving the rest of the queue.
    send_slot: Mutex<()>,
}

impl ConnectorBase {
    pub fn new(
        binding: Arc<ServiceBinding>,
        guard: ForegroundGuard,
        retry: RetryPolicy,
        request_timeout: Duration,
    ) -> Arc<Self> {
        Arc::new(ConnectorBase {
            binding,
            guard,
            retry,
            request_timeout,
            send_slot: Mutex::new(()),
        })
    }

    /// The guard shared by operations on this binding.
    pub fn guard(&self) -> &ForegroundGuard {
        &self.guard
    }

    /// The binding this dispatcher drives.
    pub fn binding(&self) -> &Arc<ServiceBinding> {
        &self.binding
    }

    /// Typed call: serializes the request, dispatches, deserializes the
    /// response payload.
    pub async fn call<Req, Resp>(
        &self,
        method: &str,
        request: &Req,
        cancel: CancelToken,
    ) -> ConnectorResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let payload = serde_json::to_value(request)
            .map_err(|e| TransportFault::Serialization(e.to_string()))?;
        let raw = self.dispatch(method, payload, cancel).await?;
        serde_json::from_value(raw)
            .map_err(|e| TransportFault::Deserialization(e.to_string()).into())
    }

    /// Runs the full dispatch pipeline for one request.
    pub async fn dispatch(
        &self,
        method: &str,
        payload: serde_json::Value,
        cancel: CancelToken,
    ) -> ConnectorResult<serde_json::Value> {
        // 1. Guard before any transport interaction.
        self.guard.check(method)?;
        cancel.check()?;

        // 2. Ensure Bound, retrying transient bind failures.
        let binding = self.binding.clone();
        let transport = self
            .retry
            .run(cancel.clone(), move || {
                let binding = binding.clone();
                async move { binding.connect().await }
            })
            .await?;

        // 3. One outstanding call per binding, FIFO.
        let slot = self.send_slot.lock().await;
        cancel.check()?;

        // 4. Send and await the matching response, bounded by the request
        //    timeout and raced against cancellation.
        let request = RequestEnvelope::new(method, payload);
        let correlation_id = request.correlation_id;
        debug!(method, %correlation_id, "dispatching request");

        let mut cancel_wait = cancel.clone();
        let outcome = tokio::select! {
            result = tokio::time::timeout(self.request_timeout, transport.call(request)) => result,
            _ = cancel_wait.cancelled() => {
                // Release the slot so queued calls are not starved; the
                // cancelled call is terminal.
                drop(slot);
                debug!(method, %correlation_id, "call cancelled in flight");
                return Err(ConnectorError::Cancelled);
            }
        };

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(fault)) => {
                if matches!(fault, TransportFault::ChannelClosed) {
                    self.binding.mark_lost().await;
                }
                warn!(method, error = %fault, "transport fault");
                return Err(fault.into());
            }
            Err(_) => {
                warn!(method, timeout = ?self.request_timeout, "request timed out");
                return Err(TransportFault::Timeout(self.request_timeout).into());
            }
        };

        // 5. Correlation check, then host reply mapping.
        if response.correlation_id != correlation_id {
            return Err(TransportFault::MalformedResponse(format!(
                "correlation id mismatch: expected {}, got {}",
                correlation_id, response.correlation_id
            ))
            .into());
        }

        match response.reply {
            HostReply::Ok(value) => Ok(value),
            HostReply::Err(host_error) => Err(self.map_host_error(method, host_error)),
        }
    }

    /// Maps a host error discriminant to exactly one taxonomy kind.
    fn map_host_error(&self, method: &str, host_error: HostError) -> ConnectorError {
        match host_error.code {
            HostErrorCode::NotFound => ConnectorError::NotFound {
                resource: host_error.message,
            },
            HostErrorCode::PermissionDenied => ConnectorError::PermissionDenied {
                method: method.to_string(),
            },
            HostErrorCode::BadRequest => ConnectorError::Validation(ValidationError::Rejected {
                reason: host_error.message,
            }),
            HostErrorCode::Unavailable => ConnectorError::Binding {
                environment: self.binding.environment(),
                reason: host_error.message,
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
