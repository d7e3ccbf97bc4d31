//! End-to-end scenarios over an in-memory host.
//!
//! A tiny scripted POS host implements the transport seam directly, so the
//! full pipeline runs: context → connector → cache → dispatch → binding →
//! transport, with no real IPC.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use merchlink_connect::core::{
    ConnectorError, ConnectorResult, Environment, HostErrorCode, ItemFilter, RequestEnvelope,
    ResponseEnvelope, TransportFault,
};
use merchlink_connect::{
    BoundChannel, CancelToken, ConnectorConfig, ConnectorContext, ForegroundGuard, HostTransport,
    ServiceKind, TransportFactory,
};

// =============================================================================
// In-Memory Host
// =============================================================================

/// Scripted host state shared by every service binding.
struct HostState {
    items: Vec<serde_json::Value>,
    orders: HashMap<String, serde_json::Value>,
    method_calls: HashMap<String, u32>,
}

struct InMemoryHost {
    state: Mutex<HostState>,
}

impl InMemoryHost {
    fn new() -> Arc<Self> {
        let mut orders = HashMap::new();
        orders.insert(
            "o-1".to_string(),
            json!({
                "id": "o-1",
                "state": "open",
                "currency": "USD",
                "line_items": [],
                "total_cents": 0,
                "created_at": "2026-08-07T00:00:00Z",
                "modified_at": "2026-08-07T00:00:00Z",
            }),
        );
        Arc::new(InMemoryHost {
            state: Mutex::new(HostState {
                items: vec![
                    json!({
                        "id": "i-1",
                        "name": "USB Cable",
                        "price_cents": 999,
                        "price_type": "fixed",
                        "category_id": "electronics",
                        "product_code": "USB-01",
                        "hidden": false,
                        "modified_at": "2026-08-07T00:00:00Z",
                    }),
                    json!({
                        "id": "i-2",
                        "name": "Cola",
                        "price_cents": 250,
                        "price_type": "fixed",
                        "category_id": "drinks",
                        "product_code": "COKE-330",
                        "hidden": false,
                        "modified_at": "2026-08-07T00:00:00Z",
                    }),
                ],
                orders,
                method_calls: HashMap::new(),
            }),
        })
    }

    fn calls(&self, method: &str) -> u32 {
        *self
            .state
            .lock()
            .unwrap()
            .method_calls
            .get(method)
            .unwrap_or(&0)
    }
}

#[async_trait]
impl HostTransport for InMemoryHost {
    async fn call(&self, request: RequestEnvelope) -> Result<ResponseEnvelope, TransportFault> {
        let mut state = self.state.lock().unwrap();
        *state
            .method_calls
            .entry(request.method.clone())
            .or_insert(0) += 1;

        let reply = match request.method.as_str() {
            "inventory.items" => {
                let category = request.payload["filter"]["category_id"].as_str();
                let code = request.payload["filter"]["product_code"].as_str();
                let matches: Vec<_> = state
                    .items
                    .iter()
                    .filter(|item| {
                        category.map_or(true, |c| item["category_id"] == c)
                            && code.map_or(true, |p| item["product_code"] == p)
                    })
                    .cloned()
                    .collect();
                return Ok(ResponseEnvelope::ok(
                    request.correlation_id,
                    json!(matches),
                ));
            }
            "inventory.save_item" => {
                let mut item = request.payload["item"].clone();
                if item["id"] == "" {
                    item["id"] = json!("i-new");
                }
                state.items.push(item.clone());
                item
            }
            "orders.add_line_item" => {
                let order_id = request.payload["order_id"].as_str().unwrap_or_default();
                if !state.orders.contains_key(order_id) {
                    return Ok(ResponseEnvelope::err(
                        request.correlation_id,
                        HostErrorCode::NotFound,
                        format!("order {order_id}"),
                    ));
                }
                json!({
                    "id": "li-1",
                    "order_id": order_id,
                    "item_id": request.payload["item_id"],
                    "name_snapshot": "USB Cable",
                    "unit_price_cents": 999,
                    "quantity": request.payload["quantity"],
                })
            }
            "orders.active" => state.orders.get("o-1").cloned().unwrap_or(json!(null)),
            "merchant.info" => json!({
                "id": "m-1",
                "name": "Corner Store",
                "currency": "USD",
                "locale": "en-US",
                "address_lines": ["1 Main St"],
            }),
            "printer.print_raster" => json!(null),
            other => {
                return Ok(ResponseEnvelope::err(
                    request.correlation_id,
                    HostErrorCode::BadRequest,
                    format!("unknown method {other}"),
                ))
            }
        };

        Ok(ResponseEnvelope::ok(request.correlation_id, reply))
    }
}

/// Factory serving every service from the shared in-memory host.
struct InMemoryFactory {
    host: Arc<InMemoryHost>,
    binds: AtomicU32,
}

impl InMemoryFactory {
    fn new(host: Arc<InMemoryHost>) -> Arc<Self> {
        Arc::new(InMemoryFactory {
            host,
            binds: AtomicU32::new(0),
        })
    }
}

#[async_trait]
impl TransportFactory for InMemoryFactory {
    async fn bind(
        &self,
        _environment: Environment,
        _service: ServiceKind,
    ) -> ConnectorResult<BoundChannel> {
        self.binds.fetch_add(1, Ordering::SeqCst);
        let (channel, liveness) = BoundChannel::new(self.host.clone());
        std::mem::forget(liveness);
        Ok(channel)
    }
}

/// Factory for an absent host: every bind fails.
struct AbsentHostFactory {
    binds: AtomicU32,
}

#[async_trait]
impl TransportFactory for AbsentHostFactory {
    async fn bind(
        &self,
        environment: Environment,
        _service: ServiceKind,
    ) -> ConnectorResult<BoundChannel> {
        self.binds.fetch_add(1, Ordering::SeqCst);
        Err(ConnectorError::Binding {
            environment,
            reason: "host absent".to_string(),
        })
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn context_over(host: &Arc<InMemoryHost>) -> (ConnectorContext, Arc<InMemoryFactory>) {
    init_tracing();
    let factory = InMemoryFactory::new(host.clone());
    let context = ConnectorContext::new(
        ConnectorConfig::default(),
        factory.clone(),
        ForegroundGuard::disabled(),
    );
    (context, factory)
}

// =============================================================================
// Scenario A: absent host exhausts bind retries
// =============================================================================

#[tokio::test(start_paused = true)]
async fn scenario_a_absent_host_exhausts_retries_with_backoff() {
    let factory = Arc::new(AbsentHostFactory {
        binds: AtomicU32::new(0),
    });
    let context = ConnectorContext::new(
        ConnectorConfig::default(),
        factory.clone(),
        ForegroundGuard::disabled(),
    );

    let started = tokio::time::Instant::now();
    let err = context
        .inventory()
        .items(&ItemFilter::all())
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectorError::Binding { .. }));
    // Initial attempt plus 3 retries.
    assert_eq!(factory.binds.load(Ordering::SeqCst), 4);
    // Backoff delays 1s + 2s + 4s between attempts.
    assert!(started.elapsed() >= Duration::from_secs(7));
}

// =============================================================================
// Scenario B: repeated reads within the TTL hit the cache
// =============================================================================

#[tokio::test]
async fn scenario_b_second_read_within_ttl_makes_no_transport_call() {
    let host = InMemoryHost::new();
    let (context, _) = context_over(&host);
    let inventory = context.inventory();
    let filter = ItemFilter::by_category("electronics");

    let first = inventory.items(&filter).await.unwrap();
    let second = inventory.items(&filter).await.unwrap();

    assert_eq!(first.len(), 1);
    assert_eq!(first[0].id, "i-1");
    // The second call returns the identical cached snapshot.
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(host.calls("inventory.items"), 1);
}

// =============================================================================
// Scenario C: a write invalidates, the next read fetches fresh
// =============================================================================

#[tokio::test]
async fn scenario_c_save_invalidates_cache() {
    let host = InMemoryHost::new();
    let (context, _) = context_over(&host);
    let inventory = context.inventory();
    let filter = ItemFilter::by_category("drinks");

    let before = inventory.items(&filter).await.unwrap();
    assert_eq!(before.len(), 1);

    let new_item = merchlink_connect::core::InventoryItem {
        id: String::new(),
        name: "Lemonade".into(),
        price_cents: 300,
        price_type: merchlink_connect::core::PriceType::Fixed,
        category_id: Some("drinks".into()),
        product_code: Some("LEMON-01".into()),
        hidden: false,
        modified_at: chrono::DateTime::parse_from_rfc3339("2026-08-07T00:00:00Z")
            .unwrap()
            .with_timezone(&chrono::Utc),
    };
    let saved = inventory.save_item(&new_item).await.unwrap();
    assert_eq!(saved.id, "i-new");

    let after = inventory.items(&filter).await.unwrap();
    assert_eq!(after.len(), 2);
    // One fetch before the write, one after invalidation.
    assert_eq!(host.calls("inventory.items"), 2);
}

// =============================================================================
// Scenario D: missing order id surfaces NotFound, zero retries
// =============================================================================

#[tokio::test]
async fn scenario_d_missing_order_is_not_found_without_retry() {
    let host = InMemoryHost::new();
    let (context, _) = context_over(&host);

    let err = context
        .orders()
        .add_line_item("missing", "x", 1)
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectorError::NotFound { .. }));
    assert_eq!(host.calls("orders.add_line_item"), 1);
}

// =============================================================================
// Cross-cutting scenarios
// =============================================================================

#[tokio::test(flavor = "current_thread")]
async fn foreground_call_fails_fast_with_no_side_effect() {
    let host = InMemoryHost::new();
    let factory = InMemoryFactory::new(host.clone());
    // The test body runs on the runtime's only thread; registering it as
    // foreground makes every connector call a violation.
    let context = ConnectorContext::new(
        ConnectorConfig::default(),
        factory.clone(),
        ForegroundGuard::register(),
    );

    let err = context
        .inventory()
        .items(&ItemFilter::all())
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectorError::ThreadAffinity { .. }));

    let err = context.orders().active_order().await.unwrap_err();
    assert!(matches!(err, ConnectorError::ThreadAffinity { .. }));

    // No bind, no transport call.
    assert_eq!(factory.binds.load(Ordering::SeqCst), 0);
    assert_eq!(host.calls("inventory.items"), 0);
}

#[tokio::test]
async fn distinct_services_bind_independently() {
    let host = InMemoryHost::new();
    let (context, factory) = context_over(&host);

    context
        .inventory()
        .items(&ItemFilter::all())
        .await
        .unwrap();
    context.orders().active_order().await.unwrap();
    context.merchant().merchant_info().await.unwrap();

    // One bind per touched service, none for the untouched ones.
    assert_eq!(factory.binds.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn concurrent_equal_filters_coalesce_into_one_fetch() {
    let host = InMemoryHost::new();
    let (context, _) = context_over(&host);
    let inventory = context.inventory();

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let inventory = inventory.clone();
        tasks.push(tokio::spawn(async move {
            inventory.items(&ItemFilter::by_category("drinks")).await
        }));
    }

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    assert_eq!(host.calls("inventory.items"), 1);
}

#[tokio::test]
async fn cancelled_call_is_terminal() {
    let host = InMemoryHost::new();
    let (context, _) = context_over(&host);

    let (handle, token) = CancelToken::pair();
    handle.cancel();

    let err = context
        .orders()
        .with_cancel(token)
        .active_order()
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectorError::Cancelled));
    assert_eq!(host.calls("orders.active"), 0);
}

#[tokio::test]
async fn shutdown_unbinds_everything() {
    let host = InMemoryHost::new();
    let (context, _) = context_over(&host);

    context
        .inventory()
        .items(&ItemFilter::all())
        .await
        .unwrap();
    context.shutdown().await;

    for service in ServiceKind::ALL {
        assert_eq!(
            context.binding_state(service).await,
            merchlink_connect::BindingState::Unbound
        );
    }

    // A context is still usable after shutdown: the next call rebinds.
    context
        .inventory()
        .items(&ItemFilter::all())
        .await
        .unwrap();
    assert_eq!(
        context.binding_state(ServiceKind::Inventory).await,
        merchlink_connect::BindingState::Bound
    );
}
