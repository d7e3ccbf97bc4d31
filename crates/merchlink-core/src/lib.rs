//! # merchlink-core: Pure Types and Rules for Merchlink
//!
//! This crate is the shared foundation of the Merchlink connector framework.
//! It contains the error taxonomy, domain types, wire envelopes, filters,
//! and validation rules - all as pure code with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Merchlink Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Embedding Application                           │   │
//! │  │      inventory queries ── order mutations ── printing           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ typed operations                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              merchlink-connect (async connector core)           │   │
//! │  │      binding ── retry ── dispatch ── cache ── connectors        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ merchlink-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  error    │  │  filter   │  │ envelope  │  │   │
//! │  │   │ Inventory │  │ taxonomy  │  │fingerprint│  │ request/  │  │   │
//! │  │   │ Order ... │  │ (closed)  │  │ cache key │  │ response  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO TRANSPORT • NO ASYNC • PURE CODE                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (InventoryItem, Order, TenderConfig, ...)
//! - [`error`] - The closed connector error taxonomy
//! - [`envelope`] - Request/response wire envelopes
//! - [`filter`] - Inventory filters and canonical cache fingerprints
//! - [`validation`] - Argument validation rules
//!
//! ## Design Principles
//!
//! 1. **Closed taxonomy**: every fault a caller sees is one of the variants
//!    in [`error::ConnectorError`]
//! 2. **No I/O**: transport, threads, and clocks live in merchlink-connect
//! 3. **Integer money**: all monetary values are cents (i64), never floats
//! 4. **Validate at construction**: out-of-range wire codes are rejected
//!    locally, not deferred to the host

// =============================================================================
// Module Declarations
// =============================================================================

pub mod envelope;
pub mod error;
pub mod filter;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use merchlink_core::ConnectorError` instead of
// `use merchlink_core::error::ConnectorError`

pub use envelope::{HostError, HostErrorCode, HostReply, RequestEnvelope, ResponseEnvelope};
pub use error::{ConnectorError, ConnectorResult, TransportFault, ValidationError};
pub use filter::ItemFilter;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single line item.
///
/// Guards against fat-finger quantities (1000 typed instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum length of a host-assigned identifier.
pub const MAX_ID_LEN: usize = 64;

/// Maximum length of a display label.
pub const MAX_LABEL_LEN: usize = 200;
