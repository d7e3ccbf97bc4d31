//! # Domain Types
//!
//! Core domain types exchanged with the point-of-sale host.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ InventoryItem   │   │     Order       │   │  TenderConfig   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id             │   │  id             │   │  id             │       │
//! │  │  product_code   │   │  state          │   │  label          │       │
//! │  │  price_cents    │   │  line_items     │   │  enabled        │       │
//! │  │  price_type     │   │  total_cents    │   │  opens_drawer   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   Environment   │   │   PriceType     │   │  MerchantInfo   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Production     │   │  Fixed          │   │  merchant id    │       │
//! │  │  Sandbox        │   │  Variable       │   │  currency       │       │
//! │  │  Development    │   │  PerUnit        │   │  locale         │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All monetary values are integer cents (i64) - never floating point.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};

// =============================================================================
// Environment
// =============================================================================

/// The host environment a binding targets.
///
/// Each environment maps to a distinct host identity; a connector context
/// keeps exactly one live binding per environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Live merchant host.
    Production,

    /// Hosted sandbox with synthetic merchant data.
    #[default]
    Sandbox,

    /// Local development host.
    Development,
}

impl Environment {
    /// Returns the host identity this environment binds to.
    pub fn host_identity(&self) -> &'static str {
        match self {
            Environment::Production => "host.merchlink.production",
            Environment::Sandbox => "host.merchlink.sandbox",
            Environment::Development => "host.merchlink.development",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Production => write!(f, "production"),
            Environment::Sandbox => write!(f, "sandbox"),
            Environment::Development => write!(f, "development"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "sandbox" => Ok(Environment::Sandbox),
            "development" | "dev" => Ok(Environment::Development),
            other => Err(ValidationError::InvalidFormat {
                field: "environment".to_string(),
                reason: format!(
                    "unknown environment '{}'; valid options: production, sandbox, development",
                    other
                ),
            }),
        }
    }
}

// =============================================================================
// Price Type
// =============================================================================

/// How an inventory item is priced.
///
/// The host wire format carries this as an integer code; the connector
/// validates the code at construction time and rejects out-of-range values
/// locally instead of deferring to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceType {
    /// Fixed unit price.
    Fixed,
    /// Price entered at sale time.
    Variable,
    /// Price per measured unit (weight, length).
    PerUnit,
}

impl PriceType {
    /// Builds a price type from the host's integer code.
    ///
    /// Codes: 0 = fixed, 1 = variable, 2 = per-unit. Anything else is
    /// rejected with a `ValidationError` before reaching the host.
    pub fn from_code(code: i32) -> ValidationResult<Self> {
        match code {
            0 => Ok(PriceType::Fixed),
            1 => Ok(PriceType::Variable),
            2 => Ok(PriceType::PerUnit),
            _ => Err(ValidationError::OutOfRange {
                field: "price_type".to_string(),
                min: 0,
                max: 2,
            }),
        }
    }

    /// Returns the host wire code for this price type.
    pub const fn code(&self) -> i32 {
        match self {
            PriceType::Fixed => 0,
            PriceType::Variable => 1,
            PriceType::PerUnit => 2,
        }
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// An item in the merchant's inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    /// Unique identifier assigned by the host.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Price in cents (smallest currency unit).
    pub price_cents: i64,

    /// How the item is priced.
    pub price_type: PriceType,

    /// Category this item belongs to, if any.
    pub category_id: Option<String>,

    /// Merchant-facing product code (SKU / barcode).
    pub product_code: Option<String>,

    /// Hidden items are excluded from register display but remain orderable.
    pub hidden: bool,

    /// When the item was last modified on the host.
    pub modified_at: DateTime<Utc>,
}

/// An inventory category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    /// Display ordering on the register.
    pub sort_order: i32,
}

// =============================================================================
// Orders
// =============================================================================

/// The lifecycle state of an order on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    /// Accepting line-item mutations.
    Open,
    /// Tendering has begun; line items are frozen.
    Locked,
}

/// An order held by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub state: OrderState,
    /// ISO 4217 currency code.
    pub currency: String,
    pub line_items: Vec<LineItem>,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

/// A line item on an order.
///
/// Carries a snapshot of the item name and price at the time it was added,
/// so later inventory edits don't rewrite history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: String,
    pub order_id: String,
    pub item_id: String,
    /// Item name at the time it was added (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at the time it was added (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
}

// =============================================================================
// Tender
// =============================================================================

/// A configured payment method on the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenderConfig {
    pub id: String,
    /// Display label ("Gift Card", "House Account").
    pub label: String,
    /// Stable key the embedding application uses to identify its tender.
    pub label_key: String,
    pub enabled: bool,
    /// Whether selecting this tender opens the cash drawer.
    pub opens_cash_drawer: bool,
}

// =============================================================================
// Merchant
// =============================================================================

/// Identity and locale information for the bound merchant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MerchantInfo {
    pub id: String,
    pub name: String,
    /// ISO 4217 currency code.
    pub currency: String,
    /// BCP 47 locale tag.
    pub locale: String,
    pub address_lines: Vec<String>,
}

// =============================================================================
// Printing
// =============================================================================

/// A raster image submitted for receipt printing.
///
/// The host acknowledges the submission; callers typically treat the call as
/// fire-and-forget, but the connector still awaits that acknowledgement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterPrintJob {
    /// Raster row width in pixels.
    pub width_px: u32,
    /// Packed 1-bit-per-pixel raster rows.
    pub bitmap: Vec<u8>,
}

// =============================================================================
// Unit Tests
// =============================================================================
