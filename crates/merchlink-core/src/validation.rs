//! # Validation Module
//!
//! Argument validation for connector operations.
//!
//! Validation runs locally, before dispatch: a violating argument fails fast
//! with a `ValidationError` and never makes a round trip to the host.

use crate::error::{ValidationError, ValidationResult};
use crate::types::RasterPrintJob;
use crate::{MAX_ID_LEN, MAX_ITEM_QUANTITY, MAX_LABEL_LEN};

// =============================================================================
// Identifier Validators
// =============================================================================

/// Validates an entity identifier (item id, order id, tender id, ...).
///
/// ## Rules
/// - Must not be blank
/// - Must be at most 64 characters after trimming
///
/// The host assigns identifiers, so no format beyond non-blankness is
/// assumed here.
pub fn validate_id(field: &str, id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > MAX_ID_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_ID_LEN,
        });
    }

    Ok(())
}

/// Validates a display label (tender label, item name).
pub fn validate_label(field: &str, label: &str) -> ValidationResult<()> {
    let label = label.trim();

    if label.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if label.len() > MAX_LABEL_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_LABEL_LEN,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line-item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in cents.
///
/// Zero is allowed (open-price and promotional items).
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Print Job Validators
// =============================================================================

/// Validates a raster print job before submission.
///
/// ## Rules
/// - Width must be positive
/// - Bitmap must be non-empty
/// - Bitmap length must cover whole raster rows (width rounded up to bytes)
pub fn validate_raster(job: &RasterPrintJob) -> ValidationResult<()> {
    if job.width_px == 0 {
        return Err(ValidationError::MustBePositive {
            field: "width_px".to_string(),
        });
    }

    if job.bitmap.is_empty() {
        return Err(ValidationError::Required {
            field: "bitmap".to_string(),
        });
    }

    let row_bytes = job.width_px.div_ceil(8) as usize;
    if job.bitmap.len() % row_bytes != 0 {
        return Err(ValidationError::InvalidFormat {
            field: "bitmap".to_string(),
            reason: format!(
                "length {} is not a multiple of the {}-byte row size",
                job.bitmap.len(),
                row_bytes
            ),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("item_id", "itm-42").is_ok());
        assert!(validate_id("item_id", "").is_err());
        assert!(validate_id("item_id", "   ").is_err());
        assert!(validate_id("item_id", &"x".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_price_cents() {
        assert!(validate_price_cents(0).is_ok());
        assert!(validate_price_cents(1099).is_ok());
        assert!(validate_price_cents(-1).is_err());
    }

    #[test]
    fn test_validate_raster() {
        // 16px wide -> 2 bytes per row
        let ok = RasterPrintJob {
            width_px: 16,
            bitmap: vec![0u8; 8],
        };
        assert!(validate_raster(&ok).is_ok());

        let empty = RasterPrintJob {
            width_px: 16,
            bitmap: vec![],
        };
        assert!(validate_raster(&empty).is_err());

        let zero_width = RasterPrintJob {
            width_px: 0,
            bitmap: vec![0u8; 8],
        };
        assert!(validate_raster(&zero_width).is_err());

        let ragged = RasterPrintJob {
            width_px: 16,
            bitmap: vec![0u8; 7],
        };
        assert!(validate_raster(&ragged).is_err());
    }
}
