//! # Validation Module
//!
//! Fail-fast request validation for FIXCEL POS.
//!
//! Everything here runs before any I/O: a rejected request has caused no
//! side effects whatsoever. Existence checks (seller, product, combo) need
//! the database and live in the engine, not here.

use crate::error::{ValidationError, ValidationResult};
use crate::types::{LossRequest, SaleRequest};
use crate::{MAX_LINE_QUANTITY, MAX_SALE_LINES};

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_LINE_QUANTITY`]
pub fn validate_quantity(field: &str, qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a sale request before any resolution or pricing.
///
/// ## Rules
/// - At least one product line or combo line
/// - No more than [`MAX_SALE_LINES`] lines in total
/// - Every quantity positive and in range
///
/// The discount is NOT validated here: negative discounts are clamped to
/// zero during pricing rather than rejected, matching the historical API.
pub fn validate_sale_request(request: &SaleRequest) -> ValidationResult<()> {
    if request.products.is_empty() && request.combos.is_empty() {
        return Err(ValidationError::EmptyCart);
    }

    if request.products.len() + request.combos.len() > MAX_SALE_LINES {
        return Err(ValidationError::TooManyLines {
            max: MAX_SALE_LINES,
        });
    }

    for line in &request.products {
        validate_quantity("product quantity", line.quantity)?;
    }

    for line in &request.combos {
        validate_quantity("combo quantity", line.quantity)?;
    }

    Ok(())
}

/// Validates a loss/warranty request.
///
/// ## Rules
/// - Quantity positive and in range
/// - Reason non-empty after trimming
pub fn validate_loss_request(request: &LossRequest) -> ValidationResult<()> {
    validate_quantity("quantity", request.quantity)?;

    if request.reason.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "reason".to_string(),
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
    use crate::types::{ComboLineRequest, LossRequest, ProductLineRequest};

    fn sale_request(products: Vec<(&str, i64)>, combos: Vec<(&str, i64)>) -> SaleRequest {
        SaleRequest {
            seller_id: None,
            products: products
                .into_iter()
                .map(|(id, quantity)| ProductLineRequest {
                    product_id: id.to_string(),
                    quantity,
                })
                .collect(),
            combos: combos
                .into_iter()
                .map(|(id, quantity)| ComboLineRequest {
                    combo_id: id.to_string(),
                    quantity,
                })
                .collect(),
            discount_cents: 0,
            payment_method: "cash".to_string(),
        }
    }

    #[test]
    fn test_empty_cart_rejected() {
        let request = sale_request(vec![], vec![]);
        assert_eq!(
            validate_sale_request(&request),
            Err(ValidationError::EmptyCart)
        );
    }

    #[test]
    fn test_combo_only_cart_accepted() {
        let request = sale_request(vec![], vec![("c1", 1)]);
        assert!(validate_sale_request(&request).is_ok());
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let request = sale_request(vec![("p1", 0)], vec![]);
        assert!(validate_sale_request(&request).is_err());

        let request = sale_request(vec![("p1", -2)], vec![]);
        assert!(validate_sale_request(&request).is_err());

        let request = sale_request(vec![("p1", 1)], vec![("c1", 0)]);
        assert!(validate_sale_request(&request).is_err());
    }

    #[test]
    fn test_quantity_upper_bound() {
        let request = sale_request(vec![("p1", MAX_LINE_QUANTITY + 1)], vec![]);
        assert!(validate_sale_request(&request).is_err());

        let request = sale_request(vec![("p1", MAX_LINE_QUANTITY)], vec![]);
        assert!(validate_sale_request(&request).is_ok());
    }

    #[test]
    fn test_loss_request_rules() {
        let ok = LossRequest {
            product_id: "p1".to_string(),
            quantity: 2,
            reason: "broken".to_string(),
        };
        assert!(validate_loss_request(&ok).is_ok());

        let no_reason = LossRequest {
            reason: "   ".to_string(),
            ..ok.clone()
        };
        assert_eq!(
            validate_loss_request(&no_reason),
            Err(ValidationError::Required {
                field: "reason".to_string()
            })
        );

        let zero_qty = LossRequest { quantity: 0, ..ok };
        assert!(validate_loss_request(&zero_qty).is_err());
    }
}
