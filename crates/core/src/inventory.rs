//! Parts inventory rules: stock status, movement application and counts.

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_MIN_STOCK: i32 = 0;
pub const DEFAULT_MAX_STOCK: i32 = 100;

/// Code of the stock location new imported parts are placed in.
pub const CENTRAL_LOCATION_CODE: &str = "ALM_CENTRAL";

/// Group label for parts without a stock location in the count report.
pub const NO_LOCATION_LABEL: &str = "No location";

pub const STOCK_STATUS_LOW: &str = "low";
pub const STOCK_STATUS_NORMAL: &str = "normal";

/// `low` when quantity is at or below the minimum.
pub fn stock_status(quantity: i32, min_stock: i32) -> &'static str {
    if quantity <= min_stock {
        STOCK_STATUS_LOW
    } else {
        STOCK_STATUS_NORMAL
    }
}

// ---------------------------------------------------------------------------
// Movement types
// ---------------------------------------------------------------------------

pub const MOVEMENT_IN: &str = "in";
pub const MOVEMENT_OUT: &str = "out";
pub const MOVEMENT_TRANSFER: &str = "transfer";
pub const MOVEMENT_ADJUSTMENT: &str = "adjustment";

pub const VALID_MOVEMENT_TYPES: &[&str] =
    &[MOVEMENT_IN, MOVEMENT_OUT, MOVEMENT_TRANSFER, MOVEMENT_ADJUSTMENT];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementType {
    In,
    Out,
    Transfer,
    Adjustment,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => MOVEMENT_IN,
            Self::Out => MOVEMENT_OUT,
            Self::Transfer => MOVEMENT_TRANSFER,
            Self::Adjustment => MOVEMENT_ADJUSTMENT,
        }
    }

    pub fn from_str(s: &str) -> Result<Self, CoreError> {
        match s {
            MOVEMENT_IN => Ok(Self::In),
            MOVEMENT_OUT => Ok(Self::Out),
            MOVEMENT_TRANSFER => Ok(Self::Transfer),
            MOVEMENT_ADJUSTMENT => Ok(Self::Adjustment),
            other => Err(CoreError::Validation(format!(
                "Invalid movement type: '{other}'. Valid types: {}",
                VALID_MOVEMENT_TYPES.join(", ")
            ))),
        }
    }

    /// Parse a movement type a user may post directly.
    ///
    /// Adjustments are only written by inventory counts.
    pub fn from_user_input(s: &str, allow_transfer: bool) -> Result<Self, CoreError> {
        let parsed = Self::from_str(s)?;
        match parsed {
            Self::Adjustment => Err(CoreError::Validation(
                "Adjustments are recorded through inventory counts".to_string(),
            )),
            Self::Transfer if !allow_transfer => Err(CoreError::Validation(
                "Movement type must be 'in' or 'out'".to_string(),
            )),
            other => Ok(other),
        }
    }
}

/// Quantity after applying a user movement to `current`.
///
/// `in` adds, `out` subtracts and must not go negative, `transfer` leaves
/// the quantity alone.
pub fn apply_movement(
    current: i32,
    movement: MovementType,
    quantity: i32,
) -> Result<i32, CoreError> {
    if quantity <= 0 {
        return Err(CoreError::Validation(
            "Quantity must be greater than zero".to_string(),
        ));
    }
    match movement {
        MovementType::In => current.checked_add(quantity).ok_or_else(|| {
            CoreError::Validation("Resulting quantity is too large".to_string())
        }),
        MovementType::Out => {
            if quantity > current {
                return Err(insufficient_stock(current, quantity));
            }
            Ok(current - quantity)
        }
        MovementType::Transfer | MovementType::Adjustment => Ok(current),
    }
}

/// Error for an outgoing movement larger than what is on hand.
pub fn insufficient_stock(available: i32, requested: i32) -> CoreError {
    CoreError::Validation(format!(
        "Insufficient stock: {available} available, {requested} requested"
    ))
}

// ---------------------------------------------------------------------------
// Counts
// ---------------------------------------------------------------------------

/// Difference recorded by a physical count (`counted - system`).
pub fn count_difference(system_quantity: i32, counted_quantity: i32) -> Result<i32, CoreError> {
    if counted_quantity < 0 {
        return Err(CoreError::Validation(
            "Counted quantity must not be negative".to_string(),
        ));
    }
    Ok(counted_quantity - system_quantity)
}

/// Reason stored on the adjustment movement written by a count.
pub fn count_adjustment_reason(difference: i32, notes: Option<&str>) -> String {
    let base = format!("Inventory count adjustment ({difference:+})");
    match notes {
        Some(n) if !n.trim().is_empty() => format!("{base}: {}", n.trim()),
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn low_stock_includes_minimum() {
        assert_eq!(stock_status(5, 5), "low");
        assert_eq!(stock_status(0, 0), "low");
        assert_eq!(stock_status(6, 5), "normal");
    }

    #[test]
    fn movements_change_quantity() {
        assert_eq!(apply_movement(10, MovementType::In, 5).unwrap(), 15);
        assert_eq!(apply_movement(10, MovementType::Out, 10).unwrap(), 0);
        assert_eq!(apply_movement(10, MovementType::Transfer, 3).unwrap(), 10);
    }

    #[test]
    fn out_beyond_stock_is_rejected() {
        assert_matches!(
            apply_movement(2, MovementType::Out, 3),
            Err(CoreError::Validation(msg)) if msg.contains("Insufficient stock")
        );
    }

    #[test]
    fn zero_quantity_is_rejected() {
        assert!(apply_movement(2, MovementType::In, 0).is_err());
        assert!(apply_movement(2, MovementType::In, -1).is_err());
    }

    #[test]
    fn user_movement_types() {
        assert_eq!(
            MovementType::from_user_input("transfer", true).unwrap(),
            MovementType::Transfer
        );
        assert!(MovementType::from_user_input("transfer", false).is_err());
        assert!(MovementType::from_user_input("adjustment", true).is_err());
        assert!(MovementType::from_user_input("entrada", true).is_err());
    }

    #[test]
    fn count_difference_sign() {
        assert_eq!(count_difference(10, 7).unwrap(), -3);
        assert_eq!(count_difference(10, 12).unwrap(), 2);
        assert!(count_difference(10, -1).is_err());
    }

    #[test]
    fn adjustment_reason_carries_sign_and_notes() {
        assert_eq!(count_adjustment_reason(-3, None), "Inventory count adjustment (-3)");
        assert_eq!(
            count_adjustment_reason(2, Some(" shelf B ")),
            "Inventory count adjustment (+2): shelf B"
        );
    }
}
