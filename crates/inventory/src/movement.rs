//! Movement kinds and the pure balance-planning rules.

use chrono::NaiveDate;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use ims_core::{DomainError, DomainResult};

/// Classification of a ledger entry.
///
/// Branched on exhaustively everywhere; there is deliberately no free-form
/// string variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Receipt: adds to the on-hand quantity.
    StockIn,
    /// Dispatch/sale: subtracts from the on-hand quantity.
    StockOut,
    /// Physical recount: sets the on-hand quantity to an absolute target.
    Adjustment,
}

impl MovementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::StockIn => "stock_in",
            MovementKind::StockOut => "stock_out",
            MovementKind::Adjustment => "adjustment",
        }
    }

    /// Human label used in tables and filters.
    pub fn label(&self) -> &'static str {
        match self {
            MovementKind::StockIn => "Stock In",
            MovementKind::StockOut => "Stock Out",
            MovementKind::Adjustment => "Adjustment",
        }
    }
}

impl core::fmt::Display for MovementKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stock_in" => Ok(MovementKind::StockIn),
            "stock_out" => Ok(MovementKind::StockOut),
            "adjustment" => Ok(MovementKind::Adjustment),
            other => Err(DomainError::invalid_id(format!(
                "MovementKind: unknown kind '{other}'"
            ))),
        }
    }
}

/// Sale details captured on a stock-out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleInfo {
    pub voucher_number: Option<String>,
    pub date_of_sale: Option<NaiveDate>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
}

/// Optional free-text and sale metadata attached to a movement.
///
/// Sale metadata is only persisted for `stock_out`; for other kinds it is
/// silently dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementMetadata {
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub sale: Option<SaleInfo>,
}

/// Compute the new balance for a movement against the current quantity.
///
/// Pure: no IO, no clock. The caller must have read `current` fresh — stale
/// reads are handled again by the conditional update at the storage boundary.
pub fn plan_movement(current: i64, kind: MovementKind, quantity: i64) -> DomainResult<i64> {
    match kind {
        MovementKind::StockIn => {
            if quantity < 1 {
                return Err(DomainError::invalid_quantity(
                    "stock-in quantity must be at least 1",
                ));
            }
            Ok(current + quantity)
        }
        MovementKind::StockOut => {
            if quantity < 1 {
                return Err(DomainError::invalid_quantity(
                    "stock-out quantity must be at least 1",
                ));
            }
            if quantity > current {
                return Err(DomainError::insufficient_stock(current));
            }
            Ok(current - quantity)
        }
        MovementKind::Adjustment => {
            if quantity < 0 {
                return Err(DomainError::invalid_quantity(
                    "adjustment target cannot be negative",
                ));
            }
            // Absolute set, not a delta.
            Ok(quantity)
        }
    }
}
