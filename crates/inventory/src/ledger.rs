//! The immutable stock movement ledger.

use chrono::{DateTime, NaiveDate, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ims_core::{BusinessId, DomainError, Entity, UserId};

use crate::movement::{MovementKind, MovementMetadata};
use crate::product::{Product, ProductId};

/// Reserved reference for the entry synthesized at product creation, so the
/// balance-equals-ledger invariant holds from the product's first moment.
pub const INITIAL_REFERENCE: &str = "INITIAL";

/// Ledger entry identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Uuid);

impl TransactionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransactionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for TransactionId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<TransactionId> for Uuid {
    fn from(value: TransactionId) -> Self {
        value.0
    }
}

impl FromStr for TransactionId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::from_str(s)
            .map_err(|e| DomainError::invalid_id(format!("TransactionId: {e}")))?;
        Ok(Self(uuid))
    }
}

/// An immutable record of one stock movement (the audit trail).
///
/// Never mutated or deleted after creation. `quantity` always stores the
/// positive magnitude; for `adjustment` it is the new absolute target, not a
/// delta. Sale fields are only populated for `stock_out`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: TransactionId,
    pub product_id: ProductId,
    pub business_id: BusinessId,
    pub kind: MovementKind,
    pub quantity: i64,
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub performed_by: UserId,
    pub voucher_number: Option<String>,
    pub date_of_sale: Option<NaiveDate>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Build an entry for a validated movement.
    ///
    /// Sale metadata supplied for kinds other than `stock_out` is dropped.
    pub fn record(
        product: &Product,
        kind: MovementKind,
        quantity: i64,
        metadata: MovementMetadata,
        performed_by: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        let sale = match kind {
            MovementKind::StockOut => metadata.sale.unwrap_or_default(),
            MovementKind::StockIn | MovementKind::Adjustment => Default::default(),
        };

        Self {
            id: TransactionId::new(),
            product_id: product.id,
            business_id: product.business_id,
            kind,
            quantity,
            reference: metadata.reference,
            notes: metadata.notes,
            performed_by,
            voucher_number: sale.voucher_number,
            date_of_sale: sale.date_of_sale,
            customer_name: sale.customer_name,
            customer_phone: sale.customer_phone,
            created_at: now,
        }
    }

    /// The synthesized `stock_in` entry backing a nonzero initial quantity.
    pub fn initial_stock(
        product: &Product,
        quantity: i64,
        performed_by: UserId,
        now: DateTime<Utc>,
    ) -> Self {
        Self::record(
            product,
            MovementKind::StockIn,
            quantity,
            MovementMetadata {
                reference: Some(INITIAL_REFERENCE.to_string()),
                notes: Some("Initial stock entry".to_string()),
                sale: None,
            },
            performed_by,
            now,
        )
    }
}

impl Entity for LedgerEntry {
    type Id = TransactionId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Recompute a balance from a product's full ledger history, oldest first.
///
/// `stock_in` contributes `+qty`, `stock_out` contributes `-qty`, and
/// `adjustment` resets the running sum to `qty` at that point in history (a
/// recount is not a movement).
pub fn replay<'a, I>(entries: I) -> i64
where
    I: IntoIterator<Item = &'a LedgerEntry>,
{
    entries.into_iter().fold(0, |balance, entry| match entry.kind {
        MovementKind::StockIn => balance + entry.quantity,
        MovementKind::StockOut => balance - entry.quantity,
        MovementKind::Adjustment => entry.quantity,
    })
}
