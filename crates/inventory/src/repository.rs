//! Storage ports for products and the ledger.

use std::sync::Arc;

use async_trait::async_trait;

use ims_core::{BusinessId, DomainResult, UserId};

use crate::ledger::LedgerEntry;
use crate::movement::MovementKind;
use crate::product::{Product, ProductId};

/// Balance change applied together with a ledger append.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityChange {
    /// Add `delta` (negative for stock-out). The adapter must reject the
    /// change if it would take the quantity below zero.
    Apply { delta: i64 },
    /// Set the quantity to an absolute target (adjustment/recount).
    Set { target: i64 },
}

/// Storage port for product rows.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Fetch by id regardless of business unit; the service layer compares
    /// the caller's business explicitly so cross-tenant access surfaces as
    /// `Unauthorized` instead of `NotFound`.
    async fn get(&self, id: ProductId) -> DomainResult<Option<Product>>;
    async fn find_by_sku(&self, business_id: BusinessId, sku: &str)
        -> DomainResult<Option<Product>>;
    async fn insert(&self, product: &Product) -> DomainResult<()>;
    async fn update(&self, product: &Product) -> DomainResult<()>;
    async fn set_active(&self, id: ProductId, active: bool) -> DomainResult<()>;
    async fn list_active(&self, business_id: BusinessId) -> DomainResult<Vec<Product>>;
}

/// Storage port for the append-only ledger.
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// Append one ledger entry and apply the balance change **atomically**:
    /// a reader must never observe the entry without the updated balance or
    /// vice versa. Returns the new balance.
    ///
    /// For `Apply` the adapter must re-check the floor at commit time
    /// (conditional update); losing a race to a concurrent stock-out fails
    /// with `InsufficientStock` carrying the freshly observed quantity, and
    /// nothing is written.
    async fn append(&self, entry: &LedgerEntry, change: QuantityChange) -> DomainResult<i64>;

    /// Full history for one product, oldest first.
    async fn list_for_product(
        &self,
        business_id: BusinessId,
        product_id: ProductId,
    ) -> DomainResult<Vec<LedgerEntry>>;

    /// Recent entries for a business unit, newest first, optionally filtered
    /// by kind.
    async fn list_recent(
        &self,
        business_id: BusinessId,
        kind: Option<MovementKind>,
        limit: usize,
    ) -> DomainResult<Vec<LedgerEntry>>;

    /// Whether any entry was performed by the given user (staff hard-delete
    /// guard).
    async fn performed_by_exists(&self, user_id: UserId) -> DomainResult<bool>;
}

#[async_trait]
impl<T> ProductRepository for Arc<T>
where
    T: ProductRepository + ?Sized,
{
    async fn get(&self, id: ProductId) -> DomainResult<Option<Product>> {
        (**self).get(id).await
    }

    async fn find_by_sku(
        &self,
        business_id: BusinessId,
        sku: &str,
    ) -> DomainResult<Option<Product>> {
        (**self).find_by_sku(business_id, sku).await
    }

    async fn insert(&self, product: &Product) -> DomainResult<()> {
        (**self).insert(product).await
    }

    async fn update(&self, product: &Product) -> DomainResult<()> {
        (**self).update(product).await
    }

    async fn set_active(&self, id: ProductId, active: bool) -> DomainResult<()> {
        (**self).set_active(id, active).await
    }

    async fn list_active(&self, business_id: BusinessId) -> DomainResult<Vec<Product>> {
        (**self).list_active(business_id).await
    }
}

#[async_trait]
impl<T> TransactionRepository for Arc<T>
where
    T: TransactionRepository + ?Sized,
{
    async fn append(&self, entry: &LedgerEntry, change: QuantityChange) -> DomainResult<i64> {
        (**self).append(entry, change).await
    }

    async fn list_for_product(
        &self,
        business_id: BusinessId,
        product_id: ProductId,
    ) -> DomainResult<Vec<LedgerEntry>> {
        (**self).list_for_product(business_id, product_id).await
    }

    async fn list_recent(
        &self,
        business_id: BusinessId,
        kind: Option<MovementKind>,
        limit: usize,
    ) -> DomainResult<Vec<LedgerEntry>> {
        (**self).list_recent(business_id, kind, limit).await
    }

    async fn performed_by_exists(&self, user_id: UserId) -> DomainResult<bool> {
        (**self).performed_by_exists(user_id).await
    }
}
