//! The ledger/balance updater service.

use chrono::Utc;

use ims_core::{BusinessId, DomainError, DomainResult, UserId};

use crate::ledger::LedgerEntry;
use crate::movement::{MovementKind, MovementMetadata, plan_movement};
use crate::product::{NewProduct, Product, ProductId, ProductPatch};
use crate::repository::{ProductRepository, QuantityChange, TransactionRepository};

/// Result of a recorded movement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovementReceipt {
    pub entry: LedgerEntry,
    pub new_balance: i64,
}

/// Enforces that a product's on-hand quantity is always consistent with its
/// full movement history, and that every movement is durably and atomically
/// recorded.
///
/// Every decision re-reads the current quantity fresh; no client-side cache
/// is authoritative. The final word on races belongs to the conditional
/// update inside [`TransactionRepository::append`].
pub struct StockLedger<P, T> {
    products: P,
    transactions: T,
}

impl<P, T> StockLedger<P, T>
where
    P: ProductRepository,
    T: TransactionRepository,
{
    pub fn new(products: P, transactions: T) -> Self {
        Self {
            products,
            transactions,
        }
    }

    /// Record one stock movement and return the updated balance.
    ///
    /// Failure leaves both the ledger and the balance untouched; nothing is
    /// retried automatically.
    pub async fn record_movement(
        &self,
        business_id: BusinessId,
        product_id: ProductId,
        kind: MovementKind,
        quantity: i64,
        metadata: MovementMetadata,
        performed_by: UserId,
    ) -> DomainResult<MovementReceipt> {
        let product = self
            .products
            .get(product_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if product.business_id != business_id {
            return Err(DomainError::Unauthorized);
        }
        if !product.is_active {
            return Err(DomainError::NotFound);
        }

        // Validates the quantity and pre-checks the stock-out floor against
        // the fresh read. The append below re-checks it at commit time.
        plan_movement(product.quantity, kind, quantity)?;

        let entry = LedgerEntry::record(&product, kind, quantity, metadata, performed_by, Utc::now());
        let change = match kind {
            MovementKind::StockIn => QuantityChange::Apply { delta: quantity },
            MovementKind::StockOut => QuantityChange::Apply { delta: -quantity },
            MovementKind::Adjustment => QuantityChange::Set { target: quantity },
        };

        let new_balance = self.transactions.append(&entry, change).await?;
        tracing::info!(
            product_id = %product.id,
            business_id = %product.business_id,
            kind = %kind,
            quantity,
            new_balance,
            "movement recorded"
        );
        Ok(MovementReceipt { entry, new_balance })
    }

    /// Create a product; a nonzero initial quantity is backed by a synthetic
    /// `stock_in` entry (reference `INITIAL`) committed through the same
    /// atomic append, so quantity == replay(ledger) from the start.
    pub async fn create_product(
        &self,
        new: NewProduct,
        performed_by: UserId,
    ) -> DomainResult<Product> {
        let mut product = Product::create(&new, Utc::now())?;

        if self
            .products
            .find_by_sku(product.business_id, &product.sku)
            .await?
            .is_some()
        {
            return Err(DomainError::duplicate(format!(
                "sku '{}' already exists for this business",
                product.sku
            )));
        }

        self.products.insert(&product).await?;

        if new.initial_quantity > 0 {
            let entry = LedgerEntry::initial_stock(
                &product,
                new.initial_quantity,
                performed_by,
                Utc::now(),
            );
            product.quantity = self
                .transactions
                .append(
                    &entry,
                    QuantityChange::Apply {
                        delta: new.initial_quantity,
                    },
                )
                .await?;
        }

        tracing::info!(
            product_id = %product.id,
            business_id = %product.business_id,
            sku = %product.sku,
            initial_quantity = new.initial_quantity,
            "product created"
        );
        Ok(product)
    }

    /// Edit the non-quantity fields of a product.
    pub async fn update_product(
        &self,
        business_id: BusinessId,
        product_id: ProductId,
        patch: ProductPatch,
    ) -> DomainResult<Product> {
        let mut product = self
            .products
            .get(product_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if product.business_id != business_id {
            return Err(DomainError::Unauthorized);
        }

        product.apply_patch(patch, Utc::now())?;
        self.products.update(&product).await?;
        Ok(product)
    }

    /// Soft-deactivate; ledger history is preserved.
    pub async fn deactivate_product(
        &self,
        business_id: BusinessId,
        product_id: ProductId,
    ) -> DomainResult<()> {
        let product = self
            .products
            .get(product_id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if product.business_id != business_id {
            return Err(DomainError::Unauthorized);
        }

        self.products.set_active(product_id, false).await
    }

    /// Full movement history for one product, oldest first.
    pub async fn history(
        &self,
        business_id: BusinessId,
        product_id: ProductId,
    ) -> DomainResult<Vec<LedgerEntry>> {
        self.transactions
            .list_for_product(business_id, product_id)
            .await
    }
}
