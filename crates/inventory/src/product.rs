use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ims_core::{BusinessId, DomainError, DomainResult, Entity};
use ims_parties::PartyId;

use crate::category::CategoryId;

/// Product identifier (business-unit scoped via the `business_id` field).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(Uuid);

impl ProductId {
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

impl Default for ProductId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ProductId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for ProductId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<ProductId> for Uuid {
    fn from(value: ProductId) -> Self {
        value.0
    }
}

impl FromStr for ProductId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid =
            Uuid::from_str(s).map_err(|e| DomainError::invalid_id(format!("ProductId: {e}")))?;
        Ok(Self(uuid))
    }
}

/// Suggested units of measure (the UI offers these; any string is stored).
pub const UNITS: &[&str] = &[
    "pcs", "kg", "g", "L", "mL", "box", "pack", "roll", "sheet", "set", "bag", "drum", "m", "ft",
];

/// Input for creating a new product.
///
/// `initial_quantity` is not written to the product row directly: creation
/// inserts the product at zero and synthesizes one `stock_in` ledger entry
/// (reference `INITIAL`) so the balance-equals-ledger invariant holds from
/// the first moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub business_id: BusinessId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub supplier_id: Option<PartyId>,
    pub unit: String,
    pub initial_quantity: i64,
    pub reorder_level: i64,
    /// Unit cost in centavos.
    pub cost_price: i64,
    /// Unit selling price in centavos.
    pub selling_price: i64,
}

/// Editable non-quantity fields of a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub category_id: Option<Option<CategoryId>>,
    pub supplier_id: Option<Option<PartyId>>,
    pub unit: Option<String>,
    pub reorder_level: Option<i64>,
    pub cost_price: Option<i64>,
    pub selling_price: Option<i64>,
}

/// A stocked item within one business unit.
///
/// # Invariants
/// - `quantity` equals the replay of the product's full ledger history and is
///   never negative.
/// - `quantity` is mutated only through the atomic ledger append
///   ([`crate::repository::TransactionRepository::append`]); everything else
///   is edited through [`ProductPatch`].
/// - Products are soft-deactivated, never deleted, so ledger history survives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub business_id: BusinessId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub supplier_id: Option<PartyId>,
    pub unit: String,
    pub quantity: i64,
    pub reorder_level: i64,
    pub cost_price: i64,
    pub selling_price: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Validate and construct a new active product at quantity zero.
    pub fn create(new: &NewProduct, now: DateTime<Utc>) -> DomainResult<Self> {
        let sku = new.sku.trim();
        if sku.is_empty() {
            return Err(DomainError::validation("sku cannot be empty"));
        }
        let name = new.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        if new.unit.trim().is_empty() {
            return Err(DomainError::validation("unit cannot be empty"));
        }
        if new.initial_quantity < 0 {
            return Err(DomainError::invalid_quantity(
                "initial quantity cannot be negative",
            ));
        }
        if new.reorder_level < 0 {
            return Err(DomainError::validation("reorder level cannot be negative"));
        }
        if new.cost_price < 0 || new.selling_price < 0 {
            return Err(DomainError::validation("prices cannot be negative"));
        }

        Ok(Self {
            id: ProductId::new(),
            business_id: new.business_id,
            sku: sku.to_string(),
            name: name.to_string(),
            description: new.description.clone(),
            category_id: new.category_id,
            supplier_id: new.supplier_id,
            unit: new.unit.trim().to_string(),
            quantity: 0,
            reorder_level: new.reorder_level,
            cost_price: new.cost_price,
            selling_price: new.selling_price,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply an edit to the non-quantity fields.
    pub fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = patch.name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::validation("product name cannot be empty"));
            }
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(category_id) = patch.category_id {
            self.category_id = category_id;
        }
        if let Some(supplier_id) = patch.supplier_id {
            self.supplier_id = supplier_id;
        }
        if let Some(unit) = patch.unit {
            if unit.trim().is_empty() {
                return Err(DomainError::validation("unit cannot be empty"));
            }
            self.unit = unit.trim().to_string();
        }
        if let Some(reorder_level) = patch.reorder_level {
            if reorder_level < 0 {
                return Err(DomainError::validation("reorder level cannot be negative"));
            }
            self.reorder_level = reorder_level;
        }
        if let Some(cost_price) = patch.cost_price {
            if cost_price < 0 {
                return Err(DomainError::validation("prices cannot be negative"));
            }
            self.cost_price = cost_price;
        }
        if let Some(selling_price) = patch.selling_price {
            if selling_price < 0 {
                return Err(DomainError::validation("prices cannot be negative"));
            }
            self.selling_price = selling_price;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn is_out_of_stock(&self) -> bool {
        self.quantity == 0
    }

    /// Below-or-at the reorder threshold (and not already out).
    pub fn is_low_stock(&self) -> bool {
        !self.is_out_of_stock() && self.quantity <= self.reorder_level
    }

    /// Inventory value at cost, in centavos.
    pub fn value_at_cost(&self) -> i64 {
        self.quantity * self.cost_price
    }

    /// Inventory value at selling price, in centavos.
    pub fn value_at_sale(&self) -> i64 {
        self.quantity * self.selling_price
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn new_product(sku: &str, initial: i64) -> NewProduct {
        NewProduct {
            business_id: BusinessId::Wellbuild,
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            description: None,
            category_id: None,
            supplier_id: None,
            unit: "pcs".to_string(),
            initial_quantity: initial,
            reorder_level: 10,
            cost_price: 500,
            selling_price: 750,
        }
    }

    #[test]
    fn create_starts_at_zero_quantity() {
        let product = Product::create(&new_product("SKU-1", 25), Utc::now()).unwrap();
        // Balance comes from the INITIAL ledger entry, not the row insert.
        assert_eq!(product.quantity, 0);
        assert!(product.is_active);
    }

    #[test]
    fn create_rejects_blank_sku() {
        let mut new = new_product("SKU-1", 0);
        new.sku = "  ".to_string();
        assert!(matches!(
            Product::create(&new, Utc::now()),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn create_rejects_negative_initial_quantity() {
        let mut new = new_product("SKU-1", 0);
        new.initial_quantity = -3;
        assert!(matches!(
            Product::create(&new, Utc::now()),
            Err(DomainError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn low_stock_threshold_is_inclusive() {
        let mut product = Product::create(&new_product("SKU-1", 0), Utc::now()).unwrap();
        product.quantity = 10;
        assert!(product.is_low_stock());
        product.quantity = 11;
        assert!(!product.is_low_stock());
        product.quantity = 0;
        assert!(product.is_out_of_stock());
        assert!(!product.is_low_stock());
    }

    #[test]
    fn patch_updates_prices_and_touches_timestamp() {
        let mut product = Product::create(&new_product("SKU-1", 0), Utc::now()).unwrap();
        let before = product.updated_at;
        let later = before + chrono::Duration::seconds(5);
        product
            .apply_patch(
                ProductPatch {
                    selling_price: Some(900),
                    ..Default::default()
                },
                later,
            )
            .unwrap();
        assert_eq!(product.selling_price, 900);
        assert_eq!(product.updated_at, later);
    }

    #[test]
    fn patch_rejects_negative_reorder_level() {
        let mut product = Product::create(&new_product("SKU-1", 0), Utc::now()).unwrap();
        let result = product.apply_patch(
            ProductPatch {
                reorder_level: Some(-1),
                ..Default::default()
            },
            Utc::now(),
        );
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }
}
