//! In-memory adapters behind the storage ports.
//!
//! One [`InMemoryStore`] implements every repository trait over a single
//! mutex, so a ledger append and its balance update commit under one lock
//! exactly like the transactional Postgres adapter. Intended for tests/dev.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use ims_core::{BusinessId, DomainError, DomainResult, UserId};
use ims_identity::{ActivityLog, PrincipalId, Profile, ProfileRepository};
use ims_inventory::{
    Category, CategoryId, CategoryRepository, LedgerEntry, MovementKind, Product, ProductId,
    ProductRepository, QuantityChange, TransactionRepository,
};
use ims_parties::{Party, PartyId, PartyKind, PartyRepository};

#[derive(Debug, Default)]
struct Inner {
    products: HashMap<ProductId, Product>,
    categories: HashMap<CategoryId, Category>,
    entries: Vec<LedgerEntry>,
    profiles: HashMap<UserId, Profile>,
    parties: HashMap<PartyId, Party>,
}

/// In-memory store backing all repository ports.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> DomainResult<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| DomainError::conflict("store lock poisoned"))
    }
}

#[async_trait]
impl ProductRepository for InMemoryStore {
    async fn get(&self, id: ProductId) -> DomainResult<Option<Product>> {
        Ok(self.lock()?.products.get(&id).cloned())
    }

    async fn find_by_sku(
        &self,
        business_id: BusinessId,
        sku: &str,
    ) -> DomainResult<Option<Product>> {
        Ok(self
            .lock()?
            .products
            .values()
            .find(|p| p.business_id == business_id && p.sku == sku)
            .cloned())
    }

    async fn insert(&self, product: &Product) -> DomainResult<()> {
        let mut inner = self.lock()?;
        if inner.products.contains_key(&product.id) {
            return Err(DomainError::duplicate(format!(
                "product {} already exists",
                product.id
            )));
        }
        inner.products.insert(product.id, product.clone());
        Ok(())
    }

    async fn update(&self, product: &Product) -> DomainResult<()> {
        let mut inner = self.lock()?;
        let existing = inner
            .products
            .get_mut(&product.id)
            .ok_or(DomainError::NotFound)?;
        // Quantity is owned by the ledger append; an update must not clobber
        // a balance committed since this product was read.
        let quantity = existing.quantity;
        *existing = product.clone();
        existing.quantity = quantity;
        Ok(())
    }

    async fn set_active(&self, id: ProductId, active: bool) -> DomainResult<()> {
        let mut inner = self.lock()?;
        let product = inner.products.get_mut(&id).ok_or(DomainError::NotFound)?;
        product.is_active = active;
        Ok(())
    }

    async fn list_active(&self, business_id: BusinessId) -> DomainResult<Vec<Product>> {
        let inner = self.lock()?;
        let mut products: Vec<Product> = inner
            .products
            .values()
            .filter(|p| p.business_id == business_id && p.is_active)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }
}

#[async_trait]
impl CategoryRepository for InMemoryStore {
    async fn get(&self, id: CategoryId) -> DomainResult<Option<Category>> {
        Ok(self.lock()?.categories.get(&id).cloned())
    }

    async fn find_by_name(
        &self,
        business_id: BusinessId,
        name: &str,
    ) -> DomainResult<Option<Category>> {
        Ok(self
            .lock()?
            .categories
            .values()
            .find(|c| c.business_id == business_id && c.name == name)
            .cloned())
    }

    async fn insert(&self, category: &Category) -> DomainResult<()> {
        let mut inner = self.lock()?;
        if inner.categories.contains_key(&category.id) {
            return Err(DomainError::duplicate(format!(
                "category {} already exists",
                category.id
            )));
        }
        inner.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn update(&self, category: &Category) -> DomainResult<()> {
        let mut inner = self.lock()?;
        if !inner.categories.contains_key(&category.id) {
            return Err(DomainError::NotFound);
        }
        inner.categories.insert(category.id, category.clone());
        Ok(())
    }

    async fn delete(&self, id: CategoryId) -> DomainResult<()> {
        let mut inner = self.lock()?;
        inner.categories.remove(&id).ok_or(DomainError::NotFound)?;
        // Products referencing the category fall back to uncategorized.
        for product in inner.products.values_mut() {
            if product.category_id == Some(id) {
                product.category_id = None;
            }
        }
        Ok(())
    }

    async fn list(&self, business_id: BusinessId) -> DomainResult<Vec<Category>> {
        let inner = self.lock()?;
        let mut categories: Vec<Category> = inner
            .categories
            .values()
            .filter(|c| c.business_id == business_id)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }
}

#[async_trait]
impl TransactionRepository for InMemoryStore {
    async fn append(&self, entry: &LedgerEntry, change: QuantityChange) -> DomainResult<i64> {
        let mut inner = self.lock()?;
        let product = inner
            .products
            .get_mut(&entry.product_id)
            .ok_or(DomainError::NotFound)?;

        let new_balance = match change {
            QuantityChange::Apply { delta } => {
                let next = product.quantity + delta;
                if next < 0 {
                    // Commit-time floor re-check: report the quantity as it
                    // stands now, not as the caller last saw it.
                    return Err(DomainError::insufficient_stock(product.quantity));
                }
                next
            }
            QuantityChange::Set { target } => {
                if target < 0 {
                    return Err(DomainError::invalid_quantity(
                        "adjustment target cannot be negative",
                    ));
                }
                target
            }
        };

        product.quantity = new_balance;
        product.updated_at = entry.created_at;
        inner.entries.push(entry.clone());
        Ok(new_balance)
    }

    async fn list_for_product(
        &self,
        business_id: BusinessId,
        product_id: ProductId,
    ) -> DomainResult<Vec<LedgerEntry>> {
        let inner = self.lock()?;
        Ok(inner
            .entries
            .iter()
            .filter(|e| e.business_id == business_id && e.product_id == product_id)
            .cloned()
            .collect())
    }

    async fn list_recent(
        &self,
        business_id: BusinessId,
        kind: Option<MovementKind>,
        limit: usize,
    ) -> DomainResult<Vec<LedgerEntry>> {
        let inner = self.lock()?;
        Ok(inner
            .entries
            .iter()
            .rev()
            .filter(|e| e.business_id == business_id && kind.is_none_or(|k| e.kind == k))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn performed_by_exists(&self, user_id: UserId) -> DomainResult<bool> {
        let inner = self.lock()?;
        Ok(inner.entries.iter().any(|e| e.performed_by == user_id))
    }
}

#[async_trait]
impl ActivityLog for InMemoryStore {
    async fn has_activity(&self, user_id: UserId) -> DomainResult<bool> {
        self.performed_by_exists(user_id).await
    }
}

#[async_trait]
impl ProfileRepository for InMemoryStore {
    async fn get(&self, id: UserId) -> DomainResult<Option<Profile>> {
        Ok(self.lock()?.profiles.get(&id).cloned())
    }

    async fn find_by_provider_link(
        &self,
        principal: PrincipalId,
    ) -> DomainResult<Option<Profile>> {
        Ok(self
            .lock()?
            .profiles
            .values()
            .find(|p| p.provider_link == Some(principal))
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Profile>> {
        let needle = email.trim();
        Ok(self
            .lock()?
            .profiles
            .values()
            .find(|p| {
                p.email
                    .as_deref()
                    .is_some_and(|e| e.eq_ignore_ascii_case(needle))
            })
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<Profile>> {
        Ok(self
            .lock()?
            .profiles
            .values()
            .find(|p| p.username == username)
            .cloned())
    }

    async fn insert(&self, profile: &Profile) -> DomainResult<()> {
        let mut inner = self.lock()?;
        if inner.profiles.contains_key(&profile.id) {
            return Err(DomainError::duplicate(format!(
                "profile {} already exists",
                profile.id
            )));
        }
        inner.profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn update(&self, profile: &Profile) -> DomainResult<()> {
        let mut inner = self.lock()?;
        if !inner.profiles.contains_key(&profile.id) {
            return Err(DomainError::NotFound);
        }
        inner.profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn set_provider_link(&self, id: UserId, principal: PrincipalId) -> DomainResult<()> {
        let mut inner = self.lock()?;

        if let Some(holder) = inner
            .profiles
            .values()
            .find(|p| p.provider_link == Some(principal))
        {
            if holder.id == id {
                // Same value twice is a no-op; the write-back races with
                // itself on concurrent first logins.
                return Ok(());
            }
            return Err(DomainError::duplicate(format!(
                "principal {principal} is already linked to another profile"
            )));
        }

        let profile = inner.profiles.get_mut(&id).ok_or(DomainError::NotFound)?;
        profile.provider_link = Some(principal);
        Ok(())
    }

    async fn delete(&self, id: UserId) -> DomainResult<()> {
        let mut inner = self.lock()?;
        inner.profiles.remove(&id).ok_or(DomainError::NotFound)?;
        Ok(())
    }

    async fn list(&self, business_id: BusinessId) -> DomainResult<Vec<Profile>> {
        let inner = self.lock()?;
        let mut profiles: Vec<Profile> = inner
            .profiles
            .values()
            .filter(|p| p.business_id == business_id)
            .cloned()
            .collect();
        profiles.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(profiles)
    }

    async fn list_all(&self) -> DomainResult<Vec<Profile>> {
        let inner = self.lock()?;
        let mut profiles: Vec<Profile> = inner.profiles.values().cloned().collect();
        profiles.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(profiles)
    }
}

#[async_trait]
impl PartyRepository for InMemoryStore {
    async fn get(&self, id: PartyId) -> DomainResult<Option<Party>> {
        Ok(self.lock()?.parties.get(&id).cloned())
    }

    async fn find_by_name(
        &self,
        business_id: BusinessId,
        kind: PartyKind,
        name: &str,
    ) -> DomainResult<Option<Party>> {
        Ok(self
            .lock()?
            .parties
            .values()
            .find(|p| p.business_id == business_id && p.kind == kind && p.name == name)
            .cloned())
    }

    async fn insert(&self, party: &Party) -> DomainResult<()> {
        let mut inner = self.lock()?;
        if inner.parties.contains_key(&party.id) {
            return Err(DomainError::duplicate(format!(
                "party {} already exists",
                party.id
            )));
        }
        inner.parties.insert(party.id, party.clone());
        Ok(())
    }

    async fn update(&self, party: &Party) -> DomainResult<()> {
        let mut inner = self.lock()?;
        if !inner.parties.contains_key(&party.id) {
            return Err(DomainError::NotFound);
        }
        inner.parties.insert(party.id, party.clone());
        Ok(())
    }

    async fn set_active(&self, id: PartyId, active: bool) -> DomainResult<()> {
        let mut inner = self.lock()?;
        let party = inner.parties.get_mut(&id).ok_or(DomainError::NotFound)?;
        party.is_active = active;
        Ok(())
    }

    async fn list_active(
        &self,
        business_id: BusinessId,
        kind: PartyKind,
    ) -> DomainResult<Vec<Party>> {
        let inner = self.lock()?;
        let mut parties: Vec<Party> = inner
            .parties
            .values()
            .filter(|p| p.business_id == business_id && p.kind == kind && p.is_active)
            .cloned()
            .collect();
        parties.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(parties)
    }
}
