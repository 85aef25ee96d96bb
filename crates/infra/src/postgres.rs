//! Postgres adapters for the storage ports.
//!
//! Schema lives in `migrations/0001_schema.sql`. Row mapping is manual via
//! `try_get` so the domain types never carry sqlx derives.
//!
//! The ledger append runs as one transaction: a conditional `UPDATE` on the
//! product balance (checked via the returned row) followed by the entry
//! insert. A stock-out that loses a race to a concurrent movement misses the
//! `quantity + delta >= 0` predicate, the transaction rolls back, and the
//! caller gets `InsufficientStock` with the freshly observed quantity.

use core::str::FromStr;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use ims_core::{BusinessId, DomainError, DomainResult, UserId};
use ims_identity::{ActivityLog, PrincipalId, Profile, ProfileRepository, Role};
use ims_inventory::{
    Category, CategoryId, CategoryRepository, LedgerEntry, MovementKind, Product, ProductId,
    ProductRepository, QuantityChange, TransactionId, TransactionRepository,
};
use ims_parties::{ContactInfo, Party, PartyId, PartyKind, PartyRepository};

fn db_err(e: sqlx::Error) -> DomainError {
    DomainError::storage(e.to_string())
}

fn unique_or_db_err(e: sqlx::Error, what: &str) -> DomainError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return DomainError::duplicate(what.to_string());
        }
    }
    db_err(e)
}

/// Postgres-backed store implementing every repository port.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn product_from_row(row: &PgRow) -> DomainResult<Product> {
    let business: String = row.try_get("business_id").map_err(db_err)?;
    Ok(Product {
        id: ProductId::from_uuid(row.try_get("id").map_err(db_err)?),
        business_id: BusinessId::from_str(&business)?,
        sku: row.try_get("sku").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        description: row.try_get("description").map_err(db_err)?,
        category_id: row
            .try_get::<Option<Uuid>, _>("category_id")
            .map_err(db_err)?
            .map(CategoryId::from_uuid),
        supplier_id: row
            .try_get::<Option<Uuid>, _>("supplier_id")
            .map_err(db_err)?
            .map(PartyId::from_uuid),
        unit: row.try_get("unit").map_err(db_err)?,
        quantity: row.try_get("quantity").map_err(db_err)?,
        reorder_level: row.try_get("reorder_level").map_err(db_err)?,
        cost_price: row.try_get("cost_price").map_err(db_err)?,
        selling_price: row.try_get("selling_price").map_err(db_err)?,
        is_active: row.try_get("is_active").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
        updated_at: row.try_get("updated_at").map_err(db_err)?,
    })
}

fn category_from_row(row: &PgRow) -> DomainResult<Category> {
    let business: String = row.try_get("business_id").map_err(db_err)?;
    Ok(Category {
        id: CategoryId::from_uuid(row.try_get("id").map_err(db_err)?),
        business_id: BusinessId::from_str(&business)?,
        name: row.try_get("name").map_err(db_err)?,
        description: row.try_get("description").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

fn entry_from_row(row: &PgRow) -> DomainResult<LedgerEntry> {
    let business: String = row.try_get("business_id").map_err(db_err)?;
    let kind: String = row.try_get("kind").map_err(db_err)?;
    Ok(LedgerEntry {
        id: TransactionId::from_uuid(row.try_get("id").map_err(db_err)?),
        product_id: ProductId::from_uuid(row.try_get("product_id").map_err(db_err)?),
        business_id: BusinessId::from_str(&business)?,
        kind: MovementKind::from_str(&kind)?,
        quantity: row.try_get("quantity").map_err(db_err)?,
        reference: row.try_get("reference").map_err(db_err)?,
        notes: row.try_get("notes").map_err(db_err)?,
        performed_by: UserId::from_uuid(row.try_get("performed_by").map_err(db_err)?),
        voucher_number: row.try_get("voucher_number").map_err(db_err)?,
        date_of_sale: row.try_get("date_of_sale").map_err(db_err)?,
        customer_name: row.try_get("customer_name").map_err(db_err)?,
        customer_phone: row.try_get("customer_phone").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

fn profile_from_row(row: &PgRow) -> DomainResult<Profile> {
    let business: String = row.try_get("business_id").map_err(db_err)?;
    let role: String = row.try_get("role").map_err(db_err)?;
    Ok(Profile {
        id: UserId::from_uuid(row.try_get("id").map_err(db_err)?),
        provider_link: row
            .try_get::<Option<Uuid>, _>("auth_id")
            .map_err(db_err)?
            .map(PrincipalId::from_uuid),
        username: row.try_get("username").map_err(db_err)?,
        full_name: row.try_get("full_name").map_err(db_err)?,
        email: row.try_get("email").map_err(db_err)?,
        role: Role::from_str(&role)?,
        business_id: BusinessId::from_str(&business)?,
        avatar_color: row.try_get("avatar_color").map_err(db_err)?,
        is_active: row.try_get("is_active").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

fn party_from_row(row: &PgRow) -> DomainResult<Party> {
    let business: String = row.try_get("business_id").map_err(db_err)?;
    let kind: String = row.try_get("kind").map_err(db_err)?;
    let kind = match kind.as_str() {
        "customer" => PartyKind::Customer,
        "supplier" => PartyKind::Supplier,
        other => {
            return Err(DomainError::invalid_id(format!(
                "PartyKind: unknown kind '{other}'"
            )));
        }
    };
    Ok(Party {
        id: PartyId::from_uuid(row.try_get("id").map_err(db_err)?),
        business_id: BusinessId::from_str(&business)?,
        kind,
        name: row.try_get("name").map_err(db_err)?,
        contact: ContactInfo {
            contact_person: row.try_get("contact_person").map_err(db_err)?,
            email: row.try_get("email").map_err(db_err)?,
            phone: row.try_get("phone").map_err(db_err)?,
            address: row.try_get("address").map_err(db_err)?,
        },
        is_active: row.try_get("is_active").map_err(db_err)?,
        created_at: row.try_get("created_at").map_err(db_err)?,
    })
}

#[async_trait]
impl ProductRepository for PostgresStore {
    async fn get(&self, id: ProductId) -> DomainResult<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn find_by_sku(
        &self,
        business_id: BusinessId,
        sku: &str,
    ) -> DomainResult<Option<Product>> {
        let row = sqlx::query("SELECT * FROM products WHERE business_id = $1 AND sku = $2")
            .bind(business_id.as_str())
            .bind(sku)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(product_from_row).transpose()
    }

    async fn insert(&self, product: &Product) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, business_id, sku, name, description, category_id,
                supplier_id, unit, quantity, reorder_level, cost_price,
                selling_price, is_active, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(product.business_id.as_str())
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.category_id.map(Uuid::from))
        .bind(product.supplier_id.map(Uuid::from))
        .bind(&product.unit)
        .bind(product.quantity)
        .bind(product.reorder_level)
        .bind(product.cost_price)
        .bind(product.selling_price)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or_db_err(e, "sku already exists for this business"))?;
        Ok(())
    }

    async fn update(&self, product: &Product) -> DomainResult<()> {
        // Quantity deliberately excluded: the balance is owned by `append`.
        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = $2, description = $3, category_id = $4, supplier_id = $5,
                unit = $6, reorder_level = $7, cost_price = $8,
                selling_price = $9, updated_at = $10
            WHERE id = $1
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.category_id.map(Uuid::from))
        .bind(product.supplier_id.map(Uuid::from))
        .bind(&product.unit)
        .bind(product.reorder_level)
        .bind(product.cost_price)
        .bind(product.selling_price)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    async fn set_active(&self, id: ProductId, active: bool) -> DomainResult<()> {
        let result = sqlx::query("UPDATE products SET is_active = $2, updated_at = now() WHERE id = $1")
            .bind(id.as_uuid())
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    async fn list_active(&self, business_id: BusinessId) -> DomainResult<Vec<Product>> {
        let rows = sqlx::query(
            "SELECT * FROM products WHERE business_id = $1 AND is_active ORDER BY name",
        )
        .bind(business_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(product_from_row).collect()
    }
}

#[async_trait]
impl CategoryRepository for PostgresStore {
    async fn get(&self, id: CategoryId) -> DomainResult<Option<Category>> {
        let row = sqlx::query("SELECT * FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn find_by_name(
        &self,
        business_id: BusinessId,
        name: &str,
    ) -> DomainResult<Option<Category>> {
        let row = sqlx::query("SELECT * FROM categories WHERE business_id = $1 AND name = $2")
            .bind(business_id.as_str())
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(category_from_row).transpose()
    }

    async fn insert(&self, category: &Category) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO categories (id, business_id, name, description, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(category.id.as_uuid())
        .bind(category.business_id.as_str())
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or_db_err(e, "category name already exists for this business"))?;
        Ok(())
    }

    async fn update(&self, category: &Category) -> DomainResult<()> {
        let result =
            sqlx::query("UPDATE categories SET name = $2, description = $3 WHERE id = $1")
                .bind(category.id.as_uuid())
                .bind(&category.name)
                .bind(&category.description)
                .execute(&self.pool)
                .await
                .map_err(|e| unique_or_db_err(e, "category name already exists for this business"))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: CategoryId) -> DomainResult<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;
        sqlx::query("UPDATE products SET category_id = NULL WHERE category_id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        tx.commit().await.map_err(db_err)?;
        Ok(())
    }

    async fn list(&self, business_id: BusinessId) -> DomainResult<Vec<Category>> {
        let rows = sqlx::query("SELECT * FROM categories WHERE business_id = $1 ORDER BY name")
            .bind(business_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(category_from_row).collect()
    }
}

#[async_trait]
impl TransactionRepository for PostgresStore {
    async fn append(&self, entry: &LedgerEntry, change: QuantityChange) -> DomainResult<i64> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let updated = match change {
            QuantityChange::Apply { delta } => {
                sqlx::query(
                    r#"
                    UPDATE products
                    SET quantity = quantity + $1, updated_at = $2
                    WHERE id = $3 AND quantity + $1 >= 0
                    RETURNING quantity
                    "#,
                )
                .bind(delta)
                .bind(entry.created_at)
                .bind(entry.product_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?
            }
            QuantityChange::Set { target } => {
                if target < 0 {
                    return Err(DomainError::invalid_quantity(
                        "adjustment target cannot be negative",
                    ));
                }
                sqlx::query(
                    r#"
                    UPDATE products
                    SET quantity = $1, updated_at = $2
                    WHERE id = $3
                    RETURNING quantity
                    "#,
                )
                .bind(target)
                .bind(entry.created_at)
                .bind(entry.product_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?
            }
        };

        let new_balance: i64 = match updated {
            Some(row) => row.try_get("quantity").map_err(db_err)?,
            None => {
                // Predicate miss: the product is gone, or a concurrent
                // movement drained the stock since the caller's read.
                tx.rollback().await.map_err(db_err)?;
                let current = sqlx::query("SELECT quantity FROM products WHERE id = $1")
                    .bind(entry.product_id.as_uuid())
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(db_err)?;
                return match current {
                    Some(row) => Err(DomainError::insufficient_stock(
                        row.try_get("quantity").map_err(db_err)?,
                    )),
                    None => Err(DomainError::NotFound),
                };
            }
        };

        sqlx::query(
            r#"
            INSERT INTO stock_transactions (
                id, product_id, business_id, kind, quantity, reference, notes,
                performed_by, voucher_number, date_of_sale, customer_name,
                customer_phone, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(entry.id.as_uuid())
        .bind(entry.product_id.as_uuid())
        .bind(entry.business_id.as_str())
        .bind(entry.kind.as_str())
        .bind(entry.quantity)
        .bind(&entry.reference)
        .bind(&entry.notes)
        .bind(entry.performed_by.as_uuid())
        .bind(&entry.voucher_number)
        .bind(entry.date_of_sale)
        .bind(&entry.customer_name)
        .bind(&entry.customer_phone)
        .bind(entry.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(new_balance)
    }

    async fn list_for_product(
        &self,
        business_id: BusinessId,
        product_id: ProductId,
    ) -> DomainResult<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM stock_transactions
            WHERE business_id = $1 AND product_id = $2
            ORDER BY created_at, id
            "#,
        )
        .bind(business_id.as_str())
        .bind(product_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(entry_from_row).collect()
    }

    async fn list_recent(
        &self,
        business_id: BusinessId,
        kind: Option<MovementKind>,
        limit: usize,
    ) -> DomainResult<Vec<LedgerEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM stock_transactions
            WHERE business_id = $1 AND ($2::text IS NULL OR kind = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(business_id.as_str())
        .bind(kind.map(|k| k.as_str()))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(entry_from_row).collect()
    }

    async fn performed_by_exists(&self, user_id: UserId) -> DomainResult<bool> {
        let row = sqlx::query("SELECT 1 AS one FROM stock_transactions WHERE performed_by = $1 LIMIT 1")
            .bind(user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl ActivityLog for PostgresStore {
    async fn has_activity(&self, user_id: UserId) -> DomainResult<bool> {
        self.performed_by_exists(user_id).await
    }
}

#[async_trait]
impl ProfileRepository for PostgresStore {
    async fn get(&self, id: UserId) -> DomainResult<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(profile_from_row).transpose()
    }

    async fn find_by_provider_link(
        &self,
        principal: PrincipalId,
    ) -> DomainResult<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE auth_id = $1")
            .bind(principal.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(profile_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE lower(email) = lower($1)")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(profile_from_row).transpose()
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<Profile>> {
        let row = sqlx::query("SELECT * FROM profiles WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(profile_from_row).transpose()
    }

    async fn insert(&self, profile: &Profile) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO profiles (
                id, auth_id, username, full_name, email, role, business_id,
                avatar_color, is_active, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(profile.id.as_uuid())
        .bind(profile.provider_link.map(Uuid::from))
        .bind(&profile.username)
        .bind(&profile.full_name)
        .bind(&profile.email)
        .bind(profile.role.as_str())
        .bind(profile.business_id.as_str())
        .bind(&profile.avatar_color)
        .bind(profile.is_active)
        .bind(profile.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or_db_err(e, "username or provider link already taken"))?;
        Ok(())
    }

    async fn update(&self, profile: &Profile) -> DomainResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE profiles SET
                username = $2, full_name = $3, email = $4, role = $5,
                avatar_color = $6, is_active = $7
            WHERE id = $1
            "#,
        )
        .bind(profile.id.as_uuid())
        .bind(&profile.username)
        .bind(&profile.full_name)
        .bind(&profile.email)
        .bind(profile.role.as_str())
        .bind(&profile.avatar_color)
        .bind(profile.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or_db_err(e, "username already taken"))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    async fn set_provider_link(&self, id: UserId, principal: PrincipalId) -> DomainResult<()> {
        // Unique index on auth_id makes the duplicate case a constraint
        // violation; re-setting the same value is a plain idempotent update.
        let result = sqlx::query("UPDATE profiles SET auth_id = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(principal.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| {
                unique_or_db_err(e, "principal is already linked to another profile")
            })?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: UserId) -> DomainResult<()> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    async fn list(&self, business_id: BusinessId) -> DomainResult<Vec<Profile>> {
        let rows = sqlx::query("SELECT * FROM profiles WHERE business_id = $1 ORDER BY username")
            .bind(business_id.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(profile_from_row).collect()
    }

    async fn list_all(&self) -> DomainResult<Vec<Profile>> {
        let rows = sqlx::query("SELECT * FROM profiles ORDER BY username")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(profile_from_row).collect()
    }
}

#[async_trait]
impl PartyRepository for PostgresStore {
    async fn get(&self, id: PartyId) -> DomainResult<Option<Party>> {
        let row = sqlx::query("SELECT * FROM parties WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;
        row.as_ref().map(party_from_row).transpose()
    }

    async fn find_by_name(
        &self,
        business_id: BusinessId,
        kind: PartyKind,
        name: &str,
    ) -> DomainResult<Option<Party>> {
        let row = sqlx::query(
            "SELECT * FROM parties WHERE business_id = $1 AND kind = $2 AND name = $3",
        )
        .bind(business_id.as_str())
        .bind(kind.as_str())
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;
        row.as_ref().map(party_from_row).transpose()
    }

    async fn insert(&self, party: &Party) -> DomainResult<()> {
        sqlx::query(
            r#"
            INSERT INTO parties (
                id, business_id, kind, name, contact_person, email, phone,
                address, is_active, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(party.id.as_uuid())
        .bind(party.business_id.as_str())
        .bind(party.kind.as_str())
        .bind(&party.name)
        .bind(&party.contact.contact_person)
        .bind(&party.contact.email)
        .bind(&party.contact.phone)
        .bind(&party.contact.address)
        .bind(party.is_active)
        .bind(party.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or_db_err(e, "party name already exists for this business"))?;
        Ok(())
    }

    async fn update(&self, party: &Party) -> DomainResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE parties SET
                name = $2, contact_person = $3, email = $4, phone = $5,
                address = $6, is_active = $7
            WHERE id = $1
            "#,
        )
        .bind(party.id.as_uuid())
        .bind(&party.name)
        .bind(&party.contact.contact_person)
        .bind(&party.contact.email)
        .bind(&party.contact.phone)
        .bind(&party.contact.address)
        .bind(party.is_active)
        .execute(&self.pool)
        .await
        .map_err(|e| unique_or_db_err(e, "party name already exists for this business"))?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    async fn set_active(&self, id: PartyId, active: bool) -> DomainResult<()> {
        let result = sqlx::query("UPDATE parties SET is_active = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(active)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound);
        }
        Ok(())
    }

    async fn list_active(
        &self,
        business_id: BusinessId,
        kind: PartyKind,
    ) -> DomainResult<Vec<Party>> {
        let rows = sqlx::query(
            "SELECT * FROM parties WHERE business_id = $1 AND kind = $2 AND is_active ORDER BY name",
        )
        .bind(business_id.as_str())
        .bind(kind.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_err)?;
        rows.iter().map(party_from_row).collect()
    }
}
