use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ims_core::{BusinessId, DomainError, DomainResult, Entity};

/// Category identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(Uuid);

impl CategoryId {
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

impl Default for CategoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for CategoryId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for CategoryId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<CategoryId> for Uuid {
    fn from(value: CategoryId) -> Self {
        value.0
    }
}

impl FromStr for CategoryId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid =
            Uuid::from_str(s).map_err(|e| DomainError::invalid_id(format!("CategoryId: {e}")))?;
        Ok(Self(uuid))
    }
}

/// Product grouping within one business unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub business_id: BusinessId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Category {
    pub fn create(
        business_id: BusinessId,
        name: &str,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("category name cannot be empty"));
        }
        Ok(Self {
            id: CategoryId::new(),
            business_id,
            name: name.to_string(),
            description,
            created_at: now,
        })
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Storage port for categories.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    async fn get(&self, id: CategoryId) -> DomainResult<Option<Category>>;
    async fn find_by_name(&self, business_id: BusinessId, name: &str)
        -> DomainResult<Option<Category>>;
    async fn insert(&self, category: &Category) -> DomainResult<()>;
    async fn update(&self, category: &Category) -> DomainResult<()>;
    async fn delete(&self, id: CategoryId) -> DomainResult<()>;
    async fn list(&self, business_id: BusinessId) -> DomainResult<Vec<Category>>;
}

#[async_trait]
impl<T> CategoryRepository for std::sync::Arc<T>
where
    T: CategoryRepository + ?Sized,
{
    async fn get(&self, id: CategoryId) -> DomainResult<Option<Category>> {
        (**self).get(id).await
    }

    async fn find_by_name(
        &self,
        business_id: BusinessId,
        name: &str,
    ) -> DomainResult<Option<Category>> {
        (**self).find_by_name(business_id, name).await
    }

    async fn insert(&self, category: &Category) -> DomainResult<()> {
        (**self).insert(category).await
    }

    async fn update(&self, category: &Category) -> DomainResult<()> {
        (**self).update(category).await
    }

    async fn delete(&self, id: CategoryId) -> DomainResult<()> {
        (**self).delete(id).await
    }

    async fn list(&self, business_id: BusinessId) -> DomainResult<Vec<Category>> {
        (**self).list(business_id).await
    }
}

/// Category management, per business unit.
pub struct CategoryDirectory<C> {
    categories: C,
}

impl<C: CategoryRepository> CategoryDirectory<C> {
    pub fn new(categories: C) -> Self {
        Self { categories }
    }

    /// Create a category; name must be unique per business unit.
    pub async fn create(
        &self,
        business_id: BusinessId,
        name: &str,
        description: Option<String>,
    ) -> DomainResult<Category> {
        let category = Category::create(business_id, name, description, Utc::now())?;
        if self
            .categories
            .find_by_name(business_id, &category.name)
            .await?
            .is_some()
        {
            return Err(DomainError::duplicate(format!(
                "category '{}' already exists",
                category.name
            )));
        }
        self.categories.insert(&category).await?;
        Ok(category)
    }

    /// Rename or re-describe a category.
    pub async fn update(
        &self,
        business_id: BusinessId,
        id: CategoryId,
        name: &str,
        description: Option<String>,
    ) -> DomainResult<Category> {
        let mut category = self
            .categories
            .get(id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if category.business_id != business_id {
            return Err(DomainError::Unauthorized);
        }

        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("category name cannot be empty"));
        }
        category.name = name.to_string();
        category.description = description;
        self.categories.update(&category).await?;
        Ok(category)
    }

    /// Delete a category. Products keep working without one; the storage
    /// adapter nulls out their reference.
    pub async fn delete(&self, business_id: BusinessId, id: CategoryId) -> DomainResult<()> {
        let category = self
            .categories
            .get(id)
            .await?
            .ok_or(DomainError::NotFound)?;
        if category.business_id != business_id {
            return Err(DomainError::Unauthorized);
        }
        self.categories.delete(id).await
    }

    pub async fn list(&self, business_id: BusinessId) -> DomainResult<Vec<Category>> {
        self.categories.list(business_id).await
    }
}
