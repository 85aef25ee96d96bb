//! Party registration and lifecycle, behind a storage port.

use async_trait::async_trait;
use chrono::Utc;

use ims_core::{BusinessId, DomainError, DomainResult};

use crate::party::{ContactInfo, NewParty, Party, PartyId, PartyKind};

/// Storage port for parties, backed by the relational store.
#[async_trait]
pub trait PartyRepository: Send + Sync {
    async fn get(&self, id: PartyId) -> DomainResult<Option<Party>>;
    async fn find_by_name(
        &self,
        business_id: BusinessId,
        kind: PartyKind,
        name: &str,
    ) -> DomainResult<Option<Party>>;
    async fn insert(&self, party: &Party) -> DomainResult<()>;
    async fn update(&self, party: &Party) -> DomainResult<()>;
    async fn set_active(&self, id: PartyId, active: bool) -> DomainResult<()>;
    async fn list_active(&self, business_id: BusinessId, kind: PartyKind)
        -> DomainResult<Vec<Party>>;
}

#[async_trait]
impl<T> PartyRepository for std::sync::Arc<T>
where
    T: PartyRepository + ?Sized,
{
    async fn get(&self, id: PartyId) -> DomainResult<Option<Party>> {
        (**self).get(id).await
    }

    async fn find_by_name(
        &self,
        business_id: BusinessId,
        kind: PartyKind,
        name: &str,
    ) -> DomainResult<Option<Party>> {
        (**self).find_by_name(business_id, kind, name).await
    }

    async fn insert(&self, party: &Party) -> DomainResult<()> {
        (**self).insert(party).await
    }

    async fn update(&self, party: &Party) -> DomainResult<()> {
        (**self).update(party).await
    }

    async fn set_active(&self, id: PartyId, active: bool) -> DomainResult<()> {
        (**self).set_active(id, active).await
    }

    async fn list_active(
        &self,
        business_id: BusinessId,
        kind: PartyKind,
    ) -> DomainResult<Vec<Party>> {
        (**self).list_active(business_id, kind).await
    }
}

/// Customer/supplier directory service.
pub struct PartyDirectory<R> {
    parties: R,
}

impl<R: PartyRepository> PartyDirectory<R> {
    pub fn new(parties: R) -> Self {
        Self { parties }
    }

    /// Register a new party; name must be unique per business unit and kind.
    pub async fn register(&self, new: NewParty) -> DomainResult<Party> {
        let party = Party::register(new, Utc::now())?;

        if let Some(existing) = self
            .parties
            .find_by_name(party.business_id, party.kind, &party.name)
            .await?
        {
            return Err(DomainError::duplicate(format!(
                "{} '{}' already exists",
                existing.kind, existing.name
            )));
        }

        self.parties.insert(&party).await?;
        tracing::info!(
            party_id = %party.id,
            business_id = %party.business_id,
            kind = %party.kind,
            "party registered"
        );
        Ok(party)
    }

    /// Update name/contact details in place.
    pub async fn update_details(
        &self,
        id: PartyId,
        name: Option<String>,
        contact: Option<ContactInfo>,
    ) -> DomainResult<Party> {
        let mut party = self.parties.get(id).await?.ok_or(DomainError::NotFound)?;

        if let Some(name) = name {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err(DomainError::validation("party name cannot be empty"));
            }
            party.name = name;
        }
        if let Some(contact) = contact {
            party.contact = contact;
        }

        self.parties.update(&party).await?;
        Ok(party)
    }

    /// Soft-deactivate: the party vanishes from pickers, references survive.
    pub async fn deactivate(&self, id: PartyId) -> DomainResult<()> {
        if self.parties.get(id).await?.is_none() {
            return Err(DomainError::NotFound);
        }
        self.parties.set_active(id, false).await
    }

    pub async fn list_active(
        &self,
        business_id: BusinessId,
        kind: PartyKind,
    ) -> DomainResult<Vec<Party>> {
        self.parties.list_active(business_id, kind).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubParties {
        rows: Mutex<Vec<Party>>,
    }

    #[async_trait]
    impl PartyRepository for StubParties {
        async fn get(&self, id: PartyId) -> DomainResult<Option<Party>> {
            Ok(self.rows.lock().unwrap().iter().find(|p| p.id == id).cloned())
        }

        async fn find_by_name(
            &self,
            business_id: BusinessId,
            kind: PartyKind,
            name: &str,
        ) -> DomainResult<Option<Party>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.business_id == business_id && p.kind == kind && p.name == name)
                .cloned())
        }

        async fn insert(&self, party: &Party) -> DomainResult<()> {
            self.rows.lock().unwrap().push(party.clone());
            Ok(())
        }

        async fn update(&self, party: &Party) -> DomainResult<()> {
            let mut rows = self.rows.lock().unwrap();
            let slot = rows
                .iter_mut()
                .find(|p| p.id == party.id)
                .ok_or(DomainError::NotFound)?;
            *slot = party.clone();
            Ok(())
        }

        async fn set_active(&self, id: PartyId, active: bool) -> DomainResult<()> {
            let mut rows = self.rows.lock().unwrap();
            let slot = rows
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(DomainError::NotFound)?;
            slot.is_active = active;
            Ok(())
        }

        async fn list_active(
            &self,
            business_id: BusinessId,
            kind: PartyKind,
        ) -> DomainResult<Vec<Party>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.business_id == business_id && p.kind == kind && p.is_active)
                .cloned()
                .collect())
        }
    }

    fn new_supplier(name: &str) -> NewParty {
        NewParty {
            business_id: BusinessId::Wellbuild,
            kind: PartyKind::Supplier,
            name: name.to_string(),
            contact: ContactInfo::default(),
        }
    }

    #[tokio::test]
    async fn duplicate_name_in_same_kind_is_rejected() {
        let directory = PartyDirectory::new(StubParties::default());
        directory.register(new_supplier("Apex Cement")).await.unwrap();

        let err = directory
            .register(new_supplier("Apex Cement"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DuplicateIdentifier(_)));
    }

    #[tokio::test]
    async fn update_rejects_blank_name() {
        let directory = PartyDirectory::new(StubParties::default());
        let party = directory.register(new_supplier("Apex Cement")).await.unwrap();

        let err = directory
            .update_details(party.id, Some("  ".to_string()), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn deactivated_party_disappears_from_listing() {
        let directory = PartyDirectory::new(StubParties::default());
        let party = directory.register(new_supplier("Apex Cement")).await.unwrap();
        directory.register(new_supplier("Borealis Steel")).await.unwrap();

        directory.deactivate(party.id).await.unwrap();
        let listed = directory
            .list_active(BusinessId::Wellbuild, PartyKind::Supplier)
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Borealis Steel");
    }

    #[tokio::test]
    async fn deactivating_unknown_party_is_not_found() {
        let directory = PartyDirectory::new(StubParties::default());
        let err = directory.deactivate(PartyId::new()).await.unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }
}
