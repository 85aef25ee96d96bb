//! Outbound ports: the hosted identity provider, profile storage, and email
//! delivery.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use ims_core::{BusinessId, DomainError, DomainResult, UserId};

use crate::principal::{PrincipalId, ProviderSession};
use crate::profile::Profile;

/// Failure reaching or talking to the identity provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    /// Network/config failure; surfaced as a connection error, never retried
    /// here — the user retries.
    #[error("identity provider unreachable: {0}")]
    Unreachable(String),

    /// The provider rejected the request (bad credentials, policy).
    #[error("identity provider rejected the request: {0}")]
    Rejected(String),

    /// Account creation hit an already-registered email.
    #[error("email already registered: {0}")]
    AlreadyRegistered(String),
}

/// Combined error for administrative identity operations (staff management,
/// migration).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// A provider-side account, as seen through the admin API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderAccount {
    pub id: PrincipalId,
    pub email: String,
}

/// Input for provisioning a provider account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    /// Skip email confirmation (used for migrated legacy accounts).
    pub email_confirmed: bool,
}

/// The hosted identity provider boundary.
///
/// Session calls model one client actor; the admin calls are used only by
/// staff management and the one-time migration.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_session(&self) -> Result<Option<ProviderSession>, ProviderError>;
    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, ProviderError>;
    async fn sign_out(&self) -> Result<(), ProviderError>;
    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError>;

    // Admin API.
    async fn create_account(&self, account: NewAccount) -> Result<ProviderAccount, ProviderError>;
    async fn find_account_by_email(
        &self,
        email: &str,
    ) -> Result<Option<ProviderAccount>, ProviderError>;
    async fn delete_account(&self, id: PrincipalId) -> Result<(), ProviderError>;
}

/// Storage port for staff profiles.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn get(&self, id: UserId) -> DomainResult<Option<Profile>>;
    async fn find_by_provider_link(&self, principal: PrincipalId)
        -> DomainResult<Option<Profile>>;
    /// Case-insensitive email lookup.
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Profile>>;
    async fn find_by_username(&self, username: &str) -> DomainResult<Option<Profile>>;
    async fn insert(&self, profile: &Profile) -> DomainResult<()>;
    async fn update(&self, profile: &Profile) -> DomainResult<()>;
    /// Idempotent link write-back: setting the same value twice succeeds;
    /// linking a principal already linked to a *different* profile fails
    /// with `DuplicateIdentifier`.
    async fn set_provider_link(&self, id: UserId, principal: PrincipalId) -> DomainResult<()>;
    async fn delete(&self, id: UserId) -> DomainResult<()>;
    async fn list(&self, business_id: BusinessId) -> DomainResult<Vec<Profile>>;
    /// All profiles across business units (migration/backfill only).
    async fn list_all(&self) -> DomainResult<Vec<Profile>>;
}

/// Fire-and-forget outbound email. Failures are logged, never propagated —
/// delivery is not awaited for correctness.
#[async_trait]
pub trait EmailDelivery: Send + Sync {
    async fn send_password_reset(&self, to: &str) -> Result<(), ProviderError>;
}

#[async_trait]
impl<T> IdentityProvider for Arc<T>
where
    T: IdentityProvider + ?Sized,
{
    async fn current_session(&self) -> Result<Option<ProviderSession>, ProviderError> {
        (**self).current_session().await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, ProviderError> {
        (**self).sign_in(email, password).await
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        (**self).sign_out().await
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        (**self).send_password_reset(email).await
    }

    async fn create_account(&self, account: NewAccount) -> Result<ProviderAccount, ProviderError> {
        (**self).create_account(account).await
    }

    async fn find_account_by_email(
        &self,
        email: &str,
    ) -> Result<Option<ProviderAccount>, ProviderError> {
        (**self).find_account_by_email(email).await
    }

    async fn delete_account(&self, id: PrincipalId) -> Result<(), ProviderError> {
        (**self).delete_account(id).await
    }
}

#[async_trait]
impl<T> ProfileRepository for Arc<T>
where
    T: ProfileRepository + ?Sized,
{
    async fn get(&self, id: UserId) -> DomainResult<Option<Profile>> {
        (**self).get(id).await
    }

    async fn find_by_provider_link(
        &self,
        principal: PrincipalId,
    ) -> DomainResult<Option<Profile>> {
        (**self).find_by_provider_link(principal).await
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Profile>> {
        (**self).find_by_email(email).await
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Option<Profile>> {
        (**self).find_by_username(username).await
    }

    async fn insert(&self, profile: &Profile) -> DomainResult<()> {
        (**self).insert(profile).await
    }

    async fn update(&self, profile: &Profile) -> DomainResult<()> {
        (**self).update(profile).await
    }

    async fn set_provider_link(&self, id: UserId, principal: PrincipalId) -> DomainResult<()> {
        (**self).set_provider_link(id, principal).await
    }

    async fn delete(&self, id: UserId) -> DomainResult<()> {
        (**self).delete(id).await
    }

    async fn list(&self, business_id: BusinessId) -> DomainResult<Vec<Profile>> {
        (**self).list(business_id).await
    }

    async fn list_all(&self) -> DomainResult<Vec<Profile>> {
        (**self).list_all().await
    }
}

#[async_trait]
impl<T> EmailDelivery for Arc<T>
where
    T: EmailDelivery + ?Sized,
{
    async fn send_password_reset(&self, to: &str) -> Result<(), ProviderError> {
        (**self).send_password_reset(to).await
    }
}
