//! Principal-to-profile resolution with self-healing legacy links.

use thiserror::Error;

use ims_core::DomainError;

use crate::principal::PrincipalId;
use crate::profile::Profile;
use crate::provider::{ProfileRepository, ProviderError};

/// Resolution/session failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Could not reach the identity provider; user-initiated retry only.
    #[error("identity provider unreachable: {0}")]
    ProviderUnreachable(String),

    /// The provider rejected the credentials.
    #[error("sign-in rejected: {0}")]
    Rejected(String),

    /// Valid principal, but no matching profile row. An administrator must
    /// provision the account.
    #[error("authenticated principal has no provisioned profile")]
    ProfileNotProvisioned,
}

impl From<ProviderError> for ResolveError {
    fn from(value: ProviderError) -> Self {
        match value {
            ProviderError::Unreachable(msg) => ResolveError::ProviderUnreachable(msg),
            ProviderError::Rejected(msg) => ResolveError::Rejected(msg),
            ProviderError::AlreadyRegistered(msg) => ResolveError::Rejected(msg),
        }
    }
}

/// Maps an authenticated principal to its staff profile.
///
/// Two-tier lookup: the provider link is the fast steady-state path; the
/// case-insensitive email fallback exists for accounts that predate the
/// provider integration, and its write-back makes the fallback a one-time
/// event per legacy account.
pub struct IdentityResolver<R> {
    profiles: R,
}

impl<R: ProfileRepository> IdentityResolver<R> {
    pub fn new(profiles: R) -> Self {
        Self { profiles }
    }

    /// Resolve a principal to a profile, or `None` when no profile exists
    /// ("authenticated but not provisioned").
    pub async fn resolve(
        &self,
        principal_id: PrincipalId,
        email: Option<&str>,
    ) -> Result<Option<Profile>, ResolveError> {
        if let Some(profile) = self.profiles.find_by_provider_link(principal_id).await? {
            return Ok(Some(profile));
        }

        let Some(email) = email else {
            return Ok(None);
        };
        let Some(mut profile) = self.profiles.find_by_email(email).await? else {
            return Ok(None);
        };

        match profile.provider_link {
            None => {
                // Idempotent write-back; safe to race from multiple tabs.
                self.profiles
                    .set_provider_link(profile.id, principal_id)
                    .await?;
                profile.provider_link = Some(principal_id);
                tracing::info!(
                    profile_id = %profile.id,
                    principal_id = %principal_id,
                    "healed missing provider link via email fallback"
                );
            }
            Some(linked) if linked != principal_id => {
                tracing::warn!(
                    profile_id = %profile.id,
                    linked = %linked,
                    principal_id = %principal_id,
                    "email matched a profile linked to a different principal"
                );
            }
            Some(_) => {}
        }

        Ok(Some(profile))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{NewStaff, Role};
    use crate::provider::ProfileRepository;
    use async_trait::async_trait;
    use chrono::Utc;
    use ims_core::{BusinessId, DomainResult, UserId};
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubProfiles {
        rows: Mutex<Vec<Profile>>,
    }

    impl StubProfiles {
        fn with(profiles: Vec<Profile>) -> Self {
            Self {
                rows: Mutex::new(profiles),
            }
        }

        fn get_sync(&self, id: UserId) -> Option<Profile> {
            self.rows.lock().unwrap().iter().find(|p| p.id == id).cloned()
        }
    }

    #[async_trait]
    impl ProfileRepository for StubProfiles {
        async fn get(&self, id: UserId) -> DomainResult<Option<Profile>> {
            Ok(self.get_sync(id))
        }

        async fn find_by_provider_link(
            &self,
            principal: PrincipalId,
        ) -> DomainResult<Option<Profile>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.provider_link == Some(principal))
                .cloned())
        }

        async fn find_by_email(&self, email: &str) -> DomainResult<Option<Profile>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|p| {
                    p.email
                        .as_deref()
                        .is_some_and(|e| e.eq_ignore_ascii_case(email.trim()))
                })
                .cloned())
        }

        async fn find_by_username(&self, username: &str) -> DomainResult<Option<Profile>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.username == username)
                .cloned())
        }

        async fn insert(&self, profile: &Profile) -> DomainResult<()> {
            self.rows.lock().unwrap().push(profile.clone());
            Ok(())
        }

        async fn update(&self, profile: &Profile) -> DomainResult<()> {
            let mut rows = self.rows.lock().unwrap();
            let slot = rows
                .iter_mut()
                .find(|p| p.id == profile.id)
                .ok_or(ims_core::DomainError::NotFound)?;
            *slot = profile.clone();
            Ok(())
        }

        async fn set_provider_link(
            &self,
            id: UserId,
            principal: PrincipalId,
        ) -> DomainResult<()> {
            let mut rows = self.rows.lock().unwrap();
            let slot = rows
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or(ims_core::DomainError::NotFound)?;
            slot.provider_link = Some(principal);
            Ok(())
        }

        async fn delete(&self, id: UserId) -> DomainResult<()> {
            self.rows.lock().unwrap().retain(|p| p.id != id);
            Ok(())
        }

        async fn list(&self, business_id: BusinessId) -> DomainResult<Vec<Profile>> {
            Ok(self
                .rows
                .lock()
                .unwrap()
                .iter()
                .filter(|p| p.business_id == business_id)
                .cloned()
                .collect())
        }

        async fn list_all(&self) -> DomainResult<Vec<Profile>> {
            Ok(self.rows.lock().unwrap().clone())
        }
    }

    fn profile(email: &str, link: Option<PrincipalId>) -> Profile {
        let mut profile = Profile::onboard(
            &NewStaff {
                business_id: BusinessId::Wellbuild,
                username: "legacy".to_string(),
                full_name: "Legacy User".to_string(),
                email: email.to_string(),
                password: "password123".to_string(),
                role: Role::Staff,
            },
            PrincipalId::new(),
            None,
            Utc::now(),
        );
        profile.provider_link = link;
        profile
    }

    #[tokio::test]
    async fn linked_principal_resolves_without_email() {
        let principal = PrincipalId::new();
        let stored = profile("maria@example.com", Some(principal));
        let resolver = IdentityResolver::new(StubProfiles::with(vec![stored.clone()]));

        let resolved = resolver.resolve(principal, None).await.unwrap().unwrap();
        assert_eq!(resolved.id, stored.id);
    }

    #[tokio::test]
    async fn email_fallback_writes_the_link_back() {
        let stored = profile("maria@example.com", None);
        let profiles = std::sync::Arc::new(StubProfiles::with(vec![stored.clone()]));
        let principal = PrincipalId::new();
        let resolver = IdentityResolver::new(std::sync::Arc::clone(&profiles));

        let resolved = resolver
            .resolve(principal, Some("MARIA@example.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.provider_link, Some(principal));
        // Persisted, not just patched on the returned copy.
        assert_eq!(
            profiles.get_sync(stored.id).unwrap().provider_link,
            Some(principal)
        );
    }

    #[tokio::test]
    async fn unknown_principal_resolves_to_none() {
        let resolver = IdentityResolver::new(StubProfiles::default());
        let resolved = resolver
            .resolve(PrincipalId::new(), Some("nobody@example.com"))
            .await
            .unwrap();
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn email_match_with_foreign_link_is_not_relinked() {
        let other = PrincipalId::new();
        let stored = profile("maria@example.com", Some(other));
        let profiles = std::sync::Arc::new(StubProfiles::with(vec![stored.clone()]));
        let resolver = IdentityResolver::new(std::sync::Arc::clone(&profiles));

        let resolved = resolver
            .resolve(PrincipalId::new(), Some("maria@example.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.id, stored.id);
        assert_eq!(profiles.get_sync(stored.id).unwrap().provider_link, Some(other));
    }
}
