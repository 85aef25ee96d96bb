//! Staff onboarding and lifecycle.

use async_trait::async_trait;
use chrono::Utc;

use ims_core::{DomainError, DomainResult, UserId};

use crate::authorize::{ensure_same_business, require_active, require_admin};
use crate::profile::{AVATAR_COLORS, NewStaff, Profile, Role};
use crate::provider::{IdentityError, IdentityProvider, NewAccount, ProfileRepository};

/// Port answering "has this user ever performed a ledger movement?" — the
/// hard-delete guard. Implemented by the ledger store.
#[async_trait]
pub trait ActivityLog: Send + Sync {
    async fn has_activity(&self, user_id: UserId) -> DomainResult<bool>;
}

#[async_trait]
impl<T> ActivityLog for std::sync::Arc<T>
where
    T: ActivityLog + ?Sized,
{
    async fn has_activity(&self, user_id: UserId) -> DomainResult<bool> {
        (**self).has_activity(user_id).await
    }
}

/// Editable staff fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaffPatch {
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub avatar_color: Option<Option<String>>,
}

/// Admin-facing staff management.
pub struct StaffDirectory<R, P, L> {
    profiles: R,
    provider: P,
    activity: L,
}

impl<R, P, L> StaffDirectory<R, P, L>
where
    R: ProfileRepository,
    P: IdentityProvider,
    L: ActivityLog,
{
    pub fn new(profiles: R, provider: P, activity: L) -> Self {
        Self {
            profiles,
            provider,
            activity,
        }
    }

    /// Onboard a staff member: provider account first, then the profile row.
    /// If the profile insert fails the provider account is rolled back so no
    /// orphaned principal remains.
    pub async fn create_staff(
        &self,
        actor: &Profile,
        new: NewStaff,
    ) -> Result<Profile, IdentityError> {
        require_active(actor)?;
        require_admin(actor)?;
        ensure_same_business(actor, new.business_id)?;
        new.validate()?;

        let username = new.username.trim().to_lowercase();
        if self.profiles.find_by_username(&username).await?.is_some() {
            return Err(DomainError::duplicate(format!("username '{username}' already taken")).into());
        }

        let account = self
            .provider
            .create_account(NewAccount {
                email: new.email.trim().to_lowercase(),
                password: new.password.clone(),
                email_confirmed: true,
            })
            .await?;

        let color = AVATAR_COLORS
            .get(self.profiles.list(new.business_id).await?.len() % AVATAR_COLORS.len())
            .map(|c| c.to_string());
        let profile = Profile::onboard(&new, account.id, color, Utc::now());

        if let Err(e) = self.profiles.insert(&profile).await {
            // Roll back the provider account; the failure we report is the
            // profile insert, not the cleanup.
            if let Err(cleanup) = self.provider.delete_account(account.id).await {
                tracing::warn!(
                    principal_id = %account.id,
                    error = %cleanup,
                    "failed to roll back provider account after profile insert failure"
                );
            }
            return Err(e.into());
        }

        tracing::info!(
            profile_id = %profile.id,
            business_id = %profile.business_id,
            role = %profile.role,
            "staff onboarded"
        );
        Ok(profile)
    }

    /// Edit name/role/avatar of a staff member in the actor's business unit.
    pub async fn update_staff(
        &self,
        actor: &Profile,
        id: UserId,
        patch: StaffPatch,
    ) -> Result<Profile, IdentityError> {
        require_active(actor)?;
        require_admin(actor)?;
        let mut profile = self.get_in_business(actor, id).await?;

        if let Some(full_name) = patch.full_name {
            let full_name = full_name.trim().to_string();
            if full_name.is_empty() {
                return Err(DomainError::validation("full name cannot be empty").into());
            }
            profile.full_name = full_name;
        }
        if let Some(role) = patch.role {
            profile.role = role;
        }
        if let Some(avatar_color) = patch.avatar_color {
            profile.avatar_color = avatar_color;
        }

        self.profiles.update(&profile).await?;
        Ok(profile)
    }

    /// The common removal path: the account stays, but cannot sign in.
    pub async fn deactivate_staff(&self, actor: &Profile, id: UserId) -> Result<(), IdentityError> {
        require_active(actor)?;
        require_admin(actor)?;
        let mut profile = self.get_in_business(actor, id).await?;
        profile.is_active = false;
        self.profiles.update(&profile).await?;
        Ok(())
    }

    pub async fn reactivate_staff(&self, actor: &Profile, id: UserId) -> Result<(), IdentityError> {
        require_active(actor)?;
        require_admin(actor)?;
        let mut profile = self.get_in_business(actor, id).await?;
        profile.is_active = true;
        self.profiles.update(&profile).await?;
        Ok(())
    }

    /// Permanent removal of profile and provider account.
    ///
    /// Forbidden while any ledger entry references the profile: the audit
    /// trail outlives the account.
    pub async fn delete_staff(&self, actor: &Profile, id: UserId) -> Result<(), IdentityError> {
        require_active(actor)?;
        require_admin(actor)?;
        let profile = self.get_in_business(actor, id).await?;

        if self.activity.has_activity(id).await? {
            return Err(DomainError::conflict(
                "profile is referenced by ledger entries; deactivate instead",
            )
            .into());
        }

        self.profiles.delete(id).await?;
        if let Some(principal_id) = profile.provider_link {
            self.provider.delete_account(principal_id).await?;
        }
        tracing::info!(profile_id = %id, "staff profile hard-deleted");
        Ok(())
    }

    pub async fn list_staff(&self, actor: &Profile) -> Result<Vec<Profile>, IdentityError> {
        require_active(actor)?;
        require_admin(actor)?;
        Ok(self.profiles.list(actor.business_id).await?)
    }

    async fn get_in_business(&self, actor: &Profile, id: UserId) -> Result<Profile, IdentityError> {
        let profile = self
            .profiles
            .get(id)
            .await?
            .ok_or(DomainError::NotFound)?;
        ensure_same_business(actor, profile.business_id)?;
        Ok(profile)
    }
}
