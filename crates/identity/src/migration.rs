//! One-time administrative operations bridging legacy accounts onto the
//! hosted identity provider.
//!
//! Both operations are idempotent on re-run: already-linked profiles and
//! already-existing provider accounts are skipped, never duplicated. Neither
//! belongs to the runtime login path — there is exactly one identity scheme
//! after migration.

use chrono::Utc;
use serde::Serialize;

use ims_core::BusinessId;

use crate::profile::{NewStaff, Profile, Role};
use crate::provider::{
    EmailDelivery, IdentityError, IdentityProvider, NewAccount, ProfileRepository, ProviderError,
};

/// Outcome counters for the provider-link backfill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub migrated: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// For every profile lacking a provider link: create a provider account with
/// a temporary password (email pre-confirmed) and write the link back. If
/// the email is already registered, look the account up and link it instead.
///
/// Per-row failures are counted and logged, not propagated — the run always
/// completes. Migrated users get a best-effort password-reset notification
/// so the temporary password never has to circulate.
pub async fn backfill_provider_links<R, P, M>(
    profiles: &R,
    provider: &P,
    mailer: &M,
    temp_password: &str,
) -> Result<BackfillReport, IdentityError>
where
    R: ProfileRepository,
    P: IdentityProvider,
    M: EmailDelivery,
{
    let mut report = BackfillReport::default();

    for profile in profiles.list_all().await? {
        if profile.provider_link.is_some() {
            report.skipped += 1;
            continue;
        }
        let Some(email) = profile.email.as_deref().map(str::trim).filter(|e| !e.is_empty())
        else {
            tracing::warn!(username = %profile.username, "skipping profile without email");
            report.skipped += 1;
            continue;
        };

        let outcome = link_one(profiles, provider, &profile, email, temp_password).await;
        match outcome {
            Ok(true) => {
                report.migrated += 1;
                if let Err(e) = mailer.send_password_reset(email).await {
                    tracing::warn!(email, error = %e, "reset notification delivery failed");
                }
            }
            Ok(false) => report.skipped += 1,
            Err(e) => {
                tracing::warn!(email, error = %e, "backfill failed for profile");
                report.failed += 1;
            }
        }
    }

    tracing::info!(
        migrated = report.migrated,
        skipped = report.skipped,
        failed = report.failed,
        "provider-link backfill complete"
    );
    Ok(report)
}

async fn link_one<R, P>(
    profiles: &R,
    provider: &P,
    profile: &Profile,
    email: &str,
    temp_password: &str,
) -> Result<bool, IdentityError>
where
    R: ProfileRepository,
    P: IdentityProvider,
{
    let created = provider
        .create_account(NewAccount {
            email: email.to_lowercase(),
            password: temp_password.to_string(),
            email_confirmed: true,
        })
        .await;

    let principal_id = match created {
        Ok(account) => account.id,
        Err(ProviderError::AlreadyRegistered(_)) => {
            match provider.find_account_by_email(email).await? {
                Some(existing) => existing.id,
                None => {
                    tracing::warn!(email, "provider reports email registered but no account found");
                    return Ok(false);
                }
            }
        }
        Err(e) => return Err(e.into()),
    };

    profiles.set_provider_link(profile.id, principal_id).await?;
    tracing::info!(profile_id = %profile.id, principal_id = %principal_id, "profile linked");
    Ok(true)
}

/// One seed admin per business unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedAdmin {
    pub business_id: BusinessId,
    pub email: String,
    pub username: String,
    pub full_name: String,
}

impl SeedAdmin {
    /// The standard trio of business-unit administrators.
    pub fn defaults() -> Vec<SeedAdmin> {
        BusinessId::ALL
            .into_iter()
            .map(|biz| SeedAdmin {
                business_id: biz,
                email: format!("admin@{}.com", biz.as_str()),
                username: format!("admin.{}", biz.as_str()),
                full_name: format!("{} Admin", biz.label()),
            })
            .collect()
    }
}

/// Outcome counters for admin seeding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub created: usize,
    pub skipped: usize,
}

/// Create the initial admin profiles, one per business unit, through the
/// provider. Idempotent: an existing username skips the row.
pub async fn seed_admins<R, P>(
    profiles: &R,
    provider: &P,
    admins: &[SeedAdmin],
    password: &str,
) -> Result<SeedReport, IdentityError>
where
    R: ProfileRepository,
    P: IdentityProvider,
{
    let mut report = SeedReport::default();

    for admin in admins {
        if profiles.find_by_username(&admin.username).await?.is_some() {
            report.skipped += 1;
            continue;
        }

        let account = provider
            .create_account(NewAccount {
                email: admin.email.to_lowercase(),
                password: password.to_string(),
                email_confirmed: true,
            })
            .await?;

        let profile = Profile::onboard(
            &NewStaff {
                business_id: admin.business_id,
                username: admin.username.clone(),
                full_name: admin.full_name.clone(),
                email: admin.email.clone(),
                password: password.to_string(),
                role: Role::Admin,
            },
            account.id,
            None,
            Utc::now(),
        );
        profiles.insert(&profile).await?;
        tracing::info!(
            business_id = %admin.business_id,
            username = %admin.username,
            "seed admin created"
        );
        report.created += 1;
    }

    Ok(report)
}
