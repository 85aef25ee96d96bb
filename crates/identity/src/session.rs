//! Client session lifecycle.
//!
//! Single-threaded-cooperative from the caller's point of view: one state
//! machine per client, driven by explicit calls and provider-pushed events.
//! It never polls.

use ims_core::UserId;

use crate::principal::{PrincipalId, ProviderSession};
use crate::profile::Profile;
use crate::provider::{EmailDelivery, IdentityProvider, ProfileRepository};
use crate::resolver::{IdentityResolver, ResolveError};

/// Authentication state of one client session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// No provider session.
    Anonymous,
    /// Principal resolved to an active profile.
    Authenticated(Profile),
    /// Valid principal, no (active) profile — treated as logged-out by the
    /// UI; an administrator must provision the account.
    Unprovisioned(PrincipalId),
}

impl AuthState {
    pub fn profile(&self) -> Option<&Profile> {
        match self {
            AuthState::Authenticated(profile) => Some(profile),
            AuthState::Anonymous | AuthState::Unprovisioned(_) => None,
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.profile().map(|p| p.id)
    }
}

/// Asynchronous event pushed by the provider (another tab signed in, token
/// refreshed, password-recovery link followed, session terminated).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    SignedIn(ProviderSession),
    SignedOut,
    TokenRefreshed(ProviderSession),
    PasswordRecovery(ProviderSession),
}

/// Drives [`AuthState`] from provider calls and events.
pub struct SessionManager<R, P, M> {
    resolver: IdentityResolver<R>,
    provider: P,
    mailer: M,
    state: AuthState,
}

impl<R, P, M> SessionManager<R, P, M>
where
    R: ProfileRepository,
    P: IdentityProvider,
    M: EmailDelivery,
{
    pub fn new(profiles: R, provider: P, mailer: M) -> Self {
        Self {
            resolver: IdentityResolver::new(profiles),
            provider,
            mailer,
            state: AuthState::Anonymous,
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn profile(&self) -> Option<&Profile> {
        self.state.profile()
    }

    /// On application start: pick up an existing provider session, if any.
    pub async fn bootstrap(&mut self) -> Result<&AuthState, ResolveError> {
        match self.provider.current_session().await? {
            None => self.state = AuthState::Anonymous,
            Some(session) => self.state = self.resolve_session(&session).await?,
        }
        Ok(&self.state)
    }

    /// Credential sign-in. A principal without a provisioned profile is a
    /// sign-in failure (`ProfileNotProvisioned`).
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<&AuthState, ResolveError> {
        let session = self.provider.sign_in(email, password).await?;
        self.state = self.resolve_session(&session).await?;
        match &self.state {
            AuthState::Authenticated(_) => Ok(&self.state),
            _ => Err(ResolveError::ProfileNotProvisioned),
        }
    }

    pub async fn sign_out(&mut self) -> Result<(), ResolveError> {
        self.provider.sign_out().await?;
        self.state = AuthState::Anonymous;
        Ok(())
    }

    /// React to a provider-pushed event by re-running resolution.
    pub async fn on_provider_event(
        &mut self,
        event: ProviderEvent,
    ) -> Result<&AuthState, ResolveError> {
        match event {
            ProviderEvent::SignedOut => self.state = AuthState::Anonymous,
            ProviderEvent::SignedIn(session)
            | ProviderEvent::TokenRefreshed(session)
            | ProviderEvent::PasswordRecovery(session) => {
                self.state = self.resolve_session(&session).await?;
            }
        }
        Ok(&self.state)
    }

    /// Fire-and-forget password reset: the provider sends its reset link and
    /// our templated notification goes out best-effort.
    pub async fn request_password_reset(&self, email: &str) -> Result<(), ResolveError> {
        self.provider.send_password_reset(email).await?;
        if let Err(e) = self.mailer.send_password_reset(email).await {
            tracing::warn!(email, error = %e, "reset notification delivery failed");
        }
        Ok(())
    }

    async fn resolve_session(&self, session: &ProviderSession) -> Result<AuthState, ResolveError> {
        let resolved = self
            .resolver
            .resolve(session.principal_id, session.email.as_deref())
            .await?;
        Ok(match resolved {
            Some(profile) if profile.is_active => AuthState::Authenticated(profile),
            // A deactivated profile must not yield an authenticated state.
            Some(_) | None => AuthState::Unprovisioned(session.principal_id),
        })
    }
}
