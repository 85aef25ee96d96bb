//! Mock identity provider.
//!
//! Stands in for the hosted provider in tests and local development: an
//! in-process account table, a single client session slot, and a switch to
//! simulate the provider being unreachable.

use std::sync::Mutex;

use async_trait::async_trait;

use ims_identity::{
    IdentityProvider, NewAccount, PrincipalId, ProviderAccount, ProviderError, ProviderSession,
};

#[derive(Debug, Clone)]
struct Account {
    id: PrincipalId,
    email: String,
    password: String,
}

#[derive(Debug, Default)]
struct State {
    accounts: Vec<Account>,
    session: Option<ProviderSession>,
    reset_emails: Vec<String>,
    unreachable: bool,
}

/// In-process stand-in for the hosted identity provider.
#[derive(Debug, Default)]
pub struct MockIdentityProvider {
    state: Mutex<State>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>, ProviderError> {
        self.state
            .lock()
            .map_err(|_| ProviderError::Unreachable("provider state poisoned".to_string()))
    }

    /// Flip the simulated network state.
    pub fn set_unreachable(&self, unreachable: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.unreachable = unreachable;
        }
    }

    /// Pre-register an account without going through the admin API, as if it
    /// existed on the provider before this system was deployed.
    pub fn register_existing(&self, email: &str, password: &str) -> PrincipalId {
        let id = PrincipalId::new();
        if let Ok(mut state) = self.state.lock() {
            state.accounts.push(Account {
                id,
                email: email.to_string(),
                password: password.to_string(),
            });
        }
        id
    }

    /// Emails the provider was asked to send a password reset to.
    pub fn reset_emails(&self) -> Vec<String> {
        self.state
            .lock()
            .map(|s| s.reset_emails.clone())
            .unwrap_or_default()
    }

    pub fn account_count(&self) -> usize {
        self.state.lock().map(|s| s.accounts.len()).unwrap_or(0)
    }

    pub fn has_account(&self, email: &str) -> bool {
        self.state
            .lock()
            .map(|s| {
                s.accounts
                    .iter()
                    .any(|a| a.email.eq_ignore_ascii_case(email))
            })
            .unwrap_or(false)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn current_session(&self) -> Result<Option<ProviderSession>, ProviderError> {
        let state = self.lock()?;
        if state.unreachable {
            return Err(ProviderError::Unreachable("simulated outage".to_string()));
        }
        Ok(state.session.clone())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<ProviderSession, ProviderError> {
        let mut state = self.lock()?;
        if state.unreachable {
            return Err(ProviderError::Unreachable("simulated outage".to_string()));
        }
        let account = state
            .accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email) && a.password == password)
            .cloned()
            .ok_or_else(|| ProviderError::Rejected("invalid login credentials".to_string()))?;

        let session = ProviderSession {
            principal_id: account.id,
            email: Some(account.email),
        };
        state.session = Some(session.clone());
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), ProviderError> {
        let mut state = self.lock()?;
        if state.unreachable {
            return Err(ProviderError::Unreachable("simulated outage".to_string()));
        }
        state.session = None;
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), ProviderError> {
        let mut state = self.lock()?;
        if state.unreachable {
            return Err(ProviderError::Unreachable("simulated outage".to_string()));
        }
        state.reset_emails.push(email.to_string());
        Ok(())
    }

    async fn create_account(&self, account: NewAccount) -> Result<ProviderAccount, ProviderError> {
        let mut state = self.lock()?;
        if state.unreachable {
            return Err(ProviderError::Unreachable("simulated outage".to_string()));
        }
        if state
            .accounts
            .iter()
            .any(|a| a.email.eq_ignore_ascii_case(&account.email))
        {
            return Err(ProviderError::AlreadyRegistered(account.email));
        }

        let created = Account {
            id: PrincipalId::new(),
            email: account.email,
            password: account.password,
        };
        let result = ProviderAccount {
            id: created.id,
            email: created.email.clone(),
        };
        state.accounts.push(created);
        Ok(result)
    }

    async fn find_account_by_email(
        &self,
        email: &str,
    ) -> Result<Option<ProviderAccount>, ProviderError> {
        let state = self.lock()?;
        if state.unreachable {
            return Err(ProviderError::Unreachable("simulated outage".to_string()));
        }
        Ok(state
            .accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .map(|a| ProviderAccount {
                id: a.id,
                email: a.email.clone(),
            }))
    }

    async fn delete_account(&self, id: PrincipalId) -> Result<(), ProviderError> {
        let mut state = self.lock()?;
        if state.unreachable {
            return Err(ProviderError::Unreachable("simulated outage".to_string()));
        }
        state.accounts.retain(|a| a.id != id);
        Ok(())
    }
}
