//! `ims-infra` — storage and provider adapters behind the domain ports.
//!
//! Two interchangeable storage backends: [`memory::InMemoryStore`] for tests
//! and local development, and [`postgres::PostgresStore`] for production
//! (schema under `migrations/`). Both commit a ledger append and its balance
//! update atomically. [`provider::MockIdentityProvider`] stands in for the
//! hosted identity provider.

pub mod email;
pub mod memory;
pub mod postgres;
pub mod provider;

#[cfg(test)]
mod integration_tests;

pub use email::{LoggingMailer, RecordingMailer};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use provider::MockIdentityProvider;
