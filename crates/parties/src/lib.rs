//! `ims-parties` — customers and suppliers.
//!
//! Both are modeled as one `Party` entity distinguished by kind. Parties are
//! soft-deactivated, never hard-deleted, so ledger sale snapshots and product
//! supplier references stay valid.

pub mod directory;
pub mod party;

pub use directory::{PartyDirectory, PartyRepository};
pub use party::{ContactInfo, NewParty, Party, PartyId, PartyKind};
