use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ims_core::{BusinessId, DomainError, DomainResult, Entity};

/// Party identifier (business-unit scoped via the `business_id` field).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(Uuid);

impl PartyId {
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

impl Default for PartyId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for PartyId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<Uuid> for PartyId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl From<PartyId> for Uuid {
    fn from(value: PartyId) -> Self {
        value.0
    }
}

impl FromStr for PartyId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid =
            Uuid::from_str(s).map_err(|e| DomainError::invalid_id(format!("PartyId: {e}")))?;
        Ok(Self(uuid))
    }
}

/// Party kind: customer or supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyKind {
    Customer,
    Supplier,
}

impl PartyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartyKind::Customer => "customer",
            PartyKind::Supplier => "supplier",
        }
    }
}

impl core::fmt::Display for PartyKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contact information for a party.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Contact person (suppliers typically have one; customers usually not).
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Input for registering a new party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewParty {
    pub business_id: BusinessId,
    pub kind: PartyKind,
    pub name: String,
    pub contact: ContactInfo,
}

/// A customer or supplier record, scoped to one business unit.
///
/// Soft-deactivated only: `is_active = false` hides the party from pickers
/// while keeping existing references intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    pub id: PartyId,
    pub business_id: BusinessId,
    pub kind: PartyKind,
    pub name: String,
    pub contact: ContactInfo,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Party {
    /// Validate and construct a new active party.
    pub fn register(new: NewParty, now: DateTime<Utc>) -> DomainResult<Self> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("party name cannot be empty"));
        }
        if let Some(email) = new.contact.email.as_deref() {
            if !email.trim().is_empty() && !email.contains('@') {
                return Err(DomainError::validation("invalid email format"));
            }
        }

        Ok(Self {
            id: PartyId::new(),
            business_id: new.business_id,
            kind: new.kind,
            name: name.to_string(),
            contact: new.contact,
            is_active: true,
            created_at: now,
        })
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
    }

    pub fn reactivate(&mut self) {
        self.is_active = true;
    }

    /// Whether this party may appear on new transactions.
    pub fn can_transact(&self) -> bool {
        self.is_active
    }
}

impl Entity for Party {
    type Id = PartyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
