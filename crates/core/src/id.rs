//! Strongly-typed identifiers used across the domain.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a business unit (the multi-tenant boundary).
///
/// The platform hosts a closed set of three business units sharing one
/// schema; every entity carries exactly one of these. Serialized as the
/// lowercase slug used in the data store (`wellbuild`, `tcchemical`,
/// `wellprint`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessId {
    Wellbuild,
    Tcchemical,
    Wellprint,
}

impl BusinessId {
    pub const ALL: [BusinessId; 3] = [
        BusinessId::Wellbuild,
        BusinessId::Tcchemical,
        BusinessId::Wellprint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BusinessId::Wellbuild => "wellbuild",
            BusinessId::Tcchemical => "tcchemical",
            BusinessId::Wellprint => "wellprint",
        }
    }

    /// Display name used on reports and login screens.
    pub fn label(&self) -> &'static str {
        match self {
            BusinessId::Wellbuild => "WELLBUILD",
            BusinessId::Tcchemical => "TC CHEMICAL",
            BusinessId::Wellprint => "WELLPRINT",
        }
    }
}

impl core::fmt::Display for BusinessId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BusinessId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wellbuild" => Ok(BusinessId::Wellbuild),
            "tcchemical" => Ok(BusinessId::Tcchemical),
            "wellprint" => Ok(BusinessId::Wellprint),
            other => Err(DomainError::invalid_id(format!(
                "BusinessId: unknown business unit '{other}'"
            ))),
        }
    }
}

/// Identifier of a user/staff profile (actor identity on ledger entries).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(Uuid);

macro_rules! impl_uuid_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Create a new identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
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

        impl Default for $t {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<Uuid> for $t {
            fn from(value: Uuid) -> Self {
                Self(value)
            }
        }

        impl From<$t> for Uuid {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let uuid = Uuid::from_str(s)
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Ok(Self(uuid))
            }
        }
    };
}

impl_uuid_newtype!(UserId, "UserId");
