use chrono::{DateTime, Utc};
use core::str::FromStr;
use serde::{Deserialize, Serialize};

use ims_core::{BusinessId, DomainError, DomainResult, Entity, UserId};

use crate::principal::PrincipalId;

/// Staff role. Closed set; branched on exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    #[default]
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Staff => "staff",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "staff" => Ok(Role::Staff),
            other => Err(DomainError::invalid_id(format!(
                "Role: unknown role '{other}'"
            ))),
        }
    }
}

/// Avatar palette assigned round-robin at onboarding.
pub const AVATAR_COLORS: &[&str] = &[
    "#d4a017", "#5b9490", "#4e6b65", "#3d9e74", "#c07a2a", "#7a7ea8", "#2e8b80", "#c46b3a",
    "#8a6e4b", "#4a8a6f", "#6b7e9e", "#a07040",
];

/// Input for onboarding a staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStaff {
    pub business_id: BusinessId,
    pub username: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

impl NewStaff {
    /// Basic field validation (the provider enforces its own rules on top).
    pub fn validate(&self) -> DomainResult<()> {
        if self.username.trim().is_empty() {
            return Err(DomainError::validation("username cannot be empty"));
        }
        if self.full_name.trim().is_empty() {
            return Err(DomainError::validation("full name cannot be empty"));
        }
        if self.email.trim().is_empty() || !self.email.contains('@') {
            return Err(DomainError::validation("invalid email format"));
        }
        if self.password.len() < 8 {
            return Err(DomainError::validation(
                "password must be at least 8 characters",
            ));
        }
        Ok(())
    }
}

/// Application-level user record, scoped to one business unit.
///
/// # Invariants
/// - `provider_link`, once established, is unique per principal.
/// - Deactivation is the common removal path; hard deletion is guarded by
///   ledger references (see `StaffDirectory::delete_staff`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    /// Link to the provider's principal. `None` only for legacy accounts
    /// created before the provider integration; self-healed on first login.
    pub provider_link: Option<PrincipalId>,
    pub username: String,
    pub full_name: String,
    pub email: Option<String>,
    pub role: Role,
    pub business_id: BusinessId,
    pub avatar_color: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Construct a provisioned profile already linked to a principal.
    pub fn onboard(
        new: &NewStaff,
        principal_id: PrincipalId,
        avatar_color: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            provider_link: Some(principal_id),
            username: new.username.trim().to_lowercase(),
            full_name: new.full_name.trim().to_string(),
            email: Some(new.email.trim().to_lowercase()),
            role: new.role,
            business_id: new.business_id,
            avatar_color,
            is_active: true,
            created_at: now,
        }
    }

    /// Case-insensitive email comparison (legacy fallback lookup).
    pub fn matches_email(&self, email: &str) -> bool {
        self.email
            .as_deref()
            .is_some_and(|own| own.eq_ignore_ascii_case(email.trim()))
    }
}

impl Entity for Profile {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_staff() -> NewStaff {
        NewStaff {
            business_id: BusinessId::Wellbuild,
            username: "Alice.W".to_string(),
            full_name: "Alice Smith".to_string(),
            email: "Alice@Example.com".to_string(),
            password: "long-enough".to_string(),
            role: Role::Staff,
        }
    }

    #[test]
    fn validate_rejects_short_password() {
        let mut staff = new_staff();
        staff.password = "short".to_string();
        assert!(matches!(
            staff.validate(),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn validate_rejects_malformed_email() {
        let mut staff = new_staff();
        staff.email = "nope".to_string();
        assert!(staff.validate().is_err());
    }

    #[test]
    fn onboard_normalizes_username_and_email() {
        let profile = Profile::onboard(&new_staff(), PrincipalId::new(), None, Utc::now());
        assert_eq!(profile.username, "alice.w");
        assert_eq!(profile.email.as_deref(), Some("alice@example.com"));
        assert!(profile.is_active);
    }

    #[test]
    fn email_match_is_case_insensitive() {
        let profile = Profile::onboard(&new_staff(), PrincipalId::new(), None, Utc::now());
        assert!(profile.matches_email("ALICE@example.COM"));
        assert!(profile.matches_email("  alice@example.com "));
        assert!(!profile.matches_email("bob@example.com"));
    }

    #[test]
    fn role_slug_round_trip() {
        for role in [Role::Admin, Role::Staff] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }
}
