//! Pure authorization checks.
//!
//! No IO, no panics, no business logic — every mutating operation runs these
//! against the resolved profile before touching a repository.

use ims_core::{BusinessId, DomainError, DomainResult};

use crate::profile::Profile;

/// The acting profile must belong to the business unit it is operating on.
pub fn ensure_same_business(actor: &Profile, business_id: BusinessId) -> DomainResult<()> {
    if actor.business_id != business_id {
        return Err(DomainError::Unauthorized);
    }
    Ok(())
}

/// Admin-only operations (staff management, hard deletes).
pub fn require_admin(actor: &Profile) -> DomainResult<()> {
    if !actor.role.is_admin() {
        return Err(DomainError::Unauthorized);
    }
    Ok(())
}

/// Deactivated actors cannot perform any operation.
pub fn require_active(actor: &Profile) -> DomainResult<()> {
    if !actor.is_active {
        return Err(DomainError::Unauthorized);
    }
    Ok(())
}
