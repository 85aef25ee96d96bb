//! `ims-identity` — staff profiles, principal resolution, and session state.
//!
//! The hosted identity provider owns authentication; this crate maps its
//! principals onto internal staff profiles (self-healing legacy links), runs
//! the session state machine, and hosts the one-time migration operations
//! that bridged the legacy password-hash login onto the provider.

pub mod authorize;
pub mod migration;
pub mod principal;
pub mod profile;
pub mod provider;
pub mod resolver;
pub mod session;
pub mod staff;

pub use authorize::{ensure_same_business, require_active, require_admin};
pub use migration::{BackfillReport, SeedAdmin, SeedReport, backfill_provider_links, seed_admins};
pub use principal::{PrincipalId, ProviderSession};
pub use profile::{AVATAR_COLORS, NewStaff, Profile, Role};
pub use provider::{
    EmailDelivery, IdentityError, IdentityProvider, NewAccount, ProfileRepository,
    ProviderAccount, ProviderError,
};
pub use resolver::{IdentityResolver, ResolveError};
pub use session::{AuthState, ProviderEvent, SessionManager};
pub use staff::{ActivityLog, StaffDirectory, StaffPatch};
