//! End-to-end tests over the in-memory adapters: the movement ledger with
//! its atomic balance commit, identity resolution with legacy-link healing,
//! staff lifecycle, and the one-time migration operations.

use std::sync::Arc;

use chrono::Utc;

use ims_core::{BusinessId, DomainError, UserId};
use ims_identity::{
    AuthState, NewStaff, PrincipalId, Profile, ProviderEvent, ResolveError, Role, SeedAdmin,
    SessionManager, StaffDirectory, backfill_provider_links, seed_admins,
};
use ims_inventory::{
    CategoryDirectory, MovementKind, MovementMetadata, NewProduct, ProductPatch,
    ProductRepository, SaleInfo, StockLedger, replay,
};
use ims_parties::{ContactInfo, NewParty, PartyDirectory, PartyKind};

use crate::email::RecordingMailer;
use crate::memory::InMemoryStore;
use crate::provider::MockIdentityProvider;

type Store = Arc<InMemoryStore>;

fn store() -> Store {
    Arc::new(InMemoryStore::new())
}

fn stock_ledger(store: &Store) -> StockLedger<Store, Store> {
    StockLedger::new(Arc::clone(store), Arc::clone(store))
}

fn new_product(business_id: BusinessId, sku: &str, initial: i64) -> NewProduct {
    NewProduct {
        business_id,
        sku: sku.to_string(),
        name: format!("Product {sku}"),
        description: None,
        category_id: None,
        supplier_id: None,
        unit: "pcs".to_string(),
        initial_quantity: initial,
        reorder_level: 5,
        cost_price: 1000,
        selling_price: 1500,
    }
}

fn new_staff(business_id: BusinessId, username: &str, role: Role) -> NewStaff {
    NewStaff {
        business_id,
        username: username.to_string(),
        full_name: format!("Test {username}"),
        email: format!("{username}@example.com"),
        password: "password123".to_string(),
        role,
    }
}

fn admin(business_id: BusinessId) -> Profile {
    Profile::onboard(
        &new_staff(business_id, "boss", Role::Admin),
        PrincipalId::new(),
        None,
        Utc::now(),
    )
}

/// A profile row as it looked before the provider integration: no link.
fn legacy_profile(business_id: BusinessId, username: &str, email: &str) -> Profile {
    let mut profile = Profile::onboard(
        &new_staff(business_id, username, Role::Staff),
        PrincipalId::new(),
        None,
        Utc::now(),
    );
    profile.provider_link = None;
    profile.email = Some(email.to_string());
    profile
}

#[tokio::test]
async fn product_creation_synthesizes_initial_entry() {
    let store = store();
    let ledger = stock_ledger(&store);
    let actor = UserId::new();

    let product = ledger
        .create_product(new_product(BusinessId::Wellbuild, "CEM-001", 40), actor)
        .await
        .unwrap();
    assert_eq!(product.quantity, 40);

    let history = ledger
        .history(BusinessId::Wellbuild, product.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, MovementKind::StockIn);
    assert_eq!(history[0].reference.as_deref(), Some("INITIAL"));
    assert_eq!(replay(&history), product.quantity);
}

#[tokio::test]
async fn zero_initial_quantity_creates_no_entry() {
    let store = store();
    let ledger = stock_ledger(&store);

    let product = ledger
        .create_product(new_product(BusinessId::Wellbuild, "CEM-002", 0), UserId::new())
        .await
        .unwrap();
    assert_eq!(product.quantity, 0);
    let history = ledger
        .history(BusinessId::Wellbuild, product.id)
        .await
        .unwrap();
    assert!(history.is_empty());
}

#[tokio::test]
async fn movement_sequence_keeps_balance_equal_to_replay() {
    let store = store();
    let ledger = stock_ledger(&store);
    let actor = UserId::new();
    let product = ledger
        .create_product(new_product(BusinessId::Tcchemical, "ACID-01", 10), actor)
        .await
        .unwrap();

    let receipt = ledger
        .record_movement(
            BusinessId::Tcchemical,
            product.id,
            MovementKind::StockIn,
            15,
            MovementMetadata::default(),
            actor,
        )
        .await
        .unwrap();
    assert_eq!(receipt.new_balance, 25);

    let receipt = ledger
        .record_movement(
            BusinessId::Tcchemical,
            product.id,
            MovementKind::StockOut,
            6,
            MovementMetadata {
                sale: Some(SaleInfo {
                    voucher_number: Some("V-100".to_string()),
                    customer_name: Some("Acme Builders".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            actor,
        )
        .await
        .unwrap();
    assert_eq!(receipt.new_balance, 19);
    assert_eq!(receipt.entry.voucher_number.as_deref(), Some("V-100"));

    // A recount sets the absolute quantity; it is not a delta.
    let receipt = ledger
        .record_movement(
            BusinessId::Tcchemical,
            product.id,
            MovementKind::Adjustment,
            12,
            MovementMetadata::default(),
            actor,
        )
        .await
        .unwrap();
    assert_eq!(receipt.new_balance, 12);

    let history = ledger
        .history(BusinessId::Tcchemical, product.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(replay(&history), 12);
}

#[tokio::test]
async fn stock_out_beyond_available_is_rejected_and_unrecorded() {
    let store = store();
    let ledger = stock_ledger(&store);
    let actor = UserId::new();
    let product = ledger
        .create_product(new_product(BusinessId::Wellprint, "INK-01", 3), actor)
        .await
        .unwrap();

    let err = ledger
        .record_movement(
            BusinessId::Wellprint,
            product.id,
            MovementKind::StockOut,
            5,
            MovementMetadata::default(),
            actor,
        )
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::InsufficientStock { available: 3 });

    // Nothing written beyond the initial entry, balance untouched.
    let history = ledger
        .history(BusinessId::Wellprint, product.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(replay(&history), 3);
}

#[tokio::test]
async fn concurrent_stock_outs_cannot_oversell() {
    let store = store();
    let ledger = stock_ledger(&store);
    let actor = UserId::new();
    let product = ledger
        .create_product(new_product(BusinessId::Wellbuild, "BAR-01", 10), actor)
        .await
        .unwrap();

    let (a, b) = tokio::join!(
        ledger.record_movement(
            BusinessId::Wellbuild,
            product.id,
            MovementKind::StockOut,
            7,
            MovementMetadata::default(),
            actor,
        ),
        ledger.record_movement(
            BusinessId::Wellbuild,
            product.id,
            MovementKind::StockOut,
            7,
            MovementMetadata::default(),
            actor,
        ),
    );

    // Exactly one of the two may win; the loser sees the post-commit
    // quantity, not the stale one it planned against.
    let (won, lost) = match (a, b) {
        (Ok(won), Err(lost)) => (won, lost),
        (Err(lost), Ok(won)) => (won, lost),
        other => panic!("expected one success and one failure, got {other:?}"),
    };
    assert_eq!(won.new_balance, 3);
    assert_eq!(lost, DomainError::InsufficientStock { available: 3 });

    let history = ledger
        .history(BusinessId::Wellbuild, product.id)
        .await
        .unwrap();
    assert_eq!(replay(&history), 3);
}

#[tokio::test]
async fn cross_business_access_is_unauthorized() {
    let store = store();
    let ledger = stock_ledger(&store);
    let actor = UserId::new();
    let product = ledger
        .create_product(new_product(BusinessId::Wellbuild, "CEM-003", 5), actor)
        .await
        .unwrap();

    let err = ledger
        .record_movement(
            BusinessId::Wellprint,
            product.id,
            MovementKind::StockIn,
            1,
            MovementMetadata::default(),
            actor,
        )
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::Unauthorized);

    let err = ledger
        .update_product(
            BusinessId::Tcchemical,
            product.id,
            ProductPatch::default(),
        )
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::Unauthorized);
}

#[tokio::test]
async fn deactivated_product_rejects_movements() {
    let store = store();
    let ledger = stock_ledger(&store);
    let actor = UserId::new();
    let product = ledger
        .create_product(new_product(BusinessId::Wellbuild, "CEM-004", 5), actor)
        .await
        .unwrap();

    ledger
        .deactivate_product(BusinessId::Wellbuild, product.id)
        .await
        .unwrap();

    let err = ledger
        .record_movement(
            BusinessId::Wellbuild,
            product.id,
            MovementKind::StockIn,
            1,
            MovementMetadata::default(),
            actor,
        )
        .await
        .unwrap_err();
    assert_eq!(err, DomainError::NotFound);

    // History survives deactivation.
    let history = ledger
        .history(BusinessId::Wellbuild, product.id)
        .await
        .unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn duplicate_sku_is_rejected_per_business() {
    let store = store();
    let ledger = stock_ledger(&store);
    let actor = UserId::new();

    ledger
        .create_product(new_product(BusinessId::Wellbuild, "CEM-005", 0), actor)
        .await
        .unwrap();
    let err = ledger
        .create_product(new_product(BusinessId::Wellbuild, "CEM-005", 0), actor)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::DuplicateIdentifier(_)));

    // Same sku under another business unit is fine.
    ledger
        .create_product(new_product(BusinessId::Wellprint, "CEM-005", 0), actor)
        .await
        .unwrap();
}

#[tokio::test]
async fn category_delete_uncategorizes_products() {
    let store = store();
    let categories = CategoryDirectory::new(Arc::clone(&store));
    let ledger = stock_ledger(&store);

    let category = categories
        .create(BusinessId::Wellprint, "Paper", None)
        .await
        .unwrap();
    let err = categories
        .create(BusinessId::Wellprint, "Paper", None)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::DuplicateIdentifier(_)));

    let mut new = new_product(BusinessId::Wellprint, "PAP-01", 0);
    new.category_id = Some(category.id);
    let product = ledger.create_product(new, UserId::new()).await.unwrap();

    categories
        .delete(BusinessId::Wellprint, category.id)
        .await
        .unwrap();

    let products = ProductRepository::list_active(&store, BusinessId::Wellprint)
        .await
        .unwrap();
    let reloaded = products.iter().find(|p| p.id == product.id).unwrap();
    assert_eq!(reloaded.category_id, None);
    assert!(categories.list(BusinessId::Wellprint).await.unwrap().is_empty());
}

#[tokio::test]
async fn party_names_are_unique_per_business_and_kind() {
    let store = store();
    let directory = PartyDirectory::new(Arc::clone(&store));

    directory
        .register(NewParty {
            business_id: BusinessId::Wellbuild,
            kind: PartyKind::Supplier,
            name: "Apex Cement".to_string(),
            contact: ContactInfo::default(),
        })
        .await
        .unwrap();

    let err = directory
        .register(NewParty {
            business_id: BusinessId::Wellbuild,
            kind: PartyKind::Supplier,
            name: "Apex Cement".to_string(),
            contact: ContactInfo::default(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::DuplicateIdentifier(_)));

    // Same name as a customer is a different identity.
    directory
        .register(NewParty {
            business_id: BusinessId::Wellbuild,
            kind: PartyKind::Customer,
            name: "Apex Cement".to_string(),
            contact: ContactInfo::default(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn sign_in_heals_legacy_link_then_uses_it() {
    let store = store();
    let provider = Arc::new(MockIdentityProvider::new());
    let mailer = Arc::new(RecordingMailer::new());

    let legacy = legacy_profile(BusinessId::Wellbuild, "maria", "maria@example.com");
    ims_identity::ProfileRepository::insert(&store, &legacy)
        .await
        .unwrap();
    let principal = provider.register_existing("maria@example.com", "secret-pw");

    let mut sessions =
        SessionManager::new(Arc::clone(&store), Arc::clone(&provider), Arc::clone(&mailer));
    let state = sessions.sign_in("maria@example.com", "secret-pw").await.unwrap();
    let profile = state.profile().unwrap();
    assert_eq!(profile.id, legacy.id);
    assert_eq!(profile.provider_link, Some(principal));

    // The write-back persisted: the next resolution hits the link directly.
    let stored = ims_identity::ProfileRepository::get(&store, legacy.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.provider_link, Some(principal));

    sessions.sign_out().await.unwrap();
    assert_eq!(sessions.state(), &AuthState::Anonymous);

    let state = sessions.sign_in("maria@example.com", "secret-pw").await.unwrap();
    assert_eq!(state.user_id(), Some(legacy.id));
}

#[tokio::test]
async fn principal_without_profile_cannot_sign_in() {
    let store = store();
    let provider = Arc::new(MockIdentityProvider::new());
    provider.register_existing("ghost@example.com", "secret-pw");

    let mut sessions = SessionManager::new(
        Arc::clone(&store),
        Arc::clone(&provider),
        Arc::new(RecordingMailer::new()),
    );
    let err = sessions
        .sign_in("ghost@example.com", "secret-pw")
        .await
        .unwrap_err();
    assert_eq!(err, ResolveError::ProfileNotProvisioned);
    assert!(matches!(sessions.state(), AuthState::Unprovisioned(_)));
}

#[tokio::test]
async fn deactivated_profile_is_not_authenticated() {
    let store = store();
    let provider = Arc::new(MockIdentityProvider::new());

    let mut profile = legacy_profile(BusinessId::Wellbuild, "gone", "gone@example.com");
    profile.is_active = false;
    ims_identity::ProfileRepository::insert(&store, &profile)
        .await
        .unwrap();
    provider.register_existing("gone@example.com", "secret-pw");

    let mut sessions = SessionManager::new(
        Arc::clone(&store),
        Arc::clone(&provider),
        Arc::new(RecordingMailer::new()),
    );
    let err = sessions
        .sign_in("gone@example.com", "secret-pw")
        .await
        .unwrap_err();
    assert_eq!(err, ResolveError::ProfileNotProvisioned);
}

#[tokio::test]
async fn provider_outage_surfaces_as_unreachable() {
    let store = store();
    let provider = Arc::new(MockIdentityProvider::new());
    provider.set_unreachable(true);

    let mut sessions = SessionManager::new(
        Arc::clone(&store),
        Arc::clone(&provider),
        Arc::new(RecordingMailer::new()),
    );
    let err = sessions.sign_in("any@example.com", "pw").await.unwrap_err();
    assert!(matches!(err, ResolveError::ProviderUnreachable(_)));
    assert_eq!(sessions.state(), &AuthState::Anonymous);
}

#[tokio::test]
async fn provider_events_drive_the_session_state() {
    let store = store();
    let provider = Arc::new(MockIdentityProvider::new());
    let mailer = Arc::new(RecordingMailer::new());

    let legacy = legacy_profile(BusinessId::Tcchemical, "jun", "jun@example.com");
    ims_identity::ProfileRepository::insert(&store, &legacy)
        .await
        .unwrap();
    let principal = provider.register_existing("jun@example.com", "secret-pw");

    let mut sessions =
        SessionManager::new(Arc::clone(&store), Arc::clone(&provider), Arc::clone(&mailer));

    // Another tab signed in; the provider pushes the session to us.
    let state = sessions
        .on_provider_event(ProviderEvent::SignedIn(ims_identity::ProviderSession {
            principal_id: principal,
            email: Some("jun@example.com".to_string()),
        }))
        .await
        .unwrap();
    assert_eq!(state.user_id(), Some(legacy.id));

    let state = sessions
        .on_provider_event(ProviderEvent::SignedOut)
        .await
        .unwrap();
    assert_eq!(state, &AuthState::Anonymous);

    sessions
        .request_password_reset("jun@example.com")
        .await
        .unwrap();
    assert_eq!(provider.reset_emails(), vec!["jun@example.com".to_string()]);
    assert_eq!(mailer.sent_to(), vec!["jun@example.com".to_string()]);
}

#[tokio::test]
async fn backfill_links_legacy_profiles_and_reruns_clean() {
    let store = store();
    let provider = Arc::new(MockIdentityProvider::new());
    let mailer = Arc::new(RecordingMailer::new());

    // One unlinked profile with a fresh email, one whose email already has a
    // provider account, one with no email, one already linked.
    ims_identity::ProfileRepository::insert(
        &store,
        &legacy_profile(BusinessId::Wellbuild, "ana", "ana@example.com"),
    )
    .await
    .unwrap();
    ims_identity::ProfileRepository::insert(
        &store,
        &legacy_profile(BusinessId::Wellbuild, "ben", "ben@example.com"),
    )
    .await
    .unwrap();
    let existing = provider.register_existing("ben@example.com", "old-pw");
    let mut no_email = legacy_profile(BusinessId::Wellprint, "cyn", "x@x.com");
    no_email.email = None;
    ims_identity::ProfileRepository::insert(&store, &no_email)
        .await
        .unwrap();
    let linked = admin(BusinessId::Tcchemical);
    ims_identity::ProfileRepository::insert(&store, &linked)
        .await
        .unwrap();

    let report = backfill_provider_links(&store, &provider, &mailer, "temp-password-1")
        .await
        .unwrap();
    assert_eq!(report.migrated, 2);
    assert_eq!(report.skipped, 2);
    assert_eq!(report.failed, 0);

    // ben got linked to the pre-existing account, not a duplicate.
    let ben = ims_identity::ProfileRepository::find_by_email(&store, "ben@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(ben.provider_link, Some(existing));
    assert_eq!(mailer.sent_to().len(), 2);

    // Second run finds nothing left to do.
    let rerun = backfill_provider_links(&store, &provider, &mailer, "temp-password-1")
        .await
        .unwrap();
    assert_eq!(rerun.migrated, 0);
    assert_eq!(rerun.failed, 0);
    assert_eq!(rerun.skipped, 4);
}

#[tokio::test]
async fn seed_admins_is_idempotent() {
    let store = store();
    let provider = Arc::new(MockIdentityProvider::new());

    let report = seed_admins(&store, &provider, &SeedAdmin::defaults(), "admin-pass-1")
        .await
        .unwrap();
    assert_eq!(report.created, 3);
    assert_eq!(report.skipped, 0);
    assert!(provider.has_account("admin@wellbuild.com"));

    let rerun = seed_admins(&store, &provider, &SeedAdmin::defaults(), "admin-pass-1")
        .await
        .unwrap();
    assert_eq!(rerun.created, 0);
    assert_eq!(rerun.skipped, 3);
    assert_eq!(provider.account_count(), 3);
}

#[tokio::test]
async fn staff_onboarding_and_hard_delete_guard() {
    let store = store();
    let provider = Arc::new(MockIdentityProvider::new());
    let staff = StaffDirectory::new(
        Arc::clone(&store),
        Arc::clone(&provider),
        Arc::clone(&store),
    );
    let boss = admin(BusinessId::Wellbuild);
    ims_identity::ProfileRepository::insert(&store, &boss)
        .await
        .unwrap();

    let clerk = staff
        .create_staff(&boss, new_staff(BusinessId::Wellbuild, "clerk", Role::Staff))
        .await
        .unwrap();
    assert!(provider.has_account("clerk@example.com"));
    assert!(clerk.provider_link.is_some());

    // The clerk records a movement, which pins their profile.
    let ledger = stock_ledger(&store);
    ledger
        .create_product(new_product(BusinessId::Wellbuild, "CEM-010", 8), clerk.id)
        .await
        .unwrap();

    let err = staff.delete_staff(&boss, clerk.id).await.unwrap_err();
    assert!(matches!(
        err,
        ims_identity::IdentityError::Domain(DomainError::Conflict(_))
    ));
    staff.deactivate_staff(&boss, clerk.id).await.unwrap();

    // A colleague with no recorded activity can be hard-deleted, provider
    // account included.
    let temp = staff
        .create_staff(&boss, new_staff(BusinessId::Wellbuild, "temp", Role::Staff))
        .await
        .unwrap();
    staff.delete_staff(&boss, temp.id).await.unwrap();
    assert!(!provider.has_account("temp@example.com"));
    assert!(
        ims_identity::ProfileRepository::get(&store, temp.id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn staff_management_requires_an_admin() {
    let store = store();
    let provider = Arc::new(MockIdentityProvider::new());
    let staff = StaffDirectory::new(
        Arc::clone(&store),
        Arc::clone(&provider),
        Arc::clone(&store),
    );

    let worker = Profile::onboard(
        &new_staff(BusinessId::Wellbuild, "worker", Role::Staff),
        PrincipalId::new(),
        None,
        Utc::now(),
    );
    ims_identity::ProfileRepository::insert(&store, &worker)
        .await
        .unwrap();

    let err = staff
        .create_staff(&worker, new_staff(BusinessId::Wellbuild, "newbie", Role::Staff))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ims_identity::IdentityError::Domain(DomainError::Unauthorized)
    ));
    assert!(!provider.has_account("newbie@example.com"));
}
