
use axum::Router;
use chrono::Utc;
use referral_shared::auth::{AuthKeys, TEST_JWT_SECRET};
use referral_shared::invite_store::{InviteTokenSettings, InviteTokenStore};
use referral_shared::models::InvitePayload;
use referral_shared::store::memory::MemoryUserStore;
use referral_shared::test_utils::clock::ManualClock;
use referral_shared::test_utils::test_logging::init_test_logging;
use std::sync::Arc;

use crate::routes::create_router_with_state;
use crate::state::AppState;

pub struct TestApp {
    pub router: Router,
    pub users: Arc<MemoryUserStore>,
    pub invites: Arc<InviteTokenStore<InvitePayload>>,
    pub clock: Arc<ManualClock>,
}

// Minimum bcrypt cost keeps hashing fast in tests
const TEST_BCRYPT_COST: u32 = 4;

pub fn create_test_app() -> TestApp {
    create_test_app_with_settings(InviteTokenSettings::default())
}

pub fn create_test_app_with_settings(settings: InviteTokenSettings) -> TestApp {
    init_test_logging();

    let clock = Arc::new(ManualClock::new(Utc::now()));
    let invites = Arc::new(
        InviteTokenStore::with_clock(settings, clock.clone()).expect("test settings are valid"),
    );
    let users = Arc::new(MemoryUserStore::new());
    let state = AppState::new(users.clone(), invites.clone(), TEST_BCRYPT_COST);
    let router = create_router_with_state(
        state,
        AuthKeys::from_secret(TEST_JWT_SECRET.as_bytes()),
        "",
    );

    TestApp {
        router,
        users,
        invites,
        clock,
    }
}
