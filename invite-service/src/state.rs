use referral_shared::invite_store::InviteTokenStore;
use referral_shared::models::InvitePayload;
use std::sync::Arc;

/// Shared handler state, built once by the composition root.
pub struct AppState<S> {
    pub users: Arc<S>,
    pub invites: Arc<InviteTokenStore<InvitePayload>>,
    pub bcrypt_cost: u32,
}

impl<S> AppState<S> {
    pub fn new(
        users: Arc<S>,
        invites: Arc<InviteTokenStore<InvitePayload>>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            users,
            invites,
            bcrypt_cost,
        }
    }
}

// Manual impl so `S` itself need not be Clone
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            invites: self.invites.clone(),
            bcrypt_cost: self.bcrypt_cost,
        }
    }
}
