use axum::{
    extract::{Extension, Path, State},
    Json,
};
use log::{info, warn};
use referral_shared::auth::AuthUser;
use referral_shared::models::InvitePayload;
use referral_shared::store::{StoreError, UserStore};

use crate::error::{AppError, Result};
use crate::models::{present, required_message, CreateInviteRequest, InviteResponse};
use crate::state::AppState;

// POST /agencies/:agency_id/invites
pub async fn create_invite<S>(
    State(state): State<AppState<S>>,
    Extension(caller): Extension<AuthUser>,
    Path(agency_id): Path<String>,
    Json(request): Json<CreateInviteRequest>,
) -> Result<Json<InviteResponse>>
where
    S: UserStore + 'static,
{
    if !caller.is_admin {
        warn!(
            "Non-admin user {} attempted to invite to agency {}",
            caller.user_id, agency_id
        );
        return Err(AppError::unauthorized(
            "Only administrators can invite agency users.".into(),
        ));
    }

    let email = present(&request.email)
        .ok_or_else(|| AppError::unprocessable(required_message(&["email"])))?
        .to_string();

    // An invite for an address that already registered could never be used
    match state.users.get_user_by_email(&email).await {
        Ok(_) => {
            info!(
                "Refusing invite for agency {}: email already registered",
                agency_id
            );
            return Err(AppError::conflict(
                "A user with this email already exists".into(),
            ));
        }
        Err(StoreError::NotFound(_)) => {}
        Err(e) => return Err(e.into()),
    }

    let token = state.invites.issue(InvitePayload {
        agency_id: agency_id.clone(),
        email: email.clone(),
    })?;

    info!(
        "Admin {} issued invite for agency {} ({} pending)",
        caller.user_id,
        agency_id,
        state.invites.len()
    );

    Ok(Json(InviteResponse {
        token,
        agency_id,
        email,
        expires_in_seconds: state.invites.settings().lifetime.num_seconds(),
    }))
}
