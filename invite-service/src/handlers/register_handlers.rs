use axum::{extract::State, Json};
use log::{debug, info, warn};
use referral_shared::models::{now_str, User};
use referral_shared::store::{StoreError, UserStore};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{present, required_message, RegisterRequest, UserResponse};
use crate::state::AppState;

const REQUIRED_FIELDS: [&str; 4] = ["firstName", "lastName", "password", "token"];
const INVALID_INVITE: &str = "Invalid or expired invite token";

// POST /auth/register
pub async fn register<S>(
    State(state): State<AppState<S>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<UserResponse>>
where
    S: UserStore + 'static,
{
    let (first_name, last_name, token) = match (
        present(&request.first_name),
        present(&request.last_name),
        present(&request.password),
        present(&request.token),
    ) {
        (Some(first), Some(last), Some(_), Some(token)) => {
            (first.to_string(), last.to_string(), token.to_string())
        }
        _ => {
            return Err(AppError::unprocessable(required_message(&REQUIRED_FIELDS)));
        }
    };
    // Whitespace in the password is significant, only presence was checked
    let password = request.password.unwrap_or_default();

    let invite = state
        .invites
        .redeem(&token)
        .ok_or_else(|| {
            debug!("Registration attempted with an unusable invite token");
            AppError::forbidden(INVALID_INVITE.into())
        })?;

    if let Some(email) = present(&request.email) {
        if !email.eq_ignore_ascii_case(&invite.email) {
            warn!(
                "Registration email did not match invite for agency {}",
                invite.agency_id
            );
            return Err(AppError::forbidden(INVALID_INVITE.into()));
        }
    }

    let cost = state.bcrypt_cost;
    let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::internal(format!("Password hashing task failed: {}", e)))?
        .map_err(|e| AppError::internal(format!("Failed to hash password: {}", e)))?;

    let user = User {
        id: Uuid::new_v4().to_string(),
        first_name,
        last_name,
        email: invite.email,
        phone: present(&request.phone).map(str::to_string),
        agency_id: invite.agency_id,
        password_hash,
        created_at: now_str(),
    };

    let user = state.users.create_user(user).await.map_err(|e| match e {
        StoreError::Conflict(_) => {
            AppError::conflict("A user with this email already exists".into())
        }
        other => AppError::from(other),
    })?;

    info!(
        "Registered user {} under agency {}",
        user.id, user.agency_id
    );

    Ok(Json(UserResponse::from(user)))
}
