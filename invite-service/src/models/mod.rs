use referral_shared::models::User;
use serde::{Deserialize, Serialize};

// Request DTOs
#[derive(Deserialize, Debug, Default)]
pub struct CreateInviteRequest {
    pub email: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct RegisterRequest {
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "key")]
    pub token: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

// Response DTOs
#[derive(Serialize, Debug)]
pub struct InviteResponse {
    pub token: String,
    #[serde(rename = "agencyId")]
    pub agency_id: String,
    pub email: String,
    #[serde(rename = "expiresInSeconds")]
    pub expires_in_seconds: i64,
}

#[derive(Serialize, Debug)]
pub struct UserName {
    pub first: String,
    pub last: String,
}

#[derive(Serialize, Debug)]
pub struct UserResponse {
    pub id: String,
    pub name: UserName,
    pub email: String,
    pub phone: Option<String>,
    pub agency: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: UserName {
                first: user.first_name,
                last: user.last_name,
            },
            email: user.email,
            phone: user.phone,
            agency: user.agency_id,
        }
    }
}

/// Returns the value of a required field, treating blank strings as missing.
pub fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Error message used when required fields are missing.
pub fn required_message(required: &[&str]) -> String {
    format!("{} are required", required.join(","))
}
