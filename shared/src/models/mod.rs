use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Data bound to an agency invite token.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct InvitePayload {
    #[serde(rename = "agencyId")]
    pub agency_id: String,
    pub email: String,
}

/// A registered agency user
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct User {
    pub id: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(rename = "agencyId")]
    pub agency_id: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

pub fn now_str() -> String {
    Utc::now().to_rfc3339()
}
