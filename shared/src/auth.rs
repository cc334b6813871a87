use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Claims carried by bearer tokens from the session provider.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub admin: bool,
    pub exp: usize,
}

/// The authenticated caller, inserted as a request extension.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: String,
    pub is_admin: bool,
}

#[derive(Clone)]
pub struct AuthKeys {
    decoding: DecodingKey,
}

impl AuthKeys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Verifies the `Authorization: Bearer` JWT and exposes the caller as
/// `Extension<AuthUser>`.
pub async fn auth_middleware(
    State(keys): State<AuthKeys>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            debug!("Missing or malformed Authorization header");
            StatusCode::UNAUTHORIZED
        })?;

    let claims = decode::<Claims>(token, &keys.decoding, &Validation::new(Algorithm::HS256))
        .map_err(|e| {
            warn!("Rejected bearer token: {}", e);
            StatusCode::UNAUTHORIZED
        })?
        .claims;

    req.extensions_mut().insert(AuthUser {
        user_id: claims.sub,
        is_admin: claims.admin,
    });

    Ok(next.run(req).await)
}

#[cfg(any(test, feature = "test_utils"))]
pub const TEST_JWT_SECRET: &str = "test-jwt-secret";

/// Builds a request authenticated as `user_id` with a token signed by
/// `TEST_JWT_SECRET`.
#[cfg(any(test, feature = "test_utils"))]
pub fn create_test_request(
    method: &str,
    uri: &str,
    user_id: &str,
    is_admin: bool,
    body: Option<serde_json::Value>,
) -> Request {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = Claims {
        sub: user_id.to_string(),
        admin: is_admin,
        exp: (chrono::Utc::now() + chrono::Duration::hours(1)).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("test token encodes");

    let builder = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));
    with_json_body(builder, body)
}

/// Builds a request with no credentials.
#[cfg(any(test, feature = "test_utils"))]
pub fn create_anonymous_request(
    method: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> Request {
    let builder = axum::http::Request::builder().method(method).uri(uri);
    with_json_body(builder, body)
}

#[cfg(any(test, feature = "test_utils"))]
fn with_json_body(builder: axum::http::request::Builder, body: Option<serde_json::Value>) -> Request {
    use axum::body::Body;

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .expect("test request builds"),
        None => builder.body(Body::empty()).expect("test request builds"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Extension, Router};
    use tower::ServiceExt;

    async fn whoami(Extension(user): Extension<AuthUser>) -> String {
        format!("{}:{}", user.user_id, user.is_admin)
    }

    fn app() -> Router {
        Router::new().route("/me", get(whoami)).layer(middleware::from_fn_with_state(
            AuthKeys::from_secret(TEST_JWT_SECRET.as_bytes()),
            auth_middleware,
        ))
    }

    #[tokio::test]
    async fn test_valid_token_passes() {
        let response = app()
            .oneshot(create_test_request("GET", "/me", "admin-1", true, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_token_rejected() {
        let response = app()
            .oneshot(create_anonymous_request("GET", "/me", None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_wrong_secret_rejected() {
        let response = Router::new()
            .route("/me", get(whoami))
            .layer(middleware::from_fn_with_state(
                AuthKeys::from_secret(b"some-other-secret"),
                auth_middleware,
            ))
            .oneshot(create_test_request("GET", "/me", "admin-1", true, None))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
