use axum::{
    extract::Request,
    middleware,
    routing::post,
    Router,
};
use log::{info, warn};
use referral_shared::auth::{auth_middleware, AuthKeys};
use referral_shared::store::UserStore;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::{invite_handlers::create_invite, register_handlers::register};
use crate::state::AppState;

/// Creates a router over the given state
pub fn create_router_with_state<S>(state: AppState<S>, auth_keys: AuthKeys, prefix: &str) -> Router
where
    S: UserStore + 'static,
{
    info!("Setting up API routes with prefix: '{}'", prefix);

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    info!("CORS configured for all origins, methods and headers");

    // Logging middleware to trace all requests
    async fn logging_middleware(
        req: Request,
        next: axum::middleware::Next,
    ) -> impl axum::response::IntoResponse {
        info!(
            "Router received request: method={}, uri={}",
            req.method(),
            req.uri()
        );
        next.run(req).await
    }

    // Invite issuance requires an authenticated caller
    let invite_routes = Router::new()
        .route("/agencies/:agency_id/invites", post(create_invite::<S>))
        .route_layer(middleware::from_fn_with_state(auth_keys, auth_middleware))
        .with_state(state.clone());

    // Registration is reached by holders of an invite token, not logged-in users
    let public_routes = Router::new()
        .route("/auth/register", post(register::<S>))
        .with_state(state);

    let api_routes = invite_routes.merge(public_routes);

    let router = if prefix.is_empty() {
        api_routes
            .layer(cors)
            .layer(middleware::from_fn(logging_middleware))
    } else {
        Router::new()
            .nest(prefix, api_routes)
            .layer(cors)
            .layer(middleware::from_fn(logging_middleware))
    };

    info!(
        "Router configured with invite and registration routes under prefix: '{}'",
        prefix
    );

    // Add a fallback handler for 404s
    router.fallback(|req: Request| async move {
        warn!("No route matched for: {} {}", req.method(), req.uri());
        (
            axum::http::StatusCode::NOT_FOUND,
            "The requested resource was not found".to_string(),
        )
    })
}
