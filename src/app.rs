use std::sync::Arc;

use axum::http::Method;
use axum::middleware;
use axum::routing::{delete, get, patch, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::auth::{
    authorize_request, GoogleIdentityProvider, IdentityProvider, RouteRules, SessionKeys,
};
use crate::errors::AppError;
use crate::routes::{auth, health, posts, setting};

/// Shared, read-only per-process state: the pool plus the authorization
/// pipeline's configuration (signing keys, identity provider, route rules),
/// constructed once at startup.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub keys: Arc<SessionKeys>,
    pub provider: Arc<dyn IdentityProvider>,
    pub rules: Arc<RouteRules>,
}

impl AppState {
    pub fn new(pool: SqlitePool, keys: SessionKeys, provider: Arc<dyn IdentityProvider>) -> Self {
        Self {
            pool,
            keys: Arc::new(keys),
            provider,
            rules: Arc::new(RouteRules::standard()),
        }
    }
}

pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let provider = GoogleIdentityProvider::from_env()?;
    create_app_with(pool, Arc::new(provider)).await
}

/// Build the router with an explicit identity provider. Tests use this to
/// plug in a stub provider.
pub async fn create_app_with(
    pool: SqlitePool,
    provider: Arc<dyn IdentityProvider>,
) -> Result<Router, AppError> {
    let keys = SessionKeys::from_env()?;
    let state = AppState::new(pool, keys, provider);

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let auth_routes = Router::new()
        .route("/google", post(auth::google_login))
        .route("/logout", post(auth::logout));

    let setting_routes = Router::new()
        .route(
            "/",
            get(setting::list_settings)
                .post(setting::create_setting)
                .patch(setting::update_setting),
        )
        .route("/:name", delete(setting::delete_setting));

    let post_routes = Router::new()
        .route("/", get(posts::list_posts).post(posts::create_post))
        .route("/:id/approve", patch(posts::approve_post));

    let router = Router::new()
        .nest("/auth", auth_routes)
        .route("/user/current/session", get(auth::current_session))
        .nest("/setting", setting_routes)
        .nest("/post", post_routes)
        .route("/api/health", get(health::health))
        // The session chain runs before every handler; public routes pass
        // through untouched.
        .layer(middleware::from_fn_with_state(state.clone(), authorize_request))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    Ok(router)
}
