use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::response::IntoResponse;
use axum::Json;

use crate::app::AppState;
use crate::auth::{self, CurrentUser, SESSION_COOKIE};
use crate::errors::AppResult;
use crate::models::user::{GoogleLoginRequest, SessionResponse};

fn session_cookie_header(token: &str, max_age: i64) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}")
}

/// First-login path: the provider token is verified against the identity
/// provider, the identity is resolved to a user record (created on first
/// sight), and a signed session cookie is issued.
#[utoipa::path(
    post,
    path = "/auth/google",
    tag = "Auth",
    request_body = GoogleLoginRequest,
    responses(
        (status = 200, description = "Session established", body = SessionResponse),
        (status = 401, description = "Token verification failed")
    )
)]
pub async fn google_login(
    State(state): State<AppState>,
    Json(payload): Json<GoogleLoginRequest>,
) -> AppResult<impl IntoResponse> {
    let identity = state.provider.verify(&payload.token).await?;
    let principal = auth::resolve(&state.pool, &identity).await?;

    let token = state.keys.encode(&principal)?;
    let cookie = session_cookie_header(&token, state.keys.ttl_seconds());

    tracing::info!(principal = %principal.id, "session issued");

    let body = SessionResponse {
        id: principal.id,
        email: principal.email,
        role: principal.role,
    };

    Ok(([(SET_COOKIE, cookie)], Json(body)))
}

#[utoipa::path(
    get,
    path = "/user/current/session",
    tag = "Auth",
    responses(
        (status = 200, description = "Current session principal", body = SessionResponse),
        (status = 401, description = "No valid session")
    )
)]
pub async fn current_session(CurrentUser(principal): CurrentUser) -> Json<SessionResponse> {
    Json(SessionResponse {
        id: principal.id,
        email: principal.email,
        role: principal.role,
    })
}

/// Sessions are stateless, so logout just expires the cookie client-side.
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Session cookie cleared"))
)]
pub async fn logout() -> impl IntoResponse {
    [(SET_COOKIE, session_cookie_header("", 0))]
}
