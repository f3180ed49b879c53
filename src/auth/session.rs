use axum::async_trait;
use axum::extract::{Request, State};
use axum::http::header::COOKIE;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;

use crate::app::AppState;
use crate::errors::AppError;

use super::gate;
use super::resolver::Principal;

pub const SESSION_COOKIE: &str = "_session";

/// Pull the session token out of the Cookie header(s), if present.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix(SESSION_COOKIE).and_then(|rest| rest.strip_prefix('=')))
        .map(|token| token.to_string())
        .next()
}

/// The per-request authorization chain, run before route handlers: extract
/// the cookie, verify the session token, authorize the embedded principal
/// against the matched route rule, and attach the principal for handlers.
/// Public routes (no rule) pass straight through. Any failure short-circuits
/// the request; no handler code runs for a rejected request.
pub async fn authorize_request(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let required = state
        .rules
        .required_role(req.method(), req.uri().path());

    let Some(required) = required else {
        return Ok(next.run(req).await);
    };

    let token = session_cookie(req.headers()).ok_or(AppError::MissingCredential)?;
    let claims = state.keys.decode(&token)?;

    // Session tokens are self-contained: the embedded id/role are trusted
    // without a store lookup. A role change takes effect at token reissue.
    let principal = claims.into_principal();
    gate::authorize(Some(&principal), required)?;

    tracing::debug!(
        principal = %principal.id,
        role = %principal.role,
        path = req.uri().path(),
        "request authorized"
    );

    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

/// Extractor for handlers that need the authenticated caller. Only available
/// on routes behind a permission rule, where the chain has attached the
/// principal.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

#[async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .map(CurrentUser)
            .ok_or(AppError::MissingCredential)
    }
}
