//! Authorization/session pipeline.
//!
//! Per-request flow: cookie extraction -> credential verification ->
//! principal resolution (identity-provider path only; session tokens carry
//! their claims) -> role gate -> handler. The pipeline configuration (signing
//! keys, identity provider, route rules) is built once at startup and held in
//! `AppState`; nothing here mutates process-global state.

mod gate;
mod resolver;
mod rules;
mod session;
mod verifier;

pub use gate::{authorize, Role};
pub use resolver::{resolve, Principal};
pub use rules::{RouteRule, RouteRules};
pub use session::{authorize_request, session_cookie, CurrentUser, SESSION_COOKIE};
pub use verifier::{
    Claims, GoogleIdentityProvider, IdentityClaims, IdentityProvider, SessionKeys,
};
