use anyhow::Context;
use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tempfile::tempdir;
use tower::util::ServiceExt;
use uuid::Uuid;

use galvatron::auth::{IdentityClaims, IdentityProvider, Principal, Role, SessionKeys};
use galvatron::create_app_with;
use galvatron::errors::AppError;

struct NoLoginProvider;

#[async_trait::async_trait]
impl IdentityProvider for NoLoginProvider {
    async fn verify(&self, _token: &str) -> Result<IdentityClaims, AppError> {
        Err(AppError::verification_failed("no logins in this test"))
    }
}

async fn setup() -> Result<(SqlitePool, Router, tempfile::TempDir)> {
    let dir = tempdir().context("failed to create tempdir")?;
    let db_path = dir.path().join("test_authz.db");
    use sqlx::sqlite::SqliteConnectOptions;
    let opts = SqliteConnectOptions::new()
        .filename(db_path.as_path())
        .create_if_missing(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrator = sqlx::migrate::Migrator::new(
        std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations"),
    )
    .await?;
    migrator.run(&pool).await?;

    std::env::set_var("JWT_SECRET", "test-secret");
    let app = create_app_with(pool.clone(), Arc::new(NoLoginProvider)).await?;

    Ok((pool, app, dir))
}

fn cookie_for(role: Role) -> Result<String> {
    let keys = SessionKeys::new(b"test-secret".to_vec(), 24);
    let principal = Principal {
        id: Uuid::new_v4(),
        email: format!("{}@example.com", role),
        role,
    };
    let token = keys.encode(&principal)?;
    Ok(format!("_session={token}"))
}

async fn get_setting(app: &Router, cookie: Option<&str>) -> Result<Response> {
    let mut builder = Request::builder().method("GET").uri("/setting");
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    let req = builder.body(Body::empty())?;
    Ok(app.clone().oneshot(req).await?)
}

#[tokio::test]
async fn setting_requires_admin() -> Result<()> {
    let (_pool, app, _dir) = setup().await?;

    // No cookie at all: rejected before any handler runs.
    let resp = get_setting(&app, None).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = get_setting(&app, Some(&cookie_for(Role::Admin)?)).await?;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = get_setting(&app, Some(&cookie_for(Role::Approver)?)).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = get_setting(&app, Some(&cookie_for(Role::User)?)).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    Ok(())
}

#[tokio::test]
async fn expired_token_is_unauthorized() -> Result<()> {
    let (_pool, app, _dir) = setup().await?;

    let keys = SessionKeys::new(b"test-secret".to_vec(), -2);
    let principal = Principal {
        id: Uuid::new_v4(),
        email: "stale@example.com".to_string(),
        role: Role::Admin,
    };
    let token = keys.encode(&principal)?;

    let resp = get_setting(&app, Some(&format!("_session={token}"))).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn tampered_token_is_unauthorized() -> Result<()> {
    let (_pool, app, _dir) = setup().await?;

    // Signed with the wrong secret.
    let keys = SessionKeys::new(b"wrong-secret".to_vec(), 24);
    let principal = Principal {
        id: Uuid::new_v4(),
        email: "mallory@example.com".to_string(),
        role: Role::Admin,
    };
    let token = keys.encode(&principal)?;

    let resp = get_setting(&app, Some(&format!("_session={token}"))).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = get_setting(&app, Some("_session=garbage")).await?;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    Ok(())
}

#[tokio::test]
async fn role_ordering_holds_across_protected_routes() -> Result<()> {
    let (_pool, app, _dir) = setup().await?;

    // Admin satisfies every requirement.
    for uri in ["/setting", "/user/current/session", "/post"] {
        let req = Request::builder()
            .method("GET")
            .uri(uri)
            .header("cookie", cookie_for(Role::Admin)?)
            .body(Body::empty())?;
        let resp: Response = app.clone().oneshot(req).await?;
        assert_ne!(
            resp.status(),
            StatusCode::FORBIDDEN,
            "admin was forbidden on {uri}"
        );
    }

    // User satisfies user-level routes.
    for uri in ["/user/current/session", "/post"] {
        let req = Request::builder()
            .method("GET")
            .uri(uri)
            .header("cookie", cookie_for(Role::User)?)
            .body(Body::empty())?;
        let resp: Response = app.clone().oneshot(req).await?;
        assert_eq!(resp.status(), StatusCode::OK, "user was rejected on {uri}");
    }

    Ok(())
}
