use anyhow::Context;
use anyhow::Result;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::{json, Value};
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
    let db_path = dir.path().join("test_posts.db");
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

/// Seed a user row and mint a matching session cookie. Posts reference the
/// submitter by id, so the row has to exist.
async fn seeded_cookie(pool: &SqlitePool, role: Role) -> Result<(Principal, String)> {
    let principal = Principal {
        id: Uuid::new_v4(),
        email: format!("{}@example.com", role),
        role,
    };
    let now = chrono::Utc::now();
    sqlx::query("INSERT INTO users (id, name, email, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)")
        .bind(principal.id.to_string())
        .bind(format!("Test {}", role))
        .bind(&principal.email)
        .bind(role.as_str())
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

    let keys = SessionKeys::new(b"test-secret".to_vec(), 24);
    let cookie = format!("_session={}", keys.encode(&principal)?);
    Ok((principal, cookie))
}

async fn json_body(resp: Response) -> Result<Value> {
    let bytes = body::to_bytes(resp.into_body(), 10_485_760).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[tokio::test]
async fn submit_approve_list_flow() -> Result<()> {
    let (pool, app, _dir) = setup().await?;
    let (submitter, user_cookie) = seeded_cookie(&pool, Role::User).await?;
    let (_, approver_cookie) = seeded_cookie(&pool, Role::Approver).await?;

    // Submit
    let req = Request::builder()
        .method("POST")
        .uri("/post")
        .header("cookie", &user_cookie)
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "title": "Series B announcement",
                "url": "https://example.com/news",
                "company": "Example Inc",
                "category": "funding"
            })
            .to_string(),
        ))?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let post = json_body(resp).await?;
    assert_eq!(post["approved"], false);
    assert_eq!(post["submitted_by"], submitter.id.to_string());
    let post_id = post["id"].as_str().context("post id missing")?.to_string();

    // Unapproved posts are not listed.
    let req = Request::builder()
        .method("GET")
        .uri("/post")
        .header("cookie", &user_cookie)
        .body(Body::empty())?;
    let listing = json_body(app.clone().oneshot(req).await?).await?;
    assert_eq!(listing["posts"].as_array().map(Vec::len), Some(0));

    // A plain user may not approve.
    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/post/{post_id}/approve"))
        .header("cookie", &user_cookie)
        .body(Body::empty())?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // An approver may.
    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/post/{post_id}/approve"))
        .header("cookie", &approver_cookie)
        .body(Body::empty())?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::OK);
    let approved = json_body(resp).await?;
    assert_eq!(approved["approved"], true);

    // Now it shows up.
    let req = Request::builder()
        .method("GET")
        .uri("/post")
        .header("cookie", &user_cookie)
        .body(Body::empty())?;
    let listing = json_body(app.clone().oneshot(req).await?).await?;
    assert_eq!(listing["posts"][0]["id"], post_id.as_str());

    Ok(())
}

#[tokio::test]
async fn approving_unknown_post_is_not_found() -> Result<()> {
    let (pool, app, _dir) = setup().await?;
    let (_, approver_cookie) = seeded_cookie(&pool, Role::Approver).await?;

    let req = Request::builder()
        .method("PATCH")
        .uri(format!("/post/{}/approve", Uuid::new_v4()))
        .header("cookie", &approver_cookie)
        .body(Body::empty())?;
    let resp: Response = app.clone().oneshot(req).await?;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn blank_fields_fail_validation() -> Result<()> {
    let (pool, app, _dir) = setup().await?;
    let (_, user_cookie) = seeded_cookie(&pool, Role::User).await?;

    for payload in [
        json!({"title": "  ", "url": "https://example.com"}),
        json!({"title": "ok", "url": ""}),
    ] {
        let req = Request::builder()
            .method("POST")
            .uri("/post")
            .header("cookie", &user_cookie)
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))?;
        let resp: Response = app.clone().oneshot(req).await?;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    Ok(())
}
