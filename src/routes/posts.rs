use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::CurrentUser;
use crate::errors::{AppError, AppResult};
use crate::models::post::{DbPost, Post, PostCreateRequest, PostsResponse};

const LIST_LIMIT: i64 = 50;

#[utoipa::path(
    get,
    path = "/post",
    tag = "Posts",
    responses(
        (status = 200, description = "Approved posts, newest first", body = PostsResponse),
        (status = 401, description = "No valid session")
    )
)]
pub async fn list_posts(State(state): State<AppState>) -> AppResult<Json<PostsResponse>> {
    let rows = sqlx::query_as::<_, DbPost>(
        "SELECT id, title, url, company, category, submitted_by, approved, created_at \
         FROM posts WHERE approved = 1 ORDER BY created_at DESC LIMIT ?",
    )
    .bind(LIST_LIMIT)
    .fetch_all(&state.pool)
    .await?;

    let posts = rows
        .into_iter()
        .map(Post::try_from)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(PostsResponse { posts }))
}

#[utoipa::path(
    post,
    path = "/post",
    tag = "Posts",
    request_body = PostCreateRequest,
    responses(
        (status = 201, description = "Post submitted, pending approval", body = Post),
        (status = 422, description = "Title or url failed validation")
    )
)]
pub async fn create_post(
    State(state): State<AppState>,
    CurrentUser(principal): CurrentUser,
    Json(payload): Json<PostCreateRequest>,
) -> AppResult<(StatusCode, Json<Post>)> {
    if payload.title.trim().is_empty() {
        return Err(AppError::unprocessable("title must not be empty"));
    }
    if payload.url.trim().is_empty() {
        return Err(AppError::unprocessable("url must not be empty"));
    }

    let id = Uuid::new_v4();
    let now = crate::utils::utc_now();

    sqlx::query(
        "INSERT INTO posts (id, title, url, company, category, submitted_by, approved, created_at) \
         VALUES (?, ?, ?, ?, ?, ?, 0, ?)",
    )
    .bind(id.to_string())
    .bind(&payload.title)
    .bind(&payload.url)
    .bind(&payload.company)
    .bind(&payload.category)
    .bind(principal.id.to_string())
    .bind(now)
    .execute(&state.pool)
    .await?;

    let post = fetch_post(&state.pool, id).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// Approver-gated: flips a submitted post to approved so it shows up in the
/// listing.
#[utoipa::path(
    patch,
    path = "/post/{id}/approve",
    tag = "Posts",
    params(("id" = Uuid, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post approved", body = Post),
        (status = 403, description = "Caller is not an approver"),
        (status = 404, description = "Post not found")
    )
)]
pub async fn approve_post(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Post>> {
    let result = sqlx::query("UPDATE posts SET approved = 1 WHERE id = ?")
        .bind(id.to_string())
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("post not found"));
    }

    let post = fetch_post(&state.pool, id).await?;
    Ok(Json(post))
}

async fn fetch_post(pool: &SqlitePool, id: Uuid) -> AppResult<Post> {
    let row = sqlx::query_as::<_, DbPost>(
        "SELECT id, title, url, company, category, submitted_by, approved, created_at \
         FROM posts WHERE id = ?",
    )
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::not_found("post not found"))?;

    row.try_into()
}
