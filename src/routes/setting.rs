use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use crate::app::AppState;
use crate::errors::{AppError, AppResult};
use crate::models::setting::{Setting, SettingUpsertRequest, SettingsResponse};

// All /setting routes require the admin role; the session chain enforces
// that before these handlers run.

fn validate_value(payload: &SettingUpsertRequest) -> AppResult<()> {
    if payload.value <= 0 {
        return Err(AppError::unprocessable(
            "value must be a positive integer",
        ));
    }
    Ok(())
}

#[utoipa::path(
    get,
    path = "/setting",
    tag = "Settings",
    responses(
        (status = 200, description = "All settings", body = SettingsResponse),
        (status = 401, description = "No valid session"),
        (status = 403, description = "Caller is not an admin")
    )
)]
pub async fn list_settings(State(state): State<AppState>) -> AppResult<Json<SettingsResponse>> {
    let settings = sqlx::query_as::<_, Setting>("SELECT name, value FROM settings ORDER BY name")
        .fetch_all(&state.pool)
        .await?;

    Ok(Json(SettingsResponse { settings }))
}

#[utoipa::path(
    post,
    path = "/setting",
    tag = "Settings",
    request_body = SettingUpsertRequest,
    responses(
        (status = 201, description = "Setting created", body = Setting),
        (status = 409, description = "Setting already exists"),
        (status = 422, description = "Value failed validation")
    )
)]
pub async fn create_setting(
    State(state): State<AppState>,
    Json(payload): Json<SettingUpsertRequest>,
) -> AppResult<(StatusCode, Json<Setting>)> {
    validate_value(&payload)?;

    let insert = sqlx::query("INSERT INTO settings (name, value) VALUES (?, ?)")
        .bind(&payload.name)
        .bind(payload.value)
        .execute(&state.pool)
        .await;

    match insert {
        Ok(_) => {}
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            return Err(AppError::conflict("setting exists"));
        }
        Err(err) => return Err(err.into()),
    }

    Ok((
        StatusCode::CREATED,
        Json(Setting {
            name: payload.name,
            value: payload.value,
        }),
    ))
}

#[utoipa::path(
    patch,
    path = "/setting",
    tag = "Settings",
    request_body = SettingUpsertRequest,
    responses(
        (status = 200, description = "Setting updated", body = Setting),
        (status = 404, description = "Setting not found"),
        (status = 422, description = "Value failed validation")
    )
)]
pub async fn update_setting(
    State(state): State<AppState>,
    Json(payload): Json<SettingUpsertRequest>,
) -> AppResult<Json<Setting>> {
    validate_value(&payload)?;

    let result = sqlx::query("UPDATE settings SET value = ? WHERE name = ?")
        .bind(payload.value)
        .bind(&payload.name)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("setting not found"));
    }

    Ok(Json(Setting {
        name: payload.name,
        value: payload.value,
    }))
}

#[utoipa::path(
    delete,
    path = "/setting/{name}",
    tag = "Settings",
    params(("name" = String, Path, description = "Setting name")),
    responses(
        (status = 204, description = "Setting deleted"),
        (status = 404, description = "Setting not found")
    )
)]
pub async fn delete_setting(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<StatusCode> {
    let result = sqlx::query("DELETE FROM settings WHERE name = ?")
        .bind(&name)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("setting not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
