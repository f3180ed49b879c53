use serde::Serialize;
use sqlx::SqlitePool;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::DbUser;

use super::gate::Role;
use super::verifier::IdentityClaims;

/// The authenticated identity attached to a request.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// Map a verified external identity to an internal user record, creating one
/// with the default role on first sight.
///
/// Two concurrent first-logins for the same email race on the insert; the
/// loser hits the UNIQUE constraint on `users.email` and falls back to the
/// lookup, so both resolve to the same record.
pub async fn resolve(pool: &SqlitePool, claims: &IdentityClaims) -> Result<Principal, AppError> {
    if let Some(found) = lookup_by_email(pool, &claims.email).await? {
        return found.try_into();
    }

    let now = crate::utils::utc_now();
    let insert = sqlx::query(
        "INSERT INTO users (id, name, email, role, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(&claims.name)
    .bind(&claims.email)
    .bind(Role::User.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await;

    match insert {
        Ok(_) => {}
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            tracing::debug!(email = %claims.email, "lost first-login race, re-reading");
        }
        Err(err) => return Err(err.into()),
    }

    // Read-after-write: the row (ours or the race winner's) must be visible.
    match lookup_by_email(pool, &claims.email).await? {
        Some(found) => found.try_into(),
        None => Err(AppError::integrity(format!(
            "user row vanished after insert for {}",
            claims.email
        ))),
    }
}

async fn lookup_by_email(pool: &SqlitePool, email: &str) -> Result<Option<DbUser>, AppError> {
    let matches = sqlx::query_as::<_, DbUser>(
        "SELECT id, name, email, role, created_at, updated_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_all(pool)
    .await?;

    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.into_iter().next()),
        n => Err(AppError::integrity(format!(
            "{n} user rows share email {email}"
        ))),
    }
}

impl TryFrom<DbUser> for Principal {
    type Error = AppError;

    fn try_from(value: DbUser) -> Result<Self, Self::Error> {
        Ok(Principal {
            id: Uuid::parse_str(&value.id)
                .map_err(|_| AppError::integrity(format!("malformed user id: {}", value.id)))?,
            email: value.email,
            role: Role::parse(&value.role)?,
        })
    }
}
