use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub url: String,
    pub company: Option<String>,
    pub category: Option<String>,
    pub submitted_by: Uuid,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbPost {
    pub id: String,
    pub title: String,
    pub url: String,
    pub company: Option<String>,
    pub category: Option<String>,
    pub submitted_by: String,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<DbPost> for Post {
    type Error = AppError;

    fn try_from(value: DbPost) -> Result<Self, Self::Error> {
        Ok(Post {
            id: Uuid::parse_str(&value.id)
                .map_err(|_| AppError::integrity(format!("malformed post id: {}", value.id)))?,
            title: value.title,
            url: value.url,
            company: value.company,
            category: value.category,
            submitted_by: Uuid::parse_str(&value.submitted_by).map_err(|_| {
                AppError::integrity(format!("malformed submitter id: {}", value.submitted_by))
            })?,
            approved: value.approved,
            created_at: value.created_at,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PostCreateRequest {
    #[schema(example = "Series B announcement")]
    pub title: String,
    #[schema(example = "https://example.com/news/series-b")]
    pub url: String,
    pub company: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PostsResponse {
    pub posts: Vec<Post>,
}
