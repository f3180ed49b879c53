use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Setting {
    #[schema(example = "digest_frequency_days")]
    pub name: String,
    #[schema(example = 7)]
    pub value: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SettingUpsertRequest {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SettingsResponse {
    pub settings: Vec<Setting>,
}
