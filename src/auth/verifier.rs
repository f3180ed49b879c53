use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;

use super::gate::Role;
use super::resolver::Principal;

/// Session-token codec. Mints and verifies the signed token carried in the
/// `_session` cookie. Pure with respect to persistence: verification never
/// touches the database.
#[derive(Debug, Clone)]
pub struct SessionKeys {
    secret: Arc<Vec<u8>>,
    ttl_hours: i64,
}

impl SessionKeys {
    pub fn new(secret: impl Into<Vec<u8>>, ttl_hours: i64) -> Self {
        Self {
            secret: Arc::new(secret.into()),
            ttl_hours,
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        let secret =
            std::env::var("JWT_SECRET").map_err(|_| AppError::configuration("JWT_SECRET not set"))?;
        let ttl_hours = std::env::var("JWT_EXP_HOURS")
            .map(|val| val.parse::<i64>())
            .unwrap_or(Ok(24))
            .map_err(|_| AppError::configuration("JWT_EXP_HOURS must be a valid integer"))?;

        Ok(Self::new(secret.into_bytes(), ttl_hours))
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_hours * 3600
    }

    pub fn encode(&self, principal: &Principal) -> Result<String, AppError> {
        let now = Utc::now();
        let exp = now + chrono::Duration::hours(self.ttl_hours);

        let claims = Claims {
            sub: principal.id,
            email: principal.email.clone(),
            role: principal.role,
            iat: now.timestamp() as usize,
            exp: exp.timestamp() as usize,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|err| AppError::internal(format!("failed to sign session token: {err}")))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, AppError> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
            .map_err(|err| match err.kind() {
                ErrorKind::ExpiredSignature => AppError::ExpiredCredential,
                _ => AppError::invalid_credential(err.to_string()),
            })
    }
}

/// Verified session-token claims. The embedded role is trusted as-is on
/// subsequent requests; a role change takes effect when the token is
/// reissued.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
}

impl Claims {
    pub fn into_principal(self) -> Principal {
        Principal {
            id: self.sub,
            email: self.email,
            role: self.role,
        }
    }
}

/// Attributes asserted by the external identity provider for a verified
/// login token.
#[derive(Debug, Clone)]
pub struct IdentityClaims {
    pub name: String,
    pub email: String,
}

/// External identity provider seam. Implemented per provider; tests plug in
/// a stub.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify an opaque provider token and extract the asserted identity.
    async fn verify(&self, token: &str) -> Result<IdentityClaims, AppError>;
}

/// Google ID-token verification against the `tokeninfo` endpoint.
#[derive(Debug, Clone)]
pub struct GoogleIdentityProvider {
    http: reqwest::Client,
    client_id: String,
    endpoint: String,
}

const TOKENINFO_ENDPOINT: &str = "https://oauth2.googleapis.com/tokeninfo";
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
struct TokenInfo {
    aud: String,
    email: String,
    #[serde(default)]
    name: Option<String>,
}

impl GoogleIdentityProvider {
    pub fn new(client_id: impl Into<String>) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()
            .map_err(|err| AppError::configuration(format!("failed to build http client: {err}")))?;

        Ok(Self {
            http,
            client_id: client_id.into(),
            endpoint: TOKENINFO_ENDPOINT.to_string(),
        })
    }

    pub fn from_env() -> Result<Self, AppError> {
        let client_id = std::env::var("GOOGLE_CLIENT_ID")
            .map_err(|_| AppError::configuration("GOOGLE_CLIENT_ID not set"))?;
        Self::new(client_id)
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentityProvider {
    async fn verify(&self, token: &str) -> Result<IdentityClaims, AppError> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[("id_token", token)])
            .send()
            .await
            .map_err(|err| AppError::verification_failed(format!("provider unreachable: {err}")))?;

        if !response.status().is_success() {
            return Err(AppError::verification_failed(format!(
                "provider rejected token: {}",
                response.status()
            )));
        }

        let info: TokenInfo = response
            .json()
            .await
            .map_err(|err| AppError::verification_failed(format!("malformed provider response: {err}")))?;

        if info.aud != self.client_id {
            return Err(AppError::verification_failed("token audience mismatch"));
        }

        Ok(IdentityClaims {
            name: info.name.unwrap_or_else(|| info.email.clone()),
            email: info.email,
        })
    }
}
