use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::AppError;

use super::resolver::Principal;

/// Role held by a principal. Derived `Ord` gives the privilege order:
/// `user < approver < admin`, so `admin` satisfies every requirement and
/// `approver` satisfies `approver` and `user`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Approver,
    Admin,
}

impl Role {
    pub fn satisfies(self, required: Role) -> bool {
        self >= required
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Approver => "approver",
            Role::Admin => "admin",
        }
    }

    /// Parse a role as stored in the users table. An unknown value means the
    /// persistence contract was violated, not that the client erred.
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "user" => Ok(Role::User),
            "approver" => Ok(Role::Approver),
            "admin" => Ok(Role::Admin),
            other => Err(AppError::integrity(format!("unknown role in store: {other}"))),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pure allow/deny decision. `None` principal means no credential was
/// presented (401 downstream); a present principal with an insufficient role
/// is denied as forbidden (403).
pub fn authorize(principal: Option<&Principal>, required: Role) -> Result<(), AppError> {
    let principal = principal.ok_or(AppError::MissingCredential)?;

    if principal.role.satisfies(required) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "requires role {required}, principal has {}",
            principal.role
        )))
    }
}
