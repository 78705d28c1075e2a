//! Account domain models
//!
//! Accounts live in three storage partitions (job seekers, employers,
//! admins) but share one in-memory shape tagged by [`Role`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Account partition tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    JobSeeker,
    Employer,
    Admin,
}

impl Role {
    /// Partition probe order for unified login: job seekers first,
    /// then employers, then admins.
    pub const LOGIN_PROBE_ORDER: [Role; 3] = [Role::JobSeeker, Role::Employer, Role::Admin];

    /// Wire name, matching the serde representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::JobSeeker => "jobSeeker",
            Role::Employer => "employer",
            Role::Admin => "admin",
        }
    }

    /// Whether this partition carries a soft-delete flag. Admin
    /// accounts are never soft-deleted.
    pub fn has_soft_delete(&self) -> bool {
        !matches!(self, Role::Admin)
    }

    /// Whether self-service password reset is offered for this partition
    pub fn supports_password_reset(&self) -> bool {
        !matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jobSeeker" => Ok(Role::JobSeeker),
            "employer" => Ok(Role::Employer),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// Account record, loaded from any of the three partitions.
///
/// Columns a partition does not carry come back as NULL/FALSE from the
/// repository so every partition maps onto this one shape.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub phone: Option<String>,
    /// Employer partition only
    pub company_name: Option<String>,
    /// Admin partition only, a finer-grained role label
    pub admin_label: Option<String>,
    pub deleted: bool,
    /// SHA-256 hex of the active reset token, if a reset window is open
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Role label reported to clients. Admin accounts may carry a
    /// finer-grained label, defaulting to "Admin".
    pub fn role_label(&self, role: Role) -> String {
        match role {
            Role::Admin => self
                .admin_label
                .clone()
                .unwrap_or_else(|| "Admin".to_string()),
            _ => role.as_str().to_string(),
        }
    }
}

/// Account profile returned to clients (no password hash, no reset fields)
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: Uuid,
    pub role: Role,
    pub email: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AccountResponse {
    pub fn from_account(account: Account, role: Role) -> Self {
        Self {
            id: account.id,
            role,
            email: account.email,
            full_name: account.full_name,
            phone: account.phone,
            company_name: account.company_name,
            created_at: account.created_at,
        }
    }
}
