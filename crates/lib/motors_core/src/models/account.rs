//! Account and identity models.
//!
//! `Identity` is what travels inside a signed token; `Account` is what the
//! credential store hands back. Neither carries the password hash, which only
//! lives in [`AccountWithPassword`] for the login flow.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Account type. Stored as the `account_type` enum in PostgreSQL.
///
/// There is no ordering between variants: route gates list every role they
/// admit explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Role {
    Client,
    Employee,
    Admin,
}

impl Role {
    /// All roles, in declaration order.
    pub const ALL: [Role; 3] = [Role::Client, Role::Employee, Role::Admin];

    /// Canonical name, as stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "Client",
            Role::Employee => "Employee",
            Role::Admin => "Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role name matches none of the known roles.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    /// Case-insensitive; surrounding whitespace is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Role::ALL
            .into_iter()
            .find(|r| r.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}

impl TryFrom<String> for Role {
    type Error = UnknownRole;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Identity claims embedded in a signed token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Subject: the account ID.
    pub sub: i32,
    /// Display name (first name).
    pub name: String,
    /// Account email.
    pub email: String,
    /// Account type.
    pub role: Role,
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub account_id: i32,
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub role: Role,
}

impl Account {
    /// Claims to embed in a token for this account.
    pub fn identity(&self) -> Identity {
        Identity {
            sub: self.account_id,
            name: self.firstname.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Account plus its bcrypt hash, for credential checks only.
#[derive(Clone)]
pub struct AccountWithPassword {
    pub account: Account,
    pub password_hash: String,
}

impl fmt::Debug for AccountWithPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountWithPassword")
            .field("account", &self.account)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

/// Data needed to create an account. New accounts are always `Client`.
#[derive(Clone)]
pub struct NewAccount {
    pub firstname: String,
    pub lastname: String,
    pub email: String,
    pub password_hash: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parse_ignores_case() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("EMPLOYEE".parse::<Role>().unwrap(), Role::Employee);
        assert_eq!(" Client ".parse::<Role>().unwrap(), Role::Client);
    }

    #[test]
    fn role_parse_rejects_unknown() {
        let err = "owner".parse::<Role>().unwrap_err();
        assert_eq!(err, UnknownRole("owner".into()));
    }

    #[test]
    fn role_deserializes_any_casing() {
        let role: Role = serde_json::from_str("\"aDmIn\"").unwrap();
        assert_eq!(role, Role::Admin);
        assert_eq!(serde_json::to_string(&Role::Employee).unwrap(), "\"Employee\"");
    }

    #[test]
    fn debug_redacts_password_hash() {
        let acct = AccountWithPassword {
            account: Account {
                account_id: 1,
                firstname: "Basic".into(),
                lastname: "Client".into(),
                email: "basic@340.edu".into(),
                role: Role::Client,
            },
            password_hash: "$2b$12$secret".into(),
        };
        let rendered = format!("{acct:?}");
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
