//! Account, role and authentication payload types

use serde::{Deserialize, Deserializer, Serialize};

/// Role name carried by administrators
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

/// Role name carried by regular users
pub const ROLE_USER: &str = "ROLE_USER";

/// An authorization label attached to a user
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Role {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
}

impl Role {
    pub fn named(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.name == ROLE_ADMIN
    }

    /// Name without the `ROLE_` prefix (e.g. "ADMIN")
    pub fn display_name(&self) -> &str {
        self.name.strip_prefix("ROLE_").unwrap_or(&self.name)
    }
}

/// Roles arrive as `{ "id": 1, "name": "ROLE_ADMIN" }` from sign-in and as
/// bare strings from some listings; accept both.
impl<'de> Deserialize<'de> for Role {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RoleRepr {
            Name(String),
            Object {
                #[serde(default)]
                id: Option<i64>,
                name: String,
            },
        }

        Ok(match RoleRepr::deserialize(deserializer)? {
            RoleRepr::Name(name) => Role { id: None, name },
            RoleRepr::Object { id, name } => Role { id, name },
        })
    }
}

/// A user account as returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub roles: Vec<Role>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(Role::is_admin)
    }

    /// Comma-separated role names without prefix
    pub fn role_labels(&self) -> String {
        if self.roles.is_empty() {
            return "-".to_string();
        }
        self.roles
            .iter()
            .map(Role::display_name)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<Vec<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<Role>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Sign-in credentials
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Account registration payload
#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Vec<String>,
}

/// Sign-in response (JWT plus the user it was issued to)
#[derive(Debug, Clone, Deserialize)]
pub struct JwtResponse {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, rename = "type")]
    pub token_type: Option<String>,
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub roles: Vec<Role>,
}

impl JwtResponse {
    /// User described by this response
    pub fn user(&self) -> User {
        User {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            phone_number: None,
            roles: self.roles.clone(),
        }
    }
}

/// Partial account update; absent fields are left unchanged
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Password change request for the signed-in user
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}
