//! Role → capability resolution
//!
//! All role-gated behavior (which endpoint lists entries, which tabs and
//! commands exist, whether a form may assign an entry to someone else) reads
//! a [`Capabilities`] value instead of comparing role names.

use serde::Serialize;

use crate::services::session::Session;

/// What the signed-in user may do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    /// List every user's entries instead of only one's own
    pub can_view_all_entries: bool,
    /// List, edit and delete user accounts
    pub can_manage_users: bool,
    /// Create entries on behalf of another user
    pub can_assign_entries: bool,
    /// Edit and delete existing entries
    pub can_modify_entries: bool,
}

impl Capabilities {
    fn admin() -> Self {
        Self {
            can_view_all_entries: true,
            can_manage_users: true,
            can_assign_entries: true,
            can_modify_entries: true,
        }
    }
}

/// Resolve capabilities for a session (signed out → nothing)
pub fn capabilities_for(session: Option<&Session>) -> Capabilities {
    match session {
        Some(session) if session.user.is_admin() => Capabilities::admin(),
        _ => Capabilities::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, User, ROLE_ADMIN, ROLE_USER};

    fn session_with_roles(roles: &[&str]) -> Session {
        Session {
            token: "t".into(),
            user: User {
                id: 1,
                username: "someone".into(),
                roles: roles.iter().map(|r| Role::named(r)).collect(),
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_signed_out_has_no_capabilities() {
        assert_eq!(capabilities_for(None), Capabilities::default());
    }

    #[test]
    fn test_regular_user() {
        let caps = capabilities_for(Some(&session_with_roles(&[ROLE_USER])));
        assert!(!caps.can_view_all_entries);
        assert!(!caps.can_manage_users);
        assert!(!caps.can_assign_entries);
        assert!(!caps.can_modify_entries);
    }

    #[test]
    fn test_admin() {
        let caps = capabilities_for(Some(&session_with_roles(&[ROLE_USER, ROLE_ADMIN])));
        assert!(caps.can_view_all_entries);
        assert!(caps.can_manage_users);
        assert!(caps.can_assign_entries);
        assert!(caps.can_modify_entries);
    }

    #[test]
    fn test_role_match_is_exact() {
        let caps = capabilities_for(Some(&session_with_roles(&["role_admin", "ADMIN"])));
        assert_eq!(caps, Capabilities::default());
    }
}
