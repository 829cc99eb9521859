use serde::{Deserialize, Serialize};

/// The two role classes. Every role-gated branch matches on this exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::User => "user",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User record as served by the auth endpoints and persisted for restore
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// `POST /auth/login` and `POST /auth/register` reply
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user: UserRecord,
    pub token: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// The authenticated user for the lifetime of one session
#[derive(Debug, Clone, PartialEq)]
pub struct SessionContext {
    user_id: String,
    display_name: String,
    email: String,
    role: Role,
    token: String,
}

impl SessionContext {
    pub fn new(user: &UserRecord, token: impl Into<String>) -> Self {
        Self {
            user_id: user.id.clone(),
            display_name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            token: token.into(),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Admin capability for this session, if its role carries one
    pub fn admin(&self) -> Option<AdminGrant<'_>> {
        match self.role {
            Role::Admin => Some(AdminGrant { _session: self }),
            Role::User => None,
        }
    }
}

/// Proof that the acting session is an administrator.
///
/// Only obtainable through [`SessionContext::admin`].
#[derive(Debug, Clone, Copy)]
pub struct AdminGrant<'a> {
    _session: &'a SessionContext,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: &str) -> UserRecord {
        serde_json::from_value(serde_json::json!({
            "id": "u1",
            "name": "Admin User",
            "email": "admin@swachhgrid.com",
            "role": role,
            "created_at": "2024-05-01T10:00:00"
        }))
        .unwrap()
    }

    #[test]
    fn test_admin_grant_follows_role() {
        let admin = SessionContext::new(&user("admin"), "t1");
        assert!(admin.admin().is_some());

        let regular = SessionContext::new(&user("user"), "t2");
        assert!(regular.admin().is_none());
        assert_eq!(regular.role(), Role::User);
        assert_eq!(regular.token(), "t2");
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let result = serde_json::from_value::<UserRecord>(serde_json::json!({
            "id": "u1",
            "name": "Root",
            "email": "root@swachhgrid.com",
            "role": "superuser"
        }));
        assert!(result.is_err());
    }
}
