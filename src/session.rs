use serde::{Deserialize, Serialize};

/// Role reported by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Anonymous,
    Member,
    Admin,
}

/// Who is acting. Supplied by the caller, never read from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Session {
    pub actor_id: String,
    pub role: Role,
}

impl Session {
    pub fn new(actor_id: impl Into<String>, role: Role) -> Self {
        Self {
            actor_id: actor_id.into(),
            role,
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.role != Role::Anonymous && !self.actor_id.trim().is_empty()
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin && self.is_authenticated()
    }
}
