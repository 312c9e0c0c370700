use serde::{Deserialize, Serialize};

/// The operating user, passed explicitly into each wizard session.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    /// Centre the user is attached to. When set, the wizard pre-fills it
    /// and never asks.
    pub responsibility_centre_id: Option<i64>,
}

impl UserProfile {
    pub fn new(username: &str) -> Self {
        Self {
            username: username.to_string(),
            responsibility_centre_id: None,
        }
    }

    pub fn with_centre(
        mut self,
        centre_id: i64,
    ) -> Self {
        self.responsibility_centre_id = Some(centre_id);
        self
    }

    pub fn has_assigned_centre(&self) -> bool {
        self.responsibility_centre_id.is_some()
    }
}
