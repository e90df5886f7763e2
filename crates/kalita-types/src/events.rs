use serde::{Deserialize, Serialize};

use crate::models::UserProfile;

/// Auth state changes delivered to subscribers of a client session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum AuthEvent {
    /// A sign-in or sign-up produced a new session
    SignedIn { user: UserProfile },

    /// The session ended, locally or because the server revoked it
    SignedOut,

    /// The profile behind the current session changed (e.g. role)
    UserUpdated { user: UserProfile },
}

impl AuthEvent {
    /// The user the application should consider current after this event.
    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            Self::SignedIn { user } | Self::UserUpdated { user } => Some(user),
            Self::SignedOut => None,
        }
    }
}
