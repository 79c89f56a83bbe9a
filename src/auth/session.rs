//! In-memory view of the authenticated session

use serde::{Deserialize, Serialize};

use super::types::{TokenPair, UserProfile};

/// Session data as held by the client after login or registration.
///
/// The tokens and the profile live and die together: a session is created
/// whole on login/registration and destroyed whole on logout or on an
/// unrecoverable refresh failure. Only the token pair is rotated in place
/// during a refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// The current token pair
    pub tokens: TokenPair,
    /// The signed-in user
    pub user: UserProfile,
}

impl Session {
    /// Assemble a session from its parts
    pub fn new(tokens: TokenPair, user: UserProfile) -> Self {
        Self { tokens, user }
    }
}
