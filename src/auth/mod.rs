//! Authentication and session lifecycle

mod session;
mod types;

use log::{debug, warn};
use std::sync::Arc;

use crate::error::Error;
use crate::fetch::ApiRequest;
use crate::pipeline::Pipeline;

pub use session::*;
pub use types::*;

/// Client for the authentication endpoints
pub struct AuthApi {
    pipeline: Arc<Pipeline>,
}

impl AuthApi {
    /// Create a new auth client over the given pipeline
    pub(crate) fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    /// Sign in with email and password.
    ///
    /// On success the token pair and the profile are persisted as a set.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, Error> {
        let credentials = LoginCredentials {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response: AuthResponse = self
            .pipeline
            .send(ApiRequest::post("/auth/login").json(&credentials)?)
            .await?;

        self.pipeline
            .vault()
            .store_session(&response.tokens, &response.user)
            .await?;
        debug!("session established for user {}", response.user.id);

        Ok(Session::new(response.tokens, response.user))
    }

    /// Register a new account and sign in
    pub async fn register(&self, payload: RegisterPayload) -> Result<Session, Error> {
        let response: AuthResponse = self
            .pipeline
            .send(ApiRequest::post("/auth/register").json(&payload)?)
            .await?;

        self.pipeline
            .vault()
            .store_session(&response.tokens, &response.user)
            .await?;
        debug!("session established for new user {}", response.user.id);

        Ok(Session::new(response.tokens, response.user))
    }

    /// Sign out.
    ///
    /// The backend call is best-effort: the local session is cleared no
    /// matter what the server answers.
    pub async fn logout(&self) -> Result<(), Error> {
        let vault = self.pipeline.vault();

        if let Some(refresh_token) = vault.refresh_token().await? {
            let request = ApiRequest::post("/auth/logout")
                .json(&serde_json::json!({ "refreshToken": refresh_token }))?;
            if let Err(err) = self.pipeline.send_ignore_body(request).await {
                warn!("logout call failed, clearing session anyway: {}", err);
            }
        }

        vault.clear().await
    }

    /// The cached profile of the signed-in user, if any
    pub async fn current_user(&self) -> Result<Option<UserProfile>, Error> {
        self.pipeline.vault().user().await
    }

    /// Whether a session is currently stored
    pub async fn is_signed_in(&self) -> Result<bool, Error> {
        self.pipeline.vault().has_session().await
    }
}
