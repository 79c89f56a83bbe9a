//! Authenticated request pipeline
//!
//! Every outbound API call goes through [`Pipeline::send`], which attaches
//! the stored access token, intercepts authorization failures and performs a
//! single-flight token refresh before replaying the failed call. Callers
//! never observe a raw 401: a call either succeeds or fails with
//! [`Error::AuthenticationExpired`] after the session has been cleared.

use log::{debug, warn};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::auth::RefreshResponse;
use crate::config::ClientOptions;
use crate::error::Error;
use crate::fetch::{ApiRequest, ApiResponse, HttpTransport};
use crate::store::CredentialVault;

/// Authenticated request pipeline with transparent token refresh
pub struct Pipeline {
    transport: Arc<dyn HttpTransport>,
    vault: Arc<CredentialVault>,
    options: ClientOptions,
    // Critical section for the refresh call. Holding this lock across the
    // refresh request is what makes it single-flight: concurrent 401s queue
    // here and find the rotated pair in the vault instead of racing to spend
    // the single-use refresh token themselves.
    refresh_gate: Mutex<()>,
}

impl Pipeline {
    /// Create a new pipeline over the given transport and credential vault
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        vault: Arc<CredentialVault>,
        options: ClientOptions,
    ) -> Self {
        Self {
            transport,
            vault,
            options,
            refresh_gate: Mutex::new(()),
        }
    }

    /// The credential vault backing this pipeline
    pub fn vault(&self) -> &Arc<CredentialVault> {
        &self.vault
    }

    /// Send a request and deserialize the response body
    pub async fn send<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, Error> {
        let response = self.dispatch(request).await?;
        response.json()
    }

    /// Send a request, discarding the response body
    pub async fn send_ignore_body(&self, request: ApiRequest) -> Result<(), Error> {
        self.dispatch(request).await.map(|_| ())
    }

    async fn dispatch(&self, mut request: ApiRequest) -> Result<ApiResponse, Error> {
        request = request.header("X-Client-Info", &self.options.client_info);

        // Absence of a token is allowed: anonymous calls pass through
        // unmodified.
        let attached = self.vault.access_token().await?;
        if let Some(token) = attached.as_deref() {
            request.set_bearer(token);
        }

        let response = self.transport.execute(&request).await?;
        if response.is_success() {
            return Ok(response);
        }

        if response.status == 401 && !request.retried && self.options.auto_refresh_token {
            // At most one refresh-and-replay cycle per original call.
            request.retried = true;
            let fresh = self.refresh_access_token(attached.as_deref()).await?;
            request.set_bearer(&fresh);

            let replay = self.transport.execute(&request).await?;
            if replay.is_success() {
                return Ok(replay);
            }
            if replay.status == 401 {
                return Err(Error::AuthenticationExpired);
            }
            return Err(Error::server(replay.status, replay.error_message()));
        }

        if response.status == 401 {
            return Err(Error::AuthenticationExpired);
        }

        Err(Error::server(response.status, response.error_message()))
    }

    /// Obtain a valid access token after a 401, refreshing at most once
    /// across all concurrent callers.
    ///
    /// `stale` is the token the failed call carried (if any). Callers that
    /// queued on the gate while another refresh completed find a different
    /// token in the vault and reuse it without touching the network.
    async fn refresh_access_token(&self, stale: Option<&str>) -> Result<String, Error> {
        let _gate = self.refresh_gate.lock().await;

        if let Some(current) = self.vault.access_token().await? {
            if Some(current.as_str()) != stale {
                return Ok(current);
            }
        }

        let refresh_token = match self.vault.refresh_token().await? {
            Some(token) => token,
            None => {
                // Nothing to refresh with: the session is over.
                self.vault.clear().await?;
                return Err(Error::AuthenticationExpired);
            }
        };

        debug!("access token rejected, refreshing session");

        let request = ApiRequest::post("/auth/refresh")
            .header("X-Client-Info", &self.options.client_info)
            .json(&serde_json::json!({ "refreshToken": refresh_token }))?;

        let response = match self.transport.execute(&request).await {
            Ok(response) => response,
            Err(err) => {
                warn!("token refresh failed in transport: {}", err);
                self.vault.clear().await?;
                return Err(Error::AuthenticationExpired);
            }
        };

        if !response.is_success() {
            warn!("token refresh rejected with status {}", response.status);
            self.vault.clear().await?;
            return Err(Error::AuthenticationExpired);
        }

        let refreshed: RefreshResponse = response.json()?;
        self.vault.update_tokens(&refreshed.tokens).await?;
        debug!("session refreshed");

        Ok(refreshed.tokens.access_token)
    }
}
