//! Velora Client Core
//!
//! Session and payment-reconciliation layer for the Velora vehicle-rental
//! mobile client: an authenticated request pipeline with race-free token
//! refresh, durable credential storage behind a key-value boundary, and a
//! hosted-checkout controller that reconciles provider callbacks with the
//! backend exactly once.

pub mod auth;
pub mod checkout;
pub mod config;
pub mod error;
pub mod fetch;
pub mod payments;
pub mod pipeline;
pub mod store;

use reqwest::Client;
use std::sync::Arc;

use crate::auth::AuthApi;
use crate::checkout::{CheckoutController, ProviderProfile};
use crate::config::ClientOptions;
use crate::fetch::ReqwestTransport;
use crate::payments::PaymentsApi;
use crate::pipeline::Pipeline;
use crate::store::{CredentialStore, CredentialVault, MemoryCredentialStore};

/// The main entry point for the Velora client core
pub struct VeloraClient {
    /// The backend base URL
    pub base_url: String,
    /// HTTP client shared by every component
    pub http_client: Client,
    pipeline: Arc<Pipeline>,
    payments: Arc<PaymentsApi>,
    options: ClientOptions,
}

impl VeloraClient {
    /// Create a new client with an in-memory credential store
    ///
    /// # Example
    ///
    /// ```
    /// use velora_client::VeloraClient;
    ///
    /// let client = VeloraClient::new("https://api.velora.app");
    /// ```
    pub fn new(base_url: &str) -> Self {
        Self::new_with_store(base_url, Arc::new(MemoryCredentialStore::new()))
    }

    /// Create a new client over the given durable credential store
    pub fn new_with_store(base_url: &str, store: Arc<dyn CredentialStore>) -> Self {
        Self::new_with_options(base_url, store, ClientOptions::default())
    }

    /// Create a new client with custom options
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use velora_client::{config::ClientOptions, store::MemoryCredentialStore, VeloraClient};
    ///
    /// let options = ClientOptions::default().with_auto_refresh_token(true);
    /// let client = VeloraClient::new_with_options(
    ///     "https://api.velora.app",
    ///     Arc::new(MemoryCredentialStore::new()),
    ///     options,
    /// );
    /// ```
    pub fn new_with_options(
        base_url: &str,
        store: Arc<dyn CredentialStore>,
        options: ClientOptions,
    ) -> Self {
        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build().unwrap_or_else(|_| Client::new());

        let vault = Arc::new(CredentialVault::new(store));
        let transport = Arc::new(ReqwestTransport::new(http_client.clone(), base_url));
        let pipeline = Arc::new(Pipeline::new(transport, vault, options.clone()));
        let payments = Arc::new(PaymentsApi::new(Arc::clone(&pipeline)));

        Self {
            base_url: base_url.to_string(),
            http_client,
            pipeline,
            payments,
            options,
        }
    }

    /// The authenticated request pipeline
    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Client for the authentication endpoints
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(Arc::clone(&self.pipeline))
    }

    /// Client for the payment endpoints
    pub fn payments(&self) -> &Arc<PaymentsApi> {
        &self.payments
    }

    /// Checkout controller for the given provider
    pub fn checkout(&self, profile: ProviderProfile) -> CheckoutController {
        CheckoutController::new(Arc::clone(&self.payments), profile)
    }

    /// The options this client was built with
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::checkout::{CheckoutOutcome, ProviderProfile, SurfaceSink};
    pub use crate::config::ClientOptions;
    pub use crate::error::Error;
    pub use crate::VeloraClient;
}
