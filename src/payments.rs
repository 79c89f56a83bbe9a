//! Payment endpoints: checkout creation and reconciliation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::Error;
use crate::fetch::ApiRequest;
use crate::pipeline::Pipeline;

/// Provider-declared result of a hosted checkout, as reported to the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Success,
    Failed,
}

/// Response of the checkout-creation endpoints: where to send the user and
/// the reference that keys the whole attempt
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutIntent {
    /// Hosted checkout page to render in the embedded surface
    pub checkout_url: String,
    /// Backend-issued reference, doubles as the reconciliation idempotency key
    pub transaction_ref: String,
}

/// Reconciliation payload submitted once per checkout session.
///
/// `provider_metadata` carries the provider's raw callback parameters
/// verbatim so the backend can cross-validate against its own notification
/// channel. `amount` is in display units, already converted from the
/// provider's sub-unit representation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub transaction_ref: String,
    pub status: PaymentStatus,
    pub amount: i64,
    pub provider: String,
    pub provider_metadata: BTreeMap<String, String>,
}

/// Client for the payment endpoints
pub struct PaymentsApi {
    pipeline: Arc<Pipeline>,
}

impl PaymentsApi {
    /// Create a new payments client over the given pipeline
    pub(crate) fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    /// Request a hosted checkout for a booking deposit
    pub async fn create_deposit_checkout(
        &self,
        booking_id: &str,
        amount: i64,
    ) -> Result<CheckoutIntent, Error> {
        let path = format!("/payments/bookings/{}/deposit", booking_id);
        self.pipeline
            .send(ApiRequest::post(&path).json(&serde_json::json!({ "amount": amount }))?)
            .await
    }

    /// Request a hosted checkout for the final rental payment
    pub async fn create_final_checkout(
        &self,
        rental_id: &str,
        amount: i64,
    ) -> Result<CheckoutIntent, Error> {
        let path = format!("/payments/rentals/{}/final", rental_id);
        self.pipeline
            .send(ApiRequest::post(&path).json(&serde_json::json!({ "amount": amount }))?)
            .await
    }

    /// Submit the provider callback parameters for reconciliation.
    ///
    /// Idempotent on the backend side, keyed by `transaction_ref`; returns
    /// the backend's current view of the payment.
    pub async fn submit_callback(
        &self,
        report: &ReconciliationReport,
    ) -> Result<serde_json::Value, Error> {
        let path = format!("/payments/{}/callback", report.provider);
        self.pipeline
            .send(ApiRequest::post(&path).json(report)?)
            .await
    }
}
