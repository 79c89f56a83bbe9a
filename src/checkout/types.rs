//! Types for the hosted-checkout state machine

use crate::error::Error;

/// Final result of one hosted checkout attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    /// The provider approved the payment
    Success,
    /// The provider declined or errored the payment
    Failed,
    /// The user backed out before a terminal provider event
    Cancelled,
}

impl CheckoutOutcome {
    /// Convert the outcome into a result, for call sites that propagate
    /// non-success outcomes as errors
    pub fn into_result(self) -> Result<(), Error> {
        match self {
            CheckoutOutcome::Success => Ok(()),
            CheckoutOutcome::Failed => {
                Err(Error::ProviderFailure("payment declined by provider".to_string()))
            }
            CheckoutOutcome::Cancelled => Err(Error::ProviderCancelled),
        }
    }
}

/// Client-side representation of one hosted-payment attempt.
///
/// `outcome` transitions exactly once from `None` (pending) to a terminal
/// value and is never rewritten; `transaction_ref` doubles as the
/// idempotency key of the reconciliation call.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    /// Backend-issued reference for this attempt
    pub transaction_ref: String,
    /// The provider's own order reference, once observed in a callback
    pub provider_order_ref: Option<String>,
    /// Amount in display units, captured from the pricing snapshot at the
    /// moment checkout was initiated
    pub amount: i64,
    /// The booking or rental this payment belongs to
    pub subject_id: String,
    /// Hosted checkout page rendered in the embedded surface
    pub checkout_url: String,
    /// Terminal outcome, `None` while the session is pending
    pub outcome: Option<CheckoutOutcome>,
}

impl CheckoutSession {
    /// Whether a terminal event has already been accepted
    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }
}

/// Events observed from the embedded browsing surface or from an OS-level
/// deep-link activation.
///
/// Both entry points feed the same consumer; a deep link is just a
/// navigation that happened to leave the embedded surface.
#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    /// The embedded surface navigated to a URL
    Navigation(String),
    /// The OS re-entered the app with a callback URL
    DeepLink(String),
    /// The embedded surface failed to load a page
    LoadError(String),
    /// The user closed the checkout surface
    Dismissed,
}
