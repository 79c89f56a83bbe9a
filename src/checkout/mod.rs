//! Hosted-checkout session controller
//!
//! Drives one redirect-based checkout to a single, well-defined outcome.
//! The embedded browsing surface and the OS deep-link hook are two producers
//! feeding one [`SurfaceEvent`] consumer; the first terminal classification
//! wins and every later event is ignored unconditionally.

mod matcher;
mod types;

use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::payments::{CheckoutIntent, PaymentStatus, PaymentsApi, ReconciliationReport};

pub use matcher::{classify, CallbackParams, Classification, ProviderProfile};
pub use types::{CheckoutOutcome, CheckoutSession, SurfaceEvent};

/// Factory for checkout flows, parameterized by provider
pub struct CheckoutController {
    payments: Arc<PaymentsApi>,
    profile: ProviderProfile,
}

/// Producer handle given to the embedded surface and the deep-link hook.
///
/// Sends are infallible from the producer's point of view: once the flow has
/// resolved, events are silently dropped.
#[derive(Clone)]
pub struct SurfaceSink {
    tx: mpsc::UnboundedSender<SurfaceEvent>,
}

impl SurfaceSink {
    /// Report a navigation inside the embedded surface
    pub fn navigated(&self, url: &str) {
        let _ = self.tx.send(SurfaceEvent::Navigation(url.to_string()));
    }

    /// Report an OS deep-link activation
    pub fn deep_link(&self, url: &str) {
        let _ = self.tx.send(SurfaceEvent::DeepLink(url.to_string()));
    }

    /// Report a page-load failure inside the embedded surface
    pub fn load_failed(&self, description: &str) {
        let _ = self.tx.send(SurfaceEvent::LoadError(description.to_string()));
    }

    /// Report that the user closed the checkout surface
    pub fn dismissed(&self) {
        let _ = self.tx.send(SurfaceEvent::Dismissed);
    }
}

impl CheckoutController {
    /// Create a controller for the given provider
    pub fn new(payments: Arc<PaymentsApi>, profile: ProviderProfile) -> Self {
        Self { payments, profile }
    }

    /// Open a checkout session for a backend-issued intent.
    ///
    /// `amount` is the display-unit amount computed from the pricing
    /// snapshot at initiation; `subject_id` is the booking or rental being
    /// paid for. Returns the flow to drive and the sink to wire into the
    /// surface callbacks.
    pub fn begin(
        &self,
        intent: CheckoutIntent,
        amount: i64,
        subject_id: &str,
    ) -> (CheckoutFlow, SurfaceSink) {
        let (tx, rx) = mpsc::unbounded_channel();

        let session = CheckoutSession {
            transaction_ref: intent.transaction_ref,
            provider_order_ref: None,
            amount,
            subject_id: subject_id.to_string(),
            checkout_url: intent.checkout_url,
            outcome: None,
        };

        let flow = CheckoutFlow {
            session,
            profile: self.profile.clone(),
            payments: Arc::clone(&self.payments),
            events: rx,
        };

        (flow, SurfaceSink { tx })
    }
}

/// One running checkout session: the single consumer of surface events
pub struct CheckoutFlow {
    session: CheckoutSession,
    profile: ProviderProfile,
    payments: Arc<PaymentsApi>,
    events: mpsc::UnboundedReceiver<SurfaceEvent>,
}

impl CheckoutFlow {
    /// The session being driven
    pub fn session(&self) -> &CheckoutSession {
        &self.session
    }

    /// Consume surface events until the session reaches a terminal state.
    ///
    /// Resolves with exactly one outcome. The terminal flag is set on the
    /// session synchronously when the first terminal event is classified,
    /// before the reconciliation call is awaited, so a second terminal
    /// navigation arriving in the meantime can never trigger a second
    /// submission.
    pub async fn run(mut self) -> CheckoutOutcome {
        while let Some(event) = self.events.recv().await {
            if self.session.is_terminal() {
                debug!("ignoring surface event after terminal classification");
                continue;
            }

            match event {
                SurfaceEvent::Navigation(url) | SurfaceEvent::DeepLink(url) => {
                    match classify(&self.profile, &url) {
                        Classification::Approved(params) => {
                            self.session.outcome = Some(CheckoutOutcome::Success);
                            self.note_order_ref(&params);
                            self.reconcile(PaymentStatus::Success, params).await;
                            return CheckoutOutcome::Success;
                        }
                        Classification::Declined(params) => {
                            self.session.outcome = Some(CheckoutOutcome::Failed);
                            self.note_order_ref(&params);
                            self.reconcile(PaymentStatus::Failed, params).await;
                            return CheckoutOutcome::Failed;
                        }
                        Classification::Cancelled => {
                            self.session.outcome = Some(CheckoutOutcome::Cancelled);
                            info!(
                                "checkout {} cancelled at the provider",
                                self.session.transaction_ref
                            );
                            return CheckoutOutcome::Cancelled;
                        }
                        Classification::Unrelated => {}
                    }
                }
                SurfaceEvent::LoadError(description) => {
                    // A load failure while pending is not terminal: the
                    // surface shows its own error page and the user can
                    // retry or dismiss.
                    warn!(
                        "checkout {} surface load error: {}",
                        self.session.transaction_ref, description
                    );
                }
                SurfaceEvent::Dismissed => {
                    self.session.outcome = Some(CheckoutOutcome::Cancelled);
                    info!(
                        "checkout {} dismissed by the user",
                        self.session.transaction_ref
                    );
                    return CheckoutOutcome::Cancelled;
                }
            }
        }

        // All producers gone without a terminal event: the surface was torn
        // down (app backgrounded); treat as an implicit cancellation and let
        // resumption re-fetch state from the backend.
        info!(
            "checkout {} surface closed without a terminal event",
            self.session.transaction_ref
        );
        CheckoutOutcome::Cancelled
    }

    fn note_order_ref(&mut self, params: &CallbackParams) {
        self.session.provider_order_ref = params.get(&self.profile.order_ref_param).cloned();
    }

    /// Submit the reconciliation report. Best-effort: a transport failure is
    /// logged but never changes the locally classified outcome, and the
    /// backend's own provider notification channel remains the source of
    /// truth for eventual consistency.
    async fn reconcile(&self, status: PaymentStatus, params: CallbackParams) {
        let amount = match params
            .get(&self.profile.amount_param)
            .and_then(|value| value.parse::<i64>().ok())
        {
            Some(minor) => {
                let display = self.profile.display_amount(minor);
                // a truncated remainder is a mismatch even when the
                // truncated value lands on the session amount
                if display != self.session.amount
                    || !self.profile.is_whole_display_amount(minor)
                {
                    warn!(
                        "checkout {}: provider reports {} but session captured {}; submitting provider amount for backend cross-validation",
                        self.session.transaction_ref, display, self.session.amount
                    );
                }
                display
            }
            None => self.session.amount,
        };

        let report = ReconciliationReport {
            transaction_ref: self.session.transaction_ref.clone(),
            status,
            amount,
            provider: self.profile.name.clone(),
            provider_metadata: params,
        };

        match self.payments.submit_callback(&report).await {
            Ok(_) => debug!(
                "checkout {} reconciled as {:?}",
                self.session.transaction_ref, status
            ),
            Err(err) => warn!(
                "checkout {} reconciliation failed, presenting local outcome: {}",
                self.session.transaction_ref, err
            ),
        }
    }
}
