//! Provider URL-pattern classification
//!
//! Hosted checkouts end in a redirect whose URL carries the provider's
//! callback parameters. Providers differ only in the markers and parameter
//! names, so classification is one function over a per-provider profile.

use std::collections::BTreeMap;
use url::Url;

/// Raw callback parameters extracted from a terminal URL
pub type CallbackParams = BTreeMap<String, String>;

/// URL-pattern parameters for one payment provider
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    /// Provider identifier, also the path segment of the reconciliation
    /// endpoint
    pub name: String,
    /// Substring identifying the provider's return/callback URL
    pub return_marker: String,
    /// Prefix of the OS deep link that re-enters the app with the same
    /// callback parameters
    pub deep_link_prefix: String,
    /// Query parameter carrying the provider's response code
    pub response_code_param: String,
    /// Response code value signifying approval
    pub success_code: String,
    /// Substring identifying the user-cancel redirect
    pub cancel_marker: String,
    /// Substring identifying a generic provider error page
    pub error_marker: String,
    /// Query parameter carrying the provider's own order reference
    pub order_ref_param: String,
    /// Query parameter carrying the provider-reported amount, in minor units
    pub amount_param: String,
    /// Minor units per display unit (e.g. 100 when the provider reports in
    /// the smallest currency sub-unit)
    pub minor_units_per_display_unit: i64,
}

impl ProviderProfile {
    /// Profile for PayLink, the platform's default hosted-checkout provider
    pub fn paylink() -> Self {
        Self {
            name: "paylink".to_string(),
            return_marker: "/payments/paylink/return".to_string(),
            deep_link_prefix: "velora://payments/paylink".to_string(),
            response_code_param: "err_code".to_string(),
            success_code: "000".to_string(),
            cancel_marker: "/payments/paylink/cancel".to_string(),
            error_marker: "/checkout/error".to_string(),
            order_ref_param: "basket_id".to_string(),
            amount_param: "transaction_amount".to_string(),
            minor_units_per_display_unit: 100,
        }
    }

    /// Convert a provider-reported minor-unit amount to display units
    pub fn display_amount(&self, minor: i64) -> i64 {
        minor / self.minor_units_per_display_unit
    }

    /// Whether a minor-unit amount converts to display units without a
    /// remainder. A remainder means the conversion above truncated and the
    /// provider amount cannot equal any display-unit snapshot.
    pub fn is_whole_display_amount(&self, minor: i64) -> bool {
        minor % self.minor_units_per_display_unit == 0
    }
}

/// How one navigation URL relates to the checkout session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The provider's success code was observed
    Approved(CallbackParams),
    /// A response code other than the success value, or a provider error
    /// page on the callback path
    Declined(CallbackParams),
    /// The user-cancel redirect was observed
    Cancelled,
    /// An intermediate provider page, asset load or otherwise unrelated URL
    Unrelated,
}

/// Classify one navigation URL against a provider profile.
///
/// Only URLs on the provider's callback path (return marker or deep-link
/// prefix) can be terminal; everything else keeps the session pending.
pub fn classify(profile: &ProviderProfile, raw_url: &str) -> Classification {
    if raw_url.contains(&profile.cancel_marker) {
        return Classification::Cancelled;
    }

    let is_callback = raw_url.contains(&profile.return_marker)
        || raw_url.starts_with(&profile.deep_link_prefix);
    if !is_callback {
        return Classification::Unrelated;
    }

    let params = query_params(raw_url);

    match params.get(&profile.response_code_param) {
        Some(code) if code == &profile.success_code => Classification::Approved(params),
        // A code is present but it is not the success value: a decline,
        // whatever else the URL looks like.
        Some(_) => Classification::Declined(params),
        None if raw_url.contains(&profile.error_marker) => Classification::Declined(params),
        None => Classification::Unrelated,
    }
}

fn query_params(raw_url: &str) -> CallbackParams {
    match Url::parse(raw_url) {
        Ok(url) => url
            .query_pairs()
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect(),
        Err(_) => CallbackParams::new(),
    }
}
