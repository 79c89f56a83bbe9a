use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use velora_client::checkout::{CheckoutOutcome, ProviderProfile};
use velora_client::payments::CheckoutIntent;
use velora_client::VeloraClient;

fn intent(transaction_ref: &str) -> CheckoutIntent {
    serde_json::from_value(json!({
        "checkoutUrl": "https://gateway.paylink.example/checkout/TX",
        "transactionRef": transaction_ref
    }))
    .unwrap()
}

fn success_url(amount_minor: i64) -> String {
    format!(
        "https://api.velora.app/payments/paylink/return?err_code=000&basket_id=B-42&transaction_amount={}",
        amount_minor
    )
}

const DECLINE_URL: &str =
    "https://api.velora.app/payments/paylink/return?err_code=097&err_msg=insufficient+funds&transaction_amount=15000000";
const CANCEL_URL: &str = "https://api.velora.app/payments/paylink/cancel?reason=user";
const INTERMEDIATE_URL: &str = "https://gateway.paylink.example/otp?step=2";

async fn mount_callback(mock_server: &MockServer, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/payments/paylink/callback"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "paymentState": "RECONCILED" })),
        )
        .expect(expected_calls)
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn duplicate_success_redirects_reconcile_exactly_once() {
    let mock_server = MockServer::start().await;
    mount_callback(&mock_server, 1).await;

    let client = VeloraClient::new(&mock_server.uri());
    let controller = client.checkout(ProviderProfile::paylink());

    let (flow, sink) = controller.begin(intent("TX-1"), 150_000, "booking-1");
    sink.navigated(INTERMEDIATE_URL);
    sink.navigated(&success_url(15_000_000));
    // providers commonly re-fire the redirect for the same terminal outcome
    sink.navigated(&success_url(15_000_000));
    drop(sink);

    assert_eq!(flow.run().await, CheckoutOutcome::Success);
}

#[tokio::test]
async fn cancel_redirect_makes_no_backend_call() {
    let mock_server = MockServer::start().await;
    mount_callback(&mock_server, 0).await;

    let client = VeloraClient::new(&mock_server.uri());
    let controller = client.checkout(ProviderProfile::paylink());

    let (flow, sink) = controller.begin(intent("TX-2"), 150_000, "booking-2");
    sink.navigated(CANCEL_URL);
    drop(sink);

    assert_eq!(flow.run().await, CheckoutOutcome::Cancelled);
}

#[tokio::test]
async fn dismissal_before_terminal_event_is_a_cancellation() {
    let mock_server = MockServer::start().await;
    mount_callback(&mock_server, 0).await;

    let client = VeloraClient::new(&mock_server.uri());
    let controller = client.checkout(ProviderProfile::paylink());

    let (flow, sink) = controller.begin(intent("TX-3"), 150_000, "booking-3");
    sink.navigated(INTERMEDIATE_URL);
    sink.dismissed();
    drop(sink);

    assert_eq!(flow.run().await, CheckoutOutcome::Cancelled);
}

#[tokio::test]
async fn decline_reconciles_with_failed_status() {
    let mock_server = MockServer::start().await;
    mount_callback(&mock_server, 1).await;

    let client = VeloraClient::new(&mock_server.uri());
    let controller = client.checkout(ProviderProfile::paylink());

    let (flow, sink) = controller.begin(intent("TX-4"), 150_000, "rental-4");
    sink.navigated(DECLINE_URL);
    drop(sink);

    let outcome = flow.run().await;
    assert_eq!(outcome, CheckoutOutcome::Failed);
    assert!(matches!(
        outcome.into_result(),
        Err(velora_client::error::Error::ProviderFailure(_))
    ));

    let requests = mock_server.received_requests().await.unwrap();
    let callback = requests
        .iter()
        .find(|req| req.url.path() == "/payments/paylink/callback")
        .expect("reconciliation request");
    let body: serde_json::Value = serde_json::from_slice(&callback.body).unwrap();
    assert_eq!(body["status"], "FAILED");
    assert_eq!(body["transactionRef"], "TX-4");
}

#[tokio::test]
async fn reconciliation_payload_converts_provider_minor_units() {
    let mock_server = MockServer::start().await;
    mount_callback(&mock_server, 1).await;

    let client = VeloraClient::new(&mock_server.uri());
    let controller = client.checkout(ProviderProfile::paylink());

    // session captured 150000 display units; the provider reports the same
    // amount as 15000000 in the smallest sub-unit
    let (flow, sink) = controller.begin(intent("TX-5"), 150_000, "booking-5");
    sink.navigated(&success_url(15_000_000));
    drop(sink);

    assert_eq!(flow.run().await, CheckoutOutcome::Success);

    let requests = mock_server.received_requests().await.unwrap();
    let callback = requests
        .iter()
        .find(|req| req.url.path() == "/payments/paylink/callback")
        .expect("reconciliation request");
    let body: serde_json::Value = serde_json::from_slice(&callback.body).unwrap();
    assert_eq!(body["status"], "SUCCESS");
    assert_eq!(body["amount"], 150_000);
    assert_eq!(body["provider"], "paylink");
    assert_eq!(body["providerMetadata"]["err_code"], "000");
    assert_eq!(body["providerMetadata"]["basket_id"], "B-42");
}

#[tokio::test]
async fn reconciliation_failure_still_presents_the_local_outcome() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/payments/paylink/callback"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = VeloraClient::new(&mock_server.uri());
    let controller = client.checkout(ProviderProfile::paylink());

    let (flow, sink) = controller.begin(intent("TX-6"), 150_000, "booking-6");
    sink.navigated(&success_url(15_000_000));
    drop(sink);

    // the outcome comes from the local classification; the backend's own
    // provider notification channel settles the rest
    assert_eq!(flow.run().await, CheckoutOutcome::Success);
}

#[tokio::test]
async fn load_errors_while_pending_do_not_terminate_the_session() {
    let mock_server = MockServer::start().await;
    mount_callback(&mock_server, 1).await;

    let client = VeloraClient::new(&mock_server.uri());
    let controller = client.checkout(ProviderProfile::paylink());

    let (flow, sink) = controller.begin(intent("TX-7"), 150_000, "booking-7");
    sink.load_failed("net::ERR_CONNECTION_RESET");
    sink.navigated(&success_url(15_000_000));
    drop(sink);

    assert_eq!(flow.run().await, CheckoutOutcome::Success);
}

#[tokio::test]
async fn load_errors_after_terminal_classification_are_suppressed() {
    let mock_server = MockServer::start().await;
    mount_callback(&mock_server, 1).await;

    let client = VeloraClient::new(&mock_server.uri());
    let controller = client.checkout(ProviderProfile::paylink());

    let (flow, sink) = controller.begin(intent("TX-11"), 150_000, "booking-11");
    sink.navigated(&success_url(15_000_000));
    // the surface tearing down after the redirect fires a spurious load
    // error; it must not override the outcome or trigger a second call
    sink.load_failed("net::ERR_ABORTED");
    sink.load_failed("net::ERR_CONNECTION_RESET");
    drop(sink);

    assert_eq!(flow.run().await, CheckoutOutcome::Success);
}

#[tokio::test]
async fn mismatched_provider_amount_is_submitted_not_the_session_snapshot() {
    let mock_server = MockServer::start().await;
    mount_callback(&mock_server, 1).await;

    let client = VeloraClient::new(&mock_server.uri());
    let controller = client.checkout(ProviderProfile::paylink());

    // session captured 150000 display units but the provider reports
    // 15250000 minor units (152500); the backend cross-validates, so the
    // payload carries the provider's figure
    let (flow, sink) = controller.begin(intent("TX-12"), 150_000, "booking-12");
    sink.navigated(&success_url(15_250_000));
    drop(sink);

    assert_eq!(flow.run().await, CheckoutOutcome::Success);

    let requests = mock_server.received_requests().await.unwrap();
    let callback = requests
        .iter()
        .find(|req| req.url.path() == "/payments/paylink/callback")
        .expect("reconciliation request");
    let body: serde_json::Value = serde_json::from_slice(&callback.body).unwrap();
    assert_eq!(body["amount"], 152_500);
    assert_eq!(body["providerMetadata"]["transaction_amount"], "15250000");
}

#[tokio::test]
async fn deep_link_reentry_feeds_the_same_state_machine() {
    let mock_server = MockServer::start().await;
    mount_callback(&mock_server, 1).await;

    let client = VeloraClient::new(&mock_server.uri());
    let controller = client.checkout(ProviderProfile::paylink());

    let (flow, sink) = controller.begin(intent("TX-8"), 150_000, "rental-8");
    sink.navigated(INTERMEDIATE_URL);
    // the provider broke out of the embedded surface and came back through
    // the OS deep link, duplicated by a late in-surface redirect
    sink.deep_link("velora://payments/paylink?err_code=000&basket_id=B-8&transaction_amount=15000000");
    sink.navigated(&success_url(15_000_000));
    drop(sink);

    assert_eq!(flow.run().await, CheckoutOutcome::Success);
}

#[tokio::test]
async fn surface_teardown_without_terminal_event_is_a_cancellation() {
    let mock_server = MockServer::start().await;
    mount_callback(&mock_server, 0).await;

    let client = VeloraClient::new(&mock_server.uri());
    let controller = client.checkout(ProviderProfile::paylink());

    let (flow, sink) = controller.begin(intent("TX-9"), 150_000, "booking-9");
    sink.navigated(INTERMEDIATE_URL);
    drop(sink);

    assert_eq!(flow.run().await, CheckoutOutcome::Cancelled);
}

#[tokio::test]
async fn deposit_checkout_flows_end_to_end() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/payments/bookings/booking-1/deposit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "checkoutUrl": "https://gateway.paylink.example/checkout/TX-10",
            "transactionRef": "TX-10"
        })))
        .mount(&mock_server)
        .await;
    mount_callback(&mock_server, 1).await;

    let client = VeloraClient::new(&mock_server.uri());

    let intent = client
        .payments()
        .create_deposit_checkout("booking-1", 150_000)
        .await
        .unwrap();
    assert_eq!(intent.transaction_ref, "TX-10");

    let controller = client.checkout(ProviderProfile::paylink());
    let (flow, sink) = controller.begin(intent, 150_000, "booking-1");
    assert_eq!(flow.session().transaction_ref, "TX-10");
    assert!(!flow.session().is_terminal());

    sink.navigated(&success_url(15_000_000));
    drop(sink);

    assert_eq!(flow.run().await, CheckoutOutcome::Success);

    let requests = mock_server.received_requests().await.unwrap();
    let callback = requests
        .iter()
        .find(|req| req.url.path() == "/payments/paylink/callback")
        .expect("reconciliation request");
    let body: serde_json::Value = serde_json::from_slice(&callback.body).unwrap();
    assert_eq!(body["transactionRef"], "TX-10");
}
