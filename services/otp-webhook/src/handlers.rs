//! Webhook HTTP surface
//!
//! Handlers take the raw body as `Bytes` and authenticate the
//! `x-idp-signature` header against those exact bytes before any JSON
//! parsing. Parsing first and re-serializing would change the signed
//! bytes and break authentic signatures.
//!
//! Response bodies never echo codes or the shared secret; subjects appear
//! in logs but not in error bodies.

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Deserialize;
use serde_json::json;
use tower::limit::ConcurrencyLimitLayer;
use tracing::{info, warn};
use uuid::Uuid;

use common::Secret;
use otp_core::{
    IssueError, LifecycleController, MemoryStore, OtpStore, VerifyOutcome, verify_signature,
};

use crate::metrics::record_request;
use crate::notify::IdpNotifier;

/// Signature header set by the identity provider's action runtime.
pub const SIGNATURE_HEADER: &str = "x-idp-signature";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<LifecycleController<MemoryStore>>,
    pub notifier: Option<Arc<IdpNotifier>>,
    pub webhook_secret: Arc<Secret<String>>,
    pub started_at: Instant,
    pub prometheus: PrometheusHandle,
}

/// Build the service router.
pub fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/otp/send", post(handle_send))
        .route("/otp/verify", post(handle_verify))
        .route("/otp/resend", post(handle_resend))
        .route("/health", get(handle_health))
        .route("/metrics", get(handle_metrics))
        .layer(ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest {
    subject_id: String,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    event: Option<String>,
    #[serde(default)]
    phone_verified: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest {
    subject_id: String,
    #[serde(default)]
    code: Option<String>,
}

/// JSON error body: `{"error":"...","requestId":"req_..."}`.
fn error_body(code: StatusCode, error: &str, req_id: &str) -> Response {
    (
        code,
        axum::Json(json!({ "error": error, "requestId": req_id })),
    )
        .into_response()
}

fn request_id() -> String {
    format!("req_{}", Uuid::new_v4().simple())
}

/// Authenticate the raw body, or produce the 401 response.
fn authenticate(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
    req_id: &str,
) -> Result<(), Response> {
    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if verify_signature(body, provided, state.webhook_secret.expose().as_bytes()) {
        Ok(())
    } else {
        Err(error_body(
            StatusCode::UNAUTHORIZED,
            "invalid_signature",
            req_id,
        ))
    }
}

async fn handle_send(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let req_id = request_id();

    if let Err(resp) = authenticate(&state, &headers, &body, &req_id) {
        warn!(req_id, endpoint = "send", "rejected unsigned or tampered request");
        record_request("send", "invalid_signature", start.elapsed().as_secs_f64());
        return resp;
    }

    let req: SendRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            warn!(req_id, error = %e, "unparseable send payload");
            record_request("send", "missing_fields", start.elapsed().as_secs_f64());
            return error_body(StatusCode::BAD_REQUEST, "missing_fields", &req_id);
        }
    };
    if req.subject_id.trim().is_empty() {
        record_request("send", "missing_fields", start.elapsed().as_secs_f64());
        return error_body(StatusCode::BAD_REQUEST, "missing_fields", &req_id);
    }

    if req.phone_verified == Some(false) {
        // Advisory only: the IdP may send codes to not-yet-verified numbers
        // during enrollment, so this does not block issuance.
        warn!(req_id, subject_id = %req.subject_id, "issuing otp to unverified phone number");
    }

    let result = state
        .controller
        .issue(&req.subject_id, req.phone_number.as_deref(), req.event)
        .await;

    let (outcome, response) = match result {
        Ok(issued) => {
            info!(req_id, subject_id = %req.subject_id, "otp send accepted");
            (
                "accepted",
                (
                    StatusCode::OK,
                    axum::Json(json!({
                        "accepted": true,
                        "requireChallenge": issued.require_challenge,
                    })),
                )
                    .into_response(),
            )
        }
        Err(err) => (err.label(), issue_error_response(&req_id, &err)),
    };

    record_request("send", outcome, start.elapsed().as_secs_f64());
    response
}

async fn handle_verify(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let req_id = request_id();

    if let Err(resp) = authenticate(&state, &headers, &body, &req_id) {
        warn!(req_id, endpoint = "verify", "rejected unsigned or tampered request");
        record_request("verify", "invalid_signature", start.elapsed().as_secs_f64());
        return resp;
    }

    let req: VerifyRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            warn!(req_id, error = %e, "unparseable verify payload");
            record_request("verify", "missing_fields", start.elapsed().as_secs_f64());
            return error_body(StatusCode::BAD_REQUEST, "missing_fields", &req_id);
        }
    };
    if req.subject_id.trim().is_empty() {
        record_request("verify", "missing_fields", start.elapsed().as_secs_f64());
        return error_body(StatusCode::BAD_REQUEST, "missing_fields", &req_id);
    }

    let outcome = state
        .controller
        .verify(&req.subject_id, req.code.as_deref())
        .await;

    if outcome == VerifyOutcome::Verified {
        if let Some(notifier) = &state.notifier {
            let notifier = notifier.clone();
            let subject = req.subject_id.clone();
            // Fire-and-forget: the user is verified regardless of whether
            // the callback lands.
            tokio::spawn(async move {
                notifier.notify_verified(&subject).await;
            });
        }
    }

    let response = match &outcome {
        VerifyOutcome::Verified => {
            info!(req_id, subject_id = %req.subject_id, "otp verified");
            (StatusCode::OK, axum::Json(json!({ "verified": true }))).into_response()
        }
        VerifyOutcome::AwaitInput { attempts } => (
            StatusCode::OK,
            axum::Json(json!({
                "verified": false,
                "awaitInput": true,
                "attempts": attempts,
            })),
        )
            .into_response(),
        VerifyOutcome::InvalidCode { remaining } => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "invalid_code",
                "remainingAttempts": remaining,
                "requestId": req_id,
            })),
        )
            .into_response(),
        VerifyOutcome::Expired => error_body(StatusCode::BAD_REQUEST, "expired", &req_id),
        VerifyOutcome::TooManyAttempts => {
            error_body(StatusCode::BAD_REQUEST, "too_many_attempts", &req_id)
        }
        VerifyOutcome::NotFound => error_body(StatusCode::NOT_FOUND, "no_code_found", &req_id),
    };

    record_request("verify", outcome.label(), start.elapsed().as_secs_f64());
    response
}

async fn handle_resend(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let req_id = request_id();

    if let Err(resp) = authenticate(&state, &headers, &body, &req_id) {
        warn!(req_id, endpoint = "resend", "rejected unsigned or tampered request");
        record_request("resend", "invalid_signature", start.elapsed().as_secs_f64());
        return resp;
    }

    let req: SendRequest = match serde_json::from_slice(&body) {
        Ok(req) => req,
        Err(e) => {
            warn!(req_id, error = %e, "unparseable resend payload");
            record_request("resend", "missing_fields", start.elapsed().as_secs_f64());
            return error_body(StatusCode::BAD_REQUEST, "missing_fields", &req_id);
        }
    };
    if req.subject_id.trim().is_empty() {
        record_request("resend", "missing_fields", start.elapsed().as_secs_f64());
        return error_body(StatusCode::BAD_REQUEST, "missing_fields", &req_id);
    }

    let result = state
        .controller
        .resend(&req.subject_id, req.phone_number.as_deref(), req.event)
        .await;

    let (outcome, response) = match result {
        Ok(issued) => {
            info!(req_id, subject_id = %req.subject_id, "otp resend accepted");
            (
                "accepted",
                (
                    StatusCode::OK,
                    axum::Json(json!({
                        "accepted": true,
                        "requireChallenge": issued.require_challenge,
                    })),
                )
                    .into_response(),
            )
        }
        Err(err) => (err.label(), issue_error_response(&req_id, &err)),
    };

    record_request("resend", outcome, start.elapsed().as_secs_f64());
    response
}

fn issue_error_response(req_id: &str, err: &IssueError) -> Response {
    match err {
        // Absent phone is a missing required field to the caller; the
        // distinction survives in logs and metrics only
        IssueError::PhoneMissing => error_body(StatusCode::BAD_REQUEST, "missing_fields", req_id),
        IssueError::AlreadySent => {
            error_body(StatusCode::TOO_MANY_REQUESTS, "otp_already_sent", req_id)
        }
        IssueError::Throttled { retry_after_secs } => (
            StatusCode::TOO_MANY_REQUESTS,
            axum::Json(json!({
                "error": "throttled",
                "retryAfterSeconds": retry_after_secs,
                "requestId": req_id,
            })),
        )
            .into_response(),
        IssueError::SendRejected(detail) => {
            warn!(req_id, detail, "sms gateway rejected delivery");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "send_failed", req_id)
        }
        IssueError::SendFailed(detail) => {
            warn!(req_id, detail, "sms delivery transport failure");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, "send_error", req_id)
        }
    }
}

async fn handle_health(State(state): State<AppState>) -> Response {
    let pending = state.controller.store().pending_count().await;
    (
        StatusCode::OK,
        axum::Json(json!({
            "status": "ok",
            "uptimeSeconds": state.started_at.elapsed().as_secs(),
            "pendingOtpCount": pending,
        })),
    )
        .into_response()
}

async fn handle_metrics(State(state): State<AppState>) -> String {
    state.prometheus.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use otp_core::{OtpPolicy, sign};
    use sms_delivery::{DeliveryError, DeliveryReceipt, SmsSender};
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    const SECRET: &str = "test-webhook-secret";

    /// In-memory sender; flips to failure mode on demand.
    #[derive(Default)]
    struct StubSender {
        reject: AtomicBool,
    }

    impl SmsSender for StubSender {
        fn id(&self) -> &str {
            "stub"
        }

        fn send<'a>(
            &'a self,
            _phone: &'a str,
            _message: &'a str,
        ) -> Pin<Box<dyn Future<Output = sms_delivery::Result<DeliveryReceipt>> + Send + 'a>>
        {
            Box::pin(async move {
                if self.reject.load(Ordering::SeqCst) {
                    return Err(DeliveryError::Provider {
                        status: 411,
                        detail: "receptor is invalid".into(),
                    });
                }
                Ok(DeliveryReceipt {
                    message_id: Some("8792343".to_owned()),
                })
            })
        }
    }

    fn test_state(sender: Arc<StubSender>, notifier: Option<Arc<IdpNotifier>>) -> AppState {
        let store = Arc::new(MemoryStore::new());
        let controller = Arc::new(LifecycleController::new(
            store,
            sender,
            OtpPolicy::default(),
        ));
        AppState {
            controller,
            notifier,
            webhook_secret: Arc::new(Secret::new(SECRET.to_owned())),
            started_at: Instant::now(),
            prometheus: PrometheusBuilder::new().build_recorder().handle(),
        }
    }

    fn router(state: AppState) -> Router {
        build_router(state, 1024)
    }

    async fn call(
        app: &Router,
        path: &str,
        body: &str,
        signature: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json");
        if let Some(sig) = signature {
            builder = builder.header(SIGNATURE_HEADER, sig);
        }
        let request = builder.body(Body::from(body.to_owned())).unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn call_signed(app: &Router, path: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let signature = sign(body.as_bytes(), SECRET.as_bytes());
        call(app, path, body, Some(&signature)).await
    }

    fn send_body(subject: &str) -> String {
        format!(r#"{{"subjectId":"{subject}","phoneNumber":"+989123456789","event":"login_otp"}}"#)
    }

    #[tokio::test]
    async fn send_without_signature_is_unauthorized() {
        let app = router(test_state(Arc::new(StubSender::default()), None));
        let (status, body) = call(&app, "/otp/send", &send_body("u1"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "invalid_signature");
        // Error bodies carry a request id for log correlation
        assert!(
            body["requestId"].as_str().unwrap().starts_with("req_"),
            "got: {body}"
        );
    }

    #[tokio::test]
    async fn send_with_tampered_signature_is_unauthorized() {
        let state = test_state(Arc::new(StubSender::default()), None);
        let app = router(state.clone());
        let body = send_body("u1");
        let mut signature = sign(body.as_bytes(), SECRET.as_bytes());
        signature.replace_range(0..1, if &signature[0..1] == "0" { "1" } else { "0" });

        let (status, _) = call(&app, "/otp/send", &body, Some(&signature)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        // Nothing was stored for the subject
        assert!(state.controller.store().get("u1").await.is_none());
    }

    #[tokio::test]
    async fn signature_is_checked_against_raw_bytes() {
        let app = router(test_state(Arc::new(StubSender::default()), None));
        // Signature of the compact form must not authenticate a re-spaced
        // body, even though both parse to the same JSON value.
        let compact = r#"{"subjectId":"u1","phoneNumber":"+989123456789"}"#;
        let spaced = r#"{ "subjectId": "u1", "phoneNumber": "+989123456789" }"#;
        let signature = sign(compact.as_bytes(), SECRET.as_bytes());

        let (status, _) = call(&app, "/otp/send", spaced, Some(&signature)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn signed_send_issues_and_stores_a_code() {
        let state = test_state(Arc::new(StubSender::default()), None);
        let app = router(state.clone());

        let (status, body) = call_signed(&app, "/otp/send", &send_body("u1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["accepted"], true);
        assert_eq!(body["requireChallenge"], true);
        // The code itself never appears in the response
        assert!(body.get("code").is_none());

        let rec = state.controller.store().get("u1").await.unwrap();
        assert_eq!(rec.code.len(), 6);
        assert_eq!(rec.phone_number, "989123456789");
    }

    #[tokio::test]
    async fn unparseable_payload_is_bad_request() {
        let app = router(test_state(Arc::new(StubSender::default()), None));
        let (status, body) = call_signed(&app, "/otp/send", "not json at all").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing_fields");
    }

    #[tokio::test]
    async fn missing_subject_is_bad_request() {
        let app = router(test_state(Arc::new(StubSender::default()), None));
        let (status, body) =
            call_signed(&app, "/otp/send", r#"{"subjectId":"  "}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing_fields");
    }

    #[tokio::test]
    async fn missing_phone_is_a_missing_fields_rejection() {
        let app = router(test_state(Arc::new(StubSender::default()), None));
        let (status, body) = call_signed(&app, "/otp/send", r#"{"subjectId":"u1"}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing_fields");
    }

    #[tokio::test]
    async fn duplicate_send_is_throttled() {
        let app = router(test_state(Arc::new(StubSender::default()), None));
        let body = send_body("u1");

        let (status, _) = call_signed(&app, "/otp/send", &body).await;
        assert_eq!(status, StatusCode::OK);
        let (status, json) = call_signed(&app, "/otp/send", &body).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["error"], "otp_already_sent");
    }

    #[tokio::test]
    async fn gateway_rejection_is_internal_error() {
        let sender = Arc::new(StubSender::default());
        sender.reject.store(true, Ordering::SeqCst);
        let state = test_state(sender, None);
        let app = router(state.clone());

        let (status, body) = call_signed(&app, "/otp/send", &send_body("u1")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "send_failed");
        // Rolled back: no verifiable record remains
        assert!(state.controller.store().get("u1").await.is_none());
    }

    #[tokio::test]
    async fn correct_code_verifies() {
        let state = test_state(Arc::new(StubSender::default()), None);
        let app = router(state.clone());

        call_signed(&app, "/otp/send", &send_body("u1")).await;
        let code = state.controller.store().get("u1").await.unwrap().code;

        let body = format!(r#"{{"subjectId":"u1","code":"{code}"}}"#);
        let (status, json) = call_signed(&app, "/otp/verify", &body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["verified"], true);

        // Consumed: a replay of the same code finds nothing
        let (status, json) = call_signed(&app, "/otp/verify", &body).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "no_code_found");
    }

    #[tokio::test]
    async fn wrong_code_reports_remaining_attempts() {
        let state = test_state(Arc::new(StubSender::default()), None);
        let app = router(state.clone());

        call_signed(&app, "/otp/send", &send_body("u1")).await;
        let code = state.controller.store().get("u1").await.unwrap().code;
        let wrong = if code == "999998" { "999997" } else { "999998" };

        let body = format!(r#"{{"subjectId":"u1","code":"{wrong}"}}"#);
        let (status, json) = call_signed(&app, "/otp/verify", &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_code");
        assert_eq!(json["remainingAttempts"], 2);
    }

    #[tokio::test]
    async fn verify_without_record_is_not_found() {
        let app = router(test_state(Arc::new(StubSender::default()), None));
        let (status, json) =
            call_signed(&app, "/otp/verify", r#"{"subjectId":"ghost","code":"123456"}"#).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "no_code_found");
    }

    #[tokio::test]
    async fn polling_verify_awaits_input() {
        let app = router(test_state(Arc::new(StubSender::default()), None));
        call_signed(&app, "/otp/send", &send_body("u1")).await;

        let (status, json) =
            call_signed(&app, "/otp/verify", r#"{"subjectId":"u1"}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["verified"], false);
        assert_eq!(json["awaitInput"], true);
        assert_eq!(json["attempts"], 1);
    }

    #[tokio::test]
    async fn resend_within_cooldown_reports_wait() {
        let app = router(test_state(Arc::new(StubSender::default()), None));
        let body = send_body("u1");

        call_signed(&app, "/otp/send", &body).await;
        let (status, json) = call_signed(&app, "/otp/resend", &body).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(json["error"], "throttled");
        let wait = json["retryAfterSeconds"].as_u64().unwrap();
        assert!(wait > 0 && wait <= 60, "unexpected wait: {wait}");
    }

    #[tokio::test]
    async fn resend_without_record_issues_fresh() {
        let state = test_state(Arc::new(StubSender::default()), None);
        let app = router(state.clone());

        let (status, json) = call_signed(&app, "/otp/resend", &send_body("u1")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["accepted"], true);
        assert!(state.controller.store().get("u1").await.is_some());
    }

    #[tokio::test]
    async fn verified_subject_is_pushed_to_the_idp() {
        use axum::extract::Path;
        use tokio::net::TcpListener;
        use tokio::sync::mpsc;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let idp_app = Router::new().route(
            "/management/v1/users/{user_id}/otp/verify",
            post(move |Path(user_id): Path<String>| {
                let tx = tx.clone();
                async move {
                    let _ = tx.send(user_id);
                    StatusCode::OK
                }
            }),
        );
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, idp_app).await.unwrap();
        });

        let token = Secret::new("idp-token".to_owned());
        let notifier = Arc::new(
            IdpNotifier::new(
                &format!("http://{addr}"),
                &token,
                std::time::Duration::from_secs(5),
            )
            .unwrap(),
        );

        let state = test_state(Arc::new(StubSender::default()), Some(notifier));
        let app = router(state.clone());

        call_signed(&app, "/otp/send", &send_body("u1")).await;
        let code = state.controller.store().get("u1").await.unwrap().code;
        let body = format!(r#"{{"subjectId":"u1","code":"{code}"}}"#);
        let (status, _) = call_signed(&app, "/otp/verify", &body).await;
        assert_eq!(status, StatusCode::OK);

        // The callback runs in a spawned task; wait for it to land
        let notified = tokio::time::timeout(std::time::Duration::from_secs(5), rx.recv())
            .await
            .expect("idp callback never arrived")
            .unwrap();
        assert_eq!(notified, "u1");
    }

    #[tokio::test]
    async fn health_reports_pending_count_without_secrets() {
        let state = test_state(Arc::new(StubSender::default()), None);
        let app = router(state.clone());

        call_signed(&app, "/otp/send", &send_body("u1")).await;

        let request = Request::builder()
            .method("GET")
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["pendingOtpCount"], 1);
        let rendered = json.to_string();
        assert!(!rendered.contains(SECRET));
        let code = state.controller.store().get("u1").await.unwrap().code;
        assert!(!rendered.contains(&code));
    }

    #[tokio::test]
    async fn metrics_endpoint_renders_prometheus_text() {
        let app = router(test_state(Arc::new(StubSender::default()), None));
        let request = Request::builder()
            .method("GET")
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
