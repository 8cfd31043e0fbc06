// crates/checkout-capture-server/src/server.rs
// ============================================================================
// Module: Capture HTTP Server
// Description: HTTP endpoints for capture, order hooks, export, and purge.
// Purpose: Expose the capture pipeline over a small JSON surface.
// Dependencies: axum, tokio, checkout-capture-core, checkout-capture-export
// ============================================================================

//! ## Overview
//! The server exposes five endpoints:
//! - `GET /capture/bootstrap` issues a capture token for the caller's identity
//!   together with the client debounce interval.
//! - `POST /capture/field` appends one sanitized field observation.
//! - `POST /hooks/order-completed` appends one order snapshot.
//! - `POST /admin/export` renders the consolidated spreadsheet download.
//! - `POST /admin/purge` deletes all capture records.
//!
//! All responses use the `{"success": bool, "data": ...}` envelope. Inputs
//! are untrusted: bodies are size-checked before parsing, tokens are verified
//! before any store access, and field content is sanitized before it is
//! persisted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use axum::Router;
use axum::body::Bytes;
use axum::extract::Query;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::http::StatusCode;
use axum::http::header::CONTENT_DISPOSITION;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use axum::routing::get;
use axum::routing::post;
use checkout_capture_config::CaptureConfig;
use checkout_capture_config::ExportConfig;
use checkout_capture_config::StoreBackend;
use checkout_capture_core::CaptureStore;
use checkout_capture_core::FieldObservation;
use checkout_capture_core::Identity;
use checkout_capture_core::InMemoryCaptureStore;
use checkout_capture_core::LineItem;
use checkout_capture_core::NewCaptureRecord;
use checkout_capture_core::OrderSnapshot;
use checkout_capture_core::SharedCaptureStore;
use checkout_capture_core::StoreError;
use checkout_capture_core::Timestamp;
use checkout_capture_core::sanitize_field_name;
use checkout_capture_core::sanitize_field_value;
use checkout_capture_export::ExportArtifact;
use checkout_capture_export::ExportError;
use checkout_capture_export::export_records;
use checkout_capture_store_sqlite::SqliteCaptureStore;
use serde::Deserialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;

use crate::audit::AuditSink;
use crate::audit::CaptureAuditEvent;
use crate::audit::StderrAuditSink;
use crate::auth::AuthError;
use crate::auth::TokenKeys;
use crate::auth::TokenScope;
use crate::auth::token_fingerprint;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Client-side debounce interval advertised by the bootstrap endpoint (ms).
pub const DEBOUNCE_INTERVAL_MS: u64 = 500;
/// Header carrying the authenticated user id, set by the storefront runtime.
const USER_ID_HEADER: &str = "x-checkout-user-id";
/// Fixed session key for export-scope token derivation. Admin tokens are not
/// session-bound; operators obtain them out of band (the CLI `token`
/// command derives one from the configured export secret).
pub const ADMIN_SESSION_KEY: &str = "admin";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Capture server lifecycle errors.
#[derive(Debug, Error)]
pub enum CaptureServerError {
    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization failure.
    #[error("init error: {0}")]
    Init(String),
    /// Transport failure.
    #[error("transport error: {0}")]
    Transport(String),
}

/// Per-request processing errors with HTTP status mappings.
#[derive(Debug, Error)]
enum RequestError {
    /// Token verification failed (401).
    #[error(transparent)]
    Auth(#[from] AuthError),
    /// Malformed or invalid request data (400).
    #[error("invalid request: {0}")]
    Invalid(String),
    /// No capture data available for export (409).
    #[error("no capture data available")]
    NoData,
    /// Store or rendering failure (500).
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<StoreError> for RequestError {
    fn from(err: StoreError) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<ExportError> for RequestError {
    fn from(err: ExportError) -> Self {
        match err {
            ExportError::NoData => Self::NoData,
            ExportError::Render(message) | ExportError::Io(message) => Self::Storage(message),
        }
    }
}

impl RequestError {
    /// Returns the HTTP status code for the error.
    const fn status(&self) -> StatusCode {
        match self {
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::Invalid(_) => StatusCode::BAD_REQUEST,
            Self::NoData => StatusCode::CONFLICT,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ============================================================================
// SECTION: Capture Server
// ============================================================================

/// Capture server instance.
pub struct CaptureServer {
    /// Bind address for the HTTP listener.
    bind: String,
    /// Shared request state.
    state: Arc<ServerState>,
}

impl CaptureServer {
    /// Builds a capture server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureServerError`] when configuration is invalid or the
    /// store cannot be opened.
    pub fn from_config(config: CaptureConfig) -> Result<Self, CaptureServerError> {
        config.validate().map_err(|err| CaptureServerError::Config(err.to_string()))?;
        let store = build_capture_store(&config)?;
        let state = Arc::new(ServerState {
            store,
            keys: TokenKeys::from_config(&config.server.auth),
            audit: Arc::new(StderrAuditSink),
            export: config.export.clone(),
            max_body_bytes: config.server.max_body_bytes,
        });
        Ok(Self {
            bind: config.server.bind,
            state,
        })
    }

    /// Serves HTTP requests until the listener fails.
    ///
    /// # Errors
    ///
    /// Returns [`CaptureServerError`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), CaptureServerError> {
        let addr: SocketAddr = self
            .bind
            .parse()
            .map_err(|_| CaptureServerError::Config("invalid bind address".to_string()))?;
        let app = router(self.state);
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|_| CaptureServerError::Transport("http bind failed".to_string()))?;
        axum::serve(listener, app)
            .await
            .map_err(|_| CaptureServerError::Transport("http server failed".to_string()))
    }
}

/// Builds the capture store from configuration.
///
/// # Errors
///
/// Returns [`CaptureServerError`] when the sqlite store cannot be opened.
pub fn build_capture_store(
    config: &CaptureConfig,
) -> Result<SharedCaptureStore, CaptureServerError> {
    let store = match config.store.backend {
        StoreBackend::Memory => SharedCaptureStore::from_store(InMemoryCaptureStore::new()),
        StoreBackend::Sqlite => {
            let sqlite_config = config
                .store
                .to_sqlite_config()
                .map_err(|err| CaptureServerError::Config(err.to_string()))?;
            let store = SqliteCaptureStore::new(&sqlite_config)
                .map_err(|err| CaptureServerError::Init(err.to_string()))?;
            SharedCaptureStore::from_store(store)
        }
    };
    Ok(store)
}

/// Shared state behind all HTTP handlers.
struct ServerState {
    /// Capture record store.
    store: SharedCaptureStore,
    /// Token derivation keys.
    keys: TokenKeys,
    /// Audit sink for endpoint decisions.
    audit: Arc<dyn AuditSink>,
    /// Export settings (filename, worksheet).
    export: ExportConfig,
    /// Maximum allowed request body size.
    max_body_bytes: usize,
}

/// Builds the HTTP router over the shared state.
fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/capture/bootstrap", get(bootstrap_http))
        .route("/capture/field", post(field_http))
        .route("/hooks/order-completed", post(order_http))
        .route("/admin/export", post(export_http))
        .route("/admin/purge", post(purge_http))
        .with_state(state)
}

// ============================================================================
// SECTION: Wire Types
// ============================================================================

/// Query parameters for the bootstrap endpoint.
#[derive(Debug, Deserialize)]
struct BootstrapQuery {
    /// Anonymous session identifier for guests.
    #[serde(default)]
    session_id: Option<String>,
}

/// Field capture request body.
#[derive(Debug, Deserialize)]
struct FieldCaptureRequest {
    /// Capture-scope token.
    token: String,
    /// Anonymous session identifier for guests.
    #[serde(default)]
    session_id: Option<String>,
    /// Raw field name from the checkout form.
    field_name: String,
    /// Raw field value from the checkout form.
    field_value: String,
}

/// Line item inside an order completion payload.
#[derive(Debug, Deserialize)]
struct OrderLineItemRequest {
    /// Product name.
    name: String,
    /// Purchased quantity.
    quantity: u32,
    /// Stock keeping unit.
    #[serde(default)]
    sku: String,
    /// Unit price as currency text.
    price: String,
}

/// Order completion hook request body.
#[derive(Debug, Deserialize)]
struct OrderCompletedRequest {
    /// Capture-scope token bound to the order identity.
    token: String,
    /// Finalized order identifier.
    order_id: u64,
    /// Billing first name.
    billing_first_name: String,
    /// Billing last name.
    billing_last_name: String,
    /// Billing email address.
    billing_email: String,
    /// Billing phone number.
    billing_phone: String,
    /// Billing address line.
    billing_address: String,
    /// Shipping address line.
    shipping_address: String,
    /// Order total as currency text.
    order_total: String,
    /// Purchased line items.
    line_items: Vec<OrderLineItemRequest>,
}

/// Admin request body for export and purge.
#[derive(Debug, Deserialize)]
struct AdminRequest {
    /// Export-scope token.
    token: String,
}

// ============================================================================
// SECTION: HTTP Handlers
// ============================================================================

/// Handles `GET /capture/bootstrap`.
async fn bootstrap_http(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Query(query): Query<BootstrapQuery>,
) -> Response {
    let identity = resolve_identity(&headers, query.session_id.as_deref())
        .ok()
        .map(|identity| identity.wire());
    let result = process_bootstrap(&state, &headers, query.session_id.as_deref());
    respond("bootstrap", &state, identity, None, result)
}

/// Handles `POST /capture/field`.
async fn field_http(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    bytes: Bytes,
) -> Response {
    let parsed = parse_body::<FieldCaptureRequest>(&state, &bytes);
    let fingerprint = parsed.as_ref().ok().map(|request| token_fingerprint(&request.token));
    let identity = parsed
        .as_ref()
        .ok()
        .and_then(|request| resolve_identity(&headers, request.session_id.as_deref()).ok())
        .map(|identity| identity.wire());
    let result = parsed.and_then(|request| process_field_capture(&state, &headers, &request));
    respond("capture_field", &state, identity, fingerprint, result)
}

/// Handles `POST /hooks/order-completed`.
async fn order_http(State(state): State<Arc<ServerState>>, bytes: Bytes) -> Response {
    let parsed = parse_body::<OrderCompletedRequest>(&state, &bytes);
    let fingerprint = parsed.as_ref().ok().map(|request| token_fingerprint(&request.token));
    let identity = parsed
        .as_ref()
        .ok()
        .and_then(|request| Identity::order(request.order_id))
        .map(|identity| identity.wire());
    let result = parsed.and_then(|request| process_order_completed(&state, &request));
    respond("order_completed", &state, identity, fingerprint, result)
}

/// Handles `POST /admin/export`.
async fn export_http(State(state): State<Arc<ServerState>>, bytes: Bytes) -> Response {
    let parsed = parse_body::<AdminRequest>(&state, &bytes);
    let fingerprint = parsed.as_ref().ok().map(|request| token_fingerprint(&request.token));
    let result = parsed.and_then(|request| process_export(&state, &request));
    match result {
        Ok(artifact) => {
            state.audit.record(&CaptureAuditEvent::allowed("export", None, fingerprint));
            artifact_response(&artifact)
        }
        Err(err) => {
            state
                .audit
                .record(&CaptureAuditEvent::denied("export", None, fingerprint, &err.to_string()));
            error_response(&err)
        }
    }
}

/// Handles `POST /admin/purge`.
async fn purge_http(State(state): State<Arc<ServerState>>, bytes: Bytes) -> Response {
    let parsed = parse_body::<AdminRequest>(&state, &bytes);
    let fingerprint = parsed.as_ref().ok().map(|request| token_fingerprint(&request.token));
    let result = parsed.and_then(|request| process_purge(&state, &request));
    respond("purge", &state, None, fingerprint, result)
}

// ============================================================================
// SECTION: Request Processing
// ============================================================================

/// Issues a capture token for the resolved identity.
fn process_bootstrap(
    state: &ServerState,
    headers: &HeaderMap,
    session_id: Option<&str>,
) -> Result<Value, RequestError> {
    let identity = resolve_identity(headers, session_id)?;
    let token = state.keys.derive(TokenScope::Capture, &identity.wire());
    Ok(json!({
        "capture_token": token,
        "debounce_ms": DEBOUNCE_INTERVAL_MS,
    }))
}

/// Verifies, sanitizes, and appends one field observation.
fn process_field_capture(
    state: &ServerState,
    headers: &HeaderMap,
    request: &FieldCaptureRequest,
) -> Result<Value, RequestError> {
    let identity = resolve_identity(headers, request.session_id.as_deref())?;
    state.keys.verify(TokenScope::Capture, &identity.wire(), &request.token)?;
    let name = sanitize_field_name(&request.field_name)
        .map_err(|err| RequestError::Invalid(err.to_string()))?;
    let value = sanitize_field_value(&request.field_value);
    let record = NewCaptureRecord::field(
        identity,
        FieldObservation {
            name,
            value,
        },
        now_timestamp(),
    );
    let record_id = state.store.append(record)?;
    Ok(json!({ "record_id": record_id }))
}

/// Verifies and appends one order completion snapshot.
fn process_order_completed(
    state: &ServerState,
    request: &OrderCompletedRequest,
) -> Result<Value, RequestError> {
    let identity = Identity::order(request.order_id)
        .ok_or_else(|| RequestError::Invalid("order_id must be non-zero".to_string()))?;
    state.keys.verify(TokenScope::Capture, &identity.wire(), &request.token)?;
    let snapshot = OrderSnapshot {
        billing_first_name: sanitize_field_value(&request.billing_first_name),
        billing_last_name: sanitize_field_value(&request.billing_last_name),
        billing_email: sanitize_field_value(&request.billing_email),
        billing_phone: sanitize_field_value(&request.billing_phone),
        billing_address: sanitize_field_value(&request.billing_address),
        shipping_address: sanitize_field_value(&request.shipping_address),
        order_total: sanitize_field_value(&request.order_total),
        line_items: request.line_items.iter().map(sanitize_line_item).collect(),
    };
    let record = NewCaptureRecord::order(identity, snapshot, now_timestamp());
    let record_id = state.store.append(record)?;
    Ok(json!({ "record_id": record_id }))
}

/// Verifies the export token and renders the download artifact.
fn process_export(
    state: &ServerState,
    request: &AdminRequest,
) -> Result<ExportArtifact, RequestError> {
    state.keys.verify(TokenScope::Export, ADMIN_SESSION_KEY, &request.token)?;
    let records = state.store.load_all()?;
    let artifact =
        export_records(&records, &state.export.worksheet, &state.export.filename)?;
    Ok(artifact)
}

/// Verifies the export token and purges all records.
fn process_purge(state: &ServerState, request: &AdminRequest) -> Result<Value, RequestError> {
    state.keys.verify(TokenScope::Export, ADMIN_SESSION_KEY, &request.token)?;
    let purged = state.store.purge()?;
    Ok(json!({ "purged": purged }))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the caller identity: authenticated user header first, anonymous
/// session id otherwise.
fn resolve_identity(
    headers: &HeaderMap,
    session_id: Option<&str>,
) -> Result<Identity, RequestError> {
    if let Some(raw) = headers.get(USER_ID_HEADER) {
        let text = raw
            .to_str()
            .map_err(|_| RequestError::Invalid("user id header is not ascii".to_string()))?;
        let parsed: u64 = text
            .trim()
            .parse()
            .map_err(|_| RequestError::Invalid("user id header is not a number".to_string()))?;
        return Identity::user(parsed)
            .ok_or_else(|| RequestError::Invalid("user id must be non-zero".to_string()));
    }
    let session = session_id
        .ok_or_else(|| RequestError::Invalid("missing session_id for guest capture".to_string()))?;
    Identity::session(session).map_err(|err| RequestError::Invalid(err.to_string()))
}

/// Sanitizes one incoming line item.
fn sanitize_line_item(item: &OrderLineItemRequest) -> LineItem {
    LineItem {
        name: sanitize_field_value(&item.name),
        quantity: item.quantity,
        sku: sanitize_field_value(&item.sku),
        price: sanitize_field_value(&item.price),
    }
}

/// Size-checks and parses a JSON request body.
fn parse_body<T: serde::de::DeserializeOwned>(
    state: &ServerState,
    bytes: &Bytes,
) -> Result<T, RequestError> {
    if bytes.len() > state.max_body_bytes {
        return Err(RequestError::Invalid("request body too large".to_string()));
    }
    serde_json::from_slice(bytes).map_err(|err| RequestError::Invalid(err.to_string()))
}

/// Returns the current wall-clock capture timestamp.
fn now_timestamp() -> Timestamp {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX));
    Timestamp::from_unix_millis(millis)
}

/// Builds the envelope response for a processing result and audits it.
fn respond(
    operation: &'static str,
    state: &ServerState,
    identity: Option<String>,
    token_fingerprint: Option<String>,
    result: Result<Value, RequestError>,
) -> Response {
    match result {
        Ok(data) => {
            state
                .audit
                .record(&CaptureAuditEvent::allowed(operation, identity, token_fingerprint));
            (StatusCode::OK, axum::Json(json!({ "success": true, "data": data }))).into_response()
        }
        Err(err) => {
            state.audit.record(&CaptureAuditEvent::denied(
                operation,
                identity,
                token_fingerprint,
                &err.to_string(),
            ));
            error_response(&err)
        }
    }
}

/// Builds the error envelope response for a request error.
fn error_response(err: &RequestError) -> Response {
    (
        err.status(),
        axum::Json(json!({ "success": false, "data": err.to_string() })),
    )
        .into_response()
}

/// Builds the spreadsheet download response.
fn artifact_response(artifact: &ExportArtifact) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", artifact.filename);
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, artifact.content_type.to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        artifact.bytes.clone(),
    )
        .into_response()
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only assertions."
    )]

    use std::sync::Arc;

    use axum::http::HeaderMap;
    use checkout_capture_config::AuthConfig;
    use checkout_capture_config::ExportConfig;
    use checkout_capture_core::CapturePayload;
    use checkout_capture_core::CaptureStore;
    use checkout_capture_core::InMemoryCaptureStore;
    use checkout_capture_core::SharedCaptureStore;

    use super::ADMIN_SESSION_KEY;
    use super::AdminRequest;
    use super::FieldCaptureRequest;
    use super::OrderCompletedRequest;
    use super::OrderLineItemRequest;
    use super::RequestError;
    use super::ServerState;
    use super::TokenKeys;
    use super::TokenScope;
    use super::process_bootstrap;
    use super::process_export;
    use super::process_field_capture;
    use super::process_order_completed;
    use super::process_purge;
    use crate::audit::NoopAuditSink;

    fn test_state() -> ServerState {
        ServerState {
            store: SharedCaptureStore::from_store(InMemoryCaptureStore::new()),
            keys: TokenKeys::from_config(&AuthConfig {
                capture_secret: "capture-secret-0123456789".to_string(),
                export_secret: "export-secret-0123456789".to_string(),
            }),
            audit: Arc::new(NoopAuditSink),
            export: ExportConfig::default(),
            max_body_bytes: 64 * 1024,
        }
    }

    fn guest_headers() -> HeaderMap {
        HeaderMap::new()
    }

    fn user_headers(id: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-checkout-user-id", id.parse().expect("header value"));
        headers
    }

    fn capture_token(state: &ServerState, session_key: &str) -> String {
        state.keys.derive(TokenScope::Capture, session_key)
    }

    fn export_token(state: &ServerState) -> String {
        state.keys.derive(TokenScope::Export, "admin")
    }

    fn field_request(state: &ServerState, session: &str, name: &str, value: &str) -> FieldCaptureRequest {
        FieldCaptureRequest {
            token: capture_token(state, &format!("session:{session}")),
            session_id: Some(session.to_string()),
            field_name: name.to_string(),
            field_value: value.to_string(),
        }
    }

    fn order_request(state: &ServerState, order_id: u64) -> OrderCompletedRequest {
        OrderCompletedRequest {
            token: capture_token(state, &format!("order:{order_id}")),
            order_id,
            billing_first_name: "Ada".to_string(),
            billing_last_name: "Lovelace".to_string(),
            billing_email: "ada@example.com".to_string(),
            billing_phone: "555-0100".to_string(),
            billing_address: "1 Analytical Way".to_string(),
            shipping_address: "2 Engine Row".to_string(),
            order_total: "19.99".to_string(),
            line_items: vec![OrderLineItemRequest {
                name: "Widget".to_string(),
                quantity: 2,
                sku: "W-100".to_string(),
                price: "9.99".to_string(),
            }],
        }
    }

    #[test]
    fn bootstrap_issues_verifiable_capture_token() {
        let state = test_state();
        let data =
            process_bootstrap(&state, &guest_headers(), Some("abc123")).expect("bootstrap");
        let token = data["capture_token"].as_str().expect("token");
        state.keys.verify(TokenScope::Capture, "session:abc123", token).expect("verify");
        assert_eq!(data["debounce_ms"], 500);
    }

    #[test]
    fn bootstrap_without_identity_is_rejected() {
        let state = test_state();
        let result = process_bootstrap(&state, &guest_headers(), None);
        assert!(matches!(result, Err(RequestError::Invalid(_))));
    }

    #[test]
    fn field_capture_stores_sanitized_record() {
        let state = test_state();
        let request = field_request(&state, "s1", "billing_email", "<b>a@example.com</b>");
        process_field_capture(&state, &guest_headers(), &request).expect("capture");
        let records = state.store.load_all().expect("load");
        assert_eq!(records.len(), 1);
        match &records[0].payload {
            CapturePayload::Field(observation) => {
                assert_eq!(observation.value, "a@example.com");
            }
            CapturePayload::Order(_) => panic!("expected field payload"),
        }
    }

    #[test]
    fn user_header_takes_precedence_over_session_id() {
        let state = test_state();
        let request = FieldCaptureRequest {
            token: capture_token(&state, "user:42"),
            session_id: Some("ignored".to_string()),
            field_name: "city".to_string(),
            field_value: "Lyon".to_string(),
        };
        process_field_capture(&state, &user_headers("42"), &request).expect("capture");
        let records = state.store.load_all().expect("load");
        assert_eq!(records[0].identity.wire(), "user:42");
    }

    #[test]
    fn wrong_token_is_rejected_without_storing() {
        let state = test_state();
        let mut request = field_request(&state, "s1", "city", "Lyon");
        request.token = "forged".to_string();
        let result = process_field_capture(&state, &guest_headers(), &request);
        assert!(matches!(result, Err(RequestError::Auth(_))));
        assert!(state.store.load_all().expect("load").is_empty());
    }

    #[test]
    fn token_bound_to_other_session_is_rejected() {
        let state = test_state();
        let mut request = field_request(&state, "s1", "city", "Lyon");
        request.token = capture_token(&state, "session:other");
        assert!(process_field_capture(&state, &guest_headers(), &request).is_err());
    }

    #[test]
    fn empty_field_name_is_rejected() {
        let state = test_state();
        let request = field_request(&state, "s1", "  <i></i>  ", "value");
        let result = process_field_capture(&state, &guest_headers(), &request);
        assert!(matches!(result, Err(RequestError::Invalid(_))));
    }

    #[test]
    fn order_completion_stores_snapshot() {
        let state = test_state();
        let request = order_request(&state, 7);
        process_order_completed(&state, &request).expect("order");
        let records = state.store.load_all().expect("load");
        assert_eq!(records[0].identity.wire(), "order:7");
        match &records[0].payload {
            CapturePayload::Order(snapshot) => {
                assert_eq!(snapshot.billing_first_name, "Ada");
                assert_eq!(snapshot.line_items.len(), 1);
            }
            CapturePayload::Field(_) => panic!("expected order payload"),
        }
    }

    #[test]
    fn zero_order_id_is_rejected() {
        let state = test_state();
        let mut request = order_request(&state, 7);
        request.order_id = 0;
        assert!(matches!(
            process_order_completed(&state, &request),
            Err(RequestError::Invalid(_))
        ));
    }

    #[test]
    fn export_on_empty_store_reports_no_data() {
        let state = test_state();
        let request = AdminRequest {
            token: export_token(&state),
        };
        assert!(matches!(process_export(&state, &request), Err(RequestError::NoData)));
    }

    #[test]
    fn export_requires_export_scope_token() {
        let state = test_state();
        let request = AdminRequest {
            token: capture_token(&state, "admin"),
        };
        assert!(matches!(process_export(&state, &request), Err(RequestError::Auth(_))));
    }

    #[test]
    fn export_token_is_bound_to_the_fixed_admin_key() {
        let state = test_state();
        let request = field_request(&state, "s1", "city", "Lyon");
        process_field_capture(&state, &guest_headers(), &request).expect("capture");
        // An export-scope token derived for a caller session must not pass.
        let session_bound = AdminRequest {
            token: state.keys.derive(TokenScope::Export, "session:s1"),
        };
        assert!(matches!(process_export(&state, &session_bound), Err(RequestError::Auth(_))));
        let admin = AdminRequest {
            token: state.keys.derive(TokenScope::Export, ADMIN_SESSION_KEY),
        };
        process_export(&state, &admin).expect("export");
    }

    #[test]
    fn export_returns_artifact_after_capture() {
        let state = test_state();
        let request = field_request(&state, "s1", "city", "Lyon");
        process_field_capture(&state, &guest_headers(), &request).expect("capture");
        let artifact = process_export(
            &state,
            &AdminRequest {
                token: export_token(&state),
            },
        )
        .expect("export");
        assert_eq!(artifact.filename, "checkout-data.xlsx");
        assert!(!artifact.bytes.is_empty());
    }

    #[test]
    fn purge_empties_the_store() {
        let state = test_state();
        let request = field_request(&state, "s1", "city", "Lyon");
        process_field_capture(&state, &guest_headers(), &request).expect("capture");
        let data = process_purge(
            &state,
            &AdminRequest {
                token: export_token(&state),
            },
        )
        .expect("purge");
        assert_eq!(data["purged"], 1);
        assert!(state.store.load_all().expect("load").is_empty());
    }
}
