//! Decoy web login page. Every GET is recorded as an access, every POST as a
//! login attempt carrying the submitted form fields.

use crate::attempts::record::AttemptRecord;
use crate::attempts::LogSink;
use crate::utils::sanitize_for_log;
use axum::{
    body::Bytes,
    extract::{ConnectInfo, DefaultBodyLimit, State},
    http::{header, Method, StatusCode, Uri},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

const LOGIN_PAGE: &str = include_str!("../assets/login.html");

#[derive(Clone)]
struct HttpState {
    sink: Arc<dyn LogSink>,
}

/// Routes for the decoy site. Any path answers GET and POST.
pub fn router(sink: Arc<dyn LogSink>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(serve_page).post(capture_login))
        .route("/{*path}", get(serve_page).post(capture_login))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(HttpState { sink })
}

/// Serve the decoy site on a pre-bound listener until `shutdown` fires.
pub async fn serve_http(
    listener: TcpListener,
    sink: Arc<dyn LogSink>,
    max_body_bytes: usize,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let app = router(sink, max_body_bytes);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown.cancelled_owned())
    .await?;
    Ok(())
}

async fn serve_page(
    State(state): State<HttpState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    method: Method,
    uri: Uri,
) -> impl IntoResponse {
    let path = request_path(&uri);
    record(&state, AttemptRecord::http_access(&peer, method.as_str(), path));
    info!(
        ip = %peer.ip(),
        port = peer.port(),
        path = %sanitize_for_log(path, 200),
        "HTTP access"
    );

    if matches!(uri.path(), "/" | "/index.html" | "/login") {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
            LOGIN_PAGE,
        )
    } else {
        (
            StatusCode::NOT_FOUND,
            [(header::CONTENT_TYPE, "text/html")],
            "File not found",
        )
    }
}

async fn capture_login(
    State(state): State<HttpState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    uri: Uri,
    body: Bytes,
) -> impl IntoResponse {
    let path = request_path(&uri);
    let raw = String::from_utf8_lossy(&body);
    let (username, password) = form_credentials(&body);
    record(
        &state,
        AttemptRecord::http_login_attempt(&peer, path, &username, &password, &raw),
    );
    info!(
        ip = %peer.ip(),
        user = %sanitize_for_log(&username, 64),
        password = %sanitize_for_log(&password, 64),
        path = %sanitize_for_log(path, 200),
        "HTTP login attempt"
    );

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html")],
        "Login attempt recorded",
    )
}

fn record(state: &HttpState, record: AttemptRecord) {
    if let Err(e) = state.sink.append(record) {
        warn!(error = %e, "Failed to record HTTP request");
    }
}

/// Path plus query string, as the client sent it.
fn request_path(uri: &Uri) -> &str {
    uri.path_and_query().map_or(uri.path(), |pq| pq.as_str())
}

/// `username` and `password` from a urlencoded body. Missing fields are
/// empty; a repeated field keeps its last value.
fn form_credentials(body: &[u8]) -> (String, String) {
    let mut username = String::new();
    let mut password = String::new();
    for (key, value) in url::form_urlencoded::parse(body) {
        match key.as_ref() {
            "username" => username = value.into_owned(),
            "password" => password = value.into_owned(),
            _ => {}
        }
    }
    (username, password)
}
