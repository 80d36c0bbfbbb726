//! HTTP transport against a mock ingestion gateway

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use scrybe_collector::error::TransportError;
use scrybe_collector::signer::{self, SignedEnvelope, NONCE_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER};
use scrybe_collector::transport::{HttpTransport, Transport, INGEST_PATH};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const KEY: &str = "gateway-shared-key";

#[derive(Clone, Default)]
struct GatewayState {
    bodies: Arc<Mutex<Vec<String>>>,
    delay_ms: u64,
    fail_with: Option<u16>,
}

async fn ingest(State(state): State<GatewayState>, headers: HeaderMap, body: String) -> impl IntoResponse {
    if state.delay_ms > 0 {
        tokio::time::sleep(Duration::from_millis(state.delay_ms)).await;
    }
    if let Some(status) = state.fail_with {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (status, "backend unavailable".to_string()).into_response();
    }

    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or("");
    let timestamp: i64 = header(TIMESTAMP_HEADER).parse().unwrap_or(-1);
    let verified = signer::verify(
        &body,
        timestamp,
        header(NONCE_HEADER),
        header(SIGNATURE_HEADER),
        KEY.as_bytes(),
    );
    if !verified {
        return (StatusCode::UNAUTHORIZED, "Authentication failed".to_string()).into_response();
    }

    state.bodies.lock().unwrap().push(body);
    Json(serde_json::json!({
        "session_id": "0b3c5b8e-5f64-4c1a-9d43-7f2e1a6b9c00",
        "is_new": true,
        "timestamp": "2024-01-22T10:00:00+00:00",
    }))
    .into_response()
}

async fn start_gateway(state: GatewayState) -> SocketAddr {
    let app = Router::new().route(INGEST_PATH, post(ingest)).with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    addr
}

fn envelope(key: &str) -> SignedEnvelope {
    let body = r#"{"sessionId":"s","timestamp":1700000000000,"network":{}}"#.to_string();
    SignedEnvelope::seal(body, 1_700_000_000_000, key.as_bytes()).unwrap()
}

#[tokio::test]
async fn test_gateway_verifies_signature() {
    let state = GatewayState::default();
    let addr = start_gateway(state.clone()).await;
    let transport = HttpTransport::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap();

    let sent = envelope(KEY);
    let receipt = transport.send(&sent).await.expect("Failed to send");

    assert!(receipt.is_new);
    assert_eq!(receipt.session_id.len(), 36);
    assert_eq!(state.bodies.lock().unwrap().as_slice(), &[sent.body.clone()]);
}

#[tokio::test]
async fn test_wrong_key_is_rejected() {
    let addr = start_gateway(GatewayState::default()).await;
    let transport = HttpTransport::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap();

    let err = transport.send(&envelope("another-key")).await.unwrap_err();
    assert!(matches!(err, TransportError::Server { status: 401, .. }), "{err:?}");
}

#[tokio::test]
async fn test_server_error_surfaces_status() {
    let addr = start_gateway(GatewayState {
        fail_with: Some(503),
        ..Default::default()
    })
    .await;
    let transport = HttpTransport::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap();

    match transport.send(&envelope(KEY)).await {
        Err(TransportError::Server { status, message }) => {
            assert_eq!(status, 503);
            assert!(message.contains("backend unavailable"));
        }
        other => panic!("expected server error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_slow_gateway_times_out() {
    let addr = start_gateway(GatewayState {
        delay_ms: 2_000,
        ..Default::default()
    })
    .await;
    let transport = HttpTransport::new(&format!("http://{addr}"), Duration::from_millis(100)).unwrap();

    let err = transport.send(&envelope(KEY)).await.unwrap_err();
    assert!(err.is_timeout(), "{err:?}");
    assert_eq!(err, TransportError::Timeout(Duration::from_millis(100)));
}
