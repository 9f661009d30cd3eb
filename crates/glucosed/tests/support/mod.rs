//! Shared helpers for glucosed integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use glucose_common::alexa::ResponseEnvelope;
use glucose_common::{EntrySource, FetchConfig, FetchError, GlucoseReading};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tower::ServiceExt;

pub const NOW: i64 = 1_700_000_000_000;
pub const MINUTE: i64 = 60_000;

/// Build a reading from an entry literal
pub fn reading(entry: serde_json::Value) -> GlucoseReading {
    GlucoseReading::from_entry(&entry).unwrap()
}

/// POST a body to the skill endpoint and decode the envelope
pub async fn post_skill(app: Router, body: String) -> (StatusCode, ResponseEnvelope) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/alexa")
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

/// Nightscout stand-in answering one request with a fixed status and body
pub async fn spawn_nightscout(status: u16, body: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let body = body.to_string();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut chunk = [0u8; 1024];
        while !raw.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&chunk[..n]);
        }
        let response = format!(
            "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
    });

    base_url
}

/// Entry source that blows up, for exercising the panic catcher
pub struct PanickingSource;

#[async_trait]
impl EntrySource for PanickingSource {
    async fn latest_reading(&self, _config: &FetchConfig) -> Result<GlucoseReading, FetchError> {
        panic!("entry source exploded");
    }
}
