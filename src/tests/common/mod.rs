// tests/common/mod.rs
pub use axum::Router;
pub use serde_json::json;
pub use tokio::task::JoinHandle;

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use reqwest::Client;
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use tokio::sync::Mutex;

pub const TEST_ISSUER: &str = "svc@example.iam.gserviceaccount.com";

/// One RSA key, encoded the ways a service account key shows up.
pub struct TestKeys {
    pub pkcs1_pem: String,
    pub pkcs8_pem: String,
    pub public_pem: String,
}

/// Key generation is slow; every test shares the same pair.
pub fn test_keys() -> &'static TestKeys {
    static KEYS: OnceLock<TestKeys> = OnceLock::new();
    KEYS.get_or_init(|| {
        let mut rng = rand::thread_rng();
        let key = RsaPrivateKey::new(&mut rng, 2048).expect("rsa keygen");
        TestKeys {
            pkcs1_pem: key.to_pkcs1_pem(LineEnding::LF).expect("pkcs1 pem").to_string(),
            pkcs8_pem: key.to_pkcs8_pem(LineEnding::LF).expect("pkcs8 pem").to_string(),
            public_pem: key
                .to_public_key()
                .to_pkcs1_pem(LineEnding::LF)
                .expect("public pem"),
        }
    })
}

/// Spawn an Axum router on an ephemeral port and return (JoinHandle, SocketAddr)
pub async fn spawn_axum(router: Router) -> (JoinHandle<()>, SocketAddr) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, router).await.expect("server failed");
    });
    (handle, addr)
}

pub fn build_reqwest_client() -> Client {
    Client::builder()
        .timeout(std::time::Duration::from_secs(5))
        .build()
        .expect("reqwest client")
}

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    pub uri: String,
    pub headers: HeaderMap,
    pub body: String,
}

/// Upstream stand-in that records every request verbatim and answers from a
/// script; the last scripted response repeats.
#[derive(Clone)]
pub struct Capture {
    pub requests: Arc<Mutex<Vec<CapturedRequest>>>,
    responses: Arc<Mutex<VecDeque<(StatusCode, String)>>>,
    delay: Duration,
}

impl Capture {
    pub async fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().await.clone()
    }
}

pub async fn spawn_capture(responses: Vec<(StatusCode, &str)>) -> (Capture, String) {
    spawn_capture_with_delay(responses, Duration::ZERO).await
}

pub async fn spawn_capture_with_delay(responses: Vec<(StatusCode, &str)>, delay: Duration) -> (Capture, String) {
    let capture = Capture {
        requests: Arc::default(),
        responses: Arc::new(Mutex::new(
            responses.into_iter().map(|(s, b)| (s, b.to_owned())).collect(),
        )),
        delay,
    };
    let router = Router::new().fallback(capture_handler).with_state(capture.clone());
    let (_handle, addr) = spawn_axum(router).await;
    (capture, format!("http://{}", addr))
}

async fn capture_handler(
    State(capture): State<Capture>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    capture.requests.lock().await.push(CapturedRequest {
        method,
        uri: uri.to_string(),
        headers,
        body,
    });

    let (status, body) = {
        let mut responses = capture.responses.lock().await;
        if responses.len() > 1 {
            responses.pop_front().unwrap_or((StatusCode::OK, String::new()))
        } else {
            responses.front().cloned().unwrap_or((StatusCode::OK, String::new()))
        }
    };

    if !capture.delay.is_zero() {
        tokio::time::sleep(capture.delay).await;
    }
    (status, [(CONTENT_TYPE, "application/json")], body).into_response()
}
