#![allow(dead_code)]

use axum::{
    Router,
    body::to_bytes,
    extract::{FromRequest, Multipart, Request, State},
    http::{StatusCode, header::CONTENT_TYPE},
    routing::post,
};
use serde_json::Value;
use std::{
    net::SocketAddr,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct ReceivedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl ReceivedPart {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

#[derive(Debug, Clone)]
pub enum Received {
    Json(Value),
    Multipart(Vec<ReceivedPart>),
}

impl Received {
    pub fn json(&self) -> &Value {
        match self {
            Received::Json(value) => value,
            other => panic!("expected a JSON body, got {other:?}"),
        }
    }

    pub fn parts(&self) -> &[ReceivedPart] {
        match self {
            Received::Multipart(parts) => parts,
            other => panic!("expected a multipart body, got {other:?}"),
        }
    }

    pub fn part(&self, name: &str) -> &ReceivedPart {
        self.parts()
            .iter()
            .find(|part| part.name == name)
            .unwrap_or_else(|| panic!("no part named {name}"))
    }
}

struct ApiState {
    data: Mutex<Vec<Received>>,
    images: Mutex<Vec<Received>>,
    failures_left: AtomicUsize,
    status: StatusCode,
}

/// In-process stand-in for the ingestion API. Every request, including the
/// ones answered with an error, is recorded.
pub struct MockApi {
    addr: SocketAddr,
    state: Arc<ApiState>,
}

impl MockApi {
    pub async fn start() -> Self {
        Self::with_behaviour(0, StatusCode::OK).await
    }

    /// Answers the first `failures` requests with 500, then 200.
    pub async fn failing_first(failures: usize) -> Self {
        Self::with_behaviour(failures, StatusCode::OK).await
    }

    /// Answers every request with `status`.
    pub async fn responding(status: StatusCode) -> Self {
        Self::with_behaviour(0, status).await
    }

    async fn with_behaviour(failures: usize, status: StatusCode) -> Self {
        let state = Arc::new(ApiState {
            data: Mutex::new(Vec::new()),
            images: Mutex::new(Vec::new()),
            failures_left: AtomicUsize::new(failures),
            status,
        });

        let app = Router::new()
            .route("/data", post(data))
            .route("/upload_image", post(image))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn data_url(&self) -> String {
        format!("http://{}/data", self.addr)
    }

    pub fn image_url(&self) -> String {
        format!("http://{}/upload_image", self.addr)
    }

    pub fn data_requests(&self) -> Vec<Received> {
        self.state.data.lock().unwrap().clone()
    }

    pub fn image_requests(&self) -> Vec<Received> {
        self.state.images.lock().unwrap().clone()
    }
}

/// A URL nothing listens on.
pub async fn unreachable_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    format!("http://{addr}/data")
}

async fn data(State(state): State<Arc<ApiState>>, request: Request) -> (StatusCode, String) {
    let received = read_body(request).await;
    state.data.lock().unwrap().push(received);
    respond(&state)
}

async fn image(State(state): State<Arc<ApiState>>, request: Request) -> (StatusCode, String) {
    let received = read_body(request).await;
    state.images.lock().unwrap().push(received);
    respond(&state)
}

fn respond(state: &ApiState) -> (StatusCode, String) {
    let failing = state
        .failures_left
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
        .is_ok();

    if failing {
        return (StatusCode::INTERNAL_SERVER_ERROR, "try again".to_string());
    }

    (state.status, format!("{{\"status\":\"{}\"}}", state.status.as_u16()))
}

async fn read_body(request: Request) -> Received {
    let is_multipart = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    if !is_multipart {
        let bytes = to_bytes(request.into_body(), usize::MAX).await.unwrap();
        return Received::Json(serde_json::from_slice(&bytes).unwrap());
    }

    let mut multipart = Multipart::from_request(request, &()).await.unwrap();
    let mut parts = Vec::new();

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.unwrap().to_vec();

        parts.push(ReceivedPart {
            name,
            file_name,
            content_type,
            data,
        });
    }

    Received::Multipart(parts)
}
