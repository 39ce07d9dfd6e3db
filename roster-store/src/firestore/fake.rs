//! Scripted HTTP server standing in for Firestore and the token endpoint

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// A request as it arrived on the wire
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: Method,
    /// Raw (still percent-encoded) path
    pub path: String,
    pub query: String,
    pub authorization: Option<String>,
    pub body: String,
}

#[derive(Default)]
struct Script {
    replies: Mutex<VecDeque<(StatusCode, Value)>>,
    seen: Mutex<Vec<Seen>>,
}

/// Answers requests in order with the scripted `(status, json)` replies
pub struct FakeServer {
    pub addr: SocketAddr,
    script: Arc<Script>,
}

impl FakeServer {
    pub async fn start(replies: Vec<(u16, Value)>) -> Self {
        let script = Arc::new(Script {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|(status, body)| (StatusCode::from_u16(status).unwrap(), body))
                    .collect(),
            ),
            seen: Mutex::default(),
        });

        let app = Router::new().fallback(reply).with_state(script.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        Self { addr, script }
    }

    pub fn requests(&self) -> Vec<Seen> {
        self.script.seen.lock().unwrap().clone()
    }
}

async fn reply(
    State(script): State<Arc<Script>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<Value>) {
    script.seen.lock().unwrap().push(Seen {
        method,
        path: uri.path().to_string(),
        query: uri.query().unwrap_or_default().to_string(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        body,
    });

    let (status, body) = script.replies.lock().unwrap().pop_front().unwrap_or((
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": {"code": 500, "message": "unscripted request"}}),
    ));
    (status, Json(body))
}
