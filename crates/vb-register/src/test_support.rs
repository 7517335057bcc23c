//! An in-process hyper server standing in for the registration API in tests.
//!
//! The server runs on its own thread and current-thread runtime, so it serves
//! both plain `#[test]`s and `#[tokio::test]`s. Every connection gets its own
//! task; a delayed response never holds up other requests.

use std::net::{SocketAddr, TcpListener};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::Http;
use hyper::service::service_fn;
use hyper::{Body, Request, Response, StatusCode};

#[derive(Debug, Clone)]
pub(crate) struct CapturedRequest {
    pub(crate) method: String,
    pub(crate) path: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Vec<u8>,
}

impl CapturedRequest {
    pub(crate) fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub(crate) fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body should be JSON")
    }

    pub(crate) fn nickname(&self) -> String {
        self.json()["nickname"]
            .as_str()
            .expect("nickname should be a string")
            .to_string()
    }
}

pub(crate) struct StubResponse {
    pub(crate) status: u16,
    pub(crate) body: String,
    pub(crate) delay: Duration,
}

impl StubResponse {
    pub(crate) fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    pub(crate) fn link(link: &str) -> Self {
        Self::new(200, serde_json::json!({ "registrationLink": link }).to_string())
    }

    pub(crate) fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Responder = dyn Fn(&CapturedRequest) -> StubResponse + Send + Sync;
type Captured = Arc<Mutex<Vec<CapturedRequest>>>;

pub(crate) struct StubServer {
    addr: SocketAddr,
    requests: Captured,
}

impl StubServer {
    pub(crate) fn start<F>(respond: F) -> Self
    where
        F: Fn(&CapturedRequest) -> StubResponse + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub listener");
        let addr = listener.local_addr().expect("stub listener address");
        listener
            .set_nonblocking(true)
            .expect("non-blocking stub listener");
        let requests: Captured = Arc::new(Mutex::new(Vec::new()));
        let respond: Arc<Responder> = Arc::new(respond);

        let captured = requests.clone();
        thread::Builder::new()
            .name("vb-register-stub".into())
            .spawn(move || {
                let runtime = tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("stub runtime");
                runtime.block_on(accept_loop(listener, respond, captured));
            })
            .expect("spawn stub thread");

        Self { addr, requests }
    }

    /// Stub that answers every request with the same status and body.
    pub(crate) fn fixed(status: u16, body: &str) -> Self {
        let body = body.to_string();
        Self::start(move |_| StubResponse::new(status, body.clone()))
    }

    pub(crate) fn endpoint(&self) -> String {
        format!("http://{}/api/generateRegToken", self.addr)
    }

    pub(crate) fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }
}

/// An endpoint on a port nothing listens on.
pub(crate) fn unreachable_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind unused listener");
    let addr = listener.local_addr().expect("unused listener address");
    drop(listener);
    format!("http://{addr}/api/generateRegToken")
}

async fn accept_loop(listener: TcpListener, respond: Arc<Responder>, captured: Captured) {
    let listener = tokio::net::TcpListener::from_std(listener).expect("tokio stub listener");
    while let Ok((stream, _)) = listener.accept().await {
        let respond = respond.clone();
        let captured = captured.clone();
        tokio::spawn(async move {
            let service =
                service_fn(move |request| handle(request, respond.clone(), captured.clone()));
            // The client may already have given up (timeout tests).
            let _ = Http::new().serve_connection(stream, service).await;
        });
    }
}

async fn handle(
    request: Request<Body>,
    respond: Arc<Responder>,
    captured: Captured,
) -> Result<Response<Body>, hyper::Error> {
    let (parts, body) = request.into_parts();
    let body = hyper::body::to_bytes(body).await?;
    let request = CapturedRequest {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        headers: parts
            .headers
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body: body.to_vec(),
    };
    captured.lock().expect("requests lock").push(request.clone());

    let stub = respond(&request);
    if !stub.delay.is_zero() {
        tokio::time::sleep(stub.delay).await;
    }

    let mut response = Response::new(Body::from(stub.body));
    *response.status_mut() =
        StatusCode::from_u16(stub.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    Ok(response)
}
