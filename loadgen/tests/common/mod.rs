#![allow(dead_code)]

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use event_wire::drain::DrainBodyFuture;
use event_wire::{byte_body, empty_body};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::CONTENT_TYPE;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use loadgen::task::DiagnosticSink;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

/// `None` leaves the request unanswered.
type Responder = dyn Fn(usize) -> Option<(StatusCode, &'static str)> + Send + Sync;

/// Records every request and answers the n-th one (zero based) with `respond(n)`.
#[derive(Clone)]
pub struct MockServer {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub async fn start<F>(respond: F) -> Self
    where
        F: Fn(usize) -> (StatusCode, &'static str) + Send + Sync + 'static,
    {
        Self::start_partial(move |n| Some(respond(n))).await
    }

    /// Like [`MockServer::start`], but requests answered with `None` never get a response.
    pub async fn start_partial<F>(respond: F) -> Self
    where
        F: Fn(usize) -> Option<(StatusCode, &'static str)> + Send + Sync + 'static,
    {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let respond: Arc<Responder> = Arc::new(respond);
        let recorded = Arc::clone(&requests);
        tokio::spawn(async move {
            loop {
                let Ok((tcp, _peer)) = listener.accept().await else {
                    return;
                };
                let tcp = TokioIo::new(tcp);
                let recorded = Arc::clone(&recorded);
                let respond = Arc::clone(&respond);
                tokio::spawn(hyper::server::conn::http1::Builder::new().serve_connection(
                    tcp,
                    service_fn(move |req| {
                        mock_service(Arc::clone(&recorded), Arc::clone(&respond), req)
                    }),
                ));
            }
        });
        Self { addr, requests }
    }

    /// Answers everything with `200 {}`.
    pub async fn ok() -> Self {
        Self::start(|_| (StatusCode::OK, "{}")).await
    }

    pub fn host(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn mock_service(
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
    respond: Arc<Responder>,
    incoming: Request<Incoming>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = incoming.method().to_string();
    let path = incoming.uri().path().to_owned();
    let content_type = incoming
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|hv| hv.to_str().ok())
        .map(str::to_owned);
    let body = DrainBodyFuture::new_trusted_length(incoming.into_body(), 128)
        .await
        .unwrap();
    let index = {
        let mut requests = recorded.lock().unwrap();
        requests.push(RecordedRequest {
            method,
            path,
            content_type,
            body,
        });
        requests.len() - 1
    };
    let Some((status, text)) = respond(index) else {
        return std::future::pending().await;
    };
    let body = if text.is_empty() {
        empty_body()
    } else {
        byte_body(text)
    };
    Ok(Response::builder().status(status).body(body).unwrap())
}

/// A diagnostic sink writing into the returned buffer.
pub fn captured() -> (Arc<Mutex<Vec<u8>>>, DiagnosticSink) {
    let buf = Arc::new(Mutex::new(Vec::new()));
    let sink: DiagnosticSink = buf.clone();
    (buf, sink)
}

pub fn text(buf: &Mutex<Vec<u8>>) -> String {
    String::from_utf8(buf.lock().unwrap().clone()).unwrap()
}

/// A host nothing listens on.
pub async fn closed_host() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}
