//! A tiny HTTP/1.1 server for tests
//!
//! It answers each connection with the next queued reply and records what the
//! client sent. Connections are handled one at a time and closed after the
//! reply.

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use http::header::CONTENT_TYPE;
use http_body_util::{BodyExt, Full};
use hyper::{
    body::{Bytes, Incoming},
    server::conn::http1,
    service::service_fn,
    Request, Response,
};
use hyper_util::rt::TokioIo;
use tokio::{io::AsyncReadExt, net::TcpListener, task::JoinHandle};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub enum Reply {
    Json { status: u16, body: String },
    /// Close the connection without answering
    Reset,
}

impl Reply {
    pub fn json(status: u16, body: &str) -> Self {
        Self::Json {
            status,
            body: body.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Recorded {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Default)]
struct State {
    replies: VecDeque<Reply>,
    requests: Vec<Recorded>,
}

pub struct TestServer {
    host: String,
    state: Arc<Mutex<State>>,
    task: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let host = listener.local_addr().unwrap().to_string();
        let state = Arc::new(Mutex::new(State::default()));
        let task = tokio::spawn(serve(listener, state.clone()));

        Self { host, state, task }
    }

    /// The `127.0.0.1:port` authority the server listens on
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Queues the reply for the next request; unqueued requests get `{}`
    pub fn reply(&self, reply: Reply) {
        self.state.lock().unwrap().replies.push_back(reply);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(listener: TcpListener, state: Arc<Mutex<State>>) {
    while let Ok((mut stream, _)) = listener.accept().await {
        let reply = state
            .lock()
            .unwrap()
            .replies
            .pop_front()
            .unwrap_or_else(|| Reply::json(200, "{}"));

        let (status, body) = match reply {
            Reply::Json { status, body } => (status, body),
            Reply::Reset => {
                let mut chunk = [0u8; 4096];
                let _ = stream.read(&mut chunk).await;
                continue;
            }
        };

        let state = state.clone();
        let service = service_fn(move |request: Request<Incoming>| {
            let state = state.clone();
            let body = body.clone();
            async move { answer(request, &state, status, body).await }
        });

        let connection: std::pin::Pin<
            Box<dyn std::future::Future<Output = Result<(), hyper::Error>> + Send>,
        > = Box::pin(
            http1::Builder::new()
                .keep_alive(false)
                .serve_connection(TokioIo::new(stream), service),
        );
        let _ = connection.await;
    }
}

async fn answer(
    request: Request<Incoming>,
    state: &Mutex<State>,
    status: u16,
    body: String,
) -> Result<Response<Full<Bytes>>, BoxError> {
    let (parts, incoming) = request.into_parts();
    let received = incoming.collect().await?.to_bytes();

    state.lock().unwrap().requests.push(Recorded {
        method: parts.method.to_string(),
        path: parts.uri.path().to_string(),
        headers: parts
            .headers
            .iter()
            .map(|(key, value)| {
                (
                    key.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect(),
        body: String::from_utf8_lossy(&received).into_owned(),
    });

    let response = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))?;

    Ok(response)
}
