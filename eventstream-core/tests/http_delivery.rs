//! End-to-end delivery tests against a local HTTP responder
//!
//! These tests run the real `HttpTransport` against a throwaway server bound
//! to `127.0.0.1:0`, so they cover the wire format, the timeouts, and log
//! classification together.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use eventstream_core::context::{StaticCookies, StaticModules, StaticRequest, StaticStore};
use eventstream_core::forwarder::{
    Collaborators, Customer, EventTransport, HttpTransport, LoginEventForwarder, LoginSuccess,
    OutboundRequest, Outcome, APP_ID_HEADER, MODULE_NAME, NON_JSON_PLACEHOLDER,
};
use eventstream_core::mocks::{FlagMap, LogLevel, RecordingLogSink};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};

/// A request as seen by the responder
#[derive(Debug, Clone)]
struct Captured {
    request_line: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Captured {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Clone)]
enum Behavior {
    Respond { status: u16, body: &'static str },
    /// 301 to `location` for POST, 200 HTML for anything else
    Redirect { location: &'static str },
    Hang,
}

struct Responder {
    addr: SocketAddr,
    captured: Arc<Mutex<Vec<Captured>>>,
}

impl Responder {
    async fn start(behavior: Behavior) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let captured = Arc::new(Mutex::new(Vec::new()));

        let sink = captured.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let sink = sink.clone();
                let behavior = behavior.clone();
                tokio::spawn(async move {
                    handle(stream, behavior, sink).await;
                });
            }
        });

        Self { addr, captured }
    }

    fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    fn requests(&self) -> Vec<Captured> {
        self.captured.lock().unwrap().clone()
    }
}

async fn handle(mut stream: TcpStream, behavior: Behavior, sink: Arc<Mutex<Vec<Captured>>>) {
    let Some(request) = read_request(&mut stream).await else {
        return;
    };
    let request_line = request.request_line.clone();
    sink.lock().unwrap().push(request);

    match behavior {
        Behavior::Respond { status, body } => {
            write_response(&mut stream, status, "", body).await;
        }
        Behavior::Redirect { location } => {
            if request_line.starts_with("POST ") {
                let extra = format!("Location: {}\r\n", location);
                write_response(&mut stream, 301, &extra, "").await;
            } else {
                write_response(&mut stream, 200, "", "<html/>ok").await;
            }
        }
        Behavior::Hang => {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    }
}

async fn write_response(stream: &mut TcpStream, status: u16, extra_headers: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} Test\r\n{}Content-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        extra_headers,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

async fn read_request(stream: &mut TcpStream) -> Option<Captured> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }

    Some(Captured {
        request_line,
        headers,
        body,
    })
}

fn forwarder(base_url: &str, flags: FlagMap, logger: Arc<RecordingLogSink>) -> LoginEventForwarder {
    let deps = Collaborators {
        config: Arc::new(flags),
        store: Arc::new(StaticStore::new(base_url, "default", "base")),
        request: Arc::new(StaticRequest::new().with_header(APP_ID_HEADER, "tenant-7")),
        cookies: Arc::new(StaticCookies::new().with_cookie("wbs_uid", "uid-99")),
        modules: Arc::new(StaticModules::new().with_module(MODULE_NAME, "2.1.0")),
        logger,
        transport: Arc::new(HttpTransport::new().unwrap()),
    };
    LoginEventForwarder::new(deps, "wbs_uid")
}

fn login() -> LoginSuccess {
    LoginSuccess::for_customer(Customer::new(1001, "shopper@example.com"))
}

// ============================================
// Wire format
// ============================================

#[tokio::test]
async fn test_post_reaches_collector_path_with_headers() {
    let server = Responder::start(Behavior::Respond {
        status: 201,
        body: "{\"accepted\":1}",
    })
    .await;
    let logger = Arc::new(RecordingLogSink::new());
    let forwarder = forwarder(&server.base_url(), FlagMap::new(true, false), logger.clone());

    let outcome = forwarder.on_login_success(&login()).await;

    assert_eq!(outcome, Outcome::Delivered { status: 201 });
    assert!(logger.entries().is_empty());

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request
        .request_line
        .starts_with("POST /.clickstream/events/batch "));
    assert_eq!(request.header("content-type"), Some("application/json"));
    assert_eq!(request.header("webscale-app-id"), Some("tenant-7"));

    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body.as_array().map(Vec::len), Some(1));
    assert_eq!(body[0]["user"]["user_id"], "1001");
    assert_eq!(body[0]["payload"]["email"], "shopper@example.com");
    assert_eq!(body[0]["payload"]["wbs_uid"], "uid-99");
    assert_eq!(body[0]["sdk"], "webscale/eventstream:2.1.0");
}

#[tokio::test]
async fn test_success_logged_with_raw_response() {
    let server = Responder::start(Behavior::Respond {
        status: 200,
        body: "ok",
    })
    .await;
    let logger = Arc::new(RecordingLogSink::new());
    let forwarder = forwarder(&server.base_url(), FlagMap::new(true, true), logger.clone());

    forwarder.on_login_success(&login()).await;

    let entries = logger.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].level, LogLevel::Info);
    assert_eq!(entries[0].context["response"], "ok");
    assert_eq!(
        entries[0].context["endpoint"],
        format!("http://{}/.clickstream/events/batch", server.addr)
    );

    let sent: serde_json::Value = serde_json::from_slice(&server.requests()[0].body).unwrap();
    assert_eq!(entries[0].context["payload"], sent);
}

// ============================================
// Failure classification
// ============================================

#[tokio::test]
async fn test_html_error_page_replaced_by_placeholder() {
    let server = Responder::start(Behavior::Respond {
        status: 500,
        body: "<html><body>Internal Server Error</body></html>",
    })
    .await;
    let logger = Arc::new(RecordingLogSink::new());
    let forwarder = forwarder(&server.base_url(), FlagMap::new(true, false), logger.clone());

    let outcome = forwarder.on_login_success(&login()).await;

    assert_eq!(outcome, Outcome::Rejected { status: 500 });
    let entries = logger.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].level, LogLevel::Warning);
    assert!(entries[0].message.contains("HTTP 500"));
    assert_eq!(entries[0].context["response"], NON_JSON_PLACEHOLDER);
}

#[tokio::test]
async fn test_connection_refused_logged_as_error() {
    // Reserve a port, then free it so nothing is listening
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let logger = Arc::new(RecordingLogSink::new());
    let forwarder = forwarder(
        &format!("http://{}", addr),
        FlagMap::new(true, false),
        logger.clone(),
    );

    let outcome = forwarder.on_login_success(&login()).await;

    assert_eq!(outcome, Outcome::Failed);
    let entries = logger.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].level, LogLevel::Error);
    assert!(entries[0].context["message"].is_string());
    assert!(entries[0].context["trace"].is_string());
}

#[tokio::test]
async fn test_hanging_collector_bounded_by_request_timeout() {
    let server = Responder::start(Behavior::Hang).await;
    let logger = Arc::new(RecordingLogSink::new());
    let forwarder = forwarder(&server.base_url(), FlagMap::new(true, true), logger.clone());

    let started = Instant::now();
    let outcome = forwarder.on_login_success(&login()).await;
    let elapsed = started.elapsed();

    assert_eq!(outcome, Outcome::Failed);
    assert!(elapsed >= Duration::from_secs(4), "returned too early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(8), "not bounded: {elapsed:?}");

    let entries = logger.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].level, LogLevel::Error);
}

#[tokio::test]
async fn test_redirect_is_not_followed() {
    let server = Responder::start(Behavior::Redirect {
        location: "/landing",
    })
    .await;
    let logger = Arc::new(RecordingLogSink::new());
    let forwarder = forwarder(&server.base_url(), FlagMap::new(true, true), logger.clone());

    let outcome = forwarder.on_login_success(&login()).await;

    assert_eq!(outcome, Outcome::Rejected { status: 301 });

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].request_line.starts_with("POST "));

    let entries = logger.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].level, LogLevel::Warning);
    assert!(entries[0].message.contains("HTTP 301"));
}

// ============================================
// Connect timeout
// ============================================

#[tokio::test]
async fn test_unanswered_connect_bounded_by_connect_timeout() {
    // A listener that never accepts, with a backlog of one. Once the accept
    // queue is full the kernel drops further SYNs, so new connects hang.
    let socket = TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(1).unwrap();
    let addr = listener.local_addr().unwrap();

    let mut fillers = Vec::new();
    let mut saturated = false;
    for _ in 0..64 {
        match tokio::time::timeout(Duration::from_millis(200), TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => fillers.push(stream),
            Ok(Err(_)) => break,
            Err(_) => {
                saturated = true;
                break;
            }
        }
    }
    if !saturated {
        eprintln!("accept queue never filled on this platform; skipping");
        return;
    }

    let transport = HttpTransport::new().unwrap();
    let started = Instant::now();
    let result = transport
        .post(OutboundRequest {
            url: format!("http://{}/.clickstream/events/batch", addr),
            headers: vec![("Content-Type", "application/json".to_string())],
            body: b"[]".to_vec(),
        })
        .await;
    let elapsed = started.elapsed();

    assert!(result.is_err());
    assert!(elapsed >= Duration::from_millis(900), "returned too early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(3), "connect not bounded: {elapsed:?}");

    drop(fillers);
    drop(listener);
}
