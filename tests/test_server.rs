//! End-to-end tests over real sockets

use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use vesta::config::{Config, HandlerConfig, HostConfig};
use vesta::handler::{Handler, HandlerFactories};
use vesta::http::request::Request;
use vesta::http::response::Response;
use vesta::server::{Server, ServerContext, ShutdownHandle};

struct Panicking;

#[async_trait]
impl Handler for Panicking {
    async fn handle(&self, _request: &Request, _response: &mut Response) -> anyhow::Result<()> {
        panic!("handler blew up");
    }
}

fn panicking() -> Arc<dyn Handler> {
    Arc::new(Panicking)
}

struct TestServer {
    addr: SocketAddr,
    shutdown: ShutdownHandle,
    task: JoinHandle<anyhow::Result<()>>,
    _dir: TempDir,
}

fn test_config(root: &Path, workers: usize) -> Config {
    Config {
        hosts: vec![HostConfig {
            name: "localhost".to_string(),
            http_root: root.to_path_buf(),
            welcome_file: "index.html".to_string(),
            error_pages: None,
        }],
        servlets: vec![
            HandlerConfig {
                name: "TimeServlet".to_string(),
                class_name: "com.example.servlet.TimeServlet".to_string(),
                url_patterns: vec!["/time".to_string()],
            },
            HandlerConfig {
                name: "Panicking".to_string(),
                class_name: "panicking".to_string(),
                url_patterns: vec!["/panic".to_string()],
            },
        ],
        workers,
        ..Config::default()
    }
}

async fn start(workers: usize) -> TestServer {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("webapp/www/localhost");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("time"), "a file that shadows nothing").unwrap();
    fs::write(root.join("hello.txt"), "plain text").unwrap();

    let mut factories = HandlerFactories::builtin();
    factories.register("panicking", panicking);
    let ctx = ServerContext::with_factories(test_config(&root, workers), &factories).unwrap();

    let server = Server::bind("127.0.0.1:0", ctx).await.unwrap();
    let addr = server.local_addr().unwrap();
    let shutdown = server.shutdown_handle();
    let task = tokio::spawn(server.run());

    TestServer {
        addr,
        shutdown,
        task,
        _dir: dir,
    }
}

async fn send(addr: SocketAddr, raw: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw.as_bytes()).await.unwrap();
    let mut out = String::new();
    stream.read_to_string(&mut out).await.unwrap();
    out
}

async fn get(addr: SocketAddr, path: &str, host: &str) -> String {
    send(
        addr,
        &format!("GET {} HTTP/1.1\r\nHost: {}\r\nConnection: keep-alive\r\n\r\n", path, host),
    )
    .await
}

fn body(out: &str) -> &str {
    out.split_once("\r\n\r\n").map(|(_, b)| b).unwrap_or("")
}

#[tokio::test]
async fn test_root_generates_welcome_page() {
    let server = start(4).await;

    let first = get(server.addr, "/", "localhost").await;
    let second = get(server.addr, "/", "localhost").await;

    assert!(first.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(first.contains("Content-Type: text/html; charset=UTF-8\r\n"));
    assert!(body(&first).contains("Welcome to localhost"));
    assert_eq!(body(&first), body(&second));
}

#[tokio::test]
async fn test_static_file_and_host_port() {
    let server = start(4).await;

    let out = get(server.addr, "/hello.txt", "localhost:8080").await;

    assert!(out.starts_with("HTTP/1.1 200 OK\r\nContent-Type: text/plain"));
    assert_eq!(body(&out), "plain text");
}

#[tokio::test]
async fn test_missing_file_is_404() {
    let server = start(4).await;

    let out = get(server.addr, "/missing.html", "localhost").await;

    assert!(out.starts_with("HTTP/1.1 404 Not Found\r\n"));
    assert!(body(&out).contains("404"));
}

#[tokio::test]
async fn test_traversal_is_403() {
    let server = start(4).await;

    let out = get(server.addr, "/../../etc/passwd", "localhost").await;

    assert!(out.starts_with("HTTP/1.1 403 Forbidden\r\n"));
    assert!(out.contains("<html"));
}

#[tokio::test]
async fn test_default_forbidden_pattern_is_403() {
    let server = start(4).await;

    let out = get(server.addr, "/app.exe", "localhost").await;

    assert!(out.starts_with("HTTP/1.1 403 Forbidden\r\n"));
}

#[tokio::test]
async fn test_handler_wins_over_file() {
    let server = start(4).await;

    let out = get(server.addr, "/time", "localhost").await;

    assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(out.contains("Current Time"));
    assert!(!out.contains("a file that shadows nothing"));
}

#[tokio::test]
async fn test_handler_trailing_slash_falls_through_to_files() {
    let server = start(4).await;

    // No handler match, so the path resolves to the file on disk
    let out = get(server.addr, "/time/", "localhost").await;

    assert!(!out.contains("Current Time"));
    assert_eq!(body(&out), "a file that shadows nothing");
}

#[tokio::test]
async fn test_handler_failure_is_500() {
    let server = start(4).await;

    let failed = get(server.addr, "/time?error=true", "localhost").await;
    let panicked = get(server.addr, "/panic", "localhost").await;

    assert!(failed.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    assert!(failed.contains("<html"));
    assert!(panicked.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
    assert!(!panicked.contains("blew up"));

    // The worker survived
    let after = get(server.addr, "/time", "localhost").await;
    assert!(after.starts_with("HTTP/1.1 200 OK\r\n"));
}

#[tokio::test]
async fn test_unknown_host_is_400() {
    let server = start(4).await;

    let out = get(server.addr, "/", "unknown.example").await;

    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(body(&out).contains("Invalid host"));
}

#[tokio::test]
async fn test_malformed_requests_are_400() {
    let server = start(4).await;

    let bad_line = send(server.addr, "GET /\r\nHost: localhost\r\n\r\n").await;
    let no_host = send(server.addr, "GET / HTTP/1.1\r\nAccept: */*\r\n\r\n").await;

    assert!(bad_line.starts_with("HTTP/1.1 400 Bad Request\r\n"));
    assert!(no_host.starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[tokio::test]
async fn test_silent_client_still_gets_a_response() {
    let server = start(4).await;

    let mut stream = TcpStream::connect(server.addr).await.unwrap();
    stream.shutdown().await.unwrap();
    let mut out = String::new();
    stream.read_to_string(&mut out).await.unwrap();

    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
}

#[tokio::test]
async fn test_connections_queue_for_busy_workers() {
    let server = start(1).await;

    // Occupies the only worker until it sends its request
    let mut stalled = TcpStream::connect(server.addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let queued = tokio::spawn(get(server.addr, "/hello.txt", "localhost"));
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!queued.is_finished());

    stalled
        .write_all(b"GET /hello.txt HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let mut first = String::new();
    stalled.read_to_string(&mut first).await.unwrap();

    let second = timeout(Duration::from_secs(5), queued).await.unwrap().unwrap();
    assert!(first.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(second.starts_with("HTTP/1.1 200 OK\r\n"));
}

#[tokio::test]
async fn test_stop_closes_listener() {
    let server = start(2).await;
    assert!(server.shutdown.is_running());

    server.shutdown.stop();
    let result = timeout(Duration::from_secs(5), server.task).await.unwrap().unwrap();

    assert!(result.is_ok());
    assert!(!server.shutdown.is_running());
    assert!(TcpStream::connect(server.addr).await.is_err());
}

#[tokio::test]
async fn test_stop_serves_connections_already_accepted() {
    for _ in 0..20 {
        let server = start(2).await;
        // Let the accept loop park on the listener
        tokio::task::yield_now().await;

        let mut client = TcpStream::connect(server.addr).await.unwrap();
        client
            .write_all(b"GET /hello.txt HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        server.shutdown.stop();

        let result = timeout(Duration::from_secs(5), server.task).await.unwrap().unwrap();
        assert!(result.is_ok());
        assert_eq!(tokio::runtime::Handle::current().metrics().num_alive_tasks(), 0);

        // Either accepted and fully answered, or never accepted at all
        let mut out = Vec::new();
        let _ = client.read_to_end(&mut out).await;
        let out = String::from_utf8_lossy(&out);
        assert!(out.is_empty() || out.starts_with("HTTP/1.1 200 OK\r\n"), "got {out:?}");
        if !out.is_empty() {
            assert_eq!(body(&out), "plain text");
        }
    }
}
