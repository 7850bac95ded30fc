//! Shared utilities for integration tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Hit counters shared with a running mock server.
#[derive(Clone, Default)]
pub struct Hits {
    total: Arc<AtomicUsize>,
    paths: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl Hits {
    pub fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    pub fn count(&self, path: &str) -> usize {
        self.paths.lock().unwrap().iter().filter(|p| *p == path).count()
    }

    fn record(&self, path: &str) {
        self.total.fetch_add(1, Ordering::SeqCst);
        self.paths.lock().unwrap().push(path.to_string());
    }
}

/// Start a mock site serving `pages` by request path; unknown paths get a 404.
///
/// Returns the bound address and the hit counters.
pub async fn start_page_server(pages: &[(&str, &str)]) -> (SocketAddr, Hits) {
    start_delayed_page_server(pages, Duration::ZERO).await
}

/// Like [`start_page_server`], but every response is held back for `delay`.
pub async fn start_delayed_page_server(pages: &[(&str, &str)], delay: Duration) -> (SocketAddr, Hits) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let pages: Arc<HashMap<String, String>> = Arc::new(
        pages
            .iter()
            .map(|(path, body)| (path.to_string(), body.to_string()))
            .collect(),
    );
    let hits = Hits::default();
    let server_hits = hits.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let pages = pages.clone();
                    let hits = server_hits.clone();
                    tokio::spawn(async move {
                        serve(socket, &pages, &hits, delay).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, hits)
}

/// Start a mock site that answers the n-th request with `responses[n]`,
/// repeating the last entry once the script runs out.
#[allow(dead_code)]
pub async fn start_scripted_server(responses: &[(u16, &str)]) -> (SocketAddr, Hits) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let script: Arc<Vec<(u16, String)>> = Arc::new(
        responses
            .iter()
            .map(|(status, body)| (*status, body.to_string()))
            .collect(),
    );
    let hits = Hits::default();
    let server_hits = hits.clone();

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let Some(path) = read_request_path(&mut socket).await else {
                        continue;
                    };
                    let n = server_hits.total().min(script.len() - 1);
                    server_hits.record(&path);
                    let (status, body) = script[n].clone();
                    tokio::spawn(async move {
                        respond(&mut socket, status, &body).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    (addr, hits)
}

async fn read_request_path(socket: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return None,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let head = String::from_utf8_lossy(&buf);
    Some(
        head.lines()
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .unwrap_or("/")
            .to_string(),
    )
}

async fn respond(socket: &mut TcpStream, status: u16, body: &str) {
    let status_text = match status {
        200 => "200 OK",
        404 => "404 Not Found",
        429 => "429 Too Many Requests",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn serve(mut socket: TcpStream, pages: &HashMap<String, String>, hits: &Hits, delay: Duration) {
    let Some(path) = read_request_path(&mut socket).await else {
        return;
    };
    hits.record(&path);

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    match pages.get(&path) {
        Some(body) => respond(&mut socket, 200, body).await,
        None => respond(&mut socket, 404, "<html><body>not found</body></html>").await,
    }
}
