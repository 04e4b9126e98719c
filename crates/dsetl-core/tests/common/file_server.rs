//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a fixed map of paths to responses: plain bodies, HTML index pages,
//! error statuses, and bodies cut short after advertising a longer
//! Content-Length. Unknown paths get 404. An optional delay is applied
//! before every response.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Route {
    Body(Vec<u8>),
    Html(String),
    Status(u16),
    /// Advertise `advertised` bytes, send `body`, then close the connection.
    Truncated { body: Vec<u8>, advertised: usize },
}

#[derive(Debug, Default, Clone)]
pub struct Routes {
    map: HashMap<String, Route>,
    delay: Duration,
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, path: &str, body: &[u8]) -> Self {
        self.map.insert(path.to_string(), Route::Body(body.to_vec()));
        self
    }

    pub fn html(mut self, path: &str, html: &str) -> Self {
        self.map.insert(path.to_string(), Route::Html(html.to_string()));
        self
    }

    pub fn status(mut self, path: &str, code: u16) -> Self {
        self.map.insert(path.to_string(), Route::Status(code));
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn truncated(mut self, path: &str, body: &[u8], advertised: usize) -> Self {
        self.map.insert(
            path.to_string(),
            Route::Truncated {
                body: body.to_vec(),
                advertised,
            },
        );
        self
    }
}

/// A running server. Lives until the test process exits.
pub struct FileServer {
    base: String,
    requests: Arc<Mutex<Vec<String>>>,
}

impl FileServer {
    /// Base URL with trailing slash, e.g. "http://127.0.0.1:12345/".
    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path.trim_start_matches('/'))
    }

    /// Request paths received so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn hits(&self, path: &str) -> usize {
        self.requests().iter().filter(|p| *p == path).count()
    }
}

pub fn start(routes: Routes) -> FileServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let delay = routes.delay;
    let routes = Arc::new(routes.map);
    let requests = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&requests);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let routes = Arc::clone(&routes);
            let log = Arc::clone(&log);
            thread::spawn(move || handle(stream, &routes, &log, delay));
        }
    });
    FileServer {
        base: format!("http://127.0.0.1:{}/", port),
        requests,
    }
}

fn handle(
    mut stream: TcpStream,
    routes: &HashMap<String, Route>,
    log: &Mutex<Vec<String>>,
    delay: Duration,
) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let Ok(request) = std::str::from_utf8(&buf[..n]) else {
        return;
    };
    let Some((method, path)) = parse_request_line(request) else {
        return;
    };
    log.lock().unwrap().push(path.to_string());
    if !delay.is_zero() {
        thread::sleep(delay);
    }
    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(
            b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }
    match routes.get(path) {
        Some(Route::Body(body)) => respond(&mut stream, "200 OK", "application/octet-stream", body, body.len()),
        Some(Route::Html(html)) => respond(&mut stream, "200 OK", "text/html", html.as_bytes(), html.len()),
        Some(Route::Status(code)) => {
            let status = format!("{} Error", code);
            respond(&mut stream, &status, "text/plain", b"error", 5)
        }
        Some(Route::Truncated { body, advertised }) => {
            respond(&mut stream, "200 OK", "application/octet-stream", body, *advertised)
        }
        None => respond(&mut stream, "404 Not Found", "text/plain", b"not found", 9),
    }
}

fn respond(stream: &mut TcpStream, status: &str, content_type: &str, body: &[u8], length: usize) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status, content_type, length
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

/// Returns (method, path) from the request line.
fn parse_request_line(request: &str) -> Option<(&str, &str)> {
    let line = request.lines().next()?;
    let mut parts = line.split_whitespace();
    let method = parts.next()?;
    let path = parts.next()?;
    Some((method, path))
}
