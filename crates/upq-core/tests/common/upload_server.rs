//! Minimal HTTP/1.1 server accepting multipart uploads for integration tests.
//!
//! One request per connection. Tracks how many uploads are in flight at once
//! so tests can assert the admission ceiling end to end.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct UploadServerOptions {
    /// Hold each request open this long before responding (to make
    /// concurrent transfers observable).
    pub delay: Option<Duration>,
    /// Reject any upload whose multipart body names one of these files,
    /// responding 422 with a structured error.
    pub reject_names: Vec<String>,
    /// Structured error message used for rejections.
    pub reject_message: String,
    /// If true, respond 200 with a body that has no `files` array.
    pub omit_descriptor: bool,
}

/// Counters observed by tests.
#[derive(Debug, Default)]
pub struct ServerStats {
    pub in_flight: AtomicUsize,
    pub high_water: AtomicUsize,
    pub requests: AtomicUsize,
}

impl ServerStats {
    pub fn high_water(&self) -> usize {
        self.high_water.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

/// Starts the server on an ephemeral port. Returns the upload endpoint URL
/// and the shared stats. The server runs until the process exits.
pub fn start(opts: UploadServerOptions) -> (String, Arc<ServerStats>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let stats = Arc::new(ServerStats::default());
    let stats_srv = Arc::clone(&stats);
    let opts = Arc::new(opts);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let stats = Arc::clone(&stats_srv);
            let opts = Arc::clone(&opts);
            thread::spawn(move || handle(stream, &opts, &stats));
        }
    });
    (format!("http://127.0.0.1:{}/api/upload", port), stats)
}

fn handle(mut stream: std::net::TcpStream, opts: &UploadServerOptions, stats: &ServerStats) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));

    let Some(body) = read_request(&mut stream) else {
        return;
    };

    stats.requests.fetch_add(1, Ordering::SeqCst);
    let now = stats.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    stats.high_water.fetch_max(now, Ordering::SeqCst);

    if let Some(delay) = opts.delay {
        thread::sleep(delay);
    }

    let rejected = opts
        .reject_names
        .iter()
        .find(|name| contains(&body, format!("filename=\"{}\"", name).as_bytes()));

    let (status, response_body) = if let Some(_name) = rejected {
        (
            "422 Unprocessable Entity",
            format!(r#"{{"error":"{}"}}"#, opts.reject_message),
        )
    } else if opts.omit_descriptor {
        ("200 OK", "{}".to_string())
    } else {
        (
            "200 OK",
            format!(
                r#"{{"files":[{{"url":"/files/1","filename":"up.bin","size":{}}}]}}"#,
                body.len()
            ),
        )
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        response_body.len(),
        response_body
    );
    let _ = stream.write_all(response.as_bytes());
    stats.in_flight.fetch_sub(1, Ordering::SeqCst);
}

/// Reads one request: headers, optional `100 Continue` handshake, then the
/// full Content-Length body. Returns None on a malformed request.
fn read_request(stream: &mut std::net::TcpStream) -> Option<Vec<u8>> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let header_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let headers = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length: usize = headers
        .lines()
        .find_map(|l| {
            let (name, value) = l.split_once(':')?;
            if name.trim().eq_ignore_ascii_case("content-length") {
                value.trim().parse().ok()
            } else {
                None
            }
        })
        .unwrap_or(0);

    if headers.to_ascii_lowercase().contains("expect: 100-continue") {
        let _ = stream.write_all(b"HTTP/1.1 100 Continue\r\n\r\n");
    }

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&chunk[..n]);
    }
    Some(body)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|w| w == needle)
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    find(haystack, needle).is_some()
}
