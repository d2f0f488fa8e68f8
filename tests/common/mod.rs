//! Minimal in-process conversion backend for integration tests.
//!
//! One thread per connection, one request per connection (`Connection:
//! close`). Implements the seven endpoints the client uses with a
//! configurable format table and per-endpoint failure injection. Every
//! request is recorded so tests can assert call order.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct MockBehavior {
    /// `/supported-formats/` payload.
    pub formats: Vec<&'static str>,
    /// Alias → canonical, for `/correct-format/`.
    pub aliases: Vec<(&'static str, &'static str)>,
    /// Source → reachable targets, for `/supported-conversions/`.
    pub conversions: Vec<(&'static str, Vec<&'static str>)>,
    /// Id issued to an upload with `session_id=new`.
    pub issued_session: &'static str,
    /// Endpoint name (`"upload"`, `"convert"`, …) → (status, raw body).
    pub failures: HashMap<&'static str, (u16, String)>,
    /// Overrides the `file_name` header on `/download/`.
    pub download_header: Option<&'static str>,
}

impl Default for MockBehavior {
    fn default() -> Self {
        Self {
            formats: vec!["JPEG", "PNG", "WAV", "MP3"],
            aliases: vec![("JPG", "JPEG")],
            conversions: vec![
                ("JPEG", vec!["PNG", "WEBP"]),
                ("PNG", vec!["JPEG"]),
                ("WAV", vec!["MP3"]),
            ],
            issued_session: "sess-1",
            failures: HashMap::new(),
            download_header: None,
        }
    }
}

impl MockBehavior {
    /// Make `endpoint` answer with `status` and a JSON `{"detail": …}` body.
    pub fn fail_with_detail(mut self, endpoint: &'static str, status: u16, detail: &str) -> Self {
        let body = format!("{{\"detail\":{}}}", json_string(detail));
        self.failures.insert(endpoint, (status, body));
        self
    }

    /// Make `endpoint` answer with `status` and a raw body.
    pub fn fail_raw(mut self, endpoint: &'static str, status: u16, body: &str) -> Self {
        self.failures.insert(endpoint, (status, body.to_string()));
        self
    }
}

/// One request as seen by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub method: String,
    /// Endpoint name without slashes, e.g. `upload`.
    pub endpoint: String,
    pub query: Vec<(String, String)>,
}

impl Recorded {
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Default)]
struct State {
    log: Vec<Recorded>,
    /// session → (uploaded file name, uploaded bytes)
    uploads: HashMap<String, (String, Vec<u8>)>,
    /// session → converted file name
    converted: HashMap<String, String>,
}

pub struct MockServer {
    /// Base URL with a trailing slash.
    pub url: String,
    state: Arc<Mutex<State>>,
}

impl MockServer {
    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().log.clone()
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.endpoint).collect()
    }

    pub fn uploaded(&self, session: &str) -> Option<(String, Vec<u8>)> {
        self.state.lock().unwrap().uploads.get(session).cloned()
    }
}

/// Bytes the mock "converts" an upload into.
pub fn converted_bytes(uploaded: &[u8], to: &str) -> Vec<u8> {
    let mut out = format!("{to}:").into_bytes();
    out.extend_from_slice(uploaded);
    out
}

pub fn start() -> MockServer {
    start_with(MockBehavior::default())
}

/// Starts the server in a background thread. Runs until the process exits.
pub fn start_with(behavior: MockBehavior) -> MockServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let state = Arc::new(Mutex::new(State::default()));
    let behavior = Arc::new(behavior);
    let shared = Arc::clone(&state);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let state = Arc::clone(&shared);
            let behavior = Arc::clone(&behavior);
            thread::spawn(move || handle(stream, &behavior, &state));
        }
    });
    MockServer {
        url: format!("http://127.0.0.1:{port}/"),
        state,
    }
}

// ── Request parsing ──────────────────────────────────────────────────────────

struct Request {
    method: String,
    endpoint: String,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Request {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];
    let head_end = loop {
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut chunk).ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let head = std::str::from_utf8(&buf[..head_end]).ok()?.to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let target = request_line.next()?.to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let (path, query) = target.split_once('?').unwrap_or((target.as_str(), ""));
    let endpoint = path.trim_matches('/').to_string();
    let query = parse_query(query);

    let mut body = buf[head_end + 4..].to_vec();
    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok());
    let chunked = headers.iter().any(|(k, v)| {
        k.eq_ignore_ascii_case("transfer-encoding") && v.eq_ignore_ascii_case("chunked")
    });

    if let Some(len) = content_length {
        while body.len() < len {
            let n = stream.read(&mut chunk).ok()?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        body.truncate(len);
    } else if chunked {
        while find(&body, b"0\r\n\r\n").is_none() {
            let n = stream.read(&mut chunk).ok()?;
            if n == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..n]);
        }
        body = dechunk(&body);
    }

    Some(Request {
        method,
        endpoint,
        query,
        headers,
        body,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn dechunk(mut raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    while let Some(line_end) = find(raw, b"\r\n") {
        let size = std::str::from_utf8(&raw[..line_end])
            .ok()
            .and_then(|s| usize::from_str_radix(s.split(';').next().unwrap_or("").trim(), 16).ok())
            .unwrap_or(0);
        if size == 0 {
            break;
        }
        let start = line_end + 2;
        let end = (start + size).min(raw.len());
        out.extend_from_slice(&raw[start..end]);
        raw = raw.get(end + 2..).unwrap_or(&[]);
    }
    out
}

fn parse_query(q: &str) -> Vec<(String, String)> {
    q.split('&')
        .filter(|p| !p.is_empty())
        .map(|p| {
            let (k, v) = p.split_once('=').unwrap_or((p, ""));
            (percent_decode(k), percent_decode(v))
        })
        .collect()
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
                match u8::from_str_radix(hex, 16) {
                    Ok(b) => {
                        out.push(b);
                        i += 2;
                    }
                    Err(_) => out.push(b'%'),
                }
            }
            b => out.push(b),
        }
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// (file name, contents) of the first multipart part.
fn multipart_file(req: &Request) -> Option<(String, Vec<u8>)> {
    let boundary = req
        .header("content-type")?
        .split(';')
        .find_map(|p| p.trim().strip_prefix("boundary="))?
        .trim_matches('"')
        .to_string();
    let body = &req.body;
    let part_head_end = find(body, b"\r\n\r\n")?;
    let part_head = String::from_utf8_lossy(&body[..part_head_end]);
    let name = part_head
        .split("filename=\"")
        .nth(1)?
        .split('"')
        .next()?
        .to_string();
    let data_start = part_head_end + 4;
    let closing = format!("\r\n--{boundary}");
    let data_len = find(&body[data_start..], closing.as_bytes())?;
    Some((name, body[data_start..data_start + data_len].to_vec()))
}

// ── Responses ────────────────────────────────────────────────────────────────

fn json_string(s: &str) -> String {
    let mut out = String::from("\"");
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn json_list(items: &[&str]) -> String {
    let parts: Vec<String> = items.iter().map(|s| json_string(s)).collect();
    format!("[{}]", parts.join(","))
}

fn respond(stream: &mut TcpStream, status: u16, extra_headers: &[(&str, String)], body: &[u8]) {
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        422 => "Unprocessable Entity",
        500 => "Internal Server Error",
        _ => "Status",
    };
    let mut head = format!(
        "HTTP/1.1 {status} {reason}\r\nContent-Length: {}\r\nConnection: close\r\n",
        body.len()
    );
    for (k, v) in extra_headers {
        head.push_str(&format!("{k}: {v}\r\n"));
    }
    head.push_str("\r\n");
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
    let _ = stream.flush();
}

fn json(stream: &mut TcpStream, body: String) {
    respond(
        stream,
        200,
        &[("Content-Type", "application/json".to_string())],
        body.as_bytes(),
    );
}

fn detail(stream: &mut TcpStream, status: u16, message: &str) {
    let body = format!("{{\"detail\":{}}}", json_string(message));
    respond(
        stream,
        status,
        &[("Content-Type", "application/json".to_string())],
        body.as_bytes(),
    );
}

fn handle(mut stream: TcpStream, behavior: &MockBehavior, state: &Mutex<State>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(5)));
    let Some(req) = read_request(&mut stream) else {
        return;
    };

    state.lock().unwrap().log.push(Recorded {
        method: req.method.clone(),
        endpoint: req.endpoint.clone(),
        query: req.query.clone(),
    });

    if let Some((status, body)) = behavior.failures.get(req.endpoint.as_str()) {
        respond(
            &mut stream,
            *status,
            &[("Content-Type", "application/json".to_string())],
            body.as_bytes(),
        );
        return;
    }

    match (req.method.as_str(), req.endpoint.as_str()) {
        ("GET", "supported-formats") => json(&mut stream, json_list(&behavior.formats)),
        ("GET", "correct-format") => {
            let raw = req.param("format").unwrap_or("").to_uppercase();
            let corrected = behavior
                .aliases
                .iter()
                .find(|(alias, _)| *alias == raw)
                .map(|(_, canonical)| canonical.to_string())
                .unwrap_or(raw);
            json(&mut stream, json_string(&corrected));
        }
        ("GET", "supported-conversions") => {
            let format = req.param("format").unwrap_or("").to_uppercase();
            let targets = behavior
                .conversions
                .iter()
                .find(|(from, _)| *from == format)
                .map(|(_, to)| to.clone())
                .unwrap_or_default();
            json(&mut stream, json_list(&targets));
        }
        ("GET", "is-valid-conversion") => {
            let from = req.param("from_format").unwrap_or("").to_uppercase();
            let to = req.param("to_format").unwrap_or("").to_uppercase();
            let valid = behavior
                .conversions
                .iter()
                .any(|(f, targets)| *f == from && targets.iter().any(|t| *t == to));
            json(&mut stream, valid.to_string());
        }
        ("POST", "upload") => {
            let Some((name, contents)) = multipart_file(&req) else {
                detail(&mut stream, 422, "No file part in request");
                return;
            };
            let requested = req.param("session_id").unwrap_or("new");
            let session = if requested == "new" {
                behavior.issued_session.to_string()
            } else {
                requested.to_string()
            };
            state
                .lock()
                .unwrap()
                .uploads
                .insert(session.clone(), (name.clone(), contents));
            json(
                &mut stream,
                format!(
                    "{{\"session_id\":{},\"file_name\":{}}}",
                    json_string(&session),
                    json_string(&name)
                ),
            );
        }
        ("PATCH", "convert") => {
            let session = req.param("session_id").unwrap_or("").to_string();
            let to = req.param("to_format").unwrap_or("").to_lowercase();
            let mut st = state.lock().unwrap();
            let Some((name, _)) = st.uploads.get(&session).cloned() else {
                drop(st);
                detail(&mut stream, 404, "Session not found");
                return;
            };
            let stem = name.rsplit_once('.').map(|(s, _)| s).unwrap_or(&name);
            let new_name = format!("{stem}.{to}");
            st.converted.insert(session, new_name.clone());
            drop(st);
            json(
                &mut stream,
                format!("{{\"new_file_name\":{}}}", json_string(&new_name)),
            );
        }
        ("GET", "download") => {
            let session = req.param("session_id").unwrap_or("").to_string();
            let st = state.lock().unwrap();
            let found = st.converted.get(&session).cloned().and_then(|name| {
                st.uploads
                    .get(&session)
                    .map(|(_, bytes)| (name, bytes.clone()))
            });
            drop(st);
            let Some((name, bytes)) = found else {
                detail(&mut stream, 404, "Nothing converted for this session");
                return;
            };
            let to = name.rsplit_once('.').map(|(_, e)| e).unwrap_or("");
            let header = behavior
                .download_header
                .map(str::to_string)
                .unwrap_or_else(|| name.clone());
            respond(
                &mut stream,
                200,
                &[
                    ("Content-Type", "application/octet-stream".to_string()),
                    ("file_name", header),
                ],
                &converted_bytes(&bytes, to),
            );
        }
        _ => respond(&mut stream, 405, &[], b""),
    }
}
