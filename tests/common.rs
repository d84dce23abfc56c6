#![allow(dead_code)]

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;
use tinyr2::{CompressionError, Compressor, ObjectStore, Task, UploadError};

pub const FAIL_MARKER: &[u8] = b"fail";

/// Environment that passes config validation but points both services at a
/// port nobody listens on.
pub fn unreachable_env() -> Vec<(&'static str, &'static str)> {
    vec![
        ("TINIFY_TOKEN", "test-token"),
        ("TINIFY_ENDPOINT", "http://127.0.0.1:1"),
        ("PREFIX", "blog"),
        ("BUCKET_NAME", "assets"),
        ("R2_ENDPOINT_URL", "http://127.0.0.1:1"),
        ("R2_ACCESS_KEY_ID", "key-id"),
        ("R2_SECRET_ACCESS_KEY", "secret"),
    ]
}

/// Environment with both services pointed at `base_url`.
pub fn local_env(base_url: &str) -> Vec<(&'static str, String)> {
    unreachable_env()
        .into_iter()
        .map(|(key, value)| match key {
            "TINIFY_ENDPOINT" | "R2_ENDPOINT_URL" => (key, base_url.to_string()),
            _ => (key, value.to_string()),
        })
        .collect()
}

/// The binary with a clean environment, running inside `dir`.
pub fn tinyr2_cmd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("tinyr2").unwrap();
    cmd.env_clear().current_dir(dir);
    cmd
}

pub fn create_image_dir(temp_dir: &TempDir, names: &[&str]) {
    let images = temp_dir.child("images");
    images.create_dir_all().unwrap();
    for name in names {
        images
            .child(name)
            .write_str(&format!("fake image data for {name}"))
            .unwrap();
    }
}

/// Writes each payload to its own file and returns the matching tasks.
pub fn create_tasks(dir: &Path, payloads: &[Vec<u8>]) -> Vec<Task> {
    payloads
        .iter()
        .enumerate()
        .map(|(i, payload)| {
            let path = dir.join(format!("img{i:03}.png"));
            std::fs::write(&path, payload).unwrap();
            Task::new(path, "blog").unwrap()
        })
        .collect()
}

/// Echoes the input back, except payloads starting with [`FAIL_MARKER`].
#[derive(Default)]
pub struct EchoCompressor {
    pub calls: Mutex<usize>,
}

impl Compressor for EchoCompressor {
    fn compress(&self, data: &[u8]) -> Result<Vec<u8>, CompressionError> {
        *self.calls.lock().unwrap() += 1;
        if data.starts_with(FAIL_MARKER) {
            return Err(CompressionError::Transport("connection reset".to_string()));
        }
        Ok(data.to_vec())
    }
}

#[derive(Default)]
pub struct RecordingStore {
    pub keys: Mutex<Vec<String>>,
}

impl ObjectStore for RecordingStore {
    fn put(&self, key: &str, _data: &[u8], _content_type: &str) -> Result<(), UploadError> {
        self.keys.lock().unwrap().push(key.to_string());
        Ok(())
    }
}

/// One request as seen by [`CannedServer`]. Header names are lowercased.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(String::as_str)
    }
}

#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CannedResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn json(self, body: &str) -> Self {
        self.header("Content-Type", "application/json").body(body)
    }
}

type Responder = dyn Fn(&RecordedRequest) -> CannedResponse + Send + Sync;

/// Minimal HTTP/1.1 server on a random local port. Every connection gets one
/// answer from the responder and is then closed.
pub struct CannedServer {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl CannedServer {
    pub fn start<F>(responder: F) -> Self
    where
        F: Fn(&RecordedRequest) -> CannedResponse + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let responder: Arc<Responder> = Arc::new(responder);

        let recorded = Arc::clone(&requests);
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(stream) = stream else { break };
                let recorded = Arc::clone(&recorded);
                let responder = Arc::clone(&responder);
                thread::spawn(move || serve_one(stream, &recorded, responder.as_ref()));
            }
        });

        Self { base_url, requests }
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_with_method(&self, method: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }
}

/// Answers the Tinify and S3 calls of a successful run: shrink points at an
/// output URL, the output serves a fixed body, and every PUT is accepted.
pub fn happy_path_responder(request: &RecordedRequest) -> CannedResponse {
    match (request.method.as_str(), request.path.as_str()) {
        ("POST", "/shrink") => CannedResponse::new(201)
            .header("Location", &format!("/output/{}", request.body.len()))
            .header("Compression-Count", "7")
            .json(r#"{"input":{},"output":{}}"#),
        ("GET", path) if path.starts_with("/output/") => {
            CannedResponse::new(200).body(b"compressed".to_vec())
        }
        ("PUT", _) => {
            CannedResponse::new(200).header("ETag", "\"d41d8cd98f00b204e9800998ecf8427e\"")
        }
        _ => CannedResponse::new(404),
    }
}

fn serve_one(stream: TcpStream, recorded: &Mutex<Vec<RecordedRequest>>, responder: &Responder) {
    let mut reader = BufReader::new(stream);
    let Some(request) = read_request(&mut reader) else {
        return;
    };
    recorded.lock().unwrap().push(request.clone());

    let response = responder(&request);
    let mut head = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
        response.status,
        reason_phrase(response.status),
        response.body.len()
    );
    for (name, value) in &response.headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str("\r\n");

    let mut stream = reader.into_inner();
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(&response.body);
    let _ = stream.flush();
}

fn read_request(reader: &mut BufReader<TcpStream>) -> Option<RecordedRequest> {
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut headers = HashMap::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).ok()? == 0 {
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.insert(name.trim().to_lowercase(), value.trim().to_string());
        }
    }

    let body = if headers
        .get("transfer-encoding")
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked"))
    {
        read_chunked(reader)?
    } else {
        let length = headers
            .get("content-length")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);
        let mut body = vec![0u8; length];
        reader.read_exact(&mut body).ok()?;
        body
    };

    Some(RecordedRequest {
        method,
        path,
        headers,
        body,
    })
}

fn read_chunked(reader: &mut BufReader<TcpStream>) -> Option<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line).ok()?;
        let size_hex = size_line.trim().split(';').next()?;
        let size = usize::from_str_radix(size_hex, 16).ok()?;

        let mut chunk = vec![0u8; size + 2];
        reader.read_exact(&mut chunk).ok()?;
        if size == 0 {
            return Some(body);
        }
        body.extend_from_slice(&chunk[..size]);
    }
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        401 => "Unauthorized",
        403 => "Forbidden",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}
