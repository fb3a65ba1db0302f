//! Minimal HTTP/1.1 server emulating the Bot API methods the bot uses.
//!
//! Answers `getMe`, `getFile`, `sendMessage`, `editMessageText` and
//! `getUpdates` as form-encoded POSTs, and serves file bodies under
//! `/file/bot<token>/`. Every request is recorded for assertions.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub const TOKEN: &str = "123:test-token";

/// One request seen by the server: method name (or file path) and form params.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub params: HashMap<String, String>,
}

#[derive(Default)]
struct State {
    files: HashMap<String, Vec<u8>>,
    updates: Vec<serde_json::Value>,
    requests: Vec<Recorded>,
    next_message_id: i64,
}

/// Handle to a running server.
#[derive(Clone)]
pub struct ApiServer {
    pub base_url: String,
    state: Arc<Mutex<State>>,
}

impl ApiServer {
    /// Starts a server in a background thread. The server runs until the process exits.
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let state = Arc::new(Mutex::new(State {
            next_message_id: 100,
            ..State::default()
        }));
        let shared = Arc::clone(&state);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let state = Arc::clone(&shared);
                thread::spawn(move || handle(stream, &state));
            }
        });
        ApiServer {
            base_url: format!("http://127.0.0.1:{}", port),
            state,
        }
    }

    /// Make `body` downloadable under `file_id`.
    pub fn add_file(&self, file_id: &str, body: &[u8]) {
        self.state.lock().unwrap().files.insert(file_id.to_string(), body.to_vec());
    }

    /// Queue an update returned by the next `getUpdates` whose offset allows it.
    pub fn push_update(&self, update: serde_json::Value) {
        self.state.lock().unwrap().updates.push(update);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.lock().unwrap().requests.clone()
    }

    /// Texts of `sendMessage` / `editMessageText` calls, prefixed with `send:` / `edit:`.
    pub fn chat_log(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter_map(|r| {
                let text = r.params.get("text")?.clone();
                match r.method.as_str() {
                    "sendMessage" => Some(format!("send:{text}")),
                    "editMessageText" => Some(format!("edit:{text}")),
                    _ => None,
                }
            })
            .collect()
    }
}

fn read_request(stream: &mut TcpStream) -> Option<(String, String, Vec<u8>)> {
    let mut data = Vec::new();
    let mut buf = [0u8; 8192];
    let header_end = loop {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buf[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };
    let head = String::from_utf8_lossy(&data[..header_end]).into_owned();
    let mut lines = head.lines();
    let mut request_line = lines.next()?.split_whitespace();
    let verb = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();
    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    let mut body = data[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut buf).ok()?;
        if n == 0 {
            break;
        }
        body.extend_from_slice(&buf[..n]);
    }
    Some((verb, path, body))
}

fn respond(stream: &mut TcpStream, status: &str, content_type: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        content_type,
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

fn respond_json(stream: &mut TcpStream, status: &str, value: serde_json::Value) {
    respond(stream, status, "application/json", value.to_string().as_bytes());
}

fn handle(mut stream: TcpStream, state: &Mutex<State>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));
    let Some((verb, path, body)) = read_request(&mut stream) else {
        return;
    };

    let file_prefix = format!("/file/bot{}/", TOKEN);
    if verb.eq_ignore_ascii_case("GET") {
        if let Some(file_path) = path.strip_prefix(&file_prefix) {
            let file_id = file_path.rsplit('/').next().unwrap_or_default().to_string();
            let body = {
                let mut st = state.lock().unwrap();
                st.requests.push(Recorded {
                    method: format!("file:{file_path}"),
                    params: HashMap::new(),
                });
                st.files.get(&file_id).cloned()
            };
            match body {
                Some(b) => respond(&mut stream, "200 OK", "application/octet-stream", &b),
                None => respond(&mut stream, "404 Not Found", "text/plain", b"not found"),
            }
            return;
        }
        respond(&mut stream, "404 Not Found", "text/plain", b"not found");
        return;
    }

    let method_prefix = format!("/bot{}/", TOKEN);
    let Some(method) = path.strip_prefix(&method_prefix) else {
        respond_json(
            &mut stream,
            "401 Unauthorized",
            serde_json::json!({"ok": false, "error_code": 401, "description": "Unauthorized"}),
        );
        return;
    };
    let params: HashMap<String, String> = url::form_urlencoded::parse(&body).into_owned().collect();

    let mut st = state.lock().unwrap();
    st.requests.push(Recorded {
        method: method.to_string(),
        params: params.clone(),
    });
    let (status, value) = match method {
        "getMe" => (
            "200 OK",
            serde_json::json!({"ok": true, "result": {"id": 1, "is_bot": true, "first_name": "Files", "username": "files_bot"}}),
        ),
        "getFile" => {
            let file_id = params.get("file_id").cloned().unwrap_or_default();
            if st.files.contains_key(&file_id) {
                (
                    "200 OK",
                    serde_json::json!({"ok": true, "result": {"file_id": file_id, "file_path": format!("documents/{file_id}")}}),
                )
            } else {
                (
                    "400 Bad Request",
                    serde_json::json!({"ok": false, "error_code": 400, "description": "Bad Request: invalid file_id"}),
                )
            }
        }
        "sendMessage" => {
            st.next_message_id += 1;
            let chat_id: i64 = params.get("chat_id").and_then(|c| c.parse().ok()).unwrap_or(0);
            (
                "200 OK",
                serde_json::json!({"ok": true, "result": {"message_id": st.next_message_id, "chat": {"id": chat_id}, "text": params.get("text")}}),
            )
        }
        "editMessageText" => ("200 OK", serde_json::json!({"ok": true, "result": true})),
        "getUpdates" => {
            let offset: i64 = params.get("offset").and_then(|o| o.parse().ok()).unwrap_or(0);
            let pending: Vec<serde_json::Value> = st
                .updates
                .iter()
                .filter(|u| u["update_id"].as_i64().unwrap_or(0) >= offset)
                .cloned()
                .collect();
            ("200 OK", serde_json::json!({"ok": true, "result": pending}))
        }
        _ => (
            "404 Not Found",
            serde_json::json!({"ok": false, "error_code": 404, "description": "Not Found: method not found"}),
        ),
    };
    drop(st);
    respond_json(&mut stream, status, value);
}
