//! Minimal HTTP/1.1 server for a JSON manifest plus Range-capable media bodies.
//!
//! `GET /list?after=N&limit=M` returns a manifest page; `GET /media/<id>`
//! returns the item body, honouring `Range: bytes=X-Y` with 206 (or, from
//! [`start_ignoring_ranges`], always answering with the whole body and 200).

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone)]
pub struct ServedItem {
    pub id: String,
    pub sequence_id: u64,
    /// "image", "video" or anything else (ignored by the engine).
    pub kind: &'static str,
    pub body: Vec<u8>,
}

impl ServedItem {
    pub fn new(id: &str, sequence_id: u64, kind: &'static str, len: usize) -> Self {
        Self {
            id: id.to_string(),
            sequence_id,
            kind,
            body: (0..len).map(|i| ((i as u64 + sequence_id) % 253) as u8).collect(),
        }
    }
}

/// Starts a server in a background thread. Returns the manifest URL
/// (e.g. "http://127.0.0.1:12345/list"). The server runs until the process exits.
pub fn start(items: Vec<ServedItem>) -> String {
    serve(items, true)
}

/// Like [`start`], but media requests get `200` and the whole body even when
/// they carry a `Range` header.
pub fn start_ignoring_ranges(items: Vec<ServedItem>) -> String {
    serve(items, false)
}

fn serve(items: Vec<ServedItem>, honour_ranges: bool) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let items = Arc::new(items);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let items = Arc::clone(&items);
            thread::spawn(move || handle(stream, &items, port, honour_ranges));
        }
    });
    format!("http://127.0.0.1:{}/list", port)
}

fn handle(mut stream: std::net::TcpStream, items: &[ServedItem], port: u16, honour_ranges: bool) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (target, range) = parse_request(request);
    let range = range.filter(|_| honour_ranges);
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    if path == "/list" {
        let body = manifest_page(items, query, port);
        respond(&mut stream, "200 OK", "application/json", None, body.as_bytes());
        return;
    }
    if let Some(id) = path.strip_prefix("/media/") {
        let Some(item) = items.iter().find(|i| i.id == id) else {
            respond(&mut stream, "404 Not Found", "text/plain", None, b"");
            return;
        };
        let total = item.body.len() as u64;
        match range {
            Some((start, end_incl)) if start < total => {
                let end_excl = end_incl.saturating_add(1).min(total) as usize;
                let slice = &item.body[start as usize..end_excl];
                let cr = format!("bytes {}-{}/{}", start, end_excl - 1, total);
                respond(&mut stream, "206 Partial Content", "video/mp4", Some(&cr), slice);
            }
            Some(_) => {
                let cr = format!("bytes */{}", total);
                respond(&mut stream, "416 Range Not Satisfiable", "text/plain", Some(&cr), b"");
            }
            None => respond(&mut stream, "200 OK", "application/octet-stream", None, &item.body),
        }
        return;
    }
    respond(&mut stream, "404 Not Found", "text/plain", None, b"");
}

fn respond(
    stream: &mut std::net::TcpStream,
    status: &str,
    content_type: &str,
    content_range: Option<&str>,
    body: &[u8],
) {
    let cr = content_range
        .map(|v| format!("Content-Range: {}\r\n", v))
        .unwrap_or_default();
    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\n{}Connection: close\r\n\r\n",
        status,
        content_type,
        body.len(),
        cr
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

fn manifest_page(items: &[ServedItem], query: &str, port: u16) -> String {
    let mut after = 0u64;
    let mut limit = 100usize;
    for pair in query.split('&') {
        match pair.split_once('=') {
            Some(("after", v)) => after = v.parse().unwrap_or(0),
            Some(("limit", v)) => limit = v.parse().unwrap_or(100),
            _ => {}
        }
    }
    let mut sorted: Vec<&ServedItem> = items.iter().filter(|i| i.sequence_id > after).collect();
    sorted.sort_by_key(|i| i.sequence_id);
    let page: Vec<&ServedItem> = sorted.iter().copied().take(limit).collect();
    let next_after = if sorted.len() > limit {
        page.last().map(|i| i.sequence_id)
    } else {
        None
    };
    let entries: Vec<serde_json::Value> = page
        .iter()
        .map(|i| {
            serde_json::json!({
                "id": i.id,
                "sequence_id": i.sequence_id,
                "kind": i.kind,
                "size": i.body.len(),
                "url": format!("http://127.0.0.1:{}/media/{}", port, i.id),
            })
        })
        .collect();
    serde_json::json!({ "items": entries, "next_after": next_after }).to_string()
}

/// Returns (request target, optional (start, end_inclusive) for Range: bytes=X-Y).
fn parse_request(request: &str) -> (&str, Option<(u64, u64)>) {
    let mut target = "";
    let mut range = None;
    for (i, line) in request.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if i == 0 {
            target = line.split_whitespace().nth(1).unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if let Some(part) = value.strip_prefix("bytes=") {
                    if let Some((a, b)) = part.split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end_incl = b.trim().parse::<u64>().unwrap_or(u64::MAX);
                        range = Some((start, end_incl));
                    }
                }
            }
        }
    }
    (target, range)
}
