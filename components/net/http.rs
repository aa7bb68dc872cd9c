/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at http://mozilla.org/MPL/2.0/. */

use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::net::TcpStream;

use crate::{NetError, Request, Url};

/// The headers and body of a completed request.
pub struct Response {
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// The seam `wisp-script`'s `Tab` loads pages and subresources through.
/// Kept as a trait so tests can substitute a fixture client without opening
/// real sockets.
pub trait HttpClient {
    fn request(&self, request: Request<'_>) -> Result<Response, NetError>;
}

/// A blocking HTTP/1.0 client plus a `file://` loader: connect, send
/// `GET`/`POST` with a `Host` header (and a `Content-Length` header when a
/// body is present), and read a status line, headers and body off the
/// socket.
///
/// `transfer-encoding` and `content-encoding` responses are rejected rather
/// than decoded.
pub struct BlockingHttpClient;

impl HttpClient for BlockingHttpClient {
    fn request(&self, request: Request<'_>) -> Result<Response, NetError> {
        match request.url.scheme.as_str() {
            "file" => read_file(request.url),
            "http" => request_http(request),
            "https" => {
                log::warn!(
                    "refusing https request to {}: no tls support",
                    request.url.host
                );
                Err(NetError::UnsupportedScheme("https".to_string()))
            }
            other => Err(NetError::UnsupportedScheme(other.to_string())),
        }
    }
}

fn read_file(url: &Url) -> Result<Response, NetError> {
    let body = fs::read_to_string(&url.path)?;
    Ok(Response {
        headers: HashMap::new(),
        body,
    })
}

/// Builds the request line and headers for `url`/`body`, without sending
/// anything. Split out from [`request_http`] so the GET-vs-POST and
/// `Content-Length` logic is unit-testable without a real socket.
fn request_head(url: &Url, body: Option<&str>) -> String {
    let method = if body.is_some() { "POST" } else { "GET" };
    let mut head = format!("{method} {} HTTP/1.0\r\nHost: {}\r\n", url.path, url.host);
    if let Some(body) = body {
        head.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    head.push_str("\r\n");
    head
}

fn request_http(request: Request<'_>) -> Result<Response, NetError> {
    let url = request.url;
    let mut stream = TcpStream::connect((url.host.as_str(), url.port))?;

    let head = request_head(url, request.body);
    stream.write_all(head.as_bytes())?;
    if let Some(body) = request.body {
        stream.write_all(body.as_bytes())?;
    }

    let mut raw = Vec::new();
    stream.read_to_end(&mut raw)?;
    let text = String::from_utf8_lossy(&raw);

    let mut lines = text.split("\r\n");
    let status_line = lines
        .next()
        .ok_or_else(|| NetError::MalformedResponse("missing status line".to_string()))?;
    let mut parts = status_line.splitn(3, ' ');
    let _version = parts
        .next()
        .ok_or_else(|| NetError::MalformedResponse("missing http version".to_string()))?;
    let _status = parts
        .next()
        .ok_or_else(|| NetError::MalformedResponse("missing status code".to_string()))?;

    let mut headers = HashMap::new();
    let mut body_start = 0;
    let mut consumed = status_line.len() + 2;

    for line in lines {
        consumed += line.len() + 2;
        if line.is_empty() {
            body_start = consumed;
            break;
        }
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| NetError::MalformedResponse(format!("malformed header: {line}")))?;
        headers.insert(name.trim().to_lowercase(), value.trim().to_string());
    }

    if headers.contains_key("transfer-encoding") {
        return Err(NetError::MalformedResponse(
            "chunked transfer-encoding is not supported".to_string(),
        ));
    }
    if headers.contains_key("content-encoding") {
        return Err(NetError::MalformedResponse(
            "content-encoding is not supported".to_string(),
        ));
    }

    let body = text
        .get(body_start..)
        .unwrap_or_default()
        .to_string();

    Ok(Response { headers, body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_file_loads_local_contents() {
        let path = std::env::temp_dir().join("wisp-net-test.html");
        std::fs::write(&path, "<html></html>").unwrap();
        let url = Url {
            scheme: "file".to_string(),
            host: String::new(),
            port: 0,
            path: path.to_str().unwrap().to_string(),
        };

        let response = read_file(&url).unwrap();
        assert_eq!(response.body, "<html></html>");
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn get_request_has_no_content_length() {
        let url = Url::parse("http://example.org/a").unwrap();
        let head = request_head(&url, None);
        assert!(head.starts_with("GET /a HTTP/1.0\r\n"));
        assert!(!head.contains("Content-Length"));
    }

    #[test]
    fn post_request_sends_content_length() {
        let url = Url::parse("http://example.org/submit").unwrap();
        let head = request_head(&url, Some("name=value"));
        assert!(head.starts_with("POST /submit HTTP/1.0\r\n"));
        assert!(head.contains("Content-Length: 10\r\n"));
    }
}
