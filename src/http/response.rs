//! Response framing.
//!
//! # Responsibilities
//! - Hold status, content type and a fully buffered body
//! - Serialize the status line and the minimal header set
//! - Provide the fixed error responses (404, 408, 500)
//!
//! # Design Decisions
//! - Every response carries `Content-Length` and `Connection: close`;
//!   one request per connection
//! - Bodies are always known before writing starts

use std::borrow::Cow;

use http::StatusCode;
use tokio::io::{AsyncWrite, AsyncWriteExt};

pub const TEXT_PLAIN: &str = "text/plain";
pub const TEXT_HTML: &str = "text/html";

const NOT_FOUND_BODY: &str = "<h1>File not found 404</h1>";
const TIMEOUT_BODY: &str = "Request Timeout";
const HANDLER_ERROR_BODY: &str = "ERROR";

/// A complete HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: StatusCode,
    content_type: Cow<'static, str>,
    body: Vec<u8>,
}

impl Response {
    pub fn new(status: StatusCode, content_type: impl Into<Cow<'static, str>>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    /// 200 with the given content type.
    pub fn ok(content_type: impl Into<Cow<'static, str>>, body: impl Into<Vec<u8>>) -> Self {
        Self::new(StatusCode::OK, content_type, body)
    }

    /// 200 `text/plain`, the shape of every successful dynamic response.
    pub fn text(body: impl Into<Vec<u8>>) -> Self {
        Self::ok(TEXT_PLAIN, body)
    }

    /// 404 with a small HTML body.
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, TEXT_HTML, NOT_FOUND_BODY)
    }

    /// 408, written when the request head never arrived.
    pub fn request_timeout() -> Self {
        Self::new(StatusCode::REQUEST_TIMEOUT, TEXT_PLAIN, TIMEOUT_BODY)
    }

    /// 500 with the fixed `ERROR` body.
    pub fn handler_error() -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "text/plain; charset=utf-8",
            HANDLER_ERROR_BODY,
        )
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Status line and headers, including the terminating blank line.
    pub fn head(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.status.as_u16(),
            self.status.canonical_reason().unwrap_or(""),
            self.content_type,
            self.body.len()
        )
    }

    /// Write head and body, then flush.
    pub async fn write_to<W>(&self, writer: &mut W) -> std::io::Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        writer.write_all(self.head().as_bytes()).await?;
        writer.write_all(&self.body).await?;
        writer.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_has_minimal_headers() {
        let response = Response::ok("text/css", "body{}");
        assert_eq!(
            response.head(),
            "HTTP/1.1 200 OK\r\nContent-Type: text/css\r\nContent-Length: 6\r\nConnection: close\r\n\r\n"
        );
    }

    #[test]
    fn fixed_responses() {
        let nf = Response::not_found();
        assert_eq!(nf.status(), StatusCode::NOT_FOUND);
        assert_eq!(nf.content_type(), "text/html");
        assert!(nf.head().starts_with("HTTP/1.1 404 Not Found\r\n"));

        let timeout = Response::request_timeout();
        assert!(timeout.head().starts_with("HTTP/1.1 408 Request Timeout\r\n"));
        assert_eq!(timeout.body(), b"Request Timeout");

        let err = Response::handler_error();
        assert!(err.head().starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert_eq!(err.body(), b"ERROR");
    }

    #[tokio::test]
    async fn writes_head_then_body() {
        let mut out = Vec::new();
        Response::text("Hello, World!").write_to(&mut out).await.unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n"));
        assert!(text.ends_with("\r\n\r\nHello, World!"));
        assert!(text.contains("Content-Length: 13\r\n"));
    }
}
