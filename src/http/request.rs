//! Request head reading.
//!
//! # Responsibilities
//! - Read the request line of a connection under a read timeout
//! - Split the target into path and query string
//! - Discard whatever header lines have already arrived
//!
//! # Design Decisions
//! - Only the request line matters; headers are never interpreted
//! - Reading stops at the blank line or as soon as no more data is
//!   immediately available, whichever comes first
//! - No body is ever read
//! - Query parameters are decoded lazily, only when a handler needs one

use std::io;
use std::time::Duration;

use futures_util::FutureExt;
use percent_encoding::percent_decode_str;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use url::Url;

/// Upper bound on a single line of the request head.
pub const MAX_LINE_BYTES: u64 = 8 * 1024;

/// Errors raised while reading the request head.
#[derive(Debug, Error)]
pub enum RequestError {
    /// No complete line arrived within the read timeout.
    #[error("timed out waiting for the request head")]
    Timeout,

    /// The request line could not be understood.
    #[error("malformed request line: {0}")]
    Malformed(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl RequestError {
    /// True when the peer reset or aborted the connection.
    pub fn is_reset(&self) -> bool {
        match self {
            RequestError::Io(e) => matches!(
                e.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}

/// The parts of a request line the server cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: String,
    path: String,
    query: Option<String>,
}

impl Request {
    /// Parse `<METHOD> <TARGET> <VERSION>`.
    ///
    /// Only the first two tokens are required; the version is ignored.
    pub fn parse_request_line(line: &str) -> Result<Self, RequestError> {
        let mut tokens = line.split_whitespace();
        let (method, target) = match (tokens.next(), tokens.next()) {
            (Some(method), Some(target)) => (method, target),
            _ => return Err(RequestError::Malformed(line.trim_end().to_string())),
        };

        let (path, query) = split_target(target)?;
        Ok(Self {
            method: method.to_string(),
            path,
            query,
        })
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Raw query string, `None` when the target had no `?`.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Decoded value of the first `name=value` pair in the query string.
    pub fn query_value(&self, name: &str) -> Option<String> {
        let query = self.query.as_deref()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// Split a request target into a percent-decoded path and the raw query.
///
/// Origin-form (`/path?query`) is split on the first `?`; absolute-form
/// (`http://host/path?query`) goes through a URL parser.
fn split_target(target: &str) -> Result<(String, Option<String>), RequestError> {
    if target.starts_with('/') {
        let without_fragment = target.split('#').next().unwrap_or(target);
        return Ok(match without_fragment.split_once('?') {
            Some((path, query)) => (decode_path(path), Some(query.to_string())),
            None => (decode_path(without_fragment), None),
        });
    }

    if target.starts_with("http://") || target.starts_with("https://") {
        let url = Url::parse(target).map_err(|e| RequestError::Malformed(format!("{}: {}", target, e)))?;
        return Ok((decode_path(url.path()), url.query().map(str::to_string)));
    }

    Err(RequestError::Malformed(format!("unsupported target {}", target)))
}

/// `%XX` escapes decoded; invalid UTF-8 becomes U+FFFD.
fn decode_path(path: &str) -> String {
    percent_decode_str(path).decode_utf8_lossy().into_owned()
}

/// Read the request head from `reader`.
///
/// Returns `Ok(None)` when the peer closed the connection before sending a
/// request line.
pub async fn read_request<R>(
    reader: &mut R,
    read_timeout: Duration,
) -> Result<Option<Request>, RequestError>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = Vec::new();
    if read_line(reader, &mut line, read_timeout).await? == 0 {
        return Ok(None);
    }
    if !line.ends_with(b"\n") && line.len() as u64 >= MAX_LINE_BYTES {
        return Err(RequestError::Malformed("request line too long".to_string()));
    }

    let request = Request::parse_request_line(&String::from_utf8_lossy(&line))?;

    // Drain header lines that have already arrived. They are never decoded,
    // so any byte is acceptable.
    loop {
        match reader.fill_buf().now_or_never() {
            Some(Ok(buf)) if !buf.is_empty() => {}
            Some(Err(e)) => return Err(e.into()),
            _ => break,
        }
        if read_line(reader, &mut line, read_timeout).await? == 0 {
            break;
        }
        if line.iter().all(|b| matches!(b, b'\r' | b'\n')) {
            break;
        }
    }

    Ok(Some(request))
}

/// Read one raw line, newline included, into `line`.
async fn read_line<R>(reader: &mut R, line: &mut Vec<u8>, limit: Duration) -> Result<usize, RequestError>
where
    R: AsyncBufRead + Unpin,
{
    line.clear();
    let mut bounded = (&mut *reader).take(MAX_LINE_BYTES);
    match tokio::time::timeout(limit, bounded.read_until(b'\n', line)).await {
        Ok(read) => Ok(read?),
        Err(_) => Err(RequestError::Timeout),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncWriteExt, BufReader};

    const TIMEOUT: Duration = Duration::from_secs(2);

    #[test]
    fn parses_origin_form() {
        let req = Request::parse_request_line("GET /app/greeting?name=Jaider HTTP/1.1\r\n").unwrap();
        assert_eq!(req.method(), "GET");
        assert_eq!(req.path(), "/app/greeting");
        assert_eq!(req.query(), Some("name=Jaider"));
    }

    #[test]
    fn splits_on_first_question_mark() {
        let req = Request::parse_request_line("GET /a?b=1?c HTTP/1.1").unwrap();
        assert_eq!(req.path(), "/a");
        assert_eq!(req.query(), Some("b=1?c"));
    }

    #[test]
    fn empty_query_is_present() {
        let req = Request::parse_request_line("GET /app/greeting? HTTP/1.1").unwrap();
        assert_eq!(req.query(), Some(""));
        assert_eq!(req.query_value("name"), None);
    }

    #[test]
    fn version_is_optional() {
        let req = Request::parse_request_line("GET /index.html").unwrap();
        assert_eq!(req.path(), "/index.html");
        assert_eq!(req.query(), None);
    }

    #[test]
    fn single_token_is_malformed() {
        assert!(matches!(
            Request::parse_request_line("GET\r\n"),
            Err(RequestError::Malformed(_))
        ));
        assert!(matches!(
            Request::parse_request_line(""),
            Err(RequestError::Malformed(_))
        ));
    }

    #[test]
    fn absolute_form_is_reduced() {
        let req = Request::parse_request_line("GET http://localhost:9000/app/greeting?name=x HTTP/1.1").unwrap();
        assert_eq!(req.path(), "/app/greeting");
        assert_eq!(req.query_value("name").as_deref(), Some("x"));
    }

    #[test]
    fn other_targets_are_malformed() {
        assert!(Request::parse_request_line("OPTIONS * HTTP/1.1").is_err());
    }

    #[test]
    fn query_values_are_decoded() {
        let req = Request::parse_request_line("GET /app/greeting?x=1&name=Ana+Mar%C3%ADa&name=other HTTP/1.1").unwrap();
        assert_eq!(req.query_value("name").as_deref(), Some("Ana María"));
        assert_eq!(req.query_value("x").as_deref(), Some("1"));
        assert_eq!(req.query_value("missing"), None);
    }

    #[tokio::test]
    async fn reads_line_and_discards_headers() {
        let mut input: &[u8] = b"GET /styles.css HTTP/1.1\r\nHost: localhost\r\nAccept: */*\r\n\r\n";
        let req = read_request(&mut input, TIMEOUT).await.unwrap().unwrap();
        assert_eq!(req.path(), "/styles.css");
        assert!(input.is_empty());
    }

    #[tokio::test]
    async fn non_utf8_header_bytes_are_discarded() {
        let mut input: &[u8] = b"GET /app/greeting?name=x HTTP/1.1\r\nUser-Agent: caf\xE9\r\n\r\n";
        let req = read_request(&mut input, TIMEOUT).await.unwrap().unwrap();
        assert_eq!(req.path(), "/app/greeting");
        assert_eq!(req.query_value("name").as_deref(), Some("x"));
        assert!(input.is_empty());
    }

    #[tokio::test]
    async fn non_utf8_request_line_is_decoded_lossily() {
        let mut input: &[u8] = b"GET /caf\xE9.html HTTP/1.1\r\n\r\n";
        let req = read_request(&mut input, TIMEOUT).await.unwrap().unwrap();
        assert_eq!(req.path(), "/caf\u{FFFD}.html");
    }

    #[test]
    fn path_is_percent_decoded() {
        let req = Request::parse_request_line("GET /index%2Ehtml HTTP/1.1").unwrap();
        assert_eq!(req.path(), "/index.html");

        let req = Request::parse_request_line("GET /my%20file.html?name=a%20b HTTP/1.1").unwrap();
        assert_eq!(req.path(), "/my file.html");
        assert_eq!(req.query(), Some("name=a%20b"));

        let req = Request::parse_request_line("GET http://localhost/app/gr%65eting HTTP/1.1").unwrap();
        assert_eq!(req.path(), "/app/greeting");
    }

    #[tokio::test]
    async fn eof_before_request_line() {
        let mut input: &[u8] = b"";
        assert!(read_request(&mut input, TIMEOUT).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stops_when_no_more_data_is_ready() {
        let (client, server) = tokio::io::duplex(1024);
        let mut client = client;
        client.write_all(b"GET /index.html HTTP/1.1\r\nHost: x\r\n").await.unwrap();

        let mut reader = BufReader::new(server);
        let req = read_request(&mut reader, TIMEOUT).await.unwrap().unwrap();
        assert_eq!(req.path(), "/index.html");
        drop(client);
    }

    #[tokio::test]
    async fn silent_peer_times_out() {
        let (_client, server) = tokio::io::duplex(64);
        let mut reader = BufReader::new(server);
        let err = read_request(&mut reader, Duration::from_millis(50)).await.unwrap_err();
        assert!(matches!(err, RequestError::Timeout));
        assert!(!err.is_reset());
    }

    #[test]
    fn reset_kinds() {
        let err = RequestError::from(io::Error::from(io::ErrorKind::ConnectionReset));
        assert!(err.is_reset());
        let err = RequestError::from(io::Error::from(io::ErrorKind::InvalidData));
        assert!(!err.is_reset());
    }
}
