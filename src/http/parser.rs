use std::collections::HashMap;

use crate::http::request::{Request, find_host, parse_query, split_host_port};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("request head is empty")]
    Empty,
    #[error("request line must have exactly 3 tokens, got {0}")]
    InvalidRequestLine(usize),
    #[error("request head is not valid UTF-8")]
    InvalidEncoding,
    #[error("missing Host header")]
    MissingHost,
    #[error("request head exceeds {0} bytes")]
    TooLarge(usize),
}

/// Parses a request head: the request line followed by header lines.
///
/// `head` holds everything up to (and optionally including) the blank line
/// that ends the headers. Lines may end in CRLF or a bare LF.
pub fn parse_http_request(head: &[u8]) -> Result<Request, ParseError> {
    let head = std::str::from_utf8(head).map_err(|_| ParseError::InvalidEncoding)?;

    let mut lines = head.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));

    // Request line
    let request_line = lines.next().ok_or(ParseError::Empty)?;
    if request_line.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let parts: Vec<&str> = request_line.split_whitespace().collect();
    let &[method, target, protocol] = &parts[..] else {
        return Err(ParseError::InvalidRequestLine(parts.len()));
    };

    let (path, query) = match target.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (target, None),
    };

    // Headers
    let mut headers = HashMap::new();

    for line in lines {
        if line.is_empty() {
            break;
        }

        // Lines without a colon carry nothing we can use
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        headers.insert(key.trim().to_string(), value.trim().to_string());
    }

    let (host, port) = find_host(&headers)
        .map(split_host_port)
        .ok_or(ParseError::MissingHost)?;

    Ok(Request {
        method: method.to_string(),
        path: path.to_string(),
        protocol: protocol.to_string(),
        params: query.map(parse_query).unwrap_or_default(),
        query: query.map(str::to_string),
        host,
        port,
        headers,
    })
}
