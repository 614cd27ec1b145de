use std::time::SystemTime;

const HTTP_VERSION: &str = "HTTP/1.1";

/// Serializes a response head.
///
/// Emission order is fixed: status line, `Content-Type` (when set), `Date`,
/// the custom headers in insertion order, then the blank line.
pub fn serialize_head(
    status: u16,
    reason: &str,
    content_type: Option<&str>,
    date: SystemTime,
    headers: &[(String, String)],
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);

    // Status line
    let status_line = format!("{} {} {}\r\n", HTTP_VERSION, status, reason);
    buf.extend_from_slice(status_line.as_bytes());

    if let Some(content_type) = content_type {
        push_header(&mut buf, "Content-Type", content_type);
    }

    push_header(&mut buf, "Date", &httpdate::fmt_http_date(date));

    for (k, v) in headers {
        push_header(&mut buf, k, v);
    }

    // Header/body separator
    buf.extend_from_slice(b"\r\n");

    buf
}

fn push_header(buf: &mut Vec<u8>, name: &str, value: &str) {
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(b": ");
    buf.extend_from_slice(value.as_bytes());
    buf.extend_from_slice(b"\r\n");
}
