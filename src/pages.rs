//! Built-in HTML pages.

use crate::error::StatusError;

/// Generated when a host has no welcome file yet.
///
/// The output depends only on `host`, so regenerating it is idempotent.
pub fn welcome_page(host: &str) -> String {
    let host = escape_html(host);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>Welcome to {host}</title>
    <style>
        body {{ font-family: Arial, sans-serif; text-align: center; margin-top: 50px; }}
        h1 {{ color: #333; }}
        .host-info {{ color: #666; margin: 20px; }}
    </style>
</head>
<body>
    <h1>Welcome to {host}</h1>
    <div class="host-info">
        <p>You are accessing: {host}</p>
        <p><a href="/time">Check current time</a></p>
        <p><a href="/time?error=true">Test 500 error</a></p>
    </div>
</body>
</html>
"#
    )
}

/// Self-contained error page used when a host has no custom one.
pub fn error_page(status: StatusError, detail: &str) -> String {
    let code = status.code();
    let message = status.message();
    let detail = escape_html(detail);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{code} {message}</title>
    <style>
        body {{ font-family: Arial, sans-serif; text-align: center; margin-top: 50px; }}
        h1 {{ color: #333; }}
        .error-info {{ color: #666; margin: 20px; }}
    </style>
</head>
<body>
    <h1>{code} {message}</h1>
    <div class="error-info">
        <p>{detail}</p>
    </div>
</body>
</html>
"#
    )
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
