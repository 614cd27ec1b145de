//! Content type detection for static files.

use std::path::Path;

pub const OCTET_STREAM: &str = "application/octet-stream";
pub const HTML_UTF8: &str = "text/html; charset=UTF-8";

/// Suffixes checked before asking `mime_guess`. Matching is case-sensitive.
const CONTENT_TYPES: &[(&str, &str)] = &[
    (".html", HTML_UTF8),
    (".css", "text/css"),
    (".js", "application/javascript"),
    (".png", "image/png"),
    (".jpg", "image/jpeg"),
    (".jpeg", "image/jpeg"),
];

/// Determines the content type of a file from its path.
///
/// ```
/// # use vesta::http::mime::content_type_for;
/// assert_eq!(content_type_for("www/index.html".as_ref()), "text/html; charset=UTF-8");
/// assert_eq!(content_type_for("www/blob".as_ref()), "application/octet-stream");
/// ```
pub fn content_type_for(path: &Path) -> String {
    let name = path.to_string_lossy();

    if let Some((_, content_type)) = CONTENT_TYPES
        .iter()
        .find(|(suffix, _)| name.ends_with(suffix))
    {
        return content_type.to_string();
    }

    mime_guess::from_path(path)
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| OCTET_STREAM.to_string())
}
