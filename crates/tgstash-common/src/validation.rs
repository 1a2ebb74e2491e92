//! Input validation utilities.
//!
//! Centralized helpers for values that end up in response headers or URLs.

/// Make a stored filename safe for a quoted `Content-Disposition` parameter.
///
/// Every character outside `[A-Za-z0-9._-]` becomes `_`.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `inline; filename="..."` for a stored file, falling back to `<id>.bin`.
pub fn inline_disposition(filename: &str, id: &str) -> String {
    let safe = if filename.is_empty() {
        format!("{id}.bin")
    } else {
        sanitize_filename(filename)
    };
    format!("inline; filename=\"{safe}\"")
}

/// Last non-empty `/`-separated segment of a request path.
pub fn trailing_segment(path: &str) -> Option<&str> {
    path.rsplit('/').next().filter(|segment| !segment.is_empty())
}
