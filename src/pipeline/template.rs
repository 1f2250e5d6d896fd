//! Output template translation.
//!
//! Users write templates with `{field}` placeholders (`{title}.{ext}`).
//! yt-dlp expects Python `%`-style fields (`%(title)s.%(ext)s`). Templates
//! already written in the native syntax are passed through untouched.

/// Converts a `{field}` template into yt-dlp's `%(field)s` syntax.
///
/// A brace group is only treated as a placeholder when it holds a
/// non-empty field name made of ASCII alphanumerics, `_` or `.`; anything
/// else is kept literally. Literal `%` signs are escaped.
pub fn to_native(template: &str) -> String {
    if template.contains("%(") {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len() + 8);
    let mut rest = template;

    while let Some(start) = rest.find(['{', '%']) {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        if tail.starts_with('%') {
            out.push_str("%%");
            rest = &tail[1..];
            continue;
        }

        match placeholder(tail) {
            Some(field) => {
                out.push_str("%(");
                out.push_str(field);
                out.push_str(")s");
                rest = &tail[field.len() + 2..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }

    out.push_str(rest);
    out
}

/// Returns the field name if `s` starts with a `{field}` group.
fn placeholder(s: &str) -> Option<&str> {
    let body = s.strip_prefix('{')?;
    let end = body.find('}')?;
    let field = &body[..end];
    let valid = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
    valid.then_some(field)
}
