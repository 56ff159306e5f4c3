//! Small shared helpers.

/// Make a resource name safe to use as a filename.
///
/// Replaces path separators and control characters, collapses whitespace,
/// and truncates to a filesystem-friendly length.
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => out.push('_'),
            c if c.is_control() => out.push('_'),
            c => out.push(c),
        }
    }

    let trimmed = out.trim().trim_matches('.');
    let cleaned = if trimmed.is_empty() { "resource" } else { trimmed };

    // Keep names comfortably under common filesystem limits.
    cleaned.chars().take(200).collect()
}
