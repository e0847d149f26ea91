//! Upload filename handling

/// Extensions accepted by the upload handler (compared lowercase)
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Lowercase extension of `filename` if it is one of [`ALLOWED_EXTENSIONS`]
pub fn allowed_extension(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

/// Reduce a client-supplied filename to a flat, ASCII-only name that is
/// safe to join onto the upload directory.
///
/// Path separators and whitespace become `_`, anything outside
/// `[A-Za-z0-9._-]` is dropped, and leading or trailing `.`/`_` are
/// stripped. May return an empty string.
pub fn secure_filename(filename: &str) -> String {
    let ascii: String = filename.chars().filter(|c| c.is_ascii()).collect();
    let spaced = ascii.replace(['/', '\\'], " ");
    let joined = spaced.split_whitespace().collect::<Vec<_>>().join("_");

    joined
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == '_')
        .to_string()
}


