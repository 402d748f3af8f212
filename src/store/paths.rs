use crate::error::StoreError;

const FORBIDDEN: &[char] = &['.', '#', '$', '[', ']'];

/// Split a `/`-separated path into its segments. Leading and trailing
/// slashes are ignored; the empty path addresses the root.
pub fn segments(path: &str) -> Result<Vec<&str>, StoreError> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for segment in trimmed.split('/') {
        check_segment(path, segment)?;
        out.push(segment);
    }
    Ok(out)
}

fn check_segment(path: &str, segment: &str) -> Result<(), StoreError> {
    if segment.is_empty() {
        return Err(StoreError::InvalidPath {
            path: path.to_string(),
            reason: "empty segment",
        });
    }
    if segment.contains(FORBIDDEN) {
        return Err(StoreError::InvalidPath {
            path: path.to_string(),
            reason: "segment contains one of . # $ [ ]",
        });
    }
    Ok(())
}

pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && !key.contains('/') && !key.contains(FORBIDDEN)
}

/// True when one path is an ancestor of (or equal to) the other.
pub fn related<A: AsRef<str>, B: AsRef<str>>(a: &[A], b: &[B]) -> bool {
    a.iter().zip(b).all(|(x, y)| x.as_ref() == y.as_ref())
}

pub fn words(uid: &str) -> String {
    format!("users/{uid}/words")
}

pub fn word(uid: &str, word_id: &str) -> String {
    format!("users/{uid}/words/{word_id}")
}

pub fn word_lists(uid: &str, word_id: &str) -> String {
    format!("users/{uid}/words/{word_id}/list")
}

pub fn lists(uid: &str) -> String {
    format!("users/{uid}/lists")
}

pub fn list(uid: &str, list_id: &str) -> String {
    format!("users/{uid}/lists/{list_id}")
}
