use std::collections::HashSet;
use std::hash::Hash;
use std::str::FromStr;

const SEPARATOR: char = ',';

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyListError {
    #[error("the key list is empty")]
    Empty,
    #[error("`{0}` is not a valid key")]
    Malformed(String),
}

/// Parses a path segment such as `(id1, id2)` into an ordered set of keys.
///
/// The surrounding parentheses are optional and whitespace around each key is
/// ignored. One bad token rejects the whole segment. Repeated keys keep their
/// first position.
pub fn resolve_keys<K>(segment: &str) -> Result<Vec<K>, KeyListError>
where
    K: FromStr + Hash + Eq + Clone,
{
    let segment = segment.trim();
    let inner = segment
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(segment)
        .trim();
    if inner.is_empty() {
        return Err(KeyListError::Empty);
    }

    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for token in inner.split(SEPARATOR).map(str::trim) {
        let key = token
            .parse::<K>()
            .map_err(|_| KeyListError::Malformed(token.to_string()))?;
        if seen.insert(key.clone()) {
            keys.push(key);
        }
    }
    Ok(keys)
}
