//! Structural edits over update representations.
//!
//! A [`PatchDocument`] is an ordered list of JSON Patch (RFC 6902) operations.
//! It is applied to the serialized form of a representation and the result is
//! converted back to the typed representation. Representations have a fixed
//! set of members: a path has to name an existing member, `remove` resets a
//! member to `null`, and `add` on an existing member replaces it. Array
//! elements follow the usual insert/remove semantics.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: Value },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PatchError {
    #[error("`{0}` is not a valid JSON pointer")]
    InvalidPointer(String),
    #[error("`{0}` does not name a member of the document")]
    PathNotFound(String),
    #[error("the document root cannot be removed")]
    RootRemoval,
    #[error("`{from}` cannot be moved into its own child `{path}`")]
    MoveIntoChild { from: String, path: String },
    #[error("test failed at `{path}`: expected {expected}, found {actual}")]
    TestFailed {
        path: String,
        expected: Value,
        actual: Value,
    },
    #[error("patched document does not fit the representation: {0}")]
    Representation(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchDocument(Vec<PatchOperation>);

impl PatchDocument {
    pub fn new(operations: Vec<PatchOperation>) -> Self {
        Self(operations)
    }

    /// Applies every operation in order to a copy of `target`. Either all of
    /// them succeed and the edited representation is returned, or `target`'s
    /// copy is dropped with the first failure.
    pub fn apply_to<T>(&self, target: &T) -> Result<T, PatchError>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut document = serde_json::to_value(target)
            .map_err(|error| PatchError::Representation(error.to_string()))?;
        for operation in &self.0 {
            apply(&mut document, operation)?;
        }
        serde_json::from_value(document)
            .map_err(|error| PatchError::Representation(error.to_string()))
    }
}

impl From<Vec<PatchOperation>> for PatchDocument {
    fn from(operations: Vec<PatchOperation>) -> Self {
        Self::new(operations)
    }
}

fn apply(document: &mut Value, operation: &PatchOperation) -> Result<(), PatchError> {
    match operation {
        PatchOperation::Add { path, value } => add(document, path, value.clone()),
        PatchOperation::Remove { path } => remove(document, path).map(|_| ()),
        PatchOperation::Replace { path, value } => {
            let target = lookup_mut(document, path)?;
            *target = value.clone();
            Ok(())
        }
        PatchOperation::Move { from, path } => {
            if from == path {
                return lookup(document, from).map(|_| ());
            }
            if path.starts_with(&format!("{from}/")) {
                return Err(PatchError::MoveIntoChild {
                    from: from.clone(),
                    path: path.clone(),
                });
            }
            let value = remove(document, from)?;
            add(document, path, value)
        }
        PatchOperation::Copy { from, path } => {
            let value = lookup(document, from)?.clone();
            add(document, path, value)
        }
        PatchOperation::Test { path, value } => {
            let actual = lookup(document, path)?;
            if actual == value {
                Ok(())
            } else {
                Err(PatchError::TestFailed {
                    path: path.clone(),
                    expected: value.clone(),
                    actual: actual.clone(),
                })
            }
        }
    }
}

fn add(document: &mut Value, path: &str, value: Value) -> Result<(), PatchError> {
    let Some((parent, key)) = split_pointer(path)? else {
        *document = value;
        return Ok(());
    };
    match lookup_mut(document, parent)? {
        Value::Object(members) => match members.get_mut(&key) {
            Some(member) => {
                *member = value;
                Ok(())
            }
            None => Err(PatchError::PathNotFound(path.to_string())),
        },
        Value::Array(elements) => {
            let index = if key == "-" {
                elements.len()
            } else {
                array_index(&key, path)?
            };
            if index > elements.len() {
                return Err(PatchError::PathNotFound(path.to_string()));
            }
            elements.insert(index, value);
            Ok(())
        }
        _ => Err(PatchError::PathNotFound(path.to_string())),
    }
}

/// Detaches the value at `path`, returning it. Object members stay in place as
/// `null`.
fn remove(document: &mut Value, path: &str) -> Result<Value, PatchError> {
    let Some((parent, key)) = split_pointer(path)? else {
        return Err(PatchError::RootRemoval);
    };
    match lookup_mut(document, parent)? {
        Value::Object(members) => members
            .get_mut(&key)
            .map(Value::take)
            .ok_or_else(|| PatchError::PathNotFound(path.to_string())),
        Value::Array(elements) => {
            let index = array_index(&key, path)?;
            if index >= elements.len() {
                return Err(PatchError::PathNotFound(path.to_string()));
            }
            Ok(elements.remove(index))
        }
        _ => Err(PatchError::PathNotFound(path.to_string())),
    }
}

fn lookup<'a>(document: &'a Value, path: &str) -> Result<&'a Value, PatchError> {
    check_pointer(path)?;
    document
        .pointer(path)
        .ok_or_else(|| PatchError::PathNotFound(path.to_string()))
}

fn lookup_mut<'a>(document: &'a mut Value, path: &str) -> Result<&'a mut Value, PatchError> {
    check_pointer(path)?;
    document
        .pointer_mut(path)
        .ok_or_else(|| PatchError::PathNotFound(path.to_string()))
}

fn check_pointer(path: &str) -> Result<(), PatchError> {
    if !path.is_empty() && !path.starts_with('/') {
        return Err(PatchError::InvalidPointer(path.to_string()));
    }
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        if c == '~' && !matches!(chars.next(), Some('0' | '1')) {
            return Err(PatchError::InvalidPointer(path.to_string()));
        }
    }
    Ok(())
}

/// Splits a pointer into its parent pointer and the unescaped last token.
/// `None` means the pointer addresses the whole document.
fn split_pointer(path: &str) -> Result<Option<(&str, String)>, PatchError> {
    check_pointer(path)?;
    let Some(position) = path.rfind('/') else {
        return Ok(None);
    };
    let (parent, token) = path.split_at(position);
    let key = token[1..].replace("~1", "/").replace("~0", "~");
    Ok(Some((parent, key)))
}

fn array_index(token: &str, path: &str) -> Result<usize, PatchError> {
    let well_formed = !token.is_empty()
        && token.bytes().all(|b| b.is_ascii_digit())
        && (token == "0" || !token.starts_with('0'));
    if !well_formed {
        return Err(PatchError::PathNotFound(path.to_string()));
    }
    token
        .parse()
        .map_err(|_| PatchError::PathNotFound(path.to_string()))
}
