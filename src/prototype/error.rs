use std::fmt;
use thiserror::Error;

/// One step of a path into a value tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// Location of a node inside an input tree, e.g. `pets[1].name`.
///
/// The root renders as `$`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    pub fn root() -> Self {
        FieldPath(Vec::new())
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn push_key(&mut self, key: &str) {
        self.0.push(PathSegment::Key(key.to_string()));
    }

    pub fn push_index(&mut self, index: usize) {
        self.0.push(PathSegment::Index(index));
    }

    pub fn pop(&mut self) {
        self.0.pop();
    }

    /// Dot-joined keys with list steps skipped: `pets[1].name` becomes `pets.name`.
    pub fn prototype_path(&self) -> String {
        let mut out = String::new();
        for segment in &self.0 {
            if let PathSegment::Key(key) = segment {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
        }
        out
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("$");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Key(key) if i == 0 => write!(f, "{key}")?,
                PathSegment::Key(key) => write!(f, ".{key}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for FieldPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        FieldPath(iter.into_iter().map(|k| PathSegment::Key(k.into())).collect())
    }
}

/// Unrecoverable shape or type mismatch found while normalizing
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{path}: {message}")]
pub struct NormalizeError {
    pub path: FieldPath,
    pub message: String,
}

impl NormalizeError {
    pub fn new(path: &FieldPath, message: impl Into<String>) -> Self {
        NormalizeError {
            path: path.clone(),
            message: message.into(),
        }
    }
}
