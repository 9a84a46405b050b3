use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// User metadata attached to a stored file.
pub type FileMetadata = HashMap<String, String>;

/// Opaque version token of a stored file.
///
/// Conditional operations carry the etag they expect to find remotely and
/// fail when the stored file has moved on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Etag(String);

impl Etag {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Etag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Etag {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Etag {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// What a session knows about one remote file.
///
/// Value equality compares every field. Sessions track deleted headers by
/// identity instead, so two equal headers loaded separately stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHeader {
    /// Full `/`-separated path of the file
    pub path: String,
    /// Size in bytes
    pub size: u64,
    /// Current version token, if the store reports one
    #[serde(default)]
    pub etag: Option<Etag>,
    /// User metadata
    #[serde(default)]
    pub metadata: FileMetadata,
    /// When the file was last written
    #[serde(default)]
    pub last_modified: Option<chrono::DateTime<chrono::Utc>>,
}

impl FileHeader {
    pub fn new(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
            etag: None,
            metadata: FileMetadata::new(),
            last_modified: None,
        }
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        self.path
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
    }

    /// Everything before the last path segment, `/` for top-level files.
    pub fn directory(&self) -> &str {
        match self.path.trim_end_matches('/').rfind('/') {
            Some(0) | None => "/",
            Some(idx) => &self.path[..idx],
        }
    }
}
