//! Batch manifests: a JSON array of operations applied through one session.
//!
//! ```json
//! [
//!   { "op": "upload", "path": "/reports/q3.csv", "source": "./q3.csv" },
//!   { "op": "rename", "source": "/reports/q2.csv", "destination": "/archive/q2.csv" },
//!   { "op": "delete", "path": "/tmp/scratch.txt", "etag": "9f86d0..." },
//!   { "op": "delete_directory", "path": "/tmp", "recurse": true }
//! ]
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use filestore_core::{Etag, FileMetadata, UploadSource};
use filestore_session::FilesSession;
use serde::Deserialize;
use tokio::fs;

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ManifestEntry {
    /// Upload the local file `source` to `path`.
    Upload {
        path: String,
        source: PathBuf,
        #[serde(default)]
        metadata: Option<FileMetadata>,
        #[serde(default)]
        etag: Option<Etag>,
    },
    Delete {
        path: String,
        #[serde(default)]
        etag: Option<Etag>,
    },
    DeleteDirectory {
        path: String,
        #[serde(default)]
        recurse: bool,
    },
    Rename {
        source: String,
        destination: String,
    },
    RenameToDirectory {
        source: String,
        directory: String,
        name: String,
    },
}

/// Read and parse a manifest file.
pub async fn load(path: &Path) -> anyhow::Result<Vec<ManifestEntry>> {
    let bytes = fs::read(path)
        .await
        .with_context(|| format!("reading manifest {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parsing manifest {}", path.display()))
}

impl ManifestEntry {
    /// Queue this entry on `session`.
    ///
    /// Upload sources are only sized here; their content is read when the
    /// session flushes.
    pub async fn register(self, session: &FilesSession) -> anyhow::Result<()> {
        match self {
            ManifestEntry::Upload {
                path,
                source,
                metadata,
                etag,
            } => {
                let size = fs::metadata(&source)
                    .await
                    .with_context(|| format!("reading upload source {}", source.display()))?
                    .len();
                let body = UploadSource::new(move |mut sink| async move {
                    let mut file = fs::File::open(&source).await?;
                    tokio::io::copy(&mut file, &mut sink).await?;
                    Ok::<(), std::io::Error>(())
                });
                session.register_upload(path.as_str(), size, body, metadata, etag);
            }
            ManifestEntry::Delete { path, etag } => {
                session.register_file_deletion(path.as_str(), etag);
            }
            ManifestEntry::DeleteDirectory { path, recurse } => {
                session.register_directory_deletion(path.as_str(), recurse);
            }
            ManifestEntry::Rename {
                source,
                destination,
            } => {
                session.register_rename(source.as_str(), &destination);
            }
            ManifestEntry::RenameToDirectory {
                source,
                directory,
                name,
            } => {
                session.register_rename_to_directory(source.as_str(), &directory, &name)?;
            }
        }
        Ok(())
    }
}
