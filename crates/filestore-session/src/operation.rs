use filestore_core::{Etag, FileMetadata, Result, UploadSource};
use tracing::debug;

use crate::session::FilesSession;

/// One deferred change, queued by a session and executed on flush.
///
/// Executing consumes the record, so every record runs at most once.
#[derive(Debug)]
pub enum FileOperation {
    Upload {
        path: String,
        size: u64,
        source: UploadSource,
        metadata: Option<FileMetadata>,
        etag: Option<Etag>,
    },
    DeleteFile {
        path: String,
        etag: Option<Etag>,
    },
    DeleteDirectory {
        path: String,
        recurse: bool,
    },
    Rename {
        source: String,
        destination: String,
    },
}

impl FileOperation {
    /// Short name of the operation kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FileOperation::Upload { .. } => "upload",
            FileOperation::DeleteFile { .. } => "delete_file",
            FileOperation::DeleteDirectory { .. } => "delete_directory",
            FileOperation::Rename { .. } => "rename",
        }
    }

    /// The path the operation acts on (the source path for renames).
    pub fn path(&self) -> &str {
        match self {
            FileOperation::Upload { path, .. }
            | FileOperation::DeleteFile { path, .. }
            | FileOperation::DeleteDirectory { path, .. } => path,
            FileOperation::Rename { source, .. } => source,
        }
    }

    /// Run the operation against the session's store.
    ///
    /// Transport errors are returned unchanged.
    pub async fn execute(self, session: &FilesSession) -> Result<()> {
        let commands = session.commands()?;
        debug!(
            "Session {} executing {} on {}",
            session.id(),
            self.kind(),
            self.path()
        );

        match self {
            FileOperation::Upload {
                path,
                size,
                source,
                metadata,
                etag,
            } => {
                commands
                    .upload(&path, size, source, metadata.as_ref(), etag.as_ref())
                    .await
            }
            FileOperation::DeleteFile { path, etag } => {
                commands.delete_file(&path, etag.as_ref()).await
            }
            FileOperation::DeleteDirectory { path, recurse } => {
                commands.delete_directory(&path, recurse).await
            }
            FileOperation::Rename {
                source,
                destination,
            } => commands.rename(&source, &destination).await,
        }
    }
}
