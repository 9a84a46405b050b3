use async_trait::async_trait;

use crate::error::Result;
use crate::header::{Etag, FileHeader, FileMetadata};
use crate::upload::UploadSource;

/// Transport abstraction for a remote file store.
///
/// Paths are `/`-separated and absolute within the store's file system.
/// Every call is one round trip; failures are returned as-is and never
/// retried by the callers in this workspace.
#[async_trait]
pub trait RemoteFileStore: Send + Sync {
    /// Returns the backend identifier (e.g., "local").
    fn backend_name(&self) -> &'static str;

    /// Upload a file, streaming its body from `source`.
    ///
    /// The body must be exactly `size` bytes. When `etag` is given the upload
    /// only succeeds if the stored file currently carries that etag.
    async fn upload(
        &self,
        path: &str,
        size: u64,
        source: UploadSource,
        metadata: Option<&FileMetadata>,
        etag: Option<&Etag>,
    ) -> Result<()>;

    /// Delete a file, conditioned on `etag` when given.
    async fn delete_file(&self, path: &str, etag: Option<&Etag>) -> Result<()>;

    /// Delete a directory. Without `recurse` only empty directories go.
    async fn delete_directory(&self, path: &str, recurse: bool) -> Result<()>;

    /// Move a file to a new path.
    async fn rename(&self, source: &str, destination: &str) -> Result<()>;

    /// Look up a file's header, `None` if it does not exist.
    async fn file_info(&self, path: &str) -> Result<Option<FileHeader>>;
}
