use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use filestore_core::{
    Etag, FileHeader, FileMetadata, FileStoreError, RemoteFileStore, Result, UploadSource,
};
use tokio::io::AsyncReadExt;

/// In-memory transport that records every call it receives.
#[derive(Default)]
pub(crate) struct RecordingStore {
    calls: Mutex<Vec<String>>,
    failures: Mutex<HashSet<(String, String)>>,
    uploads: Mutex<HashMap<String, Vec<u8>>>,
    headers: Mutex<HashMap<String, FileHeader>>,
}

impl RecordingStore {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Make every `kind` call on `path` fail.
    pub(crate) fn fail_on(&self, kind: &str, path: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert((kind.to_string(), path.to_string()));
    }

    /// Serve `header` from `file_info`.
    pub(crate) fn insert_header(&self, header: FileHeader) {
        self.headers
            .lock()
            .unwrap()
            .insert(header.path.clone(), header);
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn uploaded(&self, path: &str) -> Option<Vec<u8>> {
        self.uploads.lock().unwrap().get(path).cloned()
    }

    fn record(&self, kind: &str, path: &str, call: String) -> Result<()> {
        self.calls.lock().unwrap().push(call);
        if self
            .failures
            .lock()
            .unwrap()
            .contains(&(kind.to_string(), path.to_string()))
        {
            return Err(FileStoreError::Io(format!("simulated {} failure on {}", kind, path)));
        }
        Ok(())
    }
}

fn etag_suffix(etag: Option<&Etag>) -> String {
    etag.map(|e| format!(" etag={}", e)).unwrap_or_default()
}

#[async_trait]
impl RemoteFileStore for RecordingStore {
    fn backend_name(&self) -> &'static str {
        "recording"
    }

    async fn upload(
        &self,
        path: &str,
        size: u64,
        source: UploadSource,
        _metadata: Option<&FileMetadata>,
        etag: Option<&Etag>,
    ) -> Result<()> {
        self.record(
            "upload",
            path,
            format!("upload {} {}{}", path, size, etag_suffix(etag)),
        )?;

        let (writer, mut reader) = tokio::io::duplex(64);
        let read = async {
            let mut body = Vec::new();
            reader.read_to_end(&mut body).await.map(|_| body)
        };
        let (written, body) = tokio::join!(source.write_to(Box::new(writer)), read);
        written?;
        let body = body?;

        if body.len() as u64 != size {
            return Err(FileStoreError::InvalidArgument(format!(
                "declared {} bytes, received {}",
                size,
                body.len()
            )));
        }
        self.uploads.lock().unwrap().insert(path.to_string(), body);
        Ok(())
    }

    async fn delete_file(&self, path: &str, etag: Option<&Etag>) -> Result<()> {
        self.record(
            "delete_file",
            path,
            format!("delete_file {}{}", path, etag_suffix(etag)),
        )
    }

    async fn delete_directory(&self, path: &str, recurse: bool) -> Result<()> {
        self.record(
            "delete_directory",
            path,
            format!("delete_directory {} recurse={}", path, recurse),
        )
    }

    async fn rename(&self, source: &str, destination: &str) -> Result<()> {
        self.record(
            "rename",
            source,
            format!("rename {} -> {}", source, destination),
        )
    }

    async fn file_info(&self, path: &str) -> Result<Option<FileHeader>> {
        self.record("file_info", path, format!("file_info {}", path))?;
        Ok(self.headers.lock().unwrap().get(path).cloned())
    }
}
