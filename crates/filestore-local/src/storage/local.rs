use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use filestore_core::{
    Etag, FileHeader, FileMetadata, FileStoreError, RemoteFileStore, Result, UploadSource,
};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Directory holding the JSON metadata sidecars, mirroring the file tree.
const METADATA_DIR: &str = ".metadata";

/// Buffer between an upload's write callback and the file being written.
const UPLOAD_PIPE_SIZE: usize = 64 * 1024;

/// File store backed by a local directory.
///
/// Layout:
/// ```text
/// {base_dir}/
///   docs/report.pdf              # file content
///   .metadata/
///     docs/report.pdf.json       # user metadata
/// ```
///
/// Etags are the hex SHA-256 of the file content.
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    base_dir: PathBuf,
}

impl LocalFileStore {
    /// Create a new LocalFileStore rooted at the given directory.
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    /// Split a store path into its components, rejecting anything that could
    /// escape the base directory or reach the metadata tree.
    fn components(path: &str) -> Result<Vec<&str>> {
        let parts: Vec<&str> = path.split('/').filter(|p| !p.is_empty()).collect();
        if parts.is_empty() {
            return Err(FileStoreError::InvalidArgument(format!(
                "'{}' does not name a file or directory",
                path
            )));
        }
        if parts.iter().any(|p| *p == "." || *p == ".." || p.contains('\\')) {
            return Err(FileStoreError::InvalidArgument(format!(
                "'{}' contains a relative or invalid component",
                path
            )));
        }
        if parts[0] == METADATA_DIR {
            return Err(FileStoreError::InvalidArgument(format!(
                "'{}' is reserved",
                path
            )));
        }
        Ok(parts)
    }

    /// Get the on-disk path of a store path.
    fn content_path(&self, path: &str) -> Result<PathBuf> {
        let mut full = self.base_dir.clone();
        full.extend(Self::components(path)?);
        Ok(full)
    }

    /// Get the path of the metadata tree entry for a store path.
    fn metadata_path(&self, path: &str) -> Result<PathBuf> {
        let mut full = self.base_dir.join(METADATA_DIR);
        full.extend(Self::components(path)?);
        Ok(full)
    }

    /// Get the sidecar path holding a file's metadata.
    fn sidecar_path(&self, path: &str) -> Result<PathBuf> {
        let mut sidecar = self.metadata_path(path)?.into_os_string();
        sidecar.push(".json");
        Ok(PathBuf::from(sidecar))
    }

    /// Canonical `/`-prefixed form of a store path.
    fn normalize(path: &str) -> Result<String> {
        Ok(format!("/{}", Self::components(path)?.join("/")))
    }

    /// Compute the etag of a file, `None` if it does not exist.
    async fn current_etag(file: &Path) -> Result<Option<Etag>> {
        match fs::read(file).await {
            Ok(content) => Ok(Some(Etag::new(hex::encode(Sha256::digest(&content))))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Fail unless the file currently carries `expected`.
    async fn check_etag(path: &str, file: &Path, expected: Option<&Etag>) -> Result<()> {
        let Some(expected) = expected else {
            return Ok(());
        };
        let actual = Self::current_etag(file).await?;
        if actual.as_ref() != Some(expected) {
            return Err(FileStoreError::EtagMismatch {
                path: path.to_string(),
                expected: expected.to_string(),
                actual: actual.map_or_else(|| "<missing>".to_string(), |e| e.to_string()),
            });
        }
        Ok(())
    }

    async fn is_file(file: &Path) -> Result<bool> {
        match fs::metadata(file).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_parent(file: &Path) -> Result<()> {
        if let Some(parent) = file.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn remove_if_exists(file: &Path) -> Result<()> {
        match fs::remove_file(file).await {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    async fn read_metadata(&self, path: &str) -> Result<FileMetadata> {
        match fs::read(self.sidecar_path(path)?).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(FileMetadata::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_metadata(&self, path: &str, metadata: &FileMetadata) -> Result<()> {
        let sidecar = self.sidecar_path(path)?;
        Self::ensure_parent(&sidecar).await?;
        fs::write(&sidecar, serde_json::to_vec(metadata)?).await?;
        Ok(())
    }

    /// Stream `source` into `tmp`, returning the number of bytes written.
    async fn receive_body(tmp: &Path, source: UploadSource) -> Result<u64> {
        let mut file = fs::File::create(tmp).await?;
        let (writer, mut reader) = tokio::io::duplex(UPLOAD_PIPE_SIZE);

        // The copy owns the read half so a failed write closes the pipe.
        let copy = async move {
            let copied = tokio::io::copy(&mut reader, &mut file).await?;
            file.flush().await?;
            Ok::<u64, std::io::Error>(copied)
        };
        let (written, copied) = tokio::join!(source.write_to(Box::new(writer)), copy);

        written?;
        Ok(copied?)
    }
}

#[async_trait]
impl RemoteFileStore for LocalFileStore {
    fn backend_name(&self) -> &'static str {
        "local"
    }

    #[instrument(skip(self, source, metadata), level = "debug")]
    async fn upload(
        &self,
        path: &str,
        size: u64,
        source: UploadSource,
        metadata: Option<&FileMetadata>,
        etag: Option<&Etag>,
    ) -> Result<()> {
        let target = self.content_path(path)?;
        Self::check_etag(path, &target, etag).await?;
        Self::ensure_parent(&target).await?;

        let mut tmp = target.clone().into_os_string();
        tmp.push(format!(".upload-{}", uuid::Uuid::new_v4()));
        let tmp = PathBuf::from(tmp);

        let received = match Self::receive_body(&tmp, source).await {
            Ok(n) if n == size => Ok(()),
            Ok(n) => Err(FileStoreError::InvalidArgument(format!(
                "upload of {} declared {} bytes but wrote {}",
                path, size, n
            ))),
            Err(e) => Err(e),
        };
        if let Err(e) = received {
            Self::remove_if_exists(&tmp).await?;
            return Err(e);
        }

        fs::rename(&tmp, &target).await?;
        self.write_metadata(path, metadata.unwrap_or(&FileMetadata::new()))
            .await?;

        debug!("Uploaded {} bytes to {}", size, target.display());
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete_file(&self, path: &str, etag: Option<&Etag>) -> Result<()> {
        let target = self.content_path(path)?;
        if !Self::is_file(&target).await? {
            return Err(FileStoreError::NotFound(format!("File {}", path)));
        }
        Self::check_etag(path, &target, etag).await?;

        fs::remove_file(&target).await?;
        Self::remove_if_exists(&self.sidecar_path(path)?).await?;

        debug!("Deleted {}", target.display());
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete_directory(&self, path: &str, recurse: bool) -> Result<()> {
        let target = self.content_path(path)?;
        match fs::metadata(&target).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(FileStoreError::InvalidArgument(format!(
                    "{} is not a directory",
                    path
                )))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(FileStoreError::NotFound(format!("Directory {}", path)))
            }
            Err(e) => return Err(e.into()),
        }

        if recurse {
            fs::remove_dir_all(&target).await?;
        } else {
            let mut entries = fs::read_dir(&target).await?;
            if entries.next_entry().await?.is_some() {
                return Err(FileStoreError::DirectoryNotEmpty(path.to_string()));
            }
            fs::remove_dir(&target).await?;
        }

        match fs::remove_dir_all(self.metadata_path(path)?).await {
            Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        }

        debug!("Deleted directory {} (recurse={})", target.display(), recurse);
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn rename(&self, source: &str, destination: &str) -> Result<()> {
        let from = self.content_path(source)?;
        let to = self.content_path(destination)?;
        if !Self::is_file(&from).await? {
            return Err(FileStoreError::NotFound(format!("File {}", source)));
        }

        Self::ensure_parent(&to).await?;
        fs::rename(&from, &to).await?;

        let from_sidecar = self.sidecar_path(source)?;
        if fs::try_exists(&from_sidecar).await? {
            let to_sidecar = self.sidecar_path(destination)?;
            Self::ensure_parent(&to_sidecar).await?;
            fs::rename(&from_sidecar, &to_sidecar).await?;
        }

        debug!("Renamed {} -> {}", from.display(), to.display());
        Ok(())
    }

    #[instrument(skip(self), level = "debug")]
    async fn file_info(&self, path: &str) -> Result<Option<FileHeader>> {
        let target = self.content_path(path)?;
        let meta = match fs::metadata(&target).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Ok(None),
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(FileHeader {
            path: Self::normalize(path)?,
            size: meta.len(),
            etag: Self::current_etag(&target).await?,
            metadata: self.read_metadata(path).await?,
            last_modified: meta.modified().ok().map(chrono::DateTime::<chrono::Utc>::from),
        }))
    }
}
