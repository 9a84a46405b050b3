use std::path::PathBuf;

use clap::Parser;
use filestore_core::StoreConventions;

/// Configuration for the filestore-local batch runner.
#[derive(Parser, Debug, Clone)]
#[command(name = "filestore-local")]
#[command(about = "Apply a batch of file operations to a local file store in one session")]
pub struct Config {
    /// JSON manifest listing the operations to apply, in order
    pub manifest: PathBuf,

    /// Root directory of the local store
    #[arg(long, env = "FILESTORE_ROOT")]
    pub root: Option<PathBuf>,

    /// Store identifier reported by sessions
    #[arg(long, default_value = "local", env = "FILESTORE_IDENTIFIER")]
    pub store_identifier: String,

    /// File system the session works on
    #[arg(long, default_value = "default", env = "FILESTORE_FILE_SYSTEM")]
    pub file_system: String,

    /// Round trips a session may make before failing
    #[arg(long, default_value = "30", env = "FILESTORE_MAX_REQUESTS_PER_SESSION")]
    pub max_requests_per_session: usize,
}

impl Config {
    /// Get the effective store root directory.
    pub fn effective_root(&self) -> PathBuf {
        self.root.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("filestore")
                .join(&self.file_system)
        })
    }

    pub fn conventions(&self) -> StoreConventions {
        StoreConventions {
            max_number_of_requests_per_session: self.max_requests_per_session,
        }
    }
}
