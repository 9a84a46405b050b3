use std::fmt;
use std::future::Future;
use std::io;

use futures::future::BoxFuture;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Request body handed to an upload's write callback.
///
/// Dropping the sink marks the end of the body.
pub type UploadSink = Box<dyn AsyncWrite + Send + Unpin>;

type WriteCallback = Box<dyn FnOnce(UploadSink) -> BoxFuture<'static, io::Result<()>> + Send>;

/// Deferred producer of an upload's bytes.
///
/// Nothing is read or buffered when the source is created; the callback runs
/// once, when the transport opens the request body.
pub struct UploadSource {
    write: WriteCallback,
}

impl UploadSource {
    /// Wrap a callback that writes the file content into the sink.
    pub fn new<F, Fut>(write: F) -> Self
    where
        F: FnOnce(UploadSink) -> Fut + Send + 'static,
        Fut: Future<Output = io::Result<()>> + Send + 'static,
    {
        Self {
            write: Box::new(move |sink: UploadSink| -> BoxFuture<'static, io::Result<()>> {
                Box::pin(write(sink))
            }),
        }
    }

    /// Source that writes an owned buffer.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        let data = data.into();
        Self::new(move |mut sink| async move {
            sink.write_all(&data).await?;
            sink.flush().await
        })
    }

    /// Run the callback against a request body.
    pub async fn write_to(self, sink: UploadSink) -> io::Result<()> {
        (self.write)(sink).await
    }
}

impl fmt::Debug for UploadSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadSource").finish_non_exhaustive()
    }
}
