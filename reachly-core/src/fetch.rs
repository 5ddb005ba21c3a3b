use async_trait::async_trait;
use std::path::Path;
use tempfile::NamedTempFile;

/// Metadata of a published post, as returned by the remote platform.
#[derive(Debug, Clone)]
pub struct FetchedPost {
    /// Posts without a caption are compared as the empty string downstream.
    pub caption: Option<String>,
    pub image_url: String,
}

/// A downloaded file scoped to its handle. The backing temp file is removed
/// when the handle drops, on every exit path.
#[derive(Debug)]
pub struct Download {
    file: NamedTempFile,
}

impl Download {
    pub fn new(file: NamedTempFile) -> Self {
        Self { file }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Remote fetch failed: {0}")]
    Remote(String),
    #[error("Download failed for {url}: {reason}")]
    Download { url: String, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Remote content collaborator: post metadata lookup plus raw downloads.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Latest published post for a handle, or `None` if the account has
    /// not posted yet.
    async fn latest_post(&self, handle: &str) -> Result<Option<FetchedPost>, FetchError>;

    /// Download a URL into a scoped temp file.
    async fn download(&self, url: &str) -> Result<Download, FetchError>;
}
