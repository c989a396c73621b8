use std::path::{Path, PathBuf};

use super::{Fetcher, SourceError, MAX_FEED_SIZE};

/// Reads an appcast from the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalFile {
    path: PathBuf,
    location: String,
    max_size: usize,
}

impl LocalFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let location = path.display().to_string();
        Self {
            path,
            location,
            max_size: MAX_FEED_SIZE,
        }
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    fn io_error(&self, source: std::io::Error) -> SourceError {
        SourceError::Io {
            path: self.location.clone(),
            source,
        }
    }
}

impl Fetcher for LocalFile {
    async fn fetch(&self) -> Result<Vec<u8>, SourceError> {
        // Check size before reading to avoid loading a huge file into memory
        let metadata = tokio::fs::metadata(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        if metadata.len() > self.max_size as u64 {
            return Err(SourceError::TooLarge(self.max_size));
        }

        let content = tokio::fs::read(&self.path)
            .await
            .map_err(|e| self.io_error(e))?;
        tracing::debug!(path = %self.location, bytes = content.len(), "Read local appcast");
        Ok(content)
    }

    fn location(&self) -> &str {
        &self.location
    }
}
