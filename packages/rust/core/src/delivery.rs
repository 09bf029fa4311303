//! Handing a finished document to its destination.

use std::path::PathBuf;

use biddoc_shared::{BidDocError, Result, write_atomic};
use tracing::{debug, instrument};

/// Destination of an exported document.
pub trait Deliver: Send + Sync {
    /// Store `bytes` under `file_name`, returning where it ended up.
    fn deliver(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Writes documents into a directory.
#[derive(Debug, Clone)]
pub struct FileDelivery {
    pub output_dir: PathBuf,
}

impl FileDelivery {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl Deliver for FileDelivery {
    #[instrument(skip_all, fields(dir = %self.output_dir.display(), file = file_name))]
    fn deliver(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| BidDocError::io(&self.output_dir, e))?;
        let target = self.output_dir.join(file_name);
        write_atomic(&target, bytes)?;
        debug!(size = bytes.len(), "document written");
        Ok(target)
    }
}
