//! Local draft persistence.
//!
//! A [`DraftStore`] keeps at most one in-progress form per directory, as
//! `bidding_form_draft.json`. Every operation is infallible from the
//! caller's point of view: failures are logged and reported as `false` or
//! `None`, so a broken draft never blocks editing or exporting.

use std::path::{Path, PathBuf};

use biddoc_shared::{BidDocError, BiddingFormData, Result, write_atomic};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// File name of the stored draft.
pub const DRAFT_FILE_NAME: &str = "bidding_form_draft.json";

/// A saved wizard session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftData {
    pub form_data: BiddingFormData,
    /// Zero-based wizard step the user was on.
    pub current_step: u32,
    /// RFC 3339 timestamp (UTC).
    pub saved_at: String,
}

/// Draft handle rooted at a directory.
#[derive(Debug, Clone)]
pub struct DraftStore {
    dir: PathBuf,
    display_offset: FixedOffset,
}

impl DraftStore {
    /// Store in `dir`, showing saved times at UTC+8.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            display_offset: FixedOffset::east_opt(8 * 3600).unwrap_or(Utc.fix()),
        }
    }

    /// Show saved times at the given offset instead.
    pub fn with_utc_offset_hours(mut self, hours: i32) -> Self {
        if let Some(offset) = hours.checked_mul(3600).and_then(FixedOffset::east_opt) {
            self.display_offset = offset;
        }
        self
    }

    /// Path of the draft file.
    pub fn path(&self) -> PathBuf {
        self.dir.join(DRAFT_FILE_NAME)
    }

    /// Save `form` and the current step, replacing any previous draft.
    pub fn save(&self, form: &BiddingFormData, current_step: u32) -> bool {
        let draft = DraftData {
            form_data: form.clone(),
            current_step,
            saved_at: Utc::now().to_rfc3339(),
        };
        match self.write(&draft) {
            Ok(()) => {
                info!(path = %self.path().display(), current_step, "draft saved");
                true
            }
            Err(e) => {
                warn!(error = %e, "failed to save draft");
                false
            }
        }
    }

    /// The stored draft, or `None` when absent or unreadable.
    pub fn load(&self) -> Option<DraftData> {
        let path = self.path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no draft stored");
                return None;
            }
            Err(e) => {
                warn!(error = %BidDocError::io(&path, e), "failed to read draft");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(draft) => Some(draft),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to parse draft");
                None
            }
        }
    }

    /// Delete the draft. Removing a draft that does not exist succeeds.
    pub fn remove(&self) -> bool {
        let path = self.path();
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!(path = %path.display(), "draft removed");
                true
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                warn!(error = %BidDocError::io(&path, e), "failed to remove draft");
                false
            }
        }
    }

    /// Whether a draft file is present (readable or not).
    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// Local save time as `2024/1/5 08:00:00`, or empty when there is no
    /// readable draft.
    pub fn saved_time(&self) -> String {
        self.load()
            .and_then(|draft| format_saved_at(&draft.saved_at, &self.display_offset))
            .unwrap_or_default()
    }

    fn write(&self, draft: &DraftData) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| BidDocError::io(&self.dir, e))?;
        let json = serde_json::to_vec_pretty(draft)
            .map_err(|e| BidDocError::Storage(format!("serialize draft: {e}")))?;
        write_atomic(&self.path(), &json)
    }

    /// Directory the store writes to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn format_saved_at(saved_at: &str, offset: &FixedOffset) -> Option<String> {
    let parsed = DateTime::parse_from_rfc3339(saved_at).ok()?;
    Some(
        parsed
            .with_timezone(offset)
            .format("%Y/%-m/%-d %H:%M:%S")
            .to_string(),
    )
}
