//! Atomic file replacement.

use std::path::Path;

use crate::error::{BidDocError, Result};

/// Write to a hidden sibling temp file, then rename over `target`.
///
/// Readers see either the old file or the complete new one.
pub fn write_atomic(target: &Path, bytes: &[u8]) -> Result<()> {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| BidDocError::io(target, std::io::Error::other("no file name")))?;
    let temp = target.with_file_name(format!(".{name}.tmp"));

    std::fs::write(&temp, bytes).map_err(|e| BidDocError::io(&temp, e))?;
    if let Err(e) = std::fs::rename(&temp, target) {
        let _ = std::fs::remove_file(&temp);
        return Err(BidDocError::io(target, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_content_and_cleans_up() {
        let dir = std::env::temp_dir().join(format!("biddoc-atomic-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let target = dir.join("draft.json");

        write_atomic(&target, b"{}").unwrap();
        write_atomic(&target, b"{\"a\":1}").unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"{\"a\":1}");
        assert!(!dir.join(".draft.json.tmp").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn path_without_file_name_is_rejected() {
        assert!(write_atomic(Path::new("/"), b"x").is_err());
    }
}
