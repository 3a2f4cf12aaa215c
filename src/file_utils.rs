use anyhow::Result;
use std::fs;
use std::path::Path;

use crate::errors::SubtitleError;
use crate::subtitle_processor::SubtitleFormat;

// @module: File utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    /// Read a subtitle file, choosing the format from its suffix.
    ///
    /// Unsupported suffixes are rejected before the file is opened.
    pub fn read_subtitle<P: AsRef<Path>>(path: P) -> Result<(SubtitleFormat, String)> {
        let path = path.as_ref();
        let format = SubtitleFormat::from_path(path)?;

        let bytes = fs::read(path).map_err(|e| SubtitleError::Unreadable {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        // Be forgiving about stray invalid bytes, the parser only needs text
        let content = String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned());

        Ok((format, content))
    }
}
