// Incremental consumption of the append-only feed log

use std::{
    borrow::Cow,
    fs,
    path::{Path, PathBuf},
};

use log::warn;

use crate::errors::TrackerError;

/// Re-reads the source log every cycle and hands over only the lines appended
/// since the previous cycle.
pub struct LogTailer {
    source: PathBuf,
    consumed_lines: usize,
    /// `None` until the first cycle, so the first cycle always reports new data
    previous_consumed_lines: Option<usize>,
}

impl LogTailer {
    pub fn new(source: PathBuf) -> Self {
        Self {
            source,
            consumed_lines: 0,
            previous_consumed_lines: None,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn consumed_lines(&self) -> usize {
        self.consumed_lines
    }

    /// Read the file, feed every non-blank new line to `sink` in file order,
    /// and report whether the line count moved since the last cycle.
    ///
    /// Only newline-terminated lines count. A trailing fragment that the feed
    /// writer has not finished yet is left for a later cycle. Invalid UTF-8 is
    /// replaced on the offending line only.
    pub fn poll<F>(&mut self, mut sink: F) -> Result<bool, TrackerError>
    where
        F: FnMut(&str),
    {
        let contents = fs::read(&self.source).map_err(|e| TrackerError::SourceReadError {
            path: self.source.display().to_string(),
            source: e,
        })?;

        let mut total_lines = 0;
        if let Some(last_newline) = contents.iter().rposition(|b| *b == b'\n') {
            for (idx, raw) in contents[..last_newline].split(|b| *b == b'\n').enumerate() {
                total_lines = idx + 1;
                if idx < self.consumed_lines {
                    continue;
                }
                let decoded = String::from_utf8_lossy(raw);
                if matches!(decoded, Cow::Owned(_)) {
                    warn!(
                        "Line {} of {} is not valid UTF-8",
                        total_lines,
                        self.source.display()
                    );
                }
                let line = decoded.trim();
                if !line.is_empty() {
                    sink(line);
                }
            }
        }

        let first_cycle = self.previous_consumed_lines.is_none();
        self.previous_consumed_lines = Some(self.consumed_lines);
        self.consumed_lines = total_lines;
        Ok(first_cycle || Some(self.consumed_lines) != self.previous_consumed_lines)
    }
}
