use std::fmt;
use std::path::Path;
use anyhow::{Result, Context};
use serde::{Deserialize, Serialize};
use log::debug;

// @module: SRT parsing and rendering

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleEntry {
    // @field: Ordinal from the source file, never renumbered
    pub index: usize,

    // @field: Raw timing line, passed through untouched
    pub time_code: String,

    // @field: Subtitle text, lines joined with '\n'
    pub text: String,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry
    pub fn new(index: usize, time_code: impl Into<String>, text: impl Into<String>) -> Self {
        SubtitleEntry {
            index,
            time_code: time_code.into(),
            text: text.into(),
        }
    }

    /// Copy of this entry with its text replaced
    pub fn with_text(&self, text: impl Into<String>) -> Self {
        SubtitleEntry {
            index: self.index,
            time_code: self.time_code.clone(),
            text: text.into(),
        }
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        writeln!(f, "{}", self.time_code)?;
        writeln!(f, "{}", self.text)?;
        writeln!(f)
    }
}

/// Converts between SRT text and subtitle entries
pub struct SubtitleCodec;

impl SubtitleCodec {
    /// Parse SRT content into entries.
    ///
    /// Line endings are normalized and the whole input is trimmed before it is
    /// split on blank lines. Blocks with fewer than three non-empty lines, or
    /// whose first line is not an integer, are dropped without error. Entries
    /// keep file order and their original indices.
    pub fn parse(content: &str) -> Vec<SubtitleEntry> {
        let normalized = content.replace("\r\n", "\n");
        let normalized = normalized.trim();

        let mut entries = Vec::new();
        let mut dropped = 0usize;

        for block in normalized.split("\n\n") {
            let lines: Vec<&str> = block
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect();

            if lines.len() < 3 {
                dropped += 1;
                continue;
            }

            let Ok(index) = lines[0].parse::<usize>() else {
                dropped += 1;
                continue;
            };

            entries.push(SubtitleEntry {
                index,
                time_code: lines[1].to_string(),
                text: lines[2..].join("\n"),
            });
        }

        if dropped > 0 {
            debug!("Dropped {} malformed subtitle block(s)", dropped);
        }

        entries
    }

    /// Render entries back to SRT text, one block per entry in sequence order
    pub fn render(entries: &[SubtitleEntry]) -> String {
        let mut output = String::new();
        for entry in entries {
            output.push_str(&entry.to_string());
        }
        output
    }

    /// Read and parse an SRT file
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<SubtitleEntry>> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;
        Ok(Self::parse(&content))
    }
}
