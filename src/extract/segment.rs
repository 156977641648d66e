use anyhow::{Context, Result};
use regex::Regex;

use super::labels::{ANCHOR_PATTERN, EMBEDDED_ANCHOR_PATTERN, FEMALE_MARKER, MALE_MARKER};
use crate::model::Gender;

/// A record start: serial number plus name label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub text_offset: usize,
    pub serial_raw: String,
    pub name_raw: String,
}

/// The text from one anchor up to the next.
#[derive(Debug, Clone)]
pub struct Chunk<'a> {
    pub anchor: Anchor,
    pub text: &'a str,
}

pub struct Segmenter {
    anchor: Regex,
    embedded_anchor: Regex,
}

impl Segmenter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            anchor: Regex::new(ANCHOR_PATTERN).context("failed to compile record anchor regex")?,
            embedded_anchor: Regex::new(EMBEDDED_ANCHOR_PATTERN)
                .context("failed to compile embedded anchor regex")?,
        })
    }

    /// Anchors in first-occurrence order. Matches do not overlap, so a second
    /// record whose anchor sits on the same line as the first is not found
    /// here; the column-split strategy is what recovers it.
    pub fn anchors(&self, text: &str) -> Vec<Anchor> {
        self.anchor
            .captures_iter(text)
            .filter_map(|captures| {
                let whole = captures.get(0)?;
                Some(Anchor {
                    text_offset: whole.start(),
                    serial_raw: captures.get(1)?.as_str().to_string(),
                    name_raw: captures.get(2)?.as_str().trim().to_string(),
                })
            })
            .collect()
    }

    pub fn chunks<'a>(&self, text: &'a str) -> Vec<Chunk<'a>> {
        let anchors = self.anchors(text);
        let ends = anchors
            .iter()
            .skip(1)
            .map(|anchor| anchor.text_offset)
            .chain(std::iter::once(text.len()))
            .collect::<Vec<usize>>();

        anchors
            .into_iter()
            .zip(ends)
            .map(|(anchor, end)| Chunk {
                text: &text[anchor.text_offset..end],
                anchor,
            })
            .collect()
    }

    /// The name payload up to any following record's anchor.
    pub fn name_before_next_anchor<'a>(&self, name_raw: &'a str) -> &'a str {
        match self.embedded_anchor.find(name_raw) {
            Some(found) => &name_raw[..found.start()],
            None => name_raw,
        }
    }
}

/// Line-ending normalization and removal of table-rule glyphs OCR reads as
/// characters.
pub fn prepare_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .chars()
        .filter(|character| !matches!(character, '|' | '[' | ']' | '\u{00AB}' | '\u{00BB}'))
        .collect()
}

/// The gender marker printed in a page header, if any. The female marker is
/// checked first.
pub fn detect_gender(text: &str) -> Option<Gender> {
    if text.contains(FEMALE_MARKER) {
        Some(Gender::Female)
    } else if text.contains(MALE_MARKER) {
        Some(Gender::Male)
    } else {
        None
    }
}

/// Serials are keyed by value: `"05"` and `"5"` are the same record.
pub fn record_key(serial_raw: &str) -> String {
    let trimmed = serial_raw.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}
