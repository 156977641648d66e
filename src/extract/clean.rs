use anyhow::{Context, Result};
use regex::Regex;

use super::labels::{ADDRESS, ARTIFACT_PATTERNS, DATE, KNOWN_LABELS, LabelToken, OCCUPATION};
use crate::model::{RecordField, VoterRecord};

const ADDRESS_PROBE_CHARS: usize = 20;
const ADDRESS_PROBE_SEARCH_FROM: usize = 10;
const ADDRESS_DOUBLING_MIN_CHARS: usize = 40;

/// Fields the post-merge pass scrubs for `label:` artifacts.
const POST_CLEAN_FIELDS: [RecordField; 5] = [
    RecordField::FatherName,
    RecordField::MotherName,
    RecordField::HusbandName,
    RecordField::Address,
    RecordField::Occupation,
];

/// Removes merged-column contamination and duplicate-label artifacts from
/// extracted values.
pub struct FieldCleaner {
    long_digit_run: Regex,
    address_digit_run: Regex,
    special_chars: Regex,
    address_special_chars: Regex,
    whitespace: Regex,
    trailing_junk: Regex,
    artifacts: Vec<Regex>,
}

impl FieldCleaner {
    pub fn new() -> Result<Self> {
        let artifacts = ARTIFACT_PATTERNS
            .iter()
            .map(|pattern| {
                Regex::new(pattern)
                    .with_context(|| format!("failed to compile label artifact regex {pattern}"))
            })
            .collect::<Result<Vec<Regex>>>()?;

        Ok(Self {
            long_digit_run: Regex::new(r"[0-9\x{09E6}-\x{09EF}]{5,}")
                .context("failed to compile digit run regex")?,
            address_digit_run: Regex::new(r"[0-9\x{09E6}-\x{09EF}]{10,}")
                .context("failed to compile address digit run regex")?,
            special_chars: Regex::new(r#"["\x{201C}\x{201D}*#$|]"#)
                .context("failed to compile special character regex")?,
            address_special_chars: Regex::new(r#"["\x{201C}\x{201D}*#$|()]"#)
                .context("failed to compile address special character regex")?,
            whitespace: Regex::new(r"\s+").context("failed to compile whitespace regex")?,
            trailing_junk: Regex::new(r"[,;:\s]+$")
                .context("failed to compile trailing punctuation regex")?,
            artifacts,
        })
    }

    /// Cleans a value captured after `own` label.
    pub fn clean(&self, value: &str, own: &LabelToken) -> String {
        let truncated = truncate_at_labels(value, own);
        let without_digits = self.long_digit_run.replace_all(truncated, "");
        let without_specials = self.special_chars.replace_all(&without_digits, "");
        self.collapse(&without_specials)
    }

    /// Addresses carry house and ward numbers, so only much longer digit runs
    /// are treated as contamination.
    pub fn clean_address(&self, value: &str) -> String {
        let truncated = truncate_at_labels(value, &ADDRESS);
        let without_digits = self.address_digit_run.replace_all(truncated, "");
        let without_specials = self.address_special_chars.replace_all(&without_digits, "");
        let collapsed = self.collapse(&without_specials);
        self.truncate_doubled_address(&collapsed)
    }

    /// Name payloads only lose digit noise; labels are left alone so names
    /// such as তারিকুল survive.
    pub fn clean_name(&self, value: &str) -> String {
        let without_digits = self.long_digit_run.replace_all(value, "");
        self.collapse(&without_digits)
    }

    /// OCR over two merged columns can print the same address block twice.
    /// When the first twenty characters recur after offset ten, everything
    /// from the recurrence on is dropped.
    pub fn truncate_doubled_address(&self, value: &str) -> String {
        let char_count = value.chars().count();
        if char_count <= ADDRESS_DOUBLING_MIN_CHARS {
            return value.to_string();
        }

        let probe_end = byte_offset_of_char(value, ADDRESS_PROBE_CHARS);
        let search_from = byte_offset_of_char(value, ADDRESS_PROBE_SEARCH_FROM);
        let probe = &value[..probe_end];

        let Some(relative) = value[search_from..].find(probe) else {
            return value.to_string();
        };
        let recurrence = search_from + relative;
        let recurrence_chars = value[..recurrence].chars().count();
        if recurrence_chars >= char_count - ADDRESS_PROBE_SEARCH_FROM {
            return value.to_string();
        }

        self.trim_trailing_junk(&value[..recurrence])
    }

    /// Second cleanup over a merged page, catching artifacts the merge
    /// itself can introduce.
    pub fn post_clean(&self, records: &mut [VoterRecord]) {
        for record in records.iter_mut() {
            if !record.address.is_empty() {
                record.address = self.truncate_doubled_address(&record.address);
            }

            for field in POST_CLEAN_FIELDS {
                let value = record.field(field);
                if value.is_empty() {
                    continue;
                }

                let mut cleaned = value.to_string();
                for artifact in &self.artifacts {
                    if let Some(found) = artifact.find(&cleaned) {
                        if found.start() > 0 {
                            cleaned = cleaned[..found.start()].trim().to_string();
                        }
                    }
                }
                *record.field_mut(field) = self.trim_trailing_junk(&cleaned);
            }

            if !record.mother_name.is_empty() {
                record.mother_name = self.cut_mother_bleed(&record.mother_name);
            }
        }
    }

    /// Occupation or birth date text read into the mother's name. A value
    /// that starts with such a label held no name at all.
    fn cut_mother_bleed(&self, value: &str) -> String {
        let mut cleaned = value.to_string();
        for label in [OCCUPATION, DATE] {
            if let Some(offset) = label.find_from(&cleaned, 0) {
                cleaned = cleaned[..offset].trim().to_string();
            }
        }
        self.trim_trailing_junk(&cleaned)
    }

    fn collapse(&self, value: &str) -> String {
        self.whitespace.replace_all(value, " ").trim().to_string()
    }

    fn trim_trailing_junk(&self, value: &str) -> String {
        self.trailing_junk.replace(value.trim(), "").trim().to_string()
    }
}

/// Cuts the value at the first other known label, then at a repeat of its
/// own label. A label at offset zero is not a cut point.
fn truncate_at_labels<'a>(value: &'a str, own: &LabelToken) -> &'a str {
    let mut truncated = value;
    for label in KNOWN_LABELS.iter().filter(|label| label.key != own.key) {
        if let Some(offset) = label.find_from(truncated, 0) {
            if offset > 0 {
                truncated = &truncated[..offset];
            }
        }
    }

    let first_char_len = truncated.chars().next().map_or(0, char::len_utf8);
    if let Some(offset) = own.find_from(truncated, first_char_len) {
        truncated = &truncated[..offset];
    }

    truncated
}

fn byte_offset_of_char(value: &str, char_index: usize) -> usize {
    value
        .char_indices()
        .nth(char_index)
        .map_or(value.len(), |(offset, _)| offset)
}
