use anyhow::{Context, Result};
use regex::Regex;

use super::clean::FieldCleaner;
use super::labels::{FIELD_RULES, FieldRule, Treatment};
use super::normalize::{bengali_char_count, normalize_text};
use super::segment::{Chunk, Segmenter, detect_gender, prepare_text, record_key};
use crate::config::ExtractionConfig;
use crate::model::{CandidateRecord, Gender, RecordField};

struct CompiledRule {
    regex: Regex,
    captures: &'static [(RecordField, Treatment)],
    fallbacks: Vec<CompiledRule>,
}

impl CompiledRule {
    fn compile(rule: &FieldRule) -> Result<Self> {
        let pattern = rule.pattern();
        let regex = Regex::new(&pattern)
            .with_context(|| format!("failed to compile field rule regex {pattern}"))?;
        let fallbacks = rule
            .fallbacks
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<CompiledRule>>>()?;

        Ok(Self {
            regex,
            captures: rule.captures,
            fallbacks,
        })
    }
}

/// Records found in one text, plus the page gender to carry forward.
/// `marker` is set only when the text itself names a gender.
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    pub records: Vec<CandidateRecord>,
    pub gender: Gender,
    pub marker: Option<Gender>,
}

/// Normalizer, segmenter, rule table and cleaner behind one call.
pub struct RecordExtractor {
    segmenter: Segmenter,
    rules: Vec<CompiledRule>,
    cleaner: FieldCleaner,
    config: ExtractionConfig,
}

impl RecordExtractor {
    pub fn new(config: ExtractionConfig) -> Result<Self> {
        let rules = FIELD_RULES
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<CompiledRule>>>()?;

        Ok(Self {
            segmenter: Segmenter::new()?,
            rules,
            cleaner: FieldCleaner::new()?,
            config,
        })
    }

    pub fn cleaner(&self) -> &FieldCleaner {
        &self.cleaner
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extracts every valid record from one recognized text. `carried` is the
    /// gender detected on earlier pages of the same document.
    pub fn extract_page(&self, raw_text: &str, carried: Gender) -> PageExtraction {
        let text = prepare_text(&normalize_text(raw_text));
        let marker = detect_gender(&text);
        let gender = marker.unwrap_or(carried);

        let records = self
            .segmenter
            .chunks(&text)
            .iter()
            .enumerate()
            .filter_map(|(index, chunk)| self.extract_chunk(chunk, index, gender))
            .collect();

        PageExtraction {
            records,
            gender,
            marker,
        }
    }

    fn extract_chunk(
        &self,
        chunk: &Chunk<'_>,
        index: usize,
        page_gender: Gender,
    ) -> Option<CandidateRecord> {
        let name_payload = self
            .segmenter
            .name_before_next_anchor(&chunk.anchor.name_raw);
        let name = self.cleaner.clean_name(name_payload);
        if bengali_char_count(&name) < self.config.min_name_script_chars {
            return None;
        }

        let cr = record_key(&chunk.anchor.serial_raw);
        let serial_no = match cr.parse::<u32>() {
            Ok(value) if value > 0 => value,
            _ => (index + 1) as u32,
        };

        let mut record = CandidateRecord {
            serial_no,
            cr,
            name,
            gender: detect_gender(chunk.text).unwrap_or(page_gender),
            ..CandidateRecord::default()
        };

        for rule in &self.rules {
            self.apply_rule(rule, chunk.text, &mut record);
        }

        Some(record)
    }

    fn apply_rule(&self, rule: &CompiledRule, text: &str, record: &mut CandidateRecord) {
        let Some(captures) = rule.regex.captures(text) else {
            for fallback in &rule.fallbacks {
                self.apply_rule(fallback, text, record);
            }
            return;
        };

        for (position, (field, treatment)) in rule.captures.iter().enumerate() {
            let raw = captures
                .get(position + 1)
                .map(|value| value.as_str())
                .unwrap_or_default();
            *record.field_mut(*field) = self.treat(raw, *treatment);
        }
    }

    fn treat(&self, raw: &str, treatment: Treatment) -> String {
        match treatment {
            Treatment::Clean(label) => self.cleaner.clean(raw, &label),
            Treatment::Address => self.cleaner.clean_address(raw),
            Treatment::Digits => normalize_text(
                &raw.chars()
                    .filter(|character| !character.is_whitespace())
                    .collect::<String>(),
            ),
            Treatment::Verbatim => normalize_text(raw),
        }
    }
}
