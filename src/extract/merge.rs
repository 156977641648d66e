use std::collections::HashMap;

use super::clean::FieldCleaner;
use super::fields::RecordExtractor;
use super::labels::KNOWN_LABELS;
use super::normalize::bengali_char_count;
use crate::model::{CandidateRecord, FinalRecord, Gender, MergedRecord, RecordField, VoterRecord};

/// Both strategies' results for one page after reconciliation.
#[derive(Debug, Clone, Default)]
pub struct PageOutcome {
    pub records: Vec<MergedRecord>,
    pub strategy_a_count: usize,
    pub strategy_b_count: usize,
    pub gender: Gender,
}

impl RecordExtractor {
    /// Extracts both strategy texts for one page and reconciles them.
    pub fn merge_page(&self, full_page: &str, columns: &str, carried: Gender) -> PageOutcome {
        let strategy_a = self.extract_page(full_page, carried);
        let strategy_b = self.extract_page(columns, carried);

        let gender = strategy_b
            .marker
            .or(strategy_a.marker)
            .unwrap_or(strategy_a.gender);
        let strategy_a_count = strategy_a.records.len();
        let strategy_b_count = strategy_b.records.len();

        PageOutcome {
            records: merge_strategies(
                strategy_a.records,
                strategy_b.records,
                self.cleaner(),
                self.config().label_penalty,
            ),
            strategy_a_count,
            strategy_b_count,
            gender,
        }
    }

    /// Records from an embedded text layer, one entry per page.
    pub fn extract_document<'a, I>(&self, pages: I) -> Vec<FinalRecord>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut gender = Gender::Unknown;
        let merged = pages
            .into_iter()
            .map(|page| {
                let outcome = self.merge_page(page, "", gender);
                gender = outcome.gender;
                outcome.records
            })
            .collect::<Vec<Vec<MergedRecord>>>();

        deduplicate(merged)
    }

    /// Pasted roll text, page by page with the gender carried over. Records
    /// come back in text order; a repeated serial is kept each time it
    /// appears.
    pub fn extract_pasted<'a, I>(&self, pages: I) -> Vec<FinalRecord>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut gender = Gender::Unknown;
        let mut records = Vec::new();
        for page in pages {
            let extraction = self.extract_page(page, gender);
            gender = extraction.gender;
            records.extend(extraction.records);
        }
        records
    }
}

/// Bengali character count minus `label_penalty` for every label token in
/// the value.
pub fn script_density_score(value: &str, label_penalty: i64) -> i64 {
    let labels = KNOWN_LABELS
        .iter()
        .map(|label| label.count_in(value))
        .sum::<usize>();
    bengali_char_count(value) as i64 - label_penalty * labels as i64
}

fn is_full_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 10
        && bytes[2] == b'/'
        && bytes[5] == b'/'
        && bytes
            .iter()
            .enumerate()
            .all(|(index, byte)| index == 2 || index == 5 || byte.is_ascii_digit())
}

/// Whether `incoming` should replace a non-empty `existing` value.
fn prefers_incoming(field: RecordField, existing: &str, incoming: &str, label_penalty: i64) -> bool {
    match field {
        RecordField::VoterNo | RecordField::Nid => incoming.len() > existing.len(),
        RecordField::DateOfBirth => is_full_date(incoming) && !is_full_date(existing),
        _ => {
            script_density_score(incoming, label_penalty)
                > script_density_score(existing, label_penalty)
        }
    }
}

/// Insertion-ordered map from record key to record.
#[derive(Default)]
struct RecordIndex {
    positions: HashMap<String, usize>,
    records: Vec<VoterRecord>,
}

impl RecordIndex {
    fn upsert(&mut self, incoming: VoterRecord, mut merge: impl FnMut(&mut VoterRecord, &VoterRecord)) {
        match self.positions.get(&incoming.cr).copied() {
            Some(position) => merge(&mut self.records[position], &incoming),
            None => {
                self.positions
                    .insert(incoming.cr.clone(), self.records.len());
                self.records.push(incoming);
            }
        }
    }

    fn into_sorted(self) -> Vec<VoterRecord> {
        let mut records = self.records;
        records.sort_by_key(|record| record.serial_no);
        records
    }
}

fn fill_gender(existing: &mut VoterRecord, incoming: &VoterRecord) {
    if !existing.gender.is_known() && incoming.gender.is_known() {
        existing.gender = incoming.gender;
    }
}

/// Reconciles one page's Strategy A and Strategy B records, field by field.
pub fn merge_strategies(
    strategy_a: Vec<CandidateRecord>,
    strategy_b: Vec<CandidateRecord>,
    cleaner: &FieldCleaner,
    label_penalty: i64,
) -> Vec<MergedRecord> {
    let mut index = RecordIndex::default();

    for candidate in strategy_a.into_iter().chain(strategy_b) {
        index.upsert(candidate, |existing, incoming| {
            for field in RecordField::MERGEABLE {
                let new_value = incoming.field(field);
                if new_value.is_empty() {
                    continue;
                }

                let current = existing.field(field);
                if current.is_empty()
                    || prefers_incoming(field, current, new_value, label_penalty)
                {
                    *existing.field_mut(field) = new_value.to_string();
                }
            }
            fill_gender(existing, incoming);
        });
    }

    let mut merged = index.into_sorted();
    cleaner.post_clean(&mut merged);
    merged
}

/// Folds every page's merged records into one list. Only empty fields are
/// filled; the first value seen for a field always stays.
pub fn deduplicate<I>(pages: I) -> Vec<FinalRecord>
where
    I: IntoIterator<Item = Vec<MergedRecord>>,
{
    let mut index = RecordIndex::default();

    for record in pages.into_iter().flatten() {
        index.upsert(record, |existing, incoming| {
            for field in RecordField::MERGEABLE {
                if existing.field(field).is_empty() && !incoming.field(field).is_empty() {
                    *existing.field_mut(field) = incoming.field(field).to_string();
                }
            }
            fill_gender(existing, incoming);
        });
    }

    index.into_sorted()
}
