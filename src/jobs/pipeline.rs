use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use super::tracker::DocumentPipeline;
use crate::config::{ExtractionConfig, OcrConfig};
use crate::extract::{RecordExtractor, bengali_char_count, deduplicate};
use crate::model::{ExtractionMethod, FinalRecord, Gender, ImportResult, JobProgress, MergedRecord};
use crate::ocr::{
    DocumentPreprocessor, DualStrategyEngine, Recognizer, ensure_ocr_tools, extract_text_layer,
    select_ocr_pages,
};
use crate::util::sha256_file;

/// Text layer first; scanned pages through both recognition strategies
/// otherwise.
pub struct OcrPipeline<R> {
    extractor: RecordExtractor,
    preprocessor: DocumentPreprocessor,
    engine: DualStrategyEngine<R>,
    ocr_config: OcrConfig,
}

impl<R: Recognizer> OcrPipeline<R> {
    pub fn new(extraction: ExtractionConfig, ocr_config: OcrConfig, recognizer: R) -> Result<Self> {
        Ok(Self {
            extractor: RecordExtractor::new(extraction)?,
            preprocessor: DocumentPreprocessor::new(ocr_config.clone()),
            engine: DualStrategyEngine::new(recognizer, ocr_config.column_count),
            ocr_config,
        })
    }

    /// Records from an embedded text layer, or `None` when the layer is too
    /// thin or yields nothing.
    pub fn records_from_text_layer(&self, pages: &[String]) -> Option<Vec<FinalRecord>> {
        let script_chars = pages.iter().map(|page| bengali_char_count(page)).sum::<usize>();
        if script_chars <= self.extractor.config().min_text_layer_script_chars {
            return None;
        }

        let records = self
            .extractor
            .extract_document(pages.iter().map(String::as_str));
        if records.is_empty() { None } else { Some(records) }
    }

    /// Runs both strategies over every page in order, carrying the page
    /// gender forward. `first_page` is the printed number of `pages[0]`.
    pub fn recognize_pages(
        &self,
        pages: &[PathBuf],
        first_page: usize,
        work_dir: &Path,
        progress: &mut dyn FnMut(JobProgress),
    ) -> Vec<Vec<MergedRecord>> {
        let total = pages.len();
        let mut gender = Gender::Unknown;
        let mut merged = Vec::with_capacity(total);

        for (index, image) in pages.iter().enumerate() {
            let page_number = first_page + index;
            let texts = self.engine.recognize_page(image, work_dir);
            let outcome = self
                .extractor
                .merge_page(&texts.full_page, &texts.columns, gender);
            gender = outcome.gender;

            info!(
                page = page_number,
                strategy_a = outcome.strategy_a_count,
                strategy_b = outcome.strategy_b_count,
                merged = outcome.records.len(),
                gender = gender.as_str(),
                "page processed"
            );

            merged.push(outcome.records);
            progress(JobProgress::page("ocr", index + 1, total, page_number.to_string()));
        }

        merged
    }
}

impl<R: Recognizer> DocumentPipeline for OcrPipeline<R> {
    fn run(
        &self,
        document: &Path,
        work_dir: &Path,
        progress: &mut dyn FnMut(JobProgress),
    ) -> Result<ImportResult> {
        let document_sha256 = sha256_file(document)?;

        match extract_text_layer(document, &self.ocr_config) {
            Ok(pages) => {
                if let Some(records) = self.records_from_text_layer(&pages) {
                    info!(records = records.len(), pages = pages.len(), "using embedded text layer");
                    progress(JobProgress::page("text", 1, 1, "1"));
                    return Ok(ImportResult {
                        total_extracted: records.len(),
                        records,
                        total_pages: pages.len(),
                        method: ExtractionMethod::TextExtraction,
                        document_sha256,
                    });
                }
            }
            Err(err) => warn!(error = %format!("{err:#}"), "text layer unavailable; falling back to OCR"),
        }

        ensure_ocr_tools()?;
        let rendered = self.preprocessor.render_pages(document, work_dir)?;
        let pages = select_ocr_pages(&rendered);
        let first_page = rendered.len() - pages.len() + 1;

        let merged = self.recognize_pages(pages, first_page, work_dir, progress);
        let records = deduplicate(merged);

        Ok(ImportResult {
            total_extracted: records.len(),
            records,
            total_pages: rendered.len(),
            method: ExtractionMethod::Ocr,
            document_sha256,
        })
    }
}
