use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::info;

use super::tools::run_with_timeout;
use crate::config::OcrConfig;

const PAGE_IMAGE_PREFIX: &str = "page";

/// The embedded text layer, one entry per page. Trailing blank pages are
/// dropped.
pub fn extract_text_layer(pdf_path: &Path, config: &OcrConfig) -> Result<Vec<String>> {
    let mut command = Command::new("pdftotext");
    command.arg("-enc").arg("UTF-8").arg(pdf_path).arg("-");

    let output = run_with_timeout(command, config.render_timeout)
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    let raw = String::from_utf8_lossy(&output.stdout);
    let mut pages: Vec<String> = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect();

    while let Some(last_page) = pages.last() {
        if last_page.trim().is_empty() {
            pages.pop();
            continue;
        }
        break;
    }

    Ok(pages)
}

pub struct DocumentPreprocessor {
    config: OcrConfig,
}

impl DocumentPreprocessor {
    pub fn new(config: OcrConfig) -> Self {
        Self { config }
    }

    /// Rasterizes every page of `pdf_path` into `work_dir` with a single
    /// `pdftoppm` call and returns the images in page order.
    pub fn render_pages(&self, pdf_path: &Path, work_dir: &Path) -> Result<Vec<PathBuf>> {
        let mut command = Command::new("pdftoppm");
        command
            .arg("-png")
            .arg("-r")
            .arg(self.config.dpi.to_string())
            .arg(pdf_path)
            .arg(work_dir.join(PAGE_IMAGE_PREFIX));

        let output = run_with_timeout(command, self.config.render_timeout)
            .with_context(|| format!("failed to render {}", pdf_path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "pdftoppm returned non-zero exit status for {}: {}",
                pdf_path.display(),
                stderr.trim()
            );
        }

        let pages = collect_page_images(work_dir)?;
        if pages.is_empty() {
            bail!(
                "document produced no page images: {}",
                pdf_path.display()
            );
        }

        info!(pages = pages.len(), dpi = self.config.dpi, "rendered document pages");
        Ok(pages)
    }
}

/// `page-N.png` files in `work_dir`, sorted by N. `pdftoppm` zero-pads N to
/// the width of the page count, so names alone do not sort numerically.
pub fn collect_page_images(work_dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(work_dir)
        .with_context(|| format!("failed to list rendered pages in {}", work_dir.display()))?;

    let mut pages = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("failed to read entry in {}", work_dir.display()))?
            .path();
        if let Some(number) = page_number_of(&path) {
            pages.push((number, path));
        }
    }

    pages.sort_by_key(|(number, _)| *number);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

fn page_number_of(path: &Path) -> Option<u32> {
    if path.extension().and_then(|value| value.to_str()) != Some("png") {
        return None;
    }

    path.file_stem()?
        .to_str()?
        .strip_prefix(PAGE_IMAGE_PREFIX)?
        .strip_prefix('-')?
        .parse()
        .ok()
}

/// The first page of a roll longer than two pages is a cover sheet.
pub fn select_ocr_pages(pages: &[PathBuf]) -> &[PathBuf] {
    if pages.len() > 2 { &pages[1..] } else { pages }
}
