use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use tracing::warn;

use super::tools::run_with_timeout;
use crate::config::OcrConfig;

/// Tesseract page segmentation modes the engine uses.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum PageSegMode {
    AutoLayout,
    SingleBlock,
}

impl PageSegMode {
    pub fn as_arg(self) -> &'static str {
        match self {
            Self::AutoLayout => "1",
            Self::SingleBlock => "6",
        }
    }
}

/// Turns one image into text.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, image: &Path, mode: PageSegMode) -> Result<String>;
}

pub struct TesseractRecognizer {
    lang: String,
    timeout: Duration,
}

impl TesseractRecognizer {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            lang: config.lang.clone(),
            timeout: config.recognize_timeout,
        }
    }
}

impl Recognizer for TesseractRecognizer {
    fn recognize(&self, image: &Path, mode: PageSegMode) -> Result<String> {
        let mut command = Command::new("tesseract");
        command
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.lang)
            .arg("--psm")
            .arg(mode.as_arg());

        let output = run_with_timeout(command, self.timeout)
            .with_context(|| format!("failed to recognize {}", image.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "tesseract returned non-zero exit status for {}: {}",
                image.display(),
                stderr.trim()
            );
        }

        Ok(String::from_utf8_lossy(&output.stdout).replace('\u{0000}', ""))
    }
}

/// Raw text from both strategies for one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyTexts {
    pub full_page: String,
    pub columns: String,
}

pub struct DualStrategyEngine<R> {
    recognizer: R,
    column_count: u32,
}

impl<R: Recognizer> DualStrategyEngine<R> {
    pub fn new(recognizer: R, column_count: u32) -> Self {
        Self {
            recognizer,
            column_count: column_count.max(1),
        }
    }

    /// Strategy A reads the whole page with layout analysis; Strategy B reads
    /// each vertical strip as a single block. Neither ever fails: a broken
    /// invocation contributes empty text.
    pub fn recognize_page(&self, image: &Path, work_dir: &Path) -> StrategyTexts {
        let full_page = self.recognize_or_empty(image, PageSegMode::AutoLayout);

        let mut columns = String::new();
        for strip in self.split_columns(image, work_dir) {
            if let Some(strip) = strip {
                columns.push_str(&self.recognize_or_empty(&strip, PageSegMode::SingleBlock));
            }
            columns.push('\n');
        }

        StrategyTexts { full_page, columns }
    }

    fn recognize_or_empty(&self, image: &Path, mode: PageSegMode) -> String {
        match self.recognizer.recognize(image, mode) {
            Ok(text) => text,
            Err(err) => {
                warn!(
                    image = %image.display(),
                    psm = mode.as_arg(),
                    error = %format!("{err:#}"),
                    "recognition failed; using empty text"
                );
                String::new()
            }
        }
    }

    /// One entry per strip, `None` where the strip could not be produced.
    fn split_columns(&self, image: &Path, work_dir: &Path) -> Vec<Option<PathBuf>> {
        let decoded = match image::open(image) {
            Ok(decoded) => decoded,
            Err(err) => {
                warn!(image = %image.display(), error = %err, "failed to decode page image");
                return vec![None; self.column_count as usize];
            }
        };

        let stem = image
            .file_stem()
            .and_then(|value| value.to_str())
            .unwrap_or("page");

        column_bounds(decoded.width(), self.column_count)
            .into_iter()
            .enumerate()
            .map(|(index, (left, width))| {
                let strip_path = work_dir.join(format!("{stem}-strip-{}.png", index + 1));
                match decoded
                    .crop_imm(left, 0, width, decoded.height())
                    .save(&strip_path)
                {
                    Ok(()) => Some(strip_path),
                    Err(err) => {
                        warn!(strip = %strip_path.display(), error = %err, "failed to write column strip");
                        None
                    }
                }
            })
            .collect()
    }
}

/// `(left, width)` of each vertical strip. Strips are `width / columns`
/// wide; the last absorbs the remainder.
pub fn column_bounds(width: u32, columns: u32) -> Vec<(u32, u32)> {
    let columns = columns.max(1);
    let strip = width / columns;

    (0..columns)
        .map(|index| {
            let left = index * strip;
            if index + 1 == columns {
                (left, width - left)
            } else {
                (left, strip)
            }
        })
        .collect()
}
