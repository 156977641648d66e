use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use image::{Rgb, RgbImage};

use super::preprocess::collect_page_images;
use super::recognize::column_bounds;
use super::tools::run_with_timeout;
use super::*;
use crate::error::{ImportError, OCR_INSTALL_HINT};

/// Replies with canned text keyed by image file name and remembers every call.
#[derive(Default)]
struct ScriptedRecognizer {
    calls: Mutex<Vec<(String, PageSegMode)>>,
    failing: Vec<&'static str>,
}

impl ScriptedRecognizer {
    fn failing_on(names: &[&'static str]) -> Self {
        Self {
            failing: names.to_vec(),
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<(String, PageSegMode)> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl Recognizer for &ScriptedRecognizer {
    fn recognize(&self, image: &Path, mode: PageSegMode) -> Result<String> {
        let name = image
            .file_name()
            .and_then(|value| value.to_str())
            .unwrap_or_default()
            .to_string();
        self.calls
            .lock()
            .expect("calls lock")
            .push((name.clone(), mode));

        if self.failing.contains(&name.as_str()) {
            bail!("engine crashed on {name}");
        }
        Ok(format!("<{name}>"))
    }
}

fn write_page(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(width, height, Rgb([255, 255, 255]))
        .save(&path)
        .expect("page image should be written");
    path
}

#[test]
fn column_bounds_give_remainder_to_last_strip() {
    assert_eq!(column_bounds(100, 3), vec![(0, 33), (33, 33), (66, 34)]);
    assert_eq!(column_bounds(99, 3), vec![(0, 33), (33, 33), (66, 33)]);
    assert_eq!(column_bounds(10, 1), vec![(0, 10)]);
}

#[test]
fn select_ocr_pages_skips_cover_only_for_long_documents() {
    let pages = (1..=3)
        .map(|number| PathBuf::from(format!("page-{number}.png")))
        .collect::<Vec<PathBuf>>();

    assert_eq!(select_ocr_pages(&pages), &pages[1..]);
    assert_eq!(select_ocr_pages(&pages[..2]), &pages[..2]);
    assert_eq!(select_ocr_pages(&pages[..1]), &pages[..1]);
    assert!(select_ocr_pages(&[]).is_empty());
}

#[test]
fn collect_page_images_sorts_numerically_and_ignores_strips() {
    let dir = tempfile::tempdir().expect("temp dir");
    for name in ["page-10.png", "page-2.png", "page-1.png", "page-1-strip-1.png", "notes.txt"] {
        fs::write(dir.path().join(name), b"").expect("fixture file");
    }

    let names = collect_page_images(dir.path())
        .expect("listing should succeed")
        .iter()
        .filter_map(|path| path.file_name()?.to_str().map(str::to_string))
        .collect::<Vec<String>>();

    assert_eq!(names, vec!["page-1.png", "page-2.png", "page-10.png"]);
}

#[test]
fn engine_runs_full_page_then_each_strip_in_order() {
    let dir = tempfile::tempdir().expect("temp dir");
    let page = write_page(dir.path(), "page-1.png", 90, 20);
    let recognizer = ScriptedRecognizer::default();
    let engine = DualStrategyEngine::new(&recognizer, 3);

    let texts = engine.recognize_page(&page, dir.path());

    assert_eq!(texts.full_page, "<page-1.png>");
    assert_eq!(
        texts.columns,
        "<page-1-strip-1.png>\n<page-1-strip-2.png>\n<page-1-strip-3.png>\n"
    );

    let calls = recognizer.calls();
    assert_eq!(calls[0], ("page-1.png".to_string(), PageSegMode::AutoLayout));
    assert!(
        calls[1..]
            .iter()
            .all(|(_, mode)| *mode == PageSegMode::SingleBlock)
    );
    assert_eq!(
        image::image_dimensions(dir.path().join("page-1-strip-3.png")).expect("strip exists"),
        (30, 20)
    );
}

#[test]
fn engine_turns_recognizer_failure_into_empty_text() {
    let dir = tempfile::tempdir().expect("temp dir");
    let page = write_page(dir.path(), "page-1.png", 30, 10);
    let recognizer = ScriptedRecognizer::failing_on(&["page-1.png", "page-1-strip-2.png"]);
    let engine = DualStrategyEngine::new(&recognizer, 3);

    let texts = engine.recognize_page(&page, dir.path());

    assert_eq!(texts.full_page, "");
    assert_eq!(texts.columns, "<page-1-strip-1.png>\n\n<page-1-strip-3.png>\n");
}

#[test]
fn engine_survives_undecodable_page() {
    let dir = tempfile::tempdir().expect("temp dir");
    let page = dir.path().join("page-1.png");
    fs::write(&page, b"not a png").expect("fixture file");
    let recognizer = ScriptedRecognizer::default();
    let engine = DualStrategyEngine::new(&recognizer, 3);

    let texts = engine.recognize_page(&page, dir.path());

    assert_eq!(texts.full_page, "<page-1.png>");
    assert_eq!(texts.columns, "\n\n\n");
    assert_eq!(recognizer.calls().len(), 1);
}

#[cfg(unix)]
#[test]
fn run_with_timeout_kills_slow_commands() {
    let mut slow = std::process::Command::new("sleep");
    slow.arg("5");
    let started = Instant::now();
    let err = run_with_timeout(slow, Duration::from_millis(200)).expect_err("should time out");
    assert!(err.to_string().contains("sleep timed out"));
    assert!(started.elapsed() < Duration::from_secs(4));

    let mut quick = std::process::Command::new("echo");
    quick.arg("ok");
    let output = run_with_timeout(quick, Duration::from_secs(5)).expect("echo should run");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "ok");
}

#[test]
fn missing_tools_are_named_with_the_install_hint() {
    let message = ImportError::tool_missing(&["pdftoppm", "tesseract"]).to_string();

    assert!(message.contains("pdftoppm, tesseract"));
    assert!(message.contains(OCR_INSTALL_HINT));
    assert!(message.contains("tesseract-ocr-ben"));
}
