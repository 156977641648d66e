mod preprocess;
mod recognize;
mod tools;
#[cfg(test)]
mod tests;

pub use preprocess::{DocumentPreprocessor, extract_text_layer, select_ocr_pages};
pub use recognize::{DualStrategyEngine, PageSegMode, Recognizer, TesseractRecognizer};
pub use tools::{ensure_ocr_tools, tool_versions};
