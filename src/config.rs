use std::time::Duration;

/// Heuristic thresholds for turning recognized text into records.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Points subtracted from a field's score for every label token found in it.
    pub label_penalty: i64,
    /// Bengali characters a name needs before its record is kept.
    pub min_name_script_chars: usize,
    /// Bengali characters the text layer needs before OCR is skipped.
    pub min_text_layer_script_chars: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            label_penalty: 10,
            min_name_script_chars: 2,
            min_text_layer_script_chars: 100,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OcrConfig {
    pub lang: String,
    pub dpi: u32,
    pub column_count: u32,
    pub recognize_timeout: Duration,
    pub render_timeout: Duration,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            lang: "ben".to_string(),
            dpi: 300,
            column_count: 3,
            recognize_timeout: Duration::from_secs(120),
            render_timeout: Duration::from_secs(600),
        }
    }
}

impl OcrConfig {
    /// Longest a running import can go without reporting progress: the text
    /// layer and render calls, then the first page's recognizer calls.
    pub fn stale_job_after(&self) -> Duration {
        self.render_timeout * 2
            + self.recognize_timeout * (self.column_count + 1)
            + Duration::from_secs(60)
    }
}
