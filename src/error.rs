use thiserror::Error;

pub const OCR_INSTALL_HINT: &str = "install them with `apt install tesseract-ocr tesseract-ocr-ben poppler-utils` \
     or `brew install tesseract tesseract-lang poppler`";

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("invalid import request: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("an import is already running for this center (job {existing_job_id})")]
    Conflict { existing_job_id: String },

    #[error("scanned documents need {tools}, which are not installed; {hint}")]
    ToolMissing { tools: String, hint: &'static str },

    #[error("no voter records could be extracted from the document; check the PDF format")]
    ExtractionEmpty,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    pub fn tool_missing(tools: &[&str]) -> Self {
        Self::ToolMissing {
            tools: tools.join(", "),
            hint: OCR_INSTALL_HINT,
        }
    }
}

impl From<rusqlite::Error> for ImportError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Other(error.into())
    }
}
