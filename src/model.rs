use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
    #[default]
    Unknown,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
            Self::Unknown => "unknown",
        }
    }

    pub fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

/// One row of the roll. The same shape flows through every stage: a
/// candidate from one recognition strategy, the per-page merge of both
/// strategies, and the document-wide deduplicated record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VoterRecord {
    pub serial_no: u32,
    pub cr: String,
    pub voter_no: String,
    pub nid: String,
    pub name: String,
    pub father_name: String,
    pub mother_name: String,
    pub husband_name: String,
    pub gender: Gender,
    pub occupation: String,
    pub date_of_birth: String,
    pub address: String,
    pub area: String,
}

pub type CandidateRecord = VoterRecord;
pub type MergedRecord = VoterRecord;
pub type FinalRecord = VoterRecord;

/// Text fields that take part in merge and deduplication. Gender is merged
/// separately since it is not free text.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RecordField {
    Name,
    VoterNo,
    Nid,
    FatherName,
    MotherName,
    HusbandName,
    Occupation,
    DateOfBirth,
    Address,
    Area,
}

impl RecordField {
    pub const MERGEABLE: [RecordField; 10] = [
        Self::Name,
        Self::VoterNo,
        Self::Nid,
        Self::FatherName,
        Self::MotherName,
        Self::HusbandName,
        Self::Occupation,
        Self::DateOfBirth,
        Self::Address,
        Self::Area,
    ];
}

impl VoterRecord {
    pub fn field(&self, field: RecordField) -> &str {
        match field {
            RecordField::Name => &self.name,
            RecordField::VoterNo => &self.voter_no,
            RecordField::Nid => &self.nid,
            RecordField::FatherName => &self.father_name,
            RecordField::MotherName => &self.mother_name,
            RecordField::HusbandName => &self.husband_name,
            RecordField::Occupation => &self.occupation,
            RecordField::DateOfBirth => &self.date_of_birth,
            RecordField::Address => &self.address,
            RecordField::Area => &self.area,
        }
    }

    pub fn field_mut(&mut self, field: RecordField) -> &mut String {
        match field {
            RecordField::Name => &mut self.name,
            RecordField::VoterNo => &mut self.voter_no,
            RecordField::Nid => &mut self.nid,
            RecordField::FatherName => &mut self.father_name,
            RecordField::MotherName => &mut self.mother_name,
            RecordField::HusbandName => &mut self.husband_name,
            RecordField::Occupation => &mut self.occupation,
            RecordField::DateOfBirth => &mut self.date_of_birth,
            RecordField::Address => &mut self.address,
            RecordField::Area => &mut self.area,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ExtractionMethod {
    #[serde(rename = "text-extraction")]
    TextExtraction,
    #[serde(rename = "ocr")]
    Ocr,
}

impl ExtractionMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TextExtraction => "text-extraction",
            Self::Ocr => "ocr",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub records: Vec<FinalRecord>,
    pub total_pages: usize,
    pub total_extracted: usize,
    pub method: ExtractionMethod,
    pub document_sha256: String,
}

/// Records read from pasted roll text, kept as extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManualResult {
    pub records: Vec<FinalRecord>,
    pub total_extracted: usize,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Processing,
    Done,
    Failed,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "processing" => Some(Self::Processing),
            "done" => Some(Self::Done),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Processing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobProgress {
    pub stage: String,
    pub current: usize,
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
}

impl JobProgress {
    pub fn stage(stage: &str, current: usize, total: usize) -> Self {
        Self {
            stage: stage.to_string(),
            current,
            total,
            page: None,
        }
    }

    pub fn page(stage: &str, current: usize, total: usize, page: impl Into<String>) -> Self {
        Self {
            page: Some(page.into()),
            ..Self::stage(stage, current, total)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportJob {
    pub id: String,
    pub owner_id: String,
    pub target_center_id: String,
    pub status: JobStatus,
    pub progress: JobProgress,
    pub result: Option<ImportResult>,
    pub error: Option<String>,
    pub started_at: String,
    pub updated_at: String,
}

/// What a poller sees. `data` is only present once the job is done.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobStatusView {
    pub status: JobStatus,
    pub progress: JobProgress,
    pub error: Option<String>,
    pub data: Option<ImportResult>,
}

impl From<ImportJob> for JobStatusView {
    fn from(job: ImportJob) -> Self {
        let data = if job.status == JobStatus::Done {
            job.result
        } else {
            None
        };

        Self {
            status: job.status,
            progress: job.progress,
            error: job.error,
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersistSummary {
    pub inserted: usize,
    pub total: usize,
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Center {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub total_voters: i64,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolVersions {
    pub pdftotext: Option<String>,
    pub pdftoppm: Option<String>,
    pub tesseract: Option<String>,
}
