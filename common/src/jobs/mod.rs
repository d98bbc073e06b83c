use serde::{Deserialize, Serialize};

/// Furthest point an admission submission reached in the pipeline.
///
/// Stages are recorded in order; a submission that fails keeps the last stage it
/// completed so that the side effects already performed can be reconciled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStage {
    Received,
    ClassResolved,
    AttachmentsUploaded,
    PdfRendered,
    RecordAppended,
    PdfStored,
    PdfLinkRecorded,
    RosterUpdated,
    Completed,
}

impl SubmissionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStage::Received => "received",
            SubmissionStage::ClassResolved => "class_resolved",
            SubmissionStage::AttachmentsUploaded => "attachments_uploaded",
            SubmissionStage::PdfRendered => "pdf_rendered",
            SubmissionStage::RecordAppended => "record_appended",
            SubmissionStage::PdfStored => "pdf_stored",
            SubmissionStage::PdfLinkRecorded => "pdf_link_recorded",
            SubmissionStage::RosterUpdated => "roster_updated",
            SubmissionStage::Completed => "completed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let stage = match value {
            "received" => SubmissionStage::Received,
            "class_resolved" => SubmissionStage::ClassResolved,
            "attachments_uploaded" => SubmissionStage::AttachmentsUploaded,
            "pdf_rendered" => SubmissionStage::PdfRendered,
            "record_appended" => SubmissionStage::RecordAppended,
            "pdf_stored" => SubmissionStage::PdfStored,
            "pdf_link_recorded" => SubmissionStage::PdfLinkRecorded,
            "roster_updated" => SubmissionStage::RosterUpdated,
            "completed" => SubmissionStage::Completed,
            _ => return None,
        };
        Some(stage)
    }
}

/// Journal entry for one submission attempt.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmissionStatus {
    pub attempt_id: String,
    pub full_name: String,
    pub class_applied: String,
    /// Last stage that completed successfully.
    pub stage: SubmissionStage,
    /// Set once the attempt has failed; the pipeline stops at `stage`.
    pub error: Option<String>,
}

impl SubmissionStatus {
    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}
