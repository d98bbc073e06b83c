use serde::{Deserialize, Serialize};

/// Body returned by `POST /admissions` when every stage completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionResponse {
    pub success: bool,
    #[serde(rename = "pdfUrl", skip_serializing_if = "Option::is_none", default)]
    pub pdf_url: Option<String>,
}

/// Body returned by `POST /sendEmail` on success.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSentResponse {
    pub success: bool,
    pub msg: String,
}

/// Error body shared by every JSON endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        ErrorResponse {
            error: error.into(),
        }
    }
}
