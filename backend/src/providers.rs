//! Interfaces of the external collaborators the admission pipeline drives.
//!
//! Production implementations live in `crate::google` and `crate::services::admissions::pdf`;
//! tests substitute the in-memory fakes from `crate::testing`. The whole set is
//! built once in `main.rs` and shared read-only as a `ClientBundle`.

use crate::error::ProviderError;
use crate::services::admissions::pdf::AdmissionDocument;
use async_trait::async_trait;
use std::sync::Arc;

/// A file to create in object storage.
pub struct NewFile<'a> {
    pub name: &'a str,
    pub mime_type: &'a str,
    pub parent_id: &'a str,
    pub content: Vec<u8>,
}

#[async_trait]
pub trait FileStore: Send + Sync {
    /// Creates the file and returns its storage id.
    async fn create_file(&self, file: NewFile<'_>) -> Result<String, ProviderError>;

    async fn grant_public_read(&self, file_id: &str) -> Result<(), ProviderError>;

    /// Copies `file_id` into `parent_id`, returning the id of the copy.
    async fn copy_file(
        &self,
        file_id: &str,
        name: &str,
        parent_id: &str,
    ) -> Result<String, ProviderError>;

    /// Stable public link for a stored file.
    fn public_url(&self, file_id: &str) -> String;
}

/// Zero-based cell coordinates inside a tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellRef {
    pub row: usize,
    pub column: usize,
}

#[async_trait]
pub trait SheetStore: Send + Sync {
    /// Appends one row after the last non-empty row of `tab`.
    async fn append_row(&self, tab: &str, row: Vec<String>) -> Result<(), ProviderError>;

    /// Reads the first `columns` columns of `tab`, header included.
    /// Trailing empty cells and rows may be omitted by the provider.
    async fn read_tab(&self, tab: &str, columns: usize) -> Result<Vec<Vec<String>>, ProviderError>;

    async fn update_cell(&self, tab: &str, cell: CellRef, value: &str) -> Result<(), ProviderError>;
}

#[derive(Debug, Clone)]
pub struct MailAttachment {
    pub filename: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment: Option<MailAttachment>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), ProviderError>;
}

/// Turns a laid-out admission document into PDF bytes. Blocking.
pub trait PdfRenderer: Send + Sync {
    fn render(&self, document: &AdmissionDocument) -> Result<Vec<u8>, ProviderError>;
}

/// Long-lived client handles shared by every request.
#[derive(Clone)]
pub struct ClientBundle {
    pub files: Arc<dyn FileStore>,
    pub sheets: Arc<dyn SheetStore>,
    pub mailer: Arc<dyn Mailer>,
    pub renderer: Arc<dyn PdfRenderer>,
}
