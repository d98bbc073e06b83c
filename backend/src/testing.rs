//! In-memory providers used by the unit tests.

use crate::error::ProviderError;
use crate::providers::{
    CellRef, ClientBundle, FileStore, Mailer, NewFile, OutgoingMail, PdfRenderer, SheetStore,
};
use crate::services::admissions::pdf::AdmissionDocument;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap()
}

fn failure(service: &'static str, message: &str) -> ProviderError {
    ProviderError::Http {
        service,
        status: 500,
        message: message.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct CreatedFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    pub parent_id: String,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct CopiedFile {
    pub source_id: String,
    pub name: String,
    pub parent_id: String,
}

#[derive(Default)]
pub struct FakeFiles {
    next_id: AtomicUsize,
    created: Mutex<Vec<CreatedFile>>,
    grants: Mutex<Vec<String>>,
    copies: Mutex<Vec<CopiedFile>>,
    fail_on_name: Option<String>,
    fail_copy: bool,
}

impl FakeFiles {
    /// Fails `create_file` for a file with this name.
    pub fn failing_on(name: &str) -> Self {
        Self {
            fail_on_name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn failing_copy() -> Self {
        Self {
            fail_copy: true,
            ..Default::default()
        }
    }

    pub fn created(&self) -> Vec<CreatedFile> {
        lock(&self.created).clone()
    }

    pub fn public_grants(&self) -> Vec<String> {
        lock(&self.grants).clone()
    }

    pub fn copies(&self) -> Vec<CopiedFile> {
        lock(&self.copies).clone()
    }
}

#[async_trait]
impl FileStore for FakeFiles {
    async fn create_file(&self, file: NewFile<'_>) -> Result<String, ProviderError> {
        if self.fail_on_name.as_deref() == Some(file.name) {
            return Err(failure("drive", "quota exceeded"));
        }
        let id = format!("file-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        lock(&self.created).push(CreatedFile {
            id: id.clone(),
            name: file.name.to_string(),
            mime_type: file.mime_type.to_string(),
            parent_id: file.parent_id.to_string(),
            size: file.content.len(),
        });
        Ok(id)
    }

    async fn grant_public_read(&self, file_id: &str) -> Result<(), ProviderError> {
        lock(&self.grants).push(file_id.to_string());
        Ok(())
    }

    async fn copy_file(
        &self,
        file_id: &str,
        name: &str,
        parent_id: &str,
    ) -> Result<String, ProviderError> {
        if self.fail_copy {
            return Err(failure("drive", "copy refused"));
        }
        lock(&self.copies).push(CopiedFile {
            source_id: file_id.to_string(),
            name: name.to_string(),
            parent_id: parent_id.to_string(),
        });
        Ok(format!("{file_id}-copy"))
    }

    fn public_url(&self, file_id: &str) -> String {
        format!("https://files.test/{file_id}")
    }
}

/// Tabs as row-major grids. Reads drop trailing blanks like the real API.
#[derive(Default)]
pub struct FakeSheets {
    tabs: Mutex<HashMap<String, Vec<Vec<String>>>>,
    calls: AtomicUsize,
    failing_tab: Option<String>,
}

impl FakeSheets {
    pub fn failing_on(tab: &str) -> Self {
        Self {
            failing_tab: Some(tab.to_string()),
            ..Default::default()
        }
    }

    pub fn seed(&self, tab: &str, rows: Vec<Vec<String>>) {
        lock(&self.tabs).insert(tab.to_string(), rows);
    }

    pub fn tab(&self, tab: &str) -> Vec<Vec<String>> {
        lock(&self.tabs).get(tab).cloned().unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self, tab: &str) -> Result<(), ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_tab.as_deref() == Some(tab) {
            return Err(failure("sheets", "backend unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl SheetStore for FakeSheets {
    async fn append_row(&self, tab: &str, row: Vec<String>) -> Result<(), ProviderError> {
        self.enter(tab)?;
        lock(&self.tabs).entry(tab.to_string()).or_default().push(row);
        Ok(())
    }

    async fn read_tab(&self, tab: &str, columns: usize) -> Result<Vec<Vec<String>>, ProviderError> {
        self.enter(tab)?;
        let mut rows: Vec<Vec<String>> = self
            .tab(tab)
            .into_iter()
            .map(|mut row| {
                row.truncate(columns);
                while row.last().is_some_and(|c| c.is_empty()) {
                    row.pop();
                }
                row
            })
            .collect();
        while rows.last().is_some_and(|r| r.is_empty()) {
            rows.pop();
        }
        // Give concurrent callers a chance to interleave between read and write.
        tokio::task::yield_now().await;
        Ok(rows)
    }

    async fn update_cell(&self, tab: &str, cell: CellRef, value: &str) -> Result<(), ProviderError> {
        self.enter(tab)?;
        let mut tabs = lock(&self.tabs);
        let rows = tabs.entry(tab.to_string()).or_default();
        if rows.len() <= cell.row {
            rows.resize(cell.row + 1, Vec::new());
        }
        let row = &mut rows[cell.row];
        if row.len() <= cell.column {
            row.resize(cell.column + 1, String::new());
        }
        row[cell.column] = value.to_string();
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeMailer {
    sent: Mutex<Vec<OutgoingMail>>,
    fail: bool,
}

impl FakeMailer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn sent(&self) -> Vec<OutgoingMail> {
        lock(&self.sent).clone()
    }
}

#[async_trait]
impl Mailer for FakeMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), ProviderError> {
        if self.fail {
            return Err(failure("gmail", "mailbox unavailable"));
        }
        lock(&self.sent).push(mail.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeRenderer {
    rendered: Mutex<Vec<AdmissionDocument>>,
    fail: bool,
}

impl FakeRenderer {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn rendered(&self) -> Vec<AdmissionDocument> {
        lock(&self.rendered).clone()
    }
}

impl PdfRenderer for FakeRenderer {
    fn render(&self, document: &AdmissionDocument) -> Result<Vec<u8>, ProviderError> {
        if self.fail {
            return Err(ProviderError::Render("fonts missing".to_string()));
        }
        lock(&self.rendered).push(document.clone());
        Ok(format!("%PDF-fake {}", document.subtitle).into_bytes())
    }
}

/// Fakes plus the bundle that wraps them, so tests can inspect calls afterwards.
pub struct Fakes {
    pub files: Arc<FakeFiles>,
    pub sheets: Arc<FakeSheets>,
    pub mailer: Arc<FakeMailer>,
    pub renderer: Arc<FakeRenderer>,
}

impl Default for Fakes {
    fn default() -> Self {
        Self::new(
            FakeFiles::default(),
            FakeSheets::default(),
            FakeMailer::default(),
            FakeRenderer::default(),
        )
    }
}

impl Fakes {
    pub fn new(
        files: FakeFiles,
        sheets: FakeSheets,
        mailer: FakeMailer,
        renderer: FakeRenderer,
    ) -> Self {
        Self {
            files: Arc::new(files),
            sheets: Arc::new(sheets),
            mailer: Arc::new(mailer),
            renderer: Arc::new(renderer),
        }
    }

    pub fn bundle(&self) -> ClientBundle {
        ClientBundle {
            files: self.files.clone(),
            sheets: self.sheets.clone(),
            mailer: self.mailer.clone(),
            renderer: self.renderer.clone(),
        }
    }
}
