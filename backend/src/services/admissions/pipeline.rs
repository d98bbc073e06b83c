//! Ordered execution of one admission submission.
//!
//! Stages run strictly in sequence; only the attachment uploads inside a stage
//! run concurrently. A failing stage aborts the rest and nothing already
//! written is undone. Every stage reached is reported to the journal so a
//! partial submission can be found and completed by hand.

use super::class_registry::{ClassRegistry, ClassRoute};
use super::model::{NormalizedSubmission, Submission, UploadResult};
use super::roster::RosterPlacement;
use super::{field_mapper, pdf, uploader};
use crate::config::{PdfMode, Settings};
use crate::error::{AdmissionError, ProviderError};
use crate::journal::state::{AttemptTracker, JournalState};
use crate::providers::{ClientBundle, NewFile};
use common::jobs::SubmissionStage;
use log::{error, info, warn};

/// Tab collecting `[name, class, url]` for every stored PDF.
pub const PDF_LINKS_TAB: &str = "PDF Links";

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub uploads_folder_id: String,
    pub pdf_folder_id: Option<String>,
    pub pdf_mode: PdfMode,
}

impl PipelineSettings {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            uploads_folder_id: settings.google.uploads_folder_id.clone(),
            pdf_folder_id: settings.google.pdf_folder_id.clone(),
            pdf_mode: settings.pdf.mode,
        }
    }
}

pub struct AdmissionPipeline {
    clients: ClientBundle,
    registry: ClassRegistry,
    roster: RosterPlacement,
    settings: PipelineSettings,
    journal: JournalState,
}

async fn advance(tracker: &mut AttemptTracker, stage: SubmissionStage) {
    tracker.reached(stage).await;
    info!("[{}] {}", tracker.attempt_id(), stage.as_str());
}

fn pdf_file_name(record: &NormalizedSubmission, route: &ClassRoute) -> String {
    format!("{} - {}.pdf", record.full_name(), route.class_name)
}

impl AdmissionPipeline {
    pub fn new(
        clients: ClientBundle,
        registry: ClassRegistry,
        settings: PipelineSettings,
        journal: JournalState,
    ) -> Self {
        Self {
            clients,
            registry,
            roster: RosterPlacement::new(),
            settings,
            journal,
        }
    }

    pub fn journal(&self) -> &JournalState {
        &self.journal
    }

    /// Runs every stage for one submission and returns the PDF link, if one was stored.
    pub async fn submit(
        &self,
        attempt_id: &str,
        submission: &Submission,
    ) -> Result<Option<String>, AdmissionError> {
        let mut tracker = self
            .journal
            .begin(attempt_id, submission.full_name(), submission.class_applied())
            .await;
        info!(
            "[{}] Received admission for {} ({})",
            attempt_id,
            submission.full_name(),
            submission.class_applied()
        );

        let result = self.run(&mut tracker, submission).await;
        match &result {
            Ok(_) => advance(&mut tracker, SubmissionStage::Completed).await,
            Err(e) => {
                error!(
                    "[{}] Admission stopped after {}: {:?}",
                    attempt_id,
                    tracker.stage().as_str(),
                    e
                );
                tracker.failed(&e.to_string()).await;
            }
        }
        result
    }

    async fn run(
        &self,
        tracker: &mut AttemptTracker,
        submission: &Submission,
    ) -> Result<Option<String>, AdmissionError> {
        // Nothing external is touched before the class is known.
        let route = self.registry.resolve(submission.class_applied())?;
        advance(tracker, SubmissionStage::ClassResolved).await;

        let uploads = uploader::upload_attachments(
            self.clients.files.as_ref(),
            &self.settings.uploads_folder_id,
            submission,
        )
        .await?;
        advance(tracker, SubmissionStage::AttachmentsUploaded).await;

        let record = field_mapper::normalize(submission);

        let rendered = match self.pdf_folder() {
            Some(_) => self.render_pdf(tracker.attempt_id(), &record, &uploads).await?,
            None => None,
        };
        if rendered.is_some() {
            advance(tracker, SubmissionStage::PdfRendered).await;
        }

        let row = route.schema.project(&record, &uploads);
        self.clients
            .sheets
            .append_row(route.sheet_tab, row)
            .await
            .map_err(|source| AdmissionError::Sheet {
                tab: route.sheet_tab.to_string(),
                source,
            })?;
        advance(tracker, SubmissionStage::RecordAppended).await;

        let pdf_url = match rendered {
            Some(bytes) => match self.store_pdf(tracker, route, &record, bytes).await {
                Ok(url) => {
                    self.record_pdf_link(tracker, route, &record, &url).await?;
                    Some(url)
                }
                Err(e) => self.skip_optional_pdf(tracker.attempt_id(), e)?,
            },
            None => None,
        };

        self.roster
            .add_to_master_list(self.clients.sheets.as_ref(), route, record.full_name())
            .await?;
        self.roster
            .append_class_list(self.clients.sheets.as_ref(), route, &record)
            .await?;
        advance(tracker, SubmissionStage::RosterUpdated).await;

        Ok(pdf_url)
    }

    fn pdf_folder(&self) -> Option<&str> {
        match self.settings.pdf_mode {
            PdfMode::Disabled => None,
            _ => self.settings.pdf_folder_id.as_deref(),
        }
    }

    /// Optional PDFs are dropped with a warning; required ones fail the submission.
    fn skip_optional_pdf(
        &self,
        attempt_id: &str,
        err: AdmissionError,
    ) -> Result<Option<String>, AdmissionError> {
        match self.settings.pdf_mode {
            PdfMode::Required => Err(err),
            _ => {
                warn!("[{}] Continuing without PDF: {}", attempt_id, err);
                Ok(None)
            }
        }
    }

    async fn render_pdf(
        &self,
        attempt_id: &str,
        record: &NormalizedSubmission,
        uploads: &UploadResult,
    ) -> Result<Option<Vec<u8>>, AdmissionError> {
        let document = pdf::layout(record, uploads);
        let renderer = self.clients.renderer.clone();

        // genpdf is synchronous and CPU bound.
        let rendered = tokio::task::spawn_blocking(move || renderer.render(&document))
            .await
            .unwrap_or_else(|e| Err(ProviderError::Render(format!("render task failed: {e}"))));

        match rendered {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) => self
                .skip_optional_pdf(attempt_id, AdmissionError::Render(e))
                .map(|_| None),
        }
    }

    /// Uploads the PDF and copies it to the class folder.
    async fn store_pdf(
        &self,
        tracker: &mut AttemptTracker,
        route: &ClassRoute,
        record: &NormalizedSubmission,
        bytes: Vec<u8>,
    ) -> Result<String, AdmissionError> {
        let Some(folder_id) = self.pdf_folder() else {
            return Err(AdmissionError::Storage(ProviderError::Decode {
                service: "drive",
                message: "no PDF folder configured".to_string(),
            }));
        };
        let files = self.clients.files.as_ref();
        let name = pdf_file_name(record, route);

        let file_id = files
            .create_file(NewFile {
                name: &name,
                mime_type: "application/pdf",
                parent_id: folder_id,
                content: bytes,
            })
            .await
            .map_err(AdmissionError::Storage)?;
        files
            .grant_public_read(&file_id)
            .await
            .map_err(AdmissionError::Storage)?;
        if let Some(class_folder) = &route.folder_id {
            files
                .copy_file(&file_id, &name, class_folder)
                .await
                .map_err(AdmissionError::Storage)?;
        }
        let url = files.public_url(&file_id);
        advance(tracker, SubmissionStage::PdfStored).await;
        Ok(url)
    }

    /// Appends the stored PDF's link to the links tab.
    ///
    /// The file already exists at this point, so outside `required` mode a
    /// failure only costs the link row and the URL is still returned.
    async fn record_pdf_link(
        &self,
        tracker: &mut AttemptTracker,
        route: &ClassRoute,
        record: &NormalizedSubmission,
        url: &str,
    ) -> Result<(), AdmissionError> {
        let link_row = vec![
            record.full_name().to_string(),
            route.class_name.to_string(),
            url.to_string(),
        ];
        let appended = self
            .clients
            .sheets
            .append_row(PDF_LINKS_TAB, link_row)
            .await
            .map_err(|source| AdmissionError::Sheet {
                tab: PDF_LINKS_TAB.to_string(),
                source,
            });
        match appended {
            Ok(()) => {
                advance(tracker, SubmissionStage::PdfLinkRecorded).await;
                Ok(())
            }
            Err(e) if self.settings.pdf_mode == PdfMode::Required => Err(e),
            Err(e) => {
                warn!(
                    "[{}] PDF stored at {} but its link was not recorded: {}",
                    tracker.attempt_id(),
                    url,
                    e
                );
                Ok(())
            }
        }
    }
}
