mod config;
mod error;
mod google;
mod journal;
mod providers;
mod services;
#[cfg(test)]
mod testing;

use crate::config::Settings;
use crate::google::auth::{GoogleAuth, DRIVE_SCOPE, GMAIL_SEND_SCOPE, SHEETS_SCOPE};
use crate::google::{drive::DriveClient, gmail::GmailClient, sheets::SheetsClient};
use crate::journal::state::{start_journal_writer, JournalState};
use crate::journal::store::JournalStore;
use crate::providers::ClientBundle;
use crate::services::admissions::class_registry::ClassRegistry;
use crate::services::admissions::pdf::GenPdfRenderer;
use crate::services::admissions::pipeline::{AdmissionPipeline, PipelineSettings};
use crate::services::admissions::schema::ADMISSION_SCHEMA;
use crate::services::admissions::submit::FormLimits;
use crate::services::mail::send::PaymentInstructions;
use crate::services::site::{fallback, SiteFiles};
use actix_web::{web, App, HttpServer};
use env_logger::Env;
use log::{error, info, warn};
use std::sync::Arc;
use std::time::Duration;

const JOURNAL_CHANNEL_CAPACITY: usize = 100;

fn startup_error(e: impl std::fmt::Display) -> std::io::Error {
    std::io::Error::other(e.to_string())
}

/// Builds the Google-backed clients once; they are shared read-only afterwards.
fn build_clients(settings: &Settings) -> std::io::Result<ClientBundle> {
    let google = &settings.google;
    let http = google::http_client(
        Duration::from_secs(google.connect_timeout_secs),
        Duration::from_secs(google.request_timeout_secs),
    )
    .map_err(startup_error)?;
    let key_path = settings.credentials_path().map_err(startup_error)?;

    let workspace_auth = Arc::new(
        GoogleAuth::from_key_file(&key_path, &[DRIVE_SCOPE, SHEETS_SCOPE], None, http.clone())
            .map_err(startup_error)?,
    );
    let mail_auth = Arc::new(
        GoogleAuth::from_key_file(
            &key_path,
            &[GMAIL_SEND_SCOPE],
            settings.mail.sender.clone(),
            http.clone(),
        )
        .map_err(startup_error)?,
    );
    let sender = match &settings.mail.sender {
        Some(sender) => sender.clone(),
        None => {
            warn!("mail.sender is not set; mail goes out as the service account itself");
            mail_auth.client_email().to_string()
        }
    };

    Ok(ClientBundle {
        files: Arc::new(DriveClient::new(workspace_auth.clone(), http.clone())),
        sheets: Arc::new(SheetsClient::new(
            workspace_auth,
            http.clone(),
            google.spreadsheet_id.clone(),
        )),
        mailer: Arc::new(GmailClient::new(mail_auth, http, sender)),
        renderer: Arc::new(GenPdfRenderer::new(
            settings.pdf.fonts_dir.clone(),
            settings.pdf.font_family.clone(),
        )),
    })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let settings = config::load_settings().map_err(|e| {
        error!("{}", e);
        startup_error(e)
    })?;
    ADMISSION_SCHEMA.check().map_err(startup_error)?;
    info!(
        "Admission rows use column schema v{} ({} columns)",
        ADMISSION_SCHEMA.version,
        ADMISSION_SCHEMA.len()
    );
    let clients = build_clients(&settings)?;

    // Submission journal: updates flow through the channel to a single writer.
    let store = match JournalStore::open(&settings.journal_path) {
        Ok(store) => {
            match store.unfinished() {
                Ok(unfinished) if !unfinished.is_empty() => warn!(
                    "{} earlier submissions stopped before completing; see /admissions/status",
                    unfinished.len()
                ),
                Ok(_) => {}
                Err(e) => error!("Failed to read submission journal: {}", e),
            }
            Some(store)
        }
        Err(e) => {
            error!(
                "Journal {} unavailable, attempts are kept in memory only: {}",
                settings.journal_path.display(),
                e
            );
            None
        }
    };
    let (journal, rx) = JournalState::with_store(JOURNAL_CHANNEL_CAPACITY, store);
    tokio::spawn(start_journal_writer(
        journal.attempts.clone(),
        rx,
        journal.store(),
    ));

    let pipeline = web::Data::new(AdmissionPipeline::new(
        clients.clone(),
        ClassRegistry::new(&settings.google.class_folders),
        PipelineSettings::from_settings(&settings),
        journal,
    ));
    let instructions = web::Data::new(PaymentInstructions::new(
        clients.mailer.clone(),
        &settings.mail,
    ));
    let site = web::Data::new(SiteFiles {
        public_dir: settings.site.public_dir.clone(),
        terms_pdf_path: settings.site.terms_pdf_path.clone(),
    });
    let limits = web::Data::new(FormLimits::new(settings.max_attachment_bytes));

    let host = settings.server.host.clone();
    let port = settings.server.port;
    info!(
        "Server listening on http://{}:{} (PDF mode {:?})",
        host, port, settings.pdf.mode
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(64 * 1024))
            .app_data(pipeline.clone())
            .app_data(instructions.clone())
            .app_data(site.clone())
            .app_data(limits.clone())
            .service(services::admissions::configure_routes())
            .service(services::mail::configure_routes())
            .service(services::site::ping_route())
            .service(services::site::terms_route())
            .default_service(web::route().to(fallback::serve_public))
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
