//! Deployment settings loaded once at startup.
//!
//! The file is JSON, located through `ADMISSIONS_CONFIG` (default
//! `admissions.json`). Only the Google ids are mandatory; everything else has a
//! default that matches a single-machine deployment.

use crate::error::ConfigError;
use crate::services::admissions::class_registry;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "ADMISSIONS_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "admissions.json";
const CREDENTIALS_ENV: &str = "GOOGLE_APPLICATION_CREDENTIALS";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    pub google: GoogleConfig,
    #[serde(default)]
    pub pdf: PdfConfig,
    #[serde(default)]
    pub mail: MailConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default = "default_journal_path")]
    pub journal_path: PathBuf,
    #[serde(default = "default_max_attachment_bytes")]
    pub max_attachment_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    /// Service account key file. Falls back to `GOOGLE_APPLICATION_CREDENTIALS`.
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,
    pub spreadsheet_id: String,
    pub uploads_folder_id: String,
    #[serde(default)]
    pub pdf_folder_id: Option<String>,
    /// Class name -> destination folder for the generated PDF copy.
    #[serde(default)]
    pub class_folders: HashMap<String, String>,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PdfMode {
    Disabled,
    #[default]
    Optional,
    Required,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PdfConfig {
    #[serde(default)]
    pub mode: PdfMode,
    #[serde(default = "default_fonts_dir")]
    pub fonts_dir: PathBuf,
    #[serde(default = "default_font_family")]
    pub font_family: String,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            mode: PdfMode::default(),
            fonts_dir: default_fonts_dir(),
            font_family: default_font_family(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Mailbox the message is sent as (domain-wide delegation subject).
    #[serde(default)]
    pub sender: Option<String>,
    #[serde(default = "default_mail_subject")]
    pub subject: String,
    #[serde(default = "default_mail_body")]
    pub body: String,
    #[serde(default = "default_mail_attachment")]
    pub attachment_path: PathBuf,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            sender: None,
            subject: default_mail_subject(),
            body: default_mail_body(),
            attachment_path: default_mail_attachment(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
    #[serde(default = "default_terms_pdf")]
    pub terms_pdf_path: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            public_dir: default_public_dir(),
            terms_pdf_path: default_terms_pdf(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_journal_path() -> PathBuf {
    PathBuf::from("admissions.sqlite")
}

fn default_max_attachment_bytes() -> usize {
    10 * 1024 * 1024
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_fonts_dir() -> PathBuf {
    PathBuf::from("./fonts")
}

fn default_font_family() -> String {
    "LiberationSans".to_string()
}

fn default_mail_subject() -> String {
    "Payment Instructions".to_string()
}

fn default_mail_body() -> String {
    "Dear Parent/Guardian,\n\nThank you for your application. Please find the payment instructions attached.\n\nKind regards,\nAdmissions Office".to_string()
}

fn default_mail_attachment() -> PathBuf {
    PathBuf::from("public/payment-instructions.pdf")
}

fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_terms_pdf() -> PathBuf {
    PathBuf::from("public/terms.pdf")
}

impl Settings {
    /// Key file used for the service account, config first then environment.
    pub fn credentials_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.google.credentials_path {
            return Ok(path.clone());
        }
        std::env::var(CREDENTIALS_ENV)
            .map(PathBuf::from)
            .map_err(|_| ConfigError::Validation {
                message: format!("google.credentials_path is not set and {CREDENTIALS_ENV} is empty"),
            })
    }
}

pub fn load_settings() -> Result<Settings, ConfigError> {
    let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    load_settings_from_path(path)
}

pub fn load_settings_from_path<P: AsRef<Path>>(path: P) -> Result<Settings, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_settings_from_str(&content)
}

pub fn load_settings_from_str(content: &str) -> Result<Settings, ConfigError> {
    let settings: Settings = serde_json::from_str(content)?;
    validate_settings(&settings)?;
    Ok(settings)
}

fn validate_settings(settings: &Settings) -> Result<(), ConfigError> {
    let google = &settings.google;
    for (name, value) in [
        ("google.spreadsheet_id", &google.spreadsheet_id),
        ("google.uploads_folder_id", &google.uploads_folder_id),
    ] {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: format!("{name} must not be empty"),
            });
        }
    }

    if settings.pdf.mode != PdfMode::Disabled
        && google
            .pdf_folder_id
            .as_deref()
            .map_or(true, |id| id.trim().is_empty())
    {
        return Err(ConfigError::Validation {
            message: "google.pdf_folder_id is required unless pdf.mode is \"disabled\"".to_string(),
        });
    }

    for class_name in google.class_folders.keys() {
        if class_registry::lookup_entry(class_name).is_none() {
            return Err(ConfigError::Validation {
                message: format!("class_folders names unknown class \"{class_name}\""),
            });
        }
    }

    if settings.max_attachment_bytes == 0 {
        return Err(ConfigError::Validation {
            message: "max_attachment_bytes must be greater than zero".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "google": {
            "spreadsheet_id": "sheet-1",
            "uploads_folder_id": "uploads",
            "pdf_folder_id": "pdfs",
            "class_folders": { "Grade 1": "folder-g1" }
        }
    }"#;

    #[test]
    fn minimal_config_gets_defaults() {
        let settings = load_settings_from_str(MINIMAL).unwrap();
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.pdf.mode, PdfMode::Optional);
        assert_eq!(settings.max_attachment_bytes, 10 * 1024 * 1024);
        assert_eq!(
            settings.google.class_folders.get("Grade 1").map(String::as_str),
            Some("folder-g1")
        );
        assert_eq!(settings.site.public_dir, PathBuf::from("public"));
    }

    #[test]
    fn rejects_unknown_class_folder() {
        let content = MINIMAL.replace("Grade 1", "Grade 42");
        let err = load_settings_from_str(&content).unwrap_err();
        assert!(err.to_string().contains("Grade 42"));
    }

    #[test]
    fn pdf_folder_required_unless_disabled() {
        let content = r#"{
            "google": { "spreadsheet_id": "s", "uploads_folder_id": "u" }
        }"#;
        assert!(load_settings_from_str(content).is_err());

        let disabled = r#"{
            "google": { "spreadsheet_id": "s", "uploads_folder_id": "u" },
            "pdf": { "mode": "disabled" }
        }"#;
        let settings = load_settings_from_str(disabled).unwrap();
        assert_eq!(settings.pdf.mode, PdfMode::Disabled);
    }

    #[test]
    fn rejects_empty_spreadsheet_id() {
        let content = MINIMAL.replace("sheet-1", " ");
        assert!(matches!(
            load_settings_from_str(&content),
            Err(ConfigError::Validation { .. })
        ));
    }
}
