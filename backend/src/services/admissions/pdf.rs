//! PDF copy of an admission.
//!
//! Rendering is split in two. `layout` is a pure function from the normalized
//! submission and attachment links to an `AdmissionDocument`; identical input
//! always yields an identical document. `GenPdfRenderer` turns that document
//! into bytes with genpdf, inserting every value as literal text.

use super::model::{AttachmentField, NormalizedSubmission, UploadResult};
use crate::error::ProviderError;
use crate::providers::PdfRenderer;
use genpdf::elements::{Break, Paragraph};
use genpdf::style::{Style, StyledString};
use genpdf::Document;
use std::path::PathBuf;

const TITLE: &str = "Admission Form";
const BODY_FONT_SIZE: u8 = 9;
const HEADING_FONT_SIZE: u8 = 12;
const TITLE_FONT_SIZE: u8 = 16;
const MARGIN_MM: i32 = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSection {
    pub heading: &'static str,
    /// `(label, value)` pairs in display order.
    pub rows: Vec<(&'static str, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionDocument {
    pub title: String,
    pub subtitle: String,
    pub sections: Vec<DocumentSection>,
}

type SectionSpec = (&'static str, &'static [(&'static str, &'static str)]);

const FIELD_SECTIONS: [SectionSpec; 8] = [
    (
        "Student",
        &[
            ("full_name", "Full name"),
            ("gender", "Gender"),
            ("studentType", "Student type"),
            ("date_of_birth", "Date of birth"),
            ("country_of_birth", "Country of birth"),
            ("nationality", "Nationality"),
            ("mother_tongue", "Mother tongue"),
            ("meal_preference", "Meal preference"),
            ("publish_photos", "Photos may be published"),
            ("home_address", "Home address"),
            ("previous_school", "Previous school"),
            ("last_completed_year", "Last completed year"),
        ],
    ),
    (
        "Father",
        &[
            ("father_name", "Name"),
            ("father_mobile", "Mobile"),
            ("father_email", "Email"),
            ("father_address", "Address"),
            ("father_occupation", "Occupation"),
            ("father_employer", "Employer"),
        ],
    ),
    (
        "Mother",
        &[
            ("mother_name", "Name"),
            ("mother_mobile", "Mobile"),
            ("mother_email", "Email"),
            ("mother_address", "Address"),
            ("mother_occupation", "Occupation"),
            ("mother_employer", "Employer"),
        ],
    ),
    (
        "Guardian",
        &[
            ("guardian_name", "Name"),
            ("guardian_relation", "Relation"),
            ("guardian_occupation", "Occupation"),
            ("guardian_mobile", "Mobile"),
            ("guardian_email", "Email"),
        ],
    ),
    (
        "Emergency contacts",
        &[
            ("emergency1_name", "Contact 1 name"),
            ("emergency1_tel", "Contact 1 telephone"),
            ("emergency1_relation", "Contact 1 relation"),
            ("emergency2_name", "Contact 2 name"),
            ("emergency2_tel", "Contact 2 telephone"),
            ("emergency2_relation", "Contact 2 relation"),
            ("alt_contact1_name", "Alternative contact 1 name"),
            ("alt_contact1_tel", "Alternative contact 1 telephone"),
            ("alt_contact1_relation", "Alternative contact 1 relation"),
            ("alt_contact2_name", "Alternative contact 2 name"),
            ("alt_contact2_tel", "Alternative contact 2 telephone"),
            ("alt_contact2_relation", "Alternative contact 2 relation"),
        ],
    ),
    (
        "Siblings",
        &[
            ("siblings_at_aps", "Siblings at the school"),
            ("siblings_details", "Details"),
        ],
    ),
    (
        "Medical",
        &[
            ("allergies", "Allergies"),
            ("allergy_details", "Allergy details"),
            ("medication", "Medication"),
            ("medication_details", "Medication details"),
            ("ok_to_give_paracetamol", "Paracetamol may be given"),
            ("immunized_tetanus", "Tetanus"),
            ("immunized_polio", "Polio"),
            ("immunized_measles", "Measles"),
            ("immunized_tb", "TB"),
            ("immunized_others", "Other immunizations"),
            ("dietary_requirements", "Dietary requirements"),
            ("dietary_details", "Dietary details"),
            ("other_conditions_details", "Other conditions"),
        ],
    ),
    ("Declaration", &[("tcAcceptance", "Terms and conditions accepted")]),
];

pub fn layout(record: &NormalizedSubmission, uploads: &UploadResult) -> AdmissionDocument {
    let mut sections: Vec<DocumentSection> = FIELD_SECTIONS
        .iter()
        .map(|&(heading, fields)| DocumentSection {
            heading,
            rows: fields
                .iter()
                .map(|(name, label)| (*label, record.get(name).to_string()))
                .collect(),
        })
        .collect();

    // Documents go before the declaration.
    let documents = DocumentSection {
        heading: "Documents",
        rows: AttachmentField::ALL
            .iter()
            .map(|field| (field.label(), uploads.url(*field).to_string()))
            .collect(),
    };
    let declaration_at = sections.len() - 1;
    sections.insert(declaration_at, documents);

    AdmissionDocument {
        title: TITLE.to_string(),
        subtitle: format!("{} - {}", record.full_name(), record.get("classApplied")),
        sections,
    }
}

/// genpdf-backed renderer; fonts are loaded from disk on every render.
pub struct GenPdfRenderer {
    fonts_dir: PathBuf,
    font_family: String,
}

impl GenPdfRenderer {
    pub fn new(fonts_dir: impl Into<PathBuf>, font_family: impl Into<String>) -> Self {
        Self {
            fonts_dir: fonts_dir.into(),
            font_family: font_family.into(),
        }
    }

    /// Configured family first, LiberationSans from the same directory as fallback.
    fn load_font(&self) -> Result<genpdf::fonts::FontFamily<genpdf::fonts::FontData>, ProviderError> {
        if let Ok(family) = genpdf::fonts::from_files(&self.fonts_dir, &self.font_family, None) {
            return Ok(family);
        }
        genpdf::fonts::from_files(&self.fonts_dir, "LiberationSans", None).map_err(|e| {
            ProviderError::Render(format!(
                "no usable font '{}' in {}: {}",
                self.font_family,
                self.fonts_dir.display(),
                e
            ))
        })
    }

    fn configure_document(&self, title: &str) -> Result<Document, ProviderError> {
        let mut doc = Document::new(self.load_font()?);
        doc.set_title(title);
        doc.set_font_size(BODY_FONT_SIZE);
        doc.set_line_spacing(1.15);

        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(MARGIN_MM);
        doc.set_page_decorator(decorator);
        Ok(doc)
    }
}

fn label_value_paragraph(label: &str, value: &str) -> Paragraph {
    let mut p = Paragraph::new("");
    p.push(StyledString::new(format!("{label}: "), Style::new().bold()));
    p.push(StyledString::new(value.to_string(), Style::new()));
    p
}

impl PdfRenderer for GenPdfRenderer {
    fn render(&self, document: &AdmissionDocument) -> Result<Vec<u8>, ProviderError> {
        let mut doc = self.configure_document(&document.title)?;

        doc.push(Paragraph::new(StyledString::new(
            document.title.clone(),
            Style::new().bold().with_font_size(TITLE_FONT_SIZE),
        )));
        doc.push(Paragraph::new(document.subtitle.clone()));

        for section in &document.sections {
            doc.push(Break::new(1));
            doc.push(Paragraph::new(StyledString::new(
                section.heading,
                Style::new().bold().with_font_size(HEADING_FONT_SIZE),
            )));
            for (label, value) in &section.rows {
                doc.push(label_value_paragraph(label, value));
            }
        }

        let mut bytes = Vec::new();
        doc.render(&mut bytes)
            .map_err(|e| ProviderError::Render(e.to_string()))?;
        Ok(bytes)
    }
}
