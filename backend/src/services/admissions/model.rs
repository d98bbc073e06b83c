//! Types shared by the stages of the admission pipeline.

use std::collections::{BTreeMap, HashMap};

/// The five file slots of the admission form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttachmentField {
    PassportSizePhoto,
    PassportPhoto,
    ReportCard,
    BirthCert,
    PassportCopy,
}

impl AttachmentField {
    pub const ALL: [AttachmentField; 5] = [
        AttachmentField::PassportSizePhoto,
        AttachmentField::PassportPhoto,
        AttachmentField::ReportCard,
        AttachmentField::BirthCert,
        AttachmentField::PassportCopy,
    ];

    /// Multipart part name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentField::PassportSizePhoto => "passport_size_photo",
            AttachmentField::PassportPhoto => "passport_photo",
            AttachmentField::ReportCard => "report_card",
            AttachmentField::BirthCert => "birth_cert",
            AttachmentField::PassportCopy => "passport_copy",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AttachmentField::PassportSizePhoto => "Passport-size photo",
            AttachmentField::PassportPhoto => "Photo",
            AttachmentField::ReportCard => "Report card",
            AttachmentField::BirthCert => "Birth certificate",
            AttachmentField::PassportCopy => "Passport copy",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// One form post as received: text fields plus the attachments that were sent.
#[derive(Debug, Clone, Default)]
pub struct Submission {
    pub fields: HashMap<String, String>,
    pub attachments: BTreeMap<AttachmentField, Attachment>,
}

impl Submission {
    pub fn field(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn class_applied(&self) -> &str {
        self.field("classApplied")
    }

    pub fn full_name(&self) -> &str {
        self.field("full_name")
    }
}

/// Public URL per attachment slot; slots without a file map to "".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadResult {
    urls: BTreeMap<AttachmentField, String>,
}

impl UploadResult {
    pub fn insert(&mut self, field: AttachmentField, url: String) {
        self.urls.insert(field, url);
    }

    pub fn url(&self, field: AttachmentField) -> &str {
        self.urls.get(&field).map(String::as_str).unwrap_or("")
    }
}

/// Field values after the auto-fill rules; absent fields read as "".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedSubmission {
    fields: BTreeMap<String, String>,
}

impl NormalizedSubmission {
    pub fn new(fields: BTreeMap<String, String>) -> Self {
        Self { fields }
    }

    pub fn get(&self, name: &str) -> &str {
        self.fields.get(name).map(String::as_str).unwrap_or("")
    }

    pub fn full_name(&self) -> &str {
        self.get("full_name")
    }
}
