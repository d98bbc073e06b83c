//! Column layout of the per-class admission tabs.
//!
//! The position of every column is the contract with data already stored in
//! the spreadsheet. New columns are only ever appended, and the version is
//! bumped with them.

use super::model::{AttachmentField, NormalizedSubmission, UploadResult};

#[derive(Debug)]
pub enum Column {
    /// Normalized form field with the same name.
    Field(&'static str),
    /// Public URL of an uploaded attachment.
    Attachment(AttachmentField),
    /// Column kept for alignment with rows written by earlier versions.
    Retired(&'static str),
    /// Fixed value written for every new row.
    Constant {
        header: &'static str,
        value: &'static str,
    },
}

impl Column {
    pub fn header(&self) -> &'static str {
        match self {
            Column::Field(name) => name,
            Column::Attachment(field) => field.as_str(),
            Column::Retired(header) => header,
            Column::Constant { header, .. } => header,
        }
    }
}

#[derive(Debug)]
pub struct ColumnSchema {
    pub version: u32,
    pub columns: &'static [Column],
}

impl ColumnSchema {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.columns.iter().map(Column::header).collect()
    }

    /// Rejects a layout in which two columns share a header, retired and
    /// constant columns included.
    pub fn check(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err(format!("column schema v{} has no columns", self.version));
        }
        let headers = self.headers();
        for (i, header) in headers.iter().enumerate() {
            if headers[..i].contains(header) {
                return Err(format!(
                    "column schema v{} repeats header '{}' at column {}",
                    self.version,
                    header,
                    i + 1
                ));
            }
        }
        Ok(())
    }

    /// One value per column, in column order.
    pub fn project(&self, record: &NormalizedSubmission, uploads: &UploadResult) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| match column {
                Column::Field(name) => record.get(name).to_string(),
                Column::Attachment(field) => uploads.url(*field).to_string(),
                Column::Retired(_) => String::new(),
                Column::Constant { value, .. } => value.to_string(),
            })
            .collect()
    }
}

use Column::{Attachment as Url, Field as F};

const ADMISSION_COLUMNS: [Column; 65] = [
    F("full_name"),
    F("gender"),
    F("studentType"),
    F("date_of_birth"),
    F("country_of_birth"),
    F("nationality"),
    F("mother_tongue"),
    F("meal_preference"),
    F("publish_photos"),
    F("home_address"),
    F("previous_school"),
    F("last_completed_year"),
    F("father_name"),
    F("father_mobile"),
    F("father_email"),
    F("father_address"),
    F("father_occupation"),
    F("father_employer"),
    F("mother_name"),
    F("mother_mobile"),
    F("mother_email"),
    F("mother_address"),
    F("mother_occupation"),
    F("mother_employer"),
    F("guardian_name"),
    F("guardian_relation"),
    F("guardian_occupation"),
    F("guardian_mobile"),
    F("guardian_email"),
    F("emergency1_name"),
    F("emergency1_tel"),
    F("emergency1_relation"),
    F("emergency2_name"),
    F("emergency2_tel"),
    F("emergency2_relation"),
    F("siblings_at_aps"),
    F("siblings_details"),
    Url(AttachmentField::PassportPhoto),
    Url(AttachmentField::ReportCard),
    Column::Retired("immunization_card"),
    Url(AttachmentField::BirthCert),
    F("allergies"),
    F("allergy_details"),
    F("medication"),
    F("medication_details"),
    F("ok_to_give_paracetamol"),
    F("immunized_tetanus"),
    F("immunized_polio"),
    F("immunized_measles"),
    F("immunized_tb"),
    F("immunized_others"),
    F("dietary_requirements"),
    F("dietary_details"),
    F("alt_contact1_name"),
    F("alt_contact1_tel"),
    F("alt_contact1_relation"),
    F("alt_contact2_name"),
    F("alt_contact2_tel"),
    F("alt_contact2_relation"),
    F("other_conditions_details"),
    Column::Constant {
        header: "payment_status",
        value: "Pending",
    },
    Column::Constant {
        header: "processed",
        value: "Processed",
    },
    // Version 2
    Url(AttachmentField::PassportSizePhoto),
    Url(AttachmentField::PassportCopy),
    F("tcAcceptance"),
];

pub static ADMISSION_SCHEMA: ColumnSchema = ColumnSchema {
    version: 2,
    columns: &ADMISSION_COLUMNS,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashSet};

    fn record(pairs: &[(&str, &str)]) -> NormalizedSubmission {
        NormalizedSubmission::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        )
    }

    #[test]
    fn row_width_matches_schema() {
        let row = ADMISSION_SCHEMA.project(&record(&[]), &UploadResult::default());
        assert_eq!(row.len(), ADMISSION_SCHEMA.len());
        assert_eq!(row.len(), 65);
        assert!(row[..60].iter().all(String::is_empty));
        assert_eq!(row[60], "Pending");
        assert_eq!(row[61], "Processed");
    }

    #[test]
    fn first_version_positions_are_stable() {
        let headers = ADMISSION_SCHEMA.headers();
        assert_eq!(headers[0], "full_name");
        assert_eq!(headers[2], "studentType");
        assert_eq!(headers[37], "passport_photo");
        assert_eq!(headers[39], "immunization_card");
        assert_eq!(headers[42], "allergy_details");
        assert_eq!(headers[59], "other_conditions_details");
        assert_eq!(headers[62], "passport_size_photo");
    }

    #[test]
    fn headers_are_unique() {
        let headers = ADMISSION_SCHEMA.headers();
        let unique: HashSet<_> = headers.iter().collect();
        assert_eq!(unique.len(), headers.len());
        assert_eq!(ADMISSION_SCHEMA.check(), Ok(()));
    }

    #[test]
    fn check_catches_retired_header_reused_by_constant() {
        static COLUMNS: [Column; 3] = [
            Column::Field("full_name"),
            Column::Retired("status"),
            Column::Constant {
                header: "status",
                value: "Pending",
            },
        ];
        let schema = ColumnSchema {
            version: 9,
            columns: &COLUMNS,
        };
        assert_eq!(schema.len(), 3);
        assert_eq!(
            schema.check(),
            Err("column schema v9 repeats header 'status' at column 3".to_string())
        );
    }

    #[test]
    fn attachment_urls_land_in_their_columns() {
        let mut uploads = UploadResult::default();
        uploads.insert(AttachmentField::ReportCard, "https://files/rc".to_string());
        uploads.insert(AttachmentField::PassportCopy, "https://files/pc".to_string());
        let row = ADMISSION_SCHEMA.project(&record(&[("full_name", "Jane Doe")]), &uploads);
        assert_eq!(row[0], "Jane Doe");
        assert_eq!(row[37], "");
        assert_eq!(row[38], "https://files/rc");
        assert_eq!(row[63], "https://files/pc");
    }
}
