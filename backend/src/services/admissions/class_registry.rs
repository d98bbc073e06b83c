//! Static routing table from the form's `classApplied` value to the places a
//! submission for that class is written.

use super::schema::{ColumnSchema, ADMISSION_SCHEMA};
use crate::error::AdmissionError;
use std::collections::HashMap;

pub struct ClassEntry {
    pub name: &'static str,
    pub sheet_tab: &'static str,
    pub class_list_tab: &'static str,
    pub master_column_index: usize,
}

const fn entry(
    name: &'static str,
    class_list_tab: &'static str,
    master_column_index: usize,
) -> ClassEntry {
    ClassEntry {
        name,
        sheet_tab: name,
        class_list_tab,
        master_column_index,
    }
}

pub const CLASSES: [ClassEntry; 16] = [
    entry("Baby class", "Baby class List", 0),
    entry("Middle class", "Middle class List", 1),
    entry("Top class", "Top class List", 2),
    entry("Grade 1", "Grade 1 List", 3),
    entry("Grade 2", "Grade 2 List", 4),
    entry("Grade 3", "Grade 3 List", 5),
    entry("Grade 4", "Grade 4 List", 6),
    entry("Grade 5", "Grade 5 List", 7),
    entry("Grade 6", "Grade 6 List", 8),
    entry("Year 7", "Year 7 List", 9),
    entry("Year 8", "Year 8 List", 10),
    entry("Year 9", "Year 9 List", 11),
    entry("Year 10", "Year 10 List", 12),
    entry("Year 11", "Year 11 List", 13),
    entry("Year 12", "Year 12 List", 14),
    entry("Year 13", "Year 13 List", 15),
];

pub fn lookup_entry(class_name: &str) -> Option<&'static ClassEntry> {
    CLASSES.iter().find(|entry| entry.name == class_name)
}

#[derive(Debug, Clone)]
pub struct ClassRoute {
    pub class_name: &'static str,
    pub sheet_tab: &'static str,
    /// Folder receiving a copy of the generated PDF; `None` skips the copy.
    pub folder_id: Option<String>,
    pub class_list_tab: &'static str,
    pub master_column_index: usize,
    pub schema: &'static ColumnSchema,
}

pub struct ClassRegistry {
    routes: HashMap<&'static str, ClassRoute>,
}

impl ClassRegistry {
    /// Combines the static table with the deployment's per-class folder ids.
    pub fn new(class_folders: &HashMap<String, String>) -> Self {
        let routes = CLASSES
            .iter()
            .map(|entry| {
                let route = ClassRoute {
                    class_name: entry.name,
                    sheet_tab: entry.sheet_tab,
                    folder_id: class_folders
                        .get(entry.name)
                        .filter(|id| !id.trim().is_empty())
                        .cloned(),
                    class_list_tab: entry.class_list_tab,
                    master_column_index: entry.master_column_index,
                    schema: &ADMISSION_SCHEMA,
                };
                (entry.name, route)
            })
            .collect();
        Self { routes }
    }

    /// Exact-match lookup; the error echoes the submitted value untouched.
    pub fn resolve(&self, class_applied: &str) -> Result<&ClassRoute, AdmissionError> {
        self.routes
            .get(class_applied)
            .ok_or_else(|| AdmissionError::ClassNotConfigured(class_applied.to_string()))
    }
}
