//! Master list and per-class roster writes.
//!
//! The master list is a shared tab with one column per class; a new student
//! goes into the first empty cell below the header of their class column. This
//! is a read-then-write on the spreadsheet, so placements for the same column
//! are serialized through a per-column async mutex. The mutex only covers this
//! process: two server instances writing to the same spreadsheet can still pick
//! the same row.

use super::class_registry::ClassRoute;
use super::model::NormalizedSubmission;
use crate::error::RosterError;
use crate::providers::{CellRef, SheetStore};
use log::info;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const MASTER_LIST_TAB: &str = "MASTER LIST";

/// Header row of the master list, one column per class.
pub const MASTER_LIST_COLUMNS: [&str; 16] = [
    "BABY CLASS",
    "MIDDLE CLASS",
    "TOP CLASS",
    "GRADE 1",
    "GRADE 2",
    "GRADE 3",
    "GRADE 4",
    "GRADE 5",
    "GRADE 6",
    "YEAR 7",
    "YEAR 8",
    "YEAR 9",
    "YEAR 10",
    "YEAR 11",
    "YEAR 12",
    "YEAR 13",
];

/// Empty cells appended after the student columns of a class list row.
const CLASS_LIST_PADDING: usize = 2;

/// Collapses runs of whitespace and upper-cases: `" grade   1"` -> `"GRADE 1"`.
pub fn normalize_class_name(class_applied: &str) -> String {
    class_applied
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

pub fn resolve_master_column(class_applied: &str) -> Option<usize> {
    let normalized = normalize_class_name(class_applied);
    MASTER_LIST_COLUMNS
        .iter()
        .position(|header| *header == normalized)
}

/// First row at or below row index 1 whose cell in `column` is missing or blank.
pub fn first_empty_row(values: &[Vec<String>], column: usize) -> usize {
    let mut row = 1;
    while let Some(cells) = values.get(row) {
        match cells.get(column) {
            Some(cell) if !cell.trim().is_empty() => row += 1,
            _ => break,
        }
    }
    row
}

/// Denormalized class list row: name, gender, nationality, boarding type, padding.
pub fn class_list_row(record: &NormalizedSubmission) -> Vec<String> {
    let mut row: Vec<String> = ["full_name", "gender", "nationality", "studentType"]
        .iter()
        .map(|name| record.get(name).to_string())
        .collect();
    row.extend(std::iter::repeat(String::new()).take(CLASS_LIST_PADDING));
    row
}

#[derive(Default)]
pub struct RosterPlacement {
    column_locks: Mutex<HashMap<usize, Arc<tokio::sync::Mutex<()>>>>,
}

impl RosterPlacement {
    pub fn new() -> Self {
        Self::default()
    }

    fn column_lock(&self, column: usize) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .column_locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(column).or_default().clone()
    }

    /// Writes `student_name` into the first free master list cell of the class column.
    ///
    /// The route's column must agree with the master list header for its class;
    /// a route whose index points at another class's column is refused.
    pub async fn add_to_master_list(
        &self,
        sheets: &dyn SheetStore,
        route: &ClassRoute,
        student_name: &str,
    ) -> Result<CellRef, RosterError> {
        let column = resolve_master_column(route.class_name)
            .filter(|column| *column == route.master_column_index)
            .ok_or_else(|| RosterError::ColumnNotFound(route.class_name.to_string()))?;

        let lock = self.column_lock(column);
        let _guard = lock.lock().await;

        let values = sheets
            .read_tab(MASTER_LIST_TAB, MASTER_LIST_COLUMNS.len())
            .await
            .map_err(RosterError::MasterList)?;
        let cell = CellRef {
            row: first_empty_row(&values, column),
            column,
        };
        sheets
            .update_cell(MASTER_LIST_TAB, cell, student_name)
            .await
            .map_err(RosterError::MasterList)?;

        info!(
            "Placed {} in {} at row {}",
            student_name,
            MASTER_LIST_COLUMNS[column],
            cell.row + 1
        );
        Ok(cell)
    }

    /// Appends the student to the class's own roster tab.
    pub async fn append_class_list(
        &self,
        sheets: &dyn SheetStore,
        route: &ClassRoute,
        record: &NormalizedSubmission,
    ) -> Result<(), RosterError> {
        sheets
            .append_row(route.class_list_tab, class_list_row(record))
            .await
            .map_err(RosterError::ClassList)
    }
}
