//! Admission form intake.
//!
//! `POST /admissions` receives the multipart form and runs it through the
//! `pipeline`: class lookup, attachment upload, field normalization, optional
//! PDF copy, spreadsheet row, PDF filing and roster placement. The remaining
//! modules are the individual stages.
//!
//! `GET /admissions/status/{attempt_id}` reads back how far an attempt got,
//! using the id returned in the `X-Submission-Id` header.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

pub mod class_registry;
pub mod field_mapper;
pub mod model;
pub mod pdf;
pub mod pipeline;
pub mod roster;
pub mod schema;
mod status;
pub mod submit;
pub mod uploader;

const API_PATH: &str = "/admissions";

pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", post().to(submit::process))
        .route("/status/{attempt_id}", get().to(status::process))
}
