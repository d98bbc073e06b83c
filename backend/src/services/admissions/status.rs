use super::pipeline::AdmissionPipeline;
use actix_web::{web, HttpResponse, Responder};
use common::model::admission::ErrorResponse;

/// `GET /admissions/status/{attempt_id}`: the journal entry for one attempt.
pub(crate) async fn process(
    attempt_id: web::Path<String>,
    pipeline: web::Data<AdmissionPipeline>,
) -> impl Responder {
    match pipeline.journal().get(&attempt_id.into_inner()).await {
        Some(status) => HttpResponse::Ok().json(status),
        None => HttpResponse::NotFound().json(ErrorResponse::new("Submission not found")),
    }
}
