use super::model::{Attachment, AttachmentField, Submission};
use super::pipeline::AdmissionPipeline;
use crate::error::AdmissionError;
use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpResponse};
use common::model::admission::{AdmissionResponse, ErrorResponse};
use futures_util::StreamExt;
use log::warn;
use uuid::Uuid;

pub const SUBMISSION_ID_HEADER: &str = "X-Submission-Id";

/// The form has 62 text inputs; this leaves room for client extras.
const MAX_TEXT_FIELDS: usize = 200;
const MAX_TEXT_BYTES: usize = 1024 * 1024;

/// Per-request limits applied while the form is streamed in.
#[derive(Debug, Clone, Copy)]
pub struct FormLimits {
    pub max_attachment_bytes: usize,
    /// Number of text parts accepted, repeated names included.
    pub max_text_fields: usize,
    /// Combined size of every text part.
    pub max_text_bytes: usize,
}

impl FormLimits {
    pub fn new(max_attachment_bytes: usize) -> Self {
        Self {
            max_attachment_bytes,
            max_text_fields: MAX_TEXT_FIELDS,
            max_text_bytes: MAX_TEXT_BYTES,
        }
    }
}

/// `POST /admissions`
///
/// - `200` with `{"success": true, "pdfUrl"?}` when every stage completed.
/// - `400` when the class is not configured or the form itself is unusable.
/// - `500` with the failing stage's message otherwise.
pub(crate) async fn process(
    pipeline: web::Data<AdmissionPipeline>,
    limits: web::Data<FormLimits>,
    payload: Multipart,
) -> HttpResponse {
    let submission = match read_submission(payload, limits.get_ref()).await {
        Ok(submission) => submission,
        Err(e) => {
            warn!("Rejected admission form: {}", e);
            return HttpResponse::BadRequest().json(ErrorResponse::new(e.to_string()));
        }
    };

    let attempt_id = Uuid::new_v4().to_string();
    match pipeline.submit(&attempt_id, &submission).await {
        Ok(pdf_url) => HttpResponse::Ok()
            .insert_header((SUBMISSION_ID_HEADER, attempt_id))
            .json(AdmissionResponse {
                success: true,
                pdf_url,
            }),
        Err(e) => {
            let mut response = if e.is_client_error() {
                HttpResponse::BadRequest()
            } else {
                HttpResponse::InternalServerError()
            };
            response
                .insert_header((SUBMISSION_ID_HEADER, attempt_id))
                .json(ErrorResponse::new(e.to_string()))
        }
    }
}

fn malformed(e: impl std::fmt::Display) -> AdmissionError {
    AdmissionError::InvalidInput(format!("Malformed form data: {e}"))
}

async fn read_part(
    field: &mut Field,
    limit: usize,
    too_large: impl FnOnce() -> String,
) -> Result<Vec<u8>, AdmissionError> {
    let mut content = Vec::new();
    while let Some(chunk) = field.next().await {
        content.extend_from_slice(&chunk.map_err(malformed)?);
        if content.len() > limit {
            return Err(AdmissionError::InvalidInput(too_large()));
        }
    }
    Ok(content)
}

/// Streams the multipart body into a `Submission`.
///
/// Text parts become fields (a repeated name keeps the last value) and share
/// one byte budget. File parts are accepted only for the five attachment
/// slots, at most one each; other file parts are drained without buffering.
/// An empty file input (no filename, no bytes) counts as absent.
async fn read_submission(
    mut payload: Multipart,
    limits: &FormLimits,
) -> Result<Submission, AdmissionError> {
    let mut submission = Submission::default();
    let mut text_fields = 0;
    let mut text_bytes = 0;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(malformed)?;
        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().unwrap_or_default().to_string(),
                cd.get_filename().map(str::to_string),
            ),
            None => continue,
        };

        let Some(filename) = filename else {
            text_fields += 1;
            if text_fields > limits.max_text_fields {
                return Err(AdmissionError::InvalidInput(format!(
                    "Form has more than {} fields",
                    limits.max_text_fields
                )));
            }
            let remaining = limits.max_text_bytes.saturating_sub(text_bytes);
            let content = read_part(&mut field, remaining, || {
                format!(
                    "Form fields exceed the limit of {} bytes",
                    limits.max_text_bytes
                )
            })
            .await?;
            text_bytes += content.len();
            submission
                .fields
                .insert(name, String::from_utf8_lossy(&content).into_owned());
            continue;
        };

        let Some(slot) = AttachmentField::from_name(&name) else {
            warn!("Ignoring unexpected file field '{}'", name);
            while let Some(chunk) = field.next().await {
                chunk.map_err(malformed)?;
            }
            continue;
        };
        let content_type = field
            .content_type()
            .map(|mime| mime.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());
        let limit = limits.max_attachment_bytes;
        let content = read_part(&mut field, limit, || {
            format!("Field {name} exceeds the limit of {limit} bytes")
        })
        .await?;
        if filename.is_empty() && content.is_empty() {
            continue;
        }
        if submission.attachments.contains_key(&slot) {
            return Err(AdmissionError::InvalidInput(format!(
                "Only one file is accepted for {name}"
            )));
        }
        submission.attachments.insert(
            slot,
            Attachment {
                filename,
                content_type,
                content,
            },
        );
    }

    Ok(submission)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PdfMode;
    use crate::journal::state::{start_journal_writer, JournalState};
    use crate::services::admissions::class_registry::ClassRegistry;
    use crate::services::admissions::configure_routes;
    use crate::services::admissions::pipeline::PipelineSettings;
    use crate::testing::{FakeFiles, FakeMailer, FakeRenderer, FakeSheets, Fakes};
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App};
    use std::collections::HashMap;

    const BOUNDARY: &str = "----admissions-test-boundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn multipart_body(parts: &[Part]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n")
                            .as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(name, filename, content) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                             Content-Type: application/pdf\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(content);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn request(parts: &[Part]) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/admissions")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(multipart_body(parts))
    }

    fn pipeline_data(fakes: &Fakes, mode: PdfMode) -> web::Data<AdmissionPipeline> {
        let (journal, rx) = JournalState::new(256);
        tokio::spawn(start_journal_writer(journal.attempts.clone(), rx, None));
        web::Data::new(AdmissionPipeline::new(
            fakes.bundle(),
            ClassRegistry::new(&HashMap::new()),
            PipelineSettings {
                uploads_folder_id: "uploads".to_string(),
                pdf_folder_id: Some("pdfs".to_string()),
                pdf_mode: mode,
            },
            journal,
        ))
    }

    macro_rules! app {
        ($fakes:expr, $mode:expr, $limit:expr) => {
            test::init_service(
                App::new()
                    .app_data(pipeline_data($fakes, $mode))
                    .app_data(web::Data::new(FormLimits::new($limit)))
                    .service(configure_routes()),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn accepted_submission_returns_success_and_attempt_id() {
        let fakes = Fakes::default();
        let app = app!(&fakes, PdfMode::Disabled, 1024);

        let resp = test::call_service(
            &app,
            request(&[
                Part::Text("classApplied", "Grade 3"),
                Part::Text("full_name", "Jane Doe"),
                Part::Text("allergies", "No"),
                Part::File("report_card", "report.pdf", b"%PDF-1.4"),
                Part::File("birth_cert", "", b""),
            ])
            .to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key(SUBMISSION_ID_HEADER));
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert_eq!(body, serde_json::json!({ "success": true }));

        let created = fakes.files.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].name, "report.pdf");
        assert_eq!(fakes.sheets.tab("Grade 3").len(), 1);
    }

    #[actix_web::test]
    async fn pdf_url_is_returned_when_stored() {
        let fakes = Fakes::default();
        let app = app!(&fakes, PdfMode::Required, 1024);
        let resp = test::call_service(
            &app,
            request(&[
                Part::Text("classApplied", "Grade 5"),
                Part::Text("full_name", "Ali"),
            ])
            .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: AdmissionResponse = test::read_body_json(resp).await;
        assert!(body.success);
        assert!(body.pdf_url.unwrap().starts_with("https://files.test/"));
    }

    #[actix_web::test]
    async fn unknown_class_is_bad_request_with_exact_message() {
        let fakes = Fakes::default();
        let app = app!(&fakes, PdfMode::Optional, 1024);
        let resp = test::call_service(
            &app,
            request(&[
                Part::Text("classApplied", "Unknown Class"),
                Part::File("passport_photo", "me.jpg", b"jpeg"),
            ])
            .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "No sheet tab configured for class \"Unknown Class\"");
        assert!(fakes.files.created().is_empty());
        assert_eq!(fakes.sheets.call_count(), 0);
    }

    #[actix_web::test]
    async fn duplicate_file_in_one_slot_is_rejected() {
        let fakes = Fakes::default();
        let app = app!(&fakes, PdfMode::Disabled, 1024);
        let resp = test::call_service(
            &app,
            request(&[
                Part::Text("classApplied", "Grade 3"),
                Part::File("report_card", "a.pdf", b"a"),
                Part::File("report_card", "b.pdf", b"b"),
            ])
            .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(fakes.files.created().is_empty());
    }

    #[actix_web::test]
    async fn oversized_attachment_is_rejected() {
        let fakes = Fakes::default();
        let app = app!(&fakes, PdfMode::Disabled, 4);
        let resp = test::call_service(
            &app,
            request(&[
                Part::Text("classApplied", "Grade 3"),
                Part::File("report_card", "a.pdf", b"too large"),
            ])
            .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(fakes.sheets.call_count(), 0);
    }

    #[actix_web::test]
    async fn upload_failure_is_server_error_with_message() {
        let fakes = Fakes::new(
            FakeFiles::failing_on("birth.pdf"),
            FakeSheets::default(),
            FakeMailer::default(),
            FakeRenderer::default(),
        );
        let app = app!(&fakes, PdfMode::Disabled, 1024);
        let resp = test::call_service(
            &app,
            request(&[
                Part::Text("classApplied", "Grade 3"),
                Part::File("birth_cert", "birth.pdf", b"pdf"),
            ])
            .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert!(body.error.contains("quota exceeded"), "{}", body.error);
        assert!(fakes.sheets.tab("Grade 3").is_empty());
    }

    #[actix_web::test]
    async fn unexpected_file_fields_are_ignored() {
        let fakes = Fakes::default();
        let app = app!(&fakes, PdfMode::Disabled, 1024);
        let resp = test::call_service(
            &app,
            request(&[
                Part::Text("classApplied", "Grade 3"),
                Part::File("immunization_card", "card.pdf", b"pdf"),
            ])
            .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(fakes.files.created().is_empty());
    }

    #[actix_web::test]
    async fn too_many_text_fields_are_rejected() {
        let fakes = Fakes::default();
        let app = test::init_service(
            App::new()
                .app_data(pipeline_data(&fakes, PdfMode::Disabled))
                .app_data(web::Data::new(FormLimits {
                    max_attachment_bytes: 1024,
                    max_text_fields: 3,
                    max_text_bytes: 1024,
                }))
                .service(configure_routes()),
        )
        .await;
        let resp = test::call_service(
            &app,
            request(&[
                Part::Text("classApplied", "Grade 3"),
                Part::Text("full_name", "Jane Doe"),
                Part::Text("padding", "x"),
                Part::Text("padding", "x"),
            ])
            .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "Form has more than 3 fields");
        assert_eq!(fakes.sheets.call_count(), 0);
    }

    #[actix_web::test]
    async fn text_fields_share_one_byte_budget() {
        let fakes = Fakes::default();
        let app = test::init_service(
            App::new()
                .app_data(pipeline_data(&fakes, PdfMode::Disabled))
                .app_data(web::Data::new(FormLimits {
                    max_attachment_bytes: 1024,
                    max_text_fields: 10,
                    max_text_bytes: 16,
                }))
                .service(configure_routes()),
        )
        .await;
        // Each value fits on its own; together they do not.
        let resp = test::call_service(
            &app,
            request(&[
                Part::Text("classApplied", "Grade 3"),
                Part::Text("full_name", "Jane Doe"),
                Part::Text("address", "12 Main St"),
            ])
            .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert_eq!(body.error, "Form fields exceed the limit of 16 bytes");
        assert!(fakes.files.created().is_empty());
    }
}
