use super::SiteFiles;
use actix_files::NamedFile;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{mime, web, HttpRequest, HttpResponse};
use common::model::admission::ErrorResponse;
use log::error;

const TERMS_FILENAME: &str = "terms.pdf";

/// `GET /terms-pdf`: the terms and conditions as a download.
pub(crate) async fn process(req: HttpRequest, site: web::Data<SiteFiles>) -> HttpResponse {
    let path = &site.terms_pdf_path;
    match NamedFile::open_async(path).await {
        Ok(file) => {
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| TERMS_FILENAME.to_string());
            file.set_content_type(mime::APPLICATION_PDF)
                .set_content_disposition(ContentDisposition {
                    disposition: DispositionType::Attachment,
                    parameters: vec![DispositionParam::Filename(filename)],
                })
                .into_response(&req)
        }
        Err(e) => {
            error!("Terms PDF {} unavailable: {}", path.display(), e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::new(format!("Terms PDF unavailable: {e}")))
        }
    }
}
