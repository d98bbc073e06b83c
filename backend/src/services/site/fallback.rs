use super::SiteFiles;
use actix_files::NamedFile;
use actix_web::http::Method;
use actix_web::{web, HttpRequest, HttpResponse};
use log::error;

/// Default service for every unmatched request.
///
/// `GET` serves the requested asset when it exists in the public directory and
/// the app's `index.html` otherwise, so client-side routes load the SPA. Any
/// other method gets an empty 404.
pub(crate) async fn serve_public(req: HttpRequest, site: web::Data<SiteFiles>) -> HttpResponse {
    if req.method() != Method::GET {
        return HttpResponse::NotFound().finish();
    }

    let target = site.asset(req.path()).unwrap_or_else(|| site.index());
    match NamedFile::open_async(&target).await {
        Ok(file) => file.into_response(&req),
        Err(e) => {
            error!("Cannot serve {}: {}", target.display(), e);
            HttpResponse::NotFound().body("Not Found")
        }
    }
}
