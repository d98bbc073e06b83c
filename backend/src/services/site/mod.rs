//! Static side of the server: health check, the terms document and the
//! single-page app with its assets, all served from the public directory.

use actix_web::web::{get, resource};
use actix_web::Resource;
use std::path::{Component, Path, PathBuf};

pub mod fallback;
pub mod terms;

/// Locations of the files served without going through the pipeline.
#[derive(Debug, Clone)]
pub struct SiteFiles {
    pub public_dir: PathBuf,
    pub terms_pdf_path: PathBuf,
}

impl SiteFiles {
    pub fn index(&self) -> PathBuf {
        self.public_dir.join("index.html")
    }

    /// Maps a request path onto an existing file under the public directory.
    /// Anything that would escape the directory resolves to `None`.
    pub fn asset(&self, request_path: &str) -> Option<PathBuf> {
        let relative = Path::new(request_path.trim_start_matches('/'));
        if relative.as_os_str().is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }
        let candidate = self.public_dir.join(relative);
        candidate.is_file().then_some(candidate)
    }
}

async fn ping() -> &'static str {
    "pong"
}

pub fn ping_route() -> Resource {
    resource("/ping").route(get().to(ping))
}

pub fn terms_route() -> Resource {
    resource("/terms-pdf").route(get().to(terms::process))
}
