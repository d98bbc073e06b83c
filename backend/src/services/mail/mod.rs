//! `POST /sendEmail`: mails the fixed payment instructions, with the static
//! PDF attached, to the address given in the JSON body.

use actix_web::web::{post, resource};
use actix_web::Resource;

pub mod send;

pub fn configure_routes() -> Resource {
    resource("/sendEmail").route(post().to(send::process))
}
