use serde::Deserialize;

#[derive(Deserialize)]
/// Request payload for the payment instructions endpoint.
/// `email` is optional at the parsing level so a missing address is reported
/// by the handler instead of the JSON extractor.
pub struct SendEmailRequest {
    #[serde(default)]
    pub email: Option<String>,
}
