use super::auth::GoogleAuth;
use super::{check_response, transport};
use crate::error::ProviderError;
use crate::providers::{Mailer, OutgoingMail};
use async_trait::async_trait;
use base64::engine::general_purpose::{STANDARD as BASE64, URL_SAFE_NO_PAD as BASE64_URL};
use base64::Engine;
use reqwest::Client;
use std::sync::Arc;

const SERVICE: &str = "gmail";
const SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";

/// Sends as the delegated mailbox the `GoogleAuth` subject was minted for.
pub struct GmailClient {
    auth: Arc<GoogleAuth>,
    http: Client,
    sender: String,
}

impl GmailClient {
    pub fn new(auth: Arc<GoogleAuth>, http: Client, sender: impl Into<String>) -> Self {
        Self {
            auth,
            http,
            sender: sender.into(),
        }
    }
}

/// RFC 2047 encoded-word for non-ASCII header values.
fn encode_header(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", BASE64.encode(value))
    }
}

/// Base64 wrapped at 76 characters per line.
fn wrapped_base64(content: &[u8]) -> String {
    let encoded = BASE64.encode(content);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / 76 * 2);
    for (i, chunk) in encoded.as_bytes().chunks(76).enumerate() {
        if i > 0 {
            out.push_str("\r\n");
        }
        out.push_str(std::str::from_utf8(chunk).unwrap_or_default());
    }
    out
}

/// Header values must stay on one line; a CR or LF would start a new header.
fn checked_header<'a>(name: &str, value: &'a str) -> Result<&'a str, ProviderError> {
    if value.chars().any(char::is_control) {
        return Err(ProviderError::InvalidMessage(format!(
            "{name} contains control characters"
        )));
    }
    Ok(value)
}

/// Builds the RFC 822 message sent as Gmail's `raw` payload.
pub fn build_mime(
    sender: &str,
    mail: &OutgoingMail,
    boundary: &str,
) -> Result<String, ProviderError> {
    let sender = checked_header("From", sender)?;
    let to = checked_header("To", &mail.to)?;
    let subject = checked_header("Subject", &mail.subject)?;
    let mut out = String::new();
    out.push_str(&format!("From: {sender}\r\n"));
    out.push_str(&format!("To: {to}\r\n"));
    out.push_str(&format!("Subject: {}\r\n", encode_header(subject)));
    out.push_str("MIME-Version: 1.0\r\n");

    let Some(attachment) = &mail.attachment else {
        out.push_str("Content-Type: text/plain; charset=UTF-8\r\n");
        out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
        out.push_str(&wrapped_base64(mail.body.as_bytes()));
        out.push_str("\r\n");
        return Ok(out);
    };
    let filename = checked_header("Attachment filename", &attachment.filename)?.replace('"', "");

    out.push_str(&format!(
        "Content-Type: multipart/mixed; boundary=\"{boundary}\"\r\n\r\n"
    ));
    out.push_str(&format!("--{boundary}\r\n"));
    out.push_str("Content-Type: text/plain; charset=UTF-8\r\n");
    out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
    out.push_str(&wrapped_base64(mail.body.as_bytes()));
    out.push_str(&format!("\r\n--{boundary}\r\n"));
    out.push_str(&format!(
        "Content-Type: {}; name=\"{}\"\r\n",
        attachment.mime_type, filename
    ));
    out.push_str(&format!(
        "Content-Disposition: attachment; filename=\"{filename}\"\r\n"
    ));
    out.push_str("Content-Transfer-Encoding: base64\r\n\r\n");
    out.push_str(&wrapped_base64(&attachment.content));
    out.push_str(&format!("\r\n--{boundary}--\r\n"));
    Ok(out)
}

#[async_trait]
impl Mailer for GmailClient {
    async fn send(&self, mail: &OutgoingMail) -> Result<(), ProviderError> {
        let boundary = format!("admissions-{}", uuid::Uuid::new_v4().simple());
        let raw = BASE64_URL.encode(build_mime(&self.sender, mail, &boundary)?);
        let token = self.auth.access_token().await?;

        let response = self
            .http
            .post(SEND_URL)
            .bearer_auth(token)
            .json(&serde_json::json!({ "raw": raw }))
            .send()
            .await
            .map_err(transport(SERVICE))?;
        check_response(SERVICE, response).await?;
        Ok(())
    }
}
