use crate::config::MailConfig;
use crate::error::ProviderError;
use crate::providers::{MailAttachment, Mailer, OutgoingMail};
use actix_web::{web, HttpResponse, Responder};
use common::model::admission::{EmailSentResponse, ErrorResponse};
use common::requests::SendEmailRequest;
use log::{error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

const SENT_MESSAGE: &str = "Payment instructions sent!";
const DEFAULT_ATTACHMENT_NAME: &str = "payment-instructions.pdf";

/// The fixed payment-instructions message and the mailer that delivers it.
pub struct PaymentInstructions {
    mailer: Arc<dyn Mailer>,
    subject: String,
    body: String,
    attachment_path: PathBuf,
}

impl PaymentInstructions {
    pub fn new(mailer: Arc<dyn Mailer>, config: &MailConfig) -> Self {
        Self {
            mailer,
            subject: config.subject.clone(),
            body: config.body.clone(),
            attachment_path: config.attachment_path.clone(),
        }
    }

    async fn attachment(&self) -> Result<MailAttachment, ProviderError> {
        let content = tokio::fs::read(&self.attachment_path)
            .await
            .map_err(|source| ProviderError::ReadFile {
                path: self.attachment_path.clone(),
                source,
            })?;
        let filename = self
            .attachment_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| DEFAULT_ATTACHMENT_NAME.to_string());
        Ok(MailAttachment {
            filename,
            mime_type: "application/pdf".to_string(),
            content,
        })
    }

    pub async fn send_to(&self, to: &str) -> Result<(), ProviderError> {
        let mail = OutgoingMail {
            to: to.to_string(),
            subject: self.subject.clone(),
            body: self.body.clone(),
            attachment: Some(self.attachment().await?),
        };
        self.mailer.send(&mail).await
    }
}

/// One bare address: no control characters, whitespace or list separators.
fn is_single_address(email: &str) -> bool {
    email.contains('@')
        && !email
            .chars()
            .any(|c| c.is_control() || c.is_whitespace() || matches!(c, ',' | ';' | '<' | '>'))
}

/// A missing or unusable address is answered with 500, the same as a delivery failure.
pub(crate) async fn process(
    instructions: web::Data<PaymentInstructions>,
    payload: web::Json<SendEmailRequest>,
) -> impl Responder {
    let email = payload
        .into_inner()
        .email
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty());
    let Some(email) = email else {
        return HttpResponse::InternalServerError().json(ErrorResponse::new("Email is required"));
    };
    if !is_single_address(&email) {
        warn!("Rejected payment instructions address {:?}", email);
        return HttpResponse::InternalServerError().json(ErrorResponse::new("Invalid email address"));
    }

    match instructions.send_to(&email).await {
        Ok(()) => {
            info!("Payment instructions sent to {}", email);
            HttpResponse::Ok().json(EmailSentResponse {
                success: true,
                msg: SENT_MESSAGE.to_string(),
            })
        }
        Err(e) => {
            error!("Sending payment instructions to {} failed: {:?}", email, e);
            HttpResponse::InternalServerError().json(ErrorResponse::new(e.to_string()))
        }
    }
}
