use super::auth::GoogleAuth;
use super::{check_response, decode, transport};
use crate::error::ProviderError;
use crate::providers::{FileStore, NewFile};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const SERVICE: &str = "drive";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files";
const FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";

#[derive(Serialize)]
struct FileMetadata<'a> {
    name: &'a str,
    #[serde(rename = "mimeType", skip_serializing_if = "Option::is_none")]
    mime_type: Option<&'a str>,
    parents: [&'a str; 1],
}

#[derive(Deserialize)]
struct FileId {
    id: String,
}

pub struct DriveClient {
    auth: Arc<GoogleAuth>,
    http: Client,
}

impl DriveClient {
    pub fn new(auth: Arc<GoogleAuth>, http: Client) -> Self {
        Self { auth, http }
    }
}

/// Body of a `uploadType=multipart` request: JSON metadata part then the media part.
fn multipart_related_body(boundary: &str, metadata: &[u8], mime_type: &str, content: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(metadata.len() + content.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata);
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(format!("Content-Type: {mime_type}\r\n\r\n").as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[async_trait]
impl FileStore for DriveClient {
    async fn create_file(&self, file: NewFile<'_>) -> Result<String, ProviderError> {
        let token = self.auth.access_token().await?;
        let metadata = serde_json::to_vec(&FileMetadata {
            name: file.name,
            mime_type: Some(file.mime_type),
            parents: [file.parent_id],
        })
        .map_err(|e| ProviderError::Decode {
            service: SERVICE,
            message: e.to_string(),
        })?;
        let boundary = format!("admissions-{}", uuid::Uuid::new_v4().simple());
        let body = multipart_related_body(&boundary, &metadata, file.mime_type, &file.content);

        let response = self
            .http
            .post(UPLOAD_URL)
            .query(&[
                ("uploadType", "multipart"),
                ("supportsAllDrives", "true"),
                ("fields", "id"),
            ])
            .bearer_auth(token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await
            .map_err(transport(SERVICE))?;
        let created: FileId = check_response(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(decode(SERVICE))?;
        Ok(created.id)
    }

    async fn grant_public_read(&self, file_id: &str) -> Result<(), ProviderError> {
        let token = self.auth.access_token().await?;
        let response = self
            .http
            .post(format!("{FILES_URL}/{file_id}/permissions"))
            .query(&[("supportsAllDrives", "true")])
            .bearer_auth(token)
            .json(&serde_json::json!({ "role": "reader", "type": "anyone" }))
            .send()
            .await
            .map_err(transport(SERVICE))?;
        check_response(SERVICE, response).await?;
        Ok(())
    }

    async fn copy_file(
        &self,
        file_id: &str,
        name: &str,
        parent_id: &str,
    ) -> Result<String, ProviderError> {
        let token = self.auth.access_token().await?;
        let response = self
            .http
            .post(format!("{FILES_URL}/{file_id}/copy"))
            .query(&[("supportsAllDrives", "true"), ("fields", "id")])
            .bearer_auth(token)
            .json(&FileMetadata {
                name,
                mime_type: None,
                parents: [parent_id],
            })
            .send()
            .await
            .map_err(transport(SERVICE))?;
        let copied: FileId = check_response(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(decode(SERVICE))?;
        Ok(copied.id)
    }

    fn public_url(&self, file_id: &str) -> String {
        format!("https://drive.google.com/uc?id={file_id}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn multipart_body_layout() {
        let body = multipart_related_body("b1", br#"{"name":"x"}"#, "image/png", b"PNG");
        let text = String::from_utf8(body).unwrap();
        assert_eq!(
            text,
            "--b1\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{\"name\":\"x\"}\r\n--b1\r\nContent-Type: image/png\r\n\r\nPNG\r\n--b1--\r\n"
        );
    }

    #[test]
    fn copy_metadata_omits_mime_type() {
        let json = serde_json::to_string(&FileMetadata {
            name: "a.pdf",
            mime_type: None,
            parents: ["folder"],
        })
        .unwrap();
        assert_eq!(json, r#"{"name":"a.pdf","parents":["folder"]}"#);
    }
}
