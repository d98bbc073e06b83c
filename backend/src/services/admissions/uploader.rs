use super::model::{Attachment, AttachmentField, Submission, UploadResult};
use crate::error::AdmissionError;
use crate::providers::{FileStore, NewFile};
use futures_util::future::try_join_all;
use log::info;

/// Uploads one attachment, makes it world-readable and returns its link.
async fn upload_one(
    files: &dyn FileStore,
    folder_id: &str,
    field: AttachmentField,
    attachment: &Attachment,
) -> Result<(AttachmentField, String), AdmissionError> {
    let name = if attachment.filename.trim().is_empty() {
        field.as_str()
    } else {
        attachment.filename.as_str()
    };
    let upload_err = |source| AdmissionError::Upload {
        field: field.as_str(),
        source,
    };

    let file_id = files
        .create_file(NewFile {
            name,
            mime_type: &attachment.content_type,
            parent_id: folder_id,
            content: attachment.content.clone(),
        })
        .await
        .map_err(upload_err)?;
    files.grant_public_read(&file_id).await.map_err(upload_err)?;

    info!("Uploaded {} as {}", field.as_str(), file_id);
    Ok((field, files.public_url(&file_id)))
}

/// Uploads every attachment present in the submission concurrently.
///
/// Slots without a file are skipped and read back as "". The first failure
/// aborts the call; uploads that already finished stay in storage.
pub async fn upload_attachments(
    files: &dyn FileStore,
    folder_id: &str,
    submission: &Submission,
) -> Result<UploadResult, AdmissionError> {
    let uploads = submission
        .attachments
        .iter()
        .map(|(field, attachment)| upload_one(files, folder_id, *field, attachment));

    let mut result = UploadResult::default();
    for (field, url) in try_join_all(uploads).await? {
        result.insert(field, url);
    }
    Ok(result)
}
