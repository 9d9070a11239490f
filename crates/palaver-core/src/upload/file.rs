//! Local file staging for attachments.

use palaver_types::upload::{Attachment, MAX_ATTACHMENT_BYTES};
use tokio::fs;

use std::io;
use std::path::Path;

/// Read a user-selected file into an [`Attachment`].
///
/// Rejects files above [`MAX_ATTACHMENT_BYTES`] before reading them fully.
/// The content type is guessed from the extension; unknown extensions fall
/// back to `application/octet-stream`.
pub async fn load_attachment(path: &Path) -> io::Result<Attachment> {
    let metadata = fs::metadata(path).await?;
    if metadata.len() > MAX_ATTACHMENT_BYTES {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "attachment is {} bytes, above the {MAX_ATTACHMENT_BYTES} byte limit",
                metadata.len()
            ),
        ));
    }

    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "path has no filename"))?
        .to_string();
    let content_type = content_type_for(&filename);
    let data = fs::read(path).await?;
    Ok(Attachment::new(filename, content_type, data))
}

fn content_type_for(filename: &str) -> String {
    let extension = filename.rsplit('.').next().unwrap_or_default();
    match extension.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_file_with_guessed_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cat.PNG");
        tokio::fs::write(&path, b"not a real png").await.unwrap();

        let attachment = load_attachment(&path).await.unwrap();
        assert_eq!(attachment.filename, "cat.PNG");
        assert_eq!(attachment.content_type, "image/png");
        assert_eq!(attachment.data, b"not a real png");
    }

    #[tokio::test]
    async fn unknown_extension_falls_back_to_octet_stream() {
        assert_eq!(content_type_for("notes.xyz"), "application/octet-stream");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[tokio::test]
    async fn oversize_file_is_rejected_before_reading() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.png");
        // Sparse file: the size check must fire on metadata alone.
        let file = std::fs::File::create(&path).unwrap();
        file.set_len(MAX_ATTACHMENT_BYTES + 1).unwrap();

        let err = load_attachment(&path).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_attachment(&dir.path().join("missing.png"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
