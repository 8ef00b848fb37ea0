//! Resume file storage. Stored names are generated identifiers, never derived
//! from the original filename or a timestamp, so two uploads can never collide
//! or silently overwrite each other.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

const RESUME_SUBDIR: &str = "resumes";
const PHOTO_SUBDIR: &str = "photos";

/// An uploaded file pulled out of a multipart form.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// Generated storage name: fresh UUID plus the sanitized original extension.
pub fn storage_filename(original: &str) -> String {
    let ext = sanitized_extension(original);
    match ext {
        Some(ext) => format!("{}.{ext}", Uuid::new_v4().simple()),
        None => Uuid::new_v4().simple().to_string(),
    }
}

/// Extension of the original filename, kept only if it is short and purely
/// alphanumeric. Anything suspicious is dropped rather than escaped.
fn sanitized_extension(original: &str) -> Option<String> {
    let ext = Path::new(original).extension()?.to_str()?;
    if ext.len() <= 10 && ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        Some(ext.to_ascii_lowercase())
    } else {
        None
    }
}

/// Writes an uploaded resume under `{upload_dir}/resumes/` and returns the
/// relative path stored on the application row.
pub async fn store_resume(upload_dir: &str, upload: &FileUpload) -> Result<String, AppError> {
    store_upload(upload_dir, RESUME_SUBDIR, upload).await
}

/// Writes a profile image under `{upload_dir}/photos/`.
pub async fn store_photo(upload_dir: &str, upload: &FileUpload) -> Result<String, AppError> {
    store_upload(upload_dir, PHOTO_SUBDIR, upload).await
}

async fn store_upload(
    upload_dir: &str,
    subdir: &str,
    upload: &FileUpload,
) -> Result<String, AppError> {
    let dir = PathBuf::from(upload_dir).join(subdir);
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to create upload directory: {e}")))?;

    let name = storage_filename(&upload.filename);
    let path = dir.join(&name);
    tokio::fs::write(&path, &upload.bytes)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to write uploaded file: {e}")))?;

    info!("Stored upload {} ({} bytes)", path.display(), upload.bytes.len());
    Ok(format!("{subdir}/{name}"))
}

/// Removes a previously stored upload by its relative path. Used to clean up
/// when the database write that would have referenced the file fails; a
/// missing file is not an error.
pub async fn remove_upload(upload_dir: &str, relative: &str) {
    let path = PathBuf::from(upload_dir).join(relative);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove orphaned upload {}: {e}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn test_storage_filename_keeps_clean_extension() {
        let name = storage_filename("My Resume.PDF");
        assert!(name.ends_with(".pdf"));
        assert_eq!(name.len(), 32 + 4, "uuid simple + .pdf");
    }

    #[test]
    fn test_storage_filename_drops_bad_extension() {
        assert_eq!(storage_filename("resume.p/../df").len(), 32);
        assert_eq!(storage_filename("noextension").len(), 32);
        assert_eq!(storage_filename("x.waytoolongextension").len(), 32);
    }

    #[test]
    fn test_storage_filenames_never_collide() {
        // Same user, same original name, same instant — distinct names.
        let a = storage_filename("resume.pdf");
        let b = storage_filename("resume.pdf");
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_store_resume_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let upload = FileUpload {
            filename: "resume.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: Bytes::from_static(b"%PDF-1.4 fake"),
        };

        let rel = store_resume(dir.path().to_str().unwrap(), &upload)
            .await
            .unwrap();
        assert!(rel.starts_with("resumes/"));

        let written = tokio::fs::read(dir.path().join(&rel)).await.unwrap();
        assert_eq!(written, b"%PDF-1.4 fake");
    }

    #[tokio::test]
    async fn test_remove_upload_deletes_stored_file() {
        let dir = tempfile::tempdir().unwrap();
        let upload = FileUpload {
            filename: "resume.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            bytes: Bytes::from_static(b"%PDF-1.4 fake"),
        };
        let base = dir.path().to_str().unwrap();

        let rel = store_resume(base, &upload).await.unwrap();
        assert!(dir.path().join(&rel).exists());

        remove_upload(base, &rel).await;
        assert!(!dir.path().join(&rel).exists(), "stored file must be gone");

        // Removing again is a quiet no-op.
        remove_upload(base, &rel).await;
    }
}
