//! Application-submission validation. Every applicable check runs and its
//! message is collected before anything is reported, so the caller sees the
//! complete list of problems in one response.

use crate::applications::storage::FileUpload;

pub const MAX_RESUME_BYTES: usize = 5_000_000;

/// Accepted resume content types: PDF, DOC, DOCX.
pub const ALLOWED_RESUME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

/// The two mutually exclusive resume sources, plus the two invalid shapes a
/// form can arrive in.
#[derive(Debug, Clone)]
pub enum ResumeSource {
    Upload(FileUpload),
    /// Path of a resume already attached to one of the seeker's own
    /// applications. Ownership is verified against the database by the handler.
    Existing(String),
    Missing,
    Both,
}

pub fn validate_submission(cover_letter: &str, source: &ResumeSource) -> Vec<String> {
    let mut errors = Vec::new();

    if cover_letter.trim().is_empty() {
        errors.push("Cover letter is required".to_string());
    }

    match source {
        ResumeSource::Missing => {
            errors.push("A resume is required: upload a file or select an existing one".to_string());
        }
        ResumeSource::Both => {
            errors.push(
                "Choose either a new resume upload or an existing resume, not both".to_string(),
            );
        }
        ResumeSource::Existing(path) => {
            if path.trim().is_empty() {
                errors.push("Selected resume path is empty".to_string());
            }
        }
        ResumeSource::Upload(upload) => {
            if !ALLOWED_RESUME_TYPES.contains(&upload.content_type.as_str()) {
                errors.push(format!(
                    "Resume must be a PDF, DOC or DOCX file (got '{}')",
                    upload.content_type
                ));
            }
            if upload.bytes.len() > MAX_RESUME_BYTES {
                errors.push(format!(
                    "Resume exceeds the {} byte limit ({} bytes)",
                    MAX_RESUME_BYTES,
                    upload.bytes.len()
                ));
            }
            if upload.bytes.is_empty() {
                errors.push("Uploaded resume file is empty".to_string());
            }
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn upload(content_type: &str, size: usize) -> ResumeSource {
        ResumeSource::Upload(FileUpload {
            filename: "resume.pdf".to_string(),
            content_type: content_type.to_string(),
            bytes: Bytes::from(vec![0u8; size]),
        })
    }

    #[test]
    fn test_accepts_4mb_pdf() {
        let errors = validate_submission("I am a fit because...", &upload("application/pdf", 4_000_000));
        assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    }

    #[test]
    fn test_rejects_6mb_file() {
        let errors = validate_submission("letter", &upload("application/pdf", 6_000_000));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("byte limit"));
    }

    #[test]
    fn test_boundary_exactly_at_limit_passes() {
        let errors = validate_submission("letter", &upload("application/pdf", MAX_RESUME_BYTES));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_rejects_wrong_content_type() {
        let errors = validate_submission("letter", &upload("image/png", 1_000));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("PDF, DOC or DOCX"));
    }

    #[test]
    fn test_accepts_doc_and_docx() {
        for ct in ALLOWED_RESUME_TYPES {
            assert!(validate_submission("letter", &upload(ct, 1_000)).is_empty());
        }
    }

    #[test]
    fn test_empty_cover_letter_rejected() {
        let errors = validate_submission("   ", &upload("application/pdf", 1_000));
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("Cover letter"));
    }

    #[test]
    fn test_all_errors_collected_not_short_circuited() {
        // Empty cover letter + oversized non-PDF: three failures, one report.
        let errors = validate_submission("", &upload("image/png", 6_000_000));
        assert_eq!(errors.len(), 3, "collected: {errors:?}");
    }

    #[test]
    fn test_missing_source_rejected() {
        let errors = validate_submission("letter", &ResumeSource::Missing);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_both_sources_rejected() {
        let errors = validate_submission("letter", &ResumeSource::Both);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("not both"));
    }

    #[test]
    fn test_empty_upload_rejected() {
        let errors = validate_submission("letter", &upload("application/pdf", 0));
        assert!(errors.iter().any(|e| e.contains("empty")));
    }
}
