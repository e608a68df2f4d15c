use std::collections::HashSet;
use thiserror::Error;

use crate::config::StorageConfig;
use crate::error::AppError;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UploadValidationError {
    #[error("File too large: {size} bytes (max: {max_size} bytes)")]
    FileTooLarge { size: u64, max_size: u64 },

    #[error("Invalid file type: {content_type} (allowed: {allowed:?})")]
    InvalidFileType { content_type: String, allowed: Vec<String> },

    #[error("Filename too long: {length} characters (max: {max_length})")]
    FilenameTooLong { length: usize, max_length: usize },

    #[error("Invalid filename: {filename}")]
    InvalidFilename { filename: String },

    #[error("Invalid object key: {key}")]
    InvalidKey { key: String },

    #[error("Empty file not allowed")]
    EmptyFile,

    #[error("File content does not match {content_type}")]
    ContentMismatch { content_type: String },
}

impl From<UploadValidationError> for AppError {
    fn from(err: UploadValidationError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

const MAX_FILENAME_LENGTH: usize = 255;

/// Checks applied before an upload URL is issued and again when bytes arrive.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_bytes: u64,
    allowed_content_types: HashSet<String>,
}

impl UploadValidator {
    pub fn new(max_bytes: u64, allowed_content_types: impl IntoIterator<Item = String>) -> Self {
        Self {
            max_bytes,
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|t| t.to_ascii_lowercase())
                .collect(),
        }
    }

    pub fn from_config(config: &StorageConfig) -> Self {
        Self::new(config.max_upload_bytes, config.allowed_mime_types.iter().cloned())
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Validates the declared metadata of an upload. Returns the canonical content type.
    pub fn validate_request(
        &self,
        file_name: &str,
        content_type: &str,
        size: u64,
    ) -> Result<String, UploadValidationError> {
        self.validate_filename(file_name)?;
        let content_type = self.validate_content_type(content_type)?;
        self.validate_size(size)?;
        Ok(content_type)
    }

    pub fn validate_size(&self, size: u64) -> Result<(), UploadValidationError> {
        if size == 0 {
            return Err(UploadValidationError::EmptyFile);
        }

        if size > self.max_bytes {
            return Err(UploadValidationError::FileTooLarge {
                size,
                max_size: self.max_bytes,
            });
        }

        Ok(())
    }

    pub fn validate_content_type(&self, content_type: &str) -> Result<String, UploadValidationError> {
        let essence = essence_of(content_type);

        if !self.allowed_content_types.contains(&essence) {
            let mut allowed: Vec<String> = self.allowed_content_types.iter().cloned().collect();
            allowed.sort();
            return Err(UploadValidationError::InvalidFileType {
                content_type: content_type.to_string(),
                allowed,
            });
        }

        Ok(essence)
    }

    fn validate_filename(&self, file_name: &str) -> Result<(), UploadValidationError> {
        if file_name.len() > MAX_FILENAME_LENGTH {
            return Err(UploadValidationError::FilenameTooLong {
                length: file_name.len(),
                max_length: MAX_FILENAME_LENGTH,
            });
        }

        if file_name.trim().is_empty()
            || file_name.contains('\0')
            || file_name.contains('/')
            || file_name.contains('\\')
        {
            return Err(UploadValidationError::InvalidFilename {
                filename: file_name.to_string(),
            });
        }

        Ok(())
    }

    /// Checks the leading bytes of binary image formats against their declared type.
    pub fn validate_payload(&self, content_type: &str, data: &[u8]) -> Result<(), UploadValidationError> {
        self.validate_size(data.len() as u64)?;

        let matches = match content_type {
            "image/jpeg" => data.starts_with(&[0xFF, 0xD8, 0xFF]),
            "image/png" => data.starts_with(&[0x89, 0x50, 0x4E, 0x47]),
            "image/gif" => data.starts_with(b"GIF87a") || data.starts_with(b"GIF89a"),
            "image/webp" => data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP",
            _ => true,
        };

        if !matches {
            return Err(UploadValidationError::ContentMismatch {
                content_type: content_type.to_string(),
            });
        }

        Ok(())
    }
}

/// Lowercased `type/subtype` with parameters stripped.
pub fn essence_of(content_type: &str) -> String {
    match content_type.parse::<mime::Mime>() {
        Ok(parsed) => parsed.essence_str().to_ascii_lowercase(),
        Err(_) => content_type.trim().to_ascii_lowercase(),
    }
}

/// Canonical object key: relative, `/`-separated, no empty, `.` or `..` segments.
///
/// Segments are limited to `[A-Za-z0-9._-]` so a key can be placed in a URL
/// path without escaping.
pub fn normalize_key(key: &str) -> Result<String, UploadValidationError> {
    let invalid = || UploadValidationError::InvalidKey { key: key.to_string() };
    let trimmed = key.trim();

    if trimmed.is_empty() || trimmed.starts_with('/') {
        return Err(invalid());
    }

    let segments: Vec<&str> = trimmed.split('/').collect();
    if segments.iter().any(|segment| {
        segment.is_empty()
            || *segment == "."
            || *segment == ".."
            || !segment.chars().all(is_key_char)
    }) {
        return Err(invalid());
    }

    Ok(segments.join("/"))
}

fn is_key_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> UploadValidator {
        UploadValidator::new(1024, ["image/png".to_string(), "image/jpeg".to_string()])
    }

    #[test]
    fn test_validate_request() {
        let validator = validator();

        assert_eq!(validator.validate_request("a.png", "image/png", 10).unwrap(), "image/png");
        assert_eq!(
            validator.validate_request("a.jpg", "IMAGE/JPEG; charset=binary", 10).unwrap(),
            "image/jpeg"
        );

        assert!(matches!(
            validator.validate_request("a.pdf", "application/pdf", 10),
            Err(UploadValidationError::InvalidFileType { .. })
        ));
        assert_eq!(
            validator.validate_request("a.png", "image/png", 2048),
            Err(UploadValidationError::FileTooLarge { size: 2048, max_size: 1024 })
        );
        assert_eq!(
            validator.validate_request("a.png", "image/png", 0),
            Err(UploadValidationError::EmptyFile)
        );
        assert!(matches!(
            validator.validate_request("../a.png", "image/png", 10),
            Err(UploadValidationError::InvalidFilename { .. })
        ));
    }

    #[test]
    fn test_validate_payload_magic_bytes() {
        let validator = validator();

        assert!(validator.validate_payload("image/png", &[0x89, 0x50, 0x4E, 0x47, 0x0D]).is_ok());
        assert!(matches!(
            validator.validate_payload("image/png", b"<svg></svg>"),
            Err(UploadValidationError::ContentMismatch { .. })
        ));
        assert_eq!(validator.validate_payload("image/png", &[]), Err(UploadValidationError::EmptyFile));
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("employees/a.png").unwrap(), "employees/a.png");
        assert_eq!(normalize_key(" a.png ").unwrap(), "a.png");

        assert_eq!(normalize_key("team-2024/head_shot.v2.png").unwrap(), "team-2024/head_shot.v2.png");

        for bad in ["", "/etc/passwd", "a//b", "a/../b", "./a", "a\\b", "a/", "c:/x"] {
            assert!(normalize_key(bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_normalize_key_rejects_url_reserved_characters() {
        for bad in ["team?x/a.png", "team#1/a.png", "100%/a.png", "my team/a.png", "caf\u{e9}/a.png", "a\0b"] {
            assert!(
                matches!(normalize_key(bad), Err(UploadValidationError::InvalidKey { .. })),
                "{:?} should be rejected",
                bad
            );
        }
    }
}
