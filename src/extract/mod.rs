//! Plain-text extraction from uploaded template documents.
//!
//! Only three declared media types are accepted: PDF, Word (OOXML) and plain
//! text. Everything else is rejected before any parsing happens.

pub mod docx;
pub mod pdf;

use std::path::Path;

use tracing::{debug, info};

use crate::error::LessonError;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
pub const TEXT_MIME: &str = "text/plain";

const UNKNOWN_MIME: &str = "application/octet-stream";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Pdf,
    Docx,
    PlainText,
}

impl MediaType {
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim() {
            PDF_MIME => Some(Self::Pdf),
            DOCX_MIME => Some(Self::Docx),
            TEXT_MIME => Some(Self::PlainText),
            _ => None,
        }
    }

    /// Guess the media type from the file extension, the way a browser fills
    /// in `File.type` for a picked file.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" => Some(Self::PlainText),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Pdf => PDF_MIME,
            Self::Docx => DOCX_MIME,
            Self::PlainText => TEXT_MIME,
        }
    }
}

/// Declared media type for a file on disk, falling back to a generic binary
/// type that `extract` will reject.
pub fn declared_type_for(path: &Path) -> &'static str {
    MediaType::from_path(path)
        .map(|m| m.mime())
        .unwrap_or(UNKNOWN_MIME)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub extracted_text: String,
}

pub fn extract(name: &str, declared_type: &str, bytes: &[u8]) -> Result<String, LessonError> {
    let media_type = MediaType::from_mime(declared_type).ok_or_else(|| {
        LessonError::UnsupportedFormat {
            name: name.to_string(),
            media_type: match declared_type.trim() {
                "" => UNKNOWN_MIME.to_string(),
                declared => declared.to_string(),
            },
        }
    })?;

    debug!(name, mime = media_type.mime(), bytes = bytes.len(), "extracting text");

    let text = match media_type {
        MediaType::Pdf => {
            pdf::extract_text(bytes).map_err(|e| LessonError::extraction(name, format!("{e:#}")))?
        }
        MediaType::Docx => {
            docx::extract_text(bytes).map_err(|e| LessonError::extraction(name, format!("{e:#}")))?
        }
        MediaType::PlainText => String::from_utf8_lossy(bytes).into_owned(),
    };

    info!(name, chars = text.chars().count(), "extracted template text");
    Ok(text)
}
