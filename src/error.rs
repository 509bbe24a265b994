/// Failures surfaced to the user as a single message string.
///
/// The `Display` output is what the CLI prints, so it is written for teachers,
/// not for developers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LessonError {
    #[error("Định dạng tệp không được hỗ trợ: {name} ({media_type}). Vui lòng sử dụng DOCX, PDF, hoặc TXT.")]
    UnsupportedFormat { name: String, media_type: String },

    #[error("Không thể đọc nội dung tệp {name}: {reason}")]
    ExtractionFailure { name: String, reason: String },

    #[error("{0}")]
    Validation(String),

    #[error("API Key chưa được cấu hình. Vui lòng đảm bảo biến môi trường GEMINI_API_KEY đã được thiết lập.")]
    Configuration,

    #[error("API không trả về nội dung. Vui lòng thử lại.")]
    EmptyResponse,

    #[error("Lỗi khi gọi Gemini API: {0}")]
    Api(String),
}

impl LessonError {
    pub fn extraction(name: &str, reason: impl std::fmt::Display) -> Self {
        Self::ExtractionFailure {
            name: name.to_string(),
            reason: reason.to_string(),
        }
    }
}
