use serde::{Deserialize, Serialize};

pub const DEFAULT_DURATION: &str = "45 phút";

pub const TEMPLATE_START: &str = "--- BẮT ĐẦU NỘI DUNG TỆP MẪU ---";
pub const TEMPLATE_END: &str = "--- KẾT THÚC NỘI DUNG TỆP MẪU ---";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub topic: String,
    pub subject: String,
    pub grade: String,
    pub duration: String,
    pub template_content: String,
}

/// Renders the generation prompt. Pure: identical requests give identical
/// prompts byte for byte.
///
/// Bold spans are requested as `**…**`; the template only ever writes
/// balanced pairs so it never shows the model a lone asterisk.
pub fn build_prompt(request: &GenerationRequest) -> String {
    format!(
        r#"Với vai trò là một chuyên gia về chương trình giáo dục Việt Nam, hãy soạn một giáo án chi tiết.

**Dưới đây là nội dung văn bản được trích xuất từ tệp mẫu để bạn tham khảo cấu trúc và các ý chính:**
{start}
{template}
{end}

**Yêu cầu:**
1. **Dựa vào cấu trúc và ý chính từ nội dung tệp mẫu trên.**
2. **Soạn giáo án cho:**
   - **Môn học:** {subject}
   - **Lớp:** {grade}
   - **Tên bài học:** {topic}
   - **Thời lượng:** {duration}
3. **Định dạng:**
   - Tuân thủ nghiêm ngặt thể thức văn bản hành chính của Việt Nam (ví dụ: Tiêu đề, căn lề, mục lớn, mục nhỏ).
   - **In đậm BẮT BUỘC:** Tất cả các đề mục, tiêu đề chính, tiêu đề phụ, các mục La Mã (ví dụ: **I.**, **II.**), và các từ khóa như **Hoạt động 1**, **Nhiệm vụ**. Sử dụng cú pháp Markdown với hai dấu hoa thị ở mỗi đầu (ví dụ: **I. MỤC TIÊU**).
   - **TUYỆT ĐỐI KHÔNG sử dụng dấu hoa thị** vào bất kỳ mục đích nào khác ngoài cặp in đậm nêu trên. Không dùng dấu hoa thị để gạch đầu dòng, chỉ cần xuống dòng cho mỗi mục.
4. **Nội dung:**
   - Nội dung phải logic, khoa học, phù hợp với trình độ học sinh và mục tiêu bài học.
   - Các hoạt động dạy và học phải được thiết kế rõ ràng, sáng tạo.

Hãy bắt đầu soạn giáo án.
"#,
        start = TEMPLATE_START,
        template = request.template_content,
        end = TEMPLATE_END,
        subject = request.subject,
        grade = request.grade,
        topic = request.topic,
        duration = request.duration,
    )
}
