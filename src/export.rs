//! Word export and plain-text copy of a generated plan.

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;

use anyhow::{Context, Result};
use quick_xml::escape::escape;
use tracing::info;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const EXPORT_FILE_NAME: &str = "giao-an.docx";

const BOLD_MARKER: &str = "**";
/// 14 pt, in half-points.
const FONT_SIZE: u32 = 28;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

/// Plan text without bold markers, as put on the clipboard.
pub fn plain_text(content: &str) -> String {
    content.replace(BOLD_MARKER, "")
}

/// Builds a .docx package: one paragraph per line, text between `**`
/// markers in bold.
pub fn to_docx(content: &str) -> Result<Vec<u8>> {
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));

    zip.start_file("[Content_Types].xml", opts)
        .context("failed to start content types entry")?;
    zip.write_all(CONTENT_TYPES_XML.as_bytes())
        .context("failed to write content types entry")?;

    zip.start_file("_rels/.rels", opts)
        .context("failed to start relationships entry")?;
    zip.write_all(RELS_XML.as_bytes())
        .context("failed to write relationships entry")?;

    zip.start_file("word/document.xml", opts)
        .context("failed to start document entry")?;
    zip.write_all(document_xml(content).as_bytes())
        .context("failed to write document entry")?;

    let cursor = zip.finish().context("failed to finalize docx package")?;
    Ok(cursor.into_inner())
}

pub fn write_docx(content: &str, path: &Path) -> Result<()> {
    let bytes = to_docx(content)?;
    fs::write(path, &bytes).context(format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), bytes = bytes.len(), "exported lesson plan");
    Ok(())
}

fn document_xml(content: &str) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
    );

    for line in content.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        xml.push_str(&paragraph_xml(line));
    }

    xml.push_str("</w:body></w:document>");
    xml
}

fn paragraph_xml(line: &str) -> String {
    if line.is_empty() {
        return format!("<w:p>{}</w:p>", run_xml("", false));
    }

    let runs: String = line
        .split(BOLD_MARKER)
        .enumerate()
        .filter(|(_, part)| !part.is_empty())
        .map(|(index, part)| run_xml(part, index % 2 == 1))
        .collect();

    format!("<w:p>{}</w:p>", runs)
}

fn run_xml(text: &str, bold: bool) -> String {
    format!(
        r#"<w:r><w:rPr>{}<w:sz w:val="{}"/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#,
        if bold { "<w:b/>" } else { "" },
        FONT_SIZE,
        escape(text),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::docx;

    const PLAN: &str = "**I. MỤC TIÊU**\nHọc sinh hiểu **phân số** & so sánh <1>\n\n**II. CHUẨN BỊ**";

    #[test]
    fn plain_text_drops_markers() {
        assert_eq!(
            plain_text(PLAN),
            "I. MỤC TIÊU\nHọc sinh hiểu phân số & so sánh <1>\n\nII. CHUẨN BỊ"
        );
    }

    #[test]
    fn odd_segments_are_bold() {
        let xml = paragraph_xml("Học sinh hiểu **phân số** rồi");
        assert_eq!(
            xml,
            concat!(
                r#"<w:p><w:r><w:rPr><w:sz w:val="28"/></w:rPr><w:t xml:space="preserve">Học sinh hiểu </w:t></w:r>"#,
                r#"<w:r><w:rPr><w:b/><w:sz w:val="28"/></w:rPr><w:t xml:space="preserve">phân số</w:t></w:r>"#,
                r#"<w:r><w:rPr><w:sz w:val="28"/></w:rPr><w:t xml:space="preserve"> rồi</w:t></w:r></w:p>"#,
            )
        );
    }

    #[test]
    fn empty_line_keeps_an_empty_paragraph() {
        assert_eq!(
            paragraph_xml(""),
            r#"<w:p><w:r><w:rPr><w:sz w:val="28"/></w:rPr><w:t xml:space="preserve"></w:t></w:r></w:p>"#
        );
        assert_eq!(paragraph_xml("****"), "<w:p></w:p>");
    }

    #[test]
    fn exported_document_reads_back_as_plan_text() {
        let bytes = to_docx(PLAN).unwrap();
        let text = docx::extract_text(&bytes).unwrap();

        let expected = plain_text(PLAN).split('\n').collect::<Vec<_>>().join("\n\n");
        assert_eq!(text, expected);
    }

    #[test]
    fn write_docx_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(EXPORT_FILE_NAME);

        write_docx(PLAN, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"PK"));
    }
}
