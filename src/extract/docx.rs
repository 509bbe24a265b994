use std::io::{Cursor, Read};

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

const DOCUMENT_ENTRY: &str = "word/document.xml";

/// Raw text of a Word document body: one string per paragraph, paragraphs
/// separated by a blank line. Formatting is dropped.
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes)).context("invalid docx container")?;
    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_ENTRY)
        .context("docx has no word/document.xml")?
        .read_to_string(&mut xml)
        .context("failed to read word/document.xml")?;

    let paragraphs = body_paragraphs(&xml)?;
    Ok(paragraphs.join("\n\n"))
}

fn body_paragraphs(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_run = false;
    let mut in_text = false;

    loop {
        match reader.read_event().context("malformed document.xml")? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:r" => in_run = true,
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::End(e) => match e.name().as_ref() {
                b"w:r" => in_run = false,
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                // tab stops in paragraph properties are also w:tab, only runs count
                b"w:tab" if in_run => current.push('\t'),
                b"w:br" | b"w:cr" if in_run => current.push('\n'),
                b"w:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(t) if in_text => {
                let text = t.unescape().context("bad text node in document.xml")?;
                current.push_str(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(paragraphs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::ZipWriter;

    fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(DOCUMENT_ENTRY, FileOptions::default()).unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn paragraphs_keep_order_and_drop_formatting() {
        let bytes = docx_with_body(
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>I. MỤC TIÊU</w:t></w:r></w:p><w:p/><w:p><w:r><w:t xml:space="preserve">Học sinh </w:t></w:r><w:r><w:t>hiểu &amp; vận dụng</w:t><w:tab/><w:t>phân số</w:t></w:r></w:p>"#,
        );

        let text = extract_text(&bytes).unwrap();
        assert_eq!(text, "I. MỤC TIÊU\n\n\n\nHọc sinh hiểu & vận dụng\tphân số");
    }

    #[test]
    fn missing_document_part_is_an_error() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/styles.xml", FileOptions::default()).unwrap();
        zip.write_all(b"<w:styles/>").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let err = extract_text(&bytes).unwrap_err();
        assert!(err.to_string().contains("word/document.xml"));
    }

    #[test]
    fn not_a_zip_is_an_error() {
        assert!(extract_text(b"plain bytes").is_err());
    }
}
