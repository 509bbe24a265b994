use std::collections::BTreeMap;

use anyhow::{Context, Result};
use lopdf::content::Content;
use lopdf::{Document, Encoding, Object, ObjectId};
use tracing::warn;

/// Kerning adjustments wider than this (thousandths of an em) read as a space.
const KERNING_SPACE: f32 = -100.0;

/// Page texts in page order, each page's items joined by a single space and
/// pages separated by a blank line.
pub fn extract_text(bytes: &[u8]) -> Result<String> {
    let doc = Document::load_mem(bytes).context("Failed to parse PDF document")?;

    let mut pages = Vec::new();
    // get_pages is keyed by page number, so iteration is already 1..N
    for (page_number, page_id) in doc.get_pages() {
        let items = page_items(&doc, page_id)
            .with_context(|| format!("Failed to extract text from page {}", page_number))?;
        pages.push(items.join(" "));
    }

    Ok(pages.join("\n\n"))
}

/// One item per text-showing operator (`Tj`, `TJ`, `'`, `"`), blanks dropped.
fn page_items(doc: &Document, page_id: ObjectId) -> Result<Vec<String>> {
    let encodings: BTreeMap<Vec<u8>, Encoding> = doc
        .get_page_fonts(page_id)?
        .into_iter()
        .filter_map(|(name, font)| match font.get_font_encoding(doc) {
            Ok(encoding) => Some((name, encoding)),
            Err(e) => {
                warn!(font = %String::from_utf8_lossy(&name), error = %e, "unsupported font encoding");
                None
            }
        })
        .collect();

    let content = Content::decode(&doc.get_page_content(page_id)?)?;

    let mut items = Vec::new();
    let mut current_encoding = None;
    for operation in &content.operations {
        match operation.operator.as_str() {
            "Tf" => {
                current_encoding = operation
                    .operands
                    .first()
                    .and_then(|font| font.as_name().ok())
                    .and_then(|font| encodings.get(font));
            }
            "Tj" | "TJ" | "'" | "\"" => {
                let Some(encoding) = current_encoding else {
                    warn!(page = ?page_id, "text shown without a decodable font");
                    continue;
                };
                let mut item = String::new();
                collect_text(&mut item, encoding, &operation.operands)?;
                let item = item.trim();
                if !item.is_empty() {
                    items.push(item.to_string());
                }
            }
            _ => {}
        }
    }

    Ok(items)
}

/// Strings are decoded in order; inside a `TJ` array a wide negative kerning
/// adjustment becomes a space. The numeric operands of `"` are spacing, not text.
fn collect_text(text: &mut String, encoding: &Encoding, operands: &[Object]) -> Result<()> {
    for operand in operands {
        match operand {
            Object::String(bytes, _) => text.push_str(&Document::decode_text(encoding, bytes)?),
            Object::Array(parts) => {
                for part in parts {
                    match part {
                        Object::String(bytes, _) => {
                            text.push_str(&Document::decode_text(encoding, bytes)?)
                        }
                        Object::Integer(_) | Object::Real(_) => {
                            if part.as_float().is_ok_and(|k| k < KERNING_SPACE) {
                                text.push(' ');
                            }
                        }
                        _ => {}
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::Operation;
    use lopdf::{dictionary, Stream};

    /// One text block per item, one page per slice.
    fn build_pdf(page_texts: &[&[&str]]) -> Vec<u8> {
        let pages = page_texts
            .iter()
            .map(|items| {
                let mut operations = Vec::new();
                let mut y = 700;
                for item in items.iter() {
                    operations.push(Operation::new("BT", vec![]));
                    operations.push(Operation::new("Tf", vec!["F1".into(), 12.into()]));
                    operations.push(Operation::new("Td", vec![72.into(), y.into()]));
                    operations.push(Operation::new("Tj", vec![Object::string_literal(*item)]));
                    operations.push(Operation::new("ET", vec![]));
                    y -= 20;
                }
                operations
            })
            .collect();
        build_pdf_from(pages)
    }

    /// Minimal PDF with one Courier font `F1` and one content stream per page.
    fn build_pdf_from(pages: Vec<Vec<Operation>>) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids: Vec<Object> = Vec::new();
        for operations in pages {
            let content = Content { operations };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn pages_are_extracted_in_order() {
        let bytes = build_pdf(&[&["Alpha"], &["Beta"]]);
        let text = extract_text(&bytes).unwrap();

        let alpha = text.find("Alpha").expect("page 1 text");
        let beta = text.find("Beta").expect("page 2 text");
        assert!(alpha < beta);
        assert!(text.contains("\n\n"));
    }

    #[test]
    fn operators_in_one_text_block_are_space_joined() {
        let operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal("Hello")]),
            Operation::new("Td", vec![0.into(), (-20).into()]),
            Operation::new("Tj", vec![Object::string_literal("World")]),
            Operation::new("ET", vec![]),
        ];
        let bytes = build_pdf_from(vec![operations]);

        assert_eq!(extract_text(&bytes).unwrap(), "Hello World");
    }

    #[test]
    fn kerned_array_keeps_word_gaps() {
        let operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("I. MUC"),
                    (-250).into(),
                    Object::string_literal("TIEU"),
                    (-20).into(),
                    Object::string_literal("!"),
                ])],
            ),
            Operation::new("'", vec![Object::string_literal("  ")]),
            Operation::new(
                "\"",
                vec![(-200).into(), 0.into(), Object::string_literal("Hoc sinh")],
            ),
            Operation::new("ET", vec![]),
        ];
        let bytes = build_pdf_from(vec![operations]);

        assert_eq!(extract_text(&bytes).unwrap(), "I. MUC TIEU! Hoc sinh");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(extract_text(b"%PDF-garbage").is_err());
    }
}
