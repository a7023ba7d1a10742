//! DOCX extraction: paragraph text plus OCR of embedded images.
//!
//! A DOCX file is a ZIP archive. Relevant parts:
//! - `word/document.xml`: body paragraphs (`w:p`) made of runs with `w:t` text
//! - `word/_rels/document.xml.rels`: relationship targets, including images
//!   stored under `word/media/`

use crate::config::ReviewConfig;
use crate::error::DocReviewError;
use crate::pipeline::encode::to_base64;
use crate::pipeline::ocr::{ocr_all, OcrEngine};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::sync::Arc;
use tracing::{debug, info};
use zip::ZipArchive;

const IMAGE_REL_SUFFIX: &str = "/relationships/image";

/// An image part referenced from the document relationships.
#[derive(Debug, Clone)]
pub struct EmbeddedImage {
    /// Archive path relative to `word/`, e.g. `media/image1.png`.
    pub name: String,
    pub bytes: Vec<u8>,
}

/// Paragraph text and embedded images of a DOCX package.
#[derive(Debug, Clone, Default)]
pub struct DocxContent {
    pub text: String,
    pub images: Vec<EmbeddedImage>,
}

/// Marker placed before OCR output for an embedded image.
pub fn image_marker(name: &str) -> String {
    format!("--- Embedded image: {name} (OCR) ---")
}

/// Extract text (and OCR'd image text) from DOCX bytes.
///
/// Returns the text and, when `keep_embedded_images` is set, the images
/// base64-encoded.
pub async fn extract_docx(
    filename: &str,
    bytes: Vec<u8>,
    config: &ReviewConfig,
    ocr: &Arc<dyn OcrEngine>,
) -> Result<(String, Vec<String>), DocReviewError> {
    let name = filename.to_string();
    let content = tokio::task::spawn_blocking(move || read_docx(&bytes))
        .await
        .map_err(|e| DocReviewError::Internal(format!("DOCX task panicked: {e}")))?
        .map_err(|e| DocReviewError::extraction(name, "DOCX", e))?;

    info!(
        "DOCX '{}': {} chars, {} embedded images",
        filename,
        content.text.chars().count(),
        content.images.len()
    );

    let kept = if config.keep_embedded_images {
        content.images.iter().map(|img| to_base64(&img.bytes)).collect()
    } else {
        Vec::new()
    };

    let mut text = content.text;
    if config.ocr_enabled && !content.images.is_empty() {
        let jobs: Vec<(String, Vec<u8>)> = content
            .images
            .into_iter()
            .map(|img| (image_marker(&img.name), img.bytes))
            .collect();
        for (label, image_text) in ocr_all(ocr, jobs, config.ocr_concurrency).await {
            text.push_str(&format!("\n\n{label}\n{image_text}"));
        }
    } else if !content.images.is_empty() {
        debug!("OCR disabled; skipping {} embedded image(s)", content.images.len());
    }

    Ok((text, kept))
}

/// Parse a DOCX package held in memory.
pub fn read_docx(bytes: &[u8]) -> Result<DocxContent, DocxError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;

    let document_xml = read_part(&mut archive, "word/document.xml")?
        .ok_or(DocxError::MissingPart("word/document.xml"))?;
    let text = paragraphs_text(&document_xml)?;

    let mut images = Vec::new();
    if let Some(rels_xml) = read_part(&mut archive, "word/_rels/document.xml.rels")? {
        for target in image_targets(&rels_xml)? {
            let path = resolve_target(&target);
            match read_binary_part(&mut archive, &path)? {
                Some(bytes) => images.push(EmbeddedImage {
                    name: path.trim_start_matches("word/").to_string(),
                    bytes,
                }),
                None => debug!("Image relationship target '{}' missing from archive", path),
            }
        }
    }

    Ok(DocxContent { text, images })
}

/// Structural failures while reading a DOCX package.
#[derive(Debug, thiserror::Error)]
pub enum DocxError {
    #[error("not a valid DOCX (ZIP) archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("missing required part '{0}'")]
    MissingPart(&'static str),

    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("I/O error reading archive: {0}")]
    Io(#[from] std::io::Error),
}

fn read_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<String>, DocxError> {
    let Some(bytes) = read_binary_part(archive, name)? else {
        return Ok(None);
    };
    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

fn read_binary_part(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> Result<Option<Vec<u8>>, DocxError> {
    let mut file = match archive.by_name(name) {
        Ok(f) => f,
        Err(zip::result::ZipError::FileNotFound) => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(Some(buf))
}

/// Relationship targets are relative to `word/` unless absolute.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("word/{}", target.trim_start_matches("./")),
    }
}

/// Walk `document.xml`, emitting one line per `w:p`.
fn paragraphs_text(xml: &str) -> Result<String, DocxError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_text = false;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_text = true,
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:tab" => current.push('\t'),
                b"w:br" | b"w:cr" => current.push('\n'),
                b"w:p" => paragraphs.push(String::new()),
                _ => {}
            },
            Event::Text(t) if in_text => current.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(paragraphs.join("\n"))
}

/// Targets of all internal image relationships, in document order.
fn image_targets(rels_xml: &str) -> Result<Vec<String>, DocxError> {
    let mut reader = Reader::from_str(rels_xml);
    reader.trim_text(true);

    let mut targets = Vec::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"Relationship" => {
                let mut rel_type = None;
                let mut target = None;
                let mut external = false;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Type" => rel_type = Some(value),
                        b"Target" => target = Some(value),
                        b"TargetMode" => external = value.eq_ignore_ascii_case("External"),
                        _ => {}
                    }
                }
                if let (Some(t), Some(target)) = (rel_type, target) {
                    if t.ends_with(IMAGE_REL_SUFFIX) && !external {
                        targets.push(target);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Project </w:t></w:r><w:r><w:t>Charter</w:t></w:r></w:p>
    <w:p/>
    <w:p><w:r><w:t>Owner</w:t><w:tab/><w:t>R&amp;D</w:t></w:r></w:p>
    <w:p><w:r><w:t>line one</w:t><w:br/><w:t>line two</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

    const RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
  <Relationship Id="rId5" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
  <Relationship Id="rId6" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="https://example.com/logo.png" TargetMode="External"/>
</Relationships>"#;

    #[test]
    fn paragraphs_joined_by_newline() {
        let text = paragraphs_text(DOC).unwrap();
        assert_eq!(
            text,
            "Project Charter\n\nOwner\tR&D\nline one\nline two"
        );
    }

    #[test]
    fn only_internal_image_relationships() {
        assert_eq!(image_targets(RELS).unwrap(), vec!["media/image1.png"]);
    }

    #[test]
    fn targets_resolve_under_word() {
        assert_eq!(resolve_target("media/image1.png"), "word/media/image1.png");
        assert_eq!(resolve_target("/word/media/a.png"), "word/media/a.png");
    }

    #[test]
    fn garbage_is_a_zip_error() {
        let err = read_docx(b"definitely not a zip").unwrap_err();
        assert!(matches!(err, DocxError::Zip(_)), "got: {err}");
    }
}
