//! Extraction integration tests.
//!
//! DOCX and XLSX fixtures are assembled in memory with `zip::ZipWriter`; OCR
//! is a scripted engine so no `tesseract` install is needed.

use async_trait::async_trait;
use edgequake_docreview::{
    DocReviewError, Extractor, OcrEngine, OcrError, ReviewConfig,
};
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Returns a fixed string for every image and counts calls.
struct ScriptedOcr {
    text: &'static str,
    calls: AtomicUsize,
}

impl ScriptedOcr {
    fn new(text: &'static str) -> Arc<Self> {
        Arc::new(Self {
            text,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl OcrEngine for ScriptedOcr {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn recognize(&self, _image: &[u8]) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.text.to_string())
    }
}

/// Always reports the toolchain as missing.
struct MissingOcr;

#[async_trait]
impl OcrEngine for MissingOcr {
    fn name(&self) -> &str {
        "missing"
    }

    async fn recognize(&self, _image: &[u8]) -> Result<String, OcrError> {
        Err(OcrError::Unavailable {
            engine: "tesseract".into(),
            detail: "No such file or directory".into(),
        })
    }
}

const DOCUMENT_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:r><w:t>Project Charter</w:t></w:r></w:p>
    <w:p><w:r><w:t xml:space="preserve">Sponsor: </w:t></w:r><w:r><w:t>Finance</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

const RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image1.png"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/image2.jpeg"/>
</Relationships>"#;

fn build_docx(with_images: bool) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    zip.start_file("word/document.xml", options).unwrap();
    zip.write_all(DOCUMENT_XML.as_bytes()).unwrap();

    if with_images {
        zip.start_file("word/_rels/document.xml.rels", options).unwrap();
        zip.write_all(RELS_XML.as_bytes()).unwrap();
        zip.start_file("word/media/image1.png", options).unwrap();
        zip.write_all(b"\x89PNG fake").unwrap();
        zip.start_file("word/media/image2.jpeg", options).unwrap();
        zip.write_all(b"\xff\xd8\xff fake").unwrap();
    }

    zip.finish().unwrap().into_inner()
}

const WORKBOOK_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets>
    <sheet name="Budget" sheetId="1" r:id="rId1"/>
    <sheet name="Risks" sheetId="2" r:id="rId2"/>
  </sheets>
</workbook>"#;

const WORKBOOK_RELS_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/>
</Relationships>"#;

const CONTENT_TYPES_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
  <Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
  <Override PartName="/xl/worksheets/sheet2.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

/// Row 2 is left out on purpose: the sheet range spans it as an empty row.
const BUDGET_SHEET_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1"><c r="A1" t="inlineStr"><is><t>Item</t></is></c><c r="B1"><v>42</v></c></row>
    <row r="3"><c r="A3" t="inlineStr"><is><t>Travel</t></is></c><c r="B3"><v>7</v></c></row>
  </sheetData>
</worksheet>"#;

const RISKS_SHEET_XML: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <sheetData>
    <row r="1"><c r="A1" t="inlineStr"><is><t>Late</t></is></c></row>
  </sheetData>
</worksheet>"#;

fn build_xlsx() -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (path, body) in [
        ("[Content_Types].xml", CONTENT_TYPES_XML),
        ("xl/workbook.xml", WORKBOOK_XML),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML),
        ("xl/worksheets/sheet1.xml", BUDGET_SHEET_XML),
        ("xl/worksheets/sheet2.xml", RISKS_SHEET_XML),
    ] {
        zip.start_file(path, options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn extractor(ocr: Arc<dyn OcrEngine>) -> Extractor {
    Extractor::with_ocr(ReviewConfig::default(), ocr)
}

// ── DOCX ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn docx_paragraphs_without_images() {
    let ocr = ScriptedOcr::new("unused");
    let doc = extractor(ocr.clone())
        .extract("charter.docx", build_docx(false))
        .await
        .expect("docx should extract");

    assert_eq!(doc.text, "Project Charter\nSponsor: Finance");
    assert!(doc.images.is_empty());
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn docx_embedded_images_are_ocrd_under_markers() {
    let ocr = ScriptedOcr::new("Org chart: PMO");
    let doc = extractor(ocr.clone())
        .extract("charter.docx", build_docx(true))
        .await
        .unwrap();

    assert!(doc.text.starts_with("Project Charter\nSponsor: Finance"));
    assert!(doc
        .text
        .contains("--- Embedded image: media/image1.png (OCR) ---\nOrg chart: PMO"));
    assert!(doc
        .text
        .contains("--- Embedded image: media/image2.jpeg (OCR) ---\nOrg chart: PMO"));
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 2);
    assert!(doc.images.is_empty(), "images are only kept on request");
}

#[tokio::test]
async fn docx_images_kept_when_configured() {
    let config = ReviewConfig::builder()
        .keep_embedded_images(true)
        .build()
        .unwrap();
    let doc = Extractor::with_ocr(config, ScriptedOcr::new(""))
        .extract("charter.docx", build_docx(true))
        .await
        .unwrap();

    assert_eq!(doc.images.len(), 2);
    // Empty OCR output adds no marker.
    assert!(!doc.text.contains("Embedded image"));
}

#[tokio::test]
async fn missing_ocr_toolchain_is_not_fatal() {
    let doc = extractor(Arc::new(MissingOcr))
        .extract("charter.docx", build_docx(true))
        .await
        .expect("OCR failure must not fail extraction");
    assert_eq!(doc.text, "Project Charter\nSponsor: Finance");
}

#[tokio::test]
async fn docx_images_skip_ocr_when_disabled() {
    let config = ReviewConfig::builder().ocr_enabled(false).build().unwrap();
    let ocr = ScriptedOcr::new("should not run");
    let doc = Extractor::with_ocr(config, ocr.clone())
        .extract("charter.docx", build_docx(true))
        .await
        .unwrap();

    assert_eq!(doc.text, "Project Charter\nSponsor: Finance");
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn corrupt_docx_is_an_extraction_error() {
    let err = extractor(Arc::new(MissingOcr))
        .extract("broken.docx", b"PK\x03\x04 truncated".to_vec())
        .await
        .unwrap_err();
    match err {
        DocReviewError::Extraction {
            filename, format, ..
        } => {
            assert_eq!(filename, "broken.docx");
            assert_eq!(format, "DOCX");
        }
        other => panic!("unexpected error: {other}"),
    }
}

// ── Text and tabular ─────────────────────────────────────────────────────────

#[tokio::test]
async fn plain_text_round_trips_bytes() {
    let original = "Résumé - naïve café\n第二行\n".as_bytes().to_vec();
    let doc = extractor(Arc::new(MissingOcr))
        .extract("notes.txt", original.clone())
        .await
        .unwrap();
    assert_eq!(doc.text.into_bytes(), original);
}

#[tokio::test]
async fn csv_is_rendered_as_delimited_text() {
    let doc = extractor(Arc::new(MissingOcr))
        .extract("budget.CSV", b"Line,Amount\nTravel,1200\n,\nHardware,800\n".to_vec())
        .await
        .unwrap();
    assert!(doc.text.starts_with("Line,Amount\nTravel,1200\n"));
    assert!(doc.text.contains("Hardware,800"));
    assert!(!doc.text.contains("--- Sheet:"));
}

#[tokio::test]
async fn every_workbook_sheet_is_labelled_and_empty_rows_skipped() {
    let doc = extractor(Arc::new(MissingOcr))
        .extract("plan.xlsx", build_xlsx())
        .await
        .expect("workbook should extract");

    let budget = doc
        .text
        .find("--- Sheet: Budget ---\nItem,42\nTravel,7\n")
        .expect("budget sheet rows in order, empty row dropped");
    let risks = doc
        .text
        .find("--- Sheet: Risks ---\nLate")
        .expect("second sheet is extracted too");
    assert!(budget < risks, "sheets keep workbook order");
    assert!(!doc.text.lines().any(|l| !l.is_empty() && l.chars().all(|c| c == ',')));
}

#[tokio::test]
async fn unsupported_extension_is_rejected_before_reading() {
    let ocr = ScriptedOcr::new("unused");
    let err = extractor(ocr.clone())
        .extract("installer.exe", vec![0u8; 4])
        .await
        .unwrap_err();
    assert!(matches!(err, DocReviewError::UnsupportedFileType { .. }));
    assert!(err.is_client_error());
    assert_eq!(ocr.calls.load(Ordering::SeqCst), 0);
}
