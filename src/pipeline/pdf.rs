//! PDF extraction: embedded text per page, with an OCR fallback for sparse
//! (scanned) documents.
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is not safe to drive
//! from async contexts. All pdfium work (loading, text extraction,
//! rasterisation) runs inside one `spawn_blocking` call; only the OCR jobs,
//! which shell out, run on the async side.
//!
//! ## When does OCR kick in?
//!
//! When the text layer averages fewer than
//! [`crate::ReviewConfig::ocr_min_chars_per_page`] characters per page. Each
//! page is then rendered, OCR'd, and appended under a `--- Page N (OCR) ---`
//! marker after the embedded text.

use crate::config::ReviewConfig;
use crate::error::{DocReviewError, OcrError};
use crate::pipeline::encode::encode_png;
use crate::pipeline::ocr::{ocr_all, OcrEngine};
use pdfium_render::prelude::*;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the blocking stage hands back to the async side.
struct PdfText {
    text: String,
    page_count: usize,
    /// `(label, png)` per page, only when the OCR fallback triggered.
    ocr_pages: Vec<(String, Vec<u8>)>,
}

/// `true` when `chars` of embedded text is too sparse for `pages` pages.
pub fn needs_ocr(chars: usize, pages: usize, min_chars_per_page: usize) -> bool {
    chars < min_chars_per_page.saturating_mul(pages)
}

/// Marker placed before OCR output for a page (1-indexed).
pub fn page_marker(page_num: usize) -> String {
    format!("--- Page {page_num} (OCR) ---")
}

/// Extract text from PDF bytes, falling back to OCR for sparse documents.
pub async fn extract_pdf(
    filename: &str,
    bytes: Vec<u8>,
    config: &ReviewConfig,
    ocr: &Arc<dyn OcrEngine>,
) -> Result<String, DocReviewError> {
    let name = filename.to_string();
    let min_chars = config.ocr_min_chars_per_page;
    let max_pixels = config.render_max_pixels;
    let ocr_enabled = config.ocr_enabled;

    let extracted = tokio::task::spawn_blocking(move || {
        extract_blocking(&name, &bytes, min_chars, max_pixels, ocr_enabled)
    })
    .await
    .map_err(|e| DocReviewError::Internal(format!("PDF task panicked: {e}")))??;

    info!(
        "PDF '{}': {} pages, {} chars of embedded text",
        filename,
        extracted.page_count,
        extracted.text.chars().count()
    );

    let mut text = extracted.text;
    if !extracted.ocr_pages.is_empty() {
        for (label, page_text) in ocr_all(ocr, extracted.ocr_pages, config.ocr_concurrency).await {
            text.push_str(&format!("\n\n{label}\n{page_text}"));
        }
    }
    Ok(text)
}

/// Bind pdfium, honouring `PDFIUM_LIB_PATH` before the system library.
fn bind_pdfium() -> Result<Pdfium, DocReviewError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_system_library(),
    }
    .map_err(|e| DocReviewError::PdfiumBindingFailed(format!("{e:?}")))?;
    Ok(Pdfium::new(bindings))
}

/// Blocking implementation: load, read text layer, rasterise if sparse.
fn extract_blocking(
    filename: &str,
    bytes: &[u8],
    min_chars_per_page: usize,
    max_pixels: u32,
    ocr_enabled: bool,
) -> Result<PdfText, DocReviewError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|e| DocReviewError::extraction(filename, "PDF", format!("{e:?}")))?;

    let pages = document.pages();
    let page_count = pages.len() as usize;

    let mut text = String::new();
    let mut chars = 0usize;
    for (idx, page) in pages.iter().enumerate() {
        let page_text = page
            .text()
            .map_err(|e| {
                DocReviewError::extraction(filename, "PDF", format!("page {}: {e:?}", idx + 1))
            })?
            .all();
        chars += page_text.trim().chars().count();
        text.push_str(&page_text);
        text.push('\n');
    }

    if !needs_ocr(chars, page_count, min_chars_per_page) {
        return Ok(PdfText {
            text,
            page_count,
            ocr_pages: Vec::new(),
        });
    }

    info!(
        "PDF '{}' looks scanned ({} chars over {} pages), running OCR fallback",
        filename, chars, page_count
    );
    if !ocr_enabled {
        debug!("OCR disabled; keeping sparse text layer");
        return Ok(PdfText {
            text,
            page_count,
            ocr_pages: Vec::new(),
        });
    }

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut ocr_pages = Vec::with_capacity(page_count);
    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;
        match render_page(&page, &render_config, page_num) {
            Ok(png) => ocr_pages.push((page_marker(page_num), png)),
            Err(e) => warn!("{}", e),
        }
    }

    Ok(PdfText {
        text,
        page_count,
        ocr_pages,
    })
}

fn render_page(
    page: &PdfPage,
    render_config: &PdfRenderConfig,
    page_num: usize,
) -> Result<Vec<u8>, OcrError> {
    let bitmap = page
        .render_with_config(render_config)
        .map_err(|e| OcrError::Render {
            page: page_num,
            detail: format!("{e:?}"),
        })?;
    let image = bitmap.as_image();
    debug!(
        "Rendered page {} → {}x{} px",
        page_num,
        image.width(),
        image.height()
    );
    encode_png(&image).map_err(|e| OcrError::Render {
        page: page_num,
        detail: e.to_string(),
    })
}
