//! Image encoding helpers.
//!
//! Two directions: rasterised PDF pages go `DynamicImage` → PNG bytes for
//! the OCR engine, and caller-supplied base64 blobs go → [`ImageData`] with a
//! sniffed MIME type for the model request. PNG is used for OCR input because
//! it is lossless; JPEG artefacts around glyphs hurt recognition.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page as PNG bytes.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!(
        "Encoded {}x{} image → {} PNG bytes",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}

/// Base64-encode raw image bytes.
pub fn to_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Turn a caller-supplied image (raw base64 or a `data:` URI) into [`ImageData`].
///
/// An explicit `data:` MIME type wins; otherwise the type is sniffed from the
/// base64 magic prefix and defaults to JPEG.
pub fn image_from_base64(input: &str) -> ImageData {
    let input = input.trim();
    if let Some(rest) = input.strip_prefix("data:") {
        if let Some((meta, payload)) = rest.split_once(',') {
            let mime = meta
                .split(';')
                .next()
                .filter(|m| m.starts_with("image/"))
                .map(str::to_string)
                .unwrap_or_else(|| sniff_mime(payload).to_string());
            return ImageData::new(payload, mime);
        }
    }
    ImageData::new(input, sniff_mime(input))
}

/// Guess an image MIME type from the first characters of its base64 form.
pub fn sniff_mime(b64: &str) -> &'static str {
    if b64.starts_with("iVBORw0KGgo") {
        "image/png"
    } else if b64.starts_with("/9j/") {
        "image/jpeg"
    } else if b64.starts_with("R0lGOD") {
        "image/gif"
    } else if b64.starts_with("UklGR") {
        "image/webp"
    } else {
        "image/jpeg"
    }
}
