//! Pipeline stages for document review.
//!
//! Each submodule implements one step. Extraction stages never touch the
//! network; the model round-trip is confined to [`llm`].
//!
//! ## Data Flow
//!
//! ```text
//! (filename, bytes) ──▶ extract ──▶ request ──▶ llm ──▶ parse ──▶ score
//!                        │ pdf       (prompts)   (1 call) (tolerant) (0-100)
//!                        │ docx
//!                        │ sheet
//!                        └ ocr (fallback)
//! ```
//!
//! 1. [`extract`] dispatches on the file extension to [`pdf`], [`docx`],
//!    [`sheet`] or plain UTF-8 decoding; [`ocr`] fills in scanned pages and
//!    embedded images
//! 2. [`request`] builds the system + user messages, attaching images only
//!    for vision-capable models
//! 3. [`llm`] performs the single model call and degrades on failure
//! 4. [`parse`] coerces the reply into checklist items; [`score`] rates them

pub mod docx;
pub mod encode;
pub mod extract;
pub mod llm;
pub mod ocr;
pub mod parse;
pub mod pdf;
pub mod request;
pub mod score;
pub mod sheet;
