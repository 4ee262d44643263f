// Upload pipeline
// Multipart PDF in, plain text out, then straight into the skill engine.

pub mod handlers;
pub mod pdf;

pub use pdf::{PdfTextExtractor, TextExtractor};
