//! Document text extraction. Bytes in, text out; never fails.
//!
//! PDF parsing is CPU-bound and `pdf-extract` can panic on hostile input, so it
//! runs inside `tokio::task::spawn_blocking` where a panic becomes a `JoinError`.

use bytes::Bytes;
use tracing::{debug, warn};

const PDF_MAGIC: &[u8] = b"%PDF";

/// Extracts readable text from an uploaded résumé.
///
/// PDFs go through `pdf-extract`; any other valid UTF-8 payload is taken as
/// plain text. Empty, malformed, or binary input yields an empty string.
pub async fn extract_text(bytes: Bytes) -> String {
    if bytes.is_empty() {
        return String::new();
    }

    let raw = if bytes.starts_with(PDF_MAGIC) {
        extract_pdf_text(bytes).await
    } else {
        match std::str::from_utf8(&bytes) {
            Ok(text) => text.to_string(),
            Err(e) => {
                warn!("Uploaded document is neither PDF nor UTF-8 text: {e}");
                String::new()
            }
        }
    };

    normalize_text(&raw)
}

async fn extract_pdf_text(bytes: Bytes) -> String {
    let size = bytes.len();
    match tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes)).await {
        Ok(Ok(text)) => {
            debug!(size, chars = text.len(), "PDF text extracted");
            text
        }
        Ok(Err(e)) => {
            warn!("Failed to parse PDF ({size} bytes): {e}");
            String::new()
        }
        Err(e) => {
            warn!("PDF extraction aborted ({size} bytes): {e}");
            String::new()
        }
    }
}

/// Trims every line and collapses runs of blank lines into a single one.
pub fn normalize_text(raw: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut blank_streak = 0;
    for line in raw.lines().map(str::trim) {
        if line.is_empty() {
            blank_streak += 1;
            if blank_streak == 1 {
                out.push("");
            }
        } else {
            blank_streak = 0;
            out.push(line);
        }
    }
    out.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_bytes_yield_empty_text() {
        assert_eq!(extract_text(Bytes::new()).await, "");
    }

    #[tokio::test]
    async fn test_plain_text_is_normalized() {
        let input = Bytes::from_static(b"  Jane Doe  \r\n\r\n\r\n\r\nSkills: Rust, Go\n\n");
        assert_eq!(extract_text(input).await, "Jane Doe\n\nSkills: Rust, Go");
    }

    #[tokio::test]
    async fn test_malformed_pdf_yields_empty_text() {
        let input = Bytes::from_static(b"%PDF-1.7\nthis is not a real pdf body");
        assert_eq!(extract_text(input).await, "");
    }

    #[tokio::test]
    async fn test_binary_garbage_yields_empty_text() {
        let input = Bytes::from_static(&[0xff, 0xfe, 0x00, 0x9f, 0x92]);
        assert_eq!(extract_text(input).await, "");
    }

    #[test]
    fn test_normalize_keeps_single_paragraph_breaks() {
        assert_eq!(normalize_text("a\n\nb\n \n \nc"), "a\n\nb\n\nc");
    }
}
