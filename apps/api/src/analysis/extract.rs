//! Text Extractor — converts an uploaded document into plain text.
//!
//! Pure functions over bytes; the transient upload file itself is owned and
//! cleaned up by the caller.

use docx_rs::{read_docx, DocumentChild, ParagraphChild, RunChild};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("PDF parsing error: {0}")]
    Pdf(String),

    #[error("TXT parsing error: {0}")]
    Txt(String),

    #[error("DOCX parsing error: {0}")]
    Docx(String),
}

/// Supported upload formats. Uploaded `.doc` files are routed through the
/// DOCX path, matching the accepted MIME set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Txt,
    Docx,
}

impl FileKind {
    /// Tag persisted on the record's `file_type` column.
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Txt => "txt",
            FileKind::Docx => "docx",
        }
    }

    /// Maps a declared MIME type to the extraction path.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime {
            "application/pdf" => Some(FileKind::Pdf),
            "text/plain" => Some(FileKind::Txt),
            "application/msword"
            | "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(FileKind::Docx)
            }
            _ => None,
        }
    }
}

/// Extracts plain text from `bytes` according to the declared `kind`.
/// An unparsable byte stream is a caller error (400-class); never retried.
pub fn extract_text(bytes: &[u8], kind: FileKind) -> Result<String, ExtractionError> {
    match kind {
        FileKind::Pdf => extract_pdf(bytes),
        FileKind::Txt => extract_txt(bytes),
        FileKind::Docx => extract_docx(bytes),
    }
}

/// Concatenates all page text in document order.
fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractionError::Pdf(e.to_string()))
}

/// Decodes the bytes as UTF-8 verbatim.
fn extract_txt(bytes: &[u8]) -> Result<String, ExtractionError> {
    String::from_utf8(bytes.to_vec()).map_err(|e| ExtractionError::Txt(e.to_string()))
}

/// Collects raw paragraph run text, one paragraph per line, discarding
/// formatting.
fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let docx = read_docx(bytes).map_err(|e| ExtractionError::Docx(e.to_string()))?;

    let mut paragraphs: Vec<String> = Vec::new();
    for child in docx.document.children.iter() {
        if let DocumentChild::Paragraph(para) = child {
            let para_text: String = para
                .children
                .iter()
                .filter_map(|pc| {
                    if let ParagraphChild::Run(run) = pc {
                        Some(
                            run.children
                                .iter()
                                .filter_map(|rc| {
                                    if let RunChild::Text(t) = rc {
                                        Some(t.text.clone())
                                    } else {
                                        None
                                    }
                                })
                                .collect::<Vec<_>>()
                                .join(""),
                        )
                    } else {
                        None
                    }
                })
                .collect::<Vec<_>>()
                .join("");

            if !para_text.is_empty() {
                paragraphs.push(para_text);
            }
        }
    }

    Ok(paragraphs.join("\n"))
}
