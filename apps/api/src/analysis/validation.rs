//! Content Validator — heuristic check that text plausibly represents a resume.
//!
//! Advisory only: false positives and negatives are tolerated. The checks run
//! in a fixed order and the first failure determines the rejection reason, so
//! length always wins over keyword and pattern checks.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

pub const MIN_CONTENT_CHARS: usize = 100;
pub const MAX_CONTENT_CHARS: usize = 50_000;

/// Resume-domain terms; at least one must appear (case-insensitive).
const RESUME_KEYWORDS: &[&str] = &[
    "experience",
    "education",
    "skills",
    "work",
    "professional",
    "qualifications",
    "achievements",
    "responsibilities",
    "projects",
    "university",
    "college",
    "degree",
    "bachelor",
    "master",
    "employed",
    "developer",
    "engineer",
    "manager",
    "analyst",
    "resume",
    "cv",
    "curriculum",
    "profile",
    "objective",
    "summary",
];

/// Structural patterns that mark the text as something other than a resume:
/// HTML, JSON, XML, certificates, and source code.
const NON_RESUME_PATTERNS: &[&str] = &[
    r"(?i)^<!DOCTYPE html",
    r"(?i)<html",
    r#"^\{\s*".*":\s*\{"#,
    r"(?i)^<\?xml",
    r"(?i)BEGIN CERTIFICATE",
    r"(?m)^import\s+",
    r"(?m)^package\s+",
    r"(?m)^def\s+\w+\(",
    r"(?m)^function\s+\w+\(",
];

fn non_resume_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        NON_RESUME_PATTERNS
            .iter()
            .map(|p| Regex::new(p).expect("invalid built-in pattern"))
            .collect()
    })
}

/// Why a piece of text was rejected as resume content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ContentRejection {
    #[error("File content is too short. Please upload a proper resume with at least 100 characters.")]
    TooShort,

    #[error("File content is too long. Please upload a resume under 50,000 characters.")]
    TooLong,

    #[error("This doesn't appear to be a resume. Please upload a valid resume document containing professional experience, education, or skills.")]
    NotAResume,

    #[error("Invalid file type detected. Please upload a resume in PDF or TXT format, not code, HTML, or other document types.")]
    InvalidDocumentType,
}

/// Checks that `text` plausibly represents a resume.
pub fn validate_resume_content(text: &str) -> Result<(), ContentRejection> {
    if text.trim().chars().count() < MIN_CONTENT_CHARS {
        return Err(ContentRejection::TooShort);
    }

    if text.chars().count() > MAX_CONTENT_CHARS {
        return Err(ContentRejection::TooLong);
    }

    let lower = text.to_lowercase();
    if !RESUME_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Err(ContentRejection::NotAResume);
    }

    if non_resume_patterns().iter().any(|p| p.is_match(text)) {
        return Err(ContentRejection::InvalidDocumentType);
    }

    Ok(())
}
