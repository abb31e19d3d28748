//! Prompt construction for resume analysis.
//!
//! The template is a fixed instruction string; cardinality constraints in it
//! are advisory to the model and never enforced on the parsed result.

/// System prompt used by backends that support a system role.
pub const ANALYZER_SYSTEM_PROMPT: &str =
    "You are a professional resume analyzer. Always respond ONLY with valid JSON.";

const ANALYZE_PROMPT_TEMPLATE: &str = r#"Analyze the following resume and provide a structured JSON response with EXACTLY these fields:
1. "skills": (array of technical & professional skills) minimum 5 and max 15
2. "summary": (2-3 sentence professional summary)
3. "suggested_roles": (array of 3-5 ideal matching job roles)

Resume Text:
{resume_text}

IMPORTANT:
- Respond ONLY with valid JSON.
- No markdown, no code blocks, no comments, no explanation."#;

/// Embeds the resume text into the analysis instruction template.
pub fn build_prompt(resume_text: &str) -> String {
    ANALYZE_PROMPT_TEMPLATE.replace("{resume_text}", resume_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_resume_text() {
        let prompt = build_prompt("Senior engineer, ten years of Rust.");
        assert!(prompt.contains("Senior engineer, ten years of Rust."));
        assert!(!prompt.contains("{resume_text}"));
    }

    #[test]
    fn test_prompt_names_all_three_fields() {
        let prompt = build_prompt("x");
        assert!(prompt.contains("\"skills\""));
        assert!(prompt.contains("\"summary\""));
        assert!(prompt.contains("\"suggested_roles\""));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        assert_eq!(build_prompt("same input"), build_prompt("same input"));
    }
}
