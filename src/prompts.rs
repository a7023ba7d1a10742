//! Prompt text for checklist-driven document review.
//!
//! Every prompt lives here so prompt regressions can be caught by unit tests
//! without a live model. Message assembly (which parts go where, image
//! handling) lives in [`crate::pipeline::request`].

use crate::catalog::ChecklistItem;

/// System prompt fixing the auditor role and the reply schema.
///
/// `{checklist_context}` is replaced by [`checklist_context`] (or nothing).
pub const REVIEW_SYSTEM_PROMPT: &str = r#"You are an expert document auditor and reviewer.
Your task is to review the provided document against standard best practices, any custom instructions, and strictly against the Target Checklist provided.
You must evaluate *every single item* in the target checklist.

CRITICAL INSTRUCTION FOR SUGGESTIONS:
For EVERY single checklist item that you mark as "Fail" or "Warning", you MUST provide a specific, actionable recommendation in the "suggestions" array on how to fix it. Do not group them. If 5 items fail, there must be at least 5 specific suggestions.

You must output a JSON object with the following structure:
{
    "checklist": [
        {"section": "<Section Name>", "item": "<Checklist Item>", "status": "<Pass/Fail/Warning>", "comment": "<Explanation>"}
    ],
    "suggestions": ["<Suggestion 1>", "<Suggestion 2>"],
    "rewritten_content": "<Optional: Rewritten sections or the entire document if requested>"
}

Ensure the tone is professional and constructive.
{checklist_context}"#;

/// Minimal prompt used to verify a connection before activating it.
pub const CONNECTION_TEST_PROMPT: &str = "Hello";

/// Render the target checklist block injected into the system prompt.
pub fn checklist_context(items: &[ChecklistItem]) -> String {
    let json = serde_json::to_string_pretty(items).unwrap_or_else(|_| "[]".to_string());
    format!("\nTarget Checklist exactly to follow:\n{json}")
}

/// Build the full system instruction; the checklist block is omitted when empty.
pub fn review_system_prompt(items: &[ChecklistItem]) -> String {
    let context = if items.is_empty() {
        String::new()
    } else {
        checklist_context(items)
    };
    REVIEW_SYSTEM_PROMPT.replace("{checklist_context}", &context)
}

/// Combine custom instructions with the document body.
pub fn review_user_text(custom_instructions: &str, document_text: &str) -> String {
    format!("Custom Instructions: {custom_instructions}\n\nDocument Content:\n{document_text}")
}
