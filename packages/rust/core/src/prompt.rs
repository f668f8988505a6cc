//! Prompt assembly for Brick extraction.
//!
//! The system instruction pins the model to a single JSON object of the form
//! `{"bricks": [{"id", "name", "prerequisites"}]}` and shows one worked
//! example. The user instruction carries the retrieval context and the
//! operation verbatim. Nothing here validates or retries.

use brickmapper_shared::PromptMessages;

/// Fixed extraction instructions, shared by every row.
pub const SYSTEM_PROMPT: &str = r#"You are a strict Data Extraction Engine for CATIA automation.
Your job is to identify the 'Brick ID', 'Brick Name', and 'Prerequisite IDs' required for the user's operation.

**RULES:**
1. **Multiple Bricks:** An operation may need more than one Brick. If the operation implies a sequence, list ALL required bricks, each with its own id, name and prerequisites.
2. **Strict JSON:** Return ONLY a single JSON object with exactly one key, "bricks", holding an array of objects with the keys "id", "name" and "prerequisites". Do not write anything before or after the JSON object.
3. **Prerequisites:** Extract ONLY the ID codes (e.g., KW-1, S-5), separated by commas. DO NOT include names or descriptions.
4. **No Hallucinations:** If information is missing, use '-'. Never invent an ID or a name.

**FEW-SHOT EXAMPLE:**
User: 'Launch Catia and then check if window is responsive'
Context: '...Brick KW-1 (Launch Catia) requires nothing... Brick S-5 (Check Responsive) requires KW-1...'
Output:
{
  "bricks": [
    {"id": "KW-1", "name": "Launch Catia", "prerequisites": "-"},
    {"id": "S-5", "name": "Check Responsive", "prerequisites": "KW-1"}
  ]
}
"#;

/// Combine formatted context and the operation description into the prompt pair.
pub fn build_prompt(context: &str, question: &str) -> PromptMessages {
    PromptMessages {
        system: SYSTEM_PROMPT,
        user: format!("**Retrieval Context:**\n{context}\n\n**Target Operation:**\n{question}"),
    }
}
