//! Prompt file helpers.

/// System prompt for canvas phase 1: code-only generation.
pub const CANVAS_CODE_PROMPT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/canvas_code_prompt.md"
));

/// System prompt for canvas phase 2: explaining the generated code.
pub const CANVAS_EXPLAIN_PROMPT: &str = include_str!(concat!(
    env!("CARGO_MANIFEST_DIR"),
    "/prompts/canvas_explain_prompt.md"
));
