//! Sectioned prompt builder.
//!
//! A prompt is assembled from up to five optional sections, always emitted
//! in the same order:
//!
//! ```text
//! [ROLE]: who the assistant is
//! [CONTEXT]: background the model should assume
//! [EXAMPLES]: sample exchanges
//! [TASK]: the concrete request
//! [INSTRUCTIONS]: output constraints
//! ```
//!
//! Each non-empty section renders as `[NAME]\n<text>\n\n`. Empty sections are
//! skipped, so an empty builder yields an empty string.

use std::collections::HashMap;

use crate::config::PromptConfig;

/// Fluent builder for a sectioned prompt.
///
/// ```rust
/// use cocktail_sandbox::agent::prompt::PromptBuilder;
///
/// let prompt = PromptBuilder::new().task("Suggest a rum cocktail").build();
/// assert_eq!(prompt, "[TASK]\nSuggest a rum cocktail\n\n");
/// ```
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    role: String,
    context: String,
    examples: String,
    task: String,
    instructions: String,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder seeded with the sections of a chat's `[prompt]` table.
    pub fn from_config(config: &PromptConfig) -> Self {
        let mut b = Self::new();
        if let Some(role) = &config.role {
            b = b.role(role.as_str());
        }
        if let Some(context) = &config.context {
            b = b.context(context.as_str());
        }
        if let Some(examples) = &config.examples {
            b = b.examples(examples.as_str());
        }
        if let Some(instructions) = &config.instructions {
            b = b.instructions(instructions.as_str());
        }
        b
    }

    pub fn role(mut self, text: impl Into<String>) -> Self {
        self.role = text.into();
        self
    }

    pub fn context(mut self, text: impl Into<String>) -> Self {
        self.context = text.into();
        self
    }

    pub fn examples(mut self, text: impl Into<String>) -> Self {
        self.examples = text.into();
        self
    }

    pub fn task(mut self, text: impl Into<String>) -> Self {
        self.task = text.into();
        self
    }

    pub fn instructions(mut self, text: impl Into<String>) -> Self {
        self.instructions = text.into();
        self
    }

    pub fn build(&self) -> String {
        let sections = [
            ("ROLE", &self.role),
            ("CONTEXT", &self.context),
            ("EXAMPLES", &self.examples),
            ("TASK", &self.task),
            ("INSTRUCTIONS", &self.instructions),
        ];

        let mut out = String::new();
        for (name, text) in sections {
            if !text.is_empty() {
                out.push_str(&format!("[{name}]\n{text}\n\n"));
            }
        }
        out
    }
}

/// Substitute every `{{key}}` in `template` with its value from `vars`.
/// Unknown placeholders are left untouched. The template is scanned once,
/// so placeholders inside substituted values are not expanded.
pub fn render_template(template: &str, vars: &HashMap<&str, &str>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after[..end];
        match vars.get(key) {
            Some(value) => out.push_str(value),
            None => {
                out.push_str("{{");
                out.push_str(key);
                out.push_str("}}");
            }
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    out
}
