//! Outbound prompt construction

use promptlift_context::ProjectContext;

/// System prompt sent with every enhancement call
pub const ENHANCEMENT_SYSTEM_PROMPT: &str = "\
You rewrite short instructions for an AI coding assistant into detailed, \
actionable prompts.

Keep the user's intent and scope. Make the task explicit: name the files, \
components and technologies involved when the project context identifies \
them, state acceptance criteria, and list constraints such as existing \
conventions, tests to update and edge cases to handle. Do not invent project \
details that the context does not support. Do not perform the task yourself.

Reply with the enhanced prompt only, without preamble.";

/// Prompt sent downstream: the context block followed by the original text.
///
/// Without context the original prompt is returned unchanged.
#[must_use]
pub fn render_outbound_prompt(context: Option<&ProjectContext>, original: &str) -> String {
    match context {
        Some(context) => {
            let mut rendered =
                String::with_capacity(context.rendered_context_text.len() + original.len());
            rendered.push_str(&context.rendered_context_text);
            rendered.push_str(original);
            rendered
        }
        None => original.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptlift_analyzers::{AnalysisRecord, TechStack};

    #[test]
    fn test_without_context_prompt_is_unchanged() {
        assert_eq!(render_outbound_prompt(None, "fix bug"), "fix bug");
    }

    #[test]
    fn test_context_precedes_prompt() {
        let context = ProjectContext::from_records(
            vec![AnalysisRecord::TechStack(TechStack {
                frameworks: vec!["react".to_string()],
                ..TechStack::default()
            })],
            4096,
        );

        let rendered = render_outbound_prompt(Some(&context), "optimize query");

        assert!(rendered.starts_with("# Project Context"));
        assert!(rendered.ends_with("---\n\noptimize query"));
        assert!(rendered.contains("react"));
    }
}
