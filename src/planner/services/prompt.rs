//! Prompt and payload construction for oracle calls.

use crate::planner::domain::{PlannerSettings, RepositoryContext};
use minijinja::Environment;
use serde_json::{Map, Value, json};

use super::planner::PlannerError;

const PROMPT_TEMPLATE: &str = r#"You maintain the repository {{ repository }}.
{% if description %}Description: {{ description }}
{% endif %}Primary language: {{ language }}

Instruction: {{ instruction }}

The attached JSON payload lists the repository tree, recent commit messages and the content of selected files. File content may be truncated.

Answer with one JSON object and nothing else, using exactly this shape:
{"plan": "step-by-step plan", "changes": [{"filePath": "path/in/repo", "action": "create | update | delete", "reason": "why this file changes", "modifiedContent": "complete new file content"}], "commitMessage": "concise commit message", "risk": "low | medium | high", "explanation": "what the change achieves"}

Rules:
- modifiedContent is the complete file and is required for create and update.
- update and delete may only target files listed in the tree.
- List each file at most once.
- Only propose changes that are worth committing."#;

/// Renders the oracle prompt for an instruction.
pub(super) fn render_prompt(
    instruction: &str,
    context: &RepositoryContext,
) -> Result<String, PlannerError> {
    let environment = Environment::new();
    let mut template_context = Map::new();
    template_context.insert(
        "repository".to_owned(),
        Value::String(context.full_name.as_str().to_owned()),
    );
    template_context.insert(
        "description".to_owned(),
        context
            .description
            .as_ref()
            .map_or(Value::Null, |text| Value::String(text.clone())),
    );
    template_context.insert(
        "language".to_owned(),
        Value::String(context.primary_language().to_owned()),
    );
    template_context.insert(
        "instruction".to_owned(),
        Value::String(instruction.to_owned()),
    );

    environment
        .render_str(PROMPT_TEMPLATE, template_context)
        .map_err(|error| PlannerError::Template(error.to_string()))
}

/// Builds the bounded context payload.
pub(super) fn build_payload(context: &RepositoryContext, settings: &PlannerSettings) -> Value {
    let tree: Vec<&str> = context
        .tree
        .iter()
        .take(settings.tree_prompt_limit)
        .map(|entry| entry.path.as_str())
        .collect();
    let commits: Vec<&str> = context
        .recent_commits
        .iter()
        .map(|commit| commit.message.as_str())
        .collect();
    let files: Vec<Value> = context
        .candidate_files
        .iter()
        .map(|file| {
            let content = truncate_to_budget(&file.content, settings.file_byte_budget);
            json!({
                "path": file.path,
                "content": content,
                "truncated": content.len() < file.content.len(),
            })
        })
        .collect();

    json!({
        "repository": context.full_name.as_str(),
        "description": context.description,
        "language": context.primary_language(),
        "tree": tree,
        "recentCommits": commits,
        "files": files,
    })
}

/// Returns the longest prefix of `content` within `budget` bytes that ends
/// on a character boundary.
///
/// ```
/// use repo_autopilot::planner::services::truncate_to_budget;
///
/// assert_eq!(truncate_to_budget("héllo", 2), "h");
/// assert_eq!(truncate_to_budget("abc", 10), "abc");
/// ```
#[must_use]
pub fn truncate_to_budget(content: &str, budget: usize) -> &str {
    let mut end = budget.min(content.len());
    while !content.is_char_boundary(end) {
        end = end.saturating_sub(1);
    }
    content.get(..end).unwrap_or_default()
}
