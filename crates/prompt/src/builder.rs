//! Prompt rendering.

use crate::types::{BuiltPrompt, PromptDefinition};
use ragomatic_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Render a prompt definition with input variables.
///
/// Both the system and the user template are rendered with the same
/// variables. Missing variables render as empty strings.
///
/// # Example
/// ```no_run
/// use ragomatic_prompt::{build_prompt, load_prompt};
/// use std::collections::HashMap;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let def = load_prompt(Path::new("."), "answer.plain")?;
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "How do I price?".to_string());
/// let built = build_prompt(&def, vars)?;
/// println!("{}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let user = render_template(&definition.template, &variables)?;
    let system = definition
        .system
        .as_deref()
        .map(|template| render_template(template, &variables))
        .transpose()?
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Ok(BuiltPrompt::new(
        system,
        user.trim().to_string(),
        definition.id.clone(),
        variables,
    ))
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Prompts are plain text, not HTML
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PromptBehavior, PromptOutputSpec};

    fn definition(template: &str, system: Option<&str>) -> PromptDefinition {
        PromptDefinition {
            id: "test.prompt".to_string(),
            title: "Test".to_string(),
            api_version: "1.0".to_string(),
            created_by: "test".to_string(),
            behavior: PromptBehavior {
                tone: "plain".to_string(),
                style: "concise".to_string(),
            },
            system: system.map(str::to_string),
            template: template.to_string(),
            output: PromptOutputSpec {
                format: "plain".to_string(),
            },
        }
    }

    #[test]
    fn test_render_simple_template() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "A & B <c>".to_string());

        let rendered = render_template("Question: {{question}}", &vars).unwrap();
        assert_eq!(rendered, "Question: A & B <c>");
    }

    #[test]
    fn test_conditional_block_skipped_for_empty_value() {
        let mut vars = HashMap::new();
        vars.insert("webContext".to_string(), String::new());

        let def = definition("Base{{#if webContext}} + web: {{webContext}}{{/if}}", None);
        let built = build_prompt(&def, vars).unwrap();
        assert_eq!(built.user, "Base");
        assert!(built.system.is_none());
    }

    #[test]
    fn test_system_template_is_rendered() {
        let mut vars = HashMap::new();
        vars.insert("platform".to_string(), "x".to_string());

        let def = definition("body", Some("Write for {{platform}}."));
        let built = build_prompt(&def, vars).unwrap();
        assert_eq!(built.system.as_deref(), Some("Write for x."));
        assert_eq!(built.metadata.source_prompt_id, "test.prompt");
        assert_eq!(built.metadata.resolved_variables["platform"], "x");
    }

    #[test]
    fn test_render_template_missing_variable() {
        let vars = HashMap::new();
        let result = render_template("Question: {{missing}}", &vars);
        assert_eq!(result.unwrap(), "Question: ");
    }
}
