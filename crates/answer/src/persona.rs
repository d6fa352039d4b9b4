//! Platform persona rewrite.
//!
//! Consumes only already-composed sections. Voice and fidelity rules live in
//! the `persona.rewrite` prompt; locally the output is only length-bounded.

use crate::quality;
use ragomatic_core::{AppResult, ModelSettings, PersonaSettings};
use ragomatic_llm::{LlmClient, LlmRequest, LlmUsage};
use ragomatic_prompt::{build_prompt, load_prompt, PERSONA_REWRITE};
use std::collections::HashMap;
use std::path::Path;

/// Sections handed to the rewrite.
#[derive(Debug, Clone, Default)]
pub struct PersonaRequest {
    pub direct: String,
    pub indirect: String,
    pub web: String,
    pub platform: String,
}

/// Styled text plus anything worth telling the operator.
#[derive(Debug, Clone)]
pub struct PersonaOutput {
    pub platform: String,
    pub text: String,
    pub usage: LlmUsage,
    pub diagnostics: Vec<String>,
}

pub struct PersonaTransformer<'a> {
    llm: &'a dyn LlmClient,
    models: &'a ModelSettings,
    persona: &'a PersonaSettings,
    workspace: &'a Path,
}

impl<'a> PersonaTransformer<'a> {
    pub fn new(
        llm: &'a dyn LlmClient,
        models: &'a ModelSettings,
        persona: &'a PersonaSettings,
        workspace: &'a Path,
    ) -> Self {
        Self {
            llm,
            models,
            persona,
            workspace,
        }
    }

    /// Rewrite the sections in the platform's voice with one generative call.
    pub async fn transform(&self, request: PersonaRequest) -> AppResult<PersonaOutput> {
        let mut diagnostics = Vec::new();
        let (rule, fell_back) = self.persona.rule_for(&request.platform);
        if fell_back {
            diagnostics.push(format!(
                "Unknown persona platform '{}'; using the default rule set",
                request.platform
            ));
        }

        let direct_omitted = quality::is_weak_text(&request.direct);
        if direct_omitted {
            tracing::debug!("Direct answer too weak for persona input; omitting it");
        }

        let mut variables = HashMap::new();
        variables.insert("platform".to_string(), request.platform.clone());
        variables.insert("tone".to_string(), rule.tone.clone());
        variables.insert("minChars".to_string(), rule.min_chars.to_string());
        variables.insert("maxChars".to_string(), rule.max_chars.to_string());
        variables.insert("minParagraphs".to_string(), rule.min_paragraphs.to_string());
        variables.insert("maxParagraphs".to_string(), rule.max_paragraphs.to_string());
        variables.insert(
            "directOmitted".to_string(),
            if direct_omitted { "true" } else { "" }.to_string(),
        );
        variables.insert(
            "direct".to_string(),
            if direct_omitted {
                String::new()
            } else {
                request.direct.trim().to_string()
            },
        );
        variables.insert("indirect".to_string(), request.indirect.trim().to_string());
        variables.insert("web".to_string(), request.web.trim().to_string());

        let definition = load_prompt(self.workspace, PERSONA_REWRITE)?;
        let built = build_prompt(&definition, variables)?;

        let mut llm_request = LlmRequest::new(built.user, self.models.resolve_model())
            .with_max_tokens(self.models.max_tokens)
            .with_temperature(self.models.temperature);
        if let Some(system) = built.system {
            llm_request = llm_request.with_system(system);
        }

        let response = self.llm.complete(&llm_request).await?;
        let raw = response.content.trim();
        let text = bound_to_max(raw, rule.max_chars);

        if text.len() < raw.len() {
            tracing::info!(
                platform = request.platform.as_str(),
                max_chars = rule.max_chars,
                "Persona output trimmed to platform limit"
            );
        }

        Ok(PersonaOutput {
            platform: request.platform,
            text,
            usage: response.usage,
            diagnostics,
        })
    }
}

/// Cut `text` to at most `max_chars` characters, backing up to the last
/// word boundary when the cut lands inside a word.
pub fn bound_to_max(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut = text
        .char_indices()
        .nth(max_chars)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let head = &text[..cut];

    let next_is_boundary = text[cut..].starts_with(char::is_whitespace);
    let bounded = if next_is_boundary {
        head
    } else {
        match head.rfind(char::is_whitespace) {
            Some(i) => &head[..i],
            None => head,
        }
    };

    bounded.trim_end().to_string()
}

/// Delimited block appended after the answer.
pub fn render_persona_block(platform: &str, text: &str) -> String {
    format!("---\n## Persona ({})\n\n{}", platform, text.trim())
}
