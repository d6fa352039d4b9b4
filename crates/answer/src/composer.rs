//! Answer generation with optional web augmentation.

use crate::context::{render_corpus_context, render_web_block};
use crate::quality;
use crate::sections::StructuredAnswer;
use ragomatic_core::{AnswerFormat, AppResult, ModelSettings, SearchMode};
use ragomatic_knowledge::RetrievedPassage;
use ragomatic_llm::{LlmClient, LlmRequest, LlmUsage};
use ragomatic_prompt::{build_prompt, load_prompt, PLAIN_ANSWER, STRUCTURED_ANSWER};
use ragomatic_websearch::{ResolutionOutcome, SearchResult, WebSearch};
use std::collections::HashMap;
use std::path::Path;

/// Inputs for one composition.
#[derive(Debug, Clone, Copy)]
pub struct ComposeRequest<'a> {
    pub question: &'a str,
    pub passages: &'a [RetrievedPassage],
    pub format: AnswerFormat,

    /// Effective mode after command-level overrides
    pub mode: SearchMode,

    pub resolution: &'a ResolutionOutcome,
}

/// What the composer produced.
#[derive(Debug, Clone)]
pub struct Composition {
    /// Final answer text as returned by the model
    pub text: String,

    /// Parsed sections, structured format only
    pub structured: Option<StructuredAnswer>,

    /// Verdict on the first, corpus-only answer
    pub first_was_weak: bool,

    pub web_results: Vec<SearchResult>,
    pub web_used: bool,
    pub diagnostics: Vec<String>,
    pub usage: LlmUsage,
    pub generations: u32,
}

/// Generates the answer, consulting the quality gate and web search at most once.
pub struct AnswerComposer<'a> {
    llm: &'a dyn LlmClient,
    web: &'a dyn WebSearch,
    models: &'a ModelSettings,
    workspace: &'a Path,
}

impl<'a> AnswerComposer<'a> {
    pub fn new(
        llm: &'a dyn LlmClient,
        web: &'a dyn WebSearch,
        models: &'a ModelSettings,
        workspace: &'a Path,
    ) -> Self {
        Self {
            llm,
            web,
            models,
            workspace,
        }
    }

    /// Generate from corpus context, then, if the answer is weak or the mode
    /// is `always` and a backend resolved, search once and regenerate once.
    ///
    /// Generative errors propagate; web failures only add diagnostics.
    pub async fn compose(&self, request: ComposeRequest<'_>) -> AppResult<Composition> {
        let context = render_corpus_context(request.passages);

        let (first, usage) = self.generate(&request, &context, "").await?;
        let first_was_weak = match request.format {
            AnswerFormat::Structured => quality::is_weak_raw(&first),
            AnswerFormat::Plain => quality::is_weak_text(&first),
        };

        let mut composition = Composition {
            text: first,
            structured: None,
            first_was_weak,
            web_results: Vec::new(),
            web_used: false,
            diagnostics: Vec::new(),
            usage,
            generations: 1,
        };

        let wants_web = first_was_weak || request.mode == SearchMode::Always;
        tracing::info!(
            weak = first_was_weak,
            mode = request.mode.as_str(),
            web_enabled = request.resolution.enabled,
            "Quality gate verdict"
        );

        if let (true, Some(backend)) = (wants_web, request.resolution.backend) {
            let outcome = self.web.search(request.question, backend).await;
            if let Some(error) = outcome.error {
                composition.diagnostics.push(format!("Web search: {}", error));
            }

            if !outcome.results.is_empty() {
                let web_block = render_web_block(&outcome.results);
                let (second, usage) = self.generate(&request, &context, &web_block).await?;

                composition.text = second;
                composition.usage = composition.usage.add(usage);
                composition.generations += 1;
                composition.web_used = true;
                composition.web_results = outcome.results;
            }
        }

        if request.format == AnswerFormat::Structured {
            composition.structured = Some(StructuredAnswer::parse(&composition.text));
        }

        Ok(composition)
    }

    async fn generate(
        &self,
        request: &ComposeRequest<'_>,
        context: &str,
        web_context: &str,
    ) -> AppResult<(String, LlmUsage)> {
        let prompt_id = match request.format {
            AnswerFormat::Structured => STRUCTURED_ANSWER,
            AnswerFormat::Plain => PLAIN_ANSWER,
        };
        let definition = load_prompt(self.workspace, prompt_id)?;

        let mut variables = HashMap::new();
        variables.insert("question".to_string(), request.question.to_string());
        variables.insert("context".to_string(), context.to_string());
        variables.insert("webContext".to_string(), web_context.to_string());
        let built = build_prompt(&definition, variables)?;

        let mut llm_request = LlmRequest::new(built.user, self.models.resolve_model())
            .with_max_tokens(self.models.max_tokens)
            .with_temperature(self.models.temperature);
        if let Some(system) = built.system {
            llm_request = llm_request.with_system(system);
        }

        tracing::debug!(
            prompt = prompt_id,
            with_web = !web_context.is_empty(),
            "Generating answer"
        );

        let response = self.llm.complete(&llm_request).await?;
        Ok((response.content.trim().to_string(), response.usage))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{passages, FakeLlm, FakeWeb, STRONG_ANSWER, WEAK_ANSWER};
    use ragomatic_websearch::BackendKind;
    use tempfile::TempDir;

    fn resolved() -> ResolutionOutcome {
        ResolutionOutcome::resolved(BackendKind::SelfHosted, vec![])
    }

    #[tokio::test]
    async fn test_weak_answer_triggers_search_and_regeneration() {
        let temp = TempDir::new().unwrap();
        let llm = FakeLlm::new(vec![WEAK_ANSWER, STRONG_ANSWER]);
        let web = FakeWeb::with_results(2);
        let models = ModelSettings::default();
        let composer = AnswerComposer::new(&llm, &web, &models, temp.path());
        let resolution = resolved();

        let composition = composer
            .compose(ComposeRequest {
                question: "pricing strategy",
                passages: &passages(),
                format: AnswerFormat::Structured,
                mode: SearchMode::On,
                resolution: &resolution,
            })
            .await
            .unwrap();

        assert!(composition.first_was_weak);
        assert!(composition.web_used);
        assert_eq!(composition.generations, 2);
        assert_eq!(composition.text, STRONG_ANSWER);
        assert_eq!(web.calls(), 1);

        let prompts = llm.prompts();
        assert!(!prompts[0].contains("Web search results"));
        assert!(prompts[1].contains("Web search results"));
        assert!(prompts[1].contains("Transcript excerpts"));
        assert_eq!(composition.usage.total_tokens, 30);
    }

    #[tokio::test]
    async fn test_strong_answer_skips_search() {
        let temp = TempDir::new().unwrap();
        let llm = FakeLlm::new(vec![STRONG_ANSWER]);
        let web = FakeWeb::with_results(2);
        let models = ModelSettings::default();
        let composer = AnswerComposer::new(&llm, &web, &models, temp.path());
        let resolution = resolved();

        let composition = composer
            .compose(ComposeRequest {
                question: "pricing strategy",
                passages: &passages(),
                format: AnswerFormat::Structured,
                mode: SearchMode::On,
                resolution: &resolution,
            })
            .await
            .unwrap();

        assert!(!composition.web_used);
        assert_eq!(web.calls(), 0);
        assert_eq!(llm.calls(), 1);
        assert!(composition.structured.unwrap().direct.starts_with("Madhavan"));
    }

    #[tokio::test]
    async fn test_always_searches_even_when_strong() {
        let temp = TempDir::new().unwrap();
        let llm = FakeLlm::new(vec![STRONG_ANSWER, STRONG_ANSWER]);
        let web = FakeWeb::with_results(1);
        let models = ModelSettings::default();
        let composer = AnswerComposer::new(&llm, &web, &models, temp.path());
        let resolution = resolved();

        let composition = composer
            .compose(ComposeRequest {
                question: "pricing strategy",
                passages: &passages(),
                format: AnswerFormat::Structured,
                mode: SearchMode::Always,
                resolution: &resolution,
            })
            .await
            .unwrap();

        assert!(!composition.first_was_weak);
        assert!(composition.web_used);
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn test_disabled_resolution_never_searches() {
        let temp = TempDir::new().unwrap();
        let llm = FakeLlm::new(vec![WEAK_ANSWER]);
        let web = FakeWeb::with_results(3);
        let models = ModelSettings::default();
        let composer = AnswerComposer::new(&llm, &web, &models, temp.path());
        let resolution = ResolutionOutcome::disabled(vec!["off".to_string()]);

        let composition = composer
            .compose(ComposeRequest {
                question: "pricing strategy",
                passages: &passages(),
                format: AnswerFormat::Structured,
                mode: SearchMode::Always,
                resolution: &resolution,
            })
            .await
            .unwrap();

        assert_eq!(web.calls(), 0);
        assert_eq!(composition.text, WEAK_ANSWER);
        assert!(composition.diagnostics.is_empty());
    }

    #[tokio::test]
    async fn test_search_error_without_results_keeps_first_answer() {
        let temp = TempDir::new().unwrap();
        let llm = FakeLlm::new(vec![WEAK_ANSWER]);
        let web = FakeWeb::failing("self-hosted search returned zero results for \"q\"");
        let models = ModelSettings::default();
        let composer = AnswerComposer::new(&llm, &web, &models, temp.path());
        let resolution = resolved();

        let composition = composer
            .compose(ComposeRequest {
                question: "pricing strategy",
                passages: &passages(),
                format: AnswerFormat::Structured,
                mode: SearchMode::On,
                resolution: &resolution,
            })
            .await
            .unwrap();

        assert!(!composition.web_used);
        assert_eq!(composition.generations, 1);
        assert_eq!(composition.text, WEAK_ANSWER);
        assert!(composition.diagnostics[0].contains("zero results"));
    }

    #[tokio::test]
    async fn test_still_weak_after_web_does_not_loop() {
        let temp = TempDir::new().unwrap();
        let llm = FakeLlm::new(vec![WEAK_ANSWER, WEAK_ANSWER]);
        let web = FakeWeb::with_results(1);
        let models = ModelSettings::default();
        let composer = AnswerComposer::new(&llm, &web, &models, temp.path());
        let resolution = resolved();

        composer
            .compose(ComposeRequest {
                question: "pricing strategy",
                passages: &passages(),
                format: AnswerFormat::Structured,
                mode: SearchMode::On,
                resolution: &resolution,
            })
            .await
            .unwrap();

        assert_eq!(web.calls(), 1);
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn test_plain_format_uses_plain_contract() {
        let temp = TempDir::new().unwrap();
        let llm = FakeLlm::new(vec!["Madhavan says to discuss willingness to pay before building anything."]);
        let web = FakeWeb::with_results(1);
        let models = ModelSettings::default();
        let composer = AnswerComposer::new(&llm, &web, &models, temp.path());
        let resolution = resolved();

        let composition = composer
            .compose(ComposeRequest {
                question: "pricing strategy",
                passages: &passages(),
                format: AnswerFormat::Plain,
                mode: SearchMode::On,
                resolution: &resolution,
            })
            .await
            .unwrap();

        assert!(!composition.first_was_weak);
        assert!(composition.structured.is_none());
        assert!(llm.prompts()[0].contains("rather\nthan guessing"));
        assert_eq!(llm.models()[0], "claude-haiku-4-5-20251001");
    }

    #[tokio::test]
    async fn test_generation_error_propagates() {
        let temp = TempDir::new().unwrap();
        let llm = FakeLlm::new(vec![]);
        let web = FakeWeb::with_results(1);
        let models = ModelSettings::default();
        let composer = AnswerComposer::new(&llm, &web, &models, temp.path());
        let resolution = resolved();

        let err = composer
            .compose(ComposeRequest {
                question: "q",
                passages: &[],
                format: AnswerFormat::Structured,
                mode: SearchMode::On,
                resolution: &resolution,
            })
            .await
            .unwrap_err();

        assert!(err.is_llm());
        assert_eq!(web.calls(), 0);
    }
}
