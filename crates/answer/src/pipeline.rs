//! End-to-end question answering.
//!
//! retrieve → resolve search provider → compose → optional persona.

use crate::composer::{AnswerComposer, ComposeRequest};
use crate::context::render_web_block;
use crate::persona::{render_persona_block, PersonaRequest, PersonaTransformer};
use ragomatic_core::{AnswerFormat, AppConfig, AppResult, SearchMode};
use ragomatic_knowledge::{citations, Citation, Retriever};
use ragomatic_llm::{LlmClient, LlmUsage};
use ragomatic_websearch::{HealthProbe, ProviderResolver, SearchResult, WebSearch};
use serde::Serialize;

/// One `ask` invocation. `None` fields fall back to configuration.
#[derive(Debug, Clone, Default)]
pub struct AskRequest {
    pub question: String,
    pub mode: Option<SearchMode>,
    pub backend: Option<String>,
    pub format: Option<AnswerFormat>,

    /// Persona platform; `None` uses the configured persona if enabled
    pub persona: Option<String>,

    pub k: Option<usize>,
}

/// External collaborators, injected so tests can script them.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub retriever: &'a dyn Retriever,
    pub llm: &'a dyn LlmClient,
    pub web: &'a dyn WebSearch,
    pub probe: &'a dyn HealthProbe,
}

/// Persona rewrite attached to an answer.
#[derive(Debug, Clone, Serialize)]
pub struct PersonaBlock {
    pub platform: String,
    pub text: String,
}

/// Everything the CLI renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalAnswer {
    pub question: String,

    /// Composed answer as returned by the model
    pub text: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub persona: Option<PersonaBlock>,

    pub corpus_sources: Vec<Citation>,
    pub web_sources: Vec<SearchResult>,
    pub web_used: bool,

    /// Resolver, composer and persona notices, in that order
    pub diagnostics: Vec<String>,

    pub model: String,
    pub usage: LlmUsage,
    pub generations: u32,
}

impl FinalAnswer {
    /// Answer text with the persona block appended, if any.
    pub fn body(&self) -> String {
        match &self.persona {
            Some(persona) => format!(
                "{}\n\n{}",
                self.text.trim(),
                render_persona_block(&persona.platform, &persona.text)
            ),
            None => self.text.trim().to_string(),
        }
    }
}

/// Answer one question.
///
/// Web search problems end up in `diagnostics`; retrieval, prompt and
/// generative errors propagate.
pub async fn answer_query(
    config: &AppConfig,
    request: &AskRequest,
    collaborators: &Collaborators<'_>,
) -> AppResult<FinalAnswer> {
    let settings = &config.settings;
    let k = request.k.unwrap_or(settings.retrieval.k);
    let format = request.format.unwrap_or(settings.output.format);
    let mode = request.mode.unwrap_or(settings.web_search.mode);

    let passages = collaborators.retriever.retrieve(&request.question, k).await?;
    tracing::info!(passages = passages.len(), k = k, "Retrieved transcript passages");

    let resolution = ProviderResolver::new(&settings.web_search, collaborators.probe)
        .resolve(Some(mode), request.backend.as_deref())
        .await;

    let composer = AnswerComposer::new(
        collaborators.llm,
        collaborators.web,
        &settings.models,
        &config.workspace,
    );
    let composition = composer
        .compose(ComposeRequest {
            question: &request.question,
            passages: &passages,
            format,
            mode,
            resolution: &resolution,
        })
        .await?;

    let mut diagnostics = resolution.diagnostics.clone();
    diagnostics.extend(composition.diagnostics.iter().cloned());
    let mut usage = composition.usage;
    let mut generations = composition.generations;

    let platform = request.persona.clone().or_else(|| {
        settings
            .output
            .persona
            .enabled
            .then(|| settings.output.persona.platform.clone())
    });

    let persona = match platform {
        Some(platform) => {
            let (direct, indirect) = match &composition.structured {
                Some(structured) => (structured.direct.clone(), structured.indirect.clone()),
                None => (composition.text.clone(), String::new()),
            };
            let web = if composition.web_used {
                render_web_block(&composition.web_results)
            } else {
                String::new()
            };

            let transformer = PersonaTransformer::new(
                collaborators.llm,
                &settings.models,
                &settings.output.persona,
                &config.workspace,
            );
            let output = transformer
                .transform(PersonaRequest {
                    direct,
                    indirect,
                    web,
                    platform,
                })
                .await?;

            usage = usage.add(output.usage);
            generations += 1;
            diagnostics.extend(output.diagnostics);
            Some(PersonaBlock {
                platform: output.platform,
                text: output.text,
            })
        }
        None => None,
    };

    tracing::info!(
        generations = generations,
        web_used = composition.web_used,
        diagnostics = diagnostics.len(),
        "Answer complete"
    );

    Ok(FinalAnswer {
        question: request.question.clone(),
        text: composition.text,
        persona,
        corpus_sources: citations(&passages, settings.retrieval.max_sources),
        web_sources: composition.web_results,
        web_used: composition.web_used,
        diagnostics,
        model: settings.models.resolve_model(),
        usage,
        generations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        passages, FakeLlm, FakeProbe, FakeRetriever, FakeWeb, STRONG_ANSWER, WEAK_ANSWER,
    };
    use tempfile::TempDir;

    fn config(temp: &TempDir) -> AppConfig {
        let mut config = AppConfig {
            workspace: temp.path().to_path_buf(),
            ..Default::default()
        };
        config.settings.web_search.api_key_env = "RAGOMATIC_TEST_UNSET_SEARCH_KEY".to_string();
        config
    }

    fn ask(question: &str) -> AskRequest {
        AskRequest {
            question: question.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_pricing_strategy_scenario() {
        let temp = TempDir::new().unwrap();
        let config = config(&temp);
        let retriever = FakeRetriever::new(passages());
        let llm = FakeLlm::new(vec![WEAK_ANSWER, STRONG_ANSWER]);
        let web = FakeWeb::with_results(2);
        let probe = FakeProbe::healthy();
        let collaborators = Collaborators {
            retriever: &retriever,
            llm: &llm,
            web: &web,
            probe: &probe,
        };

        let answer = answer_query(&config, &ask("pricing strategy"), &collaborators)
            .await
            .unwrap();

        assert_eq!(answer.text, STRONG_ANSWER);
        assert!(answer.web_used);
        assert_eq!(answer.web_sources.len(), 2);
        assert_eq!(answer.generations, 2);
        assert_eq!(answer.corpus_sources.len(), 2);
        assert_eq!(answer.model, "claude-haiku-4-5-20251001");
        assert_eq!(retriever.last_k(), Some(5));
    }

    #[tokio::test]
    async fn test_mode_off_makes_no_web_or_probe_calls() {
        let temp = TempDir::new().unwrap();
        let config = config(&temp);
        let retriever = FakeRetriever::new(passages());
        let llm = FakeLlm::new(vec![WEAK_ANSWER]);
        let web = FakeWeb::with_results(2);
        let probe = FakeProbe::healthy();
        let collaborators = Collaborators {
            retriever: &retriever,
            llm: &llm,
            web: &web,
            probe: &probe,
        };

        let request = AskRequest {
            mode: Some(SearchMode::Off),
            ..ask("pricing strategy")
        };
        let answer = answer_query(&config, &request, &collaborators).await.unwrap();

        assert_eq!(web.calls(), 0);
        assert_eq!(probe.calls(), 0);
        assert!(!answer.web_used);
        assert_eq!(answer.text, WEAK_ANSWER);
    }

    #[tokio::test]
    async fn test_unavailable_runtime_without_fallback_never_searches() {
        let temp = TempDir::new().unwrap();
        let config = config(&temp);
        let retriever = FakeRetriever::new(passages());
        let llm = FakeLlm::new(vec![STRONG_ANSWER]);
        let web = FakeWeb::with_results(2);
        let probe = FakeProbe::no_runtime();
        let collaborators = Collaborators {
            retriever: &retriever,
            llm: &llm,
            web: &web,
            probe: &probe,
        };

        let request = AskRequest {
            mode: Some(SearchMode::Always),
            ..ask("pricing strategy")
        };
        let answer = answer_query(&config, &request, &collaborators).await.unwrap();

        assert_eq!(web.calls(), 0);
        assert!(!answer.diagnostics.is_empty());
        assert!(answer.diagnostics[0].contains("not installed"));
    }

    #[tokio::test]
    async fn test_diagnostics_keep_stage_order() {
        let temp = TempDir::new().unwrap();
        let mut config = config(&temp);
        // Resolver falls back to the hosted API and warns about cost
        let key_env = "RAGOMATIC_TEST_PIPELINE_HOSTED_KEY";
        std::env::set_var(key_env, "test-key");
        config.settings.web_search.api_key_env = key_env.to_string();
        config.settings.web_search.allow_fallback_to_hosted = true;

        let retriever = FakeRetriever::new(passages());
        let llm = FakeLlm::new(vec![WEAK_ANSWER, "A post about pricing."]);
        let web = FakeWeb::failing("hosted search returned HTTP 429");
        let probe = FakeProbe::no_runtime();
        let collaborators = Collaborators {
            retriever: &retriever,
            llm: &llm,
            web: &web,
            probe: &probe,
        };

        let request = AskRequest {
            persona: Some("myspace".to_string()),
            ..ask("pricing strategy")
        };
        let answer = answer_query(&config, &request, &collaborators).await.unwrap();

        assert_eq!(answer.diagnostics.len(), 3, "{:?}", answer.diagnostics);
        assert!(answer.diagnostics[0].contains("Falling back"));
        assert!(answer.diagnostics[1].contains("HTTP 429"));
        assert!(answer.diagnostics[2].contains("myspace"));
        assert_eq!(web.calls(), 1);
    }

    #[tokio::test]
    async fn test_persona_is_appended_and_bounded() {
        let temp = TempDir::new().unwrap();
        let config = config(&temp);
        let retriever = FakeRetriever::new(passages());
        let long_post = "Pricing is a conversation. ".repeat(40);
        let llm = FakeLlm::new(vec![WEAK_ANSWER, STRONG_ANSWER, long_post.as_str()]);
        let web = FakeWeb::with_results(1);
        let probe = FakeProbe::healthy();
        let collaborators = Collaborators {
            retriever: &retriever,
            llm: &llm,
            web: &web,
            probe: &probe,
        };

        let request = AskRequest {
            persona: Some("x".to_string()),
            ..ask("pricing strategy")
        };
        let answer = answer_query(&config, &request, &collaborators).await.unwrap();

        // Primary, web regeneration, persona
        assert_eq!(llm.calls(), 3);
        assert_eq!(answer.generations, 3);

        let persona = answer.persona.as_ref().unwrap();
        assert!(persona.text.chars().count() <= 280);

        let body = answer.body();
        assert!(body.starts_with("## Direct Answer"));
        assert!(body.contains("## Persona (x)"));

        let persona_prompt = &llm.prompts()[2];
        assert!(persona_prompt.contains("Web notes:"));
        assert!(persona_prompt.contains("Madhavan"));
    }

    #[tokio::test]
    async fn test_configured_persona_applies_without_flag() {
        let temp = TempDir::new().unwrap();
        let mut config = config(&temp);
        config.settings.output.persona.enabled = true;
        config.settings.output.persona.platform = "newsletter".to_string();

        let retriever = FakeRetriever::new(passages());
        let llm = FakeLlm::new(vec![STRONG_ANSWER, "Dear reader."]);
        let web = FakeWeb::with_results(1);
        let probe = FakeProbe::healthy();
        let collaborators = Collaborators {
            retriever: &retriever,
            llm: &llm,
            web: &web,
            probe: &probe,
        };

        let answer = answer_query(&config, &ask("pricing strategy"), &collaborators)
            .await
            .unwrap();

        assert_eq!(answer.persona.unwrap().platform, "newsletter");
    }

    #[tokio::test]
    async fn test_generative_failure_propagates() {
        let temp = TempDir::new().unwrap();
        let config = config(&temp);
        let retriever = FakeRetriever::new(passages());
        let llm = FakeLlm::new(vec![]);
        let web = FakeWeb::with_results(1);
        let probe = FakeProbe::healthy();
        let collaborators = Collaborators {
            retriever: &retriever,
            llm: &llm,
            web: &web,
            probe: &probe,
        };

        let err = answer_query(&config, &ask("pricing strategy"), &collaborators)
            .await
            .unwrap_err();
        assert!(err.is_llm());
    }

    #[tokio::test]
    async fn test_request_k_overrides_settings() {
        let temp = TempDir::new().unwrap();
        let config = config(&temp);
        let retriever = FakeRetriever::new(passages());
        let llm = FakeLlm::new(vec![STRONG_ANSWER]);
        let web = FakeWeb::with_results(1);
        let probe = FakeProbe::healthy();
        let collaborators = Collaborators {
            retriever: &retriever,
            llm: &llm,
            web: &web,
            probe: &probe,
        };

        let request = AskRequest {
            k: Some(2),
            mode: Some(SearchMode::Off),
            ..ask("pricing strategy")
        };
        answer_query(&config, &request, &collaborators).await.unwrap();

        assert_eq!(retriever.last_k(), Some(2));
    }
}
