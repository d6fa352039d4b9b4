//! Ask command handler.
//!
//! Retrieves transcript passages, composes an answer (with web backup when
//! the corpus answer is weak) and optionally rewrites it in a persona voice.

use clap::Args;
use ragomatic_answer::{answer_query, AskRequest, Collaborators, FinalAnswer};
use ragomatic_core::{config::AppConfig, AnswerFormat, AppError, AppResult, SearchMode};
use ragomatic_knowledge::{format_citations, KnowledgeBase};
use ragomatic_llm::create_client;
use ragomatic_websearch::{SystemProbe, WebSearchClient};
use std::time::Duration;

/// Ask a question about the corpus
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    #[arg(required = true, num_args = 1..)]
    pub question: Vec<String>,

    /// Web augmentation (off, on, always)
    #[arg(long, value_parser = parse_mode)]
    pub web: Option<SearchMode>,

    /// Web search backend (self-hosted, hosted-api)
    #[arg(long)]
    pub backend: Option<String>,

    /// Answer format (structured, plain)
    #[arg(long, value_parser = parse_format)]
    pub format: Option<AnswerFormat>,

    /// Also rewrite the answer for a platform (x, linkedin, newsletter).
    /// Without a value the configured platform is used.
    #[arg(long, num_args = 0..=1, default_missing_value = "")]
    pub persona: Option<String>,

    /// Number of transcript passages to retrieve
    #[arg(short, long)]
    pub k: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_mode(s: &str) -> Result<SearchMode, String> {
    SearchMode::parse(s).ok_or_else(|| format!("invalid web mode '{}' (off, on, always)", s))
}

fn parse_format(s: &str) -> Result<AnswerFormat, String> {
    AnswerFormat::parse(s).ok_or_else(|| format!("invalid format '{}' (structured, plain)", s))
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let request = self.request(config)?;

        // Model credentials are checked before anything else runs
        config.validate()?;

        let models = &config.settings.models;
        let api_key = config.resolve_api_key();
        let llm = create_client(
            &models.provider,
            models.endpoint.as_deref(),
            api_key.as_deref(),
            Duration::from_secs(models.timeout_secs),
        )
        .map_err(AppError::Config)?;

        let web_settings = &config.settings.web_search;
        let knowledge = KnowledgeBase::from_config(config);
        let web = WebSearchClient::new(web_settings);
        let probe = SystemProbe::new(
            web_settings.runtime_command.as_str(),
            Duration::from_secs(web_settings.timeout_secs),
        );

        let collaborators = Collaborators {
            retriever: &knowledge,
            llm: llm.as_ref(),
            web: &web,
            probe: &probe,
        };

        if !self.json {
            eprintln!("Searching the transcript corpus...");
        }
        let answer = answer_query(config, &request, &collaborators).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&answer)?);
        } else {
            println!("{}", render(&answer, config.settings.retrieval.max_sources));
        }

        Ok(())
    }

    fn request(&self, config: &AppConfig) -> AppResult<AskRequest> {
        let question = self.question.join(" ").trim().to_string();
        if question.is_empty() {
            return Err(AppError::Config("No question provided".to_string()));
        }

        let persona = self.persona.as_ref().map(|platform| {
            if platform.trim().is_empty() {
                config.settings.output.persona.platform.clone()
            } else {
                platform.trim().to_lowercase()
            }
        });

        Ok(AskRequest {
            question,
            mode: self.web,
            backend: self.backend.clone(),
            format: self.format,
            persona,
            k: self.k,
        })
    }
}

/// Human-readable rendering: header, answer, sources, diagnostics, footer.
fn render(answer: &FinalAnswer, max_sources: usize) -> String {
    let rule = "-".repeat(50);
    let mut out = vec![
        format!("Question: {}", answer.question),
        String::new(),
        "Answer:".to_string(),
        rule.clone(),
        answer.body(),
        rule,
    ];

    let corpus_sources = &answer.corpus_sources[..answer.corpus_sources.len().min(max_sources)];
    if !corpus_sources.is_empty() {
        out.push(String::new());
        out.push("Sources:".to_string());
        out.push(format_citations(corpus_sources));
    }

    let web = answer
        .web_sources
        .iter()
        .filter_map(|r| {
            let link = r.link.as_deref()?;
            Some(match &r.title {
                Some(title) => format!("• {}\n  {}", title, link),
                None => format!("• {}", link),
            })
        })
        .collect::<Vec<_>>();
    if answer.web_used && !web.is_empty() {
        out.push(String::new());
        out.push("Web sources:".to_string());
        out.extend(web);
    }

    if !answer.diagnostics.is_empty() {
        out.push(String::new());
        out.push("Notes:".to_string());
        out.extend(answer.diagnostics.iter().map(|d| format!("! {}", d)));
    }

    out.push(String::new());
    out.push(format!(
        "Model: {} · {} model call(s) · {} tokens ({} in / {} out)",
        answer.model,
        answer.generations,
        answer.usage.total_tokens,
        answer.usage.prompt_tokens,
        answer.usage.completion_tokens
    ));

    out.join("\n")
}
