//! Resolved settings and their override layer.
//!
//! Settings are resolved in two layers: a fully populated [`Settings`]
//! (defaults) and a [`SettingsOverride`] where every leaf is optional.
//! [`Settings::resolve`] replaces exactly the leaves the override sets, so a
//! partial YAML file can never drop an unrelated default.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Web augmentation intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    /// Never touch the network for search
    Off,
    /// Search only when the quality gate flags the corpus answer
    #[default]
    On,
    /// Search regardless of the quality gate
    Always,
}

impl SearchMode {
    /// Parse a mode name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "off" | "false" | "no" => Some(Self::Off),
            "on" | "auto" | "true" | "yes" => Some(Self::On),
            "always" | "force" => Some(Self::Always),
            _ => None,
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
            Self::Always => "always",
        }
    }
}

/// Which prompt contract the composer uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerFormat {
    /// Direct / indirect / missing sections
    #[default]
    Structured,
    /// Single free-text answer
    Plain,
}

impl AnswerFormat {
    /// Parse a format name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "structured" | "sections" => Some(Self::Structured),
            "plain" | "text" => Some(Self::Plain),
            _ => None,
        }
    }
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub retrieval: RetrievalSettings,
    pub models: ModelSettings,
    pub web_search: WebSearchSettings,
    pub output: OutputSettings,
}

/// Corpus, chunking and retrieval knobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalSettings {
    /// Directory holding `<episode>/transcript.md` files (workspace-relative)
    pub corpus_dir: PathBuf,

    /// SQLite index location (workspace-relative)
    pub index_path: PathBuf,

    pub chunk_size: usize,
    pub chunk_overlap: usize,

    /// Chunks handed to the generator
    pub k: usize,

    /// Candidates considered before diversity selection
    pub fetch_k: usize,

    /// 1.0 = pure relevance, 0.0 = pure diversity
    pub lambda_mult: f32,

    /// Episode citations shown under the answer
    pub max_sources: usize,

    /// Candidates scoring below this are dropped before selection
    pub min_score: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            corpus_dir: PathBuf::from("episodes"),
            index_path: PathBuf::from("data/index.sqlite"),
            chunk_size: 1000,
            chunk_overlap: 200,
            k: 5,
            fetch_k: 20,
            lambda_mult: 0.5,
            max_sources: 3,
            min_score: 0.0,
        }
    }
}

/// Generative model selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelSettings {
    /// Provider name ("claude", "ollama")
    pub provider: String,

    /// Model id or catalog alias
    pub model: String,

    pub endpoint: Option<String>,

    /// Environment variable holding the provider API key
    pub api_key_env: String,

    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,

    /// Alias -> model id
    pub catalog: BTreeMap<String, String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        let mut catalog = BTreeMap::new();
        catalog.insert("haiku".to_string(), "claude-haiku-4-5-20251001".to_string());
        catalog.insert("sonnet".to_string(), "claude-sonnet-4-5-20250929".to_string());
        catalog.insert("llama".to_string(), "llama3.2".to_string());

        Self {
            provider: "claude".to_string(),
            model: "haiku".to_string(),
            endpoint: None,
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            temperature: 0.0,
            max_tokens: 1024,
            timeout_secs: 60,
            catalog,
        }
    }
}

impl ModelSettings {
    /// Expand a catalog alias into a concrete model id.
    pub fn resolve_model(&self) -> String {
        self.catalog
            .get(&self.model)
            .cloned()
            .unwrap_or_else(|| self.model.clone())
    }
}

/// Web augmentation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WebSearchSettings {
    pub mode: SearchMode,

    /// "self-hosted" or "hosted-api"; kept as text so a typo can be reported
    pub backend: String,

    pub self_hosted_endpoint: String,
    pub hosted_endpoint: String,

    /// Environment variable holding the hosted search API key
    pub api_key_env: String,

    /// Container runtime client checked before pinging the self-hosted service
    pub runtime_command: String,

    pub max_results: usize,
    pub timeout_secs: u64,
    pub allow_fallback_to_hosted: bool,
}

impl Default for WebSearchSettings {
    fn default() -> Self {
        Self {
            mode: SearchMode::On,
            backend: "self-hosted".to_string(),
            self_hosted_endpoint: "http://localhost:8888".to_string(),
            hosted_endpoint: "https://google.serper.dev/search".to_string(),
            api_key_env: "SERPER_API_KEY".to_string(),
            runtime_command: "docker".to_string(),
            max_results: 5,
            timeout_secs: 10,
            allow_fallback_to_hosted: false,
        }
    }
}

impl WebSearchSettings {
    /// Read the hosted API key from its environment variable.
    pub fn hosted_api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|v| !v.trim().is_empty())
    }
}

/// Output shaping.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutputSettings {
    pub format: AnswerFormat,
    pub persona: PersonaSettings,
}

/// Persona transform settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PersonaSettings {
    pub enabled: bool,
    pub platform: String,
    pub platforms: BTreeMap<String, PlatformRule>,
}

/// Key of the rule set used for unknown platforms.
pub const DEFAULT_PLATFORM: &str = "default";

impl Default for PersonaSettings {
    fn default() -> Self {
        let mut platforms = BTreeMap::new();
        platforms.insert(
            "x".to_string(),
            PlatformRule::new(180, 280, 1, 1, "punchy, contrarian, compact"),
        );
        platforms.insert(
            "linkedin".to_string(),
            PlatformRule::new(700, 1300, 3, 5, "reflective, first-person, professional"),
        );
        platforms.insert(
            "newsletter".to_string(),
            PlatformRule::new(900, 1800, 3, 6, "warm, essayistic, curious"),
        );
        platforms.insert(DEFAULT_PLATFORM.to_string(), PlatformRule::default());

        Self {
            enabled: false,
            platform: "linkedin".to_string(),
            platforms,
        }
    }
}

impl PersonaSettings {
    /// Look up the rule set for a platform.
    ///
    /// Unknown keys get the `default` rule set; the returned flag is true
    /// when that fallback happened.
    pub fn rule_for(&self, platform: &str) -> (PlatformRule, bool) {
        let key = platform.trim().to_lowercase();
        match self.platforms.get(&key) {
            Some(rule) => (rule.clone(), false),
            None => (
                self.platforms
                    .get(DEFAULT_PLATFORM)
                    .cloned()
                    .unwrap_or_default(),
                true,
            ),
        }
    }
}

/// Length and tone rules for one persona platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlatformRule {
    pub min_chars: usize,
    pub max_chars: usize,
    pub min_paragraphs: usize,
    pub max_paragraphs: usize,
    pub tone: String,
}

impl PlatformRule {
    pub fn new(
        min_chars: usize,
        max_chars: usize,
        min_paragraphs: usize,
        max_paragraphs: usize,
        tone: &str,
    ) -> Self {
        Self {
            min_chars,
            max_chars,
            min_paragraphs,
            max_paragraphs,
            tone: tone.to_string(),
        }
    }
}

impl Default for PlatformRule {
    fn default() -> Self {
        Self::new(400, 900, 2, 4, "conversational, confident")
    }
}

// ---------------------------------------------------------------------------
// Override layer
// ---------------------------------------------------------------------------

/// Partial settings, as read from a config file or the environment.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsOverride {
    pub retrieval: Option<RetrievalOverride>,
    pub models: Option<ModelOverride>,
    pub web_search: Option<WebSearchOverride>,
    pub output: Option<OutputOverride>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct RetrievalOverride {
    pub corpus_dir: Option<PathBuf>,
    pub index_path: Option<PathBuf>,
    pub chunk_size: Option<usize>,
    pub chunk_overlap: Option<usize>,
    pub k: Option<usize>,
    pub fetch_k: Option<usize>,
    pub lambda_mult: Option<f32>,
    pub max_sources: Option<usize>,
    pub min_score: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct ModelOverride {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub api_key_env: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub timeout_secs: Option<u64>,
    pub catalog: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct WebSearchOverride {
    pub mode: Option<SearchMode>,
    pub backend: Option<String>,
    pub self_hosted_endpoint: Option<String>,
    pub hosted_endpoint: Option<String>,
    pub api_key_env: Option<String>,
    pub runtime_command: Option<String>,
    pub max_results: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub allow_fallback_to_hosted: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct OutputOverride {
    pub format: Option<AnswerFormat>,
    pub persona: Option<PersonaOverride>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PersonaOverride {
    pub enabled: Option<bool>,
    pub platform: Option<String>,
    pub platforms: BTreeMap<String, PlatformRuleOverride>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct PlatformRuleOverride {
    pub min_chars: Option<usize>,
    pub max_chars: Option<usize>,
    pub min_paragraphs: Option<usize>,
    pub max_paragraphs: Option<usize>,
    pub tone: Option<String>,
}

fn set<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}

impl Settings {
    /// Resolve `overrides` on top of `defaults`.
    ///
    /// Scalar leaves set in `overrides` win; nested sections recurse; keyed
    /// maps merge key by key. Nothing in `defaults` is removed.
    pub fn resolve(defaults: Settings, overrides: SettingsOverride) -> Settings {
        let mut settings = defaults;

        if let Some(r) = overrides.retrieval {
            let s = &mut settings.retrieval;
            set(&mut s.corpus_dir, r.corpus_dir);
            set(&mut s.index_path, r.index_path);
            set(&mut s.chunk_size, r.chunk_size);
            set(&mut s.chunk_overlap, r.chunk_overlap);
            set(&mut s.k, r.k);
            set(&mut s.fetch_k, r.fetch_k);
            set(&mut s.lambda_mult, r.lambda_mult);
            set(&mut s.max_sources, r.max_sources);
            set(&mut s.min_score, r.min_score);
        }

        if let Some(m) = overrides.models {
            let s = &mut settings.models;
            set(&mut s.provider, m.provider);
            set(&mut s.model, m.model);
            if m.endpoint.is_some() {
                s.endpoint = m.endpoint;
            }
            set(&mut s.api_key_env, m.api_key_env);
            set(&mut s.temperature, m.temperature);
            set(&mut s.max_tokens, m.max_tokens);
            set(&mut s.timeout_secs, m.timeout_secs);
            s.catalog.extend(m.catalog);
        }

        if let Some(w) = overrides.web_search {
            let s = &mut settings.web_search;
            set(&mut s.mode, w.mode);
            set(&mut s.backend, w.backend);
            set(&mut s.self_hosted_endpoint, w.self_hosted_endpoint);
            set(&mut s.hosted_endpoint, w.hosted_endpoint);
            set(&mut s.api_key_env, w.api_key_env);
            set(&mut s.runtime_command, w.runtime_command);
            set(&mut s.max_results, w.max_results);
            set(&mut s.timeout_secs, w.timeout_secs);
            set(&mut s.allow_fallback_to_hosted, w.allow_fallback_to_hosted);
        }

        if let Some(o) = overrides.output {
            set(&mut settings.output.format, o.format);
            if let Some(p) = o.persona {
                let s = &mut settings.output.persona;
                set(&mut s.enabled, p.enabled);
                set(&mut s.platform, p.platform);

                for (key, rule_override) in p.platforms {
                    let key = key.to_lowercase();
                    // New platforms start from the default rule set.
                    let base = s
                        .platforms
                        .get(&key)
                        .or_else(|| s.platforms.get(DEFAULT_PLATFORM))
                        .cloned()
                        .unwrap_or_default();
                    s.platforms.insert(key, rule_override.apply_to(base));
                }
            }
        }

        settings
    }
}

impl PlatformRuleOverride {
    fn apply_to(self, mut rule: PlatformRule) -> PlatformRule {
        set(&mut rule.min_chars, self.min_chars);
        set(&mut rule.max_chars, self.max_chars);
        set(&mut rule.min_paragraphs, self.min_paragraphs);
        set(&mut rule.max_paragraphs, self.max_paragraphs);
        set(&mut rule.tone, self.tone);
        rule
    }
}
