//! Web search types.

use serde::{Deserialize, Serialize};

/// Search backend family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Locally operated metasearch service
    SelfHosted,
    /// Remote paid search API
    HostedApi,
}

impl BackendKind {
    /// Parse a backend name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "self-hosted" | "selfhosted" | "local" | "searxng" => Some(Self::SelfHosted),
            "hosted-api" | "hosted" | "api" | "serper" => Some(Self::HostedApi),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SelfHosted => "self-hosted",
            Self::HostedApi => "hosted-api",
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized web result. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl SearchResult {
    /// Build a result, treating blank strings as absent.
    pub fn new(title: Option<String>, link: Option<String>, snippet: Option<String>) -> Self {
        fn clean(v: Option<String>) -> Option<String> {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        }

        Self {
            title: clean(title),
            link: clean(link),
            snippet: clean(snippet),
        }
    }

    /// At least one display field present.
    pub fn is_displayable(&self) -> bool {
        self.title.is_some() || self.link.is_some() || self.snippet.is_some()
    }
}

/// Resolver verdict for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionOutcome {
    pub enabled: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub backend: Option<BackendKind>,

    /// User-facing notices, in the order they were produced
    pub diagnostics: Vec<String>,
}

impl ResolutionOutcome {
    pub fn disabled(diagnostics: Vec<String>) -> Self {
        Self {
            enabled: false,
            backend: None,
            diagnostics,
        }
    }

    pub fn resolved(backend: BackendKind, diagnostics: Vec<String>) -> Self {
        Self {
            enabled: true,
            backend: Some(backend),
            diagnostics,
        }
    }
}

/// Result list plus the reason it may be empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub results: Vec<SearchResult>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchOutcome {
    pub fn ok(results: Vec<SearchResult>) -> Self {
        Self {
            results,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            results: Vec::new(),
            error: Some(error.into()),
        }
    }
}
