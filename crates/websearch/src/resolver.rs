//! Web search provider resolution.
//!
//! A single pass through an explicit state machine:
//!
//! ```text
//! enter ─┬─ mode off ───────────────────────────────► Disabled
//!        ├─ unknown backend / hosted without key ────► Disabled
//!        ├─ hosted with key ─────────────────────────► Resolved(hosted-api)
//!        └─ self-hosted ─► Probing ─ runtime ok ─► Pinging ─ ping ok ─► Resolved(self-hosted)
//!                             │                     │
//!                             └──── failure ────────┴─► Resolved(hosted-api) if fallback allowed
//!                                                       Disabled otherwise
//! ```
//!
//! Every transition carries at most one diagnostic; the outcome lists them in
//! the order they were produced.

use crate::client::SelfHostedError;
use crate::probe::HealthProbe;
use crate::types::{BackendKind, ResolutionOutcome};
use ragomatic_core::{SearchMode, WebSearchSettings};

/// Resolver state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    Disabled,
    /// Checking the container runtime
    Probing,
    /// Checking the self-hosted service endpoint
    Pinging,
    Resolved(BackendKind),
}

impl ResolverState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disabled | Self::Resolved(_))
    }
}

/// One step of the state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: ResolverState,
    pub diagnostic: Option<String>,
}

impl Transition {
    fn to(next: ResolverState) -> Self {
        Self {
            next,
            diagnostic: None,
        }
    }

    fn with(next: ResolverState, diagnostic: String) -> Self {
        Self {
            next,
            diagnostic: Some(diagnostic),
        }
    }
}

/// Chooses one usable search backend, or none, for this invocation.
pub struct ProviderResolver<'a> {
    settings: &'a WebSearchSettings,
    probe: &'a dyn HealthProbe,
    hosted_key: Option<String>,
}

impl<'a> ProviderResolver<'a> {
    /// The hosted credential is read from the configured environment variable.
    pub fn new(settings: &'a WebSearchSettings, probe: &'a dyn HealthProbe) -> Self {
        Self {
            settings,
            probe,
            hosted_key: settings.hosted_api_key(),
        }
    }

    pub fn with_hosted_key(mut self, key: Option<String>) -> Self {
        self.hosted_key = key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Run the machine to a terminal state.
    ///
    /// `mode` and `backend` are command-level overrides; when absent the
    /// configured values apply.
    pub async fn resolve(
        &self,
        mode: Option<SearchMode>,
        backend: Option<&str>,
    ) -> ResolutionOutcome {
        let mut diagnostics = Vec::new();
        let mut transition = self.enter(mode, backend);

        loop {
            if let Some(diagnostic) = transition.diagnostic.take() {
                diagnostics.push(diagnostic);
            }
            if transition.next.is_terminal() {
                break;
            }
            transition = self.step(transition.next).await;
        }

        let outcome = match transition.next {
            ResolverState::Resolved(kind) => ResolutionOutcome::resolved(kind, diagnostics),
            _ => ResolutionOutcome::disabled(diagnostics),
        };

        tracing::info!(
            enabled = outcome.enabled,
            backend = outcome.backend.map(|b| b.as_str()).unwrap_or("none"),
            diagnostics = outcome.diagnostics.len(),
            "Web search provider resolved"
        );

        outcome
    }

    /// Initial transition from configuration alone. Never touches the network.
    pub fn enter(&self, mode: Option<SearchMode>, backend: Option<&str>) -> Transition {
        let mode = mode.unwrap_or(self.settings.mode);
        if mode == SearchMode::Off {
            return Transition::to(ResolverState::Disabled);
        }

        let backend_name = backend.unwrap_or(self.settings.backend.as_str());
        match BackendKind::parse(backend_name) {
            None => Transition::with(
                ResolverState::Disabled,
                format!(
                    "Web search disabled: unknown backend '{}' (expected 'self-hosted' or 'hosted-api')",
                    backend_name
                ),
            ),
            Some(BackendKind::HostedApi) if self.hosted_key.is_none() => Transition::with(
                ResolverState::Disabled,
                format!(
                    "Web search disabled: hosted search API selected but {} is not set",
                    self.settings.api_key_env
                ),
            ),
            Some(BackendKind::HostedApi) => {
                Transition::to(ResolverState::Resolved(BackendKind::HostedApi))
            }
            Some(BackendKind::SelfHosted) => Transition::to(ResolverState::Probing),
        }
    }

    /// Advance one non-terminal state. Terminal states map to themselves.
    pub async fn step(&self, state: ResolverState) -> Transition {
        match state {
            ResolverState::Probing => match self.probe.runtime_available().await {
                Ok(()) => Transition::to(ResolverState::Pinging),
                Err(reason) => self.fallback_or_disable(
                    format!("container runtime unavailable ({})", reason),
                    &format!(
                        "start {} and the self-hosted search service",
                        self.settings.runtime_command
                    ),
                ),
            },
            ResolverState::Pinging => {
                let endpoint = &self.settings.self_hosted_endpoint;
                match self.probe.ping(endpoint).await {
                    Ok(()) => Transition::to(ResolverState::Resolved(BackendKind::SelfHosted)),
                    Err(e) => {
                        let (reason, remediation) = describe_ping_failure(endpoint, &e);
                        self.fallback_or_disable(reason, &remediation)
                    }
                }
            }
            terminal => Transition::to(terminal),
        }
    }

    fn fallback_or_disable(&self, reason: String, remediation: &str) -> Transition {
        if self.settings.allow_fallback_to_hosted && self.hosted_key.is_some() {
            return Transition::with(
                ResolverState::Resolved(BackendKind::HostedApi),
                format!(
                    "Self-hosted search unavailable: {}. Falling back to the hosted search API; \
                     this may incur cost",
                    reason
                ),
            );
        }

        let fallback_hint = if self.settings.allow_fallback_to_hosted {
            format!("set {} to use the hosted fallback", self.settings.api_key_env)
        } else {
            format!(
                "or enable allowFallbackToHosted with {} set",
                self.settings.api_key_env
            )
        };

        Transition::with(
            ResolverState::Disabled,
            format!(
                "Web search disabled: self-hosted search unavailable: {}. To fix: {}; {}",
                reason, remediation, fallback_hint
            ),
        )
    }
}

fn describe_ping_failure(endpoint: &str, error: &SelfHostedError) -> (String, String) {
    match error {
        SelfHostedError::BotDetection => (
            format!("ping to {} was rejected with HTTP 403 (bot detection)", endpoint),
            "enable the JSON output format and disable the bot limiter in the service settings"
                .to_string(),
        ),
        SelfHostedError::HttpStatus(code) => (
            format!("ping to {} returned HTTP {}", endpoint, code),
            "check the service logs".to_string(),
        ),
        SelfHostedError::Unreachable(reason) => (
            format!("ping could not reach the service ({})", reason),
            format!("start the self-hosted search service at {}", endpoint),
        ),
        SelfHostedError::NonJson(snippet) => (
            format!("ping to {} returned a non-JSON body: {}", endpoint, snippet),
            "enable the JSON output format in the service settings".to_string(),
        ),
    }
}
