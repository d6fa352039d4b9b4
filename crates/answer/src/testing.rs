//! Scripted collaborators shared by the tests in this crate.

use ragomatic_core::{AppError, AppResult};
use ragomatic_knowledge::{EpisodeMetadata, RetrievedPassage, Retriever};
use ragomatic_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage};
use ragomatic_websearch::{
    BackendKind, HealthProbe, SearchOutcome, SearchResult, SelfHostedError, WebSearch,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const WEAK_ANSWER: &str = "## Direct Answer\nNot found in provided context.\n\n## Indirect Insights\n- Pricing comes up in passing\n\n## Missing Information\n- A concrete pricing framework";

pub const STRONG_ANSWER: &str = "## Direct Answer\nMadhavan Ramanujam recommends talking about willingness to pay before building, then packaging into good, better and best tiers.\n\n## Indirect Insights\n- Price anchors are set in the first conversation\n\n## Missing Information\nNone.";

pub fn passages() -> Vec<RetrievedPassage> {
    let episode = |guest: &str, title: &str| EpisodeMetadata {
        guest: Some(guest.to_string()),
        title: Some(title.to_string()),
        publish_date: Some("2023-03-12".to_string()),
        ..Default::default()
    };

    vec![
        RetrievedPassage {
            text: "Talk about willingness to pay before you build.".to_string(),
            metadata: episode("Madhavan Ramanujam", "Pricing your product"),
            score: 0.82,
        },
        RetrievedPassage {
            text: "Good, better, best packaging works for most SaaS.".to_string(),
            metadata: episode("Madhavan Ramanujam", "Pricing your product"),
            score: 0.74,
        },
        RetrievedPassage {
            text: "We raised prices twice in the first year.".to_string(),
            metadata: episode("Elena Verna", "Growth loops"),
            score: 0.51,
        },
    ]
}

/// Replays canned completions in order; errors once the script runs out.
pub struct FakeLlm {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl FakeLlm {
    pub fn new(replies: Vec<&str>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().map(str::to_string).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.prompt.clone())
            .collect()
    }

    pub fn models(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.model.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl LlmClient for FakeLlm {
    fn provider_name(&self) -> &str {
        "fake"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let content = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| AppError::Llm("credit balance is too low".to_string()))?;

        Ok(LlmResponse {
            content,
            model: request.model.clone(),
            usage: LlmUsage::new(10, 5),
        })
    }
}

/// Returns a fixed outcome and counts calls.
pub struct FakeWeb {
    outcome: SearchOutcome,
    calls: AtomicUsize,
}

impl FakeWeb {
    pub fn with_results(n: usize) -> Self {
        let results = (1..=n)
            .map(|i| {
                SearchResult::new(
                    Some(format!("Pricing article {}", i)),
                    Some(format!("https://example.com/pricing-{}", i)),
                    Some("Value-based pricing explained".to_string()),
                )
            })
            .collect();
        Self::new(SearchOutcome::ok(results))
    }

    pub fn failing(error: &str) -> Self {
        Self::new(SearchOutcome::failed(error))
    }

    fn new(outcome: SearchOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl WebSearch for FakeWeb {
    async fn search(&self, _query: &str, _backend: BackendKind) -> SearchOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcome.clone()
    }
}

pub struct FakeProbe {
    runtime: Result<(), String>,
    calls: AtomicUsize,
}

impl FakeProbe {
    pub fn healthy() -> Self {
        Self {
            runtime: Ok(()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn no_runtime() -> Self {
        Self {
            runtime: Err("`docker` is not installed".to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl HealthProbe for FakeProbe {
    async fn runtime_available(&self) -> Result<(), String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.runtime.clone()
    }

    async fn ping(&self, _endpoint: &str) -> Result<(), SelfHostedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct FakeRetriever {
    passages: Vec<RetrievedPassage>,
    last_k: Mutex<Option<usize>>,
}

impl FakeRetriever {
    pub fn new(passages: Vec<RetrievedPassage>) -> Self {
        Self {
            passages,
            last_k: Mutex::new(None),
        }
    }

    pub fn last_k(&self) -> Option<usize> {
        *self.last_k.lock().unwrap()
    }
}

#[async_trait::async_trait]
impl Retriever for FakeRetriever {
    async fn retrieve(&self, _query: &str, k: usize) -> AppResult<Vec<RetrievedPassage>> {
        *self.last_k.lock().unwrap() = Some(k);
        Ok(self.passages.iter().take(k).cloned().collect())
    }
}
