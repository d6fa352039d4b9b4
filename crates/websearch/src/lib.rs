//! Web search augmentation.
//!
//! - [`ProviderResolver`]: picks a usable backend, or none, with diagnostics
//! - [`WebSearchClient`]: one query against the resolved backend
//! - [`HealthProbe`]: runtime and reachability checks, injectable for tests

pub mod client;
pub mod probe;
pub mod resolver;
pub mod types;

pub use client::{SelfHostedError, WebSearch, WebSearchClient, USER_AGENT};
pub use probe::{HealthProbe, SystemProbe};
pub use resolver::{ProviderResolver, ResolverState, Transition};
pub use types::{BackendKind, ResolutionOutcome, SearchOutcome, SearchResult};
