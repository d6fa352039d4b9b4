//! Answer orchestration for RAG-o-Matic.
//!
//! - [`quality`]: decides whether a corpus-only answer is weak
//! - [`AnswerComposer`]: generation with one optional web-augmented retry
//! - [`PersonaTransformer`]: platform-bounded rewrite of the final sections
//! - [`answer_query`]: the whole flow behind `ragomatic ask`

pub mod composer;
pub mod context;
pub mod persona;
pub mod pipeline;
pub mod quality;
pub mod sections;

#[cfg(test)]
mod testing;

pub use composer::{AnswerComposer, ComposeRequest, Composition};
pub use context::{render_corpus_context, render_web_block};
pub use persona::{bound_to_max, render_persona_block, PersonaOutput, PersonaRequest, PersonaTransformer};
pub use pipeline::{answer_query, AskRequest, Collaborators, FinalAnswer, PersonaBlock};
pub use sections::{SectionKind, StructuredAnswer};
