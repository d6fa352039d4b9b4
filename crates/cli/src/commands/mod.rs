//! Command handlers for the RAG-o-Matic CLI.

pub mod ask;
pub mod doctor;
pub mod index;
pub mod stats;

// Re-export command types for convenience
pub use ask::AskCommand;
pub use doctor::DoctorCommand;
pub use index::IndexCommand;
pub use stats::StatsCommand;
