//! Runweave retrieval-and-grading pipeline
//!
//! Answers one user question with grounded, citation-ready source material:
//!
//! ```text
//! query expansion -> parallel semantic search -> dedup -> relevance grading -> assembly
//! ```
//!
//! The two fan-out points (per-sub-query retrieval, per-candidate grading) use
//! structured join primitives so each step completes all-or-nothing before the
//! next begins. No shared mutable state crosses parallel tasks; every task owns
//! its input and output and the orchestrator joins the results.

pub mod assemble;
pub mod dedup;
pub mod expander;
pub mod grader;
pub mod model;
pub mod pipeline;
pub mod store;

pub use assemble::assemble_results;
pub use dedup::dedup_candidates;
pub use expander::QueryExpander;
pub use grader::RelevanceGrader;
pub use model::{CompletionModel, OpenAICompatibleModel, ScriptedModel};
pub use pipeline::{RetrievalPipeline, RetrievalPipelineBuilder};
pub use store::{HttpKnowledgeStore, InMemoryKnowledgeStore, KnowledgeStore, SearchFilter};
