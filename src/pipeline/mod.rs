//! Analysis pipeline: shared types, deadline scopes and the orchestrator
//! that ties the stream reader to the aggregator.

pub mod analyzer;
pub mod scope;
pub mod types;

pub use analyzer::{AnalysisError, AnalyzerService, StreamAnalyzer};
pub use scope::DeadlineScope;
pub use types::{AnalysisResult, PostPayload, StreamResult, VALID_DIMENSIONS};
