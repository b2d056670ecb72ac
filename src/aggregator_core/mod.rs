//! Aggregator Core - single-pass statistics over a post stream
//!
//! # Architecture
//!
//! ```text
//! mpsc::Receiver<StreamResult> → fold_stream
//!     ↓
//! RunningStatistics (count, min/max timestamp, dimension sum)
//!     ↓
//! AnalysisResult (+ first stream error, if any)
//! ```

pub mod fold;
pub mod running_stats;

pub use fold::fold_stream;
pub use running_stats::RunningStatistics;
