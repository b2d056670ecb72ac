//! Constant-memory statistics over a stream of posts

use crate::pipeline::types::{AnalysisResult, PostPayload};

/// Running totals for one analysis request.
///
/// Posts are folded in one at a time and never retained.
#[derive(Debug, Clone)]
pub struct RunningStatistics {
    dimension: String,
    total_posts: u64,
    minimum_timestamp: i64,
    maximum_timestamp: i64,
    dimension_sum: u64,
    valid_dimension_count: u64,
}

impl RunningStatistics {
    pub fn new(dimension: impl Into<String>) -> Self {
        Self {
            dimension: dimension.into(),
            total_posts: 0,
            minimum_timestamp: 0,
            maximum_timestamp: 0,
            dimension_sum: 0,
            valid_dimension_count: 0,
        }
    }

    pub fn process_post(&mut self, post: &PostPayload) {
        self.total_posts += 1;

        if self.total_posts == 1 {
            self.minimum_timestamp = post.timestamp;
            self.maximum_timestamp = post.timestamp;
        } else {
            self.minimum_timestamp = self.minimum_timestamp.min(post.timestamp);
            self.maximum_timestamp = self.maximum_timestamp.max(post.timestamp);
        }

        if let Some(value) = post.dimension_value(&self.dimension) {
            self.dimension_sum = self.dimension_sum.saturating_add(value);
            self.valid_dimension_count += 1;
        }
    }

    pub fn total_posts(&self) -> u64 {
        self.total_posts
    }

    /// Finalize into a result; rounds the mean half away from zero
    pub fn to_result(&self) -> AnalysisResult {
        let average = if self.valid_dimension_count > 0 {
            (self.dimension_sum as f64 / self.valid_dimension_count as f64).round() as u64
        } else {
            0
        };

        AnalysisResult {
            total_posts: self.total_posts,
            minimum_timestamp: self.minimum_timestamp,
            maximum_timestamp: self.maximum_timestamp,
            average,
        }
    }
}
