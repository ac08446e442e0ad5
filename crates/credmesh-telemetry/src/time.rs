//! A RAII timer that reports elapsed seconds to a credibility-scoring
//! sink when dropped, for wrapping a scan/score pass without threading a
//! `start` timestamp through every return path.

use std::time::Instant;

use crate::sinks::CredibilityMetricsSink;

pub struct ScoringTimer<'a> {
    sink: &'a dyn CredibilityMetricsSink,
    start: Instant,
}

impl<'a> ScoringTimer<'a> {
    pub fn new(sink: &'a dyn CredibilityMetricsSink) -> Self {
        Self {
            sink,
            start: Instant::now(),
        }
    }
}

impl Drop for ScoringTimer<'_> {
    fn drop(&mut self) {
        self.sink.observe_scoring_duration(self.start.elapsed().as_secs_f64());
    }
}
