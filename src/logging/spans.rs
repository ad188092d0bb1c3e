//! Structured spans for a comparison run
//!
//! One `comparison` span per template/artwork pair, with a nested `pipeline_stage`
//! span per step, so every event carries the correlation id of its run.

use instant::Instant;
use tracing::field::Empty;
use tracing::{span, Level, Span};
use uuid::Uuid;

/// Span covering a whole template/artwork comparison
pub struct ComparisonSpan {
    span: Span,
    start_time: Instant,
    correlation_id: Uuid,
}

impl ComparisonSpan {
    pub fn new(correlation_id: Uuid, template_size: (u32, u32), artwork_size: (u32, u32)) -> Self {
        let span = span!(
            Level::INFO,
            "comparison",
            correlation_id = %correlation_id,
            template_width = template_size.0,
            template_height = template_size.1,
            artwork_width = artwork_size.0,
            artwork_height = artwork_size.1,
            template_candidates = Empty,
            artwork_candidates = Empty,
            scale_x = Empty,
            scale_y = Empty,
            translation_x = Empty,
            translation_y = Empty,
            success = Empty,
            execution_time_ms = Empty
        );

        Self {
            span,
            start_time: Instant::now(),
            correlation_id,
        }
    }

    /// Record how many fiducial candidates each image produced
    pub fn record_candidates(&self, template_candidates: usize, artwork_candidates: usize) {
        self.span.record("template_candidates", template_candidates);
        self.span.record("artwork_candidates", artwork_candidates);
        tracing::debug!(
            parent: &self.span,
            template_candidates = template_candidates,
            artwork_candidates = artwork_candidates,
            "Fiducial detection completed"
        );
    }

    /// Record the registration transform
    pub fn record_transform(&self, sx: f64, sy: f64, tx: f64, ty: f64) {
        self.span.record("scale_x", sx);
        self.span.record("scale_y", sy);
        self.span.record("translation_x", tx);
        self.span.record("translation_y", ty);
        tracing::debug!(
            parent: &self.span,
            scale = format!("({:.4}, {:.4})", sx, sy),
            translation = format!("({:.2}, {:.2})", tx, ty),
            "Registration transform computed"
        );
    }

    /// Record the final outcome
    pub fn record_result(&self, success: bool, description: &str) {
        let duration = self.start_time.elapsed();
        self.span.record("success", success);
        self.span.record("execution_time_ms", duration.as_secs_f64() * 1000.0);

        tracing::info!(
            parent: &self.span,
            success = success,
            execution_time_ms = duration.as_millis(),
            description = description,
            "Comparison finished"
        );
    }

    pub fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

/// Span for a single pipeline stage
pub struct StageSpan {
    span: Span,
    start_time: Instant,
    stage_name: &'static str,
}

impl StageSpan {
    pub fn new(stage_name: &'static str, correlation_id: Option<Uuid>) -> Self {
        let span = if let Some(corr_id) = correlation_id {
            span!(
                Level::DEBUG,
                "pipeline_stage",
                stage = stage_name,
                correlation_id = %corr_id,
                execution_time_ms = Empty
            )
        } else {
            span!(
                Level::DEBUG,
                "pipeline_stage",
                stage = stage_name,
                execution_time_ms = Empty
            )
        };

        Self {
            span,
            start_time: Instant::now(),
            stage_name,
        }
    }

    /// Close out the stage and return its wall time in milliseconds
    pub fn finish(&self) -> f64 {
        let duration_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        self.span.record("execution_time_ms", duration_ms);
        tracing::debug!(
            parent: &self.span,
            stage = self.stage_name,
            execution_time_ms = duration_ms,
            "Pipeline stage completed"
        );
        duration_ms
    }

    pub fn stage_name(&self) -> &'static str {
        self.stage_name
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comparison_span_records_without_subscriber() {
        let correlation_id = Uuid::new_v4();
        let span = ComparisonSpan::new(correlation_id, (640, 480), (320, 240));

        let _enter = span.enter();
        span.record_candidates(2, 1);
        span.record_transform(2.0, 2.0, -4.0, 6.0);
        span.record_result(true, "composite produced");
        assert_eq!(span.correlation_id(), correlation_id);
    }

    #[test]
    fn test_stage_span_reports_duration() {
        let span = StageSpan::new("detect", None);
        let elapsed = span.finish();
        assert!(elapsed >= 0.0);
        assert_eq!(span.stage_name(), "detect");
    }
}
