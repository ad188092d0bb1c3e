use crate::alignment::composite::validate_opacity;
use crate::alignment::{AffineTransform2D, Compositor};
use crate::config::ComparisonConfig;
use crate::detection::{ranker_for, CandidateRanker, FiducialCandidate, ShapeDetector};
use crate::error::ImageRole;
use crate::logging::{new_correlation_id, ComparisonSpan, StageSpan};
use crate::pipeline::{CompositeResult, Provenance, SelectedFiducial, StageTime};
use crate::source::RasterSource;
use crate::{CompareError, Result};
use image::{DynamicImage, GenericImageView};
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

/// Runs detection, selection and compositing for a template/artwork pair.
///
/// If either image has no fiducial candidate the comparison stops with
/// [`CompareError::NotFound`]. Detection is deterministic, so nothing is
/// retried.
pub struct FiducialComparator {
    config: ComparisonConfig,
    detector: ShapeDetector,
    ranker: Box<dyn CandidateRanker>,
    compositor: Compositor,
}

impl FiducialComparator {
    pub fn new(config: ComparisonConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|errors| CompareError::Config(errors.join("; ")))?;

        Ok(Self {
            detector: ShapeDetector::new(config.detection.clone()),
            ranker: ranker_for(config.selection.ranking),
            compositor: Compositor::new(config.alignment.clone()),
            config,
        })
    }

    /// Replace the configured ranking strategy with a custom one.
    pub fn with_ranker(mut self, ranker: Box<dyn CandidateRanker>) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn config(&self) -> &ComparisonConfig {
        &self.config
    }

    pub fn detect(&self, image: &DynamicImage) -> Vec<FiducialCandidate> {
        self.detector.detect(image)
    }

    /// Render both documents through `source` and compare them with the
    /// configured page, dpi and opacity.
    pub fn compare_documents(
        &self,
        source: &dyn RasterSource,
        template_document: &Path,
        artwork_document: &Path,
    ) -> Result<CompositeResult> {
        let template = source.render_page(template_document, self.config.page_index, self.config.dpi)?;
        let artwork = source.render_page(artwork_document, self.config.page_index, self.config.dpi)?;
        self.compare(&template, &artwork, self.config.alignment.opacity)
    }

    pub fn compare(&self, template: &DynamicImage, artwork: &DynamicImage, opacity: f32) -> Result<CompositeResult> {
        let correlation_id = new_correlation_id();
        let span = ComparisonSpan::new(correlation_id, template.dimensions(), artwork.dimensions());
        let _guard = span.enter();

        let outcome = self.run(&span, template, artwork, opacity);
        match &outcome {
            Ok(_) => span.record_result(true, "composite produced"),
            Err(e) if e.is_not_found() => {
                warn!(error = %e, "No fiducial found in one or both images");
                span.record_result(false, "no fiducial found");
            }
            Err(e) => span.record_result(false, &e.to_string()),
        }
        outcome
    }

    fn run(
        &self,
        span: &ComparisonSpan,
        template: &DynamicImage,
        artwork: &DynamicImage,
        opacity: f32,
    ) -> Result<CompositeResult> {
        validate_opacity(opacity)?;

        let correlation_id = span.correlation_id();
        let mut timings = Vec::new();

        let (template_candidates, artwork_candidates) = timed("detect", correlation_id, &mut timings, || {
            if self.config.parallel_detection {
                rayon::join(|| self.detector.detect(template), || self.detector.detect(artwork))
            } else {
                (self.detector.detect(template), self.detector.detect(artwork))
            }
        });
        span.record_candidates(template_candidates.len(), artwork_candidates.len());

        if template_candidates.is_empty() || artwork_candidates.is_empty() {
            return Err(CompareError::NotFound {
                template_candidates: template_candidates.len(),
                artwork_candidates: artwork_candidates.len(),
            });
        }

        let counts = (template_candidates.len(), artwork_candidates.len());
        let (template_fiducial, artwork_fiducial) = timed("select", correlation_id, &mut timings, || {
            Ok::<_, CompareError>((
                self.select(&template_candidates, ImageRole::Template, counts)?,
                self.select(&artwork_candidates, ImageRole::Artwork, counts)?,
            ))
        })?;

        let transform = timed("align", correlation_id, &mut timings, || {
            AffineTransform2D::from_boxes(&template_fiducial.bounding_box, &artwork_fiducial.bounding_box)
        })?;
        span.record_transform(transform.sx, transform.sy, transform.tx, transform.ty);

        let image = timed("composite", correlation_id, &mut timings, || {
            self.compositor.composite(template, artwork, &transform, opacity)
        })?;

        info!(
            template_box = ?template_fiducial.bounding_box,
            artwork_box = ?artwork_fiducial.bounding_box,
            ranking = self.ranker.name(),
            "Artwork aligned onto template"
        );

        Ok(CompositeResult {
            image,
            provenance: Provenance {
                correlation_id,
                template: template_fiducial,
                artwork: artwork_fiducial,
                transform,
                opacity,
                ranking: self.ranker.name().to_string(),
                stage_timings: timings,
            },
        })
    }

    /// A ranker that declines every candidate counts as nothing found.
    fn select(
        &self,
        candidates: &[FiducialCandidate],
        role: ImageRole,
        counts: (usize, usize),
    ) -> Result<SelectedFiducial> {
        let chosen = self.ranker.select(candidates).ok_or(CompareError::NotFound {
            template_candidates: counts.0,
            artwork_candidates: counts.1,
        })?;

        let bounding_box = chosen.bounding_box().ok_or(CompareError::DegenerateGeometry {
            image: role,
            width: 0,
            height: 0,
        })?;

        Ok(SelectedFiducial::new(chosen, bounding_box, candidates.len()))
    }
}

/// Compare with the default configuration.
pub fn compare(template: &DynamicImage, artwork: &DynamicImage, opacity: f32) -> Result<CompositeResult> {
    FiducialComparator::new(ComparisonConfig::default())?.compare(template, artwork, opacity)
}

fn timed<T>(stage: &'static str, correlation_id: Uuid, timings: &mut Vec<StageTime>, f: impl FnOnce() -> T) -> T {
    let stage_span = StageSpan::new(stage, Some(correlation_id));
    let value = {
        let _enter = stage_span.enter();
        f()
    };
    timings.push(StageTime {
        stage_name: stage.to_string(),
        duration_ms: stage_span.finish(),
    });
    value
}
