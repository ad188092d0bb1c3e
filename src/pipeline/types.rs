use crate::alignment::AffineTransform2D;
use crate::detection::{BoundingBox, FiducialCandidate, Polygon};
use crate::utils::image_conversion::save_image;
use crate::Result;
use image::RgbImage;
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// The fiducial chosen for one side of the comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedFiducial {
    pub polygon: Polygon,
    pub bounding_box: BoundingBox,
    pub right_angle_count: usize,
    /// Candidates the detector produced for this image.
    pub candidates_found: usize,
}

impl SelectedFiducial {
    pub(crate) fn new(candidate: &FiducialCandidate, bounding_box: BoundingBox, candidates_found: usize) -> Self {
        Self {
            polygon: candidate.polygon.clone(),
            bounding_box,
            right_angle_count: candidate.right_angle_count,
            candidates_found,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageTime {
    pub stage_name: String,
    pub duration_ms: f64,
}

/// Where a composite came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub correlation_id: Uuid,
    pub template: SelectedFiducial,
    pub artwork: SelectedFiducial,
    pub transform: AffineTransform2D,
    pub opacity: f32,
    pub ranking: String,
    pub stage_timings: Vec<StageTime>,
}

/// Blended output of a comparison plus the fiducials that anchored it.
#[derive(Debug, Clone)]
pub struct CompositeResult {
    pub image: RgbImage,
    pub provenance: Provenance,
}

impl CompositeResult {
    /// Write the composite; format follows the file extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        save_image(&self.image, path.as_ref())
    }

    pub fn report(&self) -> ComparisonReport {
        ComparisonReport {
            width: self.image.width(),
            height: self.image.height(),
            provenance: self.provenance.clone(),
        }
    }
}

/// Serializable summary of a composite, without pixel data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub width: u32,
    pub height: u32,
    #[serde(flatten)]
    pub provenance: Provenance,
}
