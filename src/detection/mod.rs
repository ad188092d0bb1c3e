//! L-shaped fiducial detection
//!
//! Luminance, Gaussian smoothing, Canny edges, dilation, external contours,
//! Douglas-Peucker simplification and a right-angle count per polygon.
//! Smoothing removes hairline-scale features along with scan noise.
//!
//! Marks much thinner than they are long (roughly 3.5:1 or more) can be
//! missed: the corners of a bar only a couple of dozen pixels thick lose a
//! few pixels to smoothing, which tilts the simplified edges out of the
//! right-angle band.

pub mod edges;
pub mod geometry;
pub mod selector;

pub use geometry::{simplify_closed, BoundingBox, Polygon};
pub use selector::{ranker_for, CandidateRanker, FirstMatch, LargestArea, NearestCorner};

use crate::config::DetectionConfig;
use crate::utils::image_conversion::to_luminance;
use image::{DynamicImage, GrayImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::distance_transform::Norm;
use edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::arc_length;
use imageproc::morphology::dilate;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// A simplified contour that passed the right-angle test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiducialCandidate {
    pub polygon: Polygon,
    /// Per-vertex angles in degrees; `None` where an edge had zero length.
    pub angles: Vec<Option<f64>>,
    pub right_angle_count: usize,
}

impl FiducialCandidate {
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        self.polygon.bounding_box()
    }
}

pub struct ShapeDetector {
    config: DetectionConfig,
}

impl Default for ShapeDetector {
    fn default() -> Self {
        Self::new(DetectionConfig::default())
    }
}

impl ShapeDetector {
    pub fn new(config: DetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Find L-shape candidates in contour scan order. An empty result is the
    /// normal "nothing found" outcome.
    pub fn detect(&self, image: &DynamicImage) -> Vec<FiducialCandidate> {
        let mask = self.edge_mask(&to_luminance(image));
        let contours: Vec<Contour<i32>> = find_contours(&mask);

        let external: Vec<&Contour<i32>> = contours
            .iter()
            .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
            .collect();

        let mut polygons = 0usize;
        let candidates: Vec<FiducialCandidate> = external
            .iter()
            .filter_map(|contour| self.simplify(contour))
            .inspect(|_| polygons += 1)
            .filter_map(|polygon| self.classify(polygon))
            .collect();

        debug!(
            width = image.width(),
            height = image.height(),
            contours = contours.len(),
            external_contours = external.len(),
            polygons_in_range = polygons,
            candidates = candidates.len(),
            "Shape detection completed"
        );

        candidates
    }

    /// Binary edge mask with small gaps closed, so one fiducial outline
    /// becomes one external contour.
    pub fn edge_mask(&self, gray: &GrayImage) -> GrayImage {
        let blurred = gaussian_blur_f32(gray, self.config.blur_sigma());
        let edges = canny(&blurred, self.config.canny_low, self.config.canny_high);
        if self.config.dilation_iterations == 0 {
            edges
        } else {
            dilate(&edges, Norm::LInf, self.config.dilation_iterations)
        }
    }

    /// Simplify a contour, keeping it only when the vertex count is in range.
    fn simplify(&self, contour: &Contour<i32>) -> Option<Polygon> {
        if contour.points.len() < 3 {
            trace!(points = contour.points.len(), "Skipping contour with too few points");
            return None;
        }

        let perimeter = arc_length(&contour.points, true);
        let epsilon = self.config.epsilon_fraction * perimeter;
        if epsilon <= 0.0 {
            trace!(perimeter, "Skipping zero-perimeter contour");
            return None;
        }

        let approx = simplify_closed(&contour.points, epsilon);
        if !(self.config.min_vertices..=self.config.max_vertices).contains(&approx.len()) {
            trace!(vertices = approx.len(), perimeter, "Polygon vertex count out of range");
            return None;
        }

        Some(Polygon::from_points(&approx))
    }

    fn classify(&self, polygon: Polygon) -> Option<FiducialCandidate> {
        let angles = polygon.interior_angles();
        let right_angle_count = angles
            .iter()
            .flatten()
            .filter(|a| self.config.is_right_angle(**a))
            .count();

        if right_angle_count < self.config.min_right_angles {
            trace!(
                vertices = polygon.len(),
                right_angles = right_angle_count,
                "Polygon rejected, not enough right angles"
            );
            return None;
        }

        Some(FiducialCandidate {
            polygon,
            angles,
            right_angle_count,
        })
    }

    /// Run the right-angle classification on an already simplified polygon.
    pub fn classify_polygon(&self, polygon: Polygon) -> Option<FiducialCandidate> {
        if !(self.config.min_vertices..=self.config.max_vertices).contains(&polygon.len()) {
            return None;
        }
        self.classify(polygon)
    }
}
