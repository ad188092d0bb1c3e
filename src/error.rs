use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Which side of a comparison an error or fiducial belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageRole {
    Template,
    Artwork,
}

impl fmt::Display for ImageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageRole::Template => f.write_str("template"),
            ImageRole::Artwork => f.write_str("artwork"),
        }
    }
}

/// Failures reported by a [`crate::source::RasterSource`].
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot open document {path}: {reason}")]
    Open { path: PathBuf, reason: String },

    #[error("page {page_index} out of range for {path} ({page_count} page(s))")]
    PageOutOfRange {
        path: PathBuf,
        page_index: usize,
        page_count: usize,
    },
}

/// Errors produced by a comparison.
#[derive(Debug, Error)]
pub enum CompareError {
    /// No qualifying fiducial in one or both images. Recoverable: the caller
    /// may retry with different detection parameters.
    #[error(
        "no fiducial found (template candidates: {template_candidates}, artwork candidates: {artwork_candidates})"
    )]
    NotFound {
        template_candidates: usize,
        artwork_candidates: usize,
    },

    #[error("degenerate {image} fiducial: bounding box is {width}x{height}, scale is undefined")]
    DegenerateGeometry {
        image: ImageRole,
        width: u32,
        height: u32,
    },

    #[error("opacity must lie in [0, 1], got {0}")]
    InvalidOpacity(f32),

    #[error("raster source failed: {0}")]
    Source(#[from] SourceError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl CompareError {
    /// True for the "nothing found" outcome, which callers usually report
    /// rather than treat as a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CompareError::NotFound { .. })
    }
}
