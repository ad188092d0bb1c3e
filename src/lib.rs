pub mod alignment;
pub mod config;
pub mod detection;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod source;
pub mod utils;
pub mod visualization;

pub use alignment::{AffineTransform2D, Compositor};
pub use config::{ComparisonConfig, Config, DetectionConfig, RankingStrategy};
pub use detection::{BoundingBox, CandidateRanker, FiducialCandidate, Polygon, ShapeDetector};
pub use error::{CompareError, ImageRole, SourceError};
pub use pipeline::{compare, CompositeResult, FiducialComparator};
pub use source::{ImageFileSource, RasterSource};

pub type Result<T, E = CompareError> = std::result::Result<T, E>;
