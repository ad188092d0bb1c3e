use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

use crate::logging::LoggingConfig;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub comparison: ComparisonConfig,
    pub logging: LoggingConfig,
}

/// Everything a single template/artwork comparison needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    pub detection: DetectionConfig,
    pub selection: SelectionConfig,
    pub alignment: AlignmentConfig,
    /// Page rendered from each document by the raster source.
    pub page_index: usize,
    pub dpi: u32,
    /// Run the template and artwork detection passes on the rayon pool.
    pub parallel_detection: bool,
}

/// Fixed policy constants for the shape detector. Immutable once handed to
/// a [`crate::detection::ShapeDetector`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Gaussian kernel size (odd). Larger kernels give fewer, cleaner
    /// contours and drop fine features such as hairlines.
    pub blur_kernel_size: u32,
    pub canny_low: f32,
    pub canny_high: f32,
    pub dilation_iterations: u8,
    /// Douglas-Peucker tolerance as a fraction of contour perimeter.
    pub epsilon_fraction: f64,
    pub min_vertices: usize,
    pub max_vertices: usize,
    pub right_angle_min_degrees: f64,
    pub right_angle_max_degrees: f64,
    pub min_right_angles: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RankingStrategy {
    #[default]
    FirstMatch,
    LargestArea,
    NearestCorner,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SelectionConfig {
    pub ranking: RankingStrategy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResampleFilter {
    Nearest,
    #[default]
    Bilinear,
}

impl From<ResampleFilter> for imageproc::geometric_transformations::Interpolation {
    fn from(filter: ResampleFilter) -> Self {
        match filter {
            ResampleFilter::Nearest => Self::Nearest,
            ResampleFilter::Bilinear => Self::Bilinear,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BlendMode {
    /// Every pixel is blended, including black fill where the translated
    /// artwork does not reach.
    #[default]
    Flat,
    /// Pixels the translated artwork does not cover keep the template value.
    CoveredOnly,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    pub opacity: f32,
    pub filter: ResampleFilter,
    pub blend_mode: BlendMode,
}

impl Default for ComparisonConfig {
    fn default() -> Self {
        Self {
            detection: DetectionConfig::default(),
            selection: SelectionConfig::default(),
            alignment: AlignmentConfig::default(),
            page_index: 0,
            dpi: 300,
            parallel_detection: false,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            blur_kernel_size: 5,
            canny_low: 50.0,
            canny_high: 150.0,
            dilation_iterations: 2,
            epsilon_fraction: 0.02,
            min_vertices: 3,
            max_vertices: 4,
            right_angle_min_degrees: 85.0,
            right_angle_max_degrees: 95.0,
            min_right_angles: 2,
        }
    }
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            opacity: 0.5,
            filter: ResampleFilter::default(),
            blend_mode: BlendMode::default(),
        }
    }
}

impl DetectionConfig {
    /// Gaussian sigma for the configured kernel size, using the same
    /// size-to-sigma rule OpenCV applies when sigma is left at zero.
    pub fn blur_sigma(&self) -> f32 {
        0.3 * ((self.blur_kernel_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
    }

    pub fn is_right_angle(&self, degrees: f64) -> bool {
        (self.right_angle_min_degrees..=self.right_angle_max_degrees).contains(&degrees)
    }

    fn collect_errors(&self, errors: &mut Vec<String>) {
        if self.blur_kernel_size == 0 || self.blur_kernel_size % 2 == 0 {
            errors.push("Detection blur_kernel_size must be a positive odd number".to_string());
        }

        if self.canny_low <= 0.0 || self.canny_low > self.canny_high {
            errors.push("Detection canny thresholds must satisfy 0 < low <= high".to_string());
        }

        if !(self.epsilon_fraction > 0.0 && self.epsilon_fraction < 1.0) {
            errors.push("Detection epsilon_fraction must lie in (0, 1)".to_string());
        }

        if self.min_vertices < 3 || self.min_vertices > self.max_vertices {
            errors.push("Detection vertex range must satisfy 3 <= min <= max".to_string());
        }

        if self.right_angle_min_degrees < 0.0
            || self.right_angle_max_degrees > 180.0
            || self.right_angle_min_degrees > self.right_angle_max_degrees
        {
            errors.push("Detection right-angle band must be an ordered range inside [0, 180]".to_string());
        }

        if self.min_right_angles == 0 {
            errors.push("Detection min_right_angles must be positive".to_string());
        }
    }
}

impl ComparisonConfig {
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        self.detection.collect_errors(&mut errors);

        if !(0.0..=1.0).contains(&self.alignment.opacity) {
            errors.push("Alignment opacity must lie in [0, 1]".to_string());
        }

        if self.dpi == 0 {
            errors.push("Raster dpi must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;

        if content.trim_start().starts_with('{') {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(toml::from_str(&content)?)
        }
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P, format: ConfigFormat) -> Result<(), Box<dyn std::error::Error>> {
        let content = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(self)?,
            ConfigFormat::Toml => toml::to_string_pretty(self)?,
        };

        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = match self.comparison.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => errors,
        };

        if let Err(error) = self.logging.validate() {
            errors.push(error);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Clone)]
pub enum ConfigFormat {
    Json,
    Toml,
}

pub fn load_config_or_default(config_path: Option<&Path>) -> Config {
    match config_path {
        Some(path) => match Config::load_from_file(path) {
            Ok(config) => {
                if let Err(errors) = config.validate() {
                    for error in errors {
                        warn!(path = %path.display(), "Configuration validation error: {}", error);
                    }
                    warn!("Using default configuration instead.");
                    Config::default()
                } else {
                    config
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load config, using default configuration");
                Config::default()
            }
        },
        None => Config::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.comparison.detection.blur_kernel_size, 5);
        assert_eq!(config.comparison.selection.ranking, RankingStrategy::FirstMatch);
        assert_eq!(config.comparison.alignment.opacity, 0.5);
        assert_eq!(config.comparison.dpi, 300);
    }

    #[test]
    fn test_blur_sigma_matches_kernel_rule() {
        let detection = DetectionConfig::default();
        assert!((detection.blur_sigma() - 1.1).abs() < 1e-6);
    }

    #[test]
    fn test_validation_collects_every_problem() {
        let mut config = ComparisonConfig::default();
        config.detection.blur_kernel_size = 4;
        config.detection.canny_low = 200.0;
        config.alignment.opacity = 1.5;

        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_toml_round_trip_through_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fidalign.toml");

        let mut config = Config::default();
        config.comparison.selection.ranking = RankingStrategy::LargestArea;
        config.comparison.alignment.blend_mode = BlendMode::CoveredOnly;
        config.save_to_file(&path, ConfigFormat::Toml).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.comparison.selection.ranking, RankingStrategy::LargestArea);
        assert_eq!(loaded.comparison.alignment.blend_mode, BlendMode::CoveredOnly);
        assert_eq!(loaded.comparison.detection, config.comparison.detection);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fidalign.json");
        fs::write(&path, r#"{ "comparison": { "detection": { "canny_low": 30.0 } } }"#).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.comparison.detection.canny_low, 30.0);
        assert_eq!(loaded.comparison.detection.canny_high, 150.0);
        assert_eq!(loaded.comparison.dpi, 300);
    }

    #[test]
    fn test_invalid_file_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[comparison]\ndpi = 0\n").unwrap();

        let config = load_config_or_default(Some(&path));
        assert_eq!(config.comparison.dpi, 300);
    }
}
