use super::AffineTransform2D;
use crate::config::{AlignmentConfig, BlendMode};
use crate::error::ImageRole;
use crate::utils::image_conversion::normalize_channels;
use crate::{CompareError, Result};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::geometric_transformations::warp_into_with;
use tracing::debug;

/// Artwork resampled into template space.
pub struct WarpedArtwork {
    pub image: RgbImage,
    /// Pixels `[x0, x1) x [y0, y1)` carry artwork; everything else is black fill.
    pub covered: (u32, u32, u32, u32),
}

impl WarpedArtwork {
    pub fn is_covered(&self, x: u32, y: u32) -> bool {
        let (x0, y0, x1, y1) = self.covered;
        x >= x0 && x < x1 && y >= y0 && y < y1
    }
}

/// Scales, translates and alpha-blends artwork over a template.
pub struct Compositor {
    config: AlignmentConfig,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new(AlignmentConfig::default())
    }
}

impl Compositor {
    pub fn new(config: AlignmentConfig) -> Self {
        Self { config }
    }

    pub fn composite(
        &self,
        template: &DynamicImage,
        artwork: &DynamicImage,
        transform: &AffineTransform2D,
        opacity: f32,
    ) -> Result<RgbImage> {
        validate_opacity(opacity)?;

        let template = normalize_channels(template);
        let warped = self.warp(&normalize_channels(artwork), transform, template.dimensions())?;

        debug!(
            covered = ?warped.covered,
            opacity,
            blend_mode = ?self.config.blend_mode,
            "Blending artwork over template"
        );

        Ok(blend(&template, &warped, opacity, self.config.blend_mode))
    }

    /// Sample the artwork through `transform` straight into a black canvas of
    /// `canvas_size`. Memory follows the canvas, whatever the scale factor.
    pub fn warp(
        &self,
        artwork: &RgbImage,
        transform: &AffineTransform2D,
        canvas_size: (u32, u32),
    ) -> Result<WarpedArtwork> {
        let (width, height) = artwork.dimensions();
        let (scaled_width, scaled_height) = transform.scaled_size(width, height);
        if scaled_width == 0 || scaled_height == 0 {
            return Err(CompareError::DegenerateGeometry {
                image: ImageRole::Artwork,
                width: scaled_width,
                height: scaled_height,
            });
        }

        let inverse = transform.projection().invert();
        let (w, h) = (width as f32, height as f32);
        let inside = |u: f32, extent: f32| u >= 0.0 && u < extent;

        let (cw, ch) = canvas_size;
        let (x0, x1) = covered_span(cw, |x| inside((inverse * (x as f32, 0.0)).0, w));
        let (y0, y1) = covered_span(ch, |y| inside((inverse * (0.0, y as f32)).1, h));

        // pre-images outside the artwork go to (-1, -1), which every
        // interpolation maps to the default pixel
        let mapping = move |x: f32, y: f32| {
            let (u, v) = inverse * (x, y);
            if inside(u, w) && inside(v, h) {
                (u, v)
            } else {
                (-1.0, -1.0)
            }
        };

        let mut canvas = RgbImage::new(cw, ch);
        warp_into_with(
            &pad_edges(artwork),
            mapping,
            self.config.filter.into(),
            Rgb([0, 0, 0]),
            &mut canvas,
        );

        Ok(WarpedArtwork {
            image: canvas,
            covered: (x0, y0, x1, y1),
        })
    }
}

/// First and one-past-last index in `0..len` accepted by `inside`; the
/// accepted indices are contiguous because the mapping is monotonic.
fn covered_span(len: u32, inside: impl Fn(u32) -> bool) -> (u32, u32) {
    let mut accepted = (0..len).filter(|&i| inside(i));
    match accepted.next() {
        Some(first) => (first, accepted.last().unwrap_or(first) + 1),
        None => (0, 0),
    }
}

/// Copy with the last column and row repeated once, so bilinear sampling
/// has a right and lower neighbour for every artwork pixel.
fn pad_edges(image: &RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    RgbImage::from_fn(width + 1, height + 1, |x, y| {
        *image.get_pixel(x.min(width - 1), y.min(height - 1))
    })
}

pub(crate) fn validate_opacity(opacity: f32) -> Result<()> {
    if !opacity.is_finite() || !(0.0..=1.0).contains(&opacity) {
        return Err(CompareError::InvalidOpacity(opacity));
    }
    Ok(())
}

/// `out = template * (1 - alpha) + artwork * alpha`, rounded per channel.
pub fn blend(template: &RgbImage, warped: &WarpedArtwork, opacity: f32, mode: BlendMode) -> RgbImage {
    let alpha = opacity as f64;
    RgbImage::from_fn(template.width(), template.height(), |x, y| {
        let t = template.get_pixel(x, y);
        if mode == BlendMode::CoveredOnly && !warped.is_covered(x, y) {
            return *t;
        }

        let a = warped.image.get_pixel(x, y);
        let mix = |c: usize| (t[c] as f64 * (1.0 - alpha) + a[c] as f64 * alpha).round().clamp(0.0, 255.0) as u8;
        Rgb([mix(0), mix(1), mix(2)])
    })
}
