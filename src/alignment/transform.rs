use crate::detection::BoundingBox;
use crate::error::ImageRole;
use crate::{CompareError, Result};
use imageproc::geometric_transformations::Projection;
use serde::{Deserialize, Serialize};

/// Independent per-axis scale plus translation, mapping artwork pixel
/// coordinates into template space: `x' = sx * x + tx`, `y' = sy * y + ty`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform2D {
    pub sx: f64,
    pub sy: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for AffineTransform2D {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform2D {
    pub fn identity() -> Self {
        Self {
            sx: 1.0,
            sy: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    /// Register the artwork fiducial box onto the template fiducial box.
    ///
    /// Scale is the ratio of box sizes per axis (aspect ratio is not
    /// preserved); translation lines up the boxes' top-left corners after
    /// scaling.
    pub fn from_boxes(template: &BoundingBox, artwork: &BoundingBox) -> Result<Self> {
        ensure_usable(template, ImageRole::Template)?;
        ensure_usable(artwork, ImageRole::Artwork)?;

        let sx = template.width as f64 / artwork.width as f64;
        let sy = template.height as f64 / artwork.height as f64;

        Ok(Self {
            sx,
            sy,
            tx: template.x as f64 - artwork.x as f64 * sx,
            ty: template.y as f64 - artwork.y as f64 * sy,
        })
    }

    pub fn apply(&self, point: (f64, f64)) -> (f64, f64) {
        (self.sx * point.0 + self.tx, self.sy * point.1 + self.ty)
    }

    /// Size of an artwork raster after scaling, rounded per axis.
    pub fn scaled_size(&self, width: u32, height: u32) -> (u32, u32) {
        (
            (width as f64 * self.sx).round() as u32,
            (height as f64 * self.sy).round() as u32,
        )
    }

    /// The same mapping as an `imageproc` projection: scale, then shift.
    pub fn projection(&self) -> Projection {
        Projection::translate(self.tx as f32, self.ty as f32) * Projection::scale(self.sx as f32, self.sy as f32)
    }
}

fn ensure_usable(bbox: &BoundingBox, image: ImageRole) -> Result<()> {
    if bbox.is_degenerate() {
        return Err(CompareError::DegenerateGeometry {
            image,
            width: bbox.width,
            height: bbox.height,
        });
    }
    Ok(())
}
