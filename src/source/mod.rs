//! Page-to-raster collaborators.
//!
//! The comparison core only needs an RGB-ish raster per page. PDF rendering
//! lives behind [`RasterSource`]; [`ImageFileSource`] covers documents that
//! are already raster files.

use crate::error::SourceError;
use image::DynamicImage;
use std::path::Path;
use tracing::debug;

pub trait RasterSource: Send + Sync {
    /// Render `page_index` of `document` at `dpi` dots per inch.
    fn render_page(&self, document: &Path, page_index: usize, dpi: u32) -> Result<DynamicImage, SourceError>;
}

/// Treats a raster image file as a one-page document. The stored pixels are
/// used as-is; `dpi` does not resample them.
#[derive(Debug, Default, Clone, Copy)]
pub struct ImageFileSource;

impl RasterSource for ImageFileSource {
    fn render_page(&self, document: &Path, page_index: usize, dpi: u32) -> Result<DynamicImage, SourceError> {
        if page_index != 0 {
            return Err(SourceError::PageOutOfRange {
                path: document.to_path_buf(),
                page_index,
                page_count: 1,
            });
        }

        let image = image::open(document).map_err(|e| SourceError::Open {
            path: document.to_path_buf(),
            reason: e.to_string(),
        })?;

        debug!(
            document = %document.display(),
            width = image.width(),
            height = image.height(),
            dpi,
            "Loaded raster page"
        );
        Ok(image)
    }
}
