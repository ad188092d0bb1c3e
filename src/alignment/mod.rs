//! Scale-and-translate registration and alpha compositing.
//!
//! No rotation or shear term: artwork rotated relative to the template is not
//! corrected and will be misaligned.

pub mod composite;
pub mod transform;

pub use composite::{blend, Compositor, WarpedArtwork};
pub use transform::AffineTransform2D;
