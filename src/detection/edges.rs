//! Canny edge detection over an image that has already been smoothed.
//!
//! `imageproc::edges::canny` blurs its input again with a fixed sigma of 1.4.
//! Stacked on the configured smoothing that rounds rectangle corners by
//! several pixels, so only the gradient, thinning and hysteresis steps are
//! done here.

use image::{GrayImage, Luma};
use imageproc::gradients::{horizontal_sobel, vertical_sobel};

/// Binary edge map (255 on edges) from Sobel gradients of `image`.
///
/// Magnitudes are `sqrt(gx^2 + gy^2)` of the unnormalised 3x3 Sobel
/// responses, so thresholds are on the same scale as `imageproc`'s `canny`.
pub fn canny(image: &GrayImage, low_threshold: f32, high_threshold: f32) -> GrayImage {
    let (width, height) = image.dimensions();
    let gx = horizontal_sobel(image);
    let gy = vertical_sobel(image);

    let magnitude: Vec<f32> = gx
        .iter()
        .zip(gy.iter())
        .map(|(h, v)| (*h as f32).hypot(*v as f32))
        .collect();

    let thinned = non_maximum_suppression(&magnitude, gx.as_raw(), gy.as_raw(), width as usize, height as usize);
    hysteresis(&thinned, width, height, low_threshold, high_threshold)
}

/// Keep only pixels that are local maxima across the gradient direction.
/// The one-pixel frame is always zero.
fn non_maximum_suppression(magnitude: &[f32], gx: &[i16], gy: &[i16], width: usize, height: usize) -> Vec<f32> {
    let mut out = vec![0.0; magnitude.len()];
    if width < 3 || height < 3 {
        return out;
    }

    let at = |x: usize, y: usize| y * width + x;
    for y in 1..height - 1 {
        for x in 1..width - 1 {
            let i = at(x, y);
            let mut angle = (gy[i] as f32).atan2(gx[i] as f32).to_degrees();
            if angle < 0.0 {
                angle += 180.0;
            }

            // neighbours along the gradient, quantised to 45 degree steps
            let (a, b) = if !(22.5..157.5).contains(&angle) {
                (at(x - 1, y), at(x + 1, y))
            } else if angle < 67.5 {
                (at(x + 1, y + 1), at(x - 1, y - 1))
            } else if angle < 112.5 {
                (at(x, y - 1), at(x, y + 1))
            } else {
                (at(x - 1, y + 1), at(x + 1, y - 1))
            };

            let m = magnitude[i];
            if m >= magnitude[a] && m >= magnitude[b] {
                out[i] = m;
            }
        }
    }
    out
}

/// Strong pixels plus every weak pixel 8-connected to one.
fn hysteresis(strength: &[f32], width: u32, height: u32, low: f32, high: f32) -> GrayImage {
    let (w, h) = (width as usize, height as usize);
    let mut edges = vec![false; strength.len()];
    let mut stack = Vec::new();

    for seed in 0..strength.len() {
        if edges[seed] || strength[seed] < high {
            continue;
        }
        edges[seed] = true;
        stack.push(seed);

        while let Some(i) = stack.pop() {
            let (x, y) = (i % w, i / w);
            for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                    let n = ny * w + nx;
                    if !edges[n] && strength[n] >= low {
                        edges[n] = true;
                        stack.push(n);
                    }
                }
            }
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        Luma([if edges[y as usize * w + x as usize] { 255 } else { 0 }])
    })
}
