use fiducial_align::alignment::{AffineTransform2D, Compositor};
use fiducial_align::config::{AlignmentConfig, BlendMode, ResampleFilter};
use fiducial_align::detection::BoundingBox;
use fiducial_align::utils::normalize_channels;
use fiducial_align::{CompareError, ImageRole};
use image::{DynamicImage, Rgb, RgbImage};

fn gradient(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 256) as u8, (y * 5 % 256) as u8, ((x + y) % 256) as u8])
    }))
}

#[test]
fn test_identical_boxes_give_identity_and_flat_blend() {
    let b = BoundingBox::new(14, 9, 40, 25);
    let transform = AffineTransform2D::from_boxes(&b, &b).unwrap();
    assert_eq!((transform.sx, transform.sy, transform.tx, transform.ty), (1.0, 1.0, 0.0, 0.0));

    let template = gradient(64, 48);
    let artwork = DynamicImage::ImageRgb8(RgbImage::from_fn(64, 48, |x, y| Rgb([255 - x as u8, 100, y as u8])));
    let out = Compositor::default().composite(&template, &artwork, &transform, 0.5).unwrap();

    let (t, a) = (template.to_rgb8(), artwork.to_rgb8());
    for (x, y, p) in out.enumerate_pixels() {
        for c in 0..3 {
            let expected = (t.get_pixel(x, y)[c] as f64 * 0.5 + a.get_pixel(x, y)[c] as f64 * 0.5).round() as u8;
            assert_eq!(p[c], expected, "pixel ({x}, {y}) channel {c}");
        }
    }
}

#[test]
fn test_width_ratio_sets_scale() {
    let template = BoundingBox::new(10, 10, 200, 80);
    let artwork = BoundingBox::new(5, 10, 100, 80);
    let transform = AffineTransform2D::from_boxes(&template, &artwork).unwrap();
    assert_eq!(transform.sx, 2.0);
    assert_eq!(transform.sy, 1.0);
    assert_eq!(transform.tx, 0.0);
    assert_eq!(transform.ty, 0.0);
}

#[test]
fn test_zero_width_box_is_degenerate() {
    let template = BoundingBox::new(0, 0, 50, 50);
    let artwork = BoundingBox::new(0, 0, 0, 50);
    let err = AffineTransform2D::from_boxes(&template, &artwork).unwrap_err();
    assert!(matches!(
        err,
        CompareError::DegenerateGeometry { image: ImageRole::Artwork, width: 0, height: 50 }
    ));
}

#[test]
fn test_opacity_zero_returns_template() {
    let template = gradient(50, 40);
    let artwork = gradient(25, 20);
    let transform = AffineTransform2D { sx: 2.0, sy: 2.0, tx: 3.0, ty: -2.0 };

    let out = Compositor::default().composite(&template, &artwork, &transform, 0.0).unwrap();
    assert_eq!(out, template.to_rgb8());
}

#[test]
fn test_opacity_one_returns_warped_artwork() {
    let template = gradient(50, 40);
    let artwork = gradient(25, 20);
    let transform = AffineTransform2D { sx: 2.0, sy: 1.5, tx: 4.0, ty: 6.0 };
    let compositor = Compositor::default();

    let out = compositor.composite(&template, &artwork, &transform, 1.0).unwrap();
    let warped = compositor.warp(&normalize_channels(&artwork), &transform, (50, 40)).unwrap();
    assert_eq!(out, warped.image);

    // uncovered margin is background fill
    assert_eq!(*out.get_pixel(0, 0), Rgb([0, 0, 0]));
}

#[test]
fn test_covered_only_blend_keeps_template_margin() {
    let template = gradient(50, 40);
    let artwork = gradient(10, 10);
    let transform = AffineTransform2D { sx: 1.0, sy: 1.0, tx: 20.0, ty: 20.0 };
    let compositor = Compositor::new(AlignmentConfig {
        blend_mode: BlendMode::CoveredOnly,
        filter: ResampleFilter::Nearest,
        ..AlignmentConfig::default()
    });

    let out = compositor.composite(&template, &artwork, &transform, 1.0).unwrap();
    let t = template.to_rgb8();
    assert_eq!(out.get_pixel(5, 5), t.get_pixel(5, 5));
    assert_eq!(out.get_pixel(20, 20), artwork.to_rgb8().get_pixel(0, 0));
}

#[test]
fn test_negative_translation_clips_artwork() {
    let transform = AffineTransform2D { sx: 1.0, sy: 1.0, tx: -5.0, ty: -5.0 };
    let artwork = RgbImage::from_pixel(20, 20, Rgb([9, 9, 9]));
    let warped = Compositor::default().warp(&artwork, &transform, (30, 30)).unwrap();
    assert_eq!(warped.covered, (0, 0, 15, 15));
    assert_eq!(*warped.image.get_pixel(14, 14), Rgb([9, 9, 9]));
    assert_eq!(*warped.image.get_pixel(15, 15), Rgb([0, 0, 0]));
}
