use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fiducial_align::alignment::{AffineTransform2D, Compositor};
use fiducial_align::detection::ShapeDetector;
use image::{DynamicImage, Rgb, RgbImage};

fn page(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let mark = x >= width / 8 && x < width / 3 && y >= height / 10 && y < height / 4;
        let text = y % 24 < 3 && x % 40 < 30 && y > height / 2;
        if mark || text {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    }))
}

fn bench_detection(c: &mut Criterion) {
    let detector = ShapeDetector::default();
    let small = page(640, 480);
    let letter = page(1275, 1650);

    c.bench_function("detect_640x480", |b| b.iter(|| detector.detect(black_box(&small))));
    c.bench_function("detect_letter_150dpi", |b| b.iter(|| detector.detect(black_box(&letter))));
}

fn bench_composite(c: &mut Criterion) {
    let compositor = Compositor::default();
    let template = page(1275, 1650);
    let artwork = page(850, 1100);
    let transform = AffineTransform2D { sx: 1.5, sy: 1.5, tx: 4.0, ty: -3.0 };

    c.bench_function("composite_letter_150dpi", |b| {
        b.iter(|| compositor.composite(black_box(&template), black_box(&artwork), &transform, 0.5))
    });
}

criterion_group!(benches, bench_detection, bench_composite);
criterion_main!(benches);
