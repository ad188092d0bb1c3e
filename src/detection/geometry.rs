use imageproc::geometry::approximate_polygon_dp;
use imageproc::point::Point;
use serde::{Deserialize, Serialize};

/// Edge vectors shorter than this are treated as a repeated vertex.
const MIN_EDGE_LENGTH: f64 = 1e-9;

/// Simplified contour: cyclic vertex list in contour traversal order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Polygon {
    pub vertices: Vec<(i32, i32)>,
}

/// Axis-aligned box spanning a polygon's vertices.
///
/// `width` and `height` are vertex spans (`max - min`), not pixel counts: a
/// box whose corners sit on columns 10 and 30 is 20 wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Polygon {
    pub fn new(vertices: Vec<(i32, i32)>) -> Self {
        Self { vertices }
    }

    pub fn from_points(points: &[Point<i32>]) -> Self {
        Self {
            vertices: points.iter().map(|p| (p.x, p.y)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Turn angle at each vertex in degrees, or `None` where an adjacent edge
    /// has zero length.
    ///
    /// Entry `i` compares the edge `p[i] -> p[i+1]` with `p[i+1] -> p[i+2]`,
    /// indices taken modulo the vertex count. Polygons with fewer than three
    /// vertices have no angles.
    pub fn interior_angles(&self) -> Vec<Option<f64>> {
        let n = self.vertices.len();
        if n < 3 {
            return Vec::new();
        }

        (0..n)
            .map(|i| {
                let p1 = self.vertices[i];
                let p2 = self.vertices[(i + 1) % n];
                let p3 = self.vertices[(i + 2) % n];
                angle_between(
                    ((p2.0 - p1.0) as f64, (p2.1 - p1.1) as f64),
                    ((p3.0 - p2.0) as f64, (p3.1 - p2.1) as f64),
                )
            })
            .collect()
    }

    /// `None` for an empty polygon.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        let (first, rest) = self.vertices.split_first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.0, first.1, first.0, first.1);
        for &(x, y) in rest {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }

        Some(BoundingBox {
            x: min_x,
            y: min_y,
            width: (max_x - min_x) as u32,
            height: (max_y - min_y) as u32,
        })
    }
}

/// Angle between two vectors in degrees, in [0, 180].
pub fn angle_between(v1: (f64, f64), v2: (f64, f64)) -> Option<f64> {
    let n1 = v1.0.hypot(v1.1);
    let n2 = v2.0.hypot(v2.1);
    if n1 < MIN_EDGE_LENGTH || n2 < MIN_EDGE_LENGTH {
        return None;
    }

    // rounding can push the cosine a hair outside [-1, 1]
    let cos = ((v1.0 * v2.0 + v1.1 * v2.1) / (n1 * n2)).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Douglas-Peucker simplification of a closed contour.
///
/// The split starts from the pair of contour points that are farthest apart
/// (three rounds of "farthest point from the current anchor", starting at the
/// first point) rather than from the first traced pixel. That pixel usually
/// sits part-way along a rounded corner and would otherwise always survive as
/// an extra vertex. Both arcs between the pair are simplified as open curves
/// and joined without repeating the shared endpoints.
pub fn simplify_closed(points: &[Point<i32>], epsilon: f64) -> Vec<Point<i32>> {
    if points.len() < 3 || epsilon <= 0.0 {
        return points.to_vec();
    }

    let mut anchor = 0;
    let mut far = farthest_from(points, anchor);
    for _ in 0..2 {
        anchor = far;
        far = farthest_from(points, anchor);
    }
    if far == anchor {
        return vec![points[anchor]];
    }

    let mut ring: Vec<Point<i32>> = points[anchor..].iter().chain(&points[..anchor]).copied().collect();
    let split = (far + points.len() - anchor) % points.len();
    ring.push(ring[0]);

    let mut polygon = approximate_polygon_dp(&ring[..=split], epsilon, false);
    polygon.pop();
    let mut back = approximate_polygon_dp(&ring[split..], epsilon, false);
    back.pop();
    polygon.extend(back);
    polygon
}

/// Index of the point farthest from `points[from]`; ties keep the earliest.
fn farthest_from(points: &[Point<i32>], from: usize) -> usize {
    let origin = points[from];
    let mut best = (from, 0i64);
    for (i, p) in points.iter().enumerate() {
        let (dx, dy) = ((p.x - origin.x) as i64, (p.y - origin.y) as i64);
        let d = dx * dx + dy * dy;
        if d > best.1 {
            best = (i, d);
        }
    }
    best.0
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn is_degenerate(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rotate(vertices: &[(i32, i32)], degrees: f64, scale: f64) -> Vec<(i32, i32)> {
        let (s, c) = degrees.to_radians().sin_cos();
        vertices
            .iter()
            .map(|&(x, y)| {
                let (x, y) = (x as f64 * scale, y as f64 * scale);
                ((x * c - y * s).round() as i32, (x * s + y * c).round() as i32)
            })
            .collect()
    }

    fn right_angle_flags(polygon: &Polygon) -> Vec<bool> {
        polygon
            .interior_angles()
            .into_iter()
            .map(|a| a.is_some_and(|a| (85.0..=95.0).contains(&a)))
            .collect()
    }

    #[test]
    fn test_square_has_four_right_angles() {
        let square = Polygon::new(vec![(0, 0), (10, 0), (10, 10), (0, 10)]);
        let angles = square.interior_angles();
        assert_eq!(angles.len(), 4);
        for angle in angles {
            assert!((angle.unwrap() - 90.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_right_triangle_angles() {
        let triangle = Polygon::new(vec![(0, 0), (40, 0), (0, 30)]);
        let flags = right_angle_flags(&triangle);
        assert_eq!(flags.iter().filter(|f| **f).count(), 1);
    }

    #[test]
    fn test_repeated_vertex_does_not_produce_nan() {
        let polygon = Polygon::new(vec![(0, 0), (0, 0), (10, 0), (10, 10)]);
        let angles = polygon.interior_angles();
        assert!(angles[0].is_none());
        assert!(angles.iter().flatten().all(|a| a.is_finite()));
    }

    #[test]
    fn test_too_few_vertices_have_no_angles() {
        assert!(Polygon::new(vec![(0, 0), (5, 5)]).interior_angles().is_empty());
        assert!(Polygon::new(Vec::new()).bounding_box().is_none());
    }

    #[test]
    fn test_right_angle_flags_survive_rotation() {
        let quad = Polygon::new(vec![(0, 0), (100, 0), (100, 60), (0, 60)]);
        let triangle = Polygon::new(vec![(0, 0), (80, 0), (0, 50)]);
        for polygon in [quad, triangle] {
            let expected = right_angle_flags(&polygon);
            for degrees in [15.0, 30.0, 45.0, 90.0, 137.0, 200.0, 311.0] {
                let rotated = Polygon::new(rotate(&polygon.vertices, degrees, 10.0));
                let scaled = Polygon::new(rotate(&polygon.vertices, 0.0, 10.0));
                assert_eq!(right_angle_flags(&rotated), right_angle_flags(&scaled), "rotation {degrees}");
                assert_eq!(right_angle_flags(&scaled), expected);
            }
        }
    }

    /// Pixel trace of an axis-aligned square, starting mid-way along the top.
    fn square_trace(side: i32, start: i32) -> Vec<Point<i32>> {
        let mut trace = Vec::new();
        trace.extend((start..=side).map(|x| Point::new(x, 0)));
        trace.extend((1..=side).map(|y| Point::new(side, y)));
        trace.extend((0..side).rev().map(|x| Point::new(x, side)));
        trace.extend((0..side).rev().map(|y| Point::new(0, y)));
        trace.extend((1..start).map(|x| Point::new(x, 0)));
        trace
    }

    #[test]
    fn test_closed_simplification_ignores_start_point() {
        let trace = square_trace(40, 17);
        let mut corners: Vec<(i32, i32)> = simplify_closed(&trace, 3.0).iter().map(|p| (p.x, p.y)).collect();
        corners.sort();
        assert_eq!(corners, [(0, 0), (0, 40), (40, 0), (40, 40)]);

        // anchoring on the first traced pixel keeps it as a fifth vertex
        assert_eq!(approximate_polygon_dp(&trace, 3.0, true).len(), 5);
    }

    #[test]
    fn test_closed_simplification_of_chamfered_rectangle() {
        // 3 px corner cuts, as left behind by smoothing before edge detection
        let outline: [(i32, i32); 8] = [(3, 0), (57, 0), (60, 3), (60, 37), (57, 40), (3, 40), (0, 37), (0, 3)];
        let mut trace = Vec::new();
        for (i, &(x0, y0)) in outline.iter().enumerate() {
            let (x1, y1) = outline[(i + 1) % outline.len()];
            let steps = (x1 - x0).abs().max((y1 - y0).abs());
            trace.extend((0..steps).map(|t| Point::new(x0 + (x1 - x0) * t / steps, y0 + (y1 - y0) * t / steps)));
        }
        let length = perimeter(&trace);
        let polygon = Polygon::from_points(&simplify_closed(&trace, 0.02 * length));
        assert_eq!(polygon.len(), 4);
        let flags = right_angle_flags(&polygon);
        assert!(flags.iter().filter(|f| **f).count() >= 2, "{:?}", polygon.interior_angles());
    }

    #[test]
    fn test_closed_simplification_degenerate_input() {
        let dot = vec![Point::new(4, 4); 5];
        assert_eq!(simplify_closed(&dot, 1.0), vec![Point::new(4, 4)]);
        let pair = vec![Point::new(0, 0), Point::new(3, 0)];
        assert_eq!(simplify_closed(&pair, 1.0), pair);
    }

    fn perimeter(trace: &[Point<i32>]) -> f64 {
        imageproc::geometry::arc_length(trace, true)
    }

    #[test]
    fn test_bounding_box() {
        let polygon = Polygon::new(vec![(5, 7), (25, 7), (25, 47)]);
        let bbox = polygon.bounding_box().unwrap();
        assert_eq!(bbox, BoundingBox::new(5, 7, 20, 40));
        assert_eq!(bbox.area(), 800);
        assert!(!bbox.is_degenerate());
        assert!(BoundingBox::new(0, 0, 0, 10).is_degenerate());
    }
}
