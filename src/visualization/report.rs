use crate::detection::FiducialCandidate;
use crate::pipeline::CompositeResult;

pub fn print_candidates(label: &str, candidates: &[FiducialCandidate]) {
    println!("=== {} fiducial candidates: {} ===", label, candidates.len());
    for (idx, candidate) in candidates.iter().enumerate() {
        let angles: Vec<String> = candidate
            .angles
            .iter()
            .map(|a| a.map_or_else(|| "-".to_string(), |a| format!("{:.1}", a)))
            .collect();
        match candidate.bounding_box() {
            Some(b) => println!(
                "  #{}: {} vertices, box ({}, {}) {}x{}, right angles {}, angles [{}]",
                idx,
                candidate.polygon.len(),
                b.x,
                b.y,
                b.width,
                b.height,
                candidate.right_angle_count,
                angles.join(", ")
            ),
            None => println!("  #{}: empty polygon", idx),
        }
    }
}

pub fn print_composite_summary(result: &CompositeResult) {
    let p = &result.provenance;
    println!("| Side | Box (x, y) | Size | Candidates |");
    println!("|------|------------|------|------------|");
    for (side, fiducial) in [("template", &p.template), ("artwork", &p.artwork)] {
        let b = fiducial.bounding_box;
        println!(
            "| {} | ({}, {}) | {}x{} | {} |",
            side, b.x, b.y, b.width, b.height, fiducial.candidates_found
        );
    }
    println!();
    println!("  Scale: ({:.4}, {:.4})", p.transform.sx, p.transform.sy);
    println!("  Translation: ({:.2}, {:.2})", p.transform.tx, p.transform.ty);
    println!("  Opacity: {:.2}, ranking: {}", p.opacity, p.ranking);
    let total: f64 = p.stage_timings.iter().map(|s| s.duration_ms).sum();
    println!("  Processing Time: {:.2}ms", total);
}
