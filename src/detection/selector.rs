use super::FiducialCandidate;
use crate::config::RankingStrategy;

/// Picks the fiducial that anchors registration for one image.
pub trait CandidateRanker: Send + Sync {
    fn name(&self) -> &str;

    /// `None` only when `candidates` is empty.
    fn select<'a>(&self, candidates: &'a [FiducialCandidate]) -> Option<&'a FiducialCandidate>;
}

/// First candidate in contour scan order. There is no scoring by size,
/// position or confidence, so page furniture found earlier in the scan wins
/// over the real mark.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstMatch;

/// Candidate with the largest bounding-box area; earlier candidate on ties.
#[derive(Debug, Default, Clone, Copy)]
pub struct LargestArea;

/// Candidate whose bounding-box origin lies closest to the page origin;
/// earlier candidate on ties.
#[derive(Debug, Default, Clone, Copy)]
pub struct NearestCorner;

impl CandidateRanker for FirstMatch {
    fn name(&self) -> &str {
        "first_match"
    }

    fn select<'a>(&self, candidates: &'a [FiducialCandidate]) -> Option<&'a FiducialCandidate> {
        candidates.first()
    }
}

impl CandidateRanker for LargestArea {
    fn name(&self) -> &str {
        "largest_area"
    }

    fn select<'a>(&self, candidates: &'a [FiducialCandidate]) -> Option<&'a FiducialCandidate> {
        best_by(candidates, |c| c.bounding_box().map_or(0, |b| b.area()) as f64)
    }
}

impl CandidateRanker for NearestCorner {
    fn name(&self) -> &str {
        "nearest_corner"
    }

    fn select<'a>(&self, candidates: &'a [FiducialCandidate]) -> Option<&'a FiducialCandidate> {
        best_by(candidates, |c| match c.bounding_box() {
            Some(b) => -(b.x as f64).hypot(b.y as f64),
            None => f64::NEG_INFINITY,
        })
    }
}

/// Highest score wins; the first of equal scores is kept.
fn best_by<F>(candidates: &[FiducialCandidate], score: F) -> Option<&FiducialCandidate>
where
    F: Fn(&FiducialCandidate) -> f64,
{
    let mut best: Option<(&FiducialCandidate, f64)> = None;
    for candidate in candidates {
        let s = score(candidate);
        match best {
            Some((_, best_score)) if s <= best_score => {}
            _ => best = Some((candidate, s)),
        }
    }
    best.map(|(candidate, _)| candidate)
}

pub fn ranker_for(strategy: RankingStrategy) -> Box<dyn CandidateRanker> {
    match strategy {
        RankingStrategy::FirstMatch => Box::new(FirstMatch),
        RankingStrategy::LargestArea => Box::new(LargestArea),
        RankingStrategy::NearestCorner => Box::new(NearestCorner),
    }
}
