//! Nearest-neighbor matching of probe embeddings against the gallery.

use thiserror::Error;

use crate::gallery::Gallery;
use crate::types::{Embedding, MatchResult, Subject};

/// Default embedding-space distance below which two faces count as the
/// same identity. Callers may pass a stricter or looser value per call.
pub const DEFAULT_MATCH_THRESHOLD: f32 = 0.6;

#[derive(Error, Debug)]
pub enum MatchError {
    /// Probe and stored embeddings disagree on dimensionality. The engine
    /// assumes one fixed dimension across all embeddings it receives; a
    /// violation is a precondition failure, not a recoverable condition.
    #[error("embedding dimension mismatch: probe has {probe}, gallery has {stored}")]
    DimensionMismatch { probe: usize, stored: usize },
}

/// Closest qualifying enrolled embedding for a probe.
#[derive(Debug, Clone)]
pub struct Nearest {
    pub subject_id: String,
    pub display_name: String,
    pub distance: f32,
}

/// Nearest-neighbor search strategy over the gallery.
///
/// Implementations must preserve the tie-break contract: among candidates
/// at equal distance, the first in subject-enrollment order wins. A spatial
/// index can replace [`LinearScan`] without touching call sites as long as
/// that holds.
pub trait NearestNeighbor {
    fn nearest_within(
        &self,
        subjects: &[Subject],
        probe: &Embedding,
        threshold: f32,
    ) -> Result<Option<Nearest>, MatchError>;
}

/// Brute-force scan of every embedding of every subject.
///
/// O(subjects × embeddings) per probe, which is fine at classroom scale —
/// tens to low hundreds of subjects with a handful of embeddings each.
pub struct LinearScan;

impl NearestNeighbor for LinearScan {
    fn nearest_within(
        &self,
        subjects: &[Subject],
        probe: &Embedding,
        threshold: f32,
    ) -> Result<Option<Nearest>, MatchError> {
        let mut best: Option<(usize, f32)> = None;

        for (idx, subject) in subjects.iter().enumerate() {
            for stored in &subject.embeddings {
                if stored.dim() != probe.dim() {
                    return Err(MatchError::DimensionMismatch {
                        probe: probe.dim(),
                        stored: stored.dim(),
                    });
                }
                let distance = probe.euclidean_distance(stored);
                // Strict on both bounds: equal-distance candidates keep the
                // earlier subject, and distance == threshold is a non-match.
                let wins = distance < threshold && best.map_or(true, |(_, d)| distance < d);
                if wins {
                    best = Some((idx, distance));
                }
            }
        }

        Ok(best.map(|(idx, distance)| Nearest {
            subject_id: subjects[idx].id.clone(),
            display_name: subjects[idx].display_name.clone(),
            distance,
        }))
    }
}

fn to_match(nearest: Nearest) -> MatchResult {
    MatchResult {
        subject_id: nearest.subject_id,
        display_name: nearest.display_name,
        // Published score stays in [0, 1] even for distances beyond 1.
        similarity: (1.0 - nearest.distance).clamp(0.0, 1.0),
    }
}

/// Matches probe embeddings against a [`Gallery`].
pub struct Matcher<S = LinearScan> {
    index: S,
}

impl Matcher<LinearScan> {
    pub fn new() -> Self {
        Self { index: LinearScan }
    }
}

impl Default for Matcher<LinearScan> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: NearestNeighbor> Matcher<S> {
    /// Use a custom search strategy instead of the brute-force scan.
    pub fn with_index(index: S) -> Self {
        Self { index }
    }

    /// Best enrolled match for `probe` strictly under `threshold`, or
    /// `None` when the gallery is empty or nothing qualifies.
    pub fn find_best_match(
        &self,
        gallery: &Gallery,
        probe: &Embedding,
        threshold: f32,
    ) -> Result<Option<MatchResult>, MatchError> {
        if gallery.is_empty() {
            return Ok(None);
        }
        let nearest =
            gallery.with_subjects(|subjects| self.index.nearest_within(subjects, probe, threshold))?;
        Ok(nearest.map(to_match))
    }

    /// Match each probe independently; probes with no qualifying subject
    /// are omitted, so the output can be shorter than the input. The whole
    /// batch runs against one gallery snapshot.
    pub fn find_all_matches(
        &self,
        gallery: &Gallery,
        probes: &[Embedding],
        threshold: f32,
    ) -> Result<Vec<MatchResult>, MatchError> {
        if gallery.is_empty() {
            return Ok(Vec::new());
        }
        let matches = gallery.with_subjects(|subjects| {
            let mut matches = Vec::new();
            for probe in probes {
                if let Some(nearest) = self.index.nearest_within(subjects, probe, threshold)? {
                    matches.push(to_match(nearest));
                }
            }
            Ok(matches)
        })?;
        tracing::debug!(
            probes = probes.len(),
            matches = matches.len(),
            "matched probe batch"
        );
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn emb(values: &[f32]) -> Embedding {
        Embedding::new(values.to_vec())
    }

    fn gallery_of(entries: &[(&str, &str, &[f32])]) -> Gallery {
        let gallery = Gallery::new();
        for (id, name, values) in entries {
            gallery.enroll(id, name, vec![emb(values)]).unwrap();
        }
        gallery
    }

    #[test]
    fn empty_gallery_matches_nothing() {
        let gallery = Gallery::new();
        let result = Matcher::new()
            .find_best_match(&gallery, &emb(&[1.0, 0.0]), DEFAULT_MATCH_THRESHOLD)
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn exact_self_match_scores_one() {
        let gallery = gallery_of(&[("s1", "Alice", &[0.5, 0.5, 0.5])]);
        let result = Matcher::new()
            .find_best_match(&gallery, &emb(&[0.5, 0.5, 0.5]), DEFAULT_MATCH_THRESHOLD)
            .unwrap()
            .unwrap();
        assert_eq!(result.subject_id, "s1");
        assert_eq!(result.similarity, 1.0);
    }

    #[test]
    fn distance_equal_to_threshold_is_no_match() {
        // 0.5 and 0.25 are exact in binary, so the computed distance is
        // exactly the threshold.
        let gallery = gallery_of(&[("s1", "Alice", &[0.0])]);
        let matcher = Matcher::new();
        assert!(matcher
            .find_best_match(&gallery, &emb(&[0.5]), 0.5)
            .unwrap()
            .is_none());
        assert!(matcher
            .find_best_match(&gallery, &emb(&[0.5]), 0.51)
            .unwrap()
            .is_some());
    }

    #[test]
    fn reenrollment_replaces_never_merges() {
        let gallery = Gallery::new();
        gallery
            .enroll("s1", "Alice", vec![emb(&[1.0, 0.0, 0.0])])
            .unwrap();
        gallery
            .enroll("s1", "Alice", vec![emb(&[0.0, 1.0, 0.0])])
            .unwrap();

        let matcher = Matcher::new();
        assert!(matcher
            .find_best_match(&gallery, &emb(&[1.0, 0.0, 0.0]), DEFAULT_MATCH_THRESHOLD)
            .unwrap()
            .is_none());
        assert!(matcher
            .find_best_match(&gallery, &emb(&[0.0, 1.0, 0.0]), DEFAULT_MATCH_THRESHOLD)
            .unwrap()
            .is_some());
    }

    #[test]
    fn subjects_do_not_cross_match() {
        let gallery = gallery_of(&[
            ("s1", "Alice", &[1.0, 0.0, 0.0]),
            ("s2", "Bob", &[0.0, 1.0, 0.0]),
        ]);
        let matcher = Matcher::new();

        let a = matcher
            .find_best_match(&gallery, &emb(&[1.0, 0.0, 0.0]), DEFAULT_MATCH_THRESHOLD)
            .unwrap()
            .unwrap();
        assert_eq!(a.subject_id, "s1");

        let b = matcher
            .find_best_match(&gallery, &emb(&[0.0, 1.0, 0.0]), DEFAULT_MATCH_THRESHOLD)
            .unwrap()
            .unwrap();
        assert_eq!(b.subject_id, "s2");
    }

    #[test]
    fn unmatched_probes_are_omitted() {
        let gallery = gallery_of(&[
            ("s1", "Alice", &[1.0, 0.0, 0.0]),
            ("s2", "Bob", &[0.0, 1.0, 0.0]),
        ]);
        let probes = [
            emb(&[1.0, 0.0, 0.0]),
            emb(&[0.0, 0.0, 1.0]), // far from everyone
            emb(&[0.0, 1.0, 0.0]),
        ];
        let matches = Matcher::new()
            .find_all_matches(&gallery, &probes, DEFAULT_MATCH_THRESHOLD)
            .unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].subject_id, "s1");
        assert_eq!(matches[1].subject_id, "s2");
    }

    #[test]
    fn ties_go_to_first_enrolled() {
        // Both subjects hold the same embedding, so every probe is
        // equidistant from them.
        let gallery = gallery_of(&[("s2", "Bob", &[1.0, 0.0]), ("s1", "Alice", &[1.0, 0.0])]);
        let matcher = Matcher::new();
        for _ in 0..10 {
            let result = matcher
                .find_best_match(&gallery, &emb(&[0.9, 0.0]), DEFAULT_MATCH_THRESHOLD)
                .unwrap()
                .unwrap();
            assert_eq!(result.subject_id, "s2");
        }
    }

    #[test]
    fn classroom_scenario() {
        let gallery = Gallery::new();
        gallery
            .enroll("s1", "Alice", vec![emb(&[1.0, 0.0, 0.0])])
            .unwrap();
        gallery
            .enroll("s2", "Bob", vec![emb(&[0.0, 1.0, 0.0])])
            .unwrap();

        let matcher = Matcher::new();
        let hit = matcher
            .find_best_match(&gallery, &emb(&[1.0, 0.0, 0.0]), 0.6)
            .unwrap()
            .unwrap();
        assert_eq!(hit.subject_id, "s1");
        assert_eq!(hit.display_name, "Alice");
        assert_eq!(hit.similarity, 1.0);

        // Distance ≈ 1.41 to every enrolled embedding.
        assert!(matcher
            .find_best_match(&gallery, &emb(&[0.0, 0.0, 1.0]), 0.6)
            .unwrap()
            .is_none());
    }

    #[test]
    fn every_embedding_of_a_subject_participates() {
        let gallery = Gallery::new();
        gallery
            .enroll("s1", "Alice", vec![emb(&[1.0, 0.0]), emb(&[0.0, 1.0])])
            .unwrap();

        let hit = Matcher::new()
            .find_best_match(&gallery, &emb(&[0.0, 0.9]), DEFAULT_MATCH_THRESHOLD)
            .unwrap()
            .unwrap();
        assert_eq!(hit.subject_id, "s1");
        assert!((hit.similarity - 0.9).abs() < 1e-6);
    }

    #[test]
    fn probe_dimension_mismatch_is_fatal() {
        let gallery = gallery_of(&[("s1", "Alice", &[1.0, 0.0, 0.0])]);
        let err = Matcher::new()
            .find_best_match(&gallery, &emb(&[1.0, 0.0]), DEFAULT_MATCH_THRESHOLD)
            .unwrap_err();
        assert!(matches!(
            err,
            MatchError::DimensionMismatch {
                probe: 2,
                stored: 3
            }
        ));
    }

    #[test]
    fn thresholds_above_one_take_effect() {
        // Distance √2 ≈ 1.414 qualifies under a 1.5 threshold; the
        // published score bottoms out at zero.
        let gallery = gallery_of(&[("s1", "Alice", &[1.0, 0.0])]);
        let hit = Matcher::new()
            .find_best_match(&gallery, &emb(&[0.0, 1.0]), 1.5)
            .unwrap()
            .unwrap();
        assert_eq!(hit.subject_id, "s1");
        assert_eq!(hit.similarity, 0.0);
    }

    #[test]
    fn linear_scan_agrees_with_exhaustive_search() {
        let mut rng = StdRng::seed_from_u64(7);
        let gallery = Gallery::new();
        let mut flat: Vec<(String, Embedding)> = Vec::new();

        for i in 0..12 {
            let id = format!("s{i:02}");
            let embeddings: Vec<Embedding> = (0..3)
                .map(|_| Embedding::new((0..8).map(|_| rng.gen_range(-1.0f32..1.0)).collect()))
                .collect();
            for e in &embeddings {
                flat.push((id.clone(), e.clone()));
            }
            gallery
                .enroll(&id, &format!("Subject {i}"), embeddings)
                .unwrap();
        }

        let matcher = Matcher::new();
        for _ in 0..25 {
            let probe = Embedding::new((0..8).map(|_| rng.gen_range(-1.0f32..1.0)).collect());
            let threshold = rng.gen_range(0.2f32..2.0);

            let mut expected: Option<(&str, f32)> = None;
            for (id, stored) in &flat {
                let d = probe.euclidean_distance(stored);
                if d < threshold && expected.map_or(true, |(_, best)| d < best) {
                    expected = Some((id, d));
                }
            }

            let got = matcher.find_best_match(&gallery, &probe, threshold).unwrap();
            match (expected, got) {
                (None, None) => {}
                (Some((id, d)), Some(result)) => {
                    assert_eq!(result.subject_id, id);
                    assert!((result.similarity - (1.0 - d).clamp(0.0, 1.0)).abs() < 1e-6);
                }
                (e, g) => panic!("search disagreement: expected {e:?}, got {g:?}"),
            }
        }
    }
}
