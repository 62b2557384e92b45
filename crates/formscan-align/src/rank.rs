//! Ranking of raw correspondences by fit score.

use crate::{AlignError, Correspondence};

/// Spans up to this length are sorted by insertion sort.
pub const INSERTION_SORT_MAX: usize = 20;

/// Number of correspondences handed to the homography estimator.
pub const BEST_MATCH_COUNT: usize = 4;

/// Sort correspondences by ascending `fit_score` into a new vector.
///
/// Short spans use insertion sort, longer spans are split at the midpoint,
/// sorted recursively and merged. Both passes are stable, so equal scores
/// keep their input order.
pub fn sort_by_fit_score(matches: &[Correspondence]) -> Vec<Correspondence> {
    if matches.len() <= INSERTION_SORT_MAX {
        return insertion_sorted(matches);
    }
    let mid = matches.len() / 2;
    let left = sort_by_fit_score(&matches[..mid]);
    let right = sort_by_fit_score(&matches[mid..]);
    merge(&left, &right)
}

fn insertion_sorted(matches: &[Correspondence]) -> Vec<Correspondence> {
    let mut out = matches.to_vec();
    for i in 1..out.len() {
        let mut j = i;
        while j > 0 && out[j].fit_score < out[j - 1].fit_score {
            out.swap(j, j - 1);
            j -= 1;
        }
    }
    out
}

fn merge(left: &[Correspondence], right: &[Correspondence]) -> Vec<Correspondence> {
    let mut out = Vec::with_capacity(left.len() + right.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        // take from the left on ties
        if right[j].fit_score < left[i].fit_score {
            out.push(right[j]);
            j += 1;
        } else {
            out.push(left[i]);
            i += 1;
        }
    }
    out.extend_from_slice(&left[i..]);
    out.extend_from_slice(&right[j..]);
    out
}

/// The [`BEST_MATCH_COUNT`] correspondences with the smallest fit score, ascending.
pub fn best_correspondences(
    matches: &[Correspondence],
) -> Result<[Correspondence; BEST_MATCH_COUNT], AlignError> {
    if matches.len() < BEST_MATCH_COUNT {
        return Err(AlignError::InsufficientCorrespondences {
            found: matches.len(),
            required: BEST_MATCH_COUNT,
        });
    }
    let sorted = sort_by_fit_score(matches);
    Ok([sorted[0], sorted[1], sorted[2], sorted[3]])
}
