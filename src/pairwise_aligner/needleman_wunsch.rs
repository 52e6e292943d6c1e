//! The unified single-state recurrence, used when every gap region has
//! equal open and extension scores: Needleman-Wunsch in global mode,
//! Smith-Waterman in local mode.

use crate::error::Result;
use crate::path_generator::PathGenerator;
use crate::scoring::Mode;
use crate::trace_matrix::{
    DIAGONAL, ENDPOINT, HORIZONTAL, NONE, STARTPOINT, VERTICAL, clear_endpoints, try_vec,
};

use super::{PairwiseAligner, letter_index, max3, select_trace};

pub(super) fn global_score(
    aligner: &PairwiseAligner,
    seq_a: &[u8],
    seq_b: &[u8],
) -> Result<f64> {
    let len_a = seq_a.len();
    let len_b = seq_b.len();
    let gaps = &aligner.gap_scores;
    let substitution = &aligner.substitution;

    let mut scores = try_vec::<f64>(len_b + 1)?;
    // The top row has no previously aligned characters; it is priced as a
    // left-boundary gap of the target, the first column as a left-boundary
    // gap of the query.
    for (j, score) in scores.iter_mut().enumerate() {
        *score = j as f64 * gaps.target_left_extend;
    }
    for i in 1..len_a {
        let index_a = letter_index(seq_a[i - 1]);
        let mut diagonal = scores[0];
        scores[0] = i as f64 * gaps.query_left_extend;
        for j in 1..len_b {
            let index_b = letter_index(seq_b[j - 1]);
            let score = max3(
                diagonal + substitution.score(index_a, index_b),
                scores[j] + gaps.query_internal_extend,
                scores[j - 1] + gaps.target_internal_extend,
            );
            diagonal = scores[j];
            scores[j] = score;
        }
        let index_b = letter_index(seq_b[len_b - 1]);
        let score = max3(
            diagonal + substitution.score(index_a, index_b),
            scores[len_b] + gaps.query_right_extend,
            scores[len_b - 1] + gaps.target_internal_extend,
        );
        scores[len_b] = score;
    }
    let index_a = letter_index(seq_a[len_a - 1]);
    let mut diagonal = scores[0];
    scores[0] = len_a as f64 * gaps.query_left_extend;
    for j in 1..len_b {
        let index_b = letter_index(seq_b[j - 1]);
        let score = max3(
            diagonal + substitution.score(index_a, index_b),
            scores[j] + gaps.query_internal_extend,
            scores[j - 1] + gaps.target_right_extend,
        );
        diagonal = scores[j];
        scores[j] = score;
    }
    let index_b = letter_index(seq_b[len_b - 1]);
    Ok(max3(
        diagonal + substitution.score(index_a, index_b),
        scores[len_b] + gaps.query_right_extend,
        scores[len_b - 1] + gaps.target_right_extend,
    ))
}

pub(super) fn global_align(
    aligner: &PairwiseAligner,
    seq_a: &[u8],
    seq_b: &[u8],
) -> Result<(f64, PathGenerator)> {
    let len_a = seq_a.len();
    let len_b = seq_b.len();
    let gaps = &aligner.gap_scores;
    let substitution = &aligner.substitution;
    let epsilon = aligner.epsilon;

    let mut paths = PathGenerator::new_needleman_wunsch(len_a, len_b, Mode::Global)?;
    let matrix = paths.matrix_mut();
    let mut scores = try_vec::<f64>(len_b + 1)?;
    for (j, score) in scores.iter_mut().enumerate() {
        *score = j as f64 * gaps.target_left_extend;
    }
    let mut score = 0.0;
    for i in 1..=len_a {
        let last_row = i == len_a;
        let horizontal_gap = if last_row {
            gaps.target_right_extend
        } else {
            gaps.target_internal_extend
        };
        let index_a = letter_index(seq_a[i - 1]);
        let mut diagonal = scores[0];
        scores[0] = i as f64 * gaps.query_left_extend;
        for j in 1..=len_b {
            let vertical_gap = if j == len_b {
                gaps.query_right_extend
            } else {
                gaps.query_internal_extend
            };
            let index_b = letter_index(seq_b[j - 1]);
            let (cell_score, trace) = select_trace(
                epsilon,
                [
                    (diagonal + substitution.score(index_a, index_b), DIAGONAL),
                    (scores[j - 1] + horizontal_gap, HORIZONTAL),
                    (scores[j] + vertical_gap, VERTICAL),
                ],
            );
            matrix[[i, j]].trace = trace;
            diagonal = scores[j];
            scores[j] = cell_score;
            score = cell_score;
        }
    }
    matrix[[len_a, len_b]].path = 0;

    Ok((score, paths))
}

pub(super) fn local_score(aligner: &PairwiseAligner, seq_a: &[u8], seq_b: &[u8]) -> Result<f64> {
    let len_a = seq_a.len();
    let len_b = seq_b.len();
    let gaps = &aligner.gap_scores;
    let substitution = &aligner.substitution;

    let epsilon = aligner.epsilon;
    let mut maximum = 0.0f64;
    let mut scores = try_vec::<f64>(len_b + 1)?;
    for i in 1..=len_a {
        let index_a = letter_index(seq_a[i - 1]);
        let mut diagonal = 0.0;
        for j in 1..=len_b {
            let index_b = letter_index(seq_b[j - 1]);
            // Gaps are forbidden along the final row and column: a local
            // alignment never ends in a gap.
            let mut score = if i < len_a && j < len_b {
                max3(
                    diagonal + substitution.score(index_a, index_b),
                    scores[j] + gaps.query_internal_extend,
                    scores[j - 1] + gaps.target_internal_extend,
                )
            } else {
                diagonal + substitution.score(index_a, index_b)
            };
            if score < epsilon {
                score = 0.0;
            } else if score > maximum {
                maximum = score;
            }
            diagonal = scores[j];
            scores[j] = score;
        }
    }
    Ok(maximum)
}

pub(super) fn local_align(
    aligner: &PairwiseAligner,
    seq_a: &[u8],
    seq_b: &[u8],
) -> Result<(f64, PathGenerator)> {
    let len_a = seq_a.len();
    let len_b = seq_b.len();
    let gaps = &aligner.gap_scores;
    let substitution = &aligner.substitution;
    let epsilon = aligner.epsilon;

    let mut paths = PathGenerator::new_needleman_wunsch(len_a, len_b, Mode::Local)?;
    let matrix = paths.matrix_mut();
    let mut scores = try_vec::<f64>(len_b + 1)?;
    let mut maximum = 0.0f64;
    let mut endpoint_cursor = (len_a, len_b);
    for i in 1..=len_a {
        let index_a = letter_index(seq_a[i - 1]);
        let mut diagonal = 0.0;
        for j in 1..=len_b {
            let index_b = letter_index(seq_b[j - 1]);
            let (mut score, mut trace) = if i < len_a && j < len_b {
                select_trace(
                    epsilon,
                    [
                        (diagonal + substitution.score(index_a, index_b), DIAGONAL),
                        (scores[j - 1] + gaps.target_internal_extend, HORIZONTAL),
                        (scores[j] + gaps.query_internal_extend, VERTICAL),
                    ],
                )
            } else {
                (diagonal + substitution.score(index_a, index_b), DIAGONAL)
            };
            if score < epsilon {
                score = 0.0;
                // Cells on the final row or column keep their diagonal
                // trace; they are not start points.
                if i < len_a && j < len_b {
                    trace = STARTPOINT;
                }
            } else if trace & DIAGONAL != 0 && score > maximum - epsilon {
                if score > maximum + epsilon {
                    clear_endpoints(matrix, &mut endpoint_cursor, (i, j));
                }
                trace |= ENDPOINT;
            }
            matrix[[i, j]].trace = trace;
            if score > maximum {
                maximum = score;
            }
            diagonal = scores[j];
            scores[j] = score;
        }
    }

    // Zero-score extensions are not allowed, so traces towards an end point
    // are pruned: a cell is reachable if one of its surviving predecessors
    // is, unreachable cells lose their traces, and end points terminate
    // reachability. The `path` field doubles as the reachability flag.
    for j in 0..=len_b {
        matrix[[0, j]].path = 1;
    }
    for i in 1..=len_a {
        matrix[[i, 0]].path = 1;
        for j in 1..=len_b {
            let mut trace = matrix[[i, j]].trace;
            if matrix[[i - 1, j - 1]].path == 0 {
                trace &= !DIAGONAL;
            }
            if matrix[[i, j - 1]].path == 0 {
                trace &= !HORIZONTAL;
            }
            if matrix[[i - 1, j]].path == 0 {
                trace &= !VERTICAL;
            }
            if trace & (STARTPOINT | HORIZONTAL | VERTICAL | DIAGONAL) != 0 {
                matrix[[i, j]].path = if trace & ENDPOINT != 0 { 0 } else { 1 };
            } else {
                matrix[[i, j]].path = 0;
                trace = 0;
            }
            matrix[[i, j]].trace = trace;
        }
    }

    matrix[[0, 0]].path = if maximum == 0.0 { NONE } else { 0 };

    Ok((maximum, paths))
}
