//! The three-state affine recurrence: `M` (match), `Ix` (gap in the query)
//! and `Iy` (gap in the target), each with its own trace.

use crate::error::Result;
use crate::path_generator::PathGenerator;
use crate::scoring::Mode;
use crate::trace_matrix::{
    ENDPOINT, IX_MATRIX, IY_MATRIX, M_MATRIX, NONE, STARTPOINT, clear_endpoints, try_vec,
};

use super::{NEG_INF, PairwiseAligner, letter_index, max3, select_trace};

pub(super) fn global_score(
    aligner: &PairwiseAligner,
    seq_a: &[u8],
    seq_b: &[u8],
) -> Result<f64> {
    let len_a = seq_a.len();
    let len_b = seq_b.len();
    let gaps = &aligner.gap_scores;
    let substitution = &aligner.substitution;

    let mut m_scores = try_vec::<f64>(len_b + 1)?;
    let mut ix_scores = try_vec::<f64>(len_b + 1)?;
    let mut iy_scores = try_vec::<f64>(len_b + 1)?;
    m_scores[0] = 0.0;
    ix_scores[0] = NEG_INF;
    iy_scores[0] = NEG_INF;
    for j in 1..=len_b {
        m_scores[j] = NEG_INF;
        ix_scores[j] = NEG_INF;
        iy_scores[j] = gaps.target_left_open + gaps.target_left_extend * (j - 1) as f64;
    }

    for i in 1..=len_a {
        let last_row = i == len_a;
        let index_a = letter_index(seq_a[i - 1]);
        let mut m_diagonal = m_scores[0];
        let mut ix_diagonal = ix_scores[0];
        let mut iy_diagonal = iy_scores[0];
        m_scores[0] = NEG_INF;
        ix_scores[0] = gaps.query_left_open + gaps.query_left_extend * (i - 1) as f64;
        iy_scores[0] = NEG_INF;
        for j in 1..=len_b {
            let last_column = j == len_b;
            let (open_b, extend_b) = if last_column {
                (gaps.query_right_open, gaps.query_right_extend)
            } else {
                (gaps.query_internal_open, gaps.query_internal_extend)
            };
            let (open_a, extend_a) = if last_row {
                (gaps.target_right_open, gaps.target_right_extend)
            } else {
                (gaps.target_internal_open, gaps.target_internal_extend)
            };
            let index_b = letter_index(seq_b[j - 1]);

            let score = max3(m_diagonal, ix_diagonal, iy_diagonal);
            m_diagonal = m_scores[j];
            m_scores[j] = score + substitution.score(index_a, index_b);

            let score = max3(
                m_diagonal + open_b,
                ix_scores[j] + extend_b,
                iy_scores[j] + open_b,
            );
            ix_diagonal = ix_scores[j];
            ix_scores[j] = score;

            let score = max3(
                m_scores[j - 1] + open_a,
                ix_scores[j - 1] + open_a,
                iy_scores[j - 1] + extend_a,
            );
            iy_diagonal = iy_scores[j];
            iy_scores[j] = score;
        }
    }
    Ok(max3(m_scores[len_b], ix_scores[len_b], iy_scores[len_b]))
}

pub(super) fn global_align(
    aligner: &PairwiseAligner,
    seq_a: &[u8],
    seq_b: &[u8],
) -> Result<(f64, PathGenerator)> {
    let len_a = seq_a.len();
    let len_b = seq_b.len();
    let gap_scores = &aligner.gap_scores;
    let substitution = &aligner.substitution;
    let epsilon = aligner.epsilon;

    let mut paths = PathGenerator::new_gotoh(len_a, len_b, Mode::Global)?;
    let (matrix, gaps) = paths.gotoh_tables_mut();
    let mut m_scores = try_vec::<f64>(len_b + 1)?;
    let mut ix_scores = try_vec::<f64>(len_b + 1)?;
    let mut iy_scores = try_vec::<f64>(len_b + 1)?;
    m_scores[0] = 0.0;
    ix_scores[0] = NEG_INF;
    iy_scores[0] = NEG_INF;
    for j in 1..=len_b {
        m_scores[j] = NEG_INF;
        ix_scores[j] = NEG_INF;
        iy_scores[j] =
            gap_scores.target_left_open + gap_scores.target_left_extend * (j - 1) as f64;
    }

    for i in 1..=len_a {
        let last_row = i == len_a;
        let index_a = letter_index(seq_a[i - 1]);
        let mut m_diagonal = m_scores[0];
        let mut ix_diagonal = ix_scores[0];
        let mut iy_diagonal = iy_scores[0];
        m_scores[0] = NEG_INF;
        ix_scores[0] =
            gap_scores.query_left_open + gap_scores.query_left_extend * (i - 1) as f64;
        iy_scores[0] = NEG_INF;
        for j in 1..=len_b {
            let last_column = j == len_b;
            let (open_b, extend_b) = if last_column {
                (gap_scores.query_right_open, gap_scores.query_right_extend)
            } else {
                (
                    gap_scores.query_internal_open,
                    gap_scores.query_internal_extend,
                )
            };
            let (open_a, extend_a) = if last_row {
                (gap_scores.target_right_open, gap_scores.target_right_extend)
            } else {
                (
                    gap_scores.target_internal_open,
                    gap_scores.target_internal_extend,
                )
            };
            let index_b = letter_index(seq_b[j - 1]);

            let (score, trace) = select_trace(
                epsilon,
                [
                    (m_diagonal, M_MATRIX),
                    (ix_diagonal, IX_MATRIX),
                    (iy_diagonal, IY_MATRIX),
                ],
            );
            matrix[[i, j]].trace = trace;
            m_diagonal = m_scores[j];
            m_scores[j] = score + substitution.score(index_a, index_b);

            let (score, trace) = select_trace(
                epsilon,
                [
                    (m_diagonal + open_b, M_MATRIX),
                    (ix_scores[j] + extend_b, IX_MATRIX),
                    (iy_scores[j] + open_b, IY_MATRIX),
                ],
            );
            gaps[[i, j]].ix = trace;
            ix_diagonal = ix_scores[j];
            ix_scores[j] = score;

            let (score, trace) = select_trace(
                epsilon,
                [
                    (m_scores[j - 1] + open_a, M_MATRIX),
                    (ix_scores[j - 1] + open_a, IX_MATRIX),
                    (iy_scores[j - 1] + extend_a, IY_MATRIX),
                ],
            );
            gaps[[i, j]].iy = trace;
            iy_diagonal = iy_scores[j];
            iy_scores[j] = score;
        }
    }
    matrix[[len_a, len_b]].path = 0;

    // Only end states within the tie tolerance of the optimum may root a
    // traceback.
    let score = max3(m_scores[len_b], ix_scores[len_b], iy_scores[len_b]);
    if m_scores[len_b] < score - epsilon {
        matrix[[len_a, len_b]].trace = 0;
    }
    if ix_scores[len_b] < score - epsilon {
        gaps[[len_a, len_b]].ix = 0;
    }
    if iy_scores[len_b] < score - epsilon {
        gaps[[len_a, len_b]].iy = 0;
    }
    Ok((score, paths))
}

pub(super) fn local_score(aligner: &PairwiseAligner, seq_a: &[u8], seq_b: &[u8]) -> Result<f64> {
    let len_a = seq_a.len();
    let len_b = seq_b.len();
    let gaps = &aligner.gap_scores;
    let substitution = &aligner.substitution;
    let epsilon = aligner.epsilon;

    let mut m_scores = try_vec::<f64>(len_b + 1)?;
    let mut ix_scores = try_vec::<f64>(len_b + 1)?;
    let mut iy_scores = try_vec::<f64>(len_b + 1)?;
    ix_scores[0] = NEG_INF;
    iy_scores[0] = NEG_INF;
    for j in 1..=len_b {
        ix_scores[j] = NEG_INF;
        iy_scores[j] = NEG_INF;
    }

    let mut maximum = 0.0f64;
    for i in 1..=len_a {
        let index_a = letter_index(seq_a[i - 1]);
        let mut m_diagonal = m_scores[0];
        let mut ix_diagonal = ix_scores[0];
        let mut iy_diagonal = iy_scores[0];
        m_scores[0] = 0.0;
        ix_scores[0] = NEG_INF;
        iy_scores[0] = NEG_INF;
        for j in 1..=len_b {
            let index_b = letter_index(seq_b[j - 1]);

            let mut score = max3(m_diagonal, ix_diagonal, iy_diagonal)
                + substitution.score(index_a, index_b);
            if score < epsilon {
                score = 0.0;
            } else if score > maximum {
                maximum = score;
            }
            m_diagonal = m_scores[j];
            m_scores[j] = score;

            // Gap states are forced dead along the final row and column to
            // forbid trailing gaps.
            if i == len_a || j == len_b {
                ix_diagonal = ix_scores[j];
                ix_scores[j] = 0.0;
                iy_diagonal = iy_scores[j];
                iy_scores[j] = 0.0;
                continue;
            }

            let mut score = max3(
                m_diagonal + gaps.query_internal_open,
                ix_scores[j] + gaps.query_internal_extend,
                iy_scores[j] + gaps.query_internal_open,
            );
            if score < epsilon {
                score = NEG_INF;
            }
            ix_diagonal = ix_scores[j];
            ix_scores[j] = score;

            let mut score = max3(
                m_scores[j - 1] + gaps.target_internal_open,
                ix_scores[j - 1] + gaps.target_internal_open,
                iy_scores[j - 1] + gaps.target_internal_extend,
            );
            if score < epsilon {
                score = NEG_INF;
            }
            iy_diagonal = iy_scores[j];
            iy_scores[j] = score;
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
    let gap_scores = &aligner.gap_scores;
    let substitution = &aligner.substitution;
    let epsilon = aligner.epsilon;

    let mut paths = PathGenerator::new_gotoh(len_a, len_b, Mode::Local)?;
    let (matrix, gaps) = paths.gotoh_tables_mut();
    let mut m_scores = try_vec::<f64>(len_b + 1)?;
    let mut ix_scores = try_vec::<f64>(len_b + 1)?;
    let mut iy_scores = try_vec::<f64>(len_b + 1)?;
    ix_scores[0] = NEG_INF;
    iy_scores[0] = NEG_INF;
    for j in 1..=len_b {
        ix_scores[j] = NEG_INF;
        iy_scores[j] = NEG_INF;
    }

    let mut maximum = 0.0f64;
    let mut endpoint_cursor = (len_a, len_b);
    for i in 1..=len_a {
        let index_a = letter_index(seq_a[i - 1]);
        let mut m_diagonal = m_scores[0];
        let mut ix_diagonal = ix_scores[0];
        let mut iy_diagonal = iy_scores[0];
        m_scores[0] = 0.0;
        ix_scores[0] = NEG_INF;
        iy_scores[0] = NEG_INF;
        for j in 1..=len_b {
            let index_b = letter_index(seq_b[j - 1]);

            let (mut score, mut trace) = select_trace(
                epsilon,
                [
                    (m_diagonal, M_MATRIX),
                    (ix_diagonal, IX_MATRIX),
                    (iy_diagonal, IY_MATRIX),
                ],
            );
            score += substitution.score(index_a, index_b);
            if score < epsilon {
                score = 0.0;
                trace = STARTPOINT;
            } else if score > maximum - epsilon {
                if score > maximum + epsilon {
                    maximum = score;
                    clear_endpoints(matrix, &mut endpoint_cursor, (i, j));
                }
                trace |= ENDPOINT;
            }
            matrix[[i, j]].trace = trace;
            m_diagonal = m_scores[j];
            m_scores[j] = score;

            // Gap states are forced dead along the final row and column to
            // forbid trailing gaps.
            if i == len_a || j == len_b {
                ix_diagonal = ix_scores[j];
                ix_scores[j] = 0.0;
                gaps[[i, j]].ix = 0;
                iy_diagonal = iy_scores[j];
                iy_scores[j] = 0.0;
                gaps[[i, j]].iy = 0;
                continue;
            }

            let (mut score, mut trace) = select_trace(
                epsilon,
                [
                    (m_diagonal + gap_scores.query_internal_open, M_MATRIX),
                    (ix_scores[j] + gap_scores.query_internal_extend, IX_MATRIX),
                    (iy_scores[j] + gap_scores.query_internal_open, IY_MATRIX),
                ],
            );
            if score < epsilon {
                score = NEG_INF;
                trace = 0;
            }
            gaps[[i, j]].ix = trace;
            ix_diagonal = ix_scores[j];
            ix_scores[j] = score;

            let (mut score, mut trace) = select_trace(
                epsilon,
                [
                    (m_scores[j - 1] + gap_scores.target_internal_open, M_MATRIX),
                    (ix_scores[j - 1] + gap_scores.target_internal_open, IX_MATRIX),
                    (
                        iy_scores[j - 1] + gap_scores.target_internal_extend,
                        IY_MATRIX,
                    ),
                ],
            );
            if score < epsilon {
                score = NEG_INF;
                trace = 0;
            }
            gaps[[i, j]].iy = trace;
            iy_diagonal = iy_scores[j];
            iy_scores[j] = score;
        }
    }

    // Zero-score extensions are not allowed, so traces towards an end point
    // are pruned. The `path` field carries a per-state reachability mask
    // during this sweep; an end point terminates reachability for the `M`
    // state but its gap states may still carry a gap across it.
    for j in 0..=len_b {
        matrix[[0, j]].path = M_MATRIX;
    }
    for i in 1..=len_a {
        matrix[[i, 0]].path = M_MATRIX;
        for j in 1..=len_b {
            let mut trace = matrix[[i, j]].trace;
            let diagonal_path = matrix[[i - 1, j - 1]].path;
            if diagonal_path & M_MATRIX == 0 {
                trace &= !M_MATRIX;
            }
            if diagonal_path & IX_MATRIX == 0 {
                trace &= !IX_MATRIX;
            }
            if diagonal_path & IY_MATRIX == 0 {
                trace &= !IY_MATRIX;
            }
            if trace & (STARTPOINT | M_MATRIX | IX_MATRIX | IY_MATRIX) != 0 {
                if trace & ENDPOINT != 0 {
                    matrix[[i, j]].path = 0;
                } else {
                    matrix[[i, j]].path |= M_MATRIX;
                }
            } else {
                matrix[[i, j]].path &= !M_MATRIX;
                trace = 0;
            }
            matrix[[i, j]].trace = trace;

            let mut trace = gaps[[i, j]].ix;
            let above_path = matrix[[i - 1, j]].path;
            if above_path & M_MATRIX == 0 {
                trace &= !M_MATRIX;
            }
            if above_path & IX_MATRIX == 0 {
                trace &= !IX_MATRIX;
            }
            if above_path & IY_MATRIX == 0 {
                trace &= !IY_MATRIX;
            }
            if trace != 0 {
                matrix[[i, j]].path |= IX_MATRIX;
            } else {
                matrix[[i, j]].path &= !IX_MATRIX;
            }
            gaps[[i, j]].ix = trace;

            let mut trace = gaps[[i, j]].iy;
            let left_path = matrix[[i, j - 1]].path;
            if left_path & M_MATRIX == 0 {
                trace &= !M_MATRIX;
            }
            if left_path & IX_MATRIX == 0 {
                trace &= !IX_MATRIX;
            }
            if left_path & IY_MATRIX == 0 {
                trace &= !IY_MATRIX;
            }
            if trace != 0 {
                matrix[[i, j]].path |= IY_MATRIX;
            } else {
                matrix[[i, j]].path &= !IY_MATRIX;
            }
            gaps[[i, j]].iy = trace;
        }
    }

    matrix[[0, 0]].path = if maximum == 0.0 { NONE } else { 0 };

    Ok((maximum, paths))
}
