//! The general-gap recurrence: gap costs come from a gap-cost provider
//! instead of the affine closed form, so the gap states maximize over an
//! explicit inner loop of gap lengths. Every co-optimal gap length is
//! recorded in the per-cell gap lists.

use ndarray::Array2;

use crate::error::Result;
use crate::path_generator::PathGenerator;
use crate::scoring::Mode;
use crate::scoring::gap_function::GapCost;
use crate::trace_matrix::{
    ENDPOINT, IX_MATRIX, IY_MATRIX, M_MATRIX, NONE, STARTPOINT, TraceCell, WsbGapCell,
    clear_endpoints, try_matrix,
};

use super::{NEG_INF, PairwiseAligner, letter_index, max3, select_trace};

/// Maximizes a gap state over all gap lengths, recording every co-optimal
/// length into the list of its source state.
///
/// `scores` yields, per length, the gap cost together with the two source
/// scores the gap may start from (`M` and the cross state).
fn select_gap(
    epsilon: f64,
    lengths: usize,
    mut scores: impl FnMut(usize) -> Result<(f64, f64, f64)>,
    m_list: &mut Vec<usize>,
    cross_list: &mut Vec<usize>,
) -> Result<f64> {
    let mut score = NEG_INF;
    for gap in 1..=lengths {
        let (gap_score, from_m, from_cross) = scores(gap)?;
        let candidate = from_m + gap_score;
        if candidate > score - epsilon {
            if candidate > score + epsilon {
                score = candidate;
                m_list.clear();
                cross_list.clear();
            }
            m_list.push(gap);
        }
        let candidate = from_cross + gap_score;
        if candidate > score - epsilon {
            if candidate > score + epsilon {
                score = candidate;
                m_list.clear();
                cross_list.clear();
            }
            cross_list.push(gap);
        }
    }
    Ok(score)
}

pub(super) fn global_score(
    aligner: &PairwiseAligner,
    seq_a: &[u8],
    seq_b: &[u8],
) -> Result<f64> {
    let len_a = seq_a.len();
    let len_b = seq_b.len();
    let substitution = &aligner.substitution;
    let target_gap = aligner.target_gap_cost();
    let query_gap = aligner.query_gap_cost();

    let mut m_scores = try_matrix::<f64>(len_a + 1, len_b + 1)?;
    let mut ix_scores = try_matrix::<f64>(len_a + 1, len_b + 1)?;
    let mut iy_scores = try_matrix::<f64>(len_a + 1, len_b + 1)?;
    ix_scores[[0, 0]] = NEG_INF;
    iy_scores[[0, 0]] = NEG_INF;
    for i in 1..=len_a {
        m_scores[[i, 0]] = NEG_INF;
        ix_scores[[i, 0]] = query_gap.cost(0, i)?;
        iy_scores[[i, 0]] = NEG_INF;
    }
    for j in 1..=len_b {
        m_scores[[0, j]] = NEG_INF;
        ix_scores[[0, j]] = NEG_INF;
        iy_scores[[0, j]] = target_gap.cost(0, j)?;
    }

    for i in 1..=len_a {
        let index_a = letter_index(seq_a[i - 1]);
        for j in 1..=len_b {
            let index_b = letter_index(seq_b[j - 1]);
            let score = max3(
                m_scores[[i - 1, j - 1]],
                ix_scores[[i - 1, j - 1]],
                iy_scores[[i - 1, j - 1]],
            );
            m_scores[[i, j]] = score + substitution.score(index_a, index_b);

            let mut score = NEG_INF;
            for gap in 1..=i {
                let gap_score = query_gap.cost(j, gap)?;
                score = max3(
                    score,
                    m_scores[[i - gap, j]] + gap_score,
                    iy_scores[[i - gap, j]] + gap_score,
                );
            }
            ix_scores[[i, j]] = score;

            let mut score = NEG_INF;
            for gap in 1..=j {
                let gap_score = target_gap.cost(i, gap)?;
                score = max3(
                    score,
                    m_scores[[i, j - gap]] + gap_score,
                    ix_scores[[i, j - gap]] + gap_score,
                );
            }
            iy_scores[[i, j]] = score;
        }
    }
    Ok(max3(
        m_scores[[len_a, len_b]],
        ix_scores[[len_a, len_b]],
        iy_scores[[len_a, len_b]],
    ))
}

pub(super) fn global_align(
    aligner: &PairwiseAligner,
    seq_a: &[u8],
    seq_b: &[u8],
) -> Result<(f64, PathGenerator)> {
    let len_a = seq_a.len();
    let len_b = seq_b.len();
    let substitution = &aligner.substitution;
    let epsilon = aligner.epsilon;
    let target_gap = aligner.target_gap_cost();
    let query_gap = aligner.query_gap_cost();

    let mut paths = PathGenerator::new_waterman_smith_beyer(len_a, len_b, Mode::Global)?;
    let (matrix, gaps) = paths.waterman_smith_beyer_tables_mut();
    let mut m_scores = try_matrix::<f64>(len_a + 1, len_b + 1)?;
    let mut ix_scores = try_matrix::<f64>(len_a + 1, len_b + 1)?;
    let mut iy_scores = try_matrix::<f64>(len_a + 1, len_b + 1)?;
    ix_scores[[0, 0]] = NEG_INF;
    iy_scores[[0, 0]] = NEG_INF;
    for i in 1..=len_a {
        m_scores[[i, 0]] = NEG_INF;
        ix_scores[[i, 0]] = query_gap.cost(0, i)?;
        iy_scores[[i, 0]] = NEG_INF;
    }
    for j in 1..=len_b {
        m_scores[[0, j]] = NEG_INF;
        ix_scores[[0, j]] = NEG_INF;
        iy_scores[[0, j]] = target_gap.cost(0, j)?;
    }

    for i in 1..=len_a {
        let index_a = letter_index(seq_a[i - 1]);
        for j in 1..=len_b {
            let index_b = letter_index(seq_b[j - 1]);
            let (score, trace) = select_trace(
                epsilon,
                [
                    (m_scores[[i - 1, j - 1]], M_MATRIX),
                    (ix_scores[[i - 1, j - 1]], IX_MATRIX),
                    (iy_scores[[i - 1, j - 1]], IY_MATRIX),
                ],
            );
            matrix[[i, j]].trace = trace;
            m_scores[[i, j]] = score + substitution.score(index_a, index_b);

            let mut m_list = Vec::new();
            let mut cross_list = Vec::new();
            let score = select_gap(
                epsilon,
                i,
                |gap| {
                    Ok((
                        query_gap.cost(j, gap)?,
                        m_scores[[i - gap, j]],
                        iy_scores[[i - gap, j]],
                    ))
                },
                &mut m_list,
                &mut cross_list,
            )?;
            ix_scores[[i, j]] = score;
            gaps[[i, j]].m_ix = m_list;
            gaps[[i, j]].iy_ix = cross_list;

            let mut m_list = Vec::new();
            let mut cross_list = Vec::new();
            let score = select_gap(
                epsilon,
                j,
                |gap| {
                    Ok((
                        target_gap.cost(i, gap)?,
                        m_scores[[i, j - gap]],
                        ix_scores[[i, j - gap]],
                    ))
                },
                &mut m_list,
                &mut cross_list,
            )?;
            iy_scores[[i, j]] = score;
            gaps[[i, j]].m_iy = m_list;
            gaps[[i, j]].ix_iy = cross_list;
        }
    }
    matrix[[len_a, len_b]].path = 0;

    // Only end states within the tie tolerance of the optimum may root a
    // traceback.
    let end = [len_a, len_b];
    let score = max3(m_scores[end], ix_scores[end], iy_scores[end]);
    if m_scores[end] < score - epsilon {
        matrix[end].trace = 0;
    }
    if ix_scores[end] < score - epsilon {
        gaps[end].m_ix.clear();
        gaps[end].iy_ix.clear();
    }
    if iy_scores[end] < score - epsilon {
        gaps[end].m_iy.clear();
        gaps[end].ix_iy.clear();
    }
    Ok((score, paths))
}

pub(super) fn local_score(aligner: &PairwiseAligner, seq_a: &[u8], seq_b: &[u8]) -> Result<f64> {
    let len_a = seq_a.len();
    let len_b = seq_b.len();
    let substitution = &aligner.substitution;
    let epsilon = aligner.epsilon;
    let target_gap = aligner.target_gap_cost();
    let query_gap = aligner.query_gap_cost();

    let mut m_scores = try_matrix::<f64>(len_a + 1, len_b + 1)?;
    let mut ix_scores = try_matrix::<f64>(len_a + 1, len_b + 1)?;
    let mut iy_scores = try_matrix::<f64>(len_a + 1, len_b + 1)?;
    for i in 1..=len_a {
        ix_scores[[i, 0]] = NEG_INF;
        iy_scores[[i, 0]] = NEG_INF;
    }
    ix_scores[[0, 0]] = NEG_INF;
    iy_scores[[0, 0]] = NEG_INF;
    for j in 1..=len_b {
        ix_scores[[0, j]] = NEG_INF;
        iy_scores[[0, j]] = NEG_INF;
    }

    let mut maximum = 0.0f64;
    for i in 1..=len_a {
        let index_a = letter_index(seq_a[i - 1]);
        for j in 1..=len_b {
            let index_b = letter_index(seq_b[j - 1]);
            let mut score = max3(
                m_scores[[i - 1, j - 1]],
                ix_scores[[i - 1, j - 1]],
                iy_scores[[i - 1, j - 1]],
            ) + substitution.score(index_a, index_b);
            if score < epsilon {
                score = 0.0;
            } else if score > maximum {
                maximum = score;
            }
            m_scores[[i, j]] = score;

            // Trailing gaps are forbidden in local alignments.
            if i == len_a || j == len_b {
                ix_scores[[i, j]] = 0.0;
                iy_scores[[i, j]] = 0.0;
                continue;
            }

            let mut score = NEG_INF;
            for gap in 1..=i {
                let gap_score = query_gap.cost(j, gap)?;
                score = max3(
                    score,
                    m_scores[[i - gap, j]] + gap_score,
                    iy_scores[[i - gap, j]] + gap_score,
                );
            }
            if score < epsilon {
                score = NEG_INF;
            } else if score > maximum {
                maximum = score;
            }
            ix_scores[[i, j]] = score;

            let mut score = NEG_INF;
            for gap in 1..=j {
                let gap_score = target_gap.cost(i, gap)?;
                score = max3(
                    score,
                    m_scores[[i, j - gap]] + gap_score,
                    ix_scores[[i, j - gap]] + gap_score,
                );
            }
            if score < epsilon {
                score = NEG_INF;
            } else if score > maximum {
                maximum = score;
            }
            iy_scores[[i, j]] = score;
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
    let substitution = &aligner.substitution;
    let epsilon = aligner.epsilon;
    let target_gap = aligner.target_gap_cost();
    let query_gap = aligner.query_gap_cost();

    let mut paths = PathGenerator::new_waterman_smith_beyer(len_a, len_b, Mode::Local)?;
    let (matrix, gaps) = paths.waterman_smith_beyer_tables_mut();
    let mut m_scores = try_matrix::<f64>(len_a + 1, len_b + 1)?;
    let mut ix_scores = try_matrix::<f64>(len_a + 1, len_b + 1)?;
    let mut iy_scores = try_matrix::<f64>(len_a + 1, len_b + 1)?;
    for i in 1..=len_a {
        ix_scores[[i, 0]] = NEG_INF;
        iy_scores[[i, 0]] = NEG_INF;
    }
    ix_scores[[0, 0]] = NEG_INF;
    iy_scores[[0, 0]] = NEG_INF;
    for j in 1..=len_b {
        ix_scores[[0, j]] = NEG_INF;
        iy_scores[[0, j]] = NEG_INF;
    }

    let mut maximum = 0.0f64;
    let mut endpoint_cursor = (len_a, len_b);
    for i in 1..=len_a {
        let index_a = letter_index(seq_a[i - 1]);
        for j in 1..=len_b {
            let index_b = letter_index(seq_b[j - 1]);
            let (mut score, mut trace) = select_trace(
                epsilon,
                [
                    (m_scores[[i - 1, j - 1]], M_MATRIX),
                    (ix_scores[[i - 1, j - 1]], IX_MATRIX),
                    (iy_scores[[i - 1, j - 1]], IY_MATRIX),
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
            m_scores[[i, j]] = score;

            // Trailing gaps are forbidden in local alignments.
            if i == len_a || j == len_b {
                ix_scores[[i, j]] = 0.0;
                iy_scores[[i, j]] = 0.0;
                continue;
            }

            let mut m_list = Vec::new();
            let mut cross_list = Vec::new();
            let mut score = select_gap(
                epsilon,
                i,
                |gap| {
                    Ok((
                        query_gap.cost(j, gap)?,
                        m_scores[[i - gap, j]],
                        iy_scores[[i - gap, j]],
                    ))
                },
                &mut m_list,
                &mut cross_list,
            )?;
            if score < epsilon {
                score = NEG_INF;
                m_list.clear();
                cross_list.clear();
            } else if score > maximum {
                maximum = score;
            }
            ix_scores[[i, j]] = score;
            gaps[[i, j]].m_ix = m_list;
            gaps[[i, j]].iy_ix = cross_list;

            let mut m_list = Vec::new();
            let mut cross_list = Vec::new();
            let mut score = select_gap(
                epsilon,
                j,
                |gap| {
                    Ok((
                        target_gap.cost(i, gap)?,
                        m_scores[[i, j - gap]],
                        ix_scores[[i, j - gap]],
                    ))
                },
                &mut m_list,
                &mut cross_list,
            )?;
            if score < epsilon {
                score = NEG_INF;
                m_list.clear();
                cross_list.clear();
            } else if score > maximum {
                maximum = score;
            }
            iy_scores[[i, j]] = score;
            gaps[[i, j]].m_iy = m_list;
            gaps[[i, j]].ix_iy = cross_list;
        }
    }

    prune_unreachable(matrix, gaps, len_a, len_b);

    matrix[[0, 0]].path = if maximum == 0.0 { NONE } else { 0 };

    Ok((maximum, paths))
}

/// Removes traces and gap entries that cannot be reached from a start
/// point, so the enumerator never produces zero-score extensions. The
/// `path` field carries a per-state reachability mask during the sweep.
fn prune_unreachable(
    matrix: &mut Array2<TraceCell>,
    gaps: &mut Array2<WsbGapCell>,
    len_a: usize,
    len_b: usize,
) {
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
            if i == len_a || j == len_b {
                continue;
            }

            gaps[[i, j]]
                .m_ix
                .retain(|&gap| matrix[[i - gap, j]].path & M_MATRIX != 0);
            gaps[[i, j]]
                .iy_ix
                .retain(|&gap| matrix[[i - gap, j]].path & IY_MATRIX != 0);
            if gaps[[i, j]].m_ix.is_empty() && gaps[[i, j]].iy_ix.is_empty() {
                matrix[[i, j]].path &= !IX_MATRIX;
            } else {
                matrix[[i, j]].path |= IX_MATRIX;
            }

            gaps[[i, j]]
                .m_iy
                .retain(|&gap| matrix[[i, j - gap]].path & M_MATRIX != 0);
            gaps[[i, j]]
                .ix_iy
                .retain(|&gap| matrix[[i, j - gap]].path & IX_MATRIX != 0);
            if gaps[[i, j]].m_iy.is_empty() && gaps[[i, j]].ix_iy.is_empty() {
                matrix[[i, j]].path &= !IY_MATRIX;
            } else {
                matrix[[i, j]].path |= IY_MATRIX;
            }
        }
    }
}
