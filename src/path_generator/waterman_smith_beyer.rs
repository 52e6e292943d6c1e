//! Path counting and enumeration over the general-gap trace tables.
//!
//! Gap runs are encoded as per-cell lists of every co-optimal gap length,
//! keyed by the state the gap starts from. The enumerator consumes the `M`
//! sourced list before the cross-state list, each in stored order.

use ndarray::Array2;

use crate::error::Result;
use crate::trace_matrix::{
    DIAGONAL, DONE, ENDPOINT, HORIZONTAL, IX_MATRIX, IY_MATRIX, M_MATRIX, NONE, STARTPOINT,
    TraceCell, VERTICAL, WsbGapCell, try_matrix,
};

use super::{AlignmentPath, PathCount, PathGenerator, TraceTables, create_path};

/// Looks up the successor of `current` in a gap run's two source lists:
/// first the remaining `M`-sourced lengths, then the cross-state list.
///
/// `current_from_m` says which list the current path's gap length lives in.
/// Returns the source state (`M` or `cross_state`) and the new length.
fn next_gap(
    m_list: &[usize],
    cross_list: &[usize],
    cross_state: u8,
    current: usize,
    current_from_m: bool,
) -> Option<(u8, usize)> {
    if current_from_m {
        let position = m_list
            .iter()
            .position(|&gap| gap == current)
            .expect("inconsistent trace table: current gap length is not recorded");
        if let Some(&gap) = m_list.get(position + 1) {
            return Some((M_MATRIX, gap));
        }
        cross_list.first().map(|&gap| (cross_state, gap))
    } else {
        let position = cross_list
            .iter()
            .position(|&gap| gap == current)
            .expect("inconsistent trace table: current gap length is not recorded");
        cross_list.get(position + 1).map(|&gap| (cross_state, gap))
    }
}

/// Counts paths reaching each state of each cell, bottom-up.
struct StateCounts {
    m: Array2<PathCount>,
    ix: Array2<PathCount>,
    iy: Array2<PathCount>,
}

impl StateCounts {
    fn compute(
        matrix: &Array2<TraceCell>,
        gaps: &Array2<WsbGapCell>,
        len_a: usize,
        len_b: usize,
        local: bool,
        mut on_endpoint: impl FnMut(PathCount),
    ) -> Result<Self> {
        let mut counts = Self {
            m: try_matrix(len_a + 1, len_b + 1)?,
            ix: try_matrix(len_a + 1, len_b + 1)?,
            iy: try_matrix(len_a + 1, len_b + 1)?,
        };
        for i in 0..=len_a {
            for j in 0..=len_b {
                let trace = matrix[[i, j]].trace;
                let mut count = PathCount::ZERO;
                if trace & M_MATRIX != 0 {
                    count = count.add(counts.m[[i - 1, j - 1]]);
                }
                if trace & IX_MATRIX != 0 {
                    count = count.add(counts.ix[[i - 1, j - 1]]);
                }
                if trace & IY_MATRIX != 0 {
                    count = count.add(counts.iy[[i - 1, j - 1]]);
                }
                if count == PathCount::ZERO {
                    if local {
                        if trace & STARTPOINT != 0 {
                            count = PathCount::ONE;
                        }
                    } else if i == 0 && j == 0 {
                        count = PathCount::ONE;
                    }
                }
                counts.m[[i, j]] = count;
                if local && trace & ENDPOINT != 0 {
                    on_endpoint(count);
                }

                let cell = &gaps[[i, j]];
                let mut count = PathCount::ZERO;
                for &gap in &cell.m_ix {
                    count = count.add(counts.m[[i - gap, j]]);
                }
                for &gap in &cell.iy_ix {
                    count = count.add(counts.iy[[i - gap, j]]);
                }
                counts.ix[[i, j]] = count;

                let mut count = PathCount::ZERO;
                for &gap in &cell.m_iy {
                    count = count.add(counts.m[[i, j - gap]]);
                }
                for &gap in &cell.ix_iy {
                    count = count.add(counts.ix[[i, j - gap]]);
                }
                counts.iy[[i, j]] = count;
            }
        }
        Ok(counts)
    }
}

impl PathGenerator {
    pub(super) fn count_waterman_smith_beyer_global(&self) -> Result<PathCount> {
        let TraceTables::WatermanSmithBeyer { matrix, gaps } = &self.traces else {
            unreachable!("trace table mismatch");
        };
        let counts = StateCounts::compute(matrix, gaps, self.len_a, self.len_b, false, |_| {})?;
        let end = [self.len_a, self.len_b];
        let mut count = PathCount::ZERO;
        if matrix[end].trace != 0 {
            count = count.add(counts.m[end]);
        }
        let cell = &gaps[end];
        if !cell.m_ix.is_empty() || !cell.iy_ix.is_empty() {
            count = count.add(counts.ix[end]);
        }
        if !cell.m_iy.is_empty() || !cell.ix_iy.is_empty() {
            count = count.add(counts.iy[end]);
        }
        Ok(count)
    }

    pub(super) fn count_waterman_smith_beyer_local(&self) -> Result<PathCount> {
        let TraceTables::WatermanSmithBeyer { matrix, gaps } = &self.traces else {
            unreachable!("trace table mismatch");
        };
        let mut total = PathCount::ZERO;
        StateCounts::compute(matrix, gaps, self.len_a, self.len_b, true, |count| {
            total = total.add(count);
        })?;
        Ok(total)
    }

    pub(super) fn next_waterman_smith_beyer_global(&mut self) -> Option<AlignmentPath> {
        let (len_a, len_b) = (self.len_a, self.len_b);
        let TraceTables::WatermanSmithBeyer { matrix, gaps } = &mut self.traces else {
            unreachable!("trace table mismatch");
        };
        let mut i = 0;
        let mut j = 0;
        let mut m = M_MATRIX;

        let mut path = matrix[[0, 0]].path;
        if path == DONE {
            return None;
        }
        if path != 0 {
            // Prune the current path segment by segment. `m` is the state
            // the path occupies at (i, j), which for a gap run is the state
            // the gap starts from.
            loop {
                if path == 0 {
                    // All alternatives below the root state are exhausted.
                    m <<= 1;
                    break;
                }
                match path {
                    HORIZONTAL => {
                        let mut run_end = j;
                        while matrix[[i, run_end]].path == HORIZONTAL {
                            run_end += 1;
                        }
                        let cell = &gaps[[i, run_end]];
                        match next_gap(&cell.m_iy, &cell.ix_iy, IX_MATRIX, run_end - j, m == M_MATRIX)
                        {
                            Some((state, gap)) => {
                                m = state;
                                j = run_end - gap;
                                let mut column = run_end;
                                while column > j {
                                    column -= 1;
                                    matrix[[i, column]].path = HORIZONTAL;
                                }
                                break;
                            }
                            None => {
                                m = IY_MATRIX;
                                j = run_end;
                            }
                        }
                    }
                    VERTICAL => {
                        let mut run_end = i;
                        while matrix[[run_end, j]].path == VERTICAL {
                            run_end += 1;
                        }
                        let cell = &gaps[[run_end, j]];
                        match next_gap(&cell.m_ix, &cell.iy_ix, IY_MATRIX, run_end - i, m == M_MATRIX)
                        {
                            Some((state, gap)) => {
                                m = state;
                                i = run_end - gap;
                                let mut row = run_end;
                                while row > i {
                                    row -= 1;
                                    matrix[[row, j]].path = VERTICAL;
                                }
                                break;
                            }
                            None => {
                                m = IX_MATRIX;
                                i = run_end;
                            }
                        }
                    }
                    DIAGONAL => {
                        let trace = matrix[[i + 1, j + 1]].trace;
                        let alternative = if m == M_MATRIX && trace & IX_MATRIX != 0 {
                            Some(IX_MATRIX)
                        } else if (m == M_MATRIX || m == IX_MATRIX) && trace & IY_MATRIX != 0 {
                            Some(IY_MATRIX)
                        } else {
                            None
                        };
                        match alternative {
                            Some(state) => {
                                m = state;
                                break;
                            }
                            None => {
                                m = M_MATRIX;
                                i += 1;
                                j += 1;
                            }
                        }
                    }
                    _ => panic!("unexpected path direction during path enumeration"),
                }
                path = matrix[[i, j]].path;
            }
        }

        if path == 0 {
            // Pick the next end state at the bottom-right cell.
            let cell = &gaps[[len_a, len_b]];
            let end_states = [
                (M_MATRIX, matrix[[len_a, len_b]].trace != 0),
                (IX_MATRIX, !cell.m_ix.is_empty() || !cell.iy_ix.is_empty()),
                (IY_MATRIX, !cell.m_iy.is_empty() || !cell.ix_iy.is_empty()),
            ];
            let from = match m {
                M_MATRIX => 0,
                IX_MATRIX => 1,
                IY_MATRIX => 2,
                _ => 3,
            };
            match end_states[from..].iter().find(|(_, present)| *present) {
                Some(&(state, _)) => m = state,
                None => {
                    matrix[[0, 0]].path = DONE;
                    return None;
                }
            }
            i = len_a;
            j = len_b;
        }

        // Follow the traceback to the origin.
        loop {
            match m {
                M_MATRIX => {
                    let trace = matrix[[i, j]].trace;
                    m = if trace & M_MATRIX != 0 {
                        M_MATRIX
                    } else if trace & IX_MATRIX != 0 {
                        IX_MATRIX
                    } else if trace & IY_MATRIX != 0 {
                        IY_MATRIX
                    } else {
                        return Some(create_path(matrix, (i, j)));
                    };
                    i -= 1;
                    j -= 1;
                    matrix[[i, j]].path = DIAGONAL;
                }
                IX_MATRIX => {
                    let cell = &gaps[[i, j]];
                    let (state, gap) = if let Some(&gap) = cell.m_ix.first() {
                        (M_MATRIX, gap)
                    } else if let Some(&gap) = cell.iy_ix.first() {
                        (IY_MATRIX, gap)
                    } else {
                        panic!("inconsistent trace table: gap state without sources");
                    };
                    m = state;
                    for _ in 0..gap {
                        i -= 1;
                        matrix[[i, j]].path = VERTICAL;
                    }
                }
                _ => {
                    let cell = &gaps[[i, j]];
                    let (state, gap) = if let Some(&gap) = cell.m_iy.first() {
                        (M_MATRIX, gap)
                    } else if let Some(&gap) = cell.ix_iy.first() {
                        (IX_MATRIX, gap)
                    } else {
                        panic!("inconsistent trace table: gap state without sources");
                    };
                    m = state;
                    for _ in 0..gap {
                        j -= 1;
                        matrix[[i, j]].path = HORIZONTAL;
                    }
                }
            }
        }
    }

    pub(super) fn next_waterman_smith_beyer_local(&mut self) -> Option<AlignmentPath> {
        let (len_a, len_b) = (self.len_a, self.len_b);
        let TraceTables::WatermanSmithBeyer { matrix, gaps } = &mut self.traces else {
            unreachable!("trace table mismatch");
        };
        let head = matrix[[0, 0]].path;
        if head == DONE || head == NONE {
            return None;
        }

        let mut leaf_a = self.start_a;
        let mut leaf_b = self.start_b;
        let mut m = 0;
        let mut i = leaf_a;
        let mut j = leaf_b;
        if matrix[[leaf_a, leaf_b]].path != 0 {
            // Prune the current path from its leaf.
            m = M_MATRIX;
            loop {
                let path = matrix[[i, j]].path;
                match path {
                    HORIZONTAL => {
                        let mut run_end = j;
                        while matrix[[i, run_end]].path == HORIZONTAL {
                            run_end += 1;
                        }
                        let cell = &gaps[[i, run_end]];
                        match next_gap(&cell.m_iy, &cell.ix_iy, IX_MATRIX, run_end - j, m == M_MATRIX)
                        {
                            Some((state, gap)) => {
                                m = state;
                                j = run_end - gap;
                                let mut column = run_end;
                                while column > j {
                                    column -= 1;
                                    matrix[[i, column]].path = HORIZONTAL;
                                }
                                break;
                            }
                            None => {
                                m = IY_MATRIX;
                                j = run_end;
                            }
                        }
                    }
                    VERTICAL => {
                        let mut run_end = i;
                        while matrix[[run_end, j]].path == VERTICAL {
                            run_end += 1;
                        }
                        let cell = &gaps[[run_end, j]];
                        match next_gap(&cell.m_ix, &cell.iy_ix, IY_MATRIX, run_end - i, m == M_MATRIX)
                        {
                            Some((state, gap)) => {
                                m = state;
                                i = run_end - gap;
                                let mut row = run_end;
                                while row > i {
                                    row -= 1;
                                    matrix[[row, j]].path = VERTICAL;
                                }
                                break;
                            }
                            None => {
                                m = IX_MATRIX;
                                i = run_end;
                            }
                        }
                    }
                    DIAGONAL => {
                        let trace = matrix[[i + 1, j + 1]].trace;
                        let alternative = if m == M_MATRIX && trace & IX_MATRIX != 0 {
                            Some(IX_MATRIX)
                        } else if (m == M_MATRIX || m == IX_MATRIX) && trace & IY_MATRIX != 0 {
                            Some(IY_MATRIX)
                        } else {
                            None
                        };
                        match alternative {
                            Some(state) => {
                                m = state;
                                break;
                            }
                            None => {
                                m = M_MATRIX;
                                i += 1;
                                j += 1;
                            }
                        }
                    }
                    _ => {
                        // Reached the end point without an alternative.
                        m = 0;
                        leaf_a = i;
                        leaf_b = j;
                        break;
                    }
                }
            }
        }

        if m == 0 {
            // Find the next end point in row-major order.
            loop {
                if leaf_b < len_b {
                    leaf_b += 1;
                } else if leaf_a < len_a {
                    leaf_a += 1;
                    leaf_b = 0;
                } else {
                    matrix[[0, 0]].path = DONE;
                    return None;
                }
                if matrix[[leaf_a, leaf_b]].trace & ENDPOINT != 0 {
                    break;
                }
            }
            matrix[[leaf_a, leaf_b]].path = 0;
            m = M_MATRIX;
            i = leaf_a;
            j = leaf_b;
        }

        // Follow the traceback to a start point.
        loop {
            match m {
                IX_MATRIX => {
                    let cell = &gaps[[i, j]];
                    let (state, gap) = if let Some(&gap) = cell.m_ix.first() {
                        (M_MATRIX, gap)
                    } else if let Some(&gap) = cell.iy_ix.first() {
                        (IY_MATRIX, gap)
                    } else {
                        panic!("inconsistent trace table: gap state without sources");
                    };
                    m = state;
                    for _ in 0..gap {
                        i -= 1;
                        matrix[[i, j]].path = VERTICAL;
                    }
                }
                IY_MATRIX => {
                    let cell = &gaps[[i, j]];
                    let (state, gap) = if let Some(&gap) = cell.m_iy.first() {
                        (M_MATRIX, gap)
                    } else if let Some(&gap) = cell.ix_iy.first() {
                        (IX_MATRIX, gap)
                    } else {
                        panic!("inconsistent trace table: gap state without sources");
                    };
                    m = state;
                    for _ in 0..gap {
                        j -= 1;
                        matrix[[i, j]].path = HORIZONTAL;
                    }
                }
                _ => {
                    let trace = matrix[[i, j]].trace;
                    if trace & M_MATRIX != 0 {
                        m = M_MATRIX;
                    } else if trace & IX_MATRIX != 0 {
                        m = IX_MATRIX;
                    } else if trace & IY_MATRIX != 0 {
                        m = IY_MATRIX;
                    } else if trace == STARTPOINT {
                        self.start_a = i;
                        self.start_b = j;
                        return Some(create_path(matrix, (i, j)));
                    } else {
                        panic!("inconsistent trace table during local path enumeration");
                    }
                    i -= 1;
                    j -= 1;
                    matrix[[i, j]].path = DIAGONAL;
                }
            }
        }
    }
}
