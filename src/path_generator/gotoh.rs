//! Path counting and enumeration over the three-state affine trace tables.
//!
//! The enumerator state is the `path` direction per cell plus the matrix the
//! walk currently occupies, `m ∈ {M, Ix, Iy}`. State bits are consumed `M`
//! before `Ix` before `Iy`.

use crate::error::Result;
use crate::trace_matrix::{
    DIAGONAL, DONE, ENDPOINT, HORIZONTAL, IX_MATRIX, IY_MATRIX, M_MATRIX, NONE, STARTPOINT,
    VERTICAL, try_vec,
};

use super::{AlignmentPath, PathCount, PathGenerator, TraceTables, create_path};

/// The next state the walk through a branching cell may switch to, after
/// `current`, in `M < Ix < Iy` priority; `None` when `current` already is
/// the lowest-priority state the trace offers.
fn next_state(current: u8, trace: u8) -> Option<u8> {
    if current == M_MATRIX && trace & IX_MATRIX != 0 {
        Some(IX_MATRIX)
    } else if (current == M_MATRIX || current == IX_MATRIX) && trace & IY_MATRIX != 0 {
        Some(IY_MATRIX)
    } else {
        None
    }
}

impl PathGenerator {
    pub(super) fn count_gotoh_global(&self) -> Result<PathCount> {
        let TraceTables::Gotoh { matrix, gaps } = &self.traces else {
            unreachable!("trace table mismatch");
        };
        let mut m_counts = try_vec::<PathCount>(self.len_b + 1)?;
        let mut ix_counts = try_vec::<PathCount>(self.len_b + 1)?;
        let mut iy_counts = try_vec::<PathCount>(self.len_b + 1)?;
        m_counts[0] = PathCount::ONE;
        for j in 1..=self.len_b {
            iy_counts[j] = PathCount::ONE;
        }
        for i in 1..=self.len_a {
            let mut m_diagonal = m_counts[0];
            m_counts[0] = PathCount::ZERO;
            let mut ix_diagonal = ix_counts[0];
            ix_counts[0] = PathCount::ONE;
            let mut iy_diagonal = iy_counts[0];
            iy_counts[0] = PathCount::ZERO;
            for j in 1..=self.len_b {
                let trace = matrix[[i, j]].trace;
                let mut count = PathCount::ZERO;
                if trace & M_MATRIX != 0 {
                    count = count.add(m_diagonal);
                }
                if trace & IX_MATRIX != 0 {
                    count = count.add(ix_diagonal);
                }
                if trace & IY_MATRIX != 0 {
                    count = count.add(iy_diagonal);
                }
                m_diagonal = m_counts[j];
                m_counts[j] = count;

                let trace = gaps[[i, j]].ix;
                let mut count = PathCount::ZERO;
                if trace & M_MATRIX != 0 {
                    count = count.add(m_diagonal);
                }
                if trace & IX_MATRIX != 0 {
                    count = count.add(ix_counts[j]);
                }
                if trace & IY_MATRIX != 0 {
                    count = count.add(iy_counts[j]);
                }
                ix_diagonal = ix_counts[j];
                ix_counts[j] = count;

                let trace = gaps[[i, j]].iy;
                let mut count = PathCount::ZERO;
                if trace & M_MATRIX != 0 {
                    count = count.add(m_counts[j - 1]);
                }
                if trace & IX_MATRIX != 0 {
                    count = count.add(ix_counts[j - 1]);
                }
                if trace & IY_MATRIX != 0 {
                    count = count.add(iy_counts[j - 1]);
                }
                iy_diagonal = iy_counts[j];
                iy_counts[j] = count;
            }
        }
        let mut count = PathCount::ZERO;
        if matrix[[self.len_a, self.len_b]].trace != 0 {
            count = count.add(m_counts[self.len_b]);
        }
        if gaps[[self.len_a, self.len_b]].ix != 0 {
            count = count.add(ix_counts[self.len_b]);
        }
        if gaps[[self.len_a, self.len_b]].iy != 0 {
            count = count.add(iy_counts[self.len_b]);
        }
        Ok(count)
    }

    pub(super) fn count_gotoh_local(&self) -> Result<PathCount> {
        let TraceTables::Gotoh { matrix, gaps } = &self.traces else {
            unreachable!("trace table mismatch");
        };
        let mut total = PathCount::ZERO;
        let mut m_counts = try_vec::<PathCount>(self.len_b + 1)?;
        let mut ix_counts = try_vec::<PathCount>(self.len_b + 1)?;
        let mut iy_counts = try_vec::<PathCount>(self.len_b + 1)?;
        m_counts.fill(PathCount::ONE);
        for i in 1..=self.len_a {
            let mut m_diagonal = m_counts[0];
            m_counts[0] = PathCount::ONE;
            let mut ix_diagonal = ix_counts[0];
            ix_counts[0] = PathCount::ZERO;
            let mut iy_diagonal = iy_counts[0];
            iy_counts[0] = PathCount::ZERO;
            for j in 1..=self.len_b {
                let trace = matrix[[i, j]].trace;
                let mut count = PathCount::ZERO;
                if trace & M_MATRIX != 0 {
                    count = count.add(m_diagonal);
                }
                if trace & IX_MATRIX != 0 {
                    count = count.add(ix_diagonal);
                }
                if trace & IY_MATRIX != 0 {
                    count = count.add(iy_diagonal);
                }
                if count == PathCount::ZERO && trace & STARTPOINT != 0 {
                    count = PathCount::ONE;
                }
                m_diagonal = m_counts[j];
                m_counts[j] = count;
                if trace & ENDPOINT != 0 {
                    total = total.add(count);
                }

                let trace = gaps[[i, j]].ix;
                let mut count = PathCount::ZERO;
                if trace & M_MATRIX != 0 {
                    count = count.add(m_diagonal);
                }
                if trace & IX_MATRIX != 0 {
                    count = count.add(ix_counts[j]);
                }
                if trace & IY_MATRIX != 0 {
                    count = count.add(iy_counts[j]);
                }
                ix_diagonal = ix_counts[j];
                ix_counts[j] = count;

                let trace = gaps[[i, j]].iy;
                let mut count = PathCount::ZERO;
                if trace & M_MATRIX != 0 {
                    count = count.add(m_counts[j - 1]);
                }
                if trace & IX_MATRIX != 0 {
                    count = count.add(ix_counts[j - 1]);
                }
                if trace & IY_MATRIX != 0 {
                    count = count.add(iy_counts[j - 1]);
                }
                iy_diagonal = iy_counts[j];
                iy_counts[j] = count;
            }
        }
        Ok(total)
    }

    pub(super) fn next_gotoh_global(&mut self) -> Option<AlignmentPath> {
        let (len_a, len_b) = (self.len_a, self.len_b);
        let TraceTables::Gotoh { matrix, gaps } = &mut self.traces else {
            unreachable!("trace table mismatch");
        };
        let mut i = 0;
        let mut j = 0;
        let mut m = M_MATRIX;

        let mut path = matrix[[0, 0]].path;
        if path == DONE {
            return None;
        }
        if path == 0 {
            i = len_a;
            j = len_b;
        } else {
            // Prune the current path. The walk tracks the state `m` the path
            // occupies at (i, j); at each forward step it looks for a
            // lower-priority predecessor state of the successor cell.
            loop {
                path = matrix[[i, j]].path;
                if path == 0 {
                    m = match m {
                        M_MATRIX => IX_MATRIX,
                        IX_MATRIX => IY_MATRIX,
                        _ => 0,
                    };
                    break;
                }
                let trace = match path {
                    HORIZONTAL => {
                        j += 1;
                        gaps[[i, j]].iy
                    }
                    VERTICAL => {
                        i += 1;
                        gaps[[i, j]].ix
                    }
                    _ => {
                        i += 1;
                        j += 1;
                        matrix[[i, j]].trace
                    }
                };
                match next_state(m, trace) {
                    Some(state) => {
                        m = state;
                        match path {
                            HORIZONTAL => j -= 1,
                            VERTICAL => i -= 1,
                            _ => {
                                i -= 1;
                                j -= 1;
                            }
                        }
                        matrix[[i, j]].path = path;
                        break;
                    }
                    None => {
                        m = match path {
                            HORIZONTAL => IY_MATRIX,
                            VERTICAL => IX_MATRIX,
                            _ => M_MATRIX,
                        };
                    }
                }
            }
        }

        if path == 0 {
            // Pick the next end state at the bottom-right cell.
            let end_states = [
                (M_MATRIX, matrix[[len_a, len_b]].trace != 0),
                (IX_MATRIX, gaps[[len_a, len_b]].ix != 0),
                (IY_MATRIX, gaps[[len_a, len_b]].iy != 0),
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
        }

        let mut trace;
        match m {
            M_MATRIX => {
                trace = matrix[[i, j]].trace;
                path = DIAGONAL;
                i -= 1;
                j -= 1;
            }
            IX_MATRIX => {
                trace = gaps[[i, j]].ix;
                path = VERTICAL;
                i -= 1;
            }
            _ => {
                trace = gaps[[i, j]].iy;
                path = HORIZONTAL;
                j -= 1;
            }
        }

        // Follow the traceback to the origin, preferring M over Ix over Iy.
        loop {
            if trace & M_MATRIX != 0 {
                let cell_trace = matrix[[i, j]].trace;
                matrix[[i, j]].path = path;
                trace = cell_trace;
                path = DIAGONAL;
                if trace & (M_MATRIX | IX_MATRIX | IY_MATRIX) == 0 {
                    break;
                }
                i -= 1;
                j -= 1;
            } else if trace & IX_MATRIX != 0 {
                matrix[[i, j]].path = path;
                trace = gaps[[i, j]].ix;
                path = VERTICAL;
                if trace & (M_MATRIX | IX_MATRIX | IY_MATRIX) == 0 {
                    break;
                }
                i -= 1;
            } else if trace & IY_MATRIX != 0 {
                matrix[[i, j]].path = path;
                trace = gaps[[i, j]].iy;
                path = HORIZONTAL;
                if trace & (M_MATRIX | IX_MATRIX | IY_MATRIX) == 0 {
                    break;
                }
                j -= 1;
            } else {
                break;
            }
        }
        Some(create_path(matrix, (0, 0)))
    }

    pub(super) fn next_gotoh_local(&mut self) -> Option<AlignmentPath> {
        let (len_a, len_b) = (self.len_a, self.len_b);
        let TraceTables::Gotoh { matrix, gaps } = &mut self.traces else {
            unreachable!("trace table mismatch");
        };
        let head = matrix[[0, 0]].path;
        if head == DONE || head == NONE {
            return None;
        }

        let mut leaf_a = self.start_a;
        let mut leaf_b = self.start_b;
        let mut m = M_MATRIX;
        let mut i = leaf_a;
        let mut j = leaf_b;
        let mut path = matrix[[leaf_a, leaf_b]].path;
        if path != 0 {
            // Prune the current path from its leaf.
            loop {
                path = matrix[[i, j]].path;
                if path == 0 {
                    m = M_MATRIX;
                    leaf_a = i;
                    leaf_b = j;
                    break;
                }
                let trace = match path {
                    HORIZONTAL => {
                        j += 1;
                        gaps[[i, j]].iy
                    }
                    VERTICAL => {
                        i += 1;
                        gaps[[i, j]].ix
                    }
                    _ => {
                        i += 1;
                        j += 1;
                        matrix[[i, j]].trace
                    }
                };
                match next_state(m, trace) {
                    Some(state) => {
                        m = state;
                        match path {
                            HORIZONTAL => j -= 1,
                            VERTICAL => i -= 1,
                            _ => {
                                i -= 1;
                                j -= 1;
                            }
                        }
                        matrix[[i, j]].path = path;
                        break;
                    }
                    None => {
                        m = match path {
                            HORIZONTAL => IY_MATRIX,
                            VERTICAL => IX_MATRIX,
                            _ => M_MATRIX,
                        };
                    }
                }
            }
        }

        if path == 0 {
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
                    matrix[[leaf_a, leaf_b]].path = 0;
                    break;
                }
            }
            m = M_MATRIX;
            i = leaf_a;
            j = leaf_b;
        }

        // Follow the traceback to a start point.
        loop {
            let trace = match m {
                M_MATRIX => matrix[[i, j]].trace,
                IX_MATRIX => gaps[[i, j]].ix,
                _ => gaps[[i, j]].iy,
            };
            if trace == STARTPOINT {
                self.start_a = i;
                self.start_b = j;
                return Some(create_path(matrix, (i, j)));
            }
            let state = if trace & M_MATRIX != 0 {
                M_MATRIX
            } else if trace & IX_MATRIX != 0 {
                IX_MATRIX
            } else if trace & IY_MATRIX != 0 {
                IY_MATRIX
            } else {
                panic!("inconsistent trace table during local path enumeration");
            };
            match m {
                M_MATRIX => {
                    path = DIAGONAL;
                    i -= 1;
                    j -= 1;
                }
                IX_MATRIX => {
                    path = VERTICAL;
                    i -= 1;
                }
                _ => {
                    path = HORIZONTAL;
                    j -= 1;
                }
            }
            m = state;
            matrix[[i, j]].path = path;
        }
    }
}
