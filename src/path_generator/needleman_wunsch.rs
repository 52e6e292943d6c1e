//! Path counting and enumeration over the single-state trace table.

use crate::error::Result;
use crate::trace_matrix::{
    DIAGONAL, DONE, ENDPOINT, HORIZONTAL, NONE, STARTPOINT, VERTICAL, try_vec,
};

use super::{AlignmentPath, PathCount, PathGenerator, TraceTables, create_path};

impl PathGenerator {
    pub(super) fn count_needleman_wunsch_global(&self) -> Result<PathCount> {
        let TraceTables::NeedlemanWunsch { matrix } = &self.traces else {
            unreachable!("trace table mismatch");
        };
        let mut counts = try_vec::<PathCount>(self.len_b + 1)?;
        counts[0] = PathCount::ONE;
        for j in 1..=self.len_b {
            counts[j] = if matrix[[0, j]].trace & HORIZONTAL != 0 {
                counts[j - 1]
            } else {
                PathCount::ZERO
            };
        }
        for i in 1..=self.len_a {
            let mut count = PathCount::ZERO;
            if matrix[[i, 0]].trace & VERTICAL != 0 {
                count = count.add(counts[0]);
            }
            let mut diagonal = counts[0];
            counts[0] = count;
            for j in 1..=self.len_b {
                let trace = matrix[[i, j]].trace;
                let mut count = PathCount::ZERO;
                if trace & HORIZONTAL != 0 {
                    count = count.add(counts[j - 1]);
                }
                if trace & VERTICAL != 0 {
                    count = count.add(counts[j]);
                }
                if trace & DIAGONAL != 0 {
                    count = count.add(diagonal);
                }
                diagonal = counts[j];
                counts[j] = count;
            }
        }
        Ok(counts[self.len_b])
    }

    pub(super) fn count_needleman_wunsch_local(&self) -> Result<PathCount> {
        let TraceTables::NeedlemanWunsch { matrix } = &self.traces else {
            unreachable!("trace table mismatch");
        };
        let mut total = PathCount::ZERO;
        let mut counts = try_vec::<PathCount>(self.len_b + 1)?;
        counts.fill(PathCount::ONE);
        for i in 1..=self.len_a {
            let mut diagonal = counts[0];
            counts[0] = PathCount::ONE;
            for j in 1..=self.len_b {
                let trace = matrix[[i, j]].trace;
                let mut count = PathCount::ZERO;
                if trace & DIAGONAL != 0 {
                    count = count.add(diagonal);
                }
                // Only paths ending in a diagonal step count towards an end
                // point; the horizontal and vertical continuations below
                // extend other paths through this cell.
                if trace & ENDPOINT != 0 {
                    total = total.add(count);
                }
                if trace & HORIZONTAL != 0 {
                    count = count.add(counts[j - 1]);
                }
                if trace & VERTICAL != 0 {
                    count = count.add(counts[j]);
                }
                diagonal = counts[j];
                if count == PathCount::ZERO && trace & STARTPOINT != 0 {
                    count = PathCount::ONE;
                }
                counts[j] = count;
            }
        }
        Ok(total)
    }

    pub(super) fn next_needleman_wunsch(&mut self) -> Option<AlignmentPath> {
        let (len_a, len_b) = (self.len_a, self.len_b);
        let TraceTables::NeedlemanWunsch { matrix } = &mut self.traces else {
            unreachable!("trace table mismatch");
        };
        let mut i = 0;
        let mut j = 0;

        let mut path = matrix[[0, 0]].path;
        if path == DONE {
            return None;
        }
        if path == 0 {
            // Generate the first path.
            i = len_a;
            j = len_b;
        } else {
            // Prune the current path until an unexplored alternative is
            // found; trace bits are consumed horizontal, vertical, diagonal.
            loop {
                match path {
                    HORIZONTAL => {
                        j += 1;
                        let trace = matrix[[i, j]].trace;
                        if trace & VERTICAL != 0 {
                            i -= 1;
                            matrix[[i, j]].path = VERTICAL;
                            break;
                        }
                        if trace & DIAGONAL != 0 {
                            i -= 1;
                            j -= 1;
                            matrix[[i, j]].path = DIAGONAL;
                            break;
                        }
                    }
                    VERTICAL => {
                        i += 1;
                        let trace = matrix[[i, j]].trace;
                        if trace & DIAGONAL != 0 {
                            i -= 1;
                            j -= 1;
                            matrix[[i, j]].path = DIAGONAL;
                            break;
                        }
                    }
                    _ => {
                        i += 1;
                        j += 1;
                    }
                }
                path = matrix[[i, j]].path;
                if path == 0 {
                    // Reached the end of the alignment without finding an
                    // alternative.
                    matrix[[0, 0]].path = DONE;
                    return None;
                }
            }
        }

        // Follow the traceback to the origin.
        loop {
            let trace = matrix[[i, j]].trace;
            if trace & HORIZONTAL != 0 {
                j -= 1;
                matrix[[i, j]].path = HORIZONTAL;
            } else if trace & VERTICAL != 0 {
                i -= 1;
                matrix[[i, j]].path = VERTICAL;
            } else if trace & DIAGONAL != 0 {
                i -= 1;
                j -= 1;
                matrix[[i, j]].path = DIAGONAL;
            } else {
                break;
            }
        }
        Some(create_path(matrix, (0, 0)))
    }

    pub(super) fn next_smith_waterman(&mut self) -> Option<AlignmentPath> {
        let (len_a, len_b) = (self.len_a, self.len_b);
        let TraceTables::NeedlemanWunsch { matrix } = &mut self.traces else {
            unreachable!("trace table mismatch");
        };
        let head = matrix[[0, 0]].path;
        if head == DONE || head == NONE {
            return None;
        }

        let mut i = self.start_a;
        let mut j = self.start_b;
        let mut path = matrix[[i, j]].path;
        if path != 0 {
            // Prune the current path from its leaf.
            loop {
                match path {
                    HORIZONTAL => {
                        j += 1;
                        let trace = matrix[[i, j]].trace;
                        if trace & VERTICAL != 0 {
                            i -= 1;
                            matrix[[i, j]].path = VERTICAL;
                            break;
                        }
                        if trace & DIAGONAL != 0 {
                            i -= 1;
                            j -= 1;
                            matrix[[i, j]].path = DIAGONAL;
                            break;
                        }
                    }
                    VERTICAL => {
                        i += 1;
                        let trace = matrix[[i, j]].trace;
                        if trace & DIAGONAL != 0 {
                            i -= 1;
                            j -= 1;
                            matrix[[i, j]].path = DIAGONAL;
                            break;
                        }
                    }
                    _ => {
                        i += 1;
                        j += 1;
                    }
                }
                path = matrix[[i, j]].path;
                if path == 0 {
                    break;
                }
            }
        }

        let mut trace;
        if path != 0 {
            trace = matrix[[i, j]].trace;
        } else {
            // Find the next end point in row-major order. Local paths may
            // not end in a gap, so an end point whose diagonal trace was
            // pruned cannot root a path and is skipped.
            loop {
                if j < len_b {
                    j += 1;
                } else if i < len_a {
                    i += 1;
                    j = 0;
                } else {
                    matrix[[0, 0]].path = DONE;
                    return None;
                }
                trace = matrix[[i, j]].trace;
                if trace & ENDPOINT != 0 {
                    trace &= DIAGONAL;
                    if trace != 0 {
                        break;
                    }
                }
            }
            matrix[[i, j]].path = 0;
        }

        // Follow the traceback to a start point.
        loop {
            if trace & HORIZONTAL != 0 {
                j -= 1;
                matrix[[i, j]].path = HORIZONTAL;
            } else if trace & VERTICAL != 0 {
                i -= 1;
                matrix[[i, j]].path = VERTICAL;
            } else if trace & DIAGONAL != 0 {
                i -= 1;
                j -= 1;
                matrix[[i, j]].path = DIAGONAL;
            } else if trace & STARTPOINT != 0 {
                self.start_a = i;
                self.start_b = j;
                return Some(create_path(matrix, (i, j)));
            } else {
                panic!("inconsistent trace table during local path enumeration");
            }
            trace = matrix[[i, j]].trace;
        }
    }
}
