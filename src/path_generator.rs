use std::cell::Cell;
use std::marker::PhantomData;

use ndarray::Array2;

use crate::error::Result;
use crate::scoring::{AlgorithmKind, Mode};
use crate::trace_matrix::{
    DIAGONAL, GotohGapCell, HORIZONTAL, IX_MATRIX, IY_MATRIX, M_MATRIX, NONE, STARTPOINT,
    TraceCell, VERTICAL, WsbGapCell, try_matrix,
};

mod gotoh;
mod needleman_wunsch;
mod waterman_smith_beyer;

/// One co-optimal alignment path through the alignment grid.
///
/// The path is stored as its corners: the positions where the direction of
/// the next step changes, with runs of equal-direction steps collapsed. The
/// first corner is the leaf of the traceback walk (the origin in global
/// mode, a start point in local mode), the last corner its root (the
/// bottom-right cell in global mode, an end point in local mode).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlignmentPath {
    corners: Vec<(usize, usize)>,
}

impl AlignmentPath {
    pub fn corners(&self) -> &[(usize, usize)] {
        &self.corners
    }

    pub fn start(&self) -> (usize, usize) {
        self.corners[0]
    }

    pub fn end(&self) -> (usize, usize) {
        self.corners[self.corners.len() - 1]
    }
}

/// The number of co-optimal paths, or the overflow sentinel if it exceeds
/// the native integer range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathCount {
    Exact(usize),
    Overflow,
}

impl PathCount {
    pub(crate) const ZERO: Self = Self::Exact(0);
    pub(crate) const ONE: Self = Self::Exact(1);

    /// Saturating addition: any overflowed term makes the sum overflow.
    pub(crate) fn add(self, term: Self) -> Self {
        match (self, term) {
            (Self::Exact(sum), Self::Exact(term)) => {
                sum.checked_add(term).map_or(Self::Overflow, Self::Exact)
            }
            _ => Self::Overflow,
        }
    }

    pub fn is_overflow(&self) -> bool {
        matches!(self, Self::Overflow)
    }
}

impl Default for PathCount {
    fn default() -> Self {
        Self::ZERO
    }
}

/// The trace tables backing a [`PathGenerator`], one variant per recurrence.
pub(crate) enum TraceTables {
    NeedlemanWunsch {
        matrix: Array2<TraceCell>,
    },
    Gotoh {
        matrix: Array2<TraceCell>,
        gaps: Array2<GotohGapCell>,
    },
    WatermanSmithBeyer {
        matrix: Array2<TraceCell>,
        gaps: Array2<WsbGapCell>,
    },
}

impl TraceTables {
    fn matrix_mut(&mut self) -> &mut Array2<TraceCell> {
        match self {
            TraceTables::NeedlemanWunsch { matrix }
            | TraceTables::Gotoh { matrix, .. }
            | TraceTables::WatermanSmithBeyer { matrix, .. } => matrix,
        }
    }
}

/// Lazily enumerates every co-optimal alignment path exactly once, in a
/// deterministic order, without materializing the path set.
///
/// The generator owns its trace tables for its lifetime. At branching cells,
/// trace bits are consumed in a fixed priority order: horizontal before
/// vertical before diagonal for direction bits, `M` before `Ix` before `Iy`
/// for state bits, and stored order for gap-length lists. The first call to
/// [`next`](Iterator::next) threads the first path through the tables;
/// subsequent calls prune it from the leaf towards the root until an
/// unexplored alternative is found and extend that alternative to a leaf.
///
/// A generator must not be shared across threads (it is not `Sync`);
/// independent alignments can run on separate threads.
pub struct PathGenerator {
    pub(crate) traces: TraceTables,
    pub(crate) mode: Mode,
    pub(crate) len_a: usize,
    pub(crate) len_b: usize,
    /// Leaf coordinates of the most recent path; in local mode also the
    /// row-major cursor for the end-point scan.
    pub(crate) start_a: usize,
    pub(crate) start_b: usize,
    length: Option<PathCount>,
    _not_sync: PhantomData<Cell<()>>,
}

impl PathGenerator {
    fn new(traces: TraceTables, mode: Mode, len_a: usize, len_b: usize) -> Self {
        Self {
            traces,
            mode,
            len_a,
            len_b,
            start_a: 0,
            start_b: 0,
            length: None,
            _not_sync: PhantomData,
        }
    }

    /// An empty trace table for the single-state recurrence, with the
    /// boundary traces pre-filled: gap chains along the edges in global
    /// mode, start points in local mode.
    pub(crate) fn new_needleman_wunsch(len_a: usize, len_b: usize, mode: Mode) -> Result<Self> {
        let mut matrix = try_matrix::<TraceCell>(len_a + 1, len_b + 1)?;
        match mode {
            Mode::Global => {
                for i in 1..=len_a {
                    matrix[[i, 0]].trace = VERTICAL;
                }
                for j in 1..=len_b {
                    matrix[[0, j]].trace = HORIZONTAL;
                }
            }
            Mode::Local => {
                for i in 0..=len_a {
                    matrix[[i, 0]].trace = STARTPOINT;
                }
                for j in 1..=len_b {
                    matrix[[0, j]].trace = STARTPOINT;
                }
            }
        }
        Ok(Self::new(
            TraceTables::NeedlemanWunsch { matrix },
            mode,
            len_a,
            len_b,
        ))
    }

    /// Empty trace tables for the three-state affine recurrence.
    ///
    /// In global mode the boundary gap chains originate from `M` at position
    /// 1 and extend themselves thereafter.
    pub(crate) fn new_gotoh(len_a: usize, len_b: usize, mode: Mode) -> Result<Self> {
        let mut matrix = try_matrix::<TraceCell>(len_a + 1, len_b + 1)?;
        let mut gaps = try_matrix::<GotohGapCell>(len_a + 1, len_b + 1)?;
        match mode {
            Mode::Global => {
                for i in 1..=len_a {
                    gaps[[i, 0]].ix = IX_MATRIX;
                }
                gaps[[1, 0]].ix = M_MATRIX;
                for j in 1..=len_b {
                    gaps[[0, j]].iy = IY_MATRIX;
                }
                gaps[[0, 1]].iy = M_MATRIX;
            }
            Mode::Local => {
                for i in 0..=len_a {
                    matrix[[i, 0]].trace = STARTPOINT;
                }
                for j in 1..=len_b {
                    matrix[[0, j]].trace = STARTPOINT;
                }
            }
        }
        Ok(Self::new(
            TraceTables::Gotoh { matrix, gaps },
            mode,
            len_a,
            len_b,
        ))
    }

    /// Empty trace tables for the general gap recurrence. The global
    /// boundary gaps are recorded as single full-length entries sourced
    /// from `M` at the origin.
    pub(crate) fn new_waterman_smith_beyer(
        len_a: usize,
        len_b: usize,
        mode: Mode,
    ) -> Result<Self> {
        let mut matrix = try_matrix::<TraceCell>(len_a + 1, len_b + 1)?;
        let mut gaps = try_matrix::<WsbGapCell>(len_a + 1, len_b + 1)?;
        match mode {
            Mode::Global => {
                for i in 1..=len_a {
                    gaps[[i, 0]].m_ix = vec![i];
                }
                for j in 1..=len_b {
                    gaps[[0, j]].m_iy = vec![j];
                }
            }
            Mode::Local => {
                for i in 0..=len_a {
                    matrix[[i, 0]].trace = STARTPOINT;
                }
                for j in 1..=len_b {
                    matrix[[0, j]].trace = STARTPOINT;
                }
            }
        }
        Ok(Self::new(
            TraceTables::WatermanSmithBeyer { matrix, gaps },
            mode,
            len_a,
            len_b,
        ))
    }

    pub(crate) fn matrix_mut(&mut self) -> &mut Array2<TraceCell> {
        self.traces.matrix_mut()
    }

    pub(crate) fn gotoh_tables_mut(
        &mut self,
    ) -> (&mut Array2<TraceCell>, &mut Array2<GotohGapCell>) {
        let TraceTables::Gotoh { matrix, gaps } = &mut self.traces else {
            unreachable!("trace table mismatch");
        };
        (matrix, gaps)
    }

    pub(crate) fn waterman_smith_beyer_tables_mut(
        &mut self,
    ) -> (&mut Array2<TraceCell>, &mut Array2<WsbGapCell>) {
        let TraceTables::WatermanSmithBeyer { matrix, gaps } = &mut self.traces else {
            unreachable!("trace table mismatch");
        };
        (matrix, gaps)
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn algorithm(&self) -> AlgorithmKind {
        match self.traces {
            TraceTables::NeedlemanWunsch { .. } => AlgorithmKind::NeedlemanWunschSmithWaterman,
            TraceTables::Gotoh { .. } => AlgorithmKind::Gotoh,
            TraceTables::WatermanSmithBeyer { .. } => AlgorithmKind::WatermanSmithBeyer,
        }
    }

    /// The exact number of co-optimal paths, memoized on first call.
    ///
    /// Returns [`PathCount::Overflow`] when the count exceeds the native
    /// integer range; allocation failures of the counting buffers surface as
    /// errors.
    pub fn len(&mut self) -> Result<PathCount> {
        if let Some(length) = self.length {
            return Ok(length);
        }
        let length = match (self.algorithm(), self.mode) {
            (AlgorithmKind::NeedlemanWunschSmithWaterman, Mode::Global) => {
                self.count_needleman_wunsch_global()?
            }
            (AlgorithmKind::NeedlemanWunschSmithWaterman, Mode::Local) => {
                self.count_needleman_wunsch_local()?
            }
            (AlgorithmKind::Gotoh, Mode::Global) => self.count_gotoh_global()?,
            (AlgorithmKind::Gotoh, Mode::Local) => self.count_gotoh_local()?,
            (AlgorithmKind::WatermanSmithBeyer, Mode::Global) => {
                self.count_waterman_smith_beyer_global()?
            }
            (AlgorithmKind::WatermanSmithBeyer, Mode::Local) => {
                self.count_waterman_smith_beyer_local()?
            }
        };
        self.length = Some(length);
        Ok(length)
    }

    /// Restores the generator to its state before the first `next` call,
    /// leaving the recorded traces intact. A generator that found no local
    /// alignment stays exhausted.
    pub fn reset(&mut self) {
        if self.mode == Mode::Local {
            self.start_a = 0;
            self.start_b = 0;
        }
        let matrix = self.traces.matrix_mut();
        if matrix[[0, 0]].path != NONE {
            matrix[[0, 0]].path = 0;
        }
    }
}

impl Iterator for PathGenerator {
    type Item = AlignmentPath;

    fn next(&mut self) -> Option<AlignmentPath> {
        match (self.algorithm(), self.mode) {
            (AlgorithmKind::NeedlemanWunschSmithWaterman, Mode::Global) => {
                self.next_needleman_wunsch()
            }
            (AlgorithmKind::NeedlemanWunschSmithWaterman, Mode::Local) => {
                self.next_smith_waterman()
            }
            (AlgorithmKind::Gotoh, Mode::Global) => self.next_gotoh_global(),
            (AlgorithmKind::Gotoh, Mode::Local) => self.next_gotoh_local(),
            (AlgorithmKind::WatermanSmithBeyer, Mode::Global) => {
                self.next_waterman_smith_beyer_global()
            }
            (AlgorithmKind::WatermanSmithBeyer, Mode::Local) => {
                self.next_waterman_smith_beyer_local()
            }
        }
    }
}

/// Builds the run-length-compressed corner list of the path currently
/// threaded through the trace table, walking forward from its leaf.
pub(crate) fn create_path(matrix: &Array2<TraceCell>, leaf: (usize, usize)) -> AlignmentPath {
    let (mut i, mut j) = leaf;
    let mut corners = Vec::new();
    let mut direction = 0;
    loop {
        let path = matrix[[i, j]].path;
        if path != direction {
            corners.push((i, j));
            direction = path;
        }
        match path {
            HORIZONTAL => j += 1,
            VERTICAL => i += 1,
            DIAGONAL => {
                i += 1;
                j += 1;
            }
            _ => return AlignmentPath { corners },
        }
    }
}
