use ndarray::Array2;

use crate::error::{Error, Result};

// Direction and endpoint bits of the 5-bit trace mask.
pub(crate) const HORIZONTAL: u8 = 0x01;
pub(crate) const VERTICAL: u8 = 0x02;
pub(crate) const DIAGONAL: u8 = 0x04;
pub(crate) const STARTPOINT: u8 = 0x08;
pub(crate) const ENDPOINT: u8 = 0x10;

// State bits of the three-matrix recurrences. They share the low bits with
// the direction mask but are only ever stored in state-trace fields.
pub(crate) const M_MATRIX: u8 = 0x01;
pub(crate) const IX_MATRIX: u8 = 0x02;
pub(crate) const IY_MATRIX: u8 = 0x04;

// Sentinels stored in the `path` field of the origin cell.
pub(crate) const DONE: u8 = 0x03;
pub(crate) const NONE: u8 = 0x07;

/// One cell of the main trace table.
///
/// `trace` holds the predecessor mask recorded during the recurrence, plus
/// the start/end point flags in local mode. `path` holds the direction taken
/// forward from this cell on the path currently threaded through the table;
/// it is the only state mutated during enumeration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TraceCell {
    pub trace: u8,
    pub path: u8,
}

/// Per-cell gap-source masks of the Gotoh recurrence: which predecessor
/// states attain the optimal score for a gap ending in `Ix` respectively
/// `Iy` at this cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct GotohGapCell {
    pub ix: u8,
    pub iy: u8,
}

/// Per-cell gap-length lists of the Waterman-Smith-Beyer recurrence.
///
/// Each list holds every gap length that attains the optimal score for a gap
/// ending at this cell, keyed by the state the gap starts from, in the order
/// the lengths were recorded (shortest first).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct WsbGapCell {
    pub m_ix: Vec<usize>,
    pub iy_ix: Vec<usize>,
    pub m_iy: Vec<usize>,
    pub ix_iy: Vec<usize>,
}

/// Allocates a zero-initialized vector, surfacing allocation failure as an
/// error instead of aborting.
pub(crate) fn try_vec<T: Clone + Default>(len: usize) -> Result<Vec<T>> {
    let mut values = Vec::new();
    values
        .try_reserve_exact(len)
        .map_err(|_| Error::AllocationFailed)?;
    values.resize(len, T::default());
    Ok(values)
}

/// Allocates a default-initialized `rows × columns` rectangle as one
/// contiguous block.
pub(crate) fn try_matrix<T: Clone + Default>(rows: usize, columns: usize) -> Result<Array2<T>> {
    let len = rows
        .checked_mul(columns)
        .ok_or(Error::AllocationFailed)?;
    let values = try_vec(len)?;
    Array2::from_shape_vec((rows, columns), values).map_err(|_| Error::AllocationFailed)
}

/// Removes the end point flag from every cell from `cursor` (inclusive) up
/// to `limit` (exclusive) in row-major order, then advances `cursor` to
/// `limit`.
///
/// Used while filling local-mode trace tables: when a new global maximum
/// displaces the old one by more than the tie tolerance, every end point
/// recorded so far is stale.
pub(crate) fn clear_endpoints(
    matrix: &mut Array2<TraceCell>,
    cursor: &mut (usize, usize),
    limit: (usize, usize),
) {
    let last_column = matrix.dim().1 - 1;
    let (ref mut row, ref mut column) = *cursor;
    while *row < limit.0 {
        while *column <= last_column {
            matrix[[*row, *column]].trace &= !ENDPOINT;
            *column += 1;
        }
        *row += 1;
        *column = 0;
    }
    while *column < limit.1 {
        matrix[[*row, *column]].trace &= !ENDPOINT;
        *column += 1;
    }
    *cursor = limit;
}

#[cfg(test)]
mod tests {
    use super::{ENDPOINT, TraceCell, clear_endpoints, try_matrix};

    #[test]
    fn endpoint_clearing_is_row_major_and_exclusive() {
        let mut matrix = try_matrix::<TraceCell>(3, 3).unwrap();
        for cell in matrix.iter_mut() {
            cell.trace = ENDPOINT;
        }
        let mut cursor = (0, 1);
        clear_endpoints(&mut matrix, &mut cursor, (1, 2));
        assert_eq!(cursor, (1, 2));
        // (0,0) precedes the cursor and survives, as does the limit itself.
        assert_eq!(matrix[[0, 0]].trace, ENDPOINT);
        assert_eq!(matrix[[0, 1]].trace, 0);
        assert_eq!(matrix[[0, 2]].trace, 0);
        assert_eq!(matrix[[1, 0]].trace, 0);
        assert_eq!(matrix[[1, 1]].trace, 0);
        assert_eq!(matrix[[1, 2]].trace, ENDPOINT);
    }
}
