use crate::error::Result;

/// Cost provider for gaps of arbitrary length.
///
/// `position` is the number of letters of the gapped sequence's partner
/// consumed before the gap starts, `length` the number of letters the gap
/// spans. Implementations may fail; a failure aborts the running alignment.
///
/// Any `Fn(usize, usize) -> f64` closure is a gap cost function. Installing
/// one on an aligner forces the general gap recurrence.
pub trait GapCostFunction: Send + Sync {
    fn cost(&self, position: usize, length: usize) -> Result<f64>;
}

impl<F> GapCostFunction for F
where
    F: Fn(usize, usize) -> f64 + Send + Sync,
{
    fn cost(&self, position: usize, length: usize) -> Result<f64> {
        Ok(self(position, length))
    }
}

/// The affine closed form `open + (length - 1) · extend`, used for a side
/// without a user-supplied function when the other side forces the general
/// gap recurrence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineGapCost {
    pub open: f64,
    pub extend: f64,
}

impl AffineGapCost {
    #[inline]
    pub fn cost(&self, length: usize) -> f64 {
        self.open + (length - 1) as f64 * self.extend
    }
}

/// Either side's effective gap cost source during a Waterman-Smith-Beyer
/// alignment.
pub(crate) enum GapCost<'a> {
    Affine(AffineGapCost),
    Function(&'a dyn GapCostFunction),
}

impl GapCost<'_> {
    #[inline]
    pub(crate) fn cost(&self, position: usize, length: usize) -> Result<f64> {
        match self {
            GapCost::Affine(affine) => Ok(affine.cost(length)),
            GapCost::Function(function) => function.cost(position, length),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AffineGapCost, GapCostFunction};

    #[test]
    fn affine_closed_form() {
        let affine = AffineGapCost {
            open: -2.0,
            extend: -0.5,
        };
        assert_eq!(affine.cost(1), -2.0);
        assert_eq!(affine.cost(4), -3.5);
    }

    #[test]
    fn closures_are_gap_cost_functions() {
        let linear = |_position: usize, length: usize| -(length as f64);
        assert_eq!(linear.cost(3, 5).unwrap(), -5.0);
    }
}
