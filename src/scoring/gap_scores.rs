/// The twelve scalar gap parameters: `{target, query} × {open, extend} ×
/// {internal, left, right}`.
///
/// Gaps in the target (sequence A) are horizontal steps through the alignment
/// grid, gaps in the query (sequence B) vertical steps. The `left` scores
/// apply to gaps before the first letter of the gapped sequence, the `right`
/// scores to gaps after its last letter, and the `internal` scores
/// everywhere else.
///
/// The grouped setters mirror the coalesced configuration attributes of the
/// aligner: each one assigns the same value to every member of its group.
/// The grouped getters return `None` when the members of the group differ.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GapScores {
    pub target_internal_open: f64,
    pub target_internal_extend: f64,
    pub target_left_open: f64,
    pub target_left_extend: f64,
    pub target_right_open: f64,
    pub target_right_extend: f64,
    pub query_internal_open: f64,
    pub query_internal_extend: f64,
    pub query_left_open: f64,
    pub query_left_extend: f64,
    pub query_right_open: f64,
    pub query_right_extend: f64,
}

fn uniform(values: &[f64]) -> Option<f64> {
    let first = values[0];
    values[1..]
        .iter()
        .all(|&value| value == first)
        .then_some(first)
}

impl GapScores {
    pub fn new() -> Self {
        Self::default()
    }

    fn as_array(&self) -> [f64; 12] {
        [
            self.target_internal_open,
            self.target_internal_extend,
            self.target_left_open,
            self.target_left_extend,
            self.target_right_open,
            self.target_right_extend,
            self.query_internal_open,
            self.query_internal_extend,
            self.query_left_open,
            self.query_left_extend,
            self.query_right_open,
            self.query_right_extend,
        ]
    }

    pub fn set_all(&mut self, score: f64) {
        *self = Self {
            target_internal_open: score,
            target_internal_extend: score,
            target_left_open: score,
            target_left_extend: score,
            target_right_open: score,
            target_right_extend: score,
            query_internal_open: score,
            query_internal_extend: score,
            query_left_open: score,
            query_left_extend: score,
            query_right_open: score,
            query_right_extend: score,
        };
    }

    pub fn all(&self) -> Option<f64> {
        uniform(&self.as_array())
    }

    pub fn set_open(&mut self, score: f64) {
        self.target_internal_open = score;
        self.target_left_open = score;
        self.target_right_open = score;
        self.query_internal_open = score;
        self.query_left_open = score;
        self.query_right_open = score;
    }

    pub fn open(&self) -> Option<f64> {
        uniform(&[
            self.target_internal_open,
            self.target_left_open,
            self.target_right_open,
            self.query_internal_open,
            self.query_left_open,
            self.query_right_open,
        ])
    }

    pub fn set_extend(&mut self, score: f64) {
        self.target_internal_extend = score;
        self.target_left_extend = score;
        self.target_right_extend = score;
        self.query_internal_extend = score;
        self.query_left_extend = score;
        self.query_right_extend = score;
    }

    pub fn extend(&self) -> Option<f64> {
        uniform(&[
            self.target_internal_extend,
            self.target_left_extend,
            self.target_right_extend,
            self.query_internal_extend,
            self.query_left_extend,
            self.query_right_extend,
        ])
    }

    pub fn set_internal(&mut self, score: f64) {
        self.target_internal_open = score;
        self.target_internal_extend = score;
        self.query_internal_open = score;
        self.query_internal_extend = score;
    }

    pub fn internal(&self) -> Option<f64> {
        uniform(&[
            self.target_internal_open,
            self.target_internal_extend,
            self.query_internal_open,
            self.query_internal_extend,
        ])
    }

    /// Sets the scores of both end regions, left and right, on both sides.
    pub fn set_end(&mut self, score: f64) {
        self.set_left(score);
        self.set_right(score);
    }

    pub fn end(&self) -> Option<f64> {
        uniform(&[
            self.target_left_open,
            self.target_left_extend,
            self.target_right_open,
            self.target_right_extend,
            self.query_left_open,
            self.query_left_extend,
            self.query_right_open,
            self.query_right_extend,
        ])
    }

    pub fn set_left(&mut self, score: f64) {
        self.target_left_open = score;
        self.target_left_extend = score;
        self.query_left_open = score;
        self.query_left_extend = score;
    }

    pub fn left(&self) -> Option<f64> {
        uniform(&[
            self.target_left_open,
            self.target_left_extend,
            self.query_left_open,
            self.query_left_extend,
        ])
    }

    pub fn set_right(&mut self, score: f64) {
        self.target_right_open = score;
        self.target_right_extend = score;
        self.query_right_open = score;
        self.query_right_extend = score;
    }

    pub fn right(&self) -> Option<f64> {
        uniform(&[
            self.target_right_open,
            self.target_right_extend,
            self.query_right_open,
            self.query_right_extend,
        ])
    }

    pub fn set_target(&mut self, score: f64) {
        self.target_internal_open = score;
        self.target_internal_extend = score;
        self.target_left_open = score;
        self.target_left_extend = score;
        self.target_right_open = score;
        self.target_right_extend = score;
    }

    pub fn target(&self) -> Option<f64> {
        uniform(&[
            self.target_internal_open,
            self.target_internal_extend,
            self.target_left_open,
            self.target_left_extend,
            self.target_right_open,
            self.target_right_extend,
        ])
    }

    pub fn set_query(&mut self, score: f64) {
        self.query_internal_open = score;
        self.query_internal_extend = score;
        self.query_left_open = score;
        self.query_left_extend = score;
        self.query_right_open = score;
        self.query_right_extend = score;
    }

    pub fn query(&self) -> Option<f64> {
        uniform(&[
            self.query_internal_open,
            self.query_internal_extend,
            self.query_left_open,
            self.query_left_extend,
            self.query_right_open,
            self.query_right_extend,
        ])
    }

    /// True if every region has equal open and extension scores, i.e. the
    /// gap model is linear and the single-state recurrence applies.
    pub(crate) fn is_linear(&self) -> bool {
        self.target_internal_open == self.target_internal_extend
            && self.query_internal_open == self.query_internal_extend
            && self.target_left_open == self.target_left_extend
            && self.target_right_open == self.target_right_extend
            && self.query_left_open == self.query_left_extend
            && self.query_right_open == self.query_right_extend
    }
}

#[cfg(test)]
mod tests {
    use super::GapScores;

    #[test]
    fn grouped_accessors() {
        let mut scores = GapScores::new();
        assert_eq!(scores.all(), Some(0.0));

        scores.set_all(-2.0);
        assert_eq!(scores.all(), Some(-2.0));
        assert_eq!(scores.open(), Some(-2.0));
        assert!(scores.is_linear());

        scores.set_open(-10.0);
        assert_eq!(scores.all(), None);
        assert_eq!(scores.open(), Some(-10.0));
        assert_eq!(scores.extend(), Some(-2.0));
        assert!(!scores.is_linear());

        scores.set_end(0.0);
        assert_eq!(scores.left(), Some(0.0));
        assert_eq!(scores.right(), Some(0.0));
        assert_eq!(scores.internal(), None);
        assert_eq!(scores.target_internal_open, -10.0);
        assert_eq!(scores.target_internal_extend, -2.0);
    }
}
