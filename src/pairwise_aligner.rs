//! The aligner configuration surface and the entry points of the six
//! dynamic programming routines (three algorithms × two modes, each in a
//! score-only and a traceback-producing variant).

use std::cell::Cell;
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::error::{Error, Result};
use crate::path_generator::PathGenerator;
use crate::scoring::gap_function::{AffineGapCost, GapCost, GapCostFunction};
use crate::scoring::gap_scores::GapScores;
use crate::scoring::substitution::{ALPHABET_SIZE, SubstitutionScoreTable};
use crate::scoring::{AlgorithmKind, Mode};

mod gotoh;
mod needleman_wunsch;
mod waterman_smith_beyer;

/// Scores below the reachable range; one additive step cannot bring it back
/// into the finite range under finite gap penalties.
pub(crate) const NEG_INF: f64 = f64::MIN;

/// Pairwise sequence aligner over the 26-letter alphabet.
///
/// Holds a frozen snapshot of the scoring configuration and dispatches to
/// the recurrence it implies. Sequences are ASCII-letter byte slices,
/// case-insensitive; non-letter bytes are a caller-side error and are not
/// validated.
///
/// ```
/// use lib_pairalign::pairwise_aligner::PairwiseAligner;
///
/// let mut aligner = PairwiseAligner::new();
/// aligner.set_gap_score(-1.0);
/// let score = aligner.score(b"GAATTC", b"GATTA").unwrap();
/// let (align_score, mut paths) = aligner.align(b"GAATTC", b"GATTA").unwrap();
/// assert_eq!(score, align_score);
/// assert!(paths.next().is_some());
/// ```
#[derive(Clone)]
pub struct PairwiseAligner {
    pub(crate) mode: Mode,
    pub(crate) epsilon: f64,
    pub(crate) substitution: SubstitutionScoreTable,
    pub(crate) gap_scores: GapScores,
    pub(crate) target_gap_function: Option<Arc<dyn GapCostFunction>>,
    pub(crate) query_gap_function: Option<Arc<dyn GapCostFunction>>,
    algorithm: Cell<Option<AlgorithmKind>>,
}

impl PairwiseAligner {
    pub fn new() -> Self {
        Self::with_scores(1.0, 0.0)
    }

    pub fn with_scores(match_score: f64, mismatch_score: f64) -> Self {
        Self {
            mode: Mode::Global,
            epsilon: 1e-6,
            substitution: SubstitutionScoreTable::new(match_score, mismatch_score),
            gap_scores: GapScores::new(),
            target_gap_function: None,
            query_gap_function: None,
            algorithm: Cell::new(None),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// The numeric tolerance for score-equality tie detection between
    /// competing predecessors during traceback.
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn set_epsilon(&mut self, epsilon: f64) {
        self.epsilon = epsilon;
    }

    pub fn match_score(&self) -> Result<f64> {
        self.substitution.match_score()
    }

    pub fn set_match_score(&mut self, score: f64) -> Result<()> {
        self.substitution.set_match_score(score)
    }

    pub fn mismatch_score(&self) -> Result<f64> {
        self.substitution.mismatch_score()
    }

    pub fn set_mismatch_score(&mut self, score: f64) -> Result<()> {
        self.substitution.set_mismatch_score(score)
    }

    /// Installs a substitution matrix from case-insensitive letter-pair
    /// scores, replacing the scalar match/mismatch scoring.
    pub fn set_substitution_matrix(&mut self, pairs: &[(u8, u8, f64)]) -> Result<()> {
        self.substitution.install_matrix(pairs)
    }

    pub fn substitution_matrix(&self) -> Result<&[[f64; ALPHABET_SIZE]; ALPHABET_SIZE]> {
        self.substitution.matrix()
    }

    pub fn gap_scores(&self) -> &GapScores {
        &self.gap_scores
    }

    /// Mutable access to the twelve gap parameters. Invalidates the
    /// memoized algorithm choice.
    pub fn gap_scores_mut(&mut self) -> &mut GapScores {
        self.algorithm.set(None);
        &mut self.gap_scores
    }

    fn set_scalar_gaps(&mut self, assign: impl FnOnce(&mut GapScores)) {
        self.target_gap_function = None;
        self.query_gap_function = None;
        assign(&mut self.gap_scores);
        self.algorithm.set(None);
    }

    fn scalar_gap_group(&self, group: Option<f64>) -> Result<f64> {
        if self.target_gap_function.is_some() || self.query_gap_function.is_some() {
            return Err(Error::GapFunctionInstalled);
        }
        group.ok_or(Error::AmbiguousGapScores)
    }

    /// Sets all twelve gap parameters to `score` and removes any installed
    /// gap cost functions.
    pub fn set_gap_score(&mut self, score: f64) {
        self.set_scalar_gaps(|gaps| gaps.set_all(score));
    }

    pub fn gap_score(&self) -> Result<f64> {
        self.scalar_gap_group(self.gap_scores.all())
    }

    pub fn set_open_gap_score(&mut self, score: f64) {
        self.set_scalar_gaps(|gaps| gaps.set_open(score));
    }

    pub fn open_gap_score(&self) -> Result<f64> {
        self.scalar_gap_group(self.gap_scores.open())
    }

    pub fn set_extend_gap_score(&mut self, score: f64) {
        self.set_scalar_gaps(|gaps| gaps.set_extend(score));
    }

    pub fn extend_gap_score(&self) -> Result<f64> {
        self.scalar_gap_group(self.gap_scores.extend())
    }

    pub fn set_internal_gap_score(&mut self, score: f64) {
        self.set_scalar_gaps(|gaps| gaps.set_internal(score));
    }

    pub fn internal_gap_score(&self) -> Result<f64> {
        self.scalar_gap_group(self.gap_scores.internal())
    }

    /// Sets the scores of both end regions, left and right, on both sides.
    pub fn set_end_gap_score(&mut self, score: f64) {
        self.set_scalar_gaps(|gaps| gaps.set_end(score));
    }

    pub fn end_gap_score(&self) -> Result<f64> {
        self.scalar_gap_group(self.gap_scores.end())
    }

    pub fn set_left_gap_score(&mut self, score: f64) {
        self.set_scalar_gaps(|gaps| gaps.set_left(score));
    }

    pub fn left_gap_score(&self) -> Result<f64> {
        self.scalar_gap_group(self.gap_scores.left())
    }

    pub fn set_right_gap_score(&mut self, score: f64) {
        self.set_scalar_gaps(|gaps| gaps.set_right(score));
    }

    pub fn right_gap_score(&self) -> Result<f64> {
        self.scalar_gap_group(self.gap_scores.right())
    }

    pub fn set_target_gap_score(&mut self, score: f64) {
        self.target_gap_function = None;
        self.gap_scores.set_target(score);
        self.algorithm.set(None);
    }

    pub fn set_query_gap_score(&mut self, score: f64) {
        self.query_gap_function = None;
        self.gap_scores.set_query(score);
        self.algorithm.set(None);
    }

    /// Installs a gap cost function for gaps in the target, forcing the
    /// general gap recurrence.
    pub fn set_target_gap_function(&mut self, function: impl GapCostFunction + 'static) {
        self.target_gap_function = Some(Arc::new(function));
        self.algorithm.set(None);
    }

    /// Installs a gap cost function for gaps in the query, forcing the
    /// general gap recurrence.
    pub fn set_query_gap_function(&mut self, function: impl GapCostFunction + 'static) {
        self.query_gap_function = Some(Arc::new(function));
        self.algorithm.set(None);
    }

    /// Installs the same gap cost function for both sides.
    pub fn set_gap_function(&mut self, function: impl GapCostFunction + 'static) {
        let function = Arc::new(function);
        self.target_gap_function = Some(function.clone());
        self.query_gap_function = Some(function);
        self.algorithm.set(None);
    }

    /// The recurrence implied by the current configuration, memoized until
    /// a gap parameter changes.
    pub fn algorithm(&self) -> AlgorithmKind {
        if let Some(algorithm) = self.algorithm.get() {
            return algorithm;
        }
        let algorithm = if self.target_gap_function.is_some() || self.query_gap_function.is_some()
        {
            AlgorithmKind::WatermanSmithBeyer
        } else if self.gap_scores.is_linear() {
            AlgorithmKind::NeedlemanWunschSmithWaterman
        } else {
            AlgorithmKind::Gotoh
        };
        self.algorithm.set(Some(algorithm));
        algorithm
    }

    /// The mode-specific name of the selected algorithm.
    pub fn algorithm_name(&self) -> &'static str {
        match (self.algorithm(), self.mode) {
            (AlgorithmKind::NeedlemanWunschSmithWaterman, Mode::Global) => "Needleman-Wunsch",
            (AlgorithmKind::NeedlemanWunschSmithWaterman, Mode::Local) => "Smith-Waterman",
            (AlgorithmKind::Gotoh, Mode::Global) => "Gotoh global alignment algorithm",
            (AlgorithmKind::Gotoh, Mode::Local) => "Gotoh local alignment algorithm",
            (AlgorithmKind::WatermanSmithBeyer, Mode::Global) => {
                "Waterman-Smith-Beyer global alignment algorithm"
            }
            (AlgorithmKind::WatermanSmithBeyer, Mode::Local) => {
                "Waterman-Smith-Beyer local alignment algorithm"
            }
        }
    }

    pub(crate) fn target_gap_cost(&self) -> GapCost<'_> {
        match &self.target_gap_function {
            Some(function) => GapCost::Function(function.as_ref()),
            None => GapCost::Affine(AffineGapCost {
                open: self.gap_scores.target_internal_open,
                extend: self.gap_scores.target_internal_extend,
            }),
        }
    }

    pub(crate) fn query_gap_cost(&self) -> GapCost<'_> {
        match &self.query_gap_function {
            Some(function) => GapCost::Function(function.as_ref()),
            None => GapCost::Affine(AffineGapCost {
                open: self.gap_scores.query_internal_open,
                extend: self.gap_scores.query_internal_extend,
            }),
        }
    }

    /// The optimal alignment score of `seq_a` (the target) against `seq_b`
    /// (the query), streaming the recurrence in `O(len_b)` memory.
    pub fn score(&self, seq_a: &[u8], seq_b: &[u8]) -> Result<f64> {
        if seq_a.is_empty() || seq_b.is_empty() {
            return Err(Error::EmptySequence);
        }
        let algorithm = self.algorithm();
        debug!(
            "scoring {} x {} letters with the {}",
            seq_a.len(),
            seq_b.len(),
            self.algorithm_name(),
        );
        match (algorithm, self.mode) {
            (AlgorithmKind::NeedlemanWunschSmithWaterman, Mode::Global) => {
                needleman_wunsch::global_score(self, seq_a, seq_b)
            }
            (AlgorithmKind::NeedlemanWunschSmithWaterman, Mode::Local) => {
                needleman_wunsch::local_score(self, seq_a, seq_b)
            }
            (AlgorithmKind::Gotoh, Mode::Global) => gotoh::global_score(self, seq_a, seq_b),
            (AlgorithmKind::Gotoh, Mode::Local) => gotoh::local_score(self, seq_a, seq_b),
            (AlgorithmKind::WatermanSmithBeyer, Mode::Global) => {
                waterman_smith_beyer::global_score(self, seq_a, seq_b)
            }
            (AlgorithmKind::WatermanSmithBeyer, Mode::Local) => {
                waterman_smith_beyer::local_score(self, seq_a, seq_b)
            }
        }
    }

    /// Aligns `seq_a` (the target) against `seq_b` (the query), returning
    /// the optimal score and a generator over every co-optimal path.
    pub fn align(&self, seq_a: &[u8], seq_b: &[u8]) -> Result<(f64, PathGenerator)> {
        if seq_a.is_empty() || seq_b.is_empty() {
            return Err(Error::EmptySequence);
        }
        let algorithm = self.algorithm();
        debug!(
            "aligning {} x {} letters with the {}",
            seq_a.len(),
            seq_b.len(),
            self.algorithm_name(),
        );
        match (algorithm, self.mode) {
            (AlgorithmKind::NeedlemanWunschSmithWaterman, Mode::Global) => {
                needleman_wunsch::global_align(self, seq_a, seq_b)
            }
            (AlgorithmKind::NeedlemanWunschSmithWaterman, Mode::Local) => {
                needleman_wunsch::local_align(self, seq_a, seq_b)
            }
            (AlgorithmKind::Gotoh, Mode::Global) => gotoh::global_align(self, seq_a, seq_b),
            (AlgorithmKind::Gotoh, Mode::Local) => gotoh::local_align(self, seq_a, seq_b),
            (AlgorithmKind::WatermanSmithBeyer, Mode::Global) => {
                waterman_smith_beyer::global_align(self, seq_a, seq_b)
            }
            (AlgorithmKind::WatermanSmithBeyer, Mode::Local) => {
                waterman_smith_beyer::local_align(self, seq_a, seq_b)
            }
        }
    }
}

impl Default for PairwiseAligner {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PairwiseAligner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PairwiseAligner")
            .field("mode", &self.mode)
            .field("epsilon", &self.epsilon)
            .field("substitution", &self.substitution)
            .field("gap_scores", &self.gap_scores)
            .field("target_gap_function", &self.target_gap_function.is_some())
            .field("query_gap_function", &self.query_gap_function.is_some())
            .finish()
    }
}

impl fmt::Display for PairwiseAligner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Pairwise sequence aligner with parameters")?;
        match (
            self.substitution.match_score(),
            self.substitution.mismatch_score(),
        ) {
            (Ok(match_score), Ok(mismatch_score)) => {
                writeln!(f, "  match_score: {match_score}")?;
                writeln!(f, "  mismatch_score: {mismatch_score}")?;
            }
            _ => writeln!(f, "  match/mismatch_score: <substitution matrix>")?,
        }
        let gaps = &self.gap_scores;
        if self.target_gap_function.is_some() {
            writeln!(f, "  target_gap_function: <function>")?;
        } else {
            writeln!(f, "  target_open_gap_score: {}", gaps.target_internal_open)?;
            writeln!(f, "  target_extend_gap_score: {}", gaps.target_internal_extend)?;
            writeln!(f, "  target_left_open_gap_score: {}", gaps.target_left_open)?;
            writeln!(f, "  target_left_extend_gap_score: {}", gaps.target_left_extend)?;
            writeln!(f, "  target_right_open_gap_score: {}", gaps.target_right_open)?;
            writeln!(
                f,
                "  target_right_extend_gap_score: {}",
                gaps.target_right_extend
            )?;
        }
        if self.query_gap_function.is_some() {
            writeln!(f, "  query_gap_function: <function>")?;
        } else {
            writeln!(f, "  query_open_gap_score: {}", gaps.query_internal_open)?;
            writeln!(f, "  query_extend_gap_score: {}", gaps.query_internal_extend)?;
            writeln!(f, "  query_left_open_gap_score: {}", gaps.query_left_open)?;
            writeln!(f, "  query_left_extend_gap_score: {}", gaps.query_left_extend)?;
            writeln!(f, "  query_right_open_gap_score: {}", gaps.query_right_open)?;
            writeln!(
                f,
                "  query_right_extend_gap_score: {}",
                gaps.query_right_extend
            )?;
        }
        writeln!(f, "  mode: {:?}", self.mode)?;
        write!(f, "  epsilon: {}", self.epsilon)
    }
}

/// Picks the maximum of three scores the way the recurrences do: a later
/// candidate displaces only when strictly greater, and NaN never displaces.
#[inline]
pub(crate) fn max3(first: f64, second: f64, third: f64) -> f64 {
    let mut score = first;
    if second > score {
        score = second;
    }
    if third > score {
        score = third;
    }
    score
}

/// Selects the optimal predecessor among `candidates` and records a trace
/// bit for every candidate within `epsilon` of the optimum.
///
/// The first candidate is the baseline; each later one displaces the
/// running optimum when it exceeds it by more than `epsilon` and joins the
/// trace mask when it comes within `epsilon`.
#[inline]
pub(crate) fn select_trace(epsilon: f64, candidates: [(f64, u8); 3]) -> (f64, u8) {
    let (mut score, mut trace) = candidates[0];
    for &(candidate, bit) in &candidates[1..] {
        if candidate > score + epsilon {
            score = candidate;
            trace = bit;
        } else if candidate > score - epsilon {
            trace |= bit;
        }
    }
    (score, trace)
}

pub(crate) use crate::scoring::substitution::letter_index;

#[cfg(test)]
mod tests {
    use crate::scoring::AlgorithmKind;

    use super::{PairwiseAligner, select_trace};

    #[test]
    fn algorithm_selection() {
        let mut aligner = PairwiseAligner::new();
        assert_eq!(
            aligner.algorithm(),
            AlgorithmKind::NeedlemanWunschSmithWaterman
        );

        aligner.set_gap_score(-2.0);
        assert_eq!(
            aligner.algorithm(),
            AlgorithmKind::NeedlemanWunschSmithWaterman
        );

        aligner.set_open_gap_score(-10.0);
        assert_eq!(aligner.algorithm(), AlgorithmKind::Gotoh);

        aligner.set_query_gap_function(|_position: usize, length: usize| -(length as f64));
        assert_eq!(aligner.algorithm(), AlgorithmKind::WatermanSmithBeyer);

        // A scalar gap score clears the function again.
        aligner.set_gap_score(-1.0);
        assert_eq!(
            aligner.algorithm(),
            AlgorithmKind::NeedlemanWunschSmithWaterman
        );
    }

    #[test]
    fn ambiguous_gap_groups_are_errors() {
        let mut aligner = PairwiseAligner::new();
        aligner.set_gap_score(-1.0);
        assert_eq!(aligner.gap_score().unwrap(), -1.0);

        aligner.set_left_gap_score(0.0);
        assert!(aligner.gap_score().is_err());
        assert_eq!(aligner.left_gap_score().unwrap(), 0.0);

        aligner.set_gap_function(|_: usize, length: usize| -2.0 * length as f64);
        assert!(aligner.gap_score().is_err());
    }

    #[test]
    fn trace_selection_records_ties() {
        let (score, trace) = select_trace(0.5, [(1.0, 0x4), (1.3, 0x1), (0.2, 0x2)]);
        assert_eq!(score, 1.0);
        assert_eq!(trace, 0x4 | 0x1);

        let (score, trace) = select_trace(0.5, [(1.0, 0x4), (2.0, 0x1), (1.8, 0x2)]);
        assert_eq!(score, 2.0);
        assert_eq!(trace, 0x1 | 0x2);
    }
}
