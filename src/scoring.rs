pub mod gap_function;
pub mod gap_scores;
pub mod substitution;

/// Whether an alignment must cover both sequences end to end or may pick the
/// best-scoring pair of subsequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Mode {
    #[default]
    Global,
    Local,
}

/// The dynamic programming recurrence implied by the gap model.
///
/// Derived from the scoring configuration, never set directly: a gap cost
/// function forces [`WatermanSmithBeyer`](Self::WatermanSmithBeyer), equal
/// open and extension scores within each region allow the single-state
/// [`NeedlemanWunschSmithWaterman`](Self::NeedlemanWunschSmithWaterman)
/// recurrence, and any other affine configuration requires
/// [`Gotoh`](Self::Gotoh)'s three states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AlgorithmKind {
    NeedlemanWunschSmithWaterman,
    Gotoh,
    WatermanSmithBeyer,
}
