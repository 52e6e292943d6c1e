use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("An allocation for a dynamic programming or trace matrix failed.")]
    AllocationFailed,

    #[error("The match and mismatch scores are unavailable while a substitution matrix is installed.")]
    SubstitutionMatrixInstalled,

    #[error("No substitution matrix is installed; the aligner uses match/mismatch scores.")]
    NoSubstitutionMatrix,

    #[error(
        "The score for ({0}, {1}) was specified more than once (substitution matrices are case-insensitive)."
    )]
    DuplicateSubstitutionPair(char, char),

    #[error("A letter outside A..Z or a..z cannot be scored.")]
    InvalidLetter(char),

    #[error("The gap scores of this group are different.")]
    AmbiguousGapScores,

    #[error("A scalar gap score was requested while a gap score function is installed.")]
    GapFunctionInstalled,

    #[error("Alignment requires both sequences to be non-empty.")]
    EmptySequence,

    #[error("The gap cost function failed: {0}.")]
    GapFunction(String),
}
