use std::collections::HashSet;

use lib_pairalign::error::Error;
use lib_pairalign::pairwise_aligner::PairwiseAligner;
use lib_pairalign::path_generator::{AlignmentPath, PathCount, PathGenerator};
use lib_pairalign::scoring::Mode;

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

fn collect_paths(generator: &mut PathGenerator) -> Vec<AlignmentPath> {
    generator.by_ref().collect()
}

/// Recomputes a path's score from scratch under scalar match/mismatch
/// scoring and affine gap scores, picking the left/right/internal gap
/// parameters from the gap's position.
fn rescore(path: &AlignmentPath, seq_a: &[u8], seq_b: &[u8], aligner: &PairwiseAligner) -> f64 {
    let match_score = aligner.match_score().unwrap();
    let mismatch_score = aligner.mismatch_score().unwrap();
    let gaps = aligner.gap_scores();
    let mut score = 0.0;
    for window in path.corners().windows(2) {
        let (i0, j0) = window[0];
        let (i1, j1) = window[1];
        if i1 > i0 && j1 > j0 {
            assert_eq!(i1 - i0, j1 - j0, "diagonal runs advance both sequences");
            for step in 0..(i1 - i0) {
                let a = seq_a[i0 + step].to_ascii_uppercase();
                let b = seq_b[j0 + step].to_ascii_uppercase();
                score += if a == b { match_score } else { mismatch_score };
            }
        } else if j1 > j0 {
            let (open, extend) = if i0 == 0 {
                (gaps.target_left_open, gaps.target_left_extend)
            } else if i0 == seq_a.len() {
                (gaps.target_right_open, gaps.target_right_extend)
            } else {
                (gaps.target_internal_open, gaps.target_internal_extend)
            };
            score += open + ((j1 - j0) as f64 - 1.0) * extend;
        } else {
            let (open, extend) = if j0 == 0 {
                (gaps.query_left_open, gaps.query_left_extend)
            } else if j0 == seq_b.len() {
                (gaps.query_right_open, gaps.query_right_extend)
            } else {
                (gaps.query_internal_open, gaps.query_internal_extend)
            };
            score += open + ((i1 - i0) as f64 - 1.0) * extend;
        }
    }
    score
}

/// Checks that the generator enumerates exactly `len()` distinct paths,
/// in the same order after a reset, and returns them.
fn check_enumeration(generator: &mut PathGenerator) -> Vec<AlignmentPath> {
    let paths = collect_paths(generator);
    match generator.len().unwrap() {
        PathCount::Exact(count) => assert_eq!(count, paths.len()),
        PathCount::Overflow => panic!("tiny inputs cannot overflow the path count"),
    }
    let distinct: HashSet<_> = paths.iter().cloned().collect();
    assert_eq!(distinct.len(), paths.len(), "paths must be enumerated once");

    generator.reset();
    let replayed = collect_paths(generator);
    assert_eq!(paths, replayed, "reset must replay the same sequence");
    paths
}

#[test]
fn global_alignment_of_gaattc_and_gatta() {
    let mut aligner = PairwiseAligner::new();
    aligner.set_gap_score(-1.0);

    let score = aligner.score(b"GAATTC", b"GATTA").unwrap();
    assert_close(score, 3.0);

    let (align_score, mut generator) = aligner.align(b"GAATTC", b"GATTA").unwrap();
    assert_close(align_score, 3.0);

    let paths = check_enumeration(&mut generator);
    assert!(!paths.is_empty());
    for path in &paths {
        assert_eq!(path.start(), (0, 0));
        assert_eq!(path.end(), (6, 5));
        assert_close(rescore(path, b"GAATTC", b"GATTA", &aligner), 3.0);
    }
}

#[test]
fn lower_case_input_scores_like_upper_case() {
    let mut aligner = PairwiseAligner::new();
    aligner.set_gap_score(-1.0);
    let upper = aligner.score(b"GAATTC", b"GATTA").unwrap();
    let lower = aligner.score(b"gaattc", b"gatta").unwrap();
    assert_close(lower, upper);
}

#[test]
fn local_alignment_of_acacacta_and_agcacaca() {
    let mut aligner = PairwiseAligner::with_scores(1.0, -1.0);
    aligner.set_mode(Mode::Local);
    aligner.set_gap_score(-1.0);

    let score = aligner.score(b"ACACACTA", b"AGCACACA").unwrap();
    assert_close(score, 5.0);

    let (align_score, mut generator) = aligner.align(b"ACACACTA", b"AGCACACA").unwrap();
    assert_close(align_score, 5.0);

    let paths = check_enumeration(&mut generator);
    assert!(!paths.is_empty());
    for path in &paths {
        let (start_a, start_b) = path.start();
        let (end_a, end_b) = path.end();
        assert!(start_a < end_a && start_b < end_b);
        assert!(end_a <= 8 && end_b <= 8);
        assert_close(rescore(path, b"ACACACTA", b"AGCACACA", &aligner), 5.0);
    }
}

#[test]
fn gotoh_global_beats_linear_gaps() {
    let mut gotoh = PairwiseAligner::new();
    gotoh.set_open_gap_score(-2.0);
    gotoh.set_extend_gap_score(-1.0);
    let gotoh_score = gotoh.score(b"AAAA", b"AA").unwrap();
    assert_close(gotoh_score, -1.0);

    let mut linear = PairwiseAligner::new();
    linear.set_gap_score(-2.0);
    let linear_score = linear.score(b"AAAA", b"AA").unwrap();
    assert_close(linear_score, -2.0);
    assert!(gotoh_score >= linear_score);

    let (align_score, mut generator) = gotoh.align(b"AAAA", b"AA").unwrap();
    assert_close(align_score, -1.0);
    let paths = check_enumeration(&mut generator);
    // The length-2 gap in the query fits before, between, or after its two
    // letters.
    assert_eq!(paths.len(), 3);
    for path in &paths {
        assert_close(rescore(path, b"AAAA", b"AA", &gotoh), -1.0);
    }
}

#[test]
fn linear_gap_function_matches_needleman_wunsch() {
    let mut wsb = PairwiseAligner::new();
    wsb.set_gap_function(|_position: usize, length: usize| -(length as f64));
    let wsb_score = wsb.score(b"AAA", b"AAAA").unwrap();

    let mut linear = PairwiseAligner::new();
    linear.set_gap_score(-1.0);
    let linear_score = linear.score(b"AAA", b"AAAA").unwrap();

    assert_close(wsb_score, 2.0);
    assert_close(linear_score, 2.0);

    let (_, mut wsb_paths) = wsb.align(b"AAA", b"AAAA").unwrap();
    let (_, mut linear_paths) = linear.align(b"AAA", b"AAAA").unwrap();
    // The single-letter target gap fits into any of four positions.
    assert_eq!(check_enumeration(&mut wsb_paths).len(), 4);
    assert_eq!(check_enumeration(&mut linear_paths).len(), 4);
}

#[test]
fn identity_alignment_has_one_path() {
    let mut aligner = PairwiseAligner::with_scores(1.0, -1.0);
    aligner.set_gap_score(-10.0);
    let sequence = b"AAAAAAA";

    let score = aligner.score(sequence, sequence).unwrap();
    assert_close(score, 7.0);

    let (align_score, mut generator) = aligner.align(sequence, sequence).unwrap();
    assert_close(align_score, 7.0);
    assert_eq!(generator.len().unwrap(), PathCount::Exact(1));

    let paths = check_enumeration(&mut generator);
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].corners(), &[(0, 0), (7, 7)]);
}

#[test]
fn huge_epsilon_floods_ties() {
    let mut aligner = PairwiseAligner::new();
    aligner.set_gap_score(-1.0);
    aligner.set_epsilon(10.0);

    let (_, mut generator) = aligner.align(b"AC", b"GT").unwrap();
    // Every predecessor ties everywhere, so every monotone lattice path
    // from (0,0) to (2,2) is co-optimal: the Delannoy number D(2,2).
    let paths = check_enumeration(&mut generator);
    assert_eq!(paths.len(), 13);
}

#[test]
fn boundary_gaps_use_their_region_scores() {
    // Gaps in the target (sequence A): left -4, internal -5, right -7.
    let mut aligner = PairwiseAligner::with_scores(1.0, -100.0);
    let gaps = aligner.gap_scores_mut();
    gaps.set_query(-100.0);
    gaps.set_target(-5.0);
    gaps.target_left_open = -4.0;
    gaps.target_left_extend = -4.0;
    gaps.target_right_open = -7.0;
    gaps.target_right_extend = -7.0;

    // The gap precedes the target: left score.
    assert_close(aligner.score(b"C", b"AC").unwrap(), -3.0);
    // The gap follows the target: right score.
    assert_close(aligner.score(b"C", b"CA").unwrap(), -6.0);

    // Gaps in the query (sequence B), same shape.
    let mut aligner = PairwiseAligner::with_scores(1.0, -100.0);
    let gaps = aligner.gap_scores_mut();
    gaps.set_target(-100.0);
    gaps.set_query(-5.0);
    gaps.query_left_open = -4.0;
    gaps.query_left_extend = -4.0;
    gaps.query_right_open = -7.0;
    gaps.query_right_extend = -7.0;

    assert_close(aligner.score(b"AC", b"C").unwrap(), -3.0);
    assert_close(aligner.score(b"CA", b"C").unwrap(), -6.0);
    // An interior gap uses the internal score.
    assert_close(aligner.score(b"ACA", b"AA").unwrap(), -3.0);
}

#[test]
fn gotoh_local_bridges_a_gap() {
    let mut aligner = PairwiseAligner::with_scores(1.0, -1.0);
    aligner.set_mode(Mode::Local);
    aligner.set_open_gap_score(-1.0);
    aligner.set_extend_gap_score(-0.1);

    let score = aligner.score(b"AAAGGGAAA", b"AAAAAA").unwrap();
    assert_close(score, 4.8);

    let (align_score, mut generator) = aligner.align(b"AAAGGGAAA", b"AAAAAA").unwrap();
    assert_close(align_score, 4.8);

    let paths = check_enumeration(&mut generator);
    assert_eq!(paths.len(), 1);
    for path in &paths {
        assert_close(rescore(path, b"AAAGGGAAA", b"AAAAAA", &aligner), 4.8);
    }
}

#[test]
fn waterman_smith_beyer_local_alignment() {
    let mut aligner = PairwiseAligner::with_scores(1.0, -1.0);
    aligner.set_mode(Mode::Local);
    aligner.set_gap_function(|_position: usize, length: usize| -(2.0 + length as f64));

    let score = aligner.score(b"CCAAACC", b"GGAAAGG").unwrap();
    assert_close(score, 3.0);

    let (align_score, mut generator) = aligner.align(b"CCAAACC", b"GGAAAGG").unwrap();
    assert_close(align_score, 3.0);

    let paths = check_enumeration(&mut generator);
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0].corners(), &[(2, 2), (5, 5)]);
}

#[test]
fn local_alignment_without_matches_is_empty() {
    let mut aligner = PairwiseAligner::with_scores(1.0, -1.0);
    aligner.set_mode(Mode::Local);
    aligner.set_gap_score(-1.0);

    let score = aligner.score(b"AAAA", b"GGGG").unwrap();
    assert_close(score, 0.0);

    let (align_score, mut generator) = aligner.align(b"AAAA", b"GGGG").unwrap();
    assert_close(align_score, 0.0);
    assert_eq!(generator.len().unwrap(), PathCount::Exact(0));
    assert!(generator.next().is_none());
    generator.reset();
    assert!(generator.next().is_none());
}

#[test]
fn substitution_matrix_scoring() {
    let mut aligner = PairwiseAligner::new();
    aligner
        .set_substitution_matrix(&[
            (b'A', b'A', 2.0),
            (b'C', b'C', 2.0),
            (b'A', b'C', -3.0),
        ])
        .unwrap();
    aligner.set_gap_score(-1.0);

    assert_close(aligner.score(b"AC", b"AC").unwrap(), 4.0);
    assert_close(aligner.score(b"AC", b"CA").unwrap(), 0.0);
    assert!(aligner.match_score().is_err());
}

#[test]
fn empty_sequences_are_rejected() {
    let aligner = PairwiseAligner::new();
    assert!(matches!(
        aligner.score(b"", b"ACGT"),
        Err(Error::EmptySequence)
    ));
    assert!(matches!(
        aligner.align(b"ACGT", b""),
        Err(Error::EmptySequence)
    ));
}

#[test]
fn aligner_reports_its_algorithm() {
    let mut aligner = PairwiseAligner::new();
    assert_eq!(aligner.algorithm_name(), "Needleman-Wunsch");
    aligner.set_mode(Mode::Local);
    assert_eq!(aligner.algorithm_name(), "Smith-Waterman");
    aligner.set_open_gap_score(-2.0);
    aligner.set_extend_gap_score(-0.5);
    assert_eq!(aligner.algorithm_name(), "Gotoh local alignment algorithm");
    assert!(aligner.to_string().starts_with("Pairwise sequence aligner"));
}
