//! Integration tests for needle search correctness
//!
//! These tests verify end-to-end behavior of the automaton and matchers:
//! classic multi-needle scenarios, payload ordering, UTF-8 and case
//! folding, NUL bytes, reducer termination, and round-trips through the
//! serde and binary representations. A proptest block checks equivalence
//! against a naive quadratic scanner on random needle sets.

use needly::{AcAutomaton, CaseSensitivity, Next, Searcher};
use proptest::prelude::*;

fn build(needles: &[&[u8]]) -> AcAutomaton<u32> {
    AcAutomaton::build(
        needles
            .iter()
            .enumerate()
            .map(|(i, n)| (n.to_vec(), i as u32)),
    )
}

fn collect(ac: &AcAutomaton<u32>, haystack: &[u8]) -> Vec<(usize, u32)> {
    ac.run(haystack, Vec::new(), |mut acc, m| {
        acc.push((m.end_index, *m.value));
        Next::Step(acc)
    })
}

fn collect_lower(ac: &AcAutomaton<u32>, haystack: &[u8]) -> Vec<(usize, u32)> {
    ac.run_lower(haystack, Vec::new(), |mut acc, m| {
        acc.push((m.end_index, *m.value));
        Next::Step(acc)
    })
}

#[test]
fn test_classic_ushers_scenario() {
    let ac = AcAutomaton::build(vec![("he", 1u32), ("she", 2), ("his", 3), ("hers", 4)]);
    // At end 3 the "she" state reports its own needle before the
    // inherited "he"
    assert_eq!(collect(&ac, b"ushers"), vec![(3, 2), (3, 1), (6, 4)]);
}

#[test]
fn test_duplicate_needles_report_in_insertion_order() {
    let ac = AcAutomaton::build(vec![("ab", 10u32), ("ab", 20)]);
    assert_eq!(collect(&ac, b"ab"), vec![(2, 10), (2, 20)]);
}

#[test]
fn test_nul_byte_needles() {
    let ac = AcAutomaton::build(vec![(b"\x00".to_vec(), 1u32), (b"a\x00b".to_vec(), 2)]);
    assert_eq!(collect(&ac, b"a\x00b\x00"), vec![(2, 1), (3, 2), (4, 1)]);
}

#[test]
fn test_empty_needle_reports_at_every_position() {
    let ac = AcAutomaton::build(vec![(b"".to_vec(), 7u32), (b"a".to_vec(), 1)]);
    // Nothing at offset 0; after that the root payload fires per byte,
    // after the state's own needle when one ends there
    assert_eq!(collect(&ac, b"ab"), vec![(1, 1), (1, 7), (2, 7)]);
}

#[test]
fn test_empty_needle_fires_per_code_point_when_folding() {
    let ac = AcAutomaton::build(vec![(b"".to_vec(), 7u32)]);
    assert_eq!(collect_lower(&ac, "É".as_bytes()), vec![(2, 7)]);
}

#[test]
fn test_case_folded_search_keeps_original_offsets() {
    let searcher = Searcher::build(CaseSensitivity::IgnoreCase, vec![("straße", 1u32)]);
    // ẞ (3 bytes) folds to ß (2 bytes); offsets stay in input bytes
    let found = searcher.find_all("STRAẞE!".as_bytes());
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].end_index, 8);
}

#[test]
fn test_done_equals_truncated_run() {
    let ac = AcAutomaton::build(vec![("he", 1u32), ("she", 2), ("his", 3), ("hers", 4)]);
    let full = collect(&ac, b"ushers");
    assert_eq!(full.len(), 3);
    for k in 1..=full.len() {
        let mut taken = 0;
        let partial = ac.run(b"ushers", Vec::new(), |mut acc, m| {
            acc.push((m.end_index, *m.value));
            taken += 1;
            if taken == k {
                Next::Done(acc)
            } else {
                Next::Step(acc)
            }
        });
        assert_eq!(partial, &full[..k], "Done after match {} must truncate there", k);
    }
}

#[test]
fn test_build_is_insertion_order_independent_for_distinct_needles() {
    let needles = vec![("he", 1u32), ("she", 2), ("his", 3), ("hers", 4)];
    let mut reversed = needles.clone();
    reversed.reverse();
    let forward = AcAutomaton::build(needles);
    let backward = AcAutomaton::build(reversed);
    for haystack in [&b"ushers"[..], b"hishers", b"shehehers", b""] {
        assert_eq!(collect(&forward, haystack), collect(&backward, haystack));
    }
}

#[test]
fn test_serde_round_trip_preserves_behavior() {
    let ac = build(&[b"he", b"she", b"his", b"hers", b"\x00ab"]);
    let json = serde_json::to_string(&ac).unwrap();
    let loaded: AcAutomaton<u32> = serde_json::from_str(&json).unwrap();
    assert_eq!(loaded, ac);
    assert_eq!(collect(&loaded, b"ushers"), collect(&ac, b"ushers"));
}

#[test]
fn test_binary_round_trip_preserves_behavior() {
    let ac = build(&[b"he", b"she", b"his", b"hers"]);
    let loaded = AcAutomaton::from_bytes(&ac.to_bytes()).unwrap();
    assert_eq!(collect(&loaded, b"ushers"), vec![(3, 1), (3, 0), (6, 3)]);
}

/// Reference implementation: check every end position against every
/// needle.
fn naive_pairs(needles: &[Vec<u8>], haystack: &[u8]) -> Vec<(usize, u32)> {
    let mut out = Vec::new();
    for end in 1..=haystack.len() {
        for (i, needle) in needles.iter().enumerate() {
            if needle.len() <= end && haystack[end - needle.len()..end] == needle[..] {
                out.push((end, i as u32));
            }
        }
    }
    out
}

proptest! {
    #[test]
    fn prop_matches_equal_naive_scan(
        needles in prop::collection::vec(prop::collection::vec(0u8..3, 1..5), 1..8),
        haystack in prop::collection::vec(0u8..3, 0..80),
    ) {
        let ac = AcAutomaton::build(
            needles.iter().enumerate().map(|(i, n)| (n.clone(), i as u32)),
        );
        let found = collect(&ac, &haystack);

        // End positions never decrease
        prop_assert!(found.windows(2).all(|w| w[0].0 <= w[1].0));

        // Same multiset of (end, needle) as the naive scan
        let mut sorted = found;
        sorted.sort_unstable();
        let mut expected = naive_pairs(&needles, &haystack);
        expected.sort_unstable();
        prop_assert_eq!(sorted, expected);
    }

    #[test]
    fn prop_folded_matches_equal_naive_scan_on_lowercased_input(
        needles in prop::collection::vec("[ab]{1,4}", 1..6),
        haystack in "[abAB]{0,60}",
    ) {
        let needle_bytes: Vec<Vec<u8>> =
            needles.iter().map(|n| n.as_bytes().to_vec()).collect();
        let ac = AcAutomaton::build(
            needle_bytes.iter().enumerate().map(|(i, n)| (n.clone(), i as u32)),
        );
        let mut found = collect_lower(&ac, haystack.as_bytes());
        found.sort_unstable();
        let mut expected = naive_pairs(&needle_bytes, haystack.to_lowercase().as_bytes());
        expected.sort_unstable();
        prop_assert_eq!(found, expected);
    }

    #[test]
    fn prop_two_builds_agree(
        needles in prop::collection::vec(prop::collection::vec(0u8..4, 1..4), 1..6),
        haystack in prop::collection::vec(0u8..4, 0..40),
    ) {
        let pairs: Vec<(Vec<u8>, u32)> = needles
            .into_iter()
            .enumerate()
            .map(|(i, n)| (n, i as u32))
            .collect();
        let first = AcAutomaton::build(pairs.clone());
        let second = AcAutomaton::build(pairs);
        prop_assert_eq!(collect(&first, &haystack), collect(&second, &haystack));
    }
}
