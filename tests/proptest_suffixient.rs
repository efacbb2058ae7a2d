//! Universal properties from the testable-properties table: MEM validity,
//! the `|S| <= r` bound, sortedness after an explicit sort, idempotence of
//! `find_mems`, and trie `store`/`load` round trips.

use proptest::prelude::*;
use suffixient::suffixient_index::{BuildConfig, SuffixientIndex};
use suffixient::suffixient_set::{build_suffixient_set, NaiveSaLcpBwtSource, SaLcpBwtSource};

fn naive_occurs(text: &[u8], needle: &[u8]) -> bool {
    if needle.is_empty() {
        return true;
    }
    if needle.len() > text.len() {
        return false;
    }
    text.windows(needle.len()).any(|w| w == needle)
}

fn mem_is_valid(text: &[u8], pattern: &[u8], pos: usize, len: usize) -> bool {
    if len == 0 {
        return true;
    }
    let sub = &pattern[pos..pos + len];
    if !naive_occurs(text, sub) {
        return false;
    }
    if pos > 0 {
        let mut left = Vec::with_capacity(len + 1);
        left.push(pattern[pos - 1]);
        left.extend_from_slice(sub);
        if naive_occurs(text, &left) {
            return false;
        }
    }
    if pos + len < pattern.len() {
        let mut right = sub.to_vec();
        right.push(pattern[pos + len]);
        if naive_occurs(text, &right) {
            return false;
        }
    }
    true
}

fn bwt_run_count(source: &NaiveSaLcpBwtSource) -> usize {
    let mut runs = 1usize;
    for i in 1..source.len() {
        if source.bwt(i) != source.bwt(i - 1) {
            runs += 1;
        }
    }
    runs
}

// Small, non-zero alphabet so BWT runs and suffixient sets stay exercisable
// at proptest-friendly sizes.
fn text_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(vec![b'A', b'B', b'C']), 1..24)
}

fn pattern_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(prop::sample::select(vec![b'A', b'B', b'C', b'Z']), 0..12)
}

proptest! {
    #[test]
    fn prop_suffixient_set_bounded_by_runs(text in text_strategy()) {
        let source = NaiveSaLcpBwtSource::build(&text);
        let positions = build_suffixient_set(&source, 128);
        let runs = bwt_run_count(&source);
        prop_assert!(positions.len() <= runs);
    }

    #[test]
    fn prop_suffixient_set_sorts_to_distinct(text in text_strategy()) {
        let source = NaiveSaLcpBwtSource::build(&text);
        let mut positions = build_suffixient_set(&source, 128);
        positions.sort_unstable();
        for w in positions.windows(2) {
            prop_assert!(w[0] < w[1]);
        }
    }

    #[test]
    fn prop_suffixient_set_positions_in_bounds(text in text_strategy()) {
        let source = NaiveSaLcpBwtSource::build(&text);
        let positions = build_suffixient_set(&source, 128);
        for &p in &positions {
            prop_assert!(p <= text.len());
        }
    }

    #[test]
    fn prop_find_mems_are_valid_and_idempotent(
        text in text_strategy(),
        pattern in pattern_strategy(),
    ) {
        let source = NaiveSaLcpBwtSource::build(&text);
        let positions = build_suffixient_set(&source, 128);
        let index = SuffixientIndex::build_plain(&text, &positions, &BuildConfig::default()).unwrap();

        let first = index.find_mems(&pattern).unwrap();
        let second = index.find_mems(&pattern).unwrap();
        prop_assert_eq!(&first, &second);

        for &(pos, len) in &first {
            prop_assert!(mem_is_valid(&text, &pattern, pos, len));
        }
    }

    #[test]
    fn prop_store_load_roundtrip_preserves_queries(
        text in text_strategy(),
        pattern in pattern_strategy(),
    ) {
        let source = NaiveSaLcpBwtSource::build(&text);
        let positions = build_suffixient_set(&source, 128);
        let index = SuffixientIndex::build_plain(&text, &positions, &BuildConfig::default()).unwrap();

        let bytes = index.store();
        let reloaded = SuffixientIndex::load(&bytes, &text, &BuildConfig::default()).unwrap();

        let a = index.find_mems(&pattern).unwrap();
        let b = reloaded.find_mems(&pattern).unwrap();
        prop_assert_eq!(a, b);
    }
}
