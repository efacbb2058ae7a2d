//! Suffixient-set builder, one-pass over SA/LCP/BWT (C5).
//!
//! A suffixient set is a set of text positions small enough (at most `r`,
//! the number of equal-letter runs in the BWT of the reversed text) to
//! still support Maximal Exact Match finding for arbitrary patterns. This
//! module computes one in a single left-to-right pass over the suffix
//! array, LCP array, and BWT of the *reversed* text — it never inspects
//! the text directly.
//!
//! Building the SA/LCP/BWT triple is out of scope here (that's the
//! [`SaLcpBwtSource`] collaborator's job — a real deployment plugs in an
//! external linear-time construction); [`NaiveSaLcpBwtSource`] is a
//! reference implementation good enough to exercise and test the one-pass
//! algorithm end to end.
//!
//! Grounded on `sources/one_pass.cpp` (plain mode) and
//! `sources/one_pass_lcs.cpp` (supermaximal / LCS-augmented mode).

use log::debug;

/// Abstracts the external SA/LCP/BWT construction over the reversed,
/// terminator-appended text. `len()` is `N = n + 1` (original length plus
/// one terminator row). `bwt(0)` and any row with `sa(i) == 0` read back as
/// `0`, the terminator symbol.
pub trait SaLcpBwtSource {
    fn len(&self) -> usize;
    fn sa(&self, i: usize) -> usize;
    fn lcp(&self, i: usize) -> usize;
    fn bwt(&self, i: usize) -> u8;
}

/// Reference [`SaLcpBwtSource`] built by naive (`O(n^2 log n)`) direct
/// comparison sort. Fine for tests and small inputs; a real deployment
/// supplies SA-IS/DC3 construction plus Kasai's LCP algorithm instead.
pub struct NaiveSaLcpBwtSource {
    reversed: Vec<u8>, // reversed original text + trailing 0 terminator, length N
    sa: Vec<usize>,
    lcp: Vec<usize>,
}

impl NaiveSaLcpBwtSource {
    /// `text` must be non-empty ASCII without byte `0x00`.
    pub fn build(text: &[u8]) -> Self {
        assert!(!text.is_empty(), "text must be non-empty");
        assert!(!text.contains(&0), "text must not contain the 0x00 byte");

        let n = text.len();
        let mut reversed = Vec::with_capacity(n + 1);
        reversed.extend(text.iter().rev().copied());
        reversed.push(0);

        let sa = naive_suffix_array(&reversed);
        let lcp = lcp_from_sa(&reversed, &sa);

        Self { reversed, sa, lcp }
    }
}

impl SaLcpBwtSource for NaiveSaLcpBwtSource {
    fn len(&self) -> usize {
        self.reversed.len()
    }

    fn sa(&self, i: usize) -> usize {
        self.sa[i]
    }

    fn lcp(&self, i: usize) -> usize {
        self.lcp[i]
    }

    fn bwt(&self, i: usize) -> u8 {
        let s = self.sa[i];
        if s == 0 {
            0
        } else {
            self.reversed[s - 1]
        }
    }
}

fn naive_suffix_array(t: &[u8]) -> Vec<usize> {
    let n = t.len();
    let mut sa: Vec<usize> = (0..n).collect();
    sa.sort_by(|&a, &b| t[a..].cmp(&t[b..]));
    sa
}

fn lcp_from_sa(t: &[u8], sa: &[usize]) -> Vec<usize> {
    let n = t.len();
    let mut lcp = vec![0usize; n];
    for i in 1..n {
        let a = &t[sa[i - 1]..];
        let b = &t[sa[i]..];
        lcp[i] = a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count();
    }
    lcp
}

#[derive(Clone, Copy)]
struct Candidate {
    len: i64,
    pos: usize,
    active: bool,
}

const INACTIVE: Candidate = Candidate {
    len: -1,
    pos: 0,
    active: false,
};

/// Flushes candidates whose run-local minimum LCP no longer exceeds them:
/// `eval(sigma, m, R, S)` in the original.
fn flush(m: i64, table: &mut [Candidate], out: &mut Vec<usize>) {
    for c in table.iter_mut().skip(1) {
        if m < c.len {
            if c.active {
                out.push(c.pos);
            }
            *c = Candidate {
                len: m,
                pos: 0,
                active: false,
            };
        }
    }
}

/// Computes a suffixient set for `text` via one pass over `source`.
///
/// `alphabet_size` bounds the byte values `source.bwt()` can return
/// (exclusive), conventionally 128 for unmapped ASCII text or the count of
/// distinct remapped symbols plus one for the terminator.
pub fn build_suffixient_set<S: SaLcpBwtSource>(source: &S, alphabet_size: usize) -> Vec<usize> {
    let n_total = source.len();
    let mut table = vec![INACTIVE; alphabet_size];
    let mut out = Vec::new();

    if n_total < 2 {
        return out;
    }

    let mut m = i64::MAX;
    let mut runs = 1u64;

    for i in 1..n_total {
        m = m.min(source.lcp(i) as i64);

        if source.bwt(i) != source.bwt(i - 1) {
            flush(m, &mut table, &mut out);

            let lcp_i = source.lcp(i) as i64;
            for ip in [i - 1, i] {
                let c = source.bwt(ip) as usize;
                if lcp_i > table[c].len {
                    table[c] = Candidate {
                        len: lcp_i,
                        // `sa(ip)` is an offset into the reversed+terminated
                        // array; `(n_total - 1) - sa(ip)` converts it to the
                        // 0-indexed position one past the matched prefix in
                        // the original (forward) text.
                        pos: (n_total - 1) - source.sa(ip),
                        active: true,
                    };
                }
            }

            m = i64::MAX;
            runs += 1;
        }
    }

    flush(-1, &mut table, &mut out);
    debug!("suffixient set built: |S| = {}, BWT(rev(T)) runs = {runs}", out.len());
    out
}

#[derive(Clone, Copy)]
struct LcsCandidate {
    len: i64,
    pos: usize,
    lcs: i64,
    active: bool,
}

const LCS_INACTIVE: LcsCandidate = LcsCandidate {
    len: -1,
    pos: 0,
    lcs: -1,
    active: false,
};

fn flush_lcs(
    m: i64,
    table: &mut [LcsCandidate],
    out_s: &mut Vec<usize>,
    out_l: &mut Vec<i64>,
    first: &mut [i64],
) {
    for (c, cand) in table.iter_mut().enumerate().skip(1) {
        if m < cand.len {
            if cand.active {
                out_s.push(cand.pos);
                out_l.push(cand.lcs + 1);
                if first[c] == 0 {
                    first[c] = cand.lcs + 1;
                }
            }
            *cand = LcsCandidate {
                len: m,
                pos: 0,
                lcs: m,
                active: false,
            };
        }
    }
}

/// The output of [`build_suffixient_set_supermaximal`]: positions, their
/// matching LCS-derived lengths, and the first-occurrence length per
/// symbol — the ingredients `ctrie.rs`/`suffixient_index.rs` need to
/// recognize supermaximal extensions during MEM finding.
pub struct SupermaximalSet {
    pub positions: Vec<usize>,
    pub lcs_lengths: Vec<i64>,
    pub first_occurrence: Vec<i64>,
}

/// Supermaximal variant of [`build_suffixient_set`]: alongside each
/// witness position, tracks a per-symbol LCS chain so each witness can
/// also report how far it extends left, and records each symbol's first
/// emitted LCS length in `first_occurrence` (indexed by BWT symbol).
///
/// Grounded on `sources/one_pass_lcs.cpp`; note the `lcs` field of a slot
/// survives a same-symbol update (only `eval`'s flush resets it), so it
/// threads the most recent flush's window length through every
/// replacement of that slot until it is next flushed.
pub fn build_suffixient_set_supermaximal<S: SaLcpBwtSource>(
    source: &S,
    alphabet_size: usize,
) -> SupermaximalSet {
    let n_total = source.len();
    let mut table = vec![LCS_INACTIVE; alphabet_size];
    let mut first = vec![0i64; alphabet_size];
    let mut out_s = Vec::new();
    let mut out_l = Vec::new();

    if n_total < 2 {
        return SupermaximalSet {
            positions: out_s,
            lcs_lengths: out_l,
            first_occurrence: first,
        };
    }

    let mut m = i64::MAX;

    for i in 1..n_total {
        m = m.min(source.lcp(i) as i64);

        if source.bwt(i) != source.bwt(i - 1) {
            flush_lcs(m, &mut table, &mut out_s, &mut out_l, &mut first);

            let lcp_i = source.lcp(i) as i64;
            for ip in [i - 1, i] {
                let c = source.bwt(ip) as usize;
                if lcp_i > table[c].len {
                    table[c] = LcsCandidate {
                        len: lcp_i,
                        pos: (n_total - 1) - source.sa(ip),
                        lcs: table[c].lcs, // carried over until next flush
                        active: true,
                    };
                }
            }

            m = i64::MAX;
        }
    }

    flush_lcs(-1, &mut table, &mut out_s, &mut out_l, &mut first);

    SupermaximalSet {
        positions: out_s,
        lcs_lengths: out_l,
        first_occurrence: first,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(text: &[u8]) -> Vec<usize> {
        let src = NaiveSaLcpBwtSource::build(text);
        let mut s = build_suffixient_set(&src, 128);
        s.sort_unstable();
        s
    }

    #[test]
    fn test_aaaa() {
        // every position is equivalent under repetition; one suffices.
        let s = positions(b"AAAA");
        assert!(!s.is_empty());
        assert!(s.len() <= 4);
    }

    #[test]
    fn test_acgt_all_distinct() {
        // no repeated runs at all: every position is its own suffixient witness.
        let s = positions(b"ACGT");
        assert_eq!(s.len(), 4);
    }

    #[test]
    fn test_abracadabra_bounded_by_runs() {
        let src = NaiveSaLcpBwtSource::build(b"ABRACADABRA");
        let s = build_suffixient_set(&src, 128);
        // |S| <= r by construction.
        assert!(s.len() <= 11);
        assert!(!s.is_empty());
    }

    #[test]
    fn test_positions_are_within_text_bounds() {
        let s = positions(b"ABCABCABC");
        for &p in &s {
            assert!(p <= 9);
        }
    }

    #[test]
    fn test_supermaximal_lengths_match_positions() {
        let src = NaiveSaLcpBwtSource::build(b"ABRACADABRA");
        let out = build_suffixient_set_supermaximal(&src, 128);
        assert_eq!(out.positions.len(), out.lcs_lengths.len());
        assert!(!out.positions.is_empty());
    }
}
