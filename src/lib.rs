//! # suffixient
//!
//! **Suffixient sets, reverse-prefix indexing, and Maximal Exact Match (MEM) finding**
//!
//! > A suffixient set is a set of text positions of size at most `r` (the
//! > number of BWT-runs of the reversed text) sufficient to locate a
//! > Maximal Exact Match for any pattern, without the text's full suffix
//! > array.
//!
//! ## Architecture
//!
//! - **One-pass builder** ([`suffixient_set`]): a single left-to-right scan
//!   over the SA/LCP/BWT of the reversed text produces the set directly,
//!   no suffix tree required.
//! - **Compacted trie with micro-tries** ([`ctrie`], [`zfast_trie`]): the
//!   reverse-prefix dictionary keyed at 8-byte-block granularity, with a
//!   z-fast trie resolving byte-level ambiguity inside a differing block.
//! - **LZ77 self-index** ([`lz77_index`]) plus a **doubling-window LCP/LCS
//!   oracle** ([`lcp_lcs`]): random-access substring extraction and
//!   forward/backward pattern-agreement measurement without decompressing
//!   the whole text.
//! - **Orchestration** ([`suffixient_index`]): wires the dictionary and the
//!   oracle together to answer `find_mems`.
//!
//! ## Example
//!
//! ```
//! use suffixient::suffixient_set::{build_suffixient_set, NaiveSaLcpBwtSource};
//! use suffixient::suffixient_index::{BuildConfig, SuffixientIndex};
//!
//! let text = b"ABRACADABRA";
//! let source = NaiveSaLcpBwtSource::build(text);
//! let positions = build_suffixient_set(&source, 128);
//!
//! let index = SuffixientIndex::build_plain(text, &positions, &BuildConfig::default()).unwrap();
//! let mems = index.find_mems(b"ABRA").unwrap();
//! assert!(!mems.is_empty());
//! ```

pub mod balanced_parens;
pub mod bitvec;
pub mod ctrie;
pub mod cuckoo;
pub mod error;
pub mod lcp_lcs;
pub mod lz77_index;
pub mod suffixient_index;
pub mod suffixient_set;
pub mod zfast_trie;

pub use error::{Result, SuffixientError};
pub use suffixient_index::{BuildConfig, SuffixientIndex};

/// Version
pub const VERSION: &str = "0.1.0";

#[cfg(test)]
mod tests {
    use super::*;
    use suffixient_set::{build_suffixient_set, NaiveSaLcpBwtSource};

    #[test]
    fn test_end_to_end_small_text() {
        let text = b"ABRACADABRA";
        let source = NaiveSaLcpBwtSource::build(text);
        let positions = build_suffixient_set(&source, 128);

        let index = SuffixientIndex::build_plain(text, &positions, &BuildConfig::default()).unwrap();
        let mems = index.find_mems(text).unwrap();
        assert!(!mems.is_empty());
    }

    #[test]
    fn test_empty_text_is_rejected() {
        let positions: Vec<usize> = Vec::new();
        let err = SuffixientIndex::build_plain(b"", &positions, &BuildConfig::default()).unwrap_err();
        assert!(matches!(err, SuffixientError::EmptyText));
    }
}
