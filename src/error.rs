//! Crate error taxonomy.
//!
//! Every fallible operation in this crate returns [`Result`]. `locate*`
//! "no match" outcomes are *not* errors (see `ctrie.rs` / `zfast_trie.rs`) —
//! they are in-band sentinels, since missing a pattern byte is an expected
//! outcome of a query, not a failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SuffixientError {
    #[error("input text is empty")]
    EmptyText,

    #[error("FASTA-like stream has an odd number of lines ({lines}); headers and patterns must alternate")]
    MalformedFasta { lines: usize },

    #[error("FIRST[{byte:#04x}] buffer is empty while materializing a first-occurrence key")]
    EmptyFirstOccurrence { byte: u8 },

    #[error("z-fast trie binary search diverged: handle length {handle} exceeds extent length {extent}")]
    DivergentSearch { handle: usize, extent: usize },

    #[error("persisted trie has bad magic header (expected {expected:#x}, found {found:#x})")]
    BadMagic { expected: u32, found: u32 },
}

pub type Result<T> = std::result::Result<T, SuffixientError>;
