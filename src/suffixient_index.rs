//! Suffixient index orchestration: build, persist, and `find_MEMs` (C6).
//!
//! Wires the reverse-prefix dictionary (C4, [`CTrie`]) to the LZ77
//! self-index / LCP-LCS oracle (C2+C3) built over the same text. Building
//! inserts, for each witness position in a suffixient set, the reverse of
//! the text prefix ending there; querying walks the MEM-finding state
//! machine from `suffixient_index.hpp`, alternating a dictionary lookup
//! with forward/backward extension measurements.
//!
//! Grounded on `index/suffixient_index.hpp`: `build()` (both the plain and
//! the supermaximal overload), `insert_prefix`, `locate_prefix`,
//! `locate_longest_prefix`, `find_MEMs`, and `locate_fasta`.

use crate::ctrie::CTrie;
use crate::error::{Result, SuffixientError};
use crate::lcp_lcs::LcpLcsOracle;
use crate::lz77_index::Lz77Index;
use crate::suffixient_set::SupermaximalSet;
use log::{info, trace};

/// Construction-time knobs, gathered as explicit constructor arguments
/// rather than global defaults.
#[derive(Clone, Debug)]
pub struct BuildConfig {
    /// C3's starting doubling-window size.
    pub window0: usize,
    /// Whether the suffixient set carries LCS/FIRST arrays (supermaximal mode).
    pub supermaximal: bool,
    /// Re-read buffering size while scanning T during index build.
    pub read_buffer_size: usize,
    /// Alphabet size sigma; bounds FIRST-occurrence lookups.
    pub alphabet_size: usize,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            window0: 8,
            supermaximal: false,
            read_buffer_size: 1_000_000,
            alphabet_size: 128,
        }
    }
}

/// Reverse-prefix dictionary (C4) plus self-index/oracle (C2+C3), wired
/// together for `find_MEMs` queries over a fixed text.
pub struct SuffixientIndex {
    trie: CTrie<u32>,
    lz: Lz77Index,
    window0: usize,
}

impl SuffixientIndex {
    /// Plain-mode build: `S` is a suffixient set (unsorted is fine, sorted
    /// here). For each witness `p` in increasing order, reads only the new
    /// bytes since the previous witness, reverses that chunk, and prepends
    /// it to the running reversed-prefix accumulator — `O(n)` total work
    /// across all `|S|` insertions rather than re-reversing the whole
    /// prefix per witness.
    pub fn build_plain(text: &[u8], positions: &[usize], config: &BuildConfig) -> Result<Self> {
        if text.is_empty() {
            return Err(SuffixientError::EmptyText);
        }

        let mut sorted = positions.to_vec();
        sorted.sort_unstable();

        let mut trie = CTrie::new();
        let mut last_index = 0usize;
        let mut last_prefix: Vec<u8> = Vec::new();
        let mut total_chars = 0usize;

        for &p in &sorted {
            let end = (p + 1).min(text.len());
            let start = last_index.min(end);
            let chunk = &text[start..end];
            let mut next_prefix: Vec<u8> = chunk.iter().rev().copied().collect();
            next_prefix.extend_from_slice(&last_prefix);
            last_prefix = next_prefix;
            last_index = end;
            total_chars += chunk.len();
            trie.insert(&last_prefix, p as u32);
        }

        let lz = Lz77Index::build(text);
        info!(
            "suffixient index built (plain): {} keys, {} chars inserted",
            sorted.len(),
            total_chars
        );

        Ok(Self {
            trie,
            lz,
            window0: config.window0,
        })
    }

    /// Supermaximal-mode build: each witness carries its own LCS-derived
    /// window length, so the key inserted is `reverse(T[p-len+1..=p])`
    /// rather than the full accumulated prefix. A witness with `len == 1`
    /// is ambiguous on its own (a single byte uniquely identifies nothing);
    /// it is deferred and resolved afterward against `first_occurrence`,
    /// the length at which that byte's BWT symbol was first flushed.
    pub fn build_supermaximal(
        text: &[u8],
        set: &SupermaximalSet,
        config: &BuildConfig,
    ) -> Result<Self> {
        if text.is_empty() {
            return Err(SuffixientError::EmptyText);
        }

        let mut trie = CTrie::new();
        let mut deferred = Vec::new();
        let mut total_chars = 0usize;

        for (idx, (&p, &len)) in set.positions.iter().zip(set.lcs_lengths.iter()).enumerate() {
            if len >= 2 {
                let len = len as usize;
                let start = p + 1 - len.min(p + 1);
                let mut buf: Vec<u8> = text[start..=p].to_vec();
                buf.reverse();
                total_chars += buf.len();
                trie.insert(&buf, p as u32);
            } else {
                deferred.push(idx);
            }
        }

        for idx in deferred {
            let p = set.positions[idx];
            let c = text[p] as usize;
            let first_len = *set
                .first_occurrence
                .get(c)
                .ok_or(SuffixientError::EmptyFirstOccurrence { byte: text[p] })?;
            if first_len <= 0 {
                return Err(SuffixientError::EmptyFirstOccurrence { byte: text[p] });
            }
            let first_len = (first_len as usize).min(p + 1);
            let start = p + 1 - first_len;
            let mut buf: Vec<u8> = text[start..=p].to_vec();
            buf.reverse();
            total_chars += buf.len();
            trie.insert(&buf, p as u32);
        }

        let lz = Lz77Index::build(text);
        info!(
            "suffixient index built (supermaximal): {} keys, {} chars inserted",
            set.positions.len(),
            total_chars
        );

        Ok(Self {
            trie,
            lz,
            window0: config.window0,
        })
    }

    /// Inserts one more `(reverse-prefix, position)` pair directly, for
    /// callers assembling the dictionary outside the standard build paths.
    pub fn insert_prefix(&mut self, reversed_prefix: &[u8], position: usize) {
        self.trie.insert(reversed_prefix, position as u32);
    }

    /// Looks up the shallowest stored reverse-prefix key that is a prefix
    /// of `key`. `key` must already be in the trie's reversed-prefix
    /// convention — this is a thin pass-through, not a text-position query.
    pub fn locate_prefix(&self, key: &[u8]) -> Result<Option<usize>> {
        Ok(self.trie.locate_prefix(key)?.map(|v| v as usize))
    }

    /// As [`Self::locate_prefix`], but returns the deepest (longest)
    /// matching key, paired with how many bytes of `key` it consumed.
    pub fn locate_longest_prefix(&self, key: &[u8]) -> Result<Option<(usize, usize)>> {
        Ok(self
            .trie
            .locate_longest_prefix(key)?
            .map(|(v, consumed)| (v as usize, consumed)))
    }

    /// Finds all Maximal Exact Matches of `pattern` against the indexed
    /// text, as `(start, length)` pairs in pattern coordinates.
    ///
    /// `i`/`l`/`p_start` trace the state machine from `suffixient_index.hpp`
    /// exactly: at each step, the reverse of the right-maximal substring
    /// seen so far is looked up in the dictionary; its match gives a text
    /// anchor `j`, from which `C3.LCS` measures how far the current MEM
    /// candidate extends backward (`b`) and `C3.LCP` measures how far the
    /// next candidate extends forward (`f`). A character of `pattern` with
    /// no occurrence in the text yields no dictionary hit, which this
    /// treats as `b = f = 0` — advance by one character, per the documented
    /// edge case.
    pub fn find_mems(&self, pattern: &[u8]) -> Result<Vec<(usize, usize)>> {
        let oracle = LcpLcsOracle::new(&self.lz, self.window0);
        let m = pattern.len();
        let mut out = Vec::new();

        if m == 0 {
            return Ok(out);
        }

        let mut i = 0usize;
        let mut l = 0usize;
        let mut pstart = 0usize;

        while i < m {
            let key: Vec<u8> = pattern[pstart..=i].iter().rev().copied().collect();
            let hit = self.trie.locate_longest_prefix(&key)?;
            let j = hit.map(|(pos, _)| pos as usize);

            let b = match j {
                Some(jpos) => oracle.lcs(pattern, i, jpos),
                None => 0,
            };

            if b <= l {
                trace!("MEM ({}, {})", i - l, l);
                out.push((i - l, l));
                pstart = i - l + 1;
            }

            let f = match j {
                Some(jpos) if jpos + 1 <= self.lz.len() => oracle.lcp(pattern, i + 1, jpos + 1),
                _ => 0,
            };

            i = i + f + 1;
            l = b + f;
        }

        out.push((i - l, l));
        Ok(out)
    }

    /// Processes a FASTA-like query stream: odd lines (1-indexed) are
    /// headers echoed verbatim, even lines are patterns to MEM-match. Each
    /// header is followed by a line of space-separated `(position,length)`
    /// pairs, mirroring `locate_fasta`'s output file.
    pub fn locate_fasta(&self, input: &str) -> Result<String> {
        let lines: Vec<&str> = input.lines().collect();
        if lines.len() % 2 != 0 {
            return Err(SuffixientError::MalformedFasta { lines: lines.len() });
        }

        let mut out = String::new();
        for pair in lines.chunks(2) {
            let header = pair[0];
            let pattern = pair[1];

            out.push_str(header);
            out.push('\n');

            let mems = self.find_mems(pattern.as_bytes())?;
            for (k, (pos, len)) in mems.iter().enumerate() {
                if k > 0 {
                    out.push(' ');
                }
                out.push_str(&format!("({pos},{len})"));
            }
            out.push('\n');
        }

        Ok(out)
    }

    /// Serializes the reverse-prefix dictionary. The self-index is rebuilt
    /// from the text on load rather than persisted, since `display()` needs
    /// only `text` to reconstruct (store/load is scoped to the abstract
    /// trie contract, not a full index snapshot).
    pub fn store(&self) -> Vec<u8> {
        self.trie.store()
    }

    /// Inverse of [`Self::store`]; `text` must be the same text the index
    /// was originally built over.
    pub fn load(bytes: &[u8], text: &[u8], config: &BuildConfig) -> Result<Self> {
        let trie = CTrie::<u32>::load(bytes)?;
        let lz = Lz77Index::build(text);
        Ok(Self {
            trie,
            lz,
            window0: config.window0,
        })
    }
}
