//! Compacted trie with micro-tries, "CTrie++" (C4).
//!
//! The reverse-prefix dictionary over the suffixient set. Keys are
//! compared 8 bytes at a time (a *block*); a node's edge label is a run of
//! whole blocks shared with its children, relative to its parent. When a
//! branch point has no child whose first block matches a query's block
//! exactly, the node's [`ZFastTrie`] micro-trie resolves byte-level
//! prefixes within that single differing block (two children can agree on
//! a block's leading bytes yet disagree in trailing ones, which an 8-byte
//! equality check alone cannot tell apart).
//!
//! Grounded on `CTriePP.hpp`: `Node`/`NodeIndex` is the slab-arena pattern
//! from `Factory<Node>`, `insert`/`erase`/`containsPrefix`/`locatePrefix`/
//! `locateLongestPrefix` follow its block-at-a-time descent, and
//! `insertChild`/`eraseNode` follow its lazy micro-trie creation and
//! unary-parent/child merge on deletion.

use crate::cuckoo::{CuckooMap, KeyOf};
use crate::error::{Result, SuffixientError};
use crate::zfast_trie::{KeyBlock, ZFastTrie};

const BLOCK_BYTES: usize = 8;

fn pack_block(bytes: &[u8]) -> u64 {
    let mut v = 0u64;
    for (i, &b) in bytes.iter().take(BLOCK_BYTES).enumerate() {
        v |= (b as u64) << (8 * (BLOCK_BYTES - 1 - i));
    }
    v
}

/// A byte string addressed in 8-byte blocks, as `LongString` in the
/// original: trie edge labels and insert/lookup keys are always one of
/// these, sliced at block boundaries rather than arbitrary byte offsets.
#[derive(Clone, Debug, Default)]
struct LongString {
    bytes: Vec<u8>,
}

impl LongString {
    fn from_bytes(b: &[u8]) -> Self {
        Self { bytes: b.to_vec() }
    }

    fn len_blocks(&self) -> usize {
        self.bytes.len().div_ceil(BLOCK_BYTES)
    }

    fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    fn block_bytes(&self, i: usize) -> &[u8] {
        let start = i * BLOCK_BYTES;
        if start >= self.bytes.len() {
            return &[];
        }
        let end = (start + BLOCK_BYTES).min(self.bytes.len());
        &self.bytes[start..end]
    }

    fn block_key(&self, i: usize) -> u64 {
        pack_block(self.block_bytes(i))
    }

    /// The suffix starting at the `from`-th block.
    fn suffix(&self, from: usize) -> LongString {
        let start = (from * BLOCK_BYTES).min(self.bytes.len());
        LongString::from_bytes(&self.bytes[start..])
    }

    /// The prefix consisting of the first `n` blocks.
    fn prefix_blocks(&self, n: usize) -> LongString {
        let end = (n * BLOCK_BYTES).min(self.bytes.len());
        LongString::from_bytes(&self.bytes[..end])
    }
}

/// Number of leading blocks `a` and `b` agree on exactly (byte-for-byte,
/// including any zero padding in a final partial block).
fn block_lcp(a: &LongString, b: &LongString) -> usize {
    let n = a.len_blocks().min(b.len_blocks());
    let mut i = 0;
    while i < n && a.block_key(i) == b.block_key(i) {
        i += 1;
    }
    i
}

type NodeIndex = u32;

#[derive(Clone)]
struct ChildEntry {
    key: u64,
    node: NodeIndex,
}
impl KeyOf for ChildEntry {
    fn key_of(&self) -> u64 {
        self.key
    }
}

struct Node<V> {
    value: Option<V>,
    sub_text: LongString,
    children: Option<Box<CuckooMap<ChildEntry>>>,
    micro_trie: Option<Box<ZFastTrie<NodeIndex>>>,
}

impl<V> Node<V> {
    fn leaf(sub_text: LongString, value: Option<V>) -> Self {
        Self {
            value,
            sub_text,
            children: None,
            micro_trie: None,
        }
    }
}

/// A compacted trie mapping byte strings to values of type `V`.
pub struct CTrie<V> {
    nodes: Vec<Node<V>>,
    root: NodeIndex,
    len: usize,
}

impl<V: Clone> CTrie<V> {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::leaf(LongString::default(), None)],
            root: 0,
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn child_index(&self, node: NodeIndex, key: u64) -> Option<NodeIndex> {
        self.nodes[node as usize]
            .children
            .as_ref()
            .and_then(|m| m.get(key))
            .map(|e| e.node)
    }

    fn insert_child(&mut self, node: NodeIndex, key: u64, child: NodeIndex) {
        let n = &mut self.nodes[node as usize];
        if n.children.is_none() {
            n.children = Some(Box::new(CuckooMap::new()));
            n.micro_trie = Some(Box::new(ZFastTrie::new()));
        }
        n.children.as_mut().unwrap().insert(ChildEntry { key, node: child });
        let block = self.nodes[child as usize].sub_text.block_bytes(0).to_vec();
        self.nodes[node as usize]
            .micro_trie
            .as_mut()
            .unwrap()
            .insert(KeyBlock::from_slice(&block), child);
    }

    pub fn insert(&mut self, text: &[u8], value: V) {
        let mut cur = self.root;
        let mut rest = LongString::from_bytes(text);
        loop {
            let lcp = block_lcp(&rest, &self.nodes[cur as usize].sub_text);
            let node_blocks = self.nodes[cur as usize].sub_text.len_blocks();

            if lcp == node_blocks {
                if lcp == rest.len_blocks() {
                    let n = &mut self.nodes[cur as usize];
                    if n.value.is_none() {
                        n.value = Some(value);
                        self.len += 1;
                    }
                    return;
                }
                rest = rest.suffix(lcp);
                let key = rest.block_key(0);
                match self.child_index(cur, key) {
                    Some(next) => {
                        cur = next;
                        continue;
                    }
                    None => {
                        let idx = self.push(Node::leaf(rest, Some(value)));
                        self.insert_child(cur, key, idx);
                        self.len += 1;
                        return;
                    }
                }
            }

            // mismatch partway through this node's edge label: split it.
            let old_subtext = self.nodes[cur as usize].sub_text.clone();
            let old_value = self.nodes[cur as usize].value.take();
            let old_children = self.nodes[cur as usize].children.take();
            let old_micro = self.nodes[cur as usize].micro_trie.take();

            let moved = self.push(Node {
                value: old_value,
                sub_text: old_subtext.suffix(lcp),
                children: old_children,
                micro_trie: old_micro,
            });
            let moved_key = self.nodes[moved as usize].sub_text.block_key(0);

            {
                let n = &mut self.nodes[cur as usize];
                n.sub_text = old_subtext.prefix_blocks(lcp);
                n.children = None;
                n.micro_trie = None;
                n.value = None;
            }
            self.insert_child(cur, moved_key, moved);

            rest = rest.suffix(lcp);
            if rest.len_blocks() == 0 {
                self.nodes[cur as usize].value = Some(value);
                self.len += 1;
            } else {
                let key = rest.block_key(0);
                let idx = self.push(Node::leaf(rest, Some(value)));
                self.insert_child(cur, key, idx);
                self.len += 1;
            }
            return;
        }
    }

    fn push(&mut self, node: Node<V>) -> NodeIndex {
        let idx = self.nodes.len() as NodeIndex;
        self.nodes.push(node);
        idx
    }

    pub fn contains(&self, text: &[u8]) -> bool {
        let mut cur = self.root;
        let mut rest = LongString::from_bytes(text);
        loop {
            let node = &self.nodes[cur as usize];
            let lcp = block_lcp(&rest, &node.sub_text);
            if rest.len_blocks() <= lcp {
                return rest.byte_len() == node.sub_text.byte_len() && node.value.is_some();
            }
            if lcp == node.sub_text.len_blocks() {
                rest = rest.suffix(lcp);
                let key = rest.block_key(0);
                match self.child_index(cur, key) {
                    Some(next) => cur = next,
                    None => return false,
                }
            } else {
                return false;
            }
        }
    }

    /// `containsPrefix(p)`: true iff some stored key and `p` agree on a
    /// common prefix spanning the whole of one of them.
    pub fn contains_prefix(&self, text: &[u8]) -> Result<bool> {
        let mut cur = self.root;
        let mut rest = LongString::from_bytes(text);
        loop {
            let node = &self.nodes[cur as usize];
            let lcp = block_lcp(&rest, &node.sub_text);
            if rest.len_blocks() <= lcp {
                return Ok(true);
            }
            if lcp == node.sub_text.len_blocks() {
                let next_rest = rest.suffix(lcp);
                let key = next_rest.block_key(0);
                match self.child_index(cur, key) {
                    Some(next) => {
                        cur = next;
                        rest = next_rest;
                    }
                    None => {
                        return self.contains_key_prefix(cur, next_rest.block_bytes(0));
                    }
                }
            } else {
                return Ok(byte_prefix_either_way(
                    rest.block_bytes(lcp),
                    node.sub_text.block_bytes(lcp),
                ));
            }
        }
    }

    /// `locatePrefix(p)`: value of a node reachable by following `p`, or
    /// (if `p` runs out partway through an edge) the sibling whose own
    /// first block is a byte-prefix of the one `p` needed next.
    pub fn locate_prefix(&self, text: &[u8]) -> Result<Option<V>> {
        let mut cur = self.root;
        let mut rest = LongString::from_bytes(text);
        loop {
            let node = &self.nodes[cur as usize];
            let lcp = block_lcp(&rest, &node.sub_text);
            if rest.len_blocks() <= lcp {
                return Ok(node.value.clone());
            }
            if lcp == node.sub_text.len_blocks() {
                let next_rest = rest.suffix(lcp);
                let key = next_rest.block_key(0);
                match self.child_index(cur, key) {
                    Some(next) => {
                        cur = next;
                        rest = next_rest;
                    }
                    None => {
                        let hit = self.key_prefix(cur, next_rest.block_bytes(0))?;
                        return Ok(hit.and_then(|idx| self.nodes[idx as usize].value.clone()));
                    }
                }
            } else {
                return Ok(None);
            }
        }
    }

    /// `locateLongestPrefix(p)`: `(value, matched_bytes)` for the deepest
    /// node reachable by `p`.
    pub fn locate_longest_prefix(&self, text: &[u8]) -> Result<Option<(V, usize)>> {
        let mut cur = self.root;
        let mut rest = LongString::from_bytes(text);
        let mut consumed_bytes = 0usize;
        loop {
            let node = &self.nodes[cur as usize];
            let lcp = block_lcp(&rest, &node.sub_text);
            if rest.len_blocks() <= lcp {
                return Ok(node
                    .value
                    .clone()
                    .map(|v| (v, consumed_bytes + rest.byte_len())));
            }
            if lcp == node.sub_text.len_blocks() {
                consumed_bytes += lcp * BLOCK_BYTES;
                let next_rest = rest.suffix(lcp);
                let key = next_rest.block_key(0);
                match self.child_index(cur, key) {
                    Some(next) => {
                        cur = next;
                        rest = next_rest;
                    }
                    None => {
                        let hit = self.key_longest_prefix(cur, next_rest.block_bytes(0))?;
                        return Ok(match hit {
                            Some((idx, matched)) => {
                                let v = self.nodes[idx as usize].value.clone().unwrap();
                                Some((v, consumed_bytes + matched as usize))
                            }
                            // Micro-trie miss: this node is still a valid
                            // (shorter) answer if it is itself a stored key.
                            None => node.value.clone().map(|v| (v, consumed_bytes)),
                        });
                    }
                }
            } else {
                let byte_lcp = common_byte_prefix(rest.block_bytes(lcp), node.sub_text.block_bytes(lcp));
                return Ok(node
                    .value
                    .clone()
                    .map(|v| (v, consumed_bytes + lcp * BLOCK_BYTES + byte_lcp)));
            }
        }
    }

    fn contains_key_prefix(&self, node: NodeIndex, query_block: &[u8]) -> Result<bool> {
        match &self.nodes[node as usize].micro_trie {
            None => Ok(false),
            Some(mt) => mt.contains_prefix(&KeyBlock::from_slice(query_block)),
        }
    }

    fn key_prefix(&self, node: NodeIndex, query_block: &[u8]) -> Result<Option<NodeIndex>> {
        match &self.nodes[node as usize].micro_trie {
            None => Ok(None),
            Some(mt) => mt.get_prefix(&KeyBlock::from_slice(query_block)),
        }
    }

    fn key_longest_prefix(&self, node: NodeIndex, query_block: &[u8]) -> Result<Option<(NodeIndex, u8)>> {
        match &self.nodes[node as usize].micro_trie {
            None => Ok(None),
            Some(mt) => mt.get_longest_prefix(&KeyBlock::from_slice(query_block)),
        }
    }

    pub fn erase(&mut self, text: &[u8]) {
        let mut cur = self.root;
        let mut parent: Option<NodeIndex> = None;
        let mut rest = LongString::from_bytes(text);
        loop {
            let lcp = block_lcp(&rest, &self.nodes[cur as usize].sub_text);
            if rest.len_blocks() <= lcp {
                self.erase_node(parent, cur);
                return;
            }
            if lcp == self.nodes[cur as usize].sub_text.len_blocks() {
                rest = rest.suffix(lcp);
                let key = rest.block_key(0);
                match self.child_index(cur, key) {
                    Some(next) => {
                        parent = Some(cur);
                        cur = next;
                    }
                    None => return,
                }
            } else {
                return;
            }
        }
    }

    fn erase_node(&mut self, parent: Option<NodeIndex>, target: NodeIndex) {
        self.nodes[target as usize].value = None;
        self.len -= 1;
        let key = self.nodes[target as usize].sub_text.block_key(0);

        let has_children = self.nodes[target as usize].children.is_some();
        if !has_children {
            match parent {
                None => {
                    self.nodes[self.root as usize] = Node::leaf(LongString::default(), None);
                }
                Some(p) => {
                    if let Some(m) = self.nodes[p as usize].children.as_mut() {
                        m.remove(key);
                    }
                    self.erase_from_micro(p, target);
                    self.maybe_merge_unary(p);
                }
            }
            return;
        }

        if self.nodes[target as usize].children.as_ref().unwrap().len() == 1 {
            if let Some(p) = parent {
                if let Some(m) = self.nodes[p as usize].children.as_mut() {
                    m.remove(key);
                }
                self.erase_from_micro(p, target);

                let child = self.nodes[target as usize]
                    .children
                    .as_ref()
                    .unwrap()
                    .iter()
                    .next()
                    .unwrap()
                    .node;
                let absorbed = self.nodes[target as usize].sub_text.clone();
                let full_child = {
                    let c = &self.nodes[child as usize];
                    let mut bytes = absorbed.bytes.clone();
                    bytes.extend_from_slice(&c.sub_text.bytes);
                    LongString::from_bytes(&bytes)
                };
                self.nodes[child as usize].sub_text = full_child;

                let new_key = self.nodes[child as usize].sub_text.block_key(0);
                if let Some(m) = self.nodes[p as usize].children.as_mut() {
                    m.insert(ChildEntry { key: new_key, node: child });
                }
                let block = self.nodes[child as usize].sub_text.block_bytes(0).to_vec();
                if let Some(mt) = self.nodes[p as usize].micro_trie.as_mut() {
                    mt.insert(KeyBlock::from_slice(&block), child);
                }
            }
        }
    }

    /// Removes `child`'s stale entry from `parent`'s micro-trie. The
    /// micro-trie keys on raw first-block bytes, which we recover from
    /// `child`'s own edge label before the parent drops its bookkeeping.
    fn erase_from_micro(&mut self, parent: NodeIndex, child: NodeIndex) {
        let block = self.nodes[child as usize].sub_text.block_bytes(0).to_vec();
        if let Some(mt) = self.nodes[parent as usize].micro_trie.as_mut() {
            mt.erase(KeyBlock::from_slice(&block));
        }
    }

    fn maybe_merge_unary(&mut self, node: NodeIndex) {
        if node == self.root {
            return;
        }
        let single_child = match &self.nodes[node as usize].children {
            Some(m) if m.len() == 1 && self.nodes[node as usize].value.is_none() => {
                m.iter().next().map(|c| c.node)
            }
            _ => None,
        };
        let Some(child) = single_child else { return };

        let prefix = self.nodes[node as usize].sub_text.clone();
        let merged = {
            let c = &self.nodes[child as usize];
            let mut bytes = prefix.bytes.clone();
            bytes.extend_from_slice(&c.sub_text.bytes);
            LongString::from_bytes(&bytes)
        };
        let (child_value, child_children, child_micro) = {
            let c = &mut self.nodes[child as usize];
            (c.value.take(), c.children.take(), c.micro_trie.take())
        };
        let n = &mut self.nodes[node as usize];
        n.sub_text = merged;
        n.value = child_value;
        n.children = child_children;
        n.micro_trie = child_micro;
    }
}

impl<V: Clone> Default for CTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

fn common_byte_prefix(a: &[u8], b: &[u8]) -> usize {
    let n = a.len().min(b.len());
    let mut i = 0;
    while i < n && a[i] == b[i] {
        i += 1;
    }
    i
}

fn byte_prefix_either_way(a: &[u8], b: &[u8]) -> bool {
    let n = a.len().min(b.len());
    a[..n] == b[..n]
}

const MAGIC: u32 = 0x43_54_52_50; // "CTRP"

impl CTrie<u32> {
    /// Serializes `(text, value)` pairs as a flat record stream. This is
    /// the abstract store/load contract only, not a production wire format:
    /// one magic header, then `len` records of `[u32 value][u32 byte_len][bytes]`.
    pub fn store(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&MAGIC.to_le_bytes());
        out.extend_from_slice(&(self.len as u32).to_le_bytes());
        self.collect_records(self.root, &mut Vec::new(), &mut out);
        out
    }

    fn collect_records(&self, node: NodeIndex, prefix: &mut Vec<u8>, out: &mut Vec<u8>) {
        let n = &self.nodes[node as usize];
        let start_len = prefix.len();
        prefix.extend_from_slice(&n.sub_text.bytes);

        if let Some(v) = n.value {
            out.extend_from_slice(&v.to_le_bytes());
            out.extend_from_slice(&(prefix.len() as u32).to_le_bytes());
            out.extend_from_slice(prefix);
        }
        if let Some(children) = &n.children {
            for c in children.iter() {
                self.collect_records(c.node, prefix, out);
            }
        }
        prefix.truncate(start_len);
    }

    pub fn load(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 8 {
            return Err(SuffixientError::BadMagic {
                expected: MAGIC,
                found: 0,
            });
        }
        let magic = u32::from_le_bytes(bytes[0..4].try_into().unwrap());
        if magic != MAGIC {
            return Err(SuffixientError::BadMagic {
                expected: MAGIC,
                found: magic,
            });
        }
        let count = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
        let mut trie = CTrie::new();
        let mut pos = 8;
        for _ in 0..count {
            let value = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap());
            pos += 4;
            let blen = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap()) as usize;
            pos += 4;
            let text = &bytes[pos..pos + blen];
            pos += blen;
            trie.insert(text, value);
        }
        Ok(trie)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_contains() {
        let mut t = CTrie::new();
        t.insert(b"banana", 1u32);
        t.insert(b"band", 2u32);
        t.insert(b"bandit", 3u32);

        assert!(t.contains(b"banana"));
        assert!(t.contains(b"band"));
        assert!(t.contains(b"bandit"));
        assert!(!t.contains(b"ban"));
        assert_eq!(t.len(), 3);
    }

    #[test]
    fn test_contains_prefix() {
        let mut t = CTrie::new();
        t.insert(b"hello world", 1u32);

        assert!(t.contains_prefix(b"hello").unwrap());
        assert!(t.contains_prefix(b"hello world and more").unwrap());
        assert!(!t.contains_prefix(b"goodbye").unwrap());
    }

    #[test]
    fn test_locate_longest_prefix() {
        let mut t = CTrie::new();
        t.insert(b"ab", 10u32);
        t.insert(b"abcdefgh", 20u32);

        let (v, matched) = t.locate_longest_prefix(b"abcdefghij").unwrap().unwrap();
        assert_eq!(v, 20);
        assert_eq!(matched, 8);

        let (v2, matched2) = t.locate_longest_prefix(b"abz").unwrap().unwrap();
        assert_eq!(v2, 10);
        assert_eq!(matched2, 2);
    }

    #[test]
    fn test_erase() {
        let mut t = CTrie::new();
        t.insert(b"apple", 1u32);
        t.insert(b"app", 2u32);
        t.erase(b"apple");
        assert!(!t.contains(b"apple"));
        assert!(t.contains(b"app"));
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn test_store_load_roundtrip() {
        let mut t = CTrie::new();
        t.insert(b"alpha", 1u32);
        t.insert(b"alphabet", 2u32);
        t.insert(b"beta", 3u32);

        let bytes = t.store();
        let loaded = CTrie::load(&bytes).unwrap();
        assert_eq!(loaded.len(), 3);
        assert!(loaded.contains(b"alpha"));
        assert!(loaded.contains(b"alphabet"));
        assert!(loaded.contains(b"beta"));
    }
}
