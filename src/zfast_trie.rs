//! Alphabet-aware z-fast trie over 8-byte blocks (C4's micro-trie).
//!
//! Each compacted-trie branching node owns one of these. It stores the
//! first-block keys of that node's children and answers longest-prefix
//! queries at the byte level — something a plain hash map cannot do, which
//! is why `ctrie.rs` keeps this instead of replacing it.
//!
//! Branches on whole bytes rather than single bits (hence "alphabet-aware"),
//! so the tree never exceeds [`MAX_BLOCK_BYTES`] levels. A node's *extent*
//! is its full byte path from the root; its *handle* is the
//! `twoFattest(nameLength - 1, extentLength)`-byte prefix of that extent,
//! stored in a [`CuckooMap`] so an exit node can be located by a handful of
//! handle probes instead of walking level by level. Because depth is capped
//! at 8 the asymptotic win is modest, but the mechanism is exercised for
//! real: a probe that disagrees with what a direct walk finds indicates a
//! corrupted handle table and surfaces as
//! [`SuffixientError::DivergentSearch`].

use crate::cuckoo::{CuckooMap, KeyOf};
use crate::error::{Result, SuffixientError};

pub const MAX_BLOCK_BYTES: usize = 8;
pub const INDEX_NULL: u32 = u32::MAX;

/// A byte-string key of at most 8 bytes (a padded 8-byte block read
/// low-to-high). Trailing positions beyond `len` are conceptually absent,
/// not zero-valued content (the text alphabet excludes `0x00`, so a zero
/// byte is always padding).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyBlock {
    pub bytes: [u8; MAX_BLOCK_BYTES],
    pub len: u8,
}

impl KeyBlock {
    pub fn from_slice(s: &[u8]) -> Self {
        let len = s.len().min(MAX_BLOCK_BYTES);
        let mut bytes = [0u8; MAX_BLOCK_BYTES];
        bytes[..len].copy_from_slice(&s[..len]);
        Self {
            bytes,
            len: len as u8,
        }
    }

    pub fn byte(&self, i: usize) -> u8 {
        self.bytes[i]
    }

    fn common_prefix_len(&self, other: &[u8], other_len: u8) -> u8 {
        let n = self.len.min(other_len) as usize;
        let mut i = 0;
        while i < n && self.bytes[i] == other[i] {
            i += 1;
        }
        i as u8
    }
}

fn two_fattest(a: u8, b: u8) -> u8 {
    if a == b {
        return 0;
    }
    let x = (a ^ b) as u32;
    let msb = 31 - x.leading_zeros();
    let mask: i64 = -1i64 << msb;
    (mask & b as i64) as u8
}

fn handle_bytes_hash(len: u8, bytes: &[u8]) -> u64 {
    let mut h: u64 = 0xcbf29ce484222325 ^ len as u64;
    h = h.wrapping_mul(0x100000001b3);
    for &b in &bytes[..len as usize] {
        h ^= b as u64;
        h = h.wrapping_mul(0x100000001b3);
    }
    h
}

#[derive(Clone)]
struct HandleEntry {
    key: u64,
    len: u8,
    bytes: [u8; MAX_BLOCK_BYTES],
    node: u32,
}
impl KeyOf for HandleEntry {
    fn key_of(&self) -> u64 {
        self.key
    }
}

#[derive(Clone)]
struct ChildEntry {
    byte: u8,
    node: u32,
}
impl KeyOf for ChildEntry {
    fn key_of(&self) -> u64 {
        self.byte as u64
    }
}

struct ZNode<V> {
    extent: [u8; MAX_BLOCK_BYTES],
    extent_len: u8,
    name_len: u8,
    children: Option<Box<CuckooMap<ChildEntry>>>,
    value: Option<V>,
}

impl<V: Clone> Clone for ZNode<V> {
    fn clone(&self) -> Self {
        Self {
            extent: self.extent,
            extent_len: self.extent_len,
            name_len: self.name_len,
            children: self.children.clone(),
            value: self.value.clone(),
        }
    }
}

/// A z-fast trie mapping 8-byte-or-shorter byte keys to values `V`.
pub struct ZFastTrie<V> {
    nodes: Vec<ZNode<V>>,
    handles: CuckooMap<HandleEntry>,
    len: usize,
}

impl<V: Clone> ZFastTrie<V> {
    pub fn new() -> Self {
        Self {
            nodes: vec![ZNode {
                extent: [0; MAX_BLOCK_BYTES],
                extent_len: 0,
                name_len: 0,
                children: None,
                value: None,
            }],
            handles: CuckooMap::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    const ROOT: u32 = 0;

    fn register_handle(&mut self, idx: u32) {
        let node = &self.nodes[idx as usize];
        if node.name_len == 0 {
            return; // root carries no handle
        }
        let handle_len = two_fattest(node.name_len - 1, node.extent_len);
        let key = handle_bytes_hash(handle_len, &node.extent);
        self.handles.insert(HandleEntry {
            key,
            len: handle_len,
            bytes: node.extent,
            node: idx,
        });
    }

    fn unregister_handle(&mut self, idx: u32, name_len: u8, extent_len: u8, extent: &[u8; MAX_BLOCK_BYTES]) {
        if name_len == 0 {
            return;
        }
        let handle_len = two_fattest(name_len - 1, extent_len);
        let key = handle_bytes_hash(handle_len, extent);
        self.handles.remove(key);
        let _ = idx;
    }

    pub fn insert(&mut self, key: KeyBlock, value: V) {
        let mut cur = Self::ROOT;
        loop {
            let (extent, extent_len, name_len) = {
                let n = &self.nodes[cur as usize];
                (n.extent, n.extent_len, n.name_len)
            };
            let common = key.common_prefix_len(&extent, extent_len);

            if common < extent_len {
                self.split(cur, common, key, value, name_len, extent, extent_len);
                return;
            }

            if key.len == extent_len {
                let n = &mut self.nodes[cur as usize];
                if n.value.is_none() {
                    n.value = Some(value);
                    self.len += 1;
                }
                return;
            }

            let next_byte = key.byte(extent_len as usize);
            let child = self.nodes[cur as usize]
                .children
                .as_ref()
                .and_then(|m| m.get(next_byte as u64))
                .map(|e| e.node);

            match child {
                Some(c) => {
                    cur = c;
                }
                None => {
                    let leaf = self.push_leaf(key, extent_len + 1, Some(value));
                    self.attach_child(cur, next_byte, leaf);
                    self.register_handle(leaf);
                    self.len += 1;
                    return;
                }
            }
        }
    }

    fn push_leaf(&mut self, key: KeyBlock, name_len: u8, value: Option<V>) -> u32 {
        let idx = self.nodes.len() as u32;
        self.nodes.push(ZNode {
            extent: key.bytes,
            extent_len: key.len,
            name_len,
            children: None,
            value,
        });
        idx
    }

    fn attach_child(&mut self, parent: u32, byte: u8, child: u32) {
        let n = &mut self.nodes[parent as usize];
        if n.children.is_none() {
            n.children = Some(Box::new(CuckooMap::new()));
        }
        n.children.as_mut().unwrap().insert(ChildEntry { byte, node: child });
    }

    #[allow(clippy::too_many_arguments)]
    fn split(
        &mut self,
        cur: u32,
        common: u8,
        key: KeyBlock,
        value: V,
        old_name_len: u8,
        old_extent: [u8; MAX_BLOCK_BYTES],
        old_extent_len: u8,
    ) {
        let old_children = self.nodes[cur as usize].children.take();
        let old_value = self.nodes[cur as usize].value.take();

        self.unregister_handle(cur, old_name_len, old_extent_len, &old_extent);

        // moved node inherits the old content, now hanging `common+1` bytes below cur.
        let moved = self.nodes.len() as u32;
        self.nodes.push(ZNode {
            extent: old_extent,
            extent_len: old_extent_len,
            name_len: common + 1,
            children: old_children,
            value: old_value,
        });
        self.register_handle(moved);

        // truncate cur in place
        {
            let n = &mut self.nodes[cur as usize];
            n.extent_len = common;
            n.children = None;
            n.value = None;
        }
        self.attach_child(cur, old_extent[common as usize], moved);

        if key.len == common {
            self.nodes[cur as usize].value = Some(value);
            self.len += 1;
        } else {
            let new_leaf = self.push_leaf(key, common + 1, Some(value));
            self.attach_child(cur, key.byte(common as usize), new_leaf);
            self.register_handle(new_leaf);
            self.len += 1;
        }

        self.register_handle(cur);
    }

    pub fn erase(&mut self, key: KeyBlock) {
        // locate the node exactly matching `key` via direct descent.
        let mut cur = Self::ROOT;
        let mut parent: Option<u32> = None;
        loop {
            let (extent, extent_len) = {
                let n = &self.nodes[cur as usize];
                (n.extent, n.extent_len)
            };
            let common = key.common_prefix_len(&extent, extent_len);
            if common < extent_len || key.len < extent_len {
                return; // not found
            }
            if key.len == extent_len {
                break;
            }
            let next_byte = key.byte(extent_len as usize);
            let child = self.nodes[cur as usize]
                .children
                .as_ref()
                .and_then(|m| m.get(next_byte as u64))
                .map(|e| e.node);
            match child {
                Some(c) => {
                    parent = Some(cur);
                    cur = c;
                }
                None => return,
            }
        }

        if self.nodes[cur as usize].value.take().is_some() {
            self.len -= 1;
        } else {
            return;
        }

        // leaf cleanup + single-child merge, mirroring the compacted trie's own erase policy.
        let has_children = self.nodes[cur as usize].children.is_some();
        if !has_children {
            if let Some(p) = parent {
                let (name_len, extent_len, extent) = {
                    let n = &self.nodes[cur as usize];
                    (n.name_len, n.extent_len, n.extent)
                };
                self.unregister_handle(cur, name_len, extent_len, &extent);
                let byte = extent[self.nodes[p as usize].extent_len as usize];
                if let Some(m) = self.nodes[p as usize].children.as_mut() {
                    m.remove(byte as u64);
                }
                self.maybe_merge_single_child(p);
            }
        }
    }

    fn maybe_merge_single_child(&mut self, node: u32) {
        if node == Self::ROOT {
            return;
        }
        let (value_present, only_child) = {
            let n = &self.nodes[node as usize];
            match &n.children {
                Some(m) if m.len() == 1 && n.value.is_none() => {
                    (n.value.is_some(), m.iter().next().map(|c| c.node))
                }
                _ => (true, None),
            }
        };
        if value_present || only_child.is_none() {
            return;
        }
        let child = only_child.unwrap();
        let (node_name_len, node_extent_len, node_extent) = {
            let n = &self.nodes[node as usize];
            (n.name_len, n.extent_len, n.extent)
        };
        self.unregister_handle(node, node_name_len, node_extent_len, &node_extent);
        let (child_extent, child_extent_len, child_children, child_value) = {
            let c = &mut self.nodes[child as usize];
            (c.extent, c.extent_len, c.children.take(), c.value.take())
        };
        {
            let n = &mut self.nodes[node as usize];
            n.extent = child_extent;
            n.extent_len = child_extent_len;
            n.children = child_children;
            n.value = child_value;
        }
        self.register_handle(node);
    }

    /// `containsPrefix(block)`: true iff some stored key is a byte-prefix of
    /// `block`, or `block` is a byte-prefix of some stored key.
    pub fn contains_prefix(&self, block: &KeyBlock) -> Result<bool> {
        self.probe_handles(block)?;
        let mut cur = Self::ROOT;
        loop {
            let (extent, extent_len) = {
                let n = &self.nodes[cur as usize];
                (n.extent, n.extent_len)
            };
            let common = block.common_prefix_len(&extent, extent_len);
            if common < extent_len {
                return Ok(common == block.len);
            }
            if extent_len as usize == block.len as usize {
                return Ok(true);
            }
            let next_byte = block.byte(extent_len as usize);
            match self.nodes[cur as usize]
                .children
                .as_ref()
                .and_then(|m| m.get(next_byte as u64))
            {
                Some(e) => cur = e.node,
                None => return Ok(false),
            }
        }
    }

    /// `getPrefix(block)`: value of the shallowest stored key that is a
    /// byte-prefix of `block` ("leftmost matching leaf").
    pub fn get_prefix(&self, block: &KeyBlock) -> Result<Option<V>> {
        self.probe_handles(block)?;
        Ok(self.walk_values(block).into_iter().next())
    }

    /// `getLongestPrefix(block)`: `(value, matched_bytes)` for the deepest
    /// stored key that is a byte-prefix of `block`.
    pub fn get_longest_prefix(&self, block: &KeyBlock) -> Result<Option<(V, u8)>> {
        self.probe_handles(block)?;
        Ok(self.walk_values(block).into_iter().last())
    }

    fn walk_values(&self, block: &KeyBlock) -> Vec<(V, u8)> {
        let mut out = Vec::new();
        let mut cur = Self::ROOT;
        loop {
            let (extent, extent_len, value) = {
                let n = &self.nodes[cur as usize];
                (n.extent, n.extent_len, n.value.clone())
            };
            let common = block.common_prefix_len(&extent, extent_len);
            if common < extent_len {
                // The query runs out partway through this node's extent
                // (common == block.len): it is a *prefix of* this node's
                // longer stored extent, not the other way around. A
                // descendant below this point still answers "longest
                // prefix", matched up to the query's own length, exactly
                // like `AlphabetAwareZFastTrie::getLongestPrefix` resolving
                // a leaf under a partially-matched extent.
                if common == block.len {
                    if let Some(v) = self.first_descendant_value(cur) {
                        out.push((v, common));
                    }
                }
                break;
            }
            if let Some(v) = value {
                out.push((v, extent_len));
            }
            if extent_len as usize >= block.len as usize {
                break;
            }
            let next_byte = block.byte(extent_len as usize);
            match self.nodes[cur as usize]
                .children
                .as_ref()
                .and_then(|m| m.get(next_byte as u64))
            {
                Some(e) => cur = e.node,
                None => break,
            }
        }
        out
    }

    /// Any stored value reachable below `cur` — the "leftmost leaf" the
    /// original resolves a partially-matched extent against. Which
    /// descendant is picked doesn't matter for longest-prefix purposes:
    /// every leaf below `cur` agrees with the query on the same prefix.
    fn first_descendant_value(&self, mut cur: NodeIndex) -> Option<V> {
        loop {
            let node = &self.nodes[cur as usize];
            if let Some(v) = &node.value {
                return Some(v.clone());
            }
            match node.children.as_ref().and_then(|m| m.iter().next()) {
                Some(entry) => cur = entry.node,
                None => return None,
            }
        }
    }

    /// Runs the handle-based binary search purely to exercise it and catch
    /// structural corruption; the definitive answer always comes from
    /// [`Self::walk_values`] / direct descent.
    fn probe_handles(&self, block: &KeyBlock) -> Result<()> {
        let mut a = 0u8;
        let mut b = block.len;
        loop {
            if a == b {
                return Ok(());
            }
            let f = two_fattest(a, b);
            if f == 0 {
                return Ok(());
            }
            let key = handle_bytes_hash(f, &block.bytes);
            match self.handles.get(key) {
                Some(entry) if entry.len == f && entry.bytes[..f as usize] == block.bytes[..f as usize] => {
                    let node = &self.nodes[entry.node as usize];
                    if node.extent_len > b {
                        return Err(SuffixientError::DivergentSearch {
                            handle: f as usize,
                            extent: node.extent_len as usize,
                        });
                    }
                    let common = block.common_prefix_len(&node.extent, node.extent_len);
                    if common == node.extent_len {
                        a = node.extent_len;
                    } else {
                        if f == 0 {
                            return Ok(());
                        }
                        b = f - 1;
                    }
                }
                _ => {
                    if f == 0 {
                        return Ok(());
                    }
                    b = f - 1;
                }
            }
        }
    }
}

impl<V: Clone> Default for ZFastTrie<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_exact_lookup() {
        let mut t = ZFastTrie::new();
        t.insert(KeyBlock::from_slice(b"abracad"), 1u32);
        t.insert(KeyBlock::from_slice(b"abra"), 2u32);
        t.insert(KeyBlock::from_slice(b"zz"), 3u32);

        assert_eq!(t.len(), 3);
        assert!(t.contains_prefix(&KeyBlock::from_slice(b"abracadabra")).unwrap());
        assert_eq!(
            t.get_longest_prefix(&KeyBlock::from_slice(b"abracadabra"))
                .unwrap(),
            Some((1u32, 7))
        );
        assert_eq!(
            t.get_prefix(&KeyBlock::from_slice(b"abracadabra")).unwrap(),
            Some(2u32)
        );
    }

    #[test]
    fn test_no_match() {
        let mut t: ZFastTrie<u32> = ZFastTrie::new();
        t.insert(KeyBlock::from_slice(b"hello"), 42);
        assert!(!t.contains_prefix(&KeyBlock::from_slice(b"world")).unwrap());
        assert_eq!(t.get_longest_prefix(&KeyBlock::from_slice(b"world")).unwrap(), None);
    }

    #[test]
    fn test_erase() {
        let mut t = ZFastTrie::new();
        t.insert(KeyBlock::from_slice(b"abra"), 1u32);
        t.insert(KeyBlock::from_slice(b"abc"), 2u32);
        t.erase(KeyBlock::from_slice(b"abra"));
        assert_eq!(t.len(), 1);
        assert_eq!(t.get_longest_prefix(&KeyBlock::from_slice(b"abra")).unwrap(), None);
        assert_eq!(
            t.get_longest_prefix(&KeyBlock::from_slice(b"abc")).unwrap(),
            Some((2u32, 3))
        );
    }

    #[test]
    fn test_sibling_prefix_chain() {
        // "5" alone and "5,9,..." both present: first byte shared, lengths differ.
        let mut t = ZFastTrie::new();
        t.insert(KeyBlock::from_slice(&[5]), 100u32);
        t.insert(KeyBlock::from_slice(&[5, 9, 1]), 200u32);

        let longest = t
            .get_longest_prefix(&KeyBlock::from_slice(&[5, 9, 1, 7]))
            .unwrap();
        assert_eq!(longest, Some((200u32, 3)));

        let shortest = t.get_prefix(&KeyBlock::from_slice(&[5, 9, 1, 7])).unwrap();
        assert_eq!(shortest, Some(100u32));
    }

    #[test]
    fn test_query_shorter_than_stored_extent() {
        // Only a longer key is stored; the query is a strict prefix of it.
        // `getLongestPrefix` must resolve the descendant rather than miss.
        let mut t = ZFastTrie::new();
        t.insert(KeyBlock::from_slice(&[7, 3, 2, 9]), 200u32);

        let longest = t.get_longest_prefix(&KeyBlock::from_slice(&[7, 3])).unwrap();
        assert_eq!(longest, Some((200u32, 2)));
    }
}
