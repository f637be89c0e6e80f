//! The `Tree` façade: lookup, insert, remove, bulk-load, and the
//! height metric (spec §4.6–§4.10).
//!
//! Descent and mutation are expressed as recursive functions over
//! [`NodePtr`] values rather than held `&mut` references into node
//! storage, the way `original_source/ART/N.cpp`'s free functions operate
//! on raw `N*` — a recursive call returns the pointer that should occupy
//! the caller's child slot (unchanged, freshly allocated, or `NULL`), and
//! the caller patches its own slot with [`node::change`] if it differs.
//! This keeps every node access behind the crate's `unsafe` pointer
//! boundary instead of fighting the borrow checker over aliased raw
//! memory.

use crate::error::ArtError;
use crate::key::Key;
use crate::node::{self, NodeHeader, N4, MAX_STORED_PREFIX_LEN};
use crate::pointer::{NodePtr, Tid};

/// An in-memory ordered index mapping byte-string keys to TIDs.
///
/// `F` is the key-reconstruction callback: given a TID previously handed
/// to [`Tree::insert`], it fills `key` with that TID's original bytes.
/// The tree itself never stores full keys once the key diverges from its
/// neighbors — only compressed prefixes — so this callback is how the
/// tree recovers a candidate's true key when it needs one (spec §4.2).
pub struct Tree<F: Fn(Tid, &mut Key)> {
    root: NodePtr,
    key_of: F,
}

impl<F: Fn(Tid, &mut Key)> Tree<F> {
    pub fn new(key_of: F) -> Self {
        Tree {
            root: NodePtr::NULL,
            key_of,
        }
    }

    pub fn lookup(&self, key: &Key) -> Option<Tid> {
        let mut cur = self.root;
        let mut depth = 0usize;
        loop {
            if cur.is_null() {
                return None;
            }
            if cur.is_leaf() {
                let tid = cur.leaf_tid();
                return if self.leaf_matches(tid, key) {
                    Some(tid)
                } else {
                    None
                };
            }
            let header = unsafe { node::header_of(cur) };
            if header.has_prefix() {
                let (mismatch_pos, true_len) =
                    self.check_prefix_mismatch(cur, header, key, depth);
                if mismatch_pos != true_len {
                    return None;
                }
                depth += true_len;
            }
            if depth >= key.len() {
                return None;
            }
            let byte = key.byte_at(depth);
            cur = unsafe { node::get_child(cur, byte) };
            depth += 1;
        }
    }

    pub fn insert(&mut self, key: &Key, tid: Tid) {
        self.root = self.insert_into(self.root, key, 0, tid);
    }

    pub fn remove(&mut self, key: &Key, tid: Tid) -> Result<(), ArtError> {
        if self.root.is_null() {
            return Err(ArtError::NotFound);
        }
        if self.root.is_leaf() {
            return if self.root.leaf_tid() == tid {
                self.root = NodePtr::NULL;
                Ok(())
            } else {
                Err(ArtError::NotFound)
            };
        }
        self.root = self.remove_from(self.root, key, 0, tid, true)?;
        if !self.root.is_leaf() && !self.root.is_null() {
            let count = unsafe { node::header_of(self.root).count() };
            if count == 0 {
                unsafe {
                    node::delete_node(self.root);
                }
                self.root = NodePtr::NULL;
            }
        }
        Ok(())
    }

    pub fn bulkload(&mut self, entries: &[(Key, Tid)]) {
        self.root = crate::bulk::build(entries, 0);
    }

    /// Average number of node-edges crossed from the root to reach each
    /// leaf (the Open Question resolution in SPEC_FULL.md §4/§9).
    pub fn calculate_average_height(&self) -> f64 {
        if self.root.is_null() {
            return 0.0;
        }
        if self.root.is_leaf() {
            return 1.0;
        }
        let mut total_depth = 0u64;
        let mut leaf_count = 0u64;
        unsafe {
            Self::height_rec(self.root, 1, &mut total_depth, &mut leaf_count);
        }
        if leaf_count == 0 {
            0.0
        } else {
            total_depth as f64 / leaf_count as f64
        }
    }

    /// Full in-order traversal: every `(key, tid)` pair in ascending
    /// lexicographic key order. Implements the "range scan (implicit via
    /// ordered traversal)" capability spec §2 calls out.
    pub fn iter(&self) -> Vec<(Key, Tid)> {
        let mut out = Vec::new();
        if self.root.is_null() {
            return out;
        }
        if self.root.is_leaf() {
            let tid = self.root.leaf_tid();
            out.push((self.key_of_tid(tid), tid));
            return out;
        }
        unsafe {
            self.iter_rec(self.root, &mut out);
        }
        out
    }

    fn key_of_tid(&self, tid: Tid) -> Key {
        let mut k = Key::new();
        (self.key_of)(tid, &mut k);
        k
    }

    fn leaf_matches(&self, tid: Tid, key: &Key) -> bool {
        self.key_of_tid(tid).as_bytes() == key.as_bytes()
    }

    unsafe fn iter_rec(&self, node: NodePtr, out: &mut Vec<(Key, Tid)>) {
        let mut kids = Vec::new();
        node::get_children(node, 0, 255, &mut kids);
        for (_, child) in kids {
            if child.is_leaf() {
                let tid = child.leaf_tid();
                out.push((self.key_of_tid(tid), tid));
            } else if !child.is_null() {
                self.iter_rec(child, out);
            }
        }
    }

    unsafe fn height_rec(node: NodePtr, depth: u64, total_depth: &mut u64, leaf_count: &mut u64) {
        let mut kids = Vec::new();
        node::get_children(node, 0, 255, &mut kids);
        for (_, child) in kids {
            if child.is_leaf() {
                *total_depth += depth;
                *leaf_count += 1;
            } else if !child.is_null() {
                Self::height_rec(child, depth + 1, total_depth, leaf_count);
            }
        }
    }

    /// Read the byte at logical prefix position `pos` of the node
    /// starting at `depth`. Positions within [`MAX_STORED_PREFIX_LEN`]
    /// come straight off the header; beyond that, the stored bytes were
    /// never kept, so recover them by restoring the true key of any leaf
    /// in the subtree (they all share this exact prefix) — the
    /// "optimistic" half of path-compressed prefix verification (spec
    /// §4.2, §4.6).
    fn prefix_byte_at(&self, node: NodePtr, header: &NodeHeader, depth: usize, pos: usize) -> u8 {
        if pos < MAX_STORED_PREFIX_LEN {
            header.stored_prefix()[pos]
        } else {
            let tid = unsafe { node::get_any_child_tid(node) };
            self.key_of_tid(tid).byte_at(depth + pos)
        }
    }

    /// Compare `node`'s prefix (starting at `depth`) against `key`.
    /// Returns `(mismatch_pos, true_len)`; `mismatch_pos == true_len`
    /// means the whole prefix matched.
    fn check_prefix_mismatch(
        &self,
        node: NodePtr,
        header: &NodeHeader,
        key: &Key,
        depth: usize,
    ) -> (usize, usize) {
        let true_len = header.prefix_len();
        for i in 0..true_len {
            if depth + i >= key.len() {
                return (i, true_len);
            }
            if self.prefix_byte_at(node, header, depth, i) != key.byte_at(depth + i) {
                return (i, true_len);
            }
        }
        (true_len, true_len)
    }

    /// Shrink `node`'s prefix in place after `consumed` leading bytes
    /// have been split off into a new parent above it.
    unsafe fn truncate_prefix(&self, node: NodePtr, consumed: usize, depth: usize) {
        let header = &mut *node.as_node_ptr::<NodeHeader>();
        let new_true_len = header.prefix_len() - consumed;
        if new_true_len == 0 {
            header.prefix_len = 0;
            return;
        }
        let tid = node::get_any_child_tid(node);
        let representative = self.key_of_tid(tid);
        let take = new_true_len.min(MAX_STORED_PREFIX_LEN);
        let mut buf = [0u8; MAX_STORED_PREFIX_LEN];
        for (i, slot) in buf.iter_mut().enumerate().take(take) {
            *slot = representative.byte_at(depth + consumed + i);
        }
        header.prefix[..take].copy_from_slice(&buf[..take]);
        header.prefix_len = new_true_len as u32;
    }

    fn insert_into(&self, node: NodePtr, key: &Key, mut depth: usize, tid: Tid) -> NodePtr {
        if node.is_null() {
            return NodePtr::from_tid(tid);
        }
        if node.is_leaf() {
            let existing_tid = node.leaf_tid();
            let existing_key = self.key_of_tid(existing_tid);
            if existing_key.as_bytes() == key.as_bytes() {
                // Duplicate key: overwrite (Open Question resolution,
                // SPEC_FULL.md §9).
                return NodePtr::from_tid(tid);
            }
            let mut common = 0usize;
            while depth + common < key.len()
                && depth + common < existing_key.len()
                && key.byte_at(depth + common) == existing_key.byte_at(depth + common)
            {
                common += 1;
            }
            debug_assert!(
                depth + common < key.len() && depth + common < existing_key.len(),
                "one key is a byte-prefix of the other with no terminator; unsupported (§1)"
            );
            let mut split = N4::with_prefix(&key.as_bytes()[depth..depth + common], common as u32);
            let new_byte = key.byte_at(depth + common);
            let old_byte = existing_key.byte_at(depth + common);
            let ok1 = split.insert(new_byte, NodePtr::from_tid(tid));
            let ok2 = split.insert(old_byte, node);
            debug_assert!(ok1 && ok2);
            return unsafe { NodePtr::from_node_ptr(Box::into_raw(split)) };
        }

        let header = unsafe { node::header_of(node) };
        if header.has_prefix() {
            let (mismatch_pos, true_len) = self.check_prefix_mismatch(node, header, key, depth);
            if mismatch_pos != true_len {
                debug_assert!(
                    depth + mismatch_pos < key.len(),
                    "key ends inside an existing node's prefix; one key is a byte-prefix of \
                     another with no terminator, unsupported (§1)"
                );
                let mut split =
                    N4::with_prefix(&key.as_bytes()[depth..depth + mismatch_pos], mismatch_pos as u32);
                let new_byte = key.byte_at(depth + mismatch_pos);
                let old_byte = self.prefix_byte_at(node, header, depth, mismatch_pos);
                let ok1 = split.insert(new_byte, NodePtr::from_tid(tid));
                unsafe {
                    self.truncate_prefix(node, mismatch_pos + 1, depth);
                }
                let ok2 = split.insert(old_byte, node);
                debug_assert!(ok1 && ok2);
                return unsafe { NodePtr::from_node_ptr(Box::into_raw(split)) };
            }
            depth += true_len;
        }

        debug_assert!(
            depth < key.len(),
            "key is a byte-prefix of an existing longer key; unsupported (§1)"
        );
        let byte = key.byte_at(depth);
        let child = unsafe { node::get_child(node, byte) };
        if child.is_null() {
            if let Some(replacement) = unsafe { node::insert_a(node, byte, NodePtr::from_tid(tid)) } {
                return replacement;
            }
            return node;
        }
        let new_child = self.insert_into(child, key, depth + 1, tid);
        if new_child != child {
            unsafe {
                node::change(node, byte, new_child);
            }
        }
        node
    }

    fn remove_from(
        &self,
        node: NodePtr,
        key: &Key,
        mut depth: usize,
        tid: Tid,
        at_root: bool,
    ) -> Result<NodePtr, ArtError> {
        let header = unsafe { node::header_of(node) };
        if header.has_prefix() {
            let (mismatch_pos, true_len) = self.check_prefix_mismatch(node, header, key, depth);
            if mismatch_pos != true_len {
                return Err(ArtError::NotFound);
            }
            depth += true_len;
        }
        if depth >= key.len() {
            return Err(ArtError::NotFound);
        }
        let byte = key.byte_at(depth);
        let child = unsafe { node::get_child(node, byte) };
        if child.is_null() {
            return Err(ArtError::NotFound);
        }
        if child.is_leaf() {
            if child.leaf_tid() != tid {
                return Err(ArtError::NotFound);
            }
            let replacement = unsafe { node::remove_a(node, byte, at_root) };
            let current = replacement.unwrap_or(node);
            return Ok(self.maybe_collapse(current, at_root));
        }
        let new_child = self.remove_from(child, key, depth + 1, tid, false)?;
        if new_child != child {
            unsafe {
                node::change(node, byte, new_child);
            }
        }
        Ok(node)
    }

    /// If `node` (never the root) now has exactly one child, fold it away:
    /// the sole child takes `node`'s slot directly, with `node`'s prefix
    /// and the connecting byte folded into the child's prefix (spec §4.8).
    fn maybe_collapse(&self, node: NodePtr, at_root: bool) -> NodePtr {
        if at_root {
            return node;
        }
        let count = unsafe { node::header_of(node).count() };
        if count != 1 {
            return node;
        }
        let (byte, child) = unsafe { node::get_sole_child(node) };
        if !child.is_leaf() {
            let node_header = unsafe { node::header_of(node) };
            let child_header = unsafe { &mut *child.as_node_ptr::<NodeHeader>() };
            child_header.add_prefix_before(node_header, byte);
        }
        unsafe {
            node::delete_node(node);
        }
        child
    }
}

impl<F: Fn(Tid, &mut Key)> Drop for Tree<F> {
    fn drop(&mut self) {
        if self.root.is_null() || self.root.is_leaf() {
            return;
        }
        unsafe {
            node::delete_children(self.root);
            node::delete_node(self.root);
        }
    }
}
