//! Sorted bulk-load (spec §4.9): build a subtree directly from sorted,
//! deduplicated `(Key, Tid)` pairs in one top-down pass, instead of
//! inserting one key at a time. Unlike incremental `insert`, every key is
//! already fully known here, so there is no need for the key-reconstruction
//! callback or optimistic prefix verification.

use crate::key::Key;
use crate::node::{N16, N256, N4, N48};
use crate::pointer::{NodePtr, Tid};

pub(crate) fn build(entries: &[(Key, Tid)], depth: usize) -> NodePtr {
    debug_assert!(
        entries.windows(2).all(|w| w[0].0 < w[1].0),
        "bulkload input must be sorted ascending with no duplicate keys (§7)"
    );

    if entries.is_empty() {
        return NodePtr::NULL;
    }
    if entries.len() == 1 {
        return NodePtr::from_tid(entries[0].1);
    }

    let first = &entries[0].0;
    let last = &entries[entries.len() - 1].0;
    let mut common = 0usize;
    while depth + common < first.len()
        && depth + common < last.len()
        && first.byte_at(depth + common) == last.byte_at(depth + common)
    {
        common += 1;
    }
    let split_at = depth + common;

    // Partition the (already sorted) slice into contiguous runs sharing
    // the same byte at `split_at`.
    let mut runs: Vec<(u8, usize, usize)> = Vec::new();
    let mut i = 0;
    while i < entries.len() {
        debug_assert!(
            split_at < entries[i].0.len(),
            "one bulkload key is a byte-prefix of another; unsupported (§1)"
        );
        let byte = entries[i].0.byte_at(split_at);
        let start = i;
        while i < entries.len() && entries[i].0.byte_at(split_at) == byte {
            i += 1;
        }
        runs.push((byte, start, i));
    }

    let prefix_bytes = &first.as_bytes()[depth..split_at];
    let children: Vec<(u8, NodePtr)> = runs
        .into_iter()
        .map(|(byte, start, end)| (byte, build(&entries[start..end], split_at + 1)))
        .collect();

    make_node(prefix_bytes, common as u32, children)
}

fn make_node(prefix: &[u8], prefix_len: u32, children: Vec<(u8, NodePtr)>) -> NodePtr {
    unsafe {
        if children.len() <= N4::CAPACITY {
            let mut node = N4::with_prefix(prefix, prefix_len);
            for (byte, child) in children {
                let ok = node.insert(byte, child);
                debug_assert!(ok);
            }
            NodePtr::from_node_ptr(Box::into_raw(node))
        } else if children.len() <= N16::CAPACITY {
            let mut node = N16::with_prefix(prefix, prefix_len);
            for (byte, child) in children {
                let ok = node.insert(byte, child);
                debug_assert!(ok);
            }
            NodePtr::from_node_ptr(Box::into_raw(node))
        } else if children.len() <= N48::CAPACITY {
            let mut node = N48::with_prefix(prefix, prefix_len);
            for (byte, child) in children {
                let ok = node.insert(byte, child);
                debug_assert!(ok);
            }
            NodePtr::from_node_ptr(Box::into_raw(node))
        } else {
            let mut node = N256::with_prefix(prefix, prefix_len);
            for (byte, child) in children {
                let ok = node.insert(byte, child);
                debug_assert!(ok);
            }
            NodePtr::from_node_ptr(Box::into_raw(node))
        }
    }
}
