//! N48: a 256-entry byte→slot index over a 48-entry child array.
//!
//! Indirect addressing keeps the child array itself dense (48 pointers)
//! while still supporting O(1) point lookup through the 256-byte index,
//! at the cost of the index memory — the classic ART middle tier (spec
//! §3).

use super::{NodeHeader, NodeKind, N16, N256};
use crate::pointer::NodePtr;

const SENTINEL: u8 = u8::MAX;

#[repr(C)]
pub(crate) struct N48 {
    pub header: NodeHeader,
    index: [u8; 256],
    children: [NodePtr; N48::CAPACITY],
}

impl N48 {
    pub const CAPACITY: usize = 48;
    pub const SHRINK_THRESHOLD: usize = 12;

    pub fn with_prefix(prefix: &[u8], prefix_len: u32) -> Box<Self> {
        let mut header = NodeHeader::new(NodeKind::N48);
        header.set_prefix(prefix, prefix_len);
        Box::new(N48 {
            header,
            index: [SENTINEL; 256],
            children: [NodePtr::NULL; Self::CAPACITY],
        })
    }

    pub fn get_child(&self, byte: u8) -> NodePtr {
        let slot = self.index[byte as usize];
        if slot == SENTINEL {
            NodePtr::NULL
        } else {
            self.children[slot as usize]
        }
    }

    pub fn insert(&mut self, byte: u8, child: NodePtr) -> bool {
        if self.header.count() >= Self::CAPACITY {
            return false;
        }
        debug_assert_eq!(self.index[byte as usize], SENTINEL);
        let mut used = [false; Self::CAPACITY];
        for &slot in self.index.iter() {
            if slot != SENTINEL {
                used[slot as usize] = true;
            }
        }
        let free = used
            .iter()
            .position(|&taken| !taken)
            .expect("no free N48 slot despite count < CAPACITY");
        self.children[free] = child;
        self.index[byte as usize] = free as u8;
        self.header.count += 1;
        true
    }

    pub fn change(&mut self, byte: u8, child: NodePtr) {
        let slot = self.index[byte as usize];
        debug_assert_ne!(slot, SENTINEL, "change() on a byte not present in N48");
        self.children[slot as usize] = child;
    }

    /// Returns `true` if the node is still viable at this size, `false`
    /// if the caller must shrink to N16.
    pub fn remove(&mut self, byte: u8, at_root: bool) -> bool {
        let slot = self.index[byte as usize];
        debug_assert_ne!(slot, SENTINEL, "remove() on a byte not present in N48");
        self.children[slot as usize] = NodePtr::NULL;
        self.index[byte as usize] = SENTINEL;
        self.header.count -= 1;
        at_root || self.header.count() > Self::SHRINK_THRESHOLD
    }

    pub fn get_any_child(&self) -> NodePtr {
        debug_assert!(self.header.count() > 0);
        let mut fallback = NodePtr::NULL;
        for &slot in self.index.iter() {
            if slot == SENTINEL {
                continue;
            }
            let child = self.children[slot as usize];
            if !child.is_leaf() {
                return child;
            }
            if fallback.is_null() {
                fallback = child;
            }
        }
        fallback
    }

    pub fn get_children(&self, start: u8, end: u8, out: &mut Vec<(u8, NodePtr)>) {
        for byte in start..=end {
            let slot = self.index[byte as usize];
            if slot != SENTINEL {
                out.push((byte, self.children[slot as usize]));
            }
        }
    }

    pub fn copy_to_n16(&self, dst: &mut N16) {
        let mut kids = Vec::new();
        self.get_children(0, 255, &mut kids);
        for (byte, child) in kids {
            let ok = dst.insert(byte, child);
            debug_assert!(ok);
        }
    }

    pub fn copy_to_n256(&self, dst: &mut N256) {
        let mut kids = Vec::new();
        self.get_children(0, 255, &mut kids);
        for (byte, child) in kids {
            let ok = dst.insert(byte, child);
            debug_assert!(ok);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(tid: u64) -> NodePtr {
        NodePtr::from_tid(tid)
    }

    #[test]
    fn insert_picks_lowest_free_slot_and_supports_48() {
        let mut n = N48::with_prefix(&[], 0);
        for b in 0..48u8 {
            assert!(n.insert(b, leaf(b as u64)));
        }
        assert!(!n.insert(200, leaf(1)));
        for b in 0..48u8 {
            assert_eq!(n.get_child(b), leaf(b as u64));
        }
    }

    #[test]
    fn remove_frees_slot_for_reuse() {
        let mut n = N48::with_prefix(&[], 0);
        n.insert(10, leaf(1));
        n.insert(20, leaf(2));
        assert!(n.remove(10, true));
        assert_eq!(n.get_child(10), NodePtr::NULL);
        assert!(n.insert(30, leaf(3)));
        assert_eq!(n.get_child(30), leaf(3));
    }

    #[test]
    fn shrink_threshold_triggers_at_twelve() {
        let mut n = N48::with_prefix(&[], 0);
        for b in 0..13u8 {
            n.insert(b, leaf(b as u64));
        }
        assert!(n.remove(0, false));
        assert!(!n.remove(1, false));
    }
}
