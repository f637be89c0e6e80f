//! Tagged child pointer / leaf encoding (spec §4.2).
//!
//! A child slot in any node is a single 64-bit word: with the high bit
//! set it is an inline leaf carrying a TID in its low 63 bits; otherwise
//! it is a pointer to an internal node. A zero word means "no child".
//! This is the same trick `original_source/ART/N.cpp`'s
//! `isLeaf`/`setLeaf`/`getLeaf` implement; `daemondragon-Trie`'s
//! `Option<NonZeroUsize>` offsets are the disk-relative analogue we
//! generalize away from, since this crate has no on-disk representation.

/// Opaque 63-bit tuple identifier associated with a key.
///
/// The high (64th) bit is reserved for the leaf tag on child pointers;
/// behavior is undefined (checked in debug builds) for a `Tid` that sets
/// it. See spec §3.
pub type Tid = u64;

const LEAF_TAG: u64 = 1 << 63;
const TID_MASK: u64 = LEAF_TAG - 1;

/// A tagged child reference: either an inline leaf TID, a pointer to an
/// internal node, or null (no child).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct NodePtr(u64);

impl NodePtr {
    /// The "no child" sentinel.
    pub const NULL: NodePtr = NodePtr(0);

    #[inline]
    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn is_leaf(self) -> bool {
        self.0 & LEAF_TAG != 0
    }

    /// Encode `tid` as an inline leaf.
    ///
    /// # Panics (debug only)
    /// `tid` must not set the reserved high bit.
    #[inline]
    pub fn from_tid(tid: Tid) -> Self {
        debug_assert!(
            tid & LEAF_TAG == 0,
            "TID {tid:#x} sets the reserved leaf-tag bit"
        );
        NodePtr(tid | LEAF_TAG)
    }

    /// Recover the TID from a leaf pointer.
    ///
    /// # Panics (debug only)
    /// The pointer must be a leaf.
    #[inline]
    pub fn leaf_tid(self) -> Tid {
        debug_assert!(self.is_leaf());
        self.0 & TID_MASK
    }

    /// Wrap a raw pointer to an internal node.
    ///
    /// # Safety
    /// `ptr` must be a live, non-null, 8-byte-aligned pointer to an
    /// internal node allocation; alignment guarantees the low tag bits
    /// used elsewhere in the corpus's tagged-pointer schemes are free,
    /// though this crate only ever consumes bit 63.
    #[inline]
    pub unsafe fn from_node_ptr<T>(ptr: *mut T) -> Self {
        debug_assert!(!ptr.is_null());
        debug_assert_eq!(ptr as u64 & LEAF_TAG, 0, "pointer uses the reserved high bit");
        NodePtr(ptr as u64)
    }

    /// Recover the raw node pointer.
    ///
    /// # Safety
    /// The caller must know (via `is_leaf`/`is_null`) that this word was
    /// constructed with [`NodePtr::from_node_ptr`] for a `T`-typed
    /// allocation.
    #[inline]
    pub unsafe fn as_node_ptr<T>(self) -> *mut T {
        debug_assert!(!self.is_leaf() && !self.is_null());
        self.0 as *mut T
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaf_roundtrip() {
        let p = NodePtr::from_tid(42);
        assert!(p.is_leaf());
        assert!(!p.is_null());
        assert_eq!(p.leaf_tid(), 42);
    }

    #[test]
    fn null_is_not_leaf() {
        assert!(NodePtr::NULL.is_null());
        assert!(!NodePtr::NULL.is_leaf());
    }

    #[test]
    fn node_pointer_roundtrip() {
        let mut x = 7u64;
        let ptr = &mut x as *mut u64;
        let p = unsafe { NodePtr::from_node_ptr(ptr) };
        assert!(!p.is_leaf());
        assert!(!p.is_null());
        assert_eq!(unsafe { p.as_node_ptr::<u64>() }, ptr);
    }

    #[test]
    #[should_panic]
    fn reserved_bit_tid_panics_in_debug() {
        let _ = NodePtr::from_tid(1u64 << 63);
    }
}
