//! An in-memory ordered index implemented as an Adaptive Radix Tree
//! (ART): variable-length byte keys mapped to 63-bit TIDs, with four
//! adaptively-sized node layouts, path compression, and optimistic
//! prefix verification via a caller-supplied key-reconstruction
//! callback.
//!
//! The core is single-threaded and carries no concurrency control, no
//! persistence, and no MVCC (see spec §1/§5) — callers needing any of
//! those build them on top, the way `original_source`'s synchronized
//! variant layers locking above this same node design.
//!
//! ```
//! use art::{Key, Tree};
//! use std::cell::RefCell;
//!
//! let store: RefCell<Vec<(Key, u64)>> = RefCell::new(Vec::new());
//! let mut tree = Tree::new(|tid, key: &mut Key| {
//!     let entries = store.borrow();
//!     let (k, _) = entries.iter().find(|(_, t)| *t == tid).unwrap();
//!     key.set(k.as_bytes());
//! });
//!
//! let key = Key::from(42u64);
//! store.borrow_mut().push((key.clone(), 1));
//! tree.insert(&key, 1);
//! assert_eq!(tree.lookup(&key), Some(1));
//! ```

mod bulk;
mod error;
mod key;
mod node;
mod pointer;
mod tree;

pub use error::ArtError;
pub use key::{Key, KEY_INLINE_CAP};
pub use node::MAX_STORED_PREFIX_LEN;
pub use pointer::Tid;
pub use tree::Tree;
