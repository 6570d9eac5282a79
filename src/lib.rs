//! An ordered, page-resident, critical-bit trie index.
//!
//! A [`SignatureTree`](tree::SignatureTree) maps variable-length byte keys
//! to opaque fixed-width records, stored across fixed-size pages supplied
//! by an [`Allocator`](arena::Allocator) (an in-process heap buffer, or an
//! mmap'd file behind the `mmap` feature). Records are ordered by their
//! critical bit — the highest differing bit between two keys — rather
//! than compared byte-by-byte at lookup time, and each page answers
//! "which critical bit splits my records first" via an 8-ary tournament
//! tree ([`pyramid`]) instead of a linear scan.
//!
//! # Module overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`tree`] | `SignatureTree`: the public façade (`get`, `add`, `del`, `size`, `visit`, `rebuild`, `compact`) |
//! | [`node`] | Page layout: records, diffs, and the gap-shifting insert/remove primitives |
//! | [`pyramid`] | The in-node range-minimum-query structure over a page's diffs |
//! | [`descent`] | Bit-critical descent: locating the slot a key belongs at within one node |
//! | [`insert`] | Combat-Insert: deriving a new critical bit and walking it into place |
//! | [`maintenance`] | Node split (on a full insert), merge (after a delete shrinks a child), and compact |
//! | [`rebuild`] | Offline balanced reconstruction into a second tree |
//! | [`visit`] | Ordered (forward/backward) traversal, with or without deletion |
//! | [`codec`] | Record (`Rep`/`Diff`) encoding and the `Helper`/`KvTrans` collaborator traits |
//! | [`arena`] | The page-allocator contract and its heap/mmap implementations |
//! | [`helper`] | A reference `Helper`/`KvTrans` pair used by the test suite and benchmarks |
//! | [`error`] | Error types crossing the public API boundary |
//!
//! # Example
//!
//! ```
//! use sig_tree::arena::HeapArena;
//! use sig_tree::helper::BytesHelper;
//! use sig_tree::tree::SignatureTree;
//!
//! let arena = HeapArena::with_capacity(16);
//! let mut tree = SignatureTree::new(BytesHelper::new(), arena).unwrap();
//!
//! tree.add(b"hello", b"world").unwrap();
//! assert_eq!(tree.get(b"hello"), Some(b"world".to_vec()));
//! assert_eq!(tree.size(), 1);
//!
//! assert!(tree.del(b"hello"));
//! assert_eq!(tree.get(b"hello"), None);
//! ```

pub mod arena;
pub mod codec;
pub mod descent;
pub mod error;
pub mod helper;
pub mod insert;
pub mod maintenance;
pub mod node;
pub mod pyramid;
pub mod rebuild;
pub mod tree;
pub mod visit;
