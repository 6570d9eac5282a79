//! The public façade: [`SignatureTree`] ties a page [`Allocator`] to a
//! [`Helper`] and exposes the ordered key/value operations. The
//! tree-shape-changing algorithms (combat-insert, split/merge/compact,
//! rebuild, ordered visit) each live in their own module as an `impl`
//! block over this type, mirroring how the reference implementation
//! spread one class's methods across several translation units.

use crate::arena::Allocator;
use crate::codec::{Helper, MAX_KEY_LENGTH};
use crate::descent::find_best_match;
use crate::error::SigTreeError;
use crate::node::Node;

/// An ordered, page-resident crit-bit index over opaque fixed-width
/// records.
///
/// `H` translates leaf records to/from keys and values and tags packed
/// child pointers; `A` supplies the fixed-size pages a tree's nodes live
/// in. Neither type is boxed or dynamically dispatched: the hot
/// node-walking code is monomorphic over both.
pub struct SignatureTree<H: Helper, A: Allocator> {
    helper: H,
    allocator: A,
    root_offset: usize,
}

impl<H: Helper, A: Allocator> SignatureTree<H, A> {
    /// Build an empty tree, allocating its root page from `allocator`.
    pub fn new(helper: H, mut allocator: A) -> Result<Self, SigTreeError> {
        let root_offset = Self::allocate_with_retry(&mut allocator)?;
        let tree = Self {
            helper,
            allocator,
            root_offset,
        };
        *tree.node_mut(root_offset) = Node::empty();
        Ok(tree)
    }

    /// Offset of the tree's root page within its arena.
    pub fn root_offset(&self) -> usize {
        self.root_offset
    }

    pub(crate) fn allocator(&self) -> &A {
        &self.allocator
    }

    pub(crate) fn allocator_mut(&mut self) -> &mut A {
        &mut self.allocator
    }

    pub(crate) fn helper(&self) -> &H {
        &self.helper
    }

    pub(crate) fn helper_mut(&mut self) -> &mut H {
        &mut self.helper
    }

    pub(crate) fn set_root_offset(&mut self, offset: usize) {
        self.root_offset = offset;
    }

    /// Raw pointer to the node living at `offset` within this tree's arena.
    fn node_ptr(&self, offset: usize) -> *mut Node {
        unsafe { self.allocator.base().add(offset) as *mut Node }
    }

    /// Shared view of the node at `offset`.
    pub(crate) fn node(&self, offset: usize) -> &Node {
        unsafe { &*self.node_ptr(offset) }
    }

    /// Mutable view of the node at `offset`.
    ///
    /// Takes `&self`, not `&mut self`: every node lives behind the
    /// allocator's base pointer rather than behind a Rust-owned value, so
    /// the tree (like the arena underneath it) manages access to a page
    /// itself instead of letting the borrow checker do it. Callers within
    /// this crate must not hold two `&mut Node` borrows over the same
    /// offset at once, and must not call an `&mut self` method (`grow`,
    /// `allocate_page`) while a `&mut Node` derived from `&self` is still
    /// in use.
    #[allow(clippy::mut_from_ref)]
    pub(crate) fn node_mut(&self, offset: usize) -> &mut Node {
        unsafe { &mut *self.node_ptr(offset) }
    }

    /// Allocate a page, growing the arena once and retrying if it was full.
    pub(crate) fn allocate_with_retry(allocator: &mut A) -> Result<usize, SigTreeError> {
        match allocator.allocate_page() {
            Ok(offset) => Ok(offset),
            Err(_) => {
                allocator.grow()?;
                Ok(allocator.allocate_page()?)
            }
        }
    }

    /// Look up `k`, returning its most recently stored value if present.
    pub fn get(&self, k: &[u8]) -> Option<Vec<u8>> {
        let mut offset = self.root_offset;
        if self.node(offset).size() == 0 {
            return None;
        }
        loop {
            let node = self.node_mut(offset);
            let m = find_best_match(node, k);
            let rep = node.reps[m.idx + m.direct as usize];
            if self.helper.is_packed(rep) {
                offset = self.helper.unpack(rep);
            } else {
                let trans = self.helper.trans(rep);
                let mut out = Vec::new();
                return if trans.get(k, &mut out) { Some(out) } else { None };
            }
        }
    }

    /// Number of live keys, computed by a full traversal of the tree.
    pub fn size(&self) -> usize {
        self.size_sub(self.root_offset)
    }

    fn size_sub(&self, offset: usize) -> usize {
        let node = self.node(offset);
        let mut count = 0;
        for i in 0..node.size() {
            let rep = node.reps[i];
            if self.helper.is_packed(rep) {
                count += self.size_sub(self.helper.unpack(rep));
            } else {
                count += 1;
            }
        }
        count
    }

    /// Insert `k`/`v`, returning whether a new key was added (`false` if
    /// `k` was already present and unchanged).
    pub fn add(&mut self, k: &[u8], v: &[u8]) -> Result<bool, SigTreeError> {
        if k.len() > MAX_KEY_LENGTH {
            return Err(SigTreeError::KeyTooLong {
                len: k.len(),
                max: MAX_KEY_LENGTH,
            });
        }

        let offset = self.root_offset;
        if self.node(offset).size() == 0 {
            let rep = self.helper.add(k, v);
            self.node_mut(offset).insert_at(0, 0, 0, rep);
            return Ok(true);
        }

        let mut cursor = offset;
        loop {
            let node = self.node_mut(cursor);
            let m = find_best_match(node, k);
            let rep = node.reps[m.idx + m.direct as usize];
            if self.helper.is_packed(rep) {
                cursor = self.helper.unpack(rep);
            } else {
                let trans = self.helper.trans(rep);
                if trans.key_eq(k) {
                    return Ok(false);
                }
                let opponent = trans.key().to_vec();
                crate::insert::combat_insert(self, &opponent, k, v, cursor, m.idx, m.direct)?;
                return Ok(true);
            }
        }
    }

    /// Remove `k`, returning whether it was present.
    pub fn del(&mut self, k: &[u8]) -> bool {
        let offset = self.root_offset;
        if self.node(offset).size() == 0 {
            return false;
        }

        let mut cursor = offset;
        let mut parent: Option<(usize, usize, bool, usize)> = None;

        loop {
            let node = self.node_mut(cursor);
            let m = find_best_match(node, k);
            let rep = node.reps[m.idx + m.direct as usize];

            if self.helper.is_packed(rep) {
                parent = Some((cursor, m.idx, m.direct, m.size));
                cursor = self.helper.unpack(rep);
                continue;
            }

            let trans = self.helper.trans(rep);
            if !trans.key_eq(k) {
                return false;
            }
            self.helper.del(trans);
            let node = self.node_mut(cursor);
            node.remove_at(m.idx, m.idx + m.direct as usize);
            let new_size = m.size - 1;

            if let Some((parent_offset, parent_idx, parent_direct, parent_size)) = parent {
                if crate::node::REP_RANK - parent_size + 1 >= new_size {
                    crate::maintenance::merge(
                        self,
                        parent_offset,
                        parent_idx,
                        parent_direct,
                        parent_size,
                        cursor,
                        new_size,
                    );
                }
            } else if new_size == 1 {
                let sole = self.node(cursor).reps[0];
                if self.helper.is_packed(sole) {
                    let child_offset = self.helper.unpack(sole);
                    let child_size = self.node(child_offset).size();
                    crate::maintenance::merge(self, cursor, 0, false, 1, child_offset, child_size);
                }
            }
            return true;
        }
    }

    /// Recursively fold any child that now fits entirely within its parent
    /// back into it. Unlike the merge check `del` performs inline (which
    /// only looks at the one child just edited), this walks the whole tree.
    pub fn compact(&mut self) {
        crate::maintenance::compact(self, self.root_offset);
    }

    /// Rebuild this tree into `dest`, producing a balanced layout with no
    /// wasted space from historical splits and merges. `dest` must be a
    /// distinct tree with its own arena; its existing contents are
    /// discarded.
    pub fn rebuild(&self, dest: &mut SignatureTree<H, A>) -> Result<(), SigTreeError> {
        crate::rebuild::rebuild(self, dest)
    }

    /// Visit every key in `[from, ..)` (or `(.., from]` when
    /// `forward` is false) in crit-bit order, calling `f` with each key and
    /// value until it returns `false` or keys are exhausted.
    pub fn visit(&self, from: Option<&[u8]>, forward: bool, f: impl FnMut(&[u8], &[u8]) -> bool) {
        crate::visit::visit(self, from, forward, f)
    }

    /// Like [`visit`](Self::visit), but `f` may additionally mark the
    /// current key for deletion; the cursor remains valid across the edit.
    pub fn visit_del(
        &mut self,
        from: Option<&[u8]>,
        forward: bool,
        f: impl FnMut(&[u8], &[u8]) -> crate::visit::VisitDecision,
    ) {
        crate::visit::visit_del(self, from, forward, f)
    }
}
