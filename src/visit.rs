//! Ordered traversal. A node's records are already key-ordered by the
//! crit-bit invariant — comparing keys by their first differing byte, then
//! within that byte by bit significance, is exactly standard big-endian
//! byte-string order, so `reps[0] < reps[1] < ...` always holds. A plain
//! walk of each node's records in (or reverse) index order, recursing into
//! packed children in place, therefore visits every key in sorted order
//! with no separate comparison step beyond an optional `from` bound.

use crate::arena::Allocator;
use crate::codec::{Helper, KvTrans};
use crate::tree::SignatureTree;

/// What a [`SignatureTree::visit_del`](crate::tree::SignatureTree::visit_del)
/// callback wants done with the key it was just shown, and whether to keep
/// visiting afterwards. Deletions are applied once the walk completes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum VisitDecision {
    /// Leave the key alone and keep visiting.
    Keep,
    /// Leave the key alone and stop visiting.
    Stop,
    /// Delete the key and keep visiting.
    Delete,
    /// Delete the key and stop visiting.
    DeleteAndStop,
}

impl VisitDecision {
    fn wants_delete(self) -> bool {
        matches!(self, VisitDecision::Delete | VisitDecision::DeleteAndStop)
    }

    fn wants_stop(self) -> bool {
        matches!(self, VisitDecision::Stop | VisitDecision::DeleteAndStop)
    }
}

/// Depth-first walk of `offset`'s subtree in key order (or reverse).
/// Returns `false` once `f` has asked to stop, so callers can unwind
/// without visiting the rest of the tree.
fn walk<H: Helper, A: Allocator>(
    tree: &SignatureTree<H, A>,
    offset: usize,
    from: Option<&[u8]>,
    forward: bool,
    f: &mut impl FnMut(&[u8], &[u8]) -> bool,
) -> bool {
    let size = tree.node(offset).size();
    if size == 0 {
        return true;
    }

    let indices: Box<dyn Iterator<Item = usize>> = if forward {
        Box::new(0..size)
    } else {
        Box::new((0..size).rev())
    };

    for idx in indices {
        let rep = tree.node(offset).reps[idx];
        if tree.helper().is_packed(rep) {
            let child = tree.helper().unpack(rep);
            if !walk(tree, child, from, forward, f) {
                return false;
            }
        } else {
            let trans = tree.helper().trans(rep);
            if let Some(from_key) = from {
                let before_start = if forward {
                    trans.key() < from_key
                } else {
                    trans.key() > from_key
                };
                if before_start {
                    continue;
                }
            }
            let mut value = Vec::new();
            trans.get(trans.key(), &mut value);
            if !f(trans.key(), &value) {
                return false;
            }
        }
    }
    true
}

pub(crate) fn visit<H: Helper, A: Allocator>(
    tree: &SignatureTree<H, A>,
    from: Option<&[u8]>,
    forward: bool,
    mut f: impl FnMut(&[u8], &[u8]) -> bool,
) {
    walk(tree, tree.root_offset(), from, forward, &mut f);
}

pub(crate) fn visit_del<H: Helper, A: Allocator>(
    tree: &mut SignatureTree<H, A>,
    from: Option<&[u8]>,
    forward: bool,
    mut f: impl FnMut(&[u8], &[u8]) -> VisitDecision,
) {
    let mut to_delete: Vec<Vec<u8>> = Vec::new();
    let mut stop = false;
    {
        let mut shim = |k: &[u8], v: &[u8]| -> bool {
            if stop {
                return false;
            }
            let decision = f(k, v);
            if decision.wants_delete() {
                to_delete.push(k.to_vec());
            }
            if decision.wants_stop() {
                stop = true;
                return false;
            }
            true
        };
        walk(tree, tree.root_offset(), from, forward, &mut shim);
    }
    for key in to_delete {
        tree.del(&key);
    }
}
