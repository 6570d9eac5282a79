//! Node-shape maintenance: splitting a full node before an insert can land
//! in it, merging a shrunk child back into its parent after a delete, and
//! compacting a whole subtree by repeating that merge wherever it now fits.

use crate::arena::Allocator;
use crate::codec::Helper;
use crate::node::{Node, RANK, REP_RANK};
use crate::tree::SignatureTree;

/// Make room in a full node by moving some of its content elsewhere.
///
/// First choice: find a monotone run of diffs next to an existing,
/// non-full child and slide it (with its bordering records) onto that
/// child's near end — no new page required. Failing that, allocate a
/// fresh page and bisect the node near its middle (via the pyramid, so
/// the split point is always a real minimum, not an arbitrary cut).
pub(crate) fn split<H: Helper, A: Allocator>(
    tree: &mut SignatureTree<H, A>,
    parent_offset: usize,
) -> Result<(), crate::error::SigTreeError> {
    if try_split_into_adjacent_child(tree, parent_offset) {
        return Ok(());
    }

    let child_offset = SignatureTree::<H, A>::allocate_with_retry(tree.allocator_mut())?;
    *tree.node_mut(child_offset) = Node::empty();

    let parent = tree.node_mut(parent_offset);
    parent.ensure_pyramid();
    let size = parent.size();
    let mut lo = 0usize;
    let mut hi = size - 1;
    loop {
        let (min_idx, _) = parent.pyramid.min_at(&parent.diffs, lo, hi);
        if min_idx - lo <= hi - min_idx {
            lo = min_idx + 1;
        } else {
            hi = min_idx;
        }
        if hi - lo <= RANK / 2 {
            break;
        }
    }
    let nth = lo;
    let item_num = hi - lo;

    let child = tree.node_mut(child_offset);
    child.diffs[..item_num].copy_from_slice(&parent.diffs[nth..nth + item_num]);
    child.reps[..item_num + 1].copy_from_slice(&parent.reps[nth..nth + item_num + 1]);
    child.size = (item_num + 1) as u32;
    child.dirty = true;

    parent.diffs.copy_within(nth + item_num..size - 1, nth);
    parent.reps.copy_within(nth + item_num + 1..size, nth + 1);
    parent.reps[nth] = tree.helper().pack(child_offset);
    parent.size -= item_num as u32;
    parent.dirty = true;

    Ok(())
}

/// Try to slide a monotone diff run bordering a packed, non-full child
/// onto that child's near end. Returns whether a run was moved.
fn try_split_into_adjacent_child<H: Helper, A: Allocator>(
    tree: &mut SignatureTree<H, A>,
    parent_offset: usize,
) -> bool {
    let parent_size = tree.node(parent_offset).size();

    for i in 0..parent_size {
        let rep = tree.node(parent_offset).reps[i];
        if !tree.helper().is_packed(rep) {
            continue;
        }
        let child_offset = tree.helper().unpack(rep);
        if tree.node(child_offset).is_full() {
            continue;
        }
        let child_size = tree.node(child_offset).size();

        let parent = tree.node(parent_offset);
        let is_left_run = i == 0 || (i != parent_size - 1 && parent.diffs[i - 1] < parent.diffs[i]);

        if is_left_run {
            let mut j = i + 1;
            while j < parent_size - 1 && parent.diffs[j] >= parent.diffs[i] {
                j += 1;
            }
            let range = j - i;
            if child_size + range > REP_RANK {
                continue;
            }

            let parent = tree.node_mut(parent_offset);
            let moved_diffs: Vec<_> = parent.diffs[i..i + range].to_vec();
            let moved_reps: Vec<_> = parent.reps[i + 1..i + 1 + range].to_vec();

            let child = tree.node_mut(child_offset);
            child.diffs[child_size - 1..child_size - 1 + range].copy_from_slice(&moved_diffs);
            child.reps[child_size..child_size + range].copy_from_slice(&moved_reps);
            child.size += range as u32;
            child.dirty = true;

            let parent = tree.node_mut(parent_offset);
            parent.diffs.copy_within(i + range..parent_size - 1, i);
            parent.reps.copy_within(i + 1 + range..parent_size, i + 1);
            parent.size -= range as u32;
            parent.dirty = true;
            return true;
        } else {
            let mut j = i - 1;
            while j != 0 && !(parent.diffs[j - 1] < parent.diffs[i - 1]) {
                j -= 1;
            }
            let range = i - j;
            if child_size + range > REP_RANK {
                continue;
            }

            let parent = tree.node_mut(parent_offset);
            let moved_diffs: Vec<_> = parent.diffs[j..j + range].to_vec();
            let moved_reps: Vec<_> = parent.reps[j..j + range].to_vec();

            let child = tree.node_mut(child_offset);
            child.diffs.copy_within(0..child_size - 1, range);
            child.reps.copy_within(0..child_size, range);
            child.diffs[..range].copy_from_slice(&moved_diffs);
            child.reps[..range].copy_from_slice(&moved_reps);
            child.size += range as u32;
            child.dirty = true;

            let parent = tree.node_mut(parent_offset);
            parent.diffs.copy_within(j + range..parent_size - 1, j);
            parent.reps.copy_within(j + range..parent_size, j);
            parent.size -= range as u32;
            parent.dirty = true;
            return true;
        }
    }

    false
}

/// Fold `child` (now `child_size` records, found at `parent.reps[parent_idx
/// + parent_direct]`) back into `parent`, replacing the packed pointer with
/// the child's own records and diffs. Caller must have already checked
/// `child_size` fits in the room the packed pointer's removal frees up.
pub(crate) fn merge<H: Helper, A: Allocator>(
    tree: &mut SignatureTree<H, A>,
    parent_offset: usize,
    parent_idx: usize,
    parent_direct: bool,
    parent_size: usize,
    child_offset: usize,
    child_size: usize,
) {
    let rep_idx = parent_idx + parent_direct as usize;
    let child = *tree.node(child_offset);

    let parent = tree.node_mut(parent_offset);
    // The packed pointer's border diffs (at `rep_idx - 1` and `rep_idx`, each
    // only if it exists) still correctly separate whatever comes before/after
    // the child's subtree once it's inlined, so they are left in place; only
    // the pointer's own slot and everything after it shifts right to make
    // room for the child's `child_size - 1` internal diffs and `child_size`
    // reps. Shift the tail (which starts with the right border diff, if any)
    // before overwriting its old home with the child's diffs.
    parent.reps.copy_within(rep_idx + 1..parent_size, rep_idx + child_size);
    parent
        .diffs
        .copy_within(rep_idx..parent_size - 1, rep_idx + child_size - 1);

    parent.diffs[rep_idx..rep_idx + child_size - 1].copy_from_slice(&child.diffs[..child_size - 1]);
    parent.reps[rep_idx..rep_idx + child_size].copy_from_slice(&child.reps[..child_size]);

    parent.size = (parent_size + child_size - 1) as u32;
    parent.dirty = true;

    tree.allocator_mut().free_page(child_offset);
}

/// Recursively merge any child of the subtree rooted at `offset` that now
/// fits entirely within its parent. Post-order: children are compacted
/// before the merge decision over them is made, so a grandchild folded
/// into a child can itself then fit into the grandparent in the same pass.
pub(crate) fn compact<H: Helper, A: Allocator>(tree: &mut SignatureTree<H, A>, offset: usize) {
    let mut i = 0;
    while i < tree.node(offset).size() {
        let rep = tree.node(offset).reps[i];
        if !tree.helper().is_packed(rep) {
            i += 1;
            continue;
        }

        let child_offset = tree.helper().unpack(rep);
        compact(tree, child_offset);

        let parent_size = tree.node(offset).size();
        let child_size = tree.node(child_offset).size();
        if REP_RANK - parent_size + 1 >= child_size {
            merge_at_rep_index(tree, offset, i, parent_size, child_offset, child_size);
            // The merge replaced this one packed rep with `child_size`
            // records starting at the same position; re-examine position
            // `i` rather than advancing, since a grandchild that didn't fit
            // into the old (smaller) child might now fit into the enlarged
            // parent.
        } else {
            i += 1;
        }
    }
}

/// `merge`, addressed by the absolute record index of the packed pointer
/// (rather than the `(idx, direct)` pair a descent naturally produces).
/// The diff bordering record `i` is `diffs[i]` unless `i` is the node's
/// last record, in which case it is `diffs[i - 1]`.
fn merge_at_rep_index<H: Helper, A: Allocator>(
    tree: &mut SignatureTree<H, A>,
    parent_offset: usize,
    rep_idx: usize,
    parent_size: usize,
    child_offset: usize,
    child_size: usize,
) {
    let (parent_idx, parent_direct) = if rep_idx == parent_size - 1 {
        (rep_idx - 1, true)
    } else {
        (rep_idx, false)
    };
    merge(
        tree,
        parent_offset,
        parent_idx,
        parent_direct,
        parent_size,
        child_offset,
        child_size,
    );
}
