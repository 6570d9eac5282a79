//! Combat-Insert: once a leaf lookup finds the slot a new key collides
//! with, derive the critical bit against that opponent and walk back up
//! towards the root, inserting at the first node whose own diffs all sit
//! strictly before the new bit's priority.

use crate::arena::Allocator;
use crate::codec::{direction_bit, first_diff, unpack_diff, Diff, Helper};
use crate::error::SigTreeError;
use crate::node::Node;
use crate::tree::SignatureTree;

enum Descend {
    Slot(usize, bool),
    /// The hint's node turned out to hold nothing as large as `packed_diff`
    /// anywhere; its basic assumption (this subtree holds the right range)
    /// was wrong, so the walk must restart from the tree's root.
    Restart,
}

/// Walk `node`'s diffs towards the slot `packed_diff`/`direct` belongs at,
/// aborting early (rather than descending past) any diff larger than
/// `packed_diff` — the new critical bit always separates two records at a
/// lower-priority position than anything already splitting this node.
fn descend_to_combat_slot(
    node: &mut Node,
    key: &[u8],
    packed_diff: Diff,
    direct: bool,
    had_hint: bool,
) -> Descend {
    node.ensure_pyramid();
    let size = node.size();
    let mut lo = 0usize;
    let mut hi = size - 1;
    let mut first = true;

    loop {
        let (min_idx, min_val) = node.pyramid.min_at(&node.diffs, lo, hi);
        if min_val > packed_diff {
            if first && had_hint {
                return Descend::Restart;
            }
            return Descend::Slot(if !direct { lo } else { hi - 1 }, direct);
        }
        first = false;

        let (byte_offset, shift) = unpack_diff(min_val);
        let crit_direct = direction_bit(key, byte_offset, shift);
        if !crit_direct {
            hi = min_idx;
            if lo == hi {
                return Descend::Slot(min_idx, crit_direct);
            }
        } else {
            lo = min_idx + 1;
            if lo == hi {
                return Descend::Slot(min_idx, crit_direct);
            }
        }
    }
}

/// Insert `k`/`v`, which is known to collide with `opponent` (the key of
/// the leaf record a descent from `hint_offset` landed on). `hint_idx`/
/// `hint_direct` are that descent's final slot, used as a shortcut: if the
/// new critical bit already sorts after everything the hint node
/// separates on, the new record belongs right there with no further
/// search.
pub(crate) fn combat_insert<H: Helper, A: Allocator>(
    tree: &mut SignatureTree<H, A>,
    opponent: &[u8],
    k: &[u8],
    v: &[u8],
    hint_offset: usize,
    hint_idx: usize,
    hint_direct: bool,
) -> Result<(), SigTreeError> {
    let packed_diff =
        first_diff(opponent, k).expect("combat_insert requires a key differing from its opponent");
    let (byte_offset, shift) = unpack_diff(packed_diff);
    let direct = direction_bit(k, byte_offset, shift);

    let mut cursor = hint_offset;
    let mut hint = Some((hint_idx, hint_direct));

    loop {
        let cursor_size = tree.node(cursor).size();

        let (insert_idx, insert_direct) = if cursor_size == 1 {
            (0, false)
        } else if let Some((hidx, hdirect)) = hint.take() {
            let node = tree.node_mut(cursor);
            if packed_diff > node.diffs[hidx] {
                (hidx, hdirect)
            } else {
                match descend_to_combat_slot(node, k, packed_diff, direct, true) {
                    Descend::Slot(idx, dir) => (idx, dir),
                    Descend::Restart => {
                        cursor = tree.root_offset();
                        continue;
                    }
                }
            }
        } else {
            let node = tree.node_mut(cursor);
            match descend_to_combat_slot(node, k, packed_diff, direct, false) {
                Descend::Slot(idx, dir) => (idx, dir),
                Descend::Restart => unreachable!("restart is only reachable with a live hint"),
            }
        };

        let node = tree.node(cursor);
        let rep_idx = insert_idx + insert_direct as usize;
        let rep = node.reps[rep_idx];
        let should_stop = if cursor_size == 1 {
            !tree.helper().is_packed(rep)
        } else {
            node.diffs[insert_idx] > packed_diff || !tree.helper().is_packed(rep)
        };

        if should_stop {
            if tree.node(cursor).is_full() {
                crate::maintenance::split(tree, cursor)?;
                continue;
            }
            let rep = tree.helper_mut().add(k, v);
            let diff_idx = insert_idx + insert_direct as usize;
            let rep_idx = diff_idx + direct as usize;
            tree.node_mut(cursor).insert_at(diff_idx, rep_idx, packed_diff, rep);
            return Ok(());
        }

        cursor = tree.helper().unpack(rep);
    }
}
