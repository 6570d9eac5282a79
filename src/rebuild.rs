//! Offline balanced rebuild: recursively split each source node at its own
//! critical-bit boundaries, then glue the resulting halves back together
//! around their joining diff, bottom-up, into pages sized for the
//! destination.
//!
//! Splitting a node at its real min diff (rather than chopping a flattened,
//! sorted key list into fixed-size chunks) always lands on a genuine
//! crit-bit boundary: every key a resulting page's descent would route
//! elsewhere really does belong elsewhere, and every key it keeps really
//! does belong to it.

use crate::arena::Allocator;
use crate::codec::{Diff, Helper, Rep};
use crate::error::SigTreeError;
use crate::node::{Node, REP_RANK};
use crate::tree::SignatureTree;

/// Minimum per-side record count (`0.625 * REP_RANK`) for two glued halves
/// to each stand alone as their own page rather than folding together or
/// one swallowing the other inline.
const ACCEPTABLE: usize = (REP_RANK * 5) / 8;

/// A node's worth of records and diffs, not yet (or no longer) backed by an
/// arena page: the unit `glue` combines and `write_page` commits.
struct Page {
    diffs: Vec<Diff>,
    reps: Vec<Rep>,
}

fn is_acceptable(len: usize) -> bool {
    len >= ACCEPTABLE
}

/// Recursively rebuild the whole node at `offset` into a single [`Page`].
fn rebuild_node<H, A>(
    source: &SignatureTree<H, A>,
    dest: &mut SignatureTree<H, A>,
    offset: usize,
) -> Result<Page, SigTreeError>
where
    H: Helper,
    A: Allocator,
{
    let size = source.node(offset).size();
    if size == 0 {
        return Ok(Page {
            diffs: Vec::new(),
            reps: Vec::new(),
        });
    }
    rebuild_range(source, dest, offset, 0, size - 1)
}

/// Recursively rebuild the record range `[lo, hi]` (inclusive) of the node
/// at `offset`: split at the range's own min diff and recurse on the two
/// halves, or — at a single-record base case — translate a leaf record into
/// `dest`'s own `Helper`, or restart the whole build from a packed child.
fn rebuild_range<H, A>(
    source: &SignatureTree<H, A>,
    dest: &mut SignatureTree<H, A>,
    offset: usize,
    lo: usize,
    hi: usize,
) -> Result<Page, SigTreeError>
where
    H: Helper,
    A: Allocator,
{
    if lo == hi {
        let rep = source.node(offset).reps[lo];
        if source.helper().is_packed(rep) {
            let child_offset = source.helper().unpack(rep);
            return rebuild_node(source, dest, child_offset);
        }
        let trans = source.helper().trans(rep);
        let mut value = Vec::new();
        trans.get(trans.key(), &mut value);
        let new_rep = dest.helper_mut().add(trans.key(), &value);
        return Ok(Page {
            diffs: Vec::new(),
            reps: vec![new_rep],
        });
    }

    let node = source.node_mut(offset);
    node.ensure_pyramid();
    let (min_idx, _) = node.pyramid.min_at(&node.diffs, lo, hi);
    let joining_diff = node.diffs[min_idx];

    let left = rebuild_range(source, dest, offset, lo, min_idx)?;
    let right = rebuild_range(source, dest, offset, min_idx + 1, hi)?;
    glue(dest, left, right, joining_diff)
}

/// Combine `left` and `right` (already in key order, `joining_diff` between
/// them) into whichever shape keeps both sides as full as the destination's
/// rank allows.
fn glue<H, A>(
    dest: &mut SignatureTree<H, A>,
    mut left: Page,
    right: Page,
    joining_diff: Diff,
) -> Result<Page, SigTreeError>
where
    H: Helper,
    A: Allocator,
{
    let combined = left.reps.len() + right.reps.len();

    if combined <= REP_RANK {
        left.diffs.push(joining_diff);
        left.diffs.extend(right.diffs);
        left.reps.extend(right.reps);
        return Ok(left);
    }

    if is_acceptable(left.reps.len()) && is_acceptable(right.reps.len()) {
        let left_offset = write_page(dest, &left)?;
        let right_offset = write_page(dest, &right)?;
        return Ok(Page {
            diffs: vec![joining_diff],
            reps: vec![dest.helper().pack(left_offset), dest.helper().pack(right_offset)],
        });
    }

    if left.reps.len() <= right.reps.len() {
        let right_offset = write_page(dest, &right)?;
        left.diffs.push(joining_diff);
        left.reps.push(dest.helper().pack(right_offset));
        Ok(left)
    } else {
        let left_offset = write_page(dest, &left)?;
        let mut diffs = vec![joining_diff];
        diffs.extend(right.diffs);
        let mut reps = vec![dest.helper().pack(left_offset)];
        reps.extend(right.reps);
        Ok(Page { diffs, reps })
    }
}

/// Commit `page` to a freshly allocated page in `dest`'s arena.
fn write_page<H, A>(dest: &mut SignatureTree<H, A>, page: &Page) -> Result<usize, SigTreeError>
where
    H: Helper,
    A: Allocator,
{
    let offset = SignatureTree::<H, A>::allocate_with_retry(dest.allocator_mut())?;
    let mut node = Node::empty();
    node.diffs[..page.diffs.len()].copy_from_slice(&page.diffs);
    node.reps[..page.reps.len()].copy_from_slice(&page.reps);
    node.size = page.reps.len() as u32;
    node.dirty = true;
    *dest.node_mut(offset) = node;
    Ok(offset)
}

/// Rebuild `source` into `dest`. `dest` must not be `source` itself; its
/// existing root page is overwritten in place with the rebuilt one.
pub(crate) fn rebuild<H, A>(
    source: &SignatureTree<H, A>,
    dest: &mut SignatureTree<H, A>,
) -> Result<(), SigTreeError>
where
    H: Helper,
    A: Allocator,
{
    if std::ptr::eq(source, dest) {
        return Err(SigTreeError::RebuildIntoSelf);
    }

    let root_page = rebuild_node(source, dest, source.root_offset())?;

    let root_offset = dest.root_offset();
    let mut node = Node::empty();
    node.diffs[..root_page.diffs.len()].copy_from_slice(&root_page.diffs);
    node.reps[..root_page.reps.len()].copy_from_slice(&root_page.reps);
    node.size = root_page.reps.len() as u32;
    node.dirty = true;
    *dest.node_mut(root_offset) = node;

    Ok(())
}
