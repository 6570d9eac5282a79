//! Bit-critical descent: locate the slot a key belongs at within one node.

use crate::codec::direction_bit;
use crate::node::Node;

/// Result of descending one node towards `key`: the diff-array position
/// straddling the target slot, which side of it the key falls on, and the
/// node's size at the time of the walk.
pub struct Match {
    pub idx: usize,
    pub direct: bool,
    pub size: usize,
}

/// Walk `node`'s diffs towards `key`, returning the slot whose record
/// (`reps[idx + direct]`) is the unique leaf (or child pointer) the
/// bit-critical order would place `key` under.
///
/// Rebuilds the node's pyramid first if a prior edit left it dirty.
pub fn find_best_match(node: &mut Node, key: &[u8]) -> Match {
    let size = node.size();
    if size <= 1 {
        return Match {
            idx: 0,
            direct: false,
            size,
        };
    }

    node.ensure_pyramid();

    let mut lo = 0usize;
    let mut hi = size - 1;
    loop {
        let (min_idx, min_val) = node.pyramid.min_at(&node.diffs, lo, hi);
        let (byte_offset, shift) = crate::codec::unpack_diff(min_val);
        let direct = direction_bit(key, byte_offset, shift);

        if !direct {
            hi = min_idx;
            if lo == hi {
                return Match {
                    idx: min_idx,
                    direct,
                    size,
                };
            }
        } else {
            lo = min_idx + 1;
            if lo == hi {
                return Match {
                    idx: min_idx,
                    direct,
                    size,
                };
            }
        }
    }
}
