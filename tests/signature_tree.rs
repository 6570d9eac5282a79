//! Integration tests exercising a whole [`SignatureTree`] end to end:
//! lookup/insert/delete, the split/merge boundary, ordered traversal, and
//! rebuild — all through the reference [`BytesHelper`] over a [`HeapArena`].

use sig_tree::arena::HeapArena;
use sig_tree::codec::MAX_KEY_LENGTH;
use sig_tree::error::SigTreeError;
use sig_tree::helper::BytesHelper;
use sig_tree::node::REP_RANK;
use sig_tree::tree::SignatureTree;
use sig_tree::visit::VisitDecision;

fn new_tree() -> SignatureTree<BytesHelper, HeapArena> {
    SignatureTree::new(BytesHelper::new(), HeapArena::with_capacity(4)).unwrap()
}

fn key(n: u32) -> Vec<u8> {
    n.to_be_bytes().to_vec()
}

#[test]
fn empty_tree_has_no_keys() {
    let tree = new_tree();
    assert_eq!(tree.size(), 0);
    assert_eq!(tree.get(b"anything"), None);
}

#[test]
fn single_insert_then_get_then_delete() {
    let mut tree = new_tree();
    assert!(tree.add(b"hello", b"world").unwrap());
    assert_eq!(tree.size(), 1);
    assert_eq!(tree.get(b"hello"), Some(b"world".to_vec()));

    assert!(tree.del(b"hello"));
    assert_eq!(tree.size(), 0);
    assert_eq!(tree.get(b"hello"), None);

    assert!(!tree.del(b"hello"));
}

#[test]
fn duplicate_insert_leaves_the_original_value() {
    let mut tree = new_tree();
    assert!(tree.add(b"k", b"first").unwrap());
    assert!(!tree.add(b"k", b"second").unwrap());
    assert_eq!(tree.get(b"k"), Some(b"first".to_vec()));
    assert_eq!(tree.size(), 1);
}

#[test]
fn key_longer_than_max_is_rejected() {
    let mut tree = new_tree();
    let oversized = vec![0u8; MAX_KEY_LENGTH + 1];
    match tree.add(&oversized, b"v") {
        Err(SigTreeError::KeyTooLong { len, max }) => {
            assert_eq!(len, MAX_KEY_LENGTH + 1);
            assert_eq!(max, MAX_KEY_LENGTH);
        }
        other => panic!("expected KeyTooLong, got {other:?}"),
    }
}

#[test]
fn inserting_past_one_nodes_rank_splits_and_stays_correct() {
    let mut tree = new_tree();
    // REP_RANK keys fill a single node exactly; one more forces a split.
    let n = (REP_RANK + 1) as u32;
    for i in 0..n {
        assert!(tree.add(&key(i), &key(i)).unwrap());
    }
    assert_eq!(tree.size(), n as usize);
    for i in 0..n {
        assert_eq!(tree.get(&key(i)), Some(key(i)));
    }
}

#[test]
fn large_insert_then_full_delete_empties_the_tree() {
    let mut tree = new_tree();
    let n = 10_000u32;
    for i in 0..n {
        assert!(tree.add(&key(i), &key(i * 2)).unwrap());
    }
    assert_eq!(tree.size(), n as usize);

    for i in 0..n {
        assert!(tree.del(&key(i)), "key {i} should have been present");
    }
    assert_eq!(tree.size(), 0);
    for i in 0..n {
        assert_eq!(tree.get(&key(i)), None);
    }

    // The tree must still be usable after being fully drained.
    assert!(tree.add(b"still alive", b"yes").unwrap());
    assert_eq!(tree.get(b"still alive"), Some(b"yes".to_vec()));
}

#[test]
fn deleting_every_other_key_preserves_the_rest() {
    let mut tree = new_tree();
    let n = 2_000u32;
    for i in 0..n {
        assert!(tree.add(&key(i), &key(i)).unwrap());
    }
    for i in (0..n).step_by(2) {
        assert!(tree.del(&key(i)));
    }
    assert_eq!(tree.size(), (n / 2) as usize);
    for i in 0..n {
        let expect = if i % 2 == 0 { None } else { Some(key(i)) };
        assert_eq!(tree.get(&key(i)), expect);
    }
}

#[test]
fn forward_visit_returns_keys_in_ascending_order() {
    let mut tree = new_tree();
    let mut shuffled: Vec<u32> = (0..3_000).collect();
    // A fixed, deterministic "shuffle" (no RNG needed): reverse then
    // interleave, so insertion order differs from sorted order.
    shuffled.reverse();

    for &i in &shuffled {
        tree.add(&key(i), &key(i)).unwrap();
    }

    let mut seen = Vec::new();
    tree.visit(None, true, |k, _v| {
        seen.push(u32::from_be_bytes(k.try_into().unwrap()));
        true
    });

    let expected: Vec<u32> = (0..3_000).collect();
    assert_eq!(seen, expected);
}

#[test]
fn backward_visit_returns_keys_in_descending_order() {
    let mut tree = new_tree();
    for i in 0..1_000u32 {
        tree.add(&key(i), &key(i)).unwrap();
    }

    let mut seen = Vec::new();
    tree.visit(None, false, |k, _v| {
        seen.push(u32::from_be_bytes(k.try_into().unwrap()));
        true
    });

    let expected: Vec<u32> = (0..1_000).rev().collect();
    assert_eq!(seen, expected);
}

#[test]
fn visit_from_bound_skips_earlier_keys() {
    let mut tree = new_tree();
    for i in 0..500u32 {
        tree.add(&key(i), &key(i)).unwrap();
    }

    let mut seen = Vec::new();
    tree.visit(Some(&key(250)), true, |k, _v| {
        seen.push(u32::from_be_bytes(k.try_into().unwrap()));
        true
    });

    let expected: Vec<u32> = (250..500).collect();
    assert_eq!(seen, expected);
}

#[test]
fn visit_del_removes_marked_keys_and_keeps_the_rest() {
    let mut tree = new_tree();
    let n = 1_500u32;
    for i in 0..n {
        tree.add(&key(i), &key(i)).unwrap();
    }

    tree.visit_del(None, true, |k, _v| {
        let i = u32::from_be_bytes(k.try_into().unwrap());
        if i % 3 == 0 {
            VisitDecision::Delete
        } else {
            VisitDecision::Keep
        }
    });

    assert_eq!(tree.size(), (0..n).filter(|i| i % 3 != 0).count());
    for i in 0..n {
        let expect = if i % 3 == 0 { None } else { Some(key(i)) };
        assert_eq!(tree.get(&key(i)), expect);
    }
}

#[test]
fn visit_del_stop_halts_further_deletion() {
    let mut tree = new_tree();
    for i in 0..200u32 {
        tree.add(&key(i), &key(i)).unwrap();
    }

    let mut visited = 0;
    tree.visit_del(None, true, |_k, _v| {
        visited += 1;
        if visited == 50 {
            VisitDecision::DeleteAndStop
        } else {
            VisitDecision::Keep
        }
    });

    assert_eq!(visited, 50);
    assert_eq!(tree.size(), 199);
    assert_eq!(tree.get(&key(49)), None);
}

#[test]
fn rebuild_preserves_every_surviving_key() {
    let mut source = new_tree();
    let n = 5_000u32;
    for i in 0..n {
        source.add(&key(i), &key(i)).unwrap();
    }
    for i in (0..n).step_by(4) {
        source.del(&key(i));
    }

    let mut dest = new_tree();
    source.rebuild(&mut dest).unwrap();

    assert_eq!(dest.size(), source.size());
    for i in 0..n {
        assert_eq!(dest.get(&key(i)), source.get(&key(i)));
    }
}

#[test]
fn compact_keeps_all_keys_reachable() {
    let mut tree = new_tree();
    let n = (REP_RANK * 3) as u32;
    for i in 0..n {
        tree.add(&key(i), &key(i)).unwrap();
    }
    for i in (0..n).step_by(2) {
        tree.del(&key(i));
    }
    tree.compact();
    assert_eq!(tree.size(), (0..n).filter(|i| i % 2 != 0).count());
    for i in 0..n {
        let expect = if i % 2 == 0 { None } else { Some(key(i)) };
        assert_eq!(tree.get(&key(i)), expect);
    }
}
