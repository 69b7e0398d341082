//! Ordering, LIFO and teardown properties of the main lump chain

use sipedit::*;

fn structural_offsets(list: &LumpList) -> Vec<usize> {
    list.iter().filter_map(|(_, lump)| lump.offset()).collect()
}

/// Arbitrary distinct offsets end up strictly ascending among structural
/// nodes, however many Add lumps are interleaved
#[test]
fn test_ordering_with_heavy_add_interleaving() {
    let offsets = [
        913, 14, 522, 7, 300, 801, 44, 120, 666, 3, 999, 250, 71, 408, 36,
    ];

    let mut list = LumpList::new();
    for (i, &offset) in offsets.iter().enumerate() {
        if i % 2 == 0 {
            list.mark_delete(offset, 1, 0).unwrap();
        } else {
            list.mark_anchor(offset, 0, 0).unwrap();
        }
        // Interleave head and tail insertions between every structural edit
        list.insert_front(format!("head-{}", i).into_bytes(), 0).unwrap();
        list.append(format!("tail-{}", i).into_bytes(), 0).unwrap();
    }

    let got = structural_offsets(&list);
    let mut expected = offsets.to_vec();
    expected.sort();
    assert_eq!(got, expected);

    // Every Add lump is still linked somewhere in the chain
    assert_eq!(list.iter().count(), offsets.len() * 3);
}

#[test]
fn test_side_chain_lifo_pairwise() {
    let mut list = LumpList::new();
    let anchor = list.mark_anchor(100, 0, 0).unwrap();
    list.insert_after(anchor, b"x1".to_vec(), 0).unwrap();
    list.insert_after(anchor, b"x2".to_vec(), 0).unwrap();

    let after: Vec<Vec<u8>> = list
        .get(anchor)
        .unwrap()
        .after()
        .filter_map(|i| i.payload().as_bytes().map(|b| b.to_vec()))
        .collect();
    assert_eq!(after, vec![b"x2".to_vec(), b"x1".to_vec()]);
}

/// Teardown is one flat pass: N structural nodes carrying M before- and M
/// after-lumps each release exactly N*(2M+1) lumps, at sizes far beyond
/// what a recursive walk per side-chain element would survive
#[test]
fn test_flat_teardown_at_hostile_scale() {
    const N: usize = 500;
    const M: usize = 100;

    let mut list = LumpList::with_max_lumps(N * (2 * M + 1));
    for i in 0..N {
        let anchor = list.mark_anchor(i, 0, 0).unwrap();
        for _ in 0..M {
            list.insert_before(anchor, b"b".to_vec(), 0).unwrap();
            list.insert_after(anchor, b"a".to_vec(), 0).unwrap();
        }
    }
    assert_eq!(list.lump_count(), N * (2 * M + 1));
    assert_eq!(list.clear(), N * (2 * M + 1));
    assert!(list.is_empty());

    // The cleared list is reusable
    list.mark_delete(1, 1, 0).unwrap();
    assert_eq!(structural_offsets(&list), vec![1]);
}

/// Dropping a fully loaded list must not recurse either
#[test]
fn test_drop_at_hostile_scale() {
    const N: usize = 2_000;
    const M: usize = 50;

    let mut list = LumpList::with_max_lumps(N * (2 * M + 1));
    for i in 0..N {
        let anchor = list.mark_anchor(i, 0, 0).unwrap();
        for _ in 0..M {
            list.insert_before(anchor, b"b".to_vec(), 0).unwrap();
            list.insert_after(anchor, b"a".to_vec(), 0).unwrap();
        }
    }
    drop(list);
}

/// A failing operation leaves the list exactly as it was
#[test]
fn test_failed_operations_mutate_nothing() {
    let mut list = LumpList::with_max_lumps(3);
    list.mark_delete(10, 2, 0).unwrap();
    let anchor = list.mark_anchor(20, 0, 0).unwrap();
    list.insert_after(anchor, b"ok".to_vec(), 0).unwrap();

    // Ceiling reached: every constructor fails without touching the chain
    assert!(list.mark_delete(30, 1, 0).is_err());
    assert!(list.append(b"x".to_vec(), 0).is_err());
    assert!(list.insert_front(b"x".to_vec(), 0).is_err());
    assert!(list.insert_before(anchor, b"x".to_vec(), 0).is_err());

    assert_eq!(structural_offsets(&list), vec![10, 20]);
    assert_eq!(list.lump_count(), 3);
    let after: Vec<usize> = list
        .get(anchor)
        .unwrap()
        .after()
        .map(|i| i.payload().len())
        .collect();
    assert_eq!(after, vec![2]);
}

/// Assembly of an edit set is deterministic and repeatable
#[test]
fn test_assembly_is_repeatable() {
    let source = b"OPTIONS sip:a@b SIP/2.0\r\nAccept: application/sdp\r\n\r\n";
    let mut list = LumpList::new();
    let accept = 25; // start of the Accept line
    let anchor = list.mark_anchor(accept, 0, 0).unwrap();
    list.insert_before(anchor, b"Max-Forwards: 70\r\n".to_vec(), 0)
        .unwrap();
    list.mark_delete(accept, 25, 0).unwrap();

    let env = AssembleEnv::new();
    let first = assemble(source, &list, &env).unwrap();
    let second = assemble(source, &list, &env).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first,
        b"OPTIONS sip:a@b SIP/2.0\r\nMax-Forwards: 70\r\n\r\n".to_vec()
    );
}
