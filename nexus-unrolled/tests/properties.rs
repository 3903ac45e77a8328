//! Randomized checks against `VecDeque` as a reference model.

use std::collections::VecDeque;

use nexus_unrolled::{BoundedArena, BoundedList, Index, Node, Storage, UnrolledList};
use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
enum Op {
    PushBack(u32),
    PushFront(u32),
    PopBack,
    PopFront,
    Insert(usize, u32),
    Remove(usize),
    EraseRange(usize, usize),
    Truncate(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<u32>().prop_map(Op::PushBack),
        2 => any::<u32>().prop_map(Op::PushFront),
        1 => Just(Op::PopBack),
        1 => Just(Op::PopFront),
        3 => (any::<usize>(), any::<u32>()).prop_map(|(at, v)| Op::Insert(at, v)),
        2 => any::<usize>().prop_map(Op::Remove),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::EraseRange(a, b)),
        1 => any::<usize>().prop_map(Op::Truncate),
    ]
}

fn assert_matches<const N: usize, K: Index, S>(
    list: &UnrolledList<u32, N, K, S>,
    model: &VecDeque<u32>,
) where
    S: Storage<Node<u32, N, K>, Index = K>,
{
    assert_eq!(list.len(), model.len());
    assert!(list.iter().eq(model.iter()));
    assert!(list.iter().rev().eq(model.iter().rev()));

    let sizes: Vec<usize> = list.chunks().map(<[u32]>::len).collect();
    assert!(sizes.iter().all(|&n| (1..=N).contains(&n)), "node sizes {sizes:?}");
    assert_eq!(sizes.len(), list.node_count());
    assert_eq!(list.storage().len(), list.node_count());
}

fn apply<const N: usize>(list: &mut UnrolledList<u32, N>, model: &mut VecDeque<u32>, op: Op) {
    match op {
        Op::PushBack(v) => {
            list.push_back(v);
            model.push_back(v);
        }
        Op::PushFront(v) => {
            list.push_front(v);
            model.push_front(v);
        }
        Op::PopBack => assert_eq!(list.pop_back(), model.pop_back()),
        Op::PopFront => assert_eq!(list.pop_front(), model.pop_front()),
        Op::Insert(at, v) => {
            let at = at % (model.len() + 1);
            let pos = list.position_at(at).unwrap();
            let inserted = list.insert(pos, v);
            assert_eq!(list.at(inserted), Some(&v));
            model.insert(at, v);
        }
        Op::Remove(at) => {
            if model.is_empty() {
                assert_eq!(list.remove(at), None);
            } else {
                let at = at % model.len();
                assert_eq!(list.remove(at), model.remove(at));
            }
        }
        Op::EraseRange(a, b) => {
            let a = a % (model.len() + 1);
            let b = b % (model.len() + 1);
            let (first, last) = (a.min(b), a.max(b));
            let first_pos = list.position_at(first).unwrap();
            let last_pos = list.position_at(last).unwrap();
            let after = list.erase_range(first_pos, last_pos).unwrap();
            model.drain(first..last);
            assert_eq!(list.at(after), model.get(first));
        }
        Op::Truncate(len) => {
            let len = len % (model.len() + 2);
            list.truncate(len);
            model.truncate(len);
        }
    }
}

proptest! {
    #[test]
    fn ops_match_vecdeque_cap2(ops in proptest::collection::vec(op(), 0..200)) {
        let mut list: UnrolledList<u32, 2> = UnrolledList::new();
        let mut model = VecDeque::new();
        for op in ops {
            apply(&mut list, &mut model, op);
            assert_matches(&list, &model);
        }
    }

    #[test]
    fn ops_match_vecdeque_cap5(ops in proptest::collection::vec(op(), 0..200)) {
        let mut list: UnrolledList<u32, 5> = UnrolledList::new();
        let mut model = VecDeque::new();
        for op in ops {
            apply(&mut list, &mut model, op);
            assert_matches(&list, &model);
        }
    }

    #[test]
    fn collect_preserves_order(values in proptest::collection::vec(any::<i64>(), 0..100)) {
        let list: UnrolledList<i64, 3> = values.iter().copied().collect();
        prop_assert_eq!(list.len(), values.len());
        prop_assert_eq!(list.node_count(), values.len().div_ceil(3));
        prop_assert!(list.iter().eq(values.iter()));
        prop_assert_eq!(list.into_iter().collect::<Vec<_>>(), values);
    }

    #[test]
    fn index_matches_position_at(
        values in proptest::collection::vec(any::<u16>(), 1..80),
        probe in any::<usize>(),
    ) {
        let list: UnrolledList<u16, 4> = values.iter().copied().collect();
        let index = probe % values.len();
        let pos = list.position_at(index).unwrap();
        prop_assert_eq!(list.at(pos), Some(&values[index]));
        prop_assert_eq!(list[index], values[index]);
        prop_assert_eq!(list.get(index), values.get(index));
    }

    #[test]
    fn failed_insert_range_leaves_list_unchanged(
        initial in proptest::collection::vec(any::<u8>(), 1..12),
        extra in proptest::collection::vec(any::<u8>(), 1..40),
        at in any::<usize>(),
    ) {
        let mut list: BoundedList<u8, 4> =
            BoundedList::with_storage(BoundedArena::with_max_nodes(4));
        list.try_append_range(initial.iter().copied()).unwrap();
        let before: Vec<u8> = list.iter().copied().collect();

        let pos = list.position_at(at % (initial.len() + 1)).unwrap();
        if list.try_insert_range(pos, extra.iter().copied()).is_err() {
            prop_assert_eq!(list.iter().copied().collect::<Vec<_>>(), before);
        } else {
            prop_assert_eq!(list.len(), initial.len() + extra.len());
        }
        prop_assert!(list.node_count() <= 4);
    }

    #[test]
    fn clone_is_equal_and_independent(values in proptest::collection::vec(any::<u32>(), 0..60)) {
        let list: UnrolledList<u32, 4> = values.iter().copied().collect();
        let mut copy = list.clone();
        prop_assert_eq!(&copy, &list);
        copy.push_back(0);
        prop_assert_ne!(&copy, &list);
        prop_assert!(list.iter().eq(values.iter()));
    }
}

#[test]
fn seeded_model_check() {
    let mut rng = SmallRng::seed_from_u64(12345);
    let mut list: UnrolledList<u32, 4> = UnrolledList::new();
    let mut model = VecDeque::new();

    for step in 0..20_000u32 {
        let op = match rng.gen_range(0..10) {
            0..=2 => Op::PushBack(step),
            3 => Op::PushFront(step),
            4 => Op::PopBack,
            5 => Op::PopFront,
            6 | 7 => Op::Insert(rng.r#gen(), step),
            8 => Op::Remove(rng.r#gen()),
            _ if rng.gen_bool(0.9) => Op::EraseRange(rng.r#gen(), rng.r#gen()),
            _ => Op::Truncate(rng.r#gen()),
        };
        apply(&mut list, &mut model, op);
        assert_matches(&list, &model);
    }
}

#[test]
fn seeded_cursor_walk() {
    let mut rng = SmallRng::seed_from_u64(12345);
    let mut list: UnrolledList<u32, 3> = (0..200).collect();
    let mut model: VecDeque<u32> = (0..200).collect();

    let mut cursor = list.cursor_front_mut();
    let mut index = 0usize;
    for step in 0..5_000u32 {
        match rng.gen_range(0..4) {
            0 => {
                cursor.move_next();
                index = if index == model.len() { 0 } else { index + 1 };
            }
            1 => {
                cursor.move_prev();
                index = if index == 0 { model.len() } else { index - 1 };
            }
            2 => {
                cursor.insert(step);
                model.insert(index, step);
                index += 1;
            }
            _ => {
                let removed = cursor.remove_current();
                let expected = if index < model.len() { model.remove(index) } else { None };
                assert_eq!(removed, expected);
            }
        }
        assert_eq!(cursor.current(), model.get(index));
    }
    drop(cursor);
    assert_matches(&list, &model);
}
