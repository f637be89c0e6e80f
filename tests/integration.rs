//! End-to-end scenarios and property tests for the ART core (spec §8).

use art::{ArtError, Key, Tid, Tree};
use quickcheck::{quickcheck, TestResult};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

type Store = Rc<RefCell<HashMap<Tid, Key>>>;

fn new_tree() -> (Tree<impl Fn(Tid, &mut Key)>, Store) {
    let store: Store = Rc::new(RefCell::new(HashMap::new()));
    let lookup_store = Rc::clone(&store);
    let tree = Tree::new(move |tid, key: &mut Key| {
        let bytes = lookup_store.borrow();
        key.set(bytes.get(&tid).expect("unknown tid in key_of callback").as_bytes());
    });
    (tree, store)
}

fn put(tree: &mut Tree<impl Fn(Tid, &mut Key)>, store: &Store, key: &[u8], tid: Tid) {
    store.borrow_mut().insert(tid, Key::from_bytes(key));
    tree.insert(&Key::from_bytes(key), tid);
}

#[test]
fn basic_insert_lookup_and_not_found() {
    let (mut tree, store) = new_tree();
    put(&mut tree, &store, b"hello", 1);
    put(&mut tree, &store, b"world", 2);
    assert_eq!(tree.lookup(&Key::from_bytes(b"hello")), Some(1));
    assert_eq!(tree.lookup(&Key::from_bytes(b"world")), Some(2));
    assert_eq!(tree.lookup(&Key::from_bytes(b"absent")), None);
}

#[test]
fn n4_grows_to_n16_on_fifth_distinct_child() {
    let (mut tree, store) = new_tree();
    for i in 1u64..=5 {
        put(&mut tree, &store, &i.to_be_bytes(), i);
    }
    for i in 1u64..=5 {
        assert_eq!(tree.lookup(&Key::from(i)), Some(i));
    }
}

#[test]
fn grows_through_n16_to_n48_over_seventeen_children() {
    let (mut tree, store) = new_tree();
    for i in 1u64..=17 {
        put(&mut tree, &store, &i.to_be_bytes(), i);
    }
    for i in 1u64..=17 {
        assert_eq!(tree.lookup(&Key::from(i)), Some(i));
    }
}

#[test]
fn random_insert_then_partial_remove() {
    let (mut tree, store) = new_tree();
    let mut rng = StdRng::seed_from_u64(42);
    let mut keys: Vec<u64> = Vec::new();
    while keys.len() < 50 {
        let candidate: u64 = rng.gen();
        if !keys.contains(&candidate) {
            keys.push(candidate);
        }
    }
    for &k in &keys {
        put(&mut tree, &store, &k.to_be_bytes(), k);
    }
    let (removed, kept) = keys.split_at(13);
    for &k in removed {
        tree.remove(&Key::from(k), k).expect("key was just inserted");
    }
    for &k in removed {
        assert_eq!(tree.lookup(&Key::from(k)), None);
    }
    for &k in kept {
        assert_eq!(tree.lookup(&Key::from(k)), Some(k));
    }
}

#[test]
fn bulkload_matches_incremental_insert() {
    let (mut bulk_tree, bulk_store) = new_tree();
    let entries: Vec<(Key, Tid)> = (1u64..1000)
        .map(|i| {
            bulk_store.borrow_mut().insert(i, Key::from(i));
            (Key::from(i), i)
        })
        .collect();
    bulk_tree.bulkload(&entries);
    assert_eq!(bulk_tree.lookup(&Key::from(500u64)), Some(500));
    assert_eq!(bulk_tree.lookup(&Key::from(0u64)), None);
    assert_eq!(bulk_tree.lookup(&Key::from(1000u64)), None);

    let (mut inserted_tree, inserted_store) = new_tree();
    for i in 1u64..1000 {
        put(&mut inserted_tree, &inserted_store, &i.to_be_bytes(), i);
    }

    // Both trees index the same key set; the height metric should land in
    // the same ballpark regardless of construction order.
    let bulk_height = bulk_tree.calculate_average_height();
    let inserted_height = inserted_tree.calculate_average_height();
    assert!((bulk_height - inserted_height).abs() < 1.0);
}

#[test]
fn optimistic_prefix_verification_on_shared_leading_bytes() {
    let (mut tree, store) = new_tree();
    let mut a = vec![0xABu8; 16];
    a.push(0x01);
    let mut b = vec![0xABu8; 16];
    b.push(0x02);
    // Shares only the first 8 bytes with `a`/`b`, then diverges.
    let mut c = vec![0xABu8; 8];
    c.extend_from_slice(&[0; 9]);

    put(&mut tree, &store, &a, 1);
    put(&mut tree, &store, &b, 2);

    assert_eq!(tree.lookup(&Key::from_bytes(&a)), Some(1));
    assert_eq!(tree.lookup(&Key::from_bytes(&b)), Some(2));
    assert_eq!(tree.lookup(&Key::from_bytes(&c)), None);
}

#[test]
fn remove_reports_not_found_for_absent_key() {
    let (mut tree, store) = new_tree();
    put(&mut tree, &store, b"present", 1);
    assert_eq!(
        tree.remove(&Key::from_bytes(b"missing"), 99),
        Err(ArtError::NotFound)
    );
}

#[test]
fn remove_reports_not_found_on_tid_mismatch() {
    let (mut tree, store) = new_tree();
    put(&mut tree, &store, b"present", 1);
    assert_eq!(
        tree.remove(&Key::from_bytes(b"present"), 2),
        Err(ArtError::NotFound)
    );
    assert_eq!(tree.lookup(&Key::from_bytes(b"present")), Some(1));
}

#[test]
fn duplicate_key_insert_overwrites() {
    let (mut tree, store) = new_tree();
    put(&mut tree, &store, b"same", 1);
    put(&mut tree, &store, b"same", 2);
    assert_eq!(tree.lookup(&Key::from_bytes(b"same")), Some(2));
}

quickcheck! {
    fn ordered_traversal_is_ascending(mut values: Vec<u64>) -> TestResult {
        values.sort_unstable();
        values.dedup();
        if values.is_empty() {
            return TestResult::discard();
        }
        let (mut tree, store) = new_tree();
        for &v in &values {
            put(&mut tree, &store, &v.to_be_bytes(), v);
        }
        let observed: Vec<Tid> = tree.iter().into_iter().map(|(_, tid)| tid).collect();
        TestResult::from_bool(observed == values)
    }

    fn insert_then_lookup_finds_every_key(mut values: Vec<u64>) -> TestResult {
        values.sort_unstable();
        values.dedup();
        if values.is_empty() {
            return TestResult::discard();
        }
        let (mut tree, store) = new_tree();
        for &v in &values {
            put(&mut tree, &store, &v.to_be_bytes(), v);
        }
        TestResult::from_bool(values.iter().all(|&v| tree.lookup(&Key::from(v)) == Some(v)))
    }

    fn insert_then_remove_then_lookup_is_absent(mut values: Vec<u64>, seed: u64) -> TestResult {
        values.sort_unstable();
        values.dedup();
        if values.is_empty() {
            return TestResult::discard();
        }
        let (mut tree, store) = new_tree();
        for &v in &values {
            put(&mut tree, &store, &v.to_be_bytes(), v);
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut shuffled = values.clone();
        shuffled.shuffle(&mut rng);
        for &v in &shuffled {
            if tree.remove(&Key::from(v), v).is_err() {
                return TestResult::failed();
            }
        }
        TestResult::from_bool(values.iter().all(|&v| tree.lookup(&Key::from(v)).is_none()))
    }

    fn bulkload_matches_shuffled_insert_for_lookup(mut values: Vec<u64>, seed: u64) -> TestResult {
        values.sort_unstable();
        values.dedup();
        if values.is_empty() {
            return TestResult::discard();
        }
        let entries: Vec<(Key, Tid)> = values.iter().map(|&v| (Key::from(v), v)).collect();
        let (mut bulk_tree, bulk_store) = new_tree();
        for &v in &values {
            bulk_store.borrow_mut().insert(v, Key::from(v));
        }
        bulk_tree.bulkload(&entries);

        let (mut inserted_tree, inserted_store) = new_tree();
        let mut shuffled = values.clone();
        let mut rng = StdRng::seed_from_u64(seed);
        shuffled.shuffle(&mut rng);
        for &v in &shuffled {
            put(&mut inserted_tree, &inserted_store, &v.to_be_bytes(), v);
        }

        TestResult::from_bool(
            values
                .iter()
                .all(|&v| bulk_tree.lookup(&Key::from(v)) == inserted_tree.lookup(&Key::from(v))),
        )
    }
}
