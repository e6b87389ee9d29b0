//! Tests for SkipList
//!
//! These tests verify:
//! - Ordered insert and deduplication
//! - Lookup and bound semantics
//! - Erase and position navigation
//! - Free-space reuse through the allocator
//! - Structural invariants under random workloads

use std::cell::Cell;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use spanlist::skiplist::{Comparator, Position, SkipList, MAX_LEVEL};
use spanlist::{Config, SpanListError};
use tempfile::TempDir;

type List = SkipList<u64>;

// =============================================================================
// Helper Functions
// =============================================================================

fn test_config(dir: &Path) -> Config {
    Config::builder().data_dir(dir).seed(42).build()
}

fn setup_temp_list() -> (TempDir, List) {
    let temp_dir = TempDir::new().unwrap();
    let list = List::open_named(&test_config(temp_dir.path()), "list").unwrap();
    (temp_dir, list)
}

fn insert_all(list: &mut List, keys: &[u64]) {
    for &key in keys {
        list.insert(key).unwrap();
    }
}

fn shuffled(n: u64, seed: u64) -> Vec<u64> {
    let mut keys: Vec<u64> = (0..n).collect();
    keys.shuffle(&mut StdRng::seed_from_u64(seed));
    keys
}

// =============================================================================
// Empty List Tests
// =============================================================================

#[test]
fn test_new_list_is_empty() {
    let (_temp, mut list) = setup_temp_list();

    assert_eq!(list.len(), 0);
    assert_eq!(list.size(), 0);
    assert!(list.is_empty());
    assert_eq!(list.max_level(), 1);
    assert_eq!(list.begin().unwrap(), list.end());
    assert_eq!(list.rbegin(), list.rend());
    assert!(list.to_vec().unwrap().is_empty());
    list.check_invariants().unwrap();
}

#[test]
fn test_open_named_creates_file() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("nested").join("dir");

    let _list = List::open_named(&test_config(&data_dir), "orders").unwrap();

    assert!(data_dir.join("orders.bin").exists());
}

#[test]
fn test_open_named_rejects_bad_names() {
    let temp_dir = TempDir::new().unwrap();
    let config = test_config(temp_dir.path());

    assert!(matches!(
        List::open_named(&config, ""),
        Err(SpanListError::Config(_))
    ));
    assert!(matches!(
        List::open_named(&config, "a/b"),
        Err(SpanListError::Config(_))
    ));
}

// =============================================================================
// Insert Tests
// =============================================================================

#[test]
fn test_insert_yields_sorted_order() {
    let (_temp, mut list) = setup_temp_list();

    insert_all(&mut list, &[5, 1, 3]);

    assert_eq!(list.to_vec().unwrap(), vec![1, 3, 5]);
    assert_eq!(list.order_of_key(&3).unwrap(), 1);
    let pos = list.find_by_order(2).unwrap();
    assert_eq!(list.get(pos).unwrap(), 5);
}

#[test]
fn test_insert_reports_new_position() {
    let (_temp, mut list) = setup_temp_list();

    let (pos, inserted) = list.insert(9).unwrap();

    assert!(inserted);
    assert!(!pos.is_end());
    assert_eq!(list.get(pos).unwrap(), 9);
    assert_eq!(list.begin().unwrap(), pos);
    assert_eq!(list.rbegin(), pos);
}

#[test]
fn test_duplicate_insert_is_noop() {
    let (_temp, mut list) = setup_temp_list();
    insert_all(&mut list, &[10, 20, 30]);
    let (first, _) = list.insert(40).unwrap();

    let (again, inserted) = list.insert(40).unwrap();

    assert!(!inserted);
    assert_eq!(again, first);
    assert_eq!(list.len(), 4);
    list.check_invariants().unwrap();
}

#[test]
fn test_insert_many_shuffled() {
    let (_temp, mut list) = setup_temp_list();
    let keys = shuffled(1000, 1);

    insert_all(&mut list, &keys);

    assert_eq!(list.len(), 1000);
    assert_eq!(list.to_vec().unwrap(), (0..1000).collect::<Vec<_>>());
    assert!(list.max_level() >= 2);
    assert!(list.max_level() as usize <= MAX_LEVEL);
    list.check_invariants().unwrap();
}

#[test]
fn test_insert_descending_keys() {
    let (_temp, mut list) = setup_temp_list();

    for key in (0..200).rev() {
        list.insert(key).unwrap();
    }

    assert_eq!(list.to_vec().unwrap(), (0..200).collect::<Vec<_>>());
    list.check_invariants().unwrap();
}

#[test]
fn test_variable_width_key_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut list: SkipList<Vec<u8>> =
        SkipList::open_named(&test_config(temp_dir.path()), "bytes").unwrap();

    // The empty vector fixes the key width; anything longer is refused
    assert!(list.insert(Vec::new()).unwrap().1);
    let result = list.insert(vec![1, 2, 3]);

    assert!(matches!(result, Err(SpanListError::RecordSize { .. })));
    assert_eq!(list.len(), 1);
    list.check_invariants().unwrap();
}

// =============================================================================
// Lookup Tests
// =============================================================================

#[test]
fn test_find_present_and_absent() {
    let (_temp, mut list) = setup_temp_list();
    insert_all(&mut list, &[10, 20, 30]);

    let pos = list.find(&20).unwrap();
    assert_eq!(list.get(pos).unwrap(), 20);
    assert!(list.contains(&30).unwrap());

    assert!(list.find(&25).unwrap().is_end());
    assert!(list.find(&5).unwrap().is_end());
    assert!(list.find(&35).unwrap().is_end());
    assert!(!list.contains(&0).unwrap());
}

#[test]
fn test_lower_bound() {
    let (_temp, mut list) = setup_temp_list();
    insert_all(&mut list, &[10, 20, 30]);

    let at = |list: &mut List, key: u64| {
        let pos = list.lower_bound(&key).unwrap();
        if pos.is_end() {
            None
        } else {
            Some(list.get(pos).unwrap())
        }
    };

    assert_eq!(at(&mut list, 5), Some(10));
    assert_eq!(at(&mut list, 10), Some(10));
    assert_eq!(at(&mut list, 11), Some(20));
    assert_eq!(at(&mut list, 30), Some(30));
    assert_eq!(at(&mut list, 31), None);
}

#[test]
fn test_upper_bound() {
    let (_temp, mut list) = setup_temp_list();
    insert_all(&mut list, &[10, 20, 30]);

    let at = |list: &mut List, key: u64| {
        let pos = list.upper_bound(&key).unwrap();
        if pos.is_end() {
            None
        } else {
            Some(list.get(pos).unwrap())
        }
    };

    assert_eq!(at(&mut list, 5), Some(10));
    assert_eq!(at(&mut list, 10), Some(20));
    assert_eq!(at(&mut list, 25), Some(30));
    assert_eq!(at(&mut list, 30), None);
}

#[test]
fn test_bounds_bracket_single_occurrence() {
    let (_temp, mut list) = setup_temp_list();
    insert_all(&mut list, &shuffled(300, 2));

    for key in [0u64, 1, 150, 299] {
        let lower = list.lower_bound(&key).unwrap();
        let upper = list.upper_bound(&key).unwrap();
        let inside: Vec<u64> = list.range(lower, upper).collect::<Result<_, _>>().unwrap();
        assert_eq!(inside, vec![key]);
    }

    // Absent key: empty bracket
    let lower = list.lower_bound(&1000).unwrap();
    let upper = list.upper_bound(&1000).unwrap();
    assert_eq!(lower, upper);
}

#[test]
fn test_upper_bound_matches_model_on_large_list() {
    let (_temp, mut list) = setup_temp_list();
    let keys: Vec<u64> = (0..500).map(|k| k * 3).collect();
    insert_all(&mut list, &keys);

    for target in 0..1500u64 {
        let pos = list.upper_bound(&target).unwrap();
        let expected = keys.iter().copied().find(|&k| k > target);
        match expected {
            Some(k) => assert_eq!(list.get(pos).unwrap(), k),
            None => assert!(pos.is_end()),
        }
    }
}

// =============================================================================
// Erase Tests
// =============================================================================

#[test]
fn test_erase_missing_key_is_noop() {
    let (_temp, mut list) = setup_temp_list();
    insert_all(&mut list, &[1, 2, 3]);

    let pos = list.erase(&7).unwrap();

    assert!(pos.is_end());
    assert_eq!(list.len(), 3);
    list.check_invariants().unwrap();
}

#[test]
fn test_erase_on_empty_list() {
    let (_temp, mut list) = setup_temp_list();

    assert_eq!(list.erase(&1).unwrap(), Position::END);
    assert_eq!(list.len(), 0);
}

#[test]
fn test_erase_returns_successor() {
    let (_temp, mut list) = setup_temp_list();
    insert_all(&mut list, &[10, 20, 30]);

    let next = list.erase(&20).unwrap();
    assert_eq!(list.get(next).unwrap(), 30);

    let next = list.erase(&30).unwrap();
    assert!(next.is_end());
    assert_eq!(list.get(list.rbegin()).unwrap(), 10);

    assert_eq!(list.to_vec().unwrap(), vec![10]);
    list.check_invariants().unwrap();
}

#[test]
fn test_erase_everything_in_random_order() {
    let (_temp, mut list) = setup_temp_list();
    let keys = shuffled(500, 3);
    insert_all(&mut list, &keys);

    for (i, key) in shuffled(500, 4).into_iter().enumerate() {
        list.erase(&key).unwrap();
        assert_eq!(list.len(), 500 - i as u64 - 1);
        if i % 50 == 0 {
            list.check_invariants().unwrap();
        }
    }

    assert_eq!(list.len(), 0);
    assert!(list.is_empty());
    assert_eq!(list.max_level(), 1);
    assert_eq!(list.rbegin(), list.rend());
    for key in keys {
        assert!(list.find(&key).unwrap().is_end());
    }
    list.check_invariants().unwrap();
}

#[test]
fn test_erased_nodes_are_reused() {
    let (_temp, mut list) = setup_temp_list();
    insert_all(&mut list, &(0..100).collect::<Vec<_>>());
    let file_len = list.heap().file_len().unwrap();

    for key in 0..50 {
        list.erase(&key).unwrap();
    }
    for key in 100..150 {
        list.insert(key).unwrap();
    }

    assert_eq!(list.heap().file_len().unwrap(), file_len);
    list.check_invariants().unwrap();
}

// =============================================================================
// Position Navigation Tests
// =============================================================================

#[test]
fn test_forward_and_backward_navigation() {
    let (_temp, mut list) = setup_temp_list();
    insert_all(&mut list, &[3, 1, 2]);

    let mut forward = Vec::new();
    let mut pos = list.begin().unwrap();
    while pos != list.end() {
        forward.push(list.get(pos).unwrap());
        pos = list.next(pos).unwrap();
    }
    assert_eq!(forward, vec![1, 2, 3]);

    let mut backward = Vec::new();
    let mut pos = list.rbegin();
    while pos != list.rend() {
        backward.push(list.get(pos).unwrap());
        pos = list.prev(pos).unwrap();
    }
    assert_eq!(backward, vec![3, 2, 1]);
}

#[test]
fn test_step_back_from_end_reaches_last() {
    let (_temp, mut list) = setup_temp_list();
    insert_all(&mut list, &[4, 8]);

    let last = list.prev(list.end()).unwrap();

    assert_eq!(last, list.rbegin());
    assert_eq!(list.get(last).unwrap(), 8);
}

#[test]
fn test_step_from_rend_reaches_first() {
    let (_temp, mut list) = setup_temp_list();
    insert_all(&mut list, &[4, 8]);

    let first = list.next(list.rend()).unwrap();

    assert_eq!(first, list.begin().unwrap());
}

#[test]
fn test_dereferencing_sentinels_fails() {
    let (_temp, mut list) = setup_temp_list();
    insert_all(&mut list, &[1]);

    assert!(matches!(
        list.get(list.end()),
        Err(SpanListError::InvalidPosition(_))
    ));
    assert!(matches!(
        list.get(list.rend()),
        Err(SpanListError::InvalidPosition(_))
    ));
    assert!(matches!(
        list.next(list.end()),
        Err(SpanListError::InvalidPosition(_))
    ));
    assert!(matches!(
        list.prev(list.rend()),
        Err(SpanListError::InvalidPosition(_))
    ));
}

#[test]
fn test_double_ended_iteration() {
    let (_temp, mut list) = setup_temp_list();
    insert_all(&mut list, &shuffled(50, 5));

    let reversed: Vec<u64> = list.iter().rev().collect::<Result<_, _>>().unwrap();
    assert_eq!(reversed, (0..50).rev().collect::<Vec<_>>());

    // Both ends meet without overlap
    let mut iter = list.iter();
    assert_eq!(iter.size_hint(), (50, Some(50)));
    let mut front = Vec::new();
    let mut back = Vec::new();
    loop {
        match iter.next() {
            Some(key) => front.push(key.unwrap()),
            None => break,
        }
        match iter.next_back() {
            Some(key) => back.push(key.unwrap()),
            None => break,
        }
    }
    assert_eq!(front.len() + back.len(), 50);
    assert_eq!(front, (0..25).collect::<Vec<_>>());
    assert_eq!(back, (25..50).rev().collect::<Vec<_>>());
}

#[test]
fn test_range_from_rend_starts_at_first() {
    let (_temp, mut list) = setup_temp_list();
    insert_all(&mut list, &[1, 2, 3]);

    let stop = list.find(&3).unwrap();
    let rend = list.rend();
    let keys: Vec<u64> = list.range(rend, stop).collect::<Result<_, _>>().unwrap();

    assert_eq!(keys, vec![1, 2]);
}

// =============================================================================
// Clear Tests
// =============================================================================

#[test]
fn test_clear_then_reuse() {
    let (_temp, mut list) = setup_temp_list();
    insert_all(&mut list, &shuffled(100, 6));

    list.clear().unwrap();

    assert!(list.is_empty());
    assert_eq!(list.max_level(), 1);
    assert!(list.to_vec().unwrap().is_empty());
    list.check_invariants().unwrap();

    insert_all(&mut list, &[2, 1]);
    assert_eq!(list.to_vec().unwrap(), vec![1, 2]);
    list.check_invariants().unwrap();
}

// =============================================================================
// Comparator Tests
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct Descending;

impl Comparator<u64> for Descending {
    fn compare(&self, a: &u64, b: &u64) -> Ordering {
        b.cmp(a)
    }
}

#[test]
fn test_custom_comparator_orders_keys() {
    let temp_dir = TempDir::new().unwrap();
    let mut list: SkipList<u64, Descending> =
        SkipList::open_named(&test_config(temp_dir.path()), "desc").unwrap();

    for key in [5, 9, 1, 7] {
        list.insert(key).unwrap();
    }

    assert_eq!(list.to_vec().unwrap(), vec![9, 7, 5, 1]);
    assert_eq!(list.order_of_key(&5).unwrap(), 2);
    list.check_invariants().unwrap();
}

// =============================================================================
// Randomized Model Tests
// =============================================================================

#[test]
fn test_random_workload_matches_btreeset() {
    let (_temp, mut list) = setup_temp_list();
    let mut model = BTreeSet::new();
    let mut rng = StdRng::seed_from_u64(99);

    for step in 0..3000 {
        let key = rng.gen_range(0..400u64);
        if rng.gen_bool(0.6) {
            let (_, inserted) = list.insert(key).unwrap();
            assert_eq!(inserted, model.insert(key));
        } else {
            let next = list.erase(&key).unwrap();
            let removed = model.remove(&key);
            if !removed {
                assert!(next.is_end());
            } else {
                match model.range(key..).next() {
                    Some(&succ) => assert_eq!(list.get(next).unwrap(), succ),
                    None => assert!(next.is_end()),
                }
            }
        }
        assert_eq!(list.len(), model.len() as u64);

        if step % 500 == 0 {
            list.check_invariants().unwrap();
        }
    }

    assert_eq!(list.to_vec().unwrap(), model.into_iter().collect::<Vec<_>>());
    list.check_invariants().unwrap();
}

// =============================================================================
// Failure Tests
// =============================================================================

/// Key value whose second encoding fails
const BRITTLE: u64 = 99;

thread_local! {
    static BRITTLE_ENCODES: Cell<u32> = Cell::new(0);
}

/// Key that fails to encode on the node write for `BRITTLE`
///
/// The first encoding of a key is the width check at the top of insert; the
/// second is the write of the new node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
struct Brittle(u64);

impl Serialize for Brittle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 == BRITTLE {
            let calls = BRITTLE_ENCODES.with(|c| {
                c.set(c.get() + 1);
                c.get()
            });
            if calls >= 2 {
                return Err(S::Error::custom("write failed"));
            }
        }
        serializer.serialize_u64(self.0)
    }
}

#[test]
fn test_failed_node_write_leaves_list_intact() {
    let temp_dir = TempDir::new().unwrap();
    let mut list: SkipList<Brittle> =
        SkipList::open_named(&test_config(temp_dir.path()), "brittle").unwrap();
    list.insert(Brittle(1)).unwrap();
    list.insert(Brittle(50)).unwrap();
    let root_before = *list.root();

    // Would have become the new tail
    let result = list.insert(Brittle(BRITTLE));
    assert!(matches!(result, Err(SpanListError::Serialization(_))));

    assert_eq!(*list.root(), root_before);
    assert_eq!(list.len(), 2);
    assert_eq!(list.to_vec().unwrap(), vec![Brittle(1), Brittle(50)]);
    let last = list.rbegin();
    assert_eq!(list.get(last).unwrap(), Brittle(50));
    list.check_invariants().unwrap();

    // The unit carved for the failed node is handed to the next insert
    let grown = list.heap().file_len().unwrap();
    list.insert(Brittle(7)).unwrap();
    assert_eq!(list.heap().file_len().unwrap(), grown);
    assert_eq!(
        list.to_vec().unwrap(),
        vec![Brittle(1), Brittle(7), Brittle(50)]
    );
    list.check_invariants().unwrap();
}
