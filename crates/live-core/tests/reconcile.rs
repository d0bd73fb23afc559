use live_core::{LiveCollection, LiveCollectionOptions, Strategy};
use live_testing::{Harness, JournalEntry, JournalFactory};

/// Minimal keyed diff: walks `next` and moves, creates or trims items so the
/// collection ends up holding exactly `next`. Values are assumed unique.
fn reconcile<C>(collection: &mut C, next: &[&'static str])
where
    C: LiveCollection<Value = &'static str>,
{
    for (index, &value) in next.iter().enumerate() {
        if index < collection.length() && collection.at(index) == value {
            continue;
        }
        let found = (index + 1..collection.length()).find(|&at| collection.at(at) == value);
        match found {
            Some(from) => collection.move_item(from, index),
            None => {
                let item = collection.create(index, value);
                collection.attach(index, item);
            }
        }
    }
    while collection.length() > next.len() {
        let item = collection.detach(collection.length() - 1);
        collection.destroy(item);
    }
}

#[test]
fn passes_converge_on_the_requested_order() {
    let mut harness = Harness::new();

    let passes: [&[&'static str]; 4] = [
        &["a", "b", "c", "d"],
        &["d", "a", "c", "e"],
        &["e", "c"],
        &["x", "e", "y", "c", "z"],
    ];
    for next in passes {
        reconcile(&mut harness.collection, next);
        let results = harness.finish_pass();
        assert!(results.iter().all(Result::is_ok), "{results:?}");
        assert_eq!(harness.rendered(), next.to_vec());
        assert_eq!(harness.collection.length(), next.len());
    }
}

#[test]
fn moved_items_keep_their_identity() {
    let mut harness = Harness::new();
    reconcile(&mut harness.collection, &["a", "b", "c"]);
    harness.finish_pass();
    let before = harness.collection.mirror().to_vec();

    reconcile(&mut harness.collection, &["c", "a", "b"]);
    harness.finish_pass();
    let after = harness.collection.mirror().to_vec();

    assert_eq!(after, vec![before[2], before[0], before[1]]);
    assert_eq!(harness.collection.items().borrow().len(), 3);
}

#[test]
fn stamped_indexes_follow_a_reorder() {
    let mut harness = Harness::new();
    reconcile(&mut harness.collection, &["a", "b", "c"]);
    harness.finish_pass();
    harness.journal.take();

    reconcile(&mut harness.collection, &["c", "b", "a"]);
    harness.finish_pass();

    let mut refreshed: Vec<_> = harness
        .journal
        .take()
        .into_iter()
        .filter_map(|entry| match entry {
            JournalEntry::Refreshed { value, index } => Some((value, index)),
            JournalEntry::Destroyed { .. } => None,
        })
        .collect();
    refreshed.sort();
    assert_eq!(refreshed, vec![("a", 2), ("b", 1), ("c", 0)]);
}

#[test]
fn trimmed_items_are_destroyed_and_released() {
    let mut harness = Harness::new();
    reconcile(&mut harness.collection, &["a", "b", "c"]);
    harness.finish_pass();

    reconcile(&mut harness.collection, &["a"]);
    harness.finish_pass();

    let destroyed: Vec<_> = harness
        .journal
        .entries()
        .into_iter()
        .filter_map(|entry| match entry {
            JournalEntry::Destroyed { value } => Some(value),
            JournalEntry::Refreshed { .. } => None,
        })
        .collect();
    assert_eq!(destroyed, vec!["c", "b"]);
    assert_eq!(harness.collection.items().borrow().len(), 1);
    assert_eq!(harness.rendered(), vec!["a"]);
}

#[test]
fn tail_appends_skip_index_stamping() {
    let mut harness = Harness::new();
    reconcile(&mut harness.collection, &["a", "b"]);
    assert!(!harness.collection.needs_index_update());
    harness.finish_pass();

    reconcile(&mut harness.collection, &["a", "b", "c"]);
    assert!(!harness.collection.needs_index_update());
    harness.collection.update_indexes();
    assert_eq!(harness.collection.pending_len(), 1);
}

#[test]
fn forced_index_update_touches_every_item() {
    let mut harness = Harness::with_options(LiveCollectionOptions {
        force_index_update: true,
        ..LiveCollectionOptions::default()
    });
    reconcile(&mut harness.collection, &["a", "b"]);
    harness.finish_pass();

    reconcile(&mut harness.collection, &["a", "b", "c"]);
    harness.collection.update_indexes();
    assert_eq!(harness.collection.pending_len(), 3);
}

#[test]
fn every_unit_uses_the_configured_strategy() {
    let mut harness = Harness::with_options(LiveCollectionOptions {
        strategy: Strategy::Idle,
        ..LiveCollectionOptions::default()
    });
    reconcile(&mut harness.collection, &["a", "b", "c"]);
    harness.collection.flush();

    assert_eq!(harness.scheduler.strategies(), vec![Strategy::Idle; 3]);
}

#[test]
fn one_failing_item_does_not_block_the_rest() {
    let mut harness = Harness::with_factory(
        |journal| JournalFactory::new(journal).failing_when(|value: &&str| *value == "bad"),
        LiveCollectionOptions::default(),
    );
    reconcile(&mut harness.collection, &["a", "bad", "c"]);
    let results = harness.finish_pass();

    assert_eq!(results.iter().filter(|result| result.is_err()).count(), 1);
    assert_eq!(harness.rendered(), vec!["a", "bad", "c"]);
    assert_eq!(harness.journal.refreshed_values(), vec!["a", "c"]);
}

#[test]
fn updated_values_land_on_the_same_item() {
    let mut harness = Harness::new();
    reconcile(&mut harness.collection, &["a", "b"]);
    harness.finish_pass();
    let ids = harness.collection.mirror().to_vec();

    harness.collection.update_value(1, "B");
    harness.finish_pass();

    assert_eq!(harness.collection.mirror(), &ids[..]);
    assert_eq!(harness.rendered(), vec!["a", "B"]);
}
