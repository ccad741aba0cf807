//! SQLite run store tests.

use vp_events_core::{
    aggregate_output, apply_labeler, store::RunStore, types::new_run_id, EventsGenerator,
    ProfileLabeler, RunConfig,
};

fn migrated() -> RunStore {
    let store = RunStore::in_memory().unwrap();
    store.migrate().unwrap();
    store
}

#[test]
fn run_header_round_trips_with_a_large_seed() {
    let store = migrated();
    let run_id = new_run_id();
    store
        .insert_run(&run_id, "generate", Some(u64::MAX - 3), "0.1.0")
        .unwrap();

    let run = store.get_run(&run_id).unwrap().expect("run stored");
    assert_eq!(run.kind, "generate");
    assert_eq!(run.seed, Some(u64::MAX - 3));
    assert_eq!(run.version, "0.1.0");
    assert!(store.get_run("run-missing").unwrap().is_none());
}

#[test]
fn events_come_back_in_generation_order() {
    let config = RunConfig::default_test();
    let mut generator = EventsGenerator::new(&config.generator).unwrap();
    let events = generator.take_events(&config.event, 20).unwrap();

    let mut store = migrated();
    let run_id = new_run_id();
    store
        .insert_run(&run_id, "generate", Some(generator.seed()), "0.1.0")
        .unwrap();
    store.insert_events(&run_id, &events).unwrap();

    assert_eq!(store.event_count(&run_id).unwrap(), 20);
    assert_eq!(store.events_for_run(&run_id).unwrap(), events);
}

#[test]
fn duplicate_event_ids_in_a_run_are_refused() {
    let config = RunConfig::default_test();
    let mut generator = EventsGenerator::new(&config.generator).unwrap();
    let event = generator.get_event(&config.event).unwrap();

    let mut store = migrated();
    let run_id = new_run_id();
    store.insert_run(&run_id, "generate", None, "0.1.0").unwrap();
    assert!(store
        .insert_events(&run_id, &[event.clone(), event])
        .is_err());
    assert_eq!(store.event_count(&run_id).unwrap(), 0, "transaction rolled back");
}

#[test]
fn report_round_trips_with_labels() {
    let config = RunConfig::default_test();
    let mut generator = EventsGenerator::new(&config.generator).unwrap();
    let events = generator.take_events(&config.event, 50).unwrap();
    let outputs = apply_labeler(&ProfileLabeler::new(30).unwrap(), &events).unwrap();
    let report = aggregate_output(&outputs.outputs);

    let mut store = migrated();
    let run_id = new_run_id();
    store.insert_run(&run_id, "apply", None, "0.1.0").unwrap();
    store.insert_report(&run_id, &report).unwrap();

    let loaded = store.report_for_run(&run_id).unwrap();
    assert_eq!(loaded, report);
    assert_eq!(loaded.total().unwrap().attrs, None);
}

#[test]
fn file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("runs.db");
    let path = path.to_str().unwrap();
    let run_id = new_run_id();
    {
        let store = RunStore::open(path).unwrap();
        store.migrate().unwrap();
        store.insert_run(&run_id, "aggregate", None, "0.1.0").unwrap();
    }
    let store = RunStore::open(path).unwrap();
    store.migrate().unwrap();
    let run = store.get_run(&run_id).unwrap().expect("run persisted");
    assert_eq!(run.seed, None);
    assert_eq!(run.kind, "aggregate");
}
