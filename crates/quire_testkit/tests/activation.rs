//! Activation tests.

use quire_core::{Activator, Backend, Key, RawTextCollector};
use quire_testkit::prelude::*;
use std::sync::Arc;

#[test]
fn output_is_independent_of_activation() {
    let module = TestModule::genesis();
    let backend = Arc::new(module.backend());
    let v11n = backend.metadata().versification().clone();
    let key = Key::parse(&v11n, "Gen 2:2-4:1; Gen 5").unwrap();
    let activator = Activator::new();

    let read = || {
        backend
            .raw_text(&key, &mut RawTextCollector::new(v11n.clone()).with_headings(true))
            .unwrap()
    };

    let never = read();
    activator.activate(backend.clone());
    let active = read();
    activator.deactivate(&backend);
    let after = read();
    activator.activate(backend.clone());
    activator.deactivate_all();
    let again = read();

    assert_eq!(never, active);
    assert_eq!(active, after);
    assert_eq!(after, again);
}

#[test]
fn activator_drives_transitions_once() {
    let spy = Arc::new(SpyBackend::new().with_all_texts());
    let activator = Activator::new();

    assert!(activator.activate(spy.clone()));
    assert!(!activator.activate(spy.clone()));
    assert_eq!(spy.activations(), 1);

    assert!(activator.deactivate(&spy));
    assert!(!activator.deactivate(&spy));
    assert_eq!(spy.deactivations(), 1);
    assert_eq!(activator.active_count(), 0);
}

#[test]
fn reads_never_activate() {
    let spy = SpyBackend::new().with_all_texts();
    let v11n = spy.metadata().versification().clone();
    spy.raw_text(&Key::parse(&v11n, "Exo").unwrap(), &mut RawTextCollector::new(v11n))
        .unwrap();

    assert_eq!(spy.activations(), 0);
    assert_eq!(spy.deactivations(), 0);
}
