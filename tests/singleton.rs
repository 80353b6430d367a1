//! The coordinator is created once per process, whoever asks first.

use sigterm_handler::instance;
use std::thread;
use std::time::Duration;

#[test]
fn test_concurrent_first_callers_share_one_instance() {
    let addresses: Vec<usize> = (0..8)
        .map(|_| thread::spawn(|| instance().unwrap() as *const _ as usize))
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    let first = addresses[0];
    assert!(addresses.iter().all(|address| *address == first));
    assert_eq!(instance().unwrap() as *const _ as usize, first);
}

#[test]
fn test_configuration_is_shared_between_callers() {
    instance().unwrap().set_timeout(Duration::from_secs(42));
    let seen = thread::spawn(|| instance().unwrap().timeout()).join().unwrap();
    assert_eq!(seen, Some(Duration::from_secs(42)));

    instance().unwrap().clear_timeout();
    assert_eq!(instance().unwrap().timeout(), None);
    assert!(!instance().unwrap().is_shutdown_requested());
}
