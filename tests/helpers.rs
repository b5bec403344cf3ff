use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Duration;

use polyselect::unix::SelectableFd;
use polyselect::{Config, Id, Interests, Ready, Selector, DEFAULT_BATCH_SIZE};

mod util;

use self::util::{expect_selected, init, init_with_batch_size, select_within, stream_pair};

/// Not opened by anything, `poll` reports it as invalid.
const INVALID_FD: i32 = 1_000_000;

#[test]
fn helpers_follow_registrations() {
    let selector = init_with_batch_size(4);
    let mut keys = Vec::new();
    let mut peers = Vec::new();
    for n in 0..4 {
        let (stream, peer) = stream_pair();
        keys.push(selector.register(stream, Id(n), Interests::READABLE).unwrap());
        peers.push(peer);
        assert_eq!(selector.required_helpers(), 0);
    }

    let (stream, peer) = stream_pair();
    keys.push(selector.register(stream, Id(4), Interests::READABLE).unwrap());
    peers.push(peer);
    assert_eq!(selector.required_helpers(), 1);
    // Helpers are only spawned by select.
    assert_eq!(selector.helper_count(), 0);

    assert_eq!(selector.select_now().unwrap(), 0);
    assert_eq!(selector.helper_count(), 1);

    // Shrinks on the next select.
    selector.deregister(&keys[0]).unwrap();
    assert_eq!(selector.helper_count(), 1);
    assert_eq!(selector.select_now().unwrap(), 0);
    assert_eq!(selector.required_helpers(), 0);
    assert_eq!(selector.helper_count(), 0);

    // And grows again.
    let (stream, peer) = stream_pair();
    keys.push(selector.register(stream, Id(5), Interests::READABLE).unwrap());
    peers.push(peer);
    assert_eq!(selector.select_now().unwrap(), 0);
    assert_eq!(selector.helper_count(), 1);
}

#[test]
fn helpers_with_default_batch_size() {
    init();
    let selector = Selector::new().unwrap();
    // The descriptors are never polled.
    for n in 0..DEFAULT_BATCH_SIZE {
        let fd = INVALID_FD + n as i32;
        let _key = selector.register(Arc::new(SelectableFd(fd)), Id(n), Interests::READABLE).unwrap();
        assert_eq!(selector.required_helpers(), 0);
    }
    let fd = INVALID_FD + DEFAULT_BATCH_SIZE as i32;
    let key = selector.register(Arc::new(SelectableFd(fd)), Id(DEFAULT_BATCH_SIZE), Interests::READABLE).unwrap();
    assert_eq!(selector.required_helpers(), 1);
    assert_eq!(selector.len(), DEFAULT_BATCH_SIZE + 1);

    selector.close().unwrap();
    assert!(!key.is_valid());
}

#[test]
fn ready_in_multiple_sub_ranges() {
    let selector = init_with_batch_size(4);
    let mut keys = Vec::new();
    let mut peers = Vec::new();
    for n in 0..5 {
        let (stream, peer) = stream_pair();
        keys.push(selector.register(stream, Id(n), Interests::READABLE).unwrap());
        peers.push(peer);
    }
    assert_eq!(selector.required_helpers(), 1);

    // First and last, polled by different threads.
    peers[0].write_all(b"Hello").unwrap();
    peers[4].write_all(b"world").unwrap();
    select_within(&selector, Some(Duration::from_secs(5)), 2, Duration::from_secs(1));
    expect_selected(&selector, &[&keys[0], &keys[4]]);
    assert_eq!(keys[0].ready(), Ready::READABLE);
    assert_eq!(keys[4].ready(), Ready::READABLE);
}

#[test]
fn helper_ready_wakes_calling_thread() {
    let selector = init_with_batch_size(2);
    let mut keys = Vec::new();
    let mut streams = Vec::new();
    let mut peers = Vec::new();
    for n in 0..6 {
        let (stream, peer) = stream_pair();
        keys.push(selector.register(stream.clone(), Id(n), Interests::READABLE).unwrap());
        streams.push(stream);
        peers.push(peer);
    }
    assert_eq!(selector.required_helpers(), 2);

    // Only the last helper has something ready, it has to wake the others.
    peers[5].write_all(b"Hello world").unwrap();
    select_within(&selector, Some(Duration::from_secs(5)), 1, Duration::from_secs(1));
    expect_selected(&selector, &[&keys[5]]);
    assert_eq!(selector.helper_count(), 2);

    // Nothing ready any more, all pollers time out.
    let _ = selector.take_selected_keys();
    let mut buf = [0; 32];
    assert_eq!((&*streams[5]).read(&mut buf).unwrap(), 11);
    select_within(&selector, Some(Duration::from_millis(50)), 0, Duration::from_millis(50));
}

#[test]
fn invalid_descriptor_in_helper_range() {
    let selector = init_with_batch_size(1);
    let (stream, _peer) = stream_pair();
    let _key = selector.register(stream, Id(0), Interests::READABLE).unwrap();
    let key = selector.register(Arc::new(SelectableFd(INVALID_FD)), Id(1), Interests::READABLE).unwrap();
    assert_eq!(selector.required_helpers(), 1);

    select_within(&selector, Some(Duration::from_secs(5)), 1, Duration::from_secs(1));
    expect_selected(&selector, &[&key]);
    assert_eq!(key.ready(), Ready::READABLE | Ready::ERROR);
}

#[test]
fn helper_configuration() {
    init();
    let config = Config::default()
        .batch_size(1)
        .helper_stack_size(Some(256 * 1024))
        .helper_name("configured-helper");
    let selector = Selector::with_config(config).unwrap();

    let mut keys = Vec::new();
    let mut peers = Vec::new();
    for n in 0..3 {
        let (stream, peer) = stream_pair();
        keys.push(selector.register(stream, Id(n), Interests::WRITABLE).unwrap());
        peers.push(peer);
    }

    assert_eq!(selector.select(Some(Duration::from_secs(1))).unwrap(), 3);
    assert_eq!(selector.helper_count(), 2);
    expect_selected(&selector, &[&keys[0], &keys[1], &keys[2]]);
}

#[test]
fn close_stops_helpers() {
    let selector = init_with_batch_size(1);
    let mut keys = Vec::new();
    let mut peers = Vec::new();
    for n in 0..4 {
        let (stream, peer) = stream_pair();
        keys.push(selector.register(stream, Id(n), Interests::READABLE).unwrap());
        peers.push(peer);
    }
    assert_eq!(selector.select_now().unwrap(), 0);
    assert_eq!(selector.helper_count(), 3);

    selector.close().unwrap();
    assert_eq!(selector.helper_count(), 0);
    for key in &keys {
        assert!(!key.is_valid());
    }
}
