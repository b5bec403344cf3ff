//! Collection of testing utilities.

// Not all functions are used in all tests, causing warnings of unused functions
// while other tests are actually using them.
#![allow(dead_code)]

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::os::unix::net::UnixStream;
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};
use std::{fmt, io};

use polyselect::{Config, Key, Selector};

/// Allowed margin for deadlines to be overrun.
pub const TIMEOUT_MARGIN: Duration = Duration::from_millis(50);

static LOGGER: Once = Once::new();

/// Initialise the test setup, things like logging etc.
pub fn init() {
    LOGGER.call_once(std_logger::init);
}

/// Initialise the test setup (same as `init`) and create a `Selector`.
pub fn init_with_selector() -> Selector {
    init();
    Selector::new().expect("unable to create Selector")
}

/// Initialise the test setup (same as `init`) and create a `Selector` polling
/// at most `batch_size` descriptors per thread.
pub fn init_with_batch_size(batch_size: usize) -> Selector {
    init();
    let config = Config::default().batch_size(batch_size).helper_name("test-helper");
    Selector::with_config(config).expect("unable to create Selector")
}

/// Create a connected, non-blocking Unix stream pair, the first stream wrapped
/// ready for registering.
pub fn stream_pair() -> (Arc<UnixStream>, UnixStream) {
    let (stream, peer) = UnixStream::pair().expect("unable to create stream pair");
    stream.set_nonblocking(true).expect("unable to set non-blocking");
    peer.set_nonblocking(true).expect("unable to set non-blocking");
    (Arc::new(stream), peer)
}

/// Create a connected TCP stream pair on localhost.
pub fn tcp_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind(any_local_address()).expect("unable to bind");
    let client = TcpStream::connect(listener.local_addr().unwrap()).expect("unable to connect");
    let (server, _) = listener.accept().expect("unable to accept");
    (client, server)
}

/// Call `select` and assert it returns `expected` within `deadline` (plus
/// the margin).
pub fn select_within(selector: &Selector, timeout: Option<Duration>, expected: usize, deadline: Duration) {
    let start = Instant::now();
    let n = selector.select(timeout).expect("unable to select");
    let elapsed = start.elapsed();
    assert_eq!(n, expected, "unexpected number of updated keys");
    #[cfg(not(feature = "disable_test_deadline"))]
    assert!(elapsed <= deadline + TIMEOUT_MARGIN,
        "select took too long: {:?}, wanted at most: {:?}", elapsed, deadline);
    #[cfg(feature = "disable_test_deadline")]
    drop((elapsed, deadline));
}

/// Assert that the selected keys equal `expected`, ignoring order.
pub fn expect_selected(selector: &Selector, expected: &[&Key]) {
    let selected = selector.selected_keys();
    assert_eq!(selected.len(), expected.len(), "unexpected selected keys: {:?}", selected);
    for key in expected {
        assert!(selected.contains(*key), "missing selected key: {:?}, got: {:?}", key, selected);
    }
}

/// Assert that `result` is an error and the formatted error (via
/// `fmt::Display`) equals `expected_msg`.
pub fn assert_error<T, E: fmt::Display>(result: Result<T, E>, expected_msg: &str) {
    match result {
        Ok(_) => panic!("unexpected OK result"),
        Err(err) => assert!(err.to_string().contains(expected_msg),
            "wanted: {}, got: {}", expected_msg, err),
    }
}

/// Assert that the provided result is an `io::Error` with kind `kind`.
pub fn assert_error_kind<T>(result: io::Result<T>, kind: io::ErrorKind) {
    match result {
        Ok(_) => panic!("unexpected OK result, expected a `{:?}` error", kind),
        Err(ref err) if err.kind() == kind => {},
        Err(err) => panic!("unexpected error result: {}", err),
    }
}

/// Bind to any port on localhost.
pub fn any_local_address() -> SocketAddr {
    "127.0.0.1:0".parse().unwrap()
}
