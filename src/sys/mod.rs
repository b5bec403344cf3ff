//! Platform specific types.
//!
//! Each platform must have at least the following:
//!
//! * `poll`: the native batch-poll primitive, filling a `ReadySets`.
//! * `ReadySets`: the readable, writable and errored descriptor sets of a
//!   single poll call.
//! * `WakeupPair`: a connected pair of endpoints used to interrupt `poll`.
//! * `discard_urgent_data` and `is_stream_socket`: the urgent data probe.
//! * `SelectableFd`: adapter to register a raw descriptor.

#[cfg(unix)]
mod unix;

#[cfg(unix)]
pub use self::unix::*;
