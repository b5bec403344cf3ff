//! A readiness selector for any number of descriptors.
//!
//! The core of the library is [`Selector`], which waits for readiness of the
//! [`Selectable`] channels registered with it. `poll(2)` is used to poll the
//! channels, in batches of a limited size ([`Config::batch_size`]). The first
//! batch is polled on the thread calling [`Selector::select`], all others on
//! helper threads. A single call to `select` waits for all batches at the same
//! time, and returns as soon as any of them has a ready channel.
//!
//! # Usage
//!
//! Create a [`Selector`] and [register] one or more channels with it, using an
//! [`Id`] to link the returned [`Key`] to your own bookkeeping. Next [select]
//! in a loop, after each call the [selected keys] hold the keys that are
//! ready along with their [ready operations]. Keys stay selected until they
//! are removed, e.g. using [`Selector::take_selected_keys`].
//!
//! To stop waiting from another thread use [`Selector::wakeup`] or a
//! [`Waker`].
//!
//! [register]: Selector::register
//! [select]: Selector::select
//! [selected keys]: Selector::selected_keys
//! [ready operations]: Key::ready
//!
//! # Examples
//!
//! A simple TCP server accepting connections and echoing what it receives.
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use std::collections::HashMap;
//! use std::io::{self, Read, Write};
//! use std::net::{TcpListener, TcpStream};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use polyselect::{Id, Interests, Selector};
//!
//! // An id to recognise the listener's key.
//! const SERVER_ID: Id = Id(0);
//!
//! let selector = Selector::new()?;
//!
//! let listener = TcpListener::bind("127.0.0.1:0")?;
//! listener.set_nonblocking(true)?;
//! let listener = Arc::new(listener);
//! selector.register(Arc::clone(&listener), SERVER_ID, Interests::READABLE)?;
//!
//! // Connect a client so there is something to do.
//! let mut client = TcpStream::connect(listener.local_addr()?)?;
//! client.write_all(b"Hello world")?;
//!
//! let mut connections: HashMap<Id, Arc<TcpStream>> = HashMap::new();
//! let mut next_id = Id(1);
//!
//! # let mut iterations = 0;
//! loop {
//! #   iterations += 1;
//! #   if iterations > 10 { return Ok(()) }
//!     selector.select(Some(Duration::from_millis(100)))?;
//!
//!     for key in selector.take_selected_keys() {
//!         match key.id() {
//!             SERVER_ID => loop {
//!                 // Accept connections until we hit a would block error.
//!                 let (stream, _) = match listener.accept() {
//!                     Ok(connection) => connection,
//!                     Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => break,
//!                     Err(err) => return Err(err.into()),
//!                 };
//!                 stream.set_nonblocking(true)?;
//!                 let stream = Arc::new(stream);
//!                 selector.register(Arc::clone(&stream), next_id, Interests::READABLE)?;
//!                 connections.insert(next_id, stream);
//!                 next_id = Id(next_id.0 + 1);
//!             },
//!             id => {
//!                 // Echo back whatever we received.
//!                 let stream = match connections.get(&id) {
//!                     Some(stream) => stream,
//!                     None => continue,
//!                 };
//!                 let mut buf = [0; 1024];
//!                 match (&**stream).read(&mut buf) {
//!                     Ok(0) => {
//!                         selector.deregister(&key)?;
//!                         drop(connections.remove(&id));
//!                     },
//!                     Ok(n) => (&**stream).write_all(&buf[..n])?,
//!                     Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => {},
//!                     Err(err) => return Err(err.into()),
//!                 }
//!             },
//!         }
//!     }
//! }
//! # }
//! ```

#![warn(anonymous_parameters,
        bare_trait_objects,
        missing_debug_implementations,
        missing_docs,
        trivial_numeric_casts,
        unused_extern_crates,
        unused_import_braces,
        unused_qualifications,
        variant_size_differences,
)]

// Disallow warnings in examples, we want to set a good example after all.
#![doc(test(attr(deny(warnings))))]

#[cfg(not(unix))]
compile_error!("polyselect only supports Unix-like platforms");

mod config;
mod interests;
mod key;
mod ready;
mod selector;
mod sys;

pub mod net;

#[cfg(unix)]
pub mod unix {
    //! Unix only extensions.

    pub use crate::sys::SelectableFd;
}

pub use crate::config::{Config, DEFAULT_BATCH_SIZE};
pub use crate::interests::Interests;
pub use crate::key::{translate_ready_ops, Id, Key, Selectable};
pub use crate::ready::{RawEvents, Ready};
pub use crate::selector::{Selector, Waker};
