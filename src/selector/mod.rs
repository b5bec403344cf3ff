//! The selector engine.

use std::io;
use std::mem;
use std::os::unix::io::AsRawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{error, trace};
use parking_lot::Mutex;

use crate::{Config, Id, Interests, Key, Selectable};

mod batch;
mod gate;
mod index;
mod pool;
mod registry;
mod selected;
mod sub_poller;
mod wakeup;

use self::gate::{FinishGate, StartGate};
use self::pool::Pool;
use self::registry::Registry;
use self::selected::SelectedKeys;
use self::sub_poller::SubPoller;
use self::wakeup::Wakeup;

/// Readiness selector over any number of [`Selectable`] channels.
///
/// Registrations are polled in batches of [`Config::batch_size`] descriptors.
/// The first batch is polled by the thread calling [`select`], every other
/// batch by its own helper thread. Helpers are spawned and retired by
/// `select` as registrations come and go.
///
/// [`register`], [`deregister`], [`set_interests`] and [`wakeup`] can be
/// called from any thread, also while another thread is blocked in
/// [`select`]. Changes take effect from the next call to `select`.
///
/// [`select`]: Selector::select
/// [`register`]: Selector::register
/// [`deregister`]: Selector::deregister
/// [`set_interests`]: Selector::set_interests
/// [`wakeup`]: Selector::wakeup
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use std::io::Write;
/// use std::os::unix::net::UnixStream;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// use polyselect::{Id, Interests, Ready, Selector};
///
/// let selector = Selector::new()?;
///
/// let (stream, mut peer) = UnixStream::pair()?;
/// let key = selector.register(Arc::new(stream), Id(0), Interests::READABLE)?;
///
/// peer.write_all(b"Hello world")?;
///
/// let n = selector.select(Some(Duration::from_millis(100)))?;
/// assert_eq!(n, 1);
/// for selected in selector.take_selected_keys() {
///     assert_eq!(selected, key);
///     assert_eq!(selected.id(), Id(0));
///     assert!(selected.ready().contains(Ready::READABLE));
/// }
/// #     Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Selector {
    shared: Arc<Shared>,
}

/// State shared with the helper threads.
#[derive(Debug)]
pub(crate) struct Shared {
    /// `None` once closed. Guards all changes to the registrations.
    registry: Mutex<Option<Registry>>,
    /// Deregistered keys, removed from the registry at the next select or
    /// registration.
    cancelled: Mutex<Vec<Key>>,
    selected: Mutex<SelectedKeys>,
    wakeup: Arc<Wakeup>,
    start: StartGate,
    finish: FinishGate,
    /// Held for the duration of a select call.
    cycle: Mutex<Cycle>,
    /// Set by `close` before waking up an in-flight select.
    closing: AtomicBool,
    config: Config,
}

#[derive(Debug)]
struct Cycle {
    /// Polls sub-range 0.
    primary: SubPoller,
    pool: Pool,
    /// Number of the current select cycle.
    updates: u64,
}

impl Selector {
    /// Create a new `Selector` with the default [`Config`].
    pub fn new() -> io::Result<Selector> {
        Selector::with_config(Config::default())
    }

    /// Create a new `Selector` with the provided `config`.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error if `config` is invalid, or the error
    /// creating the wakeup socket pair.
    pub fn with_config(config: Config) -> io::Result<Selector> {
        config.validate()?;
        let wakeup = Wakeup::new()?;
        let registry = Registry::new(wakeup.source_fd(), config.batch_size);
        trace!("created selector: wakeup_fd={}, batch_size={}", wakeup.source_fd(), config.batch_size);
        Ok(Selector {
            shared: Arc::new(Shared {
                registry: Mutex::new(Some(registry)),
                cancelled: Mutex::new(Vec::new()),
                selected: Mutex::new(SelectedKeys::new()),
                wakeup: Arc::new(wakeup),
                start: StartGate::new(),
                finish: FinishGate::new(),
                cycle: Mutex::new(Cycle { primary: SubPoller::new(0), pool: Pool::new(), updates: 0 }),
                closing: AtomicBool::new(false),
                config,
            }),
        })
    }

    /// Register `channel` with `interests`.
    ///
    /// The selector holds on to the channel until it's deregistered, the
    /// channel's descriptor must stay open until then.
    ///
    /// # Errors
    ///
    /// Returns an `AlreadyExists` error if the channel's descriptor is
    /// already registered, or an error if the selector is closed.
    pub fn register<S>(&self, channel: Arc<S>, id: Id, interests: Interests) -> io::Result<Key>
        where S: Selectable + 'static,
    {
        let shared = &self.shared;
        let key = Key::new(id, channel, interests);
        trace!("registering channel: id={}, fd={}, interests={:?}", id, key.as_raw_fd(), interests);
        shared.with_registry(|registry| {
            // A pending deregistration may hold the same descriptor.
            shared.process_deregister_queue(registry);
            registry.register(key.clone())
        })??;
        Ok(key)
    }

    /// Deregister `key`.
    ///
    /// The key is invalidated immediately, the registration itself is removed
    /// at the start of the next call to [`select`] or [`register`], or when
    /// the selector is closed. Deregistering an invalid key does nothing.
    ///
    /// [`select`]: Selector::select
    /// [`register`]: Selector::register
    pub fn deregister(&self, key: &Key) -> io::Result<()> {
        self.shared.with_registry(|_| ())?;
        if key.invalidate() {
            trace!("deregistering channel: id={}, fd={}", key.id(), key.as_raw_fd());
            self.shared.cancelled.lock().push(key.clone());
        }
        Ok(())
    }

    /// Change the interests of `key`, taking effect from the next call to
    /// [`select`]. Does nothing if `key` is invalid.
    ///
    /// [`select`]: Selector::select
    pub fn set_interests(&self, key: &Key, interests: Interests) -> io::Result<()> {
        trace!("setting interests: id={}, interests={:?}", key.id(), interests);
        self.shared.with_registry(|registry| registry.put_event_ops(key, interests))
    }

    /// Wait for readiness of the registered channels.
    ///
    /// Blocks until a registered channel is ready, [`wakeup`] is called or
    /// `timeout` elapses. A `timeout` of `None` means no time limit. Keys found
    /// ready are added to the [selected keys], and their [ready operations]
    /// updated. Returns the number of keys added to the selected keys or
    /// whose ready operations gained an operation.
    ///
    /// If a wakeup is pending when called this returns `Ok(0)` without
    /// polling. Concurrent calls are serialized.
    ///
    /// [`wakeup`]: Selector::wakeup
    /// [selected keys]: Selector::selected_keys
    /// [ready operations]: Key::ready
    ///
    /// # Errors
    ///
    /// Returns an error if the selector is closed, or if polling failed for
    /// any of the batches. In the latter case the other batches are still
    /// polled to completion, but no keys are updated.
    pub fn select(&self, timeout: Option<Duration>) -> io::Result<usize> {
        let shared = &self.shared;
        let mut cycle = shared.cycle.lock();
        if shared.closing.load(Ordering::Acquire) {
            return Err(closed_error());
        }
        trace!("selecting: timeout={:?}", timeout);

        let required_helpers = shared.with_registry(|registry| {
            shared.process_deregister_queue(registry);
            registry.required_helpers()
        })?;

        if shared.wakeup.is_triggered() {
            trace!("wakeup pending, skipping poll");
            shared.wakeup.reset()?;
            return Ok(0);
        }

        let Cycle { primary, pool, updates } = &mut *cycle;
        pool.adjust(required_helpers, shared)?;
        shared.finish.reset(pool.len());
        shared.start.open(timeout);

        if let Err(err) = primary.poll(&shared.registry, timeout) {
            shared.finish.set_error(err);
        }
        if pool.len() != 0 {
            shared.finish.wait_for_helpers(&shared.wakeup);
        }

        shared.with_registry(|registry| shared.process_deregister_queue(registry))?;
        if let Err(err) = shared.finish.take_error() {
            // The first finisher signalled the wakeup.
            shared.wakeup.reset()?;
            return Err(err);
        }

        *updates += 1;
        let update = *updates;
        let mut updated = shared.with_registry(|registry| {
            let mut selected = shared.selected.lock();
            primary.process_selected_keys(update, registry, &mut selected, &shared.wakeup)
        })?;
        for poller in pool.pollers() {
            let mut poller = poller.lock();
            updated += shared.with_registry(|registry| {
                let mut selected = shared.selected.lock();
                poller.process_selected_keys(update, registry, &mut selected, &shared.wakeup)
            })?;
        }

        shared.wakeup.reset()?;
        trace!("selected: updated={}", updated);
        Ok(updated)
    }

    /// Poll every batch once without blocking.
    pub fn select_now(&self) -> io::Result<usize> {
        self.select(Some(Duration::from_millis(0)))
    }

    /// Make the current or next call to [`select`] return.
    ///
    /// Calls made before `select` observed the wakeup are coalesced.
    ///
    /// [`select`]: Selector::select
    pub fn wakeup(&self) -> io::Result<()> {
        self.shared.wakeup.signal()
    }

    /// Returns a handle to wake up this selector from another thread.
    pub fn waker(&self) -> Waker {
        Waker { wakeup: Arc::clone(&self.shared.wakeup) }
    }

    /// Returns the keys selected, and not yet removed.
    pub fn selected_keys(&self) -> Vec<Key> {
        self.shared.selected.lock().snapshot()
    }

    /// Remove and return all selected keys.
    pub fn take_selected_keys(&self) -> Vec<Key> {
        self.shared.selected.lock().take()
    }

    /// Remove `key` from the selected keys, returns false if it wasn't
    /// selected.
    pub fn remove_selected(&self, key: &Key) -> bool {
        self.shared.selected.lock().remove(key)
    }

    /// Returns the number of registrations, including those with a pending
    /// deregistration.
    pub fn len(&self) -> usize {
        self.shared.with_registry(|registry| registry.len()).unwrap_or(0)
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the keys of all registrations, including those with a pending
    /// deregistration.
    pub fn keys(&self) -> Vec<Key> {
        self.shared.with_registry(|registry| registry.keys()).unwrap_or_default()
    }

    /// Returns the number of helper threads.
    ///
    /// Helpers are spawned and retired by [`select`], this waits for an
    /// in-flight call to return.
    ///
    /// [`select`]: Selector::select
    pub fn helper_count(&self) -> usize {
        self.shared.cycle.lock().pool.len()
    }

    /// Returns the number of helper threads the next call to [`select`]
    /// needs for the current registrations.
    ///
    /// [`select`]: Selector::select
    pub fn required_helpers(&self) -> usize {
        self.shared.with_registry(|registry| registry.required_helpers()).unwrap_or(0)
    }

    /// Close the selector.
    ///
    /// Wakes up an in-flight call to [`select`] and waits for it to return.
    /// All keys are invalidated, the helper threads are stopped. Every later
    /// operation, other than `close`, returns an error.
    ///
    /// [`select`]: Selector::select
    pub fn close(&self) -> io::Result<()> {
        let shared = &self.shared;
        if shared.registry.lock().is_none() {
            return Ok(());
        }
        // Select calls from here on fail instead of polling.
        shared.closing.store(true, Ordering::Release);
        // Ignore the error, another thread closed the selector.
        let _ = shared.wakeup.signal();

        let mut cycle = shared.cycle.lock();
        let registry = match shared.registry.lock().take() {
            Some(registry) => registry,
            None => return Ok(()),
        };
        trace!("closing selector: registrations={}", registry.len());

        shared.wakeup.close();
        for record in registry.close() {
            record.key.invalidate();
        }
        shared.cancelled.lock().clear();
        shared.selected.lock().clear();

        let threads = cycle.pool.shutdown();
        shared.start.open(None);
        for thread in threads {
            pool::join(thread);
        }
        Ok(())
    }
}

impl Drop for Selector {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            error!("error closing selector: {}", err);
        }
    }
}

impl Shared {
    /// Run `f` with the registry, fails if closed.
    fn with_registry<F, T>(&self, f: F) -> io::Result<T>
        where F: FnOnce(&mut Registry) -> T,
    {
        self.registry.lock().as_mut().map(f).ok_or_else(closed_error)
    }

    fn process_deregister_queue(&self, registry: &mut Registry) {
        let cancelled = mem::replace(&mut *self.cancelled.lock(), Vec::new());
        if cancelled.is_empty() {
            return;
        }

        let mut selected = self.selected.lock();
        for key in cancelled {
            if registry.deregister(&key).is_some() {
                trace!("removed registration: id={}, fd={}", key.id(), key.as_raw_fd());
            }
            selected.remove(&key);
        }
    }
}

/// Handle to wake up a [`Selector`] from any thread.
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use std::thread;
///
/// use polyselect::Selector;
///
/// let selector = Selector::new()?;
/// let waker = selector.waker();
///
/// let handle = thread::spawn(move || waker.wake());
///
/// // Returns once woken.
/// let n = selector.select(None)?;
/// assert_eq!(n, 0);
/// handle.join().unwrap()?;
/// #     Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct Waker {
    wakeup: Arc<Wakeup>,
}

impl Waker {
    /// Wake up the selector, see [`Selector::wakeup`].
    ///
    /// # Errors
    ///
    /// Returns an error if the selector is closed.
    pub fn wake(&self) -> io::Result<()> {
        self.wakeup.signal()
    }
}

pub(crate) fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "selector closed")
}
