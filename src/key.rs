use std::fmt;
use std::hash::{Hash, Hasher};
use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use crate::{Interests, RawEvents, Ready};

/// Associates a [`Key`] with the user's own bookkeeping.
///
/// `Id` is an argument to [`Selector::register`] and is returned by
/// [`Key::id`]. It is effectively opaque to the [`Selector`], it does not have
/// to be unique.
///
/// [`Selector`]: crate::Selector
/// [`Selector::register`]: crate::Selector::register
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Id(pub usize);

impl From<usize> for Id {
    fn from(val: usize) -> Id {
        Id(val)
    }
}

impl From<Id> for usize {
    fn from(val: Id) -> usize {
        val.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A channel that may be registered with a [`Selector`].
///
/// The only required capability is access to the underlying file descriptor.
/// Channels with their own notion of readiness, e.g. a socket that should
/// report a pending connect as writable only once, can override
/// [`translate_ready_ops`].
///
/// [`Selector`]: crate::Selector
/// [`translate_ready_ops`]: Selectable::translate_ready_ops
///
/// # Examples
///
/// Implementing `Selectable` for a type wrapping a file descriptor.
///
/// ```
/// use std::os::unix::io::{AsRawFd, RawFd};
///
/// use polyselect::Selectable;
///
/// pub struct MyChannel {
///     fd: RawFd,
/// }
///
/// impl AsRawFd for MyChannel {
///     fn as_raw_fd(&self) -> RawFd {
///         self.fd
///     }
/// }
///
/// // Use the default readiness translation.
/// impl Selectable for MyChannel {}
/// # drop(MyChannel { fd: 0 });
/// ```
pub trait Selectable: AsRawFd + Send + Sync {
    /// Translate raw readiness from a native poll call into readiness
    /// operations, given the key's current `interests`.
    ///
    /// The default maps the errored set to every interested operation plus
    /// [`Ready::ERROR`], and readable and writable to [`Ready::READABLE`] and
    /// [`Ready::WRITABLE`] if interested.
    fn translate_ready_ops(&self, raw: RawEvents, interests: Interests) -> Ready {
        translate_ready_ops(raw, interests)
    }
}

/// Default readiness translation, see [`Selectable::translate_ready_ops`].
pub fn translate_ready_ops(raw: RawEvents, interests: Interests) -> Ready {
    if raw.contains(RawEvents::ERROR) {
        return Ready::from(interests) | Ready::ERROR;
    }

    let mut ready = Ready::empty();
    if raw.contains(RawEvents::READ) && interests.is_readable() {
        ready |= Ready::READABLE;
    }
    if raw.contains(RawEvents::WRITE) && interests.is_writable() {
        ready |= Ready::WRITABLE;
    }
    ready
}

/// Registration of a [`Selectable`] channel with a [`Selector`].
///
/// A `Key` is returned by [`Selector::register`] and is cheap to clone, all
/// clones refer to the same registration. It holds on to the channel until
/// the key is dropped, even after it has been [deregistered].
///
/// Two keys are equal if they refer to the same registration.
///
/// [`Selector`]: crate::Selector
/// [`Selector::register`]: crate::Selector::register
/// [deregistered]: crate::Selector::deregister
#[derive(Clone)]
pub struct Key {
    inner: Arc<KeyInner>,
}

struct KeyInner {
    id: Id,
    fd: RawFd,
    channel: Arc<dyn Selectable>,
    interests: AtomicU8,
    ready: AtomicU8,
    valid: AtomicBool,
}

impl Key {
    pub(crate) fn new(id: Id, channel: Arc<dyn Selectable>, interests: Interests) -> Key {
        Key {
            inner: Arc::new(KeyInner {
                id,
                fd: channel.as_raw_fd(),
                channel,
                interests: AtomicU8::new(interests.bits()),
                ready: AtomicU8::new(0),
                valid: AtomicBool::new(true),
            }),
        }
    }

    /// Returns the id supplied when registering.
    pub fn id(&self) -> Id {
        self.inner.id
    }

    /// Returns the registered channel.
    pub fn channel(&self) -> &Arc<dyn Selectable> {
        &self.inner.channel
    }

    /// Returns the current interests.
    pub fn interests(&self) -> Interests {
        Interests::from_bits_truncate(self.inner.interests.load(Ordering::Acquire))
    }

    /// Returns the readiness operations as of the last [`select`] call that
    /// updated this key.
    ///
    /// [`select`]: crate::Selector::select
    pub fn ready(&self) -> Ready {
        Ready::from_bits_truncate(self.inner.ready.load(Ordering::Acquire))
    }

    /// Whether or not the key is still registered.
    pub fn is_valid(&self) -> bool {
        self.inner.valid.load(Ordering::Acquire)
    }

    pub(crate) fn set_interests(&self, interests: Interests) {
        self.inner.interests.store(interests.bits(), Ordering::Release);
    }

    /// Marks the key as no longer registered, returns false if it already was.
    pub(crate) fn invalidate(&self) -> bool {
        self.inner.valid.swap(false, Ordering::AcqRel)
    }

    /// Overwrite the ready operations with the translation of `raw`. Returns
    /// true if an operation became ready that wasn't before.
    pub(crate) fn translate_and_set_ready_ops(&self, raw: RawEvents) -> bool {
        self.translate(raw, Ready::empty())
    }

    /// Add the translation of `raw` to the current ready operations. Returns
    /// true if an operation became ready that wasn't before.
    pub(crate) fn translate_and_update_ready_ops(&self, raw: RawEvents) -> bool {
        self.translate(raw, self.ready())
    }

    fn translate(&self, raw: RawEvents, initial: Ready) -> bool {
        let new = initial | self.inner.channel.translate_ready_ops(raw, self.interests());
        let old = Ready::from_bits_truncate(self.inner.ready.swap(new.bits(), Ordering::AcqRel));
        !(new & !old).is_empty()
    }
}

impl AsRawFd for Key {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.fd
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Key) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.inner) as usize).hash(state)
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Key")
            .field("id", &self.inner.id)
            .field("fd", &self.inner.fd)
            .field("interests", &self.interests())
            .field("ready", &self.ready())
            .field("valid", &self.is_valid())
            .finish()
    }
}
