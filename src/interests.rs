use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Interests used in registering.
///
/// Interests are used in [registering] [`Selectable`] channels with a
/// [`Selector`], they indicate what readiness should be monitored for. For
/// example if a socket is registered with [readable] interests and the socket
/// becomes writable, the key will not be selected.
///
/// Unlike readiness, interests may be empty. A key with empty interests stays
/// registered, but is never selected until its interests are [changed].
///
/// [registering]: crate::Selector::register
/// [`Selectable`]: crate::Selectable
/// [`Selector`]: crate::Selector
/// [readable]: Interests::READABLE
/// [changed]: crate::Selector::set_interests
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Interests(u8);

const READABLE: u8 = 1 << 0;
const WRITABLE: u8 = 1 << 1;

impl Interests {
    /// No interests.
    pub const EMPTY: Interests = Interests(0);

    /// Readable interest.
    pub const READABLE: Interests = Interests(READABLE);

    /// Writable interest.
    pub const WRITABLE: Interests = Interests(WRITABLE);

    /// Both readable and writable interests.
    pub const BOTH: Interests = Interests(READABLE | WRITABLE);

    /// Returns true if the value includes readable interest.
    #[inline]
    pub fn is_readable(self) -> bool {
        (self.0 & READABLE) != 0
    }

    /// Returns true if the value includes writable interest.
    #[inline]
    pub fn is_writable(self) -> bool {
        (self.0 & WRITABLE) != 0
    }

    /// Returns true if no interest is set.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Raw bits, used to store interests in an atomic.
    pub(crate) fn bits(self) -> u8 {
        self.0
    }

    /// Inverse of `bits`, unknown bits are dropped.
    pub(crate) fn from_bits_truncate(bits: u8) -> Interests {
        Interests(bits & (READABLE | WRITABLE))
    }

    /// Native `poll(2)` events for these interests.
    ///
    /// `POLLPRI` is always requested, urgent data must show up in the errored
    /// set so it can be discarded.
    pub(crate) fn to_poll_events(self) -> libc::c_short {
        let mut events = libc::POLLPRI;
        if self.is_readable() {
            events |= libc::POLLIN;
        }
        if self.is_writable() {
            events |= libc::POLLOUT;
        }
        events
    }
}

impl BitOr for Interests {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Interests(self.0 | rhs.0)
    }
}

impl BitOrAssign for Interests {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for Interests {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match (self.is_readable(), self.is_writable()) {
            (true, true) => f.write_str("READABLE | WRITABLE"),
            (true, false) => f.write_str("READABLE"),
            (false, true) => f.write_str("WRITABLE"),
            (false, false) => f.write_str("EMPTY"),
        }
    }
}
