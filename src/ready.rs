use bitflags::bitflags;

use crate::Interests;

bitflags! {
    /// A set of readiness operations.
    ///
    /// `Ready` is a set of operation descriptors indicating which kind of
    /// operation is ready to be performed on a selected [`Key`]. For example,
    /// `Ready::READABLE` indicates that the associated channel is ready to
    /// perform a read operation.
    ///
    /// `Ready` values can be combined together using the various bitwise
    /// operators.
    ///
    /// [`Key`]: crate::Key
    ///
    /// # Examples
    ///
    /// ```
    /// use polyselect::Ready;
    ///
    /// let ready = Ready::READABLE | Ready::WRITABLE;
    ///
    /// assert!(ready.is_readable());
    /// assert!(ready.is_writable());
    /// assert!(!ready.is_error());
    /// ```
    #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
    pub struct Ready: u8 {
        /// Readable readiness.
        const READABLE = 0b0000_0001;
        /// Writable readiness.
        const WRITABLE = 0b0000_0010;
        /// Error readiness.
        const ERROR    = 0b0000_0100;
    }
}

impl Ready {
    /// Returns true if the value includes readable readiness.
    #[inline]
    pub fn is_readable(self) -> bool {
        self.contains(Ready::READABLE)
    }

    /// Returns true if the value includes writable readiness.
    #[inline]
    pub fn is_writable(self) -> bool {
        self.contains(Ready::WRITABLE)
    }

    /// Returns true if the value includes error readiness.
    #[inline]
    pub fn is_error(self) -> bool {
        self.contains(Ready::ERROR)
    }

    /// Whether or not any operation in `interests` is ready.
    ///
    /// `ERROR` alone never matches, it only accompanies other operations.
    pub fn matches(self, interests: Interests) -> bool {
        !(self & Ready::from(interests)).is_empty()
    }
}

impl From<Interests> for Ready {
    fn from(interests: Interests) -> Ready {
        let mut ready = Ready::empty();
        if interests.is_readable() {
            ready |= Ready::READABLE;
        }
        if interests.is_writable() {
            ready |= Ready::WRITABLE;
        }
        ready
    }
}

bitflags! {
    /// Raw readiness as reported by a single native poll call.
    ///
    /// A descriptor reported in the readable set is translated with `READ`, in
    /// the writable set with `WRITE`, and in the errored set with all three
    /// flags: an error makes every operation worth attempting, the operation
    /// itself will report the actual error.
    #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
    pub struct RawEvents: u8 {
        /// Reported in the readable set.
        const READ  = 0b001;
        /// Reported in the writable set.
        const WRITE = 0b010;
        /// Reported in the errored set.
        const ERROR = 0b100;
    }
}

impl RawEvents {
    /// Raw events used for the errored set.
    pub(crate) const ERRORED: RawEvents = RawEvents::all();
}
