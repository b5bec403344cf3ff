use std::io;
use std::os::unix::io::RawFd;

use log::trace;
use parking_lot::Mutex;

use super::closed_error;
use crate::sys::WakeupPair;

/// Wakeup mechanism shared by the selector, its helpers and any [`Waker`].
///
/// The `triggered` flag and the pair are guarded by the same lock, so the
/// pair's source end is readable if and only if `triggered` is set.
///
/// [`Waker`]: crate::Waker
#[derive(Debug)]
pub(crate) struct Wakeup {
    state: Mutex<State>,
    source_fd: RawFd,
}

#[derive(Debug)]
struct State {
    /// `None` once closed.
    pair: Option<WakeupPair>,
    triggered: bool,
}

impl Wakeup {
    pub(crate) fn new() -> io::Result<Wakeup> {
        let pair = WakeupPair::new()?;
        let source_fd = pair.source_fd();
        Ok(Wakeup {
            state: Mutex::new(State { pair: Some(pair), triggered: false }),
            source_fd,
        })
    }

    /// Descriptor installed in slot 0 of every sub-range.
    pub(crate) fn source_fd(&self) -> RawFd {
        self.source_fd
    }

    /// Force all pollers to return. Does nothing if already triggered, fails
    /// once closed.
    pub(crate) fn signal(&self) -> io::Result<()> {
        let mut state = self.state.lock();
        let pair = state.pair.as_ref().ok_or_else(closed_error)?;
        if state.triggered {
            return Ok(());
        }
        trace!("signalling wakeup");
        pair.set()?;
        state.triggered = true;
        Ok(())
    }

    pub(crate) fn is_triggered(&self) -> bool {
        self.state.lock().triggered
    }

    /// Called when a poller found the source end readable.
    pub(crate) fn mark_triggered(&self) {
        self.state.lock().triggered = true;
    }

    /// Drain the pair and clear the flag, if triggered.
    pub(crate) fn reset(&self) -> io::Result<()> {
        let mut state = self.state.lock();
        if !state.triggered {
            return Ok(());
        }
        if let Some(pair) = state.pair.as_ref() {
            trace!("resetting wakeup");
            pair.reset()?;
            state.triggered = false;
        }
        Ok(())
    }

    /// Close both ends of the pair, all later signals fail.
    pub(crate) fn close(&self) {
        let mut state = self.state.lock();
        state.pair = None;
        state.triggered = true;
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Duration;

    use crate::sys::{poll, ReadySets};

    use super::Wakeup;

    fn is_readable(wakeup: &Wakeup) -> bool {
        let mut fds = [libc::pollfd { fd: wakeup.source_fd(), events: libc::POLLIN, revents: 0 }];
        let mut ready = ReadySets::default();
        poll(&mut fds, &mut ready, Some(Duration::from_millis(0))).unwrap();
        ready.readable.contains(&wakeup.source_fd())
    }

    #[test]
    fn signal_and_reset() {
        let wakeup = Wakeup::new().unwrap();
        assert!(!wakeup.is_triggered());
        assert!(!is_readable(&wakeup));

        wakeup.signal().unwrap();
        assert!(wakeup.is_triggered());
        assert!(is_readable(&wakeup));

        // Signalling again is a no-op.
        wakeup.signal().unwrap();
        wakeup.reset().unwrap();
        assert!(!wakeup.is_triggered());
        assert!(!is_readable(&wakeup));
    }

    #[test]
    fn reset_not_triggered() {
        let wakeup = Wakeup::new().unwrap();
        wakeup.reset().unwrap();
        assert!(!wakeup.is_triggered());
    }

    #[test]
    fn signal_after_close() {
        let wakeup = Wakeup::new().unwrap();
        wakeup.close();
        wakeup.reset().unwrap();
        let err = wakeup.signal().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::Other);
        assert_eq!(err.to_string(), "selector closed");
    }
}
