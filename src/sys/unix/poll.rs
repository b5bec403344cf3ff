use std::cmp::min;
use std::io;
use std::os::unix::io::RawFd;
use std::time::Duration;

/// Descriptors reported ready by a single call to [`poll`].
#[derive(Debug, Default)]
pub struct ReadySets {
    pub readable: Vec<RawFd>,
    pub writable: Vec<RawFd>,
    pub errored: Vec<RawFd>,
}

impl ReadySets {
    pub fn clear(&mut self) {
        self.readable.clear();
        self.writable.clear();
        self.errored.clear();
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.readable.is_empty() && self.writable.is_empty() && self.errored.is_empty()
    }
}

/// Poll a batch of descriptors, splitting the results into `ready`.
///
/// Returns the number of descriptors that were ready. An interrupted call
/// (`EINTR`) is reported as zero ready descriptors.
pub fn poll(fds: &mut [libc::pollfd], ready: &mut ReadySets, timeout: Option<Duration>) -> io::Result<usize> {
    ready.clear();
    let timeout_ms = duration_to_millis(timeout);

    let n = unsafe { libc::poll(fds.as_mut_ptr(), fds.len() as libc::nfds_t, timeout_ms) };
    match n {
        -1 => {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                Ok(0)
            } else {
                Err(err)
            }
        },
        0 => Ok(0), // Reached the time limit, no descriptors are ready.
        n => {
            for pollfd in fds.iter().filter(|pollfd| pollfd.revents != 0) {
                split_revents(pollfd, ready);
            }
            Ok(n as usize)
        },
    }
}

/// Add the descriptor of `pollfd` to the sets matching its `revents`.
fn split_revents(pollfd: &libc::pollfd, ready: &mut ReadySets) {
    let revents = pollfd.revents;
    let read_interest = contains_flag(pollfd.events, libc::POLLIN);

    // A hang up only means something to a reader, anyone else gets to learn
    // about it from the error returned by the next operation.
    if contains_flag(revents, libc::POLLIN) || (read_interest && contains_flag(revents, libc::POLLHUP)) {
        ready.readable.push(pollfd.fd);
    }

    if contains_flag(revents, libc::POLLOUT) {
        ready.writable.push(pollfd.fd);
    }

    if contains_flag(revents, libc::POLLERR | libc::POLLPRI | libc::POLLNVAL) ||
        (!read_interest && contains_flag(revents, libc::POLLHUP))
    {
        ready.errored.push(pollfd.fd);
    }
}

/// Whether or not the provided `flags` contains the provided `flag`.
fn contains_flag(flags: libc::c_short, flag: libc::c_short) -> bool {
    (flags & flag) != 0
}

const MILLIS_PER_SEC: u64 = 1_000;
const NANOS_PER_MILLI: u32 = 1_000_000;

/// Convert a timeout into milliseconds for `poll(2)`.
///
/// `None` means block without a timeout (-1), partial milliseconds are
/// rounded up so we never wake up before the deadline. A zero duration stays
/// zero, making the call non-blocking.
pub fn duration_to_millis(timeout: Option<Duration>) -> libc::c_int {
    let duration = match timeout {
        Some(duration) => duration,
        None => return -1,
    };

    let mut millis = duration.as_secs().saturating_mul(MILLIS_PER_SEC)
        .saturating_add(u64::from(duration.subsec_nanos() / NANOS_PER_MILLI));
    if duration.subsec_nanos() % NANOS_PER_MILLI != 0 {
        millis = millis.saturating_add(1);
    }
    min(millis, libc::c_int::max_value() as u64) as libc::c_int
}
