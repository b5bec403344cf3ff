use std::io::{self, Read, Write};
use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};
use std::os::unix::net::UnixStream;

use log::debug;

/// Number of attempts made to create the pair before giving up.
const CREATE_ATTEMPTS: usize = 3;

/// A connected pair of local endpoints, used to force `poll` to return.
///
/// The `source` end is polled for readability, writing to the `sink` end
/// makes it readable.
#[derive(Debug)]
pub struct WakeupPair {
    source: UnixStream,
    sink: UnixStream,
}

impl WakeupPair {
    /// Create a new pair, retrying on transient errors.
    pub fn new() -> io::Result<WakeupPair> {
        let mut attempt = 1;
        loop {
            match socket_pair() {
                Ok(pair) => return Ok(pair),
                Err(ref err) if attempt < CREATE_ATTEMPTS && is_transient(err) => {
                    debug!("retrying creation of wakeup pair: attempt={}, error={}", attempt, err);
                    attempt += 1;
                },
                Err(err) => return Err(err),
            }
        }
    }

    /// Descriptor to poll for readability.
    pub fn source_fd(&self) -> RawFd {
        self.source.as_raw_fd()
    }

    /// Make the source end readable.
    pub fn set(&self) -> io::Result<()> {
        match (&self.sink).write(&[1]) {
            Ok(_) => Ok(()),
            // A full buffer is as readable as it gets.
            Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => Ok(()),
            Err(err) => Err(err),
        }
    }

    /// Drain the source end so it's no longer readable.
    pub fn reset(&self) -> io::Result<()> {
        let mut buf = [0; 128];
        loop {
            match (&self.source).read(&mut buf) {
                Ok(0) => return Ok(()),
                Ok(_) => continue,
                Err(ref err) if err.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(ref err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }
    }
}

fn socket_pair() -> io::Result<WakeupPair> {
    let mut fds: [RawFd; 2] = [-1, -1];
    if unsafe { libc::socketpair(libc::AF_UNIX, libc::SOCK_STREAM, 0, fds.as_mut_ptr()) } == -1 {
        return Err(io::Error::last_os_error());
    }

    // Owned from here on, dropping closes both descriptors.
    let source = unsafe { UnixStream::from_raw_fd(fds[0]) };
    let sink = unsafe { UnixStream::from_raw_fd(fds[1]) };
    for fd in &fds {
        if unsafe { libc::fcntl(*fd, libc::F_SETFD, libc::FD_CLOEXEC) } == -1 {
            return Err(io::Error::last_os_error());
        }
    }
    source.set_nonblocking(true)?;
    sink.set_nonblocking(true)?;
    Ok(WakeupPair { source, sink })
}

fn is_transient(err: &io::Error) -> bool {
    match err.raw_os_error() {
        Some(libc::EINTR) | Some(libc::EAGAIN) | Some(libc::ENOBUFS) | Some(libc::ENOMEM) => true,
        _ => false,
    }
}
