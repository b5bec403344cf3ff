use std::mem::size_of;
use std::os::unix::io::RawFd;

/// Whether or not `fd` is a connection-oriented (stream) socket.
pub fn is_stream_socket(fd: RawFd) -> bool {
    let mut kind: libc::c_int = 0;
    let mut len = size_of::<libc::c_int>() as libc::socklen_t;
    let res = unsafe {
        libc::getsockopt(fd, libc::SOL_SOCKET, libc::SO_TYPE,
            &mut kind as *mut libc::c_int as *mut libc::c_void, &mut len)
    };
    // Not a socket (`ENOTSOCK`) or already closed (`EBADF`).
    res == 0 && kind == libc::SOCK_STREAM
}

/// Read and drop any pending urgent (out-of-band) data on `fd`, returns true
/// if there was any.
pub fn discard_urgent_data(fd: RawFd) -> bool {
    let mut buf = [0u8; 8];
    let mut discarded = false;
    loop {
        let n = unsafe {
            libc::recv(fd, buf.as_mut_ptr() as *mut libc::c_void, buf.len(), libc::MSG_OOB | libc::MSG_DONTWAIT)
        };
        if n > 0 {
            discarded = true;
        } else {
            // `EINVAL` once all urgent data is read, `EWOULDBLOCK` if the mark
            // isn't reached yet.
            return discarded;
        }
    }
}
