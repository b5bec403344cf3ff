//! [`Selectable`] implementations for the standard library's sockets.
//!
//! All sockets must be put in non-blocking mode by the caller before being
//! registered, the [`Selector`] only reports readiness.
//!
//! [`Selector`]: crate::Selector

use std::net::{TcpListener, TcpStream, UdpSocket};
use std::os::unix::net::{UnixDatagram, UnixListener, UnixStream};

use crate::Selectable;

impl Selectable for TcpStream {}

impl Selectable for TcpListener {}

impl Selectable for UdpSocket {}

impl Selectable for UnixStream {}

impl Selectable for UnixListener {}

impl Selectable for UnixDatagram {}
