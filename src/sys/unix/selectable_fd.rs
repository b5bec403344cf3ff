use std::os::unix::io::{AsRawFd, RawFd};

use crate::Selectable;

/// Adapter for a `RawFd` providing a [`Selectable`] implementation.
///
/// `SelectableFd` enables registering any file descriptor with a
/// [`Selector`], as long as `poll(2)` supports it.
///
/// `SelectableFd` **does not** take ownership of the file descriptor.
/// Specifically, it will not manage any lifecycle related operations, such as
/// closing the file descriptor on drop. The descriptor must stay open for as
/// long as it is registered.
///
/// [`Selector`]: crate::Selector
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use std::net::TcpListener;
/// use std::os::unix::io::AsRawFd;
/// use std::sync::Arc;
///
/// use polyselect::unix::SelectableFd;
/// use polyselect::{Id, Interests, Selector};
///
/// // Bind a listener from the standard library.
/// let listener = TcpListener::bind("127.0.0.1:0")?;
///
/// let selector = Selector::new()?;
///
/// // Register the listener using `SelectableFd`.
/// let channel = Arc::new(SelectableFd(listener.as_raw_fd()));
/// let key = selector.register(channel, Id(0), Interests::READABLE)?;
/// # selector.deregister(&key)?;
/// #     Ok(())
/// # }
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct SelectableFd(pub RawFd);

impl AsRawFd for SelectableFd {
    fn as_raw_fd(&self) -> RawFd {
        self.0
    }
}

impl Selectable for SelectableFd {}
