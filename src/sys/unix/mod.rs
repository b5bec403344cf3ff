mod net;
mod poll;
mod selectable_fd;
mod wakeup;

pub use self::net::{discard_urgent_data, is_stream_socket};
pub use self::poll::{poll, ReadySets};
pub use self::selectable_fd::SelectableFd;
pub use self::wakeup::WakeupPair;
