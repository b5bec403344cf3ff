use std::io;

/// Default number of registrations polled by a single thread.
pub const DEFAULT_BATCH_SIZE: usize = 1024;

/// Configuration of a [`Selector`].
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use polyselect::{Config, Selector};
///
/// // Spread registrations over threads in batches of 64.
/// let config = Config::default()
///     .batch_size(64)
///     .helper_name("my-helper");
/// let selector = Selector::with_config(config)?;
/// # drop(selector);
/// #     Ok(())
/// # }
/// ```
///
/// [`Selector`]: crate::Selector
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    pub(crate) batch_size: usize,
    pub(crate) helper_stack_size: Option<usize>,
    pub(crate) helper_name: String,
}

impl Config {
    /// Maximum number of registrations polled in a single native poll call,
    /// defaults to [`DEFAULT_BATCH_SIZE`].
    ///
    /// Every batch beyond the first is polled on its own helper thread.
    pub fn batch_size(mut self, batch_size: usize) -> Config {
        self.batch_size = batch_size;
        self
    }

    /// Stack size of the helper threads, defaults to the standard library's
    /// default.
    pub fn helper_stack_size(mut self, size: Option<usize>) -> Config {
        self.helper_stack_size = size;
        self
    }

    /// Name prefix of the helper threads, the helper's index is appended.
    pub fn helper_name<S: Into<String>>(mut self, name: S) -> Config {
        self.helper_name = name.into();
        self
    }

    pub(crate) fn validate(&self) -> io::Result<()> {
        if self.batch_size == 0 {
            Err(io::Error::new(io::ErrorKind::InvalidInput, "batch size must be at least 1"))
        } else {
            Ok(())
        }
    }
}

impl Default for Config {
    fn default() -> Config {
        Config {
            batch_size: DEFAULT_BATCH_SIZE,
            helper_stack_size: None,
            helper_name: "polyselect-helper".to_owned(),
        }
    }
}
