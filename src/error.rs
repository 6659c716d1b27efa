//! Error categories and the crate error type
//!
//! Every fallible operation returns a [`FetchError`], and every `FetchError`
//! maps onto exactly one [`Category`]. Protocol layers look at the category,
//! not at the raw OS or resolver code, to decide whether to retry.

use std::fmt;
use std::io;

use crate::classify;

/// Result type for fetch operations
pub type Result<T> = std::result::Result<T, FetchError>;

/// Semantic error class used to drive retry/abort decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Category {
    /// No error
    #[default]
    Ok,
    /// Temporary failure, try again later
    Temp,
    /// Name resolution failed
    Resolv,
    /// Permission or authorization problem
    Auth,
    /// Resource not available (missing file, directory where a file was expected)
    Unavail,
    /// Out of memory
    Memory,
    /// Target already exists
    Exists,
    /// No space left on the storage device
    Full,
    /// Network unreachable or local address problem
    Network,
    /// Connection aborted or reset by peer
    Abort,
    /// Operation timed out
    Timeout,
    /// Host down or connection refused
    Down,
    /// Anything else
    Unknown,
}

impl Category {
    /// Whether a caller may reasonably retry the failed operation.
    pub fn is_retryable(self) -> bool {
        matches!(
            self,
            Category::Temp | Category::Network | Category::Abort | Category::Timeout | Category::Down
        )
    }

    /// Stable lowercase name, used as the `category` field in log events.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Ok => "ok",
            Category::Temp => "temporary",
            Category::Resolv => "resolver",
            Category::Auth => "auth",
            Category::Unavail => "unavailable",
            Category::Memory => "memory",
            Category::Exists => "exists",
            Category::Full => "full",
            Category::Network => "network",
            Category::Abort => "aborted",
            Category::Timeout => "timeout",
            Category::Down => "down",
            Category::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fetch operation errors
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Resolver failure, `code` is a `netdb.h` style resolver code
    #[error("({code:03} {message})")]
    Resolver {
        code: i32,
        category: Category,
        message: &'static str,
    },

    /// System call failure (socket, connect, poll, read)
    #[error("I/O error: {0}")]
    System(#[from] io::Error),

    #[error("Operation timed out")]
    Timeout,

    #[error("Out of memory")]
    OutOfMemory,
}

impl FetchError {
    /// Build a resolver error from a resolver code, looked up in the resolver table.
    pub fn resolver(code: i32) -> Self {
        let entry = classify::find_resolver_entry(code);
        FetchError::Resolver {
            code,
            category: entry.category,
            message: entry.message,
        }
    }

    /// The semantic category of this error.
    pub fn category(&self) -> Category {
        match self {
            FetchError::Resolver { category, .. } => *category,
            FetchError::System(err) => classify::classify_io_error(err),
            FetchError::Timeout => Category::Timeout,
            FetchError::OutOfMemory => Category::Memory,
        }
    }

    /// The raw OS error code behind this error, if any.
    ///
    /// Timeout and out-of-memory report `ETIMEDOUT` and `ENOMEM`, which is
    /// what a caller inspecting `errno` would have observed.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            FetchError::Resolver { .. } => None,
            FetchError::System(err) => err.raw_os_error(),
            FetchError::Timeout => Some(libc::ETIMEDOUT),
            FetchError::OutOfMemory => Some(libc::ENOMEM),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout)
    }
}

impl From<std::collections::TryReserveError> for FetchError {
    fn from(_: std::collections::TryReserveError) -> Self {
        FetchError::OutOfMemory
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_retryable() {
        assert!(Category::Temp.is_retryable());
        assert!(Category::Timeout.is_retryable());
        assert!(Category::Down.is_retryable());
        assert!(!Category::Memory.is_retryable());
        assert!(!Category::Resolv.is_retryable());
        assert!(!Category::Auth.is_retryable());
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(FetchError::Timeout.category(), Category::Timeout);
        assert_eq!(FetchError::OutOfMemory.category(), Category::Memory);
        assert_eq!(FetchError::resolver(1).category(), Category::Resolv);
        assert_eq!(FetchError::resolver(2).category(), Category::Temp);

        let refused = io::Error::from_raw_os_error(libc::ECONNREFUSED);
        assert_eq!(FetchError::from(refused).category(), Category::Down);
    }

    #[test]
    fn test_resolver_display() {
        let err = FetchError::resolver(1);
        assert_eq!(err.to_string(), "(001 Host not found)");
    }

    #[test]
    fn test_raw_os_error() {
        assert_eq!(FetchError::Timeout.raw_os_error(), Some(libc::ETIMEDOUT));
        assert_eq!(FetchError::OutOfMemory.raw_os_error(), Some(libc::ENOMEM));
        assert_eq!(FetchError::resolver(3).raw_os_error(), None);
    }

    #[test]
    fn test_try_reserve_maps_to_memory() {
        let mut v: Vec<u8> = Vec::new();
        let err = v.try_reserve_exact(usize::MAX).unwrap_err();
        assert_eq!(FetchError::from(err).category(), Category::Memory);
    }
}
