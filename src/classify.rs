//! Error classification
//!
//! Maps resolver codes and `errno` values onto [`Category`] values and reports
//! each classification to a [`MessageSink`].

use std::fmt::{self, Write as _};
use std::io;

use crate::error::{Category, FetchError, Result};
use crate::sink::MessageSink;

/// Resolver codes, numbered as the classic `netdb.h` `h_errno` values.
pub mod resolver_code {
    pub const HOST_NOT_FOUND: i32 = 1;
    pub const TRY_AGAIN: i32 = 2;
    pub const NO_RECOVERY: i32 = 3;
    pub const NO_DATA: i32 = 4;
    /// Not in the resolver table; classifies as an unknown resolver error
    pub const UNKNOWN: i32 = -1;
}

/// One row of a static error table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorEntry {
    pub code: i32,
    pub category: Category,
    pub message: &'static str,
}

const END_OF_TABLE: i32 = -1;

static RESOLVER_ERRORS: &[ErrorEntry] = &[
    ErrorEntry {
        code: resolver_code::HOST_NOT_FOUND,
        category: Category::Resolv,
        message: "Host not found",
    },
    ErrorEntry {
        code: resolver_code::TRY_AGAIN,
        category: Category::Temp,
        message: "Transient resolver failure",
    },
    ErrorEntry {
        code: resolver_code::NO_RECOVERY,
        category: Category::Resolv,
        message: "Non-recoverable resolver failure",
    },
    ErrorEntry {
        code: resolver_code::NO_DATA,
        category: Category::Resolv,
        message: "No address record",
    },
    ErrorEntry {
        code: END_OF_TABLE,
        category: Category::Unknown,
        message: "Unknown resolver error",
    },
];

/// Look up a resolver code, falling back to the terminal "unknown" entry.
pub fn find_resolver_entry(code: i32) -> &'static ErrorEntry {
    find_entry(RESOLVER_ERRORS, code)
}

fn find_entry(table: &'static [ErrorEntry], code: i32) -> &'static ErrorEntry {
    let mut i = 0;
    while table[i].code != END_OF_TABLE {
        if table[i].code == code {
            break;
        }
        i += 1;
    }
    &table[i]
}

/// Classify a resolver code and report it to `sink`.
pub fn classify_resolver_error(code: i32, sink: &dyn MessageSink) -> (Category, &'static str) {
    let entry = find_resolver_entry(code);
    sink.error(entry.category, &format!("({:03} {})", code, entry.message));
    (entry.category, entry.message)
}

/// Map an `errno` value onto a category. No side effects.
pub fn category_for_errno(errno: i32) -> Category {
    match errno {
        0 => Category::Ok,
        libc::EPERM | libc::EACCES | libc::EROFS => Category::Auth,
        #[cfg(any(
            target_os = "macos",
            target_os = "ios",
            target_os = "freebsd",
            target_os = "dragonfly",
            target_os = "openbsd",
            target_os = "netbsd"
        ))]
        libc::EAUTH | libc::ENEEDAUTH => Category::Auth,
        // EISDIR is an approximation; there is no better fit
        libc::ENOENT | libc::EISDIR => Category::Unavail,
        libc::ENOMEM => Category::Memory,
        libc::EBUSY | libc::EAGAIN => Category::Temp,
        libc::EEXIST => Category::Exists,
        libc::ENOSPC => Category::Full,
        libc::EADDRINUSE
        | libc::EADDRNOTAVAIL
        | libc::ENETDOWN
        | libc::ENETUNREACH
        | libc::ENETRESET
        | libc::EHOSTUNREACH => Category::Network,
        libc::ECONNABORTED | libc::ECONNRESET => Category::Abort,
        libc::ETIMEDOUT => Category::Timeout,
        libc::ECONNREFUSED | libc::EHOSTDOWN => Category::Down,
        _ => Category::Unknown,
    }
}

/// Classify an `errno` value and report it to `sink`.
pub fn classify_system_error(errno: i32, sink: &dyn MessageSink) -> Category {
    let category = category_for_errno(errno);
    let description = io::Error::from_raw_os_error(errno);
    sink.error(category, &format!("({:03} {})", errno, strerror(&description)));
    category
}

/// Categorize an `io::Error`, preferring its raw OS code when present.
pub fn classify_io_error(err: &io::Error) -> Category {
    if let Some(errno) = err.raw_os_error() {
        return category_for_errno(errno);
    }

    match err.kind() {
        io::ErrorKind::PermissionDenied => Category::Auth,
        io::ErrorKind::NotFound => Category::Unavail,
        io::ErrorKind::OutOfMemory => Category::Memory,
        io::ErrorKind::WouldBlock => Category::Temp,
        io::ErrorKind::AlreadyExists => Category::Exists,
        io::ErrorKind::AddrInUse | io::ErrorKind::AddrNotAvailable => Category::Network,
        io::ErrorKind::ConnectionAborted | io::ErrorKind::ConnectionReset => Category::Abort,
        io::ErrorKind::TimedOut => Category::Timeout,
        io::ErrorKind::ConnectionRefused => Category::Down,
        _ => Category::Unknown,
    }
}

/// Classify any [`FetchError`] through the matching path and report it.
pub fn classify_error(err: &FetchError, sink: &dyn MessageSink) -> Category {
    match err {
        FetchError::Resolver { code, .. } => classify_resolver_error(*code, sink).0,
        FetchError::System(io_err) => match io_err.raw_os_error() {
            Some(errno) => classify_system_error(errno, sink),
            None => {
                let category = classify_io_error(io_err);
                sink.error(category, &format!("({})", io_err));
                category
            }
        },
        FetchError::Timeout => classify_system_error(libc::ETIMEDOUT, sink),
        FetchError::OutOfMemory => classify_system_error(libc::ENOMEM, sink),
    }
}

/// Format a status message and send it to `sink` at info level.
///
/// A formatting failure is reported to the sink as an empty out-of-memory
/// message and returned as [`FetchError::OutOfMemory`].
pub fn emit_info(sink: &dyn MessageSink, args: fmt::Arguments<'_>) -> Result<()> {
    let mut message = String::new();
    if message.write_fmt(args).is_err() {
        sink.error(Category::Memory, "");
        return Err(FetchError::OutOfMemory);
    }
    sink.info(&message);
    Ok(())
}

// io::Error renders as "<text> (os error N)"; the code is printed separately.
fn strerror(err: &io::Error) -> String {
    let text = err.to_string();
    match text.rfind(" (os error ") {
        Some(pos) => text[..pos].to_string(),
        None => text,
    }
}
