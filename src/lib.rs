//! Network I/O primitives for a URL fetch client
//!
//! - [`net::Connector`] resolves a host and opens a connected TCP stream.
//! - [`net::get_line`] reads one line under an absolute deadline.
//! - [`classify`] turns resolver codes and `errno` values into [`Category`]
//!   values that protocol handlers use to decide whether to retry.
//! - [`Fetch`] ties these together and remembers the category of the last
//!   failure.
//!
//! ```no_run
//! use fetchcore::{Fetch, FetchConfig, GrowBuf};
//!
//! let mut fetch = Fetch::new(FetchConfig::new().timeout_secs(30).verbose(true));
//! let mut conn = fetch.connect("ftp.example.org", 21)?;
//! let mut line = GrowBuf::for_lines();
//! fetch.get_line(&mut conn, &mut line)?;
//! println!("{}", line.to_string_lossy());
//! # Ok::<(), fetchcore::FetchError>(())
//! ```

pub mod buf;
pub mod classify;
pub mod config;
pub mod context;
pub mod dirent;
pub mod error;
pub mod net;
pub mod sink;

pub use buf::GrowBuf;
pub use config::FetchConfig;
pub use context::Fetch;
pub use dirent::{DirEntry, EntryList, UrlStat};
pub use error::{Category, FetchError, Result};
pub use sink::{MessageSink, TracingSink};
