//! Fetch context
//!
//! A [`Fetch`] bundles the settings, the message sink and the "last error"
//! slot that protocol handlers consult after a failed call. Every operation
//! that fails classifies its error, reports it to the sink and records the
//! category here before returning. Methods take `&mut self`, so one caller
//! at a time owns the slot.

use std::fmt;
use std::io::Read;
use std::net::TcpStream;
use std::os::fd::AsRawFd;
use std::sync::Arc;

use crate::buf::GrowBuf;
use crate::classify::{classify_error, emit_info};
use crate::config::FetchConfig;
use crate::dirent::{EntryList, UrlStat};
use crate::error::{Category, Result};
use crate::net::{get_line, Connector, Resolver, SystemResolver};
use crate::sink::{default_sink, MessageSink};

/// Settings, sink and last-error state for one logical call sequence.
pub struct Fetch {
    config: FetchConfig,
    sink: Arc<dyn MessageSink>,
    resolver: Arc<dyn Resolver>,
    last_error: Category,
}

impl Fetch {
    pub fn new(config: FetchConfig) -> Self {
        Self::with_sink(config, default_sink())
    }

    pub fn with_sink(config: FetchConfig, sink: Arc<dyn MessageSink>) -> Self {
        Fetch {
            config,
            sink,
            resolver: Arc::new(SystemResolver),
            last_error: Category::Ok,
        }
    }

    /// Use a different resolver for [`connect`](Self::connect)
    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Category of the most recent failure.
    ///
    /// Only overwritten by failures, so it is meaningful right after a call
    /// returned `Err`.
    pub fn last_error(&self) -> Category {
        self.last_error
    }

    /// Connect to `port` on `host`.
    pub fn connect(&mut self, host: &str, port: u16) -> Result<TcpStream> {
        let connector = Connector::new()
            .verbose(self.config.is_verbose())
            .nodelay(self.config.is_nodelay())
            .resolver(self.resolver.clone())
            .sink(self.sink.clone());
        let result = connector.connect(host, port);
        self.track(result)
    }

    /// Read one line using the configured timeout.
    pub fn get_line<S>(&mut self, stream: &mut S, buf: &mut GrowBuf<u8>) -> Result<usize>
    where
        S: Read + AsRawFd + ?Sized,
    {
        let result = get_line(stream, buf, self.config.timeout());
        self.track(result)
    }

    /// Append a directory entry to `list`.
    pub fn add_entry(&mut self, list: &mut EntryList, name: &str, stat: &UrlStat) -> Result<()> {
        let result = list.add_entry(name, stat);
        self.track(result)
    }

    /// Send a status message to the sink.
    pub fn info(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        // emit_info already reported the failure to the sink
        emit_info(self.sink.as_ref(), args).inspect_err(|err| self.last_error = err.category())
    }

    fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            self.last_error = classify_error(err, self.sink.as_ref());
        }
        result
    }
}

impl Default for Fetch {
    fn default() -> Self {
        Self::new(FetchConfig::default())
    }
}

impl fmt::Debug for Fetch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fetch")
            .field("config", &self.config)
            .field("last_error", &self.last_error)
            .finish_non_exhaustive()
    }
}
