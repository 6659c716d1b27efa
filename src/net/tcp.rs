//! TCP connection setup
//!
//! Resolves a host name and opens a connected TCP stream to the first
//! address. There is no connect timeout here; callers that need one bound the
//! attempt themselves.

use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tracing::{debug, warn};

use super::resolver::{self, Resolver, SystemResolver};
use crate::classify::emit_info;
use crate::error::{FetchError, Result};
use crate::sink::{default_sink, MessageSink};

/// TCP connection builder
pub struct Connector {
    verbose: bool,
    nodelay: bool,
    resolver: Arc<dyn Resolver>,
    sink: Arc<dyn MessageSink>,
}

impl Default for Connector {
    fn default() -> Self {
        Self::new()
    }
}

impl Connector {
    /// Create a connector using the system resolver and the default sink
    pub fn new() -> Self {
        Connector {
            verbose: false,
            nodelay: false,
            resolver: Arc::new(SystemResolver),
            sink: default_sink(),
        }
    }

    /// Emit "looking up" and "connecting to" status messages
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Set TCP_NODELAY on the connected socket
    pub fn nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    /// Use a different resolver
    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Send status messages to `sink`
    ///
    /// Only verbose status goes here. Failures are returned, not reported;
    /// [`Fetch`](crate::Fetch) classifies them and reports them to its sink.
    pub fn sink(mut self, sink: Arc<dyn MessageSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Resolve `host` and connect to `port` on its first address.
    ///
    /// The returned stream is owned by the caller. On failure no socket is
    /// left open.
    pub fn connect(&self, host: &str, port: u16) -> Result<TcpStream> {
        debug!(host, port, "connect");

        if self.verbose {
            self.status(format_args!("looking up {}", host));
        }

        let addr = resolver::resolve_first(self.resolver.as_ref(), host, port)?;

        if self.verbose {
            self.status(format_args!("connecting to {}:{}", host, port));
        }

        self.connect_addr(&addr)
    }

    /// Connect to an already resolved address.
    pub fn connect_addr(&self, addr: &SocketAddr) -> Result<TcpStream> {
        let socket = Socket::new(Domain::for_address(*addr), Type::STREAM, Some(Protocol::TCP))
            .map_err(FetchError::System)?;

        // dropping `socket` on error closes it
        socket
            .connect(&SockAddr::from(*addr))
            .map_err(FetchError::System)?;

        if self.nodelay {
            socket.set_nodelay(true).map_err(FetchError::System)?;
        }

        debug!(%addr, "connected");
        Ok(socket.into())
    }

    fn status(&self, args: std::fmt::Arguments<'_>) {
        if let Err(err) = emit_info(self.sink.as_ref(), args) {
            warn!(error = %err, "status message dropped");
        }
    }
}
