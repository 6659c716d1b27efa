//! Network primitives
//!
//! Connection setup ([`Connector`]), host name resolution ([`Resolver`]) and
//! the deadline-bounded line reader ([`get_line`]).
//!
//! [`FailingResolver`] is a testing aid that fails every lookup with a fixed
//! resolver code.

pub mod getln;
pub mod resolver;
pub mod tcp;

pub use getln::{get_line, LineReader};
pub use resolver::{FailingResolver, Resolver, SystemResolver};
pub use tcp::Connector;
