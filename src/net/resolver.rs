//! Host name resolution
//!
//! Resolution is a black box behind the [`Resolver`] trait. The default
//! [`SystemResolver`] asks the platform's `getaddrinfo` and translates its
//! failure codes into resolver codes so they can be classified.

use std::ffi::CString;
use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::ptr;

use tracing::debug;

use crate::classify::resolver_code;
use crate::error::{FetchError, Result};

#[cfg(all(target_os = "linux", target_env = "gnu"))]
const EAI_NODATA: i32 = -5;

/// Turns a host name into addresses.
///
/// Failures are [`FetchError::Resolver`] carrying a resolver code, or
/// [`FetchError::System`] when the lookup failed for a system reason.
pub trait Resolver: Send + Sync {
    fn lookup(&self, host: &str) -> Result<Vec<IpAddr>>;
}

/// Resolver backed by `getaddrinfo`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn lookup(&self, host: &str) -> Result<Vec<IpAddr>> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(vec![ip]);
        }

        let c_host =
            CString::new(host).map_err(|_| FetchError::resolver(resolver_code::HOST_NOT_FOUND))?;

        // SAFETY: an all-zero addrinfo is a valid "no hints" value
        let mut hints: libc::addrinfo = unsafe { std::mem::zeroed() };
        hints.ai_family = libc::AF_UNSPEC;
        hints.ai_socktype = libc::SOCK_STREAM;

        let mut res: *mut libc::addrinfo = ptr::null_mut();
        // SAFETY: c_host is NUL terminated, hints and res are valid for the call
        let rc = unsafe { libc::getaddrinfo(c_host.as_ptr(), ptr::null(), &hints, &mut res) };
        if rc != 0 {
            if rc == libc::EAI_SYSTEM {
                return Err(FetchError::System(io::Error::last_os_error()));
            }
            return Err(FetchError::resolver(gai_to_resolver_code(rc)));
        }

        let mut addrs = Vec::new();
        let mut cur = res;
        while !cur.is_null() {
            // SAFETY: cur walks the list returned by getaddrinfo, freed below
            let ai = unsafe { &*cur };
            if let Some(ip) = unsafe { sockaddr_ip(ai.ai_family, ai.ai_addr) } {
                if !addrs.contains(&ip) {
                    addrs.push(ip);
                }
            }
            cur = ai.ai_next;
        }
        // SAFETY: res came from a successful getaddrinfo and is freed once
        unsafe { libc::freeaddrinfo(res) };

        if addrs.is_empty() {
            return Err(FetchError::resolver(resolver_code::NO_DATA));
        }
        Ok(addrs)
    }
}

/// Translate a `getaddrinfo` failure into a resolver code.
///
/// Codes without an equivalent become [`resolver_code::UNKNOWN`]; raw EAI
/// values overlap the resolver codes on some platforms and are never passed
/// through.
pub fn gai_to_resolver_code(rc: i32) -> i32 {
    match rc {
        libc::EAI_NONAME => resolver_code::HOST_NOT_FOUND,
        libc::EAI_AGAIN => resolver_code::TRY_AGAIN,
        libc::EAI_FAIL => resolver_code::NO_RECOVERY,
        #[cfg(all(target_os = "linux", target_env = "gnu"))]
        EAI_NODATA => resolver_code::NO_DATA,
        other => {
            debug!(gai_code = other, "unmapped getaddrinfo failure");
            resolver_code::UNKNOWN
        }
    }
}

/// # Safety
///
/// `addr` must be null or point to a sockaddr of the given family.
unsafe fn sockaddr_ip(family: i32, addr: *const libc::sockaddr) -> Option<IpAddr> {
    if addr.is_null() {
        return None;
    }
    match family {
        libc::AF_INET => {
            let sin = &*(addr as *const libc::sockaddr_in);
            Some(IpAddr::V4(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr))))
        }
        libc::AF_INET6 => {
            let sin6 = &*(addr as *const libc::sockaddr_in6);
            Some(IpAddr::V6(Ipv6Addr::from(sin6.sin6_addr.s6_addr)))
        }
        _ => None,
    }
}

/// Resolve `host` and pair every address with `port`.
pub fn resolve(resolver: &dyn Resolver, host: &str, port: u16) -> Result<Vec<SocketAddr>> {
    let addrs = resolver.lookup(host)?;
    if addrs.is_empty() {
        return Err(FetchError::resolver(resolver_code::NO_DATA));
    }
    Ok(addrs.into_iter().map(|ip| SocketAddr::new(ip, port)).collect())
}

/// Resolve and return only the first address
pub fn resolve_first(resolver: &dyn Resolver, host: &str, port: u16) -> Result<SocketAddr> {
    let addrs = resolve(resolver, host, port)?;
    addrs
        .into_iter()
        .next()
        .ok_or_else(|| FetchError::resolver(resolver_code::NO_DATA))
}

/// Resolver that always fails with the same resolver code.
///
/// A testing aid: lets callers exercise resolver failure handling without
/// touching DNS.
#[derive(Clone, Copy)]
pub struct FailingResolver(pub i32);

impl fmt::Debug for FailingResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FailingResolver({:03})", self.0)
    }
}

impl Resolver for FailingResolver {
    fn lookup(&self, _host: &str) -> Result<Vec<IpAddr>> {
        Err(FetchError::resolver(self.0))
    }
}
