//! Descriptor accounting for failed connects
//!
//! Kept in its own test binary with a single test so no other test opens or
//! closes descriptors while the count is taken.

#![cfg(target_os = "linux")]

use std::net::TcpListener;
use std::sync::Arc;

use fetchcore::classify::resolver_code;
use fetchcore::net::FailingResolver;
use fetchcore::{Category, Fetch, FetchConfig};

fn open_fds() -> usize {
    std::fs::read_dir("/proc/self/fd")
        .expect("Failed to list /proc/self/fd")
        .count()
}

#[test]
fn test_failed_connects_do_not_leak() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind listener");
    let port = listener.local_addr().expect("Failed to get local address").port();
    drop(listener);

    let mut refused = Fetch::new(FetchConfig::new());
    let mut unresolved = Fetch::new(FetchConfig::new())
        .resolver(Arc::new(FailingResolver(resolver_code::HOST_NOT_FOUND)));

    let before = open_fds();

    for _ in 0..20 {
        refused.connect("127.0.0.1", port).expect_err("connection must be refused");
        assert_eq!(refused.last_error(), Category::Down);

        unresolved.connect("no-such-host.invalid", port).expect_err("lookup must fail");
        assert_eq!(unresolved.last_error(), Category::Resolv);
    }

    assert_eq!(open_fds(), before);
}
