//! Deadline-bounded line reader
//!
//! Reads one `\n`-terminated line from a connected stream, one byte at a
//! time. When a timeout is given the deadline is fixed when the call starts
//! and is not extended by partial progress: every wait gets only the time
//! that is left.

use std::io::{self, Read};
use std::os::fd::{AsRawFd, RawFd};
use std::time::{Duration, Instant};

use tracing::trace;

use crate::buf::GrowBuf;
use crate::error::{FetchError, Result};

/// Outcome of one readiness wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wait {
    Ready,
    Expired,
    Interrupted,
}

/// Read one line from `stream` into `buf`.
///
/// `buf` is cleared first and allocated on first use; its storage is kept for
/// the next call. The line includes its trailing `\n`. At end of stream the
/// bytes read so far are returned, which may be none. Returns the line
/// length.
///
/// With `timeout` set (and non-zero), the whole call must finish within it or
/// fail with [`FetchError::Timeout`]; bytes read before the timeout stay in
/// `buf`. Interrupted waits and reads are retried.
pub fn get_line<S>(stream: &mut S, buf: &mut GrowBuf<u8>, timeout: Option<Duration>) -> Result<usize>
where
    S: Read + AsRawFd + ?Sized,
{
    buf.clear();
    buf.ensure_capacity(1)?;

    // a timeout too large to represent as an instant means no deadline
    let deadline = timeout
        .filter(|t| !t.is_zero())
        .and_then(|t| Instant::now().checked_add(t));
    let fd = stream.as_raw_fd();

    loop {
        if let Some(deadline) = deadline {
            let remaining = deadline
                .checked_duration_since(Instant::now())
                .ok_or(FetchError::Timeout)?;

            match wait_readable(fd, remaining)? {
                Wait::Ready => {}
                Wait::Expired | Wait::Interrupted => continue,
            }
        }

        let mut byte = [0u8; 1];
        match stream.read(&mut byte) {
            Ok(0) => {
                trace!(len = buf.len(), "end of stream");
                break;
            }
            Ok(_) => {
                buf.push(byte[0])?;
                if byte[0] == b'\n' {
                    break;
                }
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock && deadline.is_some() => continue,
            Err(e) => return Err(FetchError::System(e)),
        }
    }

    Ok(buf.len())
}

/// Wait until `fd` is readable or `remaining` elapses.
fn wait_readable(fd: RawFd, remaining: Duration) -> Result<Wait> {
    use libc::{poll, pollfd, POLLIN};

    let mut pfd = pollfd {
        fd,
        events: POLLIN,
        revents: 0,
    };

    let ret = unsafe { poll(&mut pfd, 1, poll_timeout_ms(remaining)) };

    if ret < 0 {
        let err = io::Error::last_os_error();
        if err.kind() == io::ErrorKind::Interrupted {
            return Ok(Wait::Interrupted);
        }
        return Err(FetchError::System(err));
    }

    if ret == 0 {
        return Ok(Wait::Expired);
    }

    // hangup and error conditions are reported by the following read
    Ok(Wait::Ready)
}

/// Milliseconds for `poll`, rounded up so a sub-millisecond remainder still waits.
fn poll_timeout_ms(remaining: Duration) -> i32 {
    let ms = remaining.as_nanos().div_ceil(1_000_000);
    i32::try_from(ms).unwrap_or(i32::MAX)
}

/// Line reader bound to one stream, reusing its buffer across lines.
///
/// ```no_run
/// use std::net::TcpStream;
/// use std::time::Duration;
/// use fetchcore::net::LineReader;
///
/// let stream = TcpStream::connect("127.0.0.1:21").unwrap();
/// let mut reader = LineReader::new(stream).timeout(Some(Duration::from_secs(30)));
/// let greeting = reader.next_line().unwrap();
/// println!("{}", String::from_utf8_lossy(greeting));
/// ```
pub struct LineReader<S> {
    stream: S,
    buf: GrowBuf<u8>,
    timeout: Option<Duration>,
}

impl<S: Read + AsRawFd> LineReader<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            buf: GrowBuf::for_lines(),
            timeout: None,
        }
    }

    /// Set the per-line timeout
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read the next line. An empty slice means end of stream.
    pub fn next_line(&mut self) -> Result<&[u8]> {
        get_line(&mut self.stream, &mut self.buf, self.timeout)?;
        Ok(self.buf.as_slice())
    }

    /// Bytes of the last line read, including a partial line left by a timeout.
    pub fn buffer(&self) -> &[u8] {
        self.buf.as_slice()
    }

    pub fn get_ref(&self) -> &S {
        &self.stream
    }

    pub fn into_inner(self) -> S {
        self.stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Category;
    use std::io::Write;
    use std::os::unix::net::UnixStream;

    /// Stream that reports `Interrupted` before every real read.
    struct Flaky {
        inner: UnixStream,
        interrupts: usize,
        pending: bool,
    }

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.pending = !self.pending;
            if self.pending {
                self.interrupts += 1;
                return Err(io::ErrorKind::Interrupted.into());
            }
            self.inner.read(buf)
        }
    }

    impl AsRawFd for Flaky {
        fn as_raw_fd(&self) -> RawFd {
            self.inner.as_raw_fd()
        }
    }

    #[test]
    fn test_lines_then_eof() {
        let (mut tx, mut rx) = UnixStream::pair().unwrap();
        tx.write_all(b"hello\nworld\n").unwrap();
        drop(tx);

        let mut buf = GrowBuf::for_lines();
        assert_eq!(get_line(&mut rx, &mut buf, None).unwrap(), 6);
        assert_eq!(buf.as_slice(), b"hello\n");
        assert_eq!(get_line(&mut rx, &mut buf, None).unwrap(), 6);
        assert_eq!(buf.as_slice(), b"world\n");
        assert_eq!(get_line(&mut rx, &mut buf, None).unwrap(), 0);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_last_line_without_newline() {
        let (mut tx, mut rx) = UnixStream::pair().unwrap();
        tx.write_all(b"one\ntail").unwrap();
        drop(tx);

        let mut buf = GrowBuf::for_lines();
        get_line(&mut rx, &mut buf, Some(Duration::from_secs(5))).unwrap();
        assert_eq!(buf.as_slice(), b"one\n");
        get_line(&mut rx, &mut buf, Some(Duration::from_secs(5))).unwrap();
        assert_eq!(buf.as_slice(), b"tail");
    }

    #[test]
    fn test_first_call_allocates() {
        let (mut tx, mut rx) = UnixStream::pair().unwrap();
        tx.write_all(b"x\n").unwrap();

        let mut buf = GrowBuf::for_lines();
        assert!(!buf.is_allocated());
        get_line(&mut rx, &mut buf, None).unwrap();
        assert_eq!(buf.capacity(), GrowBuf::<u8>::LINE_INITIAL_CAPACITY);
    }

    #[test]
    fn test_long_line_grows_buffer() {
        let (mut tx, mut rx) = UnixStream::pair().unwrap();
        let mut line = vec![b'a'; 5000];
        line.push(b'\n');
        let writer = std::thread::spawn(move || {
            tx.write_all(&line).unwrap();
        });

        let mut buf = GrowBuf::for_lines();
        let len = get_line(&mut rx, &mut buf, Some(Duration::from_secs(5))).unwrap();
        writer.join().unwrap();

        assert_eq!(len, 5001);
        assert!(buf.as_slice()[..5000].iter().all(|&b| b == b'a'));
        assert_eq!(buf.as_slice()[5000], b'\n');
        assert!(buf.capacity() >= 5001);
    }

    #[test]
    fn test_timeout_on_silent_peer() {
        let (_tx, mut rx) = UnixStream::pair().unwrap();
        let mut buf = GrowBuf::for_lines();

        let start = Instant::now();
        let err = get_line(&mut rx, &mut buf, Some(Duration::from_millis(300))).unwrap_err();
        let elapsed = start.elapsed();

        assert!(err.is_timeout());
        assert_eq!(err.category(), Category::Timeout);
        assert!(elapsed >= Duration::from_millis(300), "returned early: {:?}", elapsed);
        assert!(elapsed < Duration::from_secs(3), "returned late: {:?}", elapsed);
    }

    #[test]
    fn test_timeout_keeps_partial_line() {
        let (mut tx, mut rx) = UnixStream::pair().unwrap();
        tx.write_all(b"partial").unwrap();

        let mut buf = GrowBuf::for_lines();
        let err = get_line(&mut rx, &mut buf, Some(Duration::from_millis(200))).unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(buf.as_slice(), b"partial");
    }

    #[test]
    fn test_zero_timeout_means_no_deadline() {
        let (mut tx, mut rx) = UnixStream::pair().unwrap();
        tx.write_all(b"ok\n").unwrap();

        let mut buf = GrowBuf::for_lines();
        get_line(&mut rx, &mut buf, Some(Duration::ZERO)).unwrap();
        assert_eq!(buf.as_slice(), b"ok\n");
    }

    #[test]
    fn test_huge_timeout_means_no_deadline() {
        let (mut tx, mut rx) = UnixStream::pair().unwrap();
        tx.write_all(b"ok\n").unwrap();

        let mut buf = GrowBuf::for_lines();
        let len = get_line(&mut rx, &mut buf, Some(Duration::from_secs(u64::MAX))).unwrap();
        assert_eq!(len, 3);
        assert_eq!(buf.as_slice(), b"ok\n");
    }

    #[test]
    fn test_interrupted_reads_are_retried() {
        let (mut tx, rx) = UnixStream::pair().unwrap();
        tx.write_all(b"abc\n").unwrap();

        let mut flaky = Flaky { inner: rx, interrupts: 0, pending: false };
        let mut buf = GrowBuf::for_lines();
        get_line(&mut flaky, &mut buf, None).unwrap();
        assert_eq!(buf.as_slice(), b"abc\n");
        assert_eq!(flaky.interrupts, 4);

        tx.write_all(b"def\n").unwrap();
        get_line(&mut flaky, &mut buf, Some(Duration::from_secs(5))).unwrap();
        assert_eq!(buf.as_slice(), b"def\n");
    }

    #[test]
    fn test_read_error_is_fatal() {
        let (_tx, rx) = UnixStream::pair().unwrap();
        rx.set_nonblocking(true).unwrap();
        let mut rx = rx;

        let mut buf = GrowBuf::for_lines();
        let err = get_line(&mut rx, &mut buf, None).unwrap_err();
        assert!(matches!(err, FetchError::System(ref e) if e.kind() == io::ErrorKind::WouldBlock));
        assert_eq!(err.category(), Category::Temp);
    }

    #[test]
    fn test_line_reader() {
        let (mut tx, rx) = UnixStream::pair().unwrap();
        tx.write_all(b"220 ready\r\n331 password\r\n").unwrap();
        drop(tx);

        let mut reader = LineReader::new(rx).timeout(Some(Duration::from_secs(5)));
        assert_eq!(reader.next_line().unwrap(), b"220 ready\r\n");
        assert_eq!(reader.next_line().unwrap(), b"331 password\r\n");
        assert_eq!(reader.next_line().unwrap(), b"");
    }

    #[test]
    fn test_poll_timeout_rounding() {
        assert_eq!(poll_timeout_ms(Duration::ZERO), 0);
        assert_eq!(poll_timeout_ms(Duration::from_nanos(1)), 1);
        assert_eq!(poll_timeout_ms(Duration::from_millis(1500)), 1500);
        assert_eq!(poll_timeout_ms(Duration::from_secs(u64::MAX)), i32::MAX);
    }
}
