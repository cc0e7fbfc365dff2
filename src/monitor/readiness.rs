//! Waiting for writers to let go of a file.
//!
//! Change notifications arrive while the downloading process may still be
//! flushing. A file counts as ready once we can open it exclusively; the
//! handle is closed straight away.

use std::io;
use std::path::Path;
use std::time::Duration;

use tokio::time::sleep;

/// Result of a single exclusive open.
#[derive(Debug)]
enum Access {
    Ready,
    /// Another process holds the file.
    Busy,
    /// Anything else, e.g. the file vanished.
    Unavailable(io::Error),
}

/// Bounded retry loop around the exclusive open.
///
/// The first check runs immediately. Each time the file is still held, the
/// waiter sleeps `delay` and checks again, up to `max_retries` more times, so
/// the total wait never exceeds `max_retries * delay`.
#[derive(Debug, Clone, Copy)]
pub struct ReadinessWaiter {
    max_retries: u32,
    delay: Duration,
}

impl Default for ReadinessWaiter {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

impl ReadinessWaiter {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self {
            max_retries,
            delay,
        }
    }

    /// Longest time [`await_ready`](Self::await_ready) can spend sleeping.
    pub fn max_wait(&self) -> Duration {
        self.delay * self.max_retries
    }

    /// Wait until nobody else holds `path`.
    ///
    /// Returns false if the file stays busy for the whole window, or at once on
    /// any failure that is not lock contention.
    pub async fn await_ready(&self, path: &Path) -> bool {
        let mut retries_left = self.max_retries;
        loop {
            match try_exclusive(path) {
                Access::Ready => return true,
                Access::Busy => {
                    if retries_left == 0 {
                        crate::debug_event!("readiness", "still busy", "{}", path.display());
                        return false;
                    }
                    retries_left -= 1;
                    crate::debug_event!(
                        "readiness",
                        "busy, retrying",
                        "{} ({retries_left} retries left)",
                        path.display()
                    );
                    sleep(self.delay).await;
                }
                Access::Unavailable(e) => {
                    crate::debug_event!("readiness", "unavailable", "{}: {e}", path.display());
                    return false;
                }
            }
        }
    }
}

#[cfg(windows)]
fn try_exclusive(path: &Path) -> Access {
    use std::fs::OpenOptions;
    use std::os::windows::fs::OpenOptionsExt;

    const ERROR_SHARING_VIOLATION: i32 = 32;
    const ERROR_LOCK_VIOLATION: i32 = 33;

    // share_mode(0): deny every other reader and writer while we hold it
    match OpenOptions::new().read(true).share_mode(0).open(path) {
        Ok(_file) => Access::Ready,
        Err(e) => match e.raw_os_error() {
            Some(ERROR_SHARING_VIOLATION) | Some(ERROR_LOCK_VIOLATION) => Access::Busy,
            _ => Access::Unavailable(e),
        },
    }
}

#[cfg(not(windows))]
fn try_exclusive(path: &Path) -> Access {
    use std::fs::{File, TryLockError};

    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) => return Access::Unavailable(e),
    };
    if !file.metadata().map(|m| m.is_file()).unwrap_or(false) {
        return Access::Unavailable(io::Error::other("not a regular file"));
    }
    // Advisory lock; writers that lock their output will show up as busy
    match file.try_lock() {
        Ok(()) => Access::Ready,
        Err(TryLockError::WouldBlock) => Access::Busy,
        Err(TryLockError::Error(e)) if e.kind() == io::ErrorKind::Unsupported => Access::Ready,
        Err(TryLockError::Error(e)) => Access::Unavailable(e),
    }
}
