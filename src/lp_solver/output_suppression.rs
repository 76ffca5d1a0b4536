//! Output suppression for solver backends that write to stdout
//!
//! CBC prints its search log directly on the process stdout, which would
//! interleave with the report this crate writes there. A [`GagHandle`] silences
//! stdout for as long as it is held.
//!
//! The `gag` crate allows a single live gag per stream and process, so handles
//! share one `Gag` through a weak reference: concurrent solves reuse the live
//! gag, and the last handle dropped restores the stream.

use gag::Gag;
use std::io;
use std::sync::{Arc, Mutex, Weak};

/// A shared claim on the stdout gag
pub struct GagHandle {
    _gag: Arc<Gag>,
}

impl GagHandle {
    /// Silence stdout until every handle is dropped.
    pub fn stdout() -> io::Result<Self> {
        STDOUT_GAG.acquire()
    }
}

struct SharedGag {
    weak_gag: Mutex<Weak<Gag>>,
}

impl SharedGag {
    const fn new() -> Self {
        Self {
            weak_gag: Mutex::new(Weak::new()),
        }
    }

    fn acquire(&self) -> io::Result<GagHandle> {
        let mut weak_gag = self
            .weak_gag
            .lock()
            .map_err(|_| io::Error::other("stdout gag lock poisoned"))?;

        if let Some(gag) = weak_gag.upgrade() {
            return Ok(GagHandle { _gag: gag });
        }

        let gag = Arc::new(Gag::stdout()?);
        *weak_gag = Arc::downgrade(&gag);

        Ok(GagHandle { _gag: gag })
    }
}

static STDOUT_GAG: SharedGag = SharedGag::new();

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::thread;

    #[test]
    fn test_handles_share_one_gag() {
        let first = match GagHandle::stdout() {
            Ok(handle) => handle,
            Err(_) => return, // stdout already redirected by the harness
        };
        let second = GagHandle::stdout().expect("live gag should be reused");

        assert_eq!(Arc::as_ptr(&first._gag), Arc::as_ptr(&second._gag));

        let count = Arc::strong_count(&first._gag);
        drop(first);
        assert_eq!(Arc::strong_count(&second._gag), count - 1);
    }

    #[test]
    fn test_concurrent_acquire_does_not_panic() {
        const NUM_THREADS: usize = 3;
        let barrier = Arc::new(Barrier::new(NUM_THREADS));

        let handles: Vec<_> = (0..NUM_THREADS)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    GagHandle::stdout().is_ok()
                })
            })
            .collect();

        for handle in handles {
            handle.join().expect("thread should not panic");
        }
    }
}
