//! Coalescing guard for rebuild fires.
//!
//! A fire that arrives while a rebuild is still running is turned into a
//! no-op rather than queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Tracks whether a rebuild is in flight.
#[derive(Debug, Default)]
pub struct OverlapGuard {
    is_running: Arc<AtomicBool>,
}

impl OverlapGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the rebuild slot.
    ///
    /// Returns `None` if another rebuild holds it. The slot is released
    /// when the returned guard is dropped, including on panic.
    pub fn try_acquire(&self) -> Option<RunGuard> {
        self.is_running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| RunGuard {
                flag: self.is_running.clone(),
            })
    }

    pub fn is_running(&self) -> bool {
        self.is_running.load(Ordering::SeqCst)
    }
}

/// RAII guard that releases the running flag when dropped.
#[derive(Debug)]
pub struct RunGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[test]
    fn test_second_acquire_skipped() {
        let guard = OverlapGuard::new();

        let run1 = guard.try_acquire();
        assert!(run1.is_some());
        assert!(guard.is_running());
        assert!(guard.try_acquire().is_none());

        drop(run1);
        assert!(!guard.is_running());
        assert!(guard.try_acquire().is_some());
    }

    #[test]
    fn test_released_on_panic() {
        let guard = Arc::new(OverlapGuard::new());
        let inner = guard.clone();

        let result = thread::spawn(move || {
            let _run = inner.try_acquire().unwrap();
            panic!("rebuild blew up");
        })
        .join();

        assert!(result.is_err());
        assert!(!guard.is_running());
    }

    #[test]
    fn test_only_one_thread_wins() {
        let guard = Arc::new(OverlapGuard::new());
        let barrier = Arc::new(std::sync::Barrier::new(8));
        let wins = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let guard = guard.clone();
                let barrier = barrier.clone();
                let wins = wins.clone();
                thread::spawn(move || {
                    barrier.wait();
                    let run = guard.try_acquire();
                    if run.is_some() {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                    // Hold until every thread has tried
                    barrier.wait();
                    drop(run);
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(wins.load(Ordering::SeqCst), 1);
    }
}
