use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Cooperative stop flag shared by the observer loops, the render loop, and
/// the process signal handlers.
///
/// `trigger` is idempotent and safe from any thread or signal context; the
/// loops observe it at their next wake/poll point.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Inner flag for `signal_hook::flag::register`.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trigger_is_idempotent() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.requested());
        shutdown.trigger();
        shutdown.trigger();
        assert!(shutdown.requested());
    }

    #[test]
    fn test_clones_share_the_flag() {
        let shutdown = Shutdown::new();
        let observer_view = shutdown.clone();
        shutdown.trigger();
        assert!(observer_view.requested());
    }

    #[test]
    fn test_observer_loop_exits_after_trigger() {
        let shutdown = Shutdown::new();
        let loop_view = shutdown.clone();
        let handle = std::thread::spawn(move || {
            let mut polls = 0u32;
            while !loop_view.requested() {
                polls += 1;
                std::thread::sleep(std::time::Duration::from_millis(1));
            }
            polls
        });
        std::thread::sleep(std::time::Duration::from_millis(10));
        shutdown.trigger();
        shutdown.trigger();
        assert!(handle.join().unwrap() > 0);
    }
}
