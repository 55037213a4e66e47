//! Shared recent-input model
//!
//! One `InputState` is created at overlay startup, mutated concurrently by
//! the keyboard and pointer observers, and read by the render scheduler.
//! All access goes through [`SharedInput`], which holds the single mutex so a
//! scheduler snapshot never observes a half-written state.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::constants::timing;

/// Fixed-capacity, insertion-ordered log with FIFO eviction on overflow.
#[derive(Debug)]
pub struct BoundedLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl BoundedLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append an entry, evicting the oldest when the log is full.
    pub fn push(&mut self, entry: String) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Append an entry unless it is already present. Returns whether the
    /// log changed.
    pub fn push_unique(&mut self, entry: &str) -> bool {
        if self.entries.iter().any(|e| e == entry) {
            return false;
        }
        self.push(entry.to_string());
        true
    }

    /// Remove an entry if present (no-op otherwise).
    pub fn remove(&mut self, entry: &str) {
        self.entries.retain(|e| e != entry);
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }
}

/// Events-per-second counter, reset once per elapsed wall-clock window.
#[derive(Debug)]
struct RateCounter {
    count: u32,
    window_start: Instant,
    window: Duration,
}

impl RateCounter {
    fn new(now: Instant) -> Self {
        Self {
            count: 0,
            window_start: now,
            window: Duration::from_millis(timing::RATE_WINDOW_MS),
        }
    }

    fn record(&mut self) {
        self.count += 1;
    }

    /// Returns the window's count and restarts it once the window has fully
    /// elapsed; `None` while still inside the current window.
    fn sample(&mut self, now: Instant) -> Option<u32> {
        if now.duration_since(self.window_start) < self.window {
            return None;
        }
        let count = self.count;
        self.count = 0;
        self.window_start = now;
        Some(count)
    }
}

/// The recent-input model mutated by both observers.
#[derive(Debug)]
pub struct InputState {
    active_keys: BoundedLog,
    clicks: BoundedLog,
    pointer: (i16, i16),
    rate: RateCounter,
}

impl InputState {
    pub fn new(key_capacity: usize, click_capacity: usize) -> Self {
        Self {
            active_keys: BoundedLog::new(key_capacity),
            clicks: BoundedLog::new(click_capacity),
            pointer: (0, 0),
            rate: RateCounter::new(Instant::now()),
        }
    }

    /// A repeated down on an already-active key leaves the log untouched but
    /// still counts toward the rate (autorepeat is filtered out upstream).
    pub fn key_down(&mut self, key: &str) {
        self.active_keys.push_unique(key);
        self.rate.record();
    }

    pub fn key_up(&mut self, key: &str) {
        self.active_keys.remove(key);
    }

    pub fn button_down(&mut self, entry: String) {
        self.clicks.push(entry);
    }

    pub fn set_pointer(&mut self, x: i16, y: i16) {
        self.pointer = (x, y);
    }

    pub fn observe(&mut self, now: Instant) -> Snapshot {
        Snapshot {
            keys: self.active_keys.to_vec(),
            clicks: self.clicks.to_vec(),
            pointer: self.pointer,
            rate: self.rate.sample(now),
        }
    }
}

/// Consistent single-instant view of [`InputState`] taken by the scheduler.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub keys: Vec<String>,
    pub clicks: Vec<String>,
    pub pointer: (i16, i16),
    /// Events counted in the last full rate window; `None` between samples
    pub rate: Option<u32>,
}

impl Snapshot {
    /// Active keys and recent clicks rendered jointly as one display line.
    pub fn display_line(&self) -> String {
        self.keys
            .iter()
            .chain(self.clicks.iter())
            .cloned()
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// Cloneable handle to the shared input model.
#[derive(Debug, Clone)]
pub struct SharedInput {
    inner: Arc<Mutex<InputState>>,
}

impl SharedInput {
    pub fn new(key_capacity: usize, click_capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(InputState::new(key_capacity, click_capacity))),
        }
    }

    // An observer panicking while holding the lock must not take the render
    // loop down with it; the state itself is always structurally valid.
    fn lock(&self) -> MutexGuard<'_, InputState> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn key_down(&self, key: &str) {
        self.lock().key_down(key);
    }

    pub fn key_up(&self, key: &str) {
        self.lock().key_up(key);
    }

    pub fn button_down(&self, entry: String) {
        self.lock().button_down(entry);
    }

    pub fn set_pointer(&self, x: i16, y: i16) {
        self.lock().set_pointer(x, y);
    }

    pub fn observe(&self, now: Instant) -> Snapshot {
        self.lock().observe(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_keys(state: &mut InputState) -> Vec<String> {
        state.observe(Instant::now()).keys
    }

    #[test]
    fn test_bounded_log_fifo_eviction() {
        let mut log = BoundedLog::new(3);
        for entry in ["a", "b", "c", "d"] {
            log.push(entry.to_string());
        }
        assert_eq!(log.to_vec(), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_bounded_log_never_exceeds_capacity() {
        let mut log = BoundedLog::new(2);
        for i in 0..100 {
            log.push(format!("e{i}"));
            assert!(log.to_vec().len() <= 2);
        }
        assert_eq!(log.to_vec(), vec!["e98", "e99"]);
    }

    #[test]
    fn test_push_unique_suppresses_duplicates() {
        let mut log = BoundedLog::new(3);
        assert!(log.push_unique("shift"));
        assert!(!log.push_unique("shift"));
        assert_eq!(log.to_vec(), vec!["shift"]);
    }

    #[test]
    fn test_key_sequence_evicts_oldest() {
        let mut state = InputState::new(3, 3);
        for key in ["a", "b", "c", "d"] {
            state.key_down(key);
        }
        assert_eq!(snapshot_keys(&mut state), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_press_release_press_leaves_single_entry() {
        let mut state = InputState::new(3, 3);
        state.key_down("a");
        state.key_up("a");
        state.key_down("a");
        assert_eq!(snapshot_keys(&mut state), vec!["a"]);
    }

    #[test]
    fn test_key_up_without_down_is_noop() {
        let mut state = InputState::new(3, 3);
        state.key_up("phantom");
        assert!(snapshot_keys(&mut state).is_empty());
    }

    #[test]
    fn test_clicks_do_not_touch_active_keys() {
        let mut state = InputState::new(3, 3);
        state.key_down("w");
        state.button_down("click: left".to_string());
        let snap = state.observe(Instant::now());
        assert_eq!(snap.keys, vec!["w"]);
        assert_eq!(snap.clicks, vec!["click: left"]);
    }

    #[test]
    fn test_display_line_merges_keys_then_clicks() {
        let mut state = InputState::new(3, 3);
        state.key_down("w");
        state.key_down("a");
        state.button_down("click: left".to_string());
        let snap = state.observe(Instant::now());
        assert_eq!(snap.display_line(), "w | a | click: left");
    }

    #[test]
    fn test_rate_sample_none_inside_window() {
        let start = Instant::now();
        let mut rate = RateCounter::new(start);
        rate.record();
        rate.record();
        assert_eq!(rate.sample(start + Duration::from_millis(500)), None);
        // Count is preserved until the window elapses
        assert_eq!(rate.sample(start + Duration::from_millis(1000)), Some(2));
    }

    #[test]
    fn test_rate_resets_once_per_window() {
        let start = Instant::now();
        let mut rate = RateCounter::new(start);
        for _ in 0..7 {
            rate.record();
        }
        assert_eq!(rate.sample(start + Duration::from_millis(1100)), Some(7));
        // Immediately after the reset a new window has begun
        assert_eq!(rate.sample(start + Duration::from_millis(1200)), None);
        rate.record();
        assert_eq!(rate.sample(start + Duration::from_millis(2200)), Some(1));
    }

    #[test]
    fn test_rate_counts_repeated_key_down() {
        let mut state = InputState::new(3, 3);
        let start = Instant::now();
        state.key_down("space");
        state.key_down("space");
        let snap = state.observe(start + Duration::from_millis(1500));
        assert_eq!(snap.keys, vec!["space"]);
        assert_eq!(snap.rate, Some(2));
    }

    #[test]
    fn test_clicks_do_not_count_toward_rate() {
        let mut state = InputState::new(3, 3);
        let start = Instant::now();
        state.button_down("click: left".to_string());
        state.button_down("click: right".to_string());
        state.key_down("e");
        let snap = state.observe(start + Duration::from_millis(1500));
        assert_eq!(snap.rate, Some(1));
    }

    #[test]
    fn test_shared_input_concurrent_mutation() {
        let shared = SharedInput::new(5, 5);
        let writer = shared.clone();
        let handle = std::thread::spawn(move || {
            for i in 0..50 {
                writer.key_down(&format!("k{}", i % 8));
                writer.set_pointer(i, i);
            }
        });
        for _ in 0..50 {
            let snap = shared.observe(Instant::now());
            assert!(snap.keys.len() <= 5);
        }
        handle.join().unwrap();
        let snap = shared.observe(Instant::now());
        assert_eq!(snap.pointer, (49, 49));
    }
}
