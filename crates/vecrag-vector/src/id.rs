//! Point id generation
//!
//! Ids are milliseconds since the Unix epoch, bumped past the last issued
//! id so that two points written within the same millisecond still get
//! distinct ids. Uniqueness holds within one process only; separate
//! processes writing the same collection can still collide.

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic timestamp-derived id generator
#[derive(Debug, Default)]
pub struct PointIdGenerator {
    last: AtomicU64,
}

impl PointIdGenerator {
    /// Create a new generator
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next id: `max(now_ms, last + 1)`
    pub fn next_id(&self) -> u64 {
        let now = current_millis();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last.saturating_add(1));
            match self.last.compare_exchange_weak(
                last,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => last = actual,
            }
        }
    }
}

/// Milliseconds since the Unix epoch; clamps pre-epoch clocks to zero
fn current_millis() -> u64 {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_ids_track_wall_clock() {
        let generator = PointIdGenerator::new();
        let before = current_millis();
        let id = generator.next_id();
        assert!(id >= before);
    }

    #[test]
    fn test_ids_strictly_increase() {
        let generator = PointIdGenerator::new();
        let mut previous = generator.next_id();
        for _ in 0..1_000 {
            let id = generator.next_id();
            assert!(id > previous);
            previous = id;
        }
    }

    #[test]
    fn test_ids_unique_across_threads() {
        let generator = Arc::new(PointIdGenerator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let generator = Arc::clone(&generator);
                std::thread::spawn(move || {
                    (0..500)
                        .map(|_| generator.next_id())
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {id}");
            }
        }
        assert_eq!(seen.len(), 4_000);
    }
}
