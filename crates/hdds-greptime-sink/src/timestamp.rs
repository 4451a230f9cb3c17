// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Monotonic nanosecond timestamp allocation.
//!
//! GreptimeDB keys rows by tags plus the time index, so two log records that
//! land on the same nanosecond with the same tags would overwrite each other.
//! [`TimestampAllocator`] hands out timestamps that follow the requested
//! (event) time when it moves forward and fall back to `last + 1` otherwise.
//!
//! ```text
//! last = 0
//! allocate(100) -> 100
//! allocate(100) -> 101
//! allocate(50)  -> 102
//! allocate(200) -> 200
//! ```

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Issues strictly increasing nanosecond timestamps.
///
/// One allocator belongs to one connection. The read-modify-write runs as a
/// single compare-and-swap, so any number of threads can share it.
#[derive(Debug, Default)]
pub struct TimestampAllocator {
    last_issued: AtomicI64,
}

impl TimestampAllocator {
    /// Create an allocator that has issued nothing yet.
    pub fn new() -> Self {
        Self {
            last_issued: AtomicI64::new(0),
        }
    }

    /// Issue a timestamp for `candidate` (nanoseconds since the Unix epoch).
    ///
    /// Returns `candidate` if it is ahead of everything issued so far,
    /// otherwise one past the last issued value.
    pub fn allocate(&self, candidate: i64) -> i64 {
        let previous = self
            .last_issued
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(next_after(last, candidate))
            })
            // The closure always returns Some.
            .unwrap_or_else(|last| last);
        next_after(previous, candidate)
    }

    /// Issue a timestamp for a wall-clock time.
    ///
    /// Returns `None`, leaving the allocator untouched, for times outside
    /// the `i64` nanosecond range.
    pub fn allocate_time(&self, time: DateTime<Utc>) -> Option<i64> {
        unix_nanos(time).map(|ns| self.allocate(ns))
    }

    /// Last timestamp handed out, `0` if none.
    pub fn last_issued(&self) -> i64 {
        self.last_issued.load(Ordering::SeqCst)
    }
}

fn next_after(last: i64, candidate: i64) -> i64 {
    if candidate > last {
        candidate
    } else {
        last + 1
    }
}

/// Nanoseconds since the Unix epoch, `None` outside 1677..=2262.
pub fn unix_nanos(time: DateTime<Utc>) -> Option<i64> {
    time.timestamp_nanos_opt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashSet;
    use std::sync::Barrier;

    #[test]
    fn test_allocate_reference_sequence() {
        let alloc = TimestampAllocator::new();
        assert_eq!(alloc.allocate(100), 100);
        assert_eq!(alloc.allocate(100), 101);
        assert_eq!(alloc.allocate(50), 102);
        assert_eq!(alloc.allocate(200), 200);
        assert_eq!(alloc.allocate(200), 201);
        assert_eq!(alloc.last_issued(), 201);
    }

    #[test]
    fn test_allocate_anchors_to_candidate() {
        let alloc = TimestampAllocator::new();
        alloc.allocate(10);
        // Far ahead: no drift towards last + 1
        assert_eq!(alloc.allocate(1_000_000), 1_000_000);
    }

    #[test]
    fn test_allocate_strictly_increasing_for_any_input() {
        let alloc = TimestampAllocator::new();
        let candidates = [5, 5, 3, 9, 9, 9, 1, 20, 0, -7, 21];
        let mut prev = alloc.last_issued();
        for c in candidates {
            let issued = alloc.allocate(c);
            assert!(issued > prev, "{} should be > {}", issued, prev);
            if c > prev {
                assert_eq!(issued, c);
            } else {
                assert_eq!(issued, prev + 1);
            }
            prev = issued;
        }
    }

    #[test]
    fn test_allocate_time_uses_unix_nanos() {
        let alloc = TimestampAllocator::new();
        let t = Utc.timestamp_opt(1_700_000_000, 123).single().expect("valid time");
        assert_eq!(alloc.allocate_time(t), Some(1_700_000_000_000_000_123));
        assert_eq!(alloc.allocate_time(t), Some(1_700_000_000_000_000_124));
    }

    #[test]
    fn test_unix_nanos_out_of_range() {
        let far = Utc.with_ymd_and_hms(2300, 1, 1, 0, 0, 0).single().expect("valid time");
        assert_eq!(unix_nanos(far), None);
        let early = Utc.with_ymd_and_hms(1600, 1, 1, 0, 0, 0).single().expect("valid time");
        assert_eq!(unix_nanos(early), None);
    }

    #[test]
    fn test_allocate_time_far_future_leaves_state() {
        let alloc = TimestampAllocator::new();
        alloc.allocate(500);

        let far = Utc.with_ymd_and_hms(2300, 1, 1, 0, 0, 0).single().expect("valid time");
        assert_eq!(alloc.allocate_time(far), None);
        assert_eq!(alloc.allocate_time(far), None);
        assert_eq!(alloc.last_issued(), 500);
        assert_eq!(alloc.allocate(500), 501);
    }

    #[test]
    fn test_two_racing_callers_never_collide() {
        let alloc = TimestampAllocator::new();
        let barrier = Barrier::new(2);

        let (a, b) = std::thread::scope(|s| {
            let ha = s.spawn(|| {
                barrier.wait();
                alloc.allocate(1000)
            });
            let hb = s.spawn(|| {
                barrier.wait();
                alloc.allocate(1000)
            });
            (ha.join().expect("thread a"), hb.join().expect("thread b"))
        });

        let mut got = vec![a, b];
        got.sort_unstable();
        assert_eq!(got, vec![1000, 1001]);
    }

    #[test]
    fn test_concurrent_identical_candidates_are_unique() {
        const THREADS: usize = 8;
        const PER_THREAD: usize = 2_000;

        let alloc = TimestampAllocator::new();
        let barrier = Barrier::new(THREADS);

        let all: Vec<i64> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..THREADS)
                .map(|_| {
                    s.spawn(|| {
                        barrier.wait();
                        let mut issued = Vec::with_capacity(PER_THREAD);
                        for _ in 0..PER_THREAD {
                            issued.push(alloc.allocate(42));
                        }
                        issued
                    })
                })
                .collect();
            handles
                .into_iter()
                .flat_map(|h| h.join().expect("worker"))
                .collect()
        });

        // Each thread sees its own values strictly increasing
        for chunk in all.chunks(PER_THREAD) {
            assert!(chunk.windows(2).all(|w| w[0] < w[1]));
        }

        let unique: HashSet<i64> = all.iter().copied().collect();
        assert_eq!(unique.len(), THREADS * PER_THREAD);

        // Identical candidates form one tight run starting at the candidate
        let total = (THREADS * PER_THREAD) as i64;
        assert_eq!(all.iter().min(), Some(&42));
        assert_eq!(all.iter().max(), Some(&(42 + total - 1)));
        assert_eq!(alloc.last_issued(), 42 + total - 1);
    }
}
