//! Session tag allocation

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

/// Tag marking the objects that belong to one query session.
///
/// Never `0`: the runtime reads a zero tag as "untagged".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionTag(i64);

impl SessionTag {
    /// Raw tag value as written into the runtime's tag slot
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for SessionTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process-wide tag counter.
///
/// Pre-increments and hands out the new value, so the first tag is `1`.
/// Wraps at `i64::MAX` without error and skips `0` on the way around.
pub struct TagAllocator {
    last: AtomicI64,
}

impl TagAllocator {
    /// Create an allocator whose first tag is `1`
    pub const fn new() -> Self {
        Self::starting_after(0)
    }

    /// Create an allocator whose next tag follows `last`
    pub const fn starting_after(last: i64) -> Self {
        Self {
            last: AtomicI64::new(last),
        }
    }

    /// Issue the next session tag
    pub fn next_tag(&self) -> SessionTag {
        let prev = match self
            .last
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |t| Some(advance(t)))
        {
            Ok(prev) | Err(prev) => prev,
        };
        SessionTag(advance(prev))
    }

    /// Most recently issued tag value (`0` before the first allocation)
    pub fn last_issued(&self) -> i64 {
        self.last.load(Ordering::Relaxed)
    }
}

impl Default for TagAllocator {
    fn default() -> Self {
        Self::new()
    }
}

fn advance(tag: i64) -> i64 {
    match tag.wrapping_add(1) {
        0 => 1,
        next => next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_tags_are_pre_incremented() {
        let tags = TagAllocator::new();
        assert_eq!(tags.last_issued(), 0);
        assert_eq!(tags.next_tag().get(), 1);
        assert_eq!(tags.next_tag().get(), 2);
        assert_eq!(tags.last_issued(), 2);
    }

    #[test]
    fn test_wraparound_skips_zero() {
        let tags = TagAllocator::starting_after(i64::MAX);
        assert_eq!(tags.next_tag().get(), i64::MIN);

        let tags = TagAllocator::starting_after(-1);
        assert_eq!(tags.next_tag().get(), 1);
    }

    #[test]
    fn test_concurrent_tags_unique() {
        let tags = Arc::new(TagAllocator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let tags = Arc::clone(&tags);
                std::thread::spawn(move || (0..250).map(|_| tags.next_tag()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for tag in handle.join().unwrap() {
                assert!(seen.insert(tag));
            }
        }
        assert_eq!(seen.len(), 1000);
        assert_eq!(tags.last_issued(), 1000);
    }
}
