//! Bounded iteration control for a single heap walk

/// Limit value meaning "no cap"
pub const UNBOUNDED: i32 = -1;

/// Per-session visit counter.
///
/// The count is bumped before the comparison, so a limit of `n >= 1`
/// accepts `n - 1` continues and the `n`-th visit aborts the walk.
/// A negative limit never aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IterationLimit {
    visited: i32,
    limit: i32,
}

impl IterationLimit {
    /// Start a fresh session with the given limit
    pub const fn new(limit: i32) -> Self {
        Self { visited: 0, limit }
    }

    /// Clear the visit count and store a new limit
    pub fn reset(&mut self, limit: i32) {
        self.visited = 0;
        self.limit = limit;
    }

    /// Record one visit and report whether the walk may continue
    pub fn try_acquire(&mut self) -> bool {
        self.visited = self.visited.saturating_add(1);
        self.limit < 0 || self.limit > self.visited
    }

    /// Objects visited so far in this session
    pub fn visited(&self) -> i32 {
        self.visited
    }

    /// Configured limit
    pub fn limit(&self) -> i32 {
        self.limit
    }

    /// Whether any object may be admitted at all (limit is not zero)
    pub fn admits_any(&self) -> bool {
        self.limit != 0
    }
}

impl Default for IterationLimit {
    fn default() -> Self {
        Self::new(UNBOUNDED)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_one_aborts_on_first_visit() {
        let mut limit = IterationLimit::new(1);
        assert!(!limit.try_acquire());
        assert_eq!(limit.visited(), 1);
    }

    #[test]
    fn test_limit_zero_rejects_first_visit() {
        let mut limit = IterationLimit::new(0);
        assert!(!limit.admits_any());
        assert!(!limit.try_acquire());
        assert_eq!(limit.visited(), 1);
    }

    #[test]
    fn test_limit_n_continues_n_minus_one_times() {
        let mut limit = IterationLimit::new(3);
        assert!(limit.try_acquire());
        assert!(limit.try_acquire());
        assert!(!limit.try_acquire());
        assert!(!limit.try_acquire());
        assert_eq!(limit.visited(), 4);
    }

    #[test]
    fn test_unbounded_never_aborts() {
        let mut limit = IterationLimit::default();
        assert_eq!(limit.limit(), UNBOUNDED);
        for _ in 0..10_000 {
            assert!(limit.try_acquire());
        }
        assert_eq!(limit.visited(), 10_000);
    }

    #[test]
    fn test_reset() {
        let mut limit = IterationLimit::new(2);
        limit.try_acquire();
        limit.try_acquire();

        limit.reset(5);
        assert_eq!(limit.visited(), 0);
        assert_eq!(limit.limit(), 5);
        assert!(limit.try_acquire());
    }

    #[test]
    fn test_count_saturates() {
        let mut limit = IterationLimit {
            visited: i32::MAX - 1,
            limit: UNBOUNDED,
        };
        assert!(limit.try_acquire());
        assert!(limit.try_acquire());
        assert_eq!(limit.visited(), i32::MAX);
    }
}
