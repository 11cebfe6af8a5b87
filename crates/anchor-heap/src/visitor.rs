//! Heap walk visitor
//!
//! The runtime drives the walk and calls back once per candidate object.
//! Platform bindings adapt their native callback to [`HeapVisitor`].

use crate::limit::IterationLimit;
use crate::tag::SessionTag;

/// Metadata the runtime reports for a visited object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeapCandidate {
    /// Tag of the object's class (0 if untagged)
    pub class_tag: i64,
    /// Object size in bytes
    pub size: i64,
}

/// Directive returned to the walking algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkControl {
    /// Visit the next candidate
    Continue,
    /// Stop the walk; the current candidate keeps whatever tag it was given
    Abort,
}

/// Per-object callback of a heap walk
pub trait HeapVisitor {
    /// Visit one candidate. `tag` is the object's tag slot; writing it tags the object.
    fn visit(&mut self, candidate: HeapCandidate, tag: &mut i64) -> WalkControl;
}

/// Visitor for one query session: tags every visited object with the
/// session tag and stops once the limit says so.
///
/// The visit is counted before the limit is compared, so the object that
/// trips the abort is tagged and ends up in the result. A limit of zero is
/// the exception: the walk still aborts on the first candidate, but that
/// candidate is left untagged, so Java callers get an empty array rather
/// than the first instance.
#[derive(Debug)]
pub struct SessionVisitor<'a> {
    tag: SessionTag,
    limit: &'a mut IterationLimit,
    visited_bytes: i64,
}

impl<'a> SessionVisitor<'a> {
    /// Create the visitor for a session. `limit` must already be reset.
    pub fn new(tag: SessionTag, limit: &'a mut IterationLimit) -> Self {
        Self {
            tag,
            limit,
            visited_bytes: 0,
        }
    }

    /// Objects visited so far
    pub fn visited(&self) -> i32 {
        self.limit.visited()
    }

    /// Sum of the sizes of visited objects
    pub fn visited_bytes(&self) -> i64 {
        self.visited_bytes
    }
}

impl HeapVisitor for SessionVisitor<'_> {
    fn visit(&mut self, candidate: HeapCandidate, tag: &mut i64) -> WalkControl {
        // A zero limit admits nothing, not even the object that trips the abort.
        if self.limit.admits_any() {
            *tag = self.tag.get();
        }
        self.visited_bytes = self.visited_bytes.saturating_add(candidate.size);

        if self.limit.try_acquire() {
            WalkControl::Continue
        } else {
            WalkControl::Abort
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::TagAllocator;

    fn candidate() -> HeapCandidate {
        HeapCandidate {
            class_tag: 0,
            size: 16,
        }
    }

    #[test]
    fn test_aborting_visit_still_tags() {
        let tag = TagAllocator::new().next_tag();
        let mut limit = IterationLimit::new(1);
        let mut visitor = SessionVisitor::new(tag, &mut limit);

        let mut slot = 0;
        assert_eq!(visitor.visit(candidate(), &mut slot), WalkControl::Abort);
        assert_eq!(slot, tag.get());
        assert_eq!(visitor.visited(), 1);
    }

    #[test]
    fn test_zero_limit_leaves_slot_untouched() {
        let tag = TagAllocator::new().next_tag();
        let mut limit = IterationLimit::new(0);
        let mut visitor = SessionVisitor::new(tag, &mut limit);

        let mut slot = 7;
        assert_eq!(visitor.visit(candidate(), &mut slot), WalkControl::Abort);
        assert_eq!(slot, 7);
        assert_eq!(visitor.visited(), 1);
    }

    #[test]
    fn test_overwrites_previous_tag() {
        let tags = TagAllocator::new();
        let first = tags.next_tag();
        let second = tags.next_tag();
        let mut limit = IterationLimit::default();
        let mut visitor = SessionVisitor::new(second, &mut limit);

        let mut slot = first.get();
        assert_eq!(visitor.visit(candidate(), &mut slot), WalkControl::Continue);
        assert_eq!(slot, second.get());
    }

    #[test]
    fn test_visited_bytes() {
        let mut limit = IterationLimit::default();
        let mut visitor = SessionVisitor::new(TagAllocator::new().next_tag(), &mut limit);
        let mut slot = 0;
        for _ in 0..3 {
            visitor.visit(candidate(), &mut slot);
        }
        assert_eq!(visitor.visited_bytes(), 48);
    }

    #[test]
    fn test_reused_limit_starts_over() {
        let tags = TagAllocator::new();
        let mut limit = IterationLimit::new(1);
        let mut slot = 0;

        SessionVisitor::new(tags.next_tag(), &mut limit).visit(candidate(), &mut slot);
        assert_eq!(limit.visited(), 1);

        limit.reset(2);
        let second = tags.next_tag();
        let mut visitor = SessionVisitor::new(second, &mut limit);
        assert_eq!(visitor.visit(candidate(), &mut slot), WalkControl::Continue);
        assert_eq!(visitor.visit(candidate(), &mut slot), WalkControl::Abort);
        assert_eq!(slot, second.get());
    }
}
