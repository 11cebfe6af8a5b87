//! Instance collector
//!
//! One query runs end to end under the collector's session lock:
//! allocate a tag, walk the class's instances tagging them, fetch the
//! tagged set back from the runtime, build the result array, then release
//! the runtime's scratch list.

use parking_lot::Mutex;

use crate::error::{QueryError, QueryResult, RuntimeError};
use crate::limit::{IterationLimit, UNBOUNDED};
use crate::tag::{SessionTag, TagAllocator};
use crate::visitor::{HeapVisitor, SessionVisitor};

/// Heap inspection primitives provided by the host runtime
pub trait HeapIntrospector {
    /// Class handle a walk is scoped to
    type Class;
    /// Object reference handed back by the runtime
    type Object;
    /// Runtime-owned list of tagged objects. Dropping it releases the list.
    type Tagged: AsRef<[Self::Object]>;
    /// Materialized query result
    type Array;

    /// Walk every live instance of `class`, tagged or untagged, until the
    /// visitor aborts or the instances run out
    fn iterate_instances_of_class(
        &self,
        class: &Self::Class,
        visitor: &mut dyn HeapVisitor,
    ) -> Result<(), RuntimeError>;

    /// Fetch all objects currently carrying `tag`
    fn objects_with_tag(&self, tag: SessionTag) -> Result<Self::Tagged, RuntimeError>;

    /// Copy `objects` into a new array with element type `class`, in order
    fn new_array(&self, class: &Self::Class, objects: &[Self::Object]) -> QueryResult<Self::Array>;
}

/// Runs instance queries, one at a time
pub struct InstanceCollector {
    tags: TagAllocator,
    /// Held for a whole query; the limit is reset at the start of each one
    session: Mutex<IterationLimit>,
}

impl InstanceCollector {
    /// Create a collector with a fresh tag counter
    pub const fn new() -> Self {
        Self::with_tags(TagAllocator::new())
    }

    /// Create a collector drawing tags from `tags`
    pub const fn with_tags(tags: TagAllocator) -> Self {
        Self {
            tags,
            session: parking_lot::const_mutex(IterationLimit::new(UNBOUNDED)),
        }
    }

    /// Find up to `limit` live instances of `class`.
    ///
    /// A negative limit is unbounded. `Ok` with an empty array means no
    /// instance matched; `Err` means the runtime failed and nothing was built.
    pub fn find_instances<H: HeapIntrospector>(
        &self,
        heap: &H,
        class: &H::Class,
        limit: i32,
    ) -> QueryResult<H::Array> {
        let mut session = self.session.lock();
        session.reset(limit);

        let tag = self.tags.next_tag();
        let mut visitor = SessionVisitor::new(tag, &mut session);

        if let Err(err) = heap.iterate_instances_of_class(class, &mut visitor) {
            tracing::error!(
                target: "anchor::collector",
                %tag,
                code = err.code,
                "IterateOverInstancesOfClass failed: {err}"
            );
            return Err(QueryError::Walk(err));
        }

        let tagged = match heap.objects_with_tag(tag) {
            Ok(tagged) => tagged,
            Err(err) => {
                tracing::error!(
                    target: "anchor::collector",
                    %tag,
                    code = err.code,
                    "GetObjectsWithTags failed: {err}"
                );
                return Err(QueryError::Retrieval(err));
            }
        };

        let objects = tagged.as_ref();
        let array = heap.new_array(class, objects).inspect_err(|err| {
            tracing::error!(target: "anchor::collector", %tag, "{err}");
        })?;

        tracing::debug!(
            target: "anchor::collector",
            %tag,
            limit,
            visited = visitor.visited(),
            visited_bytes = visitor.visited_bytes(),
            found = objects.len(),
            "instance query complete"
        );

        Ok(array)
    }

    /// Find every live instance of `class`
    pub fn find_all_instances<H: HeapIntrospector>(
        &self,
        heap: &H,
        class: &H::Class,
    ) -> QueryResult<H::Array> {
        self.find_instances(heap, class, UNBOUNDED)
    }

    /// Most recently issued session tag value
    pub fn last_tag(&self) -> i64 {
        self.tags.last_issued()
    }
}

impl Default for InstanceCollector {
    fn default() -> Self {
        Self::new()
    }
}
