//! JVM bindings for the anchor-heap traits
//!
//! [`JvmHost`] acquires the JVMTI environment at load time; [`JniHeap`]
//! serves one query on the calling Java thread.

use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;

use anchor_heap::{
    AgentHost, BootstrapError, Capabilities, HeapCandidate, HeapIntrospector, HeapVisitor,
    QueryError, QueryResult, RuntimeError, SessionTag, WalkControl,
};
use anchor_jvmti_sys::{
    JNI_ERR, JNI_FALSE, JNI_OK, JNIEnv, JVMTI_HEAP_OBJECT_EITHER, JVMTI_ITERATION_ABORT,
    JVMTI_ITERATION_CONTINUE, JVMTI_VERSION_1_2, JavaVM, jclass, jlong, jobject, jobjectArray,
    jsize, jvmtiCapabilities, jvmtiIterationControl,
};

use crate::jvmti::{JvmtiBuffer, JvmtiEnv};

/// The VM an agent entry point was called with
pub struct JvmHost {
    vm: *mut JavaVM,
}

impl JvmHost {
    /// Wrap the `JavaVM` pointer passed to a load hook
    ///
    /// # Safety
    /// `vm` must be null or a valid `JavaVM` for as long as the host is used.
    pub unsafe fn new(vm: *mut JavaVM) -> Self {
        Self { vm }
    }
}

fn environment_unavailable(code: i32) -> BootstrapError {
    BootstrapError::EnvironmentUnavailable { code }
}

impl AgentHost for JvmHost {
    type Environment = JvmtiEnv;

    fn acquire_environment(&self) -> Result<JvmtiEnv, BootstrapError> {
        if self.vm.is_null() {
            return Err(environment_unavailable(JNI_ERR));
        }
        let get_env =
            unsafe { (**self.vm).GetEnv }.ok_or_else(|| environment_unavailable(JNI_ERR))?;

        let mut raw: *mut c_void = ptr::null_mut();
        let rc = unsafe { get_env(self.vm, &mut raw, JVMTI_VERSION_1_2) };
        if rc != JNI_OK {
            return Err(environment_unavailable(rc));
        }
        unsafe { JvmtiEnv::from_raw(raw.cast()) }.ok_or_else(|| environment_unavailable(JNI_ERR))
    }

    fn potential_capabilities(&self, env: &JvmtiEnv) -> Result<Capabilities, BootstrapError> {
        let caps = env
            .potential_capabilities()
            .map_err(BootstrapError::CapabilityRejected)?;
        Ok(Capabilities {
            can_tag_objects: caps.can_tag_objects(),
        })
    }

    fn add_capabilities(
        &self,
        env: &JvmtiEnv,
        capabilities: Capabilities,
    ) -> Result<(), BootstrapError> {
        let mut caps = jvmtiCapabilities::default();
        caps.set_can_tag_objects(capabilities.can_tag_objects);
        env.add_capabilities(&caps)
            .map_err(BootstrapError::CapabilityRejected)
    }
}

/// Heap access for one query, bound to the calling thread's `JNIEnv`
pub struct JniHeap {
    jvmti: JvmtiEnv,
    env: *mut JNIEnv,
}

impl JniHeap {
    /// Bind the environment to the JNI env of the current native call
    ///
    /// # Safety
    /// `env` must be the valid `JNIEnv` of the calling thread and outlive
    /// the returned heap.
    pub unsafe fn new(jvmti: JvmtiEnv, env: *mut JNIEnv) -> Self {
        Self { jvmti, env }
    }

    fn exception_pending(&self) -> bool {
        let functions = unsafe { &**self.env };
        let Some(check) = functions.ExceptionCheck else {
            return false;
        };
        let pending = unsafe { check(self.env) };
        pending != JNI_FALSE
    }

    fn delete_local_ref(&self, object: jobject) {
        let functions = unsafe { &**self.env };
        if let Some(delete) = functions.DeleteLocalRef {
            unsafe { delete(self.env, object) };
        }
    }
}

/// `jvmtiHeapObjectCallback` forwarding to the `&mut dyn HeapVisitor`
/// behind `user_data`
unsafe extern "system" fn heap_object_callback(
    class_tag: jlong,
    size: jlong,
    tag_ptr: *mut jlong,
    user_data: *mut c_void,
) -> jvmtiIterationControl {
    if tag_ptr.is_null() || user_data.is_null() {
        return JVMTI_ITERATION_ABORT;
    }
    let visitor = unsafe { &mut *(user_data as *mut &mut dyn HeapVisitor) };
    let tag = unsafe { &mut *tag_ptr };
    let candidate = HeapCandidate { class_tag, size };

    // Unwinding into the VM is undefined; a panicking visitor ends the walk.
    match panic::catch_unwind(AssertUnwindSafe(|| visitor.visit(candidate, tag))) {
        Ok(WalkControl::Continue) => JVMTI_ITERATION_CONTINUE,
        Ok(WalkControl::Abort) | Err(_) => JVMTI_ITERATION_ABORT,
    }
}

impl HeapIntrospector for JniHeap {
    type Class = jclass;
    type Object = jobject;
    type Tagged = JvmtiBuffer<jobject>;
    type Array = jobjectArray;

    fn iterate_instances_of_class(
        &self,
        class: &jclass,
        visitor: &mut dyn HeapVisitor,
    ) -> Result<(), RuntimeError> {
        let mut visitor = visitor;
        let user_data = &mut visitor as *mut &mut dyn HeapVisitor as *const c_void;
        unsafe {
            self.jvmti.iterate_over_instances_of_class(
                *class,
                JVMTI_HEAP_OBJECT_EITHER,
                Some(heap_object_callback),
                user_data,
            )
        }
    }

    fn objects_with_tag(&self, tag: SessionTag) -> Result<JvmtiBuffer<jobject>, RuntimeError> {
        self.jvmti.objects_with_tags(&[tag.get()])
    }

    fn new_array(&self, class: &jclass, objects: &[jobject]) -> QueryResult<jobjectArray> {
        let functions = unsafe { &**self.env };
        let (Some(new_object_array), Some(set_element)) =
            (functions.NewObjectArray, functions.SetObjectArrayElement)
        else {
            return Err(QueryError::Materialize(
                "JNI array functions unavailable".into(),
            ));
        };

        let len = jsize::try_from(objects.len()).map_err(|_| {
            QueryError::Materialize(format!(
                "{} instances exceed the maximum array length",
                objects.len()
            ))
        })?;

        let array = unsafe { new_object_array(self.env, len, *class, ptr::null_mut()) };
        if array.is_null() || self.exception_pending() {
            return Err(QueryError::Materialize(format!(
                "NewObjectArray failed for {len} elements"
            )));
        }

        // Each element is a fresh local ref from GetObjectsWithTags.
        for (index, &object) in objects.iter().enumerate() {
            unsafe { set_element(self.env, array, index as jsize, object) };
            self.delete_local_ref(object);

            // Only local ref cleanup is legal while an exception is pending.
            if self.exception_pending() {
                for &rest in &objects[index + 1..] {
                    self.delete_local_ref(rest);
                }
                self.delete_local_ref(array);
                return Err(QueryError::Materialize(format!(
                    "SetObjectArrayElement raised an exception at index {index}"
                )));
            }
        }
        Ok(array)
    }
}
