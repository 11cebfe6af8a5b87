//! Safe-ish wrapper over a raw `jvmtiEnv`

use std::ffi::c_void;
use std::ptr::{self, NonNull};
use std::slice;

use anchor_heap::RuntimeError;
use anchor_jvmti_sys::{
    JVMTI_ERROR_ILLEGAL_ARGUMENT, JVMTI_ERROR_NONE, JVMTI_ERROR_NOT_AVAILABLE, error_name, jclass,
    jint, jlong, jobject, jvmtiCapabilities, jvmtiEnv, jvmtiError, jvmtiHeapObjectCallback,
    jvmtiHeapObjectFilter, jvmtiInterface_1_,
};

/// Map a JVMTI status to a `Result`
pub fn check(code: jvmtiError) -> Result<(), RuntimeError> {
    if code == JVMTI_ERROR_NONE {
        Ok(())
    } else {
        Err(runtime_error(code))
    }
}

/// Runtime error carrying the JVMTI code and its symbolic name
pub fn runtime_error(code: jvmtiError) -> RuntimeError {
    RuntimeError::new(code, error_name(code))
}

/// Handle to a JVMTI environment. Copyable; the VM owns the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JvmtiEnv {
    raw: NonNull<jvmtiEnv>,
}

// SAFETY: JVMTI environments are usable from any thread attached to the VM.
unsafe impl Send for JvmtiEnv {}
unsafe impl Sync for JvmtiEnv {}

impl JvmtiEnv {
    /// Wrap a pointer obtained from `JavaVM::GetEnv`.
    ///
    /// # Safety
    /// `raw` must be null or a live JVMTI environment.
    pub unsafe fn from_raw(raw: *mut jvmtiEnv) -> Option<Self> {
        NonNull::new(raw).map(|raw| Self { raw })
    }

    /// Raw environment pointer
    pub fn as_raw(&self) -> *mut jvmtiEnv {
        self.raw.as_ptr()
    }

    fn functions(&self) -> &jvmtiInterface_1_ {
        // SAFETY: a live environment always points at the VM's function table
        unsafe { &**self.raw.as_ptr() }
    }

    /// Capabilities this environment could be granted
    pub fn potential_capabilities(&self) -> Result<jvmtiCapabilities, RuntimeError> {
        let f = self
            .functions()
            .GetPotentialCapabilities
            .ok_or_else(|| runtime_error(JVMTI_ERROR_NOT_AVAILABLE))?;
        let mut caps = jvmtiCapabilities::default();
        check(unsafe { f(self.as_raw(), &mut caps) })?;
        Ok(caps)
    }

    /// Request capabilities for this environment
    pub fn add_capabilities(&self, caps: &jvmtiCapabilities) -> Result<(), RuntimeError> {
        let f = self
            .functions()
            .AddCapabilities
            .ok_or_else(|| runtime_error(JVMTI_ERROR_NOT_AVAILABLE))?;
        check(unsafe { f(self.as_raw(), caps) })
    }

    /// Walk the instances of `klass`, calling `callback` with `user_data`
    /// for each one.
    ///
    /// # Safety
    /// `klass` must be a valid class reference for the current thread, and
    /// `user_data` must be what `callback` expects.
    pub unsafe fn iterate_over_instances_of_class(
        &self,
        klass: jclass,
        filter: jvmtiHeapObjectFilter,
        callback: jvmtiHeapObjectCallback,
        user_data: *const c_void,
    ) -> Result<(), RuntimeError> {
        let f = self
            .functions()
            .IterateOverInstancesOfClass
            .ok_or_else(|| runtime_error(JVMTI_ERROR_NOT_AVAILABLE))?;
        check(unsafe { f(self.as_raw(), klass, filter, callback, user_data) })
    }

    /// Objects carrying any of `tags`, as JNI local references in a
    /// VM-allocated list
    pub fn objects_with_tags(&self, tags: &[jlong]) -> Result<JvmtiBuffer<jobject>, RuntimeError> {
        let f = self
            .functions()
            .GetObjectsWithTags
            .ok_or_else(|| runtime_error(JVMTI_ERROR_NOT_AVAILABLE))?;
        let tag_count =
            jint::try_from(tags.len()).map_err(|_| runtime_error(JVMTI_ERROR_ILLEGAL_ARGUMENT))?;

        let mut count: jint = 0;
        let mut objects: *mut jobject = ptr::null_mut();
        check(unsafe {
            f(
                self.as_raw(),
                tag_count,
                tags.as_ptr(),
                &mut count,
                &mut objects,
                ptr::null_mut(),
            )
        })?;

        Ok(JvmtiBuffer {
            env: *self,
            ptr: objects,
            len: usize::try_from(count).unwrap_or(0),
        })
    }

    /// Release memory the VM allocated on the agent's behalf.
    ///
    /// # Safety
    /// `mem` must come from this environment and not be released twice.
    pub unsafe fn deallocate(&self, mem: *mut u8) -> Result<(), RuntimeError> {
        let f = self
            .functions()
            .Deallocate
            .ok_or_else(|| runtime_error(JVMTI_ERROR_NOT_AVAILABLE))?;
        check(unsafe { f(self.as_raw(), mem) })
    }
}

/// Array allocated by the VM and handed to the agent.
/// Released with `Deallocate` when dropped.
pub struct JvmtiBuffer<T> {
    env: JvmtiEnv,
    ptr: *mut T,
    len: usize,
}

impl<T> AsRef<[T]> for JvmtiBuffer<T> {
    fn as_ref(&self) -> &[T] {
        if self.ptr.is_null() || self.len == 0 {
            return &[];
        }
        // SAFETY: the VM wrote `len` elements at `ptr`
        unsafe { slice::from_raw_parts(self.ptr, self.len) }
    }
}

impl<T> Drop for JvmtiBuffer<T> {
    fn drop(&mut self) {
        if self.ptr.is_null() {
            return;
        }
        if let Err(err) = unsafe { self.env.deallocate(self.ptr.cast()) } {
            tracing::warn!(target: "anchor::jvmti", "Deallocate failed: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_jvmti_sys::JVMTI_ERROR_INVALID_CLASS;

    #[test]
    fn test_check() {
        assert!(check(JVMTI_ERROR_NONE).is_ok());

        let err = check(JVMTI_ERROR_INVALID_CLASS).unwrap_err();
        assert_eq!(err.code, 21);
        assert_eq!(err.name, "JVMTI_ERROR_INVALID_CLASS");
    }

    #[test]
    fn test_null_environment() {
        assert!(unsafe { JvmtiEnv::from_raw(ptr::null_mut()) }.is_none());
    }
}
