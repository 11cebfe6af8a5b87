//! Raw FFI bindings to the JVM Tool Interface (JVMTI 1.2)
//!
//! Only the slice of the `jvmtiInterface_1_` function table used by the
//! anchor agent is named; the remaining slots are kept as opaque padding so
//! the named entries land at the offsets `jvmti.h` gives them.
//! JNI types are re-exported from `jni-sys`.

#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]

use std::ffi::c_void;
use std::os::raw::{c_uchar, c_uint};

pub use jni_sys::{
    JNI_EDETACHED, JNI_ERR, JNI_EVERSION, JNI_FALSE, JNI_OK, JNI_TRUE, JNI_VERSION_1_6, JNIEnv,
    JNIInvokeInterface_, JNINativeInterface_, JavaVM, jboolean, jclass, jint, jlong, jobject,
    jobjectArray, jsize,
};

/// Interface version requested from `JavaVM::GetEnv`.
pub const JVMTI_VERSION_1_2: jint = 0x3001_0200;

/// Environment pointer handed out by `GetEnv`; points at the function table.
pub type jvmtiEnv = *const jvmtiInterface_1_;

// Error codes
pub type jvmtiError = c_uint;
pub const JVMTI_ERROR_NONE: jvmtiError = 0;
pub const JVMTI_ERROR_INVALID_THREAD: jvmtiError = 10;
pub const JVMTI_ERROR_INVALID_THREAD_GROUP: jvmtiError = 11;
pub const JVMTI_ERROR_INVALID_OBJECT: jvmtiError = 20;
pub const JVMTI_ERROR_INVALID_CLASS: jvmtiError = 21;
pub const JVMTI_ERROR_CLASS_NOT_PREPARED: jvmtiError = 22;
pub const JVMTI_ERROR_NOT_FOUND: jvmtiError = 41;
pub const JVMTI_ERROR_UNSUPPORTED_VERSION: jvmtiError = 68;
pub const JVMTI_ERROR_NOT_AVAILABLE: jvmtiError = 98;
pub const JVMTI_ERROR_MUST_POSSESS_CAPABILITY: jvmtiError = 99;
pub const JVMTI_ERROR_NULL_POINTER: jvmtiError = 100;
pub const JVMTI_ERROR_ABSENT_INFORMATION: jvmtiError = 101;
pub const JVMTI_ERROR_ILLEGAL_ARGUMENT: jvmtiError = 103;
pub const JVMTI_ERROR_OUT_OF_MEMORY: jvmtiError = 110;
pub const JVMTI_ERROR_ACCESS_DENIED: jvmtiError = 111;
pub const JVMTI_ERROR_WRONG_PHASE: jvmtiError = 112;
pub const JVMTI_ERROR_INTERNAL: jvmtiError = 113;
pub const JVMTI_ERROR_UNATTACHED_THREAD: jvmtiError = 115;
pub const JVMTI_ERROR_INVALID_ENVIRONMENT: jvmtiError = 116;

/// Symbolic name of a JVMTI error code, without calling into the VM.
///
/// Failure paths report through this table so no call back into the VM is
/// needed.
pub fn error_name(code: jvmtiError) -> &'static str {
    match code {
        JVMTI_ERROR_NONE => "JVMTI_ERROR_NONE",
        JVMTI_ERROR_INVALID_THREAD => "JVMTI_ERROR_INVALID_THREAD",
        JVMTI_ERROR_INVALID_THREAD_GROUP => "JVMTI_ERROR_INVALID_THREAD_GROUP",
        JVMTI_ERROR_INVALID_OBJECT => "JVMTI_ERROR_INVALID_OBJECT",
        JVMTI_ERROR_INVALID_CLASS => "JVMTI_ERROR_INVALID_CLASS",
        JVMTI_ERROR_CLASS_NOT_PREPARED => "JVMTI_ERROR_CLASS_NOT_PREPARED",
        JVMTI_ERROR_NOT_FOUND => "JVMTI_ERROR_NOT_FOUND",
        JVMTI_ERROR_UNSUPPORTED_VERSION => "JVMTI_ERROR_UNSUPPORTED_VERSION",
        JVMTI_ERROR_NOT_AVAILABLE => "JVMTI_ERROR_NOT_AVAILABLE",
        JVMTI_ERROR_MUST_POSSESS_CAPABILITY => "JVMTI_ERROR_MUST_POSSESS_CAPABILITY",
        JVMTI_ERROR_NULL_POINTER => "JVMTI_ERROR_NULL_POINTER",
        JVMTI_ERROR_ABSENT_INFORMATION => "JVMTI_ERROR_ABSENT_INFORMATION",
        JVMTI_ERROR_ILLEGAL_ARGUMENT => "JVMTI_ERROR_ILLEGAL_ARGUMENT",
        JVMTI_ERROR_OUT_OF_MEMORY => "JVMTI_ERROR_OUT_OF_MEMORY",
        JVMTI_ERROR_ACCESS_DENIED => "JVMTI_ERROR_ACCESS_DENIED",
        JVMTI_ERROR_WRONG_PHASE => "JVMTI_ERROR_WRONG_PHASE",
        JVMTI_ERROR_INTERNAL => "JVMTI_ERROR_INTERNAL",
        JVMTI_ERROR_UNATTACHED_THREAD => "JVMTI_ERROR_UNATTACHED_THREAD",
        JVMTI_ERROR_INVALID_ENVIRONMENT => "JVMTI_ERROR_INVALID_ENVIRONMENT",
        _ => "JVMTI_ERROR_UNKNOWN",
    }
}

// Heap object filter for IterateOverInstancesOfClass
pub type jvmtiHeapObjectFilter = c_uint;
pub const JVMTI_HEAP_OBJECT_TAGGED: jvmtiHeapObjectFilter = 1;
pub const JVMTI_HEAP_OBJECT_UNTAGGED: jvmtiHeapObjectFilter = 2;
pub const JVMTI_HEAP_OBJECT_EITHER: jvmtiHeapObjectFilter = 3;

// Return value of a heap object callback
pub type jvmtiIterationControl = c_uint;
pub const JVMTI_ITERATION_ABORT: jvmtiIterationControl = 0;
pub const JVMTI_ITERATION_CONTINUE: jvmtiIterationControl = 1;
pub const JVMTI_ITERATION_IGNORE: jvmtiIterationControl = 2;

/// `jvmtiCapabilities`: a 128-bit bitfield, first declared flag in the
/// least significant bit of the first word.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct jvmtiCapabilities {
    bits: [u32; 4],
}

impl jvmtiCapabilities {
    const CAN_TAG_OBJECTS: u32 = 1 << 0;

    /// `can_tag_objects` flag
    pub fn can_tag_objects(&self) -> bool {
        self.bits[0] & Self::CAN_TAG_OBJECTS != 0
    }

    /// Set the `can_tag_objects` flag
    pub fn set_can_tag_objects(&mut self, enabled: bool) {
        if enabled {
            self.bits[0] |= Self::CAN_TAG_OBJECTS;
        } else {
            self.bits[0] &= !Self::CAN_TAG_OBJECTS;
        }
    }
}

// Callback types
pub type jvmtiHeapObjectCallback = Option<
    unsafe extern "system" fn(
        class_tag: jlong,
        size: jlong,
        tag_ptr: *mut jlong,
        user_data: *mut c_void,
    ) -> jvmtiIterationControl,
>;

type Slot = *const c_void;

/// JVMTI function table. Slot `n` of `jvmti.h` (1-based) sits at index `n - 1`.
#[repr(C)]
pub struct jvmtiInterface_1_ {
    /// Slots 1..=46
    _slots_1_46: [Slot; 46],
    /// 47 : Deallocate
    pub Deallocate: Option<unsafe extern "system" fn(env: *mut jvmtiEnv, mem: *mut c_uchar) -> jvmtiError>,
    /// Slots 48..=111
    _slots_48_111: [Slot; 64],
    /// 112 : Iterate Over Instances Of Class
    pub IterateOverInstancesOfClass: Option<
        unsafe extern "system" fn(
            env: *mut jvmtiEnv,
            klass: jclass,
            object_filter: jvmtiHeapObjectFilter,
            heap_object_callback: jvmtiHeapObjectCallback,
            user_data: *const c_void,
        ) -> jvmtiError,
    >,
    /// 113 : RESERVED
    _reserved113: Slot,
    /// 114 : Get Objects With Tags
    pub GetObjectsWithTags: Option<
        unsafe extern "system" fn(
            env: *mut jvmtiEnv,
            tag_count: jint,
            tags: *const jlong,
            count_ptr: *mut jint,
            object_result_ptr: *mut *mut jobject,
            tag_result_ptr: *mut *mut jlong,
        ) -> jvmtiError,
    >,
    /// Slots 115..=139
    _slots_115_139: [Slot; 25],
    /// 140 : Get Potential Capabilities
    pub GetPotentialCapabilities: Option<
        unsafe extern "system" fn(
            env: *mut jvmtiEnv,
            capabilities_ptr: *mut jvmtiCapabilities,
        ) -> jvmtiError,
    >,
    /// 141 : RESERVED
    _reserved141: Slot,
    /// 142 : Add Capabilities
    pub AddCapabilities: Option<
        unsafe extern "system" fn(
            env: *mut jvmtiEnv,
            capabilities_ptr: *const jvmtiCapabilities,
        ) -> jvmtiError,
    >,
}
