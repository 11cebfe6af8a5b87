#![allow(non_snake_case)]

//! anchor-agent - JVMTI agent returning live instances of a class to Java.
//!
//! Load it with `-agentpath:/path/to/libanchor_agent.so[=options]`, attach it
//! to a running VM, or `System.load` it from Java. Every load path requests
//! the `can_tag_objects` capability.
//!
//! Java side:
//!
//! ```java
//! package com.alibaba.jvm.sandbox;
//!
//! public class JniAnchorPoint {
//!     private static synchronized native <T> T[] getInstances0(Class<T> klass, int limit);
//! }
//! ```
//!
//! `getInstances0` returns an array (possibly empty) on success and `null`
//! when the VM reported an error. A negative `limit` means no cap.
//! Diagnostics go to stderr.

pub mod agent;
pub mod config;
pub mod error;
pub mod host;
pub mod jvmti;
pub mod logging;

use std::os::raw::c_char;
use std::ptr;

use anchor_jvmti_sys::{JNI_VERSION_1_6, JNIEnv, JavaVM, jclass, jint, jobjectArray};

pub use config::AgentConfig;
pub use error::{AgentError, AgentResult};

/// Called when the agent is loaded at VM startup
///
/// # Safety
/// Called by the VM with a valid `JavaVM`.
#[unsafe(no_mangle)]
pub unsafe extern "system" fn Agent_OnLoad(
    vm: *mut JavaVM,
    options: *mut c_char,
    _reserved: *mut std::ffi::c_void,
) -> jint {
    unsafe { agent::on_load(vm, options, "Agent_OnLoad") }
}

/// Called when the agent is attached to a running VM
///
/// # Safety
/// Called by the VM with a valid `JavaVM`.
#[unsafe(no_mangle)]
pub unsafe extern "system" fn Agent_OnAttach(
    vm: *mut JavaVM,
    options: *mut c_char,
    _reserved: *mut std::ffi::c_void,
) -> jint {
    unsafe { agent::on_load(vm, options, "Agent_OnAttach") }
}

/// Called when the library is loaded through `System.load`.
///
/// Must report a JNI version, so a failed bootstrap is only logged; queries
/// then return `null`.
///
/// # Safety
/// Called by the VM with a valid `JavaVM`.
#[unsafe(no_mangle)]
pub unsafe extern "system" fn JNI_OnLoad(vm: *mut JavaVM, _reserved: *mut std::ffi::c_void) -> jint {
    unsafe { agent::on_load(vm, ptr::null(), "JNI_OnLoad") };
    JNI_VERSION_1_6
}

/// `JniAnchorPoint.getInstances0(Class<T>, int)`
///
/// # Safety
/// Called by the VM on a Java thread with a valid `JNIEnv`.
#[unsafe(no_mangle)]
pub unsafe extern "system" fn Java_com_alibaba_jvm_sandbox_JniAnchorPoint_getInstances0(
    env: *mut JNIEnv,
    _this_class: jclass,
    klass: jclass,
    limit: jint,
) -> jobjectArray {
    unsafe { agent::get_instances(env, klass, limit) }.unwrap_or(ptr::null_mut())
}
