//! Process-wide agent state and the logic behind the exported entry points

use std::ffi::CStr;
use std::os::raw::c_char;
use std::sync::OnceLock;

use anchor_heap::{InstanceCollector, QueryError, QueryResult, bootstrap};
use anchor_jvmti_sys::{JNI_ERR, JNI_OK, JNIEnv, JavaVM, jclass, jint, jobjectArray};

use crate::config::AgentConfig;
use crate::error::{AgentError, AgentResult};
use crate::host::{JniHeap, JvmHost};
use crate::jvmti::JvmtiEnv;
use crate::logging;

/// JVMTI environment, set by the first successful load and kept for the
/// life of the process
static JVMTI: OnceLock<JvmtiEnv> = OnceLock::new();

/// Serializes queries and owns the process-wide tag counter
static COLLECTOR: InstanceCollector = InstanceCollector::new();

/// Shared body of `Agent_OnLoad`, `Agent_OnAttach` and `JNI_OnLoad`.
///
/// # Safety
/// `vm` must be the VM passed to the load hook; `options` must be null or a
/// NUL-terminated string.
pub unsafe fn on_load(vm: *mut JavaVM, options: *const c_char, entry: &'static str) -> jint {
    match unsafe { try_load(vm, options) } {
        Ok(()) => JNI_OK,
        Err(err) => {
            tracing::error!(target: "anchor::agent", entry, "agent initialization failed: {err}");
            JNI_ERR
        }
    }
}

unsafe fn try_load(vm: *mut JavaVM, options: *const c_char) -> AgentResult<()> {
    let config = unsafe { options_str(options) }.and_then(AgentConfig::parse);
    logging::init(config.as_ref().unwrap_or(&AgentConfig::default()));
    let config = config?;

    for key in &config.ignored {
        tracing::warn!(target: "anchor::agent", key = %key, "ignoring unknown agent option");
    }

    let host = unsafe { JvmHost::new(vm) };
    bootstrap(&host, &JVMTI)?;
    Ok(())
}

unsafe fn options_str<'a>(options: *const c_char) -> AgentResult<Option<&'a str>> {
    if options.is_null() {
        return Ok(None);
    }
    unsafe { CStr::from_ptr(options) }
        .to_str()
        .map(Some)
        .map_err(|err| AgentError::InvalidOptions(err.to_string()))
}

/// Find up to `limit` live instances of `klass` for the calling Java thread
///
/// # Safety
/// `env` must be the calling thread's `JNIEnv` and `klass` a live class
/// reference.
pub unsafe fn get_instances(
    env: *mut JNIEnv,
    klass: jclass,
    limit: jint,
) -> QueryResult<jobjectArray> {
    let Some(&jvmti) = JVMTI.get() else {
        tracing::error!(target: "anchor::agent", "instance query before agent initialization");
        return Err(QueryError::NotInitialized);
    };
    let heap = unsafe { JniHeap::new(jvmti, env) };
    COLLECTOR.find_instances(&heap, &klass, limit)
}
