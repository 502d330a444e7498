//! JNI entry points loaded by `es_compression.example.jniLibs.MainActivity`.

use std::os::raw::c_void;
use std::ptr;

use jni::objects::JObject;
use jni::sys::{JNI_ERR, JNI_VERSION_1_6, jint, jstring};
use jni::{JNIEnv, JNIVersion, JavaVM};

use crate::error::{BridgeError, catch_panic};
use crate::greeting::greeting;
use crate::logging;

const RUNTIME_EXCEPTION: &str = "java/lang/RuntimeException";

fn new_greeting(env: &mut JNIEnv) -> Result<jstring, BridgeError> {
    let value = env.new_string(greeting())?;
    Ok(value.into_raw())
}

fn raise(env: &mut JNIEnv, err: &BridgeError) {
    log::error!("stringFromJNI failed: {err}");
    // NewStringUTF leaves OutOfMemoryError pending on allocation failure.
    if env.exception_check().unwrap_or(true) {
        return;
    }
    if let Err(throw_err) = env.throw_new(RUNTIME_EXCEPTION, err.to_string()) {
        log::error!("failed to throw {RUNTIME_EXCEPTION}: {throw_err}");
    }
}

/// `MainActivity.stringFromJNI()`: returns the greeting as a Java string.
///
/// Returns null with a pending Java exception if the string cannot be created.
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub extern "system" fn Java_es_1compression_example_jniLibs_MainActivity_stringFromJNI<'local>(
    mut env: JNIEnv<'local>,
    _this: JObject<'local>,
) -> jstring {
    log::trace!("stringFromJNI called");
    let result = catch_panic(|| new_greeting(&mut env));

    match result {
        Ok(value) => value,
        Err(err) => {
            raise(&mut env, &err);
            ptr::null_mut()
        }
    }
}

/// Formats a JNI version as the raw `0xMMMMmmmm` value the VM reported.
///
/// Newer VMs report versions `JNIVersion` has no name for and show up as `Invalid`.
fn version_string(version: JNIVersion) -> String {
    format!("{:#010x}", jint::from(version))
}

/// Called by the VM when the library is loaded.
#[allow(non_snake_case)]
#[unsafe(no_mangle)]
pub extern "system" fn JNI_OnLoad(vm: JavaVM, _reserved: *mut c_void) -> jint {
    let result = catch_panic(|| {
        if let Err(err) = logging::init_default() {
            // The host may have installed its own logger; keep going.
            log::debug!("keeping existing logger: {err}");
        }
        match vm.get_env().and_then(|env| env.get_version()) {
            Ok(version) => {
                log::info!("jnilibs loaded (VM reports JNI {})", version_string(version))
            }
            Err(err) => log::warn!("jnilibs loaded but JNI version is unavailable: {err}"),
        }
        Ok(())
    });

    match result {
        Ok(()) => JNI_VERSION_1_6,
        Err(_) => JNI_ERR,
    }
}
