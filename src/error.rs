use std::ffi::CString;
use std::os::raw::c_char;
use std::panic::AssertUnwindSafe;
use std::ptr;

use thiserror::Error;

/// Failures raised on the Rust side of the native boundary.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("JNI call failed: {0}")]
    Jni(#[from] jni::errors::Error),
    #[error("panic in native code: {0}")]
    Panic(String),
    #[error("{0}")]
    Logging(String),
}

impl BridgeError {
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(message) = payload.downcast_ref::<&str>() {
            (*message).to_string()
        } else if let Some(message) = payload.downcast_ref::<String>() {
            message.clone()
        } else {
            "unknown panic payload".to_string()
        };
        BridgeError::Panic(message)
    }
}

/// Runs `f`, turning a panic into `BridgeError::Panic` so it never crosses the boundary.
pub(crate) fn catch_panic<T>(
    f: impl FnOnce() -> Result<T, BridgeError>,
) -> Result<T, BridgeError> {
    std::panic::catch_unwind(AssertUnwindSafe(f))
        .unwrap_or_else(|payload| Err(BridgeError::from_panic(payload)))
}

/// Opaque error type for C callers.
#[allow(non_camel_case_types)]
#[repr(C)]
pub struct jnilibs_error_t;

struct ErrorHandle {
    message: CString,
}

pub(crate) fn cstring_from_str_lossy(value: &str) -> CString {
    match CString::new(value) {
        Ok(value) => value,
        Err(err) => {
            let sanitized: Vec<u8> = err
                .into_vec()
                .into_iter()
                .map(|byte| if byte == 0 { b' ' } else { byte })
                .collect();
            // Every NUL byte was replaced above.
            CString::new(sanitized).unwrap_or_default()
        }
    }
}

pub(crate) fn clear_error(out_error: *mut *mut jnilibs_error_t) {
    if !out_error.is_null() {
        // Safety: caller provided a valid out_error pointer.
        unsafe {
            *out_error = ptr::null_mut();
        }
    }
}

pub(crate) fn write_error(out_error: *mut *mut jnilibs_error_t, message: impl ToString) {
    if out_error.is_null() {
        return;
    }
    let handle = Box::new(ErrorHandle {
        message: cstring_from_str_lossy(&message.to_string()),
    });
    // Safety: out_error is non-null and points to writable memory.
    unsafe {
        *out_error = Box::into_raw(handle) as *mut jnilibs_error_t;
    }
}

/// Returns the message for an error allocated by jnilibs.
///
/// The returned pointer is valid as long as the error handle is alive.
#[unsafe(no_mangle)]
pub extern "C" fn jnilibs_error_message(error: *const jnilibs_error_t) -> *const c_char {
    if error.is_null() {
        return ptr::null();
    }
    // Safety: error must be a valid handle allocated by jnilibs.
    let handle = unsafe { &*(error as *const ErrorHandle) };
    handle.message.as_ptr()
}

/// Frees an error returned by jnilibs.
#[unsafe(no_mangle)]
pub extern "C" fn jnilibs_error_free(error: *mut jnilibs_error_t) {
    if error.is_null() {
        return;
    }
    // Safety: error must be a valid handle allocated by jnilibs.
    unsafe {
        drop(Box::from_raw(error as *mut ErrorHandle));
    }
}

/// Frees a string allocated by jnilibs.
#[unsafe(no_mangle)]
pub extern "C" fn jnilibs_string_free(value: *mut c_char) {
    if value.is_null() {
        return;
    }
    // Safety: value must come from a jnilibs API documented as heap-allocated.
    unsafe {
        drop(CString::from_raw(value));
    }
}

#[cfg(test)]
mod tests {
    use std::ffi::CStr;

    use super::*;

    #[test]
    fn lossy_cstring_replaces_interior_nul() {
        let value = cstring_from_str_lossy("a\0b");
        assert_eq!(value.to_str().unwrap(), "a b");
    }

    #[test]
    fn error_handle_carries_message() {
        let mut error: *mut jnilibs_error_t = ptr::null_mut();
        write_error(&mut error, "boom");
        assert!(!error.is_null());

        let message = unsafe { CStr::from_ptr(jnilibs_error_message(error)) };
        assert_eq!(message.to_str().unwrap(), "boom");

        jnilibs_error_free(error);
        clear_error(&mut error);
        assert!(error.is_null());
    }

    #[test]
    fn null_handles_are_ignored() {
        write_error(ptr::null_mut(), "ignored");
        clear_error(ptr::null_mut());
        assert!(jnilibs_error_message(ptr::null()).is_null());
        jnilibs_error_free(ptr::null_mut());
        jnilibs_string_free(ptr::null_mut());
    }

    #[test]
    fn panic_payloads_become_messages() {
        let err = std::panic::catch_unwind(|| panic!("static message")).unwrap_err();
        assert_eq!(
            BridgeError::from_panic(err).to_string(),
            "panic in native code: static message"
        );

        let err = std::panic::catch_unwind(|| panic!("formatted {}", 7)).unwrap_err();
        assert_eq!(
            BridgeError::from_panic(err).to_string(),
            "panic in native code: formatted 7"
        );
    }

    #[test]
    fn catch_panic_contains_unwinding() {
        let result: Result<(), _> = catch_panic(|| panic!("inside entry point"));
        assert!(matches!(
            result,
            Err(BridgeError::Panic(message)) if message == "inside entry point"
        ));

        assert_eq!(catch_panic(|| Ok(5)).unwrap(), 5);
        let err =
            catch_panic::<()>(|| Err(BridgeError::Logging("bad".to_string()))).unwrap_err();
        assert_eq!(err.to_string(), "bad");
    }
}
