//! The greeting returned to host applications.

use std::os::raw::c_char;
use std::ptr;

use crate::error::{catch_panic, cstring_from_str_lossy};

/// Text handed back across every native entry point.
pub const GREETING: &str = "Hello from C++";

static VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");

/// Returns the greeting. Identical on every call.
pub fn greeting() -> &'static str {
    GREETING
}

/// Returns a copy of the greeting for C callers.
///
/// The returned string is heap-allocated and must be freed with `jnilibs_string_free`.
/// Returns null only if native code panicked.
#[unsafe(no_mangle)]
pub extern "C" fn jnilibs_greeting() -> *mut c_char {
    let result = catch_panic(|| {
        log::trace!("greeting requested over C ABI");
        Ok(cstring_from_str_lossy(greeting()).into_raw())
    });
    match result {
        Ok(value) => value,
        Err(err) => {
            log::error!("jnilibs_greeting failed: {err}");
            ptr::null_mut()
        }
    }
}

/// Returns the library version. The pointer is static and must not be freed.
#[unsafe(no_mangle)]
pub extern "C" fn jnilibs_version() -> *const c_char {
    VERSION.as_ptr() as *const c_char
}
