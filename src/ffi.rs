//! Shared utilities for reading C inputs.

use std::ffi::CStr;
use std::os::raw::c_char;

pub(crate) fn read_optional_cstr(value: *const c_char) -> Option<String> {
    if value.is_null() {
        return None;
    }
    // Safety: caller guarantees a valid, NUL-terminated C string.
    let cstr = unsafe { CStr::from_ptr(value) };
    Some(cstr.to_string_lossy().into_owned())
}
