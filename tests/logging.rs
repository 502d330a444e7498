use std::ffi::CStr;
use std::os::raw::c_void;
use std::ptr;
use std::sync::Mutex;

use jnilibs::{
    jnilibs_error_free, jnilibs_error_message, jnilibs_error_t, jnilibs_greeting,
    jnilibs_log_config_init, jnilibs_log_config_t, jnilibs_log_init, jnilibs_log_level_t,
    jnilibs_log_record_t, jnilibs_string_free,
};

static RECORDS: Mutex<Vec<(jnilibs_log_level_t, String, String)>> = Mutex::new(Vec::new());

extern "C" fn capture(record: *const jnilibs_log_record_t, _user_data: *mut c_void) {
    let record = unsafe { &*record };
    let target = unsafe { CStr::from_ptr(record.target) }.to_string_lossy().into_owned();
    let message = unsafe { CStr::from_ptr(record.message) }.to_string_lossy().into_owned();
    RECORDS.lock().unwrap().push((record.level, target, message));
}

fn default_config() -> jnilibs_log_config_t {
    let mut config = jnilibs_log_config_t {
        level: jnilibs_log_level_t::JNILIBS_LOG_LEVEL_OFF,
        filter: ptr::null(),
        callback: None,
        user_data: ptr::null_mut(),
    };
    jnilibs_log_config_init(&mut config);
    config
}

// Single test: the logger is process-wide.
#[test]
fn log_init_configures_callback_and_rejects_bad_filters() {
    let mut error: *mut jnilibs_error_t = ptr::null_mut();

    let mut config = default_config();
    config.filter = c"jnilibs=sometimes".as_ptr();
    assert!(!jnilibs_log_init(&config, &mut error));
    assert!(!error.is_null());
    let message = unsafe { CStr::from_ptr(jnilibs_error_message(error)) }
        .to_string_lossy()
        .into_owned();
    assert!(message.contains("invalid level `sometimes`"), "{message}");
    jnilibs_error_free(error);

    let mut config = default_config();
    config.filter = c"jnilibs=trace".as_ptr();
    config.callback = Some(capture);
    assert!(jnilibs_log_init(&config, &mut error));
    assert!(error.is_null());

    let value = jnilibs_greeting();
    jnilibs_string_free(value);

    let records = RECORDS.lock().unwrap();
    assert!(records.iter().any(|(level, target, message)| {
        *level == jnilibs_log_level_t::JNILIBS_LOG_LEVEL_TRACE
            && target == "jnilibs::greeting"
            && message == "greeting requested over C ABI"
    }));
}
