//! Native entry points for the jniLibs example application.

mod error;
mod ffi;
mod greeting;
mod jni_bridge;
mod logging;

pub use error::{
    BridgeError, jnilibs_error_free, jnilibs_error_message, jnilibs_error_t, jnilibs_string_free,
};
pub use greeting::{GREETING, greeting, jnilibs_greeting, jnilibs_version};
pub use jni_bridge::{JNI_OnLoad, Java_es_1compression_example_jniLibs_MainActivity_stringFromJNI};
pub use logging::{
    init_default as init_logging, jnilibs_log_callback_t, jnilibs_log_config_init,
    jnilibs_log_config_t, jnilibs_log_init, jnilibs_log_level_t, jnilibs_log_record_t,
};
