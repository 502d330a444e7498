//! Logging for jnilibs, built on the `log` facade.

use std::os::raw::{c_char, c_void};
use std::ptr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Once, RwLock};

use log::{Level, LevelFilter, Log, Metadata, Record};
use once_cell::sync::Lazy;

use crate::error::{
    BridgeError, catch_panic, clear_error, cstring_from_str_lossy, jnilibs_error_t, write_error,
};
use crate::ffi::read_optional_cstr;

const LOG_TARGET: &str = "jnilibs";

const LOGGER_STATE_UNINIT: u8 = 0;
const LOGGER_STATE_READY: u8 = 1;
const LOGGER_STATE_FAILED: u8 = 2;

static LOGGER_STATE: AtomicU8 = AtomicU8::new(LOGGER_STATE_UNINIT);
static LOGGER_INIT: Once = Once::new();
static LOGGER: Lazy<BridgeLogger> = Lazy::new(BridgeLogger::new);

/// Log level values for jnilibs logging.
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(C)]
pub enum jnilibs_log_level_t {
    JNILIBS_LOG_LEVEL_OFF = 0,
    JNILIBS_LOG_LEVEL_ERROR = 1,
    JNILIBS_LOG_LEVEL_WARN = 2,
    JNILIBS_LOG_LEVEL_INFO = 3,
    JNILIBS_LOG_LEVEL_DEBUG = 4,
    JNILIBS_LOG_LEVEL_TRACE = 5,
}

impl From<jnilibs_log_level_t> for LevelFilter {
    fn from(value: jnilibs_log_level_t) -> Self {
        match value {
            jnilibs_log_level_t::JNILIBS_LOG_LEVEL_OFF => LevelFilter::Off,
            jnilibs_log_level_t::JNILIBS_LOG_LEVEL_ERROR => LevelFilter::Error,
            jnilibs_log_level_t::JNILIBS_LOG_LEVEL_WARN => LevelFilter::Warn,
            jnilibs_log_level_t::JNILIBS_LOG_LEVEL_INFO => LevelFilter::Info,
            jnilibs_log_level_t::JNILIBS_LOG_LEVEL_DEBUG => LevelFilter::Debug,
            jnilibs_log_level_t::JNILIBS_LOG_LEVEL_TRACE => LevelFilter::Trace,
        }
    }
}

impl From<Level> for jnilibs_log_level_t {
    fn from(value: Level) -> Self {
        match value {
            Level::Error => jnilibs_log_level_t::JNILIBS_LOG_LEVEL_ERROR,
            Level::Warn => jnilibs_log_level_t::JNILIBS_LOG_LEVEL_WARN,
            Level::Info => jnilibs_log_level_t::JNILIBS_LOG_LEVEL_INFO,
            Level::Debug => jnilibs_log_level_t::JNILIBS_LOG_LEVEL_DEBUG,
            Level::Trace => jnilibs_log_level_t::JNILIBS_LOG_LEVEL_TRACE,
        }
    }
}

/// Log record delivered to a C callback.
///
/// String pointers are only valid for the duration of the callback.
/// `module_path` and `file` may be null. `line` is 0 when unknown.
#[allow(non_camel_case_types)]
#[repr(C)]
pub struct jnilibs_log_record_t {
    pub level: jnilibs_log_level_t,
    pub target: *const c_char,
    pub message: *const c_char,
    pub module_path: *const c_char,
    pub file: *const c_char,
    pub line: u32,
}

/// Callback invoked for each log record, from whichever thread emitted it.
#[allow(non_camel_case_types)]
pub type jnilibs_log_callback_t =
    Option<extern "C" fn(record: *const jnilibs_log_record_t, user_data: *mut c_void)>;

/// Configuration for `jnilibs_log_init`.
///
/// A non-null `filter` is a `RUST_LOG`-style string and overrides both `RUST_LOG` and
/// `level`. Without a filter, `RUST_LOG` is used when set, otherwise `level` applies to
/// the jnilibs target. With no `callback`, records go to logcat on Android and stderr
/// elsewhere.
#[allow(non_camel_case_types)]
#[repr(C)]
pub struct jnilibs_log_config_t {
    pub level: jnilibs_log_level_t,
    pub filter: *const c_char,
    pub callback: jnilibs_log_callback_t,
    pub user_data: *mut c_void,
}

#[derive(Clone, Debug, PartialEq)]
struct Directive {
    target: String,
    level: LevelFilter,
}

#[derive(Clone, Debug, PartialEq)]
struct LogFilter {
    default: LevelFilter,
    directives: Vec<Directive>,
}

impl LogFilter {
    fn for_level(level: LevelFilter) -> Self {
        Self {
            default: LevelFilter::Off,
            directives: vec![Directive {
                target: LOG_TARGET.to_string(),
                level,
            }],
        }
    }

    fn parse(spec: &str) -> Result<Self, String> {
        let mut default = LevelFilter::Off;
        let mut directives = Vec::new();

        for (index, raw) in spec.split(',').enumerate() {
            let directive = raw.trim();
            if directive.is_empty() {
                continue;
            }
            match directive.split_once('=') {
                Some((target, level)) => {
                    let (target, level) = (target.trim(), level.trim());
                    if target.is_empty() {
                        return Err(format!("empty log target at position {index}"));
                    }
                    if level.is_empty() {
                        return Err(format!("missing log level for target `{target}`"));
                    }
                    let level =
                        parse_level(level).ok_or_else(|| format!("invalid level `{level}`"))?;
                    directives.push(Directive {
                        target: target.to_string(),
                        level,
                    });
                }
                None => match parse_level(directive) {
                    Some(level) => default = level,
                    None => directives.push(Directive {
                        target: directive.to_string(),
                        level: LevelFilter::Trace,
                    }),
                },
            }
        }

        Ok(Self { default, directives })
    }

    fn level_for(&self, target: &str) -> LevelFilter {
        self.directives
            .iter()
            .filter(|directive| target.starts_with(&directive.target))
            .max_by_key(|directive| directive.target.len())
            .map_or(self.default, |directive| directive.level)
    }

    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level_for(metadata.target())
    }

    fn max_level(&self) -> LevelFilter {
        self.directives
            .iter()
            .map(|directive| directive.level)
            .fold(self.default, Ord::max)
    }
}

fn parse_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" => Some(LevelFilter::Off),
        "error" => Some(LevelFilter::Error),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

struct SinkConfig {
    filter: LogFilter,
    callback: jnilibs_log_callback_t,
    user_data: usize,
}

struct BridgeLogger {
    config: RwLock<SinkConfig>,
}

impl BridgeLogger {
    fn new() -> Self {
        Self {
            config: RwLock::new(SinkConfig {
                filter: LogFilter::for_level(LevelFilter::Info),
                callback: None,
                user_data: 0,
            }),
        }
    }

    fn update(&self, config: SinkConfig) {
        let mut guard = self.config.write().unwrap_or_else(|err| err.into_inner());
        *guard = config;
    }

    fn with_config<T>(&self, f: impl FnOnce(&SinkConfig) -> T) -> T {
        let guard = self.config.read().unwrap_or_else(|err| err.into_inner());
        f(&guard)
    }
}

impl Log for BridgeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.with_config(|config| config.filter.enabled(metadata))
    }

    fn log(&self, record: &Record) {
        let (enabled, callback, user_data) = self.with_config(|config| {
            (
                config.filter.enabled(record.metadata()),
                config.callback,
                config.user_data,
            )
        });
        if !enabled {
            return;
        }

        match callback {
            Some(callback) => deliver(callback, user_data as *mut c_void, record),
            None => platform::write(record),
        }
    }

    fn flush(&self) {}
}

fn deliver(
    callback: extern "C" fn(*const jnilibs_log_record_t, *mut c_void),
    user_data: *mut c_void,
    record: &Record,
) {
    let target = cstring_from_str_lossy(record.target());
    let message = cstring_from_str_lossy(&record.args().to_string());
    let module_path = record.module_path().map(cstring_from_str_lossy);
    let file = record.file().map(cstring_from_str_lossy);
    let record = jnilibs_log_record_t {
        level: record.level().into(),
        target: target.as_ptr(),
        message: message.as_ptr(),
        module_path: module_path.as_ref().map_or(ptr::null(), |value| value.as_ptr()),
        file: file.as_ref().map_or(ptr::null(), |value| value.as_ptr()),
        line: record.line().unwrap_or(0),
    };
    callback(&record, user_data);
}

#[cfg(target_os = "android")]
mod platform {
    use std::os::raw::{c_char, c_int};

    use log::{Level, Record};

    use crate::error::cstring_from_str_lossy;

    const ANDROID_LOG_VERBOSE: c_int = 2;
    const ANDROID_LOG_DEBUG: c_int = 3;
    const ANDROID_LOG_INFO: c_int = 4;
    const ANDROID_LOG_WARN: c_int = 5;
    const ANDROID_LOG_ERROR: c_int = 6;

    #[link(name = "log")]
    unsafe extern "C" {
        fn __android_log_write(prio: c_int, tag: *const c_char, text: *const c_char) -> c_int;
    }

    pub(super) fn write(record: &Record) {
        let priority = match record.level() {
            Level::Error => ANDROID_LOG_ERROR,
            Level::Warn => ANDROID_LOG_WARN,
            Level::Info => ANDROID_LOG_INFO,
            Level::Debug => ANDROID_LOG_DEBUG,
            Level::Trace => ANDROID_LOG_VERBOSE,
        };
        let tag = cstring_from_str_lossy(super::LOG_TARGET);
        let text = cstring_from_str_lossy(&format!("{}: {}", record.target(), record.args()));
        // Safety: both pointers are valid NUL-terminated strings for the call.
        unsafe {
            __android_log_write(priority, tag.as_ptr(), text.as_ptr());
        }
    }
}

#[cfg(not(target_os = "android"))]
mod platform {
    use log::Record;

    pub(super) fn write(record: &Record) {
        eprintln!("{} {}: {}", record.level(), record.target(), record.args());
    }
}

fn resolve_filter(config: Option<&jnilibs_log_config_t>) -> Result<LogFilter, String> {
    if let Some(filter) = config.and_then(|config| read_optional_cstr(config.filter)) {
        return LogFilter::parse(&filter)
            .map_err(|err| format!("invalid log filter `{filter}`: {err}"));
    }

    if let Ok(filter) = std::env::var("RUST_LOG") {
        return LogFilter::parse(&filter)
            .map_err(|err| format!("invalid RUST_LOG value `{filter}`: {err}"));
    }

    let level = config.map_or(jnilibs_log_level_t::JNILIBS_LOG_LEVEL_INFO, |config| {
        config.level
    });
    Ok(LogFilter::for_level(level.into()))
}

fn ensure_logger() -> Result<(), BridgeError> {
    LOGGER_INIT.call_once(|| {
        let state = if log::set_logger(&*LOGGER).is_ok() {
            LOGGER_STATE_READY
        } else {
            LOGGER_STATE_FAILED
        };
        LOGGER_STATE.store(state, Ordering::SeqCst);
    });

    match LOGGER_STATE.load(Ordering::SeqCst) {
        LOGGER_STATE_READY => Ok(()),
        LOGGER_STATE_FAILED => Err(BridgeError::Logging(
            "logging already initialized by another logger".to_string(),
        )),
        _ => Err(BridgeError::Logging(
            "logging failed to initialize".to_string(),
        )),
    }
}

fn apply(config: Option<&jnilibs_log_config_t>) -> Result<(), BridgeError> {
    let filter = resolve_filter(config).map_err(BridgeError::Logging)?;
    ensure_logger()?;

    let max_level = filter.max_level();
    LOGGER.update(SinkConfig {
        filter,
        callback: config.and_then(|config| config.callback),
        user_data: config.map_or(0, |config| config.user_data as usize),
    });
    log::set_max_level(max_level);
    Ok(())
}

/// Installs the jnilibs logger with default settings (`RUST_LOG`, else INFO).
pub fn init_default() -> Result<(), BridgeError> {
    apply(None)
}

/// Fills `config` with defaults: INFO for jnilibs, no filter, no callback.
#[unsafe(no_mangle)]
pub extern "C" fn jnilibs_log_config_init(config: *mut jnilibs_log_config_t) {
    if config.is_null() {
        return;
    }
    // Safety: caller provided a writable config pointer.
    unsafe {
        config.write(jnilibs_log_config_t {
            level: jnilibs_log_level_t::JNILIBS_LOG_LEVEL_INFO,
            filter: ptr::null(),
            callback: None,
            user_data: ptr::null_mut(),
        });
    }
}

/// Initializes logging. A null `config` selects defaults.
///
/// May be called again later to change the configuration.
#[unsafe(no_mangle)]
pub extern "C" fn jnilibs_log_init(
    config: *const jnilibs_log_config_t,
    out_error: *mut *mut jnilibs_error_t,
) -> bool {
    clear_error(out_error);
    // Safety: config is either null or points to a valid jnilibs_log_config_t.
    let config = unsafe { config.as_ref() };
    match catch_panic(|| apply(config)) {
        Ok(()) => true,
        Err(err) => {
            write_error(out_error, err);
            false
        }
    }
}
