//! Debugging helpers.
//!
//! Debug prints are compiled in only with the `debug_prints` feature, and are written to stderr
//! only if the `YAMLET_DEBUG` environment variable is set.

#[cfg(feature = "debug_prints")]
use std::sync::OnceLock;

/// Print a debug message to stderr, if debugging is enabled.
#[cfg(feature = "debug_prints")]
macro_rules! debug_print {
    ($($arg:tt)*) => {{
        if $crate::debug::enabled() {
            eprintln!($($arg)*);
        }
    }};
}

/// Print a debug message to stderr, if debugging is enabled.
#[cfg(not(feature = "debug_prints"))]
macro_rules! debug_print {
    ($($arg:tt)*) => {{}};
}

/// Return whether debug prints should be written.
#[cfg(feature = "debug_prints")]
pub(crate) fn enabled() -> bool {
    static ENABLED: OnceLock<bool> = OnceLock::new();
    *ENABLED.get_or_init(|| std::env::var("YAMLET_DEBUG").is_ok())
}
