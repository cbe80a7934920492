//! Logging macros.
//!
//! With the `logging` feature these forward to the `log` crate. Without it
//! they expand to nothing, but the arguments are still type-checked.

#[cfg(feature = "logging")]
#[macro_export]
macro_rules! trace_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! trace_debug {
    ($($arg:tt)*) => {{
        if false {
            let _ = format_args!($($arg)*);
        }
    }};
}

#[cfg(feature = "logging")]
#[macro_export]
macro_rules! trace_info {
    ($($arg:tt)*) => { log::info!($($arg)*) };
}

#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! trace_info {
    ($($arg:tt)*) => {{
        if false {
            let _ = format_args!($($arg)*);
        }
    }};
}

#[cfg(feature = "logging")]
#[macro_export]
macro_rules! trace_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "logging"))]
#[macro_export]
macro_rules! trace_warn {
    ($($arg:tt)*) => {{
        if false {
            let _ = format_args!($($arg)*);
        }
    }};
}
