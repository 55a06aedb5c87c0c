//! Formatting macros over the [`Sink`](crate::Sink) write methods.
//!
//! ```no_run
//! # let sink = rotalog_core::Sink::new();
//! rotalog_core::warn!(sink, "disk at {}%", 91);
//! ```

/// Log at `Debug`.
#[macro_export]
macro_rules! debug {
    ($sink:expr, $($arg:tt)+) => {
        $sink.debug(::std::format_args!($($arg)+))
    };
}

/// Log at `Info`.
#[macro_export]
macro_rules! info {
    ($sink:expr, $($arg:tt)+) => {
        $sink.info(::std::format_args!($($arg)+))
    };
}

/// Log at `Warn`.
#[macro_export]
macro_rules! warn {
    ($sink:expr, $($arg:tt)+) => {
        $sink.warn(::std::format_args!($($arg)+))
    };
}

/// Log at `Error`.
#[macro_export]
macro_rules! error {
    ($sink:expr, $($arg:tt)+) => {
        $sink.error(::std::format_args!($($arg)+))
    };
}

/// Log at `Fatal`. The process keeps running.
#[macro_export]
macro_rules! fatal {
    ($sink:expr, $($arg:tt)+) => {
        $sink.fatal(::std::format_args!($($arg)+))
    };
}

/// Write a `console` line while console mirroring is on.
#[macro_export]
macro_rules! console {
    ($sink:expr, $($arg:tt)+) => {
        $sink.console(::std::format_args!($($arg)+))
    };
}

/// Log at an explicit level.
#[macro_export]
macro_rules! log {
    ($sink:expr, $level:expr, $($arg:tt)+) => {
        $sink.log($level, ::std::format_args!($($arg)+))
    };
}
