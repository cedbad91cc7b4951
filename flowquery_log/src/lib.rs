//! Levelled, coloured logging to stderr for the Flowquery front end.
//!
//! Every macro takes `format!`-style arguments. Debug builds prefix each
//! line with the location of the call site.

pub use colored::Colorize;

/// Internal macro used to deduplicate logic.
/// This is an implementation detail and may disappear at any time.
/// It is public because `macro_rules!` macros can't otherwise be
/// shared between the level macros below.
#[cfg(debug_assertions)]
#[doc(hidden)]
#[macro_export]
macro_rules! log {
    (($name:ident, $colour:ident) => $($arg:tt)+) => {{
        use $crate::Colorize as _;

        eprintln!(
            "{} {} {}",
            concat!("[", stringify!($name), "]").$colour(),
            concat!(file!(), ":", line!(), ":").yellow(),
            format_args!($($arg)+)
        );
    }};
}

#[cfg(not(debug_assertions))]
#[doc(hidden)]
#[macro_export]
macro_rules! log {
    (($name:ident, $colour:ident) => $($arg:tt)+) => {{
        use $crate::Colorize as _;

        eprintln!(
            "{} {}",
            concat!("[", stringify!($name), "]").$colour(),
            format_args!($($arg)+)
        );
    }};
}

/// For verbose output tracking the progress of a compilation.
#[macro_export]
macro_rules! trace {
    ($($input:tt)*) => {
        $crate::log!((trace, purple) => $($input)*)
    };
}

/// For additional information that might be helpful for debugging.
/// Compiled out of release builds.
#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug {
    ($($input:tt)*) => {
        $crate::log!((debug, cyan) => $($input)*)
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug {
    ($($input:tt)*) => {{}};
}

/// Information that may be useful to the user.
#[macro_export]
macro_rules! info {
    ($($input:tt)*) => {
        $crate::log!((info, blue) => $($input)*)
    };
}

/// An alert that something may have gone wrong.
#[macro_export]
macro_rules! warning {
    ($($input:tt)*) => {
        $crate::log!((warning, bright_yellow) => $($input)*)
    };
}

/// An alert that something has gone horribly wrong.
#[macro_export]
macro_rules! error {
    ($($input:tt)*) => {
        $crate::log!((error, bright_red) => $($input)*)
    };
}
