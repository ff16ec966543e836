// Operator-facing console output. These go to stdout regardless of the
// tracing filter; `Console` decides whether each kind is enabled.

// Progress and parameter lines, printed with `-v`.
macro_rules! verbose {
    ($console:expr, $($arg:tt)*) => {{
        let console: &$crate::report::Console = &$console;
        if console.verbose {
            console.write(format_args!($($arg)*));
        }
    }};
}

// Per-job marks, printed with `-D`.
macro_rules! debug_mark {
    ($console:expr, $mark:tt) => {{
        let console: &$crate::report::Console = &$console;
        if console.debug {
            console.write(format_args!($mark));
        }
    }};
}
