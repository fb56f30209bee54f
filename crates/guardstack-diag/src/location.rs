//! Source-location tags for depth-0 entries.
//!
//! A location is built once per logical operation, either by the [`here!`]
//! macro at the call site or by [`SourceLocation::caller`] inside a
//! `#[track_caller]` entry point.
//!
//! [`here!`]: crate::here

use serde::Serialize;

/// File, function and line a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SourceLocation {
    pub file: &'static str,
    pub function: &'static str,
    pub line: u32,
}

impl SourceLocation {
    #[must_use]
    pub const fn new(file: &'static str, function: &'static str, line: u32) -> Self {
        Self {
            file,
            function,
            line,
        }
    }

    /// Location of the caller of the enclosing `#[track_caller]` function,
    /// labelled with the operation name.
    #[must_use]
    #[track_caller]
    pub fn caller(function: &'static str) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            file: loc.file(),
            function,
            line: loc.line(),
        }
    }

    /// Placeholder for entries that have no meaningful origin.
    #[must_use]
    pub const fn unknown() -> Self {
        Self::new("<unknown>", "<unknown>", 0)
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}():{}", self.file, self.function, self.line)
    }
}

/// Reduce a `type_name` path of a nested marker fn to the enclosing function name.
#[doc(hidden)]
#[must_use]
pub fn trim_function_path(path: &'static str) -> &'static str {
    let mut path = path.strip_suffix("::__here").unwrap_or(path);
    while let Some(stripped) = path.strip_suffix("::{{closure}}") {
        path = stripped;
    }
    match path.rfind("::") {
        Some(idx) => &path[idx + 2..],
        None => path,
    }
}

/// Build a [`SourceLocation`] for the current file, function and line.
#[macro_export]
macro_rules! here {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        $crate::SourceLocation::new(
            file!(),
            $crate::location::trim_function_path(__type_name_of(__here)),
            line!(),
        )
    }};
}
