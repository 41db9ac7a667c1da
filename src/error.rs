//! Crate-level error types.

use std::fmt;

/// Errors produced by the segue crate.
///
/// Choreography itself never fails outward: a broken element or a stalled
/// notification degrades to "show the final state". These errors cover the
/// edges where something genuinely has to be reported, such as option
/// presets on disk and host construction.
#[derive(Debug)]
pub enum SegueError {
    /// Generic I/O failure.
    Io(std::io::Error),
    /// TOML options parsing/serialization failure.
    OptionsParse(String),
    /// The UI host could not be set up (no window, no document, ...).
    Host(String),
}

impl fmt::Display for SegueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            Self::OptionsParse(msg) => {
                write!(f, "options parse error: {msg}")
            }
            Self::Host(msg) => write!(f, "host error: {msg}"),
        }
    }
}

impl std::error::Error for SegueError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SegueError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::*;

    #[test]
    fn display_includes_context() {
        let err = SegueError::OptionsParse("expected table".to_owned());
        assert_eq!(err.to_string(), "options parse error: expected table");

        let err = SegueError::Host("no window".to_owned());
        assert_eq!(err.to_string(), "host error: no window");
    }

    #[test]
    fn io_errors_expose_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = SegueError::from(io);
        assert!(err.source().is_some());
        assert!(SegueError::Host("x".to_owned()).source().is_none());
    }
}
