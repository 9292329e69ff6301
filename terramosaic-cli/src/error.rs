//! CLI error handling with user-friendly messages.
//!
//! Wraps the library error types so `run` can use `?` throughout, and
//! centralizes how failures are printed and which exit code they carry.

use std::fmt;
use std::process;

use terramosaic::input::InputError;
use terramosaic::mosaic::MosaicError;
use terramosaic::raster::{RasterError, WriteError};

/// Anything that can stop a mosaic run from the command line.
#[derive(Debug)]
pub enum CliError {
    /// Failed to install the Ctrl+C handler
    Signal(String),
    /// An input token did not expand to usable paths
    Input(InputError),
    /// A source raster could not be opened
    Open(RasterError),
    /// The mosaic itself failed or was cancelled
    Mosaic(MosaicError),
    /// The destination could not be written
    Write(WriteError),
}

impl CliError {
    /// Exit the process with an error message and a nonzero code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // The wrapped error is what Display just printed, so the chain
        // starts one level below it.
        let mut cause = std::error::Error::source(self).and_then(|err| err.source());
        while let Some(err) = cause {
            eprintln!("  caused by: {}", err);
            cause = err.source();
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Signal(msg) => write!(f, "Failed to set signal handler: {}", msg),
            CliError::Input(e) => write!(f, "{}", e),
            CliError::Open(e) => write!(f, "{}", e),
            CliError::Mosaic(e) => write!(f, "{}", e),
            CliError::Write(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Signal(_) => None,
            CliError::Input(e) => Some(e),
            CliError::Open(e) => Some(e),
            CliError::Mosaic(e) => Some(e),
            CliError::Write(e) => Some(e),
        }
    }
}

impl From<InputError> for CliError {
    fn from(e: InputError) -> Self {
        CliError::Input(e)
    }
}

impl From<RasterError> for CliError {
    fn from(e: RasterError) -> Self {
        CliError::Open(e)
    }
}

impl From<MosaicError> for CliError {
    fn from(e: MosaicError) -> Self {
        CliError::Mosaic(e)
    }
}

impl From<WriteError> for CliError {
    fn from(e: WriteError) -> Self {
        CliError::Write(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_forwards_library_message() {
        let err = CliError::from(MosaicError::from(
            terramosaic::composite::CompositeError::Cancelled,
        ));
        assert_eq!(err.to_string(), "Mosaic run cancelled");
    }

    #[test]
    fn test_signal_error_has_context() {
        let err = CliError::Signal("already installed".to_string());
        assert_eq!(
            err.to_string(),
            "Failed to set signal handler: already installed"
        );
    }

    #[test]
    fn test_source_reaches_wrapped_error() {
        let err = CliError::from(MosaicError::from(
            terramosaic::composite::CompositeError::Cancelled,
        ));
        assert!(std::error::Error::source(&err).is_some());
    }
}
