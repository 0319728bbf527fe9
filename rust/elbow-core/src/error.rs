// SPDX-License-Identifier: Apache-2.0
// SPDX-FileCopyrightText: Copyright The Elbow Authors

use arrow_schema::ArrowError;
use snafu::{location, Location, Snafu};

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Allocates error on the heap and then places `e` into it.
#[inline]
pub fn box_error(e: impl std::error::Error + Send + Sync + 'static) -> BoxedError {
    Box::new(e)
}

/// Elbow's generic error.
///
/// Configuration and data problems are reported before any clustering runs.
/// Cancellation is its own variant so callers can tell a user abort apart
/// from a failure.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("Invalid configuration: {message}, {location}"))]
    InvalidConfig { message: String, location: Location },
    #[snafu(display("Invalid user input: {message}, {location}"))]
    InvalidInput { message: String, location: Location },
    #[snafu(display("No data to cluster: {message}, {location}"))]
    EmptyData { message: String, location: Location },
    /// The run was cancelled by the caller.
    #[snafu(display("Evaluation cancelled"))]
    Cancelled,
    #[snafu(display("ElbowError(Arrow): {message}, {location}"))]
    Arrow { message: String, location: Location },
    #[snafu(display("ElbowError(IO): {source}, {location}"))]
    IO {
        source: BoxedError,
        location: Location,
    },
    #[snafu(display("Encountered internal error. Please file a bug report. {message}, {location}"))]
    Internal { message: String, location: Location },
}

impl Error {
    pub fn invalid_config(message: impl Into<String>, location: Location) -> Self {
        Self::InvalidConfig {
            message: message.into(),
            location,
        }
    }

    pub fn invalid_input(message: impl Into<String>, location: Location) -> Self {
        Self::InvalidInput {
            message: message.into(),
            location,
        }
    }

    pub fn empty_data(message: impl Into<String>, location: Location) -> Self {
        Self::EmptyData {
            message: message.into(),
            location,
        }
    }

    pub fn internal(message: impl Into<String>, location: Location) -> Self {
        Self::Internal {
            message: message.into(),
            location,
        }
    }

    /// Returns true if this error comes from a cooperative cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<ArrowError> for Error {
    #[track_caller]
    fn from(e: ArrowError) -> Self {
        match e {
            ArrowError::ExternalError(err) => match err.downcast::<Self>() {
                Ok(err) => *err,
                Err(err) => Self::Arrow {
                    message: err.to_string(),
                    location: location!(),
                },
            },
            e => Self::Arrow {
                message: e.to_string(),
                location: location!(),
            },
        }
    }
}

impl From<std::io::Error> for Error {
    #[track_caller]
    fn from(e: std::io::Error) -> Self {
        Self::IO {
            source: box_error(e),
            location: location!(),
        }
    }
}

impl From<serde_json::Error> for Error {
    #[track_caller]
    fn from(e: serde_json::Error) -> Self {
        use serde_json::error::Category;
        match e.classify() {
            Category::Io => Self::IO {
                source: box_error(e),
                location: location!(),
            },
            Category::Data | Category::Syntax | Category::Eof => Self::InvalidConfig {
                message: format!("cannot parse settings: {e}"),
                location: location!(),
            },
        }
    }
}

impl From<Error> for ArrowError {
    fn from(value: Error) -> Self {
        match value {
            Error::Arrow { message, .. } => Self::ComputeError(message),
            Error::InvalidConfig { .. } | Error::InvalidInput { .. } => {
                Self::InvalidArgumentError(value.to_string())
            }
            e => Self::ExternalError(Box::new(e)),
        }
    }
}
