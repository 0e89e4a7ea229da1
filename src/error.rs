use thiserror::Error;

/// Errors raised while configuring, training or querying a classifier
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Invalid configuration value or training request
    #[error("{0}")]
    InvalidInput(String),
    /// A label was not part of the vocabulary built at training time
    #[error("encoding error: {0}")]
    Encoding(String),
    /// An operation was attempted on data in the wrong state
    #[error("invalid state: {0}")]
    InvalidState(String),
    /// A score, objective value or gradient component was NaN or infinite
    #[error("numerical error: {0}")]
    Numerical(String),
    /// The minimizer failed without leaving a usable point
    #[error("minimizer error: {0}")]
    Minimizer(String),
}

impl Error {
    pub(crate) fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Error::InvalidInput(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
