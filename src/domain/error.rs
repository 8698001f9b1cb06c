// Errors raised while turning raw observations into aligned chart data
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AlignError {
    #[error("malformed timestamp in field '{field}': {value}")]
    MalformedTimestamp { field: String, value: String },

    #[error("timestamps out of order: {current} follows {previous}")]
    NonMonotonicTimestamps { previous: i64, current: i64 },

    #[error("device '{0}' is not in the expected device list")]
    UnknownDevice(String),

    #[error("required field '{0}' is missing")]
    MissingField(String),
}
