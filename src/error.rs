use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// The clock was observed with a duration that is not a strictly positive number of milliseconds.
    #[error("invalid duration: {duration}ms, expected a strictly positive number of milliseconds")]
    InvalidDuration { duration: f64 },
}
