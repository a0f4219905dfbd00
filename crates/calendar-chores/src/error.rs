//! Error type shared by the calendar client, the chore store and the daemon.
//!
//! Every variant maps to one collaborator so a failed tick can be told apart
//! in the logs, even though the driver treats them all the same way.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DaemonError {
    /// Credential file missing or unreadable
    #[error("Credential error: {0}")]
    Credentials(#[source] std::io::Error),

    /// Authentication, transport or API failure talking to the calendar
    #[error("Calendar API error: {0}")]
    Calendar(String),

    /// No calendar visible to the credential has the configured name
    #[error("Calendar '{0}' not found")]
    CalendarNotFound(String),

    /// The polling window around now cannot be represented
    #[error("Polling window of {0}s is outside the supported date range")]
    WindowOutOfRange(u64),

    /// A tick ran before a calendar was resolved
    #[error("No calendar resolved, subscribe first")]
    NotSubscribed,

    /// Redis connection or command failure
    #[error("Chore store error: {0}")]
    Store(#[from] redis::RedisError),

    /// A chore could not be encoded to or decoded from JSON
    #[error("Chore encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

impl DaemonError {
    pub fn calendar(message: impl Into<String>) -> Self {
        DaemonError::Calendar(message.into())
    }
}

impl From<google_calendar3::Error> for DaemonError {
    fn from(err: google_calendar3::Error) -> Self {
        DaemonError::Calendar(err.to_string())
    }
}

pub type DaemonResult<T> = Result<T, DaemonError>;
