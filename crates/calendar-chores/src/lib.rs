//! Polls a Google calendar and turns event descriptions into chores stored
//! in Redis.

pub mod calendar_client;
pub mod chore_store;
pub mod config;
pub mod daemon;
pub mod error;
pub mod window;

#[cfg(test)]
mod testing;

pub use calendar_client::{CalendarApi, CalendarEvent, CalendarSummary, GoogleCalendarClient};
pub use chore_store::{ChoreStore, RedisChoreStore};
pub use config::DaemonConfig;
pub use daemon::{CalendarState, Daemon, TickSummary};
pub use error::{DaemonError, DaemonResult};
pub use window::PollingWindow;
