//! Calendar to chore reconciliation.
//!
//! Each tick lists the events around now and creates a chore for every event
//! whose `node` does not already hold a chore produced by that same event.
//! The chore store is the only record of what has been handled.

use chore_types::ChoreTemplate;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use crate::calendar_client::{CalendarApi, CalendarEvent};
use crate::chore_store::ChoreStore;
use crate::config::PollingConfig;
use crate::error::{DaemonError, DaemonResult};
use crate::window::PollingWindow;

/// Outcome of calendar resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarState {
    Unresolved,
    Resolved(String),
}

/// Counts for a single tick
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickSummary {
    pub listed: usize,
    /// Events without a usable chore template
    pub skipped: usize,
    /// Events whose chore already exists
    pub current: usize,
    pub created: usize,
}

#[derive(Debug)]
enum EventOutcome {
    Skipped,
    Current,
    Created,
}

pub struct Daemon<C, S> {
    calendar_name: String,
    calendar: C,
    store: S,
    polling: PollingConfig,
    state: CalendarState,
}

impl<C: CalendarApi, S: ChoreStore> Daemon<C, S> {
    pub fn new(
        calendar_name: impl Into<String>,
        calendar: C,
        store: S,
        polling: PollingConfig,
    ) -> Self {
        Self {
            calendar_name: calendar_name.into(),
            calendar,
            store,
            polling,
            state: CalendarState::Unresolved,
        }
    }

    pub fn state(&self) -> &CalendarState {
        &self.state
    }

    #[cfg(test)]
    pub fn calendar(&self) -> &C {
        &self.calendar
    }

    #[cfg(test)]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Resolve the configured calendar name to its id.
    ///
    /// If several calendars share the name, the last one listed wins.
    pub async fn subscribe(&mut self) -> DaemonResult<String> {
        let calendars = self.calendar.list_calendars().await?;

        let mut matches = calendars
            .into_iter()
            .filter(|calendar| calendar.summary == self.calendar_name)
            .map(|calendar| calendar.id)
            .collect::<Vec<_>>();

        if matches.len() > 1 {
            tracing::warn!(
                "{} calendars are named '{}', using the last one",
                matches.len(),
                self.calendar_name
            );
        }

        let Some(id) = matches.pop() else {
            self.state = CalendarState::Unresolved;
            return Err(DaemonError::CalendarNotFound(self.calendar_name.clone()));
        };

        tracing::info!("Subscribed to calendar '{}' ({})", self.calendar_name, id);
        self.state = CalendarState::Resolved(id.clone());
        Ok(id)
    }

    /// Run one tick against the current time.
    pub async fn process(&self) -> DaemonResult<TickSummary> {
        self.process_at(Utc::now()).await
    }

    /// Run one tick with the window centered on `now`.
    pub async fn process_at(&self, now: DateTime<Utc>) -> DaemonResult<TickSummary> {
        let CalendarState::Resolved(calendar_id) = &self.state else {
            return Err(DaemonError::NotSubscribed);
        };

        let window = PollingWindow::centered_on(now, self.polling.range_secs)
            .ok_or(DaemonError::WindowOutOfRange(self.polling.range_secs))?;
        let events = self.calendar.list_events(calendar_id, &window).await?;

        let mut summary = TickSummary {
            listed: events.len(),
            ..Default::default()
        };

        for event in events {
            match self.reconcile(event).await? {
                EventOutcome::Skipped => summary.skipped += 1,
                EventOutcome::Current => summary.current += 1,
                EventOutcome::Created => summary.created += 1,
            }
        }

        Ok(summary)
    }

    async fn reconcile(&self, event: CalendarEvent) -> DaemonResult<EventOutcome> {
        let Some(description) = event.description.as_deref() else {
            tracing::debug!("Event {} has no description, skipping", event.id);
            return Ok(EventOutcome::Skipped);
        };

        let mut template = match ChoreTemplate::decode(description) {
            Ok(template) => template,
            Err(reason) => {
                tracing::debug!("Event {} is not a chore: {}", event.id, reason);
                return Ok(EventOutcome::Skipped);
            }
        };

        if let Some(existing) = self.store.get(&template.node).await? {
            if existing.is_current_for(&event.id) {
                return Ok(EventOutcome::Current);
            }
        }

        template.set_event_id(event.id.as_str());
        let person = template.person.clone();
        let node = template.node.clone();

        self.store.create(template, &person, &node).await?;

        tracing::info!(
            "Created chore for {} on {} from event {}",
            person,
            node,
            event.id
        );
        Ok(EventOutcome::Created)
    }

    /// Subscribe, then tick until `shutdown` is cancelled.
    ///
    /// A failed tick is logged and the loop carries on after the usual sleep.
    pub async fn run(&mut self, shutdown: CancellationToken) -> DaemonResult<()> {
        self.subscribe().await?;

        tracing::info!(
            "Polling every {:?} (window: {}s)",
            self.polling.sleep,
            self.polling.range_secs
        );

        while !shutdown.is_cancelled() {
            match self.process().await {
                Ok(summary) => tracing::info!(
                    "Tick complete: {} listed, {} skipped, {} current, {} created",
                    summary.listed,
                    summary.skipped,
                    summary.current,
                    summary.created
                ),
                Err(e) => {
                    tracing::error!("Tick failed: {}", e);
                    tracing::error!("{}", error_chain(&e));
                }
            }

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.polling.sleep) => {}
            }
        }

        tracing::info!("Shutdown requested, daemon stopped");
        Ok(())
    }
}

/// Debug representation of an error followed by each of its sources.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut chain = format!("{:?}", err);
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(&format!("\n  caused by: {}", cause));
        source = cause.source();
    }
    chain
}
