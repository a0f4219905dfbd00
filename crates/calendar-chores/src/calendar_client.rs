//! Google Calendar access.
//!
//! The daemon only talks to the calendar through [`CalendarApi`], so ticks can
//! be exercised against an in-memory calendar.

use async_trait::async_trait;
use google_calendar3::api::{CalendarListEntry, Event};
use google_calendar3::hyper_rustls::HttpsConnector;
use google_calendar3::CalendarHub;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use std::path::Path;

use crate::error::{DaemonError, DaemonResult};
use crate::window::PollingWindow;

/// A calendar visible to the credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarSummary {
    pub id: String,
    pub summary: String,
}

/// A single concrete event occurrence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: String,
    pub description: Option<String>,
}

#[async_trait]
pub trait CalendarApi: Send + Sync {
    /// Every calendar on the authenticated user's calendar list.
    async fn list_calendars(&self) -> DaemonResult<Vec<CalendarSummary>>;

    /// Events of `calendar_id` overlapping `window`, recurring events
    /// expanded into single occurrences.
    async fn list_events(
        &self,
        calendar_id: &str,
        window: &PollingWindow,
    ) -> DaemonResult<Vec<CalendarEvent>>;
}

/// Client for the Google Calendar v3 API
pub struct GoogleCalendarClient {
    hub: CalendarHub<HttpsConnector<HttpConnector>>,
}

impl GoogleCalendarClient {
    /// Authenticate with a stored authorized-user credential (client id,
    /// client secret and refresh token).
    pub async fn connect(token_path: &Path) -> DaemonResult<Self> {
        let secret = google_calendar3::yup_oauth2::read_authorized_user_secret(token_path)
            .await
            .map_err(DaemonError::Credentials)?;

        let auth = google_calendar3::yup_oauth2::AuthorizedUserAuthenticator::builder(secret)
            .build()
            .await
            .map_err(|e| DaemonError::calendar(format!("Failed to build authenticator: {}", e)))?;

        let connector = google_calendar3::hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| DaemonError::calendar(format!("Failed to load native TLS roots: {}", e)))?
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(TokioExecutor::new()).build(connector);
        let hub = CalendarHub::new(client, auth);

        tracing::info!("Authenticated with Google Calendar using {}", token_path.display());

        Ok(Self { hub })
    }
}

#[async_trait]
impl CalendarApi for GoogleCalendarClient {
    async fn list_calendars(&self) -> DaemonResult<Vec<CalendarSummary>> {
        let mut calendars = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.hub.calendar_list().list();
            if let Some(ref token) = page_token {
                request = request.page_token(token);
            }

            let (_, list) = request.doit().await?;

            calendars.extend(
                list.items
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(calendar_summary),
            );

            match list.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!("Listed {} calendars", calendars.len());
        Ok(calendars)
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        window: &PollingWindow,
    ) -> DaemonResult<Vec<CalendarEvent>> {
        let mut events = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .hub
                .events()
                .list(calendar_id)
                .time_min(window.start)
                .time_max(window.end)
                .single_events(true);
            if let Some(ref token) = page_token {
                request = request.page_token(token);
            }

            let (_, page) = request.doit().await?;

            events.extend(page.items.unwrap_or_default().into_iter().filter_map(calendar_event));

            match page.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        tracing::debug!(
            "Listed {} events between {} and {}",
            events.len(),
            window.time_min(),
            window.time_max()
        );
        Ok(events)
    }
}

fn calendar_summary(entry: CalendarListEntry) -> Option<CalendarSummary> {
    Some(CalendarSummary {
        id: entry.id?,
        summary: entry.summary?,
    })
}

fn calendar_event(event: Event) -> Option<CalendarEvent> {
    let Some(id) = event.id else {
        tracing::debug!("Ignoring calendar event without an id");
        return None;
    };

    Some(CalendarEvent {
        id,
        description: event.description,
    })
}
