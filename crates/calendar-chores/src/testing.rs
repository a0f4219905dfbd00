//! In-memory collaborators for exercising the daemon without Google or Redis.

use async_trait::async_trait;
use chore_types::{Chore, ChoreTemplate};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::calendar_client::{CalendarApi, CalendarEvent, CalendarSummary};
use crate::chore_store::ChoreStore;
use crate::error::{DaemonError, DaemonResult};
use crate::window::PollingWindow;

/// Chore store backed by a map, recording every create.
#[derive(Default)]
pub struct MemoryChoreStore {
    pub chores: Mutex<HashMap<String, Chore>>,
    pub creates: AtomicUsize,
    pub fail_gets: AtomicBool,
}

impl MemoryChoreStore {
    pub fn with_chores(chores: impl IntoIterator<Item = (&'static str, Chore)>) -> Self {
        let store = Self::default();
        store.chores.lock().unwrap().extend(
            chores
                .into_iter()
                .map(|(node, chore)| (node.to_string(), chore)),
        );
        store
    }

    pub fn snapshot(&self) -> HashMap<String, Chore> {
        self.chores.lock().unwrap().clone()
    }

    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChoreStore for MemoryChoreStore {
    async fn get(&self, node: &str) -> DaemonResult<Option<Chore>> {
        if self.fail_gets.load(Ordering::SeqCst) {
            let err = redis::RedisError::from((redis::ErrorKind::IoError, "connection reset"));
            return Err(err.into());
        }
        Ok(self.chores.lock().unwrap().get(node).cloned())
    }

    async fn create(
        &self,
        template: ChoreTemplate,
        person: &str,
        node: &str,
    ) -> DaemonResult<Chore> {
        let chore = Chore::from_template(template, person, node);
        self.chores
            .lock()
            .unwrap()
            .insert(node.to_string(), chore.clone());
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(chore)
    }
}

/// Scripted calendar: each `list_events` call pops the next response, and the
/// last response repeats once the script runs out.
#[derive(Default)]
pub struct ScriptedCalendar {
    pub calendars: Vec<CalendarSummary>,
    pub responses: Mutex<VecDeque<DaemonResult<Vec<CalendarEvent>>>>,
    pub last_events: Mutex<Vec<CalendarEvent>>,
    pub requests: Mutex<Vec<(String, PollingWindow)>>,
    /// Cancelled once this many event listings have been served.
    pub cancel_after: Option<(usize, CancellationToken)>,
}

impl ScriptedCalendar {
    pub fn new(calendars: &[(&str, &str)]) -> Self {
        Self {
            calendars: calendars
                .iter()
                .map(|(summary, id)| CalendarSummary {
                    id: id.to_string(),
                    summary: summary.to_string(),
                })
                .collect(),
            ..Default::default()
        }
    }

    pub fn respond(self, response: DaemonResult<Vec<CalendarEvent>>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn cancel_after(mut self, calls: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((calls, token));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl CalendarApi for ScriptedCalendar {
    async fn list_calendars(&self) -> DaemonResult<Vec<CalendarSummary>> {
        Ok(self.calendars.clone())
    }

    async fn list_events(
        &self,
        calendar_id: &str,
        window: &PollingWindow,
    ) -> DaemonResult<Vec<CalendarEvent>> {
        let calls = {
            let mut requests = self.requests.lock().unwrap();
            requests.push((calendar_id.to_string(), *window));
            requests.len()
        };

        if let Some((limit, token)) = &self.cancel_after {
            if calls >= *limit {
                token.cancel();
            }
        }

        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(Ok(events)) => {
                *self.last_events.lock().unwrap() = events.clone();
                Ok(events)
            }
            Some(Err(e)) => Err(e),
            None => Ok(self.last_events.lock().unwrap().clone()),
        }
    }
}

pub fn event(id: &str, description: Option<&str>) -> CalendarEvent {
    CalendarEvent {
        id: id.to_string(),
        description: description.map(str::to_string),
    }
}

pub fn calendar_failure() -> DaemonError {
    DaemonError::calendar("backend unavailable")
}
