//! HTTP handlers and the shared in-memory state behind them.

pub mod checkin;
pub use self::checkin::{close, open, submit, suggestions, update};

pub mod health;
pub use self::health::health;

use crate::atingi::{
    checkin::{CheckInEvent, CheckInForm},
    model::Objective,
    suggest::SuggestClient,
};
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc::UnboundedSender, Mutex};
use ulid::Ulid;

/// An open check-in: the source objective plus its editable form.
#[derive(Debug, Clone)]
pub struct CheckIn {
    pub objective: Objective,
    pub form: CheckInForm,
}

/// Shared state for the check-in handlers.
///
/// Sessions live only in memory and only while open; the ulid key is minted
/// per open, so a stale async result can never land on a reopened session.
#[derive(Clone)]
pub struct AppState {
    checkins: Arc<Mutex<HashMap<Ulid, CheckIn>>>,
    suggest: SuggestClient,
    events: UnboundedSender<CheckInEvent>,
}

impl AppState {
    #[must_use]
    pub fn new(suggest: SuggestClient, events: UnboundedSender<CheckInEvent>) -> Self {
        Self {
            checkins: Arc::new(Mutex::new(HashMap::new())),
            suggest,
            events,
        }
    }

    pub(crate) fn checkins(&self) -> &Mutex<HashMap<Ulid, CheckIn>> {
        &self.checkins
    }

    pub(crate) fn suggest(&self) -> &SuggestClient {
        &self.suggest
    }

    /// Hand an event to the hosting layer. A closed receiver only means
    /// nobody is listening anymore; the check-in itself is unaffected.
    pub(crate) fn emit(&self, event: CheckInEvent) {
        let _ = self.events.send(event);
    }
}
