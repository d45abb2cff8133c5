//! Per-view holder of the canonical authenticator configuration.
//!
//! A [`ConfigStore`] owns the last configuration confirmed by the backend for
//! one slice and fans updates out to its subscribers. The held value only
//! changes after a successful load or save; failures are reported through the
//! [`Notifier`] and leave it untouched.
//!
//! One operation (load or save) may be in flight per store. A second call made
//! while one is outstanding is rejected with [`StoreError::Busy`].

mod notify;

pub use notify::*;

use crate::authenticator::{Configuration, Slice};
use crate::client::{ClientError, ConfigApi};

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Payload delivered to subscribers.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigUpdate {
    pub config: Configuration,
}

/// A subscriber callback.
pub type Subscriber = Arc<dyn Fn(&ConfigUpdate) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Load,
    Save,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load => f.write_str("load"),
            Self::Save => f.write_str("save"),
        }
    }
}

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("cannot start {requested}: a {in_flight} is already in progress")]
    Busy {
        requested: Operation,
        in_flight: Operation,
    },
    #[error(transparent)]
    Client(#[from] ClientError),
}

pub struct ConfigStore {
    slice: Slice,
    api: Arc<dyn ConfigApi>,
    notifier: Arc<dyn Notifier>,
    held: RwLock<Option<Configuration>>,
    subscribers: RwLock<Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: AtomicU64,
    in_flight: parking_lot::Mutex<Option<Operation>>,
}

/// Clears the in-flight marker when the operation finishes or is dropped.
struct InFlight<'a> {
    slot: &'a parking_lot::Mutex<Option<Operation>>,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        *self.slot.lock() = None;
    }
}

impl ConfigStore {
    pub fn new(slice: Slice, api: Arc<dyn ConfigApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            slice,
            api,
            notifier,
            held: RwLock::new(None),
            subscribers: RwLock::new(Vec::new()),
            next_subscription: AtomicU64::new(1),
            in_flight: parking_lot::Mutex::new(None),
        }
    }

    pub fn slice(&self) -> Slice {
        self.slice
    }

    /// The last configuration confirmed by the backend, if any.
    pub fn current(&self) -> Option<Configuration> {
        self.held.read().clone()
    }

    /// The operation currently awaiting the backend.
    pub fn in_flight(&self) -> Option<Operation> {
        *self.in_flight.lock()
    }

    pub fn subscribe(&self, subscriber: Subscriber) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.subscribers.write().push((id, subscriber));
        id
    }

    /// Remove a subscriber. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Fetch the configuration and publish it.
    pub async fn load(&self) -> Result<Configuration, StoreError> {
        let _guard = self.begin(Operation::Load)?;
        let messages = self.slice.messages();

        match self.api.fetch_config().await {
            Ok(config) => {
                debug!(slice = %self.slice, "Authenticator config loaded");
                self.publish(config.clone());
                Ok(config)
            }
            Err(e) => {
                self.report_failure(messages.fetch_failed, messages.fetch_failed_title, &e);
                Err(e.into())
            }
        }
    }

    /// Save `candidate` and publish the backend's answer.
    ///
    /// The backend's response, not the candidate, becomes the held value.
    pub async fn save(&self, candidate: Configuration) -> Result<Configuration, StoreError> {
        let _guard = self.begin(Operation::Save)?;
        let messages = self.slice.messages();

        match self.api.save_config(&candidate).await {
            Ok(canonical) => {
                self.publish(canonical.clone());
                self.notifier
                    .notify(Notification::success(messages.save_succeeded));
                Ok(canonical)
            }
            Err(e) => {
                self.report_failure(messages.save_failed, messages.save_failed_title, &e);
                Err(e.into())
            }
        }
    }

    fn begin(&self, requested: Operation) -> Result<InFlight<'_>, StoreError> {
        let mut slot = self.in_flight.lock();
        if let Some(in_flight) = *slot {
            warn!(
                slice = %self.slice,
                %requested,
                %in_flight,
                "Rejecting overlapping config operation"
            );
            return Err(StoreError::Busy {
                requested,
                in_flight,
            });
        }
        *slot = Some(requested);
        Ok(InFlight {
            slot: &self.in_flight,
        })
    }

    fn publish(&self, config: Configuration) {
        *self.held.write() = Some(config.clone());

        // Callbacks run without holding the lock so they may (un)subscribe.
        let subscribers: Vec<Subscriber> = self
            .subscribers
            .read()
            .iter()
            .map(|(_, s)| s.clone())
            .collect();
        let update = ConfigUpdate { config };
        for subscriber in subscribers {
            subscriber(&update);
        }
    }

    fn report_failure(&self, context: &str, title: &str, error: &ClientError) {
        warn!(slice = %self.slice, error = %error, "{}", context);
        self.notifier.notify(Notification::error(
            failure_message(context, error),
            title,
        ));
    }
}

/// `"<context>: <message>"` as shown to the user.
pub fn failure_message(context: &str, error: &ClientError) -> String {
    format!("{}: {}", context, error.display_message())
}
