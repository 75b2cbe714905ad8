//! Registry of clients parked in BLPOP, queued per list key in arrival order.
//!
//! Lock order is always registry first, store second: the registry lock is
//! held while the store is scanned on registration and while an element is
//! popped for a woken client, so a push can never slip between a failed scan
//! and the registration that should have observed it.

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Duration,
};

use tokio::{sync::oneshot, time::Instant};
use tracing::{debug, warn};

use crate::key_value_store::{KeyValueStore, ListEnd, StoreError};

/// A client suspended until an element shows up on `key`.
#[derive(Debug)]
pub struct BlockedClient {
    id: u64,
    pub client_address: String,
    pub key: String,
    /// `None` waits forever.
    pub timeout: Option<Duration>,
    pub started_at: Instant,
    sender: oneshot::Sender<String>,
}

/// Result of trying to pop for a BLPOP before suspending.
#[derive(Debug)]
pub enum BlpopOutcome {
    Ready { key: String, element: String },
    Blocked(BlockedWait),
}

#[derive(Debug, Default)]
pub struct BlockingRegistry {
    waiters: Mutex<HashMap<String, VecDeque<BlockedClient>>>,
    next_id: AtomicU64,
}

impl BlockingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, VecDeque<BlockedClient>>> {
        self.waiters.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pops the head of the first non-empty list among `keys`, or registers
    /// the caller as waiting on the first key.
    ///
    /// A key holding something other than a list aborts the scan with
    /// [`StoreError::WrongType`] and nothing is registered.
    pub fn pop_or_register(
        self: &Arc<Self>,
        store: &Arc<KeyValueStore>,
        keys: &[String],
        client_address: &str,
        timeout: Option<Duration>,
    ) -> Result<BlpopOutcome, StoreError> {
        let mut waiters = self.lock();

        for key in keys {
            if let Some(element) = store.pop_list_head(key)? {
                return Ok(BlpopOutcome::Ready {
                    key: key.clone(),
                    element,
                });
            }
        }

        let key = keys.first().cloned().unwrap_or_default();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();

        waiters
            .entry(key.clone())
            .or_default()
            .push_back(BlockedClient {
                id,
                client_address: client_address.to_string(),
                key: key.clone(),
                timeout,
                started_at: Instant::now(),
                sender,
            });

        debug!(%key, client = client_address, ?timeout, "client blocked");

        Ok(BlpopOutcome::Blocked(BlockedWait {
            registry: Arc::clone(self),
            store: Arc::clone(store),
            key,
            id,
            timeout,
            receiver,
        }))
    }

    /// Hands the head element of the list at `key` to the longest-waiting
    /// client, if any. At most one client is woken per call.
    ///
    /// Returns whether a client was woken.
    pub fn wake_one(&self, store: &KeyValueStore, key: &str) -> bool {
        let mut waiters = self.lock();

        let Some(queue) = waiters.get_mut(key) else {
            return false;
        };

        let mut woken = false;

        while let Some(client) = queue.pop_front() {
            if client.sender.is_closed() {
                debug!(%key, client = %client.client_address, "dropping abandoned waiter");
                continue;
            }

            let element = match store.pop_list_head(key) {
                Ok(Some(element)) => element,
                Ok(None) | Err(_) => {
                    queue.push_front(client);
                    break;
                }
            };

            match client.sender.send(element) {
                Ok(()) => {
                    debug!(
                        %key,
                        client = %client.client_address,
                        waited = ?client.started_at.elapsed(),
                        "blocked client satisfied"
                    );
                    woken = true;
                    break;
                }
                Err(element) => {
                    if let Err(err) = store.push_list(key, &[element], ListEnd::Head) {
                        warn!(%key, %err, "could not return element to list");
                    }
                }
            }
        }

        if queue.is_empty() {
            waiters.remove(key);
        }

        woken
    }

    /// Number of clients currently waiting on `key`.
    pub fn blocked_clients(&self, key: &str) -> usize {
        self.lock().get(key).map_or(0, VecDeque::len)
    }

    /// Removes the record `id` from the queue of `key`. Returns `false` when
    /// it was already taken by a waker.
    fn deregister(&self, key: &str, id: u64) -> bool {
        let mut waiters = self.lock();

        let Some(queue) = waiters.get_mut(key) else {
            return false;
        };

        let Some(position) = queue.iter().position(|client| client.id == id) else {
            return false;
        };

        queue.remove(position);

        if queue.is_empty() {
            waiters.remove(key);
        }

        true
    }
}

/// A pending BLPOP registration.
///
/// Dropping it before completion removes the record from the registry. If a
/// waker already handed it an element, that element goes back to the head of
/// the list and the next waiter is tried.
#[derive(Debug)]
pub struct BlockedWait {
    registry: Arc<BlockingRegistry>,
    store: Arc<KeyValueStore>,
    key: String,
    id: u64,
    timeout: Option<Duration>,
    receiver: oneshot::Receiver<String>,
}

impl BlockedWait {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Waits for an element or for the timeout. `None` means timed out.
    pub async fn wait(mut self) -> Option<String> {
        let Some(timeout) = self.timeout else {
            return (&mut self.receiver).await.ok();
        };

        match tokio::time::timeout(timeout, &mut self.receiver).await {
            Ok(result) => result.ok(),
            Err(_) => {
                if self.registry.deregister(&self.key, self.id) {
                    debug!(key = %self.key, "blocked client timed out");
                    return None;
                }

                // A waker took the record before the deregistration; its
                // element is already in the channel.
                self.receiver.try_recv().ok()
            }
        }
    }
}

impl Drop for BlockedWait {
    fn drop(&mut self) {
        if self.registry.deregister(&self.key, self.id) {
            debug!(key = %self.key, "blocked client aborted");
            return;
        }

        let Ok(element) = self.receiver.try_recv() else {
            return;
        };

        debug!(key = %self.key, "returning undelivered element");

        match self
            .store
            .push_list(&self.key, &[element], ListEnd::Head)
        {
            Ok(_) => {
                self.registry.wake_one(&self.store, &self.key);
            }
            Err(err) => warn!(key = %self.key, %err, "could not return element to list"),
        }
    }
}
