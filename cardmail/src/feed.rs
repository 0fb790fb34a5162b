//! Live contact subscriptions
//!
//! Every contact mutation publishes a `ContactsChanged` event for the
//! owning user. A `ContactSubscription` turns those events into fresh
//! query snapshots: the first `next()` yields the current state, each
//! later call waits for a change to that user's contacts and re-runs
//! the query. Dropping the subscription unsubscribes.

use crate::cache::ReadCache;
use crate::database::{Contact, Repository};
use crate::error::Result;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

const FEED_CAPACITY: usize = 256;

/// A user's contact collection changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactsChanged {
    pub user_id: String,
}

/// Broadcast channel of contact changes
#[derive(Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ContactsChanged>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeFeed {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CAPACITY);
        Self { sender }
    }

    pub fn publish(&self, user_id: &str) {
        // No live views is not an error
        let _ = self.sender.send(ContactsChanged {
            user_id: user_id.to_string(),
        });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ContactsChanged> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Which contacts a live view shows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionScope {
    /// Every contact except trash
    All,
    /// One folder, user-defined or virtual
    Folder(String),
}

/// Snapshot stream over one user's contacts
pub struct ContactSubscription {
    user_id: String,
    scope: SubscriptionScope,
    repo: Repository,
    cache: ReadCache,
    receiver: broadcast::Receiver<ContactsChanged>,
    primed: bool,
}

impl ContactSubscription {
    pub(crate) fn new(
        user_id: &str,
        scope: SubscriptionScope,
        repo: Repository,
        cache: ReadCache,
        receiver: broadcast::Receiver<ContactsChanged>,
    ) -> Self {
        Self {
            user_id: user_id.to_string(),
            scope,
            repo,
            cache,
            receiver,
            primed: false,
        }
    }

    pub fn scope(&self) -> &SubscriptionScope {
        &self.scope
    }

    /// Next snapshot, or `None` once the feed has shut down
    pub async fn next(&mut self) -> Option<Result<Vec<Contact>>> {
        if self.primed {
            loop {
                match self.receiver.recv().await {
                    Ok(event) if event.user_id == self.user_id => break,
                    Ok(_) => continue,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Subscription lagged by {} events, re-querying", skipped);
                        break;
                    }
                    Err(RecvError::Closed) => return None,
                }
            }
        }

        self.primed = true;
        Some(self.snapshot().await)
    }

    async fn snapshot(&self) -> Result<Vec<Contact>> {
        let contacts = match &self.scope {
            SubscriptionScope::All => self.repo.list_contacts(&self.user_id).await,
            SubscriptionScope::Folder(folder_id) => {
                self.repo
                    .list_contacts_in_folder(&self.user_id, folder_id)
                    .await
            }
        };

        match contacts {
            Ok(contacts) => {
                self.cache.put_contacts(&self.user_id, &contacts);
                Ok(contacts)
            }
            Err(e) => {
                tracing::error!("Subscription query failed for user {}: {}", self.user_id, e);
                Err(e)
            }
        }
    }
}
