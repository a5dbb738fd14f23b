//! Live job collection feed.
//!
//! Every successful job write republishes the full collection. Subscribers
//! see the latest snapshot only; intermediate ones may be skipped. A
//! subscription ends when the server shuts down or when it is dropped.
//!
//! Each reload takes a read number before it queries storage. A snapshot is
//! only published if its read number is newer than the one on display, so a
//! slow reload can never replace the collection with an older view.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::Stream;
use futures_util::stream;
use sea_orm::DatabaseConnection;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::domain::Job;
use crate::error::RepositoryError;
use crate::repositories::JobRepository;

pub type Snapshot = Arc<Vec<Job>>;

#[derive(Debug, Clone)]
struct Published {
    read: u64,
    jobs: Snapshot,
}

#[derive(Debug, Clone)]
pub struct JobFeed {
    sender: Arc<watch::Sender<Published>>,
    reads: Arc<AtomicU64>,
    shutdown: CancellationToken,
}

impl JobFeed {
    pub fn new(shutdown: CancellationToken) -> Self {
        let (sender, _) = watch::channel(Published {
            read: 0,
            jobs: Arc::new(Vec::new()),
        });
        Self {
            sender: Arc::new(sender),
            reads: Arc::new(AtomicU64::new(0)),
            shutdown,
        }
    }

    /// Claim the next read number. Call before loading the collection.
    fn begin_read(&self) -> u64 {
        self.reads.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Publish a collection loaded under `read`. Returns false when a newer
    /// read has already been published.
    fn publish_read(&self, read: u64, jobs: Vec<Job>) -> bool {
        let count = jobs.len();
        let jobs = Arc::new(jobs);
        let published = self.sender.send_if_modified(|current| {
            if read <= current.read {
                return false;
            }
            *current = Published {
                read,
                jobs: jobs.clone(),
            };
            true
        });

        if published {
            tracing::debug!(read, jobs = count, subscribers = self.sender.receiver_count(), "Published job snapshot");
        } else {
            tracing::debug!(read, "Dropped job snapshot older than the published one");
        }
        published
    }

    pub fn publish(&self, jobs: Vec<Job>) {
        let read = self.begin_read();
        self.publish_read(read, jobs);
    }

    /// Reload the collection from storage and publish it.
    pub async fn refresh(&self, db: &DatabaseConnection) -> Result<(), RepositoryError> {
        let read = self.begin_read();
        let jobs = JobRepository::new(db).list_all().await?;
        self.publish_read(read, jobs);
        Ok(())
    }

    pub fn latest(&self) -> Snapshot {
        self.sender.borrow().jobs.clone()
    }

    /// Subscribe to snapshots published from now on.
    pub fn subscribe(&self) -> JobSubscription {
        let mut receiver = self.sender.subscribe();
        receiver.mark_unchanged();
        JobSubscription {
            receiver,
            shutdown: self.shutdown.clone(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Stop all subscriptions.
    pub fn close(&self) {
        self.shutdown.cancel();
    }
}

pub struct JobSubscription {
    receiver: watch::Receiver<Published>,
    shutdown: CancellationToken,
}

impl JobSubscription {
    /// Wait for the next snapshot. `None` once the feed is shut down.
    pub async fn next(&mut self) -> Option<Snapshot> {
        tokio::select! {
            _ = self.shutdown.cancelled() => None,
            changed = self.receiver.changed() => match changed {
                Ok(()) => Some(self.receiver.borrow_and_update().jobs.clone()),
                Err(_) => None,
            },
        }
    }

    pub fn into_stream(self) -> impl Stream<Item = Snapshot> {
        stream::unfold(self, |mut subscription| async move {
            subscription.next().await.map(|snapshot| (snapshot, subscription))
        })
    }
}
