//! Counter tracker facade.

use std::ops::Deref;

use crate::client::handle::TrackerClient;
use crate::error::TrackerResult;

/// Handle bound to a counter tracker.
///
/// Derefs to [`TrackerClient`] for lifecycle calls; log calls made through
/// it fail with a type mismatch.
#[derive(Debug)]
pub struct CounterTrackerClient {
    client: TrackerClient,
}

impl CounterTrackerClient {
    pub(crate) fn new(client: TrackerClient) -> Self {
        Self { client }
    }

    /// Bump the counter by `amount` (positive or negative).
    pub fn bump(&self, amount: i64) -> TrackerResult<()> {
        self.client.bump(amount)
    }

    pub fn increment(&self) -> TrackerResult<()> {
        self.bump(1)
    }

    pub fn decrement(&self) -> TrackerResult<()> {
        self.bump(-1)
    }

    /// Counter value after every update this handle has already sent.
    pub async fn value(&self) -> TrackerResult<i64> {
        Ok(self.client.snapshot().await?.value)
    }

    pub fn into_inner(self) -> TrackerClient {
        self.client
    }
}

impl Deref for CounterTrackerClient {
    type Target = TrackerClient;
    fn deref(&self) -> &Self::Target {
        &self.client
    }
}
