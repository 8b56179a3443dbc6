//! Log tracker facade.

use std::ops::Deref;

use crate::client::handle::TrackerClient;
use crate::error::TrackerResult;
use crate::tree::message::LogRecord;

/// Handle bound to a log tracker.
#[derive(Debug)]
pub struct LogTrackerClient {
    client: TrackerClient,
}

impl LogTrackerClient {
    pub(crate) fn new(client: TrackerClient) -> Self {
        Self { client }
    }

    pub fn info(&self, message: impl Into<String>) -> TrackerResult<()> {
        self.client.info(message)
    }

    pub fn warning(&self, message: impl Into<String>) -> TrackerResult<()> {
        self.client.warning(message)
    }

    pub fn error(&self, message: impl Into<String>) -> TrackerResult<()> {
        self.client.error(message)
    }

    /// Retained history, oldest first.
    pub async fn recent(&self) -> TrackerResult<Vec<LogRecord>> {
        Ok(self.client.snapshot().await?.recent)
    }

    pub fn into_inner(self) -> TrackerClient {
        self.client
    }
}

impl Deref for LogTrackerClient {
    type Target = TrackerClient;
    fn deref(&self) -> &Self::Target {
        &self.client
    }
}
