//! Test doubles shared by unit tests.

use crate::client::MessagingClient;
use crate::error::PublishError;
use crate::message::Message;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

/// In-memory client that records every publish call.
pub struct RecordingClient {
    connected: AtomicBool,
    fail_with: Mutex<Option<io::ErrorKind>>,
    published: Mutex<Vec<(String, Message)>>,
}

impl RecordingClient {
    pub fn new(connected: bool) -> Self {
        Self {
            connected: AtomicBool::new(connected),
            fail_with: Mutex::new(None),
            published: Mutex::new(Vec::new()),
        }
    }

    /// Make every subsequent publish fail with an I/O error of `kind`.
    pub fn failing(self, kind: io::ErrorKind) -> Self {
        *self.fail_with.lock() = Some(kind);
        self
    }

    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Number of publish calls made, failed ones included.
    pub fn publish_count(&self) -> usize {
        self.published.lock().len()
    }

    pub fn published(&self) -> Vec<(String, Message)> {
        self.published.lock().clone()
    }
}

#[async_trait]
impl MessagingClient for RecordingClient {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    async fn publish(&self, topic: &str, message: Message) -> Result<(), PublishError> {
        self.published.lock().push((topic.to_string(), message));
        match *self.fail_with.lock() {
            Some(kind) => Err(PublishError::new(
                topic,
                io::Error::new(kind, "transport failure"),
            )),
            None => Ok(()),
        }
    }
}
