//! Notifications from the conversion worker to its consumer, and the
//! cancellation token flowing the other way.
//!
//! The worker owns the [`crate::job::Job`] for the whole run. Consumers learn
//! about progress only through [`ConversionEvent`]s and keep their own
//! projection ([`crate::job::JobProgress`]).
//!
//! For every run the consumer receives, in order:
//!
//! * zero or more `StatusChanged` / `Progress` events, then
//! * at most one `Error` (only when the run aborts before the first
//!   document), then
//! * exactly one `Finished`.

use crate::document::DocumentStatus;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// One notification from the conversion worker.
///
/// Document indices refer to positions in the job's queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConversionEvent {
    /// Emitted after every page attempt, successful or not.
    Progress {
        document_index: usize,
        /// 1-based number of the page just attempted.
        page_number: usize,
        /// Pages of this document written so far (absolute, not a delta).
        completed_pages: usize,
    },

    /// A document moved to a new state.
    StatusChanged {
        document_index: usize,
        status: DocumentStatus,
    },

    /// The run was aborted before any document was processed.
    Error { message: String },

    /// The run is over. Always the last event.
    Finished,
}

/// Sending half of the event channel, held by the worker.
///
/// Sends never fail from the worker's point of view: once the consumer has
/// gone away, events are dropped and the run carries on.
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<ConversionEvent>,
}

impl EventSink {
    pub fn new(tx: mpsc::UnboundedSender<ConversionEvent>) -> Self {
        Self { tx }
    }

    /// A connected sink/receiver pair.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ConversionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn emit(&self, event: ConversionEvent) {
        let _ = self.tx.send(event);
    }

    pub fn progress(&self, document_index: usize, page_number: usize, completed_pages: usize) {
        self.emit(ConversionEvent::Progress {
            document_index,
            page_number,
            completed_pages,
        });
    }

    pub fn status(&self, document_index: usize, status: DocumentStatus) {
        self.emit(ConversionEvent::StatusChanged {
            document_index,
            status,
        });
    }
}

/// Cooperative cancellation flag shared by the consumer and the worker.
///
/// Transitions once from "not cancelled" to "cancelled"; the worker checks it
/// before each document and before each page.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
