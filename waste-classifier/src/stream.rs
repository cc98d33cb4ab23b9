//! Workflow event streaming.
//!
//! Each submission reports its progress as a stream of [`WorkflowEvent`]s.
//! Presentation layers subscribe to the stream and decide how to surface
//! each event.

use futures::Stream;
use pin_project_lite::pin_project;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::error::{ErrorKind, Failure};
use crate::types::CategorizedResult;

/// Room for every event one submission can emit.
const EVENT_BUFFER: usize = 4;

/// Progress of one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// The submission was accepted
    Started { submission_id: String },
    /// Inference succeeded and the label was resolved
    Predicted(CategorizedResult),
    /// The result was stored
    Persisted { record_id: String },
    /// The submission ended with an error
    Failed { kind: ErrorKind, message: String },
}

impl WorkflowEvent {
    /// Create a failure event.
    pub fn failed(kind: ErrorKind, message: impl Into<String>) -> Self {
        WorkflowEvent::Failed {
            kind,
            message: message.into(),
        }
    }
}

pin_project! {
    /// Stream of events from one submission.
    ///
    /// Ends after the terminal event. The predicted result stays available
    /// through [`WorkflowEvents::result`] even if a later step fails.
    #[derive(Debug)]
    pub struct WorkflowEvents {
        #[pin]
        receiver: mpsc::Receiver<WorkflowEvent>,
        submission_id: String,
        // Last predicted payload seen
        result: Option<CategorizedResult>,
        // Terminal failure, if any
        failure: Option<Failure>,
        // Stored record ID, if persisted
        record_id: Option<String>,
        complete: bool,
    }
}

impl WorkflowEvents {
    /// Create a sender/stream pair for a submission.
    pub fn channel(submission_id: impl Into<String>) -> (EventSender, Self) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let stream = Self {
            receiver: rx,
            submission_id: submission_id.into(),
            result: None,
            failure: None,
            record_id: None,
            complete: false,
        };
        (EventSender { sender: tx }, stream)
    }

    pub fn submission_id(&self) -> &str {
        &self.submission_id
    }

    /// Predicted result seen so far.
    pub fn result(&self) -> Option<&CategorizedResult> {
        self.result.as_ref()
    }

    /// Terminal failure seen so far.
    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    /// Record ID if the result was persisted.
    pub fn record_id(&self) -> Option<&str> {
        self.record_id.as_deref()
    }

    /// Whether the stream has ended.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Drain the stream into an outcome.
    pub async fn finish(mut self) -> SubmissionOutcome {
        use futures::StreamExt;

        let mut events = Vec::new();
        while let Some(event) = self.next().await {
            events.push(event);
        }

        SubmissionOutcome {
            submission_id: self.submission_id,
            events,
            result: self.result,
            failure: self.failure,
            record_id: self.record_id,
        }
    }
}

impl Stream for WorkflowEvents {
    type Item = WorkflowEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        match this.receiver.poll_recv(cx) {
            Poll::Ready(Some(event)) => {
                match &event {
                    WorkflowEvent::Started { .. } => {}
                    WorkflowEvent::Predicted(result) => *this.result = Some(result.clone()),
                    WorkflowEvent::Persisted { record_id } => {
                        *this.record_id = Some(record_id.clone())
                    }
                    WorkflowEvent::Failed { kind, message } => {
                        *this.failure = Some(Failure::new(*kind, message.clone()))
                    }
                }
                Poll::Ready(Some(event))
            }
            Poll::Ready(None) => {
                *this.complete = true;
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Everything a drained submission produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub submission_id: String,
    pub events: Vec<WorkflowEvent>,
    pub result: Option<CategorizedResult>,
    pub failure: Option<Failure>,
    pub record_id: Option<String>,
}

impl SubmissionOutcome {
    /// Whether the submission ended without a failure.
    pub fn is_success(&self) -> bool {
        self.failure.is_none() && self.result.is_some()
    }
}

/// Sending half owned by the running submission.
pub struct EventSender {
    sender: mpsc::Sender<WorkflowEvent>,
}

impl EventSender {
    /// Emit an event. A dropped stream is not an error; the submission
    /// still runs to completion.
    pub async fn emit(&self, event: WorkflowEvent) {
        if self.sender.send(event).await.is_err() {
            tracing::trace!("Event stream dropped by subscriber");
        }
    }
}
