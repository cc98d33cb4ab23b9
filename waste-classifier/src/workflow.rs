//! ClassificationWorkflow - main entry point for submissions.
//!
//! Orchestrates inference, label resolution and persistence for one user
//! session. At most one submission runs at a time.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

#[cfg(feature = "typescript")]
use ts_rs::TS;

use crate::client::ClassificationClient;
use crate::error::{ErrorKind, Failure, WorkflowError};
use crate::history::{BlobStore, ClassificationRecord, HistoryStore, PersistenceError, RecordDraft};
use crate::source::ImageSource;
use crate::stats::{StatsAggregator, StatsSummary};
use crate::stream::{EventSender, WorkflowEvent, WorkflowEvents};
use crate::types::{CategorizedResult, Identity, ImageHandle};
use waste_catalog::CategoryCatalog;

/// State of the current (or last) submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "typescript", derive(TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    /// Nothing running; also reached after a successful save
    #[default]
    Idle,
    /// Waiting on the inference endpoint
    Submitting,
    /// Prediction ready, nothing to persist
    Succeeded,
    /// Inference failed
    Failed,
    /// Uploading the image and appending the record
    Persisting,
    /// Prediction ready but saving it failed
    PersistError,
}

impl WorkflowState {
    /// Whether a submission is still running.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, WorkflowState::Submitting | WorkflowState::Persisting)
    }
}

/// Blob and record stores used when an identity is present.
#[derive(Clone)]
struct Persistence {
    blobs: Arc<dyn BlobStore>,
    history: Arc<dyn HistoryStore>,
}

/// Mutable view of the workflow, shared with the running submission.
#[derive(Debug, Clone, Default)]
struct Snapshot {
    state: WorkflowState,
    submission_id: Option<String>,
    result: Option<CategorizedResult>,
    error: Option<Failure>,
}

struct Inner {
    client: Arc<dyn ClassificationClient>,
    catalog: Arc<CategoryCatalog>,
    persistence: Option<Persistence>,
    snapshot: Mutex<Snapshot>,
}

impl Inner {
    fn snapshot(&self) -> MutexGuard<'_, Snapshot> {
        self.snapshot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply a transition if `submission_id` still owns the snapshot.
    fn transition(&self, submission_id: &str, update: impl FnOnce(&mut Snapshot)) {
        let mut snapshot = self.snapshot();
        if snapshot.submission_id.as_deref() == Some(submission_id) {
            let from = snapshot.state;
            update(&mut *snapshot);
            debug!(submission_id, ?from, to = ?snapshot.state, "Workflow transition");
        }
    }
}

/// Releases the in-flight slot if a submission task ends without reaching
/// a terminal state (panic or runtime shutdown).
struct InFlightGuard {
    inner: Arc<Inner>,
    submission_id: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut snapshot = self.inner.snapshot();
        if snapshot.submission_id.as_deref() == Some(self.submission_id.as_str())
            && snapshot.state.is_in_flight()
        {
            warn!(submission_id = %self.submission_id, "Submission aborted");
            snapshot.state = WorkflowState::Failed;
            snapshot.error = Some(Failure::new(ErrorKind::Network, "submission aborted"));
        }
    }
}

/// Main entry point for classifying images.
///
/// Cloning shares the same state; a clone is the same workflow instance.
#[derive(Clone)]
pub struct ClassificationWorkflow {
    inner: Arc<Inner>,
}

impl ClassificationWorkflow {
    /// Create a workflow without persistence. Results are never saved.
    pub fn new(client: Arc<dyn ClassificationClient>, catalog: Arc<CategoryCatalog>) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                catalog,
                persistence: None,
                snapshot: Mutex::new(Snapshot::default()),
            }),
        }
    }

    /// Create a workflow that saves results for signed-in users.
    pub fn with_persistence(
        client: Arc<dyn ClassificationClient>,
        catalog: Arc<CategoryCatalog>,
        blobs: Arc<dyn BlobStore>,
        history: Arc<dyn HistoryStore>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                catalog,
                persistence: Some(Persistence { blobs, history }),
                snapshot: Mutex::new(Snapshot::default()),
            }),
        }
    }

    /// Current state.
    pub fn state(&self) -> WorkflowState {
        self.inner.snapshot().state
    }

    /// Whether a submission is running.
    pub fn is_busy(&self) -> bool {
        self.state().is_in_flight()
    }

    /// Result of the current submission, kept even when saving fails.
    pub fn last_result(&self) -> Option<CategorizedResult> {
        self.inner.snapshot().result.clone()
    }

    /// Failure of the current submission, if any.
    pub fn last_error(&self) -> Option<Failure> {
        self.inner.snapshot().error.clone()
    }

    /// Labels the endpoint can produce.
    pub async fn labels(&self) -> Result<Vec<String>, crate::client::ClientError> {
        self.inner.client.list_labels().await
    }

    /// Submit an image for classification.
    ///
    /// Returns immediately with the event stream; the work runs on a spawned
    /// task, so this must be called within a Tokio runtime. A call made while
    /// another submission is submitting or persisting is rejected with
    /// [`WorkflowError::ConcurrentSubmission`].
    pub fn submit(
        &self,
        image: ImageHandle,
        identity: Option<Identity>,
    ) -> Result<WorkflowEvents, WorkflowError> {
        let submission_id = uuid::Uuid::new_v4().to_string();

        {
            let mut snapshot = self.inner.snapshot();
            if snapshot.state.is_in_flight() {
                warn!(
                    in_flight = snapshot.submission_id.as_deref().unwrap_or("-"),
                    "Rejecting concurrent submission"
                );
                return Err(WorkflowError::ConcurrentSubmission);
            }

            *snapshot = Snapshot {
                state: WorkflowState::Submitting,
                submission_id: Some(submission_id.clone()),
                result: None,
                error: None,
            };
        }

        info!(
            submission_id = %submission_id,
            client = self.inner.client.id(),
            bytes = image.len(),
            signed_in = identity.is_some(),
            "Submission started"
        );

        let (sender, events) = WorkflowEvents::channel(submission_id.clone());
        let guard = InFlightGuard {
            inner: Arc::clone(&self.inner),
            submission_id: submission_id.clone(),
        };

        tokio::spawn(run_submission(
            Arc::clone(&self.inner),
            submission_id,
            image,
            identity,
            sender,
            guard,
        ));

        Ok(events)
    }

    /// Acquire an image from `source` and submit it.
    ///
    /// Capture failures are returned without touching the workflow state.
    pub async fn capture_and_submit(
        &self,
        source: &dyn ImageSource,
        identity: Option<Identity>,
    ) -> Result<WorkflowEvents, WorkflowError> {
        if self.is_busy() {
            return Err(WorkflowError::ConcurrentSubmission);
        }

        let image = source.acquire().await.map_err(|e| {
            warn!(error = %e, "Image capture failed");
            WorkflowError::Capture(e)
        })?;

        self.submit(image, identity)
    }

    /// A user's stored records, newest first.
    pub async fn history(
        &self,
        identity: &Identity,
    ) -> Result<Vec<ClassificationRecord>, PersistenceError> {
        match &self.inner.persistence {
            Some(p) => p.history.list_by_owner(&identity.user_id).await,
            None => Ok(Vec::new()),
        }
    }

    /// Category statistics over a user's current history.
    pub async fn stats(&self, identity: &Identity) -> Result<StatsSummary, PersistenceError> {
        let records = self.history(identity).await?;
        Ok(StatsAggregator::compute(&records))
    }
}

/// Run one submission to its terminal state.
async fn run_submission(
    inner: Arc<Inner>,
    submission_id: String,
    image: ImageHandle,
    identity: Option<Identity>,
    events: EventSender,
    _guard: InFlightGuard,
) {
    events
        .emit(WorkflowEvent::Started {
            submission_id: submission_id.clone(),
        })
        .await;

    let prediction = match inner.client.classify(&image).await {
        Ok(prediction) => prediction,
        Err(e) => {
            warn!(submission_id = %submission_id, error = %e, "Classification failed");
            let failure = Failure::new(e.kind(), e.to_string());
            inner.transition(&submission_id, |s| {
                s.state = WorkflowState::Failed;
                s.error = Some(failure.clone());
            });
            events
                .emit(WorkflowEvent::failed(failure.kind, failure.message))
                .await;
            return;
        }
    };

    let category = inner.catalog.resolve(prediction.label());
    let result = CategorizedResult {
        prediction,
        category,
    };

    info!(
        submission_id = %submission_id,
        label = result.prediction.label(),
        display_label = result.display_label(),
        score = result.prediction.score(),
        inference_time_ms = result.prediction.inference_time_ms(),
        "Prediction resolved"
    );

    let target = match (identity, inner.persistence.clone()) {
        (Some(identity), Some(persistence)) => Some((identity, persistence)),
        (Some(identity), None) => {
            warn!(owner_id = %identity.user_id, "No stores configured, result will not be saved");
            None
        }
        (None, _) => None,
    };

    let Some((identity, persistence)) = target else {
        inner.transition(&submission_id, |s| {
            s.state = WorkflowState::Succeeded;
            s.result = Some(result.clone());
        });
        events.emit(WorkflowEvent::Predicted(result)).await;
        return;
    };

    // Succeeded -> Persisting happens before the caller sees the result, so
    // the in-flight slot stays held.
    inner.transition(&submission_id, |s| {
        s.state = WorkflowState::Persisting;
        s.result = Some(result.clone());
    });
    events.emit(WorkflowEvent::Predicted(result.clone())).await;

    match persist(&persistence, &identity, &image, &result).await {
        Ok(record_id) => {
            info!(
                submission_id = %submission_id,
                record_id = %record_id,
                owner_id = %identity.user_id,
                "Result saved"
            );
            inner.transition(&submission_id, |s| s.state = WorkflowState::Idle);
            events.emit(WorkflowEvent::Persisted { record_id }).await;
        }
        Err(e) => {
            warn!(
                submission_id = %submission_id,
                owner_id = %identity.user_id,
                error = %e,
                "Saving result failed"
            );
            let failure = Failure::new(ErrorKind::Persistence, e.to_string());
            inner.transition(&submission_id, |s| {
                s.state = WorkflowState::PersistError;
                s.error = Some(failure.clone());
            });
            events
                .emit(WorkflowEvent::failed(failure.kind, failure.message))
                .await;
        }
    }
}

/// Upload the image, then append the record. Both must succeed.
async fn persist(
    persistence: &Persistence,
    identity: &Identity,
    image: &ImageHandle,
    result: &CategorizedResult,
) -> Result<String, PersistenceError> {
    let image_ref = persistence.blobs.upload(&identity.user_id, image).await?;
    debug!(image_ref = %image_ref, "Image uploaded");

    let draft = RecordDraft::new(identity, image_ref, result);
    persistence.history.append(draft).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ClientError, MockClient};
    use crate::history::{InMemoryBlobStore, InMemoryHistoryStore};
    use crate::source::CaptureError;
    use crate::types::Prediction;
    use async_trait::async_trait;

    fn image() -> ImageHandle {
        ImageHandle::jpeg("memory://bottle.jpg", vec![1u8; 64])
    }

    fn catalog() -> Arc<CategoryCatalog> {
        Arc::new(CategoryCatalog::builtin())
    }

    struct DeniedSource;

    #[async_trait]
    impl ImageSource for DeniedSource {
        async fn acquire(&self) -> Result<ImageHandle, CaptureError> {
            Err(CaptureError::PermissionDenied("camera".into()))
        }
    }

    #[test]
    fn test_in_flight_states() {
        assert!(WorkflowState::Submitting.is_in_flight());
        assert!(WorkflowState::Persisting.is_in_flight());
        assert!(!WorkflowState::Succeeded.is_in_flight());
        assert!(!WorkflowState::PersistError.is_in_flight());
        assert_eq!(WorkflowState::default(), WorkflowState::Idle);
    }

    #[tokio::test]
    async fn test_failed_classification() {
        let client = Arc::new(MockClient::default().with_failure(ClientError::Service {
            status: 500,
            body: "model not loaded".into(),
        }));
        let workflow = ClassificationWorkflow::new(client, catalog());

        let outcome = workflow.submit(image(), None).unwrap().finish().await;

        assert_eq!(outcome.events.len(), 2);
        assert!(matches!(
            outcome.events[1],
            WorkflowEvent::Failed {
                kind: ErrorKind::Service,
                ..
            }
        ));
        assert_eq!(workflow.state(), WorkflowState::Failed);
        assert!(workflow.last_result().is_none());
        assert_eq!(workflow.last_error().unwrap().kind, ErrorKind::Service);
    }

    #[tokio::test]
    async fn test_identity_without_stores_skips_persistence() {
        let client = Arc::new(MockClient::new("paper", 0.8));
        let workflow = ClassificationWorkflow::new(client, catalog());

        let outcome = workflow
            .submit(image(), Some(Identity::new("uid-1", "Ada")))
            .unwrap()
            .finish()
            .await;

        assert_eq!(outcome.events.len(), 2);
        assert_eq!(workflow.state(), WorkflowState::Succeeded);
        assert!(workflow.history(&Identity::new("uid-1", "Ada")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_new_submission_clears_previous_outcome() {
        let client = Arc::new(MockClient::default().with_failure(ClientError::Network("down".into())));
        let workflow = ClassificationWorkflow::new(client, catalog());

        workflow.submit(image(), None).unwrap().finish().await;
        assert!(workflow.last_error().is_some());

        let events = workflow.submit(image(), None).unwrap();
        assert_eq!(workflow.state(), WorkflowState::Submitting);
        assert!(workflow.last_error().is_none());
        events.finish().await;
    }

    #[tokio::test]
    async fn test_capture_permission_denied() {
        let client = Arc::new(MockClient::new("glass", 0.9));
        let workflow = ClassificationWorkflow::new(client.clone(), catalog());

        let err = workflow
            .capture_and_submit(&DeniedSource, None)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::PermissionDenied);
        assert_eq!(workflow.state(), WorkflowState::Idle);
        assert_eq!(client.classify_calls(), 0);
    }

    #[tokio::test]
    async fn test_persisted_then_idle() {
        let client = Arc::new(
            MockClient::default().with_prediction(Prediction::new("Metal", 0.88, 35)),
        );
        let history = Arc::new(InMemoryHistoryStore::new());
        let workflow = ClassificationWorkflow::with_persistence(
            client,
            catalog(),
            Arc::new(InMemoryBlobStore::new()),
            history.clone(),
        );
        let identity = Identity::new("uid-7", "Grace");

        let outcome = workflow
            .submit(image(), Some(identity.clone()))
            .unwrap()
            .finish()
            .await;

        assert!(outcome.is_success());
        assert!(outcome.record_id.is_some());
        assert_eq!(workflow.state(), WorkflowState::Idle);
        assert_eq!(
            workflow.last_result().unwrap().display_label(),
            "Metal / Cans"
        );

        let records = workflow.history(&identity).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "Metal / Cans");
        assert_eq!(records[0].owner_display_name, "Grace");
    }
}
