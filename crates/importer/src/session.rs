//! Upload session manager.
//!
//! [`ImportSession`] drives a single import attempt through the import
//! service: upload the file, hold the inferred structure and the user's
//! field mapping, confirm, and keep the resulting validation summary.
//!
//! Only one request may be in flight per session; a second call made
//! meanwhile fails with [`ImportError::SessionBusy`] without touching the
//! network. [`ImportSession::reset`] cancels an in-flight request and
//! guarantees its late response is discarded.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use contacthub_core::error::CoreError;
use contacthub_core::fields::{FieldOptions, EMAIL_FIELD};
use contacthub_core::import::{ConfirmMappingRequest, UploadSession, ValidationSummary};
use contacthub_core::mapping::{maps_email, FieldMapping, MappingEditor, MappingStats};
use contacthub_core::session::SessionPhase;
use tokio_util::sync::CancellationToken;

use crate::api::UploadFile;
use crate::error::ImportError;
use crate::service::ImportService;

/// Manages one import attempt against an [`ImportService`].
pub struct ImportSession<S> {
    service: S,
    state: Mutex<SessionState>,
}

/// Everything reset by [`ImportSession::reset`], except `generation`.
#[derive(Default)]
struct SessionState {
    phase: SessionPhase,
    session: Option<UploadSession>,
    editor: Option<MappingEditor>,
    last_error: Option<String>,
    last_summary: Option<ValidationSummary>,
    /// Token of the request currently in flight.
    in_flight: Option<CancellationToken>,
    /// Bumped on every reset; responses from an older generation are dropped.
    generation: u64,
}

impl<S: ImportService> ImportSession<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            state: Mutex::new(SessionState::default()),
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    // ---- state accessors ----

    pub fn phase(&self) -> SessionPhase {
        self.lock().phase
    }

    pub fn session(&self) -> Option<UploadSession> {
        self.lock().session.clone()
    }

    pub fn upload_id(&self) -> Option<String> {
        self.lock().session.as_ref().map(|s| s.upload_id.clone())
    }

    /// Message of the most recent failed upload or confirmation.
    pub fn last_error(&self) -> Option<String> {
        self.lock().last_error.clone()
    }

    pub fn last_summary(&self) -> Option<ValidationSummary> {
        self.lock().last_summary.clone()
    }

    /// Snapshot of the mapping editor for the active session.
    pub fn editor(&self) -> Option<MappingEditor> {
        self.lock().editor.clone()
    }

    /// Current field mapping; empty when there is no session.
    pub fn mapping(&self) -> FieldMapping {
        self.lock()
            .editor
            .as_ref()
            .map(|editor| editor.mapping().clone())
            .unwrap_or_default()
    }

    pub fn mapping_stats(&self) -> MappingStats {
        self.lock()
            .editor
            .as_ref()
            .map(MappingEditor::stats)
            .unwrap_or_default()
    }

    pub fn can_confirm(&self) -> bool {
        self.lock()
            .editor
            .as_ref()
            .is_some_and(MappingEditor::can_confirm)
    }

    // ---- mapping edits ----

    /// Map `column` to `target` (the ignore sentinel or blank unmaps it)
    /// and return the recomputed stats.
    pub fn set_mapping(&self, column: &str, target: &str) -> Result<MappingStats, ImportError> {
        self.edit(|editor| editor.set_mapping(column, target))
    }

    /// Replace the whole mapping, e.g. to restore the server suggestion.
    pub fn seed_mapping(&self, mapping: FieldMapping) -> Result<MappingStats, ImportError> {
        self.edit(|editor| {
            let dropped = editor.seed(mapping);
            if dropped > 0 {
                tracing::warn!(dropped, "Dropped mapping entries for unknown columns");
            }
            Ok(())
        })
    }

    // ---- remote operations ----

    /// Upload a contact file and start a new session.
    ///
    /// Any previous session is discarded when the upload starts. On
    /// failure the session stays empty and the message is recorded in
    /// [`last_error`](Self::last_error).
    pub async fn upload_file(
        &self,
        file: UploadFile,
        owner: &str,
    ) -> Result<UploadSession, ImportError> {
        if file.is_empty() {
            return Err(ImportError::InvalidInput(format!(
                "file '{}' is empty",
                file.filename
            )));
        }
        let owner = owner.trim();
        if owner.is_empty() {
            return Err(ImportError::InvalidInput(
                "owner identity must not be empty".to_string(),
            ));
        }

        let (token, generation) = {
            let mut state = self.lock();
            if state.phase.is_busy() {
                return Err(ImportError::SessionBusy);
            }
            state.session = None;
            state.editor = None;
            state.last_summary = None;
            state.last_error = None;
            Self::begin(&mut state, SessionPhase::Uploading)
        };

        let mut guard = InFlight::new(&self.state, generation, SessionPhase::Uploading);
        let result = tokio::select! {
            _ = token.cancelled() => return Err(ImportError::Cancelled),
            result = self.service.upload_contacts_file(&file, owner) => result,
        };
        guard.settle();

        let outcome = result
            .map_err(|e| e.user_message("Upload"))
            .and_then(|response| {
                let stale = response.stale_keys();
                if !stale.is_empty() {
                    tracing::warn!(?stale, "Upload response mentions unknown columns");
                }
                response
                    .into_session(owner, Utc::now())
                    .map_err(|e| format!("Upload failed: unexpected response from server ({e})"))
            });

        let mut state = self.lock();
        Self::finish(&mut state, generation)?;

        match outcome {
            Ok(session) => {
                tracing::info!(
                    upload_id = %session.upload_id,
                    filename = %session.filename,
                    columns = session.columns.len(),
                    total_rows = session.total_rows,
                    "Contacts file uploaded",
                );
                state.phase = SessionPhase::Uploaded;
                state.editor = Some(MappingEditor::for_session(&session));
                state.session = Some(session.clone());
                Ok(session)
            }
            Err(message) => {
                state.phase = SessionPhase::Uploading.on_failure();
                state.last_error = Some(message.clone());
                Err(ImportError::UploadFailed(message))
            }
        }
    }

    /// Send `mapping` for the active upload and return the service's
    /// validation summary.
    ///
    /// Fails locally, without a network call, when a request is in flight,
    /// when there is no session, when a key is not a session column, or
    /// when no column maps to `email`. A
    /// failed confirmation leaves the session uploaded so it can be
    /// retried with a corrected mapping.
    pub async fn confirm_mapping(
        &self,
        mapping: &FieldMapping,
    ) -> Result<ValidationSummary, ImportError> {
        let (request, token, generation) = {
            let mut state = self.lock();
            if state.phase.is_busy() {
                return Err(ImportError::SessionBusy);
            }
            let session = state
                .session
                .as_ref()
                .filter(|s| !s.upload_id.is_empty())
                .ok_or(ImportError::NoActiveSession)?;
            if let Some(column) = mapping.keys().find(|c| !session.has_column(c)) {
                return Err(CoreError::NotFound {
                    entity: "Column",
                    key: column.clone(),
                }
                .into());
            }
            if !maps_email(mapping) {
                return Err(ImportError::MissingRequiredField(EMAIL_FIELD));
            }

            let request = ConfirmMappingRequest {
                upload_id: session.upload_id.clone(),
                field_mappings: mapping.clone(),
                email: session.owner.clone(),
            };
            let (token, generation) = Self::begin(&mut state, SessionPhase::Confirming);
            (request, token, generation)
        };

        let mut guard = InFlight::new(&self.state, generation, SessionPhase::Confirming);
        let result = tokio::select! {
            _ = token.cancelled() => return Err(ImportError::Cancelled),
            result = self.service.confirm_mapping(&request) => result,
        };
        guard.settle();

        let mut state = self.lock();
        Self::finish(&mut state, generation)?;

        match result {
            Ok(response) => {
                let summary = response.validation_summary;
                tracing::info!(
                    upload_id = %request.upload_id,
                    total_rows = summary.total_rows,
                    valid_contacts = summary.valid_contacts,
                    contacts_with_issues = summary.contacts_with_issues,
                    "Field mapping confirmed",
                );
                state.phase = SessionPhase::Confirmed;
                state.last_error = None;
                state.last_summary = Some(summary.clone());
                Ok(summary)
            }
            Err(e) => {
                let message = e.user_message("Mapping confirmation");
                state.phase = SessionPhase::Confirming.on_failure();
                state.last_error = Some(message.clone());
                Err(ImportError::MappingConfirmationFailed(message))
            }
        }
    }

    /// Confirm the session's own edited mapping.
    pub async fn confirm(&self) -> Result<ValidationSummary, ImportError> {
        let mapping = self.mapping();
        self.confirm_mapping(&mapping).await
    }

    /// Clear session, mapping, error, and summary. Cancels any request in
    /// flight. Idempotent.
    pub fn reset(&self) {
        let mut state = self.lock();
        if let Some(token) = state.in_flight.take() {
            token.cancel();
        }
        let generation = state.generation.wrapping_add(1);
        *state = SessionState {
            generation,
            ..SessionState::default()
        };
        tracing::debug!(generation, "Import session reset");
    }

    // ---- field discovery ----

    /// Fetch selectable target fields, surfacing failures.
    pub async fn try_field_options(&self) -> Result<FieldOptions, ImportError> {
        self.service
            .field_options()
            .await
            .map(FieldOptions::sanitized)
            .map_err(|e| ImportError::FieldOptionsUnavailable(e.to_string()))
    }

    /// Fetch selectable target fields, falling back to the built-in catalog
    /// when the service cannot provide any.
    pub async fn field_options(&self) -> FieldOptions {
        match self.try_field_options().await {
            Ok(options) if options.field_count() > 0 => options,
            Ok(_) => {
                tracing::warn!("Import service returned no field options, using built-in set");
                FieldOptions::builtin()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Using built-in field options");
                FieldOptions::builtin()
            }
        }
    }

    // ---- private helpers ----

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(state: &mut SessionState, phase: SessionPhase) -> (CancellationToken, u64) {
        let token = CancellationToken::new();
        state.phase = phase;
        state.in_flight = Some(token.clone());
        (token, state.generation)
    }

    /// Release the in-flight slot, or report that a reset overtook us.
    fn finish(state: &mut SessionState, generation: u64) -> Result<(), ImportError> {
        if state.generation != generation {
            return Err(ImportError::Cancelled);
        }
        state.in_flight = None;
        Ok(())
    }

    fn edit<F>(&self, f: F) -> Result<MappingStats, ImportError>
    where
        F: FnOnce(&mut MappingEditor) -> Result<(), CoreError>,
    {
        let mut state = self.lock();
        if state.phase.is_busy() {
            return Err(ImportError::SessionBusy);
        }
        let editor = state.editor.as_mut().ok_or(ImportError::NoActiveSession)?;
        f(editor)?;
        Ok(editor.stats())
    }
}

/// Marks a request as in flight for as long as its future is alive.
///
/// If the future is dropped before the response is handled (a caller-side
/// timeout, a losing `select!` branch), the phase falls back as if the
/// request had failed, unless a reset already started a new generation.
struct InFlight<'a> {
    state: &'a Mutex<SessionState>,
    generation: u64,
    phase: SessionPhase,
    settled: bool,
}

impl<'a> InFlight<'a> {
    fn new(state: &'a Mutex<SessionState>, generation: u64, phase: SessionPhase) -> Self {
        Self {
            state,
            generation,
            phase,
            settled: false,
        }
    }

    /// The response is being handled; the caller owns the state again.
    /// Must be called before re-locking the state.
    fn settle(&mut self) {
        self.settled = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.generation == self.generation && state.phase == self.phase {
            tracing::debug!(phase = %self.phase, "In-flight request abandoned");
            state.phase = self.phase.on_failure();
            state.in_flight = None;
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use contacthub_core::import::{ConfirmMappingResponse, IssuesBreakdown, UploadResponse};
    use tokio::sync::Notify;

    use super::*;
    use crate::api::ImportApiError;

    /// In-memory service; counts calls and can hold requests until released.
    struct FakeService {
        upload: Result<UploadResponse, Option<String>>,
        confirm: Result<ValidationSummary, Option<String>>,
        options: Option<FieldOptions>,
        calls: AtomicUsize,
        hold: Option<Arc<Notify>>,
        entered: Arc<Notify>,
    }

    impl FakeService {
        fn ok() -> Self {
            Self {
                upload: Ok(upload_response()),
                confirm: Ok(summary()),
                options: None,
                calls: AtomicUsize::new(0),
                hold: None,
                entered: Arc::new(Notify::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn api_error(message: &Option<String>) -> ImportApiError {
            ImportApiError::Api {
                status: 422,
                message: message.clone(),
            }
        }
    }

    #[async_trait]
    impl ImportService for FakeService {
        async fn upload_contacts_file(
            &self,
            _file: &UploadFile,
            _owner: &str,
        ) -> Result<UploadResponse, ImportApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.entered.notify_one();
            if let Some(hold) = &self.hold {
                hold.notified().await;
            }
            self.upload.clone().map_err(|m| Self::api_error(&m))
        }

        async fn confirm_mapping(
            &self,
            request: &ConfirmMappingRequest,
        ) -> Result<ConfirmMappingResponse, ImportApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request.email, "owner@example.com");
            if let Some(hold) = &self.hold {
                hold.notified().await;
            }
            self.confirm
                .clone()
                .map(|validation_summary| ConfirmMappingResponse { validation_summary })
                .map_err(|m| Self::api_error(&m))
        }

        async fn field_options(&self) -> Result<FieldOptions, ImportApiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.options
                .clone()
                .ok_or_else(|| ImportApiError::MalformedResponse("unreachable".into()))
        }
    }

    fn upload_response() -> UploadResponse {
        let mut auto_mappings = BTreeMap::new();
        auto_mappings.insert("E-mail".to_string(), "email".to_string());
        UploadResponse {
            upload_id: "up_1".into(),
            columns: vec!["Name".into(), "E-mail".into(), "Co".into()],
            auto_mappings,
            confidence_scores: BTreeMap::new(),
            preview_data: Vec::new(),
            total_rows: 10,
            filename: "leads.csv".into(),
            credit_info: None,
            sheet_info: None,
        }
    }

    fn summary() -> ValidationSummary {
        ValidationSummary {
            total_rows: 10,
            valid_contacts: 8,
            contacts_with_issues: 2,
            null_emails: 1,
            invalid_emails: 1,
            duplicate_emails: 0,
            issues_breakdown: IssuesBreakdown {
                email_issues: vec!["Row 3: invalid email".into()],
                ..IssuesBreakdown::default()
            },
        }
    }

    fn csv() -> UploadFile {
        UploadFile::new("leads.csv", b"Name,E-mail,Co\nAda,ada@example.com,Engines\n".to_vec())
    }

    const OWNER: &str = "owner@example.com";

    // -- upload --

    #[tokio::test]
    async fn upload_populates_session_and_editor() {
        let session = ImportSession::new(FakeService::ok());
        let uploaded = session.upload_file(csv(), OWNER).await.unwrap();

        assert_eq!(uploaded.upload_id, "up_1");
        assert_eq!(uploaded.owner, OWNER);
        assert_eq!(session.phase(), SessionPhase::Uploaded);
        assert_eq!(session.upload_id().as_deref(), Some("up_1"));
        assert_eq!(
            session.mapping_stats(),
            MappingStats {
                total: 3,
                mapped: 1,
                unmapped: 2,
                required: 1
            }
        );
        assert!(session.can_confirm());
    }

    #[tokio::test]
    async fn upload_failure_leaves_session_empty() {
        let service = FakeService {
            upload: Err(Some("Unsupported file type".into())),
            ..FakeService::ok()
        };
        let session = ImportSession::new(service);

        let err = session.upload_file(csv(), OWNER).await.unwrap_err();
        assert_matches!(err, ImportError::UploadFailed(ref m) if m == "Unsupported file type");
        assert_eq!(session.phase(), SessionPhase::Empty);
        assert!(session.session().is_none());
        assert_eq!(session.last_error().as_deref(), Some("Unsupported file type"));
    }

    #[tokio::test]
    async fn upload_failure_without_message_uses_status() {
        let service = FakeService {
            upload: Err(None),
            ..FakeService::ok()
        };
        let session = ImportSession::new(service);

        let err = session.upload_file(csv(), OWNER).await.unwrap_err();
        assert_matches!(err, ImportError::UploadFailed(ref m) if m.contains("422"));
    }

    #[tokio::test]
    async fn malformed_upload_response_is_upload_failure() {
        let mut response = upload_response();
        response.columns.push("Name".into());
        let service = FakeService {
            upload: Ok(response),
            ..FakeService::ok()
        };
        let session = ImportSession::new(service);

        assert_matches!(
            session.upload_file(csv(), OWNER).await,
            Err(ImportError::UploadFailed(_))
        );
        assert_eq!(session.phase(), SessionPhase::Empty);
    }

    #[tokio::test]
    async fn empty_file_or_owner_rejected_before_network() {
        let session = ImportSession::new(FakeService::ok());

        assert_matches!(
            session.upload_file(UploadFile::new("x.csv", Vec::new()), OWNER).await,
            Err(ImportError::InvalidInput(_))
        );
        assert_matches!(
            session.upload_file(csv(), "   ").await,
            Err(ImportError::InvalidInput(_))
        );
        assert_eq!(session.service().calls(), 0);
    }

    // -- confirm --

    #[tokio::test]
    async fn confirm_without_upload_makes_no_network_call() {
        let session = ImportSession::new(FakeService::ok());
        let mut mapping = FieldMapping::new();
        mapping.insert("E-mail".into(), "email".into());

        assert_matches!(
            session.confirm_mapping(&mapping).await,
            Err(ImportError::NoActiveSession)
        );
        assert_eq!(session.service().calls(), 0);
    }

    #[tokio::test]
    async fn confirm_without_email_never_reaches_service() {
        let session = ImportSession::new(FakeService::ok());
        session.upload_file(csv(), OWNER).await.unwrap();
        session.set_mapping("E-mail", "").unwrap();

        assert_matches!(
            session.confirm().await,
            Err(ImportError::MissingRequiredField("email"))
        );
        assert_eq!(session.service().calls(), 1);
        assert_eq!(session.phase(), SessionPhase::Uploaded);
    }

    #[tokio::test]
    async fn confirm_rejects_keys_outside_the_session() {
        let session = ImportSession::new(FakeService::ok());
        session.upload_file(csv(), OWNER).await.unwrap();

        let mut mapping = FieldMapping::new();
        mapping.insert("NotAColumn".into(), "email".into());

        let err = session.confirm_mapping(&mapping).await.unwrap_err();
        assert_matches!(
            err,
            ImportError::Mapping(CoreError::NotFound { entity: "Column", ref key })
                if key == "NotAColumn"
        );
        assert_eq!(session.service().calls(), 1);
        assert_eq!(session.phase(), SessionPhase::Uploaded);
    }

    #[tokio::test]
    async fn confirm_returns_summary_unchanged() {
        let session = ImportSession::new(FakeService::ok());
        session.upload_file(csv(), OWNER).await.unwrap();
        session.set_mapping("Name", "first_name").unwrap();

        let returned = session.confirm().await.unwrap();
        assert_eq!(returned, summary());
        assert_eq!(session.phase(), SessionPhase::Confirmed);
        assert_eq!(session.last_summary(), Some(summary()));
        assert_eq!(session.upload_id().as_deref(), Some("up_1"));

        // Re-confirmation with another mapping is allowed.
        session.set_mapping("Co", "company").unwrap();
        assert!(session.confirm().await.is_ok());
    }

    #[tokio::test]
    async fn failed_confirm_keeps_session_for_retry() {
        let service = FakeService {
            confirm: Err(Some("Mapping rejected".into())),
            ..FakeService::ok()
        };
        let session = ImportSession::new(service);
        session.upload_file(csv(), OWNER).await.unwrap();

        let err = session.confirm().await.unwrap_err();
        assert_matches!(
            err,
            ImportError::MappingConfirmationFailed(ref m) if m == "Mapping rejected"
        );
        assert_eq!(session.phase(), SessionPhase::Uploaded);
        assert_eq!(session.last_error().as_deref(), Some("Mapping rejected"));
        assert!(session.session().is_some());
    }

    // -- edits --

    #[tokio::test]
    async fn edits_require_a_session_and_known_columns() {
        let session = ImportSession::new(FakeService::ok());
        assert_matches!(
            session.set_mapping("Name", "first_name"),
            Err(ImportError::NoActiveSession)
        );

        session.upload_file(csv(), OWNER).await.unwrap();
        assert_matches!(
            session.set_mapping("Missing", "first_name"),
            Err(ImportError::Mapping(_))
        );

        let stats = session.set_mapping("Name", "first_name").unwrap();
        assert_eq!((stats.mapped, stats.unmapped), (2, 1));

        let mut restored = FieldMapping::new();
        restored.insert("E-mail".into(), "email".into());
        restored.insert("Gone".into(), "phone".into());
        let stats = session.seed_mapping(restored).unwrap();
        assert_eq!(stats.mapped, 1);
    }

    // -- reset --

    #[tokio::test]
    async fn reset_clears_everything() {
        let session = ImportSession::new(FakeService::ok());
        session.upload_file(csv(), OWNER).await.unwrap();
        session.confirm().await.unwrap();

        session.reset();
        session.reset();

        assert_eq!(session.phase(), SessionPhase::Empty);
        assert!(session.upload_id().is_none());
        assert!(session.mapping().is_empty());
        assert!(session.last_summary().is_none());
        assert!(session.last_error().is_none());

        let mut mapping = FieldMapping::new();
        mapping.insert("E-mail".into(), "email".into());
        assert_matches!(
            session.confirm_mapping(&mapping).await,
            Err(ImportError::NoActiveSession)
        );
    }

    // -- concurrency --

    #[tokio::test]
    async fn second_request_while_uploading_is_busy() {
        let gate = Arc::new(Notify::new());
        let service = FakeService {
            hold: Some(Arc::clone(&gate)),
            ..FakeService::ok()
        };
        let entered = Arc::clone(&service.entered);
        let session = Arc::new(ImportSession::new(service));

        let task = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.upload_file(csv(), OWNER).await }
        });
        entered.notified().await;

        assert_eq!(session.phase(), SessionPhase::Uploading);
        assert_matches!(
            session.upload_file(csv(), OWNER).await,
            Err(ImportError::SessionBusy)
        );
        assert_matches!(session.confirm().await, Err(ImportError::SessionBusy));

        gate.notify_one();
        assert!(task.await.unwrap().is_ok());
        assert_eq!(session.service().calls(), 1);
        assert_eq!(session.phase(), SessionPhase::Uploaded);
    }

    #[tokio::test]
    async fn reset_cancels_in_flight_upload() {
        let gate = Arc::new(Notify::new());
        let service = FakeService {
            hold: Some(gate),
            ..FakeService::ok()
        };
        let entered = Arc::clone(&service.entered);
        let session = Arc::new(ImportSession::new(service));

        let task = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.upload_file(csv(), OWNER).await }
        });
        entered.notified().await;

        session.reset();

        assert_matches!(task.await.unwrap(), Err(ImportError::Cancelled));
        assert_eq!(session.phase(), SessionPhase::Empty);
        assert!(session.session().is_none());
    }

    #[tokio::test]
    async fn dropped_upload_future_releases_the_session() {
        let gate = Arc::new(Notify::new());
        let service = FakeService {
            hold: Some(Arc::clone(&gate)),
            ..FakeService::ok()
        };
        let session = ImportSession::new(service);

        let timed_out =
            tokio::time::timeout(Duration::from_millis(50), session.upload_file(csv(), OWNER))
                .await;
        assert!(timed_out.is_err());
        assert_eq!(session.phase(), SessionPhase::Empty);
        assert!(session.session().is_none());

        gate.notify_one();
        assert!(session.upload_file(csv(), OWNER).await.is_ok());
        assert_eq!(session.phase(), SessionPhase::Uploaded);
    }

    #[tokio::test]
    async fn dropped_confirm_future_falls_back_to_uploaded() {
        let gate = Arc::new(Notify::new());
        let service = FakeService {
            hold: Some(Arc::clone(&gate)),
            ..FakeService::ok()
        };
        let session = ImportSession::new(service);
        gate.notify_one();
        session.upload_file(csv(), OWNER).await.unwrap();

        let timed_out = tokio::time::timeout(Duration::from_millis(50), session.confirm()).await;
        assert!(timed_out.is_err());
        assert_eq!(session.phase(), SessionPhase::Uploaded);
        assert_eq!(session.upload_id().as_deref(), Some("up_1"));

        gate.notify_one();
        assert!(session.confirm().await.is_ok());
        assert_eq!(session.phase(), SessionPhase::Confirmed);
    }

    // -- field options --

    #[tokio::test]
    async fn field_options_fall_back_to_builtin() {
        let session = ImportSession::new(FakeService::ok());

        assert_matches!(
            session.try_field_options().await,
            Err(ImportError::FieldOptionsUnavailable(_))
        );
        assert_eq!(session.field_options().await, FieldOptions::builtin());
    }

    #[tokio::test]
    async fn field_options_from_service_are_sanitized() {
        let options: FieldOptions = serde_json::from_value(serde_json::json!({
            "field_categories": { "Basic": { "email": "Email", "ignore": "Ignore" } }
        }))
        .unwrap();
        let service = FakeService {
            options: Some(options),
            ..FakeService::ok()
        };
        let session = ImportSession::new(service);

        let fetched = session.field_options().await;
        assert_eq!(fetched.field_count(), 1);
        assert!(fetched.contains("email"));
        assert!(!fetched.contains("ignore"));
    }
}
