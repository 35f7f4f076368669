use contacthub_core::error::CoreError;

/// Errors surfaced by [`ImportSession`](crate::session::ImportSession).
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Transport failure or service rejection during upload.
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// Confirmation attempted before a successful upload.
    #[error("No active upload session")]
    NoActiveSession,

    /// Transport failure or service rejection during confirmation.
    #[error("Mapping confirmation failed: {0}")]
    MappingConfirmationFailed(String),

    /// Checked locally; never reaches the service.
    #[error("Required field '{0}' is not mapped to any column")]
    MissingRequiredField(&'static str),

    /// Field discovery failed. Non-fatal; callers normally fall back to
    /// the built-in catalog.
    #[error("Field options unavailable: {0}")]
    FieldOptionsUnavailable(String),

    /// An upload or confirmation is already in flight.
    #[error("Another request is already in flight for this session")]
    SessionBusy,

    /// The session was reset while the request was in flight.
    #[error("Request cancelled by session reset")]
    Cancelled,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A mapping edit referenced something outside the session.
    #[error(transparent)]
    Mapping(#[from] CoreError),
}
