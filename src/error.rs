/// Every way a submission can fail, rendered as the text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StudyError {
    #[error("Please enter a topic")]
    Validation,

    #[error("A request is already in progress")]
    Busy,

    #[error("Request timed out. Please try again.")]
    Timeout,

    #[error("Unable to connect to server. Please check if the backend is running.")]
    Connection,

    /// The service answered but reported a failure of its own.
    #[error("{}", .0.as_deref().unwrap_or(SERVER_ERROR))]
    Application(Option<String>),

    /// Malformed responses and anything else unexpected. The detail is kept for
    /// logs only.
    #[error("An unexpected error occurred. Please try again.")]
    Unknown(String),
}

pub const SERVER_ERROR: &str = "Server error occurred";

impl StudyError {
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}

/// Failures of the persistence collaborator. Never surfaced past the stores.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("storage lock poisoned")]
    Poisoned,
}
