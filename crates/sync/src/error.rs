/// Failure taxonomy for server interactions.
///
/// Stale responses are not represented here: they are discarded silently by
/// sequence-number and identity checks, never surfaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The request never completed; constructed by the host transport.
    Network(String),
    /// The server answered with a non-ok status.
    Rejected { details: String },
    /// The payload could not be decoded or violated a data invariant.
    Malformed(String),
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncError::Network(msg) => write!(f, "network failure: {msg}"),
            SyncError::Rejected { details } => write!(f, "server rejected request: {details}"),
            SyncError::Malformed(msg) => write!(f, "malformed payload: {msg}"),
        }
    }
}

impl std::error::Error for SyncError {}
