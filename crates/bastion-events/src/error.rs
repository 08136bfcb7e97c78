//! Error types for the `bastion-events` crate.

/// Errors that can occur when decoding a serialized change list.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The payload is not a JSON array of objects.
    #[error("change list is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A record has no string `kind` tag.
    #[error("change record {index} has no kind tag")]
    MissingKind {
        /// Position of the record in the list.
        index: usize,
    },

    /// A record of a known kind failed to decode.
    #[error("change record {index} of kind {kind} is malformed: {source}")]
    Malformed {
        /// Position of the record in the list.
        index: usize,
        /// The record's kind tag.
        kind: String,
        /// Underlying decoding error.
        source: serde_json::Error,
    },
}
