use thiserror::Error;

use crate::domain::track::TrackReference;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("no songs found for {reference}")]
    NotFound { reference: TrackReference },

    #[error("download failed for {reference}: {reason}")]
    Download {
        reference: TrackReference,
        reason: String,
    },

    #[error("muxing tool exited with {status}: {stderr}")]
    Mux { status: String, stderr: String },

    #[error("catalog tool failed: {0}")]
    Catalog(String),

    #[error("artwork lookup failed: {0}")]
    Artwork(String),

    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}
