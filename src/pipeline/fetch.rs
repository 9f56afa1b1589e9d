use std::path::PathBuf;

use crate::{
    domain::track::{LocalAudioArtifact, TrackReference},
    pipeline::{catalog::CatalogService, error::PipelineError},
    storage::fs::ensure_dir,
};

/// Turns a reference into a local audio file
pub trait TrackSource {
    fn fetch(&self, reference: &TrackReference) -> Result<LocalAudioArtifact, PipelineError>;
}

/// Resolves references through a catalog service and downloads the first match.
/// Never retries, the caller decides what a failure means.
pub struct TrackFetcher<C> {
    catalog: C,
    output_dir: PathBuf,
}

impl<C: CatalogService> TrackFetcher<C> {
    pub fn new(catalog: C, output_dir: PathBuf) -> Self {
        Self {
            catalog,
            output_dir,
        }
    }
}

impl<C: CatalogService> TrackSource for TrackFetcher<C> {
    fn fetch(&self, reference: &TrackReference) -> Result<LocalAudioArtifact, PipelineError> {
        let track = self
            .catalog
            .search(reference)?
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::NotFound {
                reference: reference.clone(),
            })?;

        log::info!(
            "Downloading: {} by {}",
            track.metadata.title,
            track.metadata.artist_credit()
        );

        ensure_dir(&self.output_dir)?;
        let produced = self
            .catalog
            .download(std::slice::from_ref(&track), &self.output_dir)
            .map_err(|e| PipelineError::Download {
                reference: reference.clone(),
                reason: e.to_string(),
            })?;

        match produced.into_iter().next().flatten() {
            Some(path) if path.is_file() => Ok(LocalAudioArtifact {
                path,
                metadata: track.metadata,
            }),
            Some(path) => Err(PipelineError::Download {
                reference: reference.clone(),
                reason: format!("{} does not exist", path.to_string_lossy()),
            }),
            None => Err(PipelineError::Download {
                reference: reference.clone(),
                reason: "no output file produced".to_string(),
            }),
        }
    }
}
