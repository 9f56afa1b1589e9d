//! The batch conversion pipeline: fetch, artwork, tagging, per-item
//! composition and the sequential batch runner.

use std::path::Path;

use crate::config::Config;

pub mod artwork;
pub mod batch;
pub mod catalog;
pub mod error;
pub mod fetch;
pub mod processor;
pub mod summary;
pub mod tagger;

use artwork::{ArtworkResolver, HttpImageSearch};
use batch::{BatchRunner, RandomPacer};
use catalog::SpotdlCli;
use error::PipelineError;
use fetch::TrackFetcher;
use processor::ItemProcessor;
use tagger::FfmpegTagger;

pub type DefaultProcessor =
    ItemProcessor<TrackFetcher<SpotdlCli>, ArtworkResolver<HttpImageSearch>, FfmpegTagger>;

/// Wires the production collaborators from configuration
pub fn build_runner(
    config: &Config,
    output_dir: &Path,
) -> Result<BatchRunner<DefaultProcessor, RandomPacer>, PipelineError> {
    let catalog = SpotdlCli::new(&config.catalog, &config.output);
    let fetcher = TrackFetcher::new(catalog, output_dir.to_path_buf());
    let artwork = ArtworkResolver::new(
        HttpImageSearch::new(&config.artwork)?,
        config.artwork.dir.clone(),
    );
    let tagger = FfmpegTagger::new(&config.tagging);

    Ok(BatchRunner::new(
        ItemProcessor::new(fetcher, artwork, tagger),
        RandomPacer::new(config.pacing),
    ))
}
