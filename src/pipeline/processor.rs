use crate::{
    domain::{outcome::ProcessingOutcome, track::TrackReference},
    pipeline::{
        artwork::{ArtworkLookup, ArtworkSource},
        fetch::TrackSource,
        tagger::Tagger,
    },
};

/// Handles a single reference from start to finish
pub trait Process {
    fn process(&mut self, reference: &TrackReference) -> ProcessingOutcome;
}

/// Fetch, then best-effort artwork and tagging. Only a failed fetch fails the item.
pub struct ItemProcessor<F, A, T> {
    fetcher: F,
    artwork: A,
    tagger: T,
}

impl<F, A, T> ItemProcessor<F, A, T>
where
    F: TrackSource,
    A: ArtworkSource,
    T: Tagger,
{
    pub fn new(fetcher: F, artwork: A, tagger: T) -> Self {
        Self {
            fetcher,
            artwork,
            tagger,
        }
    }
}

impl<F, A, T> Process for ItemProcessor<F, A, T>
where
    F: TrackSource,
    A: ArtworkSource,
    T: Tagger,
{
    fn process(&mut self, reference: &TrackReference) -> ProcessingOutcome {
        let audio = match self.fetcher.fetch(reference) {
            Ok(audio) => audio,
            Err(e) => {
                log::error!("Error downloading {reference}: {e}");
                return ProcessingOutcome::Failure {
                    reference: reference.clone(),
                    message: e.to_string(),
                };
            }
        };

        log::info!("Searching for proper album art...");
        match self.artwork.resolve(&audio.metadata) {
            ArtworkLookup::Found(artwork) => {
                log::info!("Using custom album art: {}", artwork.path.to_string_lossy());
                if let Err(e) = self.tagger.embed(&audio.path, &artwork.path) {
                    log::warn!(
                        "Error adding album art to {}: {e}",
                        audio.path.to_string_lossy()
                    );
                }
            }
            ArtworkLookup::NotAvailable => {
                log::info!("No custom album art, keeping the downloaded file as is");
            }
        }

        ProcessingOutcome::Success {
            reference: reference.clone(),
            title: audio.metadata.title,
        }
    }
}
