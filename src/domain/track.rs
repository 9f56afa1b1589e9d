use std::{fmt::Display, path::PathBuf};

use serde::Serialize;

/// Opaque locator of a track in the remote catalog, e.g. a share URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TrackReference(String);

impl TrackReference {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TrackReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TrackReference {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Metadata resolved by the catalog. `artists` may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: String,
    pub artists: Vec<String>,
    pub album: Option<String>,
}

impl TrackMetadata {
    pub const UNKNOWN_ARTIST: &'static str = "Unknown Artist";

    /// Builds metadata, dropping blank artist names and a blank album
    pub fn new(title: impl Into<String>, artists: Vec<String>, album: Option<String>) -> Self {
        let artists = artists
            .into_iter()
            .filter(|a| !a.trim().is_empty())
            .collect();
        let album = album.filter(|a| !a.trim().is_empty());
        Self {
            title: title.into(),
            artists,
            album,
        }
    }

    pub fn primary_artist(&self) -> Option<&str> {
        self.artists.first().map(String::as_str)
    }

    /// Artist list for log lines, with a placeholder when there is none
    pub fn artist_credit(&self) -> String {
        if self.artists.is_empty() {
            Self::UNKNOWN_ARTIST.to_string()
        } else {
            self.artists.join(", ")
        }
    }
}

/// Audio file produced by the catalog tool. Tagging rewrites the content
/// but never moves the file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAudioArtifact {
    pub path: PathBuf,
    pub metadata: TrackMetadata,
}

/// Square cover image on disk, always `ArtworkArtifact::SIZE` pixels wide and high
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtworkArtifact {
    pub path: PathBuf,
}

impl ArtworkArtifact {
    pub const SIZE: u32 = 500;
}
