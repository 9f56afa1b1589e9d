//! Cover artwork lookup through a web image search.
//!
//! Artwork is a best-effort enhancement: every failure on this path ends in
//! [`ArtworkLookup::NotAvailable`] and never aborts the item.

use std::{io::Read, path::PathBuf, sync::LazyLock};

use image::{DynamicImage, GenericImageView, ImageFormat, imageops::FilterType};
use regex::Regex;
use url::Url;

use crate::{
    config,
    domain::track::{ArtworkArtifact, TrackMetadata},
    pipeline::error::PipelineError,
    storage::fs::ensure_dir,
};

const QUERY_QUALIFIER: &str = "album cover";
const MAX_STEM_CHARS: usize = 50;

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<img\b[^>]*?\ssrc\s*=\s*["']([^"']*)["']"#).expect("valid img regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtworkLookup {
    Found(ArtworkArtifact),
    NotAvailable,
}

/// Produces cover artwork for a track
pub trait ArtworkSource {
    fn resolve(&self, metadata: &TrackMetadata) -> ArtworkLookup;
}

pub trait ImageSearchService {
    /// Returns the result page for a text query
    fn search(&self, query: &str) -> Result<String, PipelineError>;

    /// Downloads one candidate image
    fn fetch(&self, url: &str) -> Result<Vec<u8>, PipelineError>;

    /// Host label of the service itself; images served from such hosts are
    /// page decoration, not results
    fn brand(&self) -> &str;
}

/// Image search over plain HTTP GET with a browser-like user agent
pub struct HttpImageSearch {
    agent: ureq::Agent,
    search_url: String,
    brand: String,
}

impl HttpImageSearch {
    pub fn new(config: &config::Artwork) -> Result<Self, PipelineError> {
        let parsed = Url::parse(&config.search_url).map_err(|e| {
            PipelineError::Artwork(format!("invalid search url {}: {e}", config.search_url))
        })?;
        let host = parsed.host_str().ok_or_else(|| {
            PipelineError::Artwork(format!("search url {} has no host", config.search_url))
        })?;

        let agent = ureq::AgentBuilder::new()
            .user_agent(&config.user_agent)
            .build();

        Ok(Self {
            agent,
            search_url: config.search_url.clone(),
            brand: brand_label(host),
        })
    }
}

impl ImageSearchService for HttpImageSearch {
    fn search(&self, query: &str) -> Result<String, PipelineError> {
        let url = format!(
            "{}?q={}&tbm=isch",
            self.search_url,
            urlencoding::encode(query)
        );
        self.agent
            .get(&url)
            .call()
            .map_err(|e| PipelineError::Artwork(format!("image search failed: {e}")))?
            .into_string()
            .map_err(PipelineError::Io)
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>, PipelineError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| PipelineError::Artwork(format!("failed to download image: {e}")))?;

        let mut bytes = Vec::new();
        response.into_reader().read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    fn brand(&self) -> &str {
        &self.brand
    }
}

/// Second-level labels that sit under a country code, as in `google.co.uk`
const COUNTRY_SECOND_LEVEL: &[&str] = &["ac", "co", "com", "edu", "gov", "net", "org"];

/// Label of the registrable domain: `www.google.com` -> `google`,
/// `www.google.co.uk` -> `google`
fn brand_label(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();
    let labels = host.split('.').collect::<Vec<_>>();

    let index = match labels.as_slice() {
        [.., second, tld]
            if labels.len() >= 3 && tld.len() == 2 && COUNTRY_SECOND_LEVEL.contains(second) =>
        {
            labels.len() - 3
        }
        [_, _, ..] => labels.len() - 2,
        _ => 0,
    };
    labels[index].to_string()
}

pub struct ArtworkResolver<S> {
    search: S,
    artwork_dir: PathBuf,
}

impl<S: ImageSearchService> ArtworkResolver<S> {
    pub fn new(search: S, artwork_dir: PathBuf) -> Self {
        Self {
            search,
            artwork_dir,
        }
    }

    fn try_resolve(
        &self,
        metadata: &TrackMetadata,
    ) -> Result<Option<ArtworkArtifact>, PipelineError> {
        let query = build_query(metadata);
        log::info!("Searching for album art using query: {query}");

        let page = self.search.search(&query)?;
        let candidates = extract_candidates(&page, self.search.brand());
        log::debug!("{} candidate images for '{query}'", candidates.len());

        let Some(url) = select_candidate(&candidates) else {
            log::info!("No suitable images found for '{query}'");
            return Ok(None);
        };
        log::debug!("Selected artwork candidate {url}");

        let bytes = self.search.fetch(url)?;
        let decoded = image::load_from_memory(&bytes)
            .map_err(|e| PipelineError::Artwork(format!("undecodable image {url}: {e}")))?;
        let normalized = normalize_artwork(decoded);

        ensure_dir(&self.artwork_dir)?;
        let path = self
            .artwork_dir
            .join(format!("{}.jpg", sanitize_file_stem(&query)));
        DynamicImage::ImageRgb8(normalized.to_rgb8())
            .save_with_format(&path, ImageFormat::Jpeg)
            .map_err(|e| {
                PipelineError::Artwork(format!(
                    "failed to save {}: {e}",
                    path.to_string_lossy()
                ))
            })?;

        log::info!("Found and saved album art: {}", path.to_string_lossy());
        Ok(Some(ArtworkArtifact { path }))
    }
}

impl<S: ImageSearchService> ArtworkSource for ArtworkResolver<S> {
    fn resolve(&self, metadata: &TrackMetadata) -> ArtworkLookup {
        match self.try_resolve(metadata) {
            Ok(Some(artwork)) => ArtworkLookup::Found(artwork),
            Ok(None) => ArtworkLookup::NotAvailable,
            Err(e) => {
                log::warn!("Artwork for '{}' not available: {e}", metadata.title);
                ArtworkLookup::NotAvailable
            }
        }
    }
}

/// Most specific query the metadata allows: artist+album, then artist+title, then title
pub fn build_query(metadata: &TrackMetadata) -> String {
    let artist = metadata.primary_artist().map(str::trim).unwrap_or_default();
    let title = metadata.title.trim();
    let album = metadata.album.as_deref().map(str::trim).unwrap_or_default();

    if !artist.is_empty() && !album.is_empty() {
        format!("{artist} {album} {QUERY_QUALIFIER}")
    } else if !artist.is_empty() && !title.is_empty() {
        format!("{artist} {title} {QUERY_QUALIFIER}")
    } else {
        format!("{title} {QUERY_QUALIFIER}")
    }
}

/// Absolute http(s) image sources of the page in document order, minus the
/// ones hosted by the search service itself
pub fn extract_candidates(page: &str, brand: &str) -> Vec<String> {
    let brand = brand.to_lowercase();

    IMG_SRC
        .captures_iter(page)
        .filter_map(|caps| caps.get(1))
        .map(|src| src.as_str().replace("&amp;", "&"))
        .filter(|src| match Url::parse(src) {
            Ok(url) => {
                matches!(url.scheme(), "http" | "https")
                    && url
                        .host_str()
                        .is_some_and(|host| !host.to_lowercase().contains(&brand))
            }
            Err(_) => false,
        })
        .collect()
}

/// The first result is usually a placeholder icon, so the second one is taken
pub fn select_candidate(candidates: &[String]) -> Option<&str> {
    candidates.get(1).map(String::as_str)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRegion {
    pub left: u32,
    pub top: u32,
    pub size: u32,
}

impl CropRegion {
    pub fn right(&self) -> u32 {
        self.left + self.size
    }

    pub fn bottom(&self) -> u32 {
        self.top + self.size
    }
}

/// Largest centered square of a `width` x `height` image
pub fn square_crop_region(width: u32, height: u32) -> CropRegion {
    let size = width.min(height);
    CropRegion {
        left: (width - size) / 2,
        top: (height - size) / 2,
        size,
    }
}

/// Center-crops to a square if needed, then resizes to exactly `ArtworkArtifact::SIZE`
pub fn normalize_artwork(image: DynamicImage) -> DynamicImage {
    let (width, height) = image.dimensions();
    let square = if width != height {
        let region = square_crop_region(width, height);
        image.crop_imm(region.left, region.top, region.size, region.size)
    } else {
        image
    };

    square.resize_exact(
        ArtworkArtifact::SIZE,
        ArtworkArtifact::SIZE,
        FilterType::CatmullRom,
    )
}

/// Keeps alphanumerics, spaces, hyphens and underscores, replaces the rest
/// with `_`, and truncates to 50 characters
pub fn sanitize_file_stem(query: &str) -> String {
    query
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(MAX_STEM_CHARS)
        .collect()
}
