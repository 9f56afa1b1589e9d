use anyhow::{Context, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub version: u32,
    pub output: Output,
    #[serde(default)]
    pub catalog: Catalog,
    #[serde(default)]
    pub artwork: Artwork,
    #[serde(default)]
    pub tagging: Tagging,
    #[serde(default)]
    pub pacing: Pacing,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.to_string_lossy()))?;
        let config: Config =
            toml::from_str(&contents).with_context(|| "Failed to parse config TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let Pacing { min_secs, max_secs } = self.pacing;
        if !(min_secs >= 0.0 && max_secs >= 0.0) {
            bail!("pacing bounds must be non-negative, got [{min_secs}, {max_secs}]");
        }
        if min_secs > max_secs {
            bail!("pacing min_secs ({min_secs}) is greater than max_secs ({max_secs})");
        }
        Ok(())
    }
}

/// Where downloaded audio lands and in which format
#[derive(Debug, Deserialize, Clone)]
pub struct Output {
    pub dir: PathBuf,
    #[serde(default = "default_format")]
    pub format: String,
    #[serde(default = "default_bitrate")]
    pub bitrate: String,
}

/// Catalog/download tool invocation. Credentials are optional, the tool
/// falls back to its own defaults when they are absent.
#[derive(Debug, Deserialize, Clone)]
pub struct Catalog {
    #[serde(default = "default_catalog_program")]
    pub program: PathBuf,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            program: default_catalog_program(),
            client_id: None,
            client_secret: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Artwork {
    #[serde(default = "default_artwork_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_search_url")]
    pub search_url: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for Artwork {
    fn default() -> Self {
        Self {
            dir: default_artwork_dir(),
            search_url: default_search_url(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Tagging {
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: PathBuf,
}

impl Default for Tagging {
    fn default() -> Self {
        Self {
            ffmpeg: default_ffmpeg(),
        }
    }
}

/// Bounds in seconds of the random pause between two consecutive items
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct Pacing {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            min_secs: 1.5,
            max_secs: 3.0,
        }
    }
}

fn default_format() -> String {
    "mp3".to_string()
}

fn default_bitrate() -> String {
    "320k".to_string()
}

fn default_catalog_program() -> PathBuf {
    PathBuf::from("spotdl")
}

fn default_artwork_dir() -> PathBuf {
    PathBuf::from("album_art")
}

fn default_search_url() -> String {
    "https://www.google.com/search".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36".to_string()
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_minimal_config_uses_defaults() -> anyhow::Result<()> {
        let toml_str = r#"
version = 1

[output]
dir = "/srv/music/mp3"
"#;

        let cfg: Config = toml::from_str(toml_str)?;
        cfg.validate()?;

        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.output.dir, PathBuf::from("/srv/music/mp3"));
        assert_eq!(cfg.output.format, "mp3");
        assert_eq!(cfg.output.bitrate, "320k");

        assert_eq!(cfg.catalog.program, PathBuf::from("spotdl"));
        assert!(cfg.catalog.client_id.is_none());

        assert_eq!(cfg.artwork.dir, PathBuf::from("album_art"));
        assert_eq!(cfg.artwork.search_url, "https://www.google.com/search");
        assert!(cfg.artwork.user_agent.starts_with("Mozilla/5.0"));

        assert_eq!(cfg.tagging.ffmpeg, PathBuf::from("ffmpeg"));
        assert_eq!(cfg.pacing, Pacing { min_secs: 1.5, max_secs: 3.0 });

        Ok(())
    }

    #[test]
    fn test_parse_full_config() -> anyhow::Result<()> {
        let toml_str = r#"
version = 1

[output]
dir = 'D:\Music\MP3s'
format = "flac"
bitrate = "auto"

[catalog]
program = "/opt/spotdl/bin/spotdl"
client_id = "id"
client_secret = "secret"

[artwork]
dir = "covers"

[tagging]
ffmpeg = "/usr/local/bin/ffmpeg"

[pacing]
min_secs = 0.5
max_secs = 1.0
"#;

        let cfg: Config = toml::from_str(toml_str)?;
        cfg.validate()?;

        assert_eq!(cfg.output.format, "flac");
        assert_eq!(cfg.catalog.client_id.as_deref(), Some("id"));
        assert_eq!(cfg.catalog.client_secret.as_deref(), Some("secret"));
        assert_eq!(cfg.artwork.dir, PathBuf::from("covers"));
        // unspecified artwork fields still get defaults
        assert_eq!(cfg.artwork.search_url, "https://www.google.com/search");
        assert_eq!(cfg.tagging.ffmpeg, PathBuf::from("/usr/local/bin/ffmpeg"));
        assert_eq!(cfg.pacing.min_secs, 0.5);

        Ok(())
    }

    #[test]
    fn test_inverted_pacing_is_rejected() -> anyhow::Result<()> {
        let toml_str = r#"
version = 1

[output]
dir = "out"

[pacing]
min_secs = 3.0
max_secs = 1.5
"#;

        let cfg: Config = toml::from_str(toml_str)?;
        assert!(cfg.validate().is_err());
        Ok(())
    }

    #[test]
    fn test_load_reads_file() -> anyhow::Result<()> {
        let tmp = tempfile::TempDir::new()?;
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "version = 1\n[output]\ndir = \"out\"\n")?;

        let cfg = Config::load(&path)?;
        assert_eq!(cfg.output.dir, PathBuf::from("out"));

        assert!(Config::load(&tmp.path().join("missing.toml")).is_err());
        Ok(())
    }
}
