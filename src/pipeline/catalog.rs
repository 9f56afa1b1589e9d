//! Binding to the external catalog/download tool (spotDL).

use std::{
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use serde::Deserialize;

use crate::{
    config,
    domain::track::{TrackMetadata, TrackReference},
    pipeline::error::PipelineError,
    storage::fs::{is_music_file, music_files},
};

/// A catalog entry the tool can download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTrack {
    pub url: String,
    pub metadata: TrackMetadata,
}

pub trait CatalogService {
    /// Resolves a reference into zero or more downloadable tracks
    fn search(&self, reference: &TrackReference) -> Result<Vec<ResolvedTrack>, PipelineError>;

    /// Downloads each track into `output_dir`. The result is aligned with
    /// `tracks`; `None` marks a track for which no file was produced, including
    /// when the tool failed on it.
    fn download(
        &self,
        tracks: &[ResolvedTrack],
        output_dir: &Path,
    ) -> Result<Vec<Option<PathBuf>>, PipelineError>;
}

/// Song entry of a spotDL save file
#[derive(Debug, Deserialize)]
struct SavedSong {
    name: String,
    #[serde(default)]
    artists: Vec<String>,
    #[serde(default)]
    album_name: Option<String>,
    url: String,
}

/// Runs the `spotdl` executable
pub struct SpotdlCli {
    program: PathBuf,
    format: String,
    bitrate: String,
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl SpotdlCli {
    pub fn new(catalog: &config::Catalog, output: &config::Output) -> Self {
        Self {
            program: catalog.program.clone(),
            format: output.format.clone(),
            bitrate: output.bitrate.clone(),
            client_id: catalog.client_id.clone(),
            client_secret: catalog.client_secret.clone(),
        }
    }

    /// Version string reported by the tool
    pub fn probe(&self) -> Result<String, PipelineError> {
        let output = Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| self.launch_error(e))?;

        if !output.status.success() {
            return Err(PipelineError::Catalog(format!(
                "{} --version exited with {}",
                self.program.to_string_lossy(),
                output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }

    fn launch_error(&self, e: std::io::Error) -> PipelineError {
        PipelineError::Catalog(format!(
            "failed to launch {}: {e}",
            self.program.to_string_lossy()
        ))
    }

    fn command(&self, operation: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(operation);
        if let Some(id) = &self.client_id {
            cmd.arg("--client-id").arg(id);
        }
        if let Some(secret) = &self.client_secret {
            cmd.arg("--client-secret").arg(secret);
        }
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        cmd
    }

    fn run(&self, mut cmd: Command) -> Result<(), PipelineError> {
        let output = cmd.output().map_err(|e| self.launch_error(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(PipelineError::Catalog(format!(
                "{} exited with {}: {}",
                self.program.to_string_lossy(),
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    /// File name the tool gives a download with its default output template
    fn conventional_file_name(&self, metadata: &TrackMetadata) -> String {
        format!(
            "{} - {}.{}",
            metadata.artists.join(", "),
            metadata.title,
            self.format
        )
    }

    fn download_one(
        &self,
        track: &ResolvedTrack,
        output_dir: &Path,
    ) -> Result<Option<PathBuf>, PipelineError> {
        let before = music_files(output_dir)?;

        let mut cmd = self.command("download");
        cmd.arg(&track.url)
            .arg("--output")
            .arg(output_dir)
            .arg("--format")
            .arg(&self.format)
            .arg("--bitrate")
            .arg(&self.bitrate);
        if let Err(e) = self.run(cmd) {
            log::warn!("Download of {} failed: {e}", track.url);
            return Ok(None);
        }

        let after = music_files(output_dir)?;
        Ok(pick_downloaded_file(
            &before,
            &after,
            &output_dir.join(self.conventional_file_name(&track.metadata)),
        ))
    }
}

impl CatalogService for SpotdlCli {
    fn search(&self, reference: &TrackReference) -> Result<Vec<ResolvedTrack>, PipelineError> {
        let save_file = tempfile::Builder::new()
            .prefix("trackferry-")
            .suffix(".spotdl")
            .tempfile()?;

        let mut cmd = self.command("save");
        cmd.arg(reference.as_str())
            .arg("--save-file")
            .arg(save_file.path());
        self.run(cmd)?;

        let contents = std::fs::read_to_string(save_file.path())?;
        parse_save_file(&contents)
    }

    fn download(
        &self,
        tracks: &[ResolvedTrack],
        output_dir: &Path,
    ) -> Result<Vec<Option<PathBuf>>, PipelineError> {
        tracks
            .iter()
            .map(|track| self.download_one(track, output_dir))
            .collect()
    }
}

/// Parses the JSON array written by `spotdl save`
fn parse_save_file(contents: &str) -> Result<Vec<ResolvedTrack>, PipelineError> {
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }

    let songs: Vec<SavedSong> = serde_json::from_str(contents)
        .map_err(|e| PipelineError::Catalog(format!("unreadable save file: {e}")))?;

    Ok(songs
        .into_iter()
        .map(|song| ResolvedTrack {
            url: song.url,
            metadata: TrackMetadata::new(song.name, song.artists, song.album_name),
        })
        .collect())
}

/// A newly appeared audio file wins; otherwise the tool may have skipped an
/// already present file, in which case the conventional name is accepted.
fn pick_downloaded_file(
    before: &std::collections::HashSet<PathBuf>,
    after: &std::collections::HashSet<PathBuf>,
    conventional: &Path,
) -> Option<PathBuf> {
    let mut new_files = after.difference(before).cloned().collect::<Vec<_>>();
    new_files.sort();
    if let Some(path) = new_files.into_iter().next() {
        return Some(path);
    }

    if conventional.is_file() && is_music_file(conventional) {
        Some(conventional.to_path_buf())
    } else {
        None
    }
}
