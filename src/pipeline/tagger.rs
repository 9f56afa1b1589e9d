//! Artwork embedding with an external muxing tool (ffmpeg).

use std::{
    ffi::OsStr,
    path::{Path, PathBuf},
    process::{Command, Stdio},
};

use tempfile::TempPath;

use crate::{config, pipeline::error::PipelineError, storage::fs::TAGGING_MARKER};

/// Embeds cover artwork into an audio file in place
pub trait Tagger {
    fn embed(&self, audio: &Path, artwork: &Path) -> Result<(), PipelineError>;
}

pub struct FfmpegTagger {
    program: PathBuf,
}

impl FfmpegTagger {
    pub fn new(config: &config::Tagging) -> Self {
        Self {
            program: config.ffmpeg.clone(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// First line of `ffmpeg -version`, used to check the tool is usable
    pub fn probe(&self) -> Result<String, PipelineError> {
        let output = Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| self.launch_error(e))?;

        if !output.status.success() {
            return Err(PipelineError::Mux {
                status: output.status.to_string(),
                stderr: String::new(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().to_string())
    }

    fn launch_error(&self, e: std::io::Error) -> PipelineError {
        PipelineError::Mux {
            status: "no exit status".to_string(),
            stderr: format!("failed to launch {}: {e}", self.program.to_string_lossy()),
        }
    }

    /// Reserves a temporary output next to `audio`. The extension is kept so
    /// the tool picks the same container, and the path is deleted on drop
    /// unless persisted.
    fn temp_output(audio: &Path) -> std::io::Result<TempPath> {
        let dir = audio
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let name = audio
            .file_name()
            .map(OsStr::to_string_lossy)
            .unwrap_or_default();
        let ext = audio
            .extension()
            .map(OsStr::to_string_lossy)
            .unwrap_or("mp3".into());

        Ok(tempfile::Builder::new()
            .prefix(&format!(".{name}."))
            .suffix(&format!("{TAGGING_MARKER}{ext}"))
            .tempfile_in(dir)?
            .into_temp_path())
    }
}

fn require_file(path: &Path) -> Result<(), PipelineError> {
    if path.is_file() {
        Ok(())
    } else {
        Err(PipelineError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} does not exist", path.to_string_lossy()),
        )))
    }
}

impl Tagger for FfmpegTagger {
    fn embed(&self, audio: &Path, artwork: &Path) -> Result<(), PipelineError> {
        require_file(audio)?;
        require_file(artwork)?;

        let temp = Self::temp_output(audio)?;

        let output = Command::new(&self.program)
            .args(["-y", "-loglevel", "error", "-i"])
            .arg(audio)
            .arg("-i")
            .arg(artwork)
            .args([
                "-map",
                "0:0",
                "-map",
                "1:0",
                "-c",
                "copy",
                "-id3v2_version",
                "3",
                "-metadata:s:v",
                "title=Album cover",
                "-metadata:s:v",
                "comment=Cover (front)",
            ])
            .arg(temp.as_os_str())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| self.launch_error(e))?;

        if !output.status.success() {
            // `temp` is dropped here, the original stays untouched
            return Err(PipelineError::Mux {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        // the temp file is created owner-only, the tagged track keeps the original mode
        std::fs::set_permissions(&temp, std::fs::metadata(audio)?.permissions())?;
        temp.persist(audio).map_err(|e| PipelineError::Io(e.error))?;
        log::info!(
            "Added custom album art to {}",
            audio.file_name().map(OsStr::to_string_lossy).unwrap_or_default()
        );
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::os::unix::fs::PermissionsExt;

    use tempfile::TempDir;

    use super::*;
    use crate::storage::fs::temp_tagging_files;

    fn tagger(program: impl Into<PathBuf>) -> FfmpegTagger {
        FfmpegTagger::new(&config::Tagging {
            ffmpeg: program.into(),
        })
    }

    /// Writes an executable shell script standing in for the muxing tool
    fn fake_tool(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn fixtures(dir: &Path) -> (PathBuf, PathBuf) {
        let audio = dir.join("Artist - Song.mp3");
        let artwork = dir.join("cover.jpg");
        std::fs::write(&audio, b"original audio bytes").unwrap();
        std::fs::write(&artwork, b"jpeg").unwrap();
        (audio, artwork)
    }

    #[test]
    fn test_failing_tool_leaves_original_untouched() {
        let tmp = TempDir::new().unwrap();
        let (audio, artwork) = fixtures(tmp.path());
        let tool = fake_tool(
            tmp.path(),
            r#"for last in "$@"; do :; done
printf 'half written' > "$last"
echo 'Invalid data found' >&2
exit 1"#,
        );

        let err = tagger(tool).embed(&audio, &artwork).unwrap_err();

        match err {
            PipelineError::Mux { stderr, .. } => assert_eq!(stderr, "Invalid data found"),
            other => panic!("expected mux error, got {other:?}"),
        }
        assert_eq!(std::fs::read(&audio).unwrap(), b"original audio bytes");
        assert!(temp_tagging_files(tmp.path()).is_empty());
    }

    #[test]
    fn test_successful_tool_replaces_original_in_place() {
        let tmp = TempDir::new().unwrap();
        let (audio, artwork) = fixtures(tmp.path());
        let args_file = tmp.path().join("args.txt");
        let tool = fake_tool(
            tmp.path(),
            &format!(
                r#"printf '%s\n' "$@" > '{}'
for last in "$@"; do :; done
printf 'tagged audio' > "$last""#,
                args_file.to_string_lossy()
            ),
        );

        tagger(tool).embed(&audio, &artwork).unwrap();

        assert_eq!(std::fs::read(&audio).unwrap(), b"tagged audio");
        assert!(temp_tagging_files(tmp.path()).is_empty());

        let args = std::fs::read_to_string(&args_file).unwrap();
        let args: Vec<_> = args.lines().collect();
        let audio_str = audio.to_string_lossy();
        let artwork_str = artwork.to_string_lossy();
        assert_eq!(
            &args[..10],
            &[
                "-y",
                "-loglevel",
                "error",
                "-i",
                &*audio_str,
                "-i",
                &*artwork_str,
                "-map",
                "0:0",
                "-map",
            ]
        );
        assert!(args.contains(&"copy"));
        assert!(args.contains(&"comment=Cover (front)"));
        let output = args.last().unwrap();
        assert!(output.ends_with(".tagging.mp3"));
        assert_ne!(*output, &*audio_str);
    }

    #[test]
    fn test_tagged_file_keeps_original_permissions() {
        let tmp = TempDir::new().unwrap();
        let (audio, artwork) = fixtures(tmp.path());
        std::fs::set_permissions(&audio, std::fs::Permissions::from_mode(0o644)).unwrap();
        let tool = fake_tool(
            tmp.path(),
            r#"for last in "$@"; do :; done
printf 'tagged audio' > "$last""#,
        );

        tagger(tool).embed(&audio, &artwork).unwrap();

        assert_eq!(std::fs::read(&audio).unwrap(), b"tagged audio");
        let mode = std::fs::metadata(&audio).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_missing_tool_is_mux_error() {
        let tmp = TempDir::new().unwrap();
        let (audio, artwork) = fixtures(tmp.path());

        let err = tagger("/nonexistent/ffmpeg")
            .embed(&audio, &artwork)
            .unwrap_err();

        assert!(matches!(err, PipelineError::Mux { .. }));
        assert_eq!(std::fs::read(&audio).unwrap(), b"original audio bytes");
        assert!(temp_tagging_files(tmp.path()).is_empty());
    }

    #[test]
    fn test_missing_artwork_is_io_error() {
        let tmp = TempDir::new().unwrap();
        let (audio, _) = fixtures(tmp.path());

        let err = tagger("false")
            .embed(&audio, &tmp.path().join("nope.jpg"))
            .unwrap_err();

        assert!(matches!(err, PipelineError::Io(_)));
    }

    #[test]
    fn test_probe_reports_version_line() {
        let tmp = TempDir::new().unwrap();
        let tool = fake_tool(tmp.path(), "echo 'ffmpeg version 7.1 Copyright'");

        assert_eq!(tagger(tool).probe().unwrap(), "ffmpeg version 7.1 Copyright");
        assert!(tagger("false").probe().is_err());
    }
}
