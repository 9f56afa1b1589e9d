//! Module to manage the output directories in the file system

use walkdir::WalkDir;

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

const MUSIC_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "m4a", "ogg", "opus", "aac"];

/// Marker inserted before the extension of in-progress tagging outputs
pub const TAGGING_MARKER: &str = ".tagging.";

pub fn is_music_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| MUSIC_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn is_temp_tagging_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.contains(TAGGING_MARKER))
        .unwrap_or(false)
}

pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}

/// Lists audio files placed directly inside `dir`, skipping tagging leftovers
pub fn music_files(dir: &Path) -> std::io::Result<HashSet<PathBuf>> {
    if !dir.exists() {
        return Ok(HashSet::new());
    }

    let mut files = HashSet::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_music_file(&path) && !is_temp_tagging_file(&path) {
            files.insert(path);
        }
    }
    Ok(files)
}

/// Recursively finds temporary tagging outputs left behind by interrupted runs
pub fn temp_tagging_files(root: &Path) -> Vec<PathBuf> {
    let root_str = root.to_string_lossy();

    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| match e {
            Ok(e) => Some(e),
            Err(err) => {
                log::warn!("error while scanning dir {root_str}, skipping an entry: {err:?}");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| is_temp_tagging_file(p))
        .collect()
}

/// Deletes every temporary tagging output under `root`, returning the removed paths
pub fn remove_stale_temp_files(root: &Path) -> std::io::Result<Vec<PathBuf>> {
    let stale = temp_tagging_files(root);
    for path in &stale {
        std::fs::remove_file(path)?;
    }
    Ok(stale)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::storage::fs::{
        is_music_file, is_temp_tagging_file, music_files, remove_stale_temp_files,
    };

    #[test]
    fn test_music_extensions_are_case_insensitive() {
        assert!(is_music_file("a/b/song.MP3".as_ref()));
        assert!(is_music_file("song.flac".as_ref()));
        assert!(!is_music_file("cover.jpg".as_ref()));
        assert!(!is_music_file("README".as_ref()));
    }

    #[test]
    fn test_music_files_lists_only_direct_audio_files() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();

        let song1 = root.join("Artist - Song.mp3");
        let song2 = root.join("Other - Tune.m4a");
        let leftover = root.join(".Artist - Song.tagging.mp3");
        let nested_dir = root.join("nested");
        std::fs::create_dir_all(&nested_dir).unwrap();

        std::fs::write(&song1, b"aaa").unwrap();
        std::fs::write(&song2, b"bbb").unwrap();
        std::fs::write(&leftover, b"ccc").unwrap();
        std::fs::write(root.join("notes.txt"), b"ddd").unwrap();
        std::fs::write(nested_dir.join("deep.mp3"), b"eee").unwrap();

        let files = music_files(root).unwrap();

        assert_eq!(files.len(), 2);
        assert!(files.contains(&song1));
        assert!(files.contains(&song2));
    }

    #[test]
    fn test_music_files_of_missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        let files = music_files(&tmp.path().join("nope")).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_sweep_removes_only_tagging_leftovers() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let nested = root.join("2024");
        std::fs::create_dir_all(&nested).unwrap();

        let keep = root.join("keep.mp3");
        let stale_top = root.join(".keep.mp3.abc123.tagging.mp3");
        let stale_nested = nested.join(".x.tagging.flac");
        std::fs::write(&keep, b"audio").unwrap();
        std::fs::write(&stale_top, b"partial").unwrap();
        std::fs::write(&stale_nested, b"partial").unwrap();

        assert!(is_temp_tagging_file(&stale_top));
        assert!(!is_temp_tagging_file(&keep));

        let removed = remove_stale_temp_files(root).unwrap();

        assert_eq!(removed.len(), 2);
        assert!(keep.exists());
        assert!(!stale_top.exists());
        assert!(!stale_nested.exists());
    }
}
