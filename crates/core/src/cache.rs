use std::{
    hash::{DefaultHasher, Hash, Hasher},
    path::{Path, PathBuf},
};

use crate::provider::Provider;

/// Get the cache directory for a given URL
pub fn get_cache_dir(url: &str) -> PathBuf {
    cache_dir_in(&get_root_cache_dir(), url)
}

pub fn cache_dir_in(root: &Path, url: &str) -> PathBuf {
    let mut hasher = DefaultHasher::new();
    url.hash(&mut hasher);
    root.join(hasher.finish().to_string())
}

pub fn get_root_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("vidnote")
}

/// Find an extracted audio file in the cache directory
pub fn find_audio_in_cache(cache_dir: &Path, audio_format: &str) -> Option<PathBuf> {
    let entries = std::fs::read_dir(cache_dir).ok()?;

    entries.flatten().map(|entry| entry.path()).find(|path| {
        path.file_stem().is_some_and(|stem| stem == "audio")
            && path
                .extension()
                .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(audio_format))
    })
}

pub fn get_info_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("info.json")
}

/// Get the path for a cached transcript file
pub fn get_transcript_path(cache_dir: &Path) -> PathBuf {
    cache_dir.join("transcript.json")
}

/// Get the path for a cached summary file (provider aware)
pub fn get_summary_path(cache_dir: &Path, provider: &Provider) -> PathBuf {
    cache_dir.join(format!("summary_{}.json", provider.slug()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_url_same_dir() {
        let root = Path::new("/cache");
        assert_eq!(
            cache_dir_in(root, "https://youtu.be/a"),
            cache_dir_in(root, "https://youtu.be/a")
        );
        assert_ne!(
            cache_dir_in(root, "https://youtu.be/a"),
            cache_dir_in(root, "https://youtu.be/b")
        );
    }

    #[test]
    fn summary_path_is_per_provider() {
        let dir = Path::new("/cache/1");
        assert_eq!(
            get_summary_path(dir, &Provider::Grok),
            PathBuf::from("/cache/1/summary_grok.json")
        );
    }

    #[test]
    fn finds_audio_by_stem_and_extension() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("info.json"), "{}").unwrap();
        assert!(find_audio_in_cache(dir.path(), "mp3").is_none());

        std::fs::write(dir.path().join("audio.MP3"), b"").unwrap();
        assert_eq!(
            find_audio_in_cache(dir.path(), "mp3"),
            Some(dir.path().join("audio.MP3"))
        );
        assert!(find_audio_in_cache(dir.path(), "m4a").is_none());
    }

    #[test]
    fn missing_dir_has_no_audio() {
        let dir = tempfile::tempdir().unwrap();
        assert!(find_audio_in_cache(&dir.path().join("nope"), "mp3").is_none());
    }
}
