//! Turning host-supplied paths into playable source locators

use common::VideoError;
use std::path::{Path, PathBuf};
use url::Url;

/// Resolve `path` against `base` (or the working directory) into a `file://` URI.
///
/// Fails for empty paths and for paths that do not name an existing file.
pub fn resolve(path: &Path, base: Option<&Path>) -> Result<Url, VideoError> {
    if path.as_os_str().is_empty() {
        return Err(VideoError::SourceResolution("empty path".to_string()));
    }

    let absolute = absolute_path(path, base)?;

    if !absolute.is_file() {
        return Err(VideoError::SourceResolution(format!(
            "no such file: {}",
            absolute.display()
        )));
    }

    Url::from_file_path(&absolute).map_err(|_| {
        VideoError::SourceResolution(format!(
            "cannot build a URI for {}",
            absolute.display()
        ))
    })
}

/// Extensions tried, in order, when looking a clip up by name
pub const MEDIA_EXTENSIONS: [&str; 4] = ["mp4", "MP4", "avi", "AVI"];

/// Find the clip called `name` in `dir` by trying each of [`MEDIA_EXTENSIONS`].
///
/// Returns the first `dir/name.<ext>` that is an existing file.
pub fn find_media(dir: &Path, name: &str) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }

    let found = MEDIA_EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{}.{}", name, ext)))
        .find(|candidate| candidate.is_file());

    match &found {
        Some(path) => log::debug!("Matched {} to {}", name, path.display()),
        None => log::debug!("No video named {} in {}", name, dir.display()),
    }
    found
}

fn absolute_path(path: &Path, base: Option<&Path>) -> Result<PathBuf, VideoError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    let joined = match base {
        Some(base) => base.join(path),
        None => path.to_path_buf(),
    };

    std::path::absolute(&joined).map_err(|e| {
        VideoError::SourceResolution(format!("{}: {}", joined.display(), e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_path_rejected() {
        assert!(matches!(
            resolve(Path::new(""), None),
            Err(VideoError::SourceResolution(_))
        ));
    }

    #[test]
    fn test_missing_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.mp4");
        assert!(resolve(&missing, None).is_err());
    }

    #[test]
    fn test_absolute_file_becomes_file_uri() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("attract.mp4");
        std::fs::write(&file, b"not really a video").unwrap();

        let uri = resolve(&file, None).unwrap();
        assert_eq!(uri.scheme(), "file");
        assert_eq!(uri.to_file_path().unwrap(), file);
    }

    #[test]
    fn test_relative_path_uses_base() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("videos")).unwrap();
        let file = dir.path().join("videos").join("pacman.mp4");
        std::fs::write(&file, b"frames").unwrap();

        let uri = resolve(Path::new("videos/pacman.mp4"), Some(dir.path())).unwrap();
        assert_eq!(uri.to_file_path().unwrap(), file);

        // Same relative path without the base does not exist here
        assert!(resolve(Path::new("videos/pacman.mp4"), None).is_err());
    }

    #[test]
    fn test_find_media_tries_extensions_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("galaga.AVI"), b"avi").unwrap();
        std::fs::write(dir.path().join("galaga.mp4"), b"mp4").unwrap();

        assert_eq!(
            find_media(dir.path(), "galaga"),
            Some(dir.path().join("galaga.mp4"))
        );
    }

    #[test]
    fn test_find_media_falls_back_to_later_extensions() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("dkong.AVI"), b"avi").unwrap();

        assert_eq!(
            find_media(dir.path(), "dkong"),
            Some(dir.path().join("dkong.AVI"))
        );
    }

    #[test]
    fn test_find_media_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("pacman.png"), b"png").unwrap();
        std::fs::create_dir(dir.path().join("pacman.mp4")).unwrap();

        assert_eq!(find_media(dir.path(), "pacman"), None);
        assert_eq!(find_media(dir.path(), ""), None);
    }

    #[test]
    fn test_directory_rejected() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve(dir.path(), None).is_err());
    }
}
