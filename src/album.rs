//! Face-recognition album persistence.
//!
//! The album is an opaque blob owned by the device. It is stored whole: a
//! save either replaces the previous file completely or leaves it untouched.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{Error, Result};

/// Default album file name.
pub const DEFAULT_ALBUM_FILE: &str = "HVCAlbum.alb";

/// Opaque album bytes as exported by the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Album(Vec<u8>);

impl Album {
    /// Wrap a blob; an empty blob is rejected.
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::Album("album data is empty".into()));
        }
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `data` to `path` through a sibling temp file and an atomic rename.
pub fn save(path: impl AsRef<Path>, data: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if data.is_empty() {
        return Err(Error::Album(format!("refusing to save an empty album to {}", path.display())));
    }

    let tmp = temp_path(path);
    let write = || -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    };
    if let Err(err) = write() {
        let _ = fs::remove_file(&tmp);
        return Err(err.into());
    }

    info!(path = %path.display(), bytes = data.len(), "Album saved");
    Ok(())
}

/// Read a whole album file.
pub fn load(path: impl AsRef<Path>) -> Result<Album> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;
    let album = Album::new(bytes)
        .map_err(|_| Error::Album(format!("{} is empty", path.display())))?;
    info!(path = %path.display(), bytes = album.len(), "Album loaded");
    Ok(album)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_ALBUM_FILE);

        save(&path, &[1, 2, 3]).unwrap();
        assert_eq!(load(&path).unwrap().as_bytes(), &[1, 2, 3]);
        assert!(!temp_path(&path).exists());

        save(&path, &[9]).unwrap();
        assert_eq!(load(&path).unwrap().into_bytes(), vec![9]);
    }

    #[test]
    fn test_empty_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.alb");

        assert!(matches!(save(&path, &[]), Err(Error::Album(_))));
        assert!(!path.exists());

        fs::write(&path, b"").unwrap();
        assert!(matches!(load(&path), Err(Error::Album(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(load(dir.path().join("none.alb")), Err(Error::Io(_))));
    }
}
