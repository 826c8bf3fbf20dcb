//! Kernel-Quelltext von der Platte lesen.

use crate::ClError;
use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

/// Kompletter Dateiinhalt, exakt so groß wie die Datei.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: PathBuf,
    bytes: Vec<u8>,
}

impl SourceFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Quelltext als `&str`; OpenCL C muss gültiges UTF‑8 sein.
    pub fn as_str(&self) -> Result<&str, ClError> {
        std::str::from_utf8(&self.bytes).map_err(|e| ClError::Io {
            what: "failed to decode",
            path: self.path.clone(),
            source: io::Error::new(io::ErrorKind::InvalidData, e),
        })
    }
}

fn os_err<'a>(what: &'static str, path: &'a Path) -> impl FnOnce(io::Error) -> ClError + 'a {
    move |source| ClError::Io { what, path: path.to_path_buf(), source }
}

/// Liest `path` vollständig: Größe per Seek ans Ende ermitteln, Puffer
/// exakt in dieser Größe anlegen, alles einlesen.
pub fn load(path: impl AsRef<Path>) -> Result<SourceFile, ClError> {
    let path = path.as_ref();

    let mut file = File::open(path).map_err(os_err("failed to open", path))?;
    let size = file
        .seek(SeekFrom::End(0))
        .map_err(os_err("failed to seek to end of", path))?;
    let size = usize::try_from(size).map_err(|e| ClError::Io {
        what: "failed to get size of",
        path: path.to_path_buf(),
        source: io::Error::new(io::ErrorKind::InvalidData, e),
    })?;
    file.seek(SeekFrom::Start(0))
        .map_err(os_err("failed to seek to beginning of", path))?;

    let mut bytes = vec![0u8; size];
    // Kurzes Lesen → UnexpectedEof
    file.read_exact(&mut bytes)
        .map_err(os_err("failed to read", path))?;
    drop(file);

    log::debug!("loaded {} bytes from {}", size, path.display());
    Ok(SourceFile { path: path.to_path_buf(), bytes })
}
