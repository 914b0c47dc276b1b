//! Path-addressed disk memoization.
//!
//! A [`DiskCache`] pairs a [`CacheCodec`] with a `get_or_compute` contract:
//! a readable, decodable entry is a hit; a missing or undecodable entry is
//! recomputed and rewritten. Writes go through a temporary file in the target
//! directory and are renamed into place, so an interrupted write never leaves
//! an entry that decodes as valid.


use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Failed to create cache directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read cache file '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write cache file '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Corrupt cache file '{path}': {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

/// Serialization of one cached value.
pub trait CacheCodec {
    type Value;

    fn encode(&self, value: &Self::Value, writer: &mut dyn Write) -> io::Result<()>;

    /// Decode a complete entry. Returns a human-readable reason on failure.
    fn decode(&self, bytes: &[u8]) -> Result<Self::Value, String>;
}

/// A value returned by [`DiskCache::get_or_compute`].
#[derive(Debug, Clone, PartialEq)]
pub struct Cached<T> {
    pub value: T,
    /// True if the value was loaded from disk rather than computed.
    pub hit: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DiskCache<C> {
    codec: C,
}

impl<C: CacheCodec> DiskCache<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    /// Load an entry. `Ok(None)` if no entry exists.
    pub fn load(&self, path: &Path) -> Result<Option<C::Value>, CacheError> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(CacheError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        self.codec
            .decode(&bytes)
            .map(Some)
            .map_err(|reason| CacheError::Corrupt {
                path: path.to_path_buf(),
                reason,
            })
    }

    /// Write an entry atomically, creating parent directories as needed.
    pub fn store(&self, path: &Path, value: &C::Value) -> Result<(), CacheError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| CacheError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        common::write_atomic(path, |w| self.codec.encode(value, w)).map_err(|source| {
            CacheError::Write {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Return the cached value at `path`, or compute, persist and return it.
    ///
    /// Unreadable or corrupt entries are logged and replaced.
    pub fn get_or_compute<E, F>(&self, path: &Path, compute: F) -> Result<Cached<C::Value>, E>
    where
        F: FnOnce() -> Result<C::Value, E>,
        E: From<CacheError>,
    {
        match self.load(path) {
            Ok(Some(value)) => {
                tracing::debug!(path = %path.display(), "Cache hit");
                return Ok(Cached { value, hit: true });
            }
            Ok(None) => {
                tracing::debug!(path = %path.display(), "Cache miss");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unusable cache entry");
            }
        }

        let value = compute()?;
        self.store(path, &value)?;
        Ok(Cached { value, hit: false })
    }
}
