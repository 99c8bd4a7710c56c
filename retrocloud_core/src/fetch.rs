//! Retrieval of ROM bytes by URL.
//!
//! In the browser ROMs are downloaded with a GET request (see the frontend's wasm module), on
//! native builds the URL path is resolved against a directory on disk.
use std::io::ErrorKind;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use log::debug;
use log::warn;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("HTTP {status}")]
    NotFound { status: u16 },
    #[error("{0}")]
    Network(String),
}

pub type FetchResult = Result<Vec<u8>, FetchError>;

/// Completion handler of a fetch. Called exactly once.
pub type FetchCallback = Box<dyn FnOnce(FetchResult)>;

pub trait RomFetcher {
    /// Starts fetching `url`. `done` may be called before this function returns or at any
    /// later point in time.
    fn fetch(&self, url: &str, done: FetchCallback);
}

/// Serves ROM URLs such as `/roms/test.nes` from a directory on disk.
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Maps `url` to a file below the root. Paths that would leave the root are refused.
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        let relative = Path::new(url.trim_start_matches('/'));
        if !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

impl RomFetcher for FileFetcher {
    fn fetch(&self, url: &str, done: FetchCallback) {
        let Some(path) = self.resolve(url) else {
            warn!("Refusing ROM path outside of {}: {url}", self.root.display());
            done(Err(FetchError::NotFound { status: 403 }));
            return;
        };
        debug!("Reading ROM from {}", path.display());
        let result = std::fs::read(&path).map_err(|err| match err.kind() {
            ErrorKind::NotFound => FetchError::NotFound { status: 404 },
            ErrorKind::PermissionDenied => FetchError::NotFound { status: 403 },
            _ => FetchError::Network(err.to_string()),
        });
        done(result);
    }
}
