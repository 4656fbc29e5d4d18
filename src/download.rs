//! Stage the files listed in `fileUris` into the request's download directory

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::telemetry::LogContext;

const FILE_SCHEME: &str = "file://";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("unsupported file URI {0:?}: only file:// URIs and absolute paths are supported")]
    UnsupportedScheme(String),

    #[error("file URI {0:?} has no file name")]
    NoFileName(String),

    #[error("failed to fetch {uri}: {source}")]
    Io {
        uri: String,
        #[source]
        source: std::io::Error,
    },
}

/// Local source path of `uri`
pub fn source_path(uri: &str) -> Result<PathBuf, FetchError> {
    let path = match uri.strip_prefix(FILE_SCHEME) {
        Some(rest) => PathBuf::from(rest),
        None if uri.contains("://") => return Err(FetchError::UnsupportedScheme(uri.to_string())),
        None => PathBuf::from(uri),
    };
    if !path.is_absolute() {
        return Err(FetchError::UnsupportedScheme(uri.to_string()));
    }
    Ok(path)
}

/// Copy every entry of `uris` into `download_dir`, keeping file names.
///
/// Returns the staged paths in input order.
pub fn fetch_all(
    uris: &[String],
    download_dir: &Path,
    log: &LogContext,
) -> Result<Vec<PathBuf>, FetchError> {
    let _span = log.span().entered();
    let mut staged = Vec::with_capacity(uris.len());

    for uri in uris {
        let source = source_path(uri)?;
        let name = source
            .file_name()
            .ok_or_else(|| FetchError::NoFileName(uri.clone()))?;
        let target = download_dir.join(name);

        let bytes = fs::copy(&source, &target).map_err(|e| FetchError::Io {
            uri: uri.clone(),
            source: e,
        })?;
        info!(uri = %uri, target = ?target, bytes, "Fetched file");
        staged.push(target);
    }

    Ok(staged)
}
