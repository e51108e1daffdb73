//! Schema loading from files and HTTP URLs.
//!
//! Every document is addressed by an absolute URL: file paths become
//! `file://` URLs so relative `$ref`s resolve the same way for both.

use std::collections::HashSet;
use std::path::Path;

use url::Url;

use crate::error::LoadError;
use crate::parser::{parse_with_options, ParseOptions};
use crate::registry::Registry;
use crate::schema::Schema;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Fetch the text of the document at `url`.
///
/// `http`/`https` requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `LoadError::FileNotFound` if a `file://` URL points nowhere,
/// `LoadError::NetworkError` if a request fails, or
/// `LoadError::UnsupportedScheme` for anything else.
pub fn load_url(url: &Url) -> Result<String, LoadError> {
    match url.scheme() {
        "file" => {
            let path = url.to_file_path().map_err(|()| LoadError::InvalidPath {
                path: url.path().into(),
            })?;
            if !path.exists() {
                return Err(LoadError::FileNotFound { path });
            }
            std::fs::read_to_string(&path).map_err(|source| LoadError::ReadError { path, source })
        }
        #[cfg(feature = "remote")]
        "http" | "https" => fetch(url),
        scheme => Err(LoadError::UnsupportedScheme {
            scheme: scheme.to_string(),
            url: url.to_string(),
        }),
    }
}

#[cfg(feature = "remote")]
fn fetch(url: &Url) -> Result<String, LoadError> {
    let network_error = |source| LoadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    // Check for HTTP errors before reading the body
    client
        .get(url.as_str())
        .send()
        .and_then(|response| response.error_for_status())
        .and_then(|response| response.text())
        .map_err(network_error)
}

/// Convert a file path into the `file://` URL used as its base identifier.
///
/// Relative paths are made absolute against the current directory.
pub fn base_url_for_path(path: &Path) -> Result<Url, LoadError> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        let cwd = std::env::current_dir().map_err(|source| LoadError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        cwd.join(path)
    };

    Url::from_file_path(&absolute).map_err(|()| LoadError::InvalidPath { path: absolute })
}

/// Check if a string looks like a URL rather than a file path.
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://") || s.starts_with("file://")
}

/// Read and parse a root schema from a file path or URL.
pub fn read_schema(source: &str) -> Result<Schema, LoadError> {
    read_schema_with_options(source, &ParseOptions::default())
}

/// Like [`read_schema`], with explicit parse options.
pub fn read_schema_with_options(source: &str, options: &ParseOptions) -> Result<Schema, LoadError> {
    let url = if is_url(source) {
        Url::parse(source).map_err(|err| LoadError::InvalidSource {
            source_name: source.to_string(),
            source: err,
        })?
    } else {
        base_url_for_path(Path::new(source))?
    };

    load_document(&url, options)
}

fn load_document(url: &Url, options: &ParseOptions) -> Result<Schema, LoadError> {
    let text = load_url(url)?;
    parse_with_options(&text, url, options).map_err(|source| LoadError::Parse {
        url: url.to_string(),
        source,
    })
}

/// Load every external document referenced from `registry`, transitively.
///
/// Documents that cannot be loaded or parsed are skipped; references into
/// them surface as unresolved when their roots are generated.
///
/// Returns the number of documents added.
pub fn load_references(registry: &mut Registry) -> usize {
    let mut attempted = HashSet::new();
    let mut loaded = 0;

    loop {
        let pending: Vec<Url> = registry
            .missing_documents()
            .into_iter()
            .filter(|url| attempted.insert(url.to_string()))
            .collect();
        if pending.is_empty() {
            return loaded;
        }

        for url in pending {
            match load_document(&url, &ParseOptions::default()) {
                Ok(schema) => match registry.add_document(schema) {
                    Ok(_) => {
                        tracing::debug!(%url, "loaded referenced document");
                        loaded += 1;
                    }
                    Err(error) => {
                        tracing::warn!(%url, %error, "cannot register referenced document");
                    }
                },
                Err(error) => {
                    tracing::warn!(%url, %error, "cannot load referenced document");
                }
            }
        }
    }
}
